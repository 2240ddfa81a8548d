//! Quality gate configuration
//!
//! The configuration is parsed and validated once, then handed to the
//! coordinator, which passes each component its own section. No component
//! reads configuration from anywhere else.

mod loading;
mod types;
mod validation;

#[cfg(test)]
mod tests;

pub use loading::{load_config, parse_toml_config, parse_yaml_config};
pub use types::{
    BeforeCommitDiffConfig, CriteriaFailurePolicy, DiffValidationConfig, DisallowPattern,
    EnforcementMode, EscalationAction, EscalationConfig, FailureHandlingConfig,
    FilesChangedConfig, FunctionalAutoDetectConfig, FunctionalAutoDetectPattern,
    FunctionalFailurePolicy, FunctionalVerificationConfig, HttpRequestSettings,
    MandatoryTestingConfig, PortCheckSettings, PreflightConfig, QualityGatesConfig,
    TestCommandPattern, TestFailurePolicy, TruthEnforcementConfig, TruthRule,
    UnexpectedFilesAction, UnexpectedFilesConfig, VerificationMethods,
};
pub use validation::{validate_config, ConfigError};
