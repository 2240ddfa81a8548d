pub mod task;

pub use task::{load_task, CriterionDefinition, Task, VerificationDefinition, UNKNOWN_TASK_ID};
