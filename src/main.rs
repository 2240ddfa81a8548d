use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use quality_gate::commands::{claims, validate};
use quality_gate::logging;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "qgate")]
#[command(about = "Pre-commit quality gate for agent-produced changes", long_about = None)]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the quality gates over a working tree
    ///
    /// Exits with status 1 when the change is blocked.
    Validate {
        /// Quality gate configuration (YAML, or TOML by extension)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Task definition (YAML)
        #[arg(short, long)]
        task: Option<PathBuf>,

        /// Repository root
        #[arg(short, long, default_value = ".")]
        repo: PathBuf,

        /// Claim to verify against the collected evidence (repeatable)
        #[arg(long = "claim")]
        claims: Vec<String>,

        /// File of raw agent output to extract claims from
        #[arg(long)]
        agent_output: Option<PathBuf>,

        /// Commit with this message and the gate footer when the gate passes
        #[arg(long)]
        commit: Option<String>,

        /// Push the commit to this branch on origin
        #[arg(long, requires = "commit")]
        push: Option<String>,

        /// Changed files (defaults to the repository's changed files)
        changed_files: Vec<String>,
    },

    /// Print the claims found in agent output
    Claims {
        /// Quality gate configuration holding the truth rules
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// File of raw agent output
        agent_output: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match cli.command {
        Commands::Validate {
            config,
            task,
            repo,
            claims,
            agent_output,
            commit,
            push,
            changed_files,
        } => {
            let passed = validate::execute(validate::ValidateOptions {
                config,
                task,
                repo,
                changed_files,
                claims,
                agent_output,
                commit,
                push,
            })?;
            if !passed {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Claims {
            config,
            agent_output,
        } => claims::execute(config.as_deref(), &agent_output),
    }
}
