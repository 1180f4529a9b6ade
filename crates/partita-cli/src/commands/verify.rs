//! Check a project file.

use std::path::PathBuf;

use clap::Args;
use partita_schema::{SCHEMA_VERSION, project};

use super::common::decode_project;

/// Check pointer integrity and schema version.
#[derive(Args)]
pub struct VerifyArgs {
    /// Path to the project file
    pub file: PathBuf,

    /// Treat an outdated schema version as an error
    #[arg(long)]
    pub strict: bool,
}

/// Run the verify command.
pub fn run(args: VerifyArgs) -> anyhow::Result<()> {
    let graph = decode_project(&args.file)?;
    graph
        .verify()
        .map_err(|e| anyhow::anyhow!("{}: integrity check failed: {e}", args.file.display()))?;
    if project::find_root(&graph).is_none() {
        anyhow::bail!("{}: no project root", args.file.display());
    }

    let version = graph.schema_version();
    if version < SCHEMA_VERSION {
        let message = format!(
            "{}: schema v{version} is older than v{SCHEMA_VERSION}, run `partita migrate`",
            args.file.display()
        );
        if args.strict {
            anyhow::bail!(message);
        }
        println!("{message}");
    }
    println!("{}: OK ({} nodes)", args.file.display(), graph.len());
    Ok(())
}
