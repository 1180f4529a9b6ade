//! Upgrade a project to the current schema.

use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::Args;
use tracing::warn;

use super::common::{open_project, save_project, settings};
use crate::media::WavSampleResolver;

/// Upgrade a project to the current schema.
#[derive(Args)]
pub struct MigrateArgs {
    /// Path to the project file
    pub file: PathBuf,

    /// Directory searched for audio files that moved
    #[arg(short, long)]
    pub media: Option<PathBuf>,

    /// Write the result here instead of overwriting the input
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Fail if any step cannot be applied
    #[arg(long)]
    pub strict: bool,
}

/// Run the migrate command.
pub fn run(args: MigrateArgs) -> anyhow::Result<()> {
    let mut config = settings()?;
    config.load.strict_migrations |= args.strict;
    let resolver = WavSampleResolver::new(args.media);
    let loaded = open_project(&args.file, &config, &resolver)?;
    let report = &loaded.report;
    let out = args.out.unwrap_or_else(|| args.file.clone());

    if report.is_noop() && out == args.file {
        println!("{}: already at schema v{}", args.file.display(), report.to_version);
        return Ok(());
    }

    let mut steps: BTreeMap<&str, usize> = BTreeMap::new();
    for step in &report.applied {
        *steps.entry(step.migration).or_insert(0) += 1;
    }
    for (name, count) in &steps {
        println!("  {name:28} {count} node(s)");
    }
    for failure in &report.failed {
        warn!("{} on {}: {}", failure.migration, failure.node, failure.error);
    }

    save_project(&out, &loaded.graph)?;
    if report.is_complete() {
        println!(
            "Migrated {} from v{} to v{} -> {}",
            args.file.display(),
            report.from_version,
            report.to_version,
            out.display()
        );
    } else {
        println!(
            "Partially migrated {} ({} step(s) failed, still v{}) -> {}",
            args.file.display(),
            report.failed.len(),
            report.to_version,
            out.display()
        );
    }
    Ok(())
}
