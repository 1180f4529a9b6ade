//! Create an empty project.

use std::path::PathBuf;

use clap::Args;
use partita_core::Address;
use partita_schema::{keys::root, project};

use super::common::{save_project, schema};

/// Create an empty project file.
#[derive(Args)]
pub struct NewArgs {
    /// Path of the new project file
    pub file: PathBuf,

    /// Project name
    #[arg(short, long)]
    pub name: Option<String>,

    /// Add this many empty audio units
    #[arg(short, long, default_value_t = 0)]
    pub units: usize,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

/// Run the new command.
pub fn run(args: NewArgs) -> anyhow::Result<()> {
    if args.file.exists() && !args.force {
        anyhow::bail!("{} already exists (use --force to overwrite)", args.file.display());
    }

    let (mut graph, root_id) = project::new_project(schema()?)?;
    graph.transaction(|g| {
        if let Some(name) = &args.name {
            g.set_value(&Address::compose(root_id).append(root::NAME), name.as_str())?;
        }
        for i in 0..args.units {
            project::add_audio_unit(g, root_id, &format!("Unit {}", i + 1))?;
        }
        Ok(())
    })?;

    save_project(&args.file, &graph)?;
    println!(
        "Created {} ({} nodes, schema v{})",
        args.file.display(),
        graph.len(),
        graph.schema_version()
    );
    Ok(())
}
