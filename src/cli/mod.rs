//! Command-line front-end over the [`crate::domain::DomainLoader`]
//! (spec.md §6 Domain API). Grounded on the teacher's `clap`-derived
//! `Cli`/`Commands` shape, retargeted at the loader's four entry points.

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};

use crate::config;
use crate::domain::DomainLoader;

#[derive(Parser)]
#[command(name = "yama")]
#[command(about = "Yama loading/resolution core", version, author)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compile a parcel manifest's sources and bind the result at its path.
    Bind {
        /// Path to the parcel's manifest (toml).
        manifest: PathBuf,
    },
    /// Import a bound parcel by path, printing its path on success.
    Import {
        /// The path to import.
        path: String,
    },
    /// Load a type by fullname, printing its kind and fullname on success.
    Load {
        /// The type fullname to load.
        fullname: String,
    },
    /// Add a redirect rule: within `subject`, rewrite `before` to `after`.
    Redirect {
        subject: String,
        before: String,
        after: String,
    },
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let domain = DomainLoader::new();

    match cli.command {
        Commands::Bind { manifest } => {
            let compiled = config::compile_manifest(&manifest)?;
            for dep in &compiled.manifest.deps {
                domain.add_redirect(&compiled.manifest.path, &dep.name, &dep.path)?;
            }
            domain.bind_parcel_def(&compiled.manifest.path, compiled.module, compiled.meta)?;
            log::info!("bound parcel at `{}`", compiled.manifest.path);
            println!("bound {}", compiled.manifest.path);
            Ok(())
        }
        Commands::Import { path } => match domain.import(&path) {
            Some(parcel) => {
                println!("{}", parcel.path);
                Ok(())
            }
            None => Err(anyhow!("no parcel bound at `{path}`")),
        },
        Commands::Load { fullname } => match domain.load(&fullname) {
            Some(t) => {
                println!("{} ({:?})", t.fullname(), t.kind());
                Ok(())
            }
            None => Err(anyhow!("could not load `{fullname}`")),
        },
        Commands::Redirect { subject, before, after } => {
            domain.add_redirect(&subject, &before, &after)?;
            println!("redirect added: {subject} / {before} -> {after}");
            Ok(())
        }
    }
}
