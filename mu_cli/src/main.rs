#![warn(clippy::all, clippy::pedantic)]

mod dump_model;
mod dump_script;
mod dump_terrain;
mod dump_texture;

use std::{error::Error, path::PathBuf, process::ExitCode};

use clap::{Parser, Subcommand};
use mu_asset_core::{AssetCache, Settings};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use dump_model::DumpModel;
use dump_script::DumpScript;
use dump_terrain::DumpTerrain;
use dump_texture::DumpTexture;

#[derive(Parser)]
#[clap(version = "0.1.0")]
struct Opts {
    /// Directory asset paths are relative to
    #[clap(short, long, default_value = ".", parse(from_os_str))]
    root: PathBuf,
    /// Number of decoder threads
    #[clap(short, long)]
    threads: Option<usize>,
    #[clap(subcommand)]
    subcommand: SubCommand,
}

#[derive(Subcommand)]
enum SubCommand {
    Model(DumpModel),
    Texture(DumpTexture),
    Terrain(DumpTerrain),
    Script(DumpScript),
}

fn run(opts: Opts) -> Result<(), Box<dyn Error>> {
    debug!(root = %opts.root.display(), threads = ?opts.threads, "starting");

    let mut settings = Settings::new(opts.root);
    if let Some(threads) = opts.threads {
        settings.threads(threads);
    }

    match opts.subcommand {
        SubCommand::Model(opts) => dump_model::dump_model(&opts, &AssetCache::new(settings)?),
        SubCommand::Texture(opts) => {
            dump_texture::dump_texture(&opts, &AssetCache::new(settings)?)
        }
        SubCommand::Terrain(opts) => {
            dump_terrain::dump_terrain(&opts, &AssetCache::new(settings)?)
        }
        SubCommand::Script(opts) => dump_script::dump_script(&opts),
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let opts = Opts::parse();

    match run(opts) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
