//! carton CLI: pull files from content-addressable artifact registries.

mod commands;
mod config;
mod display;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::pull::PullOptions;
use config::CartonConfig;

#[derive(Parser)]
#[command(name = "carton", version, about = "Content-addressable artifact puller")]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Root directory of the local registry store (default: `.carton-registry`,
    /// or `registry_root` from carton.toml)
    #[arg(long, global = true)]
    registry_root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pull an artifact's files from the registry
    Pull {
        /// Reference to pull (name:tag or name@digest)
        reference: String,
        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Do not replace existing files when pulling, treat them as errors
        #[arg(short, long)]
        keep_old_files: bool,
        /// Allow storing files out of the output directory
        #[arg(short = 'T', long)]
        allow_path_traversal: bool,
        /// Output manifest config file, as `path[:mediatype]`
        #[arg(long)]
        manifest_config: Option<String>,
        /// Media type that must be present in the pulled tree
        #[arg(long)]
        required_media_type: Option<String>,
        /// Hide status output
        #[arg(short, long)]
        quiet: bool,
        /// Append an audit entry per downloaded file to this lock file
        #[arg(long)]
        lock_file: Option<PathBuf>,
    },
    /// Pull a comma-separated list of references, recording a lock file
    Resolve {
        /// References to pull, comma separated
        references: String,
        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Lock file path (default: carton.lock)
        #[arg(long)]
        lock_file: Option<PathBuf>,
    },
    /// List all published tags for a repository
    Tags {
        /// Repository reference without a tag (registry/repository)
        reference: String,
        /// Prefix printed before each tag
        #[arg(long, default_value = "")]
        prefix: String,
    },
    /// Fetch collection metadata and list available features
    Metadata {
        /// Collection reference (defaults to :latest when untagged)
        reference: String,
    },
}

fn main() {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        _ => EnvFilter::new("debug"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;
    let config = match CartonConfig::find_and_load(&cwd)? {
        Some((config, dir)) => {
            tracing::debug!(dir = %dir.display(), "loaded carton.toml");
            config
        }
        None => CartonConfig::default(),
    };

    let registry_root = cli
        .registry_root
        .or_else(|| config.registry_root.clone())
        .unwrap_or_else(|| PathBuf::from(".carton-registry"));
    let cache_root = config::cache_root(&config);

    match cli.command {
        Commands::Pull {
            reference,
            output,
            keep_old_files,
            allow_path_traversal,
            manifest_config,
            required_media_type,
            quiet,
            lock_file,
        } => {
            let opts = PullOptions {
                output: output.or_else(|| config.output_dir.clone()),
                keep_old_files,
                allow_path_traversal,
                manifest_config,
                required_media_type,
                quiet,
                lock_file,
                cache_root,
            };
            commands::pull::run(&registry_root, &reference, &opts)
        }

        Commands::Resolve {
            references,
            output,
            lock_file,
        } => commands::resolve::run(
            &registry_root,
            &references,
            output.or_else(|| config.output_dir.clone()),
            lock_file.or_else(|| config.lock_file.clone()),
            cache_root,
        ),

        Commands::Tags { reference, prefix } => {
            commands::tags::run(&registry_root, &reference, &prefix)
        }

        Commands::Metadata { reference } => {
            commands::metadata::run(&registry_root, &reference, cache_root)
        }
    }
}
