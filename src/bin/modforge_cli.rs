//! ModForge CLI - Build Driver
//!
//! Commands: build, manifest, config
//! Outputs JSON to stdout; logs go to stderr
//! Returns non-zero on build failure

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use modforge_core::{
    config::{resolve_output_dir, BuildConfig, BuildMode, PackageInfo},
    manifest::generate_manifest,
    Compiler,
};

#[derive(Parser)]
#[command(name = "modforge-cli")]
#[command(about = "ModForge CLI - Module Build Pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Project root directory
    #[arg(short, long, default_value = ".")]
    root: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one compilation and persist the output tree
    Build,

    /// Render the manifest to stdout without running a build
    Manifest {
        /// Template path override, relative to the project root
        #[arg(long)]
        src_file: Option<PathBuf>,
    },

    /// Print the resolved configuration and environment
    Config,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mode = BuildMode::from_env();

    match cli.command {
        Commands::Build => {
            let compiler = match Compiler::from_project(&cli.root, mode) {
                Ok(c) => c,
                Err(e) => {
                    eprintln!(r#"{{"error": "Failed to load project: {}"}}"#, e);
                    return ExitCode::FAILURE;
                }
            };

            match compiler.run() {
                Ok(stats) => {
                    println!("{}", serde_json::to_string_pretty(&stats).unwrap());
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    let output = serde_json::json!({
                        "success": false,
                        "error": e.to_string(),
                    });
                    println!("{}", serde_json::to_string(&output).unwrap());
                    ExitCode::from(2) // Build failure
                }
            }
        }

        Commands::Manifest { src_file } => {
            let package = match PackageInfo::load(&cli.root) {
                Ok(p) => p,
                Err(e) => {
                    eprintln!(r#"{{"error": "Failed to load package descriptor: {}"}}"#, e);
                    return ExitCode::FAILURE;
                }
            };
            let config = match BuildConfig::load(&cli.root) {
                Ok(c) => c,
                Err(e) => {
                    eprintln!(r#"{{"error": "Failed to load build config: {}"}}"#, e);
                    return ExitCode::FAILURE;
                }
            };

            let src = cli.root.join(src_file.unwrap_or(config.manifest.src_file));
            match generate_manifest(&src, &package.version) {
                Ok(rendered) => {
                    println!("{rendered}");
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    let output = serde_json::json!({
                        "success": false,
                        "error": e.to_string(),
                    });
                    println!("{}", serde_json::to_string(&output).unwrap());
                    ExitCode::from(2) // Generation failure
                }
            }
        }

        Commands::Config => {
            let package = match PackageInfo::load(&cli.root) {
                Ok(p) => p,
                Err(e) => {
                    eprintln!(r#"{{"error": "Failed to load package descriptor: {}"}}"#, e);
                    return ExitCode::FAILURE;
                }
            };
            let config = match BuildConfig::load(&cli.root) {
                Ok(c) => c,
                Err(e) => {
                    eprintln!(r#"{{"error": "Failed to load build config: {}"}}"#, e);
                    return ExitCode::FAILURE;
                }
            };

            let output_dir = resolve_output_dir(&cli.root, mode, &package);
            let output = serde_json::json!({
                "mode": mode,
                "package": package,
                "outputDir": output_dir,
                "config": config,
            });
            println!("{}", serde_json::to_string_pretty(&output).unwrap());
            ExitCode::SUCCESS
        }
    }
}
