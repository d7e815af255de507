//! UltraStar song file CLI
//!
//! Detects, checks, migrates and reorders a single song file.
//!
//! Usage:
//!   usdx detect "ABBA - Dancing Queen.txt"
//!   usdx migrate song.txt --to 2.0.0 --diff
//!   usdx --help

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use ultrastar_format::codec::{self, WriteOptions};
use ultrastar_format::{diff, CheckStatus, Document, FormatConfig, FormatVersion, MigrationStatus};

#[derive(Parser)]
#[command(name = "usdx")]
#[command(about = "Inspect, check and migrate UltraStar song files")]
struct Cli {
    /// Config file to load on top of the default locations
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the detected format version
    Detect {
        file: PathBuf,
    },

    /// Show header, detection details and parse warnings
    Inspect {
        file: PathBuf,
        /// Output JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Check the header against its version schema
    Check {
        file: PathBuf,
    },

    /// Migrate a file to another format version
    Migrate {
        file: PathBuf,
        /// Target version (default: migration.default_target from config)
        #[arg(short, long)]
        to: Option<String>,
        /// Write the result here instead of stdout
        #[arg(short, long, conflicts_with = "in_place")]
        output: Option<PathBuf>,
        /// Overwrite the input file
        #[arg(long)]
        in_place: bool,
        /// Print a line diff of the changes
        #[arg(long)]
        diff: bool,
    },

    /// Reorder the header into the canonical key order
    Reorder {
        file: PathBuf,
        /// Overwrite the input file
        #[arg(long)]
        in_place: bool,
    },

    /// Show or create configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,
    /// Write a default config file
    Init {
        #[arg(default_value = "usdx.toml")]
        path: PathBuf,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn read_document(path: &Path) -> anyhow::Result<codec::Parsed> {
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    codec::parse_bytes_with_report(&bytes).with_context(|| format!("decoding {}", path.display()))
}

fn write_document(
    document: &Document,
    options: &WriteOptions,
    destination: Option<&Path>,
) -> anyhow::Result<()> {
    let bytes = codec::to_bytes(document, options);
    match destination {
        Some(path) => {
            fs::write(path, bytes).with_context(|| format!("writing {}", path.display()))?;
            println!("Wrote {}", path.display());
        }
        None => print!("{}", String::from_utf8_lossy(&bytes)),
    }
    Ok(())
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = FormatConfig::load_from(cli.config.as_deref()).context("loading configuration")?;
    let options = config.write.options();

    match cli.command {
        Commands::Detect { file } => {
            let parsed = read_document(&file)?;
            println!("{}", parsed.detection.version);
            Ok(())
        }

        Commands::Inspect { file, json } => {
            let parsed = read_document(&file)?;
            if json {
                let report = serde_json::json!({
                    "detection": parsed.detection,
                    "warnings": parsed.warnings,
                    "primary_audio": parsed.document.primary_audio_reference(),
                    "document": parsed.document,
                });
                println!("{}", serde_json::to_string_pretty(&report)?);
                return Ok(());
            }

            let doc = &parsed.document;
            println!("{}", doc.common_name());
            println!("  version: {} ({:?})", parsed.detection.version, parsed.detection.method);
            if let Some(audio) = doc.primary_audio_reference() {
                println!("  audio:   {}", audio);
            }
            println!("  body:    {} lines", doc.body().len());
            for (key, value) in doc.attributes() {
                println!("  #{}:{}", key, value.as_deref().unwrap_or_default());
            }
            for warning in &parsed.warnings {
                println!("  warning: {:?}", warning);
            }
            Ok(())
        }

        Commands::Check { file } => {
            let parsed = read_document(&file)?;
            let report = parsed.document.check();
            println!("{:?} (version {})", report.status(), report.version);
            for key in &report.missing_required {
                println!("  missing:  #{}", key);
            }
            for key in &report.empty_values {
                println!("  empty:    #{}", key);
            }
            for key in &report.invalid_numbers {
                println!("  invalid:  #{}", key);
            }
            for key in &report.unknown_keys {
                println!("  unknown:  #{}", key);
            }
            if report.status() != CheckStatus::Ok {
                std::process::exit(2);
            }
            Ok(())
        }

        Commands::Migrate {
            file,
            to,
            output,
            in_place,
            diff: show_diff,
        } => {
            let target = match to {
                Some(to) => FormatVersion::parse(&to)?,
                None => config.migration.default_target,
            };
            let parsed = read_document(&file)?;
            let original = parsed.document;
            let migration = original.migrate_to(target)?;

            eprintln!(
                "{} -> {} ({} hops)",
                original.version(),
                migration.document.version(),
                migration.hops.len()
            );
            if let MigrationStatus::Stopped { boundary } = migration.status {
                eprintln!("Stopped at the {} version {}", boundary, migration.document.version());
            }

            let mut document = migration.document;
            if config.write.reorder_canonical {
                document.reorder_canonical();
            }
            if show_diff {
                eprint!("{}", diff::diff(&original, &document));
            }

            let destination = if in_place { Some(file.as_path()) } else { output.as_deref() };
            write_document(&document, &options, destination)
        }

        Commands::Reorder { file, in_place } => {
            let parsed = read_document(&file)?;
            let mut document = parsed.document;
            document.reorder_canonical();
            write_document(&document, &options, in_place.then_some(file.as_path()))
        }

        Commands::Config { action } => match action {
            ConfigAction::Show => {
                println!("{}", toml::to_string_pretty(&config)?);
                Ok(())
            }
            ConfigAction::Init { path, force } => {
                if path.exists() && !force {
                    bail!("{} already exists (use --force to overwrite)", path.display());
                }
                FormatConfig::default().save(&path)?;
                println!("Wrote default configuration to {}", path.display());
                Ok(())
            }
        },
    }
}
