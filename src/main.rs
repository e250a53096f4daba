//! Command-line post-processor that adds an adaptive purge and bed mesh to
//! sliced G-code.

#![deny(missing_docs)]

use std::{
    io::{Read, Write},
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use clap::Parser;
use purge_mesh::{analyze, transform, Config, Document, PurgeConfig, PurgeShape};
use tracing_subscriber::prelude::*;

const DEFAULT_CONFIG: &str = "purge-mesh.toml";

/// Add an adaptive purge point and bed mesh region to sliced G-code.
#[derive(Parser, Debug, Clone)]
#[clap(version = clap::crate_version!(), author = clap::crate_authors!("\n"))]
pub struct Opts {
    /// Print debug info
    #[clap(short, long)]
    pub debug: bool,

    /// Print logs as json
    #[clap(short, long)]
    pub json: bool,

    /// The subcommand to run.
    #[clap(subcommand)]
    pub subcmd: SubCommand,

    /// Path to config file. Defaults to `purge-mesh.toml` when present.
    #[clap(short, long)]
    pub config: Option<PathBuf>,

    /// Overrides for the purge section of the config file.
    #[clap(flatten)]
    pub purge: PurgeArgs,
}

/// A subcommand for our cli.
#[derive(Parser, Debug, Clone)]
pub enum SubCommand {
    /// Add the adaptive purge and mesh block to a G-code file.
    Process {
        /// G-code file to read, or `-` for stdin.
        input: PathBuf,

        /// Where to write the result. Defaults to stdout.
        #[clap(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the computed purge point and probe region as json.
    Plan {
        /// G-code file to read, or `-` for stdin.
        input: PathBuf,
    },
}

/// Command-line overrides for [PurgeConfig].
#[derive(Parser, Debug, Clone)]
pub struct PurgeArgs {
    /// Use the fixed 10mm offset and emit only the purge coordinates.
    #[clap(long, conflicts_with_all = ["x_offset", "purge_distance", "purge_shape"])]
    pub fixed: bool,

    /// Distance to the left of the first layer (mm).
    #[clap(long)]
    pub x_offset: Option<f64>,

    /// Length of the purge line or triangle sides (mm).
    #[clap(long)]
    pub purge_distance: Option<f64>,

    /// Purge geometry: `Triangle`, anything else is a line.
    #[clap(long, value_parser = parse_shape)]
    pub purge_shape: Option<PurgeShape>,
}

impl PurgeArgs {
    fn apply(&self, purge: PurgeConfig) -> PurgeConfig {
        if self.fixed {
            return PurgeConfig::Fixed;
        }
        if self.x_offset.is_none() && self.purge_distance.is_none() && self.purge_shape.is_none() {
            return purge;
        }

        let base = match purge {
            PurgeConfig::Fixed => PurgeConfig::default(),
            configurable => configurable,
        };
        match base {
            PurgeConfig::Configurable {
                x_offset,
                purge_distance,
                purge_shape,
            } => PurgeConfig::Configurable {
                x_offset: self.x_offset.unwrap_or(x_offset),
                purge_distance: self.purge_distance.unwrap_or(purge_distance),
                purge_shape: self.purge_shape.unwrap_or(purge_shape),
            },
            PurgeConfig::Fixed => base,
        }
    }
}

fn parse_shape(value: &str) -> Result<PurgeShape, std::convert::Infallible> {
    Ok(PurgeShape::from_setting(value))
}

impl Opts {
    /// Load the config file and apply command-line overrides.
    pub fn load_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG).exists() => Config::from_file(Path::new(DEFAULT_CONFIG))?,
            None => {
                tracing::debug!("no {} found, using defaults", DEFAULT_CONFIG);
                Config::default()
            }
        };
        config.purge = self.purge.apply(config.purge);
        config.validate()?;
        Ok(config)
    }

    fn init_tracing(&self) {
        let level = if self.debug { "debug" } else { "info" };
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

        // Logs go to stderr; stdout may be carrying G-code.
        let (json, plain) = if self.json {
            (
                Some(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)),
                None,
            )
        } else {
            (
                None,
                Some(tracing_subscriber::fmt::layer().compact().with_writer(std::io::stderr)),
            )
        };

        tracing_subscriber::registry().with(filter).with(json).with(plain).init();
    }
}

fn main() -> Result<()> {
    let opts: Opts = Opts::parse();
    opts.init_tracing();

    let config = opts.load_config()?;

    if let Err(err) = run_cmd(&opts, &config) {
        bail!("running cmd `{:?}` failed: {:?}", &opts.subcmd, err);
    }

    Ok(())
}

fn run_cmd(opts: &Opts, config: &Config) -> Result<()> {
    match &opts.subcmd {
        SubCommand::Process { input, output } => {
            let document = Document::from_program(&read_program(input)?);
            let program = transform(document, config)?.to_program();

            match output {
                Some(path) => {
                    std::fs::write(path, program).with_context(|| format!("failed to write {}", path.display()))?;
                    tracing::info!(path = %path.display(), "wrote program");
                }
                None => {
                    let mut stdout = std::io::stdout().lock();
                    stdout.write_all(program.as_bytes())?;
                    stdout.flush()?;
                }
            }
        }
        SubCommand::Plan { input } => {
            let document = Document::from_program(&read_program(input)?);
            match analyze(&document, config)? {
                Some(plan) => println!("{}", serde_json::to_string_pretty(&plan)?),
                None => println!("no first layer extrusion found"),
            }
        }
    }

    Ok(())
}

fn read_program(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut program = String::new();
        std::io::stdin()
            .read_to_string(&mut program)
            .context("failed to read stdin")?;
        return Ok(program);
    }
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}
