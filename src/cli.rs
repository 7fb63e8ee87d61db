use crate::catalog::{CatalogEntry, LayoutCatalog};
use crate::config::{Config, EngineConfig, load_config};
use crate::coords::{PixelSystem, UnitSystem};
use crate::fix::auto_fix;
use crate::ir::Descriptor;
use crate::parser::parse_descriptor;
use crate::prompt::constraint_prompt;
use crate::render::{render_preview_svg, write_preview_svg};
use crate::scene_dump::{SceneDump, project_scene, write_scene_dump};
use crate::validate::validate;
use anyhow::{Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "vizguard",
    version,
    about = "Validate and repair LLM-generated diagram descriptors before rendering"
)]
pub struct Args {
    /// Descriptor file (raw JSON or a whole model reply) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Where to write the JSON report. Defaults to stdout.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Layout mode: full, split, stepByStep or grid
    #[arg(short = 'm', long = "mode", default_value = "full")]
    pub mode: String,

    /// Repair the descriptor and report the fixed version
    #[arg(long = "fix")]
    pub fix: bool,

    /// Print the constraint block for the mode and exit
    #[arg(long = "prompt")]
    pub prompt: bool,

    /// Coordinate system for --dump
    #[arg(long = "dump-system", value_enum, default_value = "pixel")]
    pub dump_system: DumpSystem,

    /// Write the projected scene as JSON
    #[arg(long = "dump")]
    pub dump: Option<PathBuf>,

    /// Write a diagnostic SVG of the predicted layout
    #[arg(long = "preview")]
    pub preview: Option<PathBuf>,

    /// Config file (JSON or JSON5)
    #[arg(short = 'c', long = "config", alias = "configFile")]
    pub config: Option<PathBuf>,

    /// Log more (-v info, -vv debug)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DumpSystem {
    Pixel,
    Unit,
}

/// Result of checking one descriptor from the command line.
#[derive(Debug)]
pub struct Evaluation {
    /// Pretty JSON: the validation report, or the whole fix outcome.
    pub report: String,
    /// Descriptor that previews and dumps are drawn from.
    pub descriptor: Descriptor,
    pub valid: bool,
}

/// Runs the command line. Returns whether the (possibly repaired) descriptor
/// is safe to render.
pub fn run() -> Result<bool> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = load_config(args.config.as_deref())?;
    let catalog = LayoutCatalog::new(&config.engine.canvas, &config.modes)
        .context("building layout catalog")?;
    let entry = catalog.lookup(&args.mode)?;

    if args.prompt {
        write_text(&constraint_prompt(entry), args.output.as_deref())?;
        return Ok(true);
    }

    let input = read_input(args.input.as_deref())?;
    let evaluation = evaluate(&input, entry, &config.engine, args.fix)?;

    if args.dump.is_some() || args.preview.is_some() {
        write_artifacts(&args, &evaluation.descriptor, entry, &config)?;
    }
    write_text(&evaluation.report, args.output.as_deref())?;
    Ok(evaluation.valid)
}

pub fn evaluate(
    input: &str,
    entry: &CatalogEntry,
    config: &EngineConfig,
    fix: bool,
) -> Result<Evaluation> {
    let descriptor = parse_descriptor(input).context("reading descriptor")?;
    if fix {
        let outcome = auto_fix(&descriptor, entry, config)?;
        let report = serde_json::to_string_pretty(&outcome)?;
        return Ok(Evaluation {
            report,
            valid: outcome.report.valid,
            descriptor: outcome.descriptor,
        });
    }
    let result = validate(&descriptor, entry, config)?;
    Ok(Evaluation {
        report: serde_json::to_string_pretty(&result)?,
        valid: result.valid,
        descriptor,
    })
}

fn write_artifacts(
    args: &Args,
    descriptor: &Descriptor,
    entry: &CatalogEntry,
    config: &Config,
) -> Result<()> {
    if let Some(path) = args.dump.as_deref() {
        let dump = match args.dump_system {
            DumpSystem::Pixel => {
                project_scene::<PixelSystem>(descriptor, entry, &config.engine, &config.theme)?
            }
            DumpSystem::Unit => {
                project_scene::<UnitSystem>(descriptor, entry, &config.engine, &config.theme)?
            }
        };
        write_scene_dump(path, &dump)?;
    }
    if let Some(path) = args.preview.as_deref() {
        let scene: SceneDump =
            project_scene::<PixelSystem>(descriptor, entry, &config.engine, &config.theme)?;
        write_preview_svg(&render_preview_svg(&scene, &config.theme), path)?;
    }
    Ok(())
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        _ => tracing::Level::DEBUG,
    };
    // A subscriber may already be installed when embedded in a larger tool.
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path {
        if path != Path::new("-") {
            return std::fs::read_to_string(path)
                .with_context(|| format!("reading input {}", path.display()));
        }
    }
    let mut buf = String::new();
    io::stdin()
        .read_to_string(&mut buf)
        .context("reading descriptor from stdin")?;
    Ok(buf)
}

fn write_text(text: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, text).with_context(|| format!("writing {}", path.display()))?;
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(text.as_bytes())?;
            if !text.ends_with('\n') {
                stdout.write_all(b"\n")?;
            }
        }
    }
    Ok(())
}
