use crate::{config::Config, fetch, pipeline::Pipeline, validate};
use anyhow::{Result, anyhow, bail};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::warn;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "obcanka")]
#[command(about = "Czech citizenship exam question-bank extractor (PDF → quiz JSON + images)")]
pub struct Args {
    #[command(subcommand)]
    pub cmd: Command,

    /// Path to config TOML. If omitted, uses ./obcanka.toml if present.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override log level (trace/debug/info/warn/error).
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Download the source question-bank PDF.
    Fetch {
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Extract sections, questions, answers and images into quiz JSON.
    Extract {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Cross-check image references in the JSON against extracted files.
    Validate {
        #[arg(long)]
        json: PathBuf,
        #[arg(long)]
        images_dir: Option<PathBuf>,
    },
}

pub fn dispatch(args: Args) -> Result<()> {
    let cfg_path = resolve_config_path(args.config.as_deref())?;
    let cfg = Config::load(&cfg_path)?;
    let _guard = init_logging(&args, &cfg)?;

    match &args.cmd {
        Command::Fetch { url, output } => {
            let summary = fetch::fetch(&cfg, url.as_deref(), output.as_deref())?;
            if cfg.global.print_summary {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            }
            Ok(())
        }
        Command::Extract { input, output } => {
            validate_input(input)?;
            let summary = Pipeline::new(&cfg).run(input, output.as_deref())?;
            if cfg.global.print_summary {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            }
            Ok(())
        }
        Command::Validate { json, images_dir } => {
            let report = validate::validate(&cfg, json, images_dir.as_deref())?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            match report.status {
                validate::Status::Failed => Err(anyhow!(
                    "{} referenced images missing from disk",
                    report.missing.len()
                )),
                validate::Status::Warning => {
                    warn!(
                        "{} orphaned images (expected at most {})",
                        report.orphaned.len(),
                        cfg.validation.expected_orphans
                    );
                    Ok(())
                }
                validate::Status::Ok => Ok(()),
            }
        }
    }
}

fn resolve_config_path(user: Option<&Path>) -> Result<PathBuf> {
    if let Some(p) = user {
        return Ok(p.to_path_buf());
    }
    let default = PathBuf::from("obcanka.toml");
    if default.exists() {
        Ok(default)
    } else {
        Ok(PathBuf::from("obcanka.example.toml"))
    }
}

fn init_logging(args: &Args, cfg: &Config) -> Result<Option<WorkerGuard>> {
    let level = args
        .log_level
        .as_deref()
        .unwrap_or(cfg.logging.level.as_str());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let stdout_layer = if cfg.logging.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .boxed()
    };

    let (file_layer, guard) = if let Some(path) = resolve_log_path(cfg) {
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        crate::util::ensure_dir(parent)?;
        let file = std::fs::File::create(&path)
            .map_err(|e| anyhow!("create log file {}: {e}", path.display()))?;
        let (non_blocking, guard) = tracing_appender::non_blocking(file);
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_target(true)
            .boxed();
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow!("failed to init logging: {e}"))?;

    Ok(guard)
}

fn resolve_log_path(cfg: &Config) -> Option<PathBuf> {
    if !cfg.logging.write_to_file {
        return None;
    }
    if !cfg.logging.file_path.is_empty() {
        return Some(PathBuf::from(&cfg.logging.file_path));
    }
    Some(PathBuf::from("obcanka.log"))
}

fn validate_input(input: &Path) -> Result<()> {
    let input_str = input.display().to_string();

    if looks_like_url(&input_str) {
        bail!("extract takes a local file; use `obcanka fetch` for URLs: {input_str}");
    }

    if !input.exists() {
        bail!("input does not exist: {}", input.display());
    }

    if let Some(ext) = input.extension().and_then(|s| s.to_str()) {
        if ext.to_ascii_lowercase() != "pdf" {
            bail!("input is not a PDF: {}", input.display());
        }
    } else {
        warn!("input has no extension; assuming PDF: {}", input.display());
    }

    Ok(())
}

fn looks_like_url(s: &str) -> bool {
    let s = s.to_ascii_lowercase();
    s.starts_with("http://") || s.starts_with("https://") || s.starts_with("file://")
}
