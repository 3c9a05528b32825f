use std::path::{Path, PathBuf};

use clap::Parser;
use featbench::{image_io::load_color_image, BenchConfig};
#[cfg(feature = "tracing")]
use featbench_core::init_tracing;

#[cfg(feature = "tracing")]
use tracing_log::LogTracer;

/// Score the reference FAST+BRIEF pipeline under synthetic distortions.
#[derive(Parser, Debug)]
#[command(name = "featbench", version, about)]
struct Args {
    /// Benchmark config (JSON).
    config: PathBuf,

    /// Report destination; overrides `output_path` from the config.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Level directives, e.g. `info` or `warn,featbench_eval=debug`.
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit JSON log lines.
    #[cfg(feature = "tracing")]
    #[arg(long)]
    json_logs: bool,
}

fn init_logging(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    #[cfg(feature = "tracing")]
    {
        let _ = LogTracer::init();
        init_tracing(&args.log_level, args.json_logs);
    }
    #[cfg(not(feature = "tracing"))]
    env_logger::Builder::new()
        .parse_filters(&args.log_level)
        .target(env_logger::Target::Stderr)
        .try_init()?;
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logging(&args)?;

    let cfg = BenchConfig::load_json(&args.config)?;
    let base_dir = args.config.parent().unwrap_or(Path::new("."));
    let image_path = cfg.resolve_image_path(base_dir);
    log::info!("loading {}", image_path.display());
    let img = load_color_image(&image_path)?;

    let report = cfg.run(&img)?;
    for run in &report.summary {
        println!(
            "{:<12} {:<24} frames {:>4} valid {:>4} precision {} recall {}",
            run.algorithm,
            run.transformation,
            run.frames,
            run.valid_frames,
            fmt_mean(run.mean_precision),
            fmt_mean(run.mean_recall)
        );
    }

    let output = args.output.unwrap_or_else(|| cfg.output_path());
    report.write_json(&output)?;
    log::info!("report written to {}", output.display());
    Ok(())
}

fn fmt_mean(v: Option<f32>) -> String {
    v.map_or_else(|| "-".to_string(), |v| format!("{v:.3}"))
}
