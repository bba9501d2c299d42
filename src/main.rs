use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{ArgAction, Parser, builder::BoolishValueParser};
use image_budget::artifact::to_kb;
use image_budget::error::classify;
use image_budget::{
    BatchDriver, BatchReport, CompressConfig, CompressError, CompressionOutcome, Reencoder,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Shrink oversized images in place before they are committed.
#[derive(Parser, Debug)]
#[command(name = "compress-images")]
#[command(version, about = "🗜️ Re-encode images that exceed a size budget")]
#[command(long_about = "Walks a directory (or checks the given files) and re-encodes every JPEG, WebP \
or PNG larger than the budget. JPEG and WebP are retried at decreasing quality until one \
candidate fits; PNG is recompressed once losslessly. Originals are replaced atomically and only \
by a candidate that fits.")]
struct Args {
    /// Files to check instead of walking --dir (e.g. staged files from a pre-commit hook)
    files: Vec<PathBuf>,

    /// Maximum allowed size in kilobytes
    #[arg(short = 's', long = "max-size", env = "IMAGE_MAX_SIZE_KB", default_value_t = 500)]
    max_size_kb: u64,

    /// First quality level tried for JPEG and WebP
    #[arg(short, long, env = "IMAGE_QUALITY", default_value_t = 60,
          value_parser = clap::value_parser!(u8).range(0..=100))]
    quality: u8,

    /// Lowest quality the ladder may reach
    #[arg(long, env = "IMAGE_MIN_QUALITY", default_value_t = 20,
          value_parser = clap::value_parser!(u8).range(0..=100))]
    min_quality: u8,

    /// Quality decrement between attempts
    #[arg(long, env = "IMAGE_QUALITY_STEP", default_value_t = 5,
          value_parser = clap::value_parser!(u8).range(1..=100))]
    quality_step: u8,

    /// Maximum encode attempts per image
    #[arg(long, env = "IMAGE_MAX_ITERATIONS", default_value_t = 5)]
    max_iterations: usize,

    /// Root directory to scan
    #[arg(short, long, env = "IMAGE_DIR", default_value = ".")]
    dir: PathBuf,

    /// Exit non-zero when an image is still over budget after compression
    #[arg(long, env = "IMAGE_FAIL_ON_ERROR", default_value_t = true,
          action = ArgAction::Set, value_parser = BoolishValueParser::new())]
    fail_on_oversized: bool,

    /// Downscale images whose longest side exceeds this many pixels before encoding
    #[arg(long, env = "IMAGE_MAX_DIMENSION")]
    max_dimension: Option<u32>,

    /// Additional directory names to skip (repeatable)
    #[arg(long = "exclude", value_name = "NAME")]
    exclude: Vec<String>,

    /// Report what would change without replacing any file
    #[arg(long)]
    dry_run: bool,

    /// Print the final report as JSON instead of text
    #[arg(long)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn to_config(&self) -> CompressConfig {
        CompressConfig {
            min_quality: self.min_quality,
            quality_step: self.quality_step,
            max_iterations: self.max_iterations,
            max_dimension: self.max_dimension,
            dry_run: self.dry_run,
            ..CompressConfig::new(self.max_size_kb, self.quality, &self.dir, self.fail_on_oversized)
        }
        .with_excluded_dirs(self.exclude.iter().cloned())
    }
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();
    init_logging(args.verbose)?;

    let config = args.to_config();
    if let Err(e) = config.validate() {
        return Ok(abort(&e));
    }
    debug!(?config, "starting");

    let driver = BatchDriver::new(Reencoder::new(&config));
    let quiet = args.json;
    let dry_run = config.dry_run;
    let print_status = |path: &std::path::Path, outcome: &CompressionOutcome| {
        if !quiet {
            let suffix = if dry_run && outcome.is_compressed() { " (dry run)" } else { "" };
            println!("{} {}: {}{}", status_symbol(outcome), path.display(), outcome, suffix);
        }
    };

    let report = if args.files.is_empty() {
        match driver.run_root(print_status) {
            Ok(report) => report,
            Err(e) => return Ok(abort(&e)),
        }
    } else {
        driver.run(&args.files, print_status)
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report.to_json())?);
    } else {
        print_summary(&report);
    }

    if report.should_fail(config.fail_on_oversized) {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn abort(error: &CompressError) -> ExitCode {
    eprintln!("error: {}", classify::describe(error));
    ExitCode::from(classify::exit_status(error))
}

fn init_logging(verbose: bool) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) if verbose => EnvFilter::new("image_budget=debug,compress_images=debug"),
        Err(_) => EnvFilter::new("image_budget=warn,compress_images=warn"),
    };
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn status_symbol(outcome: &CompressionOutcome) -> &'static str {
    match outcome {
        CompressionOutcome::Unchanged { .. } => "✓",
        CompressionOutcome::Compressed { .. } => "✓",
        CompressionOutcome::Unsupported { .. } => "-",
        CompressionOutcome::Failed { .. } => "✗",
        CompressionOutcome::StillOversized { .. } => "⚠",
    }
}

fn print_summary(report: &BatchReport) {
    println!();
    println!("Summary");
    println!("───────");
    println!("Total:      {}", report.total);
    println!(
        "Compressed: {} (saved {:.1} KB)",
        report.compressed,
        to_kb(report.bytes_saved)
    );
    println!("Failed:     {}", report.failed);
    if report.unsupported > 0 {
        println!("Skipped:    {} (unsupported format)", report.unsupported);
    }

    if report.has_oversized() {
        println!();
        println!("Still over budget:");
        for (path, size) in &report.oversized {
            println!("  {} ({:.1} KB)", path.display(), to_kb(*size));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let args = Args::try_parse_from([
            "compress-images",
            "--max-size",
            "200",
            "--quality",
            "80",
            "--dir",
            "assets",
            "--fail-on-oversized",
            "false",
            "--exclude",
            "fixtures",
        ])
        .unwrap();
        let config = args.to_config();
        assert_eq!(config.max_size_kb, 200);
        assert_eq!(config.quality, 80);
        assert_eq!(config.root, PathBuf::from("assets"));
        assert!(!config.fail_on_oversized);
        assert!(config.is_excluded_dir("fixtures"));
        assert!(config.is_excluded_dir("node_modules"));
    }

    #[test]
    fn quality_out_of_range_is_rejected() {
        assert!(Args::try_parse_from(["compress-images", "--quality", "101"]).is_err());
        assert!(Args::try_parse_from(["compress-images", "--quality-step", "0"]).is_err());
    }

    #[test]
    fn positional_files_are_collected() {
        let args = Args::try_parse_from(["compress-images", "a.png", "b/c.jpg"]).unwrap();
        assert_eq!(args.files, vec![PathBuf::from("a.png"), PathBuf::from("b/c.jpg")]);
    }
}
