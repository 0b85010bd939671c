mod config;
mod pipeline;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use config::Config;
use lidline_core::{EyelidConfig, OnnxLandmarkSource, PartTable};
use pipeline::BatchSummary;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "lidline", about = "Facial part masks and double-eyelid line synthesis")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate per-part binary masks from face images
    Masks {
        /// Directory of face images
        #[arg(short, long)]
        input: PathBuf,
        /// Root directory for mask output (one subdirectory per part)
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Draw eyelid lines using previously generated eye masks
    Eyelids {
        #[command(flatten)]
        paths: EyelidPaths,
        #[command(flatten)]
        style: StyleArgs,
    },
    /// Generate masks, then draw eyelid lines
    Run {
        #[command(flatten)]
        paths: EyelidPaths,
        #[command(flatten)]
        style: StyleArgs,
    },
}

#[derive(Args)]
struct EyelidPaths {
    /// Directory of face images
    #[arg(short, long)]
    input: PathBuf,
    /// Root directory of part masks
    #[arg(short, long)]
    masks: PathBuf,
    /// Directory for images with eyelid lines drawn
    #[arg(short, long)]
    output: PathBuf,
    /// JSON file receiving all eyelid coordinates
    #[arg(short, long, default_value = "eyelid_coordinates.json")]
    record: PathBuf,
}

#[derive(Args)]
struct StyleArgs {
    /// TOML file with eyelid style settings
    #[arg(long)]
    style: Option<PathBuf>,
    /// Vertical offset of the first line from the eye's top (negative = up)
    #[arg(long, allow_hyphen_values = true)]
    eyelid_offset: Option<i32>,
    /// Vertical gap between stacked lines
    #[arg(long)]
    line_spacing: Option<i32>,
    /// Number of lines per eye
    #[arg(long)]
    num_lines: Option<u32>,
    /// Line thickness in pixels
    #[arg(long)]
    thickness: Option<u32>,
    /// Line color as R,G,B
    #[arg(long, value_parser = config::parse_color)]
    color: Option<[u8; 3]>,
}

impl StyleArgs {
    /// Style file (or defaults) with command-line overrides applied.
    fn resolve(&self) -> Result<EyelidConfig> {
        let mut style = match &self.style {
            Some(path) => config::load_style(path)?,
            None => EyelidConfig::default(),
        };
        if let Some(v) = self.eyelid_offset {
            style.eyelid_offset = v;
        }
        if let Some(v) = self.line_spacing {
            style.line_spacing = v;
        }
        if let Some(v) = self.num_lines {
            style.num_lines = v;
        }
        if let Some(v) = self.thickness {
            style.thickness = v;
        }
        if let Some(v) = self.color {
            style.color = v;
        }
        Ok(style)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Masks { input, output } => {
            let summary = run_masks(&input, &output)?;
            print_summary("masks", &summary);
        }
        Commands::Eyelids { paths, style } => {
            let style = style.resolve()?;
            run_eyelids(&paths, &style)?;
        }
        Commands::Run { paths, style } => {
            let style = style.resolve()?;
            let summary = run_masks(&paths.input, &paths.masks)?;
            print_summary("masks", &summary);
            run_eyelids(&paths, &style)?;
        }
    }

    Ok(())
}

fn run_masks(input: &Path, output: &Path) -> Result<BatchSummary> {
    let config = Config::from_env();
    let mut source = OnnxLandmarkSource::load(
        &config.detector_model_path(),
        &config.landmark_model_path(),
        config.confidence_threshold,
    )
    .context("loading landmark models")?;

    pipeline::generate_masks(&mut source, &PartTable::standard(), input, output)
}

fn run_eyelids(paths: &EyelidPaths, style: &EyelidConfig) -> Result<()> {
    tracing::debug!(?style, "eyelid style");
    let (summary, record) = pipeline::draw_eyelids(&paths.input, &paths.masks, &paths.output, style)?;
    record
        .save(&paths.record)
        .with_context(|| format!("saving eyelid record {}", paths.record.display()))?;
    print_summary("eyelids", &summary);
    println!("Eyelid coordinates saved to {}", paths.record.display());
    Ok(())
}

fn print_summary(stage: &str, summary: &BatchSummary) {
    println!(
        "{stage}: {} of {} images processed, {} skipped",
        summary.processed, summary.total, summary.skipped
    );
    if summary.write_failures > 0 {
        println!("{stage}: {} output files failed to write", summary.write_failures);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_run_with_overrides() {
        let cli = Cli::try_parse_from([
            "lidline", "run", "-i", "faces", "-m", "masks", "-o", "out", "--eyelid-offset", "-12", "--color",
            "255,0,0", "--num-lines", "2",
        ])
        .unwrap();
        let Commands::Run { paths, style } = cli.command else {
            panic!("expected run");
        };
        assert_eq!(paths.record, PathBuf::from("eyelid_coordinates.json"));

        let resolved = style.resolve().unwrap();
        assert_eq!(resolved.eyelid_offset, -12);
        assert_eq!(resolved.color, [255, 0, 0]);
        assert_eq!(resolved.num_lines, 2);
        assert_eq!(resolved.line_spacing, 5);
    }

    #[test]
    fn test_cli_rejects_bad_color() {
        let result = Cli::try_parse_from([
            "lidline", "eyelids", "-i", "a", "-m", "b", "-o", "c", "--color", "red",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_style_without_overrides_is_default() {
        let cli = Cli::try_parse_from(["lidline", "eyelids", "-i", "a", "-m", "b", "-o", "c"]).unwrap();
        let Commands::Eyelids { style, .. } = cli.command else {
            panic!("expected eyelids");
        };
        assert_eq!(style.resolve().unwrap(), EyelidConfig::default());
    }
}
