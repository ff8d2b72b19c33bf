//! substack - overlap-stitching check for substack segmentation
//!
//! Cuts a probability stack into two overlapping slabs per overlap width,
//! segments each slab independently and reports whether the two labelings
//! agree in the overlap, for every threshold.
//!
//! Usage:
//!   substack probs_*.png results.tsv -T 250 -t 96,128,160
//!   substack probs_*.png - -w ws_*.png --json
//!   substack probs_*.png out.tsv --no-progress -t 96 128

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
use substack::config::SweepConfig;
use substack::oracle::superpixels;
use substack::vol::io::{read_label_stack, read_prob_stack};
use substack::vol::{LabelVol, ProbVol, XyCrop};
use substack::{BoundaryThresholdOracle, MatchDirection, ResultTable, filter, run_sweep_observed};

#[derive(Parser)]
#[command(name = "substack")]
#[command(about = "Check that overlapping substack segmentations stitch into one labeling")]
#[command(version)]
struct Cli {
    /// The boundary probability map file(s), one per z plane.
    #[arg(required = true, num_args = 1..)]
    fin: Vec<PathBuf>,

    /// The output filename (use - for stdout).
    fout: String,

    /// Invert the probabilities before segmenting.
    #[arg(short = 'I', long)]
    invert_image: bool,

    /// Crop in x and y as XMIN,XMAX,YMIN,YMAX. Leave an entry empty for no bound.
    #[arg(short = 'x', long, value_name = "XMIN,XMAX,YMIN,YMAX", allow_hyphen_values = true)]
    xy_crop: Option<XyCrop>,

    /// Precomputed watershed label slices, one per z plane.
    #[arg(short = 'w', long, value_name = "WS_FN", num_args = 1.., value_delimiter = ',')]
    watershed: Vec<PathBuf>,

    /// The agglomeration thresholds.
    #[arg(short = 't', long, value_name = "FLOAT", num_args = 1.., value_delimiter = ',')]
    thresholds: Vec<f64>,

    /// Overlap widths to sweep (odd). Defaults to 3,5,9,...,129.
    #[arg(long, value_name = "N", num_args = 1.., value_delimiter = ',')]
    overlaps: Vec<usize>,

    /// How thick each substack should be.
    #[arg(short = 'T', long)]
    thickness: Option<usize>,

    /// Run a 3x3x3 median filter on the input.
    #[arg(short = 'm', long)]
    median_filter: bool,

    /// Apply a gaussian filter before segmenting.
    #[arg(short = 'g', long, value_name = "SIGMA")]
    gaussian_filter: Option<f32>,

    /// Require the label correspondence to hold in both directions.
    #[arg(long)]
    bijective: bool,

    /// Worker threads (all cores by default).
    #[arg(short = 'j', long)]
    jobs: Option<usize>,

    /// JSON sweep config; command-line flags override it.
    #[arg(short = 'c', long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Write the result matrix as JSON instead of a TSV table.
    #[arg(long)]
    json: bool,

    /// Show a progress bar for the sweep (the default).
    #[arg(short = 'P', long, overrides_with = "no_progress")]
    show_progress: bool,

    /// Hide the progress bar.
    #[arg(long, overrides_with = "show_progress")]
    no_progress: bool,

    /// Print runtime information about execution.
    #[arg(short = 'v', long)]
    verbose: bool,
}

impl Cli {
    fn progress_enabled(&self) -> bool {
        !self.no_progress
    }

    fn sweep_config(&self) -> Result<SweepConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let json = std::fs::read_to_string(path)
                    .with_context(|| format!("reading config {}", path.display()))?;
                SweepConfig::from_json(&json).with_context(|| format!("parsing config {}", path.display()))?
            }
            None => SweepConfig::default(),
        };

        if let Some(t) = self.thickness {
            config.thickness = t;
        }
        if !self.thresholds.is_empty() {
            config.thresholds = self.thresholds.clone();
        }
        if !self.overlaps.is_empty() {
            config.overlaps = self.overlaps.clone();
        }
        if let Some(crop) = self.xy_crop {
            config.xy_crop = crop;
        }
        if self.bijective {
            config.direction = MatchDirection::Bijective;
        }
        if self.jobs.is_some() {
            config.workers = self.jobs;
        }
        Ok(config)
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose { tracing::Level::DEBUG } else { tracing::Level::WARN };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();
}

fn load_probs(cli: &Cli) -> Result<ProbVol> {
    let mut probs = read_prob_stack(cli.fin.as_slice()).context("reading probability stack")?;
    if cli.invert_image {
        probs = filter::invert(&probs);
    }
    if cli.median_filter {
        probs = filter::median3(&probs);
    } else if let Some(sigma) = cli.gaussian_filter {
        probs = filter::gaussian(&probs, sigma)?;
    }
    Ok(probs)
}

fn load_labels(cli: &Cli, probs: &ProbVol) -> Result<LabelVol> {
    if cli.watershed.is_empty() {
        let level = probs.max_val() / 2.0;
        tracing::info!(level, "no watershed given, deriving superpixels");
        return Ok(superpixels(probs, level));
    }
    read_label_stack(cli.watershed.as_slice()).context("reading watershed stack")
}

fn write_output(cli: &Cli, out: &mut dyn Write, bytes: &[u8]) -> Result<()> {
    out.write_all(bytes)
        .and_then(|_| out.flush())
        .with_context(|| format!("writing {}", cli.fout))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = cli.sweep_config()?;
    let probs = load_probs(&cli)?;
    let labels = load_labels(&cli, &probs)?;

    let n_cells = (config.thresholds.len() * config.overlaps.len()) as u64;
    let bar = if cli.progress_enabled() {
        let bar = ProgressBar::new(n_cells);
        bar.set_style(
            ProgressStyle::with_template("{bar:40.green} {pos}/{len} cells [{elapsed}]")
                .context("progress template")?,
        );
        Some(bar)
    } else {
        None
    };

    let matrix = run_sweep_observed(&probs, &labels, &BoundaryThresholdOracle, &config, |_| {
        if let Some(bar) = &bar {
            bar.inc(1);
        }
    })
    .context("overlap sweep failed")?;
    if let Some(bar) = &bar {
        bar.finish_and_clear();
    }

    match matrix.min_safe_overlap() {
        Some(w) => tracing::info!(overlap = w, "smallest overlap passing every threshold"),
        None => tracing::warn!("no overlap width passed for every threshold"),
    }

    let bytes = if cli.json {
        let mut json = serde_json::to_vec_pretty(&matrix)?;
        json.push(b'\n');
        json
    } else {
        ResultTable::from_matrix(&matrix)?.to_tsv().into_bytes()
    };

    if cli.fout == "-" {
        write_output(&cli, &mut io::stdout().lock(), &bytes)
    } else {
        let mut file = std::fs::File::create(&cli.fout).with_context(|| format!("creating {}", cli.fout))?;
        write_output(&cli, &mut file, &bytes)
    }
}
