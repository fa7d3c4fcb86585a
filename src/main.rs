use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use litkeys::config::{parse_dedup_columns, Config, ExtractorKind, PipelineConfig};
use litkeys::corpus;
use litkeys::cutoff::CutoffMethod;
use litkeys::error::{KeywordError, LitkeysResult, Stage};
use litkeys::network::degree::StrengthMetric;
use litkeys::network::graph::Weighting;
use litkeys::output::sink::{ArtifactSink, FileSink};
use litkeys::output::terminal;
use litkeys::pipeline;
use litkeys::terms::LengthUnit;

/// Litkeys: keyword discovery for literature reviews.
///
/// Builds a co-occurrence network from the terms of a bibliographic corpus
/// and keeps the terms whose network strength clears a data-driven cutoff.
#[derive(Parser)]
#[command(name = "litkeys", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline and write keyword artifacts
    Run {
        /// Records as a JSON array or JSON Lines file
        #[arg(long, short)]
        input: PathBuf,

        /// Directory for output artifacts (default: LITKEYS_OUTPUT_DIR or ./outputs)
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Print results without writing any files
        #[arg(long)]
        no_save: bool,

        /// Also write the deduplicated records
        #[arg(long)]
        save_dataset: bool,

        #[command(flatten)]
        overrides: Overrides,
    },

    /// Show the degree distribution histogram for a corpus
    Histogram {
        #[arg(long, short)]
        input: PathBuf,

        #[command(flatten)]
        overrides: Overrides,
    },

    /// Show the effective configuration (defaults, env, then flags)
    Config {
        #[command(flatten)]
        overrides: Overrides,
    },
}

/// Per-run overrides on top of the environment configuration.
#[derive(Args)]
struct Overrides {
    /// Minimum term length (inclusive)
    #[arg(long)]
    min_len: Option<usize>,

    /// Maximum term length (inclusive)
    #[arg(long)]
    max_len: Option<usize>,

    /// Length unit: characters or words
    #[arg(long)]
    unit: Option<LengthUnit>,

    /// Comma-separated dedup fields (title,abstract,tags,text)
    #[arg(long)]
    dedup: Option<String>,

    /// Term extractor: phrase or tfidf
    #[arg(long)]
    extractor: Option<ExtractorKind>,

    /// Minimum number of records a phrase must occur in
    #[arg(long)]
    min_frequency: Option<usize>,

    /// Edge weighting: presence or count
    #[arg(long)]
    weighting: Option<Weighting>,

    /// Ranking metric: strength or degree
    #[arg(long)]
    metric: Option<StrengthMetric>,

    /// Cutoff method (spline)
    #[arg(long)]
    method: Option<CutoffMethod>,

    /// Spline polynomial degree
    #[arg(long)]
    degrees: Option<usize>,

    /// Number of interior spline knots
    #[arg(long)]
    knots: Option<usize>,

    /// Target cumulative share in (0, 1]
    #[arg(long)]
    percent: Option<f64>,

    /// Histogram bucket count
    #[arg(long)]
    bins: Option<usize>,

    /// Skip the fitted curve diagnostics
    #[arg(long)]
    no_diagnostics: bool,
}

impl Overrides {
    fn apply(&self, config: &mut PipelineConfig) -> Result<()> {
        if let Some(v) = self.min_len {
            config.min_len = v;
        }
        if let Some(v) = self.max_len {
            config.max_len = v;
        }
        if let Some(v) = self.unit {
            config.length_unit = v;
        }
        if let Some(raw) = &self.dedup {
            config.dedup_columns = parse_dedup_columns(raw)?;
        }
        if let Some(v) = self.extractor {
            config.extractor = v;
        }
        if let Some(v) = self.min_frequency {
            config.min_term_frequency = v;
        }
        if let Some(v) = self.weighting {
            config.weighting = v;
        }
        if let Some(v) = self.metric {
            config.strength_metric = v;
        }
        if let Some(v) = self.method {
            config.cutoff_method = v;
        }
        if let Some(v) = self.degrees {
            config.spline_degrees = v;
        }
        if let Some(v) = self.knots {
            config.spline_knot_num = v;
        }
        if let Some(v) = self.percent {
            config.target_percent = v;
        }
        if let Some(v) = self.bins {
            config.histogram_bins = v;
        }
        if self.no_diagnostics {
            config.diagnostics = false;
        }
        Ok(())
    }
}

fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("litkeys=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            input,
            output_dir,
            no_save,
            save_dataset,
            overrides,
        } => {
            let mut config = Config::load()?;
            overrides.apply(&mut config.pipeline)?;

            let records = corpus::load_records(&input)?;
            let output = with_progress(Stage::ALL.len(), |on_stage| {
                pipeline::run_observed(records, &config.pipeline, on_stage)
            })?;

            terminal::display_summary(&output, &config.pipeline);
            terminal::display_keywords(&output.keywords, output.cutoff.cutoff);

            if no_save {
                println!("{}", "Skipping artifacts (--no-save).".dimmed());
            } else {
                let dir = output_dir.unwrap_or(config.output_dir);
                let sink = FileSink::new(dir);
                let written = sink.save_all(
                    &output,
                    &config.pipeline,
                    save_dataset || config.save_dataset,
                )?;
                info!(files = written.len(), dir = %sink.dir().display(), "Saved artifacts");
                println!("Artifacts written to {}:", sink.dir().display());
                for path in &written {
                    println!("  {}", path.display());
                }
            }
        }

        Commands::Histogram { input, overrides } => {
            let mut config = Config::load()?;
            overrides.apply(&mut config.pipeline)?;

            // Degree analysis is the last stage the histogram needs
            let records = corpus::load_records(&input)?;
            let analysis = with_progress(Stage::DegreeAnalysis.position(), |on_stage| {
                pipeline::analyze_degrees_observed(records, &config.pipeline, on_stage)
            })?;
            terminal::display_histogram(&analysis.histogram);

            match config.pipeline.cutoff_estimator().estimate(&analysis.distribution, false) {
                Ok(estimate) => {
                    let kept = analysis
                        .distribution
                        .values()
                        .iter()
                        .filter(|&&v| v >= estimate.cutoff)
                        .count();
                    println!(
                        "  Cutoff {} {:.2} keeps {} of {} terms",
                        config.pipeline.strength_metric,
                        estimate.cutoff,
                        kept,
                        analysis.network.node_count()
                    );
                }
                Err(e) => println!("  {} {} ({})", "No cutoff:".yellow().bold(), e, e.kind()),
            }
        }

        Commands::Config { overrides } => {
            let mut config = Config::load()?;
            overrides.apply(&mut config.pipeline)?;
            terminal::display_config(&config.pipeline);
            println!("  Output directory: {}", config.output_dir.display());
            match config.pipeline.validate() {
                Ok(()) => println!("  {}", "Configuration is valid.".green()),
                Err(e) => println!("  {} {}", "Invalid:".red().bold(), e),
            }
        }
    }

    Ok(())
}

/// Run pipeline stages behind a progress bar of `stages` steps.
fn with_progress<T>(
    stages: usize,
    run: impl FnOnce(&mut dyn FnMut(Stage)) -> LitkeysResult<T>,
) -> Result<T> {
    let pb = ProgressBar::new(stages as u64);
    pb.set_style(ProgressStyle::default_bar().template("  Pipeline [{bar:30}] {pos}/{len} {msg}")?);

    let mut started = false;
    let result = run(&mut |stage| {
        if started {
            pb.inc(1);
        }
        started = true;
        pb.set_message(stage.to_string());
    });

    match result {
        Ok(output) => {
            pb.inc(1);
            pb.finish_with_message("done");
            Ok(output)
        }
        Err(e) => {
            pb.abandon_with_message(format!("failed at {}", e.stage()));
            Err(describe(e))
        }
    }
}

/// Convert a core error into an anyhow error that names its kind.
fn describe(e: KeywordError) -> anyhow::Error {
    let kind = e.kind();
    anyhow::Error::new(e).context(kind)
}
