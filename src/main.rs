//! hydro-forecast CLI

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser, Subcommand};
use hydro_forecast::pipeline::{Pipeline, PipelineConfig, Preset};
use hydro_forecast::PipelineError;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "hydro-forecast")]
#[command(about = "Long-term monthly ET, precipitation and snowmelt forecasts")]
#[command(version)]
struct Cli {
    /// Log verbosity level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: tracing::Level,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Forecast every configured variable and write one output file
    #[command(group(ArgGroup::new("source").required(true).args(["config", "preset"])))]
    Run {
        /// Pipeline configuration (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Built-in configuration: et-precip or snowmelt
        #[arg(short, long)]
        preset: Option<String>,

        /// Input workbook or CSV file
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Sheet to read (workbooks only)
        #[arg(long)]
        sheet: Option<String>,

        /// Months to forecast past the last observation
        #[arg(long)]
        horizon: Option<usize>,

        /// Output file (.xlsx or .csv)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Directory for diagnostic charts
        #[arg(long)]
        chart_dir: Option<PathBuf>,

        /// Skip chart rendering
        #[arg(long)]
        no_charts: bool,
    },

    /// Print built-in configurations as TOML
    Presets {
        /// Only this preset
        name: Option<String>,
    },
}

struct Overrides {
    input: Option<PathBuf>,
    sheet: Option<String>,
    horizon: Option<usize>,
    output: Option<PathBuf>,
    chart_dir: Option<PathBuf>,
    no_charts: bool,
}

impl Overrides {
    fn apply(self, config: &mut PipelineConfig) {
        if let Some(input) = self.input {
            config.input = input;
        }
        if let Some(sheet) = self.sheet {
            config.sheet = Some(sheet);
        }
        if let Some(horizon) = self.horizon {
            config.horizon_months = horizon;
        }
        if let Some(output) = self.output {
            config.output = output;
        }
        if let Some(dir) = self.chart_dir {
            config.chart.directory = Some(dir);
        }
        if self.no_charts {
            config.chart.enabled = false;
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Run {
            config,
            preset,
            input,
            sheet,
            horizon,
            output,
            chart_dir,
            no_charts,
        } => {
            let overrides = Overrides {
                input,
                sheet,
                horizon,
                output,
                chart_dir,
                no_charts,
            };
            cmd_run(resolve_config(config, preset, overrides)?)
        }
        Commands::Presets { name } => cmd_presets(name.as_deref()),
    }
}

/// Start from the config file or preset, then apply command-line overrides.
fn resolve_config(
    config: Option<PathBuf>,
    preset: Option<String>,
    overrides: Overrides,
) -> Result<PipelineConfig> {
    let mut config = match (config, preset) {
        (Some(path), _) => PipelineConfig::load(&path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        (None, Some(name)) => Preset::from_name(&name)?.config(),
        (None, None) => anyhow::bail!("either --config or --preset is required"),
    };
    overrides.apply(&mut config);
    Ok(config)
}

fn cmd_run(config: PipelineConfig) -> Result<()> {
    let report = Pipeline::new(config).run().map_err(describe)?;

    for chart in &report.charts {
        tracing::info!(path = %chart.display(), "chart saved");
    }
    println!("Forecasts saved to {}", report.output.display());
    Ok(())
}

fn cmd_presets(name: Option<&str>) -> Result<()> {
    let presets = match name {
        Some(name) => vec![Preset::from_name(name)?],
        None => Preset::ALL.to_vec(),
    };

    for (i, preset) in presets.iter().enumerate() {
        if i > 0 {
            println!();
        }
        println!("# preset: {}", preset.name());
        print!("{}", preset.config().to_toml_string()?);
    }
    Ok(())
}

/// Attach the failing stage (and variable) to a pipeline error.
fn describe(err: PipelineError) -> anyhow::Error {
    let stage = err.stage();
    let context = match err.variable() {
        Some(variable) => format!("{stage} stage failed for variable '{variable}'"),
        None => format!("{stage} stage failed"),
    };
    anyhow::Error::new(err).context(context)
}
