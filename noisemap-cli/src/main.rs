//! NoiseMap CLI - map floorplan power traces onto SPICE current sources.

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use noisemap::inputs::load_power_trace;
use noisemap::{InputPaths, MapOptions, Mode, NoiseMapCore, RunOutput};
use std::path::{Path, PathBuf};
use std::process;
use tracing::Level;

#[derive(Parser)]
#[command(name = "noisemap")]
#[command(
    about = "Convert SPICE current sources to PWL waveforms from a floorplan power trace",
    long_about = "The name mappings should be a JSON object of the form \
                  {\"floorplan_name\": \"powertrace_name\"}"
)]
#[command(version)]
struct Cli {
    /// Log debug detail to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rewrite a netlist's current sources and rank nearby inductors
    Map {
        /// Floorplan-to-powertrace name mappings (JSON)
        #[arg(short = 'n', long, value_name = "FILE")]
        name_mappings: PathBuf,

        /// Floorplan (tab-separated: name, width, height, x, y)
        #[arg(short = 'f', long, value_name = "FILE")]
        floorplan: PathBuf,

        /// Input SPICE netlist
        #[arg(short = 's', long, value_name = "FILE")]
        spice: PathBuf,

        /// Power trace (CSV, one column per component)
        #[arg(short = 'p', long, value_name = "FILE")]
        powertrace: PathBuf,

        /// Output SPICE netlist
        #[arg(short = 'o', long, value_name = "FILE")]
        out: PathBuf,

        /// Write the nearest-inductor report (JSON) here
        #[arg(long, value_name = "FILE")]
        inductor_report: Option<PathBuf>,

        /// Summary format
        #[arg(long, value_enum, default_value = "human")]
        format: OutputFormat,

        /// Exit with an error code if any current source falls outside the floorplan
        #[arg(long)]
        fail_on_miss: bool,

        #[command(flatten)]
        options: OptionArgs,
    },

    /// Print the PWL waveform synthesized for every power-trace column
    Pwl {
        /// Power trace (CSV, one column per component)
        #[arg(short = 'p', long, value_name = "FILE")]
        powertrace: PathBuf,

        #[command(flatten)]
        options: OptionArgs,
    },
}

#[derive(Args)]
struct OptionArgs {
    /// Load options from a JSON file; flags below override it
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Clock frequency in GHz (sets cycle time, rise and fall to 10% of a cycle)
    #[arg(short = 'c', long, conflicts_with = "cycle_time")]
    clock_frequency: Option<f64>,

    /// Cycle time
    #[arg(long)]
    cycle_time: Option<f64>,

    /// Pulse rise time
    #[arg(long)]
    rise_time: Option<f64>,

    /// Pulse fall time
    #[arg(long)]
    fall_time: Option<f64>,

    /// Divisor applied to every power sample
    #[arg(long)]
    current_scale: Option<f64>,

    /// Unit suffix for time values
    #[arg(long)]
    time_prefix: Option<String>,

    /// Decimal places for time values
    #[arg(long)]
    time_precision: Option<usize>,

    /// Decimal places for amplitudes
    #[arg(long)]
    amplitude_precision: Option<usize>,

    /// Nearest inductors to keep per floorplan unit
    #[arg(short = 'k', long = "inductors")]
    inductor_count: Option<usize>,

    /// Legacy rules: skip zero cycles, require every unit mapped, no inductor report
    #[arg(long)]
    legacy: bool,
}

impl OptionArgs {
    fn to_options(&self) -> anyhow::Result<MapOptions> {
        let mut options = match &self.config {
            Some(path) => MapOptions::from_json_file(path)
                .with_context(|| format!("loading options from {}", path.display()))?,
            None => MapOptions::default(),
        };
        if let Some(frequency) = self.clock_frequency {
            options.set_clock_ghz(frequency)?;
        }
        if let Some(v) = self.cycle_time {
            options.cycle_time = v;
        }
        if let Some(v) = self.rise_time {
            options.rise_time = v;
        }
        if let Some(v) = self.fall_time {
            options.fall_time = v;
        }
        if let Some(v) = self.current_scale {
            options.current_scale = v;
        }
        if let Some(v) = &self.time_prefix {
            options.time_prefix = v.clone();
        }
        if let Some(v) = self.time_precision {
            options.time_precision = v;
        }
        if let Some(v) = self.amplitude_precision {
            options.amplitude_precision = v;
        }
        if let Some(v) = self.inductor_count {
            options.inductor_count = v;
        }
        if self.legacy {
            options.mode = Mode::Legacy;
        }
        options.validate()?;
        Ok(options)
    }
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable summary
    Human,
    /// JSON summary
    Json,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let result = match cli.command {
        Commands::Map {
            name_mappings,
            floorplan,
            spice,
            powertrace,
            out,
            inductor_report,
            format,
            fail_on_miss,
            options,
        } => {
            let paths = InputPaths {
                name_mappings,
                floorplan,
                power_trace: powertrace,
                netlist: spice,
            };
            handle_map(
                &paths,
                &out,
                inductor_report.as_deref(),
                &options,
                &format,
                fail_on_miss,
            )
        }
        Commands::Pwl {
            powertrace,
            options,
        } => handle_pwl(&powertrace, &options),
    };

    let exit_code = match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            1
        }
    };
    process::exit(exit_code);
}

fn init_tracing(verbose: bool, quiet: bool) {
    let level = if verbose {
        Level::DEBUG
    } else if quiet {
        Level::WARN
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn handle_map(
    paths: &InputPaths,
    out: &Path,
    report_path: Option<&Path>,
    args: &OptionArgs,
    format: &OutputFormat,
    fail_on_miss: bool,
) -> anyhow::Result<i32> {
    let options = args.to_options()?;
    if report_path.is_some() && options.mode == Mode::Legacy {
        tracing::warn!("Legacy mode produces no inductor report; --inductor-report ignored");
    }
    let result = NoiseMapCore::run_files(paths, out, report_path, &options)?;

    match format {
        OutputFormat::Human => output_human(&result, out),
        OutputFormat::Json => output_json(&result, out)?,
    }

    if fail_on_miss && result.has_misses() {
        return Ok(1);
    }
    Ok(0)
}

fn output_human(result: &RunOutput, out: &Path) {
    println!("Wrote {}", out.display());
    println!("Current sources: {}", result.stats.current_sources());
    println!("\thit: {}", result.stats.hit);
    println!("\tmiss: {}", result.stats.miss);
    println!("\tunpositioned: {}", result.stats.unpositioned);
    if let Some(report) = &result.report {
        println!("Inductors: {}", report.list.len());
    }
}

fn output_json(result: &RunOutput, out: &Path) -> anyhow::Result<()> {
    let output = serde_json::json!({
        "output": out.display().to_string(),
        "stats": result.stats,
        "current_sources": result.stats.current_sources(),
        "target_box": result.target_box.as_array(),
        "regions": result.floorplan.len(),
        "inductors": result.report.as_ref().map(|r| r.list.len()),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn handle_pwl(powertrace: &Path, args: &OptionArgs) -> anyhow::Result<i32> {
    let options = args.to_options()?;
    let trace = load_power_trace(powertrace)?;
    for (name, waveform) in noisemap::pwl::synthesize_all(&trace, &options.pwl_config()) {
        println!("{}: {}", name, waveform);
    }
    Ok(0)
}
