use clap::{Args, Parser, Subcommand};
use log::info;
use qpmu_cli::config::{resolve_config, EstimatorOverrides};
use qpmu_cli::stream::{run_stream, write_arrow_file, write_samples, StreamOptions};
use qpmu_core::{
    EstimationStrategy, Estimator, Float, NominalFrequency, SampleFieldOrdering,
    SynchrophasorAccumulator, WaveformConfig,
};
use std::error::Error;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "qpmu")]
#[command(about = "Synchrophasor estimation from ADC sample streams", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Estimate synchrophasors from sample lines, writing CSV to stdout
    Estimate(EstimateArgs),
    /// Write synthetic sample lines to stdout
    Simulate(SimulateArgs),
}

#[derive(Debug, Args)]
struct EstimateArgs {
    /// JSON estimator configuration
    #[arg(long, env = "QPMU_CONFIG")]
    config: Option<PathBuf>,
    #[arg(long)]
    window_size: Option<usize>,
    /// fft or sdft
    #[arg(long)]
    strategy: Option<EstimationStrategy>,
    /// 50 or 60
    #[arg(long)]
    nominal_frequency: Option<NominalFrequency>,
    #[arg(long, allow_negative_numbers = true)]
    voltage_scale: Option<Float>,
    #[arg(long, allow_negative_numbers = true)]
    voltage_offset: Option<Float>,
    #[arg(long, allow_negative_numbers = true)]
    current_scale: Option<Float>,
    #[arg(long, allow_negative_numbers = true)]
    current_offset: Option<Float>,
    /// Field order of sample lines, e.g. "seq,va,vb,vc,ia,ib,ic,ts,delta"
    #[arg(long)]
    field_order: Option<SampleFieldOrdering>,
    /// Read samples from FILE instead of stdin
    #[arg(long)]
    input: Option<PathBuf>,
    /// Also write the estimates to FILE as Arrow IPC
    #[arg(long)]
    arrow: Option<PathBuf>,
    /// Omit estimates produced before the window is full
    #[arg(long)]
    skip_filling: bool,
}

#[derive(Debug, Args)]
struct SimulateArgs {
    #[arg(long, default_value_t = 1024)]
    samples: usize,
    #[arg(long, default_value_t = 3200.0)]
    sample_rate: f64,
    #[arg(long, default_value_t = 50.0)]
    frequency: f64,
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    rocof: f64,
    /// Peak voltage amplitude in counts; currents use 40% of it
    #[arg(long, default_value_t = 1000.0)]
    amplitude: f64,
    #[arg(long, default_value_t = 0.0)]
    noise: f64,
    #[arg(long, default_value_t = 2048.0)]
    adc_offset: f64,
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

fn estimate(args: EstimateArgs) -> Result<(), Box<dyn Error>> {
    let flags = EstimatorOverrides {
        window_size: args.window_size,
        strategy: args.strategy,
        nominal_frequency: args.nominal_frequency,
        voltage_scale: args.voltage_scale,
        voltage_offset: args.voltage_offset,
        current_scale: args.current_scale,
        current_offset: args.current_offset,
    };
    let env = EstimatorOverrides::from_env()?;
    let config = resolve_config(args.config.as_deref(), &env, &flags)?;
    let mut estimator = Estimator::with_config(config)?;

    let options = StreamOptions {
        ordering: args.field_order.unwrap_or_default(),
        skip_filling: args.skip_filling,
    };
    let mut accumulator = args.arrow.as_ref().map(|_| SynchrophasorAccumulator::default());

    let stdout = io::stdout();
    let mut output = stdout.lock();
    let stats = match &args.input {
        Some(path) => run_stream(
            &mut estimator,
            BufReader::new(File::open(path)?),
            &mut output,
            &options,
            accumulator.as_mut(),
        )?,
        None => run_stream(
            &mut estimator,
            io::stdin().lock(),
            &mut output,
            &options,
            accumulator.as_mut(),
        )?,
    };

    if let (Some(path), Some(accumulator)) = (&args.arrow, accumulator.as_mut()) {
        let batch = accumulator.finish()?;
        write_arrow_file(path, &batch)?;
        info!("Wrote {} estimates to {}", batch.num_rows(), path.display());
    }
    info!("{:?}", stats);
    Ok(())
}

fn simulate(args: SimulateArgs) -> Result<(), Box<dyn Error>> {
    let defaults = WaveformConfig::default();
    let current = 0.4 * args.amplitude;
    let config = WaveformConfig {
        sample_rate_hz: args.sample_rate,
        frequency_hz: args.frequency,
        rocof_hz_per_s: args.rocof,
        amplitudes: [
            args.amplitude,
            args.amplitude,
            args.amplitude,
            current,
            current,
            current,
        ],
        adc_offset: args.adc_offset,
        noise_amplitude: args.noise,
        seed: args.seed,
        ..defaults
    };
    let stdout = io::stdout();
    write_samples(config, args.samples, &mut stdout.lock())?;
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let args = Cli::parse();
    match args.command {
        Commands::Estimate(args) => estimate(args),
        Commands::Simulate(args) => simulate(args),
    }
}
