use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use whisk_hilbert::analysis::filter_design::{design, minimum_order};
use whisk_hilbert::analysis::{Decomposition, FrequencyBand, WhiskDecomposer};
use whisk_hilbert::config::AppConfig;
use whisk_hilbert::fixtures::{ExpectationDiff, TraceCatalog};

#[derive(Parser, Debug)]
#[command(
    name = "whisk_cli",
    about = "Phase and envelope decomposition harness for whisker-angle traces"
)]
struct Cli {
    /// Override directory containing fixture traces (defaults to ./fixtures of the crate)
    #[arg(long)]
    fixtures_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Decompose a fixture trace and optionally compare against expectations
    Decompose {
        #[arg(long)]
        fixture: String,
        #[arg(long)]
        expect: Option<PathBuf>,
        #[arg(long)]
        output: Option<PathBuf>,
        /// Lower pass-band edge in Hz (overrides config)
        #[arg(long)]
        band_low: Option<f64>,
        /// Upper pass-band edge in Hz (overrides config)
        #[arg(long)]
        band_high: Option<f64>,
        /// JSON config file (defaults to assets/whisk_config.json)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print the band-pass filter designed for a sampling rate
    Design {
        #[arg(long)]
        sample_rate: f64,
        #[arg(long, default_value_t = 6.0)]
        band_low: f64,
        #[arg(long, default_value_t = 30.0)]
        band_high: f64,
    },
    /// List available fixtures on disk
    DumpFixtures,
}

fn main() -> ExitCode {
    whisk_hilbert::init_logging();
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let catalog = cli
        .fixtures_dir
        .map(TraceCatalog::new)
        .unwrap_or_default();

    match cli.command {
        Commands::Decompose {
            fixture,
            expect,
            output,
            band_low,
            band_high,
            config,
        } => {
            let config = match config {
                Some(path) => AppConfig::load_from_file(path),
                None => AppConfig::load(),
            };
            let mut band = config.filter.band();
            band.low_hz = band_low.unwrap_or(band.low_hz);
            band.high_hz = band_high.unwrap_or(band.high_hz);
            run_decompose(&catalog, &fixture, expect, output, &config, band)
        }
        Commands::Design {
            sample_rate,
            band_low,
            band_high,
        } => run_design(sample_rate, FrequencyBand::new(band_low, band_high)),
        Commands::DumpFixtures => run_dump(&catalog),
    }
}

fn run_decompose(
    catalog: &TraceCatalog,
    fixture: &str,
    override_expect: Option<PathBuf>,
    output_path: Option<PathBuf>,
    config: &AppConfig,
    band: FrequencyBand,
) -> Result<ExitCode> {
    let data = catalog.load(fixture, override_expect)?;
    let decomposer = WhiskDecomposer::from_config(data.sample_rate, config).with_band(band);
    let actual = decomposer
        .decompose(&data.samples)
        .with_context(|| format!("decomposing fixture {}", fixture))?;

    emit_report(&data.metadata.name, &actual, output_path)?;

    if let Some(expectations) = data.expectations {
        match expectations.verify(&actual) {
            Ok(()) => Ok(ExitCode::from(0)),
            Err(diff) => {
                emit_diff(&diff)?;
                Ok(ExitCode::from(2))
            }
        }
    } else {
        Ok(ExitCode::from(0))
    }
}

fn run_design(sample_rate: f64, band: FrequencyBand) -> Result<ExitCode> {
    let spec = minimum_order(&band, sample_rate)?;
    let coeffs = design(&band, sample_rate)?;

    let report = DesignReportPayload {
        sample_rate,
        band,
        order: spec.order,
        critical: spec.critical,
        gain_db_at_edges: [
            coeffs.gain_db_at(band.low_hz, sample_rate),
            coeffs.gain_db_at(band.high_hz, sample_rate),
        ],
        b: &coeffs.b,
        a: &coeffs.a,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(ExitCode::from(0))
}

fn run_dump(catalog: &TraceCatalog) -> Result<ExitCode> {
    let fixtures = catalog.discover()?;
    if fixtures.is_empty() {
        println!("No fixtures found under {}", catalog.root().display());
        return Ok(ExitCode::from(0));
    }

    for metadata in fixtures {
        if let Some(expect) = metadata.expect_path {
            println!("{} -> {}", metadata.name, expect.display());
        } else {
            println!("{}", metadata.name);
        }
    }
    Ok(ExitCode::from(0))
}

fn emit_report(
    fixture: &str,
    decomposition: &Decomposition,
    output_path: Option<PathBuf>,
) -> Result<()> {
    let report = FixtureReportPayload {
        fixture,
        sample_count: decomposition.phase.len(),
        decomposition,
    };
    let json = serde_json::to_string_pretty(&report)?;

    if let Some(path) = output_path {
        fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
    } else {
        println!("{json}");
    }

    Ok(())
}

fn emit_diff(diff: &ExpectationDiff) -> Result<()> {
    let json = serde_json::to_string_pretty(&diff.to_json())?;
    eprintln!("{json}");
    Ok(())
}

#[derive(Serialize)]
struct FixtureReportPayload<'a> {
    fixture: &'a str,
    sample_count: usize,
    #[serde(flatten)]
    decomposition: &'a Decomposition,
}

#[derive(Serialize)]
struct DesignReportPayload<'a> {
    sample_rate: f64,
    band: FrequencyBand,
    order: usize,
    critical: [f64; 2],
    gain_db_at_edges: [f64; 2],
    b: &'a [f64],
    a: &'a [f64],
}
