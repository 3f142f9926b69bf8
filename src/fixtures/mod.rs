//! Fixture utilities for regression traces.
//!
//! This module discovers whisker-angle traces on disk (JSON or mono WAV),
//! loads them together with optional expectation JSON, writes traces back
//! out, and compares decomposition results against reference values within
//! absolute/relative tolerances.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::analysis::Decomposition;

/// Default location for fixture traces and expectations.
pub const DEFAULT_FIXTURE_ROOT: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures");

const EXPECT_SUFFIX: &str = ".expect.json";

/// On-disk encoding of a trace.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceFormat {
    Json,
    Wav,
}

/// Metadata describing an available trace.
#[derive(Clone, Debug, Serialize)]
pub struct TraceMetadata {
    pub name: String,
    pub path: PathBuf,
    pub format: TraceFormat,
    pub expect_path: Option<PathBuf>,
}

/// JSON trace schema.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    pub sample_rate: f64,
    pub samples: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Loaded trace data with decoded samples.
#[derive(Debug)]
pub struct TraceData {
    pub metadata: TraceMetadata,
    pub sample_rate: f64,
    pub samples: Vec<f64>,
    pub expectations: Option<FixtureExpectations>,
}

/// Reference values for one output series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reference {
    pub values: Vec<f64>,
    #[serde(default)]
    pub atol: f64,
    #[serde(default)]
    pub rtol: f64,
}

impl Reference {
    fn compare(&self, series: &'static str, actual: &[f64], failures: &mut Vec<ExpectationFailure>) {
        for (index, &expected) in self.values.iter().enumerate() {
            let actual = actual.get(index).copied();
            let within = actual.is_some_and(|value| {
                (value - expected).abs() <= self.atol + self.rtol * expected.abs()
            });
            if !within {
                failures.push(ExpectationFailure {
                    series,
                    index,
                    expected,
                    actual,
                    tolerance: self.atol + self.rtol * expected.abs(),
                });
            }
        }
    }
}

/// JSON expectation schema for fixture verification.
///
/// Only the first `values.len()` samples of each series are compared.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureExpectations {
    pub fixture: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub phase: Option<Reference>,
    /// Compared against the amplitude envelope
    #[serde(default)]
    pub envelope: Option<Reference>,
}

impl FixtureExpectations {
    pub fn verify(&self, actual: &Decomposition) -> std::result::Result<(), ExpectationDiff> {
        let mut failures = Vec::new();

        if let Some(reference) = &self.phase {
            reference.compare("phase", &actual.phase, &mut failures);
        }
        if let Some(reference) = &self.envelope {
            reference.compare("envelope", &actual.amplitude, &mut failures);
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(ExpectationDiff { failures })
        }
    }
}

/// Outcome of comparing actual results with expectations.
#[derive(Debug)]
pub struct ExpectationDiff {
    pub failures: Vec<ExpectationFailure>,
}

impl ExpectationDiff {
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "failures": self.failures.iter().map(|failure| {
                serde_json::json!({
                    "series": failure.series,
                    "index": failure.index,
                    "expected": failure.expected,
                    "actual": failure.actual,
                    "tolerance": failure.tolerance,
                })
            }).collect::<Vec<_>>()
        })
    }
}

/// Detailed diff entry for a single sample.
#[derive(Debug)]
pub struct ExpectationFailure {
    pub series: &'static str,
    pub index: usize,
    pub expected: f64,
    /// `None` when the result is shorter than the reference
    pub actual: Option<f64>,
    pub tolerance: f64,
}

/// Catalog responsible for discovering traces on disk.
pub struct TraceCatalog {
    root: PathBuf,
}

impl TraceCatalog {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// List all traces by their metadata.
    pub fn discover(&self) -> Result<Vec<TraceMetadata>> {
        let mut traces = Vec::new();
        if !self.root.exists() {
            return Ok(traces);
        }

        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                let path = entry.path();
                if let Some(metadata) = metadata_for_path(&path) {
                    traces.push(metadata);
                }
            }
        }

        traces.sort_by(|a, b| a.name.cmp(&b.name));
        log::debug!(
            "[TraceCatalog] discovered {} traces in {}",
            traces.len(),
            self.root.display()
        );
        Ok(traces)
    }

    /// Load trace samples + expectations for provided name or path.
    pub fn load(&self, fixture: &str, override_expect: Option<PathBuf>) -> Result<TraceData> {
        let path = self.resolve(fixture)?;
        let metadata = metadata_for_path(&path)
            .ok_or_else(|| anyhow!("Unsupported trace format for {}", path.display()))?;

        let (samples, sample_rate) = match metadata.format {
            TraceFormat::Json => {
                let trace = read_trace(&path)?;
                (trace.samples, trace.sample_rate)
            }
            TraceFormat::Wav => read_wav(&path)?,
        };

        let expectation_path = override_expect.or(metadata.expect_path.clone());
        let expectations = match expectation_path {
            Some(path) => Some(read_expectations(&path)?),
            None => None,
        };

        log::info!(
            "[TraceCatalog] loaded '{}' ({} samples at {} Hz)",
            metadata.name,
            samples.len(),
            sample_rate
        );

        Ok(TraceData {
            metadata,
            sample_rate,
            samples,
            expectations,
        })
    }

    /// Resolve a trace name (`<root>/<name>.json|.wav`) or an existing path.
    pub fn resolve(&self, fixture: &str) -> Result<PathBuf> {
        let as_path = Path::new(fixture);
        if as_path.is_file() {
            return Ok(as_path.to_path_buf());
        }

        ["json", "wav"]
            .iter()
            .map(|ext| self.root.join(format!("{fixture}.{ext}")))
            .find(|candidate| candidate.is_file())
            .ok_or_else(|| anyhow!("Fixture '{fixture}' not found in {}", self.root.display()))
    }
}

impl Default for TraceCatalog {
    fn default() -> Self {
        Self::new(DEFAULT_FIXTURE_ROOT)
    }
}

/// Write `trace` as pretty JSON.
pub fn save_trace<P: AsRef<Path>>(path: P, trace: &Trace) -> Result<()> {
    let path = path.as_ref();
    let json = serde_json::to_string_pretty(trace)?;
    fs::write(path, json).with_context(|| format!("writing trace {}", path.display()))?;
    log::info!("[Fixtures] saved {} samples to {}", trace.samples.len(), path.display());
    Ok(())
}

/// Read a JSON trace.
pub fn read_trace<P: AsRef<Path>>(path: P) -> Result<Trace> {
    let path = path.as_ref();
    let json =
        fs::read_to_string(path).with_context(|| format!("reading trace {}", path.display()))?;
    let trace: Trace =
        serde_json::from_str(&json).with_context(|| format!("parsing {}", path.display()))?;
    if !(trace.sample_rate.is_finite() && trace.sample_rate > 0.0) {
        return Err(anyhow!(
            "Trace {} has invalid sample rate {}",
            path.display(),
            trace.sample_rate
        ));
    }
    Ok(trace)
}

/// Read an expectation file.
pub fn read_expectations<P: AsRef<Path>>(path: P) -> Result<FixtureExpectations> {
    let path = path.as_ref();
    let json = fs::read_to_string(path)
        .with_context(|| format!("reading expectation {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("parsing {}", path.display()))
}

fn metadata_for_path(path: &Path) -> Option<TraceMetadata> {
    let file_name = path.file_name()?.to_str()?;
    if file_name.ends_with(EXPECT_SUFFIX) {
        return None;
    }

    let format = match path.extension()?.to_str()? {
        "json" => TraceFormat::Json,
        "wav" => TraceFormat::Wav,
        _ => return None,
    };
    let name = path.file_stem()?.to_str()?.to_string();
    let expect = path.with_file_name(format!("{name}{EXPECT_SUFFIX}"));

    Some(TraceMetadata {
        name,
        path: path.to_path_buf(),
        format,
        expect_path: expect.exists().then_some(expect),
    })
}

fn read_wav(path: &Path) -> Result<(Vec<f64>, f64)> {
    let mut reader =
        hound::WavReader::open(path).with_context(|| format!("opening {}", path.display()))?;
    let spec = reader.spec();
    if spec.channels != 1 {
        return Err(anyhow!(
            "Fixture {} must be mono (found {} channels)",
            path.display(),
            spec.channels
        ));
    }

    let samples = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .map(|sample| sample.map(f64::from).map_err(|err| anyhow!(err)))
            .collect::<Result<Vec<f64>>>()?,
        hound::SampleFormat::Int => match spec.bits_per_sample {
            bits @ 8..=32 => {
                let max = ((1i64 << (bits - 1)) - 1) as f64;
                reader
                    .samples::<i32>()
                    .map(|sample| {
                        sample
                            .map(|value| f64::from(value) / max)
                            .map_err(|err| anyhow!(err))
                    })
                    .collect::<Result<Vec<f64>>>()?
            }
            other => {
                return Err(anyhow!(
                    "Unsupported bits per sample {} in {}",
                    other,
                    path.display()
                ))
            }
        },
    };

    Ok((samples, f64::from(spec.sample_rate)))
}
