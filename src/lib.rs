// Whisk Hilbert - whisker-angle phase and envelope decomposition
// Zero-phase band-pass, analytic-signal phase, per-cycle envelopes

// Module declarations
pub mod analysis;
pub mod config;
pub mod error;
pub mod fixtures;

// Re-exports for convenience
pub use analysis::{
    extract_phase, reconstruct_envelope, Decomposition, Envelope, FrequencyBand, PhaseExtraction,
    Statistic, WhiskDecomposer,
};
pub use error::{EnvelopeError, FilterError, WhiskError};

/// Install a stderr `tracing` subscriber honouring `RUST_LOG`
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
