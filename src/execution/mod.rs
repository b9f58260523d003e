//! Job pool: admission, workers, cancellation and pipeline execution

pub mod cancel;
pub mod error;
pub mod executor;
pub mod pool;
pub mod queue;

pub use cancel::CancellationRegistry;
pub use error::AdmissionError;
pub use executor::PipelineExecutor;
pub use pool::JobPool;
pub use queue::{AdmissionPolicy, AdmissionQueue};
