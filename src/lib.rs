pub mod config;
pub mod executor;
pub mod gcs;
pub mod harvest;
pub mod model;
pub mod traits;

#[cfg(test)]
pub(crate) mod fake;

// Re-export common types for convenience
pub use executor::*;
pub use gcs::GcsClient;
pub use model::*;
pub use traits::*;
