//! Core traits for the harvest pipeline stages.
//!
//! - Pure transformation stages via [`HarvestStage`]
//! - Output destinations via [`RecordSink`]

use crate::model::OutputRecord;
use crate::traits::WriteError;

// ============================================================================
// Pipeline Trait
// ============================================================================

/// Generic pipeline stage that transforms Input → Output.
///
/// Stages must be `Send + Sync` so a single instance can be shared between
/// the tasks of a run.
///
/// # Examples
///
/// ```ignore
/// struct UppercaseNames;
///
/// impl HarvestStage for UppercaseNames {
///     type Input = HarvestItem;
///     type Output = String;
///     type Error = std::convert::Infallible;
///
///     fn execute(&self, input: Self::Input) -> Result<Self::Output, Self::Error> {
///         Ok(input.object.name.to_uppercase())
///     }
///
///     fn stage_name(&self) -> &'static str {
///         "uppercase"
///     }
/// }
/// ```
pub trait HarvestStage: Send + Sync {
    /// Input type consumed by this stage
    type Input;

    /// Output type produced by this stage
    type Output;

    /// Error type for stage failures
    type Error: std::error::Error + Send + Sync + 'static;

    /// Executes the stage.
    fn execute(&self, input: Self::Input) -> Result<Self::Output, Self::Error>;

    /// Returns a human-readable name for this stage.
    ///
    /// Used for logging.
    fn stage_name(&self) -> &'static str;
}

// ============================================================================
// Sink Trait
// ============================================================================

/// Destination for mapped records.
///
/// A sink is owned by exactly one consumer task, so methods take `&mut self`
/// and no internal locking is needed.
pub trait RecordSink: Send + 'static {
    /// Appends one record and makes it durable in the underlying stream.
    ///
    /// # Errors
    ///
    /// Returns [`WriteError`] if the record cannot be encoded or flushed.
    fn append(&mut self, record: &OutputRecord) -> Result<(), WriteError>;

    /// Finalizes the output. Called once, after the last record.
    fn finish(self) -> Result<(), WriteError>
    where
        Self: Sized;
}
