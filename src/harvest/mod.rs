//! Harvest module - concurrent object metadata export pipeline.
//!
//! - **Enumeration**: [`ProjectEnumerator`] materializes every visible project
//! - **Harvesting**: [`ObjectHarvester`] lists buckets and objects per project
//! - **Mapping**: [`RecordMapper`] flattens metadata into [`OutputRecord`](crate::model::OutputRecord)
//! - **Output**: [`SinkWriter`] drains the shared channel into a [`RecordSink`]
//! - **Pipeline**: [`HarvestPipeline`] coordinates a complete run

pub mod enumerator;
pub mod harvester;
pub mod mapper;
pub mod pipeline;
pub mod sink;
pub mod traits;

// Re-export commonly used types
pub use traits::{HarvestStage, RecordSink};

pub use enumerator::ProjectEnumerator;
pub use harvester::{ObjectHarvester, ProjectTally};
pub use mapper::{map_object, RecordMapper};
pub use pipeline::{HarvestPipeline, HarvestStats};
pub use sink::{load_schema, AvroFileSink, SinkWriter, DEFAULT_SCHEMA};
