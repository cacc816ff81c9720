//! Single-consumer output stage.
//!
//! [`SinkWriter`] drains the shared harvest channel into a [`RecordSink`].
//! [`AvroFileSink`] is the production sink: an Avro object container file
//! whose blocks reach the file after every record and which is synced to
//! disk on finish.

use apache_avro::{Schema, Writer};
use std::fs::File;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::{debug, info, instrument};

use crate::harvest::mapper::RecordMapper;
use crate::harvest::traits::{HarvestStage, RecordSink};
use crate::model::{HarvestItem, OutputRecord};
use crate::traits::{HarvestError, SetupError, WriteError};

/// Schema used when no `.avsc` file is supplied.
pub const DEFAULT_SCHEMA: &str = include_str!("../../schema/gcs2bq.avsc");

/// Loads the output schema from `path`, or the bundled one when `None`.
pub fn load_schema(path: Option<&Path>) -> Result<Schema, SetupError> {
    let text = match path {
        Some(path) => std::fs::read_to_string(path).map_err(|source| SetupError::SchemaRead {
            path: path.to_path_buf(),
            source,
        })?,
        None => DEFAULT_SCHEMA.to_string(),
    };
    Schema::parse_str(&text).map_err(|e| SetupError::SchemaParse(e.to_string()))
}

// ============================================================================
// Avro file sink
// ============================================================================

/// The container writer sits directly on the file: it already buffers one
/// block at a time, and every flush must land in the file itself.
pub struct AvroFileSink {
    writer: Writer<'static, File>,
    path: PathBuf,
}

impl AvroFileSink {
    /// Creates (or truncates) `path` and opens a container writer on it.
    ///
    /// The container writer borrows `schema` for as long as the sink lives,
    /// and the sink runs on its own task, hence the `'static` bound.
    pub fn create(path: &Path, schema: &'static Schema) -> Result<Self, SetupError> {
        let file = File::create(path).map_err(|source| SetupError::OutputFile {
            path: path.to_path_buf(),
            source,
        })?;
        let writer = Writer::new(schema, file);

        debug!(path = %path.display(), "Opened output file");
        Ok(Self {
            writer,
            path: path.to_path_buf(),
        })
    }
}

impl RecordSink for AvroFileSink {
    fn append(&mut self, record: &OutputRecord) -> Result<(), WriteError> {
        self.writer
            .append_ser(record)
            .map_err(|e| WriteError::Serialize(e.to_string()))?;
        self.writer
            .flush()
            .map_err(|e| WriteError::Io(std::io::Error::other(e.to_string())))?;
        Ok(())
    }

    fn finish(self) -> Result<(), WriteError> {
        // Container writer first, then the file.
        let file = self
            .writer
            .into_inner()
            .map_err(|e| WriteError::Io(std::io::Error::other(e.to_string())))?;
        file.sync_all()?;

        debug!(path = %self.path.display(), "Output file synced");
        Ok(())
    }
}

// ============================================================================
// Sink writer
// ============================================================================

/// The only consumer of the harvest channel.
pub struct SinkWriter<W> {
    sink: W,
    mapper: RecordMapper,
}

impl<W: RecordSink> SinkWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            sink,
            mapper: RecordMapper,
        }
    }

    /// Maps and appends items until every sender is gone, then finalizes
    /// the sink. Returns the number of records written.
    #[instrument(skip_all, fields(stage = self.mapper.stage_name()))]
    pub async fn run(mut self, mut items: mpsc::Receiver<HarvestItem>) -> Result<usize, HarvestError> {
        let mut written = 0usize;

        while let Some(item) = items.recv().await {
            let record = self
                .mapper
                .execute(item)
                .unwrap_or_else(|never| match never {});
            self.sink.append(&record)?;
            written += 1;
        }

        self.sink.finish()?;
        info!(records = written, "Output finalized");
        Ok(written)
    }
}
