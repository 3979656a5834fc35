use std::{marker::PhantomData, path::PathBuf};

use async_stream::try_stream;
use serde::de::DeserializeOwned;

use crate::pipeline::{Envelope, EnvelopeStream, PipelineError, Source};

/// Records read back from a JSON array file written by an earlier stage.
///
/// The whole file is parsed up front; an unreadable or malformed file fails
/// the stream before any record is yielded.
pub struct JsonArrayFileSource<T> {
    path: PathBuf,
    _record: PhantomData<fn() -> T>,
}

impl<T> JsonArrayFileSource<T> {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into(), _record: PhantomData }
    }
}

#[async_trait::async_trait]
impl<T> Source<T> for JsonArrayFileSource<T>
where
    T: DeserializeOwned + Send + 'static,
{
    async fn stream(&self) -> EnvelopeStream<T> {
        let path = self.path.clone();
        let s = try_stream! {
            let contents = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| PipelineError::Source(format!("failed to read {}: {e}", path.display())))?;
            let records: Vec<T> = serde_json::from_str(&contents)
                .map_err(|e| PipelineError::Source(format!("failed to parse {}: {e}", path.display())))?;
            tracing::info!(records = records.len(), file = %path.display(), "loaded records");

            for (i, record) in records.into_iter().enumerate() {
                yield Envelope::new(record, format!("{}#{i}", path.display()));
            }
        };

        Box::pin(s)
    }
}
