pub mod bill_files;
pub mod dashboard;
pub mod weather_enrichment;

use std::path::Path;

use futures::{Stream, StreamExt};

use crate::pipeline::{Envelope, PipelineError};

pub use bill_files::BillFileSink;
pub use dashboard::DashboardSink;
pub use weather_enrichment::WeatherEnrichmentSink;

/// Drain a pipeline stream. Records rejected by a transform are logged and
/// dropped; a source error ends the run.
pub(crate) async fn collect_records<T, S>(mut input: S, sink: &'static str) -> Result<Vec<Envelope<T>>, PipelineError>
where
    S: Stream<Item = Result<Envelope<T>, PipelineError>> + Send + Unpin,
{
    let mut records = Vec::new();
    while let Some(item) = input.next().await {
        match item {
            Ok(env) => records.push(env),
            Err(PipelineError::Transform(reason)) => {
                tracing::warn!(sink, %reason, "record rejected, skipping");
            }
            Err(e) => {
                tracing::error!(sink, error = %e, "error in upstream pipeline");
                return Err(e);
            }
        }
    }
    Ok(records)
}

pub(crate) async fn write_output(path: &Path, contents: impl AsRef<[u8]>) -> Result<(), PipelineError> {
    let contents = contents.as_ref();
    tokio::fs::write(path, contents)
        .await
        .map_err(|e| PipelineError::Sink(format!("failed to write {}: {e}", path.display())))?;
    tracing::info!(file = %path.display(), bytes = contents.len(), "wrote output");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rejected_records_are_skipped_but_source_errors_abort() {
        let items = vec![
            Ok(Envelope::new(1, "a")),
            Err(PipelineError::Transform("bad".to_string())),
            Ok(Envelope::new(3, "c")),
        ];
        let kept = collect_records(futures::stream::iter(items), "test").await.unwrap();
        assert_eq!(kept.iter().map(|e| e.payload).collect::<Vec<_>>(), vec![1, 3]);

        let items: Vec<Result<Envelope<i32>, _>> =
            vec![Ok(Envelope::new(1, "a")), Err(PipelineError::Source("gone".to_string()))];
        let res = collect_records(futures::stream::iter(items), "test").await;
        assert!(matches!(res, Err(PipelineError::Source(_))));
    }
}
