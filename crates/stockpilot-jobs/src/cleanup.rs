//! Purge generations older than the retention window, together with their
//! marketplace links and stored files.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::JobError;
use crate::store::{GenerationStore, ObjectStore};

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    pub deleted_generations: u64,
    pub deleted_files: u64,
}

impl CleanupReport {
    pub fn message(&self) -> String {
        if self.deleted_generations == 0 {
            "No old generations to delete".to_string()
        } else {
            format!(
                "Deleted {} generations and {} files",
                self.deleted_generations, self.deleted_files
            )
        }
    }
}

/// Delete every generation created before `now - retention`.
///
/// Listing and the final row delete abort the run. Storage and join-row
/// deletes are best effort: failures are logged and the run carries on.
pub async fn run<S, O>(
    store: &S,
    objects: &O,
    now: DateTime<Utc>,
    retention: Duration,
) -> Result<CleanupReport, JobError>
where
    S: GenerationStore + ?Sized,
    O: ObjectStore + ?Sized,
{
    let cutoff = now - retention;
    tracing::info!(%cutoff, "Starting generation cleanup");

    let expired = store
        .list_created_before(cutoff)
        .await
        .map_err(JobError::ListExpired)?;

    if expired.is_empty() {
        tracing::info!("No expired generations");
        return Ok(CleanupReport::default());
    }

    let mut keys: Vec<String> = expired
        .iter()
        .flat_map(|g| [g.file_url.as_deref(), g.thumbnail_url.as_deref()])
        .flatten()
        .filter_map(|url| {
            let key = objects.key_from_url(url);
            if key.is_none() {
                tracing::warn!(url = %url, "Stored file URL has no object key, skipping");
            }
            key
        })
        .collect();
    keys.sort();
    keys.dedup();

    let mut deleted_files = 0;
    if !keys.is_empty() {
        match objects.delete_objects(&keys).await {
            Ok(batch) => {
                deleted_files = batch.deleted as u64;
                for (key, reason) in &batch.failed {
                    tracing::warn!(key = %key, reason = %reason, "Failed to delete stored file");
                }
            }
            Err(e) => tracing::error!(error = %e, keys = keys.len(), "Stored file deletion failed"),
        }
    }

    let ids: Vec<Uuid> = expired.iter().map(|g| g.id).collect();

    if let Err(e) = store.delete_marketplace_links(&ids).await {
        tracing::error!(error = %e, "Failed to delete generation marketplace links");
    }

    let deleted_generations = store
        .delete_generations(&ids)
        .await
        .map_err(JobError::DeleteGenerations)?;

    let report = CleanupReport {
        deleted_generations,
        deleted_files,
    };
    tracing::info!(
        deleted_generations = report.deleted_generations,
        deleted_files = report.deleted_files,
        "Generation cleanup finished"
    );
    Ok(report)
}
