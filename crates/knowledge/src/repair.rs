//! One-time backfill of missing document vectors.

use crate::store::DocumentStore;
use crate::types::{DocumentPatch, RepairOutcome};
use crate::vectorize::vectorize;
use edurag_core::{AppResult, MigrationCheck};

/// Attach a vector to every stored document that lacks one.
///
/// With [`MigrationCheck::FirstDocument`] the store counts as migrated as soon
/// as the first scanned document carries a vector, and nothing is written.
/// With [`MigrationCheck::FullScan`] every document is inspected.
///
/// The first failed write aborts the pass. Documents repaired before it keep
/// their vector.
pub async fn repair(store: &dyn DocumentStore, check: MigrationCheck) -> AppResult<RepairOutcome> {
    let documents = store.scan_all().await?;
    let scanned = documents.len();

    let migrated = match check {
        MigrationCheck::FirstDocument => documents.first().map_or(true, |d| d.vector.is_some()),
        MigrationCheck::FullScan => documents.iter().all(|d| d.vector.is_some()),
    };

    if migrated {
        tracing::info!(
            "Knowledge base already migrated ({} documents, {:?} check)",
            scanned,
            check
        );
        return Ok(RepairOutcome {
            scanned,
            repaired: 0,
            already_migrated: true,
        });
    }

    let mut repaired = 0;
    for document in documents.iter().filter(|d| d.vector.is_none()) {
        let patch = DocumentPatch {
            vector: vectorize(&document.vector_text()),
        };

        if let Err(e) = store.update_fields(&document.id, &patch).await {
            tracing::error!(
                "Repair aborted at document {} after {} updates: {}",
                document.id,
                repaired,
                e
            );
            return Err(e);
        }

        tracing::debug!("Attached vector to document {}", document.id);
        repaired += 1;
    }

    tracing::info!(
        "Repaired {} of {} documents in the {} store",
        repaired,
        scanned,
        store.backend_name()
    );

    Ok(RepairOutcome {
        scanned,
        repaired,
        already_migrated: false,
    })
}
