//! Read-session helpers shared by the store, reconciler and dispatcher.

use tracing::warn;

use cronfleet_protocols::{CatalogError, CatalogSession, Job, JobCatalog};

/// Roll a session back, logging instead of propagating failures.
pub(crate) async fn release(session: Box<dyn CatalogSession>, code: &str) {
    if let Err(e) = session.rollback().await {
        warn!("Failed to release catalog session used for job '{}': {}", code, e);
    }
}

/// Fetch one job through a short-lived session.
pub(crate) async fn fetch_job(
    catalog: &dyn JobCatalog,
    code: &str,
) -> Result<Option<Job>, CatalogError> {
    let mut session = catalog.begin_read().await?;
    let result = session.find_by_code(code).await;
    release(session, code).await;
    result
}
