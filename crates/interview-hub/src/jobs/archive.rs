use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

use crate::hiring::choices::SelectionStatus;
use crate::hiring::selections::CompanySelection;
use crate::store::{RepositoryError, Store};

/// Six months of thirty days.
pub const DEFAULT_RETENTION_DAYS: i64 = 6 * 30;

/// `now - retention_days`, or `None` for a negative or unrepresentable retention.
pub fn retention_cutoff(now: DateTime<Utc>, retention_days: i64) -> Option<DateTime<Utc>> {
    if retention_days < 0 {
        return None;
    }
    Duration::try_days(retention_days).and_then(|retention| now.checked_sub_signed(retention))
}

/// Deletes rejected selections created before `now - retention_days`, with
/// their interviews and test tasks. Returns how many selections were removed.
pub fn archive_rejected_selections(
    store: &Store,
    now: DateTime<Utc>,
    retention_days: i64,
) -> Result<usize, RepositoryError> {
    let Some(cutoff) = retention_cutoff(now, retention_days) else {
        warn!(retention_days, "retention period out of range; nothing archived");
        return Ok(0);
    };
    let removed = store.write()?.delete_where::<CompanySelection, _>(|selection| {
        selection.status == SelectionStatus::Rejected && selection.created_at < cutoff
    });

    info!(removed, %cutoff, "archived {removed} rejected company selections");
    Ok(removed)
}
