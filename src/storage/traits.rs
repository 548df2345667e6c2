use chrono::{DateTime, Utc};

use crate::domain::ScheduledJob;
use crate::errors::TattlerResult;

/// Expiring `alerted~<post-id>` keys
#[cfg_attr(test, mockall::automock)]
pub trait AlertRepository: Send + Sync {
    fn mark_alerted(&self, post_id: &str, expires_at: DateTime<Utc>) -> TattlerResult<()>;
    /// The subset of `post_ids` with no live key at `now`, order preserved
    fn get_unalerted(&self, post_ids: &[String], now: DateTime<Utc>) -> TattlerResult<Vec<String>>;
    fn purge_expired(&self, now: DateTime<Utc>) -> TattlerResult<usize>;

    /// `(post-id, alerted-at epoch ms)` pairs of the old time-ordered collection
    fn legacy_entries(&self) -> TattlerResult<Vec<(String, i64)>>;
    fn drop_legacy(&self) -> TattlerResult<()>;
}

#[cfg_attr(test, mockall::automock)]
pub trait JobRepository: Send + Sync {
    fn add(&self, job: &ScheduledJob) -> TattlerResult<i64>;
    fn get_all(&self) -> TattlerResult<Vec<ScheduledJob>>;
    fn cancel(&self, id: i64) -> TattlerResult<()>;
    fn mark_run(&self, id: i64, at: DateTime<Utc>) -> TattlerResult<()>;
}

#[cfg_attr(test, mockall::automock)]
pub trait MigrationRepository: Send + Sync {
    fn is_applied(&self, name: &str) -> TattlerResult<bool>;
    fn mark_applied(&self, name: &str) -> TattlerResult<()>;
}
