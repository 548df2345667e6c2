use chrono::{DateTime, Duration, Utc};

use crate::domain::MatchedPost;
use crate::errors::TattlerResult;
use crate::storage::traits::AlertRepository;

/// How long a post stays "already alerted"
pub fn retention_window() -> Duration {
    Duration::days(3)
}

/// Remembers which posts were alerted so each one fires once per window
pub struct AlertService<A: AlertRepository> {
    repository: A,
}

impl<A: AlertRepository> AlertService<A> {
    pub fn new(repository: A) -> Self {
        Self { repository }
    }

    /// Drop records older than the retention window
    pub fn purge(&self, now: DateTime<Utc>) -> TattlerResult<usize> {
        let removed = self.repository.purge_expired(now)?;
        if removed > 0 {
            tracing::debug!(removed, "purged expired alert records");
        }
        Ok(removed)
    }

    #[cfg(test)]
    fn was_alerted(&self, post_id: &str, now: DateTime<Utc>) -> TattlerResult<bool> {
        let unalerted = self.repository.get_unalerted(&[post_id.to_string()], now)?;
        Ok(unalerted.is_empty())
    }

    /// Posts not alerted within the retention window, order preserved
    pub fn filter_unalerted(
        &self,
        posts: Vec<MatchedPost>,
        now: DateTime<Utc>,
    ) -> TattlerResult<Vec<MatchedPost>> {
        let ids: Vec<String> = posts.iter().map(|m| m.post.id.clone()).collect();
        let unalerted = self.repository.get_unalerted(&ids, now)?;

        Ok(posts
            .into_iter()
            .filter(|m| unalerted.contains(&m.post.id))
            .collect())
    }

    /// Record dispatched posts. Matches that only came from test mode are skipped.
    pub fn record(&self, posts: &[MatchedPost], now: DateTime<Utc>) -> TattlerResult<usize> {
        let expires_at = now + retention_window();
        let mut recorded = 0;

        for matched in posts.iter().filter(|m| m.is_genuine()) {
            self.repository.mark_alerted(&matched.post.id, expires_at)?;
            recorded += 1;
        }

        Ok(recorded)
    }

    /// Move the legacy `(post-id, alerted-at)` collection into expiring keys
    pub fn migrate_legacy(&self) -> TattlerResult<usize> {
        let entries = self.repository.legacy_entries()?;

        for (post_id, alerted_at_ms) in &entries {
            let Some(alerted_at) = DateTime::from_timestamp_millis(*alerted_at_ms) else {
                tracing::warn!(post_id = %post_id, score = alerted_at_ms, "skipping legacy entry with invalid timestamp");
                continue;
            };
            self.repository
                .mark_alerted(post_id, alerted_at + retention_window())?;
        }

        self.repository.drop_legacy()?;
        Ok(entries.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Post, TEST_MODE_FEED};
    use crate::storage::sqlite::{SqliteAlertRepository, SqliteStorage};
    use crate::storage::traits::MockAlertRepository;
    use chrono::TimeZone;

    fn setup() -> (SqliteStorage, AlertService<SqliteAlertRepository>) {
        let storage = SqliteStorage::in_memory().unwrap();
        let service = AlertService::new(SqliteAlertRepository::new(storage.clone()));
        (storage, service)
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap()
    }

    fn matched(id: &str, feed: &str) -> MatchedPost {
        MatchedPost::new(Post::new(id, "Title", "mysub", "t5_own"), feed)
    }

    #[test]
    fn test_recorded_post_is_filtered_until_window_elapses() {
        let (_, service) = setup();
        service.record(&[matched("p1", "all")], now()).unwrap();

        let within = service
            .filter_unalerted(vec![matched("p1", "all"), matched("p2", "all")], now() + Duration::days(2))
            .unwrap();
        assert_eq!(within.len(), 1);
        assert_eq!(within[0].post.id, "p2");

        let after = service
            .filter_unalerted(vec![matched("p1", "all")], now() + Duration::days(3))
            .unwrap();
        assert_eq!(after.len(), 1);
    }

    #[test]
    fn test_test_mode_only_match_is_not_recorded() {
        let (_, service) = setup();
        let recorded = service
            .record(&[matched("p1", TEST_MODE_FEED)], now())
            .unwrap();

        assert_eq!(recorded, 0);
        assert!(!service.was_alerted("p1", now()).unwrap());
    }

    #[test]
    fn test_genuine_match_with_test_feed_is_recorded() {
        let (_, service) = setup();
        let mut post = matched("p1", "all");
        post.add_feed(TEST_MODE_FEED);

        assert_eq!(service.record(&[post], now()).unwrap(), 1);
        assert!(service.was_alerted("p1", now()).unwrap());
    }

    #[test]
    fn test_purge_removes_four_day_old_keeps_two_day_old() {
        let (_, service) = setup();
        service.record(&[matched("old", "all")], now() - Duration::days(4)).unwrap();
        service.record(&[matched("recent", "all")], now() - Duration::days(2)).unwrap();

        assert_eq!(service.purge(now()).unwrap(), 1);
        assert!(!service.was_alerted("old", now()).unwrap());
        assert!(service.was_alerted("recent", now()).unwrap());
    }

    #[test]
    fn test_migrate_legacy_entries() {
        let (storage, service) = setup();
        let two_days_ago = (now() - Duration::days(2)).timestamp_millis();
        let four_days_ago = (now() - Duration::days(4)).timestamp_millis();
        {
            let conn = storage.connection().unwrap();
            conn.execute_batch(
                "CREATE TABLE alerted_posts_legacy (member TEXT PRIMARY KEY, score INTEGER NOT NULL);",
            )
            .unwrap();
            conn.execute(
                "INSERT INTO alerted_posts_legacy (member, score) VALUES (?1, ?2), (?3, ?4)",
                ("recent", two_days_ago, "old", four_days_ago),
            )
            .unwrap();
        }

        assert_eq!(service.migrate_legacy().unwrap(), 2);
        assert!(service.was_alerted("recent", now()).unwrap());
        assert!(!service.was_alerted("old", now()).unwrap());
        assert!(!storage.table_exists("alerted_posts_legacy").unwrap());
    }

    #[test]
    fn test_storage_errors_propagate() {
        let mut repo = MockAlertRepository::new();
        repo.expect_get_unalerted().returning(|_, _| {
            Err(crate::errors::TattlerError::Database(
                rusqlite::Error::InvalidQuery,
            ))
        });

        let service = AlertService::new(repo);
        assert!(service.filter_unalerted(vec![matched("p1", "all")], now()).is_err());
    }
}
