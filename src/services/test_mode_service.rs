use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::domain::{JobData, ScheduledJob, CHECK_FEEDS_JOB};
use crate::errors::TattlerResult;
use crate::platform::Platform;
use crate::settings::AppSettings;
use crate::storage::traits::JobRepository;

/// Above this many subscribers, user-visible test runs need confirmation
pub const CONFIRMATION_SUBSCRIBER_THRESHOLD: u64 = 50;

pub const TEST_MODE_QUEUED_MESSAGE: &str =
    "A random post on your sub will be now treated as if it was trending based on configured options.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestModeRequest {
    NeedsConfirmation { subscribers: u64 },
    Queued { job_id: i64 },
}

/// Moderator-triggered preview of the configured actions
pub struct TestModeService<P: Platform, J: JobRepository> {
    platform: Arc<P>,
    jobs: J,
    subreddit: String,
}

impl<P: Platform, J: JobRepository> TestModeService<P, J> {
    pub fn new(platform: Arc<P>, jobs: J, subreddit: &str) -> Self {
        Self {
            platform,
            jobs,
            subreddit: subreddit.to_string(),
        }
    }

    /// Whether running a test now would need an explicit confirmation
    pub fn needs_confirmation(&self, settings: &AppSettings) -> TattlerResult<Option<u64>> {
        if !settings.has_user_visible_actions() {
            return Ok(None);
        }

        let info = self.platform.subreddit_info(&self.subreddit)?;
        if info.subscribers > CONFIRMATION_SUBSCRIBER_THRESHOLD {
            Ok(Some(info.subscribers))
        } else {
            Ok(None)
        }
    }

    pub fn request(
        &self,
        settings: &AppSettings,
        confirmed: bool,
        now: DateTime<Utc>,
    ) -> TattlerResult<TestModeRequest> {
        if !confirmed {
            if let Some(subscribers) = self.needs_confirmation(settings)? {
                return Ok(TestModeRequest::NeedsConfirmation { subscribers });
            }
        }

        self.trigger(now)
    }

    /// Queue a one-off test-mode check to run immediately
    pub fn trigger(&self, now: DateTime<Utc>) -> TattlerResult<TestModeRequest> {
        let job = ScheduledJob::once(CHECK_FEEDS_JOB, now, JobData { test_mode: true });
        let job_id = self.jobs.add(&job)?;
        tracing::info!(job_id, "queued test mode check");
        Ok(TestModeRequest::Queued { job_id })
    }
}
