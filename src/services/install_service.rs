use rand::Rng;

use crate::domain::{ScheduledJob, CHECK_FEEDS_JOB};
use crate::errors::TattlerResult;
use crate::services::alert_service::AlertService;
use crate::storage::traits::{AlertRepository, JobRepository, MigrationRepository};

/// Feed checks run every this many minutes
pub const CHECK_INTERVAL_MINUTES: u32 = 30;

pub const LEGACY_ALERTS_MIGRATION: &str = "legacy-alerted-set-to-expiring-keys";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    pub cancelled_jobs: usize,
    pub job: ScheduledJob,
    /// Legacy alert records moved, `None` when the migration had already run
    pub migrated_alerts: Option<usize>,
}

/// Install and upgrade hook: one schedule, data migrations applied once
pub struct InstallService<J: JobRepository, M: MigrationRepository, A: AlertRepository> {
    jobs: J,
    migrations: M,
    alerts: AlertService<A>,
}

impl<J: JobRepository, M: MigrationRepository, A: AlertRepository> InstallService<J, M, A> {
    pub fn new(jobs: J, migrations: M, alert_repository: A) -> Self {
        Self {
            jobs,
            migrations,
            alerts: AlertService::new(alert_repository),
        }
    }

    /// Spread installs over the half hour instead of all firing together
    pub fn on_install_or_upgrade(&self) -> TattlerResult<InstallReport> {
        let minute_offset = rand::rng().random_range(0..CHECK_INTERVAL_MINUTES);
        self.install_with_offset(minute_offset)
    }

    pub fn install_with_offset(&self, minute_offset: u32) -> TattlerResult<InstallReport> {
        let cancelled_jobs = self.cancel_all_jobs()?;

        let mut job = ScheduledJob::recurring(CHECK_FEEDS_JOB, CHECK_INTERVAL_MINUTES, minute_offset);
        job.id = Some(self.jobs.add(&job)?);
        tracing::info!(
            "Running at {} and {} past the hour",
            minute_offset,
            minute_offset + CHECK_INTERVAL_MINUTES
        );

        let migrated_alerts = self.migrate_legacy_alerts()?;

        Ok(InstallReport {
            cancelled_jobs,
            job,
            migrated_alerts,
        })
    }

    fn cancel_all_jobs(&self) -> TattlerResult<usize> {
        let existing = self.jobs.get_all()?;
        let mut cancelled = 0;

        for job in existing {
            if let Some(id) = job.id {
                self.jobs.cancel(id)?;
                cancelled += 1;
            }
        }

        if cancelled > 0 {
            tracing::info!(cancelled, "cancelled previously scheduled jobs");
        }
        Ok(cancelled)
    }

    fn migrate_legacy_alerts(&self) -> TattlerResult<Option<usize>> {
        if self.migrations.is_applied(LEGACY_ALERTS_MIGRATION)? {
            return Ok(None);
        }

        let moved = self.alerts.migrate_legacy()?;
        self.migrations.mark_applied(LEGACY_ALERTS_MIGRATION)?;
        tracing::info!(moved, migration = LEGACY_ALERTS_MIGRATION, "migration applied");

        Ok(Some(moved))
    }
}
