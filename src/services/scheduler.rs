use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::domain::ScheduledJob;
use crate::errors::TattlerResult;
use crate::storage::traits::JobRepository;

/// How often `serve` looks for due jobs
pub const POLL_INTERVAL: Duration = Duration::from_secs(20);

/// Runs scheduled jobs from the job table
pub struct Scheduler<J: JobRepository> {
    jobs: J,
}

impl<J: JobRepository> Scheduler<J> {
    pub fn new(jobs: J) -> Self {
        Self { jobs }
    }

    pub fn jobs(&self) -> TattlerResult<Vec<ScheduledJob>> {
        self.jobs.get_all()
    }

    /// Run every job due at `now`. Returns how many ran.
    ///
    /// One-off jobs are removed before they run so a failing job cannot
    /// fire again; recurring jobs are stamped with `now` first for the same
    /// reason. A job error is logged and does not stop the others.
    pub fn run_due<F>(&self, now: DateTime<Utc>, mut run: F) -> TattlerResult<usize>
    where
        F: FnMut(&ScheduledJob) -> TattlerResult<()>,
    {
        let mut ran = 0;

        for job in self.jobs.get_all()?.into_iter().filter(|j| j.is_due(now)) {
            let Some(id) = job.id else {
                continue;
            };

            if job.is_once() {
                self.jobs.cancel(id)?;
            } else {
                self.jobs.mark_run(id, now)?;
            }

            tracing::info!(job = %job.describe(), test_mode = job.data.test_mode, "running job");
            if let Err(e) = run(&job) {
                tracing::error!(job = %job.name, error = %e, "job failed");
            }
            ran += 1;
        }

        Ok(ran)
    }

    /// Loop forever, running jobs as they come due
    pub fn serve<F>(&self, mut run: F) -> TattlerResult<()>
    where
        F: FnMut(&ScheduledJob) -> TattlerResult<()>,
    {
        tracing::info!("scheduler started");
        loop {
            if let Err(e) = self.run_due(Utc::now(), &mut run) {
                tracing::error!(error = %e, "failed to read scheduled jobs");
            }
            std::thread::sleep(POLL_INTERVAL);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{JobData, CHECK_FEEDS_JOB};
    use crate::errors::TattlerError;
    use crate::storage::sqlite::{SqliteJobRepository, SqliteStorage};
    use crate::storage::traits::MockJobRepository;
    use chrono::TimeZone;

    fn at(minute: u32, second: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 18, 12, minute, second).unwrap()
    }

    fn setup() -> (SqliteStorage, Scheduler<SqliteJobRepository>) {
        let storage = SqliteStorage::in_memory().unwrap();
        let scheduler = Scheduler::new(SqliteJobRepository::new(storage.clone()));
        (storage, scheduler)
    }

    #[test]
    fn test_recurring_job_runs_once_per_slot() {
        let (storage, scheduler) = setup();
        SqliteJobRepository::new(storage)
            .add(&ScheduledJob::recurring(CHECK_FEEDS_JOB, 30, 5))
            .unwrap();

        let mut runs = 0;
        let mut tick = |now| {
            scheduler
                .run_due(now, |_| {
                    runs += 1;
                    Ok(())
                })
                .unwrap()
        };

        assert_eq!(tick(at(5, 0)), 1);
        assert_eq!(tick(at(5, 20)), 0);
        assert_eq!(tick(at(6, 0)), 0);
        assert_eq!(tick(at(35, 0)), 1);
        assert_eq!(runs, 2);
    }

    #[test]
    fn test_recurring_job_catches_up_after_long_job() {
        let (storage, scheduler) = setup();
        let repo = SqliteJobRepository::new(storage);
        repo.add(&ScheduledJob::recurring(CHECK_FEEDS_JOB, 30, 5)).unwrap();

        let noop = |_: &ScheduledJob| -> TattlerResult<()> { Ok(()) };
        assert_eq!(scheduler.run_due(at(5, 0), noop).unwrap(), 1);

        // No poll landed in minute 35
        assert_eq!(scheduler.run_due(at(36, 40), noop).unwrap(), 1);
        assert_eq!(scheduler.run_due(at(37, 0), noop).unwrap(), 0);
        assert_eq!(repo.get_all().unwrap()[0].last_run_at, Some(at(36, 40)));
    }

    #[test]
    fn test_one_off_job_runs_and_is_removed() {
        let (storage, scheduler) = setup();
        let repo = SqliteJobRepository::new(storage.clone());
        repo.add(&ScheduledJob::once(CHECK_FEEDS_JOB, at(0, 0), JobData { test_mode: true }))
            .unwrap();

        let mut saw_test_mode = false;
        scheduler
            .run_due(at(0, 10), |job| {
                saw_test_mode = job.data.test_mode;
                Ok(())
            })
            .unwrap();

        assert!(saw_test_mode);
        assert!(repo.get_all().unwrap().is_empty());
    }

    #[test]
    fn test_failing_job_does_not_stop_others() {
        let (storage, scheduler) = setup();
        let repo = SqliteJobRepository::new(storage);
        repo.add(&ScheduledJob::once("first", at(0, 0), JobData::default())).unwrap();
        repo.add(&ScheduledJob::once("second", at(0, 0), JobData::default())).unwrap();

        let mut names = Vec::new();
        let ran = scheduler
            .run_due(at(1, 0), |job| {
                names.push(job.name.clone());
                Err(TattlerError::Scheduler("boom".to_string()))
            })
            .unwrap();

        assert_eq!(ran, 2);
        assert_eq!(names, vec!["first", "second"]);
    }

    #[test]
    fn test_repository_error_propagates() {
        let mut repo = MockJobRepository::new();
        repo.expect_get_all()
            .returning(|| Err(TattlerError::Database(rusqlite::Error::InvalidQuery)));

        let scheduler = Scheduler::new(repo);
        assert!(scheduler.run_due(at(0, 0), |_| Ok(())).is_err());
    }
}
