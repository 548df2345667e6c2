use chrono::{DateTime, Utc};
use rusqlite::Row;

use crate::domain::{JobData, JobSchedule, ScheduledJob};
use crate::errors::{TattlerError, TattlerResult};
use crate::storage::sqlite::SqliteStorage;
use crate::storage::traits::JobRepository;

pub struct SqliteJobRepository {
    storage: SqliteStorage,
}

impl SqliteJobRepository {
    pub fn new(storage: SqliteStorage) -> Self {
        Self { storage }
    }
}

fn from_millis(ms: i64) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms).ok_or(rusqlite::Error::IntegralValueOutOfRange(0, ms))
}

fn job_from_row(row: &Row<'_>) -> rusqlite::Result<ScheduledJob> {
    let cron: Option<String> = row.get(2)?;
    let minute_offset: Option<u32> = row.get(3)?;
    let interval_minutes: Option<u32> = row.get(4)?;
    let run_at: Option<i64> = row.get(5)?;
    let data: String = row.get(6)?;
    let last_run_at: Option<i64> = row.get(7)?;

    let schedule = match (run_at, minute_offset, interval_minutes) {
        (Some(run_at), _, _) => JobSchedule::Once {
            run_at: from_millis(run_at)?,
        },
        (None, Some(minute_offset), Some(interval_minutes)) => JobSchedule::Recurring {
            cron: cron.unwrap_or_else(|| format!("{}/{} * * * *", minute_offset, interval_minutes)),
            minute_offset,
            interval_minutes,
        },
        _ => return Err(rusqlite::Error::InvalidColumnType(3, "schedule".to_string(), rusqlite::types::Type::Null)),
    };

    let id: i64 = row.get(0)?;

    Ok(ScheduledJob {
        id: Some(id),
        name: row.get(1)?,
        schedule,
        data: parse_job_data(id, &data),
        last_run_at: last_run_at.map(from_millis).transpose()?,
    })
}

/// Unknown payload fields are ignored, a broken payload means no flags
fn parse_job_data(id: i64, data: &str) -> JobData {
    serde_json::from_str(data).unwrap_or_else(|e| {
        tracing::warn!(job_id = id, error = %e, payload = data, "unreadable job data, running without flags");
        JobData::default()
    })
}

impl JobRepository for SqliteJobRepository {
    fn add(&self, job: &ScheduledJob) -> TattlerResult<i64> {
        let conn = self.storage.connection()?;
        let data = serde_json::to_string(&job.data)?;

        match &job.schedule {
            JobSchedule::Recurring {
                cron,
                minute_offset,
                interval_minutes,
            } => conn.execute(
                "INSERT INTO scheduled_jobs (name, cron, minute_offset, interval_minutes, data) VALUES (?1, ?2, ?3, ?4, ?5)",
                (&job.name, cron, minute_offset, interval_minutes, &data),
            )?,
            JobSchedule::Once { run_at } => conn.execute(
                "INSERT INTO scheduled_jobs (name, run_at, data) VALUES (?1, ?2, ?3)",
                (&job.name, run_at.timestamp_millis(), &data),
            )?,
        };

        Ok(conn.last_insert_rowid())
    }

    fn get_all(&self) -> TattlerResult<Vec<ScheduledJob>> {
        let conn = self.storage.connection()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, cron, minute_offset, interval_minutes, run_at, data, last_run_at FROM scheduled_jobs ORDER BY id ASC",
        )?;

        let jobs = stmt.query_map([], job_from_row)?;
        jobs.collect::<Result<Vec<_>, _>>().map_err(TattlerError::from)
    }

    fn cancel(&self, id: i64) -> TattlerResult<()> {
        let conn = self.storage.connection()?;
        conn.execute("DELETE FROM scheduled_jobs WHERE id = ?1", [id])?;
        Ok(())
    }

    fn mark_run(&self, id: i64, at: DateTime<Utc>) -> TattlerResult<()> {
        let conn = self.storage.connection()?;
        conn.execute(
            "UPDATE scheduled_jobs SET last_run_at = ?1 WHERE id = ?2",
            (at.timestamp_millis(), id),
        )?;
        Ok(())
    }
}
