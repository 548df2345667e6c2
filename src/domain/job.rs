use chrono::{DateTime, Duration, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// Name of the job that runs a feed check
pub const CHECK_FEEDS_JOB: &str = "checkFeeds";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobData {
    pub test_mode: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobSchedule {
    /// Fires at `minute_offset` past the hour and every `interval_minutes` after
    Recurring {
        cron: String,
        minute_offset: u32,
        interval_minutes: u32,
    },
    Once { run_at: DateTime<Utc> },
}

impl JobSchedule {
    pub fn every(interval_minutes: u32, minute_offset: u32) -> Self {
        JobSchedule::Recurring {
            cron: format!("{}/{} * * * *", minute_offset, interval_minutes),
            minute_offset,
            interval_minutes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledJob {
    pub id: Option<i64>,
    pub name: String,
    pub schedule: JobSchedule,
    pub data: JobData,
    pub last_run_at: Option<DateTime<Utc>>,
}

impl ScheduledJob {
    pub fn recurring(name: &str, interval_minutes: u32, minute_offset: u32) -> Self {
        Self {
            id: None,
            name: name.to_string(),
            schedule: JobSchedule::every(interval_minutes, minute_offset),
            data: JobData::default(),
            last_run_at: None,
        }
    }

    pub fn once(name: &str, run_at: DateTime<Utc>, data: JobData) -> Self {
        Self {
            id: None,
            name: name.to_string(),
            schedule: JobSchedule::Once { run_at },
            data,
            last_run_at: None,
        }
    }

    pub fn is_once(&self) -> bool {
        matches!(self.schedule, JobSchedule::Once { .. })
    }

    /// Whether the job should fire at `now`
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        match self.schedule {
            JobSchedule::Once { run_at } => run_at <= now,
            JobSchedule::Recurring {
                minute_offset,
                interval_minutes,
                ..
            } => {
                let Some(slot) = latest_slot(now, minute_offset, interval_minutes) else {
                    return false;
                };
                // A slot missed while another job was running is caught up once
                match self.last_run_at {
                    Some(last) => truncate_to_minute(last) < slot,
                    None => slot == truncate_to_minute(now),
                }
            }
        }
    }

    pub fn describe(&self) -> String {
        match &self.schedule {
            JobSchedule::Recurring { cron, .. } => format!("{} (cron {})", self.name, cron),
            JobSchedule::Once { run_at } => format!("{} (once at {})", self.name, run_at.to_rfc3339()),
        }
    }
}

/// Most recent minute at or before `now` matching the cron `offset/interval`
/// minute field, looking back at most an hour
fn latest_slot(now: DateTime<Utc>, minute_offset: u32, interval_minutes: u32) -> Option<DateTime<Utc>> {
    let interval = interval_minutes.max(1);
    let minute = truncate_to_minute(now);

    (0..60)
        .map(|back| minute - Duration::minutes(back))
        .find(|slot| slot.minute() >= minute_offset && (slot.minute() - minute_offset) % interval == 0)
}

fn truncate_to_minute(at: DateTime<Utc>) -> DateTime<Utc> {
    at.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(at)
}
