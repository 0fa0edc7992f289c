use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info};

use super::archive::archive_rejected_selections;
use super::mail::Mailer;
use super::reminders::{send_interview_reminders, ReminderReport, ReminderWindow};
use crate::config::JobsConfig;
use crate::hiring::activity::ActivityLog;
use crate::store::{RepositoryError, Store};

const SECONDS_PER_HOUR: u64 = 60 * 60;
/// Longest period a job loop waits between runs.
const MAX_PERIOD_SECONDS: u64 = 365 * 24 * SECONDS_PER_HOUR;

/// Runs the reminder, archival and activity-flush jobs on tokio intervals.
#[derive(Clone)]
pub struct JobRunner {
    store: Arc<Store>,
    mailer: Arc<dyn Mailer>,
    activity: ActivityLog,
    mail_from: String,
    config: JobsConfig,
}

/// Handles of the spawned job loops; dropping them leaves the loops running.
pub struct JobHandles {
    handles: Vec<JoinHandle<()>>,
}

impl JobHandles {
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn abort_all(&self) {
        for handle in &self.handles {
            handle.abort();
        }
    }
}

impl JobRunner {
    pub fn new(
        store: Arc<Store>,
        mailer: Arc<dyn Mailer>,
        activity: ActivityLog,
        mail_from: impl Into<String>,
        config: JobsConfig,
    ) -> Self {
        Self {
            store,
            mailer,
            activity,
            mail_from: mail_from.into(),
            config,
        }
    }

    /// Sends due reminders on the blocking pool.
    pub async fn remind_once(&self) -> Result<ReminderReport, RepositoryError> {
        let store = Arc::clone(&self.store);
        let mailer = Arc::clone(&self.mailer);
        let from = self.mail_from.clone();
        let window = ReminderWindow::from_config(&self.config);

        tokio::task::spawn_blocking(move || {
            send_interview_reminders(&store, mailer.as_ref(), &from, window, Utc::now())
        })
        .await
        .map_err(|err| RepositoryError::Unavailable(format!("reminder task failed: {err}")))?
    }

    pub fn archive_once(&self) -> Result<usize, RepositoryError> {
        archive_rejected_selections(&self.store, Utc::now(), self.config.archive_retention_days)
    }

    pub fn flush_activity_once(&self) -> Result<usize, RepositoryError> {
        self.activity.flush_into(&self.store)
    }

    pub fn spawn(&self) -> JobHandles {
        let reminders = self.clone();
        let archive = self.clone();
        let activity = self.clone();
        let archive_period = hours_to_seconds(self.config.archive_interval_hours);

        let handles = vec![
            every(self.config.reminder_interval_seconds, "interview reminders", move || {
                let runner = reminders.clone();
                async move {
                    match runner.remind_once().await {
                        Ok(report) if report.sent + report.failed > 0 => {
                            info!(sent = report.sent, failed = report.failed, "reminder run finished")
                        }
                        Ok(_) => {}
                        Err(err) => error!(error = %err, "reminder run failed"),
                    }
                }
            }),
            every(archive_period, "selection archive", move || {
                let result = archive.archive_once();
                async move {
                    if let Err(err) = result {
                        error!(error = %err, "archive run failed");
                    }
                }
            }),
            every(self.config.activity_flush_seconds, "activity flush", move || {
                let result = activity.flush_activity_once();
                async move {
                    if let Err(err) = result {
                        error!(error = %err, "activity flush failed");
                    }
                }
            }),
        ];

        info!(jobs = handles.len(), "background jobs scheduled");
        JobHandles { handles }
    }
}

fn every<F, Fut>(seconds: u64, name: &'static str, mut job: F) -> JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: std::future::Future<Output = ()> + Send + 'static,
{
    let period = job_period(seconds);
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick completes immediately; start one period later.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            tracing::debug!(job = name, "running scheduled job");
            job().await;
        }
    })
}

fn hours_to_seconds(hours: u64) -> u64 {
    hours
        .checked_mul(SECONDS_PER_HOUR)
        .unwrap_or(MAX_PERIOD_SECONDS)
}

fn job_period(seconds: u64) -> Duration {
    Duration::from_secs(seconds.clamp(1, MAX_PERIOD_SECONDS))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn periods_are_clamped_instead_of_overflowing() {
        assert_eq!(hours_to_seconds(168), 168 * 3600);
        assert_eq!(hours_to_seconds(u64::MAX), MAX_PERIOD_SECONDS);
        assert_eq!(job_period(0), Duration::from_secs(1));
        assert_eq!(job_period(30), Duration::from_secs(30));
        assert_eq!(job_period(u64::MAX), Duration::from_secs(MAX_PERIOD_SECONDS));
    }
}
