//! Emails candidates shortly before their interview starts.

use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

use super::mail::{Mailer, OutboundEmail};
use crate::config::JobsConfig;
use crate::hiring::candidates::Candidate;
use crate::hiring::companies::Company;
use crate::hiring::interviewers::Interviewer;
use crate::hiring::interviews::Interview;
use crate::hiring::resumes::Resume;
use crate::hiring::selections::CompanySelection;
use crate::hiring::users::User;
use crate::store::{RecordId, RepositoryError, Store, Tables};

pub const REMINDER_SUBJECT: &str = "Interview reminder";

/// Interviews starting in `[now + lead, now + lead + width)` are due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReminderWindow {
    pub lead: Duration,
    pub width: Duration,
}

impl Default for ReminderWindow {
    fn default() -> Self {
        Self {
            lead: Duration::minutes(60),
            width: Duration::seconds(60),
        }
    }
}

impl ReminderWindow {
    pub fn from_config(config: &JobsConfig) -> Self {
        Self {
            lead: Duration::minutes(config.reminder_lead_minutes),
            width: Duration::seconds(config.reminder_window_seconds),
        }
    }

    pub fn bounds(&self, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        let start = now + self.lead;
        (start, start + self.width)
    }

    pub fn contains(&self, now: DateTime<Utc>, at: DateTime<Utc>) -> bool {
        let (start, end) = self.bounds(now);
        start <= at && at < end
    }
}

/// Everything needed to address one reminder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reminder {
    pub interview_id: RecordId,
    pub email: String,
    pub first_name: String,
    pub company: String,
    pub start_time: DateTime<Utc>,
}

impl Reminder {
    pub fn message(&self) -> OutboundEmail {
        OutboundEmail {
            to: self.email.clone(),
            subject: REMINDER_SUBJECT.to_string(),
            body: format!(
                "Hello, {}! This is a reminder that your interview with company \"{}\" starts in 1 hour.",
                self.first_name, self.company
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReminderReport {
    pub sent: usize,
    pub failed: usize,
}

fn resolve(tables: &Tables, interview: &Interview) -> Option<Reminder> {
    let selection = tables.get::<CompanySelection>(interview.selection_id)?;
    let resume = tables.get::<Resume>(selection.resume_id)?;
    let candidate = tables.get::<Candidate>(resume.candidate_id)?;
    let user = tables.get::<User>(candidate.user_id)?;
    let company = tables
        .get::<Interviewer>(selection.interviewer_id)
        .and_then(|interviewer| tables.get::<Company>(interviewer.company_id))
        .map(|company| company.name.clone())
        .unwrap_or_default();

    Some(Reminder {
        interview_id: interview.id,
        email: user.email.clone(),
        first_name: user.first_name.clone(),
        company,
        start_time: interview.start_time,
    })
}

/// Reminders for every interview inside the window, ordered by interview id.
pub fn due_reminders(tables: &Tables, window: ReminderWindow, now: DateTime<Utc>) -> Vec<Reminder> {
    tables
        .interviews
        .iter()
        .filter(|interview| window.contains(now, interview.start_time))
        .filter_map(|interview| {
            let reminder = resolve(tables, interview);
            if reminder.is_none() {
                warn!(interview_id = interview.id, "interview has no reachable candidate, reminder skipped");
            }
            reminder
        })
        .collect()
}

/// Sends one reminder per due interview. Failed sends are logged and counted.
pub fn send_interview_reminders(
    store: &Store,
    mailer: &dyn Mailer,
    from: &str,
    window: ReminderWindow,
    now: DateTime<Utc>,
) -> Result<ReminderReport, RepositoryError> {
    let reminders = {
        let tables = store.read()?;
        due_reminders(&tables, window, now)
    };

    let mut report = ReminderReport::default();
    for reminder in &reminders {
        match mailer.send(from, &reminder.message()) {
            Ok(()) => {
                report.sent += 1;
                info!(interview_id = reminder.interview_id, to = %reminder.email, "interview reminder sent");
            }
            Err(err) => {
                report.failed += 1;
                warn!(interview_id = reminder.interview_id, error = %err, "interview reminder failed");
            }
        }
    }
    Ok(report)
}
