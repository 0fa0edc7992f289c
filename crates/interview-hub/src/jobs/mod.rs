//! Background jobs: interview reminders, archival of stale rejections and the
//! activity buffer flush.

pub mod archive;
pub mod mail;
pub mod reminders;
pub mod scheduler;

pub use archive::{archive_rejected_selections, retention_cutoff, DEFAULT_RETENTION_DAYS};
pub use mail::{LogMailer, MailError, Mailer, MemoryMailer, OutboundEmail};
pub use reminders::{due_reminders, send_interview_reminders, Reminder, ReminderReport, ReminderWindow};
pub use scheduler::{JobHandles, JobRunner};
