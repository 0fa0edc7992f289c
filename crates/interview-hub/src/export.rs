//! CSV documents for spreadsheet export of interviews and test tasks.

use std::fmt;
use std::str::FromStr;

use axum::extract::{Path, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use serde::Serialize;
use tracing::info;

use crate::hiring::choices::{Choice, Verdict};
use crate::hiring::interviews::Interview;
use crate::hiring::tasks::TaskItem;
use crate::hiring::test_tasks::TestTask;
use crate::http::{ApiError, HubState};
use crate::store::{RecordId, Tables};

pub const ANSWER_PREVIEW_CHARS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Interviews,
    InterviewTaskItems,
    TestTasks,
    TestTaskItems,
}

impl ExportKind {
    pub const ALL: [ExportKind; 4] = [
        ExportKind::Interviews,
        ExportKind::InterviewTaskItems,
        ExportKind::TestTasks,
        ExportKind::TestTaskItems,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            ExportKind::Interviews => "interviews",
            ExportKind::InterviewTaskItems => "interview-task-items",
            ExportKind::TestTasks => "test-tasks",
            ExportKind::TestTaskItems => "test-task-items",
        }
    }

    pub fn file_name(self) -> String {
        format!("{}.csv", self.slug())
    }
}

impl fmt::Display for ExportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for ExportKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim().trim_end_matches(".csv");
        ExportKind::ALL
            .into_iter()
            .find(|kind| kind.slug().eq_ignore_ascii_case(value))
            .ok_or_else(|| {
                let known: Vec<_> = ExportKind::ALL.iter().map(|kind| kind.slug()).collect();
                format!("unknown export `{value}`, expected one of: {}", known.join(", "))
            })
    }
}

#[derive(Debug)]
pub enum ExportError {
    Csv(csv::Error),
    Io(std::io::Error),
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::Csv(err) => write!(f, "failed to write CSV export: {err}"),
            ExportError::Io(err) => write!(f, "failed to flush CSV export: {err}"),
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExportError::Csv(err) => Some(err),
            ExportError::Io(err) => Some(err),
        }
    }
}

impl From<csv::Error> for ExportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

impl From<std::io::Error> for ExportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::IntoInnerError<csv::Writer<Vec<u8>>>> for ExportError {
    fn from(err: csv::IntoInnerError<csv::Writer<Vec<u8>>>) -> Self {
        Self::Io(err.into_error())
    }
}

impl From<ExportError> for ApiError {
    fn from(value: ExportError) -> Self {
        ApiError::Internal(value.to_string())
    }
}

#[derive(Debug, Serialize)]
struct InterviewRow<'a> {
    id: RecordId,
    selection: RecordId,
    start_time: String,
    end_time: String,
    duration: String,
    #[serde(rename = "type")]
    kind: &'a str,
    status: &'static str,
    feedback: &'a str,
    notes: &'a str,
    hard_skills_rate: Option<i32>,
    soft_skills_rate: Option<i32>,
    result: &'static str,
    recording_url: &'a str,
}

#[derive(Debug, Serialize)]
struct InterviewTaskItemRow {
    id: RecordId,
    interview: RecordId,
    task_item: RecordId,
    candidate_answer: String,
}

#[derive(Debug, Serialize)]
struct TestTaskRow {
    id: RecordId,
    #[serde(rename = "Candidate Email")]
    candidate_email: String,
    selection: RecordId,
    start_time: String,
    end_time: String,
    result: &'static str,
    duration: i64,
}

#[derive(Debug, Serialize)]
struct TestTaskItemRow<'a> {
    id: RecordId,
    #[serde(rename = "Candidate Email")]
    candidate_email: String,
    test_task: RecordId,
    #[serde(rename = "Task Title")]
    task_title: String,
    candidate_answer: String,
    interviewer_comment: &'a str,
}

/// Renders minutes as `"{h}h {m}m"`.
pub fn format_duration(minutes: i64) -> String {
    let minutes = minutes.max(0);
    format!("{}h {}m", minutes / 60, minutes % 60)
}

/// Cuts answers longer than the preview to its first characters plus `...`.
pub fn truncate_answer(answer: &str) -> String {
    if answer.chars().count() > ANSWER_PREVIEW_CHARS {
        let preview: String = answer.chars().take(ANSWER_PREVIEW_CHARS).collect();
        format!("{preview}...")
    } else {
        answer.to_string()
    }
}

fn verdict_label(verdict: Option<Verdict>) -> &'static str {
    verdict.map(Choice::label).unwrap_or_default()
}

fn accepted(task: &TestTask) -> bool {
    task.result == Some(Verdict::Accepted)
}

/// Renders one export as CSV bytes; the header row precedes the first record.
pub fn render(tables: &Tables, kind: ExportKind) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    let rows = match kind {
        ExportKind::Interviews => {
            let interviews: Vec<&Interview> = tables.interviews.iter().collect();
            for interview in &interviews {
                writer.serialize(InterviewRow {
                    id: interview.id,
                    selection: interview.selection_id,
                    start_time: interview.start_time.to_rfc3339(),
                    end_time: interview.end_time.to_rfc3339(),
                    duration: format_duration(interview.duration),
                    kind: &interview.kind,
                    status: interview.status.label(),
                    feedback: interview.feedback.as_deref().unwrap_or_default(),
                    notes: interview.notes.as_deref().unwrap_or_default(),
                    hard_skills_rate: interview.hard_skills_rate,
                    soft_skills_rate: interview.soft_skills_rate,
                    result: verdict_label(interview.result),
                    recording_url: interview.recording_url.as_deref().unwrap_or_default(),
                })?;
            }
            interviews.len()
        }
        ExportKind::InterviewTaskItems => {
            for item in tables.interview_tasks.iter() {
                writer.serialize(InterviewTaskItemRow {
                    id: item.id,
                    interview: item.interview_id,
                    task_item: item.task_item_id,
                    candidate_answer: truncate_answer(&item.candidate_answer),
                })?;
            }
            tables.interview_tasks.len()
        }
        ExportKind::TestTasks => {
            let mut count = 0;
            for task in tables.test_tasks.iter().filter(|task| accepted(task)) {
                writer.serialize(TestTaskRow {
                    id: task.id,
                    candidate_email: task.candidate_email(tables),
                    selection: task.selection_id,
                    start_time: task.start_time.to_rfc3339(),
                    end_time: task.end_time.to_rfc3339(),
                    result: verdict_label(task.result),
                    duration: task.duration,
                })?;
                count += 1;
            }
            count
        }
        ExportKind::TestTaskItems => {
            let mut count = 0;
            for item in tables.test_task_items.iter() {
                let Some(task) = tables.get::<TestTask>(item.test_task_id).filter(|task| accepted(task))
                else {
                    continue;
                };
                writer.serialize(TestTaskItemRow {
                    id: item.id,
                    candidate_email: task.candidate_email(tables),
                    test_task: item.test_task_id,
                    task_title: tables
                        .get::<TaskItem>(item.task_item_id)
                        .map(|task_item| task_item.title.clone())
                        .unwrap_or_default(),
                    candidate_answer: truncate_answer(&item.candidate_answer),
                    interviewer_comment: item.interviewer_comment.as_deref().unwrap_or_default(),
                })?;
                count += 1;
            }
            count
        }
    };

    let bytes = writer.into_inner()?;
    info!(export = %kind, rows, "CSV export rendered");
    Ok(bytes)
}

pub fn export_routes() -> Router<HubState> {
    Router::new().route("/export/:file", get(export_handler))
}

async fn export_handler(
    State(state): State<HubState>,
    Path(file): Path<String>,
) -> Result<Response, ApiError> {
    let kind = file
        .strip_suffix(".csv")
        .and_then(|slug| slug.parse::<ExportKind>().ok())
        .ok_or_else(|| ApiError::NotFound(format!("export {file} does not exist")))?;
    let body = {
        let tables = state.store.read()?;
        render(&tables, kind)?
    };

    Ok((
        [
            (CONTENT_TYPE, mime::TEXT_CSV_UTF_8.to_string()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", kind.file_name()),
            ),
        ],
        body,
    )
        .into_response())
}
