use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::choices::{Choice, InterviewStatus, Verdict};
use super::evaluations::InterviewEvaluation;
use super::selections::CompanySelection;
use super::tasks::{correct_answers, task_summary, CorrectAnswers, TaskItem, TaskSummary};
use crate::http::resource::fetch;
use crate::http::validation::{
    check_future, check_rating, check_time_order, check_url, choice, choice_filter,
    duration_minutes, nullable, optional, optional_text, reference, required, required_text,
    FieldErrors, Nullable, WriteMode,
};
use crate::http::{resource_routes, ApiError, HubState, Resource};
use crate::store::{Record, RecordId, Table, Tables};

/// A scheduled session belonging to a company selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interview {
    pub id: RecordId,
    pub selection_id: RecordId,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Whole minutes between start and end, recomputed on every write.
    pub duration: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub status: InterviewStatus,
    pub feedback: Option<String>,
    pub notes: Option<String>,
    pub hard_skills_rate: Option<i32>,
    pub soft_skills_rate: Option<i32>,
    pub result: Option<Verdict>,
    pub recording_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct InterviewInput {
    pub selection_id: Option<RecordId>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub status: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub feedback: Nullable<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub notes: Nullable<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub hard_skills_rate: Nullable<i32>,
    #[serde(default, deserialize_with = "nullable")]
    pub soft_skills_rate: Nullable<i32>,
    pub result: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub recording_url: Nullable<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct InterviewFilter {
    pub selection: Option<RecordId>,
    pub status: Option<String>,
    pub result: Option<String>,
}

/// Start/end pair after applying a write, with shared time checks.
///
/// A supplied start must lie in the future; the stored start of an existing
/// record is not re-checked.
pub(crate) fn resolve_schedule(
    errors: &mut FieldErrors,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    current: Option<(DateTime<Utc>, DateTime<Utc>)>,
    mode: WriteMode,
    now: DateTime<Utc>,
) -> (DateTime<Utc>, DateTime<Utc>) {
    if let Some(start) = start {
        check_future(errors, "start_time", start, now);
    }
    let start_time = required(
        errors,
        "start_time",
        start,
        current.as_ref().map(|(start, _)| start),
        mode,
    );
    let end_time = required(
        errors,
        "end_time",
        end,
        current.as_ref().map(|(_, end)| end),
        mode,
    );
    if !errors.contains("start_time") && !errors.contains("end_time") {
        check_time_order(errors, start_time, end_time);
    }
    (start_time, end_time)
}

impl Record for Interview {
    const KIND: &'static str = "interview";

    fn id(&self) -> RecordId {
        self.id
    }

    fn table(tables: &Tables) -> &Table<Self> {
        &tables.interviews
    }

    fn table_mut(tables: &mut Tables) -> &mut Table<Self> {
        &mut tables.interviews
    }

    fn cascade(tables: &mut Tables, id: RecordId) {
        tables.delete_where::<InterviewTaskItem, _>(|item| item.interview_id == id);
        tables.delete_where::<InterviewEvaluation, _>(|evaluation| evaluation.interview_id == id);
    }
}

impl Resource for Interview {
    const SEGMENT: &'static str = "interviews";

    type Input = InterviewInput;
    type Filter = InterviewFilter;
    type View = Interview;

    fn write(
        tables: &Tables,
        id: RecordId,
        current: Option<&Self>,
        input: InterviewInput,
        mode: WriteMode,
        now: DateTime<Utc>,
    ) -> Result<Self, ApiError> {
        let mut errors = FieldErrors::new();
        let selection_id = reference::<CompanySelection>(
            tables,
            &mut errors,
            "selection_id",
            input.selection_id,
            current.map(|interview| &interview.selection_id),
            mode,
        );
        let (start_time, end_time) = resolve_schedule(
            &mut errors,
            input.start_time,
            input.end_time,
            current.map(|interview| (interview.start_time, interview.end_time)),
            mode,
            now,
        );
        let kind = required_text(
            &mut errors,
            "type",
            input.kind,
            current.map(|interview| &interview.kind),
            mode,
            255,
        );
        check_rating(&mut errors, "hard_skills_rate", input.hard_skills_rate.flatten());
        check_rating(&mut errors, "soft_skills_rate", input.soft_skills_rate.flatten());
        check_url(
            &mut errors,
            "recording_url",
            input.recording_url.as_ref().and_then(Option::as_deref),
        );

        let status = match input.status {
            Some(raw) => choice(&mut errors, "status", Some(raw)),
            None => Some(current.map_or(InterviewStatus::default(), |interview| interview.status)),
        };
        let result = match input.result {
            Some(raw) => choice(&mut errors, "result", Some(raw)),
            None => current.and_then(|interview| interview.result),
        };
        let feedback = optional_text(
            &mut errors,
            "feedback",
            input.feedback,
            current.map(|interview| &interview.feedback),
            usize::MAX,
        );
        let notes = optional_text(
            &mut errors,
            "notes",
            input.notes,
            current.map(|interview| &interview.notes),
            usize::MAX,
        );
        errors.into_result()?;

        Ok(Interview {
            id,
            selection_id,
            start_time,
            end_time,
            duration: duration_minutes(start_time, end_time),
            kind,
            status: status.unwrap_or_default(),
            feedback,
            notes,
            hard_skills_rate: optional(
                input.hard_skills_rate,
                current.map(|interview| &interview.hard_skills_rate),
            ),
            soft_skills_rate: optional(
                input.soft_skills_rate,
                current.map(|interview| &interview.soft_skills_rate),
            ),
            result,
            recording_url: optional(
                input.recording_url,
                current.map(|interview| &interview.recording_url),
            ),
        })
    }

    fn view(&self, _tables: &Tables) -> Interview {
        self.clone()
    }

    fn check_filter(filter: &InterviewFilter) -> Result<(), ApiError> {
        choice_filter::<InterviewStatus>("status", filter.status.as_deref())?;
        choice_filter::<Verdict>("result", filter.result.as_deref())?;
        Ok(())
    }

    fn matches(&self, _tables: &Tables, filter: &InterviewFilter) -> bool {
        if filter
            .selection
            .is_some_and(|selection| selection != self.selection_id)
        {
            return false;
        }
        if let Some(status) = filter.status.as_deref().and_then(InterviewStatus::parse) {
            if status != self.status {
                return false;
            }
        }
        match filter.result.as_deref().and_then(Verdict::parse) {
            Some(result) => self.result == Some(result),
            None => true,
        }
    }
}

/// Task given during an interview together with the candidate's answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterviewTaskItem {
    pub id: RecordId,
    pub interview_id: RecordId,
    pub task_item_id: RecordId,
    pub candidate_answer: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct InterviewTaskItemInput {
    pub interview_id: Option<RecordId>,
    pub task_item_id: Option<RecordId>,
    pub candidate_answer: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct InterviewTaskItemFilter {
    pub interview: Option<RecordId>,
    pub task_item: Option<RecordId>,
}

/// Interview task with the underlying task and its reference answers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterviewTaskDetail {
    pub id: RecordId,
    pub interview: RecordId,
    pub task: Option<TaskSummary>,
    pub candidate_answer: String,
    pub correct_answers: CorrectAnswers,
}

impl Record for InterviewTaskItem {
    const KIND: &'static str = "interview task";

    fn id(&self) -> RecordId {
        self.id
    }

    fn table(tables: &Tables) -> &Table<Self> {
        &tables.interview_tasks
    }

    fn table_mut(tables: &mut Tables) -> &mut Table<Self> {
        &mut tables.interview_tasks
    }
}

impl Resource for InterviewTaskItem {
    const SEGMENT: &'static str = "interview-tasks";

    type Input = InterviewTaskItemInput;
    type Filter = InterviewTaskItemFilter;
    type View = InterviewTaskDetail;

    fn write(
        tables: &Tables,
        id: RecordId,
        current: Option<&Self>,
        input: InterviewTaskItemInput,
        mode: WriteMode,
        _now: DateTime<Utc>,
    ) -> Result<Self, ApiError> {
        let mut errors = FieldErrors::new();
        let interview_id = reference::<Interview>(
            tables,
            &mut errors,
            "interview_id",
            input.interview_id,
            current.map(|item| &item.interview_id),
            mode,
        );
        let task_item_id = reference::<TaskItem>(
            tables,
            &mut errors,
            "task_item_id",
            input.task_item_id,
            current.map(|item| &item.task_item_id),
            mode,
        );
        let candidate_answer = required_text(
            &mut errors,
            "candidate_answer",
            input.candidate_answer,
            current.map(|item| &item.candidate_answer),
            mode,
            usize::MAX,
        );
        errors.into_result()?;

        Ok(InterviewTaskItem {
            id,
            interview_id,
            task_item_id,
            candidate_answer,
        })
    }

    fn view(&self, tables: &Tables) -> InterviewTaskDetail {
        InterviewTaskDetail {
            id: self.id,
            interview: self.interview_id,
            task: task_summary(tables, self.task_item_id),
            candidate_answer: self.candidate_answer.clone(),
            correct_answers: correct_answers(tables, self.task_item_id),
        }
    }

    fn matches(&self, _tables: &Tables, filter: &InterviewTaskItemFilter) -> bool {
        filter
            .interview
            .map_or(true, |interview| interview == self.interview_id)
            && filter
                .task_item
                .map_or(true, |task_item| task_item == self.task_item_id)
    }
}

/// Task detail views of one interview, in id order.
pub fn interview_tasks(
    tables: &Tables,
    interview_id: RecordId,
) -> Result<Vec<InterviewTaskDetail>, ApiError> {
    fetch::<Interview>(tables, interview_id)?;
    Ok(tables
        .interview_tasks
        .iter()
        .filter(|item| item.interview_id == interview_id)
        .map(|item| item.view(tables))
        .collect())
}

pub(crate) fn routes() -> Router<HubState> {
    resource_routes::<Interview>()
        .merge(resource_routes::<InterviewTaskItem>())
        .route("/interviews/:id/tasks", get(interview_tasks_handler))
}

async fn interview_tasks_handler(
    State(state): State<HubState>,
    id: Result<Path<RecordId>, PathRejection>,
) -> Result<Json<Vec<InterviewTaskDetail>>, ApiError> {
    let Path(id) = id?;
    let tables = state.store.read()?;
    Ok(Json(interview_tasks(&tables, id)?))
}
