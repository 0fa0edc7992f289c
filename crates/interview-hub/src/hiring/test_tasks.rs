use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::routing::post;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::choices::{Choice, Verdict};
use super::evaluations::TestEvaluation;
use super::interviews::resolve_schedule;
use super::selections::CompanySelection;
use super::tasks::TaskItem;
use crate::http::resource::fetch;
use crate::http::validation::{
    check_url, choice, choice_filter, duration_minutes, nullable, optional, optional_text,
    reference, required_text, FieldErrors, Nullable, WriteMode,
};
use crate::http::{resource_routes, ApiError, HubState, Resource};
use crate::store::{Record, RecordId, Table, Tables};

/// Take-home or online test assigned within a selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestTask {
    pub id: RecordId,
    pub selection_id: RecordId,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration: i64,
    pub result: Option<Verdict>,
    pub recording_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TestTaskInput {
    pub selection_id: Option<RecordId>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub result: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub recording_url: Nullable<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TestTaskFilter {
    pub selection: Option<RecordId>,
    pub result: Option<String>,
}

impl TestTask {
    pub fn candidate_email(&self, tables: &Tables) -> String {
        tables
            .get::<CompanySelection>(self.selection_id)
            .map(|selection| selection.candidate_email(tables))
            .unwrap_or_default()
    }
}

impl Record for TestTask {
    const KIND: &'static str = "test task";

    fn id(&self) -> RecordId {
        self.id
    }

    fn table(tables: &Tables) -> &Table<Self> {
        &tables.test_tasks
    }

    fn table_mut(tables: &mut Tables) -> &mut Table<Self> {
        &mut tables.test_tasks
    }

    fn cascade(tables: &mut Tables, id: RecordId) {
        tables.delete_where::<TestTaskItem, _>(|item| item.test_task_id == id);
        tables.delete_where::<TestEvaluation, _>(|evaluation| evaluation.test_task_id == id);
    }
}

impl Resource for TestTask {
    const SEGMENT: &'static str = "test-tasks";

    type Input = TestTaskInput;
    type Filter = TestTaskFilter;
    type View = TestTask;

    fn write(
        tables: &Tables,
        id: RecordId,
        current: Option<&Self>,
        input: TestTaskInput,
        mode: WriteMode,
        now: DateTime<Utc>,
    ) -> Result<Self, ApiError> {
        let mut errors = FieldErrors::new();
        let selection_id = reference::<CompanySelection>(
            tables,
            &mut errors,
            "selection_id",
            input.selection_id,
            current.map(|task| &task.selection_id),
            mode,
        );
        let (start_time, end_time) = resolve_schedule(
            &mut errors,
            input.start_time,
            input.end_time,
            current.map(|task| (task.start_time, task.end_time)),
            mode,
            now,
        );
        let result = match input.result {
            Some(raw) => choice(&mut errors, "result", Some(raw)),
            None => current.and_then(|task| task.result),
        };
        check_url(
            &mut errors,
            "recording_url",
            input.recording_url.as_ref().and_then(Option::as_deref),
        );
        errors.into_result()?;

        Ok(TestTask {
            id,
            selection_id,
            start_time,
            end_time,
            duration: duration_minutes(start_time, end_time),
            result,
            recording_url: optional(input.recording_url, current.map(|task| &task.recording_url)),
        })
    }

    fn view(&self, _tables: &Tables) -> TestTask {
        self.clone()
    }

    fn check_filter(filter: &TestTaskFilter) -> Result<(), ApiError> {
        choice_filter::<Verdict>("result", filter.result.as_deref()).map(|_| ())
    }

    fn matches(&self, _tables: &Tables, filter: &TestTaskFilter) -> bool {
        if filter
            .selection
            .is_some_and(|selection| selection != self.selection_id)
        {
            return false;
        }
        match filter.result.as_deref().and_then(Verdict::parse) {
            Some(result) => self.result == Some(result),
            None => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestTaskItem {
    pub id: RecordId,
    pub test_task_id: RecordId,
    pub task_item_id: RecordId,
    pub candidate_answer: String,
    pub interviewer_comment: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TestTaskItemInput {
    pub test_task_id: Option<RecordId>,
    pub task_item_id: Option<RecordId>,
    pub candidate_answer: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub interviewer_comment: Nullable<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TestTaskItemFilter {
    pub test_task: Option<RecordId>,
    pub task_item: Option<RecordId>,
}

impl Record for TestTaskItem {
    const KIND: &'static str = "test task item";

    fn id(&self) -> RecordId {
        self.id
    }

    fn table(tables: &Tables) -> &Table<Self> {
        &tables.test_task_items
    }

    fn table_mut(tables: &mut Tables) -> &mut Table<Self> {
        &mut tables.test_task_items
    }
}

impl Resource for TestTaskItem {
    const SEGMENT: &'static str = "test-task-items";

    type Input = TestTaskItemInput;
    type Filter = TestTaskItemFilter;
    type View = TestTaskItem;

    fn write(
        tables: &Tables,
        id: RecordId,
        current: Option<&Self>,
        input: TestTaskItemInput,
        mode: WriteMode,
        _now: DateTime<Utc>,
    ) -> Result<Self, ApiError> {
        let mut errors = FieldErrors::new();
        let test_task_id = reference::<TestTask>(
            tables,
            &mut errors,
            "test_task_id",
            input.test_task_id,
            current.map(|item| &item.test_task_id),
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
        let interviewer_comment = optional_text(
            &mut errors,
            "interviewer_comment",
            input.interviewer_comment,
            current.map(|item| &item.interviewer_comment),
            usize::MAX,
        );
        errors.into_result()?;

        Ok(TestTaskItem {
            id,
            test_task_id,
            task_item_id,
            candidate_answer,
            interviewer_comment,
        })
    }

    fn view(&self, _tables: &Tables) -> TestTaskItem {
        self.clone()
    }

    fn matches(&self, _tables: &Tables, filter: &TestTaskItemFilter) -> bool {
        filter
            .test_task
            .map_or(true, |test_task| test_task == self.test_task_id)
            && filter
                .task_item
                .map_or(true, |task_item| task_item == self.task_item_id)
    }
}

/// Appends `comment` to the interviewer comment, one comment per line.
pub fn append_comment(
    tables: &mut Tables,
    id: RecordId,
    comment: Option<String>,
) -> Result<TestTaskItem, ApiError> {
    let mut item = fetch::<TestTaskItem>(tables, id)?.clone();
    let comment = comment
        .map(|comment| comment.trim().to_string())
        .filter(|comment| !comment.is_empty())
        .ok_or_else(|| ApiError::field("comment", "Comment may not be blank."))?;

    item.interviewer_comment = Some(match item.interviewer_comment.take() {
        Some(existing) if !existing.is_empty() => format!("{existing}\n{comment}"),
        _ => comment,
    });
    tables.insert(item.clone());
    info!(test_task_item_id = id, "interviewer comment appended");
    Ok(item)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CommentInput {
    pub comment: Option<String>,
}

pub(crate) fn routes() -> Router<HubState> {
    resource_routes::<TestTask>()
        .merge(resource_routes::<TestTaskItem>())
        .route("/test-task-items/:id/comment", post(comment_handler))
}

async fn comment_handler(
    State(state): State<HubState>,
    id: Result<Path<RecordId>, PathRejection>,
    payload: Result<Json<CommentInput>, JsonRejection>,
) -> Result<Json<TestTaskItem>, ApiError> {
    let Path(id) = id?;
    let Json(payload) = payload?;
    let mut tables = state.store.write()?;
    Ok(Json(append_comment(&mut tables, id, payload.comment)?))
}
