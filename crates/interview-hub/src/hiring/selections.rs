//! Company selections: the application pipeline joining a resume to an interviewer.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::routing::{get, patch};
use axum::{Json, Router};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::choices::{Choice, SelectionStatus};
use super::interviewers::Interviewer;
use super::interviews::Interview;
use super::resumes::Resume;
use super::test_tasks::TestTask;
use crate::http::resource::fetch;
use crate::http::validation::{
    choice, choice_filter, contains_ci, reference, required_choice, FieldErrors, WriteMode,
};
use crate::http::{resource_routes, ApiError, HubState, Page, PageParams, Resource};
use crate::store::{Record, RecordId, Table, Tables};

/// Selections whose resume is older than this are left out of the practical filter.
pub const PRACTICAL_RESUME_MAX_AGE_DAYS: i64 = 7;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanySelection {
    pub id: RecordId,
    pub interviewer_id: RecordId,
    pub resume_id: RecordId,
    pub status: SelectionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SelectionInput {
    pub interviewer_id: Option<RecordId>,
    pub resume_id: Option<RecordId>,
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SelectionFilter {
    pub status: Option<String>,
    pub interviewer: Option<RecordId>,
    pub resume: Option<RecordId>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionView {
    #[serde(flatten)]
    pub selection: CompanySelection,
    pub interviewer_email: String,
    pub candidate_email: String,
}

impl CompanySelection {
    pub fn candidate_email(&self, tables: &Tables) -> String {
        tables
            .get::<Resume>(self.resume_id)
            .map(|resume| resume.candidate_email(tables))
            .unwrap_or_default()
    }

    pub fn interviewer_email(&self, tables: &Tables) -> String {
        tables
            .get::<Interviewer>(self.interviewer_id)
            .map(|interviewer| interviewer.email(tables))
            .unwrap_or_default()
    }
}

impl Record for CompanySelection {
    const KIND: &'static str = "company selection";

    fn id(&self) -> RecordId {
        self.id
    }

    fn table(tables: &Tables) -> &Table<Self> {
        &tables.selections
    }

    fn table_mut(tables: &mut Tables) -> &mut Table<Self> {
        &mut tables.selections
    }

    fn cascade(tables: &mut Tables, id: RecordId) {
        tables.delete_where::<Interview, _>(|interview| interview.selection_id == id);
        tables.delete_where::<TestTask, _>(|task| task.selection_id == id);
    }
}

impl Resource for CompanySelection {
    const SEGMENT: &'static str = "company-selections";

    type Input = SelectionInput;
    type Filter = SelectionFilter;
    type View = SelectionView;

    fn write(
        tables: &Tables,
        id: RecordId,
        current: Option<&Self>,
        input: SelectionInput,
        mode: WriteMode,
        now: DateTime<Utc>,
    ) -> Result<Self, ApiError> {
        let mut errors = FieldErrors::new();
        let interviewer_id = reference::<Interviewer>(
            tables,
            &mut errors,
            "interviewer_id",
            input.interviewer_id,
            current.map(|selection| &selection.interviewer_id),
            mode,
        );
        let resume_id = reference::<Resume>(
            tables,
            &mut errors,
            "resume_id",
            input.resume_id,
            current.map(|selection| &selection.resume_id),
            mode,
        );
        let status = match input.status {
            Some(raw) => choice(&mut errors, "status", Some(raw)),
            None => Some(current.map_or(SelectionStatus::default(), |selection| selection.status)),
        };
        errors.into_result()?;

        Ok(CompanySelection {
            id,
            interviewer_id,
            resume_id,
            status: status.unwrap_or_default(),
            created_at: current.map_or(now, |selection| selection.created_at),
            updated_at: now,
        })
    }

    fn view(&self, tables: &Tables) -> SelectionView {
        SelectionView {
            selection: self.clone(),
            interviewer_email: self.interviewer_email(tables),
            candidate_email: self.candidate_email(tables),
        }
    }

    fn check_filter(filter: &SelectionFilter) -> Result<(), ApiError> {
        choice_filter::<SelectionStatus>("status", filter.status.as_deref()).map(|_| ())
    }

    fn matches(&self, tables: &Tables, filter: &SelectionFilter) -> bool {
        if let Some(status) = filter.status.as_deref().and_then(SelectionStatus::parse) {
            if status != self.status {
                return false;
            }
        }
        if filter
            .interviewer
            .is_some_and(|interviewer| interviewer != self.interviewer_id)
        {
            return false;
        }
        if filter.resume.is_some_and(|resume| resume != self.resume_id) {
            return false;
        }
        match &filter.search {
            Some(term) => {
                contains_ci(&self.candidate_email(tables), term)
                    || contains_ci(&self.interviewer_email(tables), term)
            }
            None => true,
        }
    }
}

/// Changes only the status; any status may replace any other.
pub fn update_status(
    tables: &mut Tables,
    id: RecordId,
    raw_status: Option<String>,
    now: DateTime<Utc>,
) -> Result<CompanySelection, ApiError> {
    let mut selection = fetch::<CompanySelection>(tables, id)?.clone();
    let mut errors = FieldErrors::new();
    let status = required_choice::<SelectionStatus>(
        &mut errors,
        "status",
        raw_status,
        None,
        WriteMode::Create,
    );
    errors.into_result()?;

    if let Some(status) = status {
        info!(
            selection_id = id,
            from = selection.status.code(),
            to = status.code(),
            "selection status changed"
        );
        selection.status = status;
    }
    selection.updated_at = now;
    tables.insert(selection.clone());
    Ok(selection)
}

/// Selections in one of `statuses` (all when empty) whose resume is at most a week old.
pub fn practical_filter<'a>(
    tables: &'a Tables,
    statuses: &[SelectionStatus],
    now: DateTime<Utc>,
) -> Vec<&'a CompanySelection> {
    let cutoff = now - Duration::days(PRACTICAL_RESUME_MAX_AGE_DAYS);
    tables
        .selections
        .iter()
        .filter(|selection| statuses.is_empty() || statuses.contains(&selection.status))
        .filter(|selection| {
            tables
                .get::<Resume>(selection.resume_id)
                .is_some_and(|resume| resume.created_at >= cutoff)
        })
        .filter(|selection| tables.exists::<Interviewer>(selection.interviewer_id))
        .collect()
}

/// Parses a comma separated status list such as `on_review,accepted`.
pub fn parse_status_list(raw: Option<&str>) -> Result<Vec<SelectionStatus>, ApiError> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };

    let mut statuses = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|part| !part.is_empty()) {
        let status = SelectionStatus::parse(part).ok_or_else(|| {
            ApiError::field(
                "status",
                format!(
                    "\"{part}\" is not a valid choice. Expected one of: {}.",
                    SelectionStatus::expected()
                ),
            )
        })?;
        if !statuses.contains(&status) {
            statuses.push(status);
        }
    }
    Ok(statuses)
}

pub(crate) fn routes() -> Router<HubState> {
    resource_routes::<CompanySelection>()
        .route(
            "/company-selections/:id/update-status",
            patch(update_status_handler),
        )
        .route(
            "/company-selections/practical-filter",
            get(practical_filter_handler),
        )
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct StatusInput {
    pub status: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusView {
    pub id: RecordId,
    pub status: SelectionStatus,
}

async fn update_status_handler(
    State(state): State<HubState>,
    id: Result<Path<RecordId>, PathRejection>,
    payload: Result<Json<StatusInput>, JsonRejection>,
) -> Result<Json<StatusView>, ApiError> {
    let Path(id) = id?;
    let Json(payload) = payload?;
    let mut tables = state.store.write()?;
    let selection = update_status(&mut tables, id, payload.status, Utc::now())?;
    Ok(Json(StatusView {
        id: selection.id,
        status: selection.status,
    }))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PracticalQuery {
    pub status: Option<String>,
}

async fn practical_filter_handler(
    State(state): State<HubState>,
    paging: Result<Query<PageParams>, QueryRejection>,
    query: Result<Query<PracticalQuery>, QueryRejection>,
) -> Result<Json<Page<SelectionView>>, ApiError> {
    let Query(paging) = paging?;
    let Query(query) = query?;
    let statuses = parse_status_list(query.status.as_deref())?;

    let results = {
        let tables = state.store.read()?;
        practical_filter(&tables, &statuses, Utc::now())
            .into_iter()
            .map(|selection| selection.view(&tables))
            .collect::<Vec<_>>()
    };
    Ok(Json(paging.paginate(results)?))
}
