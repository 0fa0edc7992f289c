//! Generic list/create/retrieve/update/destroy routes for store-backed records.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::info;

use super::pagination::{Page, PageParams};
use super::state::HubState;
use super::validation::WriteMode;
use super::ApiError;
use crate::store::{Record, RecordId, Tables};

/// A record exposed as a REST collection under `/api/v1/<SEGMENT>`.
pub trait Resource: Record + Serialize {
    const SEGMENT: &'static str;

    /// Write payload; every field optional so absence becomes a field error.
    type Input: DeserializeOwned + Default + Send + 'static;
    /// List query parameters.
    type Filter: DeserializeOwned + Default + Send + 'static;
    /// Response body for a single record.
    type View: Serialize + Send + 'static;

    /// Builds the record to store from `input`, validating it against `tables`.
    fn write(
        tables: &Tables,
        id: RecordId,
        current: Option<&Self>,
        input: Self::Input,
        mode: WriteMode,
        now: DateTime<Utc>,
    ) -> Result<Self, ApiError>;

    fn view(&self, tables: &Tables) -> Self::View;

    fn check_filter(_filter: &Self::Filter) -> Result<(), ApiError> {
        Ok(())
    }

    fn matches(&self, _tables: &Tables, _filter: &Self::Filter) -> bool {
        true
    }
}

pub fn resource_routes<R: Resource>() -> Router<HubState> {
    Router::new()
        .route(
            &format!("/{}", R::SEGMENT),
            get(list_handler::<R>).post(create_handler::<R>),
        )
        .route(
            &format!("/{}/:id", R::SEGMENT),
            get(retrieve_handler::<R>)
                .put(replace_handler::<R>)
                .patch(partial_update_handler::<R>)
                .delete(destroy_handler::<R>),
        )
}

/// Validates and inserts a new record.
pub fn create_record<R: Resource>(
    tables: &mut Tables,
    input: R::Input,
    now: DateTime<Utc>,
) -> Result<R, ApiError> {
    let id = R::table(tables).next_id();
    let record = R::write(tables, id, None, input, WriteMode::Create, now)?;
    tables.insert(record.clone());
    info!(kind = R::KIND, id, "record created");
    Ok(record)
}

/// Validates `input` against the stored record and replaces it.
pub fn update_record<R: Resource>(
    tables: &mut Tables,
    id: RecordId,
    input: R::Input,
    mode: WriteMode,
    now: DateTime<Utc>,
) -> Result<R, ApiError> {
    let current = fetch::<R>(tables, id)?.clone();
    let record = R::write(tables, id, Some(&current), input, mode, now)?;
    tables.insert(record.clone());
    info!(kind = R::KIND, id, "record updated");
    Ok(record)
}

/// Filtered rows in id order, rendered as views.
pub fn filtered_views<R: Resource>(tables: &Tables, filter: &R::Filter) -> Vec<R::View> {
    R::table(tables)
        .iter()
        .filter(|record| record.matches(tables, filter))
        .map(|record| record.view(tables))
        .collect()
}

pub fn fetch<R: Record>(tables: &Tables, id: RecordId) -> Result<&R, ApiError> {
    tables
        .get::<R>(id)
        .ok_or_else(|| ApiError::not_found(R::KIND, id))
}

pub(crate) async fn list_handler<R: Resource>(
    State(state): State<HubState>,
    paging: Result<Query<PageParams>, QueryRejection>,
    filter: Result<Query<R::Filter>, QueryRejection>,
) -> Result<Json<Page<R::View>>, ApiError> {
    let Query(paging) = paging?;
    let Query(filter) = filter?;
    R::check_filter(&filter)?;

    let views = {
        let tables = state.store.read()?;
        filtered_views::<R>(&tables, &filter)
    };
    Ok(Json(paging.paginate(views)?))
}

pub(crate) async fn create_handler<R: Resource>(
    State(state): State<HubState>,
    payload: Result<Json<R::Input>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(input) = payload?;
    let view = {
        let mut tables = state.store.write()?;
        let record = create_record::<R>(&mut tables, input, Utc::now())?;
        record.view(&tables)
    };
    Ok((StatusCode::CREATED, Json(view)).into_response())
}

pub(crate) async fn retrieve_handler<R: Resource>(
    State(state): State<HubState>,
    id: Result<Path<RecordId>, PathRejection>,
) -> Result<Json<R::View>, ApiError> {
    let Path(id) = id?;
    let tables = state.store.read()?;
    let view = fetch::<R>(&tables, id)?.view(&tables);
    Ok(Json(view))
}

pub(crate) async fn replace_handler<R: Resource>(
    state: State<HubState>,
    id: Result<Path<RecordId>, PathRejection>,
    payload: Result<Json<R::Input>, JsonRejection>,
) -> Result<Json<R::View>, ApiError> {
    write_existing::<R>(state, id, payload, WriteMode::Replace)
}

pub(crate) async fn partial_update_handler<R: Resource>(
    state: State<HubState>,
    id: Result<Path<RecordId>, PathRejection>,
    payload: Result<Json<R::Input>, JsonRejection>,
) -> Result<Json<R::View>, ApiError> {
    write_existing::<R>(state, id, payload, WriteMode::Partial)
}

fn write_existing<R: Resource>(
    State(state): State<HubState>,
    id: Result<Path<RecordId>, PathRejection>,
    payload: Result<Json<R::Input>, JsonRejection>,
    mode: WriteMode,
) -> Result<Json<R::View>, ApiError> {
    let Path(id) = id?;
    let mut tables = state.store.write()?;
    fetch::<R>(&tables, id)?;
    let Json(input) = payload?;
    let record = update_record::<R>(&mut tables, id, input, mode, Utc::now())?;
    Ok(Json(record.view(&tables)))
}

pub(crate) async fn destroy_handler<R: Resource>(
    State(state): State<HubState>,
    id: Result<Path<RecordId>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(id) = id?;
    let mut tables = state.store.write()?;
    tables
        .delete::<R>(id)
        .ok_or_else(|| ApiError::not_found(R::KIND, id))?;
    info!(kind = R::KIND, id, "record deleted");
    Ok(StatusCode::NO_CONTENT)
}
