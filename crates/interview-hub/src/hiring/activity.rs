//! Request activity log: a middleware buffers one entry per request and a
//! scheduled flush moves the buffer into the `UserActivity` table.

use std::sync::{Arc, Mutex};

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::http::{ApiError, HubState, Page, PageParams};
use crate::store::{Record, RecordId, RepositoryError, Store, Table, Tables};

pub const ANONYMOUS: &str = "anonymous";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserActivity {
    pub id: RecordId,
    pub user: String,
    pub path: String,
    pub method: String,
    pub timestamp: DateTime<Utc>,
}

impl Record for UserActivity {
    const KIND: &'static str = "user activity";

    fn id(&self) -> RecordId {
        self.id
    }

    fn table(tables: &Tables) -> &Table<Self> {
        &tables.activity
    }

    fn table_mut(tables: &mut Tables) -> &mut Table<Self> {
        &mut tables.activity
    }
}

/// Activity observed by the middleware but not yet stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingActivity {
    pub user: String,
    pub path: String,
    pub method: String,
    pub timestamp: DateTime<Utc>,
}

/// Shared in-memory buffer of pending activity.
#[derive(Debug, Clone, Default)]
pub struct ActivityLog {
    pending: Arc<Mutex<Vec<PendingActivity>>>,
}

impl ActivityLog {
    pub fn push(&self, entry: PendingActivity) {
        match self.pending.lock() {
            Ok(mut pending) => pending.push(entry),
            Err(_) => warn!("activity buffer lock poisoned, entry dropped"),
        }
    }

    pub fn pending(&self) -> usize {
        self.pending.lock().map(|pending| pending.len()).unwrap_or(0)
    }

    /// Moves every buffered entry into the store and returns how many were written.
    pub fn flush_into(&self, store: &Store) -> Result<usize, RepositoryError> {
        let drained = {
            let mut pending = self
                .pending
                .lock()
                .map_err(|_| RepositoryError::Unavailable("activity buffer poisoned".to_string()))?;
            std::mem::take(&mut *pending)
        };
        if drained.is_empty() {
            return Ok(0);
        }

        let mut tables = store.write()?;
        let count = drained.len();
        for entry in drained {
            let id = tables.activity.next_id();
            tables.insert(UserActivity {
                id,
                user: entry.user,
                path: entry.path,
                method: entry.method,
                timestamp: entry.timestamp,
            });
        }
        info!(count, "activity buffer flushed");
        Ok(count)
    }
}

/// Records who called which path; the user comes from a valid bearer token.
pub async fn record_activity(
    State(state): State<HubState>,
    request: Request,
    next: Next,
) -> Response {
    let user = state
        .tokens
        .authenticate(request.headers())
        .map(|claims| claims.username)
        .unwrap_or_else(|_| ANONYMOUS.to_string());
    let entry = PendingActivity {
        user,
        path: request.uri().path().to_string(),
        method: request.method().to_string(),
        timestamp: Utc::now(),
    };
    info!(
        user = %entry.user,
        method = %entry.method,
        path = %entry.path,
        "user activity"
    );
    state.activity.push(entry);

    next.run(request).await
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ActivityFilter {
    pub user: Option<String>,
    pub method: Option<String>,
}

pub(crate) fn routes() -> Router<HubState> {
    Router::new().route("/activity", get(list_activity_handler))
}

async fn list_activity_handler(
    State(state): State<HubState>,
    paging: Result<Query<PageParams>, QueryRejection>,
    filter: Result<Query<ActivityFilter>, QueryRejection>,
) -> Result<Json<Page<UserActivity>>, ApiError> {
    let Query(paging) = paging?;
    let Query(filter) = filter?;

    let entries = {
        let tables = state.store.read()?;
        tables
            .activity
            .iter()
            .filter(|entry| filter.user.as_deref().map_or(true, |user| entry.user == user))
            .filter(|entry| {
                filter
                    .method
                    .as_deref()
                    .map_or(true, |method| entry.method.eq_ignore_ascii_case(method))
            })
            .cloned()
            .collect::<Vec<_>>()
    };
    Ok(Json(paging.paginate(entries)?))
}
