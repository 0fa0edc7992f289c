use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::job_experience::JobExperience;
use super::resumes::Resume;
use super::users::{User, UserView};
use crate::http::validation::{
    check_length, check_url, contains_ci, nullable, optional, reference, FieldErrors, Nullable,
    WriteMode,
};
use crate::http::{resource_routes, ApiError, HubState, Resource};
use crate::store::{Record, RecordId, Table, Tables};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: RecordId,
    pub user_id: RecordId,
    pub birth_date: Option<NaiveDate>,
    pub city: Option<String>,
    pub social_media: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CandidateInput {
    pub user_id: Option<RecordId>,
    #[serde(default, deserialize_with = "nullable")]
    pub birth_date: Nullable<NaiveDate>,
    #[serde(default, deserialize_with = "nullable")]
    pub city: Nullable<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub social_media: Nullable<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CandidateFilter {
    pub email: Option<String>,
    pub city: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CandidateView {
    #[serde(flatten)]
    pub candidate: Candidate,
    pub user: Option<UserView>,
}

impl Candidate {
    pub fn email(&self, tables: &Tables) -> String {
        super::users::email_of(tables, self.user_id)
    }
}

impl Record for Candidate {
    const KIND: &'static str = "candidate";

    fn id(&self) -> RecordId {
        self.id
    }

    fn table(tables: &Tables) -> &Table<Self> {
        &tables.candidates
    }

    fn table_mut(tables: &mut Tables) -> &mut Table<Self> {
        &mut tables.candidates
    }

    fn cascade(tables: &mut Tables, id: RecordId) {
        tables.delete_where::<Resume, _>(|resume| resume.candidate_id == id);
        tables.delete_where::<JobExperience, _>(|experience| experience.candidate_id == id);
    }
}

impl Resource for Candidate {
    const SEGMENT: &'static str = "candidates";

    type Input = CandidateInput;
    type Filter = CandidateFilter;
    type View = CandidateView;

    fn write(
        tables: &Tables,
        id: RecordId,
        current: Option<&Self>,
        input: CandidateInput,
        mode: WriteMode,
        now: DateTime<Utc>,
    ) -> Result<Self, ApiError> {
        let mut errors = FieldErrors::new();
        let user_id = reference::<User>(
            tables,
            &mut errors,
            "user_id",
            input.user_id,
            current.map(|candidate| &candidate.user_id),
            mode,
        );
        let already_candidate = tables
            .candidates
            .iter()
            .any(|candidate| candidate.user_id == user_id && candidate.id != id);
        if !errors.contains("user_id") && already_candidate {
            errors.add("user_id", "This user is already linked to a candidate.");
        }

        if let Some(Some(birth_date)) = input.birth_date {
            if birth_date > now.date_naive() {
                errors.add("birth_date", "Birth date cannot be in the future.");
            }
        }
        if let Some(Some(city)) = &input.city {
            check_length(&mut errors, "city", city, 100);
        }
        check_url(
            &mut errors,
            "social_media",
            input.social_media.as_ref().and_then(Option::as_deref),
        );
        errors.into_result()?;

        Ok(Candidate {
            id,
            user_id,
            birth_date: optional(input.birth_date, current.map(|c| &c.birth_date)),
            city: optional(input.city, current.map(|c| &c.city)),
            social_media: optional(input.social_media, current.map(|c| &c.social_media)),
        })
    }

    fn view(&self, tables: &Tables) -> CandidateView {
        CandidateView {
            candidate: self.clone(),
            user: tables.get::<User>(self.user_id).map(User::view),
        }
    }

    fn matches(&self, tables: &Tables, filter: &CandidateFilter) -> bool {
        let email = self.email(tables);
        let city = self.city.as_deref().unwrap_or_default();

        if let Some(wanted) = &filter.email {
            if !email.eq_ignore_ascii_case(wanted) {
                return false;
            }
        }
        if let Some(wanted) = &filter.city {
            if city != wanted {
                return false;
            }
        }
        match &filter.search {
            Some(term) => contains_ci(&email, term) || contains_ci(city, term),
            None => true,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CityQuery {
    pub city: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CityCount {
    pub city: String,
    pub candidate_count: usize,
}

pub fn count_by_city(tables: &Tables, city: &str) -> usize {
    tables
        .candidates
        .iter()
        .filter(|candidate| candidate.city.as_deref() == Some(city))
        .count()
}

pub(crate) fn routes() -> Router<HubState> {
    resource_routes::<Candidate>().route(
        "/candidates/count-by-city",
        get(count_by_city_handler),
    )
}

async fn count_by_city_handler(
    State(state): State<HubState>,
    query: Result<Query<CityQuery>, QueryRejection>,
) -> Result<Json<CityCount>, ApiError> {
    let Query(query) = query?;
    let city = query
        .city
        .filter(|city| !city.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("The city query parameter is required.".to_string()))?;

    let tables = state.store.read()?;
    let candidate_count = count_by_city(&tables, &city);
    Ok(Json(CityCount {
        city,
        candidate_count,
    }))
}
