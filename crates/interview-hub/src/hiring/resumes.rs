//! Candidate resumes, their skill and job-experience links, and the
//! salary/date search actions recruiters use to shortlist them.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::candidates::Candidate;
use super::job_experience::JobExperience;
use super::selections::CompanySelection;
use super::skills::Skill;
use crate::http::resource::fetch;
use crate::http::validation::{
    missing_reference, nullable, optional, optional_text, reference, required, required_text,
    FieldErrors, Nullable, WriteMode,
};
use crate::http::{resource_routes, ApiError, HubState, Page, PageParams, Resource};
use crate::store::{Record, RecordId, Table, Tables};

pub const DEFAULT_PROFICIENCY: &str = "unspecified";
/// Window used by `filter_by_date` when no explicit range is given.
pub const RECENT_DAYS: i64 = 7;
pub const TOP_SALARIES: usize = 5;
pub const DEFAULT_SALARY_MARKUP_PERCENT: i64 = 20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumeSkill {
    pub skill_id: RecordId,
    pub proficiency_level: String,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resume {
    pub id: RecordId,
    pub candidate_id: RecordId,
    pub desired_position: String,
    pub desired_salary: i64,
    pub current_salary: Option<i64>,
    pub skills: Vec<ResumeSkill>,
    pub job_experience_ids: Vec<RecordId>,
    pub additional_info: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ResumeInput {
    pub candidate_id: Option<RecordId>,
    pub desired_position: Option<String>,
    pub desired_salary: Option<i64>,
    #[serde(default, deserialize_with = "nullable")]
    pub current_salary: Nullable<i64>,
    pub skill_ids: Option<Vec<RecordId>>,
    pub job_experience_ids: Option<Vec<RecordId>>,
    #[serde(default, deserialize_with = "nullable")]
    pub additional_info: Nullable<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ResumeFilter {
    pub candidate: Option<RecordId>,
    pub desired_position: Option<String>,
    pub desired_salary: Option<i64>,
    pub min_salary: Option<i64>,
    pub max_salary: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeSkillView {
    pub skill_id: RecordId,
    pub name: String,
    pub proficiency_level: String,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeView {
    pub id: RecordId,
    pub candidate_id: RecordId,
    pub candidate_email: String,
    pub desired_position: String,
    pub desired_salary: i64,
    pub current_salary: Option<i64>,
    pub skills: Vec<ResumeSkillView>,
    pub job_experience_ids: Vec<RecordId>,
    pub additional_info: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Resume {
    pub fn has_skill(&self, skill_id: RecordId) -> bool {
        self.skills.iter().any(|entry| entry.skill_id == skill_id)
    }

    pub fn candidate_email(&self, tables: &Tables) -> String {
        tables
            .get::<Candidate>(self.candidate_id)
            .map(|candidate| candidate.email(tables))
            .unwrap_or_default()
    }
}

impl Record for Resume {
    const KIND: &'static str = "resume";

    fn id(&self) -> RecordId {
        self.id
    }

    fn table(tables: &Tables) -> &Table<Self> {
        &tables.resumes
    }

    fn table_mut(tables: &mut Tables) -> &mut Table<Self> {
        &mut tables.resumes
    }

    fn cascade(tables: &mut Tables, id: RecordId) {
        tables.delete_where::<CompanySelection, _>(|selection| selection.resume_id == id);
    }
}

impl Resource for Resume {
    const SEGMENT: &'static str = "resumes";

    type Input = ResumeInput;
    type Filter = ResumeFilter;
    type View = ResumeView;

    fn write(
        tables: &Tables,
        id: RecordId,
        current: Option<&Self>,
        input: ResumeInput,
        mode: WriteMode,
        now: DateTime<Utc>,
    ) -> Result<Self, ApiError> {
        let mut errors = FieldErrors::new();
        let candidate_id = reference::<Candidate>(
            tables,
            &mut errors,
            "candidate_id",
            input.candidate_id,
            current.map(|resume| &resume.candidate_id),
            mode,
        );
        let desired_position = required_text(
            &mut errors,
            "desired_position",
            input.desired_position,
            current.map(|resume| &resume.desired_position),
            mode,
            255,
        );

        let salary_supplied = input.desired_salary.is_some();
        let desired_salary = required(
            &mut errors,
            "desired_salary",
            input.desired_salary,
            current.map(|resume| &resume.desired_salary),
            mode,
        );
        if salary_supplied && desired_salary <= 0 {
            errors.add("desired_salary", "Desired salary must be positive.");
        }
        if matches!(input.current_salary, Some(Some(salary)) if salary < 0) {
            errors.add("current_salary", "Current salary cannot be negative.");
        }
        let additional_info = optional_text(
            &mut errors,
            "additional_info",
            input.additional_info,
            current.map(|resume| &resume.additional_info),
            usize::MAX,
        );

        let skills = resolve_skills(tables, &mut errors, input.skill_ids, current, mode, now);
        let job_experience_ids =
            resolve_job_experiences(tables, &mut errors, input.job_experience_ids, current);
        errors.into_result()?;

        Ok(Resume {
            id,
            candidate_id,
            desired_position,
            desired_salary,
            current_salary: optional(
                input.current_salary,
                current.map(|resume| &resume.current_salary),
            ),
            skills,
            job_experience_ids,
            additional_info,
            created_at: current.map_or(now, |resume| resume.created_at),
        })
    }

    fn view(&self, tables: &Tables) -> ResumeView {
        let skills = self
            .skills
            .iter()
            .map(|entry| ResumeSkillView {
                skill_id: entry.skill_id,
                name: tables
                    .get::<Skill>(entry.skill_id)
                    .map(|skill| skill.name.clone())
                    .unwrap_or_default(),
                proficiency_level: entry.proficiency_level.clone(),
                added_at: entry.added_at,
            })
            .collect();

        ResumeView {
            id: self.id,
            candidate_id: self.candidate_id,
            candidate_email: self.candidate_email(tables),
            desired_position: self.desired_position.clone(),
            desired_salary: self.desired_salary,
            current_salary: self.current_salary,
            skills,
            job_experience_ids: self.job_experience_ids.clone(),
            additional_info: self.additional_info.clone(),
            created_at: self.created_at,
        }
    }

    fn matches(&self, _tables: &Tables, filter: &ResumeFilter) -> bool {
        if filter
            .candidate
            .is_some_and(|candidate| candidate != self.candidate_id)
        {
            return false;
        }
        let salary = self.desired_salary;
        if filter.desired_salary.is_some_and(|exact| salary != exact)
            || filter.min_salary.is_some_and(|min| salary < min)
            || filter.max_salary.is_some_and(|max| salary > max)
        {
            return false;
        }
        filter.desired_position.as_deref().map_or(true, |position| {
            crate::http::validation::contains_ci(&self.desired_position, position)
        })
    }
}

/// Skill links after a write; existing links keep their proficiency and timestamp.
fn resolve_skills(
    tables: &Tables,
    errors: &mut FieldErrors,
    skill_ids: Option<Vec<RecordId>>,
    current: Option<&Resume>,
    mode: WriteMode,
    now: DateTime<Utc>,
) -> Vec<ResumeSkill> {
    let existing = current.map(|resume| resume.skills.as_slice()).unwrap_or_default();
    let Some(skill_ids) = skill_ids else {
        if mode != WriteMode::Partial {
            errors.add("skill_ids", "At least one skill is required.");
        }
        return existing.to_vec();
    };

    if skill_ids.is_empty() {
        errors.add("skill_ids", "At least one skill is required.");
    }

    let mut skills = Vec::with_capacity(skill_ids.len());
    for skill_id in skill_ids {
        if !tables.exists::<Skill>(skill_id) {
            errors.add("skill_ids", missing_reference(skill_id));
            continue;
        }
        if skills.iter().any(|entry: &ResumeSkill| entry.skill_id == skill_id) {
            continue;
        }
        let entry = existing
            .iter()
            .find(|entry| entry.skill_id == skill_id)
            .cloned()
            .unwrap_or_else(|| ResumeSkill {
                skill_id,
                proficiency_level: DEFAULT_PROFICIENCY.to_string(),
                added_at: now,
            });
        skills.push(entry);
    }
    skills
}

fn resolve_job_experiences(
    tables: &Tables,
    errors: &mut FieldErrors,
    ids: Option<Vec<RecordId>>,
    current: Option<&Resume>,
) -> Vec<RecordId> {
    let Some(ids) = ids else {
        return current
            .map(|resume| resume.job_experience_ids.clone())
            .unwrap_or_default();
    };

    let mut resolved: Vec<RecordId> = Vec::with_capacity(ids.len());
    for id in ids {
        if !tables.exists::<JobExperience>(id) {
            errors.add("job_experience_ids", missing_reference(id));
        } else if !resolved.contains(&id) {
            resolved.push(id);
        }
    }
    resolved
}

/// Resumes created inside `[start, end]` (inclusive dates), or within the last
/// week when no range is given.
pub fn created_between(
    tables: &Tables,
    range: Option<(NaiveDate, NaiveDate)>,
    now: DateTime<Utc>,
) -> Vec<&Resume> {
    tables
        .resumes
        .iter()
        .filter(|resume| match range {
            Some((start, end)) => {
                let created = resume.created_at.date_naive();
                created >= start && created <= end
            }
            None => resume.created_at >= now - Duration::days(RECENT_DAYS),
        })
        .collect()
}

/// Criteria of the combined salary/recency/experience search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SalaryExperienceCriteria {
    pub max_desired_salary: Option<i64>,
    pub posted_within_days: Option<i64>,
    pub min_job_experiences: Option<usize>,
}

impl SalaryExperienceCriteria {
    /// Earliest creation time allowed by `posted_within_days`.
    pub fn posted_since(&self, now: DateTime<Utc>) -> Result<Option<DateTime<Utc>>, ApiError> {
        let Some(days) = self.posted_within_days else {
            return Ok(None);
        };
        (days >= 0)
            .then(|| Duration::try_days(days))
            .flatten()
            .and_then(|window| now.checked_sub_signed(window))
            .map(Some)
            .ok_or_else(|| ApiError::BadRequest("Invalid number of days since posting.".to_string()))
    }
}

/// `(salary <= X AND posted within N days) OR job experience count >= M`.
///
/// Absent salary/recency bounds drop out of the first clause; when both are absent
/// and a minimum experience count is given, only the count applies.
pub fn salary_and_experience<'a>(
    tables: &'a Tables,
    criteria: SalaryExperienceCriteria,
    now: DateTime<Utc>,
) -> Result<Vec<&'a Resume>, ApiError> {
    let has_base = criteria.max_desired_salary.is_some() || criteria.posted_within_days.is_some();
    let posted_since = criteria.posted_since(now)?;

    let resumes = tables
        .resumes
        .iter()
        .filter(|resume| {
            let salary_ok = criteria
                .max_desired_salary
                .map_or(true, |max| resume.desired_salary <= max);
            let recent_ok = posted_since.map_or(true, |since| resume.created_at >= since);
            let base = salary_ok && recent_ok;

            match criteria.min_job_experiences {
                Some(min) => {
                    let experienced = resume.job_experience_ids.len() >= min;
                    if has_base {
                        base || experienced
                    } else {
                        experienced
                    }
                }
                None => base,
            }
        })
        .collect();
    Ok(resumes)
}

/// Highest desired salaries first, ties in id order.
pub fn top_salaries(tables: &Tables, limit: usize) -> Vec<&Resume> {
    let mut resumes: Vec<&Resume> = tables.resumes.iter().collect();
    resumes.sort_by(|left, right| right.desired_salary.cmp(&left.desired_salary));
    resumes.truncate(limit);
    resumes
}

/// Resumes whose desired salary exceeds the current one by more than `percentage`.
/// Resumes without a current salary never match.
///
/// The threshold is computed in `i128`, where the product of two `i64` values
/// cannot overflow, so stored salaries need no upper bound.
pub fn salary_expectation_above(tables: &Tables, percentage: i64) -> Vec<&Resume> {
    tables
        .resumes
        .iter()
        .filter(|resume| {
            resume.current_salary.is_some_and(|current| {
                let current = i128::from(current);
                let threshold = current + current * i128::from(percentage) / 100;
                i128::from(resume.desired_salary) > threshold
            })
        })
        .collect()
}

pub(crate) fn routes() -> Router<HubState> {
    resource_routes::<Resume>()
        .route("/resumes/filter_by_date", get(filter_by_date_handler))
        .route(
            "/resumes/filter_by_salary_and_experience",
            get(salary_and_experience_handler),
        )
        .route("/resumes/top_highest_salaries", get(top_salaries_handler))
        .route(
            "/resumes/filter_by_salary_expectation",
            get(salary_expectation_handler),
        )
        .route("/resumes/:id/add_skill", post(add_skill_handler))
        .route("/resumes/:id/remove_skill", post(remove_skill_handler))
        .route(
            "/resumes/:id/add_job_experience",
            post(add_job_experience_handler),
        )
        .route(
            "/resumes/:id/remove_job_experience",
            post(remove_job_experience_handler),
        )
}

fn views(tables: &Tables, resumes: Vec<&Resume>) -> Vec<ResumeView> {
    resumes
        .into_iter()
        .map(|resume| resume.view(tables))
        .collect()
}

fn parse_integer<T: std::str::FromStr>(
    raw: Option<&str>,
    message: &str,
) -> Result<Option<T>, ApiError> {
    match raw.map(str::trim).filter(|value| !value.is_empty()) {
        Some(value) => value
            .parse::<T>()
            .map(Some)
            .map_err(|_| ApiError::BadRequest(message.to_string())),
        None => Ok(None),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DateRangeQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

async fn filter_by_date_handler(
    State(state): State<HubState>,
    paging: Result<Query<PageParams>, QueryRejection>,
    query: Result<Query<DateRangeQuery>, QueryRejection>,
) -> Result<Json<Page<ResumeView>>, ApiError> {
    let Query(paging) = paging?;
    let Query(query) = query?;
    let range = match (query.start_date.as_deref(), query.end_date.as_deref()) {
        (Some(start), Some(end)) => {
            let parse = |raw: &str| {
                NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
                    ApiError::BadRequest("Invalid date format. Use YYYY-MM-DD.".to_string())
                })
            };
            Some((parse(start)?, parse(end)?))
        }
        _ => None,
    };

    let results = {
        let tables = state.store.read()?;
        let resumes = created_between(&tables, range, Utc::now());
        views(&tables, resumes)
    };
    Ok(Json(paging.paginate(results)?))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SalaryExperienceQuery {
    pub desired_salary: Option<String>,
    pub days_since_posted: Option<String>,
    pub min_job_experience_companies: Option<String>,
}

async fn salary_and_experience_handler(
    State(state): State<HubState>,
    paging: Result<Query<PageParams>, QueryRejection>,
    query: Result<Query<SalaryExperienceQuery>, QueryRejection>,
) -> Result<Json<Page<ResumeView>>, ApiError> {
    let Query(paging) = paging?;
    let Query(query) = query?;
    let criteria = SalaryExperienceCriteria {
        max_desired_salary: parse_integer(
            query.desired_salary.as_deref(),
            "Invalid desired salary. Use an integer.",
        )?,
        posted_within_days: parse_integer(
            query.days_since_posted.as_deref(),
            "Invalid number of days since posting.",
        )?,
        min_job_experiences: parse_integer(
            query.min_job_experience_companies.as_deref(),
            "Invalid number of companies.",
        )?,
    };

    let results = {
        let tables = state.store.read()?;
        let resumes = salary_and_experience(&tables, criteria, Utc::now())?;
        views(&tables, resumes)
    };
    Ok(Json(paging.paginate(results)?))
}

async fn top_salaries_handler(
    State(state): State<HubState>,
) -> Result<Json<Vec<ResumeView>>, ApiError> {
    let tables = state.store.read()?;
    let resumes = top_salaries(&tables, TOP_SALARIES);
    Ok(Json(views(&tables, resumes)))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SalaryExpectationQuery {
    pub percentage: Option<String>,
}

async fn salary_expectation_handler(
    State(state): State<HubState>,
    paging: Result<Query<PageParams>, QueryRejection>,
    query: Result<Query<SalaryExpectationQuery>, QueryRejection>,
) -> Result<Json<Page<ResumeView>>, ApiError> {
    let Query(paging) = paging?;
    let Query(query) = query?;
    let percentage = parse_integer(
        query.percentage.as_deref(),
        "Invalid percentage. Use an integer.",
    )?
    .unwrap_or(DEFAULT_SALARY_MARKUP_PERCENT);

    let results = {
        let tables = state.store.read()?;
        let resumes = salary_expectation_above(&tables, percentage);
        views(&tables, resumes)
    };
    Ok(Json(paging.paginate(results)?))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SkillLinkInput {
    pub skill_id: Option<RecordId>,
    pub proficiency_level: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct JobExperienceLinkInput {
    pub job_experience_id: Option<RecordId>,
}

/// Attaches a skill; attaching an already linked skill only updates its level.
pub fn attach_skill(
    tables: &mut Tables,
    resume_id: RecordId,
    skill_id: RecordId,
    proficiency_level: Option<String>,
    now: DateTime<Utc>,
) -> Result<Resume, ApiError> {
    fetch::<Resume>(tables, resume_id)?;
    if !tables.exists::<Skill>(skill_id) {
        return Err(ApiError::BadRequest("Skill not found.".to_string()));
    }

    let mut resume = fetch::<Resume>(tables, resume_id)?.clone();
    match resume
        .skills
        .iter_mut()
        .find(|entry| entry.skill_id == skill_id)
    {
        Some(entry) => {
            if let Some(level) = proficiency_level {
                entry.proficiency_level = level;
            }
        }
        None => resume.skills.push(ResumeSkill {
            skill_id,
            proficiency_level: proficiency_level
                .unwrap_or_else(|| DEFAULT_PROFICIENCY.to_string()),
            added_at: now,
        }),
    }
    tables.insert(resume.clone());
    info!(resume_id, skill_id, "skill attached to resume");
    Ok(resume)
}

pub fn detach_skill(
    tables: &mut Tables,
    resume_id: RecordId,
    skill_id: RecordId,
) -> Result<Resume, ApiError> {
    let mut resume = fetch::<Resume>(tables, resume_id)?.clone();
    if !tables.exists::<Skill>(skill_id) {
        return Err(ApiError::BadRequest("Skill not found.".to_string()));
    }
    if !resume.has_skill(skill_id) {
        return Err(ApiError::BadRequest(
            "Skill is not attached to this resume.".to_string(),
        ));
    }
    resume.skills.retain(|entry| entry.skill_id != skill_id);
    tables.insert(resume.clone());
    info!(resume_id, skill_id, "skill detached from resume");
    Ok(resume)
}

pub fn attach_job_experience(
    tables: &mut Tables,
    resume_id: RecordId,
    experience_id: RecordId,
) -> Result<Resume, ApiError> {
    let mut resume = fetch::<Resume>(tables, resume_id)?.clone();
    if !tables.exists::<JobExperience>(experience_id) {
        return Err(ApiError::BadRequest("Job experience not found.".to_string()));
    }
    if !resume.job_experience_ids.contains(&experience_id) {
        resume.job_experience_ids.push(experience_id);
        tables.insert(resume.clone());
        info!(resume_id, experience_id, "job experience attached to resume");
    }
    Ok(resume)
}

pub fn detach_job_experience(
    tables: &mut Tables,
    resume_id: RecordId,
    experience_id: RecordId,
) -> Result<Resume, ApiError> {
    let mut resume = fetch::<Resume>(tables, resume_id)?.clone();
    if !tables.exists::<JobExperience>(experience_id) {
        return Err(ApiError::BadRequest("Job experience not found.".to_string()));
    }
    if !resume.job_experience_ids.contains(&experience_id) {
        return Err(ApiError::BadRequest(
            "Job experience is not attached to this resume.".to_string(),
        ));
    }
    resume.job_experience_ids.retain(|id| *id != experience_id);
    tables.insert(resume.clone());
    info!(resume_id, experience_id, "job experience detached from resume");
    Ok(resume)
}

fn required_id(value: Option<RecordId>, field: &str) -> Result<RecordId, ApiError> {
    value.ok_or_else(|| ApiError::field(field, crate::http::validation::REQUIRED))
}

async fn add_skill_handler(
    State(state): State<HubState>,
    id: Result<Path<RecordId>, PathRejection>,
    payload: Result<Json<SkillLinkInput>, JsonRejection>,
) -> Result<Json<ResumeView>, ApiError> {
    let Path(id) = id?;
    let Json(payload) = payload?;
    let skill_id = required_id(payload.skill_id, "skill_id")?;

    let mut tables = state.store.write()?;
    let resume = attach_skill(&mut tables, id, skill_id, payload.proficiency_level, Utc::now())?;
    Ok(Json(resume.view(&tables)))
}

async fn remove_skill_handler(
    State(state): State<HubState>,
    id: Result<Path<RecordId>, PathRejection>,
    payload: Result<Json<SkillLinkInput>, JsonRejection>,
) -> Result<Json<ResumeView>, ApiError> {
    let Path(id) = id?;
    let Json(payload) = payload?;
    let skill_id = required_id(payload.skill_id, "skill_id")?;

    let mut tables = state.store.write()?;
    let resume = detach_skill(&mut tables, id, skill_id)?;
    Ok(Json(resume.view(&tables)))
}

async fn add_job_experience_handler(
    State(state): State<HubState>,
    id: Result<Path<RecordId>, PathRejection>,
    payload: Result<Json<JobExperienceLinkInput>, JsonRejection>,
) -> Result<Json<ResumeView>, ApiError> {
    let Path(id) = id?;
    let Json(payload) = payload?;
    let experience_id = required_id(payload.job_experience_id, "job_experience_id")?;

    let mut tables = state.store.write()?;
    let resume = attach_job_experience(&mut tables, id, experience_id)?;
    Ok(Json(resume.view(&tables)))
}

async fn remove_job_experience_handler(
    State(state): State<HubState>,
    id: Result<Path<RecordId>, PathRejection>,
    payload: Result<Json<JobExperienceLinkInput>, JsonRejection>,
) -> Result<Json<ResumeView>, ApiError> {
    let Path(id) = id?;
    let Json(payload) = payload?;
    let experience_id = required_id(payload.job_experience_id, "job_experience_id")?;

    let mut tables = state.store.write()?;
    let resume = detach_job_experience(&mut tables, id, experience_id)?;
    Ok(Json(resume.view(&tables)))
}
