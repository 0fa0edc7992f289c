use std::sync::Arc;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde_json::Value;

use crate::auth::password::hash_password_with;
use crate::auth::{TokenIssuer, TokenKind};
use crate::hiring::activity::ActivityLog;
use crate::hiring::candidates::Candidate;
use crate::hiring::choices::{InterviewStatus, SelectionStatus};
use crate::hiring::companies::Company;
use crate::hiring::interviewers::Interviewer;
use crate::hiring::interviews::Interview;
use crate::hiring::job_experience::JobExperience;
use crate::hiring::resumes::{Resume, ResumeSkill};
use crate::hiring::selections::CompanySelection;
use crate::hiring::skills::Skill;
use crate::hiring::tasks::TaskItem;
use crate::hiring::test_tasks::TestTask;
use crate::hiring::users::User;
use crate::http::{hub_router, HubState};
use crate::store::{RecordId, Store, Tables};

pub(super) const PASSWORD: &str = "tidal-Orbit-42";

/// Ids of the rows created by [`pipeline`].
#[derive(Debug, Clone, Copy)]
pub(super) struct Pipeline {
    pub(super) recruiter: RecordId,
    pub(super) candidate_user: RecordId,
    pub(super) company: RecordId,
    pub(super) interviewer: RecordId,
    pub(super) candidate: RecordId,
    pub(super) skill: RecordId,
    pub(super) experience: RecordId,
    pub(super) resume: RecordId,
    pub(super) selection: RecordId,
}

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn user(tables: &mut Tables, username: &str, first_name: &str) -> RecordId {
    let id = tables.users.next_id();
    tables.insert(User {
        id,
        username: username.to_string(),
        email: format!("{username}@example.com"),
        first_name: first_name.to_string(),
        last_name: String::new(),
        phone: None,
        gender: None,
        password_hash: hash_password_with(PASSWORD, 1_000),
        date_joined: Utc::now(),
    });
    id
}

pub(super) fn company(tables: &mut Tables, name: &str, location: &str) -> RecordId {
    let id = tables.companies.next_id();
    tables.insert(Company {
        id,
        name: name.to_string(),
        description: None,
        location: location.to_string(),
        established_date: Some(date(2010, 1, 1)),
    });
    id
}

pub(super) fn candidate(tables: &mut Tables, user_id: RecordId, city: &str) -> RecordId {
    let id = tables.candidates.next_id();
    tables.insert(Candidate {
        id,
        user_id,
        birth_date: Some(date(1994, 5, 17)),
        city: Some(city.to_string()),
        social_media: None,
    });
    id
}

pub(super) fn skill(tables: &mut Tables, name: &str) -> RecordId {
    let id = tables.skills.next_id();
    tables.insert(Skill {
        id,
        name: name.to_string(),
        description: None,
    });
    id
}

pub(super) fn resume(
    tables: &mut Tables,
    candidate_id: RecordId,
    desired_salary: i64,
    current_salary: Option<i64>,
    created_at: DateTime<Utc>,
) -> RecordId {
    let id = tables.resumes.next_id();
    tables.insert(Resume {
        id,
        candidate_id,
        desired_position: "Backend engineer".to_string(),
        desired_salary,
        current_salary,
        skills: Vec::new(),
        job_experience_ids: Vec::new(),
        additional_info: None,
        created_at,
    });
    id
}

pub(super) fn selection(
    tables: &mut Tables,
    interviewer_id: RecordId,
    resume_id: RecordId,
    status: SelectionStatus,
    created_at: DateTime<Utc>,
) -> RecordId {
    let id = tables.selections.next_id();
    tables.insert(CompanySelection {
        id,
        interviewer_id,
        resume_id,
        status,
        created_at,
        updated_at: created_at,
    });
    id
}

pub(super) fn interview(
    tables: &mut Tables,
    selection_id: RecordId,
    start_time: DateTime<Utc>,
) -> RecordId {
    let id = tables.interviews.next_id();
    tables.insert(Interview {
        id,
        selection_id,
        start_time,
        end_time: start_time + Duration::minutes(90),
        duration: 90,
        kind: "technical".to_string(),
        status: InterviewStatus::Scheduled,
        feedback: None,
        notes: None,
        hard_skills_rate: None,
        soft_skills_rate: None,
        result: None,
        recording_url: None,
    });
    id
}

pub(super) fn test_task(tables: &mut Tables, selection_id: RecordId) -> RecordId {
    let id = tables.test_tasks.next_id();
    let start_time = Utc::now() + Duration::days(1);
    tables.insert(TestTask {
        id,
        selection_id,
        start_time,
        end_time: start_time + Duration::hours(3),
        duration: 180,
        result: None,
        recording_url: None,
    });
    id
}

pub(super) fn task_item(tables: &mut Tables, title: &str) -> RecordId {
    let id = tables.task_items.next_id();
    tables.insert(TaskItem {
        id,
        title: title.to_string(),
        complexity: 4,
        task_condition: "Reverse a linked list.".to_string(),
    });
    id
}

/// Recruiter account, a candidate with one resume and one on-review selection.
pub(super) fn pipeline(tables: &mut Tables) -> Pipeline {
    let recruiter = user(tables, "recruiter", "Rita");
    let candidate_user = user(tables, "ann", "Ann");
    let company = company(tables, "Northwind", "Berlin");

    let interviewer = tables.interviewers.next_id();
    tables.insert(Interviewer {
        id: interviewer,
        user_id: recruiter,
        company_id: company,
        position: "Engineering manager".to_string(),
    });

    let candidate = candidate(tables, candidate_user, "Berlin");
    let skill = skill(tables, "Rust");

    let experience = tables.job_experiences.next_id();
    tables.insert(JobExperience {
        id: experience,
        candidate_id: candidate,
        company: "Contoso".to_string(),
        position: "Developer".to_string(),
        start_date: date(2019, 3, 1),
        end_date: Some(date(2023, 6, 30)),
        responsibilities: "Payments backend".to_string(),
    });

    let resume = resume(tables, candidate, 5000, Some(4000), Utc::now());
    if let Some(row) = tables.resumes.rows_mut().find(|row| row.id == resume) {
        row.skills.push(ResumeSkill {
            skill_id: skill,
            proficiency_level: "advanced".to_string(),
            added_at: Utc::now(),
        });
        row.job_experience_ids.push(experience);
    }
    let selection = selection(
        tables,
        interviewer,
        resume,
        SelectionStatus::OnReview,
        Utc::now(),
    );

    Pipeline {
        recruiter,
        candidate_user,
        company,
        interviewer,
        candidate,
        skill,
        experience,
        resume,
        selection,
    }
}

pub(super) fn issuer() -> Arc<TokenIssuer> {
    Arc::new(TokenIssuer::new(
        "hub-test-secret",
        Duration::minutes(60),
        Duration::hours(24),
    ))
}

pub(super) fn hub_state(tables: Tables) -> HubState {
    HubState::new(
        Arc::new(Store::from_tables(tables)),
        issuer(),
        ActivityLog::default(),
    )
}

/// Router over `tables` plus an access token for `user_id`.
pub(super) fn router_for(tables: Tables, user_id: RecordId) -> (Router, HubState, String) {
    let user = tables.get::<User>(user_id).cloned().expect("user exists");
    let state = hub_state(tables);
    let token = state
        .tokens
        .issue(&user, TokenKind::Access, Utc::now())
        .expect("token");
    (hub_router(state.clone()), state, token)
}

pub(super) fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).expect("json body")))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) async fn read_text_body(response: Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    String::from_utf8(body.to_vec()).expect("utf-8 body")
}
