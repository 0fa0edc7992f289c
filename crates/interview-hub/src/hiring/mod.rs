//! Hiring records and their REST resources: companies, people, resumes,
//! selections, interviews, test tasks and evaluations.

pub mod activity;
pub mod candidates;
pub mod choices;
pub mod companies;
pub mod evaluations;
pub mod interviewers;
pub mod interviews;
pub mod job_experience;
pub mod resumes;
pub mod selections;
pub mod skills;
pub mod tasks;
pub mod test_tasks;
pub mod users;

#[cfg(test)]
mod tests;

use axum::Router;

use crate::http::{resource_routes, HubState};

pub use choices::{Choice, Gender, InterviewStatus, SelectionStatus, Verdict};

/// Every hiring route, relative to `/api/v1`.
pub fn hiring_routes() -> Router<HubState> {
    Router::new()
        .merge(resource_routes::<companies::Company>())
        .merge(candidates::routes())
        .merge(resource_routes::<interviewers::Interviewer>())
        .merge(resource_routes::<skills::Skill>())
        .merge(resource_routes::<job_experience::JobExperience>())
        .merge(resumes::routes())
        .merge(selections::routes())
        .merge(interviews::routes())
        .merge(tasks::routes())
        .merge(test_tasks::routes())
        .merge(evaluations::routes())
        .merge(activity::routes())
}
