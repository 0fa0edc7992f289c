//! In-memory relational store shared by the HTTP handlers and the scheduled jobs.
//!
//! Every table lives behind one `RwLock`, so a request that touches several tables
//! (foreign-key checks, cascading deletes) observes and mutates a consistent state.

mod snapshot;
mod table;

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};

use crate::hiring::activity::UserActivity;
use crate::hiring::candidates::Candidate;
use crate::hiring::companies::Company;
use crate::hiring::evaluations::{InterviewEvaluation, TestEvaluation};
use crate::hiring::interviewers::Interviewer;
use crate::hiring::interviews::{Interview, InterviewTaskItem};
use crate::hiring::job_experience::JobExperience;
use crate::hiring::resumes::Resume;
use crate::hiring::selections::CompanySelection;
use crate::hiring::skills::Skill;
use crate::hiring::tasks::{CodeQuestion, MultipleChoiceQuestion, OpenQuestion, TaskItem};
use crate::hiring::test_tasks::{TestTask, TestTaskItem};
use crate::hiring::users::User;

pub use snapshot::SnapshotError;
pub use table::{Record, RecordId, Table};

/// Full set of tables. Serialised as-is for snapshots.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tables {
    pub users: Table<User>,
    pub companies: Table<Company>,
    pub candidates: Table<Candidate>,
    pub interviewers: Table<Interviewer>,
    pub skills: Table<Skill>,
    pub job_experiences: Table<JobExperience>,
    pub resumes: Table<Resume>,
    pub selections: Table<CompanySelection>,
    pub interviews: Table<Interview>,
    pub interview_tasks: Table<InterviewTaskItem>,
    pub task_items: Table<TaskItem>,
    pub open_questions: Table<OpenQuestion>,
    pub multiple_choice_questions: Table<MultipleChoiceQuestion>,
    pub code_questions: Table<CodeQuestion>,
    pub test_tasks: Table<TestTask>,
    pub test_task_items: Table<TestTaskItem>,
    pub interview_evaluations: Table<InterviewEvaluation>,
    pub test_evaluations: Table<TestEvaluation>,
    pub activity: Table<UserActivity>,
}

impl Tables {
    pub fn get<R: Record>(&self, id: RecordId) -> Option<&R> {
        R::table(self).get(id)
    }

    pub fn exists<R: Record>(&self, id: RecordId) -> bool {
        R::table(self).contains(id)
    }

    pub fn insert<R: Record>(&mut self, record: R) {
        R::table_mut(self).insert(record);
    }

    /// Deletes one row and everything that depends on it.
    pub fn delete<R: Record>(&mut self, id: RecordId) -> Option<R> {
        let removed = R::table_mut(self).remove(id)?;
        R::cascade(self, id);
        Some(removed)
    }

    /// Deletes every row matching `predicate` (with cascades) and returns the count.
    pub fn delete_where<R, F>(&mut self, predicate: F) -> usize
    where
        R: Record,
        F: Fn(&R) -> bool,
    {
        let ids = R::table(self).ids_where(predicate);
        for id in &ids {
            self.delete::<R>(*id);
        }
        ids.len()
    }
}

/// Error enumeration for store access failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Lock-guarded table set.
#[derive(Debug, Default)]
pub struct Store {
    tables: RwLock<Tables>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tables(tables: Tables) -> Self {
        Self {
            tables: RwLock::new(tables),
        }
    }

    pub fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, RepositoryError> {
        self.tables
            .read()
            .map_err(|_| RepositoryError::Unavailable("store lock poisoned".to_string()))
    }

    pub fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, RepositoryError> {
        self.tables
            .write()
            .map_err(|_| RepositoryError::Unavailable("store lock poisoned".to_string()))
    }

    /// Clones the current table set.
    pub fn snapshot(&self) -> Result<Tables, RepositoryError> {
        Ok(self.read()?.clone())
    }
}
