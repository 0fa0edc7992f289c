use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::companies::Company;
use super::selections::CompanySelection;
use super::users::{User, UserView};
use crate::http::validation::{contains_ci, reference, required_text, FieldErrors, WriteMode};
use crate::http::{ApiError, Resource};
use crate::store::{Record, RecordId, Table, Tables};

/// Employee of a company who runs selections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interviewer {
    pub id: RecordId,
    pub user_id: RecordId,
    pub company_id: RecordId,
    pub position: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct InterviewerInput {
    pub user_id: Option<RecordId>,
    pub company_id: Option<RecordId>,
    pub position: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct InterviewerFilter {
    pub company: Option<RecordId>,
    pub position: Option<String>,
    pub email: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InterviewerView {
    #[serde(flatten)]
    pub interviewer: Interviewer,
    pub user: Option<UserView>,
    pub company: Option<Company>,
}

impl Interviewer {
    pub fn email(&self, tables: &Tables) -> String {
        super::users::email_of(tables, self.user_id)
    }
}

impl Record for Interviewer {
    const KIND: &'static str = "interviewer";

    fn id(&self) -> RecordId {
        self.id
    }

    fn table(tables: &Tables) -> &Table<Self> {
        &tables.interviewers
    }

    fn table_mut(tables: &mut Tables) -> &mut Table<Self> {
        &mut tables.interviewers
    }

    fn cascade(tables: &mut Tables, id: RecordId) {
        tables.delete_where::<CompanySelection, _>(|selection| selection.interviewer_id == id);
    }
}

impl Resource for Interviewer {
    const SEGMENT: &'static str = "interviewers";

    type Input = InterviewerInput;
    type Filter = InterviewerFilter;
    type View = InterviewerView;

    fn write(
        tables: &Tables,
        id: RecordId,
        current: Option<&Self>,
        input: InterviewerInput,
        mode: WriteMode,
        _now: DateTime<Utc>,
    ) -> Result<Self, ApiError> {
        let mut errors = FieldErrors::new();
        let user_id = reference::<User>(
            tables,
            &mut errors,
            "user_id",
            input.user_id,
            current.map(|interviewer| &interviewer.user_id),
            mode,
        );
        let already_interviewer = tables
            .interviewers
            .iter()
            .any(|interviewer| interviewer.user_id == user_id && interviewer.id != id);
        if !errors.contains("user_id") && already_interviewer {
            errors.add("user_id", "This user is already an interviewer.");
        }

        let company_id = reference::<Company>(
            tables,
            &mut errors,
            "company_id",
            input.company_id,
            current.map(|interviewer| &interviewer.company_id),
            mode,
        );
        let position = required_text(
            &mut errors,
            "position",
            input.position,
            current.map(|interviewer| &interviewer.position),
            mode,
            255,
        );
        errors.into_result()?;

        Ok(Interviewer {
            id,
            user_id,
            company_id,
            position,
        })
    }

    fn view(&self, tables: &Tables) -> InterviewerView {
        InterviewerView {
            interviewer: self.clone(),
            user: tables.get::<User>(self.user_id).map(User::view),
            company: tables.get::<Company>(self.company_id).cloned(),
        }
    }

    fn matches(&self, tables: &Tables, filter: &InterviewerFilter) -> bool {
        if filter.company.is_some_and(|company| company != self.company_id) {
            return false;
        }
        if let Some(position) = &filter.position {
            if !contains_ci(&self.position, position) {
                return false;
            }
        }

        let user = tables.get::<User>(self.user_id);
        let email = user.map(|user| user.email.as_str()).unwrap_or_default();
        if let Some(wanted) = &filter.email {
            if !email.eq_ignore_ascii_case(wanted) {
                return false;
            }
        }
        match &filter.search {
            Some(term) => {
                let first_name = user.map(|user| user.first_name.as_str()).unwrap_or_default();
                contains_ci(first_name, term)
                    || contains_ci(email, term)
                    || contains_ci(&self.position, term)
            }
            None => true,
        }
    }
}
