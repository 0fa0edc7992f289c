use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::interviewers::Interviewer;
use crate::http::validation::{
    contains_ci, nullable, optional_text, required_text, FieldErrors, Nullable, WriteMode,
};
use crate::http::{ApiError, Resource};
use crate::store::{Record, RecordId, Table, Tables};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub id: RecordId,
    pub name: String,
    pub description: Option<String>,
    pub location: String,
    pub established_date: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CompanyInput {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Nullable<String>,
    pub location: Option<String>,
    pub established_date: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CompanyFilter {
    pub search: Option<String>,
    pub location: Option<String>,
}

impl Record for Company {
    const KIND: &'static str = "company";

    fn id(&self) -> RecordId {
        self.id
    }

    fn table(tables: &Tables) -> &Table<Self> {
        &tables.companies
    }

    fn table_mut(tables: &mut Tables) -> &mut Table<Self> {
        &mut tables.companies
    }

    fn cascade(tables: &mut Tables, id: RecordId) {
        tables.delete_where::<Interviewer, _>(|interviewer| interviewer.company_id == id);
    }
}

impl Resource for Company {
    const SEGMENT: &'static str = "companies";

    type Input = CompanyInput;
    type Filter = CompanyFilter;
    type View = Company;

    fn write(
        _tables: &Tables,
        id: RecordId,
        current: Option<&Self>,
        input: CompanyInput,
        mode: WriteMode,
        now: DateTime<Utc>,
    ) -> Result<Self, ApiError> {
        let mut errors = FieldErrors::new();
        let name = required_text(
            &mut errors,
            "name",
            input.name,
            current.map(|company| &company.name),
            mode,
            255,
        );
        let location = required_text(
            &mut errors,
            "location",
            input.location,
            current.map(|company| &company.location),
            mode,
            255,
        );
        let description = optional_text(
            &mut errors,
            "description",
            input.description,
            current.map(|company| &company.description),
            usize::MAX,
        );
        errors.into_result()?;

        let established_date = match (input.established_date, current) {
            (Some(date), _) => Some(date),
            (None, Some(company)) => company.established_date,
            (None, None) => Some(now.date_naive()),
        };

        Ok(Company {
            id,
            name,
            description,
            location,
            established_date,
        })
    }

    fn view(&self, _tables: &Tables) -> Company {
        self.clone()
    }

    fn matches(&self, _tables: &Tables, filter: &CompanyFilter) -> bool {
        if let Some(location) = &filter.location {
            if !self.location.eq_ignore_ascii_case(location) {
                return false;
            }
        }
        match &filter.search {
            Some(term) => {
                contains_ci(&self.name, term)
                    || self
                        .description
                        .as_deref()
                        .is_some_and(|description| contains_ci(description, term))
            }
            None => true,
        }
    }
}
