use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::candidates::Candidate;
use crate::http::validation::{
    contains_ci, nullable, optional, reference, required, required_text, FieldErrors, Nullable,
    WriteMode,
};
use crate::http::{ApiError, Resource};
use crate::store::{Record, RecordId, Table, Tables};

/// A past position listed by a candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobExperience {
    pub id: RecordId,
    pub candidate_id: RecordId,
    pub company: String,
    pub position: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub responsibilities: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct JobExperienceInput {
    pub candidate_id: Option<RecordId>,
    pub company: Option<String>,
    pub position: Option<String>,
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "nullable")]
    pub end_date: Nullable<NaiveDate>,
    pub responsibilities: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct JobExperienceFilter {
    pub candidate: Option<RecordId>,
    pub search: Option<String>,
    pub start_date_after: Option<NaiveDate>,
    pub start_date_before: Option<NaiveDate>,
    pub end_date_after: Option<NaiveDate>,
    pub end_date_before: Option<NaiveDate>,
}

impl JobExperienceFilter {
    /// Inclusive bounds on both dates; a bound on the end date excludes open positions.
    fn within_dates(&self, experience: &JobExperience) -> bool {
        let start = experience.start_date;
        if self.start_date_after.is_some_and(|after| start < after)
            || self.start_date_before.is_some_and(|before| start > before)
        {
            return false;
        }
        match experience.end_date {
            Some(end) => {
                !(self.end_date_after.is_some_and(|after| end < after)
                    || self.end_date_before.is_some_and(|before| end > before))
            }
            None => self.end_date_after.is_none() && self.end_date_before.is_none(),
        }
    }
}

impl Record for JobExperience {
    const KIND: &'static str = "job experience";

    fn id(&self) -> RecordId {
        self.id
    }

    fn table(tables: &Tables) -> &Table<Self> {
        &tables.job_experiences
    }

    fn table_mut(tables: &mut Tables) -> &mut Table<Self> {
        &mut tables.job_experiences
    }

    fn cascade(tables: &mut Tables, id: RecordId) {
        for resume in tables.resumes.rows_mut() {
            resume.job_experience_ids.retain(|attached| *attached != id);
        }
    }
}

impl Resource for JobExperience {
    const SEGMENT: &'static str = "job_experience";

    type Input = JobExperienceInput;
    type Filter = JobExperienceFilter;
    type View = JobExperience;

    fn write(
        tables: &Tables,
        id: RecordId,
        current: Option<&Self>,
        input: JobExperienceInput,
        mode: WriteMode,
        _now: DateTime<Utc>,
    ) -> Result<Self, ApiError> {
        let mut errors = FieldErrors::new();
        let candidate_id = reference::<Candidate>(
            tables,
            &mut errors,
            "candidate_id",
            input.candidate_id,
            current.map(|experience| &experience.candidate_id),
            mode,
        );
        let company = required_text(
            &mut errors,
            "company",
            input.company,
            current.map(|experience| &experience.company),
            mode,
            255,
        );
        let position = required_text(
            &mut errors,
            "position",
            input.position,
            current.map(|experience| &experience.position),
            mode,
            255,
        );
        let responsibilities = required_text(
            &mut errors,
            "responsibilities",
            input.responsibilities,
            current.map(|experience| &experience.responsibilities),
            mode,
            usize::MAX,
        );
        let start_date = required(
            &mut errors,
            "start_date",
            input.start_date,
            current.map(|experience| &experience.start_date),
            mode,
        );
        let end_date = optional(input.end_date, current.map(|experience| &experience.end_date));
        if let Some(end_date) = end_date {
            if !errors.contains("start_date") && end_date < start_date {
                errors.add("end_date", "End date cannot be earlier than start date.");
            }
        }
        errors.into_result()?;

        Ok(JobExperience {
            id,
            candidate_id,
            company,
            position,
            start_date,
            end_date,
            responsibilities,
        })
    }

    fn view(&self, _tables: &Tables) -> JobExperience {
        self.clone()
    }

    fn matches(&self, _tables: &Tables, filter: &JobExperienceFilter) -> bool {
        if filter
            .candidate
            .is_some_and(|candidate| candidate != self.candidate_id)
        {
            return false;
        }
        if !filter.within_dates(self) {
            return false;
        }
        match &filter.search {
            Some(term) => {
                contains_ci(&self.company, term)
                    || contains_ci(&self.position, term)
                    || contains_ci(&self.responsibilities, term)
            }
            None => true,
        }
    }
}
