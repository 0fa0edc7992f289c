use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::http::validation::{
    contains_ci, nullable, optional_text, required_text, FieldErrors, Nullable, WriteMode,
};
use crate::http::{ApiError, Resource};
use crate::store::{Record, RecordId, Table, Tables};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    pub id: RecordId,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SkillInput {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Nullable<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SkillFilter {
    pub name: Option<String>,
    pub search: Option<String>,
}

impl Record for Skill {
    const KIND: &'static str = "skill";

    fn id(&self) -> RecordId {
        self.id
    }

    fn table(tables: &Tables) -> &Table<Self> {
        &tables.skills
    }

    fn table_mut(tables: &mut Tables) -> &mut Table<Self> {
        &mut tables.skills
    }

    fn cascade(tables: &mut Tables, id: RecordId) {
        for resume in tables.resumes.rows_mut() {
            resume.skills.retain(|entry| entry.skill_id != id);
        }
    }
}

impl Resource for Skill {
    const SEGMENT: &'static str = "skill";

    type Input = SkillInput;
    type Filter = SkillFilter;
    type View = Skill;

    fn write(
        _tables: &Tables,
        id: RecordId,
        current: Option<&Self>,
        input: SkillInput,
        mode: WriteMode,
        _now: DateTime<Utc>,
    ) -> Result<Self, ApiError> {
        let mut errors = FieldErrors::new();
        let name = required_text(
            &mut errors,
            "name",
            input.name,
            current.map(|skill| &skill.name),
            mode,
            100,
        );
        if !errors.contains("name") && name.trim().chars().count() < 2 {
            errors.add("name", "Skill name must be at least 2 characters long.");
        }
        let description = optional_text(
            &mut errors,
            "description",
            input.description,
            current.map(|skill| &skill.description),
            usize::MAX,
        );
        errors.into_result()?;

        Ok(Skill {
            id,
            name,
            description,
        })
    }

    fn view(&self, _tables: &Tables) -> Skill {
        self.clone()
    }

    fn matches(&self, _tables: &Tables, filter: &SkillFilter) -> bool {
        if let Some(name) = &filter.name {
            if !contains_ci(&self.name, name) {
                return false;
            }
        }
        filter.search.as_deref().map_or(true, |term| {
            contains_ci(&self.name, term)
                || self
                    .description
                    .as_deref()
                    .is_some_and(|description| contains_ci(description, term))
        })
    }
}
