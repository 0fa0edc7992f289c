//! Final scored verdicts. Each interview and each test task has at most one.

use axum::Router;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::choices::{Choice, Verdict};
use super::interviews::Interview;
use super::test_tasks::TestTask;
use crate::http::validation::{
    check_rating, choice_filter, reference, required, required_choice, required_text, FieldErrors,
    WriteMode,
};
use crate::http::{resource_routes, ApiError, HubState, Resource};
use crate::store::{Record, RecordId, Table, Tables};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterviewEvaluation {
    pub id: RecordId,
    pub interview_id: RecordId,
    pub hard_skills_rate: i32,
    pub soft_skills_rate: i32,
    pub final_feedback: String,
    pub overall_result: Verdict,
    pub evaluation_date: NaiveDate,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct InterviewEvaluationInput {
    pub interview_id: Option<RecordId>,
    pub hard_skills_rate: Option<i32>,
    pub soft_skills_rate: Option<i32>,
    pub final_feedback: Option<String>,
    pub overall_result: Option<String>,
    pub evaluation_date: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct InterviewEvaluationFilter {
    pub interview: Option<RecordId>,
    pub overall_result: Option<String>,
}

impl Record for InterviewEvaluation {
    const KIND: &'static str = "interview evaluation";

    fn id(&self) -> RecordId {
        self.id
    }

    fn table(tables: &Tables) -> &Table<Self> {
        &tables.interview_evaluations
    }

    fn table_mut(tables: &mut Tables) -> &mut Table<Self> {
        &mut tables.interview_evaluations
    }
}

impl Resource for InterviewEvaluation {
    const SEGMENT: &'static str = "interview-evaluations";

    type Input = InterviewEvaluationInput;
    type Filter = InterviewEvaluationFilter;
    type View = InterviewEvaluation;

    fn write(
        tables: &Tables,
        id: RecordId,
        current: Option<&Self>,
        input: InterviewEvaluationInput,
        mode: WriteMode,
        now: DateTime<Utc>,
    ) -> Result<Self, ApiError> {
        let mut errors = FieldErrors::new();
        let interview_id = reference::<Interview>(
            tables,
            &mut errors,
            "interview_id",
            input.interview_id,
            current.map(|evaluation| &evaluation.interview_id),
            mode,
        );
        let already_evaluated = tables
            .interview_evaluations
            .iter()
            .any(|evaluation| evaluation.interview_id == interview_id && evaluation.id != id);
        if !errors.contains("interview_id") && already_evaluated {
            errors.add("interview_id", "This interview already has an evaluation.");
        }

        check_rating(&mut errors, "hard_skills_rate", input.hard_skills_rate);
        check_rating(&mut errors, "soft_skills_rate", input.soft_skills_rate);
        let hard_skills_rate = required(
            &mut errors,
            "hard_skills_rate",
            input.hard_skills_rate,
            current.map(|evaluation| &evaluation.hard_skills_rate),
            mode,
        );
        let soft_skills_rate = required(
            &mut errors,
            "soft_skills_rate",
            input.soft_skills_rate,
            current.map(|evaluation| &evaluation.soft_skills_rate),
            mode,
        );
        let final_feedback = required_text(
            &mut errors,
            "final_feedback",
            input.final_feedback,
            current.map(|evaluation| &evaluation.final_feedback),
            mode,
            usize::MAX,
        );
        let overall_result = required_choice(
            &mut errors,
            "overall_result",
            input.overall_result,
            current.map(|evaluation| evaluation.overall_result),
            mode,
        );
        errors.into_result()?;

        Ok(InterviewEvaluation {
            id,
            interview_id,
            hard_skills_rate,
            soft_skills_rate,
            final_feedback,
            overall_result: overall_result.unwrap_or(Verdict::Rejected),
            evaluation_date: input
                .evaluation_date
                .or_else(|| current.map(|evaluation| evaluation.evaluation_date))
                .unwrap_or_else(|| now.date_naive()),
        })
    }

    fn view(&self, _tables: &Tables) -> InterviewEvaluation {
        self.clone()
    }

    fn check_filter(filter: &InterviewEvaluationFilter) -> Result<(), ApiError> {
        choice_filter::<Verdict>("overall_result", filter.overall_result.as_deref()).map(|_| ())
    }

    fn matches(&self, _tables: &Tables, filter: &InterviewEvaluationFilter) -> bool {
        filter
            .interview
            .map_or(true, |interview| interview == self.interview_id)
            && filter
                .overall_result
                .as_deref()
                .and_then(Verdict::parse)
                .map_or(true, |result| result == self.overall_result)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestEvaluation {
    pub id: RecordId,
    pub test_task_id: RecordId,
    pub result: Verdict,
    pub feedback: String,
    pub evaluation_date: NaiveDate,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TestEvaluationInput {
    pub test_task_id: Option<RecordId>,
    pub result: Option<String>,
    pub feedback: Option<String>,
    pub evaluation_date: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TestEvaluationFilter {
    pub test_task: Option<RecordId>,
    pub result: Option<String>,
}

impl Record for TestEvaluation {
    const KIND: &'static str = "test evaluation";

    fn id(&self) -> RecordId {
        self.id
    }

    fn table(tables: &Tables) -> &Table<Self> {
        &tables.test_evaluations
    }

    fn table_mut(tables: &mut Tables) -> &mut Table<Self> {
        &mut tables.test_evaluations
    }
}

impl Resource for TestEvaluation {
    const SEGMENT: &'static str = "test-evaluations";

    type Input = TestEvaluationInput;
    type Filter = TestEvaluationFilter;
    type View = TestEvaluation;

    fn write(
        tables: &Tables,
        id: RecordId,
        current: Option<&Self>,
        input: TestEvaluationInput,
        mode: WriteMode,
        now: DateTime<Utc>,
    ) -> Result<Self, ApiError> {
        let mut errors = FieldErrors::new();
        let test_task_id = reference::<TestTask>(
            tables,
            &mut errors,
            "test_task_id",
            input.test_task_id,
            current.map(|evaluation| &evaluation.test_task_id),
            mode,
        );
        let already_evaluated = tables
            .test_evaluations
            .iter()
            .any(|evaluation| evaluation.test_task_id == test_task_id && evaluation.id != id);
        if !errors.contains("test_task_id") && already_evaluated {
            errors.add("test_task_id", "This test task already has an evaluation.");
        }

        let result = required_choice(
            &mut errors,
            "result",
            input.result,
            current.map(|evaluation| evaluation.result),
            mode,
        );
        let feedback = required_text(
            &mut errors,
            "feedback",
            input.feedback,
            current.map(|evaluation| &evaluation.feedback),
            mode,
            usize::MAX,
        );
        errors.into_result()?;

        Ok(TestEvaluation {
            id,
            test_task_id,
            result: result.unwrap_or(Verdict::Rejected),
            feedback,
            evaluation_date: input
                .evaluation_date
                .or_else(|| current.map(|evaluation| evaluation.evaluation_date))
                .unwrap_or_else(|| now.date_naive()),
        })
    }

    fn view(&self, _tables: &Tables) -> TestEvaluation {
        self.clone()
    }

    fn check_filter(filter: &TestEvaluationFilter) -> Result<(), ApiError> {
        choice_filter::<Verdict>("result", filter.result.as_deref()).map(|_| ())
    }

    fn matches(&self, _tables: &Tables, filter: &TestEvaluationFilter) -> bool {
        filter
            .test_task
            .map_or(true, |test_task| test_task == self.test_task_id)
            && filter
                .result
                .as_deref()
                .and_then(Verdict::parse)
                .map_or(true, |result| result == self.result)
    }
}

pub(crate) fn routes() -> Router<HubState> {
    resource_routes::<InterviewEvaluation>().merge(resource_routes::<TestEvaluation>())
}
