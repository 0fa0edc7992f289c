//! Reusable task items and their question variants.

use axum::Router;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::interviews::InterviewTaskItem;
use super::test_tasks::TestTaskItem;
use crate::http::validation::{
    contains_ci, reference, required, required_text, FieldErrors, WriteMode,
};
use crate::http::{resource_routes, ApiError, HubState, Resource};
use crate::store::{Record, RecordId, Table, Tables};

pub const MIN_COMPLEXITY: i32 = 1;
pub const MAX_COMPLEXITY: i32 = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskItem {
    pub id: RecordId,
    pub title: String,
    pub complexity: i32,
    pub task_condition: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenQuestion {
    pub id: RecordId,
    pub task_item_id: RecordId,
    pub correct_answer: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultipleChoiceQuestion {
    pub id: RecordId,
    pub task_item_id: RecordId,
    pub answer_text: String,
    pub is_correct_answer: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeQuestion {
    pub id: RecordId,
    pub task_item_id: RecordId,
    pub language: String,
    pub is_code_run: bool,
    pub code_snippet: String,
}

/// Short description of a task embedded in answer views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSummary {
    pub task_id: RecordId,
    pub title: String,
    pub complexity: i32,
    pub task_condition: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeAnswer {
    pub language: String,
    pub code_snippet: String,
}

/// Reference answers of a task across all its variants.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorrectAnswers {
    pub open_question: Option<String>,
    pub multiple_choice: Vec<String>,
    pub code_question: Option<CodeAnswer>,
}

/// Task item with its question variants nested.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskItemView {
    #[serde(flatten)]
    pub task: TaskItem,
    pub open_questions: Vec<OpenQuestion>,
    pub multiple_choice_questions: Vec<MultipleChoiceQuestion>,
    pub code_questions: Vec<CodeQuestion>,
}

pub fn task_summary(tables: &Tables, task_item_id: RecordId) -> Option<TaskSummary> {
    tables.get::<TaskItem>(task_item_id).map(|task| TaskSummary {
        task_id: task.id,
        title: task.title.clone(),
        complexity: task.complexity,
        task_condition: task.task_condition.clone(),
    })
}

/// First open answer, every correct choice, and the first code snippet.
pub fn correct_answers(tables: &Tables, task_item_id: RecordId) -> CorrectAnswers {
    CorrectAnswers {
        open_question: tables
            .open_questions
            .iter()
            .find(|question| question.task_item_id == task_item_id)
            .map(|question| question.correct_answer.clone()),
        multiple_choice: tables
            .multiple_choice_questions
            .iter()
            .filter(|question| question.task_item_id == task_item_id && question.is_correct_answer)
            .map(|question| question.answer_text.clone())
            .collect(),
        code_question: tables
            .code_questions
            .iter()
            .find(|question| question.task_item_id == task_item_id)
            .map(|question| CodeAnswer {
                language: question.language.clone(),
                code_snippet: question.code_snippet.clone(),
            }),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TaskItemInput {
    pub title: Option<String>,
    pub complexity: Option<i32>,
    pub task_condition: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TaskItemFilter {
    pub complexity: Option<i32>,
    pub search: Option<String>,
}

impl Record for TaskItem {
    const KIND: &'static str = "task item";

    fn id(&self) -> RecordId {
        self.id
    }

    fn table(tables: &Tables) -> &Table<Self> {
        &tables.task_items
    }

    fn table_mut(tables: &mut Tables) -> &mut Table<Self> {
        &mut tables.task_items
    }

    fn cascade(tables: &mut Tables, id: RecordId) {
        tables.delete_where::<OpenQuestion, _>(|question| question.task_item_id == id);
        tables.delete_where::<MultipleChoiceQuestion, _>(|question| question.task_item_id == id);
        tables.delete_where::<CodeQuestion, _>(|question| question.task_item_id == id);
        tables.delete_where::<InterviewTaskItem, _>(|item| item.task_item_id == id);
        tables.delete_where::<TestTaskItem, _>(|item| item.task_item_id == id);
    }
}

impl Resource for TaskItem {
    const SEGMENT: &'static str = "task-items";

    type Input = TaskItemInput;
    type Filter = TaskItemFilter;
    type View = TaskItemView;

    fn write(
        _tables: &Tables,
        id: RecordId,
        current: Option<&Self>,
        input: TaskItemInput,
        mode: WriteMode,
        _now: DateTime<Utc>,
    ) -> Result<Self, ApiError> {
        let mut errors = FieldErrors::new();
        let title = required_text(
            &mut errors,
            "title",
            input.title,
            current.map(|task| &task.title),
            mode,
            255,
        );
        let complexity_supplied = input.complexity.is_some();
        let complexity = required(
            &mut errors,
            "complexity",
            input.complexity,
            current.map(|task| &task.complexity),
            mode,
        );
        if complexity_supplied && !(MIN_COMPLEXITY..=MAX_COMPLEXITY).contains(&complexity) {
            errors.add(
                "complexity",
                format!("Complexity must be between {MIN_COMPLEXITY} and {MAX_COMPLEXITY}."),
            );
        }
        let task_condition = required_text(
            &mut errors,
            "task_condition",
            input.task_condition,
            current.map(|task| &task.task_condition),
            mode,
            usize::MAX,
        );
        errors.into_result()?;

        Ok(TaskItem {
            id,
            title,
            complexity,
            task_condition,
        })
    }

    fn view(&self, tables: &Tables) -> TaskItemView {
        TaskItemView {
            task: self.clone(),
            open_questions: tables
                .open_questions
                .iter()
                .filter(|question| question.task_item_id == self.id)
                .cloned()
                .collect(),
            multiple_choice_questions: tables
                .multiple_choice_questions
                .iter()
                .filter(|question| question.task_item_id == self.id)
                .cloned()
                .collect(),
            code_questions: tables
                .code_questions
                .iter()
                .filter(|question| question.task_item_id == self.id)
                .cloned()
                .collect(),
        }
    }

    fn matches(&self, _tables: &Tables, filter: &TaskItemFilter) -> bool {
        if filter
            .complexity
            .is_some_and(|complexity| complexity != self.complexity)
        {
            return false;
        }
        filter.search.as_deref().map_or(true, |term| {
            contains_ci(&self.title, term) || contains_ci(&self.task_condition, term)
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct VariantFilter {
    pub task_item: Option<RecordId>,
    pub is_correct_answer: Option<bool>,
    pub is_code_run: Option<bool>,
}

impl VariantFilter {
    fn task_matches(&self, task_item_id: RecordId) -> bool {
        self.task_item.map_or(true, |wanted| wanted == task_item_id)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct OpenQuestionInput {
    pub task_item_id: Option<RecordId>,
    pub correct_answer: Option<String>,
}

impl Record for OpenQuestion {
    const KIND: &'static str = "open question";

    fn id(&self) -> RecordId {
        self.id
    }

    fn table(tables: &Tables) -> &Table<Self> {
        &tables.open_questions
    }

    fn table_mut(tables: &mut Tables) -> &mut Table<Self> {
        &mut tables.open_questions
    }
}

impl Resource for OpenQuestion {
    const SEGMENT: &'static str = "open-questions";

    type Input = OpenQuestionInput;
    type Filter = VariantFilter;
    type View = OpenQuestion;

    fn write(
        tables: &Tables,
        id: RecordId,
        current: Option<&Self>,
        input: OpenQuestionInput,
        mode: WriteMode,
        _now: DateTime<Utc>,
    ) -> Result<Self, ApiError> {
        let mut errors = FieldErrors::new();
        let task_item_id = reference::<TaskItem>(
            tables,
            &mut errors,
            "task_item_id",
            input.task_item_id,
            current.map(|question| &question.task_item_id),
            mode,
        );
        let correct_answer = required_text(
            &mut errors,
            "correct_answer",
            input.correct_answer,
            current.map(|question| &question.correct_answer),
            mode,
            usize::MAX,
        );
        errors.into_result()?;

        Ok(OpenQuestion {
            id,
            task_item_id,
            correct_answer,
        })
    }

    fn view(&self, _tables: &Tables) -> OpenQuestion {
        self.clone()
    }

    fn matches(&self, _tables: &Tables, filter: &VariantFilter) -> bool {
        filter.task_matches(self.task_item_id)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct MultipleChoiceInput {
    pub task_item_id: Option<RecordId>,
    pub answer_text: Option<String>,
    pub is_correct_answer: Option<bool>,
}

impl Record for MultipleChoiceQuestion {
    const KIND: &'static str = "multiple choice question";

    fn id(&self) -> RecordId {
        self.id
    }

    fn table(tables: &Tables) -> &Table<Self> {
        &tables.multiple_choice_questions
    }

    fn table_mut(tables: &mut Tables) -> &mut Table<Self> {
        &mut tables.multiple_choice_questions
    }
}

impl Resource for MultipleChoiceQuestion {
    const SEGMENT: &'static str = "multiple-choice-questions";

    type Input = MultipleChoiceInput;
    type Filter = VariantFilter;
    type View = MultipleChoiceQuestion;

    fn write(
        tables: &Tables,
        id: RecordId,
        current: Option<&Self>,
        input: MultipleChoiceInput,
        mode: WriteMode,
        _now: DateTime<Utc>,
    ) -> Result<Self, ApiError> {
        let mut errors = FieldErrors::new();
        let task_item_id = reference::<TaskItem>(
            tables,
            &mut errors,
            "task_item_id",
            input.task_item_id,
            current.map(|question| &question.task_item_id),
            mode,
        );
        let answer_text = required_text(
            &mut errors,
            "answer_text",
            input.answer_text,
            current.map(|question| &question.answer_text),
            mode,
            255,
        );
        let is_correct_answer = required(
            &mut errors,
            "is_correct_answer",
            input.is_correct_answer,
            current.map(|question| &question.is_correct_answer),
            mode,
        );
        errors.into_result()?;

        Ok(MultipleChoiceQuestion {
            id,
            task_item_id,
            answer_text,
            is_correct_answer,
        })
    }

    fn view(&self, _tables: &Tables) -> MultipleChoiceQuestion {
        self.clone()
    }

    fn matches(&self, _tables: &Tables, filter: &VariantFilter) -> bool {
        filter.task_matches(self.task_item_id)
            && filter
                .is_correct_answer
                .map_or(true, |wanted| wanted == self.is_correct_answer)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CodeQuestionInput {
    pub task_item_id: Option<RecordId>,
    pub language: Option<String>,
    pub is_code_run: Option<bool>,
    pub code_snippet: Option<String>,
}

impl Record for CodeQuestion {
    const KIND: &'static str = "code question";

    fn id(&self) -> RecordId {
        self.id
    }

    fn table(tables: &Tables) -> &Table<Self> {
        &tables.code_questions
    }

    fn table_mut(tables: &mut Tables) -> &mut Table<Self> {
        &mut tables.code_questions
    }
}

impl Resource for CodeQuestion {
    const SEGMENT: &'static str = "code-questions";

    type Input = CodeQuestionInput;
    type Filter = VariantFilter;
    type View = CodeQuestion;

    fn write(
        tables: &Tables,
        id: RecordId,
        current: Option<&Self>,
        input: CodeQuestionInput,
        mode: WriteMode,
        _now: DateTime<Utc>,
    ) -> Result<Self, ApiError> {
        let mut errors = FieldErrors::new();
        let task_item_id = reference::<TaskItem>(
            tables,
            &mut errors,
            "task_item_id",
            input.task_item_id,
            current.map(|question| &question.task_item_id),
            mode,
        );
        let language = required_text(
            &mut errors,
            "language",
            input.language,
            current.map(|question| &question.language),
            mode,
            255,
        );
        let code_snippet = required_text(
            &mut errors,
            "code_snippet",
            input.code_snippet,
            current.map(|question| &question.code_snippet),
            mode,
            usize::MAX,
        );
        errors.into_result()?;

        Ok(CodeQuestion {
            id,
            task_item_id,
            language,
            is_code_run: input
                .is_code_run
                .or_else(|| current.map(|question| question.is_code_run))
                .unwrap_or(false),
            code_snippet,
        })
    }

    fn view(&self, _tables: &Tables) -> CodeQuestion {
        self.clone()
    }

    fn matches(&self, _tables: &Tables, filter: &VariantFilter) -> bool {
        filter.task_matches(self.task_item_id)
            && filter
                .is_code_run
                .map_or(true, |wanted| wanted == self.is_code_run)
    }
}

pub(crate) fn routes() -> Router<HubState> {
    resource_routes::<TaskItem>()
        .merge(resource_routes::<OpenQuestion>())
        .merge(resource_routes::<MultipleChoiceQuestion>())
        .merge(resource_routes::<CodeQuestion>())
}
