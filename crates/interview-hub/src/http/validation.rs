//! Field-level validation shared by every resource payload.
//!
//! Payload fields arrive as `Option`s so that a missing value is reported as a
//! field error (400) instead of a deserialisation failure.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::ApiError;
use crate::hiring::choices::Choice;
use crate::store::{Record, RecordId, Tables};

pub const REQUIRED: &str = "This field is required.";
pub const BLANK: &str = "This field may not be blank.";
pub const NON_FIELD: &str = "non_field_errors";

/// How a payload is applied to a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// POST: required fields must be present.
    Create,
    /// PUT: required fields must be present, absent optional fields keep their value.
    Replace,
    /// PATCH: every field is optional.
    Partial,
}

/// Field name -> messages, serialised as a plain JSON object.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn messages(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_result(self) -> Result<(), ApiError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(self))
        }
    }
}

/// Resolves a required value; records an error and returns a placeholder when missing.
pub fn required<T: Clone + Default>(
    errors: &mut FieldErrors,
    field: &str,
    incoming: Option<T>,
    current: Option<&T>,
    mode: WriteMode,
) -> T {
    match (incoming, current, mode) {
        (Some(value), _, _) => value,
        (None, Some(existing), WriteMode::Partial) => existing.clone(),
        _ => {
            errors.add(field, REQUIRED);
            T::default()
        }
    }
}

/// Required text with a blank check and a character limit.
pub fn required_text(
    errors: &mut FieldErrors,
    field: &str,
    incoming: Option<String>,
    current: Option<&String>,
    mode: WriteMode,
    max_len: usize,
) -> String {
    let supplied = incoming.is_some();
    let value = required(errors, field, incoming, current, mode);
    if supplied {
        if value.trim().is_empty() {
            errors.add(field, BLANK);
        } else {
            check_length(errors, field, &value, max_len);
        }
    }
    value
}

/// Payload field that may be absent (`None`), explicitly `null` (`Some(None)`)
/// or set (`Some(Some(value))`).
pub type Nullable<T> = Option<Option<T>>;

/// Deserializer for [`Nullable`] fields; pair it with `#[serde(default)]`.
pub fn nullable<'de, D, T>(deserializer: D) -> Result<Nullable<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Optional value: a supplied value (or `null`) wins, otherwise the stored one is kept.
pub fn optional<T: Clone>(incoming: Nullable<T>, current: Option<&Option<T>>) -> Option<T> {
    match incoming {
        Some(value) => value,
        None => current.cloned().flatten(),
    }
}

pub fn optional_text(
    errors: &mut FieldErrors,
    field: &str,
    incoming: Nullable<String>,
    current: Option<&Option<String>>,
    max_len: usize,
) -> Option<String> {
    if let Some(Some(value)) = &incoming {
        check_length(errors, field, value, max_len);
    }
    optional(incoming, current)
}

/// Required foreign key that must point at an existing row.
pub fn reference<R: Record>(
    tables: &Tables,
    errors: &mut FieldErrors,
    field: &str,
    incoming: Option<RecordId>,
    current: Option<&RecordId>,
    mode: WriteMode,
) -> RecordId {
    let supplied = incoming.is_some();
    let id = required(errors, field, incoming, current, mode);
    if supplied && !tables.exists::<R>(id) {
        errors.add(field, missing_reference(id));
    }
    id
}

pub fn missing_reference(id: RecordId) -> String {
    format!("Invalid pk \"{id}\" - object does not exist.")
}

pub fn check_length(errors: &mut FieldErrors, field: &str, value: &str, max_len: usize) {
    if value.chars().count() > max_len {
        errors.add(
            field,
            format!("Ensure this field has no more than {max_len} characters."),
        );
    }
}

/// Skill ratings are scored on a 0-10 scale.
pub fn check_rating(errors: &mut FieldErrors, field: &str, value: Option<i32>) {
    if let Some(rating) = value {
        if !(0..=10).contains(&rating) {
            errors.add(field, "Rating must be between 0 and 10.");
        }
    }
}

pub fn check_url(errors: &mut FieldErrors, field: &str, value: Option<&str>) {
    if let Some(url) = value {
        let has_scheme = url.starts_with("http://") || url.starts_with("https://");
        if !has_scheme || url.len() <= "https://".len() {
            errors.add(field, "Enter a valid URL starting with http:// or https://.");
        }
    }
}

pub fn check_future(
    errors: &mut FieldErrors,
    field: &str,
    value: DateTime<Utc>,
    now: DateTime<Utc>,
) {
    if value < now {
        errors.add(field, "Start time must be in the future.");
    }
}

pub fn check_time_order(errors: &mut FieldErrors, start: DateTime<Utc>, end: DateTime<Utc>) {
    if start >= end {
        errors.add(NON_FIELD, "start_time must be earlier than end_time.");
    }
}

/// Parses an enum field; unknown values list the accepted codes.
pub fn choice<T: Choice>(errors: &mut FieldErrors, field: &str, raw: Option<String>) -> Option<T> {
    let raw = raw?;
    match T::parse(&raw) {
        Some(value) => Some(value),
        None => {
            errors.add(
                field,
                format!("\"{raw}\" is not a valid choice. Expected one of: {}.", T::expected()),
            );
            None
        }
    }
}

/// Required enum field; keeps the stored value on partial writes.
pub fn required_choice<T: Choice>(
    errors: &mut FieldErrors,
    field: &str,
    raw: Option<String>,
    current: Option<T>,
    mode: WriteMode,
) -> Option<T> {
    match (raw, current, mode) {
        (Some(raw), _, _) => choice(errors, field, Some(raw)),
        (None, Some(existing), WriteMode::Partial) => Some(existing),
        _ => {
            errors.add(field, REQUIRED);
            None
        }
    }
}

/// Parses an enum used as a query filter.
pub fn choice_filter<T: Choice>(field: &str, raw: Option<&str>) -> Result<Option<T>, ApiError> {
    let mut errors = FieldErrors::new();
    let parsed = choice(&mut errors, field, raw.map(str::to_string));
    errors.into_result()?;
    Ok(parsed)
}

/// Whole minutes between two instants.
pub fn duration_minutes(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    (end - start).num_minutes()
}

/// Case-insensitive substring match used by `search` filters.
pub fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
