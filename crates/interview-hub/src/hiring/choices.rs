//! String enums shared by the hiring records.
//!
//! Each value has a snake_case wire code and a display label; both are accepted
//! on input.

use serde::{Deserialize, Serialize};

/// Closed set of string values with a wire code and a display label.
pub trait Choice: Sized + Copy + 'static {
    const VARIANTS: &'static [Self];

    fn code(self) -> &'static str;
    fn label(self) -> &'static str;

    fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::VARIANTS.iter().copied().find(|variant| {
            variant.code().eq_ignore_ascii_case(raw) || variant.label().eq_ignore_ascii_case(raw)
        })
    }

    fn expected() -> String {
        Self::VARIANTS
            .iter()
            .map(|variant| variant.code())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Pipeline state of a candidate selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionStatus {
    #[default]
    #[serde(alias = "On Review")]
    OnReview,
    #[serde(alias = "Accepted")]
    Accepted,
    #[serde(alias = "Rejected")]
    Rejected,
}

impl Choice for SelectionStatus {
    const VARIANTS: &'static [Self] = &[Self::OnReview, Self::Accepted, Self::Rejected];

    fn code(self) -> &'static str {
        match self {
            Self::OnReview => "on_review",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::OnReview => "On Review",
            Self::Accepted => "Accepted",
            Self::Rejected => "Rejected",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterviewStatus {
    #[default]
    #[serde(alias = "Scheduled")]
    Scheduled,
    #[serde(alias = "Completed")]
    Completed,
    #[serde(alias = "Declined")]
    Declined,
}

impl Choice for InterviewStatus {
    const VARIANTS: &'static [Self] = &[Self::Scheduled, Self::Completed, Self::Declined];

    fn code(self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Completed => "completed",
            Self::Declined => "declined",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Scheduled => "Scheduled",
            Self::Completed => "Completed",
            Self::Declined => "Declined",
        }
    }
}

/// Outcome of an interview, test task or evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    #[serde(alias = "Accepted")]
    Accepted,
    #[serde(alias = "Rejected")]
    Rejected,
}

impl Choice for Verdict {
    const VARIANTS: &'static [Self] = &[Self::Accepted, Self::Rejected];

    fn code(self) -> &'static str {
        match self {
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Accepted => "Accepted",
            Self::Rejected => "Rejected",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    #[serde(alias = "Male")]
    Male,
    #[serde(alias = "Female")]
    Female,
}

impl Choice for Gender {
    const VARIANTS: &'static [Self] = &[Self::Male, Self::Female];

    fn code(self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Male => "Male",
            Self::Female => "Female",
        }
    }
}
