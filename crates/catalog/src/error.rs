use thiserror::Error;

use crate::selector::Level;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("invalid catalog json: {0}")]
    Json(#[from] serde_json::Error),
    #[error(
        "course '{course}' lists subjects for semester {semester} \
         but only has {semester_count} semesters"
    )]
    SemesterOutOfRange {
        course: String,
        semester: u32,
        semester_count: u32,
    },
    #[error("course '{course}' has zero semesters")]
    EmptyCourse { course: String },
    #[error("{level} '{name}' is listed twice under the same parent")]
    Duplicate { level: Level, name: String },
}

impl CatalogError {
    pub(crate) fn duplicate(level: Level, name: &str) -> Self {
        Self::Duplicate {
            level,
            name: name.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("please complete the selection: missing {}", format_levels(.missing))]
    Incomplete { missing: Vec<Level> },
}

impl SelectionError {
    pub fn missing_levels(&self) -> &[Level] {
        match self {
            Self::Incomplete { missing } => missing,
        }
    }
}

fn format_levels(levels: &[Level]) -> String {
    levels
        .iter()
        .map(|level| level.label())
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown selection level '{0}'")]
pub struct UnknownLevel(pub String);

/// Outcome of a failed [`SearchForm::submit`](crate::SearchForm::submit).
#[derive(Debug, Error)]
pub enum SubmitError<E> {
    #[error(transparent)]
    Incomplete(#[from] SelectionError),
    #[error("search failed: {0}")]
    Search(E),
}
