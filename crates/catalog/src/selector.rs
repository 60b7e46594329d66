use std::{fmt, str::FromStr, sync::Arc};

use shared::protocol::NoteQuery;
use tracing::debug;

use crate::{
    error::{SelectionError, UnknownLevel},
    hierarchy::Catalog,
};

/// Synthetic entry appended to the institution options.
pub const OTHER_OPTION: &str = "Other";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Level {
    Region,
    InstitutionType,
    Institution,
    Course,
    Semester,
    Subject,
}

impl Level {
    pub const ALL: [Level; 6] = [
        Level::Region,
        Level::InstitutionType,
        Level::Institution,
        Level::Course,
        Level::Semester,
        Level::Subject,
    ];

    /// Levels that must be chosen before this one has any options.
    ///
    /// The institution branch and the course branch are separate: a course needs no
    /// institution, and semesters need only a course.
    pub fn ancestors(self) -> &'static [Level] {
        match self {
            Level::Region | Level::Course => &[],
            Level::InstitutionType => &[Level::Region],
            Level::Institution => &[Level::Region, Level::InstitutionType],
            Level::Semester => &[Level::Course],
            Level::Subject => &[Level::Course, Level::Semester],
        }
    }

    /// Levels invalidated when this one changes. A new region restarts the whole drill-down,
    /// course branch included.
    pub fn descendants(self) -> &'static [Level] {
        match self {
            Level::Region => &[
                Level::InstitutionType,
                Level::Institution,
                Level::Course,
                Level::Semester,
                Level::Subject,
            ],
            Level::InstitutionType => &[Level::Institution],
            Level::Institution | Level::Subject => &[],
            Level::Course => &[Level::Semester, Level::Subject],
            Level::Semester => &[Level::Subject],
        }
    }

    pub fn accepts_other(self) -> bool {
        self == Level::Institution
    }

    pub fn label(self) -> &'static str {
        match self {
            Level::Region => "state",
            Level::InstitutionType => "institution type",
            Level::Institution => "institution",
            Level::Course => "course",
            Level::Semester => "semester",
            Level::Subject => "subject",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Level {
    type Err = UnknownLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match normalized.as_str() {
            "region" | "state" => Ok(Level::Region),
            "institutiontype" | "type" => Ok(Level::InstitutionType),
            "institution" | "university" => Ok(Level::Institution),
            "course" => Ok(Level::Course),
            "semester" => Ok(Level::Semester),
            "subject" => Ok(Level::Subject),
            _ => Err(UnknownLevel(s.to_string())),
        }
    }
}

/// A value picked at a level: either an entry of the lookup table or free text typed after
/// picking [`OTHER_OPTION`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Choice {
    Listed(String),
    Other(String),
}

impl Choice {
    /// The value that ends up in the search tuple. Blank free text resolves to nothing.
    pub fn resolved(&self) -> Option<&str> {
        match self {
            Choice::Listed(value) => Some(value.as_str()),
            Choice::Other(text) => {
                let text = text.trim();
                (!text.is_empty()).then_some(text)
            }
        }
    }

    pub fn is_other(&self) -> bool {
        matches!(self, Choice::Other(_))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct SelectionState {
    region: Option<String>,
    institution_type: Option<String>,
    institution: Option<Choice>,
    course: Option<String>,
    semester: Option<u32>,
    subject: Option<String>,
}

impl SelectionState {
    fn is_set(&self, level: Level) -> bool {
        match level {
            Level::Region => self.region.is_some(),
            Level::InstitutionType => self.institution_type.is_some(),
            Level::Institution => self.institution.is_some(),
            Level::Course => self.course.is_some(),
            Level::Semester => self.semester.is_some(),
            Level::Subject => self.subject.is_some(),
        }
    }

    fn clear(&mut self, level: Level) -> bool {
        let was_set = self.is_set(level);
        match level {
            Level::Region => self.region = None,
            Level::InstitutionType => self.institution_type = None,
            Level::Institution => self.institution = None,
            Level::Course => self.course = None,
            Level::Semester => self.semester = None,
            Level::Subject => self.subject = None,
        }
        was_set
    }
}

/// Dependent dropdown chain over a [`Catalog`].
///
/// Every setter resets the levels that depend on it, so a stored value is always drawn from the
/// options implied by its current ancestors (or is free text at a level that accepts
/// [`OTHER_OPTION`]). Setters take any string; a value missing from the lookup only makes
/// the options below it empty.
#[derive(Debug, Clone)]
pub struct CascadingSelector {
    catalog: Arc<Catalog>,
    state: SelectionState,
}

impl CascadingSelector {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            catalog,
            state: SelectionState::default(),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn set_region(&mut self, value: impl Into<String>) {
        self.state.region = Some(value.into());
        self.reset_below(Level::Region);
    }

    pub fn set_institution_type(&mut self, value: impl Into<String>) {
        self.state.institution_type = Some(value.into());
        self.reset_below(Level::InstitutionType);
    }

    /// Picking [`OTHER_OPTION`] stores an empty free-text choice that
    /// [`set_other_text`](Self::set_other_text) fills in later.
    pub fn set_institution(&mut self, value: impl Into<String>) {
        let value = value.into();
        let choice = if value == OTHER_OPTION {
            Choice::Other(String::new())
        } else {
            Choice::Listed(value)
        };
        self.set_institution_choice(choice);
    }

    pub fn set_institution_choice(&mut self, choice: Choice) {
        self.state.institution = Some(choice);
        self.reset_below(Level::Institution);
    }

    pub fn set_course(&mut self, value: impl Into<String>) {
        self.state.course = Some(value.into());
        self.reset_below(Level::Course);
    }

    pub fn set_semester(&mut self, value: u32) {
        self.state.semester = Some(value);
        self.reset_below(Level::Semester);
    }

    pub fn set_subject(&mut self, value: impl Into<String>) {
        self.state.subject = Some(value.into());
    }

    /// String-keyed entry point for front-ends that dispatch on a level name.
    ///
    /// A semester that is not a number behaves like any other value missing from the lookup:
    /// the level stays unset and everything below it is reset.
    pub fn select(&mut self, level: Level, value: &str) {
        match level {
            Level::Region => self.set_region(value),
            Level::InstitutionType => self.set_institution_type(value),
            Level::Institution => self.set_institution(value),
            Level::Course => self.set_course(value),
            Level::Semester => match value.trim().parse::<u32>() {
                Ok(semester) => self.set_semester(semester),
                Err(_) => {
                    debug!(value, "selector: non-numeric semester ignored");
                    self.state.semester = None;
                    self.reset_below(Level::Semester);
                }
            },
            Level::Subject => self.set_subject(value),
        }
    }

    /// Fills the free text of an `Other` choice. Returns `false` when `level` does not
    /// currently hold `Other`. Levels below are left alone.
    pub fn set_other_text(&mut self, level: Level, text: impl Into<String>) -> bool {
        match (level, self.state.institution.as_mut()) {
            (Level::Institution, Some(Choice::Other(current))) => {
                *current = text.into();
                true
            }
            _ => false,
        }
    }

    pub fn clear(&mut self) {
        self.state = SelectionState::default();
    }

    pub fn is_set(&self, level: Level) -> bool {
        self.state.is_set(level)
    }

    pub fn institution_choice(&self) -> Option<&Choice> {
        self.state.institution.as_ref()
    }

    pub fn semester(&self) -> Option<u32> {
        self.state.semester
    }

    /// Display value of a level; `Other` shows as its free text, or as
    /// [`OTHER_OPTION`] while the text is still blank.
    pub fn value(&self, level: Level) -> Option<String> {
        match level {
            Level::Region => self.state.region.clone(),
            Level::InstitutionType => self.state.institution_type.clone(),
            Level::Institution => self.state.institution.as_ref().map(|choice| {
                choice
                    .resolved()
                    .unwrap_or(OTHER_OPTION)
                    .to_string()
            }),
            Level::Course => self.state.course.clone(),
            Level::Semester => self.state.semester.map(|s| s.to_string()),
            Level::Subject => self.state.subject.clone(),
        }
    }

    /// Valid values for `level` given the current ancestors; empty if any ancestor is unset.
    pub fn options(&self, level: Level) -> Vec<String> {
        if !self.ancestors_set(level) {
            return Vec::new();
        }
        let catalog = &self.catalog;
        match level {
            Level::Region => owned(catalog.institutions.regions()),
            Level::InstitutionType => self
                .state
                .region
                .as_deref()
                .map(|region| owned(catalog.institutions.institution_types(region)))
                .unwrap_or_default(),
            Level::Institution => {
                let (Some(region), Some(institution_type)) = (
                    self.state.region.as_deref(),
                    self.state.institution_type.as_deref(),
                ) else {
                    return Vec::new();
                };
                let mut options =
                    owned(catalog.institutions.institutions(region, institution_type));
                options.push(OTHER_OPTION.to_string());
                options
            }
            Level::Course => owned(catalog.courses.courses()),
            Level::Semester => self
                .semester_options()
                .into_iter()
                .map(|s| s.to_string())
                .collect(),
            Level::Subject => match (self.state.course.as_deref(), self.state.semester) {
                (Some(course), Some(semester)) => {
                    owned(catalog.courses.subjects(course, semester))
                }
                _ => Vec::new(),
            },
        }
    }

    /// Semester options as numbers, `1..=semester_count` of the chosen course.
    pub fn semester_options(&self) -> Vec<u32> {
        if !self.ancestors_set(Level::Semester) {
            return Vec::new();
        }
        self.state
            .course
            .as_deref()
            .map(|course| self.catalog.courses.semesters(course))
            .unwrap_or_default()
    }

    /// Levels whose value would not make it into the search tuple, in hierarchy order.
    pub fn missing(&self) -> Vec<Level> {
        Level::ALL
            .into_iter()
            .filter(|level| match level {
                Level::Institution => self
                    .state
                    .institution
                    .as_ref()
                    .and_then(Choice::resolved)
                    .is_none(),
                other => !self.state.is_set(*other),
            })
            .collect()
    }

    /// Finalized tuple, with `Other` replaced by its free text.
    pub fn finalize(&self) -> Result<NoteQuery, SelectionError> {
        let state = &self.state;
        match (
            state.region.as_ref(),
            state.institution_type.as_ref(),
            state.institution.as_ref().and_then(Choice::resolved),
            state.course.as_ref(),
            state.semester,
            state.subject.as_ref(),
        ) {
            (
                Some(region),
                Some(institution_type),
                Some(institution),
                Some(course),
                Some(semester),
                Some(subject),
            ) => Ok(NoteQuery {
                region: region.clone(),
                institution_type: institution_type.clone(),
                institution: institution.to_string(),
                course: course.clone(),
                semester,
                subject: subject.clone(),
            }),
            _ => Err(SelectionError::Incomplete {
                missing: self.missing(),
            }),
        }
    }

    fn ancestors_set(&self, level: Level) -> bool {
        level.ancestors().iter().all(|a| self.state.is_set(*a))
    }

    fn reset_below(&mut self, level: Level) {
        let mut cleared = 0usize;
        for descendant in level.descendants() {
            if self.state.clear(*descendant) {
                cleared += 1;
            }
        }
        if cleared > 0 {
            debug!(%level, cleared, "selector: reset dependent levels");
        }
    }
}

fn owned(values: Vec<&str>) -> Vec<String> {
    values.into_iter().map(str::to_string).collect()
}

#[cfg(test)]
#[path = "tests/selector_tests.rs"]
mod tests;
