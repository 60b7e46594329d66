use std::{fmt::Display, future::Future, sync::Arc};

use shared::protocol::NoteQuery;
use tracing::{info, warn};

use crate::{
    error::{SelectionError, SubmitError},
    hierarchy::Catalog,
    selector::CascadingSelector,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchPhase {
    Idle,
    Searching,
    Failed(String),
}

/// A [`CascadingSelector`] plus the submit lifecycle of the search page.
///
/// The searching indicator follows the search future itself: `Searching` while it is
/// pending, back to `Idle` when it resolves, `Failed` when it is rejected.
#[derive(Debug, Clone)]
pub struct SearchForm {
    selector: CascadingSelector,
    phase: SearchPhase,
    validation_message: Option<String>,
}

impl SearchForm {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            selector: CascadingSelector::new(catalog),
            phase: SearchPhase::Idle,
            validation_message: None,
        }
    }

    pub fn selector(&self) -> &CascadingSelector {
        &self.selector
    }

    /// Editing the selection dismisses a pending validation message.
    pub fn selector_mut(&mut self) -> &mut CascadingSelector {
        self.validation_message = None;
        &mut self.selector
    }

    pub fn phase(&self) -> &SearchPhase {
        &self.phase
    }

    pub fn is_searching(&self) -> bool {
        self.phase == SearchPhase::Searching
    }

    pub fn validation_message(&self) -> Option<&str> {
        self.validation_message.as_deref()
    }

    pub fn validate(&self) -> Result<NoteQuery, SelectionError> {
        self.selector.finalize()
    }

    /// Validates the selection and, when complete, awaits `search` exactly once with the
    /// finalized tuple. An incomplete selection never reaches `search`; the form records a
    /// validation message and stays editable.
    pub async fn submit<F, Fut, T, E>(&mut self, search: F) -> Result<T, SubmitError<E>>
    where
        F: FnOnce(NoteQuery) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let query = match self.selector.finalize() {
            Ok(query) => query,
            Err(err) => {
                warn!(missing = ?err.missing_levels(), "search: incomplete selection");
                self.validation_message = Some(err.to_string());
                return Err(err.into());
            }
        };

        self.validation_message = None;
        self.phase = SearchPhase::Searching;
        info!(
            institution = %query.institution,
            course = %query.course,
            semester = query.semester,
            subject = %query.subject,
            "search: submitting note query"
        );

        match search(query).await {
            Ok(found) => {
                self.phase = SearchPhase::Idle;
                Ok(found)
            }
            Err(err) => {
                warn!("search: note query failed: {err}");
                self.phase = SearchPhase::Failed(err.to_string());
                Err(SubmitError::Search(err))
            }
        }
    }

    /// Drops the selection after a completed search or when the page is left.
    pub fn reset(&mut self) {
        self.selector.clear();
        self.phase = SearchPhase::Idle;
        self.validation_message = None;
    }
}

#[cfg(test)]
#[path = "tests/form_tests.rs"]
mod tests;
