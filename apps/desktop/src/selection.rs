//! Maps command-line flags onto the cascading selector, top level first.

use clap::Args;

use catalog::{CascadingSelector, Level, OTHER_OPTION};

#[derive(Args, Debug, Clone, Default)]
pub struct SelectionArgs {
    /// State, e.g. "Delhi".
    #[arg(long)]
    pub region: Option<String>,
    #[arg(long)]
    pub institution_type: Option<String>,
    /// Institution name, or "Other" together with --other-institution.
    #[arg(long)]
    pub institution: Option<String>,
    #[arg(long)]
    pub other_institution: Option<String>,
    #[arg(long)]
    pub course: Option<String>,
    #[arg(long)]
    pub semester: Option<String>,
    #[arg(long)]
    pub subject: Option<String>,
}

impl SelectionArgs {
    fn value(&self, level: Level) -> Option<&str> {
        match level {
            Level::Region => self.region.as_deref(),
            Level::InstitutionType => self.institution_type.as_deref(),
            Level::Institution => self.institution.as_deref().or(self
                .other_institution
                .as_ref()
                .map(|_| OTHER_OPTION)),
            Level::Course => self.course.as_deref(),
            Level::Semester => self.semester.as_deref(),
            Level::Subject => self.subject.as_deref(),
        }
    }

    /// Replays the flags in hierarchy order, exactly as a user picking dropdowns would.
    pub fn apply(&self, selector: &mut CascadingSelector) {
        for level in Level::ALL {
            let Some(value) = self.value(level) else {
                continue;
            };
            selector.select(level, value);
            if level.accepts_other() {
                if let Some(text) = &self.other_institution {
                    selector.set_other_text(level, text.clone());
                }
            }
        }
    }
}
