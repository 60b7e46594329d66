//! Static institution/course lookup tables and the cascading selector built on them.
//!
//! The selector never talks to the network. The search it finally triggers is
//! supplied by the caller as a future, see [`SearchForm::submit`].

pub mod error;
pub mod form;
pub mod hierarchy;
pub mod selector;

pub use error::{CatalogError, SelectionError, SubmitError, UnknownLevel};
pub use form::{SearchForm, SearchPhase};
pub use hierarchy::{Catalog, CourseCatalog, CourseInfo, InstitutionDirectory};
pub use selector::{CascadingSelector, Choice, Level, OTHER_OPTION};
