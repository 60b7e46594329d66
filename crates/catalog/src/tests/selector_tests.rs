use std::sync::Arc;

use super::*;
use crate::hierarchy::{CourseCatalog, InstitutionDirectory};

const BCOM: &str = "Bachelor of Commerce (B.Com)";
const MBA: &str = "Master of Business Administration (MBA)";

fn delhi_catalog() -> Arc<Catalog> {
    let institutions = InstitutionDirectory::new().with_institutions(
        "Delhi",
        "Government Universities",
        ["University of Delhi"],
    );
    let courses = CourseCatalog::new()
        .with_course(BCOM, 6)
        .with_course(MBA, 4)
        .with_subjects(BCOM, 1, ["Financial Accounting", "Micro Economics"])
        .with_subjects(BCOM, 3, ["Cost Accounting"])
        .with_subjects(MBA, 1, ["Principles of Management"]);
    Arc::new(Catalog::new(institutions, courses).expect("valid catalog"))
}

fn selector_through_institution() -> CascadingSelector {
    let mut selector = CascadingSelector::new(delhi_catalog());
    selector.set_region("Delhi");
    selector.set_institution_type("Government Universities");
    selector.set_institution("University of Delhi");
    selector
}

fn complete_selector() -> CascadingSelector {
    let mut selector = selector_through_institution();
    selector.set_course(BCOM);
    selector.set_semester(1);
    selector.set_subject("Financial Accounting");
    selector
}

#[test]
fn fresh_selector_offers_regions_and_courses() {
    let selector = CascadingSelector::new(delhi_catalog());
    assert_eq!(selector.options(Level::Region), vec!["Delhi"]);
    assert_eq!(selector.options(Level::Course), vec![BCOM, MBA]);
    for level in [
        Level::InstitutionType,
        Level::Institution,
        Level::Semester,
        Level::Subject,
    ] {
        assert!(selector.options(level).is_empty(), "{level} should be empty");
    }
}

#[test]
fn drilling_down_delhi_offers_children_and_other() {
    let mut selector = CascadingSelector::new(delhi_catalog());
    selector.set_region("Delhi");
    assert_eq!(
        selector.options(Level::InstitutionType),
        vec!["Government Universities"]
    );

    selector.set_institution_type("Government Universities");
    assert_eq!(
        selector.options(Level::Institution),
        vec!["University of Delhi", OTHER_OPTION]
    );
}

#[test]
fn unknown_region_leaves_downstream_empty() {
    let mut selector = CascadingSelector::new(delhi_catalog());
    selector.set_region("Atlantis");
    assert!(selector.options(Level::InstitutionType).is_empty());

    selector.set_institution_type("Sunken Colleges");
    assert_eq!(selector.options(Level::Institution), vec![OTHER_OPTION]);
}

#[test]
fn course_branch_needs_no_institution() {
    let mut selector = CascadingSelector::new(delhi_catalog());
    selector.set_course(BCOM);
    assert_eq!(selector.semester_options(), vec![1, 2, 3, 4, 5, 6]);

    selector.set_semester(1);
    assert_eq!(
        selector.options(Level::Subject),
        vec!["Financial Accounting", "Micro Economics"]
    );
    assert!(!selector.is_set(Level::Region));
}

#[test]
fn institution_changes_keep_the_course_branch() {
    let mut selector = complete_selector();
    selector.set_institution(OTHER_OPTION);
    assert_eq!(selector.value(Level::Course).as_deref(), Some(BCOM));
    assert_eq!(selector.semester(), Some(1));
    assert!(selector.is_set(Level::Subject));

    selector.set_institution_type("Government Universities");
    assert!(!selector.is_set(Level::Institution));
    assert_eq!(selector.semester(), Some(1));
    assert!(selector.is_set(Level::Subject));
}

#[test]
fn region_change_restarts_both_branches() {
    let mut selector = complete_selector();
    selector.set_region("Delhi");
    assert_eq!(selector.missing(), Level::ALL[1..].to_vec());
}

#[test]
fn semester_options_follow_course_and_reset_on_change() {
    let mut selector = selector_through_institution();
    selector.set_course(BCOM);
    assert_eq!(selector.semester_options(), vec![1, 2, 3, 4, 5, 6]);
    assert_eq!(
        selector.options(Level::Semester),
        vec!["1", "2", "3", "4", "5", "6"]
    );

    selector.set_semester(3);
    selector.set_subject("Cost Accounting");

    selector.set_course(MBA);
    assert!(!selector.is_set(Level::Semester));
    assert!(!selector.is_set(Level::Subject));
    assert_eq!(selector.semester_options(), vec![1, 2, 3, 4]);
    assert!(selector.is_set(Level::Institution));
}

#[test]
fn subject_options_come_from_course_and_semester() {
    let mut selector = selector_through_institution();
    selector.set_course(BCOM);
    assert!(selector.options(Level::Subject).is_empty());

    selector.set_semester(1);
    assert_eq!(
        selector.options(Level::Subject),
        vec!["Financial Accounting", "Micro Economics"]
    );

    selector.set_semester(2);
    assert!(selector.options(Level::Subject).is_empty());
}

#[test]
fn every_ancestor_change_clears_all_descendants() {
    for level in Level::ALL {
        let mut selector = complete_selector();
        let value = selector.value(level).expect("set");
        selector.select(level, &value);
        for descendant in level.descendants() {
            assert!(
                !selector.is_set(*descendant),
                "{descendant} survived a change of {level}"
            );
        }
        for ancestor in level.ancestors() {
            assert!(selector.is_set(*ancestor), "{ancestor} was cleared by {level}");
        }
    }
}

#[test]
fn resetting_unset_descendants_is_a_no_op() {
    let mut selector = CascadingSelector::new(delhi_catalog());
    selector.set_region("Delhi");
    selector.set_region("Delhi");
    assert_eq!(selector.value(Level::Region).as_deref(), Some("Delhi"));
    assert_eq!(selector.missing(), Level::ALL[1..].to_vec());
}

#[test]
fn other_institution_needs_free_text() {
    let mut selector = CascadingSelector::new(delhi_catalog());
    selector.set_region("Delhi");
    selector.set_institution_type("Government Universities");
    selector.set_institution(OTHER_OPTION);
    selector.set_course(BCOM);
    selector.set_semester(1);
    selector.set_subject("Financial Accounting");

    let err = selector.finalize().expect_err("blank other");
    assert_eq!(err.missing_levels(), &[Level::Institution]);

    assert!(selector.set_other_text(Level::Institution, "  Hansraj Evening College "));
    assert!(selector.is_set(Level::Subject), "free text must not reset descendants");

    let query = selector.finalize().expect("complete");
    assert_eq!(query.institution, "Hansraj Evening College");
    assert_eq!(query.semester, 1);
}

#[test]
fn free_text_is_refused_for_listed_choices() {
    let mut selector = selector_through_institution();
    assert!(!selector.set_other_text(Level::Institution, "Somewhere"));
    assert!(!selector.set_other_text(Level::Course, "Somewhere"));
    assert_eq!(
        selector.institution_choice(),
        Some(&Choice::Listed("University of Delhi".into()))
    );
    assert!(!selector.institution_choice().is_some_and(Choice::is_other));
}

#[test]
fn finalize_reports_missing_levels_in_order() {
    let mut selector = selector_through_institution();
    selector.set_course(BCOM);
    let err = selector.finalize().expect_err("incomplete");
    assert_eq!(err.missing_levels(), &[Level::Semester, Level::Subject]);
    assert_eq!(
        err.to_string(),
        "please complete the selection: missing semester, subject"
    );
}

#[test]
fn finalize_builds_the_query_tuple() {
    let query = complete_selector().finalize().expect("complete");
    assert_eq!(query.region, "Delhi");
    assert_eq!(query.institution_type, "Government Universities");
    assert_eq!(query.institution, "University of Delhi");
    assert_eq!(query.course, BCOM);
    assert_eq!(query.semester, 1);
    assert_eq!(query.subject, "Financial Accounting");
}

#[test]
fn non_numeric_semester_stays_unset() {
    let mut selector = complete_selector();
    selector.select(Level::Semester, "third");
    assert_eq!(selector.semester(), None);
    assert!(!selector.is_set(Level::Subject));
    assert!(selector.options(Level::Subject).is_empty());
}

#[test]
fn level_names_parse_loosely() {
    assert_eq!("institution-type".parse::<Level>(), Ok(Level::InstitutionType));
    assert_eq!("institutionType".parse::<Level>(), Ok(Level::InstitutionType));
    assert_eq!("State".parse::<Level>(), Ok(Level::Region));
    assert!("campus".parse::<Level>().is_err());
}
