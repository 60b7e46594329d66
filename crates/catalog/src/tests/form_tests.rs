use std::{cell::Cell, sync::Arc};

use anyhow::anyhow;

use super::*;
use crate::{
    error::SubmitError,
    hierarchy::{CourseCatalog, InstitutionDirectory},
    selector::{Level, OTHER_OPTION},
};

const BCOM: &str = "Bachelor of Commerce (B.Com)";

fn form() -> SearchForm {
    let institutions = InstitutionDirectory::new().with_institutions(
        "Delhi",
        "Government Universities",
        ["University of Delhi"],
    );
    let courses = CourseCatalog::new()
        .with_course(BCOM, 6)
        .with_subjects(BCOM, 2, ["Business Law"]);
    SearchForm::new(Arc::new(Catalog::new(institutions, courses).expect("valid catalog")))
}

fn fill(form: &mut SearchForm, institution: &str) {
    let selector = form.selector_mut();
    selector.set_region("Delhi");
    selector.set_institution_type("Government Universities");
    selector.set_institution(institution);
    selector.set_course(BCOM);
    selector.set_semester(2);
    selector.set_subject("Business Law");
}

#[tokio::test]
async fn incomplete_submit_never_calls_search() {
    let mut form = form();
    form.selector_mut().set_region("Delhi");
    let calls = Cell::new(0u32);

    let result = form
        .submit(|_query| {
            calls.set(calls.get() + 1);
            async { Ok::<_, anyhow::Error>(()) }
        })
        .await;

    assert!(matches!(result, Err(SubmitError::Incomplete(_))));
    assert_eq!(calls.get(), 0);
    assert_eq!(form.phase(), &SearchPhase::Idle);
    let message = form.validation_message().expect("message");
    assert!(message.contains("institution type"), "{message}");
}

#[tokio::test]
async fn complete_submit_calls_search_once_with_tuple() {
    let mut form = form();
    fill(&mut form, "University of Delhi");
    let calls = Cell::new(0u32);

    let found = form
        .submit(|query| {
            calls.set(calls.get() + 1);
            async move {
                assert_eq!(query.institution, "University of Delhi");
                assert_eq!(query.semester, 2);
                Ok::<_, anyhow::Error>(vec![query.subject])
            }
        })
        .await
        .expect("search");

    assert_eq!(found, vec!["Business Law".to_string()]);
    assert_eq!(calls.get(), 1);
    assert_eq!(form.phase(), &SearchPhase::Idle);
    assert!(form.validation_message().is_none());
}

#[tokio::test]
async fn submit_waits_for_the_pending_search() {
    let mut form = form();
    fill(&mut form, "University of Delhi");
    let (tx, rx) = tokio::sync::oneshot::channel::<()>();

    let observed = {
        let submit = form.submit(|_query| async move {
            rx.await.map_err(|_| anyhow!("sender dropped"))
        });
        tokio::pin!(submit);
        assert!(still_pending(submit.as_mut()).await);
        tx.send(()).expect("release");
        submit.await
    };

    assert!(observed.is_ok());
    assert_eq!(form.phase(), &SearchPhase::Idle);
}

async fn still_pending<F: std::future::Future + Unpin>(fut: F) -> bool {
    tokio::time::timeout(std::time::Duration::from_millis(20), fut)
        .await
        .is_err()
}

#[tokio::test]
async fn rejected_search_marks_form_failed_and_stays_usable() {
    let mut form = form();
    fill(&mut form, "University of Delhi");

    let result = form
        .submit(|_query| async { Err::<(), _>(anyhow!("backend unavailable")) })
        .await;
    assert!(matches!(result, Err(SubmitError::Search(_))));
    assert_eq!(
        form.phase(),
        &SearchPhase::Failed("backend unavailable".to_string())
    );

    form.selector_mut().set_subject("Business Law");
    let retried = form
        .submit(|_query| async { Ok::<_, anyhow::Error>(1) })
        .await
        .expect("retry");
    assert_eq!(retried, 1);
    assert_eq!(form.phase(), &SearchPhase::Idle);
}

#[tokio::test]
async fn other_institution_submits_free_text() {
    let mut form = form();
    fill(&mut form, OTHER_OPTION);

    let err = form
        .submit(|_query| async { Ok::<_, anyhow::Error>(()) })
        .await
        .expect_err("blank other");
    assert!(matches!(
        err,
        SubmitError::Incomplete(ref e) if e.missing_levels() == [Level::Institution]
    ));

    form.selector_mut()
        .set_other_text(Level::Institution, "Kirori Mal College");
    let institution = form
        .submit(|query| async move { Ok::<_, anyhow::Error>(query.institution) })
        .await
        .expect("search");
    assert_eq!(institution, "Kirori Mal College");
}

#[test]
fn reset_discards_selection() {
    let mut form = form();
    fill(&mut form, "University of Delhi");
    form.reset();
    assert_eq!(form.selector().missing(), Level::ALL.to_vec());
    assert_eq!(form.phase(), &SearchPhase::Idle);
}
