use super::*;

#[test]
fn toggle_flips_immediately_and_commit_keeps_it() {
    let mut set = OptimisticSet::new();
    let pending = set.begin_toggle(7).expect("toggle");
    assert!(pending.is_member());
    assert!(set.contains(&7));
    assert!(set.is_pending(&7));

    set.commit(pending);
    assert!(set.contains(&7));
    assert!(!set.is_pending(&7));
}

#[test]
fn rollback_restores_previous_membership() {
    let mut set = OptimisticSet::new();
    set.replace_all([1, 2]);

    let removal = set.begin_toggle(2).expect("toggle");
    assert!(!removal.is_member());
    assert!(!set.contains(&2));
    set.rollback(removal);
    assert!(set.contains(&2));

    let addition = set.begin_toggle(3).expect("toggle");
    set.rollback(addition);
    assert!(!set.contains(&3));
    assert_eq!(set.len(), 2);
}

#[test]
fn overlapping_toggle_is_rejected() {
    let mut set = OptimisticSet::new();
    let first = set.begin_toggle("note").expect("toggle");
    assert_eq!(
        set.begin_toggle("note").expect_err("pending"),
        ToggleError::AlreadyPending
    );
    set.commit(first);
    assert!(set.begin_toggle("note").is_ok());
}

#[test]
fn server_refresh_does_not_clobber_inflight_toggles() {
    let mut set = OptimisticSet::new();
    set.replace_all([1]);
    let pending = set.begin_toggle(5).expect("toggle");

    set.replace_all([1, 9]);
    assert!(set.contains(&5), "in-flight addition kept");
    assert!(set.contains(&9));

    set.observe(5, false);
    assert!(set.contains(&5));
    set.commit(pending);

    set.observe(5, false);
    assert!(!set.contains(&5));
}

#[test]
fn toggles_from_before_clear_are_ignored() {
    let mut set = OptimisticSet::new();
    set.replace_all([4]);
    let removal = set.begin_toggle(4).expect("toggle");
    let addition = set.begin_toggle(8).expect("toggle");

    set.clear();
    set.replace_all([8]);

    assert!(!set.rollback(removal));
    assert!(!set.contains(&4), "previous owner's membership must not return");
    assert!(!set.commit(addition));
    assert!(set.contains(&8));
    assert!(!set.is_pending(&8));

    let fresh = set.begin_toggle(8).expect("new generation accepts toggles");
    assert!(set.rollback(fresh));
    assert!(set.contains(&8));
}
