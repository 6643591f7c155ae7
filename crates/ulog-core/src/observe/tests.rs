use std::cell::RefCell;
use std::rc::Rc;

use super::*;

fn setup() -> (Rc<ManualScheduler>, Notifier) {
    let scheduler = Rc::new(ManualScheduler::new());
    let notifier = Notifier::new(scheduler.clone());
    (scheduler, notifier)
}

/// Collects every change delivered to it
fn recorder() -> (Rc<RefCell<Vec<Change>>>, impl Fn(&Change) + 'static) {
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = log.clone();
    (log, move |change: &Change| sink.borrow_mut().push(change.clone()))
}

#[test]
fn test_notification_is_deferred_to_next_turn() {
    let (scheduler, notifier) = setup();
    let target = notifier.record();
    let (log, cb) = recorder();
    notifier.observe(&target, "name", cb);

    target.set("name", "first");
    assert!(log.borrow().is_empty());
    assert!(notifier.has_pending());

    scheduler.run_until_stalled();
    assert_eq!(log.borrow().len(), 1);
    assert_eq!(log.borrow()[0].value, Value::from("first"));
    assert_eq!(log.borrow()[0].old, Value::Null);
    assert!(log.borrow()[0].is_replaced());
}

#[test]
fn test_burst_coalesces_to_final_value_and_original_old() {
    let (scheduler, notifier) = setup();
    let target = notifier.record();
    notifier.set_silently(&target, "count", 0.0);
    let (log, cb) = recorder();
    notifier.observe(&target, "count", cb);

    for i in 1..=5 {
        target.set("count", i as f64);
    }
    scheduler.run_until_stalled();

    let log = log.borrow();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].value, Value::Number(5.0));
    assert_eq!(log[0].old, Value::Number(0.0));
}

#[test]
fn test_burst_returning_to_start_still_notifies_once() {
    let (scheduler, notifier) = setup();
    let target = notifier.record();
    notifier.set_silently(&target, "flag", false);
    let (log, cb) = recorder();
    notifier.observe(&target, "flag", cb);

    target.set("flag", true);
    target.set("flag", false);
    scheduler.run_until_stalled();

    let log = log.borrow();
    assert_eq!(log.len(), 1);
    assert!(log[0].is_replaced());
    assert_eq!(log[0].value, Value::Bool(false));
    assert_eq!(log[0].old, Value::Bool(false));
}

#[test]
fn test_setting_equal_value_is_noop() {
    let (scheduler, notifier) = setup();
    let target = notifier.record();
    notifier.set_silently(&target, "name", "same");
    let (log, cb) = recorder();
    notifier.observe(&target, "name", cb);

    target.set("name", "same");
    assert!(!notifier.has_pending());
    scheduler.run_until_stalled();
    assert!(log.borrow().is_empty());
}

#[test]
fn test_set_silently_never_notifies() {
    let (scheduler, notifier) = setup();
    let target = notifier.record();
    let (log1, cb1) = recorder();
    let (log2, cb2) = recorder();
    notifier.observe(&target, "track", cb1);
    notifier.observe_nested(&target, "track", cb2);
    notifier.observe(&target, WILDCARD, |_| panic!("wildcard must stay silent"));

    notifier.set_silently(&target, "track", "silent");
    scheduler.run_until_stalled();

    assert!(log1.borrow().is_empty());
    assert!(log2.borrow().is_empty());
    assert_eq!(target.get("track"), Value::from("silent"));
}

#[test]
fn test_set_silently_drops_pending_notification() {
    let (scheduler, notifier) = setup();
    let target = notifier.record();
    let (log, cb) = recorder();
    notifier.observe(&target, "name", cb);

    target.set("name", "loud");
    notifier.set_silently(&target, "name", "baseline");
    scheduler.run_until_stalled();

    assert!(log.borrow().is_empty());
}

#[test]
fn test_unobserve_all_removes_every_registration() {
    let (scheduler, notifier) = setup();
    let target = notifier.record();
    let (log, cb) = recorder();
    notifier.observe(&target, "a", cb);
    notifier.observe(&target, "b", |_| panic!("removed"));
    notifier.observe_nested(&target, WILDCARD, |_| panic!("removed"));
    assert_eq!(notifier.observer_count(&target), 3);

    notifier.unobserve_all(&target);
    assert_eq!(notifier.observer_count(&target), 0);

    target.set("a", 1.0);
    target.set("b", 2.0);
    scheduler.run_until_stalled();
    assert!(log.borrow().is_empty());

    // Idempotent, and fine on targets nobody observes
    notifier.unobserve_all(&target);
    notifier.unobserve_all(&notifier.record());
}

#[test]
fn test_unobserve_all_silences_already_pending_changes() {
    let (scheduler, notifier) = setup();
    let target = notifier.record();
    notifier.observe(&target, "a", |_| panic!("must not fire after unobserve_all"));

    target.set("a", 1.0);
    notifier.unobserve_all(&target);
    scheduler.run_until_stalled();
}

#[test]
fn test_unobserve_single_registration() {
    let (scheduler, notifier) = setup();
    let target = notifier.record();
    let (log, cb) = recorder();
    let id = notifier.observe(&target, "a", |_| panic!("removed"));
    notifier.observe(&target, "a", cb);

    assert!(notifier.unobserve(id));
    assert!(!notifier.unobserve(id));

    target.set("a", 1.0);
    scheduler.run_until_stalled();
    assert_eq!(log.borrow().len(), 1);
}

#[test]
fn test_duplicate_registrations_each_fire_in_order() {
    let (scheduler, notifier) = setup();
    let target = notifier.record();
    let order = Rc::new(RefCell::new(Vec::new()));
    for n in 0..3 {
        let order = order.clone();
        notifier.observe(&target, "x", move |_| order.borrow_mut().push(n));
    }

    target.set("x", true);
    scheduler.run_until_stalled();

    assert_eq!(*order.borrow(), vec![0, 1, 2]);
}

#[test]
fn test_wildcard_reports_actual_property() {
    let (scheduler, notifier) = setup();
    let target = notifier.record();
    let (log, cb) = recorder();
    notifier.observe(&target, WILDCARD, cb);

    target.set("first", 1.0);
    target.set("second", 2.0);
    scheduler.run_until_stalled();

    let names: Vec<_> = log.borrow().iter().map(|c| c.property.clone()).collect();
    assert_eq!(names, vec!["first", "second"]);
}

#[test]
fn test_append_to_held_list_notifies_containing_property() {
    let (scheduler, notifier) = setup();
    let target = notifier.record();
    let list = notifier.list();
    notifier.set_silently(&target, "items", list.clone());
    let (log, cb) = recorder();
    notifier.observe(&target, "items", cb);

    list.push(1.0);
    list.push(2.0);
    scheduler.run_until_stalled();

    let log = log.borrow();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].property, "items");
    assert_eq!(log[0].kind, ChangeKind::Appended(2));
    assert!(log[0].is_append());
    assert_eq!(log[0].value, Value::List(list.clone()));
}

#[test]
fn test_nested_append_requires_subproperties() {
    let (scheduler, notifier) = setup();
    let state = notifier.record();
    let track = notifier.record();
    let positions = notifier.list();
    track.set("positions", positions.clone());
    notifier.set_silently(&state, "track", track.clone());

    let (shallow, cb) = recorder();
    notifier.observe(&state, "track", cb);
    let (deep, cb) = recorder();
    notifier.observe_nested(&state, "track", cb);

    positions.push(Value::data((1.0_f64, 2.0_f64)));
    scheduler.run_until_stalled();

    assert!(shallow.borrow().is_empty());
    let deep = deep.borrow();
    assert_eq!(deep.len(), 1);
    assert_eq!(deep[0].property, "track");
    assert_eq!(deep[0].kind, ChangeKind::Appended(1));
    assert_eq!(deep[0].value, Value::Record(track.clone()));
}

#[test]
fn test_nested_record_write_is_update() {
    let (scheduler, notifier) = setup();
    let state = notifier.record();
    let track = notifier.record();
    notifier.set_silently(&state, "track", track.clone());
    let (log, cb) = recorder();
    notifier.observe_nested(&state, "track", cb);

    track.set("name", "renamed");
    scheduler.run_until_stalled();

    let log = log.borrow();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].kind, ChangeKind::Updated);
}

#[test]
fn test_replacement_absorbs_appends_in_same_turn() {
    let (scheduler, notifier) = setup();
    let state = notifier.record();
    let old_list = notifier.list();
    notifier.set_silently(&state, "items", old_list.clone());
    let (log, cb) = recorder();
    notifier.observe_nested(&state, "items", cb);

    let new_list = notifier.list();
    state.set("items", new_list.clone());
    new_list.push(1.0);
    scheduler.run_until_stalled();

    let log = log.borrow();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].kind, ChangeKind::Replaced);
    assert_eq!(log[0].old, Value::List(old_list));
    assert_eq!(log[0].value, Value::List(new_list));
}

#[test]
fn test_replaced_container_stops_reporting() {
    let (scheduler, notifier) = setup();
    let state = notifier.record();
    let first = notifier.list();
    notifier.set_silently(&state, "items", first.clone());
    notifier.set_silently(&state, "items", notifier.list());
    let (log, cb) = recorder();
    notifier.observe_nested(&state, "items", cb);

    first.push(1.0);
    scheduler.run_until_stalled();

    assert!(log.borrow().is_empty());
}

#[test]
fn test_rewrapping_container_does_not_double_report() {
    let (scheduler, notifier) = setup();
    let state = notifier.record();
    let list = notifier.list();
    let alias = list.clone();
    notifier.set_silently(&state, "items", list.clone());
    // Storing the same observed list again must not add a second link
    notifier.set_silently(&state, "items", alias.clone());
    assert!(alias.ptr_eq(&list));

    let (log, cb) = recorder();
    notifier.observe(&state, "items", cb);
    alias.push(1.0);
    scheduler.run_until_stalled();

    let log = log.borrow();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].kind, ChangeKind::Appended(1));
}

#[test]
fn test_extend_is_one_change() {
    let (scheduler, notifier) = setup();
    let state = notifier.record();
    let list = notifier.list();
    notifier.set_silently(&state, "items", list.clone());
    let (log, cb) = recorder();
    notifier.observe(&state, "items", cb);

    list.extend(vec![Value::from(1.0), Value::from(2.0), Value::from(3.0)]);
    scheduler.run_until_stalled();

    assert_eq!(log.borrow()[0].kind, ChangeKind::Appended(3));
    assert_eq!(list.len(), 3);
}

#[test]
fn test_callback_mutation_is_delivered_next_turn() {
    let (scheduler, notifier) = setup();
    let target = notifier.record();
    let echo = target.clone();
    notifier.observe(&target, "input", move |change| {
        echo.set("output", change.value.clone());
    });
    let (log, cb) = recorder();
    notifier.observe(&target, "output", cb);

    target.set("input", "ping");
    notifier.flush();
    assert!(log.borrow().is_empty());
    assert!(notifier.has_pending());

    scheduler.run_until_stalled();
    assert_eq!(log.borrow().len(), 1);
    assert_eq!(log.borrow()[0].value, Value::from("ping"));
}

#[test]
fn test_manual_flush_delivers_synchronously() {
    let (_scheduler, notifier) = setup();
    let target = notifier.record();
    let (log, cb) = recorder();
    notifier.observe(&target, "x", cb);

    target.set("x", 1.0);
    notifier.flush();

    assert_eq!(log.borrow().len(), 1);
    assert!(!notifier.has_pending());
}

#[test]
fn test_unobserved_mutations_schedule_nothing() {
    let (_scheduler, notifier) = setup();
    let target = notifier.record();
    target.set("x", 1.0);
    assert!(!notifier.has_pending());
}

#[test]
fn test_value_data_downcast() {
    let value = Value::data([1.0_f64, 2.0, 3.0, 4.0]);
    let bounds = value.downcast::<[f64; 4]>().unwrap();
    assert_eq!(*bounds, [1.0, 2.0, 3.0, 4.0]);
    assert!(value.downcast::<String>().is_none());
    assert_eq!(value, value.clone());
    assert_ne!(value, Value::data([1.0_f64, 2.0, 3.0, 4.0]));
}

#[tokio::test]
async fn test_local_scheduler_delivers_on_next_turn() {
    let local = tokio::task::LocalSet::new();
    local
        .run_until(async {
            let notifier = Notifier::new(Rc::new(LocalScheduler));
            let target = notifier.record();
            let (log, cb) = recorder();
            notifier.observe(&target, "x", cb);

            target.set("x", 1.0);
            target.set("x", 2.0);
            assert!(log.borrow().is_empty());

            tokio::task::yield_now().await;
            let log = log.borrow();
            assert_eq!(log.len(), 1);
            assert_eq!(log[0].value, Value::Number(2.0));
        })
        .await;
}
