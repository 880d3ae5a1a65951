use std::cell::RefCell;
use std::rc::Rc;

use super::list::{ListChange, ObservableList};
use super::sync::{CollectionMirror, MapFn, MirrorError};

/// Mirror between integers and their decimal strings.
fn int_string_mirror(
    source: ObservableList<i64>,
    target: ObservableList<String>,
) -> Result<CollectionMirror<i64, String>, MirrorError> {
    let fwd: MapFn<i64, String> = Rc::new(|n: &i64| Ok(n.to_string()));
    let back: MapFn<String, i64> = Rc::new(|s: &String| {
        s.parse::<i64>()
            .map_err(|e| MirrorError::Map(format!("{s:?}: {e}")))
    });
    CollectionMirror::new(source, target, fwd, back)
}

fn assert_mirrored(source: &ObservableList<i64>, target: &ObservableList<String>) {
    let mapped: Vec<String> = source.snapshot().iter().map(ToString::to_string).collect();
    assert_eq!(mapped, target.snapshot());
}

// ----------------------------------------------------------------------------
// ObservableList
// ----------------------------------------------------------------------------

#[test]
fn test_list_insert_clamps_to_append() {
    let list = ObservableList::from_vec(vec![1, 2]);
    list.insert(99, 3);
    assert_eq!(list.snapshot(), vec![1, 2, 3]);
}

#[test]
fn test_list_remove_range_clamped() {
    let list = ObservableList::from_vec(vec![1, 2, 3, 4]);
    list.remove_range(2, 10);
    assert_eq!(list.snapshot(), vec![1, 2]);
    list.remove_range(5, 1); // out of range: ignored
    assert_eq!(list.snapshot(), vec![1, 2]);
}

#[test]
fn test_list_move_item() {
    let list = ObservableList::from_vec(vec!['a', 'b', 'c']);
    list.move_item(0, 2);
    assert_eq!(list.snapshot(), vec!['b', 'c', 'a']);
}

#[test]
fn test_list_subscribe_unsubscribe() {
    let list = ObservableList::new();
    let seen = Rc::new(RefCell::new(Vec::new()));

    let sink = Rc::clone(&seen);
    let id = list.subscribe(move |change: &ListChange<i64>| {
        sink.borrow_mut().push(change.clone());
    });

    list.push(1);
    list.unsubscribe(id);
    list.push(2);

    assert_eq!(
        *seen.borrow(),
        vec![ListChange::Insert {
            index: 0,
            items: vec![1],
        }]
    );
}

// ----------------------------------------------------------------------------
// Mirror: initial synchronization
// ----------------------------------------------------------------------------

#[test]
fn test_initial_sync_repopulates_target_silently() {
    let source = ObservableList::from_vec(vec![1, 2, 3]);
    let target = ObservableList::from_vec(vec!["stale".to_string()]);

    // An observer attached before construction must see no bulk events
    let events = Rc::new(RefCell::new(0usize));
    let sink = Rc::clone(&events);
    target.subscribe(move |_: &ListChange<String>| {
        *sink.borrow_mut() += 1;
    });

    let _mirror = int_string_mirror(source.clone(), target.clone()).unwrap();
    assert_eq!(target.snapshot(), vec!["1", "2", "3"]);
    assert_eq!(*events.borrow(), 0);
}

// ----------------------------------------------------------------------------
// Mirror: propagation both ways
// ----------------------------------------------------------------------------

#[test]
fn test_all_change_kinds_propagate_forward() {
    let source = ObservableList::from_vec(vec![1, 2, 3]);
    let target = ObservableList::new();
    let _mirror = int_string_mirror(source.clone(), target.clone()).unwrap();

    source.insert(1, 10);
    assert_mirrored(&source, &target);

    source.remove_range(0, 2);
    assert_mirrored(&source, &target);

    source.replace(0, 42);
    assert_mirrored(&source, &target);

    source.push(7);
    source.move_item(0, 1);
    assert_mirrored(&source, &target);

    source.reset(vec![5, 6]);
    assert_mirrored(&source, &target);

    source.clear();
    assert_mirrored(&source, &target);
}

#[test]
fn test_propagation_backward() {
    let source = ObservableList::from_vec(vec![1, 2, 3]);
    let target = ObservableList::new();
    let _mirror = int_string_mirror(source.clone(), target.clone()).unwrap();

    target.push("4".to_string());
    assert_eq!(source.snapshot(), vec![1, 2, 3, 4]);

    target.remove(0);
    assert_eq!(source.snapshot(), vec![2, 3, 4]);

    target.replace(1, "30".to_string());
    assert_eq!(source.snapshot(), vec![2, 30, 4]);

    target.move_item(2, 0);
    assert_eq!(source.snapshot(), vec![4, 2, 30]);
}

#[test]
fn test_no_ping_pong() {
    let source = ObservableList::from_vec(vec![1]);
    let target = ObservableList::new();
    let _mirror = int_string_mirror(source.clone(), target.clone()).unwrap();

    // Count every change on both sides after construction
    let source_events = Rc::new(RefCell::new(0usize));
    let target_events = Rc::new(RefCell::new(0usize));
    let s_sink = Rc::clone(&source_events);
    let t_sink = Rc::clone(&target_events);
    source.subscribe(move |_: &ListChange<i64>| *s_sink.borrow_mut() += 1);
    target.subscribe(move |_: &ListChange<String>| *t_sink.borrow_mut() += 1);

    source.push(2);

    // One external mutation on the source, exactly one propagated
    // mutation on the target, and no echo back
    assert_eq!(*source_events.borrow(), 1);
    assert_eq!(*target_events.borrow(), 1);
    assert_mirrored(&source, &target);
}

#[test]
fn test_move_propagates_as_remove_then_insert() {
    let source = ObservableList::from_vec(vec![1, 2, 3]);
    let target = ObservableList::new();
    let _mirror = int_string_mirror(source.clone(), target.clone()).unwrap();

    let kinds = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&kinds);
    target.subscribe(move |change: &ListChange<String>| {
        sink.borrow_mut().push(match change {
            ListChange::Insert { .. } => "insert",
            ListChange::Remove { .. } => "remove",
            ListChange::Replace { .. } => "replace",
            ListChange::Move { .. } => "move",
            ListChange::Reset => "reset",
        });
    });

    source.move_item(0, 2);
    assert_eq!(*kinds.borrow(), vec!["remove", "insert"]);
    assert_mirrored(&source, &target);
}

// ----------------------------------------------------------------------------
// Mirror: mapping failure (both-reject) and disposal
// ----------------------------------------------------------------------------

#[test]
fn test_invalid_mapping_rejects_on_both_sides() {
    let source = ObservableList::from_vec(vec![1, 2, 3]);
    let target = ObservableList::new();
    let mirror = int_string_mirror(source.clone(), target.clone()).unwrap();

    let errors = Rc::new(RefCell::new(0usize));
    let sink = Rc::clone(&errors);
    mirror.on_error(move |_| *sink.borrow_mut() += 1);

    // "2.5" does not parse as an integer: the insert must not leave
    // the two sides desynchronized
    target.insert(2, "2.5".to_string());

    assert_eq!(source.snapshot(), vec![1, 2, 3]);
    assert_eq!(target.snapshot(), vec!["1", "2", "3"]);
    assert_eq!(*errors.borrow(), 1);

    // The mirror still works afterwards
    target.push("4".to_string());
    assert_eq!(source.snapshot(), vec![1, 2, 3, 4]);
}

#[test]
fn test_invalid_replace_restored() {
    let source = ObservableList::from_vec(vec![1, 2, 3]);
    let target = ObservableList::new();
    let _mirror = int_string_mirror(source.clone(), target.clone()).unwrap();

    target.replace(1, "not-a-number".to_string());

    assert_eq!(source.snapshot(), vec![1, 2, 3]);
    assert_eq!(target.snapshot(), vec!["1", "2", "3"]);
}

#[test]
fn test_dispose_detaches_both_sides() {
    let source = ObservableList::from_vec(vec![1]);
    let target = ObservableList::new();
    let mirror = int_string_mirror(source.clone(), target.clone()).unwrap();

    mirror.dispose();
    source.push(2);
    target.push("99".to_string());

    assert_eq!(source.snapshot(), vec![1, 2]);
    assert_eq!(target.snapshot(), vec!["1", "99"]);
}

#[test]
fn test_drop_detaches() {
    let source = ObservableList::from_vec(vec![1]);
    let target = ObservableList::new();
    {
        let _mirror = CollectionMirror::identity(source.clone(), target.clone());
        source.push(2);
        assert_eq!(target.snapshot(), vec![1, 2]);
    }
    source.push(3);
    assert_eq!(target.snapshot(), vec![1, 2]);
}
