//! Integration tests for partita-core.
//!
//! Drives the public API the way an editor would: building a small studio
//! graph, deleting under each pointer policy, round-tripping snapshots,
//! moving presets between graphs, and undoing multi-step edits.

mod common;

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use common::*;
use partita_core::{
    Address, DependencyOptions, EditController, FieldChange, Graph, GraphError, GraphEvent, IntegrityError,
    StateError, export_subgraph, import_subgraph,
};

// ============================================================================
// 1. Pointer targets and deletion policies
// ============================================================================

#[test]
fn mandatory_pointer_guards_deletion_until_released() {
    let Studio { mut graph, units, .. } = studio();
    let [a, b] = units;
    let meter = graph
        .transaction(|g| {
            let meter = g.create(METER)?;
            g.set_target(&at(meter, WATCHES), &Address::compose(b))?;
            Ok(meter)
        })
        .unwrap()
        .0;
    assert_eq!(graph.incoming(&Address::compose(b)).len(), 2);

    let before = graph.to_binary().unwrap();
    let err = graph.transaction(|g| g.delete_node(b)).unwrap_err();
    assert_eq!(
        err,
        GraphError::Integrity(IntegrityError::DeletionRejected {
            target: b,
            pointer: at(meter, WATCHES),
        })
    );
    assert_eq!(graph.to_binary().unwrap(), before);

    // Releasing alone is not enough: the meter would be left without a target.
    let err = graph.transaction(|g| g.clear_pointer(&at(meter, WATCHES))).unwrap_err();
    assert!(matches!(err, GraphError::Integrity(IntegrityError::MandatoryUnset(_))));

    graph
        .transaction(|g| {
            g.clear_pointer(&at(meter, WATCHES))?;
            g.delete_node(b)?;
            g.set_target(&at(meter, WATCHES), &Address::compose(a))
        })
        .unwrap();
    assert!(!graph.contains(b));
    assert_eq!(graph.target(&at(a, OUT)), None);
    assert_eq!(graph.incoming(&Address::compose(a)), vec![at(meter, WATCHES)]);
    assert!(graph.verify().is_ok());
}

#[test]
fn deleting_root_cascades_but_keeps_resources() {
    let Studio {
        mut graph,
        root,
        clip,
        sample,
        ..
    } = studio();
    let (removed, _) = graph.transaction(|g| g.delete_node(root)).unwrap();
    assert_eq!(removed.len(), 4);
    assert_eq!(removed[0], root);
    assert!(removed.contains(&clip));
    assert_eq!(graph.len(), 1);
    assert!(graph.contains(sample));
    assert!(graph.incoming_to_node(sample).is_empty());
    assert!(graph.verify().is_ok());
}

#[test]
fn tag_mismatch_is_rejected_without_side_effects() {
    let Studio { mut graph, units, clip, .. } = studio();
    let before = graph.to_binary().unwrap();
    // A unit output cannot point at a clip lane.
    let err = graph
        .transaction(|g| g.set_target(&at(units[0], OUT), &at(units[1], CLIPS)))
        .unwrap_err();
    assert!(matches!(err, GraphError::Integrity(IntegrityError::TagRejected { .. })));
    // Nothing accepts pointers at a plain value.
    let err = graph
        .transaction(|g| g.set_target(&at(clip, SAMPLE_REF), &at(clip, GAIN)))
        .unwrap_err();
    assert!(matches!(err, GraphError::Integrity(IntegrityError::NotATarget { .. })));
    assert_eq!(graph.to_binary().unwrap(), before);
}

#[test]
fn array_pointers_are_cleared_with_their_target() {
    let Studio { mut graph, units, .. } = studio();
    let [a, b] = units;
    let send = graph
        .transaction(|g| {
            let send = g.push_element(&at(a, SENDS))?;
            g.set_target(&send, &Address::compose(b))?;
            Ok(send)
        })
        .unwrap()
        .0;
    assert_eq!(send, at(a, SENDS).append(0));
    assert_eq!(graph.incoming(&Address::compose(b)).len(), 2);

    graph.transaction(|g| g.delete_node(b)).unwrap();
    assert_eq!(graph.target(&send), None);
    assert!(graph.verify().is_ok());
}

#[test]
fn mutation_outside_transaction_is_a_state_error() {
    let Studio { mut graph, clip, .. } = studio();
    assert_eq!(
        graph.set_value(&at(clip, GAIN), 0.5f32),
        Err(GraphError::State(StateError::NoTransaction))
    );
    graph.begin_transaction().unwrap();
    assert_eq!(graph.begin_transaction(), Err(StateError::NestedTransaction));
    graph.abort_transaction().unwrap();
}

// ============================================================================
// 2. Snapshots
// ============================================================================

#[test]
fn snapshot_round_trip_preserves_everything() {
    let Studio {
        mut graph, units, clip, ..
    } = studio();
    graph
        .transaction(|g| {
            let send = g.push_element(&at(units[0], SENDS))?;
            g.set_target(&send, &Address::compose(units[1]))?;
            g.set_value(&at(clip, POSITION), i64::MIN)?;
            g.set_value(&at(clip, GAIN), -0.0f32)
        })
        .unwrap();

    let bytes = graph.to_binary().unwrap();
    let restored = Graph::from_binary(&bytes, registry()).unwrap();
    assert_eq!(restored, graph);
    assert_eq!(restored.incoming(&Address::compose(units[1])), graph.incoming(&Address::compose(units[1])));
    assert_eq!(restored.to_binary().unwrap(), bytes);
    assert!(restored.verify().is_ok());
}

// ============================================================================
// 3. Presets
// ============================================================================

#[test]
fn preset_moves_a_unit_between_projects() {
    let source = studio();
    let [a, b] = source.units;

    // Following everything pulls in the sibling unit and stops at the sample.
    let wide = DependencyOptions::default().excluding(|n| n.class() == ROOT);
    let deps = source.graph.dependencies_of(&[a], &wide).unwrap();
    assert_eq!(deps.order, vec![a, b, source.clip]);
    assert!(deps.boundary.contains(&source.root));
    assert!(deps.boundary.contains(&source.sample));

    // A preset only takes what the unit cannot live without, plus what it owns.
    let options = DependencyOptions {
        follow_mandatory_only: true,
        ..DependencyOptions::default()
    }
    .excluding(|n| n.class() == ROOT);
    let deps = source.graph.dependencies_of(&[a], &options).unwrap();
    assert_eq!(deps.order, vec![a, source.clip]);
    assert_eq!(deps.boundary.iter().copied().collect::<Vec<_>>(), vec![source.root]);

    let (table, bytes) = export_subgraph(&source.graph, &[a], &options).unwrap();
    assert_eq!(table.len(), 2);

    let mut dest = Graph::new(registry());
    let dest_root = dest.transaction(|g| g.create(ROOT)).unwrap().0;
    let bindings = BTreeMap::from([(source.root, dest_root)]);
    dest.begin_transaction().unwrap();
    let imported = import_subgraph(&mut dest, &bytes, &bindings).unwrap();
    dest.end_transaction().unwrap();

    let new_unit = imported.get(table.get(a).unwrap()).unwrap();
    let new_clip = imported.get(table.get(source.clip).unwrap()).unwrap();
    assert_eq!(dest.len(), 3);
    assert_eq!(dest.target(&at(new_unit, HOSTED_BY)), Some(&at(dest_root, UNITS)));
    assert_eq!(dest.target(&at(new_clip, LANE_OF)), Some(&at(new_unit, CLIPS)));
    // Sample and sibling unit do not exist here: optional pointers are dropped.
    assert_eq!(dest.target(&at(new_clip, SAMPLE_REF)), None);
    assert_eq!(dest.target(&at(new_unit, OUT)), None);
    assert_eq!(
        dest.value(&at(new_clip, LABEL)).and_then(|v| v.as_str()),
        Some("kick")
    );
    assert!(dest.verify().is_ok());
}

// ============================================================================
// 4. Observers
// ============================================================================

#[test]
fn observers_see_only_their_scope_after_commit() {
    let Studio { mut graph, units, clip, .. } = studio();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let deleted = Rc::new(RefCell::new(Vec::new()));
    let _volume = graph.subscribe(at(units[1], VOLUME), {
        let seen = Rc::clone(&seen);
        move |e| seen.borrow_mut().push(e.clone())
    });
    let _clip = graph.subscribe_deletion(clip, {
        let deleted = Rc::clone(&deleted);
        move |e| deleted.borrow_mut().push(e.clone())
    });

    graph
        .transaction(|g| {
            g.set_value(&at(units[0], VOLUME), 0.25f32)?;
            g.set_value(&at(units[1], VOLUME), 0.5f32)
        })
        .unwrap();
    assert_eq!(
        *seen.borrow(),
        vec![GraphEvent::FieldChanged {
            address: at(units[1], VOLUME),
            change: FieldChange::Value {
                old: 1.0f32.into(),
                new: 0.5f32.into(),
            },
        }]
    );

    graph.transaction(|g| g.delete_node(units[0])).unwrap();
    assert_eq!(*deleted.borrow(), vec![GraphEvent::Deleted(clip)]);
    assert_eq!(seen.borrow().len(), 1);
}

// ============================================================================
// 5. Editing
// ============================================================================

#[test]
fn undo_everything_returns_to_the_start() {
    let Studio { graph, root, units, .. } = studio();
    let start = graph.to_binary().unwrap();
    let mut edits = EditController::new(graph);

    let third = edits
        .modify(|g| {
            let unit = add_unit(g, root)?;
            add_clip(g, unit)?;
            Ok(unit)
        })
        .unwrap();
    edits
        .modify(|g| g.set_target(&at(units[1], OUT), &Address::compose(third)))
        .unwrap();
    edits.modify(|g| g.delete_node(units[0]).map(|_| ())).unwrap();
    edits
        .modify(|g| g.set_value(&at(root, NAME), "mixdown"))
        .unwrap();
    let end = edits.graph().to_binary().unwrap();

    while edits.undo().unwrap() {}
    assert_eq!(edits.graph().to_binary().unwrap(), start);
    while edits.redo().unwrap() {}
    assert_eq!(edits.graph().to_binary().unwrap(), end);
    assert!(edits.graph().verify().is_ok());
}
