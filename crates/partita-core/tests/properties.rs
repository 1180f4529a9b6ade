//! Property-based tests for the document graph.
//!
//! Random edit scripts are replayed through an [`EditController`]; every
//! edit either commits or is rejected as a whole. Checks snapshot round
//! trips, undo/redo involution, pointer integrity after every commit, and
//! closure of dependency walks.

mod common;

use common::*;
use partita_core::{Address, DependencyOptions, EditController, EntityId, Graph, GraphError};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Action {
    AddUnit,
    AddClip(usize),
    SetVolume(usize, f32),
    SetLabel(usize, String),
    Route(usize, usize),
    AddSend(usize, usize),
    DropSend(usize),
    DeleteUnit(usize),
    DeleteClip(usize),
}

fn action() -> impl Strategy<Value = Action> {
    prop_oneof![
        3 => Just(Action::AddUnit),
        3 => any::<usize>().prop_map(Action::AddClip),
        2 => (any::<usize>(), -1.0f32..4.0).prop_map(|(i, v)| Action::SetVolume(i, v)),
        1 => (any::<usize>(), "[a-z]{0,8}").prop_map(|(i, s)| Action::SetLabel(i, s)),
        2 => (any::<usize>(), any::<usize>()).prop_map(|(i, j)| Action::Route(i, j)),
        2 => (any::<usize>(), any::<usize>()).prop_map(|(i, j)| Action::AddSend(i, j)),
        1 => any::<usize>().prop_map(Action::DropSend),
        1 => any::<usize>().prop_map(Action::DeleteUnit),
        1 => any::<usize>().prop_map(Action::DeleteClip),
    ]
}

fn pick(graph: &Graph, class: partita_core::ClassId, index: usize) -> Option<EntityId> {
    let ids: Vec<EntityId> = graph.nodes_of_class(class).map(|n| n.id()).collect();
    if ids.is_empty() {
        None
    } else {
        Some(ids[index % ids.len()])
    }
}

/// Applies `action` as one undoable edit. Returns `false` if it was a no-op.
fn perform(edits: &mut EditController, root: EntityId, action: &Action) -> bool {
    let result: Result<(), GraphError> = match action.clone() {
        Action::AddUnit => edits.modify(|g| add_unit(g, root).map(|_| ())),
        Action::AddClip(i) => match pick(edits.graph(), UNIT, i) {
            Some(unit) => edits.modify(|g| add_clip(g, unit).map(|_| ())),
            None => return false,
        },
        Action::SetVolume(i, v) => match pick(edits.graph(), UNIT, i) {
            Some(unit) => edits.modify(|g| g.set_value(&at(unit, VOLUME), v)),
            None => return false,
        },
        Action::SetLabel(i, s) => match pick(edits.graph(), CLIP, i) {
            Some(clip) => edits.modify(|g| g.set_value(&at(clip, LABEL), s)),
            None => return false,
        },
        Action::Route(i, j) => match (pick(edits.graph(), UNIT, i), pick(edits.graph(), UNIT, j)) {
            (Some(from), Some(to)) => edits.modify(|g| g.set_target(&at(from, OUT), &Address::compose(to))),
            _ => return false,
        },
        Action::AddSend(i, j) => match (pick(edits.graph(), UNIT, i), pick(edits.graph(), UNIT, j)) {
            (Some(from), Some(to)) => edits.modify(|g| {
                let send = g.push_element(&at(from, SENDS))?;
                g.set_target(&send, &Address::compose(to))
            }),
            _ => return false,
        },
        Action::DropSend(i) => match pick(edits.graph(), UNIT, i) {
            Some(unit) => edits.modify(|g| g.pop_element(&at(unit, SENDS)).map(|_| ())),
            None => return false,
        },
        Action::DeleteUnit(i) => match pick(edits.graph(), UNIT, i) {
            Some(unit) => edits.modify(|g| g.delete_node(unit).map(|_| ())),
            None => return false,
        },
        Action::DeleteClip(i) => match pick(edits.graph(), CLIP, i) {
            Some(clip) => edits.modify(|g| g.delete_node(clip).map(|_| ())),
            None => return false,
        },
    };
    result.is_ok()
}

fn start() -> (EditController, EntityId) {
    let mut graph = Graph::new(registry());
    let root = graph.transaction(|g| g.create(ROOT)).unwrap().0;
    (EditController::with_limit(graph, 0), root)
}

/// Every set pointer lands on a hub that accepts its tag and lists it.
fn assert_pointer_integrity(graph: &Graph) -> Result<(), TestCaseError> {
    for node in graph.nodes() {
        for (address, pointer) in node.pointers() {
            match pointer.target() {
                Some(target) => {
                    let hub = graph.hub(target);
                    prop_assert!(hub.is_some(), "{address} points at {target}, which has no hub");
                    let hub = hub.unwrap();
                    prop_assert!(hub.accepts_tag(pointer.rule().tag));
                    prop_assert!(hub.contains(&address));
                    prop_assert!(graph.contains(target.entity()));
                }
                None => prop_assert!(!pointer.is_mandatory(), "{address} is mandatory but unset"),
            }
        }
    }
    prop_assert!(graph.verify().is_ok());
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// Any graph reachable by edits survives a snapshot round trip unchanged.
    #[test]
    fn snapshot_round_trip(actions in prop::collection::vec(action(), 0..40)) {
        let (mut edits, root) = start();
        for a in &actions {
            perform(&mut edits, root, a);
        }
        let graph = edits.graph();
        let bytes = graph.to_binary().unwrap();
        let restored = Graph::from_binary(&bytes, registry()).unwrap();
        prop_assert_eq!(&restored, graph);
        prop_assert_eq!(restored.to_binary().unwrap(), bytes);
    }

    /// Undoing every edit then redoing every edit lands on the same state.
    #[test]
    fn undo_redo_involution(actions in prop::collection::vec(action(), 1..30)) {
        let (mut edits, root) = start();
        let initial = edits.graph().to_binary().unwrap();
        let mut committed = 0usize;
        for a in &actions {
            let before = edits.graph().revision();
            if perform(&mut edits, root, a) && edits.graph().revision() != before {
                committed += 1;
            }
        }
        prop_assert_eq!(edits.undo_depth(), committed);
        let last = edits.graph().to_binary().unwrap();

        for _ in 0..committed {
            prop_assert!(edits.undo().unwrap());
        }
        prop_assert_eq!(edits.graph().to_binary().unwrap(), initial);
        for _ in 0..committed {
            prop_assert!(edits.redo().unwrap());
        }
        prop_assert_eq!(edits.graph().to_binary().unwrap(), last);
    }

    /// After every commit (or rejected edit) all pointers are sound.
    #[test]
    fn pointer_integrity(actions in prop::collection::vec(action(), 0..40)) {
        let (mut edits, root) = start();
        for a in &actions {
            let before = edits.graph().to_binary().unwrap();
            if !perform(&mut edits, root, a) {
                prop_assert_eq!(edits.graph().to_binary().unwrap(), before);
            }
            assert_pointer_integrity(edits.graph())?;
        }
    }

    /// A dependency walk never leaves a pointer into the unvisited rest.
    #[test]
    fn dependency_closure(
        actions in prop::collection::vec(action(), 0..40),
        pick_root in any::<usize>(),
        mandatory_only in any::<bool>(),
    ) {
        let (mut edits, root) = start();
        for a in &actions {
            perform(&mut edits, root, a);
        }
        let graph = edits.graph();
        let Some(start_at) = pick(edits.graph(), UNIT, pick_root) else {
            return Ok(());
        };
        let options = DependencyOptions {
            follow_mandatory_only: mandatory_only,
            ..DependencyOptions::default()
        };
        let deps = graph.dependencies_of(&[start_at], &options).unwrap();
        prop_assert_eq!(deps.order.len(), deps.nodes.len());
        for id in &deps.order {
            for (_, pointer) in graph.node(*id).unwrap().pointers() {
                if mandatory_only && !pointer.is_mandatory() {
                    continue;
                }
                if let Some(target) = pointer.target() {
                    let entity = target.entity();
                    prop_assert!(deps.contains(entity) || deps.boundary.contains(&entity));
                }
            }
        }
    }
}
