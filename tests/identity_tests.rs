use std::collections::HashSet;

use unset_refs::identity::field_key::FieldKey;
use unset_refs::identity::object_id::{
    IdentityError, ObjectId, Resolution, compute_identity, resolve_identity,
};
use unset_refs::scene::document::{BehaviorHandle, NodeHandle, SceneDocument};
use unset_refs::scene::scene_model::{ObjectKind, ObjectLocation, SceneGraph};

use crate::common::{GUID, behavior, key, node, object_id, reference, scene, two_behavior_scene, two_root_scene};

mod common;

fn handle(node: Vec<usize>, index: usize) -> BehaviorHandle {
    BehaviorHandle {
        node: NodeHandle(node),
        index,
    }
}

// =========================================================================
// ObjectId format
// =========================================================================

#[test]
fn object_id_round_trips_its_location() {
    let location = ObjectLocation {
        kind: ObjectKind::Behavior,
        scope_guid: GUID.into(),
        local_id: 4411,
    };
    let id = ObjectId::from_location(&location);

    assert_eq!(id.as_str(), format!("obj:v1:behavior:{GUID}:4411"));
    assert_eq!(id.location(), Some(location));
}

#[test]
fn malformed_ids_have_no_location() {
    for raw in [
        "",
        "garbage",
        "obj:v2:behavior:abc:1",
        "obj:v1:widget:abc:1",
        "obj:v1:behavior::1",
        "obj:v1:behavior:abc:not-a-number",
        "obj:v1:behavior:abc",
    ] {
        assert_eq!(ObjectId::from_raw(raw).location(), None, "{raw:?}");
    }
}

// =========================================================================
// Stability
// =========================================================================

#[test]
fn identity_is_stable_across_save_and_reload() {
    let doc = two_behavior_scene();
    let before = compute_identity(&doc, &handle(vec![0], 1));

    let json = serde_json::to_string(&doc).unwrap();
    let reloaded = SceneDocument::from_json_str(&json).unwrap();
    let after = compute_identity(&reloaded, &handle(vec![0], 1));

    assert_eq!(before, after);
    match resolve_identity(&reloaded, &before).unwrap() {
        Resolution::Live { behavior, .. } => {
            assert_eq!(reloaded.behavior_type(&behavior).name, "DoorLock");
        }
        Resolution::Stale => panic!("expected live behavior after reload"),
    }
}

#[test]
fn different_behaviors_get_different_identities() {
    let doc = two_behavior_scene();
    let a = compute_identity(&doc, &handle(vec![0], 0));
    let b = compute_identity(&doc, &handle(vec![0], 1));
    assert_ne!(a, b);
}

#[test]
fn identity_survives_removal_of_an_earlier_behavior() {
    let mut doc = two_behavior_scene();
    let door_lock = compute_identity(&doc, &handle(vec![0], 1));

    // An index-based identity would now point DoorLock's key at slot 0
    doc.remove_behavior(&handle(vec![0], 0)).unwrap();

    assert_eq!(compute_identity(&doc, &handle(vec![0], 0)), door_lock);
    match resolve_identity(&doc, &door_lock).unwrap() {
        Resolution::Live { behavior, .. } => assert_eq!(behavior, handle(vec![0], 0)),
        Resolution::Stale => panic!("DoorLock should still resolve"),
    }
}

#[test]
fn identity_survives_reparenting() {
    let mut doc = two_root_scene();
    let door_lock = compute_identity(&doc, &handle(vec![1], 0));

    doc.reparent(&NodeHandle(vec![1]), Some(&NodeHandle(vec![0])))
        .unwrap();

    match resolve_identity(&doc, &door_lock).unwrap() {
        Resolution::Live { node, behavior } => {
            assert_eq!(node, NodeHandle(vec![0, 0]));
            assert_eq!(doc.node_path(&node).as_deref(), Some("Player/Door"));
            assert_eq!(compute_identity(&doc, &behavior), door_lock);
        }
        Resolution::Stale => panic!("reparented behavior should resolve"),
    }
}

// =========================================================================
// Resolution failures
// =========================================================================

#[test]
fn deleted_behavior_resolves_stale() {
    let mut doc = two_root_scene();
    let door_lock = compute_identity(&doc, &handle(vec![1], 0));

    doc.remove_node(&NodeHandle(vec![1])).unwrap();

    let resolution = resolve_identity(&doc, &door_lock).unwrap();
    assert!(resolution.is_stale());
}

#[test]
fn unparsable_or_foreign_ids_resolve_stale() {
    let doc = two_behavior_scene();

    assert!(resolve_identity(&doc, &ObjectId::from_raw("2")).unwrap().is_stale());

    let foreign = ObjectId::from_location(&ObjectLocation {
        kind: ObjectKind::Behavior,
        scope_guid: "another-scene".into(),
        local_id: 11,
    });
    assert!(resolve_identity(&doc, &foreign).unwrap().is_stale());
}

#[test]
fn id_naming_a_node_is_an_invariant_violation() {
    let doc = scene(vec![node(
        7,
        "Lonely",
        vec![behavior(70, "DoorLock", vec![reference("key", None)])],
        vec![],
    )]);

    let err = resolve_identity(&doc, &object_id(7)).unwrap_err();
    assert_eq!(
        err,
        IdentityError::NotABehavior {
            id: object_id(7).to_string()
        }
    );
}

// =========================================================================
// FieldKey semantics
// =========================================================================

#[test]
fn field_keys_compare_structurally() {
    let mut set = HashSet::new();
    set.insert(key(11, "target"));

    assert!(set.contains(&FieldKey::new(
        ObjectId::from_raw(object_id(11).as_str()),
        String::from("target")
    )));
    assert!(!set.contains(&key(12, "target")));
    assert!(!set.contains(&key(11, "speed")));

    set.insert(key(11, "target"));
    assert_eq!(set.len(), 1);
}

#[test]
fn field_paths_are_not_normalized() {
    // Same logical element after a list shift is still a different key
    assert_ne!(key(11, "waves[1]"), key(11, "waves[0]"));
    assert_ne!(key(11, "settings.anchor"), key(11, "settings .anchor"));
}
