use unset_refs::filter::category::{CategoryFilter, CategorySettings, USER_SCRIPTS};
use unset_refs::scene::document::{FieldValue, NodeHandle, SceneDocument};
use unset_refs::scene::scene_model::{ObjectRef, SceneGraph};
use unset_refs::session::error::SessionError;
use unset_refs::session::session::{AckMode, Session};
use unset_refs::store::kv_store::MemoryStore;

use crate::common::{behavior, key, node, reference, scene, two_behavior_scene, two_root_scene};

mod common;

type TestSession = Session<SceneDocument, MemoryStore, CategorySettings>;

fn open(doc: &SceneDocument) -> TestSession {
    Session::open(doc, MemoryStore::new(), CategorySettings::default()).unwrap()
}

fn visible_keys(session: &mut TestSession, doc: &SceneDocument) -> Vec<String> {
    session
        .current_candidates(doc)
        .unwrap()
        .iter()
        .map(|c| c.key.to_string())
        .collect()
}

// =========================================================================
// Scenarios
// =========================================================================

#[test]
fn acknowledge_one_then_reset_restores_both() {
    let doc = two_behavior_scene();
    let mut session = open(&doc);

    assert_eq!(session.current_candidates(&doc).unwrap().len(), 2);

    session.acknowledge(&key(11, "target")).unwrap();
    assert_eq!(
        visible_keys(&mut session, &doc),
        vec![key(12, "key").to_string()]
    );

    session.reset_all().unwrap();
    assert_eq!(session.current_candidates(&doc).unwrap().len(), 2);
    assert_eq!(session.store().record_count(), 0);
}

#[test]
fn acknowledged_field_stays_hidden_after_set_and_unset() {
    let mut doc = two_behavior_scene();
    let mut session = open(&doc);
    let target = key(11, "target");

    session.acknowledge(&target).unwrap();

    assert!(session
        .assign(&mut doc, &target, Some(ObjectRef("main_camera".into())))
        .unwrap());
    session.rescan(&doc);
    assert!(session.assign(&mut doc, &target, None).unwrap());
    session.rescan(&doc);

    assert_eq!(
        visible_keys(&mut session, &doc),
        vec![key(12, "key").to_string()]
    );

    // and after a reload from the same store
    let (store, settings) = session.into_parts();
    let mut reopened = Session::open(&doc, store, settings).unwrap();
    assert_eq!(
        visible_keys(&mut reopened, &doc),
        vec![key(12, "key").to_string()]
    );
}

#[test]
fn deleted_node_is_dropped_after_reload_without_error() {
    let mut doc = two_root_scene();
    let mut session = open(&doc);
    let door_key = key(21, "key");

    session.acknowledge(&door_key).unwrap();

    doc.remove_node(&NodeHandle(vec![1])).unwrap();
    session.on_tree_reloaded(&doc).unwrap();

    assert_eq!(
        visible_keys(&mut session, &doc),
        vec![key(11, "target").to_string()]
    );
    assert!(!session.is_acknowledged(&door_key));

    // The store keeps the stale record
    assert_eq!(session.store().record_count(), 1);
}

// =========================================================================
// Acknowledge semantics
// =========================================================================

#[test]
fn acknowledging_twice_is_idempotent_for_visibility() {
    let doc = two_behavior_scene();
    let mut session = open(&doc);

    assert!(session.acknowledge(&key(11, "target")).unwrap());
    assert!(!session.acknowledge(&key(11, "target")).unwrap());

    assert_eq!(session.acknowledged().len(), 1);
    assert_eq!(session.store().record_count(), 2);
    assert_eq!(session.current_candidates(&doc).unwrap().len(), 1);
}

#[test]
fn acknowledge_all_matching_respects_mode() {
    let mut doc = two_behavior_scene();
    let mut session = open(&doc);

    session
        .assign(&mut doc, &key(11, "target"), Some(ObjectRef("cam".into())))
        .unwrap();

    // The filled-in field is still listed until acknowledged
    assert_eq!(session.current_candidates(&doc).unwrap().len(), 2);

    let set_keys = session.acknowledge_all_matching(&doc, AckMode::Set).unwrap();
    assert_eq!(set_keys, vec![key(11, "target")]);

    let unset_keys = session
        .acknowledge_all_matching(&doc, AckMode::Unset)
        .unwrap();
    assert_eq!(unset_keys, vec![key(12, "key")]);

    assert!(!session.has_pending(&doc).unwrap());
}

#[test]
fn acknowledge_all_takes_every_visible_candidate() {
    let doc = two_behavior_scene();
    let mut session = open(&doc);

    let keys = session.acknowledge_all_matching(&doc, AckMode::All).unwrap();

    assert_eq!(keys.len(), 2);
    assert!(session.current_candidates(&doc).unwrap().is_empty());
}

#[test]
fn ack_mode_parses_user_input() {
    assert_eq!("unset".parse::<AckMode>().unwrap(), AckMode::Unset);
    assert_eq!("None".parse::<AckMode>().unwrap(), AckMode::Unset);
    assert_eq!("attached".parse::<AckMode>().unwrap(), AckMode::Set);
    assert_eq!("ALL".parse::<AckMode>().unwrap(), AckMode::All);
    assert!("some".parse::<AckMode>().is_err());
}

// =========================================================================
// Category filter composition
// =========================================================================

fn camera_scene() -> SceneDocument {
    scene(vec![node(
        1,
        "Main Camera",
        vec![
            behavior(11, "Camera", vec![reference("targetTexture", None)]),
            behavior(12, "CameraRig", vec![reference("target", None)]),
        ],
        vec![],
    )])
}

#[test]
fn switched_off_category_is_never_shown() {
    let doc = camera_scene();
    let mut session = open(&doc);

    // Built-in categories default to off
    assert_eq!(
        visible_keys(&mut session, &doc),
        vec![key(12, "target").to_string()]
    );

    session.filter_mut().set("Camera", true);
    assert_eq!(session.current_candidates(&doc).unwrap().len(), 2);

    session.filter_mut().set(USER_SCRIPTS, false);
    assert_eq!(
        visible_keys(&mut session, &doc),
        vec![key(11, "targetTexture").to_string()]
    );

    session.filter_mut().set("Camera", false);
    session.reset_all().unwrap();
    assert!(session.current_candidates(&doc).unwrap().is_empty());
}

#[test]
fn filter_does_not_change_what_gets_acknowledged() {
    let doc = camera_scene();
    let mut session = open(&doc);

    session.acknowledge(&key(11, "targetTexture")).unwrap();
    assert!(session.is_acknowledged(&key(11, "targetTexture")));

    session.filter_mut().set("Camera", true);
    assert_eq!(
        visible_keys(&mut session, &doc),
        vec![key(12, "target").to_string()]
    );
}

#[test]
fn opening_registers_categories_of_declared_types() {
    let doc = camera_scene();
    let session = open(&doc);

    let categories = session.filter().all_categories();
    assert!(categories.contains("Camera"));
    assert!(categories.contains("Text"));
    assert!(categories.contains(USER_SCRIPTS));
    assert!(!categories.contains("Transform"));
    assert!(!categories.contains("CameraRig"));
}

// =========================================================================
// Reload and reconciliation
// =========================================================================

#[test]
fn reload_swaps_in_a_fresh_candidate_list() {
    let doc = two_behavior_scene();
    let mut session = open(&doc);
    assert_eq!(session.all_candidates().len(), 2);

    let other = two_root_scene();
    let outcome = session.on_tree_reloaded(&other).unwrap();

    assert_eq!(outcome.new_candidates, 2);
    assert_eq!(
        visible_keys(&mut session, &other),
        vec![key(11, "target").to_string(), key(21, "key").to_string()]
    );
    assert_eq!(session.last_outcome(), &outcome);
}

#[test]
fn candidates_follow_their_behavior_after_edits() {
    let mut doc = two_behavior_scene();
    let mut session = open(&doc);

    // Removing CameraRig shifts DoorLock to slot 0 in the same tree instance
    let rig = doc.behaviors(&NodeHandle(vec![0]))[0].clone().unwrap();
    doc.remove_behavior(&rig).unwrap();

    let visible = session.current_candidates(&doc).unwrap();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].key, key(12, "key"));
    assert_eq!(visible[0].behavior.index, 0);
    assert!(visible[0].is_unset(&doc));
}

#[test]
fn field_that_stops_holding_a_reference_is_dropped() {
    let mut doc = two_behavior_scene();
    let mut session = open(&doc);

    // CameraRig.target turned into an integer after a script edit
    let rig = doc.node_mut(&NodeHandle(vec![0])).unwrap();
    rig.behaviors[0].fields[0].value = FieldValue::Integer { value: 0 };

    let report = session.reconcile(&doc).unwrap();
    assert_eq!(report.stale_candidates, 1);

    let keys = session
        .acknowledge_all_matching(&doc, AckMode::Unset)
        .unwrap();
    assert_eq!(keys, vec![key(12, "key")]);
}

#[test]
fn stale_acknowledgments_leave_memory_but_not_the_store() {
    let doc = two_behavior_scene();
    let mut session = open(&doc);

    session.acknowledge(&key(99, "gone")).unwrap();
    let report = session.reconcile(&doc).unwrap();

    assert_eq!(report.stale_acknowledgments, 1);
    assert_eq!(report.stale_candidates, 0);
    assert!(!session.is_acknowledged(&key(99, "gone")));
    assert_eq!(session.store().record_count(), 1);
}

#[test]
fn acknowledgment_naming_a_node_is_fatal() {
    let doc = two_behavior_scene();
    let mut session = open(&doc);

    // local id 1 is the Player node, not a behavior
    session.acknowledge(&key(1, "target")).unwrap();

    let err = session.current_candidates(&doc).unwrap_err();
    assert!(matches!(err, SessionError::Identity(_)));
    assert!(err.is_fatal());

    // Nothing was dropped on the way out
    assert_eq!(session.all_candidates().len(), 2);
    assert!(session.is_acknowledged(&key(1, "target")));
}

// =========================================================================
// Focus and assignment
// =========================================================================

#[test]
fn focus_points_at_the_owning_node() {
    let doc = two_root_scene();
    let session = open(&doc);

    assert_eq!(
        session.focus(&doc, &key(21, "key")).unwrap(),
        Some(NodeHandle(vec![1]))
    );
    assert_eq!(session.focus(&doc, &key(404, "key")).unwrap(), None);
}

#[test]
fn assign_reports_stale_targets() {
    let mut doc = two_behavior_scene();
    let session = open(&doc);

    let written = session
        .assign(&mut doc, &key(404, "key"), Some(ObjectRef("x".into())))
        .unwrap();
    assert!(!written);
}

#[test]
fn assign_rejects_non_reference_fields() {
    let mut doc = two_behavior_scene();
    let session = open(&doc);

    let err = session
        .assign(&mut doc, &key(11, "speed"), Some(ObjectRef("x".into())))
        .unwrap_err();
    assert!(matches!(err, SessionError::Scene(_)));
    assert!(!err.is_fatal());
}

#[test]
fn independent_sessions_do_not_share_state() {
    let doc = two_behavior_scene();
    let mut first = open(&doc);
    let mut second = open(&doc);

    first.acknowledge(&key(11, "target")).unwrap();

    assert_eq!(first.current_candidates(&doc).unwrap().len(), 1);
    assert_eq!(second.current_candidates(&doc).unwrap().len(), 2);
}
