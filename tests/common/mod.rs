#![allow(dead_code)]

use unset_refs::identity::field_key::FieldKey;
use unset_refs::identity::object_id::ObjectId;
use unset_refs::scene::document::{
    BehaviorData, FieldData, FieldDecl, FieldValue, NodeData, SceneDocument, TypeDecl,
};
use unset_refs::scene::scene_model::{FieldKind, ObjectKind, ObjectLocation, ObjectRef};

pub const GUID: &str = "5f0c2a9e41d7";

// ============================================================================
// Field builders
// ============================================================================

pub fn reference(name: &str, value: Option<&str>) -> FieldData {
    FieldData {
        name: name.into(),
        value: FieldValue::ObjectReference {
            value: value.map(|v| ObjectRef(v.into())),
        },
    }
}

pub fn integer(name: &str, value: i64) -> FieldData {
    FieldData {
        name: name.into(),
        value: FieldValue::Integer { value },
    }
}

pub fn ref_item(value: Option<&str>) -> FieldValue {
    FieldValue::ObjectReference {
        value: value.map(|v| ObjectRef(v.into())),
    }
}

pub fn behavior(local_id: u64, type_name: &str, fields: Vec<FieldData>) -> BehaviorData {
    BehaviorData {
        local_id,
        type_name: type_name.into(),
        fields,
    }
}

pub fn node(
    local_id: u64,
    name: &str,
    behaviors: Vec<BehaviorData>,
    children: Vec<NodeData>,
) -> NodeData {
    NodeData {
        local_id,
        name: name.into(),
        behaviors,
        children,
    }
}

// ============================================================================
// Scene builders
// ============================================================================

fn decl(name: &str, kind: FieldKind) -> FieldDecl {
    FieldDecl {
        name: name.into(),
        kind,
        members: vec![],
    }
}

/// CameraRig, DoorLock, Spawner: user scripts. Camera, Text: built-in with
/// references. Transform: built-in without references.
pub fn declared_types() -> Vec<TypeDecl> {
    vec![
        TypeDecl {
            name: "CameraRig".into(),
            menu_path: None,
            user_authored: true,
            fields: vec![
                decl("target", FieldKind::ObjectReference),
                decl("speed", FieldKind::Integer),
            ],
        },
        TypeDecl {
            name: "DoorLock".into(),
            menu_path: None,
            user_authored: true,
            fields: vec![decl("key", FieldKind::ObjectReference)],
        },
        TypeDecl {
            name: "Spawner".into(),
            menu_path: None,
            user_authored: true,
            fields: vec![
                decl("prefab", FieldKind::ObjectReference),
                decl("waves", FieldKind::List),
                FieldDecl {
                    name: "settings".into(),
                    kind: FieldKind::Struct,
                    members: vec![
                        decl("anchor", FieldKind::ObjectReference),
                        decl("count", FieldKind::Integer),
                    ],
                },
            ],
        },
        TypeDecl {
            name: "Camera".into(),
            menu_path: Some("Rendering/Camera".into()),
            user_authored: false,
            fields: vec![decl("targetTexture", FieldKind::ObjectReference)],
        },
        TypeDecl {
            name: "Text".into(),
            menu_path: Some("UI/Legacy/Text".into()),
            user_authored: false,
            fields: vec![FieldDecl {
                name: "fontData".into(),
                kind: FieldKind::Struct,
                members: vec![decl("m_Font", FieldKind::ObjectReference)],
            }],
        },
        TypeDecl {
            name: "Transform".into(),
            menu_path: Some("Layout/Transform".into()),
            user_authored: false,
            fields: vec![decl("position", FieldKind::Float)],
        },
    ]
}

pub fn scene(roots: Vec<NodeData>) -> SceneDocument {
    SceneDocument {
        scope_guid: GUID.into(),
        types: declared_types(),
        roots,
    }
}

/// One root with two behaviors, each with one unset reference.
pub fn two_behavior_scene() -> SceneDocument {
    scene(vec![node(
        1,
        "Player",
        vec![
            behavior(11, "CameraRig", vec![reference("target", None), integer("speed", 3)]),
            behavior(12, "DoorLock", vec![reference("key", None)]),
        ],
        vec![],
    )])
}

/// Two roots: Player (CameraRig) and Door (DoorLock).
pub fn two_root_scene() -> SceneDocument {
    scene(vec![
        node(
            1,
            "Player",
            vec![behavior(11, "CameraRig", vec![reference("target", None)])],
            vec![],
        ),
        node(
            2,
            "Door",
            vec![behavior(21, "DoorLock", vec![reference("key", None)])],
            vec![],
        ),
    ])
}

pub fn object_id(local_id: u64) -> ObjectId {
    ObjectId::from_location(&ObjectLocation {
        kind: ObjectKind::Behavior,
        scope_guid: GUID.into(),
        local_id,
    })
}

pub fn key(local_id: u64, path: &str) -> FieldKey {
    FieldKey::new(object_id(local_id), path)
}
