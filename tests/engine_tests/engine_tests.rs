//! Tests for ContentStore
//!
//! These tests verify:
//! - Reading nodes, JSON leaves and binary leaves
//! - Creating items and the media type stamped into metadata
//! - Updating items, including rename-before-write
//! - Metadata-only updates
//! - Error reporting (missing media type, partial writes)
//! - Store lifecycle (open/close)

use std::fs;
use std::io::Read;

use serde_json::json;
use sidecar_store::{
    Config, Content, ContentHeader, ContentStore, Document, ItemKind, MetaData, MetaDatum,
    Payload, StoreError,
};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_store() -> (TempDir, ContentStore) {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder().storage_root(temp_dir.path()).build();
    let store = ContentStore::open(config).unwrap();
    (temp_dir, store)
}

fn document(value: serde_json::Value) -> Document {
    match value {
        serde_json::Value::Object(map) => map,
        other => panic!("expected a JSON object, got {}", other),
    }
}

fn sidecar(store: &ContentStore, rel: &str) -> serde_json::Value {
    let bytes = fs::read(store.root().join(rel)).unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// =============================================================================
// Open/Close Tests
// =============================================================================

#[test]
fn test_open_creates_root() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("content");

    let store = ContentStore::open_path(&root).unwrap();

    assert!(root.is_dir());
    assert!(store.config().lock_writes);
}

#[test]
fn test_close_keeps_root_by_default() {
    let (temp_dir, store) = setup_temp_store();

    store.close().unwrap();

    assert!(temp_dir.path().exists());
}

#[test]
fn test_close_deletes_root_on_shutdown() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("scratch");
    let config = Config::builder()
        .storage_root(&root)
        .delete_on_shutdown(true)
        .build();
    let store = ContentStore::open(config).unwrap();
    store.create("/", Content::node("folder")).unwrap();

    store.close().unwrap();

    assert!(!root.exists());
}

// =============================================================================
// Create Tests
// =============================================================================

#[test]
fn test_create_folder() {
    let (_temp, store) = setup_temp_store();

    let path = store.create("/", Content::node("folder")).unwrap();

    assert_eq!(path.to_string(), "/folder");
    assert!(store.root().join("folder").is_dir());
    assert_eq!(store.load_header("/folder").unwrap().kind, ItemKind::Node);
}

#[test]
fn test_create_folder_persists_metadata() {
    let (_temp, store) = setup_temp_store();
    let content = Content::node("folder")
        .with_metadata(MetaData::from_entries(None, vec![MetaDatum::new("owner", "team")]));

    store.create("/", content).unwrap();

    let metadata = store.load_metadata("/folder").unwrap();
    assert_eq!(metadata.get("owner").unwrap().value, "team");
}

#[test]
fn test_create_json_content() {
    let (_temp, store) = setup_temp_store();
    store.create("/", Content::node("docs")).unwrap();

    let path = store
        .create("/docs", Content::document("a.json", document(json!({ "title": "A" }))))
        .unwrap();

    assert_eq!(path.to_string(), "/docs/a.json");
    assert_eq!(
        store.load_metadata("/docs/a.json").unwrap().media_type(),
        Some("application/json")
    );
}

#[test]
fn test_create_structured_always_stamps_json() {
    let (_temp, store) = setup_temp_store();
    let mut content = Content::document("hal.json", document(json!({ "x": 1 })));
    content.header.media_type = Some("application/hal+json".into());

    store.create("/", content).unwrap();

    assert_eq!(
        sidecar(&store, "hal.json.metadata.json")["mediaType"],
        json!("application/json")
    );
}

#[test]
fn test_create_structured_without_media_type_defaults_to_json() {
    let (_temp, store) = setup_temp_store();
    let mut content = Content::document("doc", document(json!({ "x": 1 })));
    content.header.media_type = None;

    store.create("/", content).unwrap();

    assert_eq!(store.payload_media_type("/doc").unwrap(), "application/json");
}

#[test]
fn test_create_binary_content() {
    let (_temp, store) = setup_temp_store();
    store.create("/", Content::node("images")).unwrap();

    let path = store
        .create(
            "/images",
            Content::upload("image.jpeg", Some("image/jpeg".into()), &b"\xff\xd8\xff"[..]),
        )
        .unwrap();

    assert_eq!(path.to_string(), "/images/image.jpeg");
    assert_eq!(fs::read(store.root().join("images/image.jpeg")).unwrap(), b"\xff\xd8\xff");
    assert_eq!(
        store.load_metadata("/images/image.jpeg").unwrap().media_type(),
        Some("image/jpeg")
    );
}

#[test]
fn test_create_binary_without_media_type_fails_before_mutation() {
    let (_temp, store) = setup_temp_store();

    let result = store.create("/", Content::upload("blob", None, &b"data"[..]));

    assert!(matches!(result.unwrap_err(), StoreError::MissingMediaType(_)));
    assert!(!store.root().join("blob").exists());
    assert!(!store.root().join("blob.metadata.json").exists());
}

#[test]
fn test_create_existing_fails() {
    let (_temp, store) = setup_temp_store();
    store
        .create("/", Content::upload("a.txt", Some("text/plain".into()), &b"one"[..]))
        .unwrap();

    let result = store.create("/", Content::upload("a.txt", Some("text/plain".into()), &b"two"[..]));

    assert!(matches!(result.unwrap_err(), StoreError::AlreadyExists(_)));
    assert_eq!(fs::read(store.root().join("a.txt")).unwrap(), b"one");
}

#[test]
fn test_create_under_missing_parent_fails() {
    let (_temp, store) = setup_temp_store();

    let result = store.create(
        "/missing",
        Content::upload("a.txt", Some("text/plain".into()), &b"x"[..]),
    );

    assert!(matches!(result.unwrap_err(), StoreError::NotFound(_)));
}

#[test]
fn test_create_reserved_name_fails() {
    let (_temp, store) = setup_temp_store();

    let result = store.create(
        "/",
        Content::upload("x.metadata.json", Some("text/plain".into()), &b"x"[..]),
    );

    assert!(matches!(result.unwrap_err(), StoreError::InvalidPath(_)));
}

#[test]
fn test_create_structured_payload_with_binary_type_fails() {
    let (_temp, store) = setup_temp_store();
    let mut content = Content::document("doc", document(json!({})));
    content.header.media_type = Some("image/png".into());

    let result = store.create("/", content);

    assert!(matches!(result.unwrap_err(), StoreError::PayloadMismatch { .. }));
}

#[test]
fn test_create_json_upload_is_parsed() {
    let (_temp, store) = setup_temp_store();

    store
        .create(
            "/",
            Content::upload("upload.json", Some("application/json".into()), &br#"{"a":1}"#[..]),
        )
        .unwrap();

    let content = store.read("/upload.json").unwrap();
    assert_eq!(content.payload, Payload::Structured(document(json!({ "a": 1 }))));
}

#[test]
fn test_create_does_not_store_inherited_entries() {
    let (_temp, store) = setup_temp_store();
    let metadata = MetaData::from_entries(
        None,
        vec![MetaDatum::new("own", "1"), MetaDatum::inherited("parent", "2")],
    );

    store
        .create("/", Content::document("d.json", document(json!({}))).with_metadata(metadata))
        .unwrap();

    let stored = sidecar(&store, "d.json.metadata.json");
    assert_eq!(stored["entries"].as_array().unwrap().len(), 1);
    assert_eq!(stored["entries"][0]["key"], json!("own"));
}

// =============================================================================
// Read Tests
// =============================================================================

#[test]
fn test_read_json_content() {
    let (_temp, store) = setup_temp_store();
    let doc = document(json!({ "title": "Hello", "tags": ["a", "b"] }));
    store.create("/", Content::document("doc.json", doc.clone())).unwrap();

    let content = store.read("/doc.json").unwrap();

    assert_eq!(content.header.kind, ItemKind::Leaf);
    assert_eq!(content.header.name, "doc.json");
    assert_eq!(content.header.media_type.as_deref(), Some("application/json"));
    assert_eq!(
        content.header.size,
        Some(fs::metadata(store.root().join("doc.json")).unwrap().len())
    );
    assert_eq!(content.payload, Payload::Structured(doc));
}

#[test]
fn test_read_binary_content() {
    let (_temp, store) = setup_temp_store();
    store
        .create("/", Content::upload("content.jpeg", Some("image/jpeg".into()), &b"JPEG"[..]))
        .unwrap();

    let content = store.read("/content.jpeg").unwrap();

    assert_eq!(content.header.size, Some(4));
    assert_eq!(content.payload.as_bytes().unwrap().as_ref(), b"JPEG");
    assert_eq!(content.metadata.media_type(), Some("image/jpeg"));
}

#[test]
fn test_read_folder_lists_children() {
    let (_temp, store) = setup_temp_store();
    store.create("/", Content::node("dir")).unwrap();
    store.create("/dir", Content::node("sub")).unwrap();
    store
        .create("/dir", Content::upload("b.bin", Some("application/octet-stream".into()), &b"12"[..]))
        .unwrap();
    store.create("/dir", Content::document("a.json", document(json!({})))).unwrap();

    let content = store.read("/dir").unwrap();

    let listing = content.payload.as_document().unwrap();
    let sub = listing["sub"].as_array().unwrap();
    assert_eq!(sub.len(), 3);
    assert_eq!(sub[0]["name"], json!("a.json"));
    assert_eq!(sub[1], json!({ "name": "b.bin", "type": "LEAF", "size": 2 }));
    assert_eq!(sub[2], json!({ "name": "sub", "type": "NODE" }));
    assert_eq!(content.header.kind, ItemKind::Node);
}

#[test]
fn test_read_leaf_without_media_type_fails() {
    let (_temp, store) = setup_temp_store();
    fs::write(store.root().join("raw"), b"x").unwrap();

    let result = store.read("/raw");

    assert!(matches!(result.unwrap_err(), StoreError::MissingMediaType(_)));
}

#[test]
fn test_read_missing_fails() {
    let (_temp, store) = setup_temp_store();

    let result = store.read("/nothing/here");

    let err = result.unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
    assert_eq!(err.code(), "storage.file.not_found");
    assert!(err.is_recoverable());
}

#[test]
fn test_paths_through_leaf_are_not_found() {
    let (_temp, store) = setup_temp_store();
    store.create("/", Content::document("doc.json", document(json!({ "a": 1 })))).unwrap();

    let errors = vec![
        store.read("/doc.json/child").unwrap_err(),
        store.load_header("/doc.json/child").unwrap_err(),
        store.load_metadata("/doc.json/child").unwrap_err(),
        store
            .write_metadata_only("/doc.json/child", vec![MetaDatum::new("k", "v")])
            .unwrap_err(),
        store
            .write("/doc.json/child", Content::document("child", document(json!({}))))
            .unwrap_err(),
    ];

    for err in errors {
        assert!(matches!(err, StoreError::NotFound(_)), "{}", err);
        assert_eq!(err.code(), "storage.file.not_found");
    }
}

#[test]
fn test_sidecar_paths_are_not_content() {
    let (_temp, store) = setup_temp_store();
    store.create("/", Content::node("folder")).unwrap();
    store.create("/", Content::document("doc.json", document(json!({ "a": 1 })))).unwrap();

    let read = store.read("/doc.json.metadata.json");
    let folder_sidecar = store.read("/folder/.metadata.json");
    let written = store.write(
        "/doc.json.metadata.json",
        Content::upload("doc.json.metadata.json", Some("text/plain".into()), &b"junk"[..]),
    );
    let metadata = store.write_metadata_only("/doc.json.metadata.json", Vec::<MetaDatum>::new());

    assert!(matches!(read.unwrap_err(), StoreError::NotFound(_)));
    assert!(matches!(folder_sidecar.unwrap_err(), StoreError::NotFound(_)));
    assert!(matches!(written.unwrap_err(), StoreError::NotFound(_)));
    assert!(matches!(metadata.unwrap_err(), StoreError::NotFound(_)));
    assert!(!store
        .root()
        .join("doc.json.metadata.json.metadata.json")
        .exists());

    // The real item is untouched
    let content = store.read("/doc.json").unwrap();
    assert_eq!(content.payload, Payload::Structured(document(json!({ "a": 1 }))));
    assert_eq!(content.metadata.media_type(), Some("application/json"));
}

#[test]
fn test_read_includes_inherited_metadata() {
    let (_temp, store) = setup_temp_store();
    store.create("/", Content::node("a")).unwrap();
    store.create("/a", Content::node("b")).unwrap();
    store
        .create("/a/b", Content::upload("c", Some("text/plain".into()), &b"c"[..]))
        .unwrap();
    store.write_metadata_only("/a", vec![MetaDatum::new("k", "root")]).unwrap();
    store.write_metadata_only("/a/b", vec![MetaDatum::new("k", "child")]).unwrap();

    let content = store.read("/a/b/c").unwrap();

    let datum = content.metadata.get("k").unwrap();
    assert_eq!(datum.value, "root");
    assert!(datum.inherited);
}

// =============================================================================
// Raw Payload Tests
// =============================================================================

#[test]
fn test_load_payload_streams_bytes() {
    let (_temp, store) = setup_temp_store();
    store.create("/", Content::document("doc.json", document(json!({ "a": 1 })))).unwrap();

    let mut raw = String::new();
    store.load_payload("/doc.json").unwrap().read_to_string(&mut raw).unwrap();

    let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(parsed, json!({ "a": 1 }));
}

#[test]
fn test_load_payload_of_folder_fails() {
    let (_temp, store) = setup_temp_store();
    store.create("/", Content::node("folder")).unwrap();

    let result = store.load_payload("/folder");

    assert!(matches!(result.unwrap_err(), StoreError::NotALeaf(_)));
}

#[test]
fn test_payload_media_type_fallback() {
    let (_temp, store) = setup_temp_store();
    fs::write(store.root().join("raw"), b"x").unwrap();

    assert_eq!(store.payload_media_type("/raw").unwrap(), "application/octet-stream");
}

#[test]
fn test_list_children() {
    let (_temp, store) = setup_temp_store();
    store.create("/", Content::node("x")).unwrap();
    store.create("/", Content::node("y")).unwrap();

    let names: Vec<String> = store
        .list_children("/")
        .unwrap()
        .into_iter()
        .map(|h| h.name)
        .collect();

    assert_eq!(names, vec!["x", "y"]);
}

// =============================================================================
// Write Tests
// =============================================================================

#[test]
fn test_write_json_round_trip() {
    let (_temp, store) = setup_temp_store();
    store.create("/", Content::document("doc.json", document(json!({ "v": 1 })))).unwrap();
    let updated = document(json!({ "v": 2, "nested": { "ok": true } }));

    let path = store
        .write("/doc.json", Content::document("doc.json", updated.clone()))
        .unwrap();
    let content = store.read(&path.to_string()).unwrap();

    assert_eq!(path.to_string(), "/doc.json");
    assert_eq!(content.payload, Payload::Structured(updated));
    assert_eq!(
        content.header.size,
        Some(fs::metadata(store.root().join("doc.json")).unwrap().len())
    );
}

#[test]
fn test_write_binary_round_trip() {
    let (_temp, store) = setup_temp_store();
    store
        .create("/", Content::upload("img.png", Some("image/png".into()), &b"old"[..]))
        .unwrap();

    store
        .write("/img.png", Content::upload("img.png", None, &b"new bytes"[..]))
        .unwrap();
    let content = store.read("/img.png").unwrap();

    assert_eq!(content.header.size, Some(9));
    assert_eq!(content.payload.as_bytes().unwrap().as_ref(), b"new bytes");
    assert_eq!(content.metadata.media_type(), Some("image/png"));
}

#[test]
fn test_write_binary_with_new_media_type() {
    let (_temp, store) = setup_temp_store();
    store
        .create("/", Content::upload("file", Some("image/png".into()), &b"png"[..]))
        .unwrap();

    store
        .write("/file", Content::upload("file", Some("image/gif".into()), &b"gif"[..]))
        .unwrap();

    assert_eq!(store.load_header("/file").unwrap().media_type.as_deref(), Some("image/gif"));
}

#[test]
fn test_write_binary_without_any_media_type_fails() {
    let (_temp, store) = setup_temp_store();
    fs::write(store.root().join("raw"), b"old").unwrap();

    let result = store.write("/raw", Content::upload("raw", None, &b"new"[..]));

    assert!(matches!(result.unwrap_err(), StoreError::MissingMediaType(_)));
    assert_eq!(fs::read(store.root().join("raw")).unwrap(), b"old");
}

#[test]
fn test_write_structured_stamps_json() {
    let (_temp, store) = setup_temp_store();
    store.create("/", Content::document("doc.json", document(json!({})))).unwrap();
    let mut content = Content::document("doc.json", document(json!({ "a": 1 })));
    content.header.media_type = Some("application/vnd.api+json".into());

    store.write("/doc.json", content).unwrap();

    assert_eq!(
        store.load_metadata("/doc.json").unwrap().media_type(),
        Some("application/json")
    );
}

#[test]
fn test_write_leaf_rename_moves_sidecar() {
    let (_temp, store) = setup_temp_store();
    store.create("/", Content::node("test")).unwrap();
    store
        .create(
            "/test",
            Content::document("path", document(json!({ "a": 1 })))
                .with_metadata(MetaData::from_entries(None, vec![MetaDatum::new("k", "v")])),
        )
        .unwrap();

    let new_path = store
        .write("/test/path", Content::document("new_name", document(json!({ "a": 2 }))))
        .unwrap();

    assert_eq!(new_path.to_string(), "/test/new_name");
    assert!(!store.root().join("test/path").exists());
    assert!(!store.root().join("test/path.metadata.json").exists());
    assert!(store.root().join("test/new_name.metadata.json").is_file());

    let content = store.read("/test/new_name").unwrap();
    assert_eq!(content.payload, Payload::Structured(document(json!({ "a": 2 }))));
    assert!(matches!(store.read("/test/path").unwrap_err(), StoreError::NotFound(_)));
}

#[test]
fn test_write_folder_rename() {
    let (_temp, store) = setup_temp_store();
    store.create("/", Content::node("test")).unwrap();
    store.create("/test", Content::node("path")).unwrap();
    store
        .create("/test/path", Content::upload("inner", Some("text/plain".into()), &b"x"[..]))
        .unwrap();
    let mut folder = Content::node("new_name");
    folder.metadata = MetaData::from_entries(None, vec![MetaDatum::new("label", "renamed")]);

    let new_path = store.write("/test/path", folder).unwrap();

    assert_eq!(new_path.to_string(), "/test/new_name");
    assert!(store.root().join("test/new_name/.metadata.json").is_file());
    assert!(store.root().join("test/new_name/inner").is_file());
    assert_eq!(
        store.load_metadata("/test/new_name").unwrap().get("label").unwrap().value,
        "renamed"
    );
    assert_eq!(
        store.load_metadata("/test/new_name/inner").unwrap().get("label").unwrap().value,
        "renamed"
    );
}

#[test]
fn test_write_folder_ignores_payload() {
    let (_temp, store) = setup_temp_store();
    store.create("/", Content::node("folder")).unwrap();
    let content = Content {
        header: ContentHeader::node("folder"),
        metadata: MetaData::new(),
        payload: Payload::Binary(bytes::Bytes::from_static(b"ignored")),
    };

    let path = store.write("/folder", content).unwrap();

    assert_eq!(path.to_string(), "/folder");
    assert!(store.root().join("folder").is_dir());
}

#[test]
fn test_write_empty_name_keeps_path() {
    let (_temp, store) = setup_temp_store();
    store.create("/", Content::document("doc.json", document(json!({})))).unwrap();

    let path = store
        .write("/doc.json", Content::document("", document(json!({ "b": 1 }))))
        .unwrap();

    assert_eq!(path.to_string(), "/doc.json");
}

#[test]
fn test_write_rename_onto_existing_fails() {
    let (_temp, store) = setup_temp_store();
    store.create("/", Content::document("a.json", document(json!({ "a": 1 })))).unwrap();
    store.create("/", Content::document("b.json", document(json!({ "b": 1 })))).unwrap();

    let result = store.write("/a.json", Content::document("b.json", document(json!({}))));

    assert!(matches!(result.unwrap_err(), StoreError::AlreadyExists(_)));
    assert_eq!(
        store.read("/a.json").unwrap().payload,
        Payload::Structured(document(json!({ "a": 1 })))
    );
}

#[test]
fn test_write_missing_fails() {
    let (_temp, store) = setup_temp_store();

    let result = store.write("/ghost.json", Content::document("ghost.json", document(json!({}))));

    assert!(matches!(result.unwrap_err(), StoreError::NotFound(_)));
}

#[cfg(unix)]
#[test]
fn test_metadata_failure_after_payload_is_partial_write() {
    use std::os::unix::fs::PermissionsExt;

    let (_temp, store) = setup_temp_store();
    store.create("/", Content::document("doc.json", document(json!({ "v": 1 })))).unwrap();
    let sidecar_path = store.root().join("doc.json.metadata.json");
    fs::set_permissions(&sidecar_path, fs::Permissions::from_mode(0o444)).unwrap();
    // Root ignores permission bits; nothing to observe then
    if fs::OpenOptions::new().write(true).open(&sidecar_path).is_ok() {
        return;
    }

    let result = store.write("/doc.json", Content::document("doc.json", document(json!({ "v": 2 }))));

    let err = result.unwrap_err();
    assert!(err.is_partial_write());
    assert_eq!(err.code(), "storage.metadata.partial_write");
    let written: serde_json::Value =
        serde_json::from_slice(&fs::read(store.root().join("doc.json")).unwrap()).unwrap();
    assert_eq!(written, json!({ "v": 2 }));
}

// =============================================================================
// Metadata-Only Tests
// =============================================================================

#[test]
fn test_write_metadata_only_replaces_entries() {
    let (_temp, store) = setup_temp_store();
    store
        .create(
            "/",
            Content::upload("img.png", Some("image/png".into()), &b"png"[..])
                .with_metadata(MetaData::from_entries(None, vec![MetaDatum::new("old", "1")])),
        )
        .unwrap();

    store
        .write_metadata_only("/img.png", vec![MetaDatum::new("new", "2")])
        .unwrap();

    let metadata = store.load_metadata("/img.png").unwrap();
    assert!(metadata.get("old").is_none());
    assert_eq!(metadata.get("new").unwrap().value, "2");
    assert_eq!(metadata.media_type(), Some("image/png"));
    assert_eq!(fs::read(store.root().join("img.png")).unwrap(), b"png");
}

#[test]
fn test_write_metadata_only_drops_inherited_entries() {
    let (_temp, store) = setup_temp_store();
    store.create("/", Content::node("a")).unwrap();
    store.write_metadata_only("/", vec![MetaDatum::new("site", "main")]).unwrap();

    let effective = store.load_metadata("/a").unwrap();
    let mut entries = effective.into_entries();
    entries.push(MetaDatum::new("own", "x"));
    store.write_metadata_only("/a", entries).unwrap();

    let stored = sidecar(&store, "a/.metadata.json");
    assert_eq!(stored["entries"].as_array().unwrap().len(), 1);
    assert_eq!(stored["entries"][0]["key"], json!("own"));
}

#[test]
fn test_write_metadata_only_missing_path() {
    let (_temp, store) = setup_temp_store();

    let result = store.write_metadata_only("/missing", vec![MetaDatum::new("k", "v")]);

    assert!(matches!(result.unwrap_err(), StoreError::NotFound(_)));
}
