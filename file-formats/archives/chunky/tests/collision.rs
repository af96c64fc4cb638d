//! Siblings whose names slug to the same materialized name

mod common;

use chunky::{ChunkFs, ChunkPath, ChunkyError, ChunkyOptions};
use common::*;
use pretty_assertions::assert_eq;

fn names(tree: &chunky::MemoryFs, dir: &str) -> Vec<String> {
    tree.children(&ChunkPath::from(dir))
        .unwrap()
        .into_iter()
        .map(|e| e.name)
        .collect()
}

#[test]
fn test_colliding_data_chunks_get_suffixes() {
    let original = tree(vec![
        ("first.TPIC", data("Icon Large", "TPIC", b"one")),
        ("second.TPIC", data("Icon/Large", "TPIC", b"two")),
    ]);
    let unpacked = unpack(&pack(&original)).unwrap();

    assert_eq!(names(&unpacked, "/"), ["Icon-Large.TPIC", "Icon-Large-2.TPIC"]);

    let first = ChunkPath::from("Icon-Large.TPIC");
    let second = ChunkPath::from("Icon-Large-2.TPIC");
    assert_eq!(unpacked.read_file(&first).unwrap(), b"one");
    assert_eq!(unpacked.read_file(&second).unwrap(), b"two");
    assert_eq!(unpacked.metadata(&first).unwrap().name, "Icon Large");
    assert_eq!(unpacked.metadata(&second).unwrap().name, "Icon/Large");

    // Both entries pack back to the original chunks
    assert_eq!(pack(&unpacked), pack(&original));
}

#[test]
fn test_colliding_folders_keep_their_children_apart() {
    let original = tree(vec![
        ("a.FOLD", folder("set", vec![("x.DATA", data("x", "DATA", b"a"))])),
        ("b.FOLD", folder("set", vec![("x.DATA", data("x", "DATA", b"b"))])),
    ]);
    let unpacked = unpack(&pack(&original)).unwrap();

    assert_eq!(names(&unpacked, "/"), ["set.FOLD", "set-2.FOLD"]);
    assert_eq!(
        unpacked.read_file(&ChunkPath::from("set.FOLD/x.DATA")).unwrap(),
        b"a"
    );
    assert_eq!(
        unpacked.read_file(&ChunkPath::from("set-2.FOLD/x.DATA")).unwrap(),
        b"b"
    );
}

#[test]
fn test_same_name_different_fourcc_does_not_collide() {
    let original = tree(vec![
        ("x.DATA", data("x", "DATA", b"")),
        ("x.TPIC", data("x", "TPIC", b"")),
    ]);
    let unpacked = unpack(&pack(&original)).unwrap();
    assert_eq!(names(&unpacked, "/"), ["x.DATA", "x.TPIC"]);
}

#[test]
fn test_suffix_skips_names_taken_by_other_chunks() {
    let original = tree(vec![
        ("1", data("icon", "TPIC", b"1")),
        ("2", data("icon-2", "TPIC", b"2")),
        ("3", data("icon", "TPIC", b"3")),
    ]);
    let unpacked = unpack(&pack(&original)).unwrap();
    assert_eq!(
        names(&unpacked, "/"),
        ["icon.TPIC", "icon-2.TPIC", "icon-3.TPIC"]
    );
    assert_eq!(
        unpacked.read_file(&ChunkPath::from("icon-3.TPIC")).unwrap(),
        b"3"
    );
}

#[test]
fn test_collision_budget_exhaustion() {
    let original = tree(vec![
        ("1", data("dup", "DATA", b"")),
        ("2", data("dup", "DATA", b"")),
        ("3", data("dup", "DATA", b"")),
        ("4", data("dup", "DATA", b"")),
    ]);
    let bytes = pack(&original);

    assert!(unpack_with(&bytes, ChunkyOptions::new().max_suffix(4)).is_ok());
    match unpack_with(&bytes, ChunkyOptions::new().max_suffix(3)) {
        Err(ChunkyError::CollisionExhausted { path, attempts }) => {
            assert_eq!(path, "dup.DATA");
            assert_eq!(attempts, 3);
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_folder_collision_budget_exhaustion() {
    let original = tree(vec![
        ("1", folder("set", vec![("x.DATA", data("x", "DATA", b"1"))])),
        ("2", folder("set", vec![])),
        ("3", folder("set", vec![("y.DATA", data("y", "DATA", b"3"))])),
    ]);
    let bytes = pack(&original);

    let unpacked = unpack_with(&bytes, ChunkyOptions::new().max_suffix(3)).unwrap();
    assert_eq!(names(&unpacked, "/"), ["set.FOLD", "set-2.FOLD", "set-3.FOLD"]);

    let mut partial = chunky::MemoryFs::new();
    let err = chunky::ChunkyReader::with_options(ChunkyOptions::new().max_suffix(2))
        .read(&mut std::io::Cursor::new(&bytes), &mut partial)
        .unwrap_err();
    match err {
        ChunkyError::CollisionExhausted { path, attempts } => {
            assert_eq!(path, "set.FOLD");
            assert_eq!(attempts, 2);
        }
        other => panic!("unexpected error: {other}"),
    }

    // The folders created before the failure are left behind, and the third
    // folder's child was never materialized anywhere
    assert_eq!(names(&partial, "/"), ["set.FOLD", "set-2.FOLD"]);
    assert!(partial.node(&ChunkPath::from("set-3.FOLD")).is_none());
    assert!(names(&partial, "set-2.FOLD").is_empty());
    assert!(partial.node(&ChunkPath::from("set.FOLD/y.DATA")).is_none());
}
