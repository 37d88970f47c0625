//! Arena integration: parse lifecycles, external buffers, and copy
//! semantics across the arena boundary.

use std::ptr::NonNull;

use jsondom::{Arena, ArenaDocument, ParseOptions, Value};

const RECORD: &str =
    r#"{"type":"scan","bssid":"aa:bb:cc:dd:ee:ff","rssi":-42,"channel":36,"ssid":"Net_7"}"#;

#[test]
fn explicit_arena_parse_matches_heap_parse() {
    let heap_value = jsondom::parse(RECORD).unwrap();
    let arena = Arena::with_capacity(4096);
    // SAFETY: the value is dropped before the arena at the end of scope,
    // and the arena stays in place.
    let arena_value =
        unsafe { jsondom::parse_with_arena(RECORD, &arena, &ParseOptions::strict()).unwrap() };
    assert_eq!(arena_value, heap_value);
    assert_eq!(arena_value["rssi"].as_int().unwrap(), -42);
    assert!(arena.bytes_used() > 0);
    drop(arena_value);
}

#[test]
fn stack_buffer_arena_serves_small_documents_without_heap_blocks() {
    let mut buf = [0u8; 8192];
    let ptr = NonNull::new(buf.as_mut_ptr()).unwrap();
    // SAFETY: buf outlives the arena and is only accessed through it.
    let arena = unsafe { Arena::from_raw_buffer(ptr, 8192) };
    // SAFETY: the value is dropped before the arena.
    {
        let value =
            unsafe { jsondom::parse_with_arena(RECORD, &arena, &ParseOptions::strict()).unwrap() };
        assert_eq!(value["channel"].as_int().unwrap(), 36);
        assert_eq!(arena.block_count(), 0, "no overflow for a small record");
    }
    drop(arena);
}

#[test]
fn document_batch_reuse_keeps_structure_identical() {
    let batch = format!(
        "[{}]",
        (0..100).map(|_| RECORD).collect::<Vec<_>>().join(",")
    );
    let reference = jsondom::parse(&batch).unwrap();

    let mut doc = ArenaDocument::with_capacity(4096);
    for round in 0..50 {
        let root = doc.parse(&batch).unwrap();
        assert_eq!(root, &reference, "round {round}");
        doc.reset();
    }
}

#[test]
fn arena_allocation_is_observable_and_bounded() {
    let batch = format!(
        "[{}]",
        (0..100).map(|_| RECORD).collect::<Vec<_>>().join(",")
    );
    let mut doc = ArenaDocument::with_capacity(4096);

    doc.parse(&batch).unwrap();
    let first_round_allocated = doc.arena().bytes_allocated();
    doc.reset();

    // After reset the arena retains capacity; further identical parses
    // must not keep growing it.
    let mut high_water = 0;
    for _ in 0..200 {
        doc.parse(&batch).unwrap();
        high_water = high_water.max(doc.arena().bytes_allocated());
        doc.reset();
    }
    assert!(
        high_water <= first_round_allocated * 2,
        "arena grew without bound: first {first_round_allocated}, later {high_water}"
    );
}

#[test]
fn values_mix_arena_and_heap_after_mutation() {
    let mut doc = ArenaDocument::new();
    doc.parse(r#"{"from_parse":"an arena-backed string of useful length"}"#)
        .unwrap();
    // Mutations outside any scope allocate from the heap into the same
    // tree; both storage classes must coexist and drop cleanly.
    // SAFETY: nothing is moved out of the document.
    let root = unsafe { doc.root_mut() };
    root["added"] = Value::from("a heap string also long enough to spill");
    root["count"] = Value::from(2i64);
    assert_eq!(root.len(), 3);
    doc.reset();
    assert!(doc.root().is_null());
}

#[test]
fn deep_clone_detaches_from_arena() {
    let mut doc = ArenaDocument::new();
    doc.parse(&format!("[{RECORD},{RECORD}]")).unwrap();
    let detached = doc.root().clone();
    doc.reset();
    doc.parse("[0]").unwrap();
    assert_eq!(detached.len(), 2);
    assert_eq!(detached[1]["ssid"].as_str().unwrap(), "Net_7");
    drop(doc);
    assert_eq!(detached[0]["bssid"].as_str().unwrap(), "aa:bb:cc:dd:ee:ff");
}

#[test]
fn explicit_arena_parses_are_isolated() {
    let outer = Arena::with_capacity(1024);
    let inner = Arena::with_capacity(1024);
    // SAFETY: both parsed values are dropped before their arenas.
    unsafe {
        let outer_value =
            jsondom::parse_with_arena(r#"["outer payload beyond inline"]"#, &outer, &ParseOptions::strict())
                .unwrap();
        let outer_used = outer.bytes_used();
        let inner_value =
            jsondom::parse_with_arena(r#"["inner payload beyond inline"]"#, &inner, &ParseOptions::strict())
                .unwrap();
        assert_eq!(outer.bytes_used(), outer_used, "inner parse must not touch outer");
        assert!(inner.bytes_used() > 0);
        drop((outer_value, inner_value));
    }
}
