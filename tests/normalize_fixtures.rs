use std::path::PathBuf;

use gridplay::scene::model::GridSize;
use gridplay::{
    Board, DiagnosticKind, DocumentKind, GRID_SIZE, LoadError, ParsedDocument, SourceFormat,
    detect, detect_and_parse, load_document,
};

fn fixture(name: &str) -> String {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name);
    std::fs::read_to_string(&path).unwrap()
}

fn load(name: &str) -> ParsedDocument {
    load_document(&fixture(name)).unwrap()
}

fn assert_square_grids(doc: &ParsedDocument) {
    for s in &doc.scenes {
        assert_eq!(s.grid.rows().len(), GRID_SIZE, "scene {}", s.id);
        assert!(s.grid.rows().iter().all(|r| r.len() == GRID_SIZE), "scene {}", s.id);
    }
}

#[test]
fn every_fixture_detects_and_keeps_square_grids() {
    for (name, format) in [
        ("disc.json", SourceFormat::DiscData),
        ("channels.json", SourceFormat::MultiChannel),
        ("conversation.json", SourceFormat::Conversation),
        ("ring.json", SourceFormat::RingMemory),
    ] {
        let value: serde_json::Value = serde_json::from_str(&fixture(name)).unwrap();
        assert_eq!(detect(&value).unwrap(), format, "{name}");
        let doc = load(name);
        assert_eq!(doc.kind, format.kind());
        assert_eq!(doc.grid_size, GridSize { rows: 9, cols: 9 });
        assert!(!doc.scenes.is_empty(), "{name}");
        assert_square_grids(&doc);
    }
}

#[test]
fn disc_data_compresses_timing_and_skips_broken_scenes() {
    let doc = load("disc.json");
    assert_eq!(doc.title, "The Checkpoint");
    let durations: Vec<f64> = doc.scenes.iter().map(|s| s.duration).collect();
    assert_eq!(durations, vec![14.0, 10.0]);
    assert_eq!(doc.total_duration(), 24.0);
    assert_eq!(doc.scene_offsets(), vec![0.0, 14.0]);

    let first = &doc.scenes[0];
    let delays: Vec<f64> = first.timeline.iter().map(|e| e.delay_seconds).collect();
    assert_eq!(delays, vec![1.0, 3.0, 10.0]);
    assert_eq!(first.timeline[0].duration_seconds, 3.0);
    assert_eq!(first.power["officer"].score, 0.7);
    assert_eq!(first.power["clancy"].score, 0.3);
    assert_eq!(first.related_events("clancy"), vec![1, 2]);

    let kinds: Vec<(DiagnosticKind, &str)> = doc
        .diagnostics
        .iter()
        .map(|d| (d.kind, d.path.as_str()))
        .collect();
    assert_eq!(
        kinds,
        vec![
            (DiagnosticKind::MalformedUnit, "$.scenes[2]"),
            (DiagnosticKind::Warning, "$.scenes[1].initial_grid_layout"),
        ]
    );
}

#[test]
fn disc_board_resolves_named_entities() {
    let doc = load("disc.json");
    let board = Board::from_scene(&doc.scenes[0]);
    let officer = board.cell(2, 3).unwrap().entity.as_ref().unwrap();
    assert_eq!(officer.name, "Officer Reyes");
    assert_eq!(officer.style.label, "Officer");
    assert_eq!(board.occupied().count(), 3);
    assert_eq!(board.bubble_slot("officer"), Some((2, 4)));
}

#[test]
fn channels_segment_per_channel_and_skip_the_broken_one() {
    let doc = load("channels.json");
    assert_eq!(doc.title, "LEGOS Multi-Channel");
    let ids: Vec<&str> = doc.scenes.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["ch0_s0", "ch0_s1", "ch0_s2", "ch1_s0", "ch1_s1", "ch3_s0"]);
    let numbers: Vec<u32> = doc.scenes.iter().map(|s| s.number).collect();
    assert_eq!(numbers, vec![1, 2, 3, 4, 5, 6]);

    let sizes: Vec<usize> = doc.scenes.iter().map(|s| s.timeline.len()).collect();
    assert_eq!(sizes, vec![5, 5, 2, 2, 1, 4]);
    assert_eq!(doc.scenes[2].duration, 10.0);

    let alpha = &doc.scenes[0];
    assert_eq!(alpha.title, "Alpha - Scene 1");
    assert_eq!(alpha.subtitle, "Traffic stop");
    assert_eq!(alpha.metadata["channelColor"], "#ff8800");
    assert_eq!(alpha.power["officer"].score, 0.8);
    assert_eq!(alpha.power["apparatus"].score, 0.3);
    assert_eq!(alpha.timeline[0].kind, "speech_bubble");
    assert_eq!(alpha.timeline[1].kind, "thinking_bubble");
    assert_eq!(alpha.timeline[1].delay_seconds, 5.0);
    assert_eq!(alpha.timeline[0].event_id.as_deref(), Some("a0"));

    let beta = &doc.scenes[3];
    assert_eq!(beta.subtitle, "Conversation");
    assert_eq!(beta.timeline[1].display_type, "system");
    assert_eq!(doc.scenes[4].title, "Beta - Scene 2");

    let gamma = &doc.scenes[5];
    assert_eq!(gamma.elements.len(), 1);
    assert_eq!(gamma.elements[0].id, "cell_4_4");

    assert!(
        doc.diagnostics
            .iter()
            .any(|d| d.kind == DiagnosticKind::Warning && d.path == "$.channels[2].messages")
    );
}

#[test]
fn conversation_chunks_into_scenes_of_five() {
    let doc = load("conversation.json");
    assert_eq!(doc.scenes.len(), 4);
    assert_eq!(doc.total_duration(), 80.0);
    let subtitles: Vec<&str> = doc.scenes.iter().map(|s| s.subtitle.as_str()).collect();
    assert_eq!(
        subtitles,
        vec!["Messages 1-5", "Messages 6-10", "Messages 11-15", "Messages 16-20"]
    );
    assert_eq!(doc.scenes[3].id, "conv_15");
    assert!(doc.scenes.iter().all(|s| s.title == "Debrief"));
    assert_eq!(doc.scenes[0].metadata["conversationId"], "conv-42");
    assert_eq!(doc.scenes[0].power["assistant"].score, 0.4);
    // The system turn does not split its group.
    assert_eq!(doc.scenes[1].timeline[2].display_type, "system");
    assert!(doc.scenes[0].elements.is_empty());
    assert!(doc.diagnostics.is_empty());
}

#[test]
fn ring_memory_turns_entries_into_thoughts() {
    let doc = load("ring.json");
    assert_eq!(doc.title, "Ring Memory Timeline");
    let ids: Vec<&str> = doc.scenes.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["ring_0", "ring_5"]);
    let first = &doc.scenes[0].timeline[0];
    assert_eq!(first.text(), Some("Memory 1: Recalled detail 1"));
    assert_eq!(first.target_element_id, "system");
    assert_eq!(first.display_type, "thought");
    // Entry 3 is malformed, so the fourth event is entry 4.
    assert_eq!(doc.scenes[0].timeline[3].event_id.as_deref(), Some("e3"));
    assert_eq!(doc.scenes[1].subtitle, "Entries 6-7");
    assert_eq!(doc.scenes[0].metadata["contextMode"], "rolling");
    assert_eq!(doc.diagnostics.len(), 1);
    assert_eq!(doc.diagnostics[0].path, "$.entries[3]");
}

#[test]
fn unusable_input_is_reported() {
    assert!(matches!(load_document("{"), Err(LoadError::Parse(_))));
    assert!(matches!(
        load_document("[1, 2]"),
        Err(LoadError::UnknownFormat { keys }) if keys.is_empty()
    ));
    let err = load_document(r#"{"foo": 1, "bar": []}"#).unwrap_err();
    assert_eq!(err.to_string(), "unknown data format. Found keys: bar, foo");

    let doc = detect_and_parse(&serde_json::json!({"foo": 1}));
    assert_eq!(doc.kind, DocumentKind::Error);
    assert_eq!(doc.title, "Parse Error");
    assert!(doc.scenes.is_empty());
}

#[test]
fn normalized_documents_serialize_with_wire_names() {
    let doc = load("ring.json");
    let v = serde_json::to_value(&doc).unwrap();
    assert_eq!(v["type"], "legos-ring-memory");
    assert_eq!(v["gridSize"]["rows"], 9);
    assert_eq!(v["scenes"][0]["timeline"][0]["type"], "thinking_bubble");

    let back: ParsedDocument = serde_json::from_value(v).unwrap();
    assert_eq!(back.scenes.len(), doc.scenes.len());
}

#[test]
fn loosely_typed_fields_never_drop_units() {
    let disc = load_document(
        r#"{
            "scenes": [
                {"scene_id": "s1", "scene_number": 1.0, "animation_timeline": []},
                {"scene_id": "s2", "animation_timeline": [
                    {"type": "speech_bubble", "target_element_id": "a", "text": "x"},
                    {"type": "speech_bubble", "target_element_id": "b", "delay_seconds": null}
                ]}
            ],
            "global_elements_legend": {}
        }"#,
    )
    .unwrap();
    assert_eq!(disc.scenes.len(), 2);
    assert_eq!(disc.scenes[1].timeline.len(), 2);

    let channels = load_document(
        r#"{"channels": [
            {"name": "A", "scorecard": {"officer": "high"}, "messages": [{"role": "user", "content": "hi"}]},
            {"name": 7, "messages": [{"role": "user", "content": "yo"}]}
        ]}"#,
    )
    .unwrap();
    assert_eq!(channels.scenes.len(), 2);
    assert_eq!(channels.scenes[1].title, "7 - Scene 1");
    assert!(
        disc.diagnostics
            .iter()
            .chain(&channels.diagnostics)
            .all(|d| d.kind != DiagnosticKind::MalformedUnit)
    );
}
