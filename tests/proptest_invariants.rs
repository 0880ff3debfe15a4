//! Property-based invariant tests for normalization and playback.
//!
//! 1. Any JSON value coerces to a 9x9 grid.
//! 2. Conversation documents chunk into full groups of five plus one remainder.
//! 3. Channel segmentation never produces a group larger than five or an empty group.
//! 4. Loose target matching is symmetric and never matches an empty id.
//! 5. Speed steps stay inside the allowed set.
//! 6. Playback reveals every event exactly once, whatever the frame rate.

use gridplay::playback::matching::target_matches;
use gridplay::{
    FrameLoop, GRID_SIZE, Grid, ManualTime, PlayerSession, RecordingObserver, Signal, Speed,
    load_document,
};
use proptest::prelude::*;
use serde_json::{Value, json};

// ── Helpers ─────────────────────────────────────────────────────────────

fn json_strategy() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i32>().prop_map(|n| json!(n)),
        "[A-Za-z0-9 ]{0,4}".prop_map(Value::String),
    ];
    leaf.prop_recursive(3, 64, 12, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..12).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,3}", inner, 0..4)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

fn role_strategy() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just("user"), Just("assistant"), Just("system")]
}

fn conversation(roles: &[&str]) -> String {
    let messages: Vec<Value> = roles
        .iter()
        .enumerate()
        .map(|(i, r)| json!({"role": r, "content": format!("m{i}")}))
        .collect();
    json!({ "messages": messages }).to_string()
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Grids are always 9x9
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn any_value_coerces_to_square_grid(v in json_strategy()) {
        let (grid, _) = Grid::coerce(Some(&v));
        prop_assert_eq!(grid.rows().len(), GRID_SIZE);
        prop_assert!(grid.rows().iter().all(|r| r.len() == GRID_SIZE));
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. Conversation chunking
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn conversation_groups_are_full_except_the_last(
        roles in prop::collection::vec(role_strategy(), 1..40)
    ) {
        let doc = load_document(&conversation(&roles)).unwrap();
        let sizes: Vec<usize> = doc.scenes.iter().map(|s| s.timeline.len()).collect();
        prop_assert_eq!(sizes.len(), roles.len().div_ceil(5));
        prop_assert_eq!(sizes.iter().sum::<usize>(), roles.len());
        if let Some((last, full)) = sizes.split_last() {
            prop_assert!(full.iter().all(|&n| n == 5));
            prop_assert!((1..=5).contains(last));
        }
        for s in &doc.scenes {
            prop_assert_eq!(s.duration, s.timeline.len() as f64 * 4.0);
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Channel segmentation
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn channel_groups_are_bounded(
        roles in prop::collection::vec(role_strategy(), 0..40)
    ) {
        let messages: Vec<Value> = roles
            .iter()
            .map(|r| json!({"role": r, "content": "x"}))
            .collect();
        let text = json!({"channels": [{"name": "c", "messages": messages}]}).to_string();
        let doc = load_document(&text).unwrap();
        let total: usize = doc.scenes.iter().map(|s| s.timeline.len()).sum();
        prop_assert_eq!(total, roles.len());
        for s in &doc.scenes {
            prop_assert!((1..=5).contains(&s.timeline.len()));
            // A system message can only sit last in a group, unless it opened the group.
            for (i, e) in s.timeline.iter().enumerate() {
                if e.display_type == "system" && i > 0 {
                    prop_assert_eq!(i, s.timeline.len() - 1);
                }
            }
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Target matching
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn matching_is_symmetric(a in "[A-Za-z_]{0,8}", b in "[A-Za-z_]{0,8}") {
        prop_assert_eq!(target_matches(&a, &b), target_matches(&b, &a));
        if a.is_empty() || b.is_empty() {
            prop_assert!(!target_matches(&a, &b));
        } else {
            prop_assert!(target_matches(&a, &a.to_uppercase()));
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Speed steps
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn speed_steps_stay_allowed(ups in prop::collection::vec(any::<bool>(), 0..20)) {
        let mut speed = Speed::NORMAL;
        for up in ups {
            speed = if up { speed.doubled() } else { speed.halved() };
            prop_assert!(Speed::STEPS.contains(&speed.get()));
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 6. Reveal exactly once
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn every_event_is_revealed_once(n in 1usize..16, fps in 1u32..60) {
        let roles = vec!["user"; n];
        let mut session = PlayerSession::default();
        session.load(&conversation(&roles)).unwrap();
        session.toggle_play(0.0).unwrap();

        let mut rec = RecordingObserver::default();
        let mut time = ManualTime::default();
        FrameLoop::new(fps)
            .unwrap()
            .max_frames(100_000)
            .run(&mut time, |now| session.frame(now, &mut rec));

        let mut revealed: Vec<(usize, usize)> = rec
            .signals
            .iter()
            .filter_map(|s| match *s {
                Signal::Revealed { scene, event } => Some((scene, event)),
                _ => None,
            })
            .collect();
        prop_assert_eq!(revealed.len(), n);
        revealed.sort_unstable();
        revealed.dedup();
        prop_assert_eq!(revealed.len(), n);
        prop_assert_eq!(rec.count(|s| matches!(s, Signal::AllComplete)), 1);
    }
}
