use crate::foundation::lenient;
use crate::normalize::diag::{Diagnostics, PathElem, child};
use crate::normalize::{coerce_grid, decode_units, id_string, parse_power};
use crate::scene::model::{DocumentKind, Element, Event, GridSize, ParsedDocument, Scene};
use serde::Deserialize;
use serde_json::Value;

/// Event delays are divided by this factor.
pub(crate) const TIME_COMPRESSION: f64 = 3.0;
/// Event durations are capped at this many seconds (also the default when absent).
pub(crate) const MAX_EVENT_SECS: f64 = 3.0;
/// Minimum scene duration in seconds.
pub(crate) const MIN_SCENE_SECS: f64 = 10.0;
/// Trailing buffer after the last event in seconds.
pub(crate) const TAIL_SECS: f64 = 2.0;

#[derive(Debug, Deserialize)]
pub(crate) struct DiscDataDef {
    #[serde(default, deserialize_with = "lenient::opt_text")]
    story_title: Option<String>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    global_settings: Option<GlobalSettingsDef>,
    scenes: Vec<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct GlobalSettingsDef {
    #[serde(default, deserialize_with = "lenient::or_default")]
    grid_dimensions: Option<GridSize>,
}

#[derive(Debug, Deserialize)]
struct DiscSceneDef {
    #[serde(default)]
    scene_id: Value,
    #[serde(default, deserialize_with = "lenient::opt_ordinal")]
    scene_number: Option<u32>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    title: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    subtitle: Option<String>,
    #[serde(default)]
    initial_grid_layout: Option<Value>,
    #[serde(default)]
    elements_in_scene: Option<Vec<Value>>,
    #[serde(default)]
    power_distribution: Value,
    #[serde(default)]
    animation_timeline: Option<Vec<Value>>,
    #[serde(default)]
    metadata: Value,
}

/// Compress one event: delay / 3, duration capped at 3 s (absent or zero means 3 s).
pub(crate) fn compress_event(mut event: Event) -> Event {
    event.delay_seconds = finite_or_zero(event.delay_seconds) / TIME_COMPRESSION;
    let dur = finite_or_zero(event.duration_seconds);
    let dur = if dur == 0.0 { MAX_EVENT_SECS } else { dur };
    event.duration_seconds = dur.min(MAX_EVENT_SECS);
    event
}

/// `max(latest event end + 2, 10)`.
pub(crate) fn scene_duration(scene: &Scene) -> f64 {
    (scene.latest_event_end() + TAIL_SECS).max(MIN_SCENE_SECS)
}

fn finite_or_zero(x: f64) -> f64 {
    if x.is_finite() { x } else { 0.0 }
}

#[tracing::instrument(skip_all, fields(scenes = def.scenes.len()))]
pub(crate) fn normalize(def: DiscDataDef, diags: &mut Diagnostics) -> ParsedDocument {
    let grid_size = def
        .global_settings
        .and_then(|g| g.grid_dimensions)
        .unwrap_or_default();

    let root = [PathElem::Field("scenes")];
    let mut scenes = Vec::with_capacity(def.scenes.len());
    for (i, src) in decode_units::<DiscSceneDef>(&def.scenes, diags, &root) {
        let path = [PathElem::Field("scenes"), PathElem::Index(i)];
        let number = src.scene_number.unwrap_or(i as u32 + 1);

        let timeline: Vec<Event> = decode_units::<Event>(
            src.animation_timeline.as_deref().unwrap_or_default(),
            diags,
            &child(&path, PathElem::Field("animation_timeline")),
        )
        .into_iter()
        .map(|(_, e)| compress_event(e))
        .collect();

        let grid = coerce_grid(
            src.initial_grid_layout.as_ref(),
            diags,
            &child(&path, PathElem::Field("initial_grid_layout")),
        );

        let elements: Vec<Element> = decode_units::<Element>(
            src.elements_in_scene.as_deref().unwrap_or_default(),
            diags,
            &child(&path, PathElem::Field("elements_in_scene")),
        )
        .into_iter()
        .map(|(_, e)| e)
        .collect();

        let mut scene = Scene {
            id: id_string(&src.scene_id).unwrap_or_else(|| format!("scene_{number}")),
            number,
            title: src.title.unwrap_or_default(),
            subtitle: src.subtitle.unwrap_or_default(),
            grid,
            elements,
            power: parse_power(&src.power_distribution),
            timeline,
            duration: 0.0,
            metadata: src.metadata,
        };
        scene.duration = scene_duration(&scene);

        if number == 1 {
            let source_secs = scene
                .metadata
                .get("scene_duration_seconds")
                .and_then(Value::as_f64)
                .unwrap_or(60.0);
            tracing::info!(
                "timing optimized: {source_secs}s -> {:.1}s ({} events)",
                scene.duration,
                scene.timeline.len()
            );
        }
        scenes.push(scene);
    }

    ParsedDocument {
        kind: DocumentKind::DiscData,
        title: def
            .story_title
            .unwrap_or_else(|| "Grid Animation".to_owned()),
        grid_size,
        scenes,
        diagnostics: Vec::new(),
    }
}
