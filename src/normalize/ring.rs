use crate::foundation::lenient;
use crate::normalize::diag::{Diagnostics, PathElem};
use crate::normalize::{GROUP_SIZE, chunk, decode_units, default_power, id_string};
use crate::scene::grid::Grid;
use crate::scene::model::{DocumentKind, Event, GridSize, ParsedDocument, Scene};
use serde::Deserialize;
use serde_json::{Value, json};

const ENTRY_SPACING_SECS: f64 = 4.0;
const ENTRY_SECS: f64 = 3.0;

#[derive(Debug, Deserialize)]
pub(crate) struct RingMemoryDef {
    #[serde(default, rename = "contextMode")]
    context_mode: Value,
    #[serde(default)]
    mainline: Value,
    entries: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct EntryDef {
    #[serde(default)]
    id: Value,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    headline: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    summary: Option<String>,
    #[serde(default)]
    timestamp: Option<Value>,
}

impl EntryDef {
    fn into_event(self, idx: usize) -> Event {
        let text = format!(
            "{}: {}",
            self.headline.unwrap_or_default(),
            self.summary.unwrap_or_default()
        );
        let mut event = Event::new(
            "thinking_bubble",
            "system",
            idx as f64 * ENTRY_SPACING_SECS,
            ENTRY_SECS,
        )
        .with_text(text);
        event.event_id = id_string(&self.id);
        event.display_type = "thought".to_owned();
        event.timestamp = self.timestamp;
        event
    }
}

#[tracing::instrument(skip_all, fields(entries = def.entries.len()))]
pub(crate) fn normalize(def: RingMemoryDef, diags: &mut Diagnostics) -> ParsedDocument {
    let entries: Vec<EntryDef> =
        decode_units::<EntryDef>(&def.entries, diags, &[PathElem::Field("entries")])
            .into_iter()
            .map(|(_, e)| e)
            .collect();
    let power = default_power(&[("system", 0.7), ("user", 0.5), ("memory", 0.6)]);
    let metadata = json!({
        "contextMode": def.context_mode,
        "mainline": def.mainline,
    });

    let scenes = chunk(entries)
        .into_iter()
        .enumerate()
        .map(|(g, group)| {
            let start = g * GROUP_SIZE;
            let len = group.len();
            Scene {
                id: format!("ring_{start}"),
                number: g as u32 + 1,
                title: format!("Ring Memory {}", g + 1),
                subtitle: format!("Entries {}-{}", start + 1, start + len),
                grid: Grid::empty(),
                elements: Vec::new(),
                power: power.clone(),
                timeline: group
                    .into_iter()
                    .enumerate()
                    .map(|(i, e)| e.into_event(i))
                    .collect(),
                duration: len as f64 * ENTRY_SPACING_SECS,
                metadata: metadata.clone(),
            }
        })
        .collect();

    ParsedDocument {
        kind: DocumentKind::RingMemory,
        title: "Ring Memory Timeline".to_owned(),
        grid_size: GridSize::default(),
        scenes,
        diagnostics: Vec::new(),
    }
}
