use crate::foundation::lenient;
use crate::normalize::diag::{Diagnostics, PathElem};
use crate::normalize::{
    GROUP_SIZE, chunk, coerce_optional_grid, decode_units, default_power, id_string, parse_power,
    truthy,
};
use crate::scene::model::{DocumentKind, Event, GridSize, ParsedDocument, Scene};
use serde::Deserialize;
use serde_json::{Value, json};

const MESSAGE_SPACING_SECS: f64 = 4.0;
const MESSAGE_SECS: f64 = 4.0;

#[derive(Debug, Deserialize)]
pub(crate) struct ConversationDef {
    #[serde(default)]
    id: Value,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    title: Option<String>,
    #[serde(default)]
    grid: Option<Value>,
    #[serde(default)]
    power: Value,
    messages: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct ConversationMessageDef {
    #[serde(default, deserialize_with = "lenient::opt_text")]
    role: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    content: Option<String>,
    #[serde(default)]
    timestamp: Option<Value>,
}

impl ConversationMessageDef {
    fn into_event(self, idx: usize) -> Event {
        let display = if self.role.as_deref() == Some("system") {
            "system"
        } else {
            "speech"
        };
        let mut event = Event::new(
            "message",
            self.role.unwrap_or_default(),
            idx as f64 * MESSAGE_SPACING_SECS,
            MESSAGE_SECS,
        );
        event.display_type = display.to_owned();
        event.text = self.content;
        event.timestamp = self.timestamp;
        event
    }
}

#[tracing::instrument(skip_all, fields(messages = def.messages.len()))]
pub(crate) fn normalize(def: ConversationDef, diags: &mut Diagnostics) -> ParsedDocument {
    let (grid, elements) =
        coerce_optional_grid(def.grid.as_ref(), diags, &[PathElem::Field("grid")]);
    // A present power map is used as given, even when empty.
    let power = if truthy(Some(&def.power)) {
        parse_power(&def.power)
    } else {
        default_power(&[("user", 0.5), ("assistant", 0.5)])
    };
    let metadata = match id_string(&def.id) {
        Some(id) => json!({ "conversationId": id }),
        None => json!({}),
    };

    // Malformed messages are dropped before grouping so every group stays full.
    let messages: Vec<ConversationMessageDef> =
        decode_units::<ConversationMessageDef>(&def.messages, diags, &[PathElem::Field("messages")])
            .into_iter()
            .map(|(_, m)| m)
            .collect();

    let mut scenes = Vec::new();
    for (g, group) in chunk(messages).into_iter().enumerate() {
        let start = g * GROUP_SIZE;
        let len = group.len();
        scenes.push(Scene {
            id: format!("conv_{start}"),
            number: g as u32 + 1,
            title: def
                .title
                .clone()
                .unwrap_or_else(|| format!("Conversation {}", g + 1)),
            subtitle: format!("Messages {}-{}", start + 1, start + len),
            grid: grid.clone(),
            elements: elements.clone(),
            power: power.clone(),
            timeline: group
                .into_iter()
                .enumerate()
                .map(|(i, m)| m.into_event(i))
                .collect(),
            duration: len as f64 * MESSAGE_SPACING_SECS,
            metadata: metadata.clone(),
        });
    }

    ParsedDocument {
        kind: DocumentKind::Conversation,
        title: def.title.unwrap_or_else(|| "Conversation".to_owned()),
        grid_size: GridSize::default(),
        scenes,
        diagnostics: Vec::new(),
    }
}
