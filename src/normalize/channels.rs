use crate::foundation::lenient;
use crate::normalize::diag::{Diagnostics, PathElem, child};
use crate::normalize::{GROUP_SIZE, coerce_grid, decode_units, id_string};
use crate::scene::model::{DocumentKind, Event, GridSize, ParsedDocument, PowerScore, Scene};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Seconds between consecutive messages of a scene.
const MESSAGE_SPACING_SECS: f64 = 5.0;
const MESSAGE_SECS: f64 = 4.0;

#[derive(Debug, Deserialize)]
pub(crate) struct ChannelsDef {
    channels: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct ChannelDef {
    #[serde(default)]
    id: Value,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    name: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    scenario: Option<String>,
    #[serde(default)]
    grid: Option<Value>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    scorecard: Option<ScorecardDef>,
    #[serde(default, rename = "channelColor")]
    channel_color: Value,
    #[serde(default)]
    messages: Value,
}

#[derive(Debug, Default, Deserialize)]
struct ScorecardDef {
    #[serde(default, deserialize_with = "lenient::or_default")]
    officer: Option<f64>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    clancy: Option<f64>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    apparatus: Option<f64>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    scholars: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct MessageDef {
    #[serde(default)]
    id: Value,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    role: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    content: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    text: Option<String>,
    #[serde(default)]
    timestamp: Option<Value>,
}

impl MessageDef {
    fn is_system(&self) -> bool {
        self.role.as_deref() == Some("system")
    }
}

/// Greedy segmentation: a message joins the open group, which closes once it holds
/// [`GROUP_SIZE`] messages or when a `system` message lands in a group that already had one.
/// A trailing partial group is always flushed.
pub(crate) fn segment<T>(messages: Vec<T>, is_system: impl Fn(&T) -> bool) -> Vec<Vec<T>> {
    let mut groups = Vec::new();
    let mut current = Vec::new();
    for msg in messages {
        let system = is_system(&msg);
        current.push(msg);
        if current.len() >= GROUP_SIZE || (system && current.len() > 1) {
            groups.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        groups.push(current);
    }
    groups
}

// Zero or missing scores fall back to the default.
fn score_or(v: Option<f64>, default: f64) -> PowerScore {
    match v {
        Some(x) if x != 0.0 && x.is_finite() => PowerScore::new(x),
        _ => PowerScore::new(default),
    }
}

fn channel_power(card: &ScorecardDef) -> BTreeMap<String, PowerScore> {
    BTreeMap::from([
        ("officer".to_owned(), score_or(card.officer, 0.5)),
        ("clancy".to_owned(), score_or(card.clancy, 0.5)),
        ("apparatus".to_owned(), score_or(card.apparatus, 0.3)),
        ("scholars".to_owned(), score_or(card.scholars, 0.2)),
    ])
}

fn message_event(msg: &MessageDef, idx: usize) -> Event {
    let role = msg.role.clone().unwrap_or_else(|| "user".to_owned());
    let text = [&msg.content, &msg.text]
        .into_iter()
        .flatten()
        .find(|t| !t.is_empty())
        .cloned()
        .unwrap_or_default();

    let mut event = Event::new(
        if msg.role.as_deref() == Some("user") {
            "speech_bubble"
        } else {
            "thinking_bubble"
        },
        role,
        idx as f64 * MESSAGE_SPACING_SECS,
        MESSAGE_SECS,
    )
    .with_text(text);
    event.event_id = Some(id_string(&msg.id).unwrap_or_else(|| format!("msg_{idx}")));
    event.display_type = if msg.is_system() { "system" } else { "speech" }.to_owned();
    event.timestamp = msg.timestamp.clone();
    event
}

#[tracing::instrument(skip_all, fields(channels = def.channels.len()))]
pub(crate) fn normalize(def: ChannelsDef, diags: &mut Diagnostics) -> ParsedDocument {
    let root = [PathElem::Field("channels")];
    let mut scenes: Vec<Scene> = Vec::new();

    for (ch_idx, channel) in decode_units::<ChannelDef>(&def.channels, diags, &root) {
        let path = child(&root, PathElem::Index(ch_idx));
        let name = channel.name.clone().unwrap_or_else(|| "Unnamed".to_owned());

        let Value::Array(raw_messages) = &channel.messages else {
            diags.warn(
                &child(&path, PathElem::Field("messages")),
                format!("channel '{name}' has no messages, skipping"),
            );
            continue;
        };
        tracing::debug!(channel = %name, messages = raw_messages.len(), "parsing channel");

        let messages: Vec<MessageDef> = decode_units::<MessageDef>(
            raw_messages,
            diags,
            &child(&path, PathElem::Field("messages")),
        )
        .into_iter()
        .map(|(_, m)| m)
        .collect();

        let grid = coerce_grid(
            channel.grid.as_ref(),
            diags,
            &child(&path, PathElem::Field("grid")),
        );
        let elements = grid.extract_elements();
        let power = channel_power(&channel.scorecard.unwrap_or_default());

        let mut metadata = Map::new();
        if !channel.id.is_null() {
            metadata.insert("channelId".to_owned(), channel.id.clone());
        }
        if !channel.channel_color.is_null() {
            metadata.insert("channelColor".to_owned(), channel.channel_color.clone());
        }
        let metadata = Value::Object(metadata);

        let groups = segment(messages, MessageDef::is_system);
        let group_count = groups.len();
        for (scene_idx, group) in groups.into_iter().enumerate() {
            scenes.push(Scene {
                id: format!("ch{ch_idx}_s{scene_idx}"),
                number: scenes.len() as u32 + 1,
                title: format!("{name} - Scene {}", scene_idx + 1),
                subtitle: channel
                    .scenario
                    .clone()
                    .unwrap_or_else(|| "Conversation".to_owned()),
                grid: grid.clone(),
                elements: elements.clone(),
                power: power.clone(),
                timeline: group
                    .iter()
                    .enumerate()
                    .map(|(i, m)| message_event(m, i))
                    .collect(),
                duration: group.len() as f64 * MESSAGE_SPACING_SECS,
                metadata: metadata.clone(),
            });
        }
        tracing::debug!(channel = %name, scenes = group_count, "channel parsed");
    }

    ParsedDocument {
        kind: DocumentKind::MultiChannel,
        title: "LEGOS Multi-Channel".to_owned(),
        grid_size: GridSize::default(),
        scenes,
        diagnostics: Vec::new(),
    }
}
