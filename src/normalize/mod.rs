//! Format detection and normalization.
//!
//! A parsed JSON document is matched against an ordered table of top-level key predicates; the
//! first match selects one of four source shapes, which is decoded into its boundary model and
//! normalized into [`ParsedDocument`]. Problems inside individual units (a channel, a scene, an
//! entry) are recovered locally and recorded as diagnostics.

pub(crate) mod channels;
pub(crate) mod conversation;
pub mod diag;
pub(crate) mod disc;
pub(crate) mod ring;

use crate::foundation::error::LoadError;
use crate::normalize::diag::{Diagnostics, PathElem, child};
use crate::scene::grid::{Grid, GridIssue};
use crate::scene::model::{DocumentKind, Element, ParsedDocument, PowerScore};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Group size used by the chunking adapters and as the channel segmentation cap.
pub(crate) const GROUP_SIZE: usize = 5;

/// The four recognised source shapes, in detection priority order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SourceFormat {
    /// `scenes` + `global_elements_legend`.
    DiscData,
    /// `channels` list.
    MultiChannel,
    /// Bare `messages` list.
    Conversation,
    /// `entries` list.
    RingMemory,
}

impl SourceFormat {
    pub fn kind(self) -> DocumentKind {
        match self {
            Self::DiscData => DocumentKind::DiscData,
            Self::MultiChannel => DocumentKind::MultiChannel,
            Self::Conversation => DocumentKind::Conversation,
            Self::RingMemory => DocumentKind::RingMemory,
        }
    }
}

struct Detector {
    format: SourceFormat,
    matches: fn(&Map<String, Value>) -> bool,
}

const DETECTORS: [Detector; 4] = [
    Detector {
        format: SourceFormat::DiscData,
        matches: |doc: &Map<String, Value>| {
            truthy(doc.get("scenes")) && truthy(doc.get("global_elements_legend"))
        },
    },
    Detector {
        format: SourceFormat::MultiChannel,
        matches: |doc: &Map<String, Value>| matches!(doc.get("channels"), Some(Value::Array(_))),
    },
    Detector {
        format: SourceFormat::Conversation,
        matches: |doc: &Map<String, Value>| matches!(doc.get("messages"), Some(Value::Array(_))),
    },
    Detector {
        format: SourceFormat::RingMemory,
        matches: |doc: &Map<String, Value>| matches!(doc.get("entries"), Some(Value::Array(_))),
    },
];

// Presence test: absent, null, false, zero and "" count as missing.
pub(crate) fn truthy(v: Option<&Value>) -> bool {
    match v {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|x| x != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

/// Pick the source shape of a document. First match in priority order wins.
pub fn detect(value: &Value) -> Result<SourceFormat, LoadError> {
    let Value::Object(doc) = value else {
        return Err(LoadError::UnknownFormat { keys: Vec::new() });
    };
    DETECTORS
        .iter()
        .find(|d| (d.matches)(doc))
        .map(|d| d.format)
        .ok_or_else(|| LoadError::UnknownFormat {
            keys: doc.keys().cloned().collect(),
        })
}

/// Decoded boundary model of each source shape.
pub(crate) enum SourceDocument {
    DiscData(disc::DiscDataDef),
    MultiChannel(channels::ChannelsDef),
    Conversation(conversation::ConversationDef),
    RingMemory(ring::RingMemoryDef),
}

impl SourceDocument {
    fn decode(format: SourceFormat, value: &Value) -> Result<Self, serde_json::Error> {
        Ok(match format {
            SourceFormat::DiscData => Self::DiscData(disc::DiscDataDef::deserialize(value)?),
            SourceFormat::MultiChannel => {
                Self::MultiChannel(channels::ChannelsDef::deserialize(value)?)
            }
            SourceFormat::Conversation => {
                Self::Conversation(conversation::ConversationDef::deserialize(value)?)
            }
            SourceFormat::RingMemory => {
                Self::RingMemory(ring::RingMemoryDef::deserialize(value)?)
            }
        })
    }

    fn normalize(self, diags: &mut Diagnostics) -> ParsedDocument {
        match self {
            Self::DiscData(def) => disc::normalize(def, diags),
            Self::MultiChannel(def) => channels::normalize(def, diags),
            Self::Conversation(def) => conversation::normalize(def, diags),
            Self::RingMemory(def) => ring::normalize(def, diags),
        }
    }
}

/// Detect and normalize, failing only when no adapter matches.
///
/// A document whose shape matched but whose top-level structure cannot be decoded yields the
/// error document (`type = "error"`, no scenes) with a diagnostic.
pub fn normalize(value: &Value) -> Result<ParsedDocument, LoadError> {
    let format = detect(value)?;
    tracing::debug!(?format, "detected data format");

    let mut diags = Diagnostics::default();
    let mut doc = match SourceDocument::decode(format, value) {
        Ok(source) => source.normalize(&mut diags),
        Err(e) => {
            diags.malformed(&[], format!("{} document: {e}", format.kind()));
            ParsedDocument::error()
        }
    };
    doc.diagnostics = diags.into_vec();
    tracing::debug!(kind = %doc.kind, scenes = doc.scenes.len(), "normalized document");
    Ok(doc)
}

/// Detect and normalize an arbitrary JSON value. Never fails.
///
/// Unknown shapes produce the error document (`type = "error"`, title `"Parse Error"`, no
/// scenes).
pub fn detect_and_parse(value: &Value) -> ParsedDocument {
    match normalize(value) {
        Ok(doc) => doc,
        Err(e) => {
            tracing::error!("{e}");
            ParsedDocument::error()
        }
    }
}

/// Parse JSON text and normalize it.
pub fn load_document(text: &str) -> Result<ParsedDocument, LoadError> {
    let value: Value = serde_json::from_str(text)?;
    normalize(&value)
}

pub(crate) fn id_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Coerce a grid and log what was wrong with it.
pub(crate) fn coerce_grid(
    value: Option<&Value>,
    diags: &mut Diagnostics,
    path: &[PathElem],
) -> Grid {
    let (grid, issue) = Grid::coerce(value);
    if let Some(issue) = issue {
        diags.warn(path, issue.to_string());
    }
    grid
}

/// Like [`coerce_grid`], but an absent grid is expected and not reported.
pub(crate) fn coerce_optional_grid(
    value: Option<&Value>,
    diags: &mut Diagnostics,
    path: &[PathElem],
) -> (Grid, Vec<Element>) {
    let (grid, issue) = Grid::coerce(value);
    match issue {
        Some(GridIssue::Missing) => (grid, Vec::new()),
        Some(issue) => {
            diags.warn(path, issue.to_string());
            let elements = grid.extract_elements();
            (grid, elements)
        }
        None => {
            let elements = grid.extract_elements();
            (grid, elements)
        }
    }
}

/// Read a power map: `{name: {score}}` or `{name: number}`. Unusable entries are dropped.
pub(crate) fn parse_power(value: &Value) -> BTreeMap<String, PowerScore> {
    let Value::Object(map) = value else {
        return BTreeMap::new();
    };
    map.iter()
        .filter_map(|(name, v)| {
            let score = match v {
                Value::Number(n) => n.as_f64(),
                Value::Object(o) => o.get("score").and_then(Value::as_f64),
                _ => None,
            }?;
            Some((name.clone(), PowerScore::new(score)))
        })
        .collect()
}

pub(crate) fn default_power(entries: &[(&str, f64)]) -> BTreeMap<String, PowerScore> {
    entries
        .iter()
        .map(|&(name, score)| (name.to_owned(), PowerScore::new(score)))
        .collect()
}

/// Decode each item of a unit list, skipping (and reporting) the ones that fail.
pub(crate) fn decode_units<'a, T>(
    items: &'a [Value],
    diags: &mut Diagnostics,
    path: &[PathElem],
) -> Vec<(usize, T)>
where
    T: Deserialize<'a>,
{
    let mut out = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        match T::deserialize(item) {
            Ok(unit) => out.push((i, unit)),
            Err(e) => {
                diags.malformed(&child(path, PathElem::Index(i)), e.to_string());
            }
        }
    }
    out
}

/// Split into consecutive groups of at most [`GROUP_SIZE`].
pub(crate) fn chunk<T>(items: Vec<T>) -> Vec<Vec<T>> {
    let mut groups = Vec::new();
    let mut iter = items.into_iter().peekable();
    while iter.peek().is_some() {
        groups.push(iter.by_ref().take(GROUP_SIZE).collect());
    }
    groups
}
