use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PathElem {
    Field(&'static str),
    Index(usize),
}

pub(crate) fn child(path: &[PathElem], elem: PathElem) -> Vec<PathElem> {
    let mut p = path.to_vec();
    p.push(elem);
    p
}

pub(crate) fn format_path(path: &[PathElem]) -> String {
    let mut s = String::from("$");
    for p in path {
        match *p {
            PathElem::Field(name) => {
                s.push('.');
                s.push_str(name);
            }
            PathElem::Index(i) => {
                s.push('[');
                s.push_str(&i.to_string());
                s.push(']');
            }
        }
    }
    s
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// A scene, channel, entry or event was structurally broken and skipped.
    MalformedUnit,
    /// Input was usable after substitution (empty grid, default value).
    Warning,
}

/// A recovered normalization problem. Never surfaces as a user-facing error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// JSON path of the offending unit, e.g. `$.channels[2].messages`.
    pub path: String,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.kind {
            DiagnosticKind::MalformedUnit => "malformed",
            DiagnosticKind::Warning => "warning",
        };
        write!(f, "{tag}: {}: {}", self.path, self.message)
    }
}

/// Collects diagnostics while an adapter runs and mirrors them to the log.
#[derive(Debug, Default)]
pub(crate) struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub(crate) fn malformed(&mut self, path: &[PathElem], message: impl Into<String>) {
        self.push(DiagnosticKind::MalformedUnit, path, message.into());
    }

    pub(crate) fn warn(&mut self, path: &[PathElem], message: impl Into<String>) {
        self.push(DiagnosticKind::Warning, path, message.into());
    }

    fn push(&mut self, kind: DiagnosticKind, path: &[PathElem], message: String) {
        let path = format_path(path);
        match kind {
            DiagnosticKind::MalformedUnit => {
                tracing::warn!(%path, "skipping malformed unit: {message}")
            }
            DiagnosticKind::Warning => tracing::warn!(%path, "{message}"),
        }
        self.items.push(Diagnostic {
            kind,
            path,
            message,
        });
    }

    pub(crate) fn into_vec(self) -> Vec<Diagnostic> {
        self.items
    }
}
