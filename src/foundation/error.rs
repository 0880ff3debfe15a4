/// Crate-wide result alias.
pub type PlayerResult<T> = Result<T, PlayerError>;

/// Errors produced by the library.
///
/// Only [`PlayerError::Parse`] and [`PlayerError::UnknownFormat`] abort a document load; see
/// [`LoadError`]. Malformed units inside a valid document are recovered locally and reported as
/// diagnostics instead.
#[derive(thiserror::Error, Debug)]
pub enum PlayerError {
    #[error("parse error: {0}")]
    Parse(String),

    #[error("unknown data format. Found keys: {}", .keys.join(", "))]
    UnknownFormat { keys: Vec<String> },

    #[error("no scenes found in data")]
    EmptyResult,

    #[error("playback error: {0}")]
    Playback(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serde(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PlayerError {
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    pub fn unknown_format<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::UnknownFormat {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    pub fn playback(msg: impl Into<String>) -> Self {
        Self::Playback(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// `true` for the errors that abort a load and leave the previous document in place.
    pub fn aborts_load(&self) -> bool {
        matches!(self, Self::Parse(_) | Self::UnknownFormat { .. })
    }
}

/// Hard failure of a document load.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// Input text is not valid JSON.
    #[error("parse error: {0}")]
    Parse(String),

    /// No adapter matched the document's top-level keys.
    #[error("unknown data format. Found keys: {}", .keys.join(", "))]
    UnknownFormat { keys: Vec<String> },
}

impl From<LoadError> for PlayerError {
    fn from(e: LoadError) -> Self {
        match e {
            LoadError::Parse(msg) => Self::Parse(msg),
            LoadError::UnknownFormat { keys } => Self::UnknownFormat { keys },
        }
    }
}

impl From<serde_json::Error> for LoadError {
    fn from(e: serde_json::Error) -> Self {
        Self::Parse(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_json_becomes_a_load_parse_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{oops").unwrap_err();
        let line = json_err.line();
        let err = LoadError::from(json_err);
        let LoadError::Parse(msg) = &err else {
            panic!("expected parse error, got {err:?}");
        };
        assert!(msg.contains(&format!("line {line}")));
        assert!(PlayerError::from(err).aborts_load());
    }

    #[test]
    fn unknown_format_lists_keys() {
        let err = PlayerError::unknown_format(["foo", "bar"]);
        assert_eq!(
            err.to_string(),
            "unknown data format. Found keys: foo, bar"
        );
        assert_eq!(
            LoadError::UnknownFormat { keys: vec![] }.to_string(),
            "unknown data format. Found keys: "
        );
    }

    #[test]
    fn only_load_failures_abort_a_load() {
        assert!(PlayerError::parse("eof").aborts_load());
        assert!(PlayerError::unknown_format(["x"]).aborts_load());
        assert!(!PlayerError::EmptyResult.aborts_load());
        assert!(!PlayerError::playback("no such scene").aborts_load());
        assert!(!PlayerError::config("bad speed").aborts_load());
    }

    #[test]
    fn load_error_keeps_its_payload_when_widened() {
        let err: PlayerError = LoadError::UnknownFormat {
            keys: vec!["foo".to_owned()],
        }
        .into();
        assert!(matches!(err, PlayerError::UnknownFormat { ref keys } if keys == &["foo"]));
        assert_eq!(PlayerError::EmptyResult.to_string(), "no scenes found in data");
    }
}
