use crate::playback::matching::target_matches;
use serde::Serialize;

/// How an entity is drawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct EntityStyle {
    pub color: &'static str,
    pub emoji: &'static str,
    pub label: &'static str,
    /// Three-letter code for narrow layouts.
    pub compact: &'static str,
    pub symbol: &'static str,
}

const fn style(
    color: &'static str,
    emoji: &'static str,
    label: &'static str,
    compact: &'static str,
    symbol: &'static str,
) -> EntityStyle {
    EntityStyle {
        color,
        emoji,
        label,
        compact,
        symbol,
    }
}

pub const DEFAULT_STYLE: EntityStyle = style("#aef3c1", "💬", "Unknown", "???", "?");

// Lookup order matters for loose matches: the first hit wins.
const STYLES: &[(&str, EntityStyle)] = &[
    ("officer_main", style("#56ff9f", "👮", "Officer", "OFF", "O")),
    ("clancy_main", style("#569fff", "🧑", "Clancy", "CLA", "C")),
    ("apparatus", style("#ff9f56", "⚙️", "Apparatus", "APP", "A")),
    ("scholars", style("#f3ae56", "📚", "Scholar", "SCH", "S")),
    ("scholar_1", style("#f3ae56", "📚", "Scholar", "SCH", "S")),
    ("guest", style("#c78fff", "👤", "Guest", "GST", "G")),
    ("Entity", style("#56ff9f", "🧑", "Entity", "ENT", "E")),
    ("Location", style("#569fff", "📍", "Location", "LOC", "L")),
    ("Obstacle", style("#ff5c7c", "🚧", "Obstacle", "OBS", "X")),
    ("Solution", style("#56ff9f", "✨", "Solution", "SOL", "✓")),
    ("Shift", style("#c78fff", "🔄", "Shift", "SHF", "~")),
    ("Goal", style("#f8d66a", "🎯", "Goal", "GOL", "★")),
    ("user", style("#569fff", "👤", "User", "USR", "U")),
    ("assistant", style("#56ff9f", "🤖", "AI", "AST", "AI")),
    ("system", style("#888", "🖥️", "System", "SYS", "⚙")),
];

/// Resolve a style: exact key first, then the first loose match, else [`DEFAULT_STYLE`].
pub fn style_for(target: &str) -> &'static EntityStyle {
    if target.is_empty() {
        return &DEFAULT_STYLE;
    }
    STYLES
        .iter()
        .find(|(key, _)| *key == target)
        .or_else(|| STYLES.iter().find(|(key, _)| target_matches(target, key)))
        .map(|(_, s)| s)
        .unwrap_or(&DEFAULT_STYLE)
}

/// Style for a grid entity: by type, falling back to id when the type is unknown.
pub fn style_for_entity(kind: &str, id: &str) -> &'static EntityStyle {
    let by_kind = style_for(kind);
    if by_kind == &DEFAULT_STYLE {
        style_for(id)
    } else {
        by_kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_wins_over_loose() {
        assert_eq!(style_for("scholar_1").label, "Scholar");
        assert_eq!(style_for("user").compact, "USR");
    }

    #[test]
    fn loose_match_takes_first_entry() {
        assert_eq!(style_for("officer").label, "Officer");
        assert_eq!(style_for("Officer_Main_2").label, "Officer");
        assert_eq!(style_for("GOAL_reached").symbol, "★");
        // Single-letter grid symbols match loosely too.
        assert_eq!(style_for("O").label, "Officer");
    }

    #[test]
    fn unknown_targets_get_default() {
        assert_eq!(style_for(""), &DEFAULT_STYLE);
        assert_eq!(style_for("zzz"), &DEFAULT_STYLE);
    }

    #[test]
    fn entity_style_falls_back_to_id() {
        assert_eq!(style_for_entity("O", "officer_main").label, "Officer");
        assert_eq!(style_for_entity("Obstacle", "cell_0_0").label, "Obstacle");
        assert_eq!(style_for_entity("default", "unknown"), &DEFAULT_STYLE);
    }
}
