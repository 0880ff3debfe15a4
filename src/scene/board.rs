use crate::config::DisplayMode;
use crate::foundation::core::GRID_SIZE;
use crate::playback::matching::contains_ignore_case;
use crate::present::style::{EntityStyle, style_for, style_for_entity};
use crate::scene::model::Scene;
use serde::Serialize;

/// Neighbour search order for bubble placement: adjacent first, then diagonals.
const NEIGHBOURS: [(isize, isize); 8] = [
    (0, 1),
    (0, -1),
    (1, 0),
    (-1, 0),
    (1, 1),
    (1, -1),
    (-1, 1),
    (-1, -1),
];

/// The entity resolved for an occupied cell.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CellEntity {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub style: &'static EntityStyle,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CellView {
    /// 0-based.
    pub row: usize,
    /// 0-based.
    pub col: usize,
    /// Grid symbol; empty for an empty cell.
    pub symbol: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<CellEntity>,
}

impl CellView {
    pub fn is_occupied(&self) -> bool {
        !self.symbol.is_empty()
    }

    /// Text to draw: the grid symbol, or the entity's emoji in iconographic mode.
    pub fn display(&self, mode: DisplayMode) -> &str {
        match (&self.entity, mode) {
            (Some(e), DisplayMode::Iconographic) => e.style.emoji,
            _ => &self.symbol,
        }
    }
}

/// Per-cell view model of one scene's grid.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Board {
    cells: Vec<CellView>,
}

impl Board {
    pub fn from_scene(scene: &Scene) -> Self {
        let cells = scene
            .grid
            .cells()
            .map(|(row, col, symbol)| {
                let entity = (!symbol.is_empty()).then(|| {
                    let element = scene.element_at(row, col);
                    let id = element
                        .map(|e| e.id.as_str())
                        .filter(|s| !s.is_empty())
                        .unwrap_or("unknown");
                    let kind = element
                        .map(|e| if e.kind.is_empty() { e.id.as_str() } else { e.kind.as_str() })
                        .filter(|s| !s.is_empty())
                        .unwrap_or("default");
                    let name = element
                        .and_then(|e| e.name.as_deref())
                        .filter(|s| !s.is_empty())
                        .or_else(|| element.map(|e| e.id.as_str()).filter(|s| !s.is_empty()))
                        .unwrap_or("Unknown");
                    CellEntity {
                        id: id.to_owned(),
                        kind: kind.to_owned(),
                        name: name.to_owned(),
                        style: style_for_entity(kind, id),
                    }
                });
                CellView {
                    row,
                    col,
                    symbol: symbol.to_owned(),
                    entity,
                }
            })
            .collect();
        Self { cells }
    }

    pub fn cells(&self) -> &[CellView] {
        &self.cells
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&CellView> {
        if row < GRID_SIZE && col < GRID_SIZE {
            self.cells.get(row * GRID_SIZE + col)
        } else {
            None
        }
    }

    pub fn occupied(&self) -> impl Iterator<Item = &CellView> + '_ {
        self.cells.iter().filter(|c| c.is_occupied())
    }

    /// Cells whose entity id contains `target` (case-insensitive), row-major.
    pub fn matching_cells(&self, target: &str) -> Vec<&CellView> {
        self.cells
            .iter()
            .filter(|c| {
                c.entity
                    .as_ref()
                    .is_some_and(|e| contains_ignore_case(&e.id, target))
            })
            .collect()
    }

    /// Nearest empty neighbour of the first cell matching `target`.
    pub fn bubble_slot(&self, target: &str) -> Option<(usize, usize)> {
        let anchor = self.matching_cells(target).into_iter().next()?;
        NEIGHBOURS.iter().find_map(|&(dr, dc)| {
            let row = anchor.row.checked_add_signed(dr)?;
            let col = anchor.col.checked_add_signed(dc)?;
            self.cell(row, col)
                .filter(|c| !c.is_occupied())
                .map(|c| (c.row, c.col))
        })
    }

    /// Turn the bubble slot of `target` into a transient message entity.
    ///
    /// Returns the cell used; `None` when the target is absent or fully surrounded.
    pub fn place_bubble(&mut self, target: &str, text: &str) -> Option<(usize, usize)> {
        let (row, col) = self.bubble_slot(target)?;
        let style = style_for(target);
        let cell = &mut self.cells[row * GRID_SIZE + col];
        cell.symbol = "💬".to_owned();
        cell.entity = Some(CellEntity {
            id: format!("{target}_msg"),
            kind: "message".to_owned(),
            name: format!("{}: {text}", style.label),
            style,
        });
        Some((row, col))
    }

    /// Empty a cell again (a bubble's lifetime ran out).
    pub fn clear_cell(&mut self, row: usize, col: usize) {
        if row < GRID_SIZE && col < GRID_SIZE {
            let cell = &mut self.cells[row * GRID_SIZE + col];
            cell.symbol.clear();
            cell.entity = None;
        }
    }

    /// One line per row, `.` for empty cells.
    pub fn render_text(&self, mode: DisplayMode) -> String {
        let mut out = String::new();
        for row in self.cells.chunks(GRID_SIZE) {
            let line: Vec<&str> = row
                .iter()
                .map(|c| if c.is_occupied() { c.display(mode) } else { "." })
                .collect();
            out.push_str(&line.join(" "));
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::core::GridPos;
    use crate::scene::grid::Grid;
    use crate::scene::model::Element;
    use serde_json::Value;
    use std::collections::BTreeMap;

    fn scene_with(cells: &[(usize, usize, &str)], elements: Vec<Element>) -> Scene {
        let mut rows = vec![vec![String::new(); GRID_SIZE]; GRID_SIZE];
        for &(r, c, s) in cells {
            rows[r][c] = s.to_owned();
        }
        Scene {
            id: "s".to_owned(),
            number: 1,
            title: String::new(),
            subtitle: String::new(),
            grid: Grid::from_rows(rows),
            elements,
            power: BTreeMap::new(),
            timeline: vec![],
            duration: 10.0,
            metadata: Value::Null,
        }
    }

    fn officer_at(row: i64, col: i64) -> Element {
        Element {
            id: "officer_main".to_owned(),
            kind: "officer".to_owned(),
            name: Some("Officer K".to_owned()),
            grid_symbol: Some("O".to_owned()),
            initial_grid_position: Some(GridPos::new(row, col)),
            extra: BTreeMap::new(),
        }
    }

    #[test]
    fn resolves_entities_and_defaults() {
        let s = scene_with(&[(2, 3, "O"), (5, 5, "?")], vec![officer_at(3, 4)]);
        let b = Board::from_scene(&s);
        assert_eq!(b.cells().len(), 81);
        let e = b.cell(2, 3).unwrap().entity.as_ref().unwrap();
        assert_eq!(e.id, "officer_main");
        assert_eq!(e.name, "Officer K");
        assert_eq!(e.style.label, "Officer");

        let unknown = b.cell(5, 5).unwrap().entity.as_ref().unwrap();
        assert_eq!(
            (unknown.id.as_str(), unknown.kind.as_str(), unknown.name.as_str()),
            ("unknown", "default", "Unknown")
        );
        assert!(b.cell(0, 0).unwrap().entity.is_none());
        assert_eq!(b.occupied().count(), 2);
    }

    #[test]
    fn matching_is_one_directional_on_cell_ids() {
        let s = scene_with(&[(2, 3, "O")], vec![officer_at(3, 4)]);
        let b = Board::from_scene(&s);
        assert_eq!(b.matching_cells("OFFICER").len(), 1);
        assert!(b.matching_cells("officer_main_extra").is_empty());
        assert!(b.matching_cells("").is_empty());
    }

    #[test]
    fn bubble_prefers_right_then_left() {
        let s = scene_with(&[(2, 3, "O")], vec![officer_at(3, 4)]);
        assert_eq!(Board::from_scene(&s).bubble_slot("officer"), Some((2, 4)));

        let s = scene_with(&[(2, 3, "O"), (2, 4, "X")], vec![officer_at(3, 4)]);
        assert_eq!(Board::from_scene(&s).bubble_slot("officer"), Some((2, 2)));
    }

    #[test]
    fn bubble_respects_edges_and_crowding() {
        let s = scene_with(&[(0, 8, "O")], vec![officer_at(1, 9)]);
        // Right is off-grid, left is free.
        assert_eq!(Board::from_scene(&s).bubble_slot("officer"), Some((0, 7)));

        let mut cells = vec![(4, 4, "O")];
        for (dr, dc) in NEIGHBOURS {
            cells.push(((4 + dr) as usize, (4 + dc) as usize, "X"));
        }
        let s = scene_with(&cells, vec![officer_at(5, 5)]);
        assert_eq!(Board::from_scene(&s).bubble_slot("officer"), None);
        assert_eq!(Board::from_scene(&s).bubble_slot("clancy"), None);
    }

    #[test]
    fn placed_bubbles_occupy_until_cleared() {
        let s = scene_with(&[(2, 3, "O")], vec![officer_at(3, 4)]);
        let mut b = Board::from_scene(&s);
        assert_eq!(b.place_bubble("officer", "halt"), Some((2, 4)));
        assert_eq!(b.place_bubble("officer_main", "again"), Some((2, 2)));
        let msg = b.cell(2, 4).unwrap().entity.as_ref().unwrap();
        assert_eq!(msg.id, "officer_msg");
        assert_eq!(msg.name, "Officer: halt");
        b.clear_cell(2, 4);
        assert!(!b.cell(2, 4).unwrap().is_occupied());
    }

    #[test]
    fn text_rendering_by_mode() {
        let s = scene_with(&[(0, 0, "O")], vec![officer_at(1, 1)]);
        let b = Board::from_scene(&s);
        let sym = b.render_text(DisplayMode::Symbolic);
        assert!(sym.starts_with("O . ."));
        assert_eq!(sym.lines().count(), 9);
        assert!(b.render_text(DisplayMode::Iconographic).starts_with("👮"));
    }
}
