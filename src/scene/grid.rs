use crate::foundation::core::{GRID_SIZE, GridPos};
use crate::scene::model::Element;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A scene grid. Always exactly [`GRID_SIZE`] x [`GRID_SIZE`] string cells; an empty string
/// marks an empty cell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    rows: Vec<Vec<String>>,
}

/// Why a source grid could not be used as-is.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GridIssue {
    /// Absent or `null`.
    Missing,
    /// Present but not an array of rows.
    NotArray,
    /// An empty array.
    Empty,
    /// Usable, but rows/cells were padded, truncated, or replaced.
    Reshaped(String),
}

impl GridIssue {
    /// `true` when the source was discarded and an empty grid substituted.
    pub fn replaced(&self) -> bool {
        !matches!(self, Self::Reshaped(_))
    }
}

impl std::fmt::Display for GridIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing => write!(f, "grid is missing, using empty"),
            Self::NotArray => write!(f, "grid is not an array, using empty"),
            Self::Empty => write!(f, "grid is empty, using empty"),
            Self::Reshaped(detail) => write!(f, "grid reshaped to 9x9: {detail}"),
        }
    }
}

impl Default for Grid {
    fn default() -> Self {
        Self::empty()
    }
}

impl Grid {
    /// All-empty 9x9 grid.
    pub fn empty() -> Self {
        Self {
            rows: vec![vec![String::new(); GRID_SIZE]; GRID_SIZE],
        }
    }

    /// Build from string rows, padding or truncating to 9x9.
    pub fn from_rows(rows: Vec<Vec<String>>) -> Self {
        let mut out = Self::empty();
        for (r, row) in rows.into_iter().take(GRID_SIZE).enumerate() {
            for (c, cell) in row.into_iter().take(GRID_SIZE).enumerate() {
                out.rows[r][c] = cell;
            }
        }
        out
    }

    /// Coerce an arbitrary JSON value into a grid.
    ///
    /// Never fails: unusable input yields an empty grid together with the issue found.
    pub fn coerce(value: Option<&Value>) -> (Self, Option<GridIssue>) {
        let rows = match value {
            None | Some(Value::Null) => return (Self::empty(), Some(GridIssue::Missing)),
            Some(Value::Array(rows)) if rows.is_empty() => {
                return (Self::empty(), Some(GridIssue::Empty));
            }
            Some(Value::Array(rows)) => rows,
            Some(_) => return (Self::empty(), Some(GridIssue::NotArray)),
        };

        let mut grid = Self::empty();
        let mut problems = Vec::new();
        if rows.len() != GRID_SIZE {
            problems.push(format!("{} rows", rows.len()));
        }

        for (r, row) in rows.iter().take(GRID_SIZE).enumerate() {
            let Value::Array(cells) = row else {
                problems.push(format!("row {r} is not an array"));
                continue;
            };
            if cells.len() != GRID_SIZE {
                problems.push(format!("row {r} has {} cells", cells.len()));
            }
            for (c, cell) in cells.iter().take(GRID_SIZE).enumerate() {
                grid.rows[r][c] = match cell {
                    Value::String(s) => s.clone(),
                    Value::Number(n) => n.to_string(),
                    Value::Bool(b) => b.to_string(),
                    Value::Null => String::new(),
                    Value::Array(_) | Value::Object(_) => {
                        problems.push(format!("cell ({r},{c}) is not a scalar"));
                        String::new()
                    }
                };
            }
        }

        let issue = (!problems.is_empty()).then(|| GridIssue::Reshaped(problems.join("; ")));
        (grid, issue)
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Cell at a 0-based index; out-of-range reads as empty.
    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn is_occupied(&self, row: usize, col: usize) -> bool {
        !self.cell(row, col).is_empty()
    }

    /// Row-major iterator over `(row, col, symbol)` with 0-based indices.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, &str)> + '_ {
        self.rows.iter().enumerate().flat_map(|(r, row)| {
            row.iter()
                .enumerate()
                .map(move |(c, cell)| (r, c, cell.as_str()))
        })
    }

    pub fn occupied_count(&self) -> usize {
        self.cells().filter(|(_, _, s)| !s.is_empty()).count()
    }

    /// Derive one element per occupied cell, row-major.
    ///
    /// Ids are `cell_{row}_{col}` with 0-based indices; positions are 1-based.
    pub fn extract_elements(&self) -> Vec<Element> {
        self.cells()
            .filter(|(_, _, symbol)| !symbol.is_empty())
            .map(|(r, c, symbol)| Element {
                id: format!("cell_{r}_{c}"),
                kind: symbol.to_owned(),
                name: None,
                grid_symbol: Some(symbol.to_owned()),
                initial_grid_position: Some(GridPos::from_cell(r, c)),
                extra: Default::default(),
            })
            .collect()
    }
}

impl Serialize for Grid {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.rows.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Grid {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let rows = Vec::<Vec<String>>::deserialize(deserializer)?;
        Ok(Self::from_rows(rows))
    }
}
