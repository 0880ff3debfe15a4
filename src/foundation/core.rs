/// Number of rows and columns of every scene grid.
pub const GRID_SIZE: usize = 9;

/// 1-based grid coordinate as carried by elements and movement events.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct GridPos {
    /// Row, 1-based.
    pub row: i64,
    /// Column, 1-based.
    pub col: i64,
}

impl GridPos {
    pub fn new(row: i64, col: i64) -> Self {
        Self { row, col }
    }

    /// Promote a 0-based cell index to a 1-based position.
    pub fn from_cell(row: usize, col: usize) -> Self {
        Self {
            row: row as i64 + 1,
            col: col as i64 + 1,
        }
    }

    /// 0-based cell index, when the position lies on the grid.
    pub fn to_cell(self) -> Option<(usize, usize)> {
        let in_range = |v: i64| (1..=GRID_SIZE as i64).contains(&v);
        if in_range(self.row) && in_range(self.col) {
            Some(((self.row - 1) as usize, (self.col - 1) as usize))
        } else {
            None
        }
    }
}

pub trait Lerp: Sized {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self;
}

impl Lerp for f64 {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        a + (b - a) * t
    }
}

impl Lerp for GridPos {
    // Grid positions snap to the nearest cell.
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        let step = |x: i64, y: i64| (x as f64 + (y - x) as f64 * t).round() as i64;
        Self {
            row: step(a.row, b.row),
            col: step(a.col, b.col),
        }
    }
}

/// Format seconds as `m:ss`.
pub fn format_time(seconds: f64) -> String {
    let total = if seconds.is_finite() {
        seconds.max(0.0)
    } else {
        0.0
    };
    let mins = (total / 60.0).floor() as u64;
    let secs = (total % 60.0).floor() as u64;
    format!("{mins}:{secs:02}")
}
