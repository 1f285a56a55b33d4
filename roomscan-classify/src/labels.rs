//! Plane label set

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Semantic type of a room plane
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaneLabel {
    #[default]
    Wall,
    Floor,
    Ceiling,
    Door,
    Window,
    Reveal,
    Frame,
}

impl PlaneLabel {
    /// Every label, in model index order
    pub const ALL: [PlaneLabel; 7] = [
        PlaneLabel::Wall,
        PlaneLabel::Floor,
        PlaneLabel::Ceiling,
        PlaneLabel::Door,
        PlaneLabel::Window,
        PlaneLabel::Reveal,
        PlaneLabel::Frame,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PlaneLabel::Wall => "wall",
            PlaneLabel::Floor => "floor",
            PlaneLabel::Ceiling => "ceiling",
            PlaneLabel::Door => "door",
            PlaneLabel::Window => "window",
            PlaneLabel::Reveal => "reveal",
            PlaneLabel::Frame => "frame",
        }
    }

    /// Position in [`PlaneLabel::ALL`]
    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for PlaneLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlaneLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PlaneLabel::ALL
            .into_iter()
            .find(|label| label.as_str() == s)
            .ok_or_else(|| format!("unknown plane label: {s}"))
    }
}
