extern crate serde;

use serde::{Serialize, Deserialize};
use crate::command::Command;

/// Horizontal placement of a line or a table column
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Justification {
    Left,
    Center,
    Right
}

impl Default for Justification {
    fn default() -> Justification {
        Justification::Left
    }
}

impl Justification {
    /// The alignment command the printer needs for this justification
    pub fn command(&self) -> Command {
        match self {
            Justification::Left => Command::AlignLeft,
            Justification::Center => Command::AlignCenter,
            Justification::Right => Command::AlignRight
        }
    }
}
