//! Customizable keybindings for the region editor.
//!
//! Keys are named the way the browser's `KeyboardEvent.key` names them, so
//! bindings round-trip through the config file as plain strings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::editor::DrawTool;

/// A key as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Key {
    Enter,
    Escape,
    Backspace,
    Delete,
    /// A printable key, stored uppercase.
    Char(char),
}

impl FromStr for Key {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Enter" => Ok(Key::Enter),
            "Escape" | "Esc" => Ok(Key::Escape),
            "Backspace" => Ok(Key::Backspace),
            "Delete" | "Del" => Ok(Key::Delete),
            _ => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) if !c.is_control() && !c.is_whitespace() => {
                        Ok(Key::Char(c.to_ascii_uppercase()))
                    }
                    _ => Err(format!("Unknown key '{}'", s)),
                }
            }
        }
    }
}

impl TryFrom<String> for Key {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Key> for String {
    fn from(key: Key) -> Self {
        key.to_string()
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Enter => f.write_str("Enter"),
            Key::Escape => f.write_str("Escape"),
            Key::Backspace => f.write_str("Backspace"),
            Key::Delete => f.write_str("Delete"),
            Key::Char(c) => write!(f, "{}", c),
        }
    }
}

/// What a bound key does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorAction {
    StartDrawing,
    ClosePolygon,
    /// Cancel the draft or the name prompt
    Cancel,
    UndoVertex,
    SelectTool(DrawTool),
}

/// Keybinding configuration for the editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    pub start_drawing: Key,
    pub close_polygon: Key,
    pub cancel: Key,
    pub undo_vertex: Key,
    pub tool_polygon: Key,
    pub tool_rectangle: Key,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            start_drawing: Key::Char('N'),
            close_polygon: Key::Enter,
            cancel: Key::Escape,
            undo_vertex: Key::Backspace,
            tool_polygon: Key::Char('P'),
            tool_rectangle: Key::Char('R'),
        }
    }
}

impl KeyBindings {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self) -> [(Key, EditorAction, &'static str); 6] {
        [
            (self.start_drawing, EditorAction::StartDrawing, "Start drawing"),
            (self.close_polygon, EditorAction::ClosePolygon, "Close polygon"),
            (self.cancel, EditorAction::Cancel, "Cancel"),
            (self.undo_vertex, EditorAction::UndoVertex, "Undo last point"),
            (
                self.tool_polygon,
                EditorAction::SelectTool(DrawTool::Polygon),
                "Polygon tool",
            ),
            (
                self.tool_rectangle,
                EditorAction::SelectTool(DrawTool::Rectangle),
                "Rectangle tool",
            ),
        ]
    }

    /// The action bound to a key, if any.
    pub fn action_for_key(&self, key: Key) -> Option<EditorAction> {
        self.table()
            .into_iter()
            .find(|(bound, _, _)| *bound == key)
            .map(|(_, action, _)| action)
    }

    /// Keys bound to more than one action, with the actions' names.
    pub fn conflicts(&self) -> Vec<(Key, &'static str, &'static str)> {
        let table = self.table();
        let mut conflicts = Vec::new();
        for (i, (key, _, first)) in table.iter().enumerate() {
            for (other, _, second) in &table[i + 1..] {
                if key == other {
                    conflicts.push((*key, *first, *second));
                }
            }
        }
        conflicts
    }
}
