use crate::model::room::RoomId;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AlertKind {
    NoFace,
    MultipleFaces,
    HeadTurn,
    FaceTooSmall,
}

impl AlertKind {
    pub const ALL: [AlertKind; 4] = [
        AlertKind::NoFace,
        AlertKind::MultipleFaces,
        AlertKind::HeadTurn,
        AlertKind::FaceTooSmall,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::NoFace => "no-face",
            AlertKind::MultipleFaces => "multiple-faces",
            AlertKind::HeadTurn => "head-turn",
            AlertKind::FaceTooSmall => "face-too-small",
        }
    }

    /// Text shown to the interviewer.
    pub fn message(&self) -> &'static str {
        match self {
            AlertKind::NoFace => "No face detected",
            AlertKind::MultipleFaces => "Multiple faces detected",
            AlertKind::HeadTurn => "Interviewee might be looking away",
            AlertKind::FaceTooSmall => "User might be too far from the camera",
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub message: String,
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub room_id: RoomId,
}

impl Alert {
    pub fn new(kind: AlertKind, room_id: RoomId) -> Self {
        Self {
            message: kind.message().to_owned(),
            kind,
            room_id,
        }
    }
}

/// Restricted client activity reported by the interviewee side.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum ViolationKind {
    TabSwitch,
    Copy,
    Paste,
    Cut,
    ContextMenu,
    Shortcut(char),
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViolationKind::TabSwitch => f.write_str("tab-switch"),
            ViolationKind::Copy => f.write_str("copy"),
            ViolationKind::Paste => f.write_str("paste"),
            ViolationKind::Cut => f.write_str("cut"),
            ViolationKind::ContextMenu => f.write_str("contextmenu"),
            ViolationKind::Shortcut(key) => write!(f, "shortcut-{key}"),
        }
    }
}

impl From<ViolationKind> for String {
    fn from(kind: ViolationKind) -> Self {
        kind.to_string()
    }
}

impl TryFrom<String> for ViolationKind {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let kind = match value.as_str() {
            "tab-switch" => ViolationKind::TabSwitch,
            "copy" => ViolationKind::Copy,
            "paste" => ViolationKind::Paste,
            "cut" => ViolationKind::Cut,
            "contextmenu" => ViolationKind::ContextMenu,
            other => {
                let mut key = other
                    .strip_prefix("shortcut-")
                    .map(str::chars)
                    .ok_or_else(|| format!("unknown violation type '{other}'"))?;
                match (key.next(), key.next()) {
                    (Some(c), None) => ViolationKind::Shortcut(c),
                    _ => return Err(format!("unknown violation type '{other}'")),
                }
            }
        };
        Ok(kind)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    #[serde(rename = "type")]
    pub kind: ViolationKind,
    pub room_id: RoomId,
}
