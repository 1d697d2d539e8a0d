use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Announcement {
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(rename = "type")]
    pub kind: AnnouncementKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnnouncementKind {
    Normal,
    Important,
    Event,
}

impl AnnouncementKind {
    pub fn label(self) -> &'static str {
        match self {
            AnnouncementKind::Normal => "Normal",
            AnnouncementKind::Important => "Important",
            AnnouncementKind::Event => "Event",
        }
    }
}

impl fmt::Display for AnnouncementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AnnouncementKind {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "normal" => Ok(AnnouncementKind::Normal),
            "important" => Ok(AnnouncementKind::Important),
            "event" => Ok(AnnouncementKind::Event),
            other => Err(format!("unknown announcement type '{other}'")),
        }
    }
}
