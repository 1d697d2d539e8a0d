use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: String,
    pub name: String,
    pub avatar: String,
    pub status: MemberStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemberStatus {
    #[serde(rename = "Available")]
    Available,
    #[serde(rename = "In a Meeting")]
    Meeting,
    #[serde(rename = "Out of Office")]
    OutOfOffice,
    #[serde(rename = "On Break")]
    OnBreak,
    #[serde(rename = "Club Activity")]
    ClubActivity,
    #[serde(rename = "Business Trip")]
    BusinessTrip,
}

impl MemberStatus {
    pub const ALL: [MemberStatus; 6] = [
        MemberStatus::Available,
        MemberStatus::Meeting,
        MemberStatus::OutOfOffice,
        MemberStatus::OnBreak,
        MemberStatus::ClubActivity,
        MemberStatus::BusinessTrip,
    ];

    pub fn label(self) -> &'static str {
        match self {
            MemberStatus::Available => "Available",
            MemberStatus::Meeting => "In a Meeting",
            MemberStatus::OutOfOffice => "Out of Office",
            MemberStatus::OnBreak => "On Break",
            MemberStatus::ClubActivity => "Club Activity",
            MemberStatus::BusinessTrip => "Business Trip",
        }
    }
}

impl fmt::Display for MemberStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Accepts either the display label or a compact form such as `meeting`,
/// `out-of-office` or `business_trip`.
impl FromStr for MemberStatus {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let compact: String = raw
            .chars()
            .filter(|ch| ch.is_ascii_alphanumeric())
            .map(|ch| ch.to_ascii_lowercase())
            .collect();

        match compact.as_str() {
            "available" => Ok(MemberStatus::Available),
            "meeting" | "inameeting" => Ok(MemberStatus::Meeting),
            "outofoffice" => Ok(MemberStatus::OutOfOffice),
            "onbreak" | "break" => Ok(MemberStatus::OnBreak),
            "clubactivity" | "club" => Ok(MemberStatus::ClubActivity),
            "businesstrip" | "trip" => Ok(MemberStatus::BusinessTrip),
            _ => Err(format!("unknown member status '{}'", raw.trim())),
        }
    }
}
