use serde::{Deserialize, Serialize};

/// A to-do item owned by a member. `member_id` is not checked against the
/// member list; tasks of a removed member simply stop showing up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub text: String,
    pub completed: bool,
    pub member_id: String,
}
