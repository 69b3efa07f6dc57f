use serde::{Deserialize, Serialize};

/// The chat a battle happens in.
pub type ScopeId = i64;
/// Stable chat-platform identifier for a user.
pub type ParticipantId = i64;

/// One side of a battle: a stable id plus the display name other
/// players address them by.
///
/// Display names are not unique. A challenge addresses its opponent by
/// name until that person acts, so two users sharing a name in one chat
/// can race for the opponent slot (the latest matching submission
/// wins). Ids take over as soon as a side has acted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id: ParticipantId,
    pub display_name: String,
}

impl Participant {
    pub fn new(id: ParticipantId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
        }
    }

    /// Case-insensitive display-name match, the way names are typed in
    /// chat.
    pub fn name_matches(&self, name: &str) -> bool {
        self.display_name.to_lowercase() == name.to_lowercase()
    }
}
