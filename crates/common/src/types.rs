//! Common data types for layout controller components.
//!
//! `Participant` values are owned by the external call engine. The roster and
//! layout code only ever hold them behind `Arc` and never mutate them.

use crate::error::CommonError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Identity of one call session (one underlying meeting object).
///
/// A new `SessionId` is minted whenever the engine's meeting object changes,
/// which is how stale snapshots from a torn-down session are recognised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Create a new random session ID
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Opaque participant identifier assigned by the call engine.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(pub String);

impl ParticipantId {
    /// Create a participant ID from any string-like value
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ParticipantId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for ParticipantId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Closed set of role tags a participant can carry.
///
/// Tags parse case-insensitively. The debate preset names used by the
/// recording view are accepted as aliases: `negative` is side A,
/// `affirmative` is side B and `judge` is an arbiter. Deserialization goes
/// through the same parser, so engine payloads accept every spelling that
/// `FromStr` does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", try_from = "String")]
pub enum Role {
    /// First opposing side (left column by default).
    SideA,
    /// Second opposing side (right column by default).
    SideB,
    /// Arbiter panel (centre column by default).
    Arbiter,
    /// Unaffiliated speaker, distributed across the side columns.
    Solo,
    /// Explicitly unassigned.
    Unassigned,
}

impl Role {
    /// Every role, in declaration order.
    pub const ALL: [Role; 5] = [
        Role::SideA,
        Role::SideB,
        Role::Arbiter,
        Role::Solo,
        Role::Unassigned,
    ];

    /// Canonical tag for this role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::SideA => "side-a",
            Role::SideB => "side-b",
            Role::Arbiter => "arbiter",
            Role::Solo => "solo",
            Role::Unassigned => "unassigned",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CommonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "side-a" | "negative" => Ok(Role::SideA),
            "side-b" | "affirmative" => Ok(Role::SideB),
            "arbiter" | "judge" => Ok(Role::Arbiter),
            "solo" => Ok(Role::Solo),
            "unassigned" => Ok(Role::Unassigned),
            other => Err(CommonError::UnknownRole(other.to_string())),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = CommonError;

    fn try_from(tag: String) -> Result<Self, Self::Error> {
        tag.parse()
    }
}

/// Media flags forwarded untouched to the rendering layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MediaState {
    /// Whether the participant's microphone track is enabled.
    pub audio_enabled: bool,
    /// Whether the participant's camera track is enabled.
    pub video_enabled: bool,
}

/// A joined call participant as reported by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Participant {
    /// Stable identifier for the lifetime of the membership.
    pub id: ParticipantId,
    /// Human-readable label.
    pub display_name: String,
    /// Role tag; `None` until the participant has been assigned one.
    pub role: Option<Role>,
    /// Media flags.
    #[serde(default)]
    pub media: MediaState,
}

impl Participant {
    /// Create a participant with no role and media disabled.
    #[must_use]
    pub fn new(id: impl Into<ParticipantId>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            role: None,
            media: MediaState::default(),
        }
    }

    /// Set the role tag.
    #[must_use]
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    /// Set the media flags.
    #[must_use]
    pub fn with_media(mut self, media: MediaState) -> Self {
        self.media = media;
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse_canonical_tags() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn test_role_parse_is_case_insensitive() {
        assert_eq!("side-A".parse::<Role>().unwrap(), Role::SideA);
        assert_eq!(" Arbiter ".parse::<Role>().unwrap(), Role::Arbiter);
    }

    #[test]
    fn test_role_parse_debate_aliases() {
        assert_eq!("negative".parse::<Role>().unwrap(), Role::SideA);
        assert_eq!("affirmative".parse::<Role>().unwrap(), Role::SideB);
        assert_eq!("judge".parse::<Role>().unwrap(), Role::Arbiter);
    }

    #[test]
    fn test_role_parse_unknown_tag() {
        let err = "moderator".parse::<Role>().unwrap_err();
        assert_eq!(err, CommonError::UnknownRole("moderator".to_string()));
    }

    #[test]
    fn test_role_serde_uses_kebab_case() {
        let json = serde_json::to_string(&Role::SideB).unwrap();
        assert_eq!(json, "\"side-b\"");
        let role: Role = serde_json::from_str("\"unassigned\"").unwrap();
        assert_eq!(role, Role::Unassigned);
    }

    #[test]
    fn test_role_deserialize_accepts_aliases_and_case() {
        for (tag, expected) in [
            ("judge", Role::Arbiter),
            ("Arbiter", Role::Arbiter),
            ("negative", Role::SideA),
            ("AFFIRMATIVE", Role::SideB),
            ("Side-B", Role::SideB),
        ] {
            let role: Role = serde_json::from_str(&format!("\"{tag}\"")).unwrap();
            assert_eq!(role, expected, "tag {tag}");
        }
    }

    #[test]
    fn test_role_deserialize_rejects_unknown_tag() {
        let err = serde_json::from_str::<Role>("\"moderator\"").unwrap_err();
        assert!(err.to_string().contains("Unknown role tag: moderator"));
    }

    #[test]
    fn test_participant_deserialize_with_alias_role() {
        let p: Participant =
            serde_json::from_str(r#"{"id":"j","display_name":"J","role":"judge"}"#).unwrap();
        assert_eq!(p.role, Some(Role::Arbiter));
    }

    #[test]
    fn test_participant_builder() {
        let p = Participant::new("p-1", "Alice")
            .with_role(Role::Solo)
            .with_media(MediaState {
                audio_enabled: true,
                video_enabled: false,
            });
        assert_eq!(p.id.as_str(), "p-1");
        assert_eq!(p.role, Some(Role::Solo));
        assert!(p.media.audio_enabled);
        assert!(!p.media.video_enabled);
    }

    #[test]
    fn test_participant_deserialize_without_media() {
        let p: Participant =
            serde_json::from_str(r#"{"id":"9","display_name":"Nine","role":null}"#).unwrap();
        assert_eq!(p.id, ParticipantId::from("9"));
        assert_eq!(p.role, None);
        assert_eq!(p.media, MediaState::default());
    }

    #[test]
    fn test_session_id_uniqueness() {
        assert_ne!(SessionId::new(), SessionId::new());
    }
}
