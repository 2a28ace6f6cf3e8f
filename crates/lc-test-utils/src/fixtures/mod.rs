//! Pre-configured test data fixtures for LC testing.
//!
//! Provides builders and test data for:
//! - Participants with different roles and media states
//! - A debate-style roster
//! - The three-column recording layout

use common::types::{MediaState, Participant, Role};
use layout_controller::actors::SessionSettings;
use layout_controller::layout::LayoutConfig;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Test participant fixture.
#[derive(Debug, Clone)]
pub struct TestParticipant {
    /// Participant ID.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Role tag, if assigned.
    pub role: Option<Role>,
    /// Media flags.
    pub media: MediaState,
}

impl TestParticipant {
    /// Create a new test participant with the given ID and no role.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: format!("Participant {id}"),
            id,
            role: None,
            media: MediaState::default(),
        }
    }

    /// Create a test participant with a random ID.
    #[must_use]
    pub fn random() -> Self {
        Self::new(format!("part-{}", Uuid::new_v4()))
    }

    /// Set the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the role tag.
    #[must_use]
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    #[must_use]
    pub fn side_a(self) -> Self {
        self.with_role(Role::SideA)
    }

    #[must_use]
    pub fn side_b(self) -> Self {
        self.with_role(Role::SideB)
    }

    #[must_use]
    pub fn arbiter(self) -> Self {
        self.with_role(Role::Arbiter)
    }

    #[must_use]
    pub fn solo(self) -> Self {
        self.with_role(Role::Solo)
    }

    /// Turn camera and microphone on.
    #[must_use]
    pub fn live(mut self) -> Self {
        self.media = MediaState {
            audio_enabled: true,
            video_enabled: true,
        };
        self
    }

    /// Build the participant.
    #[must_use]
    pub fn build(self) -> Participant {
        let participant = Participant::new(self.id, self.name).with_media(self.media);
        match self.role {
            Some(role) => participant.with_role(role),
            None => participant,
        }
    }
}

/// A debate roster in join order: two per side, three judges, two solo
/// speakers and one participant without a role yet.
///
/// IDs: `neg-1`, `aff-1`, `judge-1`, `neg-2`, `solo-1`, `aff-2`, `judge-2`,
/// `solo-2`, `judge-3`, `guest-1`.
#[must_use]
pub fn debate_roster() -> Vec<Participant> {
    vec![
        TestParticipant::new("neg-1").side_a().live().build(),
        TestParticipant::new("aff-1").side_b().live().build(),
        TestParticipant::new("judge-1").arbiter().build(),
        TestParticipant::new("neg-2").side_a().build(),
        TestParticipant::new("solo-1").solo().live().build(),
        TestParticipant::new("aff-2").side_b().build(),
        TestParticipant::new("judge-2").arbiter().build(),
        TestParticipant::new("solo-2").solo().build(),
        TestParticipant::new("judge-3").arbiter().build(),
        TestParticipant::new("guest-1").build(),
    ]
}

/// The three-column recording view: side A left, side B right, arbiters in
/// the centre (two shown), solo and unassigned alternating left/right.
#[must_use]
pub fn three_column_layout() -> LayoutConfig {
    LayoutConfig::builder()
        .slot("left")
        .slot("center")
        .slot("right")
        .map_role(Role::SideA, "left")
        .map_role(Role::SideB, "right")
        .map_role(Role::Arbiter, "center")
        .overflow_role(Role::Solo)
        .overflow_role(Role::Unassigned)
        .overflow_slot("left")
        .overflow_slot("right")
        .default_slot("center")
        .capacity("center", 2)
        .build()
        .expect("three-column layout is valid")
}

/// Session settings over [`three_column_layout`].
#[must_use]
pub fn session_settings(debounce: Option<Duration>) -> SessionSettings {
    SessionSettings {
        layout: Arc::new(three_column_layout()),
        debounce,
        event_buffer: 64,
    }
}
