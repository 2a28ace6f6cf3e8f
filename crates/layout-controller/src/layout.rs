//! Layout partitioner: maps a roster onto named display slots by role.
//!
//! Placement rules, applied to each participant in roster order:
//!
//! | Role | Destination |
//! |------|-------------|
//! | mapped in `role_slots` | that slot |
//! | absent, or listed in `overflow_roles` | `overflow_slots[k % n]`, `k` = overflow participants seen so far |
//! | anything else | `default_slot` |
//!
//! `partition` is a pure function of `(roster, config)`. Overflow placement is
//! recomputed from scratch each pass, so a participant's overflow slot can move
//! when earlier overflow participants join or leave.
//!
//! Slot capacities are a rendering hint only. Participants past the capacity
//! stay members of the slot and are reported through [`Slot::hidden`].

use crate::config::ConfigError;

use common::types::{Participant, ParticipantId, Role};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, error};

/// Where a role is placed by a [`LayoutConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement<'a> {
    /// Role has a dedicated slot.
    Fixed(&'a str),
    /// Role is distributed round-robin over the overflow slots.
    Overflow,
    /// Role is neither mapped nor overflow-eligible; falls back to the default slot.
    Default(&'a str),
}

/// Validated role-to-slot table.
///
/// Construct with [`LayoutConfig::builder`]; every slot referenced by the
/// table is guaranteed to be declared, and the overflow list is non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutConfig {
    /// Declared slot names in display order.
    slots: Vec<String>,
    /// Role to slot index.
    role_slots: BTreeMap<Role, usize>,
    /// Roles explicitly distributed over the overflow slots.
    overflow_roles: BTreeSet<Role>,
    /// Overflow slot indices in round-robin order.
    overflow_slots: Vec<usize>,
    /// Slot index for roles with no placement.
    default_slot: usize,
    /// Rendering capacity per slot index.
    capacities: BTreeMap<usize, usize>,
}

impl LayoutConfig {
    /// Start building a layout configuration.
    #[must_use]
    pub fn builder() -> LayoutConfigBuilder {
        LayoutConfigBuilder::default()
    }

    /// Declared slot names in display order.
    #[must_use]
    pub fn slots(&self) -> &[String] {
        &self.slots
    }

    /// Overflow slot names in round-robin order.
    #[must_use]
    pub fn overflow_slots(&self) -> Vec<&str> {
        self.overflow_slots
            .iter()
            .filter_map(|&index| self.slot_name(index))
            .collect()
    }

    /// Name of the default slot.
    #[must_use]
    pub fn default_slot(&self) -> &str {
        self.slot_name(self.default_slot).unwrap_or_default()
    }

    /// Rendering capacity configured for `slot`, if any.
    #[must_use]
    pub fn capacity(&self, slot: &str) -> Option<usize> {
        let index = self.slot_index(slot)?;
        self.capacities.get(&index).copied()
    }

    /// Placement rule for a role tag (`None` means no role assigned yet).
    #[must_use]
    pub fn placement(&self, role: Option<Role>) -> Placement<'_> {
        match role {
            None => Placement::Overflow,
            Some(role) if self.overflow_roles.contains(&role) => Placement::Overflow,
            Some(role) => match self.role_slots.get(&role) {
                Some(&index) => Placement::Fixed(self.slot_name(index).unwrap_or_default()),
                None => Placement::Default(self.default_slot()),
            },
        }
    }

    fn slot_name(&self, index: usize) -> Option<&str> {
        self.slots.get(index).map(String::as_str)
    }

    fn slot_index(&self, name: &str) -> Option<usize> {
        self.slots.iter().position(|slot| slot == name)
    }

    /// Slot index for a participant, advancing the overflow counter when used.
    fn slot_index_for(&self, role: Option<Role>, overflow_seen: &mut usize) -> usize {
        let is_overflow = match role {
            None => true,
            Some(role) => self.overflow_roles.contains(&role),
        };

        if is_overflow {
            let index = (*overflow_seen)
                .checked_rem(self.overflow_slots.len())
                .and_then(|k| self.overflow_slots.get(k))
                .copied()
                .unwrap_or(self.default_slot);
            *overflow_seen += 1;
            return index;
        }

        match role.and_then(|role| self.role_slots.get(&role)) {
            Some(&index) => index,
            None => {
                debug!(
                    target: "lc.layout",
                    role = role.map_or("none", |r| r.as_str()),
                    default_slot = self.default_slot(),
                    "Role has no slot mapping, using default slot"
                );
                self.default_slot
            }
        }
    }
}

/// Builder for [`LayoutConfig`].
#[derive(Debug, Clone, Default)]
pub struct LayoutConfigBuilder {
    slots: Vec<String>,
    role_slots: Vec<(Role, String)>,
    overflow_roles: Vec<Role>,
    overflow_slots: Vec<String>,
    default_slot: Option<String>,
    capacities: Vec<(String, usize)>,
}

impl LayoutConfigBuilder {
    /// Declare a slot. Display order follows declaration order.
    #[must_use]
    pub fn slot(mut self, name: impl Into<String>) -> Self {
        self.slots.push(name.into());
        self
    }

    /// Map a role onto a declared slot.
    #[must_use]
    pub fn map_role(mut self, role: Role, slot: impl Into<String>) -> Self {
        self.role_slots.push((role, slot.into()));
        self
    }

    /// Mark a role as overflow-eligible.
    #[must_use]
    pub fn overflow_role(mut self, role: Role) -> Self {
        self.overflow_roles.push(role);
        self
    }

    /// Append a slot to the overflow round-robin list.
    #[must_use]
    pub fn overflow_slot(mut self, slot: impl Into<String>) -> Self {
        self.overflow_slots.push(slot.into());
        self
    }

    /// Slot for roles that are neither mapped nor overflow-eligible.
    #[must_use]
    pub fn default_slot(mut self, slot: impl Into<String>) -> Self {
        self.default_slot = Some(slot.into());
        self
    }

    /// Rendering capacity for a slot.
    #[must_use]
    pub fn capacity(mut self, slot: impl Into<String>, capacity: usize) -> Self {
        self.capacities.push((slot.into(), capacity));
        self
    }

    /// Validate and build the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the table references undeclared slots, declares a
    /// slot twice, gives a role more than one placement, has no overflow slots,
    /// or has no default slot.
    pub fn build(self) -> Result<LayoutConfig, ConfigError> {
        if self.slots.is_empty() {
            return Err(ConfigError::NoSlots);
        }

        let mut seen = BTreeSet::new();
        for slot in &self.slots {
            if !seen.insert(slot.as_str()) {
                return Err(ConfigError::DuplicateSlot(slot.clone()));
            }
        }

        let resolve = |slot: &str, field: &'static str| {
            self.slots
                .iter()
                .position(|s| s == slot)
                .ok_or_else(|| ConfigError::UnknownSlot {
                    field,
                    slot: slot.to_string(),
                })
        };

        let mut role_slots = BTreeMap::new();
        for (role, slot) in &self.role_slots {
            let index = resolve(slot, "role_slots")?;
            if role_slots.insert(*role, index).is_some() {
                return Err(ConfigError::ConflictingRole(*role));
            }
        }

        let mut overflow_roles = BTreeSet::new();
        for role in &self.overflow_roles {
            if role_slots.contains_key(role) || !overflow_roles.insert(*role) {
                return Err(ConfigError::ConflictingRole(*role));
            }
        }

        if self.overflow_slots.is_empty() {
            return Err(ConfigError::NoOverflowSlots);
        }
        let mut overflow_slots = Vec::with_capacity(self.overflow_slots.len());
        for slot in &self.overflow_slots {
            let index = resolve(slot, "overflow_slots")?;
            if overflow_slots.contains(&index) {
                return Err(ConfigError::DuplicateSlot(slot.clone()));
            }
            overflow_slots.push(index);
        }

        let default_slot = match &self.default_slot {
            Some(slot) => resolve(slot, "default_slot")?,
            None => return Err(ConfigError::MissingDefaultSlot),
        };

        let mut capacities = BTreeMap::new();
        for (slot, capacity) in &self.capacities {
            capacities.insert(resolve(slot, "capacities")?, *capacity);
        }

        Ok(LayoutConfig {
            slots: self.slots,
            role_slots,
            overflow_roles,
            overflow_slots,
            default_slot,
            capacities,
        })
    }
}

/// One named display slot and the participants placed in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Slot {
    /// Slot name (e.g. "left").
    pub name: String,
    /// Participants in roster order.
    pub participants: Vec<Arc<Participant>>,
    /// Rendering capacity; `None` shows everyone.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<usize>,
}

impl Slot {
    /// Participants the rendering layer should draw.
    #[must_use]
    pub fn visible(&self) -> &[Arc<Participant>] {
        self.participants.split_at(self.visible_len()).0
    }

    /// Participants past the slot capacity ("not shown" remainder).
    #[must_use]
    pub fn hidden(&self) -> &[Arc<Participant>] {
        self.participants.split_at(self.visible_len()).1
    }

    /// Number of participants placed in this slot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.participants.len()
    }

    /// Whether no participant is placed in this slot.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    /// Participant IDs in slot order.
    #[must_use]
    pub fn ids(&self) -> Vec<&str> {
        self.participants.iter().map(|p| p.id.as_str()).collect()
    }

    fn visible_len(&self) -> usize {
        let len = self.participants.len();
        self.capacity.map_or(len, |capacity| capacity.min(len))
    }
}

/// Result of one partitioning pass: every declared slot, in display order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SlotAssignment {
    slots: Vec<Slot>,
}

impl SlotAssignment {
    /// All slots in display order.
    #[must_use]
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Look up a slot by name.
    #[must_use]
    pub fn slot(&self, name: &str) -> Option<&Slot> {
        self.slots.iter().find(|slot| slot.name == name)
    }

    /// Name of the slot holding the given participant.
    #[must_use]
    pub fn slot_of(&self, id: &ParticipantId) -> Option<&str> {
        self.slots
            .iter()
            .find(|slot| slot.participants.iter().any(|p| &p.id == id))
            .map(|slot| slot.name.as_str())
    }

    /// Total participants across all slots.
    #[must_use]
    pub fn participant_count(&self) -> usize {
        self.slots.iter().map(Slot::len).sum()
    }
}

/// Partition a roster into slots.
///
/// Pure and deterministic: identical inputs produce identical assignments.
#[must_use]
pub fn partition(roster: &[Arc<Participant>], config: &LayoutConfig) -> SlotAssignment {
    let mut buckets: Vec<Vec<Arc<Participant>>> = vec![Vec::new(); config.slots.len()];
    let mut overflow_seen = 0usize;

    for participant in roster {
        let index = config.slot_index_for(participant.role, &mut overflow_seen);
        match buckets.get_mut(index) {
            Some(bucket) => bucket.push(Arc::clone(participant)),
            None => error!(
                target: "lc.layout",
                participant_id = %participant.id,
                slot_index = index,
                "Slot index out of range, participant not placed"
            ),
        }
    }

    let slots = config
        .slots
        .iter()
        .zip(buckets)
        .enumerate()
        .map(|(index, (name, participants))| Slot {
            name: name.clone(),
            participants,
            capacity: config.capacities.get(&index).copied(),
        })
        .collect();

    SlotAssignment { slots }
}
