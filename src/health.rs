//! Per-entity health and equipment state.
//!
//! The engine never owns entity state. The host keeps a [`HealthState`]
//! and an [`EquipmentSnapshot`] per entity, hands read-only views to the
//! resolver and applies the resulting outcome itself.

use crate::outcome::DistributionOutcome;
use crate::topology::{BodyPart, DebuffSlot, EquipmentSlot};
use serde::{Deserialize, Serialize};

/// Highest fraction of damage a single armor slot can block.
pub const MAX_PROTECTION: f32 = 0.8;

/// Health of a single body part.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PartHealth {
    pub current: f32,
    pub max: f32,
}

impl PartHealth {
    /// A part at full health.
    ///
    /// A negative or non-finite maximum is treated as `0`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use firstaid_rules::PartHealth;
    ///
    /// assert_eq!(PartHealth::full(4.0).current, 4.0);
    /// assert_eq!(PartHealth::full(-2.0).max, 0.0);
    /// assert_eq!(PartHealth::full(f32::NAN).max, 0.0);
    /// ```
    pub fn full(max: f32) -> Self {
        let max = if max.is_finite() { max.max(0.0) } else { 0.0 };
        Self { current: max, max }
    }
}

/// Current and maximum health of every body part of one entity.
///
/// # Examples
///
/// ```rust
/// use firstaid_rules::{BodyPart, HealthState};
///
/// let mut health = HealthState::uniform(4.0);
/// health.set_current(BodyPart::Head, 1.0);
///
/// assert_eq!(health.current(BodyPart::Head), 1.0);
/// assert_eq!(health.max(BodyPart::Head), 4.0);
/// assert!(!health.is_dead());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthState {
    parts: [PartHealth; BodyPart::COUNT],
}

impl HealthState {
    /// Every part at full health with the same maximum.
    pub fn uniform(max: f32) -> Self {
        Self {
            parts: [PartHealth::full(max); BodyPart::COUNT],
        }
    }

    /// Every part at full health, maxima given per part.
    pub fn with_max(max: impl Fn(BodyPart) -> f32) -> Self {
        let mut parts = [PartHealth::full(0.0); BodyPart::COUNT];
        for part in BodyPart::ALL {
            parts[part.index()] = PartHealth::full(max(part));
        }
        Self { parts }
    }

    /// Current and maximum health of one part.
    pub fn part(&self, part: BodyPart) -> PartHealth {
        self.parts[part.index()]
    }

    /// Current health of one part.
    pub fn current(&self, part: BodyPart) -> f32 {
        self.parts[part.index()].current
    }

    /// Maximum health of one part.
    pub fn max(&self, part: BodyPart) -> f32 {
        self.parts[part.index()].max
    }

    /// Set a part's current health, clamped to `[0, max]`.
    ///
    /// NaN counts as `0`.
    pub fn set_current(&mut self, part: BodyPart, value: f32) {
        let entry = &mut self.parts[part.index()];
        let max = if entry.max.is_finite() { entry.max.max(0.0) } else { 0.0 };
        entry.current = if value.is_nan() { 0.0 } else { value.max(0.0).min(max) };
    }

    /// Subtract the damage in `outcome` from the affected parts.
    ///
    /// Health never drops below zero; overflow is left for the caller to
    /// act on via [`DistributionOutcome::is_overflowing`].
    pub fn apply(&mut self, outcome: &DistributionOutcome) {
        for (&part, &damage) in outcome.per_part() {
            let current = self.current(part);
            self.set_current(part, current - damage);
        }
    }

    /// Remaining health of a debuff region as a fraction of its maximum.
    ///
    /// Returns `1.0` for a region whose maximum is zero.
    pub fn fraction_remaining(&self, slot: DebuffSlot) -> f32 {
        let (current, max) = slot
            .parts()
            .iter()
            .fold((0.0, 0.0), |(c, m), &part| {
                (c + self.current(part), m + self.max(part))
            });
        if max <= 0.0 {
            1.0
        } else {
            current / max
        }
    }

    /// Whether any critical part has run out of health.
    pub fn is_dead(&self) -> bool {
        BodyPart::ALL
            .iter()
            .any(|part| part.is_critical() && self.current(*part) <= 0.0)
    }
}

/// Snapshot of the armor an entity wears, as the fraction of damage each
/// slot blocks.
///
/// Values are clamped to `[0, MAX_PROTECTION]` on insertion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EquipmentSnapshot {
    protection: [f32; 4],
}

impl EquipmentSnapshot {
    /// No armor in any slot.
    pub fn unarmored() -> Self {
        Self::default()
    }

    /// Builder-style setter for one slot's protection.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use firstaid_rules::{EquipmentSlot, EquipmentSnapshot};
    ///
    /// let gear = EquipmentSnapshot::unarmored()
    ///     .with(EquipmentSlot::Head, 0.5)
    ///     .with(EquipmentSlot::Feet, 2.0);
    ///
    /// assert_eq!(gear.protection(EquipmentSlot::Head), 0.5);
    /// assert_eq!(gear.protection(EquipmentSlot::Feet), 0.8);
    /// assert_eq!(gear.protection(EquipmentSlot::Chest), 0.0);
    /// ```
    pub fn with(mut self, slot: EquipmentSlot, protection: f32) -> Self {
        self.set(slot, protection);
        self
    }

    /// Set one slot's protection, clamped to `[0, MAX_PROTECTION]`.
    ///
    /// Non-finite values count as no protection.
    pub fn set(&mut self, slot: EquipmentSlot, protection: f32) {
        let value = if protection.is_finite() {
            protection.clamp(0.0, MAX_PROTECTION)
        } else {
            0.0
        };
        self.protection[slot as usize] = value;
    }

    /// Fraction of incoming damage `slot` blocks.
    pub fn protection(&self, slot: EquipmentSlot) -> f32 {
        self.protection[slot as usize]
    }
}
