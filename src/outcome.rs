//! Distribution outcomes.
//!
//! Contains [`DistributionOutcome`], the result of routing one damage event
//! across the body, with enough breakdown to debug where every point of
//! damage went.

use crate::ids::DamageSourceId;
use crate::registry::RuleMatch;
use crate::topology::{BodyPart, DebuffSlot};
use serde::Serialize;
use std::collections::BTreeMap;

/// Amounts below this are treated as zero when reporting.
pub const DAMAGE_EPSILON: f32 = 1e-4;

/// Result of distributing one damage event.
///
/// For every outcome
/// `incoming == total_applied() + mitigated + overflow`
/// up to float rounding.
///
/// # Examples
///
/// ```rust
/// use firstaid_rules::*;
/// use rand::SeedableRng;
/// use rand::rngs::StdRng;
///
/// let mut builder = RegistryBuilder::new();
/// DistributionBuilder::standard()
///     .add_distribution_layer(EquipmentSlot::Feet, &[BodyPart::LeftFoot, BodyPart::RightFoot])
///     .add_distribution_layer(EquipmentSlot::Legs, &[BodyPart::LeftLeg, BodyPart::RightLeg])
///     .register_static(&mut builder, ["fall"])
///     .unwrap();
/// let registry = builder.finalize();
///
/// let outcome = DistributionResolver::new(&registry).resolve(
///     &DamageEvent::new(DamageSource::new("fall"), 12.0),
///     &HealthState::uniform(4.0),
///     &EquipmentSnapshot::unarmored(),
///     &mut StdRng::seed_from_u64(7),
/// );
///
/// assert_eq!(outcome.damage_to(BodyPart::LeftFoot), 4.0);
/// assert_eq!(outcome.damage_to(BodyPart::RightLeg), 2.0);
/// assert_eq!(outcome.total_applied(), 12.0);
/// assert!(!outcome.is_overflowing());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistributionOutcome {
    /// The damage source that caused this outcome.
    pub source: DamageSourceId,
    /// Which rule handled the event.
    #[serde(skip)]
    pub matched: RuleMatch,
    /// Damage as delivered by the host, before any reduction.
    pub incoming: f32,
    /// Damage removed by the rule's reduction multiplier and by armor.
    pub mitigated: f32,
    /// Damage no part could absorb.
    pub overflow: f32,
    per_part: BTreeMap<BodyPart, f32>,
}

impl DistributionOutcome {
    pub(crate) fn new(source: DamageSourceId, matched: RuleMatch, incoming: f32) -> Self {
        Self {
            source,
            matched,
            incoming,
            mitigated: 0.0,
            overflow: 0.0,
            per_part: BTreeMap::new(),
        }
    }

    pub(crate) fn record(&mut self, part: BodyPart, damage: f32) {
        if damage > 0.0 {
            *self.per_part.entry(part).or_insert(0.0) += damage;
        }
    }

    /// Damage applied per body part. Parts that took nothing are absent.
    pub fn per_part(&self) -> &BTreeMap<BodyPart, f32> {
        &self.per_part
    }

    /// Damage applied to one part; `0` if it was not hit.
    pub fn damage_to(&self, part: BodyPart) -> f32 {
        self.per_part.get(&part).copied().unwrap_or(0.0)
    }

    /// Total damage taken by the parts of a debuff region.
    pub fn damage_to_slot(&self, slot: DebuffSlot) -> f32 {
        slot.parts().iter().map(|&part| self.damage_to(part)).sum()
    }

    /// Hardest hit any single part of a debuff region took.
    ///
    /// On-hit debuffs are judged per part, so this is the figure their
    /// ladders see.
    pub fn peak_damage_in_slot(&self, slot: DebuffSlot) -> f32 {
        slot.parts()
            .iter()
            .map(|&part| self.damage_to(part))
            .fold(0.0, f32::max)
    }

    /// Damage applied over all parts.
    pub fn total_applied(&self) -> f32 {
        self.per_part.values().sum()
    }

    /// Whether some damage could not be absorbed.
    ///
    /// The host decides what that means; usually the entity dies.
    pub fn is_overflowing(&self) -> bool {
        self.overflow > DAMAGE_EPSILON
    }
}
