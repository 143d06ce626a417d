//! Debuff evaluator.
//!
//! Walks the debuff ladders registered for a body region and reports which
//! tier each rule selects for the current observation. The tier a rule
//! selected last time lives in a per-entity [`DebuffTracker`], so the
//! evaluator can tell the host when a rule moves to a new tier and play
//! its sound exactly once per move.
//!
//! On-hit tiers are timed: the selected magnitude is the effect length in
//! ticks, and the tracked tier lapses once [`DebuffTracker::tick`] has run
//! it down. Constant tiers hold until the health fraction moves.

use crate::debuff::DebuffKind;
use crate::health::HealthState;
use crate::ids::{EffectId, SoundId};
use crate::outcome::DistributionOutcome;
use crate::registry::{DebuffRuleId, Registry};
use crate::topology::DebuffSlot;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq)]
struct ActiveTier {
    tier: i32,
    /// Ticks until an on-hit tier lapses. `None` for constant tiers.
    ticks_left: Option<u32>,
}

/// Tiers last selected by each rule, for one entity.
///
/// # Examples
///
/// ```rust
/// use firstaid_rules::*;
///
/// let mut builder = RegistryBuilder::new();
/// let id = DebuffBuilder::on_hit("nausea")
///     .add_bound(2.0, 40)
///     .register(&mut builder, DebuffSlot::Body)
///     .unwrap();
/// let registry = builder.finalize();
/// let mut tracker = DebuffTracker::new();
///
/// DebuffEvaluator::new(&registry).on_hit(DebuffSlot::Body, 3.0, &mut tracker);
/// assert_eq!(tracker.active_tier(id), Some(40));
///
/// tracker.tick(39);
/// assert_eq!(tracker.active_tier(id), Some(40));
/// assert_eq!(tracker.tick(1), vec![id]);
/// assert_eq!(tracker.active_tier(id), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DebuffTracker {
    active: HashMap<DebuffRuleId, ActiveTier>,
}

impl DebuffTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// The tier a rule selected last, if it is still active.
    pub fn active_tier(&self, rule: DebuffRuleId) -> Option<i32> {
        self.active.get(&rule).map(|active| active.tier)
    }

    /// Advance time by `ticks`. On-hit tiers that run out are dropped and
    /// their rules returned, in id order.
    pub fn tick(&mut self, ticks: u32) -> Vec<DebuffRuleId> {
        let mut expired = Vec::new();
        for (&rule, active) in self.active.iter_mut() {
            if let Some(left) = active.ticks_left.as_mut() {
                *left = left.saturating_sub(ticks);
                if *left == 0 {
                    expired.push(rule);
                }
            }
        }
        for rule in &expired {
            self.active.remove(rule);
        }
        expired.sort();
        expired
    }

    /// Drop a rule's tier right away, e.g. when the host clears the effect.
    pub fn expire(&mut self, rule: DebuffRuleId) -> Option<i32> {
        self.active.remove(&rule).map(|active| active.tier)
    }

    /// Forget every tracked tier, e.g. when the entity respawns.
    pub fn reset(&mut self) {
        self.active.clear();
    }

    fn update(&mut self, rule: DebuffRuleId, kind: DebuffKind, tier: Option<i32>) -> Option<i32> {
        let previous = match tier {
            Some(tier) => {
                let ticks_left = match kind {
                    DebuffKind::OnHit => Some(u32::try_from(tier).unwrap_or(0)),
                    DebuffKind::Constant => None,
                };
                self.active.insert(rule, ActiveTier { tier, ticks_left })
            }
            None => self.active.remove(&rule),
        };
        previous.map(|active| active.tier)
    }
}

/// What one rule decided for one observation.
#[derive(Debug, Clone, PartialEq)]
pub struct DebuffTransition {
    pub rule: DebuffRuleId,
    pub effect: EffectId,
    pub slot: DebuffSlot,
    /// Tier selected before this observation.
    pub previous: Option<i32>,
    /// Tier selected now. `None` means a constant effect no longer
    /// applies; on-hit rules never report it and lapse through
    /// [`DebuffTracker::tick`] instead.
    pub current: Option<i32>,
    /// Sound to play. Only set when the rule entered a new tier.
    pub sound: Option<SoundId>,
}

impl DebuffTransition {
    /// Whether the selected tier changed.
    pub fn changed(&self) -> bool {
        self.previous != self.current
    }
}

/// Evaluates the debuff rules of a finalized [`Registry`].
///
/// # Examples
///
/// ```rust
/// use firstaid_rules::*;
///
/// let mut builder = RegistryBuilder::new();
/// DebuffBuilder::on_hit("blindness")
///     .add_bound(10.0, 40)
///     .add_bound(5.0, 20)
///     .add_sound_effect(|| SoundId::new("heartbeat"))
///     .register(&mut builder, DebuffSlot::Head);
/// let registry = builder.finalize();
///
/// let evaluator = DebuffEvaluator::new(&registry);
/// let mut tracker = DebuffTracker::new();
///
/// let hits = evaluator.on_hit(DebuffSlot::Head, 7.0, &mut tracker);
/// assert_eq!(hits[0].current, Some(20));
/// assert_eq!(hits[0].sound, Some(SoundId::new("heartbeat")));
///
/// // Same tier again: still reported, but no second sound.
/// let hits = evaluator.on_hit(DebuffSlot::Head, 6.0, &mut tracker);
/// assert_eq!(hits[0].current, Some(20));
/// assert_eq!(hits[0].sound, None);
///
/// // A scratch leaves the running effect alone.
/// assert!(evaluator.on_hit(DebuffSlot::Head, 2.0, &mut tracker).is_empty());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct DebuffEvaluator<'a> {
    registry: &'a Registry,
}

impl<'a> DebuffEvaluator<'a> {
    pub fn new(registry: &'a Registry) -> Self {
        Self { registry }
    }

    /// Evaluate the on-hit rules of `slot` against the damage it just took.
    ///
    /// Every enabled rule that selects a tier is reported, since the host
    /// re-applies a timed effect on each qualifying hit. Hits that select
    /// nothing, and disabled rules, leave any running tier untouched.
    pub fn on_hit(
        &self,
        slot: DebuffSlot,
        damage: f32,
        tracker: &mut DebuffTracker,
    ) -> Vec<DebuffTransition> {
        self.evaluate(slot, DebuffKind::OnHit, damage, tracker)
    }

    /// Evaluate the constant rules of `slot` against the fraction of health
    /// it has left. Only tier changes are reported.
    pub fn constant(
        &self,
        slot: DebuffSlot,
        health_fraction: f32,
        tracker: &mut DebuffTracker,
    ) -> Vec<DebuffTransition> {
        self.evaluate(slot, DebuffKind::Constant, health_fraction, tracker)
    }

    /// Run the on-hit rules of every region against a distribution outcome.
    ///
    /// Each region is judged by the hardest hit any one of its parts took,
    /// so two feet taking 2 each count as a hit of 2, not 4. Regions that
    /// took no damage are skipped.
    pub fn on_hit_outcome(
        &self,
        outcome: &DistributionOutcome,
        tracker: &mut DebuffTracker,
    ) -> Vec<DebuffTransition> {
        let mut transitions = Vec::new();
        for slot in DebuffSlot::ALL {
            let damage = outcome.peak_damage_in_slot(slot);
            if damage > 0.0 {
                transitions.extend(self.on_hit(slot, damage, tracker));
            }
        }
        transitions
    }

    /// Run the constant rules of every region against current health.
    pub fn constant_health(
        &self,
        health: &HealthState,
        tracker: &mut DebuffTracker,
    ) -> Vec<DebuffTransition> {
        let mut transitions = Vec::new();
        for slot in DebuffSlot::ALL {
            transitions.extend(self.constant(slot, health.fraction_remaining(slot), tracker));
        }
        transitions
    }

    fn evaluate(
        &self,
        slot: DebuffSlot,
        kind: DebuffKind,
        observation: f32,
        tracker: &mut DebuffTracker,
    ) -> Vec<DebuffTransition> {
        let mut transitions = Vec::new();

        for (id, rule) in self.registry.debuffs_for(slot) {
            if rule.kind() != kind {
                continue;
            }

            let current = if rule.is_enabled() {
                rule.select(observation)
            } else {
                None
            };
            if kind == DebuffKind::OnHit && current.is_none() {
                continue;
            }
            let previous = tracker.update(id, kind, current);

            let changed = previous != current;
            let refreshed = kind == DebuffKind::OnHit && current.is_some();
            if !changed && !refreshed {
                continue;
            }

            let sound = if changed && current.is_some() {
                rule.sound()
            } else {
                None
            };

            if changed {
                tracing::debug!(
                    effect = %rule.effect(),
                    slot = %slot,
                    ?previous,
                    ?current,
                    "debuff tier changed"
                );
            }

            transitions.push(DebuffTransition {
                rule: id,
                effect: rule.effect().clone(),
                slot,
                previous,
                current,
                sound,
            });
        }

        transitions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debuff::DebuffBuilder;
    use crate::registry::{RegistryBuilder, RuleMatch};
    use crate::topology::BodyPart;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_sound_fires_once_per_transition() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let mut builder = RegistryBuilder::new();
        DebuffBuilder::on_hit("blindness")
            .add_bound(10.0, 40)
            .add_bound(5.0, 20)
            .add_sound_effect(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                SoundId::new("heartbeat")
            })
            .register(&mut builder, DebuffSlot::Head);
        let registry = builder.finalize();
        let evaluator = DebuffEvaluator::new(&registry);
        let mut tracker = DebuffTracker::new();

        evaluator.on_hit(DebuffSlot::Head, 6.0, &mut tracker);
        evaluator.on_hit(DebuffSlot::Head, 7.0, &mut tracker);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        evaluator.on_hit(DebuffSlot::Head, 12.0, &mut tracker);
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        // Only a lapse lets the same tier sound again.
        evaluator.on_hit(DebuffSlot::Head, 12.0, &mut tracker);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        tracker.tick(40);
        let out = evaluator.on_hit(DebuffSlot::Head, 12.0, &mut tracker);
        assert_eq!(out[0].previous, None);
        assert_eq!(out[0].sound, Some(SoundId::new("heartbeat")));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_light_hit_leaves_running_effect() {
        let mut builder = RegistryBuilder::new();
        let id = DebuffBuilder::on_hit("blindness")
            .add_bound(2.0, 160)
            .add_bound(1.0, 80)
            .add_sound_effect(|| SoundId::new("heartbeat"))
            .register(&mut builder, DebuffSlot::Head)
            .unwrap();
        let registry = builder.finalize();
        let evaluator = DebuffEvaluator::new(&registry);
        let mut tracker = DebuffTracker::new();

        assert_eq!(evaluator.on_hit(DebuffSlot::Head, 3.0, &mut tracker).len(), 1);
        assert!(evaluator.on_hit(DebuffSlot::Head, 0.5, &mut tracker).is_empty());
        assert_eq!(tracker.active_tier(id), Some(160));

        // Still running, so no second heartbeat.
        let out = evaluator.on_hit(DebuffSlot::Head, 3.0, &mut tracker);
        assert!(!out[0].changed());
        assert_eq!(out[0].sound, None);
    }

    #[test]
    fn test_tick_expires_on_hit_only() {
        let mut builder = RegistryBuilder::new();
        let hit = DebuffBuilder::on_hit("nausea")
            .add_bound(2.0, 10)
            .register(&mut builder, DebuffSlot::Body)
            .unwrap();
        let held = DebuffBuilder::constant("weakness")
            .add_bound(0.5, 1)
            .register(&mut builder, DebuffSlot::Body)
            .unwrap();
        let registry = builder.finalize();
        let evaluator = DebuffEvaluator::new(&registry);
        let mut tracker = DebuffTracker::new();

        evaluator.on_hit(DebuffSlot::Body, 2.0, &mut tracker);
        evaluator.constant(DebuffSlot::Body, 0.2, &mut tracker);

        assert!(tracker.tick(9).is_empty());
        assert_eq!(tracker.tick(5), vec![hit]);
        assert_eq!(tracker.active_tier(hit), None);
        assert_eq!(tracker.active_tier(held), Some(1));

        assert_eq!(tracker.expire(held), Some(1));
        assert_eq!(tracker.active_tier(held), None);
    }

    #[test]
    fn test_disabled_on_hit_rule_keeps_running_tier() {
        let enabled = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&enabled);

        let mut builder = RegistryBuilder::new();
        let id = DebuffBuilder::on_hit("nausea")
            .add_enable_condition(move || flag.load(Ordering::SeqCst))
            .add_bound(2.0, 100)
            .register(&mut builder, DebuffSlot::Body)
            .unwrap();
        let registry = builder.finalize();
        let evaluator = DebuffEvaluator::new(&registry);
        let mut tracker = DebuffTracker::new();

        evaluator.on_hit(DebuffSlot::Body, 3.0, &mut tracker);
        enabled.store(false, Ordering::SeqCst);
        assert!(evaluator.on_hit(DebuffSlot::Body, 3.0, &mut tracker).is_empty());
        assert_eq!(tracker.active_tier(id), Some(100));
    }

    #[test]
    fn test_outcome_uses_hardest_part_hit() {
        let mut builder = RegistryBuilder::new();
        DebuffBuilder::on_hit("slowness")
            .add_bound(3.0, 60)
            .register(&mut builder, DebuffSlot::LegsAndFeet);
        let registry = builder.finalize();
        let evaluator = DebuffEvaluator::new(&registry);
        let mut tracker = DebuffTracker::new();

        let mut spread = DistributionOutcome::new("fall".into(), RuleMatch::Fallback, 4.0);
        spread.record(BodyPart::LeftFoot, 2.0);
        spread.record(BodyPart::RightFoot, 2.0);
        assert!(evaluator.on_hit_outcome(&spread, &mut tracker).is_empty());

        let mut focused = DistributionOutcome::new("fall".into(), RuleMatch::Fallback, 4.0);
        focused.record(BodyPart::LeftFoot, 3.0);
        focused.record(BodyPart::RightFoot, 1.0);
        let out = evaluator.on_hit_outcome(&focused, &mut tracker);
        assert_eq!(out[0].current, Some(60));
    }

    #[test]
    fn test_disabled_rule_contributes_nothing() {
        let enabled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&enabled);

        let mut builder = RegistryBuilder::new();
        let id = DebuffBuilder::constant("weakness")
            .add_enable_condition(move || flag.load(Ordering::SeqCst))
            .add_bound(0.5, 1)
            .register(&mut builder, DebuffSlot::Body)
            .unwrap();
        let registry = builder.finalize();
        let evaluator = DebuffEvaluator::new(&registry);
        let mut tracker = DebuffTracker::new();

        assert!(evaluator.constant(DebuffSlot::Body, 0.1, &mut tracker).is_empty());
        assert_eq!(tracker.active_tier(id), None);

        enabled.store(true, Ordering::SeqCst);
        let out = evaluator.constant(DebuffSlot::Body, 0.1, &mut tracker);
        assert_eq!(out[0].current, Some(1));
        assert_eq!(tracker.active_tier(id), Some(1));
    }

    #[test]
    fn test_constant_reports_changes_only() {
        let mut builder = RegistryBuilder::new();
        DebuffBuilder::constant("slowness")
            .add_bound(0.35, 3)
            .add_bound(0.6, 2)
            .add_bound(0.8, 1)
            .register(&mut builder, DebuffSlot::LegsAndFeet);
        let registry = builder.finalize();
        let evaluator = DebuffEvaluator::new(&registry);
        let mut tracker = DebuffTracker::new();

        assert!(evaluator.constant(DebuffSlot::LegsAndFeet, 0.9, &mut tracker).is_empty());
        let out = evaluator.constant(DebuffSlot::LegsAndFeet, 0.7, &mut tracker);
        assert_eq!(out[0].current, Some(1));
        assert!(evaluator.constant(DebuffSlot::LegsAndFeet, 0.65, &mut tracker).is_empty());
        let out = evaluator.constant(DebuffSlot::LegsAndFeet, 0.3, &mut tracker);
        assert_eq!(out[0].previous, Some(1));
        assert_eq!(out[0].current, Some(3));
    }

    #[test]
    fn test_kinds_do_not_mix() {
        let mut builder = RegistryBuilder::new();
        DebuffBuilder::on_hit("nausea")
            .add_bound(2.0, 100)
            .register(&mut builder, DebuffSlot::Body);
        DebuffBuilder::constant("weakness")
            .add_bound(0.5, 1)
            .register(&mut builder, DebuffSlot::Body);
        let registry = builder.finalize();
        let evaluator = DebuffEvaluator::new(&registry);
        let mut tracker = DebuffTracker::new();

        let out = evaluator.on_hit(DebuffSlot::Body, 0.3, &mut tracker);
        assert!(out.is_empty());
        let out = evaluator.constant(DebuffSlot::Body, 0.3, &mut tracker);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].effect.as_str(), "weakness");
    }
}
