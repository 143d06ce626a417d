//! Debuff rules.
//!
//! A debuff rule is a ladder of `(threshold, magnitude)` bounds attached
//! to a body region. On-hit rules read the damage a region just took and
//! need a strictly descending ladder. Constant rules read the fraction of
//! health the region has left and need a non-decreasing ladder. Ladders
//! that break their ordering are rejected when the rule is built.

use crate::error::ConfigError;
use crate::ids::{EffectId, SoundId};
use crate::registry::{DebuffRuleId, RegistryBuilder};
use crate::topology::DebuffSlot;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Gate deciding whether a rule is active right now.
///
/// Evaluated fresh on every use; implementations must not assume the
/// answer is cached.
pub trait EnableCondition: Send + Sync {
    fn is_enabled(&self) -> bool;
}

impl<F> EnableCondition for F
where
    F: Fn() -> bool + Send + Sync,
{
    fn is_enabled(&self) -> bool {
        (self)()
    }
}

/// Supplies the sound to play when a rule enters a new tier.
pub type SoundSupplier = Arc<dyn Fn() -> SoundId + Send + Sync>;

/// What a rule's thresholds are compared against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DebuffKind {
    /// Damage taken by the region in a single hit.
    OnHit,
    /// Fraction of the region's health remaining.
    Constant,
}

impl DebuffKind {
    /// Name of the configuration field holding this kind's thresholds.
    pub fn threshold_field(self) -> &'static str {
        match self {
            DebuffKind::OnHit => "damageTaken",
            DebuffKind::Constant => "healthPercentageLeft",
        }
    }
}

/// One rung of a debuff ladder.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bound {
    pub threshold: f32,
    pub magnitude: i32,
}

/// A sealed debuff rule.
#[derive(Clone)]
pub struct DebuffRule {
    effect: EffectId,
    kind: DebuffKind,
    bounds: Vec<Bound>,
    condition: Option<Arc<dyn EnableCondition>>,
    sound: Option<SoundSupplier>,
    slot: DebuffSlot,
}

impl DebuffRule {
    /// The status effect this rule drives.
    pub fn effect(&self) -> &EffectId {
        &self.effect
    }

    pub fn kind(&self) -> DebuffKind {
        self.kind
    }

    /// Ladder rungs in evaluation order.
    pub fn bounds(&self) -> &[Bound] {
        &self.bounds
    }

    /// Region whose damage or health the rule watches.
    pub fn slot(&self) -> DebuffSlot {
        self.slot
    }

    /// Whether the rule currently applies. Rules without a condition are
    /// always enabled.
    pub fn is_enabled(&self) -> bool {
        self.condition
            .as_ref()
            .map_or(true, |condition| condition.is_enabled())
    }

    pub fn has_sound(&self) -> bool {
        self.sound.is_some()
    }

    pub(crate) fn sound(&self) -> Option<SoundId> {
        self.sound.as_ref().map(|supplier| supplier())
    }

    /// Pick the magnitude for an observation, ignoring the enable gate.
    ///
    /// On-hit rules take the first rung (highest threshold first) whose
    /// threshold the damage reaches. Constant rules take the first rung
    /// (lowest threshold first) the remaining health fraction is at or
    /// under.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use firstaid_rules::{DebuffBuilder, DebuffSlot, RegistryBuilder};
    ///
    /// let mut builder = RegistryBuilder::new();
    /// let id = DebuffBuilder::on_hit("blindness")
    ///     .add_bound(10.0, 40)
    ///     .add_bound(5.0, 20)
    ///     .register(&mut builder, DebuffSlot::Head)
    ///     .unwrap();
    /// let registry = builder.finalize();
    ///
    /// let rule = registry.debuff(id);
    /// assert_eq!(rule.select(7.0), Some(20));
    /// assert_eq!(rule.select(12.0), Some(40));
    /// assert_eq!(rule.select(2.0), None);
    /// ```
    pub fn select(&self, observation: f32) -> Option<i32> {
        let bound = match self.kind {
            DebuffKind::OnHit => self
                .bounds
                .iter()
                .find(|bound| bound.threshold <= observation),
            DebuffKind::Constant => self
                .bounds
                .iter()
                .find(|bound| observation <= bound.threshold),
        };
        bound.map(|bound| bound.magnitude)
    }
}

impl fmt::Debug for DebuffRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DebuffRule")
            .field("effect", &self.effect)
            .field("kind", &self.kind)
            .field("bounds", &self.bounds)
            .field("conditional", &self.condition.is_some())
            .field("sound", &self.sound.is_some())
            .field("slot", &self.slot)
            .finish()
    }
}

/// Check that a threshold ladder is ordered the way `kind` requires.
///
/// On-hit ladders are compared against a copy sorted in descending order
/// and must not repeat a threshold. Constant ladders only need to be
/// non-decreasing.
pub fn validate_thresholds(kind: DebuffKind, thresholds: &[f32]) -> Result<(), ConfigError> {
    let field = kind.threshold_field();
    if thresholds.is_empty() {
        return Err(ConfigError::Empty);
    }
    if thresholds.iter().any(|t| !t.is_finite()) {
        return Err(ConfigError::NonFinite { field });
    }

    let ordered = match kind {
        DebuffKind::OnHit => {
            let mut sorted = thresholds.to_vec();
            sorted.sort_by(|a, b| b.total_cmp(a));
            sorted == thresholds && thresholds.windows(2).all(|w| w[0] != w[1])
        }
        DebuffKind::Constant => thresholds.windows(2).all(|w| w[0] <= w[1]),
    };

    if ordered {
        Ok(())
    } else {
        Err(ConfigError::Unsorted { field })
    }
}

/// Builder for debuff rules.
///
/// # Examples
///
/// ```rust
/// use firstaid_rules::{DebuffBuilder, DebuffSlot, RegistryBuilder};
///
/// let mut builder = RegistryBuilder::new();
///
/// // Ascending ladder: accepted.
/// let ok = DebuffBuilder::constant("weakness")
///     .add_bound(0.25, 2)
///     .add_bound(0.5, 1)
///     .register(&mut builder, DebuffSlot::Body);
/// assert!(ok.is_some());
///
/// // Descending ladder on a constant rule: dropped and reported.
/// let rejected = DebuffBuilder::constant("slowness")
///     .add_bound(0.8, 1)
///     .add_bound(0.35, 3)
///     .register(&mut builder, DebuffSlot::LegsAndFeet);
/// assert!(rejected.is_none());
/// assert_eq!(builder.config_errors().len(), 1);
/// ```
pub struct DebuffBuilder {
    effect: EffectId,
    kind: DebuffKind,
    bounds: Vec<Bound>,
    condition: Option<Arc<dyn EnableCondition>>,
    sound: Option<SoundSupplier>,
}

impl DebuffBuilder {
    fn new(effect: EffectId, kind: DebuffKind) -> Self {
        Self {
            effect,
            kind,
            bounds: Vec::new(),
            condition: None,
            sound: None,
        }
    }

    /// Start a rule driven by damage taken in one hit.
    pub fn on_hit(effect: impl Into<EffectId>) -> Self {
        Self::new(effect.into(), DebuffKind::OnHit)
    }

    /// Start a rule driven by the fraction of health remaining.
    pub fn constant(effect: impl Into<EffectId>) -> Self {
        Self::new(effect.into(), DebuffKind::Constant)
    }

    /// Gate the rule behind a condition checked at every evaluation.
    ///
    /// A rule without one is always enabled. A later call replaces the
    /// earlier condition.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use firstaid_rules::{ConfigFlag, DebuffBuilder, DebuffSlot, RegistryBuilder};
    ///
    /// let flag = ConfigFlag::new(true);
    /// let gate = flag.clone();
    ///
    /// let mut builder = RegistryBuilder::new();
    /// let id = DebuffBuilder::constant("weakness")
    ///     .add_enable_condition(move || gate.get())
    ///     .add_bound(0.5, 1)
    ///     .register(&mut builder, DebuffSlot::Body)
    ///     .unwrap();
    /// let registry = builder.finalize();
    ///
    /// flag.set(false);
    /// assert!(!registry.debuff(id).is_enabled());
    /// ```
    pub fn add_enable_condition(mut self, condition: impl EnableCondition + 'static) -> Self {
        self.condition = Some(Arc::new(condition));
        self
    }

    /// Append a rung to the ladder.
    ///
    /// On-hit rungs go from the highest damage threshold down and must not
    /// repeat one. Constant rungs go from the lowest health fraction up.
    /// The order is checked when the rule is registered.
    pub fn add_bound(mut self, threshold: f32, magnitude: i32) -> Self {
        self.bounds.push(Bound {
            threshold,
            magnitude,
        });
        self
    }

    /// Play a sound whenever the rule enters a new tier.
    ///
    /// The supplier runs at evaluation time, once per tier entered.
    pub fn add_sound_effect<F>(mut self, supplier: F) -> Self
    where
        F: Fn() -> SoundId + Send + Sync + 'static,
    {
        self.sound = Some(Arc::new(supplier));
        self
    }

    /// The effect this builder configures.
    pub fn effect(&self) -> &EffectId {
        &self.effect
    }

    /// Validate the ladder and seal the rule for `slot`.
    pub fn build(self, slot: DebuffSlot) -> Result<DebuffRule, ConfigError> {
        let thresholds: Vec<f32> = self.bounds.iter().map(|b| b.threshold).collect();
        validate_thresholds(self.kind, &thresholds)?;
        Ok(DebuffRule {
            effect: self.effect,
            kind: self.kind,
            bounds: self.bounds,
            condition: self.condition,
            sound: self.sound,
            slot,
        })
    }

    /// Seal the rule and add it to the registry under `slot`.
    ///
    /// A rule with an invalid ladder is dropped as a whole. The reason is
    /// recorded in the registry's configuration errors and `None` is
    /// returned; registration of other rules is unaffected.
    pub fn register(self, registry: &mut RegistryBuilder, slot: DebuffSlot) -> Option<DebuffRuleId> {
        let effect = self.effect.clone();
        match self.build(slot) {
            Ok(rule) => Some(registry.insert_debuff(rule)),
            Err(err) => {
                registry.report_config_error(&effect, slot, &err);
                None
            }
        }
    }
}
