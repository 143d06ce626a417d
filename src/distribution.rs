//! Damage distribution rules.
//!
//! A [`DistributionRule`] describes how damage from a class of sources is
//! spread over the body. Rules are put together with a
//! [`DistributionBuilder`] and sealed when they are registered; after that
//! they are never modified.

use crate::error::RegistryError;
use crate::ids::DamageSourceId;
use crate::registry::{DistributionRuleId, RegistryBuilder};
use crate::source::{DamageSource, SourceMatcher};
use crate::topology::{BodyPart, EquipmentSlot};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::sync::Arc;

/// How a rule apportions damage across its layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Strategy {
    /// Layers absorb in cascade order; overflow moves on to the next layer.
    Standard,
    /// One layer, chosen uniformly at random, takes all the damage.
    Random,
    /// Damage is split evenly over every covered part.
    Equal,
}

/// One armor slot paired with the body parts that share it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionLayer {
    pub slot: EquipmentSlot,
    pub parts: Vec<BodyPart>,
}

impl DistributionLayer {
    /// A layer covering `parts`, protected by the armor in `slot`.
    pub fn new(slot: EquipmentSlot, parts: &[BodyPart]) -> Self {
        Self {
            slot,
            parts: parts.to_vec(),
        }
    }
}

/// A sealed, immutable distribution rule.
///
/// Only obtainable through [`DistributionBuilder`] registration, so every
/// instance has passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct DistributionRule {
    layers: Vec<DistributionLayer>,
    strategy: Strategy,
    ignore_order: bool,
    no_kill: bool,
    reduction: f32,
}

impl DistributionRule {
    /// The policy for sources no rule matches: every part takes an equal
    /// share and nothing else applies.
    pub(crate) fn fallback() -> Self {
        Self {
            layers: Vec::new(),
            strategy: Strategy::Equal,
            ignore_order: false,
            no_kill: false,
            reduction: 1.0,
        }
    }

    /// Layers as declared. Empty when the rule uses the implicit topology.
    pub fn layers(&self) -> &[DistributionLayer] {
        &self.layers
    }

    /// Layers the resolver works with.
    ///
    /// A rule declared without layers spans the whole body: one layer per
    /// body part, in canonical order, on that part's natural slot.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use firstaid_rules::{BodyPart, DistributionBuilder, RegistryBuilder};
    ///
    /// let mut registry = RegistryBuilder::new();
    /// let id = DistributionBuilder::random()
    ///     .register_static(&mut registry, ["magic"])
    ///     .unwrap();
    /// let registry = registry.finalize();
    ///
    /// let layers = registry.distribution(id).effective_layers();
    /// assert_eq!(layers.len(), BodyPart::COUNT);
    /// assert_eq!(layers[0].parts, vec![BodyPart::Head]);
    /// ```
    pub fn effective_layers(&self) -> Cow<'_, [DistributionLayer]> {
        if self.layers.is_empty() {
            Cow::Owned(
                BodyPart::ALL
                    .iter()
                    .map(|&part| DistributionLayer::new(part.natural_slot(), &[part]))
                    .collect(),
            )
        } else {
            Cow::Borrowed(&self.layers)
        }
    }

    /// How damage is apportioned across the layers.
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Whether layers are tried by coverage rather than call order.
    pub fn ignores_order(&self) -> bool {
        self.ignore_order
    }

    /// Whether the rule tries to keep every part above the lethal floor.
    pub fn no_kill(&self) -> bool {
        self.no_kill
    }

    /// Factor applied to incoming damage, in `(0, 1]`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use firstaid_rules::{DamageSource, DistributionBuilder, RegistryBuilder};
    ///
    /// let mut registry = RegistryBuilder::new();
    /// let id = DistributionBuilder::equal()
    ///     .reduction_multiplier(0.8)
    ///     .register_dynamic(&mut registry, DamageSource::is_explosion)
    ///     .unwrap();
    /// let registry = registry.finalize();
    ///
    /// assert_eq!(registry.distribution(id).reduction(), 0.8);
    /// ```
    pub fn reduction(&self) -> f32 {
        self.reduction
    }
}

/// Fluent builder for distribution rules.
///
/// # Examples
///
/// ```rust
/// use firstaid_rules::{BodyPart, DistributionBuilder, EquipmentSlot, RegistryBuilder};
///
/// let mut registry = RegistryBuilder::new();
/// DistributionBuilder::standard()
///     .add_distribution_layer(EquipmentSlot::Feet, &[BodyPart::LeftFoot, BodyPart::RightFoot])
///     .add_distribution_layer(EquipmentSlot::Legs, &[BodyPart::LeftLeg, BodyPart::RightLeg])
///     .register_static(&mut registry, ["fall", "hot_floor"])
///     .unwrap();
///
/// // Claiming the same source twice is a build-time error.
/// let again = DistributionBuilder::random().register_static(&mut registry, ["fall"]);
/// assert!(again.is_err());
/// ```
#[derive(Debug, Clone)]
pub struct DistributionBuilder {
    strategy: Strategy,
    layers: Vec<DistributionLayer>,
    ignore_order: bool,
    no_kill: bool,
    reduction: f32,
}

impl DistributionBuilder {
    fn new(strategy: Strategy) -> Self {
        Self {
            strategy,
            layers: Vec::new(),
            ignore_order: false,
            no_kill: false,
            reduction: 1.0,
        }
    }

    /// Start a cascading rule: the first layer absorbs first.
    pub fn standard() -> Self {
        Self::new(Strategy::Standard)
    }

    /// Start a rule that sends all damage to one random layer.
    pub fn random() -> Self {
        Self::new(Strategy::Random)
    }

    /// Start a rule that splits damage evenly over all covered parts.
    pub fn equal() -> Self {
        Self::new(Strategy::Equal)
    }

    /// Append a layer. Call order is cascade order for standard rules.
    pub fn add_distribution_layer(mut self, slot: EquipmentSlot, parts: &[BodyPart]) -> Self {
        self.layers.push(DistributionLayer::new(slot, parts));
        self
    }

    /// Try layers by coverage instead of call order.
    pub fn ignore_order(mut self) -> Self {
        self.ignore_order = true;
        self
    }

    /// Keep parts above the lethal floor while other capacity remains.
    pub fn try_no_kill(mut self) -> Self {
        self.no_kill = true;
        self
    }

    /// Scale all incoming damage by `multiplier` before distributing it.
    pub fn reduction_multiplier(mut self, multiplier: f32) -> Self {
        self.reduction = multiplier;
        self
    }

    /// Validate and freeze the rule.
    fn seal(self) -> Result<DistributionRule, RegistryError> {
        if !(self.reduction > 0.0 && self.reduction <= 1.0) {
            return Err(RegistryError::InvalidReduction(self.reduction));
        }

        let mut seen = Vec::with_capacity(BodyPart::COUNT);
        for layer in &self.layers {
            if layer.parts.is_empty() {
                return Err(RegistryError::EmptyLayer(layer.slot));
            }
            for &part in &layer.parts {
                if seen.contains(&part) {
                    return Err(RegistryError::DuplicatePart(part));
                }
                seen.push(part);
            }
        }

        Ok(DistributionRule {
            layers: self.layers,
            strategy: self.strategy,
            ignore_order: self.ignore_order,
            no_kill: self.no_kill,
            reduction: self.reduction,
        })
    }

    /// Seal the rule and register it for an exact set of damage sources.
    ///
    /// Fails without registering anything if a source is already claimed,
    /// listed twice, or if the rule itself is invalid.
    pub fn register_static<I, S>(
        self,
        registry: &mut RegistryBuilder,
        sources: I,
    ) -> Result<DistributionRuleId, RegistryError>
    where
        I: IntoIterator<Item = S>,
        S: Into<DamageSourceId>,
    {
        let sources: Vec<DamageSourceId> = sources.into_iter().map(Into::into).collect();
        if sources.is_empty() {
            return Err(RegistryError::NoSources);
        }
        let rule = self.seal()?;
        registry.insert_distribution(rule, SourceMatcher::Static(sources))
    }

    /// Seal the rule and register it behind a predicate.
    ///
    /// Predicate rules are consulted in registration order, and only when
    /// no static rule claims the source.
    pub fn register_dynamic<F>(
        self,
        registry: &mut RegistryBuilder,
        predicate: F,
    ) -> Result<DistributionRuleId, RegistryError>
    where
        F: Fn(&DamageSource) -> bool + Send + Sync + 'static,
    {
        let rule = self.seal()?;
        registry.insert_distribution(rule, SourceMatcher::Dynamic(Arc::new(predicate)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seal_keeps_settings() {
        let rule = DistributionBuilder::equal()
            .reduction_multiplier(0.8)
            .try_no_kill()
            .seal()
            .unwrap();
        assert_eq!(rule.strategy(), Strategy::Equal);
        assert_eq!(rule.reduction(), 0.8);
        assert!(rule.no_kill());
        assert!(!rule.ignores_order());
    }

    #[test]
    fn test_seal_rejects_bad_reduction() {
        for bad in [0.0, -0.5, 1.01, f32::NAN] {
            let result = DistributionBuilder::equal().reduction_multiplier(bad).seal();
            assert!(matches!(result, Err(RegistryError::InvalidReduction(_))));
        }
    }

    #[test]
    fn test_seal_rejects_empty_layer() {
        let result = DistributionBuilder::standard()
            .add_distribution_layer(EquipmentSlot::Head, &[])
            .seal();
        assert_eq!(result, Err(RegistryError::EmptyLayer(EquipmentSlot::Head)));
    }

    #[test]
    fn test_seal_rejects_part_in_two_layers() {
        let result = DistributionBuilder::standard()
            .add_distribution_layer(EquipmentSlot::Head, &[BodyPart::Head])
            .add_distribution_layer(EquipmentSlot::Chest, &[BodyPart::Body, BodyPart::Head])
            .seal();
        assert_eq!(result, Err(RegistryError::DuplicatePart(BodyPart::Head)));
    }

    #[test]
    fn test_effective_layers_with_declared_layers() {
        let rule = DistributionBuilder::standard()
            .add_distribution_layer(EquipmentSlot::Head, &[BodyPart::Head])
            .seal()
            .unwrap();
        assert_eq!(rule.effective_layers().len(), 1);
        assert!(matches!(rule.effective_layers(), Cow::Borrowed(_)));
    }

    #[test]
    fn test_register_static_requires_sources() {
        let mut registry = RegistryBuilder::new();
        let result =
            DistributionBuilder::random().register_static(&mut registry, Vec::<&str>::new());
        assert_eq!(result, Err(RegistryError::NoSources));
    }
}
