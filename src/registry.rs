//! Rule registry.
//!
//! Registration happens once at startup against a mutable
//! [`RegistryBuilder`]. [`RegistryBuilder::finalize`] consumes it and
//! produces a [`Registry`], which has no mutating API and can be shared
//! freely between threads.

use crate::debuff::{DebuffKind, DebuffRule};
use crate::distribution::DistributionRule;
use crate::error::{ConfigError, RegistryError};
use crate::ids::{DamageSourceId, EffectId};
use crate::source::{DamageSource, SourceMatcher};
use crate::topology::DebuffSlot;
use std::collections::HashMap;

/// Handle to a registered distribution rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DistributionRuleId(pub(crate) usize);

/// Handle to a registered debuff rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DebuffRuleId(pub(crate) usize);

/// How a damage source was matched to its rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleMatch {
    /// Claimed by a static key.
    Static(DistributionRuleId),
    /// Accepted by a predicate rule.
    Dynamic(DistributionRuleId),
    /// Nothing matched; the fallback policy applies.
    Fallback,
}

/// Registration-time side of the registry.
///
/// # Examples
///
/// ```rust
/// use firstaid_rules::{BodyPart, DistributionBuilder, EquipmentSlot, RegistryBuilder};
///
/// let mut builder = RegistryBuilder::new();
/// DistributionBuilder::standard()
///     .add_distribution_layer(EquipmentSlot::Head, &[BodyPart::Head])
///     .register_static(&mut builder, ["anvil"])
///     .unwrap();
///
/// let registry = builder.finalize();
/// assert_eq!(registry.distribution_count(), 1);
/// ```
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    distributions: Vec<(DistributionRule, SourceMatcher)>,
    static_index: HashMap<DamageSourceId, DistributionRuleId>,
    debuffs: Vec<DebuffRule>,
    config_errors: Vec<String>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert_distribution(
        &mut self,
        rule: DistributionRule,
        matcher: SourceMatcher,
    ) -> Result<DistributionRuleId, RegistryError> {
        let id = DistributionRuleId(self.distributions.len());

        if let SourceMatcher::Static(sources) = &matcher {
            for (i, source) in sources.iter().enumerate() {
                if self.static_index.contains_key(source) || sources[..i].contains(source) {
                    return Err(RegistryError::DuplicateSource(source.clone()));
                }
            }
            for source in sources {
                self.static_index.insert(source.clone(), id);
            }
        }

        tracing::debug!(rule = id.0, matcher = ?matcher, "registered distribution rule");
        self.distributions.push((rule, matcher));
        Ok(id)
    }

    pub(crate) fn insert_debuff(&mut self, rule: DebuffRule) -> DebuffRuleId {
        let id = DebuffRuleId(self.debuffs.len());
        tracing::debug!(
            rule = id.0,
            effect = %rule.effect(),
            slot = %rule.slot(),
            kind = ?rule.kind(),
            "registered debuff rule"
        );
        self.debuffs.push(rule);
        id
    }

    /// Record a dropped debuff rule.
    ///
    /// The message is logged at `warn` and kept for
    /// [`Registry::config_errors`].
    pub fn report_config_error(&mut self, effect: &EffectId, slot: DebuffSlot, error: &ConfigError) {
        let message = format!(
            "Invalid config entry for debuff {} at part {}: {}",
            effect, slot, error
        );
        tracing::warn!("{}", message);
        self.config_errors.push(message);
    }

    /// Configuration errors recorded so far, in order.
    pub fn config_errors(&self) -> &[String] {
        &self.config_errors
    }

    /// Seal the registry.
    ///
    /// Runs a final verification pass over the debuff rules, then freezes
    /// everything. No rule can be added afterwards.
    pub fn finalize(mut self) -> Registry {
        self.verify_debuffs();

        let mut debuffs_by_slot: HashMap<DebuffSlot, Vec<DebuffRuleId>> = HashMap::new();
        for (i, rule) in self.debuffs.iter().enumerate() {
            debuffs_by_slot
                .entry(rule.slot())
                .or_default()
                .push(DebuffRuleId(i));
        }

        let (rules, matchers): (Vec<_>, Vec<_>) = self.distributions.into_iter().unzip();
        let dynamic = matchers
            .into_iter()
            .enumerate()
            .filter_map(|(i, matcher)| match matcher {
                SourceMatcher::Dynamic(predicate) => Some((DistributionRuleId(i), predicate)),
                SourceMatcher::Static(_) => None,
            })
            .collect::<Vec<_>>();

        tracing::info!(
            distributions = rules.len(),
            static_sources = self.static_index.len(),
            dynamic_rules = dynamic.len(),
            debuffs = self.debuffs.len(),
            config_errors = self.config_errors.len(),
            "finalized registries"
        );

        Registry {
            distributions: rules,
            static_index: self.static_index,
            dynamic,
            debuffs: self.debuffs,
            debuffs_by_slot,
            config_errors: self.config_errors,
            fallback: DistributionRule::fallback(),
        }
    }

    /// Flag effects registered twice with the same kind on one slot.
    fn verify_debuffs(&mut self) {
        let mut seen: Vec<(DebuffSlot, DebuffKind, EffectId)> = Vec::new();
        let mut duplicates = Vec::new();
        for rule in &self.debuffs {
            let key = (rule.slot(), rule.kind(), rule.effect().clone());
            if seen.contains(&key) {
                duplicates.push(key);
            } else {
                seen.push(key);
            }
        }
        for (slot, kind, effect) in duplicates {
            let message = format!(
                "Debuff {} is registered more than once as {:?} at part {}",
                effect, kind, slot
            );
            tracing::warn!("{}", message);
            self.config_errors.push(message);
        }
    }
}

/// The frozen registry consulted at runtime.
pub struct Registry {
    distributions: Vec<DistributionRule>,
    static_index: HashMap<DamageSourceId, DistributionRuleId>,
    dynamic: Vec<(DistributionRuleId, crate::source::SourcePredicate)>,
    debuffs: Vec<DebuffRule>,
    debuffs_by_slot: HashMap<DebuffSlot, Vec<DebuffRuleId>>,
    config_errors: Vec<String>,
    fallback: DistributionRule,
}

impl Registry {
    /// Find the rule for a damage source.
    ///
    /// Static keys always win. Otherwise predicate rules are tried in
    /// registration order and the first acceptance wins.
    pub fn lookup(&self, source: &DamageSource) -> (RuleMatch, &DistributionRule) {
        if let Some(&id) = self.static_index.get(source.id()) {
            return (RuleMatch::Static(id), &self.distributions[id.0]);
        }
        self.dynamic
            .iter()
            .find(|(_, predicate)| predicate(source))
            .map(|&(id, _)| (RuleMatch::Dynamic(id), &self.distributions[id.0]))
            .unwrap_or((RuleMatch::Fallback, &self.fallback))
    }

    /// A registered distribution rule.
    pub fn distribution(&self, id: DistributionRuleId) -> &DistributionRule {
        &self.distributions[id.0]
    }

    pub fn distribution_count(&self) -> usize {
        self.distributions.len()
    }

    /// A registered debuff rule.
    pub fn debuff(&self, id: DebuffRuleId) -> &DebuffRule {
        &self.debuffs[id.0]
    }

    pub fn debuff_count(&self) -> usize {
        self.debuffs.len()
    }

    /// Debuff rules attached to a slot, in registration order.
    pub fn debuffs_for(&self, slot: DebuffSlot) -> impl Iterator<Item = (DebuffRuleId, &DebuffRule)> {
        self.debuffs_by_slot
            .get(&slot)
            .map(Vec::as_slice)
            .unwrap_or(&[])
            .iter()
            .map(move |&id| (id, &self.debuffs[id.0]))
    }

    /// Human-readable configuration errors recorded during registration.
    pub fn config_errors(&self) -> &[String] {
        &self.config_errors
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("distributions", &self.distributions.len())
            .field("static_sources", &self.static_index.len())
            .field("dynamic_rules", &self.dynamic.len())
            .field("debuffs", &self.debuffs.len())
            .field("config_errors", &self.config_errors)
            .finish()
    }
}
