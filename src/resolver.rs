//! Distribution resolver.
//!
//! Provides [`DistributionResolver`], the runtime half of the distribution
//! rules: it picks the rule for an incoming damage event and apportions
//! the damage over the body parts that rule covers.

use crate::distribution::{DistributionLayer, DistributionRule, Strategy};
use crate::health::{EquipmentSnapshot, HealthState};
use crate::outcome::{DistributionOutcome, DAMAGE_EPSILON};
use crate::registry::{Registry, RuleMatch};
use crate::source::DamageSource;
use crate::topology::BodyPart;
use rand::Rng;

/// Health a no-kill pass leaves in every part it touches.
pub const NO_KILL_FLOOR: f32 = 1.0;

/// An incoming damage event.
#[derive(Debug, Clone, PartialEq)]
pub struct DamageEvent {
    pub source: DamageSource,
    pub amount: f32,
}

impl DamageEvent {
    /// Damage of `amount` from `source`.
    pub fn new(source: DamageSource, amount: f32) -> Self {
        Self { source, amount }
    }
}

/// Routes damage events through the rules of a finalized [`Registry`].
///
/// The resolver holds no state of its own; any number of them can read
/// the same registry concurrently.
///
/// # Examples
///
/// ```rust
/// use firstaid_rules::*;
/// use rand::SeedableRng;
/// use rand::rngs::StdRng;
///
/// let mut builder = RegistryBuilder::new();
/// DistributionBuilder::equal()
///     .reduction_multiplier(0.5)
///     .register_dynamic(&mut builder, DamageSource::is_explosion)
///     .unwrap();
/// let registry = builder.finalize();
///
/// let resolver = DistributionResolver::new(&registry);
/// let outcome = resolver.resolve(
///     &DamageEvent::new(DamageSource::new("tnt").explosion(), 16.0),
///     &HealthState::uniform(4.0),
///     &EquipmentSnapshot::unarmored(),
///     &mut StdRng::seed_from_u64(1),
/// );
///
/// // 16 * 0.5 = 8, spread over eight parts.
/// assert_eq!(outcome.mitigated, 8.0);
/// for part in BodyPart::ALL {
///     assert_eq!(outcome.damage_to(part), 1.0);
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct DistributionResolver<'a> {
    registry: &'a Registry,
}

impl<'a> DistributionResolver<'a> {
    pub fn new(registry: &'a Registry) -> Self {
        Self { registry }
    }

    /// Distribute one damage event.
    ///
    /// Negative or non-finite amounts are treated as zero. Sources no rule
    /// claims are spread evenly over every part with armor ignored.
    pub fn resolve<R>(
        &self,
        event: &DamageEvent,
        health: &HealthState,
        equipment: &EquipmentSnapshot,
        rng: &mut R,
    ) -> DistributionOutcome
    where
        R: Rng + ?Sized,
    {
        let amount = if event.amount.is_finite() {
            event.amount.max(0.0)
        } else {
            0.0
        };

        let (matched, rule) = self.registry.lookup(&event.source);
        let armored = matched != RuleMatch::Fallback && !event.source.bypasses_armor();
        if matched == RuleMatch::Fallback {
            tracing::debug!(source = %event.source.id(), "no distribution rule, spreading evenly");
        }

        let layers = rule.effective_layers();
        let mut pool = Pool::new(health, &layers, armored.then_some(equipment));
        pool.mitigated = amount - amount * rule.reduction();
        let reduced = amount * rule.reduction();

        let overflow = match rule.strategy() {
            Strategy::Standard => standard(rule, &layers, &mut pool, reduced),
            Strategy::Random => random(rule, &layers, &mut pool, reduced, rng),
            Strategy::Equal => equal(rule, &layers, &mut pool, reduced),
        };

        let mut outcome = DistributionOutcome::new(event.source.id().clone(), matched, amount);
        for part in BodyPart::ALL {
            outcome.record(part, pool.applied[part.index()]);
        }
        outcome.mitigated = pool.mitigated;
        outcome.overflow = overflow;

        tracing::trace!(
            source = %outcome.source,
            applied = outcome.total_applied(),
            mitigated = outcome.mitigated,
            overflow = outcome.overflow,
            "distributed damage"
        );
        outcome
    }
}

/// Floors to run absorption passes at, in order.
fn floors(no_kill: bool) -> &'static [f32] {
    if no_kill {
        &[NO_KILL_FLOOR, 0.0]
    } else {
        &[0.0]
    }
}

/// Cascade through the layers; with `ignore_order` the layer that can
/// take the most goes first.
fn standard(rule: &DistributionRule, layers: &[DistributionLayer], pool: &mut Pool, amount: f32) -> f32 {
    let mut order: Vec<&DistributionLayer> = layers.iter().collect();
    if rule.ignores_order() {
        // Stable sort: equal coverage keeps call order.
        order.sort_by(|a, b| pool.coverage(b).total_cmp(&pool.coverage(a)));
    }

    let mut remaining = amount;
    for &floor in floors(rule.no_kill()) {
        for layer in &order {
            remaining = pool.spread(&layer.parts, remaining, floor);
        }
    }
    remaining
}

/// Send everything to one random layer. No-kill lets the other layers
/// take the excess before the chosen one drops below the floor.
fn random<R>(
    rule: &DistributionRule,
    layers: &[DistributionLayer],
    pool: &mut Pool,
    amount: f32,
    rng: &mut R,
) -> f32
where
    R: Rng + ?Sized,
{
    if layers.is_empty() {
        return amount;
    }
    let chosen = rng.gen_range(0..layers.len());
    let target = &layers[chosen].parts;

    if !rule.no_kill() {
        return pool.spread(target, amount, 0.0);
    }

    let mut remaining = pool.spread(target, amount, NO_KILL_FLOOR);
    for (i, layer) in layers.iter().enumerate() {
        if i != chosen {
            remaining = pool.spread(&layer.parts, remaining, NO_KILL_FLOOR);
        }
    }
    pool.spread(target, remaining, 0.0)
}

/// Even split over every covered part, remainder to the first parts.
fn equal(rule: &DistributionRule, layers: &[DistributionLayer], pool: &mut Pool, amount: f32) -> f32 {
    let parts: Vec<BodyPart> = layers
        .iter()
        .flat_map(|layer| layer.parts.iter().copied())
        .collect();
    if parts.is_empty() {
        return amount;
    }

    let floor = if rule.no_kill() { NO_KILL_FLOOR } else { 0.0 };
    let mut leftover = 0.0;
    for (&part, share) in parts.iter().zip(equal_shares(amount, parts.len())) {
        let taken = share.min(pool.headroom(part, floor));
        pool.take(part, taken);
        leftover += share - taken;
    }

    let mut remaining = pool.spread(&parts, leftover, floor);
    if rule.no_kill() {
        remaining = pool.spread(&parts, remaining, 0.0);
    }
    remaining
}

/// Split `amount` into `n` shares: each gets `floor(amount / n)`, then the
/// remainder is handed out one unit at a time from the front.
///
/// A fractional tail goes to the part after the last whole unit.
pub fn equal_shares(amount: f32, n: usize) -> Vec<f32> {
    if n == 0 {
        return Vec::new();
    }
    let base = (amount / n as f32).floor();
    let mut rest = (amount - base * n as f32).max(0.0);
    (0..n)
        .map(|_| {
            let extra = rest.min(1.0);
            rest -= extra;
            base + extra
        })
        .collect()
}

/// Working state for one resolution.
struct Pool {
    health: [f32; BodyPart::COUNT],
    protection: [f32; BodyPart::COUNT],
    applied: [f32; BodyPart::COUNT],
    mitigated: f32,
}

impl Pool {
    fn new(
        health: &HealthState,
        layers: &[DistributionLayer],
        equipment: Option<&EquipmentSnapshot>,
    ) -> Self {
        let mut pool = Self {
            health: [0.0; BodyPart::COUNT],
            protection: [0.0; BodyPart::COUNT],
            applied: [0.0; BodyPart::COUNT],
            mitigated: 0.0,
        };
        for part in BodyPart::ALL {
            pool.health[part.index()] = health.current(part).max(0.0);
        }
        if let Some(equipment) = equipment {
            for layer in layers {
                for part in &layer.parts {
                    pool.protection[part.index()] = equipment.protection(layer.slot);
                }
            }
        }
        pool
    }

    /// Incoming damage `part` can still take before reaching `floor`.
    fn headroom(&self, part: BodyPart, floor: f32) -> f32 {
        let i = part.index();
        (self.health[i] - floor).max(0.0) / (1.0 - self.protection[i])
    }

    /// Damage a layer could take right now.
    fn coverage(&self, layer: &DistributionLayer) -> f32 {
        layer.parts.iter().map(|&part| self.headroom(part, 0.0)).sum()
    }

    /// Hit `part` with `incoming` damage; armor blocks its share.
    fn take(&mut self, part: BodyPart, incoming: f32) {
        let i = part.index();
        let applied = (incoming * (1.0 - self.protection[i])).min(self.health[i]);
        self.health[i] -= applied;
        self.applied[i] += applied;
        self.mitigated += incoming - applied;
    }

    /// Split `amount` evenly over the parts that still have headroom,
    /// re-splitting what saturated parts could not take. Returns the
    /// damage left over.
    fn spread(&mut self, parts: &[BodyPart], mut amount: f32, floor: f32) -> f32 {
        // Every round either absorbs everything or fills at least one part.
        for _ in 0..=parts.len() {
            if amount <= DAMAGE_EPSILON {
                break;
            }
            let open: Vec<BodyPart> = parts
                .iter()
                .copied()
                .filter(|&part| self.headroom(part, floor) > DAMAGE_EPSILON)
                .collect();
            if open.is_empty() {
                break;
            }
            let share = amount / open.len() as f32;
            for part in open {
                let taken = share.min(self.headroom(part, floor));
                self.take(part, taken);
                amount -= taken;
            }
        }
        amount.max(0.0)
    }
}
