//! The stock rule set.
//!
//! [`register_defaults`] wires up the distribution rules for the built-in
//! damage sources and loads the debuff ladders from configuration.

use crate::config::{ConstantCondition, FirstAidConfig, OnHitCondition};
use crate::debuff::{DebuffBuilder, DebuffKind};
use crate::distribution::DistributionBuilder;
use crate::error::{ConfigError, RegistryError};
use crate::ids::{EffectId, SoundId};
use crate::registry::{DebuffRuleId, RegistryBuilder};
use crate::source::{vanilla, DamageSource};
use crate::topology::{BodyPart, DebuffSlot, EquipmentSlot};

/// Sound played when blindness kicks in.
pub const HEARTBEAT: &str = "heartbeat";

/// Damage scale applied to explosions.
pub const EXPLOSION_REDUCTION: f32 = 0.8;

/// Register the stock distribution and debuff rules.
///
/// Distribution conflicts are returned as errors and should abort
/// startup. Broken debuff ladders are dropped and recorded in the
/// builder's configuration errors instead.
///
/// # Examples
///
/// ```rust
/// use firstaid_rules::*;
///
/// let mut builder = RegistryBuilder::new();
/// register_defaults(&FirstAidConfig::default(), &mut builder).unwrap();
/// let registry = builder.finalize();
///
/// assert!(registry.config_errors().is_empty());
/// assert_eq!(registry.debuff_count(), 6);
/// ```
pub fn register_defaults(
    config: &FirstAidConfig,
    registry: &mut RegistryBuilder,
) -> Result<(), RegistryError> {
    tracing::debug!(hard_mode = config.hard_mode, "registering default registry values");

    DistributionBuilder::standard()
        .add_distribution_layer(EquipmentSlot::Feet, &[BodyPart::LeftFoot, BodyPart::RightFoot])
        .add_distribution_layer(EquipmentSlot::Legs, &[BodyPart::LeftLeg, BodyPart::RightLeg])
        .register_static(registry, [vanilla::FALL, vanilla::HOT_FLOOR])?;

    DistributionBuilder::standard()
        .add_distribution_layer(EquipmentSlot::Head, &[BodyPart::Head])
        .register_static(registry, [vanilla::ANVIL])?;

    DistributionBuilder::standard()
        .add_distribution_layer(EquipmentSlot::Head, &[BodyPart::Head])
        .add_distribution_layer(EquipmentSlot::Chest, &[BodyPart::LeftArm, BodyPart::RightArm])
        .ignore_order()
        .register_static(registry, [vanilla::LIGHTNING_BOLT])?;

    DistributionBuilder::random().register_static(registry, [vanilla::MAGIC])?;

    if config.hard_mode {
        DistributionBuilder::standard()
            .add_distribution_layer(EquipmentSlot::Chest, &[BodyPart::Body])
            .register_static(registry, [vanilla::STARVE])?;

        DistributionBuilder::standard()
            .add_distribution_layer(EquipmentSlot::Chest, &[BodyPart::Body])
            .add_distribution_layer(EquipmentSlot::Head, &[BodyPart::Head])
            .ignore_order()
            .register_static(registry, [vanilla::DROWN])?;
    } else {
        DistributionBuilder::random()
            .try_no_kill()
            .register_static(registry, [vanilla::STARVE, vanilla::DROWN])?;
    }

    DistributionBuilder::random()
        .try_no_kill()
        .register_static(registry, [vanilla::IN_WALL, vanilla::CRAMMING])?;

    DistributionBuilder::equal()
        .reduction_multiplier(EXPLOSION_REDUCTION)
        .register_dynamic(registry, DamageSource::is_explosion)?;

    load_on_hit(
        registry,
        "blindness",
        Some(|| SoundId::new(HEARTBEAT)),
        &config.head.blindness,
        DebuffSlot::Head,
    );
    load_on_hit(registry, "nausea", NO_SOUND, &config.head.nausea, DebuffSlot::Head);
    load_on_hit(registry, "nausea", NO_SOUND, &config.body.nausea, DebuffSlot::Body);
    load_constant(registry, "weakness", &config.body.weakness, DebuffSlot::Body);
    load_constant(
        registry,
        "mining_fatigue",
        &config.arms.mining_fatigue,
        DebuffSlot::Arms,
    );
    load_constant(
        registry,
        "slowness",
        &config.legs_and_feet.slowness,
        DebuffSlot::LegsAndFeet,
    );

    Ok(())
}

const NO_SOUND: Option<fn() -> SoundId> = None;

/// Check paired threshold/magnitude arrays and zip them into bounds.
fn paired_bounds(
    kind: DebuffKind,
    thresholds: &[f32],
    magnitudes: &[i32],
) -> Result<Vec<(f32, i32)>, ConfigError> {
    if thresholds.len() != magnitudes.len() {
        return Err(ConfigError::LengthMismatch {
            thresholds: thresholds.len(),
            magnitudes: magnitudes.len(),
        });
    }
    crate::debuff::validate_thresholds(kind, thresholds)?;
    Ok(thresholds.iter().copied().zip(magnitudes.iter().copied()).collect())
}

/// Register an on-hit debuff from its configured ladder.
///
/// The rule is dropped, and the reason recorded, if the arrays differ in
/// length, are empty, or `damage_taken` is not strictly descending.
pub fn load_on_hit<F>(
    registry: &mut RegistryBuilder,
    effect: &str,
    sound: Option<F>,
    condition: &OnHitCondition,
    slot: DebuffSlot,
) -> Option<DebuffRuleId>
where
    F: Fn() -> SoundId + Send + Sync + 'static,
{
    let bounds = match paired_bounds(
        DebuffKind::OnHit,
        &condition.damage_taken,
        &condition.debuff_length,
    ) {
        Ok(bounds) => bounds,
        Err(err) => {
            registry.report_config_error(&EffectId::new(effect), slot, &err);
            return None;
        }
    };

    let flag = condition.enabled.clone();
    let mut builder = DebuffBuilder::on_hit(effect).add_enable_condition(move || flag.get());
    for (threshold, magnitude) in bounds {
        builder = builder.add_bound(threshold, magnitude);
    }
    if let Some(sound) = sound {
        builder = builder.add_sound_effect(sound);
    }
    builder.register(registry, slot)
}

/// Register a constant debuff from its configured ladder.
///
/// The rule is dropped, and the reason recorded, if the arrays differ in
/// length, are empty, or `health_percentage_left` is not sorted ascending.
pub fn load_constant(
    registry: &mut RegistryBuilder,
    effect: &str,
    condition: &ConstantCondition,
    slot: DebuffSlot,
) -> Option<DebuffRuleId> {
    let bounds = match paired_bounds(
        DebuffKind::Constant,
        &condition.health_percentage_left,
        &condition.debuff_strength,
    ) {
        Ok(bounds) => bounds,
        Err(err) => {
            registry.report_config_error(&EffectId::new(effect), slot, &err);
            return None;
        }
    };

    let flag = condition.enabled.clone();
    let mut builder = DebuffBuilder::constant(effect).add_enable_condition(move || flag.get());
    for (threshold, magnitude) in bounds {
        builder = builder.add_bound(threshold, magnitude);
    }
    builder.register(registry, slot)
}
