use firstaid_rules::source::vanilla;
use firstaid_rules::*;
use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn default_registry(hard_mode: bool) -> Registry {
    let config = FirstAidConfig {
        hard_mode,
        ..FirstAidConfig::default()
    };
    let mut builder = RegistryBuilder::new();
    register_defaults(&config, &mut builder).unwrap();
    builder.finalize()
}

fn resolve(registry: &Registry, source: DamageSource, amount: f32, health: &HealthState) -> DistributionOutcome {
    DistributionResolver::new(registry).resolve(
        &DamageEvent::new(source, amount),
        health,
        &EquipmentSnapshot::unarmored(),
        &mut ChaCha8Rng::seed_from_u64(0xF1A5),
    )
}

fn assert_conserved(outcome: &DistributionOutcome) {
    let accounted = outcome.total_applied() + outcome.mitigated + outcome.overflow;
    assert!(
        (accounted - outcome.incoming).abs() < 1e-3,
        "incoming {} but accounted {} ({:?})",
        outcome.incoming,
        accounted,
        outcome
    );
}

/// Fall damage lands on the feet, then cascades to the legs.
#[test]
fn test_fall_damage_cascades_feet_then_legs() {
    let registry = default_registry(false);
    let outcome = resolve(
        &registry,
        DamageSource::new(vanilla::FALL),
        12.0,
        &HealthState::uniform(4.0),
    );

    assert!(matches!(outcome.matched, RuleMatch::Static(_)));
    assert_eq!(outcome.damage_to(BodyPart::LeftFoot) + outcome.damage_to(BodyPart::RightFoot), 8.0);
    assert_eq!(outcome.damage_to(BodyPart::LeftLeg) + outcome.damage_to(BodyPart::RightLeg), 4.0);
    assert_eq!(outcome.damage_to(BodyPart::Head), 0.0);
    assert_conserved(&outcome);
}

/// Hot floors share the fall rule.
#[test]
fn test_hot_floor_shares_fall_rule() {
    let registry = default_registry(false);
    let fall = registry.lookup(&DamageSource::new(vanilla::FALL)).0;
    let floor = registry.lookup(&DamageSource::new(vanilla::HOT_FLOOR)).0;
    assert_eq!(fall, floor);
}

/// Lightning goes to whichever of head or arms can take more.
#[test]
fn test_lightning_prefers_larger_coverage() {
    let registry = default_registry(false);
    let mut health = HealthState::uniform(4.0);
    health.set_current(BodyPart::Head, 1.0);

    let outcome = resolve(&registry, DamageSource::new(vanilla::LIGHTNING_BOLT), 3.0, &health);
    assert_eq!(outcome.damage_to(BodyPart::LeftArm), 1.5);
    assert_eq!(outcome.damage_to(BodyPart::RightArm), 1.5);
    assert_eq!(outcome.damage_to(BodyPart::Head), 0.0);
}

/// With coverage tied, lightning keeps call order and hits the head first.
#[test]
fn test_lightning_tie_keeps_call_order() {
    let registry = default_registry(false);
    let mut health = HealthState::uniform(4.0);
    health.set_current(BodyPart::LeftArm, 2.0);
    health.set_current(BodyPart::RightArm, 2.0);

    let outcome = resolve(&registry, DamageSource::new(vanilla::LIGHTNING_BOLT), 3.0, &health);
    assert_eq!(outcome.damage_to(BodyPart::Head), 3.0);
    assert_eq!(outcome.damage_to(BodyPart::LeftArm), 0.0);
    assert_eq!(outcome.damage_to(BodyPart::RightArm), 0.0);
}

/// An anvil only ever hurts the head; the rest is overflow.
#[test]
fn test_anvil_hits_head_only() {
    let registry = default_registry(false);
    let outcome = resolve(
        &registry,
        DamageSource::new(vanilla::ANVIL),
        6.0,
        &HealthState::uniform(4.0),
    );

    assert_eq!(outcome.damage_to(BodyPart::Head), 4.0);
    assert_eq!(outcome.overflow, 2.0);
    assert!(outcome.is_overflowing());
    assert_conserved(&outcome);
}

/// Explosions are reduced to 80% and split over every part.
#[test]
fn test_explosion_is_reduced_and_split() {
    let registry = default_registry(false);
    let outcome = resolve(
        &registry,
        DamageSource::new("explosion.player").explosion(),
        10.0,
        &HealthState::uniform(4.0),
    );

    assert!(matches!(outcome.matched, RuleMatch::Dynamic(_)));
    assert!((outcome.total_applied() - 8.0).abs() < 1e-4);
    for part in BodyPart::ALL {
        assert_eq!(outcome.damage_to(part), 1.0);
    }
    assert_conserved(&outcome);
}

/// Suffocation in normal mode never kills while any part has room.
#[test]
fn test_in_wall_avoids_lethal_damage() {
    let registry = default_registry(false);
    let health = HealthState::uniform(4.0);

    for seed in 0..32 {
        let outcome = DistributionResolver::new(&registry).resolve(
            &DamageEvent::new(DamageSource::new(vanilla::IN_WALL), 10.0),
            &health,
            &EquipmentSnapshot::unarmored(),
            &mut ChaCha8Rng::seed_from_u64(seed),
        );
        let mut after = health.clone();
        after.apply(&outcome);

        assert!(!after.is_dead(), "seed {} killed: {:?}", seed, outcome);
        assert_eq!(outcome.total_applied(), 10.0);
    }
}

/// Hard mode sends starvation to the body instead of a random part.
#[test]
fn test_hard_mode_starvation_targets_body() {
    let registry = default_registry(true);
    let outcome = resolve(
        &registry,
        DamageSource::new(vanilla::STARVE),
        2.0,
        &HealthState::uniform(6.0),
    );
    assert_eq!(outcome.damage_to(BodyPart::Body), 2.0);
    assert_eq!(outcome.per_part().len(), 1);
}

/// Hard mode drowning fills whichever of body or head has more room first.
#[test]
fn test_hard_mode_drowning_ignores_order() {
    let registry = default_registry(true);
    let mut health = HealthState::uniform(6.0);
    health.set_current(BodyPart::Body, 1.0);

    let outcome = resolve(&registry, DamageSource::new(vanilla::DROWN), 3.0, &health);
    assert_eq!(outcome.damage_to(BodyPart::Head), 3.0);
    assert_eq!(outcome.damage_to(BodyPart::Body), 0.0);
}

/// Unknown sources fall back to an even, unarmored split.
#[test]
fn test_unknown_source_uses_fallback() {
    let registry = default_registry(false);
    let outcome = DistributionResolver::new(&registry).resolve(
        &DamageEvent::new(DamageSource::new("cactus"), 16.0),
        &HealthState::uniform(4.0),
        &EquipmentSnapshot::unarmored().with(EquipmentSlot::Chest, 0.8),
        &mut ChaCha8Rng::seed_from_u64(3),
    );

    assert_eq!(outcome.matched, RuleMatch::Fallback);
    for part in BodyPart::ALL {
        assert_eq!(outcome.damage_to(part), 2.0);
    }
    assert_eq!(outcome.mitigated, 0.0);
}

/// Claiming a stock damage source a second time fails loudly.
#[test]
fn test_duplicate_registration_is_an_error() {
    let mut builder = RegistryBuilder::new();
    register_defaults(&FirstAidConfig::default(), &mut builder).unwrap();

    let result = DistributionBuilder::equal().register_static(&mut builder, [vanilla::FALL]);
    assert_eq!(
        result,
        Err(RegistryError::DuplicateSource(DamageSourceId::new(vanilla::FALL)))
    );
}

/// Registering the defaults twice is caught on the first conflicting rule.
#[test]
fn test_register_defaults_twice_fails() {
    let mut builder = RegistryBuilder::new();
    register_defaults(&FirstAidConfig::default(), &mut builder).unwrap();
    assert!(register_defaults(&FirstAidConfig::default(), &mut builder).is_err());
}

/// Host rules registered after the defaults still resolve.
#[test]
fn test_host_rules_extend_defaults() {
    let mut builder = RegistryBuilder::new();
    register_defaults(&FirstAidConfig::default(), &mut builder).unwrap();
    DistributionBuilder::standard()
        .add_distribution_layer(EquipmentSlot::Chest, &[BodyPart::Body])
        .add_distribution_layer(EquipmentSlot::Head, &[BodyPart::Head])
        .register_static(&mut builder, ["arrow"])
        .unwrap();
    let registry = builder.finalize();

    let outcome = resolve(&registry, DamageSource::new("arrow"), 5.0, &HealthState::uniform(4.0));
    assert_eq!(outcome.damage_to(BodyPart::Body), 4.0);
    assert_eq!(outcome.damage_to(BodyPart::Head), 1.0);
}

/// The frozen registry can be read from several threads at once.
#[test]
fn test_registry_shared_across_threads() {
    let registry = std::sync::Arc::new(default_registry(false));

    let handles: Vec<_> = (0..4)
        .map(|seed| {
            let registry = std::sync::Arc::clone(&registry);
            std::thread::spawn(move || {
                let outcome = DistributionResolver::new(&registry).resolve(
                    &DamageEvent::new(DamageSource::new(vanilla::MAGIC), 2.0),
                    &HealthState::uniform(4.0),
                    &EquipmentSnapshot::unarmored(),
                    &mut ChaCha8Rng::seed_from_u64(seed),
                );
                outcome.total_applied()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), 2.0);
    }
}

/// Random rules pick each layer about equally often.
#[test]
fn test_random_selection_is_uniform() {
    let registry = default_registry(false);
    let resolver = DistributionResolver::new(&registry);
    let health = HealthState::uniform(4.0);
    let mut rng = ChaCha8Rng::seed_from_u64(2024);
    let mut hits = [0usize; BodyPart::COUNT];

    let trials = 8000;
    for _ in 0..trials {
        let outcome = resolver.resolve(
            &DamageEvent::new(DamageSource::new(vanilla::MAGIC), 1.0),
            &health,
            &EquipmentSnapshot::unarmored(),
            &mut rng,
        );
        assert_eq!(outcome.per_part().len(), 1);
        for part in outcome.per_part().keys() {
            hits[part.index()] += 1;
        }
    }

    let expected = trials as f64 / BodyPart::COUNT as f64;
    for (i, &count) in hits.iter().enumerate() {
        let deviation = (count as f64 - expected).abs() / expected;
        assert!(
            deviation < 0.15,
            "{} hit {} times, expected about {}",
            BodyPart::ALL[i],
            count,
            expected
        );
    }
}

fn strategy_builder(kind: u8, no_kill: bool) -> DistributionBuilder {
    let builder = match kind % 3 {
        0 => DistributionBuilder::standard(),
        1 => DistributionBuilder::random(),
        _ => DistributionBuilder::equal(),
    };
    let builder = builder
        .add_distribution_layer(EquipmentSlot::Feet, &[BodyPart::LeftFoot, BodyPart::RightFoot])
        .add_distribution_layer(EquipmentSlot::Legs, &[BodyPart::LeftLeg, BodyPart::RightLeg])
        .add_distribution_layer(EquipmentSlot::Chest, &[BodyPart::Body]);
    if no_kill {
        builder.try_no_kill()
    } else {
        builder
    }
}

proptest! {
    /// Every point of incoming damage is applied, mitigated or overflowing.
    #[test]
    fn prop_damage_is_conserved(
        kind in 0u8..3,
        no_kill in any::<bool>(),
        reduction in 0.1f32..=1.0,
        amount in 0.0f32..100.0,
        protection in 0.0f32..0.8,
        healths in proptest::collection::vec(0.0f32..10.0, BodyPart::COUNT),
        seed in any::<u64>(),
    ) {
        let mut builder = RegistryBuilder::new();
        strategy_builder(kind, no_kill)
            .reduction_multiplier(reduction)
            .register_static(&mut builder, ["prop"])
            .unwrap();
        let registry = builder.finalize();

        let mut health = HealthState::uniform(10.0);
        for (part, value) in BodyPart::ALL.iter().zip(&healths) {
            health.set_current(*part, *value);
        }

        let outcome = DistributionResolver::new(&registry).resolve(
            &DamageEvent::new(DamageSource::new("prop"), amount),
            &health,
            &EquipmentSnapshot::unarmored().with(EquipmentSlot::Legs, protection),
            &mut ChaCha8Rng::seed_from_u64(seed),
        );

        let accounted = outcome.total_applied() + outcome.mitigated + outcome.overflow;
        prop_assert!((accounted - amount).abs() < 1e-2, "{} vs {}", accounted, amount);
        for part in BodyPart::ALL {
            prop_assert!(outcome.damage_to(part) <= health.current(part) + 1e-4);
        }
    }

    /// Equal rules give floor(A/N) to every part and one extra unit to the
    /// first A mod N parts.
    #[test]
    fn prop_equal_split_by_iteration_order(amount in 0u32..40) {
        let mut builder = RegistryBuilder::new();
        DistributionBuilder::equal()
            .register_static(&mut builder, ["prop"])
            .unwrap();
        let registry = builder.finalize();

        let outcome = resolve(&registry, DamageSource::new("prop"), amount as f32, &HealthState::uniform(100.0));

        let n = BodyPart::COUNT as u32;
        for (i, part) in BodyPart::ALL.iter().enumerate() {
            let expected = amount / n + u32::from((i as u32) < amount % n);
            prop_assert_eq!(outcome.damage_to(*part), expected as f32);
        }
    }
}
