//! Fall damage example: stock rules end to end
//!
//! This example demonstrates:
//! - Registering the stock rules from a JSON config
//! - Distributing a fall over feet and legs, with boots on
//! - Deriving on-hit and constant debuffs from the result

use firstaid_rules::source::vanilla;
use firstaid_rules::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = FirstAidConfig::from_json_str(r#"{ "hardMode": false }"#)?;

    let mut builder = RegistryBuilder::new();
    register_defaults(&config, &mut builder)?;
    let registry = builder.finalize();

    println!(
        "Registered {} distribution rules and {} debuff rules",
        registry.distribution_count(),
        registry.debuff_count()
    );
    for error in registry.config_errors() {
        println!("  config error: {}", error);
    }

    let mut health = HealthState::with_max(|part| config.max_health.for_part(part));
    let equipment = EquipmentSnapshot::unarmored().with(EquipmentSlot::Feet, 0.25);
    let mut tracker = DebuffTracker::new();
    let mut rng = StdRng::seed_from_u64(7);

    let resolver = DistributionResolver::new(&registry);
    let evaluator = DebuffEvaluator::new(&registry);

    for amount in [3.0, 6.0, 9.0] {
        println!("\n=== Fall for {:.1} ===", amount);
        let outcome = resolver.resolve(
            &DamageEvent::new(DamageSource::new(vanilla::FALL), amount),
            &health,
            &equipment,
            &mut rng,
        );

        for (part, damage) in outcome.per_part() {
            println!("  {}: -{:.2}", part, damage);
        }
        println!("  mitigated: {:.2}", outcome.mitigated);
        if outcome.is_overflowing() {
            println!("  overflow: {:.2}", outcome.overflow);
        }

        health.apply(&outcome);

        let mut changes = evaluator.on_hit_outcome(&outcome, &mut tracker);
        changes.extend(evaluator.constant_health(&health, &mut tracker));
        for change in changes {
            print!(
                "  {} ({}): {:?} -> {:?}",
                change.effect, change.slot, change.previous, change.current
            );
            if let Some(sound) = change.sound {
                print!(" [play {}]", sound);
            }
            println!();
        }

        if health.is_dead() {
            println!("  dead");
            break;
        }

        // A second passes before the next fall.
        for rule in tracker.tick(20) {
            println!("  {} wore off", registry.debuff(rule).effect());
        }
    }

    println!("\nRemaining health:");
    for part in BodyPart::ALL {
        let state = health.part(part);
        println!("  {}: {:.2}/{:.2}", part, state.current, state.max);
    }

    Ok(())
}
