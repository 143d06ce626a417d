//! # firstaid-rules - Registration-Time Damage and Debuff Rules
//!
//! A rules engine for a partitioned health model. Damage is not taken by
//! "the player" as a whole but by individual body parts, and status
//! effects follow from how hurt each region is.
//!
//! - **Distribution rules** decide which parts absorb damage from a given
//!   source, layer by layer according to armor-slot coverage.
//! - **Debuff rules** map the damage a region just took, or the health it
//!   has left, onto a tier of a status effect.
//!
//! ## Lifecycle
//!
//! ```text
//! [RegistryBuilder] --register_*--> [RegistryBuilder] --finalize--> [Registry]
//!                                                                       |
//!                               DistributionResolver / DebuffEvaluator -+
//! ```
//!
//! 1. **Register** rules once at startup. Invalid rule wiring (two rules
//!    claiming one damage source) is an error; invalid debuff ladders from
//!    configuration are dropped and recorded as diagnostics.
//! 2. **Finalize** the builder into an immutable [`Registry`].
//! 3. **Resolve** damage events and **evaluate** debuffs against it, from
//!    any number of threads.
//!
//! ## Example
//!
//! ```rust
//! use firstaid_rules::*;
//! use rand::SeedableRng;
//! use rand::rngs::StdRng;
//!
//! let config = FirstAidConfig::default();
//! let mut builder = RegistryBuilder::new();
//! register_defaults(&config, &mut builder).unwrap();
//! let registry = builder.finalize();
//!
//! let mut health = HealthState::with_max(|part| config.max_health.for_part(part));
//! let mut tracker = DebuffTracker::new();
//!
//! // A fall hits the feet first, then the legs.
//! let outcome = DistributionResolver::new(&registry).resolve(
//!     &DamageEvent::new(DamageSource::new("fall"), 10.0),
//!     &health,
//!     &EquipmentSnapshot::unarmored(),
//!     &mut StdRng::seed_from_u64(0),
//! );
//! assert_eq!(outcome.damage_to(BodyPart::LeftFoot), 4.0);
//! assert_eq!(outcome.damage_to(BodyPart::LeftLeg), 1.0);
//!
//! health.apply(&outcome);
//! let changes = DebuffEvaluator::new(&registry).constant_health(&health, &mut tracker);
//! assert_eq!(changes[0].effect.as_str(), "slowness");
//! assert_eq!(changes[0].current, Some(2));
//! ```
//!
//! ## Modules
//!
//! - [`topology`] - Body parts, armor slots and debuff regions
//! - [`ids`] - Identifier types
//! - [`source`] - Damage sources and rule matchers
//! - [`health`] - Per-entity health and equipment snapshots
//! - [`distribution`] - Distribution rules and their builder
//! - [`resolver`] - Runtime damage distribution
//! - [`outcome`] - Distribution results
//! - [`debuff`] - Debuff rules and their builder
//! - [`evaluator`] - Runtime debuff evaluation
//! - [`registry`] - Rule registry
//! - [`config`] - Configuration read by the stock rules
//! - [`defaults`] - The stock rule set
//! - [`error`] - Error types

pub mod config;
pub mod debuff;
pub mod defaults;
pub mod distribution;
pub mod error;
pub mod evaluator;
pub mod health;
pub mod ids;
pub mod outcome;
pub mod registry;
pub mod resolver;
pub mod source;
pub mod topology;

// Re-export main types for convenience
pub use config::{ConfigFlag, ConstantCondition, FirstAidConfig, OnHitCondition};
pub use debuff::{Bound, DebuffBuilder, DebuffKind, DebuffRule, EnableCondition};
pub use defaults::register_defaults;
pub use distribution::{DistributionBuilder, DistributionLayer, DistributionRule, Strategy};
pub use error::{ConfigError, RegistryError};
pub use evaluator::{DebuffEvaluator, DebuffTracker, DebuffTransition};
pub use health::{EquipmentSnapshot, HealthState, PartHealth};
pub use ids::{DamageSourceId, EffectId, SoundId};
pub use outcome::DistributionOutcome;
pub use registry::{DebuffRuleId, DistributionRuleId, Registry, RegistryBuilder, RuleMatch};
pub use resolver::{DamageEvent, DistributionResolver};
pub use source::{DamageSource, SourceMatcher};
pub use topology::{BodyPart, DebuffSlot, EquipmentSlot};
