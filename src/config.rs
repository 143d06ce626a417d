//! Configuration consumed by the stock rules.
//!
//! Loading and persisting configuration belongs to the host. This module
//! only defines the shape (deserializable with serde, every field
//! defaulted) and the values the stock rules fall back to.

use crate::topology::BodyPart;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A boolean setting that stays live after registration.
///
/// Clones share the same value, so an enable condition built from a flag
/// sees later changes made through any clone.
///
/// # Examples
///
/// ```rust
/// use firstaid_rules::ConfigFlag;
///
/// let flag = ConfigFlag::new(true);
/// let seen_by_rule = flag.clone();
///
/// flag.set(false);
/// assert!(!seen_by_rule.get());
/// ```
#[derive(Debug, Clone)]
pub struct ConfigFlag(Arc<AtomicBool>);

impl ConfigFlag {
    pub fn new(value: bool) -> Self {
        Self(Arc::new(AtomicBool::new(value)))
    }

    /// Current value.
    pub fn get(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Change the value for every clone.
    pub fn set(&self, value: bool) {
        self.0.store(value, Ordering::Relaxed);
    }
}

impl Default for ConfigFlag {
    fn default() -> Self {
        Self::new(true)
    }
}

impl PartialEq for ConfigFlag {
    fn eq(&self, other: &Self) -> bool {
        self.get() == other.get()
    }
}

impl Serialize for ConfigFlag {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.get().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ConfigFlag {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        bool::deserialize(deserializer).map(ConfigFlag::new)
    }
}

/// Ladder for a debuff triggered by damage taken in one hit.
///
/// `damage_taken` must be strictly descending; `debuff_length[i]` is the
/// effect duration in ticks for `damage_taken[i]`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OnHitCondition {
    pub enabled: ConfigFlag,
    pub damage_taken: Vec<f32>,
    pub debuff_length: Vec<i32>,
}

impl OnHitCondition {
    /// An enabled ladder from paired arrays.
    pub fn new(damage_taken: &[f32], debuff_length: &[i32]) -> Self {
        Self {
            enabled: ConfigFlag::default(),
            damage_taken: damage_taken.to_vec(),
            debuff_length: debuff_length.to_vec(),
        }
    }
}

/// Ladder for a debuff driven by the health a region has left.
///
/// `health_percentage_left` must be non-decreasing; `debuff_strength[i]`
/// applies while health is at or under `health_percentage_left[i]`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConstantCondition {
    pub enabled: ConfigFlag,
    pub health_percentage_left: Vec<f32>,
    pub debuff_strength: Vec<i32>,
}

impl ConstantCondition {
    /// An enabled ladder from paired arrays.
    pub fn new(health_percentage_left: &[f32], debuff_strength: &[i32]) -> Self {
        Self {
            enabled: ConfigFlag::default(),
            health_percentage_left: health_percentage_left.to_vec(),
            debuff_strength: debuff_strength.to_vec(),
        }
    }
}

/// Maximum health per group of parts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaxHealthConfig {
    pub head: f32,
    pub body: f32,
    pub arms: f32,
    pub legs: f32,
    pub feet: f32,
}

impl MaxHealthConfig {
    /// Maximum health of one part.
    pub fn for_part(&self, part: BodyPart) -> f32 {
        match part {
            BodyPart::Head => self.head,
            BodyPart::Body => self.body,
            BodyPart::LeftArm | BodyPart::RightArm => self.arms,
            BodyPart::LeftLeg | BodyPart::RightLeg => self.legs,
            BodyPart::LeftFoot | BodyPart::RightFoot => self.feet,
        }
    }
}

impl Default for MaxHealthConfig {
    fn default() -> Self {
        Self {
            head: 4.0,
            body: 6.0,
            arms: 4.0,
            legs: 4.0,
            feet: 4.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadConfig {
    pub blindness: OnHitCondition,
    pub nausea: OnHitCondition,
}

impl Default for HeadConfig {
    fn default() -> Self {
        Self {
            blindness: OnHitCondition::new(&[2.0, 1.0], &[8 * 20, 4 * 20]),
            nausea: OnHitCondition::new(&[3.0, 2.0], &[16 * 20, 12 * 20]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BodyConfig {
    pub nausea: OnHitCondition,
    pub weakness: ConstantCondition,
}

impl Default for BodyConfig {
    fn default() -> Self {
        Self {
            nausea: OnHitCondition::new(&[4.0, 2.0], &[16 * 20, 8 * 20]),
            weakness: ConstantCondition::new(&[0.25, 0.5], &[2, 1]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ArmsConfig {
    pub mining_fatigue: ConstantCondition,
}

impl Default for ArmsConfig {
    fn default() -> Self {
        Self {
            mining_fatigue: ConstantCondition::new(&[0.25, 0.5, 0.75], &[3, 2, 1]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LegsAndFeetConfig {
    pub slowness: ConstantCondition,
}

impl Default for LegsAndFeetConfig {
    fn default() -> Self {
        Self {
            slowness: ConstantCondition::new(&[0.35, 0.6, 0.8], &[3, 2, 1]),
        }
    }
}

/// Settings read by [`register_defaults`](crate::defaults::register_defaults).
///
/// # Examples
///
/// ```rust
/// use firstaid_rules::FirstAidConfig;
///
/// let config = FirstAidConfig::from_json_str(r#"{
///     "hardMode": true,
///     "head": { "blindness": { "enabled": false, "damageTaken": [3.0], "debuffLength": [60] } }
/// }"#).unwrap();
///
/// assert!(config.hard_mode);
/// assert!(!config.head.blindness.enabled.get());
/// // Everything not mentioned keeps its default.
/// assert_eq!(config.max_health.body, 6.0);
/// assert_eq!(config.head.nausea.damage_taken, vec![3.0, 2.0]);
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FirstAidConfig {
    /// Starving and drowning target specific parts instead of random ones.
    pub hard_mode: bool,
    pub max_health: MaxHealthConfig,
    pub head: HeadConfig,
    pub body: BodyConfig,
    pub arms: ArmsConfig,
    pub legs_and_feet: LegsAndFeetConfig,
}

impl FirstAidConfig {
    /// Parse a JSON document laid over the stock defaults.
    ///
    /// Objects are merged key by key at every depth, so an override may
    /// name a single field of a single ladder. Arrays and scalars replace
    /// the default outright.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use firstaid_rules::FirstAidConfig;
    ///
    /// let config = FirstAidConfig::from_json_str(
    ///     r#"{ "head": { "blindness": { "enabled": false } } }"#,
    /// ).unwrap();
    ///
    /// assert!(!config.head.blindness.enabled.get());
    /// assert_eq!(config.head.blindness.damage_taken, vec![2.0, 1.0]);
    /// ```
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        let mut merged = serde_json::to_value(Self::default())?;
        merge_json(&mut merged, serde_json::from_str(json)?);
        serde_json::from_value(merged)
    }
}

fn merge_json(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                merge_json(base.entry(key).or_insert(Value::Null), value);
            }
        }
        (base, overlay) => *base = overlay,
    }
}
