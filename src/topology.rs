//! Body-part topology.
//!
//! The fixed vocabulary shared by every other module: damageable body
//! parts, the armor slots that cover them, and the coarser regions that
//! debuffs are attached to.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A discrete, damageable region of an entity's health model.
///
/// # Examples
///
/// ```rust
/// use firstaid_rules::{BodyPart, EquipmentSlot};
///
/// assert_eq!(BodyPart::LeftFoot.natural_slot(), EquipmentSlot::Feet);
/// assert!(BodyPart::Head.is_critical());
/// assert!(!BodyPart::LeftArm.is_critical());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BodyPart {
    Head,
    Body,
    LeftArm,
    RightArm,
    LeftLeg,
    RightLeg,
    LeftFoot,
    RightFoot,
}

impl BodyPart {
    /// Number of body parts.
    pub const COUNT: usize = 8;

    /// All body parts in canonical iteration order.
    pub const ALL: [BodyPart; BodyPart::COUNT] = [
        BodyPart::Head,
        BodyPart::Body,
        BodyPart::LeftArm,
        BodyPart::RightArm,
        BodyPart::LeftLeg,
        BodyPart::RightLeg,
        BodyPart::LeftFoot,
        BodyPart::RightFoot,
    ];

    /// Dense index of this part, matching its position in [`BodyPart::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// The armor slot that covers this part by default.
    pub fn natural_slot(self) -> EquipmentSlot {
        match self {
            BodyPart::Head => EquipmentSlot::Head,
            BodyPart::Body | BodyPart::LeftArm | BodyPart::RightArm => EquipmentSlot::Chest,
            BodyPart::LeftLeg | BodyPart::RightLeg => EquipmentSlot::Legs,
            BodyPart::LeftFoot | BodyPart::RightFoot => EquipmentSlot::Feet,
        }
    }

    /// The debuff region this part belongs to.
    pub fn debuff_slot(self) -> DebuffSlot {
        match self {
            BodyPart::Head => DebuffSlot::Head,
            BodyPart::Body => DebuffSlot::Body,
            BodyPart::LeftArm | BodyPart::RightArm => DebuffSlot::Arms,
            BodyPart::LeftLeg | BodyPart::RightLeg | BodyPart::LeftFoot | BodyPart::RightFoot => {
                DebuffSlot::LegsAndFeet
            }
        }
    }

    /// Whether losing all health in this part kills the entity.
    pub fn is_critical(self) -> bool {
        matches!(self, BodyPart::Head | BodyPart::Body)
    }
}

impl fmt::Display for BodyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BodyPart::Head => "HEAD",
            BodyPart::Body => "BODY",
            BodyPart::LeftArm => "LEFT_ARM",
            BodyPart::RightArm => "RIGHT_ARM",
            BodyPart::LeftLeg => "LEFT_LEG",
            BodyPart::RightLeg => "RIGHT_LEG",
            BodyPart::LeftFoot => "LEFT_FOOT",
            BodyPart::RightFoot => "RIGHT_FOOT",
        };
        f.write_str(name)
    }
}

/// A wearable-armor slot that can shield one or more body parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EquipmentSlot {
    Head,
    Chest,
    Legs,
    Feet,
}

impl EquipmentSlot {
    /// All equipment slots, top to bottom.
    pub const ALL: [EquipmentSlot; 4] = [
        EquipmentSlot::Head,
        EquipmentSlot::Chest,
        EquipmentSlot::Legs,
        EquipmentSlot::Feet,
    ];

    /// The parts this slot covers by default.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use firstaid_rules::{BodyPart, EquipmentSlot};
    ///
    /// assert_eq!(
    ///     EquipmentSlot::Legs.covered_parts(),
    ///     &[BodyPart::LeftLeg, BodyPart::RightLeg]
    /// );
    /// ```
    pub fn covered_parts(self) -> &'static [BodyPart] {
        match self {
            EquipmentSlot::Head => &[BodyPart::Head],
            EquipmentSlot::Chest => &[BodyPart::Body, BodyPart::LeftArm, BodyPart::RightArm],
            EquipmentSlot::Legs => &[BodyPart::LeftLeg, BodyPart::RightLeg],
            EquipmentSlot::Feet => &[BodyPart::LeftFoot, BodyPart::RightFoot],
        }
    }
}

impl fmt::Display for EquipmentSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EquipmentSlot::Head => "HEAD",
            EquipmentSlot::Chest => "CHEST",
            EquipmentSlot::Legs => "LEGS",
            EquipmentSlot::Feet => "FEET",
        };
        f.write_str(name)
    }
}

/// The body region a debuff rule is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DebuffSlot {
    Head,
    Body,
    Arms,
    LegsAndFeet,
}

impl DebuffSlot {
    pub const ALL: [DebuffSlot; 4] = [
        DebuffSlot::Head,
        DebuffSlot::Body,
        DebuffSlot::Arms,
        DebuffSlot::LegsAndFeet,
    ];

    /// The parts whose state feeds debuffs in this region.
    pub fn parts(self) -> &'static [BodyPart] {
        match self {
            DebuffSlot::Head => &[BodyPart::Head],
            DebuffSlot::Body => &[BodyPart::Body],
            DebuffSlot::Arms => &[BodyPart::LeftArm, BodyPart::RightArm],
            DebuffSlot::LegsAndFeet => &[
                BodyPart::LeftLeg,
                BodyPart::RightLeg,
                BodyPart::LeftFoot,
                BodyPart::RightFoot,
            ],
        }
    }
}

impl fmt::Display for DebuffSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DebuffSlot::Head => "HEAD",
            DebuffSlot::Body => "BODY",
            DebuffSlot::Arms => "ARMS",
            DebuffSlot::LegsAndFeet => "LEGS_AND_FEET",
        };
        f.write_str(name)
    }
}
