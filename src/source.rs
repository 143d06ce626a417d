//! Damage sources and rule matchers.
//!
//! A [`DamageSource`] describes where incoming damage came from. Rules
//! select the sources they handle through a [`SourceMatcher`]: either an
//! exact set of identifiers, or a predicate evaluated per event.

use crate::ids::DamageSourceId;
use std::fmt;
use std::sync::Arc;

/// Identifiers of the damage sources the stock rules know about.
pub mod vanilla {
    pub const FALL: &str = "fall";
    pub const HOT_FLOOR: &str = "hot_floor";
    pub const ANVIL: &str = "anvil";
    pub const LIGHTNING_BOLT: &str = "lightning_bolt";
    pub const MAGIC: &str = "magic";
    pub const STARVE: &str = "starve";
    pub const DROWN: &str = "drown";
    pub const IN_WALL: &str = "in_wall";
    pub const CRAMMING: &str = "cramming";
    pub const EXPLOSION: &str = "explosion";
}

/// The origin of an incoming damage event.
///
/// # Examples
///
/// ```rust
/// use firstaid_rules::DamageSource;
///
/// let creeper = DamageSource::new("explosion.player").explosion();
/// assert!(creeper.is_explosion());
/// assert!(!creeper.bypasses_armor());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DamageSource {
    id: DamageSourceId,
    explosion: bool,
    bypasses_armor: bool,
}

impl DamageSource {
    /// A plain source: not an explosion, stopped by armor.
    pub fn new(id: impl Into<DamageSourceId>) -> Self {
        Self {
            id: id.into(),
            explosion: false,
            bypasses_armor: false,
        }
    }

    /// Mark this source as an explosion.
    pub fn explosion(mut self) -> Self {
        self.explosion = true;
        self
    }

    /// Mark this source as ignoring worn armor.
    pub fn bypassing_armor(mut self) -> Self {
        self.bypasses_armor = true;
        self
    }

    pub fn id(&self) -> &DamageSourceId {
        &self.id
    }

    pub fn is_explosion(&self) -> bool {
        self.explosion
    }

    pub fn bypasses_armor(&self) -> bool {
        self.bypasses_armor
    }
}

/// Predicate used by dynamically registered rules.
pub type SourcePredicate = Arc<dyn Fn(&DamageSource) -> bool + Send + Sync>;

/// How a distribution rule selects the damage sources it handles.
#[derive(Clone)]
pub enum SourceMatcher {
    /// Exact identity match against a fixed set of sources.
    Static(Vec<DamageSourceId>),
    /// Predicate evaluated against each incoming source.
    Dynamic(SourcePredicate),
}

impl SourceMatcher {
    /// Check whether this matcher accepts a damage source.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use firstaid_rules::{DamageSource, SourceMatcher};
    /// use std::sync::Arc;
    ///
    /// let fall = SourceMatcher::Static(vec!["fall".into()]);
    /// assert!(fall.matches(&DamageSource::new("fall")));
    ///
    /// let boom = SourceMatcher::Dynamic(Arc::new(DamageSource::is_explosion));
    /// assert!(boom.matches(&DamageSource::new("tnt").explosion()));
    /// assert!(!boom.matches(&DamageSource::new("fall")));
    /// ```
    pub fn matches(&self, source: &DamageSource) -> bool {
        match self {
            SourceMatcher::Static(ids) => ids.contains(source.id()),
            SourceMatcher::Dynamic(predicate) => predicate(source),
        }
    }
}

impl fmt::Debug for SourceMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceMatcher::Static(ids) => f.debug_tuple("Static").field(ids).finish(),
            SourceMatcher::Dynamic(_) => f.write_str("Dynamic(<predicate>)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_matcher() {
        let matcher = SourceMatcher::Static(vec![
            DamageSourceId::new(vanilla::FALL),
            DamageSourceId::new(vanilla::HOT_FLOOR),
        ]);
        assert!(matcher.matches(&DamageSource::new(vanilla::HOT_FLOOR)));
        assert!(!matcher.matches(&DamageSource::new(vanilla::ANVIL)));
    }

    #[test]
    fn test_static_matcher_ignores_flags() {
        let matcher = SourceMatcher::Static(vec![DamageSourceId::new(vanilla::MAGIC)]);
        assert!(matcher.matches(&DamageSource::new(vanilla::MAGIC).bypassing_armor()));
    }

    #[test]
    fn test_dynamic_matcher() {
        let matcher = SourceMatcher::Dynamic(Arc::new(|s: &DamageSource| {
            s.id().as_str().starts_with("arrow")
        }));
        assert!(matcher.matches(&DamageSource::new("arrow.skeleton")));
        assert!(!matcher.matches(&DamageSource::new("fall")));
        assert_eq!(format!("{:?}", matcher), "Dynamic(<predicate>)");
    }
}
