//! Customer profiles: named bundles of rule configurations

use crate::rule::RuleConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A customer-configured bundle of rules.
///
/// Identity is the uuid: two profiles are equal iff their uuids match,
/// regardless of name or rule list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub uuid: String,
    pub name: String,
    pub rules: Vec<RuleConfig>,
}

impl PartialEq for Profile {
    fn eq(&self, other: &Self) -> bool {
        self.uuid == other.uuid
    }
}

impl Eq for Profile {}

impl std::hash::Hash for Profile {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.uuid.hash(state);
    }
}

/// The set of profiles currently in force, keyed by uuid.
///
/// Built up while a profile stream is open and swapped in wholesale when
/// the stream closes. Duplicate uuids within one stream collapse, last
/// writer wins.
#[derive(Debug, Clone, Default)]
pub struct ProfileSet {
    profiles: HashMap<String, Profile>,
}

impl ProfileSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a profile, replacing any previous one with the same uuid.
    pub fn insert(&mut self, profile: Profile) {
        self.profiles.insert(profile.uuid.clone(), profile);
    }

    pub fn get(&self, uuid: &str) -> Option<&Profile> {
        self.profiles.get(uuid)
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Profile> {
        self.profiles.values()
    }

    /// Total number of (profile, rule) pairs a transaction fans out to.
    pub fn rule_pair_count(&self) -> usize {
        self.profiles.values().map(|p| p.rules.len()).sum()
    }
}

impl FromIterator<Profile> for ProfileSet {
    fn from_iter<I: IntoIterator<Item = Profile>>(iter: I) -> Self {
        let mut set = ProfileSet::new();
        for profile in iter {
            set.insert(profile);
        }
        set
    }
}
