//! Group lookup during resolution.

use std::collections::{BTreeMap, HashMap};

use warden_core::types::OwnData;

/// Where the resolver finds the groups an entity belongs to.
pub trait GroupSource {
    /// Own data of the group with normalized key `key`, or `None` if there is
    /// no such group.
    fn group(&self, key: &str) -> Option<OwnData>;
}

impl GroupSource for HashMap<String, OwnData> {
    fn group(&self, key: &str) -> Option<OwnData> {
        self.get(key).cloned()
    }
}

impl GroupSource for BTreeMap<String, OwnData> {
    fn group(&self, key: &str) -> Option<OwnData> {
        self.get(key).cloned()
    }
}

impl<S: GroupSource + ?Sized> GroupSource for &S {
    fn group(&self, key: &str) -> Option<OwnData> {
        (**self).group(key)
    }
}
