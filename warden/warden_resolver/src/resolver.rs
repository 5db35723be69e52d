//! Effective view resolution.
//!
//! This module provides the depth-first traversal that flattens an entity's
//! group membership graph into an [`EffectiveView`].

use std::collections::{BTreeMap, BTreeSet, HashMap};

use log::{debug, trace};
use warden_core::error::RecursiveGroupError;
use warden_core::types::{Calculable, EffectiveView, EntityKind, OwnData};

use crate::source::GroupSource;

/// A resolver that computes effective views against a group source.
pub struct Resolver<'a, S: ?Sized> {
    /// Where groups are looked up.
    source: &'a S,
}

impl<'a, S> Resolver<'a, S>
where
    S: GroupSource + ?Sized,
{
    /// Create a new resolver.
    ///
    /// # Arguments
    ///
    /// * `source` - The groups reachable from the entities to resolve.
    pub fn new(source: &'a S) -> Self {
        Self { source }
    }

    /// Compute the effective view of `entity` without storing it.
    ///
    /// # Returns
    ///
    /// * `Ok(EffectiveView)` - The complete view.
    /// * `Err(RecursiveGroupError)` - If the membership graph has a cycle.
    pub fn resolve(&self, entity: &Calculable) -> Result<EffectiveView, RecursiveGroupError> {
        self.resolve_own(entity.kind(), entity.key(), &entity.own())
    }

    /// Compute the effective view of an entity given a snapshot of its own
    /// data.
    ///
    /// A group starts the traversal with itself on the path, so membership
    /// in itself is reported as a cycle.
    pub fn resolve_own(
        &self,
        kind: EntityKind,
        key: &str,
        own: &OwnData,
    ) -> Result<EffectiveView, RecursiveGroupError> {
        let mut traversal = Traversal::new(self.source);
        if kind == EntityKind::Group {
            traversal.path.push(key.to_string());
        }

        traversal.visit(own, 0).inspect_err(|err| {
            debug!("Resolution of {} '{}' failed: {}", kind, key, err);
        })?;

        Ok(traversal.finish())
    }

    /// Resolve `entity` and store the result as its effective view.
    ///
    /// On failure the previous view is left untouched.
    pub fn recalculate(&self, entity: &Calculable) -> Result<(), RecursiveGroupError> {
        let view = self.resolve(entity)?;
        trace!(
            "Resolved {} '{}': {} permissions, {} meta keys",
            entity.kind(),
            entity.key(),
            view.permissions.len(),
            view.meta.len()
        );
        entity.replace_effective(view);
        Ok(())
    }
}

/// State of one resolution.
struct Traversal<'a, S: ?Sized> {
    source: &'a S,

    /// Groups currently being visited, outermost first.
    path: Vec<String>,

    /// Smallest depth at which each group has been fully visited.
    completed: HashMap<String, usize>,

    permissions: BTreeSet<String>,

    /// Meta value and the depth it was found at.
    meta: BTreeMap<String, (String, usize)>,
}

impl<'a, S> Traversal<'a, S>
where
    S: GroupSource + ?Sized,
{
    fn new(source: &'a S) -> Self {
        Self {
            source,
            path: Vec::new(),
            completed: HashMap::new(),
            permissions: BTreeSet::new(),
            meta: BTreeMap::new(),
        }
    }

    fn visit(&mut self, own: &OwnData, depth: usize) -> Result<(), RecursiveGroupError> {
        self.permissions.extend(own.permissions.iter().cloned());

        for (key, value) in &own.meta {
            let closer_known = matches!(self.meta.get(key), Some((_, found)) if *found <= depth);
            if !closer_known {
                self.meta.insert(key.clone(), (value.clone(), depth));
            }
        }

        for group in &own.groups {
            if let Some(start) = self.path.iter().position(|g| g == group) {
                return Err(RecursiveGroupError::new(self.path[start..].to_vec()));
            }

            // A group already walked at this depth or closer adds nothing new,
            // and any cycle through it would have been reported then.
            if matches!(self.completed.get(group), Some(d) if *d <= depth + 1) {
                continue;
            }

            let Some(data) = self.source.group(group) else {
                trace!("Skipping missing group '{}'", group);
                continue;
            };

            self.path.push(group.clone());
            self.visit(&data, depth + 1)?;
            self.path.pop();

            self.completed.insert(group.clone(), depth + 1);
        }

        Ok(())
    }

    fn finish(self) -> EffectiveView {
        EffectiveView {
            permissions: self.permissions,
            meta: self
                .meta
                .into_iter()
                .map(|(key, (value, _))| (key, value))
                .collect(),
        }
    }
}
