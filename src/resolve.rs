//! Manual identity remapping
//!
//! Administrators can map one user name onto another when automatic matching
//! across GitHub, Slack and JIRA fails. The first remap of a name is logged and
//! recorded in the [`MappedSet`]; later calls reuse the mapping quietly.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::info;

use crate::config::Settings;

/// Names already remapped during this run. Only grows.
#[derive(Debug, Clone, Default)]
pub struct MappedSet(Arc<Mutex<HashSet<String>>>);

impl MappedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lock().contains(name)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn insert(&self, name: &str) -> bool {
        self.lock().insert(name.to_string())
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[derive(Debug, Clone)]
pub struct IdentityResolver {
    settings: Arc<Settings>,
    mapped: MappedSet,
}

impl IdentityResolver {
    pub fn new(settings: Arc<Settings>, mapped: MappedSet) -> Self {
        Self { settings, mapped }
    }

    /// The name a lookup for `name` should actually use
    pub fn resolve<'a>(&'a self, name: &'a str) -> &'a str {
        let map = &self.settings.manual_user_map;

        if self.mapped.contains(name) {
            // Re-read the map rather than caching the target
            if let Some(target) = map.get(name) {
                return target;
            }
        }

        match map.get(name) {
            Some(target) => {
                info!(
                    "{} in manual mapping configuration, doing lookup on {}",
                    name, target
                );
                self.mapped.insert(name);
                target
            }
            None => name,
        }
    }

    /// Run `next` with the remapped name
    pub fn call<R>(&self, name: &str, next: impl FnOnce(&str) -> R) -> R {
        next(self.resolve(name))
    }

    pub fn mapped(&self) -> &MappedSet {
        &self.mapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::{token_env, MINIMAL_YAML};
    use crate::config::FileConfig;
    use std::collections::HashMap;

    fn resolver_with(map: &[(&str, &str)]) -> IdentityResolver {
        let file = FileConfig::from_yaml(MINIMAL_YAML).unwrap();
        let mut settings = Settings::from_parts(file, &token_env()).unwrap();
        settings.manual_user_map = map
            .iter()
            .map(|(from, to)| (from.to_string(), to.to_string()))
            .collect::<HashMap<_, _>>();
        IdentityResolver::new(Arc::new(settings), MappedSet::new())
    }

    #[test]
    fn test_mapped_name_is_substituted() {
        let resolver = resolver_with(&[("jdoe", "john.doe")]);

        assert_eq!(resolver.call("jdoe", |name| name.to_string()), "john.doe");
        assert!(resolver.mapped().contains("jdoe"));
    }

    #[test]
    fn test_repeated_lookup_reuses_mapping() {
        let resolver = resolver_with(&[("jdoe", "john.doe")]);

        assert_eq!(resolver.resolve("jdoe"), "john.doe");
        assert_eq!(resolver.resolve("jdoe"), "john.doe");
        assert_eq!(resolver.mapped().len(), 1);
    }

    #[test]
    fn test_unmapped_name_passes_through() {
        let resolver = resolver_with(&[("jdoe", "john.doe")]);

        assert_eq!(resolver.call("asmith", |name| name.to_string()), "asmith");
        assert!(resolver.mapped().is_empty());
    }

    #[test]
    fn test_empty_map_passes_through() {
        let resolver = resolver_with(&[]);
        assert_eq!(resolver.resolve("jdoe"), "jdoe");
    }

    #[test]
    fn test_mapping_is_not_transitive() {
        let resolver = resolver_with(&[("a", "b"), ("b", "c")]);
        assert_eq!(resolver.resolve("a"), "b");
    }
}
