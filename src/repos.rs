//! Enumeration of configured repositories

use anyhow::{anyhow, Result};
use std::sync::Arc;

use crate::config::{RepositoryMap, Settings};

/// Lazily yield `(owner, repository)` pairs in configuration order
///
/// Each call returns an independent iterator.
pub fn repository_generator(repos: &RepositoryMap) -> impl Iterator<Item = (&str, &str)> + '_ {
    repos.iter().flat_map(|(owner, names)| {
        names.iter().map(move |name| (owner, name.as_str()))
    })
}

/// Supplies the repository list of an organization to wrapped calls
#[derive(Debug, Clone)]
pub struct RepositoryInjector {
    settings: Arc<Settings>,
}

impl RepositoryInjector {
    pub fn new(settings: Arc<Settings>) -> Self {
        Self { settings }
    }

    /// Repositories configured for `organization`
    pub fn repositories(&self, organization: &str) -> Result<&[String]> {
        self.settings
            .repositories
            .get(organization)
            .ok_or_else(|| anyhow!("Organization {} is not configured", organization))
    }

    /// Run `next` with the organization and its repositories
    pub fn call<R>(&self, organization: &str, next: impl FnOnce(&str, &[String]) -> R) -> Result<R> {
        let repositories = self.repositories(organization)?;
        Ok(next(organization, repositories))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::{token_env, MINIMAL_YAML};
    use crate::config::FileConfig;
    use quickcheck_macros::quickcheck;

    fn settings() -> Arc<Settings> {
        let file = FileConfig::from_yaml(MINIMAL_YAML).unwrap();
        Arc::new(Settings::from_parts(file, &token_env()).unwrap())
    }

    #[test]
    fn test_generator_order() {
        let settings = settings();
        let pairs: Vec<_> = repository_generator(&settings.repositories).collect();

        assert_eq!(
            pairs,
            vec![
                ("acme", "widgets"),
                ("acme", "gadgets"),
                ("initech", "tps-reports"),
            ]
        );
    }

    #[test]
    fn test_generator_is_restartable() {
        let settings = settings();
        let mut first = repository_generator(&settings.repositories);
        first.next();

        let second: Vec<_> = repository_generator(&settings.repositories).collect();
        assert_eq!(second.len(), 3);
        assert_eq!(first.count(), 2);
    }

    #[test]
    fn test_generator_over_explicit_map() {
        let repos = RepositoryMap::new(vec![
            ("solo".to_string(), vec!["one".to_string()]),
            ("empty".to_string(), vec![]),
        ]);
        let pairs: Vec<_> = repository_generator(&repos).collect();
        assert_eq!(pairs, vec![("solo", "one")]);
    }

    #[test]
    fn test_injects_repositories_for_organization() {
        let injector = RepositoryInjector::new(settings());
        let joined = injector
            .call("acme", |org, repos| format!("{}:{}", org, repos.join(",")))
            .unwrap();
        assert_eq!(joined, "acme:widgets,gadgets");
    }

    #[test]
    fn test_unknown_organization_is_an_error() {
        let injector = RepositoryInjector::new(settings());
        let err = injector.call("globex", |_, _| ()).unwrap_err();
        assert!(err.to_string().contains("globex"));
    }

    #[quickcheck]
    fn prop_independent_generators_agree(entries: Vec<(String, Vec<String>)>) -> bool {
        let repos = RepositoryMap::new(entries);
        let first: Vec<_> = repository_generator(&repos).collect();
        let second: Vec<_> = repository_generator(&repos).collect();
        let expected: usize = repos.iter().map(|(_, names)| names.len()).sum();
        first == second && first.len() == expected
    }
}
