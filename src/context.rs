//! Per-run context shared by every lookup
//!
//! Built once at startup from the loaded [`Settings`]. Owns the sticky
//! blocked/mapped name sets so that two contexts never share decisions.

use anyhow::Result;
use reqwest::header::HeaderMap;
use std::sync::Arc;

use crate::config::{RepositoryMap, Settings};
use crate::credentials::{get_header, CredentialInjector, Service, TokenInjector};
use crate::filter::{AccessFilter, BlockedSet, ListType, Restriction};
use crate::repos::{repository_generator, RepositoryInjector};
use crate::resolve::{IdentityResolver, MappedSet};

/// Outcome of running a name through the access pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<R> {
    /// Denied by a whitelist or blacklist, now or earlier in the run
    Blocked,
    /// Passed; `name` is the identity the lookup ran with
    Resolved { name: String, result: R },
}

#[derive(Debug, Clone)]
pub struct Context {
    settings: Arc<Settings>,
    filter: AccessFilter,
    resolver: IdentityResolver,
}

impl Context {
    pub fn new(settings: Settings) -> Self {
        let settings = Arc::new(settings);
        Self {
            filter: AccessFilter::new(Arc::clone(&settings), BlockedSet::new()),
            resolver: IdentityResolver::new(Arc::clone(&settings), MappedSet::new()),
            settings,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn restrict(&self, list_type: ListType) -> Restriction {
        self.filter.restrict(list_type)
    }

    pub fn manually_resolve(&self) -> &IdentityResolver {
        &self.resolver
    }

    pub fn with_token(&self, service: Service) -> Result<TokenInjector> {
        TokenInjector::new(Arc::clone(&self.settings), service)
    }

    pub fn with_credentials(&self, service: Service) -> Result<CredentialInjector> {
        CredentialInjector::new(Arc::clone(&self.settings), service)
    }

    pub fn get_header(&self, service: Service) -> Result<HeaderMap> {
        get_header(Arc::clone(&self.settings), service)
    }

    pub fn repositories(&self) -> RepositoryInjector {
        RepositoryInjector::new(Arc::clone(&self.settings))
    }

    /// `(owner, repository)` pairs from `repos`, or from the configuration
    pub fn repository_generator<'a>(
        &'a self,
        repos: Option<&'a RepositoryMap>,
    ) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        repository_generator(repos.unwrap_or(&self.settings.repositories))
    }

    /// Run `next` with `DEBUG_UID` in place of `uid` when one is configured
    pub fn debug<R>(&self, uid: &str, next: impl FnOnce(&str) -> R) -> R {
        next(self.settings.debug_uid.as_deref().unwrap_or(uid))
    }

    /// Blacklist, then whitelist, then manual remapping, then `next`
    pub fn lookup<R>(&self, name: &str, next: impl FnOnce(&str) -> R) -> Lookup<R> {
        let blacklist = self.restrict(ListType::Blacklist);
        let whitelist = self.restrict(ListType::Whitelist);

        let outcome = blacklist.call_opt(name, |name| {
            whitelist.call(name, |name| {
                self.resolver.call(name, |resolved| (resolved.to_string(), next(resolved)))
            })
        });

        match outcome {
            Some((name, result)) => Lookup::Resolved { name, result },
            None => Lookup::Blocked,
        }
    }

    pub fn blocked(&self) -> &BlockedSet {
        self.filter.blocked()
    }

    pub fn mapped(&self) -> &MappedSet {
        self.resolver.mapped()
    }
}
