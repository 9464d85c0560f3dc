//! Allow/deny list filtering for user lookups
//!
//! A [`Restriction`] guards a lookup keyed by a user name. Names rejected by the
//! configured whitelist or blacklist are logged once and remembered in the shared
//! [`BlockedSet`]; every later lookup of the same name is skipped silently,
//! whichever restriction sees it.

use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::info;

use crate::config::Settings;

/// Which configured collection a restriction checks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListType {
    /// Only names in the whitelist pass
    Whitelist,
    /// Names in the blacklist are rejected
    Blacklist,
    /// No filtering
    None,
}

impl ListType {
    fn collection<'a>(&self, settings: &'a Settings) -> Option<&'a HashSet<String>> {
        match self {
            ListType::Whitelist => settings.whitelist.as_ref(),
            ListType::Blacklist => settings.blacklist.as_ref(),
            ListType::None => None,
        }
        .filter(|names| !names.is_empty())
    }
}

impl fmt::Display for ListType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListType::Whitelist => write!(f, "whitelist"),
            ListType::Blacklist => write!(f, "blacklist"),
            ListType::None => write!(f, "none"),
        }
    }
}

/// Names already denied during this run. Only grows.
#[derive(Debug, Clone, Default)]
pub struct BlockedSet(Arc<Mutex<HashSet<String>>>);

impl BlockedSet {
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
        // A poisoned set still holds valid names
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Produces restrictions that share one [`BlockedSet`]
#[derive(Debug, Clone)]
pub struct AccessFilter {
    settings: Arc<Settings>,
    blocked: BlockedSet,
}

impl AccessFilter {
    pub fn new(settings: Arc<Settings>, blocked: BlockedSet) -> Self {
        Self { settings, blocked }
    }

    /// Build a restriction checking the given list
    pub fn restrict(&self, list_type: ListType) -> Restriction {
        Restriction {
            list_type,
            settings: Arc::clone(&self.settings),
            blocked: self.blocked.clone(),
        }
    }

    pub fn blocked(&self) -> &BlockedSet {
        &self.blocked
    }
}

/// A single whitelist/blacklist check in front of a lookup
#[derive(Debug, Clone)]
pub struct Restriction {
    list_type: ListType,
    settings: Arc<Settings>,
    blocked: BlockedSet,
}

impl Restriction {
    pub fn list_type(&self) -> ListType {
        self.list_type
    }

    /// Whether `name` may proceed, recording a first-time denial
    pub fn permits(&self, name: &str) -> bool {
        if self.blocked.contains(name) {
            return false;
        }

        let Some(collection) = self.list_type.collection(&self.settings) else {
            return true;
        };

        let is_whitelist = self.list_type == ListType::Whitelist;
        if is_whitelist ^ collection.contains(name) {
            let modifier = if is_whitelist { "not in" } else { "in" };
            info!("User {} {} {}, blocking lookup", name, modifier, self.list_type);
            self.blocked.insert(name);
            return false;
        }

        true
    }

    /// Run `next` with `name` unless the name is blocked
    ///
    /// Returns `None` without calling `next` for blocked names.
    pub fn call<R>(&self, name: &str, next: impl FnOnce(&str) -> R) -> Option<R> {
        if self.permits(name) {
            Some(next(name))
        } else {
            None
        }
    }

    /// Like [`Restriction::call`] for lookups that already return an `Option`
    pub fn call_opt<R>(&self, name: &str, next: impl FnOnce(&str) -> Option<R>) -> Option<R> {
        self.call(name, next).flatten()
    }
}
