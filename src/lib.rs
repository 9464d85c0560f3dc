//! Octonag - configuration and access control for the review-nagging bot
//!
//! Octonag watches pull requests across configured GitHub repositories and nags
//! the people involved over Slack, optionally matching identities through JIRA.
//! This crate holds the process configuration and the pipeline every user
//! lookup goes through before reaching a service.
//!
//! ## Core Features
//!
//! - **Configuration Management**: YAML file plus environment secrets, validated once
//! - **Access Control**: Whitelist/blacklist filtering with sticky denials
//! - **Identity Mapping**: Manual user remapping with sticky memoization
//! - **Credential Injection**: Bearer tokens and JIRA basic-auth credentials
//!
//! ## Modules
//!
//! - [`config`]: Configuration loading and validation
//! - [`filter`]: Whitelist/blacklist restrictions
//! - [`resolve`]: Manual identity remapping
//! - [`credentials`]: Token and credential injection
//! - [`repos`]: Repository enumeration
//! - [`context`]: Per-run context tying the stages together

pub mod config;
pub mod context;
pub mod credentials;
pub mod filter;
pub mod repos;
pub mod resolve;

pub use config::{Environment, FileConfig, ProcessEnv, RepositoryMap, Settings};
pub use context::{Context, Lookup};
pub use credentials::{get_header, CredentialInjector, Credentials, Service, Token, TokenInjector};
pub use filter::{AccessFilter, BlockedSet, ListType, Restriction};
pub use repos::{repository_generator, RepositoryInjector};
pub use resolve::{IdentityResolver, MappedSet};
