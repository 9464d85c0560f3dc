//! Credential injection for outgoing service calls
//!
//! Injectors hand a typed credential to the wrapped call alongside its own
//! arguments. Which secret goes with which service is decided when the injector
//! is built; an unsupported service is a configuration error at that point.

use anyhow::{bail, Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use std::fmt;
use std::sync::Arc;

use crate::config::Settings;

/// External services the bot talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Service {
    Github,
    Slack,
    Jira,
}

impl Service {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "github" => Some(Service::Github),
            "slack" => Some(Service::Slack),
            "jira" => Some(Service::Jira),
            _ => None,
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Service::Github => write!(f, "Github"),
            Service::Slack => write!(f, "Slack"),
            Service::Jira => write!(f, "Jira"),
        }
    }
}

/// An API token for one service
#[derive(Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub service: Service,
    pub value: &'a str,
}

impl fmt::Debug for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("service", &self.service)
            .field("value", &"<redacted>")
            .finish()
    }
}

/// Username and password for a basic-auth service
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials<'a> {
    pub user: &'a str,
    pub pass: &'a str,
}

impl fmt::Debug for Credentials<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("pass", &"<redacted>")
            .finish()
    }
}

/// Supplies a bearer token to wrapped calls
#[derive(Debug, Clone)]
pub struct TokenInjector {
    service: Service,
    settings: Arc<Settings>,
}

impl TokenInjector {
    pub fn new(settings: Arc<Settings>, service: Service) -> Result<Self> {
        if service == Service::Jira {
            bail!("{} does not use token authentication", service);
        }
        Ok(Self { service, settings })
    }

    pub fn token(&self) -> Token<'_> {
        let value = match self.service {
            Service::Github => self.settings.github_token.as_str(),
            _ => self.settings.slack_token.as_str(),
        };
        Token {
            service: self.service,
            value,
        }
    }

    /// Run `next` with the service token
    pub fn call<R>(&self, next: impl FnOnce(Token<'_>) -> R) -> R {
        next(self.token())
    }
}

/// Supplies username/password pairs to wrapped calls
#[derive(Debug, Clone)]
pub struct CredentialInjector {
    settings: Arc<Settings>,
}

impl CredentialInjector {
    pub fn new(settings: Arc<Settings>, service: Service) -> Result<Self> {
        if service != Service::Jira {
            bail!("no username/password credentials are configured for {}", service);
        }
        if settings.jira_user.is_none() || settings.jira_pass.is_none() {
            bail!("JIRA credentials requested but use_jira is disabled");
        }
        Ok(Self { settings })
    }

    pub fn credentials(&self) -> Credentials<'_> {
        // Presence checked in `new`
        Credentials {
            user: self.settings.jira_user.as_deref().unwrap_or_default(),
            pass: self.settings.jira_pass.as_deref().unwrap_or_default(),
        }
    }

    /// Run `next` with the service credentials
    pub fn call<R>(&self, next: impl FnOnce(Credentials<'_>) -> R) -> R {
        next(self.credentials())
    }
}

/// `Authorization: Bearer <token>` header for a token service
pub fn get_header(settings: Arc<Settings>, service: Service) -> Result<HeaderMap> {
    let injector = TokenInjector::new(settings, service)?;
    injector.call(|token| -> Result<HeaderMap> {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", token.value))
            .with_context(|| format!("{} token is not a valid header value", service))?;
        value.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, value);
        Ok(headers)
    })
}
