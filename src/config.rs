use anyhow::{anyhow, bail, Context, Result};
use dirs::config_dir;
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, error};

/// Relative location checked before falling back to the XDG config directory
pub const LOCAL_CONFIG_PATH: &str = "conf/config.yaml";

/// Suffix appended to `GITHUB_URL` to reach the GraphQL endpoint
pub const GRAPHQL_SUFFIX: &str = "/api/graphql";

pub const GITHUB_TOKEN_VAR: &str = "GITHUB_API_TOKEN";
pub const SLACK_TOKEN_VAR: &str = "SLACK_API_TOKEN";
pub const GITHUB_URL_VAR: &str = "GITHUB_URL";
pub const JIRA_URL_VAR: &str = "JIRA_URL";
pub const JIRA_USER_VAR: &str = "JIRA_USER";
pub const JIRA_PASS_VAR: &str = "JIRA_PASS";
pub const DEBUG_UID_VAR: &str = "DEBUG_UID";

/// Source of environment variables
///
/// The process environment in production, a plain map in tests.
pub trait Environment {
    fn var(&self, key: &str) -> Option<String>;
}

/// Reads from the real process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl Environment for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl Environment for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// Owner to repository-list mapping, kept in file order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RepositoryMap(Vec<(String, Vec<String>)>);

impl RepositoryMap {
    pub fn new(entries: Vec<(String, Vec<String>)>) -> Self {
        Self(entries)
    }

    /// Repositories configured for one owner
    pub fn get(&self, owner: &str) -> Option<&[String]> {
        self.0
            .iter()
            .find(|(name, _)| name == owner)
            .map(|(_, repos)| repos.as_slice())
    }

    pub fn owners(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(owner, _)| owner.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0
            .iter()
            .map(|(owner, repos)| (owner.as_str(), repos.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'de> Deserialize<'de> for RepositoryMap {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct RepositoryMapVisitor;

        impl<'de> Visitor<'de> for RepositoryMapVisitor {
            type Value = RepositoryMap;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a mapping of owner names to repository lists")
            }

            fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::new();
                while let Some((owner, repos)) = map.next_entry::<String, Option<Vec<String>>>()? {
                    entries.push((owner, repos.unwrap_or_default()));
                }
                Ok(RepositoryMap(entries))
            }
        }

        deserializer.deserialize_map(RepositoryMapVisitor)
    }
}

/// Raw shape of the YAML configuration file
#[derive(Debug, Deserialize, Clone)]
pub struct FileConfig {
    /// Look up JIRA accounts; requires `JIRA_USER` and `JIRA_PASS`
    pub use_jira: bool,

    /// Administrator overrides from one identity to another
    #[serde(default)]
    pub manually_resolve_users: Option<HashMap<String, String>>,

    /// Repositories to watch, grouped by owner
    pub repositories: RepositoryMap,

    #[serde(default)]
    pub whitelist: Option<Vec<String>>,

    #[serde(default)]
    pub blacklist: Option<Vec<String>>,

    /// Skip pull requests without assignees
    pub ignore_no_assigned: bool,

    /// Skip pull requests without requested reviewers
    pub ignore_no_requested: bool,

    pub send_greeting: bool,

    pub default_email_domain: String,
}

impl FileConfig {
    /// Parse a configuration file from disk
    pub fn from_path(path: &Path) -> Result<Self> {
        debug!("Attempting to read configuration file {:?}", path);

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        Self::from_yaml(&content)
            .with_context(|| format!("Error reading configuration file {:?}", path))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).context("Failed to parse configuration")
    }
}

/// Validated, immutable process configuration
#[derive(Clone)]
pub struct Settings {
    pub github_token: String,
    pub slack_token: String,
    pub jira_user: Option<String>,
    pub jira_pass: Option<String>,
    pub repositories: RepositoryMap,
    /// `None` means no whitelist filtering; never an empty set
    pub whitelist: Option<HashSet<String>>,
    /// `None` means no blacklist filtering; never an empty set
    pub blacklist: Option<HashSet<String>>,
    pub use_jira: bool,
    pub ignore_assigned: bool,
    pub ignore_requested: bool,
    pub send_greeting: bool,
    pub debug_uid: Option<String>,
    pub default_email_domain: String,
    pub manual_user_map: HashMap<String, String>,
    pub github_url: Option<String>,
    pub jira_url: Option<String>,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("github_token", &"<redacted>")
            .field("slack_token", &"<redacted>")
            .field("jira_user", &self.jira_user)
            .field("jira_pass", &self.jira_pass.as_ref().map(|_| "<redacted>"))
            .field("repositories", &self.repositories)
            .field("whitelist", &self.whitelist)
            .field("blacklist", &self.blacklist)
            .field("use_jira", &self.use_jira)
            .field("ignore_assigned", &self.ignore_assigned)
            .field("ignore_requested", &self.ignore_requested)
            .field("send_greeting", &self.send_greeting)
            .field("debug_uid", &self.debug_uid)
            .field("default_email_domain", &self.default_email_domain)
            .field("manual_user_map", &self.manual_user_map)
            .field("github_url", &self.github_url)
            .field("jira_url", &self.jira_url)
            .finish()
    }
}

impl Settings {
    /// Load configuration from a YAML file plus environment variables
    pub fn load(path: &Path, env: &impl Environment) -> Result<Self> {
        let file = FileConfig::from_path(path)?;
        Self::from_parts(file, env)
    }

    /// Load configuration, terminating the process if it is unusable
    pub fn load_or_exit(path: &Path, env: &impl Environment) -> Self {
        match Self::load(path, env) {
            Ok(settings) => settings,
            Err(e) => {
                error!("{:#}", e);
                std::process::exit(1);
            }
        }
    }

    /// Merge parsed file contents with secrets from the environment
    pub fn from_parts(file: FileConfig, env: &impl Environment) -> Result<Self> {
        let github_token = env.var(GITHUB_TOKEN_VAR);
        let slack_token = env.var(SLACK_TOKEN_VAR);

        let (jira_user, jira_pass) = if file.use_jira {
            debug!("Using JIRA credentials");
            let user = env.var(JIRA_USER_VAR);
            let pass = env.var(JIRA_PASS_VAR);
            if user.is_none() || pass.is_none() {
                bail!(
                    "use_jira is enabled but {} or {} is not set",
                    JIRA_USER_VAR,
                    JIRA_PASS_VAR
                );
            }
            (user, pass)
        } else {
            (None, None)
        };

        let (github_token, slack_token) = match (github_token, slack_token) {
            (Some(github), Some(slack)) => (github, slack),
            _ => {
                return Err(anyhow!(
                    "Slack or Github tokens not configured (set {} and {})",
                    SLACK_TOKEN_VAR,
                    GITHUB_TOKEN_VAR
                ))
            }
        };

        Ok(Self {
            github_token,
            slack_token,
            jira_user,
            jira_pass,
            repositories: file.repositories,
            whitelist: normalize_list(file.whitelist),
            blacklist: normalize_list(file.blacklist),
            use_jira: file.use_jira,
            ignore_assigned: file.ignore_no_assigned,
            ignore_requested: file.ignore_no_requested,
            send_greeting: file.send_greeting,
            debug_uid: env.var(DEBUG_UID_VAR),
            default_email_domain: file.default_email_domain,
            manual_user_map: file.manually_resolve_users.unwrap_or_default(),
            github_url: env.var(GITHUB_URL_VAR),
            jira_url: env.var(JIRA_URL_VAR),
        })
    }

    /// Owner names in configuration order
    pub fn organizations(&self) -> impl Iterator<Item = &str> {
        self.repositories.owners()
    }

    /// GraphQL endpoint derived from `GITHUB_URL`
    pub fn github_graphql(&self) -> Option<String> {
        self.github_url
            .as_deref()
            .map(|url| format!("{}{}", url.trim_end_matches('/'), GRAPHQL_SUFFIX))
    }

    pub fn slack_token(&self) -> &str {
        &self.slack_token
    }
}

fn normalize_list(list: Option<Vec<String>>) -> Option<HashSet<String>> {
    list.filter(|names| !names.is_empty())
        .map(|names| names.into_iter().collect())
}

/// Get the configuration file path
///
/// Prefers `conf/config.yaml` in the working directory, otherwise the XDG location.
pub fn default_config_path() -> Result<PathBuf> {
    let local = PathBuf::from(LOCAL_CONFIG_PATH);
    if local.exists() {
        return Ok(local);
    }

    let config_dir = config_dir().context("Failed to get user config directory")?;
    Ok(config_dir.join("octonag").join("config.yaml"))
}

/// Expand `~` and environment variables in a user-supplied path
pub fn expand_path(path: &str) -> Result<PathBuf> {
    let expanded = shellexpand::full(path)
        .with_context(|| format!("Failed to expand config path: {}", path))?;
    Ok(PathBuf::from(expanded.into_owned()))
}
