/// Common test utilities and helpers for Octonag tests

use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

pub const VALID_CONFIG: &str = r#"
use_jira: false
manually_resolve_users:
  jdoe: john.doe
repositories:
  acme:
    - widgets
    - gadgets
  initech:
    - tps-reports
whitelist:
blacklist:
  - eve
ignore_no_assigned: false
ignore_no_requested: false
send_greeting: true
default_email_domain: example.com
"#;

const MANAGED_VARS: &[&str] = &[
    "GITHUB_API_TOKEN",
    "SLACK_API_TOKEN",
    "GITHUB_URL",
    "JIRA_URL",
    "JIRA_USER",
    "JIRA_PASS",
    "DEBUG_UID",
];

/// Temporary config file plus the environment the binary runs with
pub struct TestEnvironment {
    pub temp_dir: TempDir,
    pub env: Vec<(String, String)>,
}

impl TestEnvironment {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        Self {
            temp_dir,
            env: Vec::new(),
        }
    }

    /// Environment with both required tokens set
    pub fn with_tokens() -> Self {
        let mut test_env = Self::new();
        test_env.set_env_var("GITHUB_API_TOKEN", "gh-secret");
        test_env.set_env_var("SLACK_API_TOKEN", "xoxb-secret");
        test_env
    }

    pub fn set_env_var(&mut self, key: &str, value: &str) {
        self.env.push((key.to_string(), value.to_string()));
    }

    pub fn create_test_config(&self, content: &str) -> PathBuf {
        let config_path = self.temp_dir.path().join("config.yaml");
        std::fs::write(&config_path, content).expect("Failed to write test config");
        config_path
    }

    /// Run the binary against `config` with only the managed variables set
    pub fn run(&self, config: &PathBuf, args: &[&str]) -> Output {
        let mut command = Command::new(env!("CARGO_BIN_EXE_octonag"));
        command
            .arg("--config")
            .arg(config)
            .args(args)
            .current_dir(self.temp_dir.path())
            .env("NO_COLOR", "1")
            .env_remove("RUST_LOG");
        for var in MANAGED_VARS {
            command.env_remove(var);
        }
        for (key, value) in &self.env {
            command.env(key, value);
        }
        command.output().expect("Failed to execute octonag")
    }
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

/// Assertion helpers for test validation
pub fn assert_contains_all(text: &str, expected: &[&str]) {
    for item in expected {
        assert!(
            text.contains(item),
            "Expected text to contain '{}', but it didn't. Text: {}",
            item,
            text
        );
    }
}
