//! Configuration module
//!
//! Handles loading and managing configuration.

pub mod env;
mod file;

pub use env::EnvConfig;
pub use file::ConfigFile;

use serde::{Deserialize, Serialize};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppConfig {
    /// Organization id used for grid authentication and routing
    pub org: Option<String>,

    /// Project root containing the suite directory
    pub suite_path: String,

    /// Spec directory beneath the suite directory
    pub specs_dir: String,

    /// Number of parallel runners
    pub parallel: usize,

    /// HTTP timeout in seconds
    pub timeout_secs: u64,

    /// Extra npm dependencies installed in the remote session
    #[serde(default)]
    pub dependencies: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            org: None,
            suite_path: ".".to_string(),
            specs_dir: "integration".to_string(),
            parallel: 1,
            timeout_secs: 30,
            dependencies: Vec::new(),
        }
    }
}

/// Grid endpoint configuration.
///
/// The control plane hosts the suite upload API and the session web UI;
/// each organization gets its own gateway host for session traffic.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GridEndpoints {
    /// Control plane base URL
    pub control_url: String,

    /// Gateway domain suffix; the org id becomes the subdomain
    pub gateway_domain: String,
}

impl Default for GridEndpoints {
    fn default() -> Self {
        Self {
            control_url: "https://app.gridrunner.dev".to_string(),
            gateway_domain: "gateway.gridrunner.dev".to_string(),
        }
    }
}

impl GridEndpoints {
    /// Suite upload endpoint on the control plane
    pub fn upload_url(&self) -> String {
        format!(
            "{}/api/v1/suite/upload",
            self.control_url.trim_end_matches('/')
        )
    }

    /// WebDriver-style session endpoint for an organization
    pub fn gateway_url(&self, org: &str) -> String {
        format!("https://{org}.{}/wd/hub", self.gateway_domain)
    }

    /// Human-facing link to a session in the control plane UI
    pub fn session_link(&self, session_id: &str) -> String {
        format!(
            "{}/session/{session_id}",
            self.control_url.trim_end_matches('/')
        )
    }
}

/// Effective settings for one run, merged from the config file,
/// environment overrides, and finally CLI flags (applied by the
/// caller, highest precedence).
#[derive(Clone, Debug)]
pub struct RunSettings {
    pub org: Option<String>,
    pub suite_path: String,
    pub specs_dir: String,
    pub parallel: usize,
    pub timeout_secs: u64,
    pub dependencies: Vec<String>,
    pub endpoints: GridEndpoints,
    pub reports_dir: Option<String>,
}

impl RunSettings {
    /// Base settings from a loaded config file
    pub fn from_file(config: ConfigFile) -> Self {
        Self {
            org: config.app.org,
            suite_path: config.app.suite_path,
            specs_dir: config.app.specs_dir,
            parallel: config.app.parallel,
            timeout_secs: config.app.timeout_secs,
            dependencies: config.app.dependencies,
            endpoints: config.grid,
            reports_dir: config.reports_dir,
        }
    }

    /// Layer environment overrides on top of the file settings
    pub fn apply_env(&mut self, env: &EnvConfig) {
        if let Some(org) = &env.org {
            self.org = Some(org.clone());
        }
        if let Some(path) = &env.suite_path {
            self.suite_path = path.clone();
        }
        if let Some(specs) = &env.specs_dir {
            self.specs_dir = specs.clone();
        }
        if let Some(parallel) = env.parallel {
            self.parallel = parallel;
        }
        if let Some(timeout) = env.timeout {
            self.timeout_secs = timeout;
        }
        if let Some(url) = &env.control_url {
            self.endpoints.control_url = url.clone();
        }
        if let Some(domain) = &env.gateway_domain {
            self.endpoints.gateway_domain = domain.clone();
        }
        if let Some(dir) = &env.reports_dir {
            self.reports_dir = Some(dir.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.specs_dir, "integration");
        assert_eq!(config.parallel, 1);
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_endpoint_urls() {
        let endpoints = GridEndpoints::default();
        assert_eq!(
            endpoints.upload_url(),
            "https://app.gridrunner.dev/api/v1/suite/upload"
        );
        assert_eq!(
            endpoints.gateway_url("acme"),
            "https://acme.gateway.gridrunner.dev/wd/hub"
        );
        assert_eq!(
            endpoints.session_link("abc123"),
            "https://app.gridrunner.dev/session/abc123"
        );
    }

    #[test]
    fn test_env_overrides_file() {
        let mut file = ConfigFile::default();
        file.app.org = Some("file-org".to_string());
        file.app.parallel = 2;

        let mut settings = RunSettings::from_file(file);
        let env = EnvConfig {
            org: Some("env-org".to_string()),
            parallel: Some(8),
            ..EnvConfig::default()
        };
        settings.apply_env(&env);

        assert_eq!(settings.org.as_deref(), Some("env-org"));
        assert_eq!(settings.parallel, 8);
        // Untouched fields keep their file values
        assert_eq!(settings.specs_dir, "integration");
    }

    #[test]
    fn test_endpoint_trailing_slash() {
        let endpoints = GridEndpoints {
            control_url: "https://app.gridrunner.dev/".to_string(),
            ..GridEndpoints::default()
        };
        assert_eq!(
            endpoints.upload_url(),
            "https://app.gridrunner.dev/api/v1/suite/upload"
        );
    }
}
