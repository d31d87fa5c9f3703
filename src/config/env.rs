//! Environment variable configuration
//!
//! Provides environment variable overrides for configuration.

#![allow(dead_code)]

use std::env;

/// Environment variable prefix
const ENV_PREFIX: &str = "GRID_RUNNER";

/// Environment configuration from environment variables
#[derive(Clone, Debug, Default)]
pub struct EnvConfig {
    /// Organization id from GRID_RUNNER_ORG
    pub org: Option<String>,
    /// Suite path from GRID_RUNNER_PATH
    pub suite_path: Option<String>,
    /// Spec directory from GRID_RUNNER_SPECS
    pub specs_dir: Option<String>,
    /// Parallel runners from GRID_RUNNER_PARALLEL
    pub parallel: Option<usize>,
    /// Timeout from GRID_RUNNER_TIMEOUT
    pub timeout: Option<u64>,
    /// Config file from GRID_RUNNER_CONFIG
    pub config_file: Option<String>,
    /// Control plane URL from GRID_RUNNER_CONTROL_URL
    pub control_url: Option<String>,
    /// Gateway domain from GRID_RUNNER_GATEWAY_DOMAIN
    pub gateway_domain: Option<String>,
    /// Reports directory from GRID_RUNNER_REPORTS_DIR
    pub reports_dir: Option<String>,
    /// Verbose from GRID_RUNNER_VERBOSE
    pub verbose: Option<bool>,
    /// Output format from GRID_RUNNER_FORMAT
    pub format: Option<String>,
}

impl EnvConfig {
    /// Load configuration from environment variables
    pub fn load() -> Self {
        Self {
            org: get_env("ORG"),
            suite_path: get_env("PATH"),
            specs_dir: get_env("SPECS"),
            parallel: get_env_parse("PARALLEL"),
            timeout: get_env_parse("TIMEOUT"),
            config_file: get_env("CONFIG"),
            control_url: get_env("CONTROL_URL"),
            gateway_domain: get_env("GATEWAY_DOMAIN"),
            reports_dir: get_env("REPORTS_DIR"),
            verbose: get_env_bool("VERBOSE"),
            format: get_env("FORMAT"),
        }
    }

    /// Check if any environment variables are set
    pub fn has_any(&self) -> bool {
        self.org.is_some()
            || self.suite_path.is_some()
            || self.specs_dir.is_some()
            || self.parallel.is_some()
            || self.timeout.is_some()
            || self.config_file.is_some()
            || self.control_url.is_some()
            || self.gateway_domain.is_some()
            || self.reports_dir.is_some()
            || self.verbose.is_some()
            || self.format.is_some()
    }

    /// Print current environment configuration
    pub fn print_summary(&self) {
        println!("Environment Configuration:");
        println!("  {}_ORG:            {:?}", ENV_PREFIX, self.org);
        println!("  {}_PATH:           {:?}", ENV_PREFIX, self.suite_path);
        println!("  {}_SPECS:          {:?}", ENV_PREFIX, self.specs_dir);
        println!("  {}_PARALLEL:       {:?}", ENV_PREFIX, self.parallel);
        println!("  {}_TIMEOUT:        {:?}", ENV_PREFIX, self.timeout);
        println!("  {}_CONFIG:         {:?}", ENV_PREFIX, self.config_file);
        println!("  {}_CONTROL_URL:    {:?}", ENV_PREFIX, self.control_url);
        println!("  {}_GATEWAY_DOMAIN: {:?}", ENV_PREFIX, self.gateway_domain);
        println!("  {}_REPORTS_DIR:    {:?}", ENV_PREFIX, self.reports_dir);
        println!("  {}_VERBOSE:        {:?}", ENV_PREFIX, self.verbose);
        println!("  {}_FORMAT:         {:?}", ENV_PREFIX, self.format);
    }
}

/// Get environment variable with prefix
fn get_env(name: &str) -> Option<String> {
    env::var(format!("{ENV_PREFIX}_{name}")).ok()
}

/// Get and parse environment variable
fn get_env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    get_env(name).and_then(|v| v.parse().ok())
}

/// Get boolean environment variable (1/true/yes are truthy)
fn get_env_bool(name: &str) -> Option<bool> {
    get_env(name).map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
}

/// Print help for supported environment variables
pub fn print_env_help() {
    println!("Supported environment variables:\n");
    println!("  {ENV_PREFIX}_ORG             Organization id");
    println!("  {ENV_PREFIX}_PATH            Project root containing the suite");
    println!("  {ENV_PREFIX}_SPECS           Spec directory beneath the suite");
    println!("  {ENV_PREFIX}_PARALLEL        Number of parallel runners");
    println!("  {ENV_PREFIX}_TIMEOUT         HTTP timeout in seconds");
    println!("  {ENV_PREFIX}_CONFIG          Configuration file path");
    println!("  {ENV_PREFIX}_CONTROL_URL     Grid control plane URL");
    println!("  {ENV_PREFIX}_GATEWAY_DOMAIN  Grid gateway domain suffix");
    println!("  {ENV_PREFIX}_REPORTS_DIR     Reports directory");
    println!("  {ENV_PREFIX}_VERBOSE         Enable verbose logging");
    println!("  {ENV_PREFIX}_FORMAT          Output format (table, json, csv)");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_bool_parsing() {
        env::set_var("GRID_RUNNER_VERBOSE", "true");
        assert_eq!(get_env_bool("VERBOSE"), Some(true));

        env::set_var("GRID_RUNNER_VERBOSE", "0");
        assert_eq!(get_env_bool("VERBOSE"), Some(false));

        env::remove_var("GRID_RUNNER_VERBOSE");
        assert_eq!(get_env_bool("VERBOSE"), None);
    }

    #[test]
    fn test_env_parse() {
        env::set_var("GRID_RUNNER_PARALLEL", "8");
        assert_eq!(get_env_parse::<usize>("PARALLEL"), Some(8));

        env::set_var("GRID_RUNNER_PARALLEL", "not-a-number");
        assert_eq!(get_env_parse::<usize>("PARALLEL"), None);

        env::remove_var("GRID_RUNNER_PARALLEL");
    }
}
