//! CLI argument parsing
//!
//! Defines command-line interface using clap.

use clap::{Parser, Subcommand};

/// Remote browser-grid runner for Cypress-style suites
#[derive(Parser, Debug)]
#[command(name = "grid-runner")]
#[command(version)]
#[command(about = "Run an end-to-end suite on a remote browser grid")]
#[command(long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Package the suite, upload it, and run every spec on the grid
    Run(RunArgs),

    /// List the spec files a run would submit
    List(ListArgs),

    /// View the merged report from the last run
    Results(ResultsArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

/// Arguments for the run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Organization id
    #[arg(short, long)]
    pub org: Option<String>,

    /// Project root containing the suite directory
    #[arg(short, long)]
    pub path: Option<String>,

    /// Spec directory beneath the suite directory
    #[arg(short, long)]
    pub specs: Option<String>,

    /// Number of parallel runners
    #[arg(long)]
    pub parallel: Option<usize>,

    /// HTTP timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Output format (table, json, json-pretty, csv)
    #[arg(short, long, default_value = "table")]
    pub format: String,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Reports directory
    #[arg(long)]
    pub reports_dir: Option<String>,

    /// Extra npm dependency installed in each session (repeatable)
    #[arg(long = "dep")]
    pub dependencies: Vec<String>,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<String>,
}

/// Arguments for the list command
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Project root containing the suite directory
    #[arg(short, long)]
    pub path: Option<String>,

    /// Spec directory beneath the suite directory
    #[arg(short, long)]
    pub specs: Option<String>,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<String>,
}

/// Arguments for the results command
#[derive(Parser, Debug)]
pub struct ResultsArgs {
    /// Reports directory
    #[arg(long)]
    pub dir: Option<String>,

    /// Output format (table, json)
    #[arg(short, long, default_value = "table")]
    pub format: String,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Create an example configuration file
    Init {
        /// Output path
        #[arg(short, long, default_value = "./grid-runner.yaml")]
        output: String,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Show the effective configuration
    Show {
        /// Show environment overrides instead of the file
        #[arg(long)]
        env: bool,

        /// Output format (yaml, json)
        #[arg(short, long, default_value = "yaml")]
        format: String,
    },

    /// Validate a configuration file
    Validate {
        /// Configuration file path (defaults to the standard locations)
        file: Option<String>,
    },

    /// List supported environment variables
    Env,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_args() {
        let args = Args::parse_from([
            "grid-runner",
            "run",
            "--org",
            "acme",
            "--parallel",
            "4",
            "--dep",
            "dayjs",
            "--dep",
            "lodash",
        ]);
        match args.command {
            Command::Run(run_args) => {
                assert_eq!(run_args.org.as_deref(), Some("acme"));
                assert_eq!(run_args.parallel, Some(4));
                assert_eq!(run_args.dependencies, vec!["dayjs", "lodash"]);
                assert_eq!(run_args.format, "table");
            }
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_list_args() {
        let args = Args::parse_from(["grid-runner", "list", "--specs", "smoke"]);
        match args.command {
            Command::List(list_args) => {
                assert_eq!(list_args.specs.as_deref(), Some("smoke"));
            }
            _ => panic!("Expected List command"),
        }
    }

    #[test]
    fn test_config_init_args() {
        let args = Args::parse_from(["grid-runner", "config", "init", "--force"]);
        match args.command {
            Command::Config(config_args) => match config_args.action {
                ConfigAction::Init { output, force } => {
                    assert_eq!(output, "./grid-runner.yaml");
                    assert!(force);
                }
                _ => panic!("Expected Init action"),
            },
            _ => panic!("Expected Config command"),
        }
    }
}
