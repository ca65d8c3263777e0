//! CLI definitions using clap derive API

use clap::builder::{Styles, styling::AnsiColor};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Appdeck - application catalog installer
///
/// Install Windows applications from a declarative catalog with dependency
/// resolution, verified downloads and durable state tracking.
#[derive(Parser, Debug)]
#[command(
    name = "appdeck",
    author,
    version,
    color = clap::ColorChoice::Always,
    styles = Styles::styled()
        .header(AnsiColor::Green.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default().bold())
        .placeholder(AnsiColor::Cyan.on_default()),
    about = "Application catalog installer",
    long_about = "Appdeck installs applications declared in a JSON catalog: it resolves a \
                  dependency-ordered plan, downloads installer artifacts into a \
                  content-addressed cache with hash and signature verification, runs the \
                  installers silently, and records what is installed.",
    after_help = "\x1b[1m\x1b[32mExamples:\x1b[0m\n    \
                  appdeck plan vscode\n    \
                  appdeck install vscode\n    \
                  appdeck uninstall vscode\n    \
                  appdeck status --detailed\n    \
                  appdeck cache list\n\n\
                  \x1b[1m\x1b[32mDocumentation:\x1b[0m\n    \
                  https://github.com/appdeck/appdeck"
)]
pub struct Cli {
    /// Path to the application catalog
    #[arg(
        long,
        global = true,
        env = "APPDECK_CATALOG",
        default_value = "catalog.json"
    )]
    pub catalog: PathBuf,

    /// Override the artifact cache directory
    #[arg(long, global = true, env = "APPDECK_CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Override the installation state file
    #[arg(long, global = true, env = "APPDECK_STATE_FILE")]
    pub state_file: Option<PathBuf>,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the dependency-ordered install plan for an application
    Plan(PlanArgs),

    /// Install an application and its dependencies
    Install(InstallArgs),

    /// Uninstall an application
    Uninstall(UninstallArgs),

    /// Show installation state
    Status(StatusArgs),

    /// Inspect or clean the artifact cache
    Cache(CacheArgs),

    /// Show version information
    Version,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the plan command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Show the install plan:\n    appdeck plan vscode\n\n\
                  Plans are read-only: no downloads or installs happen.")]
pub struct PlanArgs {
    /// Application id from the catalog
    pub app_id: String,
}

/// Arguments for the install command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Install with dependencies:\n    appdeck install vscode\n\n\
                  Reinstall even if satisfied:\n    appdeck install vscode --force\n\n\
                  Only the target, no dependencies:\n    appdeck install vscode --skip-dependencies\n\n\
                  Treat code-signature failures as fatal:\n    appdeck install vscode --require-signatures")]
pub struct InstallArgs {
    /// Application id from the catalog
    pub app_id: String,

    /// Reinstall steps that are already satisfied
    #[arg(long, short = 'f')]
    pub force: bool,

    /// Install only the target application, skipping its dependencies
    #[arg(long)]
    pub skip_dependencies: bool,

    /// Fail when the OS code-signature check fails instead of warning
    #[arg(long)]
    pub require_signatures: bool,

    /// Per-installer timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
}

/// Arguments for the uninstall command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Uninstall an application:\n    appdeck uninstall vscode\n\n\
                  Skip the confirmation prompt:\n    appdeck uninstall vscode -y\n\n\
                  Uninstall even with installed dependents:\n    appdeck uninstall vcredist --force")]
pub struct UninstallArgs {
    /// Application id to uninstall
    pub app_id: String,

    /// Proceed even when installed applications still depend on this one
    #[arg(long, short = 'f')]
    pub force: bool,

    /// Skip confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,

    /// Also remove the state record instead of keeping it for audit
    #[arg(long)]
    pub purge: bool,
}

/// Arguments for the status command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  All recorded applications:\n    appdeck status\n\n\
                  One application:\n    appdeck status vscode\n\n\
                  Include paths, closures and timestamps:\n    appdeck status --detailed")]
pub struct StatusArgs {
    /// Application id to show; all records when omitted
    pub app_id: Option<String>,

    /// Show detailed output
    #[arg(long)]
    pub detailed: bool,
}

/// Arguments for the cache command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Show cache statistics:\n    appdeck cache\n\n\
                  List cached artifacts:\n    appdeck cache list\n\n\
                  Remove everything:\n    appdeck cache clear\n\n\
                  Remove one artifact:\n    appdeck cache clear --only <sha256>")]
pub struct CacheArgs {
    #[command(subcommand)]
    pub command: Option<CacheSubcommand>,
}

#[derive(Subcommand, Debug)]
pub enum CacheSubcommand {
    /// List cached artifacts
    List,

    /// Remove cached artifacts
    Clear(CacheClearArgs),
}

/// Arguments for cache clear
#[derive(Parser, Debug)]
pub struct CacheClearArgs {
    /// Remove only the artifact with this SHA-256 digest
    #[arg(long, value_name = "SHA256")]
    pub only: Option<String>,
}

/// Arguments for completions command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Generate bash completions:\n    appdeck completions --shell bash > ~/.bash_completion.d/appdeck\n\n\
                  Generate PowerShell completions:\n    appdeck completions --shell powershell")]
pub struct CompletionsArgs {
    /// Shell type (bash, elvish, fish, powershell, zsh)
    #[arg(long)]
    pub shell: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing_plan() {
        let cli = Cli::try_parse_from(["appdeck", "plan", "vscode"]).unwrap();
        match cli.command {
            Commands::Plan(args) => assert_eq!(args.app_id, "vscode"),
            _ => panic!("Expected Plan command"),
        }
    }

    #[test]
    fn test_cli_parsing_install_defaults() {
        let cli = Cli::try_parse_from(["appdeck", "install", "vscode"]).unwrap();
        match cli.command {
            Commands::Install(args) => {
                assert_eq!(args.app_id, "vscode");
                assert!(!args.force);
                assert!(!args.skip_dependencies);
                assert!(!args.require_signatures);
                assert!(args.timeout.is_none());
            }
            _ => panic!("Expected Install command"),
        }
    }

    #[test]
    fn test_cli_parsing_install_with_options() {
        let cli = Cli::try_parse_from([
            "appdeck",
            "install",
            "vscode",
            "--force",
            "--skip-dependencies",
            "--timeout",
            "120",
        ])
        .unwrap();
        match cli.command {
            Commands::Install(args) => {
                assert!(args.force);
                assert!(args.skip_dependencies);
                assert_eq!(args.timeout, Some(120));
            }
            _ => panic!("Expected Install command"),
        }
    }

    #[test]
    fn test_cli_parsing_uninstall() {
        let cli = Cli::try_parse_from(["appdeck", "uninstall", "vscode", "-y"]).unwrap();
        match cli.command {
            Commands::Uninstall(args) => {
                assert_eq!(args.app_id, "vscode");
                assert!(args.yes);
                assert!(!args.force);
            }
            _ => panic!("Expected Uninstall command"),
        }
    }

    #[test]
    fn test_cli_parsing_status() {
        let cli = Cli::try_parse_from(["appdeck", "status"]).unwrap();
        match cli.command {
            Commands::Status(args) => {
                assert!(args.app_id.is_none());
                assert!(!args.detailed);
            }
            _ => panic!("Expected Status command"),
        }

        let cli = Cli::try_parse_from(["appdeck", "status", "vscode", "--detailed"]).unwrap();
        match cli.command {
            Commands::Status(args) => {
                assert_eq!(args.app_id.as_deref(), Some("vscode"));
                assert!(args.detailed);
            }
            _ => panic!("Expected Status command"),
        }
    }

    #[test]
    fn test_cli_parsing_cache() {
        let cli = Cli::try_parse_from(["appdeck", "cache"]).unwrap();
        match cli.command {
            Commands::Cache(args) => assert!(args.command.is_none()),
            _ => panic!("Expected Cache command"),
        }

        let cli = Cli::try_parse_from(["appdeck", "cache", "clear", "--only", "abc"]).unwrap();
        match cli.command {
            Commands::Cache(CacheArgs {
                command: Some(CacheSubcommand::Clear(args)),
            }) => assert_eq!(args.only.as_deref(), Some("abc")),
            _ => panic!("Expected cache clear subcommand"),
        }
    }

    #[test]
    fn test_cli_global_options() {
        let cli = Cli::try_parse_from([
            "appdeck",
            "-v",
            "--catalog",
            "/etc/appdeck/catalog.json",
            "status",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.catalog, PathBuf::from("/etc/appdeck/catalog.json"));
    }

    #[test]
    fn test_cli_catalog_defaults_to_cwd() {
        let cli = Cli::try_parse_from(["appdeck", "status"]).unwrap();
        assert_eq!(cli.catalog, PathBuf::from("catalog.json"));
    }

    #[test]
    fn test_cli_parsing_version() {
        let cli = Cli::try_parse_from(["appdeck", "version"]).unwrap();
        assert!(matches!(cli.command, Commands::Version));
    }

    #[test]
    fn test_cli_parsing_completions() {
        let cli = Cli::try_parse_from(["appdeck", "completions", "--shell", "zsh"]).unwrap();
        match cli.command {
            Commands::Completions(args) => assert_eq!(args.shell, "zsh"),
            _ => panic!("Expected Completions command"),
        }
    }
}
