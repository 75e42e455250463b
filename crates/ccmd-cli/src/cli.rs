//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// ccmd - Manage command packages for your project
#[derive(Parser, Debug)]
#[command(name = "ccmd")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub project: ProjectArgs,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Where the project lives and how specs resolve
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectArgs {
    /// Project root (defaults to the current directory)
    #[arg(long, global = true, env = "CCMD_PROJECT", value_name = "DIR")]
    pub project: Option<PathBuf>,

    /// Install root, relative to the project root
    #[arg(long, global = true, env = "CCMD_INSTALL_DIR", value_name = "DIR")]
    pub install_dir: Option<PathBuf>,

    /// Host used for `owner/repo` shorthand
    #[arg(long, global = true, env = "CCMD_DEFAULT_HOST", value_name = "HOST")]
    pub default_host: Option<String>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Install a command package
    ///
    /// Without a repository, installs everything declared in ccmd.yaml.
    ///
    /// Examples:
    ///   ccmd install acme/tool            # Latest from github.com/acme/tool
    ///   ccmd install acme/tool@v1.2.0     # A tag, branch or commit
    ///   ccmd install                      # Everything in ccmd.yaml
    #[command(disable_version_flag = true)]
    Install {
        /// Repository spec, optionally with @ref
        repo: Option<String>,

        /// Ref to install; wins over an @ref suffix
        #[arg(long, value_name = "REF")]
        version: Option<String>,

        /// Install under this command name
        #[arg(long)]
        name: Option<String>,

        /// Replace an existing installation
        #[arg(short, long)]
        force: bool,
    },

    /// Remove an installed command
    Remove {
        /// Name of the installed command
        name: String,

        /// Do not ask for confirmation
        #[arg(short, long)]
        force: bool,

        /// Also drop the declaration from ccmd.yaml
        #[arg(long)]
        save: bool,
    },

    /// Install declared and remove undeclared commands
    Sync {
        /// Preview changes without applying them
        #[arg(long)]
        dry_run: bool,

        /// Overwrite stray directories and remove without asking
        #[arg(short, long)]
        force: bool,
    },

    /// Check installed commands for missing files and drift
    Check,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_install_with_overrides() {
        let cli = Cli::parse_from([
            "ccmd",
            "install",
            "acme/tool@v1",
            "--version",
            "v2",
            "--name",
            "mytool",
            "-f",
        ]);
        assert_eq!(
            cli.command,
            Some(Commands::Install {
                repo: Some("acme/tool@v1".into()),
                version: Some("v2".into()),
                name: Some("mytool".into()),
                force: true,
            })
        );
    }

    #[test]
    fn parse_install_without_repo() {
        let cli = Cli::parse_from(["ccmd", "install"]);
        assert_eq!(
            cli.command,
            Some(Commands::Install {
                repo: None,
                version: None,
                name: None,
                force: false,
            })
        );
    }

    #[test]
    fn parse_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["ccmd", "sync", "--dry-run", "--project", "/tmp/p", "-v"]);
        assert!(cli.verbose);
        assert_eq!(cli.project.project, Some(PathBuf::from("/tmp/p")));
        assert_eq!(
            cli.command,
            Some(Commands::Sync {
                dry_run: true,
                force: false
            })
        );
    }

    #[test]
    fn parse_remove() {
        let cli = Cli::parse_from(["ccmd", "remove", "tool", "--save"]);
        assert_eq!(
            cli.command,
            Some(Commands::Remove {
                name: "tool".into(),
                force: false,
                save: true,
            })
        );
    }
}
