use crate::config::{CliOverrides, CollisionPolicy, Config, DestinationLayout};
use crate::error::Result;
use crate::ui::OutputMode;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "archsweep")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Extract, flatten and back up dated ZIP/RAR archives")]
#[command(
    long_about = "ArchSweep walks <root>/<company>/<year>/<month>/ folders, extracts every \
                  archive named YYYY_MM_DD*.zip or *.rar, keeps only the tracked file types \
                  in a flat destination folder and moves the archive into the company's \
                  backup folder."
)]
#[command(before_help = "📦 ArchSweep - Archive Extraction Pipeline")]
#[command(after_help = "EXAMPLES:\n  \
    archsweep /srv/archives\n  \
    archsweep /srv/archives /mnt/legacy --tracked xml,csv\n  \
    archsweep --config archsweep.toml --dry-run\n  \
    ARCHSWEEP_ROOTS=/srv/a,/srv/b archsweep --layout per-archive -v")]
pub struct Cli {
    /// Root directories holding company folders
    pub roots: Vec<PathBuf>,

    /// Comma-separated roots from the environment, used when none are given as arguments
    #[arg(long = "env-roots", env = "ARCHSWEEP_ROOTS", value_delimiter = ',', hide = true)]
    pub env_roots: Vec<PathBuf>,

    /// Configuration file path
    #[arg(short, long, help = "Path to TOML configuration file")]
    pub config: Option<PathBuf>,

    /// Where extracted files go inside a company folder
    #[arg(long, value_enum)]
    pub layout: Option<DestinationLayout>,

    /// Name of the shared destination folder
    #[arg(long, value_name = "NAME")]
    pub destination_dir: Option<String>,

    /// Name of the backup folder
    #[arg(long, value_name = "NAME")]
    pub backup_dir: Option<String>,

    /// File extensions to keep (comma-separated)
    #[arg(short, long, help = "File extensions to keep after extraction (e.g., xml,csv)")]
    pub tracked: Option<String>,

    /// What to do when the destination already has a file of the same name
    #[arg(long, value_enum)]
    pub on_collision: Option<CollisionPolicy>,

    /// Output format for results
    #[arg(long, value_enum, default_value_t = OutputMode::Human)]
    pub output_format: OutputMode,

    /// Also write logs to this file
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Verbose output level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-essential output)
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Dry run (show what would be done without executing)
    #[arg(long, help = "List the archives that would be processed without touching them")]
    pub dry_run: bool,

    /// Generate sample configuration file
    #[arg(long, help = "Generate a sample configuration file")]
    pub generate_config: bool,
}

impl Cli {
    pub fn load_config(&self) -> Result<Config> {
        let mut config = Config::load_with_defaults(self.config.as_ref())?;

        let overrides = self.create_cli_overrides();
        config.merge_with_cli_args(&overrides);
        config.validate()?;

        Ok(config)
    }

    pub fn create_cli_overrides(&self) -> CliOverrides {
        let roots = if !self.roots.is_empty() {
            Some(self.roots.clone())
        } else if !self.env_roots.is_empty() {
            Some(self.env_roots.clone())
        } else {
            None
        };

        CliOverrides::new()
            .with_roots(roots)
            .with_layout(self.layout)
            .with_destination_dir(self.destination_dir.clone())
            .with_backup_dir(self.backup_dir.clone())
            .with_tracked(self.tracked.clone())
            .with_on_collision(self.on_collision)
    }

    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let mut full = vec!["archsweep"];
        full.extend_from_slice(args);
        Cli::try_parse_from(full).unwrap()
    }

    #[test]
    fn test_roots_and_flags() {
        let cli = parse(&[
            "/srv/a",
            "/srv/b",
            "--layout",
            "per-archive",
            "--on-collision",
            "skip",
            "-t",
            "xml,csv",
            "-vv",
        ]);

        assert_eq!(cli.roots, vec![PathBuf::from("/srv/a"), PathBuf::from("/srv/b")]);
        assert_eq!(cli.layout, Some(DestinationLayout::PerArchive));
        assert_eq!(cli.on_collision, Some(CollisionPolicy::Skip));
        assert_eq!(cli.verbosity_level(), 2);
        assert_eq!(cli.output_format, OutputMode::Human);
    }

    #[test]
    fn test_root_argument_may_contain_commas() {
        let cli = parse(&["/srv/Acme, Inc", "/srv/b"]);

        assert_eq!(
            cli.roots,
            vec![PathBuf::from("/srv/Acme, Inc"), PathBuf::from("/srv/b")]
        );
        assert_eq!(
            cli.create_cli_overrides().roots,
            Some(vec![PathBuf::from("/srv/Acme, Inc"), PathBuf::from("/srv/b")])
        );
    }

    #[test]
    fn test_environment_roots_are_comma_separated() {
        let cli = parse(&["--env-roots", "/srv/a,/srv/b"]);

        assert!(cli.roots.is_empty());
        assert_eq!(
            cli.create_cli_overrides().roots,
            Some(vec![PathBuf::from("/srv/a"), PathBuf::from("/srv/b")])
        );
    }

    #[test]
    fn test_argument_roots_win_over_environment_roots() {
        let cli = parse(&["/srv/cli", "--env-roots", "/srv/a,/srv/b"]);

        assert_eq!(
            cli.create_cli_overrides().roots,
            Some(vec![PathBuf::from("/srv/cli")])
        );
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["archsweep", "-q", "-v"]).is_err());
        assert_eq!(parse(&["-q"]).verbosity_level(), 0);
    }

    #[test]
    fn test_overrides_leave_unset_values_alone() {
        let cli = parse(&["--backup-dir", "old"]);
        let overrides = cli.create_cli_overrides();

        assert!(overrides.roots.is_none());
        assert!(overrides.layout.is_none());
        assert_eq!(overrides.backup_dir.as_deref(), Some("old"));
    }

    #[test]
    fn test_overrides_applied_to_config() {
        let cli = parse(&["/data", "--tracked", ".XML, csv", "--destination-dir", "flat"]);
        let mut config = Config::default();
        config.merge_with_cli_args(&cli.create_cli_overrides());

        assert_eq!(config.scan.roots, vec![PathBuf::from("/data")]);
        assert_eq!(config.flatten.tracked_extensions, vec!["xml", "csv"]);
        assert_eq!(config.layout.destination_dir, "flat");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_enum_value_rejected() {
        assert!(Cli::try_parse_from(["archsweep", "--layout", "sideways"]).is_err());
        assert!(Cli::try_parse_from(["archsweep", "--output-format", "json"]).is_err());
    }
}
