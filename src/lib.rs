pub mod cli;
pub mod config;
pub mod error;
pub mod extractor;
pub mod logging;
pub mod pipeline;
pub mod scanner;
pub mod ui;

// Public API re-exports
pub use cli::Cli;
pub use config::{CliOverrides, CollisionPolicy, Config, DestinationLayout};
pub use error::{ArchSweepError, Result, UserFriendlyError};

// Core functionality re-exports
pub use extractor::{BackupMover, BackupOutcome, Extractor, FlattenStats, Flattener};
pub use pipeline::{
    ArchiveFailure, FailureStage, Pipeline, PlannedArchive, RunOutcome, RunReport,
};
pub use scanner::{ArchiveEnumerator, ArchiveFile, ArchiveKind, ArchiveMatcher};
pub use ui::{GracefulShutdown, OutputFormatter, OutputMode, ProgressManager};

use std::path::Path;

/// Main library interface for ArchSweep functionality
pub struct ArchSweep {
    config: Config,
    output_formatter: OutputFormatter,
    progress_manager: ProgressManager,
    shutdown: GracefulShutdown,
}

impl ArchSweep {
    /// Create a new ArchSweep instance with the provided configuration
    pub fn new(config: Config, output_mode: OutputMode, verbose: u8, quiet: bool) -> Result<Self> {
        let shutdown = GracefulShutdown::new()?;
        Ok(Self::with_shutdown(config, output_mode, verbose, quiet, shutdown))
    }

    /// Create an instance without installing the Ctrl+C handler
    pub fn new_for_test(config: Config, output_mode: OutputMode, verbose: u8, quiet: bool) -> Self {
        Self::with_shutdown(
            config,
            output_mode,
            verbose,
            quiet,
            GracefulShutdown::new_for_test(),
        )
    }

    fn with_shutdown(
        config: Config,
        output_mode: OutputMode,
        verbose: u8,
        quiet: bool,
        shutdown: GracefulShutdown,
    ) -> Self {
        Self {
            config,
            output_formatter: OutputFormatter::new(output_mode, verbose, quiet),
            progress_manager: ProgressManager::new(!quiet),
            shutdown,
        }
    }

    /// Create ArchSweep instance from CLI arguments
    pub fn from_cli(cli_args: &Cli) -> Result<Self> {
        let config = cli_args.load_config()?;
        Self::new(
            config,
            cli_args.output_format,
            cli_args.verbosity_level(),
            cli_args.quiet,
        )
    }

    fn roots(&self) -> Result<&[std::path::PathBuf]> {
        if self.config.scan.roots.is_empty() {
            return Err(ArchSweepError::NoRoots);
        }
        Ok(&self.config.scan.roots)
    }

    fn pipeline(&self) -> Pipeline {
        Pipeline::new(&self.config).with_shutdown(self.shutdown.clone())
    }

    /// Process every archive under the configured roots and print the summary.
    ///
    /// Per-archive failures are part of the returned report, not an `Err`.
    pub fn run(&self) -> Result<RunReport> {
        let roots = self.roots()?;

        self.output_formatter.start_operation(&format!(
            "Sweeping {} root(s) ({} layout, keeping .{})",
            roots.len(),
            self.config.layout.mode,
            self.config.flatten.tracked_extensions.join(", .")
        ));

        let spinner = self.progress_manager.create_spinner("Scanning...");
        let progress_callback = {
            let pb = spinner.clone();
            move |report: &RunReport| ui::progress::update_run_progress(&pb, report)
        };

        let report = self.pipeline().run(roots, Some(&progress_callback));

        ui::progress::finish_progress_with_summary(
            &spinner,
            &report.summary_line(),
            report.duration,
        );
        self.progress_manager.clear();

        self.output_formatter.print_run_summary(&report);
        Ok(report)
    }

    /// List what `run` would do, without touching the filesystem.
    pub fn plan(&self) -> Result<Vec<PlannedArchive>> {
        let roots = self.roots()?;
        for root in roots.iter().filter(|root| !root.is_dir()) {
            self.output_formatter
                .warning(&format!("Root not found: {}", root.display()));
        }
        Ok(self.pipeline().plan(roots))
    }

    /// Generate sample configuration file
    pub fn generate_sample_config<P: AsRef<Path>>(output_path: P) -> Result<()> {
        let sample_config = Config::create_sample_config();
        std::fs::write(output_path.as_ref(), sample_config)?;
        Ok(())
    }

    /// Get configuration reference
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get output formatter reference
    pub fn output_formatter(&self) -> &OutputFormatter {
        &self.output_formatter
    }

    /// Handle error with user-friendly output
    pub fn handle_error(&self, error: &ArchSweepError) {
        self.output_formatter.print_user_friendly_error(error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write;
    use tempfile::TempDir;

    fn config_with_root(root: &Path) -> Config {
        let mut config = Config::default();
        config.scan.roots = vec![root.to_path_buf()];
        config
    }

    fn create_test_zip(path: &Path, entry: &str, content: &[u8]) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let mut writer = zip::ZipWriter::new(fs::File::create(path).unwrap());
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Stored);
        writer.start_file(entry, options).unwrap();
        writer.write_all(content).unwrap();
        writer.finish().unwrap();
    }

    #[test]
    fn test_run_without_roots_is_an_error() {
        let sweep = ArchSweep::new_for_test(Config::default(), OutputMode::Plain, 0, true);
        assert!(matches!(sweep.run(), Err(ArchSweepError::NoRoots)));
        assert!(matches!(sweep.plan(), Err(ArchSweepError::NoRoots)));
    }

    #[test]
    fn test_run_processes_configured_roots() {
        let temp_dir = TempDir::new().unwrap();
        create_test_zip(
            &temp_dir.path().join("Acme/2024/01/2024_01_15_report.zip"),
            "sub/report.xml",
            b"<r/>",
        );

        let sweep =
            ArchSweep::new_for_test(config_with_root(temp_dir.path()), OutputMode::Plain, 0, true);
        let report = sweep.run().unwrap();

        assert_eq!(report.outcome(), RunOutcome::Processed(1));
        assert!(temp_dir.path().join("Acme/extracted/report.xml").exists());
    }

    #[test]
    fn test_plan_lists_without_processing() {
        let temp_dir = TempDir::new().unwrap();
        let archive = temp_dir.path().join("Acme/2024/01/2024_01_15_report.zip");
        create_test_zip(&archive, "report.xml", b"<r/>");

        let sweep =
            ArchSweep::new_for_test(config_with_root(temp_dir.path()), OutputMode::Plain, 0, true);
        let plan = sweep.plan().unwrap();

        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].archive.path, archive);
        assert!(archive.exists());
    }

    #[test]
    fn test_sample_config_generation() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("sample.toml");

        ArchSweep::generate_sample_config(&config_path).unwrap();

        let content = fs::read_to_string(&config_path).unwrap();
        assert!(content.contains("[scan]"));
        assert!(content.contains("[layout]"));
        assert!(content.contains("[flatten]"));
        assert!(Config::load_from_file(&config_path).is_ok());
    }
}
