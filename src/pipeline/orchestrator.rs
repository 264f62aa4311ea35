use crate::config::{Config, DestinationLayout, LayoutConfig};
use crate::error::{ArchSweepError, Result};
use crate::extractor::{BackupMover, Extractor, Flattener, ScratchArea};
use crate::pipeline::report::{ArchiveOutcome, FailureStage, RunReport};
use crate::scanner::{discover_companies, ArchiveEnumerator, ArchiveFile, ArchiveMatcher};
use crate::ui::GracefulShutdown;
use std::fs;
use std::path::{Path, PathBuf};

/// An archive the pipeline would process, as shown by a dry run.
#[derive(Debug, Clone)]
pub struct PlannedArchive {
    pub archive: ArchiveFile,
    pub destination: PathBuf,
    pub backup_dir: PathBuf,
    /// The backup folder already holds this name, so the source would be deleted.
    pub already_backed_up: bool,
}

/// Runs extract → flatten → backup for every candidate archive under the roots.
pub struct Pipeline {
    layout: LayoutConfig,
    matcher: ArchiveMatcher,
    extractor: Extractor,
    flattener: Flattener,
    backup: BackupMover,
    reserved: Vec<String>,
    shutdown: Option<GracefulShutdown>,
}

impl Pipeline {
    pub fn new(config: &Config) -> Self {
        Self {
            layout: config.layout.clone(),
            matcher: ArchiveMatcher::new(),
            extractor: Extractor::new(),
            flattener: Flattener::new(&config.flatten),
            backup: BackupMover::new(),
            reserved: config.reserved_folder_names(),
            shutdown: None,
        }
    }

    pub fn with_extractor(mut self, extractor: Extractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_shutdown(mut self, shutdown: GracefulShutdown) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Destination and backup folders for `archive` inside `company`.
    pub fn target_folders(&self, company: &Path, archive: &ArchiveFile) -> (PathBuf, PathBuf) {
        let destination = match self.layout.mode {
            DestinationLayout::Shared => company.join(&self.layout.destination_dir),
            DestinationLayout::PerArchive => company.join(&archive.stem),
        };
        (destination, company.join(&self.layout.backup_dir))
    }

    pub fn enumerate<'a>(&'a self, company: &Path) -> ArchiveEnumerator<'a> {
        ArchiveEnumerator::new(company, &self.matcher)
            .with_skipped_folders(self.reserved.iter().cloned())
    }

    fn check_cancelled(&self) -> Result<()> {
        match self.shutdown {
            Some(ref shutdown) => shutdown.check_shutdown(),
            None => Ok(()),
        }
    }

    /// Processes every root and returns a fresh report.
    ///
    /// A failing archive is recorded and skipped; it never stops the run.
    pub fn run(
        &self,
        roots: &[PathBuf],
        progress_callback: Option<&dyn Fn(&RunReport)>,
    ) -> RunReport {
        let mut report = RunReport::new();

        'roots: for root in roots {
            if !root.is_dir() {
                tracing::warn!(root = %root.display(), "root directory not found, skipping");
                report.missing_roots.push(root.clone());
                continue;
            }
            report.roots_scanned += 1;

            let companies = match discover_companies(root) {
                Ok(companies) => companies,
                Err(error) => {
                    tracing::error!(root = %root.display(), %error, "cannot list companies");
                    report.record_failure(root.clone(), FailureStage::Enumerate, error);
                    continue;
                }
            };

            for company in companies {
                report.companies_scanned += 1;
                let _span = tracing::info_span!("company", path = %company.display()).entered();

                for item in self.enumerate(&company) {
                    if let Err(error) = self.check_cancelled() {
                        tracing::warn!(%error, "stopping before the next archive");
                        report.cancelled = true;
                        break 'roots;
                    }

                    let archive = match item {
                        Ok(archive) => archive,
                        Err(error) => {
                            tracing::error!(%error, "enumeration failed");
                            let path = enumeration_path(&error, &company);
                            report.record_failure(path, FailureStage::Enumerate, error);
                            continue;
                        }
                    };

                    report.current_archive = Some(archive.file_name.clone());
                    if let Some(callback) = progress_callback {
                        callback(&report);
                    }

                    match self.process_archive(&company, &archive) {
                        Ok(outcome) => {
                            tracing::info!(
                                archive = %archive.file_name,
                                date = ?archive.date(),
                                files = outcome.flatten.moved,
                                backup = %outcome.backup.backup_path().display(),
                                duplicate = outcome.backup.is_duplicate(),
                                "archive processed"
                            );
                            report.record_success(&outcome);
                        }
                        Err((stage, error)) => {
                            tracing::error!(archive = %archive.file_name, %stage, %error, "archive failed");
                            report.record_failure(archive.path.clone(), stage, error);
                        }
                    }

                    if let Some(callback) = progress_callback {
                        callback(&report);
                    }
                }
            }
        }

        report.finish();
        if let Some(callback) = progress_callback {
            callback(&report);
        }
        report
    }

    /// Discovered → FolderReady → Extracted → Flattened → BackedUp.
    ///
    /// A destination folder created for a failed archive is removed again
    /// while it is still empty.
    pub fn process_archive(
        &self,
        company: &Path,
        archive: &ArchiveFile,
    ) -> std::result::Result<ArchiveOutcome, (FailureStage, ArchSweepError)> {
        let (destination, backup_dir) = self.target_folders(company, archive);
        let created_destination = !destination.exists();

        let result = self.run_stages(archive, destination.clone(), &backup_dir);
        if result.is_err() && created_destination && fs::remove_dir(&destination).is_ok() {
            tracing::debug!(folder = %destination.display(), "removed empty destination folder");
        }
        result
    }

    fn run_stages(
        &self,
        archive: &ArchiveFile,
        destination: PathBuf,
        backup_dir: &Path,
    ) -> std::result::Result<ArchiveOutcome, (FailureStage, ArchSweepError)> {
        ensure_dir(&destination).map_err(|e| (FailureStage::PrepareFolders, e))?;
        ensure_dir(backup_dir).map_err(|e| (FailureStage::PrepareFolders, e))?;

        let scratch = ScratchArea::create_in(archive.parent())
            .map_err(|e| (FailureStage::Extract, e))?;
        let files_extracted = self
            .extractor
            .extract(&archive.path, &scratch)
            .map_err(|e| (FailureStage::Extract, e))?;

        let flatten = self
            .flattener
            .flatten(scratch, &destination)
            .map_err(|e| (FailureStage::Flatten, e))?;

        let backup = self
            .backup
            .move_to_backup(&archive.path, backup_dir)
            .map_err(|e| (FailureStage::Backup, e))?;

        Ok(ArchiveOutcome {
            archive: archive.path.clone(),
            destination,
            files_extracted,
            flatten,
            backup,
        })
    }

    /// Lists what `run` would do without touching the filesystem.
    pub fn plan(&self, roots: &[PathBuf]) -> Vec<PlannedArchive> {
        let mut planned = Vec::new();

        for root in roots {
            let companies = match discover_companies(root) {
                Ok(companies) => companies,
                Err(error) => {
                    tracing::warn!(root = %root.display(), %error, "cannot list companies");
                    continue;
                }
            };

            for company in companies {
                for item in self.enumerate(&company) {
                    match item {
                        Ok(archive) => {
                            let (destination, backup_dir) = self.target_folders(&company, &archive);
                            let already_backed_up = backup_dir.join(&archive.file_name).exists();
                            planned.push(PlannedArchive {
                                archive,
                                destination,
                                backup_dir,
                                already_backed_up,
                            });
                        }
                        Err(error) => tracing::warn!(%error, "enumeration failed"),
                    }
                }
            }
        }

        planned
    }
}

fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|source| ArchSweepError::DirectoryCreation {
        path: path.to_path_buf(),
        source,
    })
}

fn enumeration_path(error: &ArchSweepError, fallback: &Path) -> PathBuf {
    match error {
        ArchSweepError::Enumeration { path, .. } => path.clone(),
        _ => fallback.to_path_buf(),
    }
}
