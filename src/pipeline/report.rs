use crate::error::ArchSweepError;
use crate::extractor::{BackupOutcome, FlattenStats};
use chrono::{DateTime, Local};
use std::fmt;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Step of the per-archive sequence where a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
    Enumerate,
    PrepareFolders,
    Extract,
    Flatten,
    Backup,
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureStage::Enumerate => "enumerate",
            FailureStage::PrepareFolders => "prepare folders",
            FailureStage::Extract => "extract",
            FailureStage::Flatten => "flatten",
            FailureStage::Backup => "backup",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
pub struct ArchiveFailure {
    /// The archive, or the directory that could not be enumerated.
    pub path: PathBuf,
    pub stage: FailureStage,
    pub error: ArchSweepError,
}

/// What happened to one archive that made it all the way through.
#[derive(Debug, Clone)]
pub struct ArchiveOutcome {
    pub archive: PathBuf,
    pub destination: PathBuf,
    pub files_extracted: usize,
    pub flatten: FlattenStats,
    pub backup: BackupOutcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Processed(usize),
    NothingFound,
    /// `failed` counts archives; `unreadable` counts folders that could not be listed.
    CompletedWithFailures {
        processed: usize,
        failed: usize,
        unreadable: usize,
    },
    Cancelled { processed: usize },
}

/// Result of one pipeline run. Built fresh by every call to `Pipeline::run`.
#[derive(Debug)]
pub struct RunReport {
    pub processed: usize,
    /// Processed archives whose name was already in the backup folder.
    pub duplicates_removed: usize,
    pub files_extracted: usize,
    pub flatten: FlattenStats,
    pub failures: Vec<ArchiveFailure>,
    pub roots_scanned: usize,
    pub missing_roots: Vec<PathBuf>,
    pub companies_scanned: usize,
    pub cancelled: bool,
    pub current_archive: Option<String>,
    pub started_at: DateTime<Local>,
    pub duration: Duration,
    start_time: Instant,
}

impl RunReport {
    pub fn new() -> Self {
        Self {
            processed: 0,
            duplicates_removed: 0,
            files_extracted: 0,
            flatten: FlattenStats::default(),
            failures: Vec::new(),
            roots_scanned: 0,
            missing_roots: Vec::new(),
            companies_scanned: 0,
            cancelled: false,
            current_archive: None,
            started_at: Local::now(),
            duration: Duration::ZERO,
            start_time: Instant::now(),
        }
    }

    pub fn record_success(&mut self, outcome: &ArchiveOutcome) {
        self.processed += 1;
        self.files_extracted += outcome.files_extracted;
        self.flatten.absorb(outcome.flatten);
        if outcome.backup.is_duplicate() {
            self.duplicates_removed += 1;
        }
    }

    pub fn record_failure(&mut self, path: PathBuf, stage: FailureStage, error: ArchSweepError) {
        self.failures.push(ArchiveFailure { path, stage, error });
    }

    pub fn finish(&mut self) {
        self.current_archive = None;
        self.duration = self.start_time.elapsed();
    }

    /// Archives that were found but stopped partway through.
    pub fn failed_archives(&self) -> usize {
        self.failures
            .iter()
            .filter(|failure| failure.stage != FailureStage::Enumerate)
            .count()
    }

    /// Roots, companies or year and month folders that could not be listed.
    pub fn unreadable_folders(&self) -> usize {
        self.failures.len() - self.failed_archives()
    }

    pub fn outcome(&self) -> RunOutcome {
        if self.cancelled {
            RunOutcome::Cancelled {
                processed: self.processed,
            }
        } else if !self.failures.is_empty() {
            RunOutcome::CompletedWithFailures {
                processed: self.processed,
                failed: self.failed_archives(),
                unreadable: self.unreadable_folders(),
            }
        } else if self.processed > 0 {
            RunOutcome::Processed(self.processed)
        } else {
            RunOutcome::NothingFound
        }
    }

    /// True when every configured root was missing.
    pub fn no_usable_roots(&self) -> bool {
        self.roots_scanned == 0 && !self.missing_roots.is_empty()
    }

    pub fn summary_line(&self) -> String {
        match self.outcome() {
            RunOutcome::Processed(n) => format!("processed {}", archives(n)),
            RunOutcome::NothingFound => "no archives found".to_string(),
            RunOutcome::CompletedWithFailures {
                processed,
                failed,
                unreadable,
            } => {
                let mut line = format!("processed {}", archives(processed));
                if failed > 0 {
                    line.push_str(&format!(", {} failed", failed));
                }
                if unreadable > 0 {
                    line.push_str(&format!(", {} unreadable", folders(unreadable)));
                }
                line
            }
            RunOutcome::Cancelled { processed } => {
                format!("cancelled after processing {}", archives(processed))
            }
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self.outcome() {
            RunOutcome::Cancelled { .. } => 130,
            RunOutcome::CompletedWithFailures { .. } => 2,
            _ if self.no_usable_roots() => 3,
            _ => 0,
        }
    }
}

impl Default for RunReport {
    fn default() -> Self {
        Self::new()
    }
}

fn archives(n: usize) -> String {
    if n == 1 {
        "1 archive".to_string()
    } else {
        format!("{} archives", n)
    }
}

fn folders(n: usize) -> String {
    if n == 1 {
        "1 folder".to_string()
    } else {
        format!("{} folders", n)
    }
}
