use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArchSweepError {
    #[error("IO operation failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Path validation failed: {path}")]
    InvalidPath { path: String },

    #[error("No root directories configured")]
    NoRoots,

    #[error("Unsupported archive kind '{extension}': {}", .path.display())]
    UnsupportedArchiveKind { path: PathBuf, extension: String },

    #[error("Corrupt or unreadable archive {}: {message}", .path.display())]
    CorruptArchive { path: PathBuf, message: String },

    #[error("Failed to create directory {}", .path.display())]
    DirectoryCreation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write extracted entry {}", .path.display())]
    Extraction {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to flatten {}", .path.display())]
    Flatten {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to move {} into {}", .archive.display(), .backup_dir.display())]
    BackupMove {
        archive: PathBuf,
        backup_dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read directory {}", .path.display())]
    Enumeration {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Operation was cancelled by user")]
    Cancelled,
}

pub trait UserFriendlyError {
    fn user_message(&self) -> String;
    fn suggestion(&self) -> Option<String>;
}

impl UserFriendlyError for ArchSweepError {
    fn user_message(&self) -> String {
        match self {
            ArchSweepError::Config { message } => {
                format!("Configuration error: {}", message)
            }
            ArchSweepError::InvalidPath { path } => {
                format!("Invalid path: {}", path)
            }
            ArchSweepError::NoRoots => {
                "No root directories to scan".to_string()
            }
            ArchSweepError::CorruptArchive { path, message } => {
                format!("Could not read archive {}: {}", path.display(), message)
            }
            ArchSweepError::DirectoryCreation { path, source }
            | ArchSweepError::Flatten { path, source }
            | ArchSweepError::Extraction { path, source }
            | ArchSweepError::Enumeration { path, source } => {
                format!("{}: {} ({})", self, source, path.display())
            }
            ArchSweepError::BackupMove { source, .. } => {
                format!("{}: {}", self, source)
            }
            _ => self.to_string(),
        }
    }

    fn suggestion(&self) -> Option<String> {
        match self {
            ArchSweepError::Config { .. } => Some(
                "Check your configuration file syntax, or run with --generate-config to create a fresh one.".to_string()
            ),
            ArchSweepError::NoRoots => Some(
                "Pass one or more root directories as arguments, set ARCHSWEEP_ROOTS, or add [scan] roots to the config file.".to_string()
            ),
            ArchSweepError::CorruptArchive { .. } => Some(
                "The archive was left in place. Inspect or re-download it, then run again.".to_string()
            ),
            ArchSweepError::DirectoryCreation { .. } | ArchSweepError::BackupMove { .. } => Some(
                "Ensure you have write permission and free space in the company folder.".to_string()
            ),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ArchSweepError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_friendly_messages() {
        let error = ArchSweepError::NoRoots;
        assert!(error.user_message().contains("No root directories"));
        assert!(error.suggestion().is_some());
    }

    #[test]
    fn test_backup_move_message_includes_cause() {
        let error = ArchSweepError::BackupMove {
            archive: PathBuf::from("2024/01/2024_01_15_a.zip"),
            backup_dir: PathBuf::from("backup"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        let message = error.user_message();
        assert!(message.contains("2024_01_15_a.zip"));
        assert!(message.contains("denied"));
    }
}
