use crate::error::{ArchSweepError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub layout: LayoutConfig,
    #[serde(default)]
    pub flatten: FlattenConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ScanConfig {
    /// Already-resolved root directories; each holds one folder per company.
    #[serde(default)]
    pub roots: Vec<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub mode: DestinationLayout,
    pub destination_dir: String,
    pub backup_dir: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FlattenConfig {
    pub tracked_extensions: Vec<String>,
    pub on_collision: CollisionPolicy,
}

/// Where flattened files end up inside a company folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum DestinationLayout {
    /// `<company>/<destination_dir>/`, shared by every archive of the company.
    Shared,
    /// `<company>/<archive stem>/`, one folder per archive.
    PerArchive,
}

/// What the flattener does when the destination already holds a file of the same name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum CollisionPolicy {
    /// Keep both; the incoming file gets a ` (n)` suffix.
    Rename,
    Overwrite,
    /// Keep the existing file and drop the incoming one.
    Skip,
}

impl fmt::Display for DestinationLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DestinationLayout::Shared => write!(f, "shared"),
            DestinationLayout::PerArchive => write!(f, "per-archive"),
        }
    }
}

impl fmt::Display for CollisionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollisionPolicy::Rename => write!(f, "rename"),
            CollisionPolicy::Overwrite => write!(f, "overwrite"),
            CollisionPolicy::Skip => write!(f, "skip"),
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            mode: DestinationLayout::Shared,
            destination_dir: "extracted".to_string(),
            backup_dir: "backup".to_string(),
        }
    }
}

impl Default for FlattenConfig {
    fn default() -> Self {
        Self {
            tracked_extensions: vec!["xml".to_string()],
            on_collision: CollisionPolicy::Rename,
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ArchSweepError::Config {
                message: format!("Configuration file not found: {}", path.display()),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| ArchSweepError::Config {
            message: format!("Failed to read config file {}: {}", path.display(), e),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ArchSweepError::Config {
            message: format!("Failed to parse config file {}: {}", path.display(), e),
        })?;

        Ok(config)
    }

    pub fn load_with_defaults<P: AsRef<Path>>(config_path: Option<P>) -> Result<Self> {
        match config_path {
            Some(path) => Self::load_from_file(path),
            None => {
                let default_paths = [
                    "archsweep.toml",
                    ".archsweep.toml",
                    "archsweep.config.toml",
                ];

                for default_path in &default_paths {
                    if Path::new(default_path).exists() {
                        return Self::load_from_file(default_path);
                    }
                }

                Ok(Self::default())
            }
        }
    }

    pub fn merge_with_cli_args(&mut self, cli_args: &CliOverrides) {
        if let Some(ref roots) = cli_args.roots {
            if !roots.is_empty() {
                self.scan.roots = roots.clone();
            }
        }

        if let Some(mode) = cli_args.layout {
            self.layout.mode = mode;
        }

        if let Some(ref name) = cli_args.destination_dir {
            self.layout.destination_dir = name.clone();
        }

        if let Some(ref name) = cli_args.backup_dir {
            self.layout.backup_dir = name.clone();
        }

        if let Some(ref tracked) = cli_args.tracked {
            self.flatten.tracked_extensions = tracked
                .split(',')
                .map(|s| s.trim().trim_start_matches('.').to_lowercase())
                .filter(|s| !s.is_empty())
                .collect();
        }

        if let Some(policy) = cli_args.on_collision {
            self.flatten.on_collision = policy;
        }
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self).map_err(|e| ArchSweepError::Config {
            message: format!("Failed to serialize config: {}", e),
        })?;

        std::fs::write(path, content).map_err(|e| ArchSweepError::Config {
            message: format!("Failed to write config file {}: {}", path.display(), e),
        })?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.flatten.tracked_extensions.is_empty() {
            return Err(ArchSweepError::Config {
                message: "At least one tracked extension must be specified".to_string(),
            });
        }

        validate_folder_name("backup_dir", &self.layout.backup_dir)?;
        validate_folder_name("destination_dir", &self.layout.destination_dir)?;

        if self.layout.mode == DestinationLayout::Shared
            && self.layout.destination_dir == self.layout.backup_dir
        {
            return Err(ArchSweepError::Config {
                message: "destination_dir and backup_dir must differ".to_string(),
            });
        }

        Ok(())
    }

    /// Folder names inside a company folder that are never year folders.
    pub fn reserved_folder_names(&self) -> Vec<String> {
        let mut names = vec![self.layout.backup_dir.clone()];
        if self.layout.mode == DestinationLayout::Shared {
            names.push(self.layout.destination_dir.clone());
        }
        names
    }

    pub fn create_sample_config() -> String {
        let mut sample_config = Self::default();
        sample_config.scan.roots = vec![PathBuf::from("/srv/archives")];
        toml::to_string_pretty(&sample_config).unwrap_or_else(|_| String::new())
    }
}

fn validate_folder_name(key: &str, name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(ArchSweepError::Config {
            message: format!("{} must not be empty", key),
        });
    }

    if name.contains('/') || name.contains('\\') || name == "." || name == ".." {
        return Err(ArchSweepError::Config {
            message: format!("{} must be a plain folder name, got '{}'", key, name),
        });
    }

    Ok(())
}

#[derive(Debug, Default)]
pub struct CliOverrides {
    pub roots: Option<Vec<PathBuf>>,
    pub layout: Option<DestinationLayout>,
    pub destination_dir: Option<String>,
    pub backup_dir: Option<String>,
    pub tracked: Option<String>,
    pub on_collision: Option<CollisionPolicy>,
}

impl CliOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_roots(mut self, roots: Option<Vec<PathBuf>>) -> Self {
        self.roots = roots;
        self
    }

    pub fn with_layout(mut self, layout: Option<DestinationLayout>) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_destination_dir(mut self, name: Option<String>) -> Self {
        self.destination_dir = name;
        self
    }

    pub fn with_backup_dir(mut self, name: Option<String>) -> Self {
        self.backup_dir = name;
        self
    }

    pub fn with_tracked(mut self, tracked: Option<String>) -> Self {
        self.tracked = tracked;
        self
    }

    pub fn with_on_collision(mut self, policy: Option<CollisionPolicy>) -> Self {
        self.on_collision = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.flatten.tracked_extensions, vec!["xml"]);
        assert_eq!(config.layout.mode, DestinationLayout::Shared);
        assert_eq!(config.layout.backup_dir, "backup");
        assert_eq!(config.flatten.on_collision, CollisionPolicy::Rename);
        assert!(config.scan.roots.is_empty());
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.flatten.tracked_extensions.clear();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.layout.backup_dir = "../elsewhere".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.layout.destination_dir = "backup".to_string();
        assert!(config.validate().is_err());

        config.layout.mode = DestinationLayout::PerArchive;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_file_operations() {
        let mut config = Config::default();
        config.layout.mode = DestinationLayout::PerArchive;
        config.scan.roots = vec![PathBuf::from("/data/in")];
        let temp_file = NamedTempFile::new().unwrap();

        config.save_to_file(temp_file.path()).unwrap();

        let loaded_config = Config::load_from_file(temp_file.path()).unwrap();
        assert_eq!(loaded_config.layout.mode, DestinationLayout::PerArchive);
        assert_eq!(loaded_config.scan.roots, vec![PathBuf::from("/data/in")]);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [flatten]
            tracked_extensions = ["xml", "csv"]
            on_collision = "skip"
            "#,
        )
        .unwrap();

        assert_eq!(config.flatten.on_collision, CollisionPolicy::Skip);
        assert_eq!(config.layout.destination_dir, "extracted");
        assert!(config.scan.roots.is_empty());
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = Config::default();

        let overrides = CliOverrides::new()
            .with_roots(Some(vec![PathBuf::from("/a"), PathBuf::from("/b")]))
            .with_layout(Some(DestinationLayout::PerArchive))
            .with_tracked(Some(".XML, csv,".to_string()))
            .with_on_collision(Some(CollisionPolicy::Overwrite));

        config.merge_with_cli_args(&overrides);

        assert_eq!(config.scan.roots.len(), 2);
        assert_eq!(config.layout.mode, DestinationLayout::PerArchive);
        assert_eq!(config.flatten.tracked_extensions, vec!["xml", "csv"]);
        assert_eq!(config.flatten.on_collision, CollisionPolicy::Overwrite);
    }

    #[test]
    fn test_empty_cli_roots_keep_file_roots() {
        let mut config = Config::default();
        config.scan.roots = vec![PathBuf::from("/from/file")];

        config.merge_with_cli_args(&CliOverrides::new().with_roots(Some(Vec::new())));

        assert_eq!(config.scan.roots, vec![PathBuf::from("/from/file")]);
    }

    #[test]
    fn test_reserved_folder_names() {
        let mut config = Config::default();
        assert_eq!(config.reserved_folder_names(), vec!["backup", "extracted"]);

        config.layout.mode = DestinationLayout::PerArchive;
        assert_eq!(config.reserved_folder_names(), vec!["backup"]);
    }

    #[test]
    fn test_sample_config_generation() {
        let sample = Config::create_sample_config();
        assert!(sample.contains("[scan]"));
        assert!(sample.contains("[layout]"));
        assert!(sample.contains("[flatten]"));
        assert!(sample.contains("per-archive") || sample.contains("shared"));
    }
}
