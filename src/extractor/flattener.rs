use crate::config::{CollisionPolicy, FlattenConfig};
use crate::error::{ArchSweepError, Result};
use crate::extractor::archive_extractor::ScratchArea;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlattenStats {
    /// Tracked files now in the destination, including renamed and overwritten ones.
    pub moved: usize,
    pub renamed: usize,
    pub overwritten: usize,
    /// Tracked files dropped because the destination already had that name.
    pub skipped: usize,
    /// Files of other kinds, discarded with the scratch tree.
    pub ignored: usize,
}

impl FlattenStats {
    pub fn absorb(&mut self, other: FlattenStats) {
        self.moved += other.moved;
        self.renamed += other.renamed;
        self.overwritten += other.overwritten;
        self.skipped += other.skipped;
        self.ignored += other.ignored;
    }
}

pub struct Flattener {
    tracked_extensions: Vec<String>,
    on_collision: CollisionPolicy,
}

impl Flattener {
    pub fn new(config: &FlattenConfig) -> Self {
        Self {
            tracked_extensions: config
                .tracked_extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_lowercase())
                .collect(),
            on_collision: config.on_collision,
        }
    }

    pub fn is_tracked(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| self.tracked_extensions.contains(&e.to_lowercase()))
            .unwrap_or(false)
    }

    /// Moves tracked files out of `scratch` into `destination` without their
    /// subdirectories, then deletes the scratch tree.
    pub fn flatten(&self, scratch: ScratchArea, destination: &Path) -> Result<FlattenStats> {
        let stats = self.relocate_tracked(scratch.path(), destination)?;
        scratch.remove()?;
        Ok(stats)
    }

    fn relocate_tracked(&self, root: &Path, destination: &Path) -> Result<FlattenStats> {
        let mut stats = FlattenStats::default();
        // Explicit worklist keeps stack depth flat on deeply nested archives.
        let mut pending: Vec<PathBuf> = vec![root.to_path_buf()];

        while let Some(dir) = pending.pop() {
            let entries = match fs::read_dir(&dir) {
                Ok(entries) => entries,
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(source) => return Err(ArchSweepError::Flatten { path: dir, source }),
            };

            for entry in entries {
                let entry = entry.map_err(|source| ArchSweepError::Flatten {
                    path: dir.clone(),
                    source,
                })?;
                let path = entry.path();
                let file_type = entry.file_type().map_err(|source| ArchSweepError::Flatten {
                    path: path.clone(),
                    source,
                })?;

                if file_type.is_dir() {
                    pending.push(path);
                } else if file_type.is_file() && self.is_tracked(&path) {
                    self.place(&path, destination, &mut stats)?;
                } else {
                    stats.ignored += 1;
                }
            }
        }

        Ok(stats)
    }

    fn place(&self, source: &Path, destination: &Path, stats: &mut FlattenStats) -> Result<()> {
        let file_name = source
            .file_name()
            .ok_or_else(|| ArchSweepError::InvalidPath {
                path: source.display().to_string(),
            })?;

        let mut target = destination.join(file_name);
        let mut overwriting = false;

        if target.exists() {
            match self.on_collision {
                CollisionPolicy::Skip => {
                    tracing::warn!(file = %target.display(), "destination already has this file, skipping");
                    stats.skipped += 1;
                    return Ok(());
                }
                // The move replaces the old file in one step, so a failed
                // move leaves it untouched.
                CollisionPolicy::Overwrite => {
                    tracing::info!(file = %target.display(), "overwriting existing file");
                    overwriting = true;
                }
                CollisionPolicy::Rename => {
                    target = unique_destination(destination, Path::new(file_name));
                    tracing::info!(file = %target.display(), "name taken, storing under new name");
                    stats.renamed += 1;
                }
            }
        }

        move_file(source, &target).map_err(|source_err| ArchSweepError::Flatten {
            path: source.to_path_buf(),
            source: source_err,
        })?;
        if overwriting {
            stats.overwritten += 1;
        }
        stats.moved += 1;
        Ok(())
    }
}

fn move_file(source: &Path, target: &Path) -> io::Result<()> {
    match fs::rename(source, target) {
        Ok(()) => Ok(()),
        Err(_) => {
            fs::copy(source, target)?;
            fs::remove_file(source)
        }
    }
}

/// `name (1).ext`, `name (2).ext`, ... whichever is free first.
fn unique_destination(dir: &Path, file_name: &Path) -> PathBuf {
    let stem = file_name
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let extension = file_name
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    let mut counter = 1;
    loop {
        let candidate = dir.join(format!("{} ({}){}", stem, counter, extension));
        if !candidate.exists() {
            return candidate;
        }
        counter += 1;
    }
}
