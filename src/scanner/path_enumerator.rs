use crate::error::{ArchSweepError, Result};
use crate::scanner::archive_matcher::{ArchiveFile, ArchiveMatcher};
use std::fs::{self, DirEntry, ReadDir};
use std::iter::FusedIterator;
use std::path::{Path, PathBuf};

/// Lazily walks `<company>/<year>/<month>/` and yields candidate archives.
///
/// Year folders are read one at a time as the iterator advances. A month
/// folder is listed once, when the enumerator enters it, so archives moved
/// out of the month while it is being processed are never seen twice.
///
/// The sequence is single-pass: once it returns `None` it stays exhausted.
/// Build a new enumerator to rescan the tree. Order follows the filesystem
/// (archives inside a single month are sorted by name) and is not chronological.
///
/// An unreadable directory yields one `Err` item; enumeration then carries on
/// with its siblings.
pub struct ArchiveEnumerator<'m> {
    matcher: &'m ArchiveMatcher,
    company: PathBuf,
    skip_names: Vec<String>,
    state: State,
    years: Option<ReadDir>,
    months: Option<(PathBuf, ReadDir)>,
    pending: std::vec::IntoIter<ArchiveFile>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    NotStarted,
    Running,
    Exhausted,
}

impl<'m> ArchiveEnumerator<'m> {
    pub fn new<P: Into<PathBuf>>(company: P, matcher: &'m ArchiveMatcher) -> Self {
        Self {
            matcher,
            company: company.into(),
            skip_names: Vec::new(),
            state: State::NotStarted,
            years: None,
            months: None,
            pending: Vec::new().into_iter(),
        }
    }

    /// Folder names at the year level that are not year folders (backup, destination).
    pub fn with_skipped_folders<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skip_names.extend(names.into_iter().map(Into::into));
        self
    }

    fn is_year_folder(&self, entry: &DirEntry) -> bool {
        if !is_directory(entry) {
            return false;
        }

        let name = entry.file_name();
        let name = name.to_string_lossy();
        !name.starts_with('.') && !self.skip_names.iter().any(|skip| skip.as_str() == name)
    }
}

impl Iterator for ArchiveEnumerator<'_> {
    type Item = Result<ArchiveFile>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(archive) = self.pending.next() {
                return Some(Ok(archive));
            }

            match self.state {
                State::Exhausted => return None,
                State::NotStarted => {
                    self.state = State::Running;
                    match fs::read_dir(&self.company) {
                        Ok(years) => self.years = Some(years),
                        Err(source) => {
                            self.state = State::Exhausted;
                            return Some(Err(ArchSweepError::Enumeration {
                                path: self.company.clone(),
                                source,
                            }));
                        }
                    }
                }
                State::Running => {}
            }

            if let Some((year_path, months)) = self.months.as_mut() {
                match months.next() {
                    Some(Ok(entry)) => {
                        if is_directory(&entry) {
                            match list_month(self.matcher, &entry.path()) {
                                Ok(archives) => self.pending = archives.into_iter(),
                                Err(e) => return Some(Err(e)),
                            }
                        }
                    }
                    Some(Err(source)) => {
                        return Some(Err(ArchSweepError::Enumeration {
                            path: year_path.clone(),
                            source,
                        }))
                    }
                    None => self.months = None,
                }
                continue;
            }

            let Some(years) = self.years.as_mut() else {
                self.state = State::Exhausted;
                return None;
            };

            match years.next() {
                Some(Ok(entry)) => {
                    if !self.is_year_folder(&entry) {
                        continue;
                    }
                    let year_path = entry.path();
                    match fs::read_dir(&year_path) {
                        Ok(months) => self.months = Some((year_path, months)),
                        Err(source) => {
                            return Some(Err(ArchSweepError::Enumeration {
                                path: year_path,
                                source,
                            }))
                        }
                    }
                }
                Some(Err(source)) => {
                    return Some(Err(ArchSweepError::Enumeration {
                        path: self.company.clone(),
                        source,
                    }))
                }
                None => {
                    self.years = None;
                    self.state = State::Exhausted;
                    return None;
                }
            }
        }
    }
}

impl FusedIterator for ArchiveEnumerator<'_> {}

fn list_month(matcher: &ArchiveMatcher, month: &Path) -> Result<Vec<ArchiveFile>> {
    let entries = fs::read_dir(month).map_err(|source| ArchSweepError::Enumeration {
        path: month.to_path_buf(),
        source,
    })?;

    let mut archives = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(month = %month.display(), error = %e, "skipping unreadable entry");
                continue;
            }
        };

        let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
        if !is_file {
            continue;
        }

        if let Some(archive) = matcher.match_path(&entry.path()) {
            archives.push(archive);
        }
    }

    archives.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    tracing::trace!(month = %month.display(), count = archives.len(), "listed month folder");
    Ok(archives)
}

/// Symlinked folders count when their target is a directory.
fn is_directory(entry: &DirEntry) -> bool {
    match entry.file_type() {
        Ok(file_type) if file_type.is_symlink() => entry.path().is_dir(),
        Ok(file_type) => file_type.is_dir(),
        Err(_) => false,
    }
}

/// Immediate, non-hidden subdirectories of `root`, sorted by name.
pub fn discover_companies(root: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(root).map_err(|source| ArchSweepError::Enumeration {
        path: root.to_path_buf(),
        source,
    })?;

    let mut companies = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| ArchSweepError::Enumeration {
            path: root.to_path_buf(),
            source,
        })?;

        if is_directory(&entry) && !entry.file_name().to_string_lossy().starts_with('.') {
            companies.push(entry.path());
        }
    }

    companies.sort();
    Ok(companies)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"x").unwrap();
    }

    fn names(enumerator: ArchiveEnumerator<'_>) -> Vec<String> {
        let mut names: Vec<String> = enumerator.map(|a| a.unwrap().file_name).collect();
        names.sort();
        names
    }

    #[test]
    fn test_enumerates_year_and_month_folders() {
        let temp_dir = TempDir::new().unwrap();
        let company = temp_dir.path().join("Acme");
        touch(&company.join("2023/12/2023_12_01_a.zip"));
        touch(&company.join("2024/01/2024_01_15_b.rar"));
        touch(&company.join("2024/02/2024_02_01_c.zip"));
        touch(&company.join("2024/02/notes.txt"));
        touch(&company.join("2024/02/invoice_2024.zip"));

        let matcher = ArchiveMatcher::new();
        let found = names(ArchiveEnumerator::new(&company, &matcher));

        assert_eq!(
            found,
            vec!["2023_12_01_a.zip", "2024_01_15_b.rar", "2024_02_01_c.zip"]
        );
    }

    #[test]
    fn test_skips_non_directory_siblings() {
        let temp_dir = TempDir::new().unwrap();
        let company = temp_dir.path().join("Acme");
        // Archives sitting at the year or company level are not in a month folder.
        touch(&company.join("2024_01_01_company_level.zip"));
        touch(&company.join("2024/2024_01_02_year_level.zip"));
        touch(&company.join("2024/01/2024_01_03_month_level.zip"));
        // A directory whose name matches the pattern is not an archive.
        fs::create_dir_all(company.join("2024/01/2024_01_04_dir.zip")).unwrap();

        let matcher = ArchiveMatcher::new();
        let found = names(ArchiveEnumerator::new(&company, &matcher));

        assert_eq!(found, vec!["2024_01_03_month_level.zip"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_follows_symlinked_year_and_month_folders() {
        use std::os::unix::fs::symlink;

        let temp_dir = TempDir::new().unwrap();
        let company = temp_dir.path().join("Acme");
        let storage = temp_dir.path().join("storage");
        touch(&storage.join("2023/12/2023_12_01_a.zip"));
        touch(&storage.join("march/2024_03_01_b.zip"));
        touch(&company.join("2024/01/2024_01_15_c.zip"));
        symlink(storage.join("2023"), company.join("2023")).unwrap();
        symlink(storage.join("march"), company.join("2024/03")).unwrap();
        // Links to files or to nothing are still not folders.
        symlink(storage.join("2023/12/2023_12_01_a.zip"), company.join("2022")).unwrap();
        symlink(temp_dir.path().join("missing"), company.join("2021")).unwrap();

        let matcher = ArchiveMatcher::new();
        let found = names(ArchiveEnumerator::new(&company, &matcher));

        assert_eq!(
            found,
            vec!["2023_12_01_a.zip", "2024_01_15_c.zip", "2024_03_01_b.zip"]
        );
    }

    #[test]
    fn test_skips_reserved_and_hidden_folders() {
        let temp_dir = TempDir::new().unwrap();
        let company = temp_dir.path().join("Acme");
        touch(&company.join("backup/01/2024_01_01_old.zip"));
        touch(&company.join(".cache/01/2024_01_01_hidden.zip"));
        touch(&company.join("2024/01/2024_01_02_new.zip"));

        let matcher = ArchiveMatcher::new();
        let found = names(
            ArchiveEnumerator::new(&company, &matcher).with_skipped_folders(["backup"]),
        );

        assert_eq!(found, vec!["2024_01_02_new.zip"]);
    }

    #[test]
    fn test_never_yields_duplicates() {
        let temp_dir = TempDir::new().unwrap();
        let company = temp_dir.path().join("Acme");
        for year in ["2022", "2023", "2024"] {
            for month in ["01", "02", "03"] {
                touch(&company.join(format!("{year}/{month}/{year}_{month}_01_a.zip")));
                touch(&company.join(format!("{year}/{month}/{year}_{month}_02_b.rar")));
            }
        }

        let matcher = ArchiveMatcher::new();
        let paths: Vec<PathBuf> = ArchiveEnumerator::new(&company, &matcher)
            .map(|a| a.unwrap().path)
            .collect();
        let unique: HashSet<&PathBuf> = paths.iter().collect();

        assert_eq!(paths.len(), 18);
        assert_eq!(unique.len(), paths.len());
    }

    #[test]
    fn test_is_single_pass() {
        let temp_dir = TempDir::new().unwrap();
        let company = temp_dir.path().join("Acme");
        touch(&company.join("2024/01/2024_01_15_a.zip"));

        let matcher = ArchiveMatcher::new();
        let mut enumerator = ArchiveEnumerator::new(&company, &matcher);
        assert!(enumerator.next().is_some());
        assert!(enumerator.next().is_none());

        touch(&company.join("2024/01/2024_01_16_b.zip"));
        assert!(enumerator.next().is_none());
    }

    #[test]
    fn test_is_lazy_across_months() {
        let temp_dir = TempDir::new().unwrap();
        let company = temp_dir.path().join("Acme");
        touch(&company.join("2024/01/2024_01_15_a.zip"));

        let matcher = ArchiveMatcher::new();
        let mut enumerator = ArchiveEnumerator::new(&company, &matcher);
        let first = enumerator.next().unwrap().unwrap();

        // Moving the archive away mid-enumeration does not disturb the walk.
        fs::remove_file(&first.path).unwrap();
        assert!(enumerator.next().is_none());
    }

    #[test]
    fn test_missing_company_yields_single_error() {
        let temp_dir = TempDir::new().unwrap();
        let matcher = ArchiveMatcher::new();
        let mut enumerator = ArchiveEnumerator::new(temp_dir.path().join("Nope"), &matcher);

        assert!(matches!(
            enumerator.next(),
            Some(Err(ArchSweepError::Enumeration { .. }))
        ));
        assert!(enumerator.next().is_none());
    }

    #[test]
    fn test_discover_companies() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("Zeta")).unwrap();
        fs::create_dir_all(temp_dir.path().join("Acme")).unwrap();
        fs::create_dir_all(temp_dir.path().join(".trash")).unwrap();
        fs::write(temp_dir.path().join("readme.txt"), b"hi").unwrap();

        let companies = discover_companies(temp_dir.path()).unwrap();
        let names: Vec<_> = companies
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();

        assert_eq!(names, vec!["Acme", "Zeta"]);
    }
}
