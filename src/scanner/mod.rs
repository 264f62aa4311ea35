pub mod archive_matcher;
pub mod path_enumerator;

pub use archive_matcher::{ArchiveFile, ArchiveKind, ArchiveMatcher, ARCHIVE_NAME_PATTERN};
pub use path_enumerator::{discover_companies, ArchiveEnumerator};
