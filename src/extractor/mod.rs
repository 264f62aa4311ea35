pub mod archive_extractor;
pub mod backup_mover;
pub mod flattener;

pub use archive_extractor::{ArchiveCodec, Extractor, RarCodec, ScratchArea, ZipCodec};
pub use backup_mover::{BackupMover, BackupOutcome};
pub use flattener::{FlattenStats, Flattener};
