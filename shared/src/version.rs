use serde::{Deserialize, Serialize};

/// File metadata that identifies one revision of a snapshot file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotFileStamp {
    pub name: String,
    pub len: u64,
    /// Modification time in seconds since the Unix epoch, 0 when unknown.
    pub modified_secs: i64,
}

/// Opaque token that changes whenever any snapshot file is added, removed or rewritten.
///
/// Order-independent: stamps are hashed sorted by name.
pub fn data_version(stamps: &[SnapshotFileStamp]) -> u32 {
    let mut sorted: Vec<&SnapshotFileStamp> = stamps.iter().collect();
    sorted.sort_by(|a, b| a.name.cmp(&b.name));

    let mut hasher = crc32fast::Hasher::new();
    for stamp in sorted {
        hasher.update(stamp.name.as_bytes());
        hasher.update(&[0]);
        hasher.update(&stamp.len.to_le_bytes());
        hasher.update(&stamp.modified_secs.to_le_bytes());
    }
    hasher.finalize()
}
