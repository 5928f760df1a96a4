use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Files are fed to the hasher in chunks of this size so memory use stays
/// bounded regardless of file size.
const CHUNK_SIZE: usize = 1 << 20;

#[derive(Debug, thiserror::Error)]
pub enum ChecksumError {
    #[error("IO error: {0}")]
    Io(std::io::Error),
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),
    #[error("Not a regular file: {0}")]
    NotAFile(PathBuf),
    #[error("File modified during checksumming: {0}")]
    ConcurrentModification(PathBuf),
}

#[derive(Debug, thiserror::Error)]
#[error("Invalid digest {0:?}: expected 64 lowercase hex characters")]
pub struct InvalidDigest(String);

/// Hex encoded SHA-256 of a file's content.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Digest(String);

impl Digest {
    pub const HEX_LEN: usize = 64;

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First `len` characters, for display in narrow columns.
    pub fn short(&self, len: usize) -> &str {
        &self.0[..len.min(Self::HEX_LEN)]
    }
}

impl TryFrom<String> for Digest {
    type Error = InvalidDigest;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let well_formed = value.len() == Self::HEX_LEN
            && value
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        if well_formed {
            Ok(Digest(value))
        } else {
            Err(InvalidDigest(value))
        }
    }
}

impl std::str::FromStr for Digest {
    type Err = InvalidDigest;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Digest::try_from(s.to_string())
    }
}

impl From<Digest> for String {
    fn from(digest: Digest) -> Self {
        digest.0
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn finish(hasher: Sha256) -> Digest {
    Digest(format!("{:x}", hasher.finalize()))
}

/// Digest of an in-memory buffer; identical to hashing a file with the
/// same bytes.
#[allow(dead_code)]
pub fn digest_bytes(bytes: &[u8]) -> Digest {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    finish(hasher)
}

fn classify_io(path: &Path, e: std::io::Error) -> ChecksumError {
    if e.kind() == std::io::ErrorKind::PermissionDenied {
        ChecksumError::PermissionDenied(path.to_path_buf())
    } else {
        ChecksumError::Io(e)
    }
}

/// Hashes the content of the regular file at `path`.
///
/// The mtime is sampled before and after reading; if it moved, the digest
/// may mix two versions of the file and `ConcurrentModification` is
/// returned instead. A matching mtime does *not* prove the file was left
/// alone, only that no change was noticed.
///
/// # Errors
/// - `ChecksumError::Io`: the file is gone or reading failed
/// - `ChecksumError::PermissionDenied`: the file cannot be opened for reading
/// - `ChecksumError::NotAFile`: symlinks, directories, FIFOs, sockets and devices
/// - `ChecksumError::ConcurrentModification`: see above
pub fn checksum_file(path: &Path) -> Result<Digest, ChecksumError> {
    // Links are never followed: the content behind one belongs to its target.
    let metadata_before = std::fs::symlink_metadata(path).map_err(|e| classify_io(path, e))?;
    if !metadata_before.file_type().is_file() {
        return Err(ChecksumError::NotAFile(path.to_path_buf()));
    }
    let mtime_before = metadata_before.modified().map_err(ChecksumError::Io)?;

    let mut file = File::open(path).map_err(|e| classify_io(path, e))?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; CHUNK_SIZE];

    loop {
        let bytes_read = file.read(&mut buffer).map_err(ChecksumError::Io)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    let metadata_after = std::fs::symlink_metadata(path).map_err(ChecksumError::Io)?;
    let mtime_after = metadata_after.modified().map_err(ChecksumError::Io)?;

    if mtime_before != mtime_after {
        return Err(ChecksumError::ConcurrentModification(path.to_path_buf()));
    }

    let digest = finish(hasher);

    debug!("Checksum of {} is {}", path.display(), digest);

    Ok(digest)
}

/// Digest of the file at `path`, or `None` if it could not be computed.
///
/// Unreadable, vanished, non-regular and racing files are all reported as
/// absent so that one bad file never blocks monitoring of the rest of the
/// tree. The reason is only logged.
pub fn fingerprint(path: &Path) -> Option<Digest> {
    match checksum_file(path) {
        Ok(digest) => Some(digest),
        Err(e) => {
            debug!("No digest for {}: {}", path.display(), e);
            None
        }
    }
}
