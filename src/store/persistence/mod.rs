// On-disk layout of a vector store: `index.bin` holds the vectors, `meta.json` holds
// the index-aligned chunk metadata. The two files are always written and read together.


use std::fs::{self, File};
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::{ChunkMetadata, StoreError, StoredChunk};

pub(crate) const INDEX_FILE: &str = "index.bin";
pub(crate) const METADATA_FILE: &str = "meta.json";

const MAGIC: &[u8; 4] = b"RAGV";
const FORMAT_VERSION: u32 = 1;
// magic + version + dimension + count
const HEADER_LEN: usize = 4 + 4 + 4 + 8;

pub(crate) fn index_path(dir: &Path) -> PathBuf {
    dir.join(INDEX_FILE)
}

pub(crate) fn metadata_path(dir: &Path) -> PathBuf {
    dir.join(METADATA_FILE)
}

/// Load persisted records, or `None` when nothing has been persisted yet
pub(crate) fn load(dir: &Path, dimension: usize) -> Result<Option<Vec<StoredChunk>>, StoreError> {
    let index_path = index_path(dir);
    let metadata_path = metadata_path(dir);

    match (index_path.exists(), metadata_path.exists()) {
        (false, false) => return Ok(None),
        (true, false) => {
            return Err(StoreError::Corrupt(format!(
                "{} exists without {}",
                INDEX_FILE, METADATA_FILE
            )));
        }
        (false, true) => {
            return Err(StoreError::Corrupt(format!(
                "{} exists without {}",
                METADATA_FILE, INDEX_FILE
            )));
        }
        (true, true) => {}
    }

    let index_bytes = fs::read(&index_path)?;
    let (stored_dimension, vectors) = decode_index(&index_bytes)?;
    if stored_dimension != dimension {
        return Err(StoreError::DimensionMismatch {
            expected: dimension,
            actual: stored_dimension,
        });
    }

    let metadata_json = fs::read_to_string(&metadata_path)?;
    let metadatas: Vec<ChunkMetadata> = serde_json::from_str(&metadata_json)?;

    if metadatas.len() != vectors.len() {
        return Err(StoreError::Corrupt(format!(
            "{} holds {} vectors but {} holds {} records",
            INDEX_FILE,
            vectors.len(),
            METADATA_FILE,
            metadatas.len()
        )));
    }

    let records = vectors
        .into_iter()
        .zip(metadatas)
        .map(|(vector, metadata)| StoredChunk { vector, metadata })
        .collect::<Vec<_>>();

    debug!("Loaded {} records from {}", records.len(), dir.display());
    Ok(Some(records))
}

/// Dimension recorded in the index header, if a readable index exists
pub(crate) fn stored_dimension(dir: &Path) -> Option<usize> {
    let mut header = [0u8; HEADER_LEN];
    File::open(index_path(dir))
        .and_then(|mut file| file.read_exact(&mut header))
        .ok()?;

    if &header[0..4] != MAGIC || read_u32(&header[4..8]) != FORMAT_VERSION {
        return None;
    }

    match read_u32(&header[8..12]) as usize {
        0 => None,
        dimension => Some(dimension),
    }
}

/// Write both files. Each is staged in a temporary sibling and renamed into place.
///
/// The previous `index.bin` is kept as a hard-linked backup until `meta.json` has been
/// replaced too; if that last rename fails the backup is moved back, so the pair on disk
/// still matches.
pub(crate) fn save(dir: &Path, dimension: usize, records: &[StoredChunk]) -> Result<(), StoreError> {
    let index_bytes = encode_index(dimension, records);
    let metadatas: Vec<&ChunkMetadata> = records.iter().map(|r| &r.metadata).collect();
    let metadata_json = serde_json::to_vec(&metadatas)?;

    let index_path = index_path(dir);
    let index_tmp = dir.join(format!("{}.tmp", INDEX_FILE));
    let metadata_tmp = dir.join(format!("{}.tmp", METADATA_FILE));
    let index_backup = dir.join(format!("{}.bak", INDEX_FILE));

    let staged =
        fs::write(&index_tmp, index_bytes).and_then(|()| fs::write(&metadata_tmp, metadata_json));
    if let Err(e) = staged {
        discard(&[&index_tmp, &metadata_tmp]);
        return Err(e.into());
    }

    let had_index = index_path.exists();
    if had_index {
        discard(&[&index_backup]);
        let backed_up = fs::hard_link(&index_path, &index_backup)
            .or_else(|_| fs::copy(&index_path, &index_backup).map(|_| ()));
        if let Err(e) = backed_up {
            discard(&[&index_tmp, &metadata_tmp, &index_backup]);
            return Err(e.into());
        }
    }

    if let Err(e) = fs::rename(&index_tmp, &index_path) {
        discard(&[&index_tmp, &metadata_tmp, &index_backup]);
        return Err(e.into());
    }

    if let Err(e) = fs::rename(&metadata_tmp, metadata_path(dir)) {
        let restored = if had_index {
            fs::rename(&index_backup, &index_path)
        } else {
            fs::remove_file(&index_path)
        };
        if let Err(restore_error) = restored {
            warn!(
                "Failed to restore {} after a failed write: {}",
                index_path.display(),
                restore_error
            );
        }
        discard(&[&metadata_tmp, &index_backup]);
        return Err(e.into());
    }

    discard(&[&index_backup]);
    debug!("Persisted {} records to {}", records.len(), dir.display());
    Ok(())
}

fn discard(paths: &[&Path]) {
    for path in paths {
        match fs::remove_file(path) {
            Err(e) if e.kind() != ErrorKind::NotFound => {
                warn!("Failed to remove {}: {}", path.display(), e);
            }
            _ => {}
        }
    }
}

/// Delete both files; files that are already gone are fine
pub(crate) fn remove(dir: &Path) -> Result<(), StoreError> {
    for path in [index_path(dir), metadata_path(dir)] {
        match fs::remove_file(&path) {
            Ok(()) => debug!("Removed {}", path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

fn encode_index(dimension: usize, records: &[StoredChunk]) -> Vec<u8> {
    let mut bytes =
        Vec::with_capacity(HEADER_LEN + records.len() * dimension * size_of::<f32>());

    bytes.extend_from_slice(MAGIC);
    bytes.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    bytes.extend_from_slice(&(dimension as u32).to_le_bytes());
    bytes.extend_from_slice(&(records.len() as u64).to_le_bytes());

    for record in records {
        for value in &record.vector {
            bytes.extend_from_slice(&value.to_le_bytes());
        }
    }

    bytes
}

fn decode_index(bytes: &[u8]) -> Result<(usize, Vec<Vec<f32>>), StoreError> {
    let Some((header, payload)) = bytes.split_at_checked(HEADER_LEN) else {
        return Err(StoreError::Corrupt(format!(
            "index header truncated ({} bytes)",
            bytes.len()
        )));
    };

    if &header[0..4] != MAGIC {
        return Err(StoreError::Corrupt("bad index magic".to_string()));
    }

    let version = read_u32(&header[4..8]);
    if version != FORMAT_VERSION {
        return Err(StoreError::Corrupt(format!(
            "unsupported index format version {}",
            version
        )));
    }

    let dimension = read_u32(&header[8..12]) as usize;
    let count = usize::try_from(read_u64(&header[12..20]))
        .map_err(|_| StoreError::Corrupt("index count overflows".to_string()))?;

    if dimension == 0 {
        return Err(StoreError::Corrupt("index dimension is zero".to_string()));
    }

    let expected_len = count
        .checked_mul(dimension)
        .and_then(|values| values.checked_mul(size_of::<f32>()))
        .ok_or_else(|| StoreError::Corrupt("index size overflows".to_string()))?;

    if payload.len() != expected_len {
        return Err(StoreError::Corrupt(format!(
            "index payload is {} bytes, expected {}",
            payload.len(),
            expected_len
        )));
    }

    let vectors = payload
        .chunks_exact(dimension * size_of::<f32>())
        .map(|row| {
            row.chunks_exact(size_of::<f32>())
                .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
                .collect()
        })
        .collect();

    Ok((dimension, vectors))
}

fn read_u32(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

fn read_u64(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&bytes[..8]);
    u64::from_le_bytes(buf)
}
