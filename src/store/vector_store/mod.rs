
use itertools::Itertools;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::persistence;
use super::{ChunkMetadata, SearchResult, SourceSummary, StoreError, StoredChunk};

/// Flat vector index with per-chunk metadata, persisted after every mutation.
///
/// Records are append-only: `add` extends the index and `clear` empties it. Both take
/// `&mut self`, so sharing a store between tasks requires an external lock.
#[derive(Debug)]
pub struct VectorStore {
    dir: PathBuf,
    dimension: usize,
    records: Vec<StoredChunk>,
}

impl VectorStore {
    /// Open the store persisted under `dir`, creating the directory if needed.
    ///
    /// Missing, corrupt, or differently-dimensioned state is logged and replaced by an
    /// empty index of `dimension`; only an unusable directory is an error.
    #[inline]
    pub fn open(dir: impl AsRef<Path>, dimension: usize) -> Result<Self, StoreError> {
        if dimension == 0 {
            return Err(StoreError::ZeroDimension);
        }

        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        debug!("Opening vector store at {}", dir.display());

        let records = match persistence::load(&dir, dimension) {
            Ok(Some(records)) => {
                info!(
                    "Loaded vector store with {} chunks ({} dimensions)",
                    records.len(),
                    dimension
                );
                records
            }
            Ok(None) => {
                debug!("No persisted vector store found, starting empty");
                Vec::new()
            }
            Err(e) => {
                warn!(
                    "Could not load persisted vector store at {}, starting empty: {}",
                    dir.display(),
                    e
                );
                Vec::new()
            }
        };

        Ok(Self {
            dir,
            dimension,
            records,
        })
    }

    /// Open the store under `dir` at the dimension it was persisted with, falling back
    /// to `dimension` when there is no readable index yet
    #[inline]
    pub fn open_existing(dir: impl AsRef<Path>, dimension: usize) -> Result<Self, StoreError> {
        let dir = dir.as_ref();
        let dimension = persistence::stored_dimension(dir).unwrap_or(dimension);
        Self::open(dir, dimension)
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Directory holding the persisted index
    #[inline]
    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Append vectors with their metadata and persist.
    ///
    /// The batch is validated as a whole before anything is appended. If persisting
    /// fails the append is undone in memory and the previous files are put back where the
    /// filesystem allows it; a crash between the two file renames can still leave a
    /// mismatched pair, which the next open reports as corrupt.
    #[inline]
    pub fn add(
        &mut self,
        vectors: Vec<Vec<f32>>,
        metadatas: Vec<ChunkMetadata>,
    ) -> Result<(), StoreError> {
        if vectors.len() != metadatas.len() {
            return Err(StoreError::MisalignedBatch {
                vectors: vectors.len(),
                metadata: metadatas.len(),
            });
        }

        if let Some(bad) = vectors.iter().find(|v| v.len() != self.dimension) {
            return Err(StoreError::DimensionMismatch {
                expected: self.dimension,
                actual: bad.len(),
            });
        }

        if vectors.is_empty() {
            debug!("No vectors to add");
            return Ok(());
        }

        let previous_len = self.records.len();
        self.records.extend(
            vectors
                .into_iter()
                .zip(metadatas)
                .map(|(vector, metadata)| StoredChunk { vector, metadata }),
        );

        if let Err(e) = self.persist() {
            self.records.truncate(previous_len);
            return Err(e);
        }

        info!(
            "Added {} chunks to vector store ({} total)",
            self.records.len() - previous_len,
            self.records.len()
        );
        Ok(())
    }

    /// The `k` nearest chunks by squared Euclidean distance, nearest first.
    ///
    /// Equal distances keep insertion order. An empty store or `k == 0` yields no results.
    #[inline]
    pub fn query(&self, vector: &[f32], k: usize) -> Result<Vec<SearchResult>, StoreError> {
        if vector.len() != self.dimension {
            return Err(StoreError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }

        if self.records.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(usize, f32)> = self
            .records
            .iter()
            .enumerate()
            .map(|(i, record)| (i, squared_l2(vector, &record.vector)))
            .collect();
        scored.sort_by(|a, b| a.1.total_cmp(&b.1));

        let results: Vec<SearchResult> = scored
            .into_iter()
            .take(k)
            .filter_map(|(i, distance)| {
                self.records.get(i).map(|record| SearchResult {
                    chunk_metadata: record.metadata.clone(),
                    distance,
                })
            })
            .collect();

        debug!(
            "Query returned {} of {} chunks (k = {})",
            results.len(),
            self.records.len(),
            k
        );
        Ok(results)
    }

    /// Whether either persisted file exists, readable or not
    #[inline]
    pub fn has_persisted_state(&self) -> bool {
        persistence::index_path(&self.dir).exists()
            || persistence::metadata_path(&self.dir).exists()
    }

    /// Drop every record and delete the persisted files
    #[inline]
    pub fn clear(&mut self) -> Result<(), StoreError> {
        persistence::remove(&self.dir)?;
        let removed = self.records.len();
        self.records.clear();
        info!("Cleared vector store ({} chunks removed)", removed);
        Ok(())
    }

    /// Chunk counts per source label, sorted by label
    #[inline]
    pub fn list_sources(&self) -> Vec<SourceSummary> {
        self.records
            .iter()
            .map(|record| record.metadata.source.as_str())
            .counts()
            .into_iter()
            .sorted()
            .map(|(source, chunk_count)| SourceSummary {
                source: source.to_string(),
                chunk_count,
            })
            .collect()
    }

    #[inline]
    pub fn contains_source(&self, source: &str) -> bool {
        self.records
            .iter()
            .any(|record| record.metadata.source == source)
    }

    /// Write the current records to disk
    #[inline]
    pub fn persist(&self) -> Result<(), StoreError> {
        persistence::save(&self.dir, self.dimension, &self.records)
    }
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}
