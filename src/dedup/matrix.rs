//! Similarity matrices and their cached computation

use crate::dataset::{DatasetKind, Record};
use crate::dedup::similarity::SimilarityMethod;
use crate::store::SimilarityCache;
use crate::StoreResult;
use sha2::{Digest, Sha256};

/// Symmetric n×n similarity matrix with a unit diagonal
///
/// Stored row-major; `set_pair` writes both halves so symmetry holds by
/// construction.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatrix {
    size: usize,
    values: Vec<f64>,
}

impl SimilarityMatrix {
    /// Matrix of `size` records with nothing similar but self
    pub fn identity(size: usize) -> Self {
        let mut values = vec![0.0; size * size];
        for i in 0..size {
            values[i * size + i] = 1.0;
        }
        Self { size, values }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.size + j]
    }

    /// Sets similarity of `i` and `j` in both directions
    pub fn set_pair(&mut self, i: usize, j: usize, value: f64) {
        self.values[i * self.size + j] = value;
        self.values[j * self.size + i] = value;
    }

    /// Row-major little-endian encoding
    pub fn to_le_bytes(&self) -> Vec<u8> {
        self.values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    /// Decodes [`to_le_bytes`] output; `None` if the length does not fit
    ///
    /// [`to_le_bytes`]: SimilarityMatrix::to_le_bytes
    pub fn from_le_bytes(size: usize, bytes: &[u8]) -> Option<Self> {
        let expected = size.checked_mul(size)?.checked_mul(8)?;
        if bytes.len() != expected {
            return None;
        }

        let values = bytes
            .chunks_exact(8)
            .map(|chunk| {
                let mut buf = [0u8; 8];
                buf.copy_from_slice(chunk);
                f64::from_le_bytes(buf)
            })
            .collect();
        Some(Self { size, values })
    }
}

/// Computes the full matrix over all unordered pairs of `records`
pub fn compute_similarity(records: &[Record], method: SimilarityMethod) -> SimilarityMatrix {
    let n = records.len();
    let mut matrix = SimilarityMatrix::identity(n);

    for i in 0..n {
        if i % 100 == 0 {
            tracing::debug!("{} / {} similarity rows computed", i, n);
        }
        for j in (i + 1)..n {
            matrix.set_pair(i, j, method.similarity(&records[i], &records[j]));
        }
    }

    matrix
}

/// Identity of a collection: SHA-256 over its URLs in order
pub fn collection_fingerprint(records: &[Record]) -> String {
    let mut hasher = Sha256::new();
    for record in records {
        hasher.update(record.url.as_bytes());
        hasher.update(b"\n");
    }
    hex::encode(hasher.finalize())
}

/// Returns the matrix for `records`, from the cache when it still applies
///
/// A cached matrix is reused only if its size and collection fingerprint
/// match; otherwise, or with `force`, it is recomputed and stored.
pub fn similarity_matrix(
    cache: &SimilarityCache,
    kind: DatasetKind,
    records: &[Record],
    method: SimilarityMethod,
    force: bool,
) -> StoreResult<SimilarityMatrix> {
    let fingerprint = collection_fingerprint(records);

    if !force {
        if let Some(cached) = cache.load(kind, method)? {
            if cached.matrix.size() == records.len() && cached.fingerprint == fingerprint {
                tracing::info!(
                    %kind,
                    %method,
                    computed_at = %cached.computed_at,
                    "Using cached similarity matrix"
                );
                return Ok(cached.matrix);
            }
            tracing::warn!(
                %kind,
                %method,
                cached_size = cached.matrix.size(),
                size = records.len(),
                "Cached similarity matrix is for another collection, recomputing"
            );
        }
    }

    tracing::info!(%kind, %method, records = records.len(), "Computing similarity matrix");
    let matrix = compute_similarity(records, method);
    cache.store(kind, method, &fingerprint, &matrix)?;
    Ok(matrix)
}
