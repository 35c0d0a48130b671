//! Erasure coding over the blocks of one group.
//!
//! Data blocks occupy the leading positions and parity blocks the rest,
//! so block index `i < k` always maps straight to payload bytes.

use reed_solomon_erasure::galois_8::ReedSolomon;

use amoeba_core::{CorrectionAlgorithm, ValidationError};

use crate::error::{ContentError, Result};

/// Expands `data` blocks with parity until `total` blocks exist.
///
/// Every data block must already be padded to one shared length. With
/// correction off, `total` must equal the number of data blocks and the
/// input passes through unchanged.
pub fn encode_blocks(
    correction: CorrectionAlgorithm,
    mut data: Vec<Vec<u8>>,
    total: usize,
) -> Result<Vec<Vec<u8>>> {
    let k = data.len();
    match correction {
        CorrectionAlgorithm::None => {
            if total != k {
                return Err(invalid_params(k, total));
            }
            Ok(data)
        }
        CorrectionAlgorithm::ReedSolomon8 => {
            if total == k {
                return Ok(data);
            }
            if k == 0 || total < k {
                return Err(invalid_params(k, total));
            }
            let block_length = data[0].len();
            let rs = ReedSolomon::new(k, total - k)
                .map_err(|e| ContentError::Erasure(format!("{e:?}")))?;
            data.resize(total, vec![0u8; block_length]);
            rs.encode(&mut data)
                .map_err(|e| ContentError::Erasure(format!("{e:?}")))?;
            Ok(data)
        }
    }
}

/// Rebuilds the `k` data blocks from whichever blocks are present.
///
/// `shards` holds one entry per block position, `Some` where the block was
/// fetched. Fails with [`ContentError::InsufficientBlocks`] when fewer than
/// `k` positions are filled.
pub fn reconstruct_blocks(
    correction: CorrectionAlgorithm,
    mut shards: Vec<Option<Vec<u8>>>,
    k: usize,
) -> Result<Vec<Vec<u8>>> {
    let present = shards.iter().filter(|shard| shard.is_some()).count();
    if present < k {
        return Err(ContentError::InsufficientBlocks {
            have: present,
            need: k,
        });
    }
    let total = shards.len();
    let data_missing = shards[..k.min(total)].iter().any(|shard| shard.is_none());
    if correction == CorrectionAlgorithm::ReedSolomon8 && total > k && data_missing {
        let rs = ReedSolomon::new(k, total - k)
            .map_err(|e| ContentError::Erasure(format!("{e:?}")))?;
        rs.reconstruct_data(&mut shards)
            .map_err(|e| ContentError::Erasure(format!("{e:?}")))?;
    }
    shards
        .into_iter()
        .take(k)
        .map(|shard| {
            shard.ok_or_else(|| {
                ContentError::Erasure("data block missing after reconstruction".to_owned())
            })
        })
        .collect()
}

fn invalid_params(k: usize, n: usize) -> ContentError {
    ValidationError::InvalidErasureParams {
        k: k as u32,
        n: n as u32,
    }
    .into()
}
