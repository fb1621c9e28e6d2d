use crate::error::SparseMapError;
use crate::sparse_map::{SparseMap, Tile, TileIndex};
use crate::tiled_array::DistArray;

#[cfg(test)]
#[path = "sparsify_tests.rs"]
mod sparsify_tests;

/// Zeroes the tiles of a coefficient matrix that a tile sparse map does not reach.
///
/// The columns of `c` are the independent indices of `sm` and its rows are the dependent
/// indices. The tile of `c` at `(r, s)` is kept if and only if the domain of `{s}` in `sm`
/// contains `{r}`.
///
/// # Arguments
///
/// * `c` - The matrix to sparsify.
/// * `sm` - A sparse map from column tiles to row tiles of `c`.
///
/// # Returns
///
/// The sparsified matrix, with the tiling of `c`.
///
/// # Errors
///
/// Errors with [`SparseMapError::RankMismatch`] if `c` is not a matrix or if `sm` is not a
/// map between rank-1 tile indices. Errors with [`SparseMapError::TilingMismatch`] if a tiling
/// carried by `sm` differs from the corresponding tiling of `c`.
pub fn sparsify_basis<T>(
    c: &DistArray<T>,
    sm: &SparseMap<Tile, Tile>,
) -> Result<DistArray<T>, anyhow::Error>
where
    T: Clone + Send + Sync,
{
    let trange = c.trange();
    if trange.rank() != 2 {
        return Err(SparseMapError::rank_mismatch("sparsified matrix", 2, trange.rank()).into());
    }
    if !sm.is_empty() && (sm.ind_rank() != 1 || sm.dep_rank() != 1) {
        return Err(SparseMapError::rank_mismatch(
            "tile map between rows and columns",
            2,
            sm.ind_rank() + sm.dep_rank(),
        )
        .into());
    }
    let rows = trange.dims()[0].clone();
    let cols = trange.dims()[1].clone();
    if let Some(ind_trange) = sm.trange() {
        if ind_trange.dims() != [cols.clone()] {
            return Err(SparseMapError::TilingMismatch(format!(
                "column tiling {cols} of the matrix differs from the independent tiling {ind_trange}"
            ))
            .into());
        }
    }
    let dep_tranges = sm.iter().filter_map(|(_, domain)| domain.trange());
    for dep_trange in dep_tranges {
        if dep_trange.dims() != [rows.clone()] {
            return Err(SparseMapError::TilingMismatch(format!(
                "row tiling {rows} of the matrix differs from the dependent tiling {dep_trange}"
            ))
            .into());
        }
    }

    log::debug!("Sparsifying basis...");
    let sparse_c = DistArray::make_array(trange.clone(), |range| {
        let tidx = trange.element_to_tile(range.lo())?;
        let reachable = sm
            .get(&TileIndex::from([tidx[1]]))
            .map_or(false, |domain| domain.count(&TileIndex::from([tidx[0]])));
        if reachable {
            Ok(c.find(&tidx)?.cloned())
        } else {
            Ok(None)
        }
    })?;
    log::debug!("Sparsifying basis... Done.");
    Ok(sparse_c)
}
