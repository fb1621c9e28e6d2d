use anyhow::{self, ensure, format_err};
use itertools::Itertools;
use ndarray::Array2;

use crate::error::SparseMapError;
use crate::tiled_array::{DistArray, TiledRange, TiledRange1};

#[cfg(test)]
#[path = "submatrix_tests.rs"]
mod submatrix_tests;

/// Returns the row and column tiles that hold at least one selected tile of `mask`.
fn selected_rows_and_columns(mask: &Array2<bool>) -> (Vec<usize>, Vec<usize>) {
    let rows = mask
        .rows()
        .into_iter()
        .positions(|row| row.iter().any(|&selected| selected))
        .collect_vec();
    let cols = mask
        .columns()
        .into_iter()
        .positions(|col| col.iter().any(|&selected| selected))
        .collect_vec();
    (rows, cols)
}

/// Tiles the concatenation of the selected tiles of `dim`.
fn compress_dim(dim: &TiledRange1, selected: &[usize]) -> Result<TiledRange1, anyhow::Error> {
    let bounds = selected
        .iter()
        .filter_map(|&t| dim.tile(t))
        .scan(0, |upper, (lo, hi)| {
            *upper += hi - lo;
            Some(*upper)
        });
    TiledRange1::new(&std::iter::once(0).chain(bounds).collect_vec())
}

/// Checks that `mask` has one entry per tile of the matrix tiling `trange`.
fn check_mask(trange: &TiledRange, mask: &Array2<bool>) -> Result<(), anyhow::Error> {
    if trange.rank() != 2 {
        return Err(SparseMapError::rank_mismatch("tiled matrix", 2, trange.rank()).into());
    }
    let ntiles = trange.dims().iter().map(TiledRange1::tile_extent).collect_vec();
    ensure!(
        mask.shape() == ntiles.as_slice(),
        "Tile mask of shape {:?} does not match the {}×{} tiles of {trange}.",
        mask.shape(),
        ntiles[0],
        ntiles[1]
    );
    Ok(())
}

/// Compresses a tiled matrix to the tiles selected by a mask.
///
/// The rows of the result are the row tiles of `full` with at least one selected tile and its
/// columns are the column tiles with at least one selected tile, both in their original order.
/// The tile of the result at `(a, b)` is the tile of `full` at the `a`-th kept row tile and the
/// `b`-th kept column tile if that tile is selected, and zero otherwise.
///
/// # Arguments
///
/// * `full` - The matrix to compress.
/// * `mask` - The tile selection, with one entry per tile of `full`.
///
/// # Errors
///
/// Errors if `full` is not a matrix, if `mask` does not match the tiles of `full` or if `mask`
/// selects no tile.
pub fn submatrix<T>(full: &DistArray<T>, mask: &Array2<bool>) -> Result<DistArray<T>, anyhow::Error>
where
    T: Clone + Send + Sync,
{
    let full_trange = full.trange();
    check_mask(full_trange, mask)?;
    let (rows, cols) = selected_rows_and_columns(mask);
    ensure!(!rows.is_empty(), "The tile mask selects no tile.");

    let compressed_trange = TiledRange::new(vec![
        compress_dim(&full_trange.dims()[0], &rows)?,
        compress_dim(&full_trange.dims()[1], &cols)?,
    ]);
    log::debug!("Compressing matrix into tiling {compressed_trange}...");
    let sub = DistArray::make_array(compressed_trange.clone(), |range| {
        let ab = compressed_trange.element_to_tile(range.lo())?;
        let (i, j) = (rows[ab[0]], cols[ab[1]]);
        if !mask[(i, j)] {
            return Ok(None);
        }
        full.find(&[i, j])?
            .map(|tile| tile.clone().with_range(range.clone()))
            .transpose()
    })?;
    log::debug!("Compressing matrix into tiling {compressed_trange}... Done.");
    Ok(sub)
}

/// Expands a compressed matrix back onto the full tiling.
///
/// This undoes [`submatrix`]: the selected tile of the result at `(i, j)` is the tile of `sub`
/// at the rank of `i` among the kept row tiles and the rank of `j` among the kept column tiles.
/// Tiles not selected by `mask` are zero.
///
/// # Arguments
///
/// * `sub` - The compressed matrix.
/// * `full_trange` - The tiling of the full matrix.
/// * `mask` - The tile selection that produced `sub`.
///
/// # Errors
///
/// Errors if `full_trange` is not a matrix tiling, if `mask` does not match its tiles or if the
/// tiling of `sub` is not the compression of `full_trange` by `mask`.
pub fn expand_submatrix<T>(
    sub: &DistArray<T>,
    full_trange: &TiledRange,
    mask: &Array2<bool>,
) -> Result<DistArray<T>, anyhow::Error>
where
    T: Clone + Send + Sync,
{
    check_mask(full_trange, mask)?;
    let (rows, cols) = selected_rows_and_columns(mask);
    let sub_ntiles = sub
        .trange()
        .dims()
        .iter()
        .map(TiledRange1::tile_extent)
        .collect_vec();
    ensure!(
        sub_ntiles == [rows.len(), cols.len()],
        "Compressed matrix with tiling {} does not hold the {}×{} tiles selected by the mask.",
        sub.trange(),
        rows.len(),
        cols.len()
    );

    log::debug!("Expanding compressed matrix onto tiling {full_trange}...");
    let full = DistArray::make_array(full_trange.clone(), |range| {
        let ij = full_trange.element_to_tile(range.lo())?;
        if !mask[(ij[0], ij[1])] {
            return Ok(None);
        }
        let a = rows
            .binary_search(&ij[0])
            .map_err(|_| format_err!("Row tile {} holds no selected tile.", ij[0]))?;
        let b = cols
            .binary_search(&ij[1])
            .map_err(|_| format_err!("Column tile {} holds no selected tile.", ij[1]))?;
        sub.find(&[a, b])?
            .map(|tile| tile.clone().with_range(range.clone()))
            .transpose()
    })?;
    log::debug!("Expanding compressed matrix onto tiling {full_trange}... Done.");
    Ok(full)
}
