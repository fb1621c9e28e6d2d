use std::ops::AddAssign;

use num_traits::Zero;

use crate::error::SparseMapError;
use crate::sparse_map::{Element, SparseMap, Tile, TileIndex};
use crate::tiled_array::{DistArray, Range, Tensor, TensorOfTensors, TiledRange};
use crate::tot::ElementSparseMap;

#[cfg(test)]
#[path = "reduce_tot_tests.rs"]
mod reduce_tot_tests;

/// Reduces a tensor-of-tensors onto a regular tiled array by summation.
///
/// Every element `e` of the result is the sum, over all outer indices `i` of `tot` whose domain
/// in `sm` contains `e`, of the inner element of `tot[i]` at `sm[i].result_index(e)`. A tile of
/// the result is zero if no domain of `sm` reaches it.
///
/// # Arguments
///
/// * `sm` - The sparse map from the outer indices of `tot` to the indices of the result, at any
/// granularity.
/// * `tot` - The tensor-of-tensors to reduce, typically built by
/// [`from_sparse_map`](crate::tot::from_sparse_map) with the same sparse map.
/// * `trange_rv` - The tiling of the result.
///
/// # Errors
///
/// Errors with [`SparseMapError::RankMismatch`] if the rank of `trange_rv` differs from the
/// dependent rank of `sm`, if the outer rank of `tot` differs from the independent rank of `sm`,
/// or if a non-empty inner tensor does not have the dependent rank of `sm`.
pub fn reduce_tot_sum<M, T>(
    sm: &M,
    tot: &TensorOfTensors<T>,
    trange_rv: &TiledRange,
) -> Result<DistArray<T>, anyhow::Error>
where
    M: ElementSparseMap + ?Sized,
    T: Clone + Zero + AddAssign + Send + Sync,
{
    let esm = sm.element_map()?;
    if trange_rv.rank() != esm.dep_rank() {
        return Err(SparseMapError::rank_mismatch(
            "tiling of the reduced tensor",
            esm.dep_rank(),
            trange_rv.rank(),
        )
        .into());
    }
    if tot.trange().rank() != esm.ind_rank() {
        return Err(SparseMapError::rank_mismatch(
            "outer tiling of the tensor-of-tensors",
            esm.ind_rank(),
            tot.trange().rank(),
        )
        .into());
    }
    if esm.is_empty() {
        return Ok(DistArray::new(trange_rv.clone()));
    }

    // Output tile -> outer element indices whose domains reach into it.
    let contributors = esm.inverse()?.tile_independent(trange_rv)?;

    log::debug!("Reducing tensor-of-tensors by summation...");
    let reduced = DistArray::make_array(trange_rv.clone(), |range| {
        reduce_tile(&esm, tot, trange_rv, &contributors, range)
    })?;
    log::debug!("Reducing tensor-of-tensors by summation... Done.");
    Ok(reduced)
}

/// Accumulates the tile of the reduced tensor covering `range`, or returns `None` if no outer
/// index contributes to it.
fn reduce_tile<T>(
    esm: &SparseMap<Element, Element>,
    tot: &TensorOfTensors<T>,
    trange_rv: &TiledRange,
    contributors: &SparseMap<Tile, Element>,
    range: &Range,
) -> Result<Option<Tensor<T>>, anyhow::Error>
where
    T: Clone + Zero + AddAssign,
{
    let tidx = TileIndex::from(trange_rv.element_to_tile(range.lo())?);
    let outer_indices = match contributors.get(&tidx) {
        Some(outer_indices) => outer_indices,
        None => return Ok(None),
    };

    let mut tile = Tensor::zeros(range.clone());
    for oeidx in outer_indices {
        let inner = match tot.get(oeidx)? {
            Some(inner) if !inner.is_empty() => inner,
            _ => continue,
        };
        if inner.rank() != esm.dep_rank() {
            return Err(SparseMapError::rank_mismatch(
                "inner tensor of the tensor-of-tensors",
                esm.dep_rank(),
                inner.rank(),
            )
            .into());
        }
        let domain = esm.at(oeidx)?;
        for eidx in domain.iter().filter(|eidx| range.includes(eidx)) {
            let ridx = domain.result_index(eidx)?;
            if let (Some(slot), Some(value)) = (tile.get_mut(eidx), inner.get(&ridx)) {
                *slot += value.clone();
            }
        }
    }
    Ok(Some(tile))
}
