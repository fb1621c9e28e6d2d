use std::collections::BTreeMap;

use itertools::Itertools;
use ndarray::{ArrayD, IxDyn};
use num_traits::Zero;

use crate::error::SparseMapError;
use crate::sparse_map::{Element, ElementIndex, SparseMap};
use crate::tiled_array::{DistArray, Range, Tensor, TensorOfTensors, TiledRange};
use crate::tot::ElementSparseMap;

#[cfg(test)]
#[path = "from_sparse_map_tests.rs"]
mod from_sparse_map_tests;

/// Builds a tensor-of-tensors from a tensor and a sparse map.
///
/// The outer element `i` of the result holds the elements of `tensor` reachable from `i`
/// through `sm`, packed into a dense inner tensor of shape `sm[i].result_extents()`: the element
/// at dependent index `d` lands at `sm[i].result_index(d)`. Outer indices absent from `sm` hold
/// the empty tensor, and outer tiles without any independent index of `sm` are zero.
///
/// # Arguments
///
/// * `sm` - The sparse map, at any granularity. Tile-granular maps are expanded with their
/// tilings first.
/// * `tensor` - The tensor to gather the inner tensors from.
/// * `outer_trange` - The tiling of the outer modes of the result.
/// * `ind2mode` - A map from a mode of the outer index to a mode of `tensor`. The offset of the
/// outer index along each mapped mode is injected into the dependent indices at the mapped
/// position before `tensor` is probed.
///
/// # Returns
///
/// The tensor-of-tensors.
///
/// # Errors
///
/// Errors with [`SparseMapError::RankMismatch`] if the dependent rank of `sm` plus the number of
/// injected modes differs from the rank of `tensor`, or if the rank of `outer_trange` differs
/// from the independent rank of `sm`. Errors with [`SparseMapError::OutOfRange`] if `ind2mode`
/// refers to modes that do not exist or injects two modes into the same position.
pub fn from_sparse_map<M, T>(
    sm: &M,
    tensor: &DistArray<T>,
    outer_trange: &TiledRange,
    ind2mode: &BTreeMap<usize, usize>,
) -> Result<TensorOfTensors<T>, anyhow::Error>
where
    M: ElementSparseMap + ?Sized,
    T: Clone + Zero + Send + Sync,
{
    let esm = sm.element_map()?;
    let tensor_rank = tensor.trange().rank();
    if esm.dep_rank() + ind2mode.len() != tensor_rank {
        return Err(SparseMapError::rank_mismatch(
            "tensor probed by the sparse map",
            esm.dep_rank() + ind2mode.len(),
            tensor_rank,
        )
        .into());
    }
    if outer_trange.rank() != esm.ind_rank() {
        return Err(SparseMapError::rank_mismatch(
            "outer tiling of the tensor-of-tensors",
            esm.ind_rank(),
            outer_trange.rank(),
        )
        .into());
    }
    let has_bad_mode = ind2mode
        .iter()
        .any(|(&outer_mode, &mode)| outer_mode >= outer_trange.rank() || mode >= tensor_rank);
    if has_bad_mode || !ind2mode.values().all_unique() {
        return Err(SparseMapError::OutOfRange(format!(
            "the mode map {ind2mode:?} does not inject outer modes of rank {} into distinct modes of rank {tensor_rank}",
            outer_trange.rank()
        ))
        .into());
    }

    log::debug!("Constructing tensor-of-tensors from sparse map...");
    let tot = DistArray::make_array(outer_trange.clone(), |outer_range| {
        make_tot_tile(&esm, tensor, ind2mode, outer_range)
    })?;
    log::debug!("Constructing tensor-of-tensors from sparse map... Done.");
    Ok(tot)
}

/// Builds the tile of the tensor-of-tensors covering `outer_range`, or `None` if no independent
/// index of `esm` lies in the tile.
fn make_tot_tile<T>(
    esm: &SparseMap<Element, Element>,
    tensor: &DistArray<T>,
    ind2mode: &BTreeMap<usize, usize>,
    outer_range: &Range,
) -> Result<Option<Tensor<Tensor<T>>>, anyhow::Error>
where
    T: Clone + Zero,
{
    if !outer_range
        .iter()
        .any(|oeidx| esm.count(&ElementIndex::from(oeidx)))
    {
        return Ok(None);
    }
    let inner_tensors = outer_range
        .iter()
        .map(|oeidx| make_inner_tensor(esm, tensor, ind2mode, &oeidx))
        .collect::<Result<Vec<_>, _>>()?;
    let data = ArrayD::from_shape_vec(IxDyn(&outer_range.extents()), inner_tensors)?;
    Tensor::new(outer_range.clone(), data).map(Some)
}

/// Gathers the inner tensor of outer element index `oeidx`.
fn make_inner_tensor<T>(
    esm: &SparseMap<Element, Element>,
    tensor: &DistArray<T>,
    ind2mode: &BTreeMap<usize, usize>,
    oeidx: &[usize],
) -> Result<Tensor<T>, anyhow::Error>
where
    T: Clone + Zero,
{
    let domain = match esm.get(&ElementIndex::from(oeidx)) {
        Some(domain) if !domain.is_empty() => domain,
        _ => return Ok(Tensor::empty()),
    };
    let injections = ind2mode
        .iter()
        .map(|(&outer_mode, &mode)| (mode, oeidx[outer_mode]))
        .collect::<BTreeMap<_, _>>();
    let injected = domain.inject(&injections)?;

    let mut inner = Tensor::zeros(Range::from_extents(&domain.result_extents()));
    // Injection keeps the lexicographic order, so the two domains can be walked together.
    for (dep, probe) in domain.iter().zip(injected.iter()) {
        let tile_idx = tensor.trange().element_to_tile(probe)?;
        let value = tensor
            .find(&tile_idx)?
            .and_then(|tile| tile.get(probe))
            .cloned();
        if let Some(value) = value {
            let ridx = domain.result_index(dep)?;
            if let Some(slot) = inner.get_mut(&ridx) {
                *slot = value;
            }
        }
    }
    Ok(inner)
}
