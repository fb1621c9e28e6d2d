use approx::RelativeEq;
use num_traits::Float;

use crate::tiled_array::{DistArray, Tensor, TensorOfTensors};

#[cfg(test)]
#[path = "allclose_tests.rs"]
mod allclose_tests;

fn elements_close<T>(actual: T, reference: T, rtol: T, atol: T) -> bool
where
    T: Float + RelativeEq<Epsilon = T>,
{
    actual.relative_eq(&reference, atol, rtol)
}

fn tensor_close_to_zero<T>(tensor: &Tensor<T>, rtol: T, atol: T) -> bool
where
    T: Float + RelativeEq<Epsilon = T>,
{
    tensor
        .iter()
        .all(|&x| elements_close(x, T::zero(), rtol, atol))
}

fn tensors_close<T>(actual: &Tensor<T>, reference: &Tensor<T>, rtol: T, atol: T) -> bool
where
    T: Float + RelativeEq<Epsilon = T>,
{
    actual.range() == reference.range()
        && actual
            .iter()
            .zip(reference.iter())
            .all(|(&a, &r)| elements_close(a, r, rtol, atol))
}

/// Determines if two tiled arrays are equal within tolerances.
///
/// Two elements `a` and `r` are close if `|a - r| <= atol`, or if `|a - r|` does not exceed
/// `rtol` times the larger of `|a|` and `|r|`. A zero tile is close to a stored tile if every
/// element of the stored tile is close to zero.
///
/// # Arguments
///
/// * `actual` - The computed array.
/// * `reference` - The reference array.
/// * `rtol` - The relative tolerance.
/// * `atol` - The absolute tolerance.
///
/// # Returns
///
/// `true` if the arrays share a tiling and all of their elements are close.
pub fn allclose<T>(actual: &DistArray<T>, reference: &DistArray<T>, rtol: T, atol: T) -> bool
where
    T: Float + RelativeEq<Epsilon = T>,
{
    if actual.trange() != reference.trange() {
        return false;
    }
    (0..actual.trange().ntiles()).all(|ordinal| {
        match (actual.find_ordinal(ordinal), reference.find_ordinal(ordinal)) {
            (None, None) => true,
            (Some(tile), None) | (None, Some(tile)) => tensor_close_to_zero(tile, rtol, atol),
            (Some(a), Some(r)) => tensors_close(a, r, rtol, atol),
        }
    })
}

/// Determines if two tensors-of-tensors are equal within tolerances.
///
/// The inner tensors at every outer element must cover the same range and be elementwise close
/// in the sense of [`allclose`]. A zero outer tile is close to a stored outer tile if all inner
/// tensors of the stored tile are close to zero.
///
/// # Returns
///
/// `true` if the tensors-of-tensors share an outer tiling and all of their inner tensors are
/// close.
pub fn allclose_tot<T>(
    actual: &TensorOfTensors<T>,
    reference: &TensorOfTensors<T>,
    rtol: T,
    atol: T,
) -> bool
where
    T: Float + RelativeEq<Epsilon = T>,
{
    if actual.trange() != reference.trange() {
        return false;
    }
    (0..actual.trange().ntiles()).all(|ordinal| {
        match (actual.find_ordinal(ordinal), reference.find_ordinal(ordinal)) {
            (None, None) => true,
            (Some(tile), None) | (None, Some(tile)) => tile
                .iter()
                .all(|inner| tensor_close_to_zero(inner, rtol, atol)),
            (Some(a), Some(r)) => a
                .iter()
                .zip(r.iter())
                .all(|(a_inner, r_inner)| tensors_close(a_inner, r_inner, rtol, atol)),
        }
    })
}
