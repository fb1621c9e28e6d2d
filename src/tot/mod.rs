//! Construction and reduction of tensors-of-tensors driven by sparse maps.
//!
//! A tensor-of-tensors ([`TensorOfTensors`](crate::tiled_array::TensorOfTensors)) is a tiled
//! array whose elements are dense tensors. [`from_sparse_map`] gathers, for every outer element
//! index, the elements of a tensor reachable from it through a sparse map into an inner tensor;
//! [`reduce_tot_sum`] scatters the inner tensors back onto a regular tiled array, summing the
//! contributions of every outer index.

use std::borrow::Cow;

use crate::sparse_map::{Element, SparseMap, Tile};

mod from_sparse_map;
mod reduce_tot;

pub use from_sparse_map::from_sparse_map;
pub use reduce_tot::reduce_tot_sum;

/// Trait for sparse maps that can be viewed at element granularity in both spaces.
///
/// Sparse maps of tile indices are expanded with the tilings they carry.
pub trait ElementSparseMap {
    /// Returns this sparse map at element granularity.
    ///
    /// # Errors
    ///
    /// Errors if a tiling required for the expansion is missing.
    fn element_map(&self) -> Result<Cow<'_, SparseMap<Element, Element>>, anyhow::Error>;
}

impl ElementSparseMap for SparseMap<Element, Element> {
    fn element_map(&self) -> Result<Cow<'_, SparseMap<Element, Element>>, anyhow::Error> {
        Ok(Cow::Borrowed(self))
    }
}

impl ElementSparseMap for SparseMap<Element, Tile> {
    fn element_map(&self) -> Result<Cow<'_, SparseMap<Element, Element>>, anyhow::Error> {
        self.expand_dependent().map(Cow::Owned)
    }
}

impl ElementSparseMap for SparseMap<Tile, Element> {
    fn element_map(&self) -> Result<Cow<'_, SparseMap<Element, Element>>, anyhow::Error> {
        self.expand_independent().map(Cow::Owned)
    }
}

impl ElementSparseMap for SparseMap<Tile, Tile> {
    fn element_map(&self) -> Result<Cow<'_, SparseMap<Element, Element>>, anyhow::Error> {
        SparseMap::<Element, Element>::try_from(self).map(Cow::Owned)
    }
}
