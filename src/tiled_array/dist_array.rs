//! Block-sparse tiled arrays.

use std::collections::BTreeMap;

use anyhow::{self, ensure, format_err};
use itertools::Itertools;
use ndarray::{ArrayD, IxDyn, Slice};
use num_traits::Zero;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::SparseMapError;
use crate::tiled_array::range::Range;
use crate::tiled_array::tensor::Tensor;
use crate::tiled_array::tiled_range::TiledRange;

#[cfg(test)]
#[path = "dist_array_tests.rs"]
mod dist_array_tests;

/// An array partitioned into tiles by a [`TiledRange`], storing only its non-zero tiles.
///
/// Tiles are keyed by their row-major ordinal in [`TiledRange::tiles_range`]. A tile that is
/// absent is zero.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DistArray<T> {
    trange: TiledRange,
    tiles: BTreeMap<usize, Tensor<T>>,
}

/// A tiled array whose elements are themselves dense tensors.
pub type TensorOfTensors<T> = DistArray<Tensor<T>>;

impl<T> DistArray<T> {
    /// Constructs an array with every tile zero.
    pub fn new(trange: TiledRange) -> Self {
        Self {
            trange,
            tiles: BTreeMap::new(),
        }
    }

    /// Constructs an array by evaluating `op` on the element range of every tile.
    ///
    /// The tiles are generated concurrently. `op` returns `None` for a tile that is zero.
    ///
    /// # Arguments
    ///
    /// * `trange` - The tiling of the array.
    /// * `op` - The tile-generating callback. It receives the element range of a tile and must
    /// return a tensor covering exactly that range.
    ///
    /// # Errors
    ///
    /// Errors if `op` fails for any tile or if it returns a tensor that does not cover the tile.
    pub fn make_array<F>(trange: TiledRange, op: F) -> Result<Self, anyhow::Error>
    where
        T: Send,
        F: Fn(&Range) -> Result<Option<Tensor<T>>, anyhow::Error> + Sync,
    {
        log::debug!("Constructing tiles of array with tiling {trange}...");
        let tiles = (0..trange.ntiles())
            .into_par_iter()
            .map(|ordinal| -> Result<Option<(usize, Tensor<T>)>, anyhow::Error> {
                let tile_range = trange.tile(ordinal)?;
                let tile = op(&tile_range)?;
                if let Some(tensor) = tile.as_ref() {
                    ensure!(
                        tensor.range() == &tile_range,
                        "Tile generated with range {} does not match the expected tile range {tile_range}.",
                        tensor.range()
                    );
                }
                Ok(tile.map(|tensor| (ordinal, tensor)))
            })
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .flatten()
            .collect::<BTreeMap<_, _>>();
        log::debug!(
            "Constructing tiles of array with tiling {trange}... Done. {} of {} tiles are non-zero.",
            tiles.len(),
            trange.ntiles()
        );
        Ok(Self { trange, tiles })
    }

    pub fn trange(&self) -> &TiledRange {
        &self.trange
    }

    /// Returns the number of stored (non-zero) tiles.
    pub fn nnz_tiles(&self) -> usize {
        self.tiles.len()
    }

    fn tile_ordinal_of(&self, tile_idx: &[usize]) -> Result<usize, anyhow::Error> {
        self.trange.tile_ordinal(tile_idx).ok_or_else(|| {
            format_err!(SparseMapError::OutOfRange(format!(
                "tile {{{}}} is not in the tiling {}",
                tile_idx.iter().join(", "),
                self.trange
            )))
        })
    }

    /// Fetches the tile at a tile coordinate.
    ///
    /// # Returns
    ///
    /// The tile, or `None` if the tile is zero.
    ///
    /// # Errors
    ///
    /// Errors if the tile coordinate is not a tile of this array.
    pub fn find(&self, tile_idx: &[usize]) -> Result<Option<&Tensor<T>>, anyhow::Error> {
        let ordinal = self.tile_ordinal_of(tile_idx)?;
        Ok(self.tiles.get(&ordinal))
    }

    /// Fetches the tile with a given ordinal, or `None` if the tile is zero or does not exist.
    pub fn find_ordinal(&self, ordinal: usize) -> Option<&Tensor<T>> {
        self.tiles.get(&ordinal)
    }

    /// Returns `true` if the tile at a tile coordinate is zero.
    ///
    /// # Errors
    ///
    /// Errors if the tile coordinate is not a tile of this array.
    pub fn is_zero(&self, tile_idx: &[usize]) -> Result<bool, anyhow::Error> {
        Ok(self.find(tile_idx)?.is_none())
    }

    /// Stores a tile at a tile coordinate, replacing any existing tile.
    ///
    /// # Errors
    ///
    /// Errors if the tile coordinate is not a tile of this array or if the tensor does not cover
    /// the tile.
    pub fn set_tile(&mut self, tile_idx: &[usize], tensor: Tensor<T>) -> Result<(), anyhow::Error> {
        let ordinal = self.tile_ordinal_of(tile_idx)?;
        let tile_range = self.trange.make_tile_range(tile_idx)?;
        ensure!(
            tensor.range() == &tile_range,
            "Tensor with range {} cannot be stored in tile with range {tile_range}.",
            tensor.range()
        );
        self.tiles.insert(ordinal, tensor);
        Ok(())
    }

    /// Returns the element at an element coordinate, or `None` if its tile is zero.
    ///
    /// # Errors
    ///
    /// Errors if the element coordinate lies outside the tiling.
    pub fn get(&self, element_idx: &[usize]) -> Result<Option<&T>, anyhow::Error> {
        let tile_idx = self.trange.element_to_tile(element_idx)?;
        Ok(self
            .find(&tile_idx)?
            .and_then(|tile| tile.get(element_idx)))
    }

    /// Iterates over the stored tiles together with their ordinals.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Tensor<T>)> {
        self.tiles.iter().map(|(ordinal, tile)| (*ordinal, tile))
    }
}

impl<T: Clone + Zero + Send + Sync> DistArray<T> {
    /// Constructs a tiled array from dense data. Tiles whose elements are all zero are not
    /// stored.
    ///
    /// The element coordinates of the tiling are taken relative to its lower bounds, so `data`
    /// must have the extents of [`TiledRange::elements_range`].
    ///
    /// # Errors
    ///
    /// Errors if the shape of `data` does not match the tiling.
    pub fn from_dense(trange: TiledRange, data: &ArrayD<T>) -> Result<Self, anyhow::Error> {
        let elements = trange.elements_range();
        ensure!(
            data.shape() == elements.extents().as_slice(),
            "Dense data of shape {:?} does not match the tiling {trange}.",
            data.shape()
        );
        let origin = elements.lo().to_vec();
        Self::make_array(trange, |tile_range| {
            let block = data
                .slice_each_axis(|ax| {
                    let i = ax.axis.index();
                    Slice::from(
                        tile_range.lo()[i] - origin[i]..tile_range.hi()[i] - origin[i],
                    )
                })
                .to_owned();
            let tensor = Tensor::new(tile_range.clone(), block)?;
            Ok(if tensor.is_zero() { None } else { Some(tensor) })
        })
    }

    /// Gathers the array into dense data, filling zero tiles with zeros.
    pub fn to_dense(&self) -> ArrayD<T> {
        let elements = self.trange.elements_range();
        let origin = elements.lo().to_vec();
        let mut dense = ArrayD::zeros(IxDyn(&elements.extents()));
        for tile in self.tiles.values() {
            let tile_range = tile.range();
            dense
                .slice_each_axis_mut(|ax| {
                    let i = ax.axis.index();
                    Slice::from(
                        tile_range.lo()[i] - origin[i]..tile_range.hi()[i] - origin[i],
                    )
                })
                .assign(tile.data());
        }
        dense
    }
}
