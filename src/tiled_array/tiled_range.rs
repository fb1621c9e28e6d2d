//! Partitions of tensor modes into tiles.

use std::fmt;

use anyhow::{self, ensure, format_err};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::error::SparseMapError;
use crate::sparse_map::{ElementIndex, TileIndex};
use crate::tiled_array::range::Range;

#[cfg(test)]
#[path = "tiled_range_tests.rs"]
mod tiled_range_tests;

// ===========
// TiledRange1
// ===========

/// A partition of one mode into contiguous tiles.
///
/// The partition is described by its tile boundaries $`b_0 < b_1 < \ldots < b_n`$: tile $`t`$
/// covers the elements $`[b_t, b_{t+1})`$.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<usize>", into = "Vec<usize>")]
pub struct TiledRange1 {
    bounds: Vec<usize>,
}

impl TiledRange1 {
    /// Constructs a one-mode tiling from its tile boundaries.
    ///
    /// # Errors
    ///
    /// Errors if fewer than two boundaries are given or if the boundaries are not strictly
    /// increasing.
    pub fn new(bounds: &[usize]) -> Result<Self, anyhow::Error> {
        ensure!(
            bounds.len() >= 2,
            "At least two tile boundaries are required, but {bounds:?} was given."
        );
        ensure!(
            bounds.windows(2).all(|pair| pair[0] < pair[1]),
            "Tile boundaries {bounds:?} are not strictly increasing."
        );
        Ok(Self {
            bounds: bounds.to_vec(),
        })
    }

    pub fn bounds(&self) -> &[usize] {
        &self.bounds
    }

    /// Returns the number of tiles.
    pub fn tile_extent(&self) -> usize {
        self.bounds.len() - 1
    }

    /// Returns the number of elements covered by this tiling.
    pub fn extent(&self) -> usize {
        self.hi() - self.lo()
    }

    /// Returns the first element covered by this tiling.
    pub fn lo(&self) -> usize {
        self.bounds[0]
    }

    /// Returns one past the last element covered by this tiling.
    pub fn hi(&self) -> usize {
        self.bounds[self.bounds.len() - 1]
    }

    /// Returns the element bounds $`(\mathrm{lo}, \mathrm{hi})`$ of tile `t`.
    pub fn tile(&self, t: usize) -> Option<(usize, usize)> {
        if t < self.tile_extent() {
            Some((self.bounds[t], self.bounds[t + 1]))
        } else {
            None
        }
    }

    /// Returns the tile containing element `e`.
    pub fn element_to_tile(&self, e: usize) -> Option<usize> {
        if e < self.lo() || e >= self.hi() {
            return None;
        }
        Some(self.bounds.partition_point(|&b| b <= e) - 1)
    }
}

impl TryFrom<Vec<usize>> for TiledRange1 {
    type Error = anyhow::Error;

    fn try_from(bounds: Vec<usize>) -> Result<Self, Self::Error> {
        Self::new(&bounds)
    }
}

impl From<TiledRange1> for Vec<usize> {
    fn from(tr1: TiledRange1) -> Self {
        tr1.bounds
    }
}

impl fmt::Display for TiledRange1 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.bounds.iter().join(", "))
    }
}

// ==========
// TiledRange
// ==========

/// A multi-mode tiling: one [`TiledRange1`] per mode.
///
/// Tiles are addressed either by their tile coordinate (one tile number per mode) or by their
/// row-major ordinal within [`Self::tiles_range`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TiledRange {
    dims: Vec<TiledRange1>,
}

impl TiledRange {
    pub fn new(dims: Vec<TiledRange1>) -> Self {
        Self { dims }
    }

    /// Constructs a tiling from the tile boundaries of every mode.
    ///
    /// # Errors
    ///
    /// Errors if the boundaries of any mode are invalid.
    pub fn from_bounds<B: AsRef<[usize]>>(bounds: &[B]) -> Result<Self, anyhow::Error> {
        let dims = bounds
            .iter()
            .map(|b| TiledRange1::new(b.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(dims))
    }

    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    pub fn dims(&self) -> &[TiledRange1] {
        &self.dims
    }

    /// Returns the tiling of mode `i`.
    pub fn dim(&self, i: usize) -> Option<&TiledRange1> {
        self.dims.get(i)
    }

    /// Returns the range of tile coordinates.
    pub fn tiles_range(&self) -> Range {
        Range::from_extents(&self.dims.iter().map(TiledRange1::tile_extent).collect_vec())
    }

    /// Returns the range of element coordinates covered by this tiling.
    pub fn elements_range(&self) -> Range {
        Range::new(
            self.dims.iter().map(TiledRange1::lo).collect_vec(),
            self.dims.iter().map(TiledRange1::hi).collect_vec(),
        )
        .unwrap_or_default()
    }

    /// Returns the total number of tiles.
    pub fn ntiles(&self) -> usize {
        self.tiles_range().volume()
    }

    /// Returns the row-major ordinal of a tile coordinate.
    pub fn tile_ordinal(&self, tile_idx: &[usize]) -> Option<usize> {
        self.tiles_range().ordinal(tile_idx)
    }

    /// Returns the tile coordinate of a tile ordinal.
    pub fn tile_index(&self, ordinal: usize) -> Option<Vec<usize>> {
        self.tiles_range().index_of(ordinal)
    }

    /// Returns the tile coordinate containing an element coordinate.
    ///
    /// # Errors
    ///
    /// Errors if the element coordinate has the wrong rank or lies outside this tiling.
    pub fn element_to_tile(&self, element_idx: &[usize]) -> Result<Vec<usize>, anyhow::Error> {
        if element_idx.len() != self.rank() {
            return Err(
                SparseMapError::rank_mismatch("element to tile", self.rank(), element_idx.len())
                    .into(),
            );
        }
        element_idx
            .iter()
            .zip(self.dims.iter())
            .map(|(&e, dim)| {
                dim.element_to_tile(e).ok_or_else(|| {
                    format_err!(SparseMapError::OutOfRange(format!(
                        "element {e} is not in the tiling {dim}"
                    )))
                })
            })
            .collect()
    }

    /// Returns the range of element coordinates spanned by a tile coordinate.
    ///
    /// # Errors
    ///
    /// Errors if the tile coordinate is not a valid tile of this tiling.
    pub fn make_tile_range(&self, tile_idx: &[usize]) -> Result<Range, anyhow::Error> {
        if !self.tiles_range().includes(tile_idx) {
            return Err(SparseMapError::OutOfRange(format!(
                "tile {{{}}} is not in the tiling {self}",
                tile_idx.iter().join(", ")
            ))
            .into());
        }
        let (lo, hi): (Vec<usize>, Vec<usize>) = tile_idx
            .iter()
            .zip(self.dims.iter())
            .map(|(&t, dim)| dim.tile(t).unwrap_or((0, 0)))
            .unzip();
        Range::new(lo, hi)
    }

    /// Returns the range of element coordinates spanned by the tile with a given ordinal.
    ///
    /// # Errors
    ///
    /// Errors if the ordinal is not smaller than [`Self::ntiles`].
    pub fn tile(&self, ordinal: usize) -> Result<Range, anyhow::Error> {
        let tile_idx = self.tile_index(ordinal).ok_or_else(|| {
            format_err!(SparseMapError::OutOfRange(format!(
                "tile ordinal {ordinal} is not in [0, {})",
                self.ntiles()
            )))
        })?;
        self.make_tile_range(&tile_idx)
    }

    /// Returns the tiling whose modes are those of `self` followed by those of `other`.
    pub fn product(&self, other: &Self) -> Self {
        Self::new(self.dims.iter().chain(other.dims.iter()).cloned().collect())
    }

    // ---------------------
    // Typed index interface
    // ---------------------

    /// Returns the tile index containing an element index.
    ///
    /// # Errors
    ///
    /// Errors if the element index has the wrong rank or lies outside this tiling.
    pub fn tile_of(&self, element_idx: &ElementIndex) -> Result<TileIndex, anyhow::Error> {
        self.element_to_tile(element_idx).map(TileIndex::from)
    }

    /// Returns the element indices inside a tile, in row-major order.
    ///
    /// # Errors
    ///
    /// Errors if the tile index is not a valid tile of this tiling.
    pub fn elements_of(&self, tile_idx: &TileIndex) -> Result<Vec<ElementIndex>, anyhow::Error> {
        Ok(self
            .make_tile_range(tile_idx)?
            .iter()
            .map(ElementIndex::from)
            .collect_vec())
    }

    /// Returns `true` if the tile index is a valid tile of this tiling.
    pub fn includes_tile(&self, tile_idx: &[usize]) -> bool {
        self.tiles_range().includes(tile_idx)
    }
}

impl fmt::Display for TiledRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.dims.iter().join(", "))
    }
}
