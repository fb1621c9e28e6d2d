//! Element and tile indices.

use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;
use std::ops::Deref;

use anyhow::{self, format_err};
use itertools::Itertools;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::SparseMapError;
use crate::sparse_map::tiling::{TilingState, Tiled, Untiled};

#[cfg(test)]
#[path = "index_tests.rs"]
mod index_tests;

// =====
// Kinds
// =====

/// Trait for the granularity of an index.
///
/// The kind decides, at compile time, whether containers of indices of this kind can carry a
/// tiling.
pub trait IndexKind:
    Clone
    + Copy
    + fmt::Debug
    + Default
    + PartialEq
    + Eq
    + PartialOrd
    + Ord
    + Hash
    + Send
    + Sync
    + Serialize
    + DeserializeOwned
    + 'static
{
    /// The tiling attachment of containers of indices of this kind.
    type Tiling: TilingState;

    /// A human-readable name for this kind.
    const NAME: &'static str;
}

/// Kind tag for indices of single tensor elements.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Element;

/// Kind tag for indices of tiles.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Tile;

impl IndexKind for Element {
    type Tiling = Untiled;
    const NAME: &'static str = "element";
}

impl IndexKind for Tile {
    type Tiling = Tiled;
    const NAME: &'static str = "tile";
}

// =====
// Index
// =====

/// An ordered tuple of offsets, tagged with its granularity `K`.
///
/// The rank of an index is its number of offsets. Indices are compared lexicographically.
/// Indices of different kinds are distinct types and cannot be mixed; they are converted
/// into one another only through a tiling (see [`crate::tiled_array::TiledRange::tile_of`] and
/// [`crate::tiled_array::TiledRange::elements_of`]).
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Index<K: IndexKind> {
    components: Vec<usize>,
    #[serde(skip)]
    kind: PhantomData<K>,
}

/// An index of a single tensor element.
pub type ElementIndex = Index<Element>;

/// An index of a tile.
pub type TileIndex = Index<Tile>;

impl<K: IndexKind> Index<K> {
    pub fn new(components: Vec<usize>) -> Self {
        Self {
            components,
            kind: PhantomData,
        }
    }

    /// Returns the rank of this index.
    pub fn size(&self) -> usize {
        self.components.len()
    }

    /// Returns the offset along mode `i`.
    ///
    /// # Errors
    ///
    /// Errors if `i` is not smaller than the rank of this index.
    pub fn at(&self, i: usize) -> Result<usize, anyhow::Error> {
        self.components.get(i).copied().ok_or_else(|| {
            format_err!(SparseMapError::OutOfRange(format!(
                "mode {i} of the rank-{} index {self}",
                self.size()
            )))
        })
    }

    pub fn components(&self) -> &[usize] {
        &self.components
    }

    pub fn into_components(self) -> Vec<usize> {
        self.components
    }

    /// Returns the index formed by the offsets of `self` followed by those of `other`.
    pub fn concat(&self, other: &Self) -> Self {
        self.components
            .iter()
            .chain(other.components.iter())
            .copied()
            .collect()
    }
}

impl<K: IndexKind> Deref for Index<K> {
    type Target = [usize];

    fn deref(&self) -> &Self::Target {
        &self.components
    }
}

impl<K: IndexKind> From<Vec<usize>> for Index<K> {
    fn from(components: Vec<usize>) -> Self {
        Self::new(components)
    }
}

impl<K: IndexKind> From<&[usize]> for Index<K> {
    fn from(components: &[usize]) -> Self {
        Self::new(components.to_vec())
    }
}

impl<K: IndexKind, const N: usize> From<[usize; N]> for Index<K> {
    fn from(components: [usize; N]) -> Self {
        Self::new(components.to_vec())
    }
}

impl<K: IndexKind> FromIterator<usize> for Index<K> {
    fn from_iter<T: IntoIterator<Item = usize>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a, K: IndexKind> IntoIterator for &'a Index<K> {
    type Item = &'a usize;
    type IntoIter = std::slice::Iter<'a, usize>;

    fn into_iter(self) -> Self::IntoIter {
        self.components.iter()
    }
}

impl<K: IndexKind> fmt::Display for Index<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.components.iter().join(", "))
    }
}

impl<K: IndexKind> fmt::Debug for Index<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} index {self}", K::NAME)
    }
}
