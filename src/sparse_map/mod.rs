//! Sparse maps and domains of element and tile indices.
//!
//! A [`SparseMap`] maps every independent index to a [`Domain`] of dependent indices. Both kinds
//! of index come in two granularities, [`Element`] and [`Tile`], giving four kinds of sparse
//! maps that share one generic implementation. Containers of tile indices may be tied to a
//! [`TiledRange`](crate::tiled_array::TiledRange), through which they are converted to and from
//! element granularity.

pub mod domain;
pub mod index;
pub mod sparse_map_base;
pub mod sparse_map_conversion;
pub mod tiling;

pub use domain::Domain;
pub use index::{Element, ElementIndex, Index, IndexKind, Tile, TileIndex};
pub use sparse_map_base::SparseMap;
pub use tiling::{Tiled, TilingState, Untiled};

/// A sparse map from element indices to element indices.
pub type SparseMapEE = SparseMap<Element, Element>;

/// A sparse map from element indices to tile indices.
pub type SparseMapET = SparseMap<Element, Tile>;

/// A sparse map from tile indices to element indices.
pub type SparseMapTE = SparseMap<Tile, Element>;

/// A sparse map from tile indices to tile indices.
pub type SparseMapTT = SparseMap<Tile, Tile>;
