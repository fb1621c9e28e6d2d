//! In-process tiled tensor storage consumed by the sparse-map routines.
//!
//! This module provides the tiling descriptions ([`TiledRange1`], [`TiledRange`]), dense tiles
//! ([`Tensor`]) and block-sparse arrays of tiles ([`DistArray`]) on which tensors-of-tensors are
//! built. Tiles of a [`DistArray`] are generated in parallel on the global `rayon` pool.

pub mod dist_array;
pub mod range;
pub mod tensor;
pub mod tiled_range;

pub use dist_array::{DistArray, TensorOfTensors};
pub use range::Range;
pub use tensor::Tensor;
pub use tiled_range::{TiledRange, TiledRange1};
