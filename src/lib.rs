//! # Chemist: sparse maps for block-sparse tensors-of-tensors
//!
//! Chemist provides the sparse-map algebra used by reduced-scaling electronic-structure methods
//! to describe which blocks of a tensor are relevant to each index of another space, together
//! with the routines that turn such descriptions into tensors-of-tensors and back:
//! - element and tile indices of arbitrary rank ([`sparse_map::Index`]),
//! - ordered sets of indices with Cartesian product, union, intersection and mode injection
//!   ([`sparse_map::Domain`]),
//! - maps from independent indices to domains of dependent indices, at element or tile
//!   granularity, with pointwise set algebra, inversion, chaining and conversions between
//!   granularities ([`sparse_map::SparseMap`]),
//! - construction of tensors-of-tensors from a tensor and a sparse map, and their reduction by
//!   summation ([`tot`]), and
//! - tile selection helpers for tiled matrices ([`ta_helpers`]).
//!
//! Tiled tensors are stored in the in-process block-sparse arrays of [`tiled_array`], whose tiles
//! are generated in parallel.
//!
//! ## Errors
//!
//! Fallible functions return [`anyhow::Error`]. Failures of the sparse-map algebra are raised as
//! [`error::SparseMapError`] values and can be recovered with
//! [`anyhow::Error::downcast_ref`].
//!
//! ## Logging
//!
//! Progress is reported through the [`log`] facade. The drivers in [`drivers`] additionally write
//! formatted reports to the `chemist-output` log target.
//!
//! ## Examples and usage
//!
//! For most items (structs, enums, functions, and traits), their usages are illustrated in test
//! functions.
//!
//! ## License
//!
//! GNU Lesser General Public License v3.0.

pub mod drivers;
pub mod error;
pub mod io;
pub mod sparse_map;
pub mod ta_helpers;
pub mod tiled_array;
pub mod tot;
