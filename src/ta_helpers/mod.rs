//! Helper routines operating on whole tiled arrays.
//!
//! These routines select or compress the tiles of tiled matrices ([`sparsify_basis`],
//! [`submatrix`], [`expand_submatrix`]) and compare tiled arrays within tolerances
//! ([`allclose`], [`allclose_tot`]).

mod allclose;
mod sparsify;
mod submatrix;

pub use allclose::{allclose, allclose_tot};
pub use sparsify::sparsify_basis;
pub use submatrix::{expand_submatrix, submatrix};
