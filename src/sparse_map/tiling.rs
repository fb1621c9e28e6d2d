//! Tiling attachments of domains and sparse maps.
//!
//! Containers of tile indices may be tied to a [`TiledRange`] that every contained index must
//! respect; containers of element indices never are. The choice is made by
//! [`IndexKind::Tiling`](crate::sparse_map::IndexKind::Tiling), so that mixing tiled and untiled
//! containers is rejected by the type system rather than at run time.

use std::fmt;
use std::hash::Hash;

use anyhow::{self, format_err};
use itertools::Itertools;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::SparseMapError;
use crate::tiled_array::TiledRange;

/// Trait for the tiling state carried by a container of indices.
pub trait TilingState:
    Clone
    + fmt::Debug
    + Default
    + PartialEq
    + Eq
    + Hash
    + Send
    + Sync
    + Serialize
    + DeserializeOwned
    + 'static
{
    /// Returns the attached tiling, if any.
    fn trange(&self) -> Option<&TiledRange>;

    /// Constructs the state holding `trange`. States that cannot hold a tiling ignore it.
    fn from_trange(trange: Option<&TiledRange>) -> Self;

    /// Checks that `idx` is a valid tile of the attached tiling. This always succeeds when no
    /// tiling is attached.
    ///
    /// # Errors
    ///
    /// Errors with [`SparseMapError::OutOfRange`] if `idx` is not a tile of the attached
    /// tiling.
    fn check_index(&self, idx: &[usize]) -> Result<(), anyhow::Error> {
        match self.trange() {
            Some(trange) if !trange.includes_tile(idx) => Err(format_err!(
                SparseMapError::OutOfRange(format!(
                    "{{{}}} is not a tile of the tiling {trange}",
                    idx.iter().join(", ")
                ))
            )),
            _ => Ok(()),
        }
    }

    fn is_tiled(&self) -> bool {
        self.trange().is_some()
    }
}

/// The tiling state of element-index containers: never tiled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Untiled;

impl TilingState for Untiled {
    fn trange(&self) -> Option<&TiledRange> {
        None
    }

    fn from_trange(_: Option<&TiledRange>) -> Self {
        Self
    }
}

/// The tiling state of tile-index containers: optionally tied to a [`TiledRange`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tiled {
    trange: Option<TiledRange>,
}

impl TilingState for Tiled {
    fn trange(&self) -> Option<&TiledRange> {
        self.trange.as_ref()
    }

    fn from_trange(trange: Option<&TiledRange>) -> Self {
        Self {
            trange: trange.cloned(),
        }
    }
}

// -----------------
// Binary operations
// -----------------

/// Returns the tiling of the Cartesian product of two non-empty tiled operands.
///
/// Either both operands are tiled, in which case the product tiling concatenates their modes,
/// or neither is.
pub(crate) fn product_tiling<S: TilingState>(lhs: &S, rhs: &S) -> Result<S, anyhow::Error> {
    match (lhs.trange(), rhs.trange()) {
        (Some(l), Some(r)) => Ok(S::from_trange(Some(&l.product(r)))),
        (None, None) => Ok(S::default()),
        (l, r) => Err(SparseMapError::TilingMismatch(format!(
            "cannot take the product of operands with tilings {} and {}",
            describe(l),
            describe(r)
        ))
        .into()),
    }
}

/// Returns the tiling shared by two non-empty operands of a union or an intersection.
pub(crate) fn common_tiling<S: TilingState>(
    lhs: &S,
    rhs: &S,
    operation: &str,
) -> Result<S, anyhow::Error> {
    if lhs == rhs {
        Ok(lhs.clone())
    } else {
        Err(SparseMapError::TilingMismatch(format!(
            "cannot take the {operation} of operands with tilings {} and {}",
            describe(lhs.trange()),
            describe(rhs.trange())
        ))
        .into())
    }
}

fn describe(trange: Option<&TiledRange>) -> String {
    trange.map_or_else(|| "(none)".to_string(), ToString::to_string)
}
