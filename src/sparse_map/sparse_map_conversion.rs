//! Conversions between element and tile granularity.
//!
//! Tile indices are expanded into the element indices they contain with the tiling attached to
//! the map or its domains; element indices are collapsed into the tiles containing them with a
//! tiling supplied by the caller.

use anyhow::{self, format_err};

use crate::error::SparseMapError;
use crate::sparse_map::domain::Domain;
use crate::sparse_map::index::{Element, IndexKind, Tile};
use crate::sparse_map::sparse_map_base::SparseMap;
use crate::sparse_map::tiling::{Tiled, TilingState, Untiled};
use crate::tiled_array::TiledRange;

#[cfg(test)]
#[path = "sparse_map_conversion_tests.rs"]
mod sparse_map_conversion_tests;

impl<I: IndexKind> SparseMap<I, Tile> {
    /// Expands every dependent tile into the element indices it contains, using the tiling
    /// attached to each domain.
    ///
    /// # Errors
    ///
    /// Errors with [`SparseMapError::MissingTiling`] if a domain carries no tiling.
    pub fn expand_dependent(&self) -> Result<SparseMap<I, Element>, anyhow::Error> {
        let mut result = SparseMap::with_tilings(self.tiling().clone(), Untiled);
        for (ind, domain) in self.iter() {
            let trange = domain.trange().ok_or_else(|| {
                format_err!(SparseMapError::MissingTiling(format!(
                    "the domain of {ind} has no tiling to expand its tiles with"
                )))
            })?;
            let mut edomain = Domain::new();
            for tile in domain {
                for element in trange.elements_of(tile)? {
                    edomain.insert(element)?;
                }
            }
            result.set_domain(ind.clone(), edomain);
        }
        Ok(result)
    }
}

impl<D: IndexKind> SparseMap<Tile, D> {
    /// Expands every independent tile into the element indices it contains, using the
    /// independent tiling of this map. Every element of a tile is mapped to the domain of that
    /// tile.
    ///
    /// # Errors
    ///
    /// Errors with [`SparseMapError::MissingTiling`] if this map has no independent tiling.
    pub fn expand_independent(&self) -> Result<SparseMap<Element, D>, anyhow::Error> {
        let trange = self.trange().ok_or_else(|| {
            format_err!(SparseMapError::MissingTiling(
                "the sparse map has no independent tiling to expand its tiles with".to_string()
            ))
        })?;
        let mut result = SparseMap::with_tilings(Untiled, self.dep_tiling().clone());
        for (ind, domain) in self.iter() {
            for element in trange.elements_of(ind)? {
                result.set_domain(element, domain.clone());
            }
        }
        Ok(result)
    }
}

impl<D: IndexKind> SparseMap<Element, D> {
    /// Collapses every independent element index into the tile of `trange` containing it. The
    /// domain of a tile is the union of the domains of its elements.
    ///
    /// # Errors
    ///
    /// Errors with [`SparseMapError::RankMismatch`] if the rank of `trange` differs from the
    /// independent rank of this map, or if an independent index lies outside `trange`.
    pub fn tile_independent(&self, trange: &TiledRange) -> Result<SparseMap<Tile, D>, anyhow::Error> {
        if !self.is_empty() && trange.rank() != self.ind_rank() {
            return Err(SparseMapError::rank_mismatch(
                "independent tiling",
                self.ind_rank(),
                trange.rank(),
            )
            .into());
        }
        let mut result =
            SparseMap::with_tilings(Tiled::from_trange(Some(trange)), self.dep_tiling().clone());
        for (ind, domain) in self.iter() {
            let tile = trange.tile_of(ind)?;
            result.domain_mut(tile)?.union_assign(domain)?;
        }
        Ok(result)
    }
}

impl<I: IndexKind> SparseMap<I, Element> {
    /// Collapses every dependent element index into the tile of `trange` containing it. The
    /// resulting domains are tied to `trange`.
    ///
    /// # Errors
    ///
    /// Errors with [`SparseMapError::RankMismatch`] if the rank of `trange` differs from the
    /// dependent rank of this map, or if a dependent index lies outside `trange`.
    pub fn tile_dependent(&self, trange: &TiledRange) -> Result<SparseMap<I, Tile>, anyhow::Error> {
        if self.dep_rank() != 0 && trange.rank() != self.dep_rank() {
            return Err(SparseMapError::rank_mismatch(
                "dependent tiling",
                self.dep_rank(),
                trange.rank(),
            )
            .into());
        }
        let mut result =
            SparseMap::with_tilings(self.tiling().clone(), Tiled::from_trange(Some(trange)));
        for (ind, domain) in self.iter() {
            let tdomain = result.domain_mut(ind.clone())?;
            for element in domain {
                tdomain.insert(trange.tile_of(element)?)?;
            }
        }
        Ok(result)
    }
}

// ---------------------
// Granularity expansion
// ---------------------

impl<I: IndexKind> TryFrom<&SparseMap<I, Tile>> for SparseMap<I, Element> {
    type Error = anyhow::Error;

    fn try_from(sm: &SparseMap<I, Tile>) -> Result<Self, Self::Error> {
        sm.expand_dependent()
    }
}

impl<D: IndexKind> TryFrom<&SparseMap<Tile, D>> for SparseMap<Element, D> {
    type Error = anyhow::Error;

    fn try_from(sm: &SparseMap<Tile, D>) -> Result<Self, Self::Error> {
        sm.expand_independent()
    }
}

impl TryFrom<&SparseMap<Tile, Tile>> for SparseMap<Element, Element> {
    type Error = anyhow::Error;

    fn try_from(sm: &SparseMap<Tile, Tile>) -> Result<Self, Self::Error> {
        sm.expand_dependent()?.expand_independent()
    }
}
