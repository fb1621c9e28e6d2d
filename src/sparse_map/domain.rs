//! Ordered sets of same-rank indices.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Add, BitXor, Mul};

use anyhow::{self, format_err};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::error::SparseMapError;
use crate::sparse_map::index::{Index, IndexKind, Tile};
use crate::sparse_map::tiling::{common_tiling, product_tiling, Tiled, TilingState};
use crate::tiled_array::TiledRange;

#[cfg(test)]
#[path = "domain_tests.rs"]
mod domain_tests;

// ==================
// Struct definitions
// ==================

/// An ordered set of indices of a common rank.
///
/// A domain describes which positions along some tensor modes are kept in a given context.
/// Its indices are stored in ascending lexicographic order without duplicates. Alongside the
/// indices, a domain maintains its *mode map*: for every mode, the sorted distinct offsets
/// found along that mode. The mode map defines the shape of the smallest dense tensor covering
/// the domain ([`Self::result_extents`]) and the position of each index inside that tensor
/// ([`Self::result_index`]).
///
/// Domains of tile indices may be tied to a [`TiledRange`], in which case every index must be a
/// tile of that tiling.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(bound = "", try_from = "DomainRepr<K>", into = "DomainRepr<K>")]
pub struct Domain<K: IndexKind> {
    /// The indices, sorted and unique.
    indices: Vec<Index<K>>,

    /// The sorted distinct offsets along each mode.
    mode_map: Vec<Vec<usize>>,

    /// The attached tiling, if the kind allows one.
    tiling: K::Tiling,
}

/// The persisted form of a [`Domain`]. The mode map is not persisted but rebuilt on loading.
#[derive(Clone, Serialize, Deserialize)]
#[serde(bound = "")]
struct DomainRepr<K: IndexKind> {
    indices: Vec<Index<K>>,
    tiling: K::Tiling,
}

impl<K: IndexKind> From<Domain<K>> for DomainRepr<K> {
    fn from(domain: Domain<K>) -> Self {
        Self {
            indices: domain.indices,
            tiling: domain.tiling,
        }
    }
}

impl<K: IndexKind> TryFrom<DomainRepr<K>> for Domain<K> {
    type Error = anyhow::Error;

    fn try_from(repr: DomainRepr<K>) -> Result<Self, Self::Error> {
        let mut domain = Self {
            tiling: repr.tiling,
            ..Self::default()
        };
        for idx in repr.indices {
            domain.insert(idx)?;
        }
        Ok(domain)
    }
}

// ===============
// Implementations
// ===============

impl<K: IndexKind> Domain<K> {
    /// Constructs an empty domain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Constructs a domain by inserting indices one by one.
    ///
    /// # Errors
    ///
    /// Errors if the indices do not share a common rank.
    pub fn from_indices<I, T>(indices: I) -> Result<Self, anyhow::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<Index<K>>,
    {
        let mut domain = Self::new();
        for idx in indices {
            domain.insert(idx.into())?;
        }
        Ok(domain)
    }

    /// Constructs a domain from indices known to share one rank, sorting and deduplicating
    /// them.
    fn from_parts(mut indices: Vec<Index<K>>, tiling: K::Tiling) -> Self {
        indices.sort();
        indices.dedup();
        let mut domain = Self {
            indices,
            mode_map: Vec::new(),
            tiling,
        };
        domain.rebuild_mode_map();
        domain
    }

    fn rebuild_mode_map(&mut self) {
        self.mode_map = (0..self.rank())
            .map(|mode| {
                self.indices
                    .iter()
                    .map(|idx| idx[mode])
                    .sorted()
                    .dedup()
                    .collect_vec()
            })
            .collect_vec();
    }

    /// Returns the rank of the indices in this domain, or zero if this domain is empty.
    pub fn rank(&self) -> usize {
        self.indices.first().map_or(0, |idx| idx.size())
    }

    /// Returns the number of indices in this domain.
    pub fn size(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Returns `true` if `idx` is in this domain.
    pub fn count(&self, idx: &Index<K>) -> bool {
        self.indices.binary_search(idx).is_ok()
    }

    /// Returns the `i`-th index in lexicographic order.
    ///
    /// # Errors
    ///
    /// Errors if `i` is not smaller than [`Self::size`].
    pub fn at(&self, i: usize) -> Result<&Index<K>, anyhow::Error> {
        self.indices.get(i).ok_or_else(|| {
            format_err!(SparseMapError::OutOfRange(format!(
                "ordinal {i} of a domain of size {}",
                self.size()
            )))
        })
    }

    pub fn get(&self, i: usize) -> Option<&Index<K>> {
        self.indices.get(i)
    }

    /// Iterates over the indices in lexicographic order.
    pub fn iter(&self) -> std::slice::Iter<'_, Index<K>> {
        self.indices.iter()
    }

    /// Returns the attached tiling, if any.
    pub fn trange(&self) -> Option<&TiledRange> {
        self.tiling.trange()
    }

    pub(crate) fn tiling(&self) -> &K::Tiling {
        &self.tiling
    }

    /// Constructs an empty domain carrying a given tiling state.
    pub(crate) fn with_tiling(tiling: K::Tiling) -> Self {
        Self {
            tiling,
            ..Self::default()
        }
    }

    /// Inserts an index into this domain. Inserting an index that is already present has no
    /// effect.
    ///
    /// If the insertion fails, the domain is left unchanged.
    ///
    /// # Errors
    ///
    /// Errors with [`SparseMapError::RankMismatch`] if the domain is non-empty and `idx` has a
    /// different rank, or with [`SparseMapError::OutOfRange`] if `idx` is not a tile of the
    /// attached tiling.
    pub fn insert(&mut self, idx: Index<K>) -> Result<(), anyhow::Error> {
        if !self.is_empty() && idx.size() != self.rank() {
            return Err(
                SparseMapError::rank_mismatch("domain insertion", self.rank(), idx.size()).into(),
            );
        }
        self.tiling.check_index(&idx)?;
        if let Err(pos) = self.indices.binary_search(&idx) {
            if self.mode_map.len() != idx.size() {
                self.mode_map = vec![Vec::new(); idx.size()];
            }
            for (offsets, &offset) in self.mode_map.iter_mut().zip(idx.iter()) {
                if let Err(offset_pos) = offsets.binary_search(&offset) {
                    offsets.insert(offset_pos, offset);
                }
            }
            self.indices.insert(pos, idx);
        }
        Ok(())
    }

    // --------------
    // Result indices
    // --------------

    /// Returns the shape of the smallest dense tensor covering this domain: for each mode, the
    /// number of distinct offsets along that mode.
    pub fn result_extents(&self) -> Vec<usize> {
        self.mode_map.iter().map(Vec::len).collect_vec()
    }

    /// Returns the position of `idx` in the dense tensor of shape [`Self::result_extents`].
    ///
    /// # Errors
    ///
    /// Errors with [`SparseMapError::NotFound`] if `idx` is not in this domain.
    pub fn result_index(&self, idx: &Index<K>) -> Result<Vec<usize>, anyhow::Error> {
        if !self.count(idx) {
            return Err(SparseMapError::NotFound(format!("{idx} is not in the domain {self}")).into());
        }
        idx.iter()
            .zip(self.mode_map.iter())
            .map(|(offset, offsets)| {
                offsets.binary_search(offset).map_err(|_| {
                    format_err!(SparseMapError::NotFound(format!(
                        "offset {offset} of {idx} is not in the mode map"
                    )))
                })
            })
            .collect()
    }

    /// Returns a domain of higher rank obtained by inserting fixed offsets into every index.
    ///
    /// # Arguments
    ///
    /// * `injections` - A map from a mode of the resulting indices to the offset held by that
    /// mode. The remaining modes are filled by the modes of the original indices, in order.
    ///
    /// # Returns
    ///
    /// The injected domain, of rank `self.rank() + injections.len()`. The result carries no
    /// tiling. Injecting into an empty domain gives an empty domain.
    ///
    /// # Errors
    ///
    /// Errors with [`SparseMapError::OutOfRange`] if an injected mode is not smaller than the
    /// rank of the result.
    pub fn inject(&self, injections: &BTreeMap<usize, usize>) -> Result<Self, anyhow::Error> {
        if self.is_empty() {
            return Ok(Self::new());
        }
        let new_rank = self.rank() + injections.len();
        if let Some(mode) = injections.keys().find(|&&mode| mode >= new_rank) {
            return Err(SparseMapError::OutOfRange(format!(
                "mode {mode} cannot be injected into indices of rank {new_rank}"
            ))
            .into());
        }
        let indices = self
            .indices
            .iter()
            .map(|idx| {
                let mut old_offsets = idx.iter();
                (0..new_rank)
                    .filter_map(|mode| {
                        injections
                            .get(&mode)
                            .or_else(|| old_offsets.next())
                            .copied()
                    })
                    .collect::<Index<K>>()
            })
            .collect_vec();
        Ok(Self::from_parts(indices, K::Tiling::default()))
    }

    // -------
    // Algebra
    // -------

    /// Returns the Cartesian product of this domain with `rhs`.
    ///
    /// The indices of the product are the concatenations of every index of `self` with every
    /// index of `rhs`. The product of two tiled domains is tiled by the product of their
    /// tilings.
    ///
    /// The product with an empty domain is empty. An empty `self` is returned as is, tiling
    /// included, whereas an empty `rhs` yields an untiled empty domain. Tilings are not compared
    /// in either case.
    ///
    /// # Errors
    ///
    /// Errors with [`SparseMapError::TilingMismatch`] if both operands are non-empty and exactly
    /// one of them is tiled.
    pub fn product(&self, rhs: &Self) -> Result<Self, anyhow::Error> {
        if rhs.is_empty() {
            return Ok(Self::new());
        }
        if self.is_empty() {
            return Ok(self.clone());
        }
        let tiling = product_tiling(&self.tiling, &rhs.tiling)?;
        let indices = self
            .indices
            .iter()
            .cartesian_product(rhs.indices.iter())
            .map(|(l, r)| l.concat(r))
            .collect_vec();
        Ok(Self::from_parts(indices, tiling))
    }

    /// Replaces this domain with its Cartesian product with `rhs`. See [`Self::product`].
    pub fn product_assign(&mut self, rhs: &Self) -> Result<(), anyhow::Error> {
        *self = self.product(rhs)?;
        Ok(())
    }

    /// Returns the union of this domain with `rhs`.
    ///
    /// If either operand is empty, the union is the other operand, tiling included. Tilings are
    /// only compared when both operands are non-empty.
    ///
    /// # Errors
    ///
    /// Errors with [`SparseMapError::RankMismatch`] if both operands are non-empty with
    /// different ranks, or with [`SparseMapError::TilingMismatch`] if their tilings differ.
    pub fn union(&self, rhs: &Self) -> Result<Self, anyhow::Error> {
        if self.is_empty() {
            return Ok(rhs.clone());
        }
        if rhs.is_empty() {
            return Ok(self.clone());
        }
        if self.rank() != rhs.rank() {
            return Err(SparseMapError::rank_mismatch("domain union", self.rank(), rhs.rank()).into());
        }
        let tiling = common_tiling(&self.tiling, &rhs.tiling, "union")?;
        let indices = self
            .indices
            .iter()
            .merge(rhs.indices.iter())
            .dedup()
            .cloned()
            .collect_vec();
        Ok(Self::from_parts(indices, tiling))
    }

    /// Replaces this domain with its union with `rhs`. See [`Self::union`].
    pub fn union_assign(&mut self, rhs: &Self) -> Result<(), anyhow::Error> {
        *self = self.union(rhs)?;
        Ok(())
    }

    /// Returns the intersection of this domain with `rhs`.
    ///
    /// Domains of different ranks intersect to the empty domain, as does any domain with an
    /// empty one.
    ///
    /// # Errors
    ///
    /// Errors with [`SparseMapError::TilingMismatch`] if both operands are non-empty and their
    /// tilings differ.
    pub fn intersection(&self, rhs: &Self) -> Result<Self, anyhow::Error> {
        if self.is_empty() || rhs.is_empty() || self.rank() != rhs.rank() {
            return Ok(Self::new());
        }
        let tiling = common_tiling(&self.tiling, &rhs.tiling, "intersection")?;
        let indices = self
            .indices
            .iter()
            .filter(|idx| rhs.count(idx))
            .cloned()
            .collect_vec();
        Ok(Self::from_parts(indices, tiling))
    }

    /// Replaces this domain with its intersection with `rhs`. See [`Self::intersection`].
    pub fn intersection_assign(&mut self, rhs: &Self) -> Result<(), anyhow::Error> {
        *self = self.intersection(rhs)?;
        Ok(())
    }
}

impl Domain<Tile> {
    /// Constructs an empty domain tied to a tiling.
    pub fn with_trange(trange: TiledRange) -> Self {
        Self::with_tiling(Tiled::from_trange(Some(&trange)))
    }

    /// Ties this domain to a tiling.
    ///
    /// # Errors
    ///
    /// Errors with [`SparseMapError::OutOfRange`] if an index already in this domain is not a
    /// tile of `trange`. The domain is left unchanged in that case.
    pub fn set_trange(&mut self, trange: TiledRange) -> Result<(), anyhow::Error> {
        let tiling = Tiled::from_trange(Some(&trange));
        self.indices
            .iter()
            .try_for_each(|idx| tiling.check_index(idx))?;
        self.tiling = tiling;
        Ok(())
    }
}

impl<K: IndexKind> fmt::Display for Domain<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.indices.iter().join(", "))
    }
}

impl<'a, K: IndexKind> IntoIterator for &'a Domain<K> {
    type Item = &'a Index<K>;
    type IntoIter = std::slice::Iter<'a, Index<K>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// ---------
// Operators
// ---------

impl<K: IndexKind> Mul<&'_ Domain<K>> for &'_ Domain<K> {
    type Output = Result<Domain<K>, anyhow::Error>;

    fn mul(self, rhs: &Domain<K>) -> Self::Output {
        self.product(rhs)
    }
}

impl<K: IndexKind> Add<&'_ Domain<K>> for &'_ Domain<K> {
    type Output = Result<Domain<K>, anyhow::Error>;

    fn add(self, rhs: &Domain<K>) -> Self::Output {
        self.union(rhs)
    }
}

impl<K: IndexKind> BitXor<&'_ Domain<K>> for &'_ Domain<K> {
    type Output = Result<Domain<K>, anyhow::Error>;

    fn bitxor(self, rhs: &Domain<K>) -> Self::Output {
        self.intersection(rhs)
    }
}
