//! Maps from independent indices to domains of dependent indices.

use std::collections::btree_map::{self, BTreeMap};
use std::fmt;
use std::hash::{Hash, Hasher};

use anyhow::{self, format_err};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::error::SparseMapError;
use crate::sparse_map::domain::Domain;
use crate::sparse_map::index::{Index, IndexKind, Tile};
use crate::sparse_map::tiling::{common_tiling, product_tiling, Tiled, TilingState};
use crate::tiled_array::TiledRange;

#[cfg(test)]
#[path = "sparse_map_base_tests.rs"]
mod sparse_map_base_tests;

// ==================
// Struct definitions
// ==================

/// An ordered map from independent indices of kind `I` to domains of dependent indices of
/// kind `D`.
///
/// A sparse map records, for every independent index, which dependent indices are reachable
/// from it. All independent indices share one rank, as do all dependent indices.
///
/// When `I` is [`Tile`], the map may be tied to a tiling of the independent space, which every
/// independent index must respect. When `D` is [`Tile`], the map may carry a tiling of the
/// dependent space, which is attached to every domain it creates.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(bound = "", try_from = "SparseMapRepr<I, D>", into = "SparseMapRepr<I, D>")]
pub struct SparseMap<I: IndexKind, D: IndexKind> {
    /// The domains, keyed by independent index.
    domains: BTreeMap<Index<I>, Domain<D>>,

    /// The tiling of the independent space.
    tiling: I::Tiling,

    /// The tiling of the dependent space, attached to newly created domains.
    dep_tiling: D::Tiling,
}

/// The persisted form of a [`SparseMap`].
#[derive(Clone, Serialize, Deserialize)]
#[serde(bound = "")]
struct SparseMapRepr<I: IndexKind, D: IndexKind> {
    entries: Vec<(Index<I>, Domain<D>)>,
    tiling: I::Tiling,
    dep_tiling: D::Tiling,
}

impl<I: IndexKind, D: IndexKind> From<SparseMap<I, D>> for SparseMapRepr<I, D> {
    fn from(sm: SparseMap<I, D>) -> Self {
        Self {
            entries: sm.domains.into_iter().collect_vec(),
            tiling: sm.tiling,
            dep_tiling: sm.dep_tiling,
        }
    }
}

impl<I: IndexKind, D: IndexKind> TryFrom<SparseMapRepr<I, D>> for SparseMap<I, D> {
    type Error = anyhow::Error;

    fn try_from(repr: SparseMapRepr<I, D>) -> Result<Self, Self::Error> {
        let mut sm = Self::with_tilings(repr.tiling, repr.dep_tiling);
        for (ind, domain) in repr.entries {
            sm.check_independent(&ind)?;
            if let (Some(rank), false) = (sm.established_dep_rank(), domain.is_empty()) {
                if rank != domain.rank() {
                    return Err(
                        SparseMapError::rank_mismatch("sparse map loading", rank, domain.rank())
                            .into(),
                    );
                }
            }
            sm.domains.insert(ind, domain);
        }
        Ok(sm)
    }
}

// ===============
// Implementations
// ===============

impl<I: IndexKind, D: IndexKind> SparseMap<I, D> {
    /// Constructs an empty sparse map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Constructs an empty sparse map with given independent and dependent tiling states.
    pub(crate) fn with_tilings(tiling: I::Tiling, dep_tiling: D::Tiling) -> Self {
        Self {
            domains: BTreeMap::new(),
            tiling,
            dep_tiling,
        }
    }

    /// Constructs a sparse map from pairs of an independent index and the dependent indices
    /// reachable from it. An independent index paired with no dependent indices is mapped to
    /// an empty domain.
    ///
    /// # Errors
    ///
    /// Errors if the independent or the dependent indices do not share a common rank.
    pub fn from_pairs<P, II, DI, DD>(pairs: P) -> Result<Self, anyhow::Error>
    where
        P: IntoIterator<Item = (II, DI)>,
        II: Into<Index<I>>,
        DI: IntoIterator<Item = DD>,
        DD: Into<Index<D>>,
    {
        let mut sm = Self::new();
        for (ind, deps) in pairs {
            let ind = ind.into();
            sm.domain_mut(ind.clone())?;
            for dep in deps {
                sm.add_to_domain(ind.clone(), dep.into())?;
            }
        }
        Ok(sm)
    }

    // -------
    // Queries
    // -------

    /// Returns the number of independent indices.
    pub fn size(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    /// Returns `true` if `ind` has a domain in this map.
    pub fn count(&self, ind: &Index<I>) -> bool {
        self.domains.contains_key(ind)
    }

    /// Returns the rank of the independent indices, or zero if this map is empty.
    pub fn ind_rank(&self) -> usize {
        self.domains.keys().next().map_or(0, |ind| ind.size())
    }

    /// Returns the rank of the dependent indices, or zero if every domain is empty.
    pub fn dep_rank(&self) -> usize {
        self.domains
            .values()
            .map(Domain::rank)
            .find(|&rank| rank > 0)
            .unwrap_or(0)
    }

    /// Returns the rank of the dependent indices, if any domain is non-empty.
    fn established_dep_rank(&self) -> Option<usize> {
        self.domains
            .values()
            .find(|domain| !domain.is_empty())
            .map(Domain::rank)
    }

    /// Returns the domain of `ind`.
    ///
    /// # Errors
    ///
    /// Errors with [`SparseMapError::OutOfRange`] if `ind` has no domain in this map.
    pub fn at(&self, ind: &Index<I>) -> Result<&Domain<D>, anyhow::Error> {
        self.domains.get(ind).ok_or_else(|| {
            format_err!(SparseMapError::OutOfRange(format!(
                "{ind} is not an independent index of the sparse map"
            )))
        })
    }

    pub fn get(&self, ind: &Index<I>) -> Option<&Domain<D>> {
        self.domains.get(ind)
    }

    /// Returns the `i`-th entry in independent-index order.
    ///
    /// # Errors
    ///
    /// Errors with [`SparseMapError::OutOfRange`] if `i` is not smaller than [`Self::size`].
    pub fn get_index(&self, i: usize) -> Result<(&Index<I>, &Domain<D>), anyhow::Error> {
        self.domains.iter().nth(i).ok_or_else(|| {
            format_err!(SparseMapError::OutOfRange(format!(
                "ordinal {i} of a sparse map of size {}",
                self.size()
            )))
        })
    }

    /// Iterates over the entries in independent-index order.
    pub fn iter(&self) -> btree_map::Iter<'_, Index<I>, Domain<D>> {
        self.domains.iter()
    }

    /// Returns the tiling of the independent space, if any.
    pub fn trange(&self) -> Option<&TiledRange> {
        self.tiling.trange()
    }

    /// Returns the tiling attached to the domains created by this map, if any.
    pub fn domain_trange(&self) -> Option<&TiledRange> {
        self.dep_tiling.trange()
    }

    pub(crate) fn tiling(&self) -> &I::Tiling {
        &self.tiling
    }

    pub(crate) fn dep_tiling(&self) -> &D::Tiling {
        &self.dep_tiling
    }

    /// Returns an empty domain carrying the dependent tiling of this map.
    fn empty_domain(&self) -> Domain<D> {
        Domain::with_tiling(self.dep_tiling.clone())
    }

    // --------
    // Mutation
    // --------

    fn check_independent(&self, ind: &Index<I>) -> Result<(), anyhow::Error> {
        self.tiling.check_index(ind)?;
        if !self.is_empty() && ind.size() != self.ind_rank() {
            return Err(SparseMapError::rank_mismatch(
                "independent index of sparse map",
                self.ind_rank(),
                ind.size(),
            )
            .into());
        }
        Ok(())
    }

    /// Adds `dep` to the domain of `ind`, creating the domain if needed.
    ///
    /// If the addition fails, the map is left unchanged.
    ///
    /// # Errors
    ///
    /// Errors with [`SparseMapError::OutOfRange`] if `ind` is not a tile of the independent
    /// tiling or `dep` is not a tile of the dependent tiling, or with
    /// [`SparseMapError::RankMismatch`] if `ind` or `dep` disagrees with the ranks already
    /// established in this map.
    pub fn add_to_domain(&mut self, ind: Index<I>, dep: Index<D>) -> Result<(), anyhow::Error> {
        self.check_independent(&ind)?;
        if let Some(rank) = self.established_dep_rank() {
            if dep.size() != rank {
                return Err(SparseMapError::rank_mismatch(
                    "dependent index of sparse map",
                    rank,
                    dep.size(),
                )
                .into());
            }
        }
        match self.domains.get_mut(&ind) {
            Some(domain) => domain.insert(dep),
            None => {
                let mut domain = self.empty_domain();
                domain.insert(dep)?;
                self.domains.insert(ind, domain);
                Ok(())
            }
        }
    }

    /// Returns mutable access to the domain of `ind`, creating an empty domain if needed.
    ///
    /// # Errors
    ///
    /// Errors if `ind` is not a tile of the independent tiling or if its rank disagrees with
    /// the independent rank of this map.
    pub fn domain_mut(&mut self, ind: Index<I>) -> Result<&mut Domain<D>, anyhow::Error> {
        self.check_independent(&ind)?;
        let domain = self.empty_domain();
        Ok(self.domains.entry(ind).or_insert(domain))
    }

    /// Stores a domain without any check. Callers guarantee the rank and tiling invariants.
    pub(crate) fn set_domain(&mut self, ind: Index<I>, domain: Domain<D>) {
        self.domains.insert(ind, domain);
    }

    // -------
    // Algebra
    // -------

    /// Returns the direct product of this map with `rhs`.
    ///
    /// The independent indices of the result are the concatenations of every independent index
    /// of `self` with every independent index of `rhs`, and each is mapped to the Cartesian
    /// product of the two corresponding domains. Products that are empty are not stored. The
    /// direct product with an empty map is empty.
    ///
    /// # Errors
    ///
    /// Errors with [`SparseMapError::TilingMismatch`] if exactly one of the operands carries an
    /// independent or a dependent tiling.
    pub fn direct_product(&self, rhs: &Self) -> Result<Self, anyhow::Error> {
        if self.is_empty() || rhs.is_empty() {
            return Ok(Self::new());
        }
        let mut result = Self::with_tilings(
            product_tiling(&self.tiling, &rhs.tiling)?,
            product_tiling(&self.dep_tiling, &rhs.dep_tiling)?,
        );
        for ((lind, ldomain), (rind, rdomain)) in self.iter().cartesian_product(rhs.iter()) {
            let domain = ldomain.product(rdomain)?;
            if !domain.is_empty() {
                result.domains.insert(lind.concat(rind), domain);
            }
        }
        Ok(result)
    }

    /// Returns the key-wise product of this map with `rhs`.
    ///
    /// Every independent index of `self` is mapped to the Cartesian product of its domains in
    /// `self` and in `rhs`. Independent indices absent from `rhs` are mapped to an empty domain,
    /// not dropped. The product with an empty map is empty.
    ///
    /// # Errors
    ///
    /// Errors with [`SparseMapError::RankMismatch`] if the independent ranks of the operands
    /// differ, or with [`SparseMapError::TilingMismatch`] if their tilings are incompatible.
    pub fn product(&self, rhs: &Self) -> Result<Self, anyhow::Error> {
        if self.is_empty() || rhs.is_empty() {
            return Ok(Self::new());
        }
        if self.ind_rank() != rhs.ind_rank() {
            return Err(SparseMapError::rank_mismatch(
                "sparse map product",
                self.ind_rank(),
                rhs.ind_rank(),
            )
            .into());
        }
        let mut result = Self::with_tilings(
            common_tiling(&self.tiling, &rhs.tiling, "product")?,
            product_tiling(&self.dep_tiling, &rhs.dep_tiling)?,
        );
        for (ind, ldomain) in self.iter() {
            let domain = match rhs.get(ind) {
                Some(rdomain) => ldomain.product(rdomain)?,
                None => Domain::new(),
            };
            let domain = if domain.is_empty() {
                result.empty_domain()
            } else {
                domain
            };
            result.domains.insert(ind.clone(), domain);
        }
        Ok(result)
    }

    /// Replaces this map with its key-wise product with `rhs`. See [`Self::product`].
    pub fn product_assign(&mut self, rhs: &Self) -> Result<(), anyhow::Error> {
        *self = self.product(rhs)?;
        Ok(())
    }

    /// Returns the key-wise intersection of this map with `rhs`.
    ///
    /// Only independent indices present in both operands whose domains intersect are kept.
    /// Maps of different independent ranks intersect to the empty map.
    ///
    /// # Errors
    ///
    /// Errors with [`SparseMapError::TilingMismatch`] if both operands are non-empty and their
    /// tilings differ.
    pub fn intersection(&self, rhs: &Self) -> Result<Self, anyhow::Error> {
        if self.is_empty() || rhs.is_empty() || self.ind_rank() != rhs.ind_rank() {
            return Ok(Self::new());
        }
        let mut result = Self::with_tilings(
            common_tiling(&self.tiling, &rhs.tiling, "intersection")?,
            common_tiling(&self.dep_tiling, &rhs.dep_tiling, "intersection")?,
        );
        for (ind, ldomain) in self.iter() {
            if let Some(rdomain) = rhs.get(ind) {
                let domain = ldomain.intersection(rdomain)?;
                if !domain.is_empty() {
                    result.domains.insert(ind.clone(), domain);
                }
            }
        }
        Ok(result)
    }

    /// Replaces this map with its key-wise intersection with `rhs`. See [`Self::intersection`].
    pub fn intersection_assign(&mut self, rhs: &Self) -> Result<(), anyhow::Error> {
        *self = self.intersection(rhs)?;
        Ok(())
    }

    /// Returns the key-wise union of this map with `rhs`.
    ///
    /// Every independent index present in either operand is mapped to the union of its
    /// domains. If either operand is empty, the union is the other operand.
    ///
    /// # Errors
    ///
    /// Errors with [`SparseMapError::RankMismatch`] if the independent or dependent ranks of
    /// two non-empty operands differ, or with [`SparseMapError::TilingMismatch`] if their
    /// tilings differ.
    pub fn union(&self, rhs: &Self) -> Result<Self, anyhow::Error> {
        if self.is_empty() {
            return Ok(rhs.clone());
        }
        if rhs.is_empty() {
            return Ok(self.clone());
        }
        if self.ind_rank() != rhs.ind_rank() {
            return Err(SparseMapError::rank_mismatch(
                "sparse map union",
                self.ind_rank(),
                rhs.ind_rank(),
            )
            .into());
        }
        if let (Some(lrank), Some(rrank)) =
            (self.established_dep_rank(), rhs.established_dep_rank())
        {
            if lrank != rrank {
                return Err(
                    SparseMapError::rank_mismatch("sparse map union", lrank, rrank).into(),
                );
            }
        }
        let mut result = Self::with_tilings(
            common_tiling(&self.tiling, &rhs.tiling, "union")?,
            common_tiling(&self.dep_tiling, &rhs.dep_tiling, "union")?,
        );
        result.domains = self.domains.clone();
        for (ind, rdomain) in rhs.iter() {
            match result.domains.get_mut(ind) {
                Some(domain) => domain.union_assign(rdomain)?,
                None => {
                    result.domains.insert(ind.clone(), rdomain.clone());
                }
            }
        }
        Ok(result)
    }

    /// Replaces this map with its key-wise union with `rhs`. See [`Self::union`].
    pub fn union_assign(&mut self, rhs: &Self) -> Result<(), anyhow::Error> {
        *self = self.union(rhs)?;
        Ok(())
    }

    // -----------
    // Composition
    // -----------

    /// Returns the inverse relation, mapping every dependent index to the independent indices
    /// that reach it.
    ///
    /// The independent tiling of the inverse is the tiling carried by the domains of this map,
    /// and the domains of the inverse carry the independent tiling of this map.
    ///
    /// # Errors
    ///
    /// Errors with [`SparseMapError::InconsistentTiling`] if the domains of this map carry
    /// different tilings.
    pub fn inverse(&self) -> Result<SparseMap<D, I>, anyhow::Error> {
        log::debug!("Inverting sparse map with {} entries...", self.size());
        let inv_tiling = match self.domains.values().map(Domain::tiling).dedup().at_most_one() {
            Ok(Some(tiling)) => tiling.clone(),
            Ok(None) => self.dep_tiling.clone(),
            Err(tilings) => {
                return Err(SparseMapError::InconsistentTiling(format!(
                    "domains carry the tilings [{}]",
                    tilings
                        .map(|tiling| tiling
                            .trange()
                            .map_or_else(|| "(none)".to_string(), ToString::to_string))
                        .unique()
                        .join(", ")
                ))
                .into())
            }
        };
        let mut inv = SparseMap::<D, I>::with_tilings(inv_tiling, self.tiling.clone());
        for (ind, domain) in self.iter() {
            for dep in domain {
                match inv.domains.get_mut(dep) {
                    Some(inv_domain) => inv_domain.insert(ind.clone())?,
                    None => {
                        let mut inv_domain = inv.empty_domain();
                        inv_domain.insert(ind.clone())?;
                        inv.domains.insert(dep.clone(), inv_domain);
                    }
                }
            }
        }
        log::debug!("Inverting sparse map with {} entries... Done.", self.size());
        Ok(inv)
    }

    /// Composes this map with `rhs`, mapping every independent index of `self` to the indices
    /// reachable from its dependent indices through `rhs`.
    ///
    /// Dependent indices absent from `rhs` contribute nothing.
    ///
    /// # Errors
    ///
    /// Errors with [`SparseMapError::RankMismatch`] if the dependent rank of `self` differs from
    /// the independent rank of `rhs`. In particular, chaining a non-empty map with an empty one
    /// fails.
    pub fn chain<N: IndexKind>(
        &self,
        rhs: &SparseMap<D, N>,
    ) -> Result<SparseMap<I, N>, anyhow::Error> {
        if self.dep_rank() != rhs.ind_rank() {
            return Err(SparseMapError::rank_mismatch(
                "sparse map chain",
                self.dep_rank(),
                rhs.ind_rank(),
            )
            .into());
        }
        let mut result =
            SparseMap::<I, N>::with_tilings(self.tiling.clone(), rhs.dep_tiling.clone());
        for (ind, domain) in self.iter() {
            for rdomain in domain.iter().filter_map(|dep| rhs.get(dep)) {
                match result.domains.get_mut(ind) {
                    Some(new_domain) => new_domain.union_assign(rdomain)?,
                    None => {
                        result.domains.insert(ind.clone(), rdomain.clone());
                    }
                }
            }
        }
        Ok(result)
    }
}

// -----------------------
// Tiled independent space
// -----------------------

impl<D: IndexKind> SparseMap<Tile, D> {
    /// Constructs an empty sparse map tied to a tiling of the independent space.
    pub fn with_trange(trange: TiledRange) -> Self {
        Self::with_tilings(Tiled::from_trange(Some(&trange)), D::Tiling::default())
    }

    /// Ties this map to a tiling of the independent space.
    ///
    /// # Errors
    ///
    /// Errors with [`SparseMapError::OutOfRange`] if an independent index already in this map
    /// is not a tile of `trange`. The map is left unchanged in that case.
    pub fn set_trange(&mut self, trange: TiledRange) -> Result<(), anyhow::Error> {
        let tiling = Tiled::from_trange(Some(&trange));
        self.domains
            .keys()
            .try_for_each(|ind| tiling.check_index(ind))?;
        self.tiling = tiling;
        Ok(())
    }
}

// ---------------------
// Tiled dependent space
// ---------------------

impl<I: IndexKind> SparseMap<I, Tile> {
    /// Ties every domain of this map, and every domain it creates later, to a tiling of the
    /// dependent space.
    ///
    /// # Errors
    ///
    /// Errors with [`SparseMapError::OutOfRange`] if a dependent index already in this map is
    /// not a tile of `trange`. The map is left unchanged in that case.
    pub fn set_domain_trange(&mut self, trange: TiledRange) -> Result<(), anyhow::Error> {
        let mut domains = self.domains.clone();
        domains
            .values_mut()
            .try_for_each(|domain| domain.set_trange(trange.clone()))?;
        self.domains = domains;
        self.dep_tiling = Tiled::from_trange(Some(&trange));
        Ok(())
    }
}

// =====================
// Trait implementations
// =====================

impl<I: IndexKind, D: IndexKind> fmt::Display for SparseMap<I, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{{}}}",
            self.domains
                .iter()
                .map(|(ind, domain)| format!("{ind} : {domain}"))
                .join(", ")
        )
    }
}

// Equality ignores `dep_tiling`, which only seeds new domains.
impl<I: IndexKind, D: IndexKind> PartialEq for SparseMap<I, D> {
    fn eq(&self, other: &Self) -> bool {
        self.tiling == other.tiling && self.domains == other.domains
    }
}

impl<I: IndexKind, D: IndexKind> Eq for SparseMap<I, D> {}

impl<I: IndexKind, D: IndexKind> Hash for SparseMap<I, D> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.tiling.hash(state);
        self.domains.hash(state);
    }
}

impl<'a, I: IndexKind, D: IndexKind> IntoIterator for &'a SparseMap<I, D> {
    type Item = (&'a Index<I>, &'a Domain<D>);
    type IntoIter = btree_map::Iter<'a, Index<I>, Domain<D>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
