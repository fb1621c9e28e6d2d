use std::collections::BTreeMap;
use std::fmt;

use anyhow::format_err;
use derive_builder::Builder;
use itertools::Itertools;
use num_traits::Zero;
use serde::{Deserialize, Serialize};

use crate::drivers::ChemistDriver;
use crate::io::format::{
    chemist_output, chemist_warn, log_subtitle, log_title, nice_bool, paren_list,
    write_subtitle, ChemistOutput,
};
use crate::io::{write_chemist_binary, ChemistFileType};
use crate::tiled_array::{DistArray, TensorOfTensors, TiledRange};
use crate::tot::{from_sparse_map, ElementSparseMap};

#[cfg(test)]
#[path = "from_sparse_map_tests.rs"]
mod from_sparse_map_tests;

// ==================
// Struct definitions
// ==================

// ----------
// Parameters
// ----------

/// A structure containing control parameters for tensor-of-tensors construction.
#[derive(Clone, Builder, Debug, Serialize, Deserialize)]
pub struct FromSparseMapParams {
    /// The tile boundaries of every outer mode of the tensor-of-tensors. The number of outer
    /// modes must be the independent rank of the sparse map.
    #[builder(setter(custom))]
    pub outer_tiling: Vec<Vec<usize>>,

    /// Injections of outer modes into the indices probing the tensor. The outer mode `k` supplies
    /// the offset for mode `ind2mode[k]` of each probing index.
    #[builder(default = "BTreeMap::new()")]
    #[serde(default)]
    pub ind2mode: BTreeMap<usize, usize>,

    /// Boolean indicating if the extents of every non-empty inner tensor are to be written to the
    /// output.
    #[builder(default = "false")]
    #[serde(default)]
    pub write_inner_extents: bool,

    /// Optional name for saving the tensor-of-tensors as a binary file of type
    /// [`ChemistFileType::Tot`]. If `None`, the result will not be saved.
    #[builder(default = "None")]
    #[serde(default)]
    pub result_save_name: Option<String>,
}

impl FromSparseMapParams {
    /// Returns a builder to construct a [`FromSparseMapParams`] structure.
    pub fn builder() -> FromSparseMapParamsBuilder {
        FromSparseMapParamsBuilder::default()
    }
}

impl FromSparseMapParamsBuilder {
    pub fn outer_tiling<B: AsRef<[usize]>>(&mut self, bounds: &[B]) -> &mut Self {
        self.outer_tiling = Some(bounds.iter().map(|b| b.as_ref().to_vec()).collect_vec());
        self
    }
}

impl fmt::Display for FromSparseMapParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Outer tiling:")?;
        for (mode, bounds) in self.outer_tiling.iter().enumerate() {
            writeln!(f, "  Mode {mode}: {}", paren_list(bounds))?;
        }
        writeln!(f)?;
        if self.ind2mode.is_empty() {
            writeln!(f, "Injected outer modes: none")?;
        } else {
            writeln!(
                f,
                "Injected outer modes: {}",
                self.ind2mode
                    .iter()
                    .map(|(outer_mode, mode)| format!("{outer_mode} → {mode}"))
                    .join(", ")
            )?;
        }
        writeln!(
            f,
            "Report inner-tensor extents: {}",
            nice_bool(self.write_inner_extents)
        )?;
        writeln!(
            f,
            "Save tensor-of-tensors to file: {}",
            if let Some(name) = self.result_save_name.as_ref() {
                format!("{name}.{}", ChemistFileType::Tot.ext())
            } else {
                nice_bool(false)
            }
        )?;
        writeln!(f)?;

        Ok(())
    }
}

// ------
// Result
// ------

/// A structure to contain tensor-of-tensors construction results.
#[derive(Clone, Builder, Debug, Serialize, Deserialize)]
pub struct FromSparseMapResult<T: Clone> {
    /// The control parameters used to obtain this result.
    pub parameters: FromSparseMapParams,

    /// The constructed tensor-of-tensors.
    pub tot: TensorOfTensors<T>,
}

impl<T: Clone> FromSparseMapResult<T> {
    /// Returns a builder to construct a [`FromSparseMapResult`] structure.
    fn builder() -> FromSparseMapResultBuilder<T> {
        FromSparseMapResultBuilder::default()
    }

    /// Returns the number of outer elements holding a non-empty inner tensor.
    pub fn n_nonempty_inner(&self) -> usize {
        self.tot
            .iter()
            .flat_map(|(_, tile)| tile.iter())
            .filter(|inner| !inner.is_empty())
            .count()
    }

    /// Returns the total number of inner-tensor elements.
    pub fn n_inner_elements(&self) -> usize {
        self.tot
            .iter()
            .flat_map(|(_, tile)| tile.iter())
            .map(|inner| inner.size())
            .sum()
    }

    /// Writes the extents of the non-empty inner tensors in a table.
    fn write_inner_extents(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_subtitle(f, "Inner-tensor extents")?;
        writeln!(f)?;
        let rows = self
            .tot
            .iter()
            .flat_map(|(_, tile)| tile.indexed_iter())
            .filter(|(_, inner)| !inner.is_empty())
            .map(|(oeidx, inner)| {
                (
                    paren_list(&oeidx),
                    paren_list(&inner.range().extents()),
                )
            })
            .collect_vec();
        let idx_width = rows
            .iter()
            .map(|(idx, _)| idx.chars().count())
            .max()
            .unwrap_or(0)
            .max(11);
        let ext_width = rows
            .iter()
            .map(|(_, ext)| ext.chars().count())
            .max()
            .unwrap_or(0)
            .max(7);
        writeln!(f, "{}", "┈".repeat(idx_width + ext_width + 4))?;
        writeln!(f, " {:<idx_width$}  {:<ext_width$}", "Outer index", "Extents")?;
        writeln!(f, "{}", "┈".repeat(idx_width + ext_width + 4))?;
        for (idx, ext) in rows.iter() {
            writeln!(f, " {idx:<idx_width$}  {ext:<ext_width$}")?;
        }
        writeln!(f, "{}", "┈".repeat(idx_width + ext_width + 4))?;
        Ok(())
    }
}

impl<T: Clone> fmt::Display for FromSparseMapResult<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let trange = self.tot.trange();
        writeln!(f, "Outer tiling: {trange}")?;
        writeln!(
            f,
            "Non-zero outer tiles: {} of {}",
            self.tot.nnz_tiles(),
            trange.ntiles()
        )?;
        writeln!(f, "Non-empty inner tensors: {}", self.n_nonempty_inner())?;
        writeln!(f, "Inner-tensor elements: {}", self.n_inner_elements())?;
        writeln!(f)?;

        if self.parameters.write_inner_extents {
            self.write_inner_extents(f)?;
            writeln!(f)?;
        }

        Ok(())
    }
}

// ------
// Driver
// ------

/// A driver for the construction of a tensor-of-tensors from a sparse map.
#[derive(Clone, Builder)]
pub struct FromSparseMapDriver<'a, M, T>
where
    M: ElementSparseMap + Clone + fmt::Debug + fmt::Display,
    T: Clone + Zero + Send + Sync + Serialize + fmt::Debug,
{
    /// The control parameters for tensor-of-tensors construction.
    parameters: &'a FromSparseMapParams,

    /// The sparse map from outer indices to the indices of [`Self::tensor`].
    sparse_map: &'a M,

    /// The tensor from which the inner tensors are gathered.
    tensor: &'a DistArray<T>,

    /// The result of the construction.
    #[builder(setter(skip), default = "None")]
    result: Option<FromSparseMapResult<T>>,
}

impl<'a, M, T> FromSparseMapDriver<'a, M, T>
where
    M: ElementSparseMap + Clone + fmt::Debug + fmt::Display,
    T: Clone + Zero + Send + Sync + Serialize + fmt::Debug,
{
    /// Returns a builder to construct a [`FromSparseMapDriver`] structure.
    pub fn builder() -> FromSparseMapDriverBuilder<'a, M, T> {
        FromSparseMapDriverBuilder::default()
    }

    /// Executes tensor-of-tensors construction.
    fn construct_tot(&mut self) -> Result<(), anyhow::Error> {
        log_title("Tensor-of-Tensors Construction");
        chemist_output!("");
        let params = self.parameters;
        params.log_output_display();

        log_subtitle("Sparse map");
        chemist_output!("");
        self.sparse_map.log_output_display();
        chemist_output!("");

        let outer_trange = TiledRange::from_bounds(&params.outer_tiling)?;
        let tot = from_sparse_map(self.sparse_map, self.tensor, &outer_trange, &params.ind2mode)?;
        if tot.nnz_tiles() == 0 {
            chemist_warn!("The constructed tensor-of-tensors has no non-zero outer tiles.");
        }

        let res = FromSparseMapResult::builder()
            .parameters(params.clone())
            .tot(tot)
            .build()
            .map_err(|err| format_err!(err))?;
        res.log_output_display();

        if let Some(name) = params.result_save_name.as_ref() {
            write_chemist_binary(name, ChemistFileType::Tot, &res.tot)?;
            chemist_output!(
                "Tensor-of-tensors saved as {name}.{}.",
                ChemistFileType::Tot.ext()
            );
            chemist_output!("");
        }
        self.result = Some(res);

        Ok(())
    }
}

impl<'a, M, T> ChemistDriver for FromSparseMapDriver<'a, M, T>
where
    M: ElementSparseMap + Clone + fmt::Debug + fmt::Display,
    T: Clone + Zero + Send + Sync + Serialize + fmt::Debug,
{
    type Params = FromSparseMapParams;

    type Outcome = FromSparseMapResult<T>;

    fn result(&self) -> Result<&Self::Outcome, anyhow::Error> {
        self.result
            .as_ref()
            .ok_or_else(|| format_err!("No tensor-of-tensors construction results found."))
    }

    fn run(&mut self) -> Result<(), anyhow::Error> {
        self.construct_tot()
    }
}
