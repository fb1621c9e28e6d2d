use std::fmt;
use std::ops::AddAssign;

use anyhow::format_err;
use derive_builder::Builder;
use itertools::Itertools;
use num_traits::Zero;
use serde::{Deserialize, Serialize};

use crate::drivers::ChemistDriver;
use crate::io::format::{
    chemist_output, chemist_warn, log_title, nice_bool, paren_list, ChemistOutput,
};
use crate::io::{write_chemist_binary, ChemistFileType};
use crate::tiled_array::{DistArray, TensorOfTensors, TiledRange};
use crate::tot::{reduce_tot_sum, ElementSparseMap};


// ==================
// Struct definitions
// ==================

// ----------
// Parameters
// ----------

/// A structure containing control parameters for the summed reduction of a tensor-of-tensors.
#[derive(Clone, Builder, Debug, Serialize, Deserialize)]
pub struct ReduceToTSumParams {
    /// The tile boundaries of every mode of the reduced tensor. The number of modes must be the
    /// dependent rank of the sparse map.
    #[builder(setter(custom))]
    pub output_tiling: Vec<Vec<usize>>,

    /// Optional name for saving the reduced tensor as a binary file of type
    /// [`ChemistFileType::Arr`]. If `None`, the result will not be saved.
    #[builder(default = "None")]
    #[serde(default)]
    pub result_save_name: Option<String>,
}

impl ReduceToTSumParams {
    /// Returns a builder to construct a [`ReduceToTSumParams`] structure.
    pub fn builder() -> ReduceToTSumParamsBuilder {
        ReduceToTSumParamsBuilder::default()
    }
}

impl ReduceToTSumParamsBuilder {
    pub fn output_tiling<B: AsRef<[usize]>>(&mut self, bounds: &[B]) -> &mut Self {
        self.output_tiling = Some(bounds.iter().map(|b| b.as_ref().to_vec()).collect_vec());
        self
    }
}

impl fmt::Display for ReduceToTSumParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Output tiling:")?;
        for (mode, bounds) in self.output_tiling.iter().enumerate() {
            writeln!(f, "  Mode {mode}: {}", paren_list(bounds))?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "Save reduced tensor to file: {}",
            if let Some(name) = self.result_save_name.as_ref() {
                format!("{name}.{}", ChemistFileType::Arr.ext())
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

/// A structure to contain the result of a summed tensor-of-tensors reduction.
#[derive(Clone, Builder, Debug, Serialize, Deserialize)]
pub struct ReduceToTSumResult<T: Clone> {
    /// The control parameters used to obtain this result.
    pub parameters: ReduceToTSumParams,

    /// The reduced tensor.
    pub reduced: DistArray<T>,
}

impl<T: Clone> ReduceToTSumResult<T> {
    fn builder() -> ReduceToTSumResultBuilder<T> {
        ReduceToTSumResultBuilder::default()
    }
}

impl<T: Clone> fmt::Display for ReduceToTSumResult<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let trange = self.reduced.trange();
        writeln!(f, "Output tiling: {trange}")?;
        writeln!(
            f,
            "Non-zero tiles: {} of {}",
            self.reduced.nnz_tiles(),
            trange.ntiles()
        )?;
        writeln!(
            f,
            "Non-zero tile ordinals: {}",
            self.reduced.iter().map(|(ordinal, _)| ordinal).join(", ")
        )?;
        writeln!(f)?;
        Ok(())
    }
}

// ------
// Driver
// ------

/// A driver for the summed reduction of a tensor-of-tensors onto a tiled array.
#[derive(Clone, Builder)]
pub struct ReduceToTSumDriver<'a, M, T>
where
    M: ElementSparseMap + Clone,
    T: Clone + Zero + AddAssign + Send + Sync + Serialize + fmt::Debug,
{
    /// The control parameters for the reduction.
    parameters: &'a ReduceToTSumParams,

    /// The sparse map from the outer indices of [`Self::tot`] to the indices of the reduced
    /// tensor.
    sparse_map: &'a M,

    /// The tensor-of-tensors to reduce.
    tot: &'a TensorOfTensors<T>,

    /// The result of the reduction.
    #[builder(setter(skip), default = "None")]
    result: Option<ReduceToTSumResult<T>>,
}

impl<'a, M, T> ReduceToTSumDriver<'a, M, T>
where
    M: ElementSparseMap + Clone,
    T: Clone + Zero + AddAssign + Send + Sync + Serialize + fmt::Debug,
{
    /// Returns a builder to construct a [`ReduceToTSumDriver`] structure.
    pub fn builder() -> ReduceToTSumDriverBuilder<'a, M, T> {
        ReduceToTSumDriverBuilder::default()
    }

    /// Executes the summed reduction.
    fn reduce(&mut self) -> Result<(), anyhow::Error> {
        log_title("Tensor-of-Tensors Summed Reduction");
        chemist_output!("");
        let params = self.parameters;
        params.log_output_display();

        let trange_rv = TiledRange::from_bounds(&params.output_tiling)?;
        let reduced = reduce_tot_sum(self.sparse_map, self.tot, &trange_rv)?;
        if reduced.nnz_tiles() == 0 {
            chemist_warn!("The reduced tensor is zero.");
        }

        let res = ReduceToTSumResult::builder()
            .parameters(params.clone())
            .reduced(reduced)
            .build()
            .map_err(|err| format_err!(err))?;
        res.log_output_display();

        if let Some(name) = params.result_save_name.as_ref() {
            write_chemist_binary(name, ChemistFileType::Arr, &res.reduced)?;
            chemist_output!(
                "Reduced tensor saved as {name}.{}.",
                ChemistFileType::Arr.ext()
            );
            chemist_output!("");
        }
        self.result = Some(res);

        Ok(())
    }
}

impl<'a, M, T> ChemistDriver for ReduceToTSumDriver<'a, M, T>
where
    M: ElementSparseMap + Clone,
    T: Clone + Zero + AddAssign + Send + Sync + Serialize + fmt::Debug,
{
    type Params = ReduceToTSumParams;

    type Outcome = ReduceToTSumResult<T>;

    fn result(&self) -> Result<&Self::Outcome, anyhow::Error> {
        self.result
            .as_ref()
            .ok_or_else(|| format_err!("No tensor-of-tensors reduction results found."))
    }

    fn run(&mut self) -> Result<(), anyhow::Error> {
        self.reduce()
    }
}
