//! Drivers to carry out `Chemist` tensor-of-tensors workflows.
//!
//! Each driver is configured by a parameter structure that can be built in code or read in from
//! YAML, runs one workflow on borrowed inputs, logs a report to the `chemist-output` logger and
//! optionally saves its result as a `Chemist` binary file.

pub mod from_sparse_map;
pub mod reduce_tot_sum;

// =================
// Trait definitions
// =================

/// Trait defining behaviours of `Chemist` drivers.
pub trait ChemistDriver {
    /// The type of the parameter structure controlling the driver.
    type Params;

    /// The type of the successful outcome when executing the driver.
    type Outcome;

    /// Executes the driver and stores the result internally.
    fn run(&mut self) -> Result<(), anyhow::Error>;

    /// Returns the result of the driver execution.
    fn result(&self) -> Result<&Self::Outcome, anyhow::Error>;
}
