//! Persistence of sparse maps and tiled arrays.
//!
//! Sparse maps, tiled arrays and tensors-of-tensors are stored in compact `bincode` files whose
//! extension records what they hold ([`ChemistFileType`]). Any serialisable value, driver
//! parameters in particular, can also be kept as human-editable YAML.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use anyhow::format_err;
use serde::{de::DeserializeOwned, Serialize};

pub(crate) mod format;

#[cfg(test)]
#[path = "io_tests.rs"]
mod io_tests;

/// Kinds of `Chemist` binary files.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChemistFileType {
    /// A [`SparseMap`](crate::sparse_map::SparseMap) of any granularity.
    Smp,

    /// A [`DistArray`](crate::tiled_array::DistArray), such as a reduced tensor.
    Arr,

    /// A [`TensorOfTensors`](crate::tiled_array::TensorOfTensors).
    Tot,
}

impl ChemistFileType {
    /// Returns the file extension, without the leading dot.
    pub fn ext(&self) -> String {
        match self {
            ChemistFileType::Smp => "chemist.smp".to_string(),
            ChemistFileType::Arr => "chemist.arr".to_string(),
            ChemistFileType::Tot => "chemist.tot".to_string(),
        }
    }

    /// Appends the extension of this file type to `name`.
    fn path_for<P: AsRef<Path>>(&self, name: P) -> PathBuf {
        let mut path = name.as_ref().to_path_buf();
        path.set_extension(self.ext());
        path
    }
}

/// Loads a value from a `Chemist` binary file.
///
/// # Arguments
///
/// * `name` - The file name without its extension, which is supplied by `file_type`.
/// * `file_type` - What the file holds.
///
/// # Errors
///
/// Errors if the file cannot be opened or does not decode into a `T`.
pub fn read_chemist_binary<T, P: AsRef<Path>>(
    name: P,
    file_type: ChemistFileType,
) -> Result<T, anyhow::Error>
where
    T: DeserializeOwned,
{
    let path = file_type.path_for(name);
    let file = File::open(&path)
        .map_err(|err| format_err!("Unable to open {}: {err}", path.display()))?;
    bincode::deserialize_from(BufReader::new(file)).map_err(|err| format_err!(err))
}

/// Stores a value in a `Chemist` binary file, replacing any existing file.
///
/// # Arguments
///
/// * `name` - The file name without its extension, which is supplied by `file_type`.
/// * `file_type` - What the file holds.
/// * `value` - The value to store.
pub fn write_chemist_binary<T, P: AsRef<Path>>(
    name: P,
    file_type: ChemistFileType,
    value: &T,
) -> Result<(), anyhow::Error>
where
    T: Serialize,
{
    let path = file_type.path_for(name);
    let file = File::create(&path)
        .map_err(|err| format_err!("Unable to create {}: {err}", path.display()))?;
    bincode::serialize_into(BufWriter::new(file), value).map_err(|err| format_err!(err))
}

/// Loads a value from a YAML file. `name` is used verbatim, extension included.
pub fn read_chemist_yaml<T, P: AsRef<Path>>(name: P) -> Result<T, anyhow::Error>
where
    T: DeserializeOwned,
{
    let path = name.as_ref();
    let file = File::open(path)
        .map_err(|err| format_err!("Unable to open {}: {err}", path.display()))?;
    serde_yaml::from_reader(BufReader::new(file)).map_err(|err| format_err!(err))
}

/// Stores a value as YAML in `name` with the extension `.yml`.
pub fn write_chemist_yaml<T, P: AsRef<Path>>(name: P, value: &T) -> Result<(), anyhow::Error>
where
    T: Serialize,
{
    let mut path = name.as_ref().to_path_buf();
    path.set_extension("yml");
    let file = File::create(&path)
        .map_err(|err| format_err!("Unable to create {}: {err}", path.display()))?;
    serde_yaml::to_writer(BufWriter::new(file), value).map_err(|err| format_err!(err))
}
