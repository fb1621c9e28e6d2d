use std::collections::BTreeMap;
use std::fs;

use ndarray::Array;

use crate::drivers::from_sparse_map::{FromSparseMapDriver, FromSparseMapParams};
use crate::drivers::ChemistDriver;
use crate::io::{read_chemist_binary, ChemistFileType};
use crate::sparse_map::{Element, SparseMap};
use crate::tiled_array::{DistArray, TensorOfTensors, TiledRange};

fn vector_0_to_8() -> DistArray<f64> {
    let trange = TiledRange::from_bounds(&[vec![0, 2, 4, 6, 8]]).unwrap();
    DistArray::from_dense(trange, &Array::from_iter((0..8).map(f64::from)).into_dyn()).unwrap()
}

fn esm() -> SparseMap<Element, Element> {
    SparseMap::<Element, Element>::from_pairs([
        ([0usize], vec![[1usize], [3]]),
        ([1], vec![[1], [2]]),
        ([2], vec![[0]]),
    ])
    .unwrap()
}

#[test]
fn test_drivers_from_sparse_map() {
    let _ = env_logger::builder().is_test(true).try_init();
    let params = FromSparseMapParams::builder()
        .outer_tiling(&[[0, 3]])
        .write_inner_extents(true)
        .build()
        .unwrap();
    let esm = esm();
    let tensor = vector_0_to_8();
    let mut tot_driver = FromSparseMapDriver::builder()
        .parameters(&params)
        .sparse_map(&esm)
        .tensor(&tensor)
        .build()
        .unwrap();
    assert!(tot_driver.result().is_err());
    tot_driver.run().unwrap();

    let tot_res = tot_driver.result().unwrap();
    assert_eq!(tot_res.n_nonempty_inner(), 3);
    assert_eq!(tot_res.n_inner_elements(), 5);
    let inner = tot_res.tot.get(&[0]).unwrap().unwrap();
    assert_eq!(inner.iter().copied().collect::<Vec<_>>(), vec![1.0, 3.0]);

    let report = tot_res.to_string();
    assert!(report.contains("Non-empty inner tensors: 3"));
    assert!(report.contains("Inner-tensor extents"));
}

#[test]
fn test_drivers_from_sparse_map_save_result() {
    let save_name = std::env::temp_dir()
        .join(format!("chemist_driver_tot_{}", std::process::id()))
        .to_string_lossy()
        .to_string();
    let params = FromSparseMapParams::builder()
        .outer_tiling(&[vec![0, 1, 3]])
        .result_save_name(Some(save_name.clone()))
        .build()
        .unwrap();
    let esm = esm();
    let tensor = vector_0_to_8();
    let mut tot_driver = FromSparseMapDriver::builder()
        .parameters(&params)
        .sparse_map(&esm)
        .tensor(&tensor)
        .build()
        .unwrap();
    tot_driver.run().unwrap();

    let saved: TensorOfTensors<f64> =
        read_chemist_binary(&save_name, ChemistFileType::Tot).unwrap();
    assert_eq!(&saved, &tot_driver.result().unwrap().tot);
    fs::remove_file(format!("{save_name}.{}", ChemistFileType::Tot.ext())).unwrap();
}

#[test]
fn test_drivers_from_sparse_map_params_yaml() {
    let params: FromSparseMapParams = serde_yaml::from_str(
        "outer_tiling:\n  - [0, 2, 3]\nind2mode:\n  0: 0\n",
    )
    .unwrap();
    assert_eq!(params.outer_tiling, vec![vec![0, 2, 3]]);
    assert_eq!(params.ind2mode, BTreeMap::from([(0, 0)]));
    assert!(!params.write_inner_extents);
    assert!(params.result_save_name.is_none());
    assert!(params.to_string().contains("Injected outer modes: 0 → 0"));
}

#[test]
fn test_drivers_from_sparse_map_errors() {
    assert!(FromSparseMapParams::builder().build().is_err());

    let params = FromSparseMapParams::builder()
        .outer_tiling(&[[0, 3], [0, 3]])
        .build()
        .unwrap();
    let esm = esm();
    let tensor = vector_0_to_8();
    let mut tot_driver = FromSparseMapDriver::builder()
        .parameters(&params)
        .sparse_map(&esm)
        .tensor(&tensor)
        .build()
        .unwrap();
    assert!(tot_driver.run().is_err());
    assert!(tot_driver.result().is_err());
}
