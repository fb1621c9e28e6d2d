use std::fs;
use std::path::PathBuf;

use crate::io::{
    read_chemist_binary, read_chemist_yaml, write_chemist_binary, write_chemist_yaml,
    ChemistFileType,
};
use crate::sparse_map::{Element, SparseMap, Tile, TileIndex};
use crate::tiled_array::{DistArray, TiledRange};

fn scratch_name(stem: &str) -> PathBuf {
    std::env::temp_dir().join(format!("chemist_io_{stem}_{}", std::process::id()))
}

#[test]
fn test_io_file_type_extensions() {
    assert_eq!(ChemistFileType::Smp.ext(), "chemist.smp");
    assert_eq!(ChemistFileType::Arr.ext(), "chemist.arr");
    assert_eq!(ChemistFileType::Tot.ext(), "chemist.tot");
}

#[test]
fn test_io_binary_sparse_map() {
    let mut tsm =
        SparseMap::<Tile, Tile>::with_trange(TiledRange::from_bounds(&[vec![0, 2, 5]]).unwrap());
    tsm.set_domain_trange(TiledRange::from_bounds(&[vec![0, 1, 3]]).unwrap())
        .unwrap();
    tsm.add_to_domain(TileIndex::from([1]), TileIndex::from([0]))
        .unwrap();
    tsm.add_to_domain(TileIndex::from([1]), TileIndex::from([1]))
        .unwrap();

    let name = scratch_name("tsm");
    write_chemist_binary(&name, ChemistFileType::Smp, &tsm).unwrap();
    let read_tsm: SparseMap<Tile, Tile> =
        read_chemist_binary(&name, ChemistFileType::Smp).unwrap();
    assert_eq!(read_tsm, tsm);
    assert_eq!(read_tsm.trange(), tsm.trange());
    assert_eq!(read_tsm.domain_trange(), tsm.domain_trange());

    let mut path = name;
    path.set_extension(ChemistFileType::Smp.ext());
    fs::remove_file(path).unwrap();
}

#[test]
fn test_io_binary_dist_array() {
    let trange = TiledRange::from_bounds(&[vec![0, 2, 4]]).unwrap();
    let data = ndarray::Array::from_vec(vec![0.0, 0.0, 1.5, -2.0]).into_dyn();
    let array = DistArray::from_dense(trange, &data).unwrap();

    let name = scratch_name("arr");
    write_chemist_binary(&name, ChemistFileType::Arr, &array).unwrap();
    let read_array: DistArray<f64> = read_chemist_binary(&name, ChemistFileType::Arr).unwrap();
    assert_eq!(read_array, array);
    assert_eq!(read_array.nnz_tiles(), 1);

    let mut path = name;
    path.set_extension(ChemistFileType::Arr.ext());
    fs::remove_file(path).unwrap();
}

#[test]
fn test_io_yaml_sparse_map() {
    let esm = SparseMap::<Element, Element>::from_pairs([
        ([0usize], vec![[1usize], [3]]),
        ([2], vec![[0]]),
    ])
    .unwrap();
    let name = scratch_name("esm");
    write_chemist_yaml(&name, &esm).unwrap();

    let mut path = name;
    path.set_extension("yml");
    let read_esm: SparseMap<Element, Element> = read_chemist_yaml(&path).unwrap();
    assert_eq!(read_esm, esm);
    fs::remove_file(path).unwrap();
}

#[test]
fn test_io_missing_file() {
    let result: Result<SparseMap<Element, Element>, _> =
        read_chemist_binary(scratch_name("missing"), ChemistFileType::Smp);
    let err = result.unwrap_err();
    assert!(err.to_string().starts_with("Unable to open"));
    assert!(err.to_string().contains("chemist.smp"));
}
