use std::collections::BTreeMap;

use itertools::Itertools;
use ndarray::{Array, Array2};

use crate::error::SparseMapError;
use crate::sparse_map::{Element, SparseMap, Tile, TileIndex};
use crate::tiled_array::{DistArray, Range, Tensor, TiledRange};
use crate::tot::{from_sparse_map, reduce_tot_sum};

fn vector_trange() -> TiledRange {
    TiledRange::from_bounds(&[vec![0, 2, 4, 6, 8]]).unwrap()
}

fn vector_0_to_8() -> DistArray<f64> {
    let data = Array::from_iter((0..8).map(|x| x as f64)).into_dyn();
    DistArray::from_dense(vector_trange(), &data).unwrap()
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
fn test_reduce_tot_sum_round_trip() {
    let outer_trange = TiledRange::from_bounds(&[vec![0, 3]]).unwrap();
    let tot = from_sparse_map(&esm(), &vector_0_to_8(), &outer_trange, &BTreeMap::new()).unwrap();
    let reduced = reduce_tot_sum(&esm(), &tot, &vector_trange()).unwrap();

    assert_eq!(reduced.nnz_tiles(), 2);
    assert!(reduced.is_zero(&[2]).unwrap());
    assert!(reduced.is_zero(&[3]).unwrap());
    assert_eq!(
        reduced.to_dense().iter().copied().collect_vec(),
        vec![0.0, 2.0, 2.0, 3.0, 0.0, 0.0, 0.0, 0.0]
    );
}

#[test]
fn test_reduce_tot_sum_matrix() {
    let trange = TiledRange::from_bounds(&[vec![0, 1, 3], vec![0, 2, 3]]).unwrap();
    let data = Array2::from_shape_fn((3, 3), |(i, j)| (1 + 3 * i + j) as f64).into_dyn();
    let tensor = DistArray::from_dense(trange.clone(), &data).unwrap();

    let esm = SparseMap::<Element, Element>::from_pairs([
        ([0usize], vec![[0usize, 0], [2, 2]]),
        ([1], vec![[2, 2]]),
    ])
    .unwrap();
    let outer_trange = TiledRange::from_bounds(&[vec![0, 1, 2]]).unwrap();
    let tot = from_sparse_map(&esm, &tensor, &outer_trange, &BTreeMap::new()).unwrap();
    let reduced = reduce_tot_sum(&esm, &tot, &trange).unwrap();

    assert_eq!(reduced.get(&[0, 0]).unwrap(), Some(&1.0));
    assert_eq!(reduced.get(&[2, 2]).unwrap(), Some(&18.0));
    assert_eq!(reduced.get(&[1, 1]).unwrap(), None);
    assert!(reduced.is_zero(&[0, 1]).unwrap());
    assert!(reduced.is_zero(&[1, 0]).unwrap());
}

#[test]
fn test_reduce_tot_sum_tile_map() {
    let mut tsm =
        SparseMap::<Tile, Tile>::with_trange(TiledRange::from_bounds(&[vec![0, 2]]).unwrap());
    tsm.set_domain_trange(vector_trange()).unwrap();
    tsm.add_to_domain(TileIndex::from([0]), TileIndex::from([2]))
        .unwrap();
    let outer_trange = TiledRange::from_bounds(&[vec![0, 2]]).unwrap();
    let tot = from_sparse_map(&tsm, &vector_0_to_8(), &outer_trange, &BTreeMap::new()).unwrap();
    let reduced = reduce_tot_sum(&tsm, &tot, &vector_trange()).unwrap();

    assert_eq!(reduced.nnz_tiles(), 1);
    assert_eq!(
        reduced.find(&[2]).unwrap().unwrap().iter().copied().collect_vec(),
        vec![8.0, 10.0]
    );
}

#[test]
fn test_reduce_tot_sum_empty_map_rank_checks() {
    let outer_trange = TiledRange::from_bounds(&[vec![0, 3]]).unwrap();
    let tot = from_sparse_map(&esm(), &vector_0_to_8(), &outer_trange, &BTreeMap::new()).unwrap();
    let err = reduce_tot_sum(&SparseMap::<Element, Element>::new(), &tot, &vector_trange())
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<SparseMapError>(),
        Some(SparseMapError::RankMismatch {
            expected: 0,
            actual: 1,
            ..
        })
    ));
}

#[test]
fn test_reduce_tot_sum_rank_checks() {
    let outer_trange = TiledRange::from_bounds(&[vec![0, 3]]).unwrap();
    let tot = from_sparse_map(&esm(), &vector_0_to_8(), &outer_trange, &BTreeMap::new()).unwrap();

    let matrix_trange = TiledRange::from_bounds(&[vec![0, 8], vec![0, 8]]).unwrap();
    let err = reduce_tot_sum(&esm(), &tot, &matrix_trange).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<SparseMapError>(),
        Some(SparseMapError::RankMismatch { .. })
    ));

    let esm_2d = SparseMap::<Element, Element>::from_pairs([([0usize, 0], vec![[1usize]])]).unwrap();
    let err = reduce_tot_sum(&esm_2d, &tot, &vector_trange()).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<SparseMapError>(),
        Some(SparseMapError::RankMismatch { .. })
    ));
}

#[test]
fn test_reduce_tot_sum_inner_rank_check() {
    let outer_trange = TiledRange::from_bounds(&[vec![0, 1]]).unwrap();
    let mut tot = DistArray::<Tensor<f64>>::new(outer_trange);
    let tile = Tensor::from_fn(Range::from_extents(&[1]), |_| {
        Tensor::zeros(Range::from_extents(&[1, 1]))
    });
    tot.set_tile(&[0], tile).unwrap();

    let esm = SparseMap::<Element, Element>::from_pairs([([0usize], vec![[1usize]])]).unwrap();
    let err = reduce_tot_sum(&esm, &tot, &vector_trange()).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<SparseMapError>(),
        Some(SparseMapError::RankMismatch { .. })
    ));
}
