use ndarray::{array, ArrayD, IxDyn};

use crate::tiled_array::dist_array::DistArray;
use crate::tiled_array::tensor::Tensor;
use crate::tiled_array::tiled_range::TiledRange;

#[test]
fn test_dist_array_make_array() {
    let trange = TiledRange::from_bounds(&[vec![0, 2, 5]]).unwrap();
    let arr = DistArray::make_array(trange.clone(), |tile_range| {
        if tile_range.lo()[0] == 0 {
            Ok(None)
        } else {
            Ok(Some(Tensor::from_fn(tile_range.clone(), |idx| idx[0] as f64)))
        }
    })
    .unwrap();
    assert_eq!(arr.nnz_tiles(), 1);
    assert!(arr.is_zero(&[0]).unwrap());
    assert!(!arr.is_zero(&[1]).unwrap());
    assert!(arr.find(&[2]).is_err());
    assert_eq!(arr.get(&[3]).unwrap(), Some(&3.0));
    assert_eq!(arr.get(&[1]).unwrap(), None);
    assert!(arr.get(&[5]).is_err());
}

#[test]
fn test_dist_array_make_array_rejects_bad_tiles() {
    let trange = TiledRange::from_bounds(&[vec![0, 2, 5]]).unwrap();
    let res = DistArray::make_array(trange, |_| {
        Ok(Some(Tensor::from_fn(
            crate::tiled_array::range::Range::from_extents(&[1]),
            |_| 1.0,
        )))
    });
    assert!(res.is_err());
}

#[test]
fn test_dist_array_dense_round_trip() {
    let trange = TiledRange::from_bounds(&[vec![0, 1, 3], vec![0, 2, 3]]).unwrap();
    let dense = array![[1.0, 2.0, 0.0], [0.0, 0.0, 0.0], [0.0, 0.0, 5.0]].into_dyn();
    let arr = DistArray::from_dense(trange, &dense).unwrap();
    // Tiles (0, 0) and (1, 1) are non-zero.
    assert_eq!(arr.nnz_tiles(), 2);
    assert!(arr.is_zero(&[0, 1]).unwrap());
    assert!(arr.is_zero(&[1, 0]).unwrap());
    assert_eq!(arr.to_dense(), dense);

    let bad = ArrayD::<f64>::zeros(IxDyn(&[2, 3]));
    assert!(DistArray::from_dense(arr.trange().clone(), &bad).is_err());
}

#[test]
fn test_dist_array_set_tile() {
    let trange = TiledRange::from_bounds(&[vec![0, 2, 4]]).unwrap();
    let mut arr = DistArray::<f64>::new(trange.clone());
    assert_eq!(arr.nnz_tiles(), 0);
    let tile = Tensor::from_fn(trange.make_tile_range(&[1]).unwrap(), |_| 2.0);
    arr.set_tile(&[1], tile.clone()).unwrap();
    assert_eq!(arr.find(&[1]).unwrap(), Some(&tile));
    assert!(arr.set_tile(&[0], tile).is_err());
    assert_eq!(arr.to_dense(), array![0.0, 0.0, 2.0, 2.0].into_dyn());
}
