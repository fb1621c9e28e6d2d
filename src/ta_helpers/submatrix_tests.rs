use ndarray::{array, Array2};

use crate::ta_helpers::{allclose, expand_submatrix, submatrix};
use crate::tiled_array::{DistArray, TiledRange};

fn full_trange() -> TiledRange {
    TiledRange::from_bounds(&[vec![0, 1, 4], vec![0, 2, 3, 6]]).unwrap()
}

fn full_matrix() -> DistArray<f64> {
    let data = Array2::from_shape_fn((4, 6), |(i, j)| (6 * i + j + 1) as f64).into_dyn();
    DistArray::from_dense(full_trange(), &data).unwrap()
}

fn mask() -> Array2<bool> {
    array![[true, false, false], [false, false, true]]
}

#[test]
fn test_submatrix() {
    let sub = submatrix(&full_matrix(), &mask()).unwrap();
    assert_eq!(
        sub.trange(),
        &TiledRange::from_bounds(&[vec![0, 1, 4], vec![0, 2, 5]]).unwrap()
    );
    assert_eq!(sub.nnz_tiles(), 2);
    assert!(sub.is_zero(&[0, 1]).unwrap());
    assert!(sub.is_zero(&[1, 0]).unwrap());
    assert_eq!(sub.get(&[0, 1]).unwrap(), Some(&2.0));
    assert_eq!(sub.get(&[1, 2]).unwrap(), Some(&10.0));
    assert_eq!(sub.get(&[3, 4]).unwrap(), Some(&24.0));
}

#[test]
fn test_expand_submatrix() {
    let sub = submatrix(&full_matrix(), &mask()).unwrap();
    let expanded = expand_submatrix(&sub, &full_trange(), &mask()).unwrap();
    assert_eq!(expanded.trange(), &full_trange());
    assert_eq!(expanded.nnz_tiles(), 2);
    assert_eq!(expanded.find(&[0, 0]).unwrap(), full_matrix().find(&[0, 0]).unwrap());
    assert_eq!(expanded.find(&[1, 2]).unwrap(), full_matrix().find(&[1, 2]).unwrap());

    let mut masked = full_matrix().to_dense();
    masked.slice_mut(ndarray::s![0..1, 2..6]).fill(0.0);
    masked.slice_mut(ndarray::s![1..4, 0..3]).fill(0.0);
    let expected = DistArray::from_dense(full_trange(), &masked).unwrap();
    assert!(allclose(&expanded, &expected, 1e-12, 1e-12));
}

#[test]
fn test_submatrix_checks() {
    let bad_shape = array![[true, false], [false, true]];
    assert!(submatrix(&full_matrix(), &bad_shape).is_err());

    let nothing = Array2::from_elem((2, 3), false);
    assert!(submatrix(&full_matrix(), &nothing).is_err());

    let sub = submatrix(&full_matrix(), &mask()).unwrap();
    let other_mask = array![[true, true, true], [false, false, true]];
    assert!(expand_submatrix(&sub, &full_trange(), &other_mask).is_err());
}
