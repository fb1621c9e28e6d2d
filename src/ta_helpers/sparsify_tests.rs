use ndarray::ArrayD;

use crate::error::SparseMapError;
use crate::sparse_map::{SparseMap, Tile, TileIndex};
use crate::ta_helpers::sparsify_basis;
use crate::tiled_array::{DistArray, TiledRange};

fn ones_4x4() -> DistArray<f64> {
    let trange = TiledRange::from_bounds(&[vec![0, 2, 4], vec![0, 2, 4]]).unwrap();
    DistArray::from_dense(trange, &ArrayD::from_elem(vec![4, 4], 1.0)).unwrap()
}

fn column_to_row_map(bounds: &[usize]) -> SparseMap<Tile, Tile> {
    let mut sm = SparseMap::<Tile, Tile>::with_trange(TiledRange::from_bounds(&[bounds]).unwrap());
    sm.set_domain_trange(TiledRange::from_bounds(&[vec![0, 2, 4]]).unwrap())
        .unwrap();
    for (col, row) in [(0, 0), (0, 1), (1, 1)] {
        sm.add_to_domain(TileIndex::from([col]), TileIndex::from([row]))
            .unwrap();
    }
    sm
}

#[test]
fn test_sparsify_basis() {
    let c = ones_4x4();
    let sparse_c = sparsify_basis(&c, &column_to_row_map(&[0, 2, 4])).unwrap();
    assert_eq!(sparse_c.trange(), c.trange());
    assert_eq!(sparse_c.nnz_tiles(), 3);
    assert!(!sparse_c.is_zero(&[0, 0]).unwrap());
    assert!(!sparse_c.is_zero(&[1, 0]).unwrap());
    assert!(sparse_c.is_zero(&[0, 1]).unwrap());
    assert!(!sparse_c.is_zero(&[1, 1]).unwrap());
    assert_eq!(sparse_c.find(&[1, 1]).unwrap(), c.find(&[1, 1]).unwrap());

    let all_zero = sparsify_basis(&c, &SparseMap::new()).unwrap();
    assert_eq!(all_zero.nnz_tiles(), 0);
}

#[test]
fn test_sparsify_basis_checks() {
    let c = ones_4x4();
    let err = sparsify_basis(&c, &column_to_row_map(&[0, 1, 4])).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<SparseMapError>(),
        Some(SparseMapError::TilingMismatch(_))
    ));

    let vector = DistArray::<f64>::new(TiledRange::from_bounds(&[vec![0, 2, 4]]).unwrap());
    let err = sparsify_basis(&vector, &column_to_row_map(&[0, 2, 4])).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<SparseMapError>(),
        Some(SparseMapError::RankMismatch { .. })
    ));
}
