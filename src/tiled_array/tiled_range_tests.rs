use itertools::Itertools;

use crate::error::SparseMapError;
use crate::sparse_map::{ElementIndex, TileIndex};
use crate::tiled_array::tiled_range::{TiledRange, TiledRange1};

#[test]
fn test_tiled_range1_construction() {
    let tr1 = TiledRange1::new(&[0, 2, 5, 6]).unwrap();
    assert_eq!(tr1.tile_extent(), 3);
    assert_eq!(tr1.extent(), 6);
    assert_eq!(tr1.tile(1), Some((2, 5)));
    assert_eq!(tr1.tile(3), None);
    assert_eq!(tr1.to_string(), "(0, 2, 5, 6)");

    assert!(TiledRange1::new(&[0]).is_err());
    assert!(TiledRange1::new(&[0, 2, 2]).is_err());
    assert!(TiledRange1::new(&[3, 1]).is_err());
}

#[test]
fn test_tiled_range_serde_validates_bounds() {
    let trange = TiledRange::from_bounds(&[vec![0, 2, 5], vec![1, 3]]).unwrap();
    let yaml = serde_yaml::to_string(&trange).unwrap();
    let read: TiledRange = serde_yaml::from_str(&yaml).unwrap();
    assert_eq!(read, trange);
    assert_eq!(read.ntiles(), 2);

    assert!(serde_yaml::from_str::<TiledRange>("dims:\n  - []\n").is_err());
    assert!(serde_yaml::from_str::<TiledRange>("dims:\n  - [4]\n").is_err());
    assert!(serde_yaml::from_str::<TiledRange>("dims:\n  - [3, 1]\n").is_err());

    let bytes = bincode::serialize(&vec![Vec::<usize>::new()]).unwrap();
    assert!(bincode::deserialize::<TiledRange>(&bytes).is_err());
}

#[test]
fn test_tiled_range1_element_to_tile() {
    let tr1 = TiledRange1::new(&[0, 2, 5, 6]).unwrap();
    let tiles = (0..6).map(|e| tr1.element_to_tile(e).unwrap()).collect_vec();
    assert_eq!(tiles, vec![0, 0, 1, 1, 1, 2]);
    assert_eq!(tr1.element_to_tile(6), None);
}

#[test]
fn test_tiled_range_tiles() {
    let tr = TiledRange::from_bounds(&[vec![0, 2, 4], vec![0, 1, 3, 4]]).unwrap();
    assert_eq!(tr.rank(), 2);
    assert_eq!(tr.ntiles(), 6);
    assert_eq!(tr.tiles_range().extents(), vec![2, 3]);
    assert_eq!(tr.elements_range().extents(), vec![4, 4]);

    assert_eq!(tr.tile_ordinal(&[1, 2]), Some(5));
    assert_eq!(tr.tile_index(4), Some(vec![1, 1]));

    let tile = tr.tile(4).unwrap();
    assert_eq!(tile.lo(), &[2, 1]);
    assert_eq!(tile.hi(), &[4, 3]);
    assert!(tr.tile(6).is_err());

    assert_eq!(tr.element_to_tile(&[3, 3]).unwrap(), vec![1, 2]);
    let err = tr.element_to_tile(&[3]).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<SparseMapError>(),
        Some(SparseMapError::RankMismatch { .. })
    ));
    let err = tr.make_tile_range(&[2, 0]).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<SparseMapError>(),
        Some(SparseMapError::OutOfRange(_))
    ));
}

#[test]
fn test_tiled_range_product() {
    let tr_a = TiledRange::from_bounds(&[vec![0, 2, 4]]).unwrap();
    let tr_b = TiledRange::from_bounds(&[vec![0, 3]]).unwrap();
    let prod = tr_a.product(&tr_b);
    assert_eq!(prod.rank(), 2);
    assert_eq!(prod.dim(0), tr_a.dim(0));
    assert_eq!(prod.dim(1), tr_b.dim(0));
}

#[test]
fn test_tiled_range_typed_indices() {
    let tr = TiledRange::from_bounds(&[vec![0, 2, 4], vec![0, 3]]).unwrap();
    let t = tr.tile_of(&ElementIndex::from([3, 1])).unwrap();
    assert_eq!(t, TileIndex::from([1, 0]));

    let elements = tr.elements_of(&TileIndex::from([1, 0])).unwrap();
    assert_eq!(elements.len(), 6);
    assert_eq!(elements[0], ElementIndex::from([2, 0]));
    assert_eq!(elements[5], ElementIndex::from([3, 2]));
    assert!(elements
        .iter()
        .all(|e| tr.tile_of(e).unwrap() == TileIndex::from([1, 0])));
}
