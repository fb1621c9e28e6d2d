use crate::error::SparseMapError;
use crate::sparse_map::index::{Element, ElementIndex, Tile, TileIndex};
use crate::sparse_map::sparse_map_base::SparseMap;
use crate::tiled_array::TiledRange;

fn trange_ind() -> TiledRange {
    TiledRange::from_bounds(&[vec![0, 2, 3]]).unwrap()
}

fn trange_dep() -> TiledRange {
    TiledRange::from_bounds(&[vec![0, 1, 4]]).unwrap()
}

/// Tile map {0} -> {{1}}, {1} -> {{0}, {1}} with both spaces tiled.
fn tile_map() -> SparseMap<Tile, Tile> {
    let mut sm = SparseMap::<Tile, Tile>::with_trange(trange_ind());
    sm.set_domain_trange(trange_dep()).unwrap();
    sm.add_to_domain(TileIndex::from([0]), TileIndex::from([1]))
        .unwrap();
    sm.add_to_domain(TileIndex::from([1]), TileIndex::from([0]))
        .unwrap();
    sm.add_to_domain(TileIndex::from([1]), TileIndex::from([1]))
        .unwrap();
    sm
}

#[test]
fn test_expand_dependent() {
    let esm = tile_map().expand_dependent().unwrap();
    assert_eq!(esm.trange(), Some(&trange_ind()));
    let deps = esm
        .at(&TileIndex::from([0]))
        .unwrap()
        .iter()
        .map(|e| e[0])
        .collect::<Vec<_>>();
    assert_eq!(deps, vec![1, 2, 3]);
    assert_eq!(esm.at(&TileIndex::from([1])).unwrap().size(), 4);
}

#[test]
fn test_expand_independent() {
    let esm = tile_map().expand_independent().unwrap();
    assert_eq!(esm.size(), 3);
    assert_eq!(
        esm.at(&ElementIndex::from([0])).unwrap(),
        esm.at(&ElementIndex::from([1])).unwrap()
    );
    assert_eq!(esm.at(&ElementIndex::from([2])).unwrap().size(), 2);
    assert_eq!(esm.domain_trange(), Some(&trange_dep()));
}

#[test]
fn test_expand_both() {
    let sm = tile_map();
    let esm = SparseMap::<Element, Element>::try_from(&sm).unwrap();
    let expected = SparseMap::<Element, Element>::from_pairs([
        ([0usize], vec![[1usize], [2], [3]]),
        ([1], vec![[1], [2], [3]]),
        ([2], vec![[0], [1], [2], [3]]),
    ])
    .unwrap();
    assert_eq!(esm, expected);

    let via_steps = SparseMap::<Element, Tile>::try_from(&sm)
        .unwrap()
        .expand_dependent()
        .unwrap();
    assert_eq!(via_steps, expected);
}

#[test]
fn test_expansion_requires_tiling() {
    let mut sm = SparseMap::<Tile, Tile>::new();
    sm.add_to_domain(TileIndex::from([0]), TileIndex::from([0]))
        .unwrap();
    let err = sm.expand_dependent().unwrap_err();
    assert!(matches!(
        err.downcast_ref::<SparseMapError>(),
        Some(SparseMapError::MissingTiling(_))
    ));
    let err = sm.expand_independent().unwrap_err();
    assert!(matches!(
        err.downcast_ref::<SparseMapError>(),
        Some(SparseMapError::MissingTiling(_))
    ));
}

#[test]
fn test_tile_then_expand() {
    let esm = SparseMap::<Element, Element>::from_pairs([
        ([0usize], vec![[0usize]]),
        ([1], vec![[2]]),
        ([2], vec![[3]]),
    ])
    .unwrap();

    let tsm = esm
        .tile_independent(&trange_ind())
        .unwrap()
        .tile_dependent(&trange_dep())
        .unwrap();
    assert_eq!(tsm.trange(), Some(&trange_ind()));
    assert_eq!(tsm.size(), 2);
    let d0 = tsm.at(&TileIndex::from([0])).unwrap();
    assert_eq!(d0.size(), 2);
    assert_eq!(d0.trange(), Some(&trange_dep()));
    let d1 = tsm.at(&TileIndex::from([1])).unwrap();
    assert_eq!(d1.iter().cloned().collect::<Vec<_>>(), vec![TileIndex::from([1])]);

    let esm_dep_first = esm
        .tile_dependent(&trange_dep())
        .unwrap()
        .tile_independent(&trange_ind())
        .unwrap();
    assert_eq!(esm_dep_first, tsm);
}

#[test]
fn test_tiling_rank_checks() {
    let esm = SparseMap::<Element, Element>::from_pairs([([0usize, 0], vec![[0usize]])]).unwrap();
    let err = esm.tile_independent(&trange_ind()).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<SparseMapError>(),
        Some(SparseMapError::RankMismatch { .. })
    ));
    assert!(esm.tile_dependent(&trange_dep()).is_ok());

    let outside = SparseMap::<Element, Element>::from_pairs([([7usize], vec![[0usize]])]).unwrap();
    assert!(outside.tile_independent(&trange_ind()).is_err());
}
