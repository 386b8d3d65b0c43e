//! Integration tests for gm-mesh.

use gm_mesh::{ElementType, HexFace, MeshError, PartBuilder, box_part};
use proptest::prelude::*;

#[test]
fn two_by_two_by_two_grid_is_all_corners() {
    let part = box_part([2, 2, 2], [0.0; 3], [1.0; 3], ElementType::Hex8).unwrap();
    let nb = part.element_neighbors();

    for elm in 0..8 {
        assert_eq!(nb.neighbor_count(elm), 3, "element {elm}");
    }
    assert_eq!(nb.boundary_face_count(), 8 * 3);

    let grid = part.struct_grid().unwrap();
    assert_eq!(
        (grid.cell_count_i(), grid.cell_count_j(), grid.cell_count_k()),
        (2, 2, 2)
    );
    let mut seen = Vec::new();
    for elm in 0..8 {
        let ijk = grid.ijk_from_cell_index(elm).unwrap();
        assert!(ijk.iter().all(|&v| v <= 1));
        seen.push(ijk);
    }
    seen.sort();
    seen.dedup();
    assert_eq!(seen.len(), 8);
}

#[test]
fn neighbor_table_is_reciprocal_across_opposite_faces() {
    let part = box_part([4, 3, 2], [0.0; 3], [1.0, 2.0, 0.5], ElementType::Hex8).unwrap();
    let nb = part.element_neighbors();

    for a in 0..part.element_count() {
        for face in HexFace::ALL {
            if let Some(b) = nb.neighbor(a, face.index()) {
                assert_eq!(b.face, face.opposite().index());
                let back = nb.neighbor(b.element, b.face).unwrap();
                assert_eq!(back.element, a);
                assert_eq!(back.face, face.index());
            }
        }
    }
}

#[test]
fn origin_found_regardless_of_element_order() {
    // same 3x2x1 box, elements added in reverse order
    let src = box_part([3, 2, 1], [0.0; 3], [1.0; 3], ElementType::Hex8).unwrap();
    let mut b = PartBuilder::new("reversed");
    for (i, p) in src.node_coords().iter().enumerate() {
        b.add_node(i as i64, [p.x, p.y, p.z]);
    }
    for elm in (0..src.element_count()).rev() {
        b.add_element(elm as i64, ElementType::Hex8, src.connectivity(elm));
    }
    let part = b.build().unwrap();
    let grid = part.struct_grid().unwrap();

    // element 5 of the reversed part is element 0 of the source
    assert_eq!(grid.ijk_from_cell_index(5), Some([0, 0, 0]));
    assert_eq!(grid.ijk_from_cell_index(0), Some([2, 1, 0]));
}

#[test]
fn rotated_local_axes_are_reported() {
    let mut b = PartBuilder::new("twisted");
    let node = |i: usize, j: usize, k: usize| i + 3 * (j + 2 * k);
    for k in 0..2 {
        for j in 0..2 {
            for i in 0..3 {
                b.add_node(node(i, j, k) as i64, [i as f64, j as f64, k as f64]);
            }
        }
    }
    b.add_element(
        1,
        ElementType::Hex8,
        &[
            node(0, 0, 0),
            node(1, 0, 0),
            node(1, 1, 0),
            node(0, 1, 0),
            node(0, 0, 1),
            node(1, 0, 1),
            node(1, 1, 1),
            node(0, 1, 1),
        ],
    );
    // second element rotated a quarter turn about its vertical axis
    b.add_element(
        2,
        ElementType::Hex8,
        &[
            node(2, 0, 0),
            node(2, 1, 0),
            node(1, 1, 0),
            node(1, 0, 0),
            node(2, 0, 1),
            node(2, 1, 1),
            node(1, 1, 1),
            node(1, 0, 1),
        ],
    );
    let part = b.build().unwrap();
    assert_eq!(part.element_neighbors().neighbor_count(0), 1);
    assert!(matches!(
        part.struct_grid(),
        Err(MeshError::InconsistentTopology { .. })
    ));
}

#[test]
fn disconnected_elements_have_no_ijk() {
    let src = box_part([2, 1, 1], [0.0; 3], [1.0; 3], ElementType::Hex8).unwrap();
    let far = box_part([1, 1, 1], [10.0, 0.0, 0.0], [1.0; 3], ElementType::Hex8).unwrap();

    let mut b = PartBuilder::new("islands");
    for (i, p) in src.node_coords().iter().chain(far.node_coords()).enumerate() {
        b.add_node(i as i64, [p.x, p.y, p.z]);
    }
    for elm in 0..2 {
        b.add_element(elm as i64, ElementType::Hex8, src.connectivity(elm));
    }
    let shifted: Vec<usize> = far.connectivity(0).iter().map(|n| n + src.node_count()).collect();
    b.add_element(2, ElementType::Hex8, &shifted);

    let part = b.build().unwrap();
    let grid = part.struct_grid().unwrap();
    assert!(grid.ijk_from_cell_index(0).is_some());
    assert!(grid.ijk_from_cell_index(1).is_some());
    assert_eq!(grid.ijk_from_cell_index(2), None);
    assert_eq!(grid.cell_corner_vertices(2), None);
}

#[test]
fn cell_geometry_queries() {
    let part = box_part([2, 2, 1], [0.0, 0.0, -10.0], [2.0, 2.0, 5.0], ElementType::Hex8).unwrap();
    let grid = part.struct_grid().unwrap();
    let cell = grid.cell_index_from_ijk(1, 1, 0).unwrap();

    let c = grid.cell_centroid(cell).unwrap();
    assert!((c.x - 3.0).abs() < 1e-12 && (c.y - 3.0).abs() < 1e-12 && (c.z + 7.5).abs() < 1e-12);

    let (min, max) = grid.cell_min_max_coordinates(cell).unwrap();
    assert_eq!([min.x, min.y, min.z], [2.0, 2.0, -10.0]);
    assert_eq!([max.x, max.y, max.z], [4.0, 4.0, -5.0]);

    let corners = grid.cell_corner_vertices(cell).unwrap();
    assert_eq!([corners[6].x, corners[6].y, corners[6].z], [4.0, 4.0, -5.0]);

    let p = nalgebra::Point3::new(3.1, 0.4, -6.0);
    assert_eq!(grid.cell_ijk_from_point(&p), Some([1, 0, 0]));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn ijk_round_trip(ni in 1usize..5, nj in 1usize..5, nk in 1usize..4) {
        let part = box_part([ni, nj, nk], [0.0; 3], [1.0; 3], ElementType::Hex8Reduced).unwrap();
        let grid = part.struct_grid().unwrap();
        prop_assert_eq!((grid.cell_count_i(), grid.cell_count_j(), grid.cell_count_k()), (ni, nj, nk));

        for idx in 0..part.element_count() {
            let [i, j, k] = grid.ijk_from_cell_index(idx).unwrap();
            prop_assert_eq!(grid.cell_index_from_ijk(i, j, k), Some(idx));
        }
        for k in 0..nk {
            for j in 0..nj {
                for i in 0..ni {
                    let idx = grid.cell_index_from_ijk(i, j, k).unwrap();
                    prop_assert_eq!(grid.ijk_from_cell_index(idx), Some([i, j, k]));
                }
            }
        }
        prop_assert_eq!(grid.cell_index_from_ijk(ni, 0, 0), None);
        prop_assert_eq!(grid.ijk_from_cell_index(part.element_count()), None);
    }
}
