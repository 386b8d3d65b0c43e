//! Generated box meshes.

use gm_core::Real;

use crate::builder::PartBuilder;
use crate::element::ElementType;
use crate::error::{MeshError, MeshResult};

/// A box of `cells[0] × cells[1] × cells[2]` hexahedra starting at `origin`.
///
/// Nodes are numbered I fastest, then J, then K; element ids and node ids are
/// 1-based. K increases along +z.
pub fn box_part(
    cells: [usize; 3],
    origin: [Real; 3],
    cell_size: [Real; 3],
    element_type: ElementType,
) -> MeshResult<crate::Part> {
    if !element_type.is_hexahedral() {
        return Err(MeshError::NotStructured {
            reason: format!("box meshes need hexahedra, got {}", element_type.label()),
        });
    }
    let [ni, nj, nk] = cells;
    let (pi, pj, pk) = (ni + 1, nj + 1, nk + 1);
    let node = |i: usize, j: usize, k: usize| i + pi * (j + pj * k);

    let mut b = PartBuilder::with_capacity("box", pi * pj * pk, ni * nj * nk);
    for k in 0..pk {
        for j in 0..pj {
            for i in 0..pi {
                b.add_node(
                    node(i, j, k) as i64 + 1,
                    [
                        origin[0] + i as Real * cell_size[0],
                        origin[1] + j as Real * cell_size[1],
                        origin[2] + k as Real * cell_size[2],
                    ],
                );
            }
        }
    }

    let mut id = 1;
    for k in 0..nk {
        for j in 0..nj {
            for i in 0..ni {
                let conn = [
                    node(i, j, k),
                    node(i + 1, j, k),
                    node(i + 1, j + 1, k),
                    node(i, j + 1, k),
                    node(i, j, k + 1),
                    node(i + 1, j, k + 1),
                    node(i + 1, j + 1, k + 1),
                    node(i, j + 1, k + 1),
                ];
                b.add_element(id, element_type, &conn);
                id += 1;
            }
        }
    }
    b.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_match_dimensions() {
        let part = box_part([3, 2, 4], [0.0; 3], [1.0; 3], ElementType::Hex8Pore).unwrap();
        assert_eq!(part.element_count(), 24);
        assert_eq!(part.node_count(), 4 * 3 * 5);
        assert_eq!(part.element_node_count(), 24 * 8);
    }

    #[test]
    fn tetrahedra_rejected() {
        assert!(box_part([1, 1, 1], [0.0; 3], [1.0; 3], ElementType::Tet4).is_err());
    }
}
