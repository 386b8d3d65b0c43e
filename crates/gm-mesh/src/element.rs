//! Element types and their local face tables.

/// Finite element shapes understood by the mesh model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    /// Eight-node hexahedron.
    Hex8,
    /// Eight-node hexahedron with reduced integration.
    Hex8Reduced,
    /// Eight-node hexahedron carrying pore pressure degrees of freedom.
    Hex8Pore,
    /// Four-node tetrahedron.
    Tet4,
}

/// Local face numbering of hexahedra.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum HexFace {
    PosI = 0,
    NegI = 1,
    PosJ = 2,
    NegJ = 3,
    PosK = 4,
    NegK = 5,
}

impl HexFace {
    pub const ALL: [HexFace; 6] = [
        HexFace::PosI,
        HexFace::NegI,
        HexFace::PosJ,
        HexFace::NegJ,
        HexFace::PosK,
        HexFace::NegK,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn opposite(self) -> HexFace {
        HexFace::ALL[HEX8_OPPOSITE_FACES[self.index()]]
    }

    /// Logical (di, dj, dk) step taken when crossing this face.
    pub fn ijk_offset(self) -> [i64; 3] {
        match self {
            HexFace::PosI => [1, 0, 0],
            HexFace::NegI => [-1, 0, 0],
            HexFace::PosJ => [0, 1, 0],
            HexFace::NegJ => [0, -1, 0],
            HexFace::PosK => [0, 0, 1],
            HexFace::NegK => [0, 0, -1],
        }
    }
}

// Outward winding. Local node layout: 0..3 bottom ring, 4..7 top ring.
const HEX8_FACES: [[usize; 4]; 6] = [
    [1, 2, 6, 5],
    [0, 4, 7, 3],
    [3, 7, 6, 2],
    [0, 1, 5, 4],
    [4, 5, 6, 7],
    [0, 3, 2, 1],
];

const HEX8_OPPOSITE_FACES: [usize; 6] = [1, 0, 3, 2, 5, 4];

const TET4_FACES: [[usize; 3]; 4] = [[0, 2, 1], [0, 1, 3], [1, 2, 3], [0, 3, 2]];

impl ElementType {
    pub fn node_count(self) -> usize {
        match self {
            ElementType::Hex8 | ElementType::Hex8Reduced | ElementType::Hex8Pore => 8,
            ElementType::Tet4 => 4,
        }
    }

    pub fn face_count(self) -> usize {
        match self {
            ElementType::Hex8 | ElementType::Hex8Reduced | ElementType::Hex8Pore => 6,
            ElementType::Tet4 => 4,
        }
    }

    /// Local node indices of `face`, in outward winding order.
    pub fn face_nodes(self, face: usize) -> &'static [usize] {
        match self {
            ElementType::Hex8 | ElementType::Hex8Reduced | ElementType::Hex8Pore => {
                &HEX8_FACES[face]
            }
            ElementType::Tet4 => &TET4_FACES[face],
        }
    }

    /// Number of (face, face-node) slots, i.e. element-nodal-face values per element.
    pub fn face_node_slot_count(self) -> usize {
        (0..self.face_count()).map(|f| self.face_nodes(f).len()).sum()
    }

    /// Face on the other side of the element, where one exists.
    pub fn opposite_face(self, face: usize) -> Option<usize> {
        if self.is_hexahedral() {
            HEX8_OPPOSITE_FACES.get(face).copied()
        } else {
            None
        }
    }

    pub fn is_hexahedral(self) -> bool {
        matches!(
            self,
            ElementType::Hex8 | ElementType::Hex8Reduced | ElementType::Hex8Pore
        )
    }

    /// Elements that carry pore pressure results.
    pub fn is_pore_pressure_bearing(self) -> bool {
        matches!(self, ElementType::Hex8Pore)
    }

    /// Abaqus-style element type name.
    pub fn label(self) -> &'static str {
        match self {
            ElementType::Hex8 => "C3D8",
            ElementType::Hex8Reduced => "C3D8R",
            ElementType::Hex8Pore => "C3D8P",
            ElementType::Tet4 => "C3D4",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "C3D8" => Some(ElementType::Hex8),
            "C3D8R" => Some(ElementType::Hex8Reduced),
            "C3D8P" | "C3D8RP" => Some(ElementType::Hex8Pore),
            "C3D4" => Some(ElementType::Tet4),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposite_faces_are_involutive() {
        for face in HexFace::ALL {
            assert_eq!(face.opposite().opposite(), face);
            let a = face.ijk_offset();
            let b = face.opposite().ijk_offset();
            assert_eq!([a[0] + b[0], a[1] + b[1], a[2] + b[2]], [0, 0, 0]);
        }
    }

    #[test]
    fn hex_faces_cover_each_node_three_times() {
        let mut count = [0; 8];
        for f in 0..6 {
            for &n in ElementType::Hex8.face_nodes(f) {
                count[n] += 1;
            }
        }
        assert_eq!(count, [3; 8]);
        assert_eq!(ElementType::Hex8.face_node_slot_count(), 24);
        assert_eq!(ElementType::Tet4.face_node_slot_count(), 12);
    }

    #[test]
    fn labels_round_trip() {
        for t in [
            ElementType::Hex8,
            ElementType::Hex8Reduced,
            ElementType::Hex8Pore,
            ElementType::Tet4,
        ] {
            assert_eq!(ElementType::from_label(t.label()), Some(t));
        }
        assert_eq!(ElementType::Tet4.opposite_face(0), None);
    }
}
