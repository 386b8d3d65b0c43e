//! gm-mesh: mesh and adjacency model for the geomechanical results engine.
//!
//! Provides:
//! - Element types with local face tables
//! - Parts built incrementally and validated on `build()`
//! - Lazily derived topology: node→element adjacency, face neighbors,
//!   a bounding-volume search tree and structured (I,J,K) grid inference
//! - Part collections with global↔local index translation
//!
//! # Example
//!
//! ```
//! use gm_mesh::{ElementType, box_part};
//!
//! let part = box_part([2, 2, 2], [0.0; 3], [1.0; 3], ElementType::Hex8).unwrap();
//! let grid = part.struct_grid().unwrap();
//!
//! assert_eq!(grid.cell_count_i(), 2);
//! assert_eq!(part.element_neighbors().neighbor_count(0), 3);
//! ```

pub mod adjacency;
pub mod builder;
pub mod collection;
pub mod element;
pub mod error;
pub mod face;
pub mod generate;
pub mod neighbors;
pub mod part;
pub mod search;
pub mod structured;
pub(crate) mod validate;

pub use adjacency::NodeElementAdjacency;
pub use builder::PartBuilder;
pub use collection::PartCollection;
pub use element::{ElementType, HexFace};
pub use error::{MeshError, MeshResult};
pub use face::{FaceComparator, FaceNodes};
pub use generate::box_part;
pub use neighbors::{ElementNeighbors, FaceNeighbor};
pub use part::Part;
pub use search::{BoundingBox, ElementSearchTree};
pub use structured::StructGrid;
