//! gm-engine: on-demand derived results over a finite-element mesh.
//!
//! A [`PartResultsCollection`] owns the mesh, a raw-data [`ResultReader`]
//! and one result cache per part. Asking it for a [`ResultAddress`] either
//! returns the cached frames or dispatches to the single matching
//! [`ResultCalculator`], which resolves its own inputs through the same
//! collection.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use gm_engine::{MemoryReader, PartResultsCollection};
//! use gm_mesh::{ElementType, PartCollection, box_part};
//! use gm_results::{PositionType, ResultAddress};
//!
//! let part = box_part([1, 1, 1], [0.0, 0.0, -100.0], [10.0; 3], ElementType::Hex8).unwrap();
//! let mut parts = PartCollection::new();
//! parts.add_part(part);
//!
//! let reader = MemoryReader::new(vec!["initial".into()]);
//! for (i, c) in ["S11", "S22", "S33", "S12", "S13", "S23"].iter().enumerate() {
//!     let pa = if i == 0 { -1.0e6 } else { 0.0 };
//!     reader.set_field_values(PositionType::ElementNodal, "S", c, 0, 0, vec![pa; 8]);
//! }
//! let results = PartResultsCollection::new(Arc::new(reader), parts);
//!
//! let s1 = ResultAddress::new(PositionType::ElementNodal, "SE", "S1");
//! let values = results.result_values(&s1, 0, 0).unwrap();
//! assert!((values[0] - 10.0).abs() < 1e-4);
//! ```

pub mod calculator;
pub mod calculators;
pub mod collection;
pub mod error;
pub mod hex;
pub mod names;
pub mod params;
pub mod query;
pub mod reader;
pub mod registry;
pub mod tensor;

pub use calculator::ResultCalculator;
pub use collection::PartResultsCollection;
pub use error::{EngineError, EngineResult};
pub use params::{
    CalculationParameters, FormationLayer, LowerMudWeightLimit, ParameterGroup, UpperMudWeightLimit,
};
pub use query::ResultValues;
pub use reader::{ComponentBuffers, MemoryReader, ResultReader};
pub use registry::CalculatorRegistry;

pub use gm_results::{PositionType, ResultAddress, ScalarResultFrames, ScalarStatistics, StatisticsScope};
