//! A generated box model with geostatic stress and a depletion history.

use std::sync::Arc;

use gm_core::{Real, Value};
use gm_engine::{MemoryReader, PartResultsCollection};
use gm_mesh::{ElementType, MeshResult, Part, PartCollection, box_part};
use gm_results::PositionType;
use tracing::info;

const WATER_GRADIENT_PA_PER_M: Real = 1000.0 * gm_core::constants::G0_MPS2;
const OVERBURDEN_GRADIENT_PA_PER_M: Real = 2.2e4;
const HORIZONTAL_STRESS_RATIO: Real = 0.8;
const DEPLETION_PA_PER_STEP: Real = 10.0e5;
const TOP_DEPTH_M: Real = 1000.0;
const CELL_SIZE_M: Real = 50.0;

/// Shape of the generated model.
#[derive(Debug, Clone, Copy)]
pub struct ModelShape {
    pub cells: [usize; 3],
    pub steps: usize,
}

fn build_part(shape: ModelShape) -> MeshResult<Part> {
    let bottom = -TOP_DEPTH_M - shape.cells[2] as Real * CELL_SIZE_M;
    box_part(shape.cells, [0.0, 0.0, bottom], [CELL_SIZE_M; 3], ElementType::Hex8Pore)
}

/// Native fields of a reservoir depleted uniformly step by step.
fn fill_reader(part: &Part, steps: usize) -> MemoryReader {
    let reader = MemoryReader::new((0..steps).map(|s| format!("step-{s}")).collect());
    let slot_depth: Vec<Real> = part
        .connectivities()
        .iter()
        .map(|&n| -part.node_coord(n).z)
        .collect();
    let slots = slot_depth.len();

    for step in 0..steps {
        let drop = DEPLETION_PA_PER_STEP * step as Real;
        let por = part
            .node_coords()
            .iter()
            .map(|p| (WATER_GRADIENT_PA_PER_M * -p.z - drop) as Value)
            .collect();
        reader.set_field_values(PositionType::Nodal, "POR", "", 0, step, por);

        let u3 = part
            .node_coords()
            .iter()
            .map(|p| (-1.0e-3 * step as Real * (p.z + TOP_DEPTH_M + 1.0e3) / 1.0e3) as Value)
            .collect();
        reader.set_field_values(PositionType::Nodal, "U", "U3", 0, step, u3);

        let vertical: Vec<Real> = slot_depth
            .iter()
            .map(|d| -OVERBURDEN_GRADIENT_PA_PER_M * d + 0.5 * drop)
            .collect();
        let horizontal = vertical.iter().map(|v| (HORIZONTAL_STRESS_RATIO * v) as Value);
        reader.set_field_values(PositionType::ElementNodal, "S", "S11", 0, step, horizontal.clone().collect());
        reader.set_field_values(PositionType::ElementNodal, "S", "S22", 0, step, horizontal.collect());
        reader.set_field_values(
            PositionType::ElementNodal,
            "S",
            "S33",
            0,
            step,
            vertical.iter().map(|v| *v as Value).collect(),
        );
        for comp in ["S12", "S13", "S23"] {
            reader.set_field_values(PositionType::ElementNodal, "S", comp, 0, step, vec![0.0; slots]);
        }

        let e33 = (-2.0e-5 * step as Real) as Value;
        for (comp, v) in [("E11", 0.0), ("E22", 0.0), ("E33", e33), ("E12", 0.0), ("E13", 0.0), ("E23", 0.0)] {
            reader.set_field_values(PositionType::ElementNodal, "E", comp, 0, step, vec![v; slots]);
        }
        reader.set_field_values(PositionType::ElementNodal, "VOIDR", "", 0, step, vec![0.25; slots]);
    }

    reader.set_element_property(0, "MODULUS", vec![10.0; part.element_count()]);
    reader.set_element_property(0, "RATIO", vec![0.25; part.element_count()]);
    reader
}

pub fn build_collection(shape: ModelShape) -> MeshResult<PartResultsCollection> {
    let part = build_part(shape)?;
    info!(
        elements = part.element_count(),
        nodes = part.node_count(),
        steps = shape.steps,
        "generated synthetic model"
    );
    let reader = fill_reader(&part, shape.steps);
    let mut parts = PartCollection::new();
    parts.add_part(part);
    Ok(PartResultsCollection::new(Arc::new(reader), parts))
}
