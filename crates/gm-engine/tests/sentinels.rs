//! Undefined inputs stay undefined through every formula.

use std::sync::Arc;
use std::thread;

use gm_core::{UNDEFINED, Value};
use gm_engine::{MemoryReader, PartResultsCollection};
use gm_mesh::{ElementType, Part, PartCollection, box_part};
use gm_results::{PositionType, ResultAddress};
use proptest::prelude::*;

const SLOTS: usize = 16;

/// One reader value replaced by `UNDEFINED` in every step.
#[derive(Debug, Clone, Copy)]
struct Poison {
    position: PositionType,
    field: &'static str,
    component: &'static str,
    index: usize,
}

impl Poison {
    fn stress(slot: usize) -> Self {
        Self { position: PositionType::ElementNodal, field: "S", component: "S11", index: slot }
    }

    fn strain(slot: usize) -> Self {
        Self { position: PositionType::ElementNodal, field: "E", component: "E33", index: slot }
    }

    fn void_ratio(slot: usize) -> Self {
        Self { position: PositionType::ElementNodal, field: "VOIDR", component: "", index: slot }
    }

    fn displacement(node: usize) -> Self {
        Self { position: PositionType::Nodal, field: "U", component: "U3", index: node }
    }

    fn pore_pressure(node: usize) -> Self {
        Self { position: PositionType::Nodal, field: "POR", component: "", index: node }
    }
}

fn model_part() -> Part {
    box_part([2, 1, 1], [0.0, 0.0, -1010.0], [10.0; 3], ElementType::Hex8Pore).unwrap()
}

fn collection(poison: Poison) -> PartResultsCollection {
    let part = model_part();
    let n = part.element_node_count();
    let reader = MemoryReader::new(vec!["a".into(), "b".into()]);
    let set = |position: PositionType, field: &str, comp: &str, step: usize, mut values: Vec<Value>| {
        if poison.position == position && poison.field == field && poison.component == comp {
            values[poison.index] = UNDEFINED;
        }
        reader.set_field_values(position, field, comp, 0, step, values);
    };

    for step in 0..2 {
        let scale = 1.0 + step as Value;
        for (c, comp) in ["S11", "S22", "S33", "S12", "S13", "S23"].iter().enumerate() {
            let values = (0..n)
                .map(|i| match c {
                    0 => -1.5e7 * scale,
                    1 => -1.8e7 * scale,
                    2 => -2.2e7 * scale,
                    _ => 1.0e5 * (i as Value + 1.0),
                })
                .collect();
            set(PositionType::ElementNodal, "S", comp, step, values);
        }
        for (c, comp) in ["E11", "E22", "E33", "E12", "E13", "E23"].iter().enumerate() {
            let v = match c {
                0 | 1 => -0.5e-4 * step as Value,
                2 => -2.0e-4 * step as Value,
                _ => 1.0e-6,
            };
            set(PositionType::ElementNodal, "E", comp, step, vec![v; n]);
        }
        set(PositionType::ElementNodal, "VOIDR", "", step, vec![0.25; n]);

        let por = part.node_coords().iter().map(|p| (1.0e7 - 1.0e4 * p.z) as Value * scale).collect();
        set(PositionType::Nodal, "POR", "", step, por);
        let u3 = part
            .node_coords()
            .iter()
            .map(|p| (-1.0e-3 * step as f64 * (p.z + 1010.0)) as Value)
            .collect();
        set(PositionType::Nodal, "U", "U3", step, u3);
    }
    reader.set_element_property(0, "MODULUS", vec![10.0; part.element_count()]);
    reader.set_element_property(0, "RATIO", vec![0.25; part.element_count()]);

    let mut parts = PartCollection::new();
    parts.add_part(part);
    PartResultsCollection::new(Arc::new(reader), parts)
}

fn en(field: &str, comp: &str) -> ResultAddress {
    ResultAddress::new(PositionType::ElementNodal, field, comp)
}

fn stress_dependents() -> Vec<ResultAddress> {
    vec![
        en("SE", "S11"),
        en("ST", "S11"),
        en("SE", "S1"),
        en("SE", "S3azi"),
        en("ST", "SM"),
        en("ST", "Q"),
        en("ST", "DPN"),
        en("SE", "SA13"),
        en("SE", "SFI"),
        en("SE", "FOS"),
        en("Gamma", "Gamma1"),
        en("MUD-WEIGHT", "MWW"),
        en("SE", "S11").with_time_lapse(1),
        en("ST", "S1").normalized(),
    ]
}

fn strain_dependents() -> Vec<ResultAddress> {
    vec![
        en("NE", "E33"),
        en("NE", "EV"),
        en("NE", "ED"),
        en("NE", "E1"),
        en("COMPRESSIBILITY", "PORE"),
        en("COMPRESSIBILITY", "VERTICAL"),
        en("COMPRESSIBILITY", "VERTICAL-RATIO"),
        en("PORO-PERM", "PHI"),
        en("PORO-PERM", "PERM"),
    ]
}

fn void_ratio_dependents() -> Vec<ResultAddress> {
    vec![
        en("PORO-PERM", "PHI0"),
        en("PORO-PERM", "PHI"),
        en("PORO-PERM", "DPHI"),
        en("PORO-PERM", "PERM"),
        en("COMPRESSIBILITY", "PORE"),
    ]
}

/// Assert that `address` is undefined exactly where `undefined` says so.
fn check_pattern(
    results: &PartResultsCollection,
    address: &ResultAddress,
    undefined: &[bool],
) -> Result<(), TestCaseError> {
    let values = results.result_values(address, 0, 1).unwrap();
    prop_assert_eq!(values.len(), undefined.len(), "{}", address);
    for (i, (v, expect_undefined)) in values.iter().zip(undefined).enumerate() {
        if *expect_undefined {
            prop_assert_eq!(*v, UNDEFINED, "{} at {}", address, i);
        } else {
            prop_assert!(v.is_finite(), "{} at {}", address, i);
        }
    }
    Ok(())
}

fn only(index: usize, len: usize) -> Vec<bool> {
    (0..len).map(|i| i == index).collect()
}

/// Nodes whose every incident element is in `dead`; the nodal gradient is
/// undefined there.
fn starved_nodes(part: &Part, dead: &[usize]) -> Vec<bool> {
    (0..part.node_count())
        .map(|node| part.node_elements().elements_using_node(node).iter().all(|e| dead.contains(e)))
        .collect()
}

/// Nodes at the other end of the two-cell box from `node`.
fn far_end(part: &Part, node: usize) -> Vec<usize> {
    let x = part.node_coord(node).x;
    (0..part.node_count())
        .filter(|&m| (part.node_coord(m).x - x).abs() > 15.0)
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn undefined_stress_propagates(slot in 0usize..SLOTS) {
        let results = collection(Poison::stress(slot));
        for address in stress_dependents() {
            check_pattern(&results, &address, &only(slot, SLOTS))?;
        }

        let part = model_part();
        let elm = part.element_node_owners()[slot];
        let node = part.connectivities()[slot];
        let face_slots = part.element_nodal_face_count();
        let mut on_faces = vec![false; face_slots];
        for face in 0..6 {
            for (position, &face_node) in part.face_nodes(elm, face).iter().enumerate() {
                if face_node == node {
                    on_faces[part.element_nodal_face_result_index(elm, face, position)] = true;
                }
            }
        }
        for field in ["SE", "ST"] {
            for comp in ["SN", "TP"] {
                let address = ResultAddress::new(PositionType::ElementNodalFace, field, comp);
                check_pattern(&results, &address, &on_faces)?;
            }
        }

        let starved = starved_nodes(&part, &[elm]);
        for axis in ["X", "Y", "Z"] {
            let address = ResultAddress::new(PositionType::Differentials, "SE", format!("S11-{axis}"));
            check_pattern(&results, &address, &starved)?;
            let untouched = ResultAddress::new(PositionType::Differentials, "ST", format!("S22-{axis}"));
            check_pattern(&results, &untouched, &vec![false; part.node_count()])?;
        }
    }

    #[test]
    fn undefined_strain_propagates(slot in 0usize..SLOTS) {
        let results = collection(Poison::strain(slot));
        for address in strain_dependents() {
            check_pattern(&results, &address, &only(slot, SLOTS))?;
        }
        check_pattern(&results, &en("PORO-PERM", "PHI0"), &[false; SLOTS])?;
    }

    #[test]
    fn undefined_void_ratio_propagates(slot in 0usize..SLOTS) {
        let results = collection(Poison::void_ratio(slot));
        for address in void_ratio_dependents() {
            check_pattern(&results, &address, &only(slot, SLOTS))?;
        }
        check_pattern(&results, &en("COMPRESSIBILITY", "VERTICAL"), &[false; SLOTS])?;
    }

    #[test]
    fn undefined_nodal_inputs_propagate(node in 0usize..12) {
        let part = model_part();
        let far = far_end(&part, node);

        let results = collection(Poison::displacement(node));
        let compaction = results
            .result_values(&ResultAddress::new(PositionType::Nodal, "COMPACTION", ""), 0, 1)
            .unwrap();
        prop_assert_eq!(compaction[node], UNDEFINED);
        for &m in &far {
            prop_assert!(compaction[m].is_finite(), "compaction at {}", m);
        }

        let results = collection(Poison::pore_pressure(node));
        let dead = part.node_elements().elements_using_node(node).to_vec();
        let starved = starved_nodes(&part, &dead);
        for axis in ["X", "Y", "Z"] {
            let address = ResultAddress::new(PositionType::Differentials, "POR-Bar", axis);
            check_pattern(&results, &address, &starved)?;
        }
    }

    #[test]
    fn concurrent_resolution_matches_serial(slot in 0usize..SLOTS) {
        let addresses: Vec<ResultAddress> = stress_dependents()
            .into_iter()
            .chain(strain_dependents())
            .collect();

        let serial = collection(Poison::stress(slot));
        let expected: Vec<Vec<Value>> = addresses
            .iter()
            .map(|a| serial.result_values(a, 0, 1).unwrap().to_vec())
            .collect();

        let concurrent = collection(Poison::stress(slot));
        let loaded: Vec<_> = thread::scope(|s| {
            let handles: Vec<_> = addresses
                .iter()
                .map(|address| {
                    let concurrent = &concurrent;
                    s.spawn(move || concurrent.find_or_load_scalar_result(0, address).unwrap())
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        for ((address, frames), expected) in addresses.iter().zip(&loaded).zip(&expected) {
            let cached = concurrent.find_or_load_scalar_result(0, address).unwrap();
            prop_assert!(Arc::ptr_eq(frames, &cached), "{}", address);
            prop_assert_eq!(frames.frame(1), expected.as_slice(), "{}", address);
        }
    }
}
