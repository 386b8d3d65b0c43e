//! Field and component names known to the engine.

use std::collections::BTreeMap;

use gm_results::{PositionType, ResultAddress};

// Native reader fields
pub const S: &str = "S";
pub const E: &str = "E";
pub const POR: &str = "POR";
pub const U: &str = "U";
pub const VOIDR: &str = "VOIDR";

// Derived fields
pub const S_BAR: &str = "S-Bar";
pub const POR_BAR: &str = "POR-Bar";
pub const SE: &str = "SE";
pub const ST: &str = "ST";
pub const NE: &str = "NE";
pub const GAMMA: &str = "Gamma";
pub const COMPACTION: &str = "COMPACTION";
pub const COMPRESSIBILITY: &str = "COMPRESSIBILITY";
pub const PORO_PERM: &str = "PORO-PERM";
pub const MUD_WEIGHT: &str = "MUD-WEIGHT";
pub const PLANE: &str = "Plane";
pub const FORMATION: &str = "FORMATION";

pub const STRESS_COMPONENTS: [&str; 6] = ["S11", "S22", "S33", "S12", "S13", "S23"];
pub const STRAIN_COMPONENTS: [&str; 6] = ["E11", "E22", "E33", "E12", "E13", "E23"];
pub const PRINCIPAL_STRESSES: [&str; 3] = ["S1", "S2", "S3"];
pub const PRINCIPAL_STRAINS: [&str; 3] = ["E1", "E2", "E3"];
pub const PRINCIPAL_DIRECTIONS: [&str; 6] = ["S1inc", "S1azi", "S2inc", "S2azi", "S3inc", "S3azi"];
pub const STRESS_INVARIANTS: [&str; 2] = ["SM", "Q"];
pub const MOHR_COULOMB: [&str; 3] = ["SFI", "DSM", "FOS"];
pub const VOLUMETRIC_STRAIN: [&str; 2] = ["EV", "ED"];
pub const GAMMA_COMPONENTS: [&str; 6] = ["Gamma1", "Gamma2", "Gamma3", "Gamma11", "Gamma22", "Gamma33"];
pub const COMPRESSIBILITY_COMPONENTS: [&str; 3] = ["PORE", "VERTICAL", "VERTICAL-RATIO"];
pub const PORO_PERM_COMPONENTS: [&str; 4] = ["PHI0", "PHI", "DPHI", "PERM"];
pub const INITIAL_POROSITY: &str = "PHI0";
pub const MUD_WEIGHT_COMPONENTS: [&str; 4] = ["MWW", "MWM", "UMWL", "LMWL"];
pub const PLANE_COMPONENTS: [&str; 2] = ["Pinc", "Pazi"];
pub const SURFACE_STRESS_COMPONENTS: [&str; 2] = ["SN", "TP"];
pub const GRADIENT_COMPONENTS: [&str; 3] = ["X", "Y", "Z"];
pub const SHEAR_SLIP_INDICATOR: &str = "DPN";
pub const STRESS_ANISOTROPY: [&str; 3] = ["SA12", "SA13", "SA23"];

pub fn one_of(name: &str, list: &[&str]) -> bool {
    list.contains(&name)
}

/// `S11-X` style name of the gradient of a stress component along an axis.
pub fn stress_gradient_name(stress: &str, axis: &str) -> String {
    format!("{stress}-{axis}")
}

/// Stress component and axis of a stress gradient component name.
pub fn split_stress_gradient(component: &str) -> Option<(&str, &str)> {
    let (stress, axis) = component.rsplit_once('-')?;
    (one_of(stress, &STRESS_COMPONENTS) && one_of(axis, &GRADIENT_COMPONENTS)).then_some((stress, axis))
}

/// Every stress gradient component name, grouped by stress component.
pub fn stress_gradient_components() -> Vec<String> {
    STRESS_COMPONENTS
        .iter()
        .flat_map(|s| GRADIENT_COMPONENTS.iter().map(move |a| stress_gradient_name(s, a)))
        .collect()
}

fn push(table: &mut BTreeMap<String, Vec<String>>, field: &str, groups: &[&[&str]]) {
    let comps = table.entry(field.to_string()).or_default();
    for group in groups {
        for c in *group {
            if !comps.iter().any(|x| x == c) {
                comps.push(c.to_string());
            }
        }
    }
}

/// Field → components the engine can derive at `position`.
pub fn derived_field_names(position: PositionType) -> BTreeMap<String, Vec<String>> {
    let mut t = BTreeMap::new();
    match position {
        PositionType::Nodal => {
            push(&mut t, POR_BAR, &[&[""]]);
            push(&mut t, COMPACTION, &[&[""]]);
        }
        PositionType::ElementNodal => {
            push(&mut t, S_BAR, &[&STRESS_COMPONENTS]);
            push(
                &mut t,
                SE,
                &[
                    &STRESS_COMPONENTS,
                    &STRESS_INVARIANTS,
                    &MOHR_COULOMB,
                    &PRINCIPAL_STRESSES,
                    &PRINCIPAL_DIRECTIONS,
                    &STRESS_ANISOTROPY,
                ],
            );
            push(
                &mut t,
                ST,
                &[
                    &STRESS_COMPONENTS,
                    &STRESS_INVARIANTS,
                    &[SHEAR_SLIP_INDICATOR],
                    &PRINCIPAL_STRESSES,
                    &PRINCIPAL_DIRECTIONS,
                    &STRESS_ANISOTROPY,
                ],
            );
            push(
                &mut t,
                NE,
                &[&STRAIN_COMPONENTS, &VOLUMETRIC_STRAIN, &PRINCIPAL_STRAINS],
            );
            push(&mut t, POR_BAR, &[&[""]]);
            push(&mut t, GAMMA, &[&GAMMA_COMPONENTS]);
            push(&mut t, COMPRESSIBILITY, &[&COMPRESSIBILITY_COMPONENTS]);
            push(&mut t, PORO_PERM, &[&PORO_PERM_COMPONENTS]);
            push(&mut t, MUD_WEIGHT, &[&MUD_WEIGHT_COMPONENTS]);
        }
        PositionType::ElementNodalFace => {
            push(&mut t, PLANE, &[&PLANE_COMPONENTS]);
            push(&mut t, SE, &[&SURFACE_STRESS_COMPONENTS]);
            push(&mut t, ST, &[&SURFACE_STRESS_COMPONENTS]);
        }
        PositionType::Differentials => {
            push(&mut t, POR_BAR, &[&GRADIENT_COMPONENTS]);
            let gradients = stress_gradient_components();
            let gradients: Vec<&str> = gradients.iter().map(String::as_str).collect();
            push(&mut t, SE, &[&gradients]);
            push(&mut t, ST, &[&gradients]);
        }
        PositionType::FormationNames => {
            push(&mut t, FORMATION, &[&[""]]);
        }
        PositionType::Element => {}
    }
    t
}

/// True if `address` names a field the engine derives rather than reads.
pub fn is_derived_field(address: &ResultAddress) -> bool {
    derived_field_names(address.position()).contains_key(address.field_name())
}

/// Addresses that may be divided by hydrostatic pressure.
pub fn is_normalizable(address: &ResultAddress) -> bool {
    let comp = address.component_name();
    match (address.position(), address.field_name()) {
        (PositionType::Nodal | PositionType::ElementNodal, POR_BAR) => comp.is_empty(),
        (PositionType::ElementNodal, SE) => {
            one_of(comp, &STRESS_COMPONENTS) || one_of(comp, &PRINCIPAL_STRESSES) || comp == "SM"
        }
        (PositionType::ElementNodal, ST) => {
            one_of(comp, &STRESS_COMPONENTS)
                || one_of(comp, &PRINCIPAL_STRESSES)
                || comp == "SM"
                || comp == "Q"
        }
        _ => false,
    }
}

/// Principal value addresses of a tensor field address, or the address itself
/// for scalar fields.
pub fn principal_component_addresses(address: &ResultAddress) -> Vec<ResultAddress> {
    let comps: &[&str] = match address.field_name() {
        SE | ST => &PRINCIPAL_STRESSES,
        NE => &PRINCIPAL_STRAINS,
        _ => return vec![address.clone()],
    };
    comps.iter().map(|c| address.with_component(*c)).collect()
}

/// The six tensor component addresses behind a tensor field address.
pub fn tensor_component_addresses(address: &ResultAddress) -> Option<[ResultAddress; 6]> {
    let comps = match address.field_name() {
        SE | ST | S_BAR | S => STRESS_COMPONENTS,
        NE | E => STRAIN_COMPONENTS,
        _ => return None,
    };
    Some(comps.map(|c| address.with_component(c)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_names_include_principal_and_formulas() {
        let t = derived_field_names(PositionType::ElementNodal);
        assert!(t["SE"].contains(&"FOS".to_string()));
        assert!(t["ST"].contains(&"S3azi".to_string()));
        assert!(t["ST"].contains(&"DPN".to_string()));
        assert!(!t["SE"].contains(&"DPN".to_string()));
        assert_eq!(t["MUD-WEIGHT"].len(), 4);
        assert!(derived_field_names(PositionType::Element).is_empty());
    }

    #[test]
    fn normalizable_set() {
        let st = ResultAddress::new(PositionType::ElementNodal, ST, "Q");
        let se = ResultAddress::new(PositionType::ElementNodal, SE, "Q");
        assert!(is_normalizable(&st));
        assert!(!is_normalizable(&se));
        assert!(is_normalizable(&ResultAddress::new(PositionType::Nodal, POR_BAR, "")));
        assert!(!is_normalizable(&ResultAddress::new(PositionType::ElementNodal, GAMMA, "Gamma1")));
    }

    #[test]
    fn tensor_components_follow_field() {
        let a = ResultAddress::new(PositionType::ElementNodal, NE, "E1");
        let comps = tensor_component_addresses(&a).unwrap();
        assert_eq!(comps[2].component_name(), "E33");
        assert!(tensor_component_addresses(&ResultAddress::new(PositionType::Nodal, U, "U1")).is_none());
    }

    #[test]
    fn stress_gradient_names_split_back() {
        assert_eq!(split_stress_gradient("S23-Z"), Some(("S23", "Z")));
        assert_eq!(split_stress_gradient("S1-X"), None);
        assert_eq!(split_stress_gradient("S11-W"), None);
        let t = derived_field_names(PositionType::Differentials);
        assert_eq!(t["SE"].len(), 18);
        assert_eq!(t["ST"][0], "S11-X");
        assert_eq!(t["POR-Bar"].len(), 3);
    }

    #[test]
    fn principal_addresses_by_field() {
        let st = ResultAddress::new(PositionType::ElementNodal, ST, "S12");
        let comps: Vec<_> = principal_component_addresses(&st)
            .iter()
            .map(|a| a.component_name().to_string())
            .collect();
        assert_eq!(comps, ["S1", "S2", "S3"]);
        let pp = ResultAddress::new(PositionType::Nodal, POR_BAR, "");
        assert_eq!(principal_component_addresses(&pp), vec![pp.clone()]);
    }
}
