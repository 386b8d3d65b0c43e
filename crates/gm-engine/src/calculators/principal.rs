use gm_core::{UNDEFINED, Value, to_value};
use gm_results::{PositionType, ResultAddress, ScalarResultFrames};

use crate::calculator::{ResultCalculator, load_dependencies, map_values, publish_siblings};
use crate::collection::PartResultsCollection;
use crate::error::EngineResult;
use crate::names;
use crate::tensor::{SymTensor, inclination_azimuth};

/// Principal values and directions of the stress and strain tensors.
///
/// Stress fields produce `S1..S3` and the inclination/azimuth pair of each
/// principal direction; `NE` produces `E1..E3` only. All siblings are
/// stored together.
#[derive(Debug, Clone, Copy)]
pub struct PrincipalCalculator;

fn is_stress_output(component: &str) -> bool {
    names::one_of(component, &names::PRINCIPAL_STRESSES)
        || names::one_of(component, &names::PRINCIPAL_DIRECTIONS)
}

/// Values in output order: S1 S2 S3 S1inc S1azi S2inc S2azi S3inc S3azi.
fn principal_row(values: [Value; 6]) -> [Value; 9] {
    let mut row = [UNDEFINED; 9];
    if values.iter().any(|v| !v.is_finite()) {
        return row;
    }
    let principal = SymTensor(values.map(f64::from)).principal();
    for (n, p) in principal.iter().enumerate() {
        row[n] = to_value(p.value);
        if let Some((inc, azi)) = p.direction.as_ref().and_then(inclination_azimuth) {
            row[3 + 2 * n] = to_value(inc);
            row[4 + 2 * n] = to_value(azi);
        }
    }
    row
}

impl ResultCalculator for PrincipalCalculator {
    fn name(&self) -> &str {
        "principal"
    }

    fn is_matching(&self, address: &ResultAddress) -> bool {
        if !address.is_plain() || address.position() != PositionType::ElementNodal {
            return false;
        }
        let comp = address.component_name();
        match address.field_name() {
            names::SE | names::ST => is_stress_output(comp),
            names::NE => names::one_of(comp, &names::PRINCIPAL_STRAINS),
            _ => false,
        }
    }

    fn calculate(
        &self,
        results: &PartResultsCollection,
        part: usize,
        address: &ResultAddress,
    ) -> EngineResult<ScalarResultFrames> {
        let Some(tensor) = names::tensor_component_addresses(address) else {
            return Ok(results.create_scalar_result(part, address));
        };
        let Some(inputs) = load_dependencies(results, part, tensor, address)? else {
            return Ok(results.create_scalar_result(part, address));
        };
        let inputs: [&ScalarResultFrames; 6] = inputs.each_ref().map(|f| f.as_ref());
        let outputs: [ScalarResultFrames; 9] =
            map_values(results.frame_count(), inputs, |_, v| principal_row(v));

        let output_names: Vec<&str> = if address.field_name() == names::NE {
            names::PRINCIPAL_STRAINS.to_vec()
        } else {
            names::PRINCIPAL_STRESSES
                .iter()
                .chain(names::PRINCIPAL_DIRECTIONS.iter())
                .copied()
                .collect()
        };
        let computed = output_names
            .into_iter()
            .zip(outputs)
            .map(|(c, frames)| (address.with_component(c), frames))
            .collect();
        publish_siblings(results, part, address, computed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_orders_values_then_directions() {
        let row = principal_row([0.0, 0.0, 10.0, 0.0, 0.0, 0.0]);
        assert_eq!(&row[..3], &[10.0, 0.0, 0.0]);
        assert_eq!(row[3], 0.0);
        assert_eq!(row[4], 0.0);
        assert_eq!(row[5], UNDEFINED);
    }

    #[test]
    fn undefined_component_poisons_row() {
        let row = principal_row([1.0, UNDEFINED, 0.0, 0.0, 0.0, 0.0]);
        assert!(row.iter().all(|v| *v == UNDEFINED));
    }
}
