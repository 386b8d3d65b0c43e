//! Calculation parameters and the results each parameter group affects.

use std::path::Path;

use gm_results::{PositionType, ResultAddress};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::names;

/// Upper bound of the mud-weight window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UpperMudWeightLimit {
    #[default]
    FractureGradient,
    ShMin,
}

/// Lower bound of the mud-weight window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LowerMudWeightLimit {
    #[default]
    PorePressure,
    MaxOfPorePressureAndShearFailure,
}

/// A named range of K layers, both ends inclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormationLayer {
    pub name: String,
    pub k_start: usize,
    pub k_end: usize,
}

impl FormationLayer {
    pub fn contains(&self, k: usize) -> bool {
        (self.k_start..=self.k_end).contains(&k)
    }
}

/// Material constants and options consumed by the derived-field formulas.
///
/// Every field is independently settable and has a default, so a YAML file
/// only needs to list what it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalculationParameters {
    /// Mohr-Coulomb cohesion [bar].
    pub cohesion: f64,
    /// Mohr-Coulomb friction angle [deg].
    pub friction_angle_deg: f64,
    /// Water depth above the model top used for normalization [m].
    pub normalization_air_gap: f64,

    pub biot_fixed_factor: f64,
    /// Element property holding a per-element Biot coefficient.
    pub biot_property: Option<String>,
    /// Element property holding Young's modulus [GPa].
    pub youngs_modulus_property: Option<String>,
    pub poisson_ratio_property: Option<String>,
    pub reference_time_step: usize,
    pub reference_layer: usize,
    /// Initial permeability used when no property table is given [mD].
    pub initial_permeability_fixed: f64,
    pub initial_permeability_property: Option<String>,
    pub permeability_exponent: f64,

    pub mud_weight_air_gap: f64,
    pub upper_limit: UpperMudWeightLimit,
    pub lower_limit: LowerMudWeightLimit,
    pub sh_multiplier: f64,
    pub hydrostatic_multiplier_pp_non_res: f64,
    /// K layer at the reservoir top. Elements above it use the non-reservoir
    /// pore pressure; unset means the topmost layer with pore pressure elements.
    pub mud_weight_reference_layer: Option<usize>,
    /// Element property holding the non-reservoir pore pressure [bar]. When
    /// unset, hydrostatic pressure times `hydrostatic_multiplier_pp_non_res`.
    pub non_reservoir_pore_pressure_property: Option<String>,

    /// Density of the hydrostatic column in the shear-slip indicator [sg].
    pub water_density_shear_slip_indicator: f64,

    pub formations: Vec<FormationLayer>,
}

impl Default for CalculationParameters {
    fn default() -> Self {
        Self {
            cohesion: 10.0,
            friction_angle_deg: 30.0,
            normalization_air_gap: 0.0,
            biot_fixed_factor: 1.0,
            biot_property: None,
            youngs_modulus_property: Some("MODULUS".to_string()),
            poisson_ratio_property: Some("RATIO".to_string()),
            reference_time_step: 0,
            reference_layer: 0,
            initial_permeability_fixed: 1.0,
            initial_permeability_property: None,
            permeability_exponent: 1.0,
            mud_weight_air_gap: 0.0,
            upper_limit: UpperMudWeightLimit::default(),
            lower_limit: LowerMudWeightLimit::default(),
            sh_multiplier: 1.05,
            hydrostatic_multiplier_pp_non_res: 1.0,
            mud_weight_reference_layer: None,
            non_reservoir_pore_pressure_property: None,
            water_density_shear_slip_indicator: 1.03,
            formations: Vec::new(),
        }
    }
}

fn invalid(what: &'static str, reason: impl Into<String>) -> EngineError {
    EngineError::InvalidParameter {
        what,
        reason: reason.into(),
    }
}

impl CalculationParameters {
    pub fn from_yaml_str(content: &str) -> EngineResult<Self> {
        let params: Self = serde_yaml::from_str(content)?;
        params.validate()?;
        Ok(params)
    }

    pub fn load_yaml(path: &Path) -> EngineResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn to_yaml_string(&self) -> EngineResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn save_yaml(&self, path: &Path) -> EngineResult<()> {
        self.validate()?;
        std::fs::write(path, self.to_yaml_string()?)?;
        Ok(())
    }

    pub fn validate(&self) -> EngineResult<()> {
        let finite = [
            ("cohesion", self.cohesion),
            ("friction_angle_deg", self.friction_angle_deg),
            ("normalization_air_gap", self.normalization_air_gap),
            ("biot_fixed_factor", self.biot_fixed_factor),
            ("initial_permeability_fixed", self.initial_permeability_fixed),
            ("permeability_exponent", self.permeability_exponent),
            ("mud_weight_air_gap", self.mud_weight_air_gap),
            ("sh_multiplier", self.sh_multiplier),
            ("hydrostatic_multiplier_pp_non_res", self.hydrostatic_multiplier_pp_non_res),
            ("water_density_shear_slip_indicator", self.water_density_shear_slip_indicator),
        ];
        for (what, v) in finite {
            if !v.is_finite() {
                return Err(invalid(what, format!("must be finite, got {v}")));
            }
        }
        if self.cohesion < 0.0 {
            return Err(invalid("cohesion", "must be non-negative"));
        }
        if !(self.friction_angle_deg > 0.0 && self.friction_angle_deg < 90.0) {
            return Err(invalid("friction_angle_deg", "must lie in (0, 90)"));
        }
        if self.water_density_shear_slip_indicator <= 0.0 {
            return Err(invalid("water_density_shear_slip_indicator", "must be positive"));
        }
        for layer in &self.formations {
            if layer.k_start > layer.k_end {
                return Err(invalid(
                    "formations",
                    format!("layer '{}' starts after it ends", layer.name),
                ));
            }
        }
        Ok(())
    }

    pub fn friction_angle_rad(&self) -> f64 {
        self.friction_angle_deg.to_radians()
    }
}

/// Sets of parameters whose change invalidates the same derived results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterGroup {
    MohrCoulomb,
    Poroelastic,
    ReferenceTimeStep,
    Normalization,
    ReferenceLayer,
    MudWeight,
    ShearSlip,
    Formations,
}

impl ParameterGroup {
    /// Groups that differ between `old` and `new`.
    pub fn changed_groups(old: &CalculationParameters, new: &CalculationParameters) -> Vec<Self> {
        let mut groups = Vec::new();
        if old.cohesion != new.cohesion || old.friction_angle_deg != new.friction_angle_deg {
            groups.push(Self::MohrCoulomb);
        }
        if old.biot_fixed_factor != new.biot_fixed_factor
            || old.biot_property != new.biot_property
            || old.youngs_modulus_property != new.youngs_modulus_property
            || old.poisson_ratio_property != new.poisson_ratio_property
            || old.initial_permeability_fixed != new.initial_permeability_fixed
            || old.initial_permeability_property != new.initial_permeability_property
            || old.permeability_exponent != new.permeability_exponent
        {
            groups.push(Self::Poroelastic);
        }
        if old.reference_time_step != new.reference_time_step {
            groups.push(Self::ReferenceTimeStep);
        }
        if (old.normalization_air_gap - new.normalization_air_gap).abs() > 1e-8 {
            groups.push(Self::Normalization);
        }
        if old.reference_layer != new.reference_layer {
            groups.push(Self::ReferenceLayer);
        }
        if old.mud_weight_air_gap != new.mud_weight_air_gap
            || old.upper_limit != new.upper_limit
            || old.lower_limit != new.lower_limit
            || old.sh_multiplier != new.sh_multiplier
            || old.hydrostatic_multiplier_pp_non_res != new.hydrostatic_multiplier_pp_non_res
            || old.mud_weight_reference_layer != new.mud_weight_reference_layer
            || old.non_reservoir_pore_pressure_property != new.non_reservoir_pore_pressure_property
        {
            groups.push(Self::MudWeight);
        }
        if old.water_density_shear_slip_indicator != new.water_density_shear_slip_indicator {
            groups.push(Self::ShearSlip);
        }
        if old.formations != new.formations {
            groups.push(Self::Formations);
        }
        groups
    }

    /// True if a cached result at `address` depends on this group.
    pub fn affects(self, address: &ResultAddress) -> bool {
        let field = address.field_name();
        let comp = address.component_name();
        let en = address.position() == PositionType::ElementNodal;
        match self {
            Self::MohrCoulomb => {
                (en && field == names::SE && names::one_of(comp, &names::MOHR_COULOMB))
                    || (en && field == names::MUD_WEIGHT)
            }
            Self::Poroelastic | Self::ReferenceTimeStep => {
                en && (field == names::COMPRESSIBILITY || field == names::PORO_PERM)
            }
            Self::Normalization => address.is_normalized(),
            Self::ReferenceLayer => {
                address.position() == PositionType::Nodal && field == names::COMPACTION
            }
            Self::MudWeight => en && field == names::MUD_WEIGHT,
            Self::ShearSlip => en && field == names::ST && comp == names::SHEAR_SLIP_INDICATOR,
            Self::Formations => address.position() == PositionType::FormationNames,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_overrides_only_listed_fields() {
        let p = CalculationParameters::from_yaml_str(
            "cohesion: 5.0\nupper_limit: ShMin\nformations:\n  - { name: Cap, k_start: 0, k_end: 1 }\n",
        )
        .unwrap();
        assert_eq!(p.cohesion, 5.0);
        assert_eq!(p.friction_angle_deg, 30.0);
        assert_eq!(p.upper_limit, UpperMudWeightLimit::ShMin);
        assert!(p.formations[0].contains(1));

        let back = CalculationParameters::from_yaml_str(&p.to_yaml_string().unwrap()).unwrap();
        assert_eq!(back, p);
    }

    #[test]
    fn validation_rejects_bad_values() {
        let p = CalculationParameters {
            friction_angle_deg: 95.0,
            ..Default::default()
        };
        assert!(matches!(
            p.validate(),
            Err(EngineError::InvalidParameter { what: "friction_angle_deg", .. })
        ));
        assert!(CalculationParameters::from_yaml_str("formations: [{name: A, k_start: 3, k_end: 1}]").is_err());
    }

    #[test]
    fn groups_map_to_dependent_addresses() {
        let old = CalculationParameters::default();
        let new = CalculationParameters {
            cohesion: 12.0,
            normalization_air_gap: 1e-10,
            ..Default::default()
        };
        assert_eq!(
            ParameterGroup::changed_groups(&old, &new),
            vec![ParameterGroup::MohrCoulomb]
        );

        let fos = ResultAddress::new(PositionType::ElementNodal, "SE", "FOS");
        let s1 = ResultAddress::new(PositionType::ElementNodal, "SE", "S1");
        assert!(ParameterGroup::MohrCoulomb.affects(&fos));
        assert!(ParameterGroup::MohrCoulomb.affects(&fos.clone().with_time_lapse(0)));
        assert!(!ParameterGroup::MohrCoulomb.affects(&s1));
        assert!(ParameterGroup::Normalization.affects(&s1.normalized()));
    }

    #[test]
    fn mud_weight_layer_options_invalidate_the_window() {
        let old = CalculationParameters::default();
        let new = CalculationParameters::from_yaml_str(
            "mud_weight_reference_layer: 3\nnon_reservoir_pore_pressure_property: PP_NONRES\n",
        )
        .unwrap();
        assert_eq!(new.mud_weight_reference_layer, Some(3));
        assert_eq!(ParameterGroup::changed_groups(&old, &new), vec![ParameterGroup::MudWeight]);
        let mww = ResultAddress::new(PositionType::ElementNodal, names::MUD_WEIGHT, "MWW");
        assert!(ParameterGroup::MudWeight.affects(&mww));
    }
}
