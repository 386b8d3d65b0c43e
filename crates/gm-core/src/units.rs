// gm-core/src/units.rs

use uom::si::f64::{
    Acceleration as UomAcceleration, Length as UomLength, MassDensity as UomMassDensity,
    Pressure as UomPressure,
};

pub type Accel = UomAcceleration;
pub type Density = UomMassDensity;
pub type Length = UomLength;
pub type Pressure = UomPressure;

#[inline]
pub fn pa(v: f64) -> Pressure {
    use uom::si::pressure::pascal;
    Pressure::new::<pascal>(v)
}

#[inline]
pub fn bar(v: f64) -> Pressure {
    use uom::si::pressure::bar;
    Pressure::new::<bar>(v)
}

#[inline]
pub fn m(v: f64) -> Length {
    use uom::si::length::meter;
    Length::new::<meter>(v)
}

/// Density given as specific gravity relative to fresh water (g/cm³).
#[inline]
pub fn sg(v: f64) -> Density {
    use uom::si::mass_density::gram_per_cubic_centimeter;
    Density::new::<gram_per_cubic_centimeter>(v)
}

#[inline]
pub fn in_bar(p: Pressure) -> f64 {
    use uom::si::pressure::bar;
    p.get::<bar>()
}

/// Multiplier taking a value in pascal to bar.
pub fn pascal_to_bar_factor() -> f64 {
    in_bar(pa(1.0))
}

/// Hydrostatic pressure of a fluid column in bar.
///
/// Non-positive depths give zero pressure.
pub fn hydrostatic_pressure_bar(depth_m: f64, density_sg: f64) -> f64 {
    if depth_m <= 0.0 {
        return 0.0;
    }
    let p: Pressure = sg(density_sg) * constants::g0() * m(depth_m);
    in_bar(p)
}

pub mod constants {
    use super::*;

    pub const G0_MPS2: f64 = 9.806_65;

    #[inline]
    pub fn g0() -> Accel {
        use uom::si::acceleration::meter_per_second_squared;
        Accel::new::<meter_per_second_squared>(G0_MPS2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pascal_to_bar_scales_by_1e5() {
        assert!((pascal_to_bar_factor() - 1e-5).abs() < 1e-15);
        assert!((in_bar(bar(3.0)) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn hydrostatic_pressure_at_1000m() {
        // 1000 m of fresh water is roughly 98 bar.
        let p = hydrostatic_pressure_bar(1000.0, 1.0);
        assert!((p - 98.0665).abs() < 1e-6);
        assert_eq!(hydrostatic_pressure_bar(-5.0, 1.0), 0.0);
    }
}
