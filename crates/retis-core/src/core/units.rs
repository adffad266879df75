use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
#[error("Unknown unit system: '{0}'")]
pub struct UnknownUnitsError(pub String);

/// Unit systems with a known Boltzmann constant.
pub const UNIT_SYSTEMS: &[&str] = &["reduced", "lj", "real", "metal", "gromacs", "si"];

/// Returns the Boltzmann constant expressed in the given unit system.
///
/// * `reduced` / `lj` - 1 (energies in units of epsilon, temperature in epsilon/kB)
/// * `real` - kcal/(mol K)
/// * `metal` - eV/K
/// * `gromacs` - kJ/(mol K)
/// * `si` - J/K
pub fn boltzmann_constant(units: &str) -> Result<f64, UnknownUnitsError> {
    match units.trim().to_ascii_lowercase().as_str() {
        "reduced" | "lj" => Ok(1.0),
        "real" => Ok(0.001_987_204_259),
        "metal" => Ok(8.617_333_262e-5),
        "gromacs" => Ok(0.008_314_462_618),
        "si" => Ok(1.380_649e-23),
        _ => Err(UnknownUnitsError(units.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reduced_units_have_unit_boltzmann_constant() {
        assert_eq!(boltzmann_constant("reduced"), Ok(1.0));
        assert_eq!(boltzmann_constant("LJ"), Ok(1.0));
    }

    #[test]
    fn every_listed_unit_system_is_known() {
        for units in UNIT_SYSTEMS {
            assert!(boltzmann_constant(units).is_ok(), "{units} should be known");
        }
    }

    #[test]
    fn unknown_unit_system_is_rejected() {
        let result = boltzmann_constant("furlongs");
        assert_eq!(result, Err(UnknownUnitsError("furlongs".to_string())));
    }
}
