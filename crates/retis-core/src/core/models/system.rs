use super::particles::{ParticleError, Particles};
use super::simbox::SimulationBox;
use crate::core::forcefield::{ForceFieldError, ForceFieldHandle};
use crate::core::random::RandomGenerator;
use crate::core::thermo;
use crate::core::units::{UnknownUnitsError, boltzmann_constant};
use nalgebra::{DMatrix, DVector};
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

const DOF_TOLERANCE: f64 = 1e-8;

#[derive(Debug, Error)]
pub enum SystemError {
    #[error(transparent)]
    Units(#[from] UnknownUnitsError),
    #[error("Unknown velocity distribution: '{0}'")]
    UnknownDistribution(String),
    #[error("No force field is attached to the system")]
    NoForceField,
    #[error("No temperature was given and the system has no set temperature")]
    MissingTemperature,
    #[error("Dimension mismatch for {what}: expected {expected}, found {found}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("Force field evaluation failed: {0}")]
    ForceField(#[from] ForceFieldError),
    #[error("Invalid particle: {0}")]
    Particle(#[from] ParticleError),
}

/// The temperature bookkeeping of a system.
///
/// `beta` is `1 / (kB * set)` whenever `set` is present. `dof` holds the per-dimension
/// reduction of degrees of freedom used for kinetic temperatures.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TemperatureRecord {
    pub set: Option<f64>,
    pub dof: Option<DVector<f64>>,
    pub beta: Option<f64>,
}

/// Distributions velocities can be drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VelocityDistribution {
    Maxwell,
}

impl FromStr for VelocityDistribution {
    type Err = SystemError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "maxwell" | "boltzmann" => Ok(VelocityDistribution::Maxwell),
            _ => Err(SystemError::UnknownDistribution(s.to_string())),
        }
    }
}

/// A particle system bound to a simulation box and a force field.
///
/// Cloning a system deep-copies the particle state and the box while the force field
/// is shared between the copies.
#[derive(Debug, Clone)]
pub struct System {
    /// The unit system, used to look up the Boltzmann constant.
    pub units: String,
    pub particles: Particles,
    simbox: Option<SimulationBox>,
    forcefield: Option<ForceFieldHandle>,
    temperature: TemperatureRecord,
    boltzmann: f64,
    /// Names of setup steps that have been applied to the system.
    pub post_setup: Vec<String>,
    /// The last order parameter computed for the system, if any.
    pub order: Option<Vec<f64>>,
}

impl System {
    /// Creates a new system.
    ///
    /// # Arguments
    ///
    /// * `units` - The unit system; it must be one of [`UNIT_SYSTEMS`](crate::core::units::UNIT_SYSTEMS).
    /// * `particles` - The particle state the system takes ownership of.
    /// * `simbox` - An optional box. Every periodic dimension removes one degree of freedom.
    /// * `temperature` - An optional set temperature.
    ///
    /// # Errors
    ///
    /// Returns [`SystemError::Units`] for unknown units and
    /// [`SystemError::DimensionMismatch`] if the box and the particles disagree.
    pub fn new(
        units: &str,
        particles: Particles,
        simbox: Option<SimulationBox>,
        temperature: Option<f64>,
    ) -> Result<Self, SystemError> {
        let boltzmann = boltzmann_constant(units)?;
        if let Some(simbox) = &simbox {
            if simbox.dim() != particles.dim() {
                return Err(SystemError::DimensionMismatch {
                    what: "box",
                    expected: particles.dim(),
                    found: simbox.dim(),
                });
            }
        }
        let mut system = Self {
            units: units.to_string(),
            particles,
            simbox,
            forcefield: None,
            temperature: TemperatureRecord::default(),
            boltzmann,
            post_setup: Vec::new(),
            order: None,
        };
        system.set_temperature(temperature);
        system.adjust_dof_according_to_box()?;
        Ok(system)
    }

    pub fn with_forcefield(mut self, forcefield: ForceFieldHandle) -> Self {
        self.forcefield = Some(forcefield);
        self
    }

    pub fn set_forcefield(&mut self, forcefield: ForceFieldHandle) {
        self.forcefield = Some(forcefield);
    }

    pub fn forcefield(&self) -> Option<&ForceFieldHandle> {
        self.forcefield.as_ref()
    }

    pub fn simbox(&self) -> Option<&SimulationBox> {
        self.simbox.as_ref()
    }

    pub fn temperature(&self) -> &TemperatureRecord {
        &self.temperature
    }

    pub fn get_boltzmann(&self) -> f64 {
        self.boltzmann
    }

    /// The dimensionality of the system, taken from the box when one is attached.
    pub fn dimension(&self) -> usize {
        self.simbox
            .as_ref()
            .map_or(self.particles.dim(), SimulationBox::dim)
    }

    /// The box volume; infinite without a box.
    pub fn volume(&self) -> f64 {
        self.simbox
            .as_ref()
            .map_or(f64::INFINITY, SimulationBox::volume)
    }

    /// Sets the temperature and updates `beta` accordingly.
    pub fn set_temperature(&mut self, temperature: Option<f64>) {
        self.temperature.set = temperature;
        self.temperature.beta = temperature.map(|t| 1.0 / (self.boltzmann * t));
    }

    /// Adds `dof` to the current degrees-of-freedom reduction.
    ///
    /// Repeated calls accumulate.
    pub fn update_dof(&mut self, dof: &DVector<f64>) -> Result<(), SystemError> {
        if dof.len() != self.dimension() {
            return Err(SystemError::DimensionMismatch {
                what: "dof",
                expected: self.dimension(),
                found: dof.len(),
            });
        }
        self.temperature.dof = Some(match self.temperature.dof.take() {
            Some(current) => current + dof,
            None => dof.clone(),
        });
        Ok(())
    }

    /// Removes one degree of freedom for every periodic dimension of the box.
    pub fn adjust_dof_according_to_box(&mut self) -> Result<(), SystemError> {
        let Some(simbox) = &self.simbox else {
            return Ok(());
        };
        let dof = DVector::from_iterator(
            simbox.dim(),
            simbox.periodic().iter().map(|&p| if p { 1.0 } else { 0.0 }),
        );
        debug!(?dof, "Adjusting degrees of freedom for periodic box.");
        self.update_dof(&dof)
    }

    pub fn add_particle(
        &mut self,
        pos: &[f64],
        vel: &[f64],
        force: &[f64],
        mass: f64,
        name: &str,
        ptype: usize,
    ) -> Result<usize, SystemError> {
        Ok(self
            .particles
            .add_particle(pos, vel, force, mass, name, ptype)?)
    }

    fn require_forcefield(&self) -> Result<&ForceFieldHandle, SystemError> {
        self.forcefield.as_ref().ok_or(SystemError::NoForceField)
    }

    pub fn evaluate_potential(&self) -> Result<f64, SystemError> {
        Ok(self
            .require_forcefield()?
            .evaluate_potential(&self.particles, self.simbox.as_ref())?)
    }

    pub fn evaluate_force(&self) -> Result<(DMatrix<f64>, DMatrix<f64>), SystemError> {
        Ok(self
            .require_forcefield()?
            .evaluate_force(&self.particles, self.simbox.as_ref())?)
    }

    pub fn evaluate_potential_and_force(
        &self,
    ) -> Result<(f64, DMatrix<f64>, DMatrix<f64>), SystemError> {
        Ok(self
            .require_forcefield()?
            .evaluate_potential_and_force(&self.particles, self.simbox.as_ref())?)
    }

    /// Evaluates the potential energy and stores it in the particle state.
    pub fn potential(&mut self) -> Result<f64, SystemError> {
        let vpot = self.evaluate_potential()?;
        self.particles.vpot = vpot;
        Ok(vpot)
    }

    /// Evaluates forces and virial and stores them in the particle state.
    pub fn force(&mut self) -> Result<(DMatrix<f64>, DMatrix<f64>), SystemError> {
        let (force, virial) = self.evaluate_force()?;
        self.particles.force = force.clone();
        self.particles.virial = virial.clone();
        Ok((force, virial))
    }

    /// Evaluates potential energy, forces and virial and stores all of them.
    pub fn potential_and_force(
        &mut self,
    ) -> Result<(f64, DMatrix<f64>, DMatrix<f64>), SystemError> {
        let (vpot, force, virial) = self.evaluate_potential_and_force()?;
        self.particles.vpot = vpot;
        self.particles.force = force.clone();
        self.particles.virial = virial.clone();
        Ok((vpot, force, virial))
    }

    /// Draws new velocities with a freshly seeded generator.
    ///
    /// # Arguments
    ///
    /// * `seed` - Seed of the generator the velocities are drawn with.
    /// * `momentum` - Whether the net momentum is removed after drawing.
    /// * `temperature` - Target temperature; the set temperature is used when `None`.
    /// * `distribution` - Name of the distribution. Only `"maxwell"` is known.
    ///
    /// # Errors
    ///
    /// Returns [`SystemError::UnknownDistribution`] or [`SystemError::MissingTemperature`]
    /// without touching the velocities.
    pub fn generate_velocities(
        &mut self,
        seed: u64,
        momentum: bool,
        temperature: Option<f64>,
        distribution: &str,
    ) -> Result<(), SystemError> {
        let mut rgen = RandomGenerator::new(seed);
        self.generate_velocities_with(&mut rgen, momentum, temperature, distribution)
    }

    /// Like [`System::generate_velocities`], drawing from the given generator.
    pub fn generate_velocities_with(
        &mut self,
        rgen: &mut RandomGenerator,
        momentum: bool,
        temperature: Option<f64>,
        distribution: &str,
    ) -> Result<(), SystemError> {
        let distribution: VelocityDistribution = distribution.parse()?;
        let temperature = temperature
            .or(self.temperature.set)
            .ok_or(SystemError::MissingTemperature)?;
        match distribution {
            VelocityDistribution::Maxwell => rgen.generate_maxwellian_velocities(
                &mut self.particles,
                self.boltzmann,
                temperature,
                self.temperature.dof.as_ref(),
                None,
                momentum,
            ),
        }
        Ok(())
    }

    /// The average kinetic temperature with the system's degrees of freedom.
    pub fn calculate_temperature(&self) -> f64 {
        let (_, temperature, _) = thermo::kinetic_temperature(
            &self.particles,
            self.boltzmann,
            self.temperature.dof.as_ref(),
            None,
        );
        temperature
    }

    /// Rescales velocities so that the total energy equals `energy`.
    ///
    /// The potential energy is (re)evaluated and stored. Returns `false`, leaving the
    /// velocities untouched, when the required kinetic energy is negative or the
    /// current kinetic energy is zero.
    pub fn rescale_velocities(&mut self, energy: f64) -> Result<bool, SystemError> {
        let vpot = self.potential()?;
        let (ekin, _) = thermo::kinetic_energy(&self.particles, None);
        let ekin_new = energy - vpot;
        if ekin_new < 0.0 {
            warn!(
                energy,
                vpot, "Potential energy exceeds the requested total energy; velocities not rescaled."
            );
            return Ok(false);
        }
        if ekin <= 0.0 {
            warn!("Kinetic energy is zero; velocities cannot be rescaled.");
            return Ok(false);
        }
        let alpha = (ekin_new / ekin).sqrt();
        self.particles.vel *= alpha;
        Ok(true)
    }
}

impl PartialEq for System {
    fn eq(&self, other: &Self) -> bool {
        let same_forcefield = match (&self.forcefield, &other.forcefield) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        let same_dof = match (&self.temperature.dof, &other.temperature.dof) {
            (Some(a), Some(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() < DOF_TOLERANCE)
            }
            (None, None) => true,
            _ => false,
        };
        self.units == other.units
            && self.post_setup == other.post_setup
            && self.simbox == other.simbox
            && self.particles == other.particles
            && same_forcefield
            && self.temperature.set == other.temperature.set
            && self.temperature.beta == other.temperature.beta
            && same_dof
    }
}
