use super::error::PathError;
use crate::core::models::system::System;
use crate::core::thermo;
use nalgebra::DMatrix;

/// Positions, velocities and energies stored with a phase point.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleSnapshot {
    pub pos: DMatrix<f64>,
    pub vel: DMatrix<f64>,
    pub vpot: f64,
    pub ekin: f64,
}

impl ParticleSnapshot {
    pub fn reverse_velocities(&mut self) {
        self.vel.neg_mut();
    }
}

/// One sample along a trajectory.
///
/// The order parameter may have several components; crossing logic only looks at the
/// first one.
#[derive(Debug, Clone, PartialEq)]
pub struct PhasePoint {
    order: Vec<f64>,
    pub time: f64,
    pub particles: Option<ParticleSnapshot>,
}

impl PhasePoint {
    pub fn new(order: Vec<f64>, time: f64) -> Result<Self, PathError> {
        if order.is_empty() {
            return Err(PathError::EmptyOrderParameter);
        }
        Ok(Self {
            order,
            time,
            particles: None,
        })
    }

    /// Creates a phase point with a scalar order parameter.
    pub fn scalar(order: f64, time: f64) -> Self {
        Self {
            order: vec![order],
            time,
            particles: None,
        }
    }

    pub fn with_particles(mut self, particles: ParticleSnapshot) -> Self {
        self.particles = Some(particles);
        self
    }

    /// Snapshots the current state of a system, using its stored order parameter.
    ///
    /// The stored energies are per particle, as in [`thermo::calculate_thermo_path`].
    pub fn from_system(system: &System, time: f64) -> Result<Self, PathError> {
        let order = system.order.clone().unwrap_or_default();
        let record = thermo::calculate_thermo_path(system);
        let snapshot = ParticleSnapshot {
            pos: system.particles.pos.clone(),
            vel: system.particles.vel.clone(),
            vpot: record.vpot,
            ekin: record.ekin,
        };
        Ok(Self::new(order, time)?.with_particles(snapshot))
    }

    pub fn order(&self) -> &[f64] {
        &self.order
    }

    /// The first component of the order parameter.
    pub fn order_parameter(&self) -> f64 {
        self.order[0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::particles::Particles;

    #[test]
    fn new_rejects_empty_order_parameter() {
        assert_eq!(
            PhasePoint::new(Vec::new(), 0.0),
            Err(PathError::EmptyOrderParameter)
        );
    }

    #[test]
    fn order_parameter_is_first_component() {
        let point = PhasePoint::new(vec![0.3, 9.0], 1.0).unwrap();
        assert_eq!(point.order_parameter(), 0.3);
        assert_eq!(point.order(), &[0.3, 9.0]);
    }

    #[test]
    fn from_system_copies_state_and_order() {
        let mut particles = Particles::new(1);
        particles
            .add_particle(&[0.5], &[2.0], &[0.0], 1.0, "X", 0)
            .unwrap();
        let mut system = System::new("reduced", particles, None, None).unwrap();
        assert_eq!(
            PhasePoint::from_system(&system, 0.0),
            Err(PathError::EmptyOrderParameter)
        );

        system.order = Some(vec![0.5]);
        let point = PhasePoint::from_system(&system, 3.0).unwrap();
        let snapshot = point.particles.as_ref().unwrap();
        assert_eq!(point.order_parameter(), 0.5);
        assert_eq!(snapshot.pos[(0, 0)], 0.5);
        assert_eq!(snapshot.ekin, 2.0);
    }

    #[test]
    fn from_system_stores_per_particle_energies() {
        let mut particles = Particles::new(1);
        particles
            .add_particle(&[-1.0], &[2.0], &[0.0], 1.0, "X", 0)
            .unwrap();
        particles
            .add_particle(&[1.0], &[-2.0], &[0.0], 1.0, "X", 0)
            .unwrap();
        particles.vpot = -3.0;
        let mut system = System::new("reduced", particles, None, None).unwrap();
        system.order = Some(vec![0.0]);

        let point = PhasePoint::from_system(&system, 0.0).unwrap();
        let snapshot = point.particles.as_ref().unwrap();
        let record = thermo::calculate_thermo_path(&system);
        assert_eq!(snapshot.ekin, record.ekin);
        assert_eq!(snapshot.vpot, record.vpot);
        assert_eq!(snapshot.ekin, 2.0);
        assert_eq!(snapshot.vpot, -1.5);
    }

    #[test]
    fn reverse_velocities_negates_every_component() {
        let mut snapshot = ParticleSnapshot {
            pos: DMatrix::zeros(1, 2),
            vel: DMatrix::from_row_slice(1, 2, &[1.0, -2.0]),
            vpot: 0.0,
            ekin: 0.0,
        };
        snapshot.reverse_velocities();
        assert_eq!(snapshot.vel, DMatrix::from_row_slice(1, 2, &[-1.0, 2.0]));
    }
}
