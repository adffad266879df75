use nalgebra::{DMatrix, DVector};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ParticleError {
    #[error("Particle vector '{field}' has {found} components, expected {expected}")]
    DimensionMismatch {
        field: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("Particle mass must be positive, got {0}")]
    NonPositiveMass(f64),
}

/// The state of all particles in a system.
///
/// Per-particle quantities are stored row-wise: row `i` of `pos`, `vel` and `force`
/// belongs to particle `i`. The struct is exclusively owned by a
/// [`System`](super::system::System) and is deep-copied with it.
#[derive(Debug, Clone, PartialEq)]
pub struct Particles {
    /// Number of spatial dimensions.
    dim: usize,
    /// Positions, `npart x dim`.
    pub pos: DMatrix<f64>,
    /// Velocities, `npart x dim`.
    pub vel: DMatrix<f64>,
    /// Forces from the last committed force evaluation, `npart x dim`.
    pub force: DMatrix<f64>,
    /// Virial tensor from the last committed force evaluation, `dim x dim`.
    pub virial: DMatrix<f64>,
    /// Potential energy from the last committed evaluation.
    pub vpot: f64,
    /// Kinetic energy, if it has been stored.
    pub ekin: f64,
    mass: DVector<f64>,
    imass: DVector<f64>,
    names: Vec<String>,
    ptypes: Vec<usize>,
}

impl Particles {
    /// Creates an empty particle list in `dim` dimensions.
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            pos: DMatrix::zeros(0, dim),
            vel: DMatrix::zeros(0, dim),
            force: DMatrix::zeros(0, dim),
            virial: DMatrix::zeros(dim, dim),
            vpot: 0.0,
            ekin: 0.0,
            mass: DVector::zeros(0),
            imass: DVector::zeros(0),
            names: Vec::new(),
            ptypes: Vec::new(),
        }
    }

    pub fn npart(&self) -> usize {
        self.pos.nrows()
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn mass(&self) -> &DVector<f64> {
        &self.mass
    }

    /// Inverse masses, one per particle.
    pub fn imass(&self) -> &DVector<f64> {
        &self.imass
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn ptypes(&self) -> &[usize] {
        &self.ptypes
    }

    /// Appends a particle and returns its index.
    pub fn add_particle(
        &mut self,
        pos: &[f64],
        vel: &[f64],
        force: &[f64],
        mass: f64,
        name: &str,
        ptype: usize,
    ) -> Result<usize, ParticleError> {
        self.check_len("pos", pos)?;
        self.check_len("vel", vel)?;
        self.check_len("force", force)?;
        if !(mass > 0.0) {
            return Err(ParticleError::NonPositiveMass(mass));
        }

        let index = self.npart();
        push_row(&mut self.pos, pos);
        push_row(&mut self.vel, vel);
        push_row(&mut self.force, force);
        self.mass = std::mem::replace(&mut self.mass, DVector::zeros(0)).insert_row(index, mass);
        self.imass =
            std::mem::replace(&mut self.imass, DVector::zeros(0)).insert_row(index, 1.0 / mass);
        self.names.push(name.to_string());
        self.ptypes.push(ptype);
        Ok(index)
    }

    fn check_len(&self, field: &'static str, values: &[f64]) -> Result<(), ParticleError> {
        if values.len() != self.dim {
            return Err(ParticleError::DimensionMismatch {
                field,
                expected: self.dim,
                found: values.len(),
            });
        }
        Ok(())
    }
}

fn push_row(matrix: &mut DMatrix<f64>, row: &[f64]) {
    let index = matrix.nrows();
    let grown = std::mem::replace(matrix, DMatrix::zeros(0, 0)).insert_row(index, 0.0);
    *matrix = grown;
    for (d, value) in row.iter().enumerate() {
        matrix[(index, d)] = *value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_particle_grows_all_per_particle_fields() {
        let mut particles = Particles::new(2);
        let first = particles
            .add_particle(&[1.0, 2.0], &[0.5, -0.5], &[0.0, 0.0], 2.0, "A", 0)
            .unwrap();
        let second = particles
            .add_particle(&[3.0, 4.0], &[0.0, 1.0], &[0.0, 0.0], 4.0, "B", 1)
            .unwrap();

        assert_eq!((first, second), (0, 1));
        assert_eq!(particles.npart(), 2);
        assert_eq!(particles.pos[(1, 0)], 3.0);
        assert_eq!(particles.vel[(0, 1)], -0.5);
        assert_eq!(particles.imass()[1], 0.25);
        assert_eq!(particles.names(), &["A".to_string(), "B".to_string()]);
        assert_eq!(particles.ptypes(), &[0, 1]);
    }

    #[test]
    fn add_particle_rejects_wrong_dimension() {
        let mut particles = Particles::new(3);
        let result = particles.add_particle(&[1.0], &[0.0; 3], &[0.0; 3], 1.0, "A", 0);
        assert_eq!(
            result,
            Err(ParticleError::DimensionMismatch {
                field: "pos",
                expected: 3,
                found: 1
            })
        );
        assert_eq!(particles.npart(), 0);
    }

    #[test]
    fn add_particle_rejects_non_positive_mass() {
        let mut particles = Particles::new(1);
        let result = particles.add_particle(&[0.0], &[0.0], &[0.0], 0.0, "A", 0);
        assert_eq!(result, Err(ParticleError::NonPositiveMass(0.0)));
    }

    #[test]
    fn virial_is_square_in_the_dimension() {
        let particles = Particles::new(3);
        assert_eq!(particles.virial.shape(), (3, 3));
    }
}
