use super::{ForceField, ForceFieldError, ForceFieldHandle};
use crate::core::models::particles::Particles;
use crate::core::models::simbox::SimulationBox;
use nalgebra::DMatrix;

#[inline]
pub fn double_well(x: f64, a: f64, b: f64, c: f64) -> f64 {
    a * x.powi(4) - b * (x - c).powi(2)
}

#[inline]
pub fn double_well_force(x: f64, a: f64, b: f64, c: f64) -> f64 {
    -4.0 * a * x.powi(3) + 2.0 * b * (x - c)
}

#[inline]
pub fn lennard_jones_12_6(r2: f64, epsilon: f64, sigma: f64) -> f64 {
    let sr2 = sigma * sigma / r2;
    let sr6 = sr2 * sr2 * sr2;
    4.0 * epsilon * (sr6 * sr6 - sr6)
}

/// Magnitude of the pair force divided by the distance, so that `f_ij = factor * r_ij`.
#[inline]
pub fn lennard_jones_force_factor(r2: f64, epsilon: f64, sigma: f64) -> f64 {
    let sr2 = sigma * sigma / r2;
    let sr6 = sr2 * sr2 * sr2;
    24.0 * epsilon * (2.0 * sr6 * sr6 - sr6) / r2
}

/// An external double-well potential `V(x) = a x^4 - b (x - c)^2`.
///
/// The potential acts on the first coordinate of every particle. Being an external
/// field it does not contribute to the virial.
#[derive(Debug, Clone, PartialEq)]
pub struct DoubleWell {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl DoubleWell {
    pub fn new(a: f64, b: f64, c: f64) -> Self {
        Self { a, b, c }
    }

    fn check_dimension(&self, particles: &Particles) -> Result<(), ForceFieldError> {
        if particles.dim() == 0 {
            return Err(ForceFieldError::UnsupportedDimension {
                forcefield: self.name().to_string(),
                expected: 1,
                found: 0,
            });
        }
        Ok(())
    }
}

impl ForceField for DoubleWell {
    fn name(&self) -> &str {
        "double-well"
    }

    fn evaluate_potential(
        &self,
        particles: &Particles,
        _simbox: Option<&SimulationBox>,
    ) -> Result<f64, ForceFieldError> {
        self.check_dimension(particles)?;
        let vpot = particles
            .pos
            .column(0)
            .iter()
            .map(|&x| double_well(x, self.a, self.b, self.c))
            .sum();
        Ok(vpot)
    }

    fn evaluate_force(
        &self,
        particles: &Particles,
        _simbox: Option<&SimulationBox>,
    ) -> Result<(DMatrix<f64>, DMatrix<f64>), ForceFieldError> {
        self.check_dimension(particles)?;
        let mut force = DMatrix::zeros(particles.npart(), particles.dim());
        for (i, &x) in particles.pos.column(0).iter().enumerate() {
            force[(i, 0)] = double_well_force(x, self.a, self.b, self.c);
        }
        let virial = DMatrix::zeros(particles.dim(), particles.dim());
        Ok((force, virial))
    }
}

/// A truncated Lennard-Jones pair potential for a single particle species.
///
/// Pairs further apart than `rcut` do not interact. With `shift` enabled the potential
/// is shifted to zero at the cutoff. Periodic dimensions of the box use the minimum
/// image convention.
#[derive(Debug, Clone, PartialEq)]
pub struct LennardJonesCut {
    pub epsilon: f64,
    pub sigma: f64,
    pub rcut: f64,
    pub shift: bool,
}

impl LennardJonesCut {
    pub fn new(epsilon: f64, sigma: f64, rcut: f64, shift: bool) -> Self {
        Self {
            epsilon,
            sigma,
            rcut,
            shift,
        }
    }

    fn energy_shift(&self) -> f64 {
        if self.shift {
            lennard_jones_12_6(self.rcut * self.rcut, self.epsilon, self.sigma)
        } else {
            0.0
        }
    }

    /// Calls `visit(i, j, r_ij, r2)` for every pair within the cutoff.
    fn for_each_pair<F>(&self, particles: &Particles, simbox: Option<&SimulationBox>, mut visit: F)
    where
        F: FnMut(usize, usize, &[f64], f64),
    {
        let rcut2 = self.rcut * self.rcut;
        let dim = particles.dim();
        let mut rij = vec![0.0; dim];
        for i in 0..particles.npart() {
            for j in (i + 1)..particles.npart() {
                for (d, component) in rij.iter_mut().enumerate() {
                    *component = particles.pos[(i, d)] - particles.pos[(j, d)];
                }
                if let Some(simbox) = simbox {
                    simbox.pbc_dist_coordinate(&mut rij);
                }
                let r2: f64 = rij.iter().map(|x| x * x).sum();
                if r2 < rcut2 {
                    visit(i, j, &rij, r2);
                }
            }
        }
    }
}

impl ForceField for LennardJonesCut {
    fn name(&self) -> &str {
        "lennard-jones"
    }

    fn evaluate_potential(
        &self,
        particles: &Particles,
        simbox: Option<&SimulationBox>,
    ) -> Result<f64, ForceFieldError> {
        let vshift = self.energy_shift();
        let mut vpot = 0.0;
        self.for_each_pair(particles, simbox, |_, _, _, r2| {
            vpot += lennard_jones_12_6(r2, self.epsilon, self.sigma) - vshift;
        });
        if !vpot.is_finite() {
            return Err(ForceFieldError::NonFinite {
                forcefield: self.name().to_string(),
            });
        }
        Ok(vpot)
    }

    fn evaluate_force(
        &self,
        particles: &Particles,
        simbox: Option<&SimulationBox>,
    ) -> Result<(DMatrix<f64>, DMatrix<f64>), ForceFieldError> {
        let dim = particles.dim();
        let mut force = DMatrix::<f64>::zeros(particles.npart(), dim);
        let mut virial = DMatrix::zeros(dim, dim);
        self.for_each_pair(particles, simbox, |i, j, rij, r2| {
            let factor = lennard_jones_force_factor(r2, self.epsilon, self.sigma);
            for d in 0..dim {
                let fij = factor * rij[d];
                force[(i, d)] += fij;
                force[(j, d)] -= fij;
                for e in 0..dim {
                    virial[(d, e)] += rij[d] * factor * rij[e];
                }
            }
        });
        if force.iter().any(|f| !f.is_finite()) {
            return Err(ForceFieldError::NonFinite {
                forcefield: self.name().to_string(),
            });
        }
        Ok((force, virial))
    }
}

/// A force field that is the sum of other force fields.
#[derive(Debug, Clone)]
pub struct CompositeForceField {
    name: String,
    terms: Vec<ForceFieldHandle>,
}

impl CompositeForceField {
    pub fn new(name: &str, terms: Vec<ForceFieldHandle>) -> Self {
        Self {
            name: name.to_string(),
            terms,
        }
    }

    pub fn terms(&self) -> &[ForceFieldHandle] {
        &self.terms
    }
}

impl ForceField for CompositeForceField {
    fn name(&self) -> &str {
        &self.name
    }

    fn evaluate_potential(
        &self,
        particles: &Particles,
        simbox: Option<&SimulationBox>,
    ) -> Result<f64, ForceFieldError> {
        self.terms.iter().try_fold(0.0, |acc, term| {
            term.evaluate_potential(particles, simbox)
                .map(|vpot| acc + vpot)
        })
    }

    fn evaluate_force(
        &self,
        particles: &Particles,
        simbox: Option<&SimulationBox>,
    ) -> Result<(DMatrix<f64>, DMatrix<f64>), ForceFieldError> {
        let dim = particles.dim();
        let mut force = DMatrix::zeros(particles.npart(), dim);
        let mut virial = DMatrix::zeros(dim, dim);
        for term in &self.terms {
            let (term_force, term_virial) = term.evaluate_force(particles, simbox)?;
            force += term_force;
            virial += term_virial;
        }
        Ok((force, virial))
    }
}
