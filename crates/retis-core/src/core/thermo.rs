//! Thermodynamic observables derived from a particle state.
//!
//! All functions optionally act on a selection of particle indices. The algebraic form
//! of every expression is kept fixed so that results are reproducible to the last bit.

use super::models::particles::Particles;
use super::models::system::System;
use nalgebra::{DMatrix, DVector};

/// Returns the particle indices a selection refers to; `None` selects every particle.
pub fn selected_indices(npart: usize, selection: Option<&[usize]>) -> Vec<usize> {
    match selection {
        Some(indices) => indices.to_vec(),
        None => (0..npart).collect(),
    }
}

/// Computes the kinetic energy tensor `0.5 * sum_i (m_i v_i) (x) v_i`.
pub fn kinetic_energy_tensor(particles: &Particles, selection: Option<&[usize]>) -> DMatrix<f64> {
    let dim = particles.dim();
    let indices = selected_indices(particles.npart(), selection);
    let mut kin = DMatrix::zeros(dim, dim);

    if let [i] = indices.as_slice() {
        let mass = particles.mass()[*i];
        for j in 0..dim {
            let mom = particles.vel[(*i, j)] * mass;
            for k in 0..dim {
                kin[(j, k)] = 0.5 * (mom * particles.vel[(*i, k)]);
            }
        }
        return kin;
    }

    for j in 0..dim {
        for k in 0..dim {
            let sum: f64 = indices
                .iter()
                .map(|&i| (particles.vel[(i, j)] * particles.mass()[i]) * particles.vel[(i, k)])
                .sum();
            kin[(j, k)] = 0.5 * sum;
        }
    }
    kin
}

/// Returns the scalar kinetic energy (trace of the tensor) together with the tensor.
pub fn kinetic_energy(particles: &Particles, selection: Option<&[usize]>) -> (f64, DMatrix<f64>) {
    let kin = kinetic_energy_tensor(particles, selection);
    (kin.trace(), kin)
}

/// Computes the kinetic temperature per dimension, its mean and the kinetic tensor.
///
/// The temperature in dimension `d` is `(2 * K_dd / (n - dof_d)) / kB` where `n` is the
/// number of selected particles. Without `dof` no reduction is applied.
pub fn kinetic_temperature(
    particles: &Particles,
    boltzmann: f64,
    dof: Option<&DVector<f64>>,
    selection: Option<&[usize]>,
) -> (DVector<f64>, f64, DMatrix<f64>) {
    let (_, kin) = kinetic_energy(particles, selection);
    let npart = selected_indices(particles.npart(), selection).len() as f64;
    let dim = particles.dim();

    let temperature = DVector::from_fn(dim, |d, _| {
        let ndof = match dof {
            Some(dof) => npart - dof[d],
            None => npart,
        };
        (2.0 * kin[(d, d)] / ndof) / boltzmann
    });
    let average = if dim == 0 { 0.0 } else { temperature.mean() };
    (temperature, average, kin)
}

/// Sum of `m_i v_i` over the selection.
pub fn linear_momentum(particles: &Particles, selection: Option<&[usize]>) -> DVector<f64> {
    let indices = selected_indices(particles.npart(), selection);
    DVector::from_fn(particles.dim(), |d, _| {
        indices
            .iter()
            .map(|&i| particles.vel[(i, d)] * particles.mass()[i])
            .sum()
    })
}

/// Computes `(virial + 2 * kin) / volume`. The kinetic tensor is computed when not given.
pub fn pressure_tensor(
    particles: &Particles,
    volume: f64,
    kin: Option<&DMatrix<f64>>,
) -> DMatrix<f64> {
    let computed;
    let kin = match kin {
        Some(kin) => kin,
        None => {
            computed = kinetic_energy_tensor(particles, None);
            &computed
        }
    };
    (&particles.virial + kin * 2.0) / volume
}

/// Trace of the pressure tensor divided by the dimensionality.
pub fn scalar_pressure(
    particles: &Particles,
    volume: f64,
    dim: usize,
    press: Option<&DMatrix<f64>>,
    kin: Option<&DMatrix<f64>>,
) -> f64 {
    match press {
        Some(press) => press.trace() / dim as f64,
        None => pressure_tensor(particles, volume, kin).trace() / dim as f64,
    }
}

/// Removes the net linear momentum of the selection.
///
/// With `dim_mask`, only dimensions flagged `true` are reset; the others keep their
/// net momentum.
pub fn reset_momentum(particles: &mut Particles, selection: Option<&[usize]>, dim_mask: Option<&[bool]>) {
    let indices = selected_indices(particles.npart(), selection);
    let mut mom = linear_momentum(particles, selection);
    if let Some(mask) = dim_mask {
        for (d, reset) in mask.iter().enumerate().take(mom.len()) {
            if !reset {
                mom[d] = 0.0;
            }
        }
    }
    let tot_mass: f64 = indices.iter().map(|&i| particles.mass()[i]).sum();
    if tot_mass <= 0.0 {
        return;
    }
    for &i in &indices {
        for d in 0..particles.dim() {
            particles.vel[(i, d)] -= mom[d] / tot_mass;
        }
    }
}

/// Thermodynamic summary of a system. Energies are per particle.
#[derive(Debug, Clone, PartialEq)]
pub struct ThermoRecord {
    pub vpot: f64,
    pub ekin: f64,
    pub etot: f64,
    pub temp: f64,
    pub press: f64,
    pub mom: DVector<f64>,
    pub press_tensor: DMatrix<f64>,
}

/// The reduced summary recorded for every phase point during path sampling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathThermoRecord {
    pub vpot: f64,
    pub ekin: f64,
    pub etot: f64,
    pub temp: f64,
}

/// Calculates energies, temperature, pressure and momentum from the stored state.
///
/// The potential energy is taken from the last committed evaluation.
pub fn calculate_thermo(system: &System) -> ThermoRecord {
    let particles = &system.particles;
    let npart = particles.npart() as f64;
    let vpot = particles.vpot / npart;
    let (ekin, kin) = kinetic_energy(particles, None);
    let ekin = ekin / npart;
    let (_, temp, _) = kinetic_temperature(
        particles,
        system.get_boltzmann(),
        system.temperature().dof.as_ref(),
        None,
    );
    let volume = system.volume();
    let press_tensor = pressure_tensor(particles, volume, Some(&kin));
    let press = scalar_pressure(particles, volume, system.dimension(), Some(&press_tensor), None);
    ThermoRecord {
        vpot,
        ekin,
        etot: vpot + ekin,
        temp,
        press,
        mom: linear_momentum(particles, None),
        press_tensor,
    }
}

pub fn calculate_thermo_path(system: &System) -> PathThermoRecord {
    let particles = &system.particles;
    let npart = particles.npart() as f64;
    let vpot = particles.vpot / npart;
    let (ekin, _) = kinetic_energy(particles, None);
    let ekin = ekin / npart;
    let (_, temp, _) = kinetic_temperature(
        particles,
        system.get_boltzmann(),
        system.temperature().dof.as_ref(),
        None,
    );
    PathThermoRecord {
        vpot,
        ekin,
        etot: vpot + ekin,
        temp,
    }
}
