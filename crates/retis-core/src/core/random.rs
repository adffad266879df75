use super::models::particles::Particles;
use super::thermo;
use nalgebra::{DMatrix, DVector};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::warn;

/// The complete, serializable state of a [`RandomGenerator`].
///
/// Restoring this state reproduces the exact sequence of subsequent draws, which is
/// what makes restarted simulations bit-identical to uninterrupted ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandomState {
    /// The 256-bit key of the ChaCha stream.
    pub seed: [u8; 32],
    /// The stream selector.
    pub stream: u64,
    /// The position (in 32-bit words) within the stream.
    pub word_pos: u128,
}

/// A seeded random generator used for all Monte Carlo decisions.
#[derive(Debug, Clone)]
pub struct RandomGenerator {
    rng: ChaCha8Rng,
}

impl PartialEq for RandomGenerator {
    fn eq(&self, other: &Self) -> bool {
        self.state() == other.state()
    }
}

impl RandomGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Draws a uniform number in `[0, 1)`.
    pub fn rand(&mut self) -> f64 {
        self.rng.r#gen::<f64>()
    }

    /// Draws a uniform integer from the closed interval `[low, high]`.
    ///
    /// A degenerate interval (`high <= low`) returns `low` without consuming randomness.
    pub fn random_integers(&mut self, low: usize, high: usize) -> usize {
        if high <= low {
            return low;
        }
        self.rng.gen_range(low..=high)
    }

    /// Draws from a normal distribution with mean `loc` and standard deviation `scale`.
    pub fn normal(&mut self, loc: f64, scale: f64) -> f64 {
        let z: f64 = self.rng.sample(StandardNormal);
        loc + scale * z
    }

    /// Draws a `rows x cols` matrix of standard normal numbers, filled row by row.
    pub fn normal_matrix(&mut self, rows: usize, cols: usize) -> DMatrix<f64> {
        let values: Vec<f64> = (0..rows * cols)
            .map(|_| self.rng.sample(StandardNormal))
            .collect();
        DMatrix::from_row_slice(rows, cols, &values)
    }

    pub fn state(&self) -> RandomState {
        RandomState {
            seed: self.rng.get_seed(),
            stream: self.rng.get_stream(),
            word_pos: self.rng.get_word_pos(),
        }
    }

    pub fn set_state(&mut self, state: &RandomState) {
        let mut rng = ChaCha8Rng::from_seed(state.seed);
        rng.set_stream(state.stream);
        rng.set_word_pos(state.word_pos);
        self.rng = rng;
    }

    /// Draws velocities from the Maxwell-Boltzmann distribution.
    ///
    /// Each selected velocity component is drawn as `sqrt(imass * kB * T) * N(0, 1)`.
    /// Optionally the net momentum of the selection is removed, after which the
    /// velocities are rescaled so that the kinetic temperature equals `temperature`.
    pub fn generate_maxwellian_velocities(
        &mut self,
        particles: &mut Particles,
        boltzmann: f64,
        temperature: f64,
        dof: Option<&DVector<f64>>,
        selection: Option<&[usize]>,
        momentum: bool,
    ) {
        let indices = thermo::selected_indices(particles.npart(), selection);
        let kbt = 1.0 * temperature * boltzmann;
        let draws = self.normal_matrix(indices.len(), particles.dim());

        for (row, &i) in indices.iter().enumerate() {
            let factor = (particles.imass()[i] * kbt).sqrt();
            for d in 0..particles.dim() {
                particles.vel[(i, d)] = factor * draws[(row, d)];
            }
        }

        if momentum {
            thermo::reset_momentum(particles, selection, None);
        }

        let (_, avg_temp, _) = thermo::kinetic_temperature(particles, boltzmann, dof, None);
        if avg_temp <= 0.0 || !avg_temp.is_finite() {
            warn!(
                avg_temp,
                "Kinetic temperature after drawing velocities is not positive; skipping rescale."
            );
            return;
        }
        let scale_factor = (temperature / avg_temp).sqrt();
        for &i in &indices {
            for d in 0..particles.dim() {
                particles.vel[(i, d)] *= scale_factor;
            }
        }
    }
}

/// A shared handle to a [`RandomGenerator`].
///
/// Paths derived from one another, ensembles and the simulation itself hold handles
/// rather than generators, so the sharing relationship is an explicit field. Cloning a
/// handle (or calling [`RandomHandle::share`]) never copies the generator: every
/// handle in a lineage draws from the same stream.
#[derive(Debug, Clone)]
pub struct RandomHandle(Rc<RefCell<RandomGenerator>>);

impl RandomHandle {
    pub fn new(generator: RandomGenerator) -> Self {
        Self(Rc::new(RefCell::new(generator)))
    }

    pub fn seeded(seed: u64) -> Self {
        Self::new(RandomGenerator::new(seed))
    }

    /// Returns another handle to the same generator.
    pub fn share(&self) -> Self {
        Self(Rc::clone(&self.0))
    }

    /// Returns `true` if both handles refer to the same generator instance.
    pub fn is_shared_with(&self, other: &RandomHandle) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Runs `f` with exclusive access to the underlying generator.
    pub fn with<R>(&self, f: impl FnOnce(&mut RandomGenerator) -> R) -> R {
        f(&mut self.0.borrow_mut())
    }

    pub fn rand(&self) -> f64 {
        self.with(|rng| rng.rand())
    }

    pub fn random_integers(&self, low: usize, high: usize) -> usize {
        self.with(|rng| rng.random_integers(low, high))
    }

    pub fn state(&self) -> RandomState {
        self.0.borrow().state()
    }

    pub fn set_state(&self, state: &RandomState) {
        self.with(|rng| rng.set_state(state));
    }
}
