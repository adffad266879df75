use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for '{key}': {reason}")]
    InvalidValue { key: &'static str, reason: String },
}

#[derive(Debug, Error)]
pub enum SettingsLoadError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
    #[error(transparent)]
    Invalid(#[from] ConfigError),
}

/// The kind of path simulation, as recorded in settings and restart files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SimulationType {
    Tis,
    Retis,
    GenericPath,
}

impl fmt::Display for SimulationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SimulationType::Tis => "tis",
            SimulationType::Retis => "retis",
            SimulationType::GenericPath => "generic-path",
        };
        f.write_str(name)
    }
}

/// Shooting velocity width: one value for all particles or one per particle.
///
/// A negative scalar selects aimless shooting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SigmaV {
    Scalar(f64),
    PerParticle(Vec<f64>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SimulationSection {
    pub task: SimulationType,
    /// The cycle number the simulation ends at.
    pub steps: u64,
    #[serde(default)]
    pub startcycle: u64,
    #[serde(default = "default_exe_path")]
    pub exe_path: PathBuf,
    #[serde(default)]
    pub restart: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SystemSection {
    #[serde(default = "default_units")]
    pub units: String,
    #[serde(default)]
    pub temperature: Option<f64>,
}

impl Default for SystemSection {
    fn default() -> Self {
        Self {
            units: default_units(),
            temperature: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TisSettings {
    /// Recorded as given. The shooting mode is derived from `sigma-v`, see
    /// [`TisSettings::aimless_shooting`].
    #[serde(default)]
    pub aimless: bool,
    #[serde(default = "default_sigma_v")]
    pub sigma_v: SigmaV,
    pub seed: u64,
    /// Probability of choosing a shooting move over time reversal.
    #[serde(default = "default_freq")]
    pub freq: f64,
    #[serde(default)]
    pub maxlength: Option<usize>,
    #[serde(default)]
    pub allowmaxlength: bool,
    #[serde(default)]
    pub zero_momentum: bool,
    #[serde(default)]
    pub rescale_energy: Option<f64>,
}

impl TisSettings {
    pub fn new(seed: u64) -> Self {
        Self {
            aimless: false,
            sigma_v: default_sigma_v(),
            seed,
            freq: default_freq(),
            maxlength: None,
            allowmaxlength: false,
            zero_momentum: false,
            rescale_energy: None,
        }
    }

    /// Whether shooting draws aimless velocities, which a negative scalar `sigma-v` selects.
    pub fn aimless_shooting(&self) -> bool {
        matches!(self.sigma_v, SigmaV::Scalar(sigma_v) if sigma_v < 0.0)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.freq) {
            return Err(ConfigError::InvalidValue {
                key: "tis.freq",
                reason: format!("{} is outside [0, 1]", self.freq),
            });
        }
        if let SigmaV::PerParticle(values) = &self.sigma_v {
            if values.iter().any(|&v| v < 0.0) {
                return Err(ConfigError::InvalidValue {
                    key: "tis.sigma-v",
                    reason: "per-particle values must be non-negative".to_string(),
                });
            }
        }
        if self.maxlength == Some(0) {
            return Err(ConfigError::InvalidValue {
                key: "tis.maxlength",
                reason: "must be positive".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RetisSettings {
    /// Probability of performing swap moves in a cycle.
    pub swapfreq: f64,
    /// Optional per-ensemble weights for choosing the ensemble to shoot in.
    #[serde(default)]
    pub relative_shoots: Option<Vec<f64>>,
    #[serde(default)]
    pub nullmoves: bool,
    #[serde(default)]
    pub swapsimul: bool,
}

impl RetisSettings {
    pub fn new(swapfreq: f64) -> Self {
        Self {
            swapfreq,
            relative_shoots: None,
            nullmoves: false,
            swapsimul: false,
        }
    }

    /// Validates the values; `ensembles` is the number of ensembles when known.
    pub fn validate(&self, ensembles: Option<usize>) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.swapfreq) {
            return Err(ConfigError::InvalidValue {
                key: "retis.swapfreq",
                reason: format!("{} is outside [0, 1]", self.swapfreq),
            });
        }
        let Some(weights) = &self.relative_shoots else {
            return Ok(());
        };
        if weights.iter().any(|&w| w < 0.0) || weights.iter().sum::<f64>() <= 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "retis.relative-shoots",
                reason: "weights must be non-negative with a positive sum".to_string(),
            });
        }
        if let Some(n) = ensembles {
            if weights.len() != n {
                return Err(ConfigError::InvalidValue {
                    key: "retis.relative-shoots",
                    reason: format!("{} weight(s) given for {n} ensemble(s)", weights.len()),
                });
            }
        }
        Ok(())
    }
}

/// Output frequencies in cycles; zero disables a file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputSettings {
    #[serde(default = "default_frequency")]
    pub restart_file: u64,
    #[serde(default = "default_frequency")]
    pub pathensemble_file: u64,
    #[serde(default = "default_frequency")]
    pub order_file: u64,
    #[serde(default = "default_frequency")]
    pub energy_file: u64,
    #[serde(default = "default_exe_path")]
    pub directory: PathBuf,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            restart_file: default_frequency(),
            pathensemble_file: default_frequency(),
            order_file: default_frequency(),
            energy_file: default_frequency(),
            directory: default_exe_path(),
        }
    }
}

/// The validated settings of a path simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub simulation: SimulationSection,
    #[serde(default)]
    pub system: SystemSection,
    #[serde(default)]
    pub tis: Option<TisSettings>,
    #[serde(default)]
    pub retis: Option<RetisSettings>,
    #[serde(default)]
    pub output: OutputSettings,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self, SettingsLoadError> {
        let content = std::fs::read_to_string(path).map_err(|e| SettingsLoadError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        let settings: Self = toml::from_str(&content).map_err(|e| SettingsLoadError::Toml {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Whether a top-level section is present.
    pub fn has_section(&self, section: &str) -> bool {
        match section {
            "simulation" | "system" | "output" => true,
            "tis" => self.tis.is_some(),
            "retis" => self.retis.is_some(),
            _ => false,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.simulation.steps < self.simulation.startcycle {
            return Err(ConfigError::InvalidValue {
                key: "simulation.steps",
                reason: format!(
                    "ends at cycle {} before the start cycle {}",
                    self.simulation.steps, self.simulation.startcycle
                ),
            });
        }
        if let Some(temperature) = self.system.temperature {
            if !(temperature > 0.0) {
                return Err(ConfigError::InvalidValue {
                    key: "system.temperature",
                    reason: format!("{temperature} is not positive"),
                });
            }
        }
        if let Some(tis) = &self.tis {
            tis.validate()?;
        }
        if let Some(retis) = &self.retis {
            retis.validate(None)?;
        }
        Ok(())
    }
}

fn default_exe_path() -> PathBuf {
    PathBuf::from(".")
}

fn default_units() -> String {
    "reduced".to_string()
}

fn default_sigma_v() -> SigmaV {
    SigmaV::Scalar(-1.0)
}

fn default_freq() -> f64 {
    0.5
}

fn default_frequency() -> u64 {
    1
}

#[derive(Default)]
pub struct SettingsBuilder {
    task: Option<SimulationType>,
    steps: Option<u64>,
    startcycle: Option<u64>,
    exe_path: Option<PathBuf>,
    restart: Option<bool>,
    units: Option<String>,
    temperature: Option<f64>,
    tis: Option<TisSettings>,
    retis: Option<RetisSettings>,
    output: Option<OutputSettings>,
}

impl SettingsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn task(mut self, task: SimulationType) -> Self {
        self.task = Some(task);
        self
    }
    pub fn steps(mut self, steps: u64) -> Self {
        self.steps = Some(steps);
        self
    }
    pub fn startcycle(mut self, startcycle: u64) -> Self {
        self.startcycle = Some(startcycle);
        self
    }
    pub fn exe_path(mut self, path: PathBuf) -> Self {
        self.exe_path = Some(path);
        self
    }
    pub fn restart(mut self, restart: bool) -> Self {
        self.restart = Some(restart);
        self
    }
    pub fn units(mut self, units: &str) -> Self {
        self.units = Some(units.to_string());
        self
    }
    pub fn temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }
    pub fn tis(mut self, tis: TisSettings) -> Self {
        self.tis = Some(tis);
        self
    }
    pub fn retis(mut self, retis: RetisSettings) -> Self {
        self.retis = Some(retis);
        self
    }
    pub fn output(mut self, output: OutputSettings) -> Self {
        self.output = Some(output);
        self
    }

    pub fn build(self) -> Result<Settings, ConfigError> {
        let simulation = SimulationSection {
            task: self.task.ok_or(ConfigError::MissingParameter("task"))?,
            steps: self.steps.ok_or(ConfigError::MissingParameter("steps"))?,
            startcycle: self.startcycle.unwrap_or_default(),
            exe_path: self.exe_path.unwrap_or_else(default_exe_path),
            restart: self.restart.unwrap_or_default(),
        };
        let settings = Settings {
            simulation,
            system: SystemSection {
                units: self.units.unwrap_or_else(default_units),
                temperature: self.temperature,
            },
            tis: self.tis,
            retis: self.retis,
            output: self.output.unwrap_or_default(),
        };
        settings.validate()?;
        Ok(settings)
    }
}
