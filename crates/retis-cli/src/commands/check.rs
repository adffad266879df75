use crate::cli::CheckArgs;
use crate::error::{CliError, Result};
use retis::core::units::boltzmann_constant;
use retis::simulation::config::{Settings, SigmaV, SimulationType};
use tracing::info;

pub fn run(args: CheckArgs) -> Result<()> {
    let settings = Settings::load(&args.config)?;
    info!(path = %args.config.display(), task = %settings.simulation.task, "Loaded settings.");

    if let Some(task) = args.task {
        let expected = SimulationType::from(task);
        if settings.simulation.task != expected {
            return Err(CliError::Argument(format!(
                "settings describe a '{}' simulation, expected '{}'",
                settings.simulation.task, expected
            )));
        }
    }
    check_sections(&settings)?;
    if let (Some(retis), Some(ensembles)) = (&settings.retis, args.ensembles) {
        retis.validate(Some(ensembles))?;
    }

    for line in describe(&settings)? {
        println!("{line}");
    }
    Ok(())
}

/// Verifies that the sections the simulation type needs are present.
fn check_sections(settings: &Settings) -> Result<()> {
    let required: &[&str] = match settings.simulation.task {
        SimulationType::Tis => &["tis"],
        SimulationType::Retis => &["tis", "retis"],
        SimulationType::GenericPath => &[],
    };
    match required
        .iter()
        .find(|section| !settings.has_section(section))
    {
        Some(section) => Err(CliError::Argument(format!(
            "a '{}' simulation requires the [{section}] section",
            settings.simulation.task
        ))),
        None => Ok(()),
    }
}

/// Renders the values derived from the settings, one line each.
fn describe(settings: &Settings) -> Result<Vec<String>> {
    let simulation = &settings.simulation;
    let boltzmann = boltzmann_constant(&settings.system.units)
        .map_err(|e| CliError::Argument(e.to_string()))?;

    let mut lines = vec![
        format!("task: {}", simulation.task),
        format!(
            "cycles: {} -> {} ({} to run)",
            simulation.startcycle,
            simulation.steps,
            simulation.steps - simulation.startcycle
        ),
        format!("exe-path: {}", simulation.exe_path.display()),
        format!("restart: {}", simulation.restart),
        format!("units: {} (kB = {boltzmann})", settings.system.units),
    ];
    if let Some(temperature) = settings.system.temperature {
        lines.push(format!("temperature: {temperature} (beta = {})", 1.0 / (boltzmann * temperature)));
    }

    if let Some(tis) = &settings.tis {
        let shooting = match &tis.sigma_v {
            _ if tis.aimless_shooting() => "aimless".to_string(),
            SigmaV::Scalar(sigma) => format!("sigma-v = {sigma}"),
            SigmaV::PerParticle(values) => format!("sigma-v per particle ({} values)", values.len()),
        };
        lines.push(format!("tis: seed {}, shooting {shooting}, freq {}", tis.seed, tis.freq));
    }
    if let Some(retis) = &settings.retis {
        lines.push(format!("retis: swapfreq {}", retis.swapfreq));
        if let Some(weights) = &retis.relative_shoots {
            let total: f64 = weights.iter().sum();
            let normalized: Vec<String> = weights
                .iter()
                .map(|w| format!("{:.3}", w / total))
                .collect();
            lines.push(format!("retis: relative shoots [{}]", normalized.join(", ")));
        }
    }

    let output = &settings.output;
    lines.push(format!(
        "output: restart every {}, pathensemble every {}, order every {}, energy every {}",
        output.restart_file, output.pathensemble_file, output.order_file, output.energy_file
    ));
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::TaskKind;
    use std::path::PathBuf;
    use tempfile::TempDir;

    const RETIS_SETTINGS: &str = r#"
[simulation]
task = "retis"
steps = 100
startcycle = 20

[system]
temperature = 0.07

[tis]
seed = 1
sigma-v = 0.5

[retis]
swapfreq = 0.5
relative-shoots = [1.0, 3.0]
"#;

    fn write_settings(content: &str) -> (TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }

    fn args(config: PathBuf) -> CheckArgs {
        CheckArgs {
            config,
            task: None,
            ensembles: None,
        }
    }

    #[test]
    fn valid_settings_pass() {
        let (_dir, path) = write_settings(RETIS_SETTINGS);
        let mut args = args(path);
        args.task = Some(TaskKind::Retis);
        args.ensembles = Some(2);
        assert!(run(args).is_ok());
    }

    #[test]
    fn mismatched_task_is_rejected() {
        let (_dir, path) = write_settings(RETIS_SETTINGS);
        let mut args = args(path);
        args.task = Some(TaskKind::Tis);
        assert!(matches!(run(args), Err(CliError::Argument(_))));
    }

    #[test]
    fn relative_shoots_are_checked_against_ensemble_count() {
        let (_dir, path) = write_settings(RETIS_SETTINGS);
        let mut args = args(path);
        args.ensembles = Some(3);
        assert!(matches!(run(args), Err(CliError::Config(_))));
    }

    #[test]
    fn retis_without_retis_section_is_rejected() {
        let content = RETIS_SETTINGS.split("[retis]").next().unwrap();
        let (_dir, path) = write_settings(content);
        assert!(matches!(run(args(path)), Err(CliError::Argument(_))));
    }

    #[test]
    fn missing_file_is_a_settings_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = run(args(dir.path().join("absent.toml")));
        assert!(matches!(result, Err(CliError::Settings(_))));
    }

    #[test]
    fn description_lists_derived_values() {
        let (_dir, path) = write_settings(RETIS_SETTINGS);
        let settings = Settings::load(&path).unwrap();
        let lines = describe(&settings).unwrap();

        assert!(lines.contains(&"task: retis".to_string()));
        assert!(lines.contains(&"cycles: 20 -> 100 (80 to run)".to_string()));
        assert!(lines.iter().any(|l| l.starts_with("tis: seed 1, shooting sigma-v = 0.5")));
        assert!(lines.contains(&"retis: relative shoots [0.250, 0.750]".to_string()));
    }

    #[test]
    fn description_reports_the_shooting_mode_the_run_uses() {
        let content = RETIS_SETTINGS.replace("seed = 1\n", "seed = 1\naimless = true\n");
        let (_dir, path) = write_settings(&content);
        let settings = Settings::load(&path).unwrap();
        assert!(settings.tis.as_ref().unwrap().aimless);
        let lines = describe(&settings).unwrap();
        assert!(lines.iter().any(|l| l.starts_with("tis: seed 1, shooting sigma-v = 0.5")));

        let content = RETIS_SETTINGS.replace("sigma-v = 0.5", "sigma-v = -1.0");
        let (_dir, path) = write_settings(&content);
        let lines = describe(&Settings::load(&path).unwrap()).unwrap();
        assert!(lines.iter().any(|l| l.starts_with("tis: seed 1, shooting aimless")));
    }
}
