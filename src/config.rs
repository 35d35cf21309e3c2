use std::path::Path;

use serde::Deserialize;

use crate::parallel::ExecPolicy;
use crate::solver::SolverParams;

/// Configuration file read from the working directory.
pub const CONFIG_FILE: &str = "dyeflow.yaml";

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    pub physics: PhysicsConfig,
    pub display: DisplayConfig,
    pub brush: BrushConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    pub viscosity: f64,
    /// Dye spread rate passed to every step.
    pub color_diffusion: f64,
    pub dye_dissipation: f64,
    pub diffuse_iter: usize,
    pub project_iter: usize,
    pub project_passes: usize,
    pub force_strength: f64,
    /// Upper bound on the measured frame time, in seconds.
    pub max_dt: f64,
    pub parallel: ExecPolicy,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub width: usize,
    pub height: usize,
    /// Window pixels per grid cell.
    pub scale: usize,
    pub target_fps: usize,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct BrushConfig {
    /// Brush radius in window pixels.
    pub radius: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            physics: PhysicsConfig::default(),
            display: DisplayConfig::default(),
            brush: BrushConfig::default(),
        }
    }
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            viscosity: 1.0,
            color_diffusion: 1.0,
            dye_dissipation: 0.0,
            diffuse_iter: 20,
            project_iter: 40,
            project_passes: 1,
            force_strength: 10.0,
            max_dt: 0.05,
            parallel: ExecPolicy::Parallel,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            scale: 2,
            target_fps: 60,
        }
    }
}

impl Default for BrushConfig {
    fn default() -> Self {
        Self { radius: 20.0 }
    }
}

impl Config {
    pub fn solver_params(&self) -> SolverParams {
        let p = &self.physics;
        SolverParams {
            diffuse_iter: p.diffuse_iter,
            project_iter: p.project_iter,
            project_passes: p.project_passes,
            force_strength: p.force_strength,
            dye_dissipation: p.dye_dissipation,
            exec: p.parallel,
        }
    }

    /// Brush radius in grid cells.
    pub fn brush_radius_cells(&self) -> f64 {
        self.brush.radius / self.display.scale.max(1) as f64
    }
}

pub fn load() -> Config {
    load_from(Path::new(CONFIG_FILE))
}

pub fn load_from(path: &Path) -> Config {
    if !path.exists() {
        log::debug!("{} not found; using defaults", path.display());
        return Config::default();
    }
    match std::fs::read_to_string(path) {
        Ok(contents) => match serde_yaml::from_str(&contents) {
            Ok(cfg) => cfg,
            Err(e) => {
                log::warn!("failed to parse {}: {e}; using defaults", path.display());
                Config::default()
            }
        },
        Err(e) => {
            log::warn!("failed to read {}: {e}; using defaults", path.display());
            Config::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let cfg = Config::default();
        assert_eq!(cfg.physics.viscosity, 1.0);
        assert_eq!(cfg.physics.color_diffusion, 1.0);
        assert_eq!(cfg.physics.dye_dissipation, 0.0);
        assert_eq!(cfg.physics.diffuse_iter, 20);
        assert_eq!(cfg.physics.project_iter, 40);
        assert_eq!(cfg.physics.project_passes, 1);
        assert_eq!(cfg.physics.force_strength, 10.0);
        assert_eq!(cfg.physics.max_dt, 0.05);
        assert_eq!(cfg.physics.parallel, ExecPolicy::Parallel);
        assert_eq!(cfg.display.width, 1280);
        assert_eq!(cfg.display.height, 720);
        assert_eq!(cfg.display.scale, 2);
        assert_eq!(cfg.display.target_fps, 60);
        assert_eq!(cfg.brush.radius, 20.0);
    }

    #[test]
    fn test_partial_yaml() {
        let yaml = "physics:\n  viscosity: 0.01\nbrush:\n  radius: 8.0\n";
        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.physics.viscosity, 0.01);
        assert_eq!(cfg.physics.color_diffusion, 1.0); // default
        assert_eq!(cfg.brush.radius, 8.0);
        assert_eq!(cfg.display.width, 1280); // default
    }

    #[test]
    fn test_full_yaml() {
        let yaml = r#"
physics:
  viscosity: 0.5
  color_diffusion: 0.2
  dye_dissipation: 0.1
  diffuse_iter: 10
  project_iter: 60
  project_passes: 2
  force_strength: 4.0
  max_dt: 0.02
  parallel: serial
display:
  width: 800
  height: 400
  scale: 4
  target_fps: 30
brush:
  radius: 12.0
"#;
        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.physics.viscosity, 0.5);
        assert_eq!(cfg.physics.color_diffusion, 0.2);
        assert_eq!(cfg.physics.dye_dissipation, 0.1);
        assert_eq!(cfg.physics.diffuse_iter, 10);
        assert_eq!(cfg.physics.project_iter, 60);
        assert_eq!(cfg.physics.project_passes, 2);
        assert_eq!(cfg.physics.force_strength, 4.0);
        assert_eq!(cfg.physics.max_dt, 0.02);
        assert_eq!(cfg.physics.parallel, ExecPolicy::Serial);
        assert_eq!(cfg.display.width, 800);
        assert_eq!(cfg.display.height, 400);
        assert_eq!(cfg.display.scale, 4);
        assert_eq!(cfg.display.target_fps, 30);
        assert_eq!(cfg.brush.radius, 12.0);
        assert_eq!(cfg.brush_radius_cells(), 3.0);
    }

    #[test]
    fn test_solver_params_mapping() {
        let yaml = "physics:\n  project_iter: 80\n  force_strength: 3.5\n  parallel: serial\n";
        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        let params = cfg.solver_params();
        assert_eq!(params.project_iter, 80);
        assert_eq!(params.force_strength, 3.5);
        assert_eq!(params.exec, ExecPolicy::Serial);
        assert_eq!(params.diffuse_iter, SolverParams::default().diffuse_iter);
    }

    #[test]
    fn test_unknown_policy_is_parse_error() {
        let yaml = "physics:\n  parallel: gpu\n";
        assert!(serde_yaml::from_str::<Config>(yaml).is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let cfg = load_from(Path::new("definitely-not-here/dyeflow.yaml"));
        assert_eq!(cfg.physics.viscosity, 1.0);
        assert_eq!(cfg.display.scale, 2);
    }

    #[test]
    fn test_load_invalid_file_falls_back() {
        let path = std::env::temp_dir().join(format!("dyeflow-invalid-{}.yaml", std::process::id()));
        std::fs::write(&path, "physics: [not, a, map]\n").unwrap();
        let cfg = load_from(&path);
        std::fs::remove_file(&path).unwrap();
        assert_eq!(cfg.physics.project_iter, 40);
    }
}
