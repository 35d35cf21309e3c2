use crate::parallel::ExecPolicy;

/// Solver parameters that stay fixed between frames.
///
/// Viscosity and the dye spread rate are passed to every step instead, since
/// the caller may change them per frame.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverParams {
    /// Jacobi sweeps for velocity and dye diffusion.
    pub diffuse_iter: usize,
    /// Jacobi sweeps for the pressure solve.
    pub project_iter: usize,
    /// Projections per frame.
    pub project_passes: usize,
    /// Velocity added per cell of brush motion.
    pub force_strength: f64,
    /// Exponential dye fade rate per second; 0 disables fading.
    pub dye_dissipation: f64,
    pub exec: ExecPolicy,
}

impl Default for SolverParams {
    fn default() -> Self {
        Self {
            diffuse_iter: 20,
            project_iter: 40,
            project_passes: 1,
            force_strength: 10.0,
            dye_dissipation: 0.0,
            exec: ExecPolicy::Parallel,
        }
    }
}

impl SolverParams {
    /// Parameters for small deterministic runs (serial execution, generous
    /// pressure iterations).
    pub fn precise() -> Self {
        Self {
            project_iter: 200,
            exec: ExecPolicy::Serial,
            ..Self::default()
        }
    }
}
