//! The host-facing simulation object: one grid plus the solver parameters,
//! with explicit init/teardown.

use crate::error::CoreError;
use crate::solver::{self, Impulse, SolverParams};
use crate::state::GridState;

pub struct FluidEngine {
    state: Option<GridState>,
    params: SolverParams,
}

impl FluidEngine {
    pub fn new(params: SolverParams) -> Self {
        Self { state: None, params }
    }

    /// Allocate a zeroed `width` x `height` grid.
    pub fn init(&mut self, width: usize, height: usize) -> Result<(), CoreError> {
        if self.state.is_some() {
            return Err(CoreError::AlreadyInitialized);
        }
        self.state = Some(GridState::new(width, height)?);
        log::info!("initialized {width}x{height} fluid grid");
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.state.is_some()
    }

    /// Inject velocity along the segment (x0, y0) -> (x1, y1) and dye of
    /// color (r, g, b) within `radius` cells of it.
    #[allow(clippy::too_many_arguments)]
    pub fn apply_impulse(
        &mut self,
        x0: f64,
        y0: f64,
        x1: f64,
        y1: f64,
        radius: f64,
        r: f64,
        g: f64,
        b: f64,
    ) -> Result<(), CoreError> {
        let strength = self.params.force_strength;
        let state = self.state.as_mut().ok_or(CoreError::NotInitialized)?;
        let impulse = Impulse { from: (x0, y0), to: (x1, y1), radius, color: [r, g, b] };
        let touched = solver::apply_impulse(state, &impulse, strength);
        log::trace!("impulse touched {touched} cells");
        Ok(())
    }

    /// Advance by `dt` and write the frame into `out` (exactly W*H*4 bytes).
    pub fn step(&mut self, out: &mut [u8], dt: f64, viscosity: f64, color_decay_rate: f64) -> Result<(), CoreError> {
        let state = self.state.as_mut().ok_or(CoreError::NotInitialized)?;
        solver::step(state, out, dt, viscosity, color_decay_rate, &self.params)
    }

    /// Release the grid. The engine can be initialized again afterwards.
    pub fn teardown(&mut self) -> Result<(), CoreError> {
        let state = self.state.take().ok_or(CoreError::NotInitialized)?;
        log::info!("tearing down {}x{} fluid grid", state.width(), state.height());
        state.teardown();
        Ok(())
    }

    pub fn state(&self) -> Option<&GridState> {
        self.state.as_ref()
    }

    pub fn params(&self) -> &SolverParams {
        &self.params
    }

    pub fn set_params(&mut self, params: SolverParams) {
        self.params = params;
    }
}
