mod boundary;
mod core;
pub mod diagnostics;
pub mod force;
mod params;

// Re-export public API
pub use self::core::{advect, compute_divergence, diffuse, project, relax};
pub use boundary::{neighbors, set_bnd, wide_neighbors, FieldType, Stencil};
pub use force::{apply_impulse, Impulse};
pub use params::SolverParams;

use std::mem::swap;

use crate::error::CoreError;
use crate::parallel::map_in_place;
use crate::renderer::composite;
use crate::state::GridState;
use self::diagnostics::total_dye;

/// Advance the simulation by `dt` seconds and composite the result into `out`.
///
/// Stages run strictly in order, each finishing before the next starts:
/// velocity self-advection, viscous diffusion, projection, dye advection,
/// dye diffusion (and optional fading) and compositing. Non-finite values are
/// reset to zero on entry and after every velocity stage, before any
/// bilinear or Jacobi stencil reads them.
/// A non-positive or non-finite `dt` skips every stage but compositing.
pub fn step(
    state: &mut GridState,
    out: &mut [u8],
    dt: f64,
    viscosity: f64,
    color_spread: f64,
    params: &SolverParams,
) -> Result<(), CoreError> {
    let expected = state.pixel_bytes();
    if out.len() != expected {
        return Err(CoreError::BufferSize { expected, actual: out.len() });
    }

    if dt.is_finite() && dt > 0.0 {
        advance(state, dt, viscosity, color_spread, params);
    } else {
        log::trace!("dt={dt}: compositing without advancing");
    }

    composite(state, out, params.exec)
}

fn advance(state: &mut GridState, dt: f64, viscosity: f64, color_spread: f64, params: &SolverParams) {
    let dims = state.dims();
    let exec = params.exec;

    sanitize_stage(state, "on entry");

    // 1. Self-advect velocity
    advect(&mut state.vx0, &state.vx, &state.vx, &state.vy, dt, dims, exec);
    advect(&mut state.vy0, &state.vy, &state.vx, &state.vy, dt, dims, exec);
    swap(&mut state.vx, &mut state.vx0);
    swap(&mut state.vy, &mut state.vy0);
    sanitize_stage(state, "after advection");

    // 2. Diffuse velocity
    diffuse(FieldType::Vx, &mut state.vx0, &mut state.scratch, &state.vx, viscosity, dt, params.diffuse_iter, dims, exec);
    diffuse(FieldType::Vy, &mut state.vy0, &mut state.scratch, &state.vy, viscosity, dt, params.diffuse_iter, dims, exec);
    swap(&mut state.vx, &mut state.vx0);
    swap(&mut state.vy, &mut state.vy0);
    sanitize_stage(state, "after diffusion");

    // 3. Project
    for _ in 0..params.project_passes {
        project(
            &mut state.vx,
            &mut state.vy,
            &mut state.pressure,
            &mut state.pressure0,
            &mut state.divergence,
            params.project_iter,
            dims,
            exec,
        );
    }
    sanitize_stage(state, "after projection");

    // 4. Advect dye with the projected velocity
    for (dst, src) in state.color0.iter_mut().zip(&state.color) {
        advect(dst, src, &state.vx, &state.vy, dt, dims, exec);
    }
    swap(&mut state.color, &mut state.color0);

    // 5. Diffuse dye, then fade
    for (dst, src) in state.color0.iter_mut().zip(&state.color) {
        diffuse(FieldType::Scalar, dst, &mut state.scratch, src, color_spread, dt, params.diffuse_iter, dims, exec);
    }
    swap(&mut state.color, &mut state.color0);

    let k = params.dye_dissipation;
    if k > 0.0 && k.is_finite() {
        let fade = (-k * dt).exp();
        for channel in state.color.iter_mut() {
            map_in_place(channel, exec, |v| v * fade);
        }
    }

    sanitize_stage(state, "after dye transport");
    log::trace!("dt={dt}: total dye {:.4}", total_dye(state));
}

fn sanitize_stage(state: &mut GridState, stage: &str) {
    let reset = state.sanitize();
    if reset > 0 {
        log::warn!("reset {reset} non-finite cells {stage}");
    }
}
