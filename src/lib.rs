//! Interactive 2D stable-fluids dye simulation.
//!
//! [`engine::FluidEngine`] owns one grid and exposes the frame contract:
//! `init`, `apply_impulse`, `step` (which composites RGBA8 into a caller
//! buffer) and `teardown`. The solver stages live in [`solver`]; per-cell
//! work is spread over rayon through [`parallel`].

pub mod config;
pub mod engine;
pub mod error;
pub mod input;
pub mod parallel;
pub mod renderer;
pub mod solver;
pub mod state;

pub use engine::FluidEngine;
pub use error::CoreError;
pub use solver::SolverParams;
