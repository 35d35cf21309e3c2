//! Parallel-for over grid cells.
//!
//! A kernel receives the cell coordinates and returns the cell's new value.
//! Kernels only read previous-generation buffers through shared borrows, so
//! every cell is independent and the result does not depend on the policy.
//! Returning from [`for_each_cell`] is the stage barrier.

use rayon::prelude::*;
use serde::Deserialize;

/// How per-cell stages are executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecPolicy {
    Serial,
    /// Rows are distributed over the rayon thread pool.
    #[default]
    Parallel,
}

/// Grids smaller than this run serially even under `Parallel`.
const PARALLEL_MIN_CELLS: usize = 4096;

/// Fill `dst` (row-major, `width` cells per row) with `kernel(x, y)`.
pub fn for_each_cell<F>(dst: &mut [f64], width: usize, policy: ExecPolicy, kernel: F)
where
    F: Fn(usize, usize) -> f64 + Sync,
{
    update_cells(dst, width, policy, |x, y, _| kernel(x, y));
}

/// Replace every cell of `dst` with `kernel(x, y, old_value)`.
/// The kernel may read other buffers but sees only its own cell of `dst`.
pub fn update_cells<F>(dst: &mut [f64], width: usize, policy: ExecPolicy, kernel: F)
where
    F: Fn(usize, usize, f64) -> f64 + Sync,
{
    debug_assert!(width > 0 && dst.len() % width == 0);
    let update_row = |(y, row): (usize, &mut [f64])| {
        for (x, cell) in row.iter_mut().enumerate() {
            *cell = kernel(x, y, *cell);
        }
    };
    if policy == ExecPolicy::Parallel && dst.len() >= PARALLEL_MIN_CELLS {
        dst.par_chunks_mut(width).enumerate().for_each(update_row);
    } else {
        dst.chunks_mut(width).enumerate().for_each(update_row);
    }
}

/// Like [`for_each_cell`] but for fixed-size per-cell records, such as
/// packed RGBA pixels.
pub fn for_each_record<T, F>(dst: &mut [T], record: usize, policy: ExecPolicy, kernel: F)
where
    T: Send,
    F: Fn(usize, &mut [T]) + Sync,
{
    debug_assert!(record > 0 && dst.len() % record == 0);
    if policy == ExecPolicy::Parallel && dst.len() / record >= PARALLEL_MIN_CELLS {
        dst.par_chunks_mut(record).enumerate().for_each(|(i, r)| kernel(i, r));
    } else {
        dst.chunks_mut(record).enumerate().for_each(|(i, r)| kernel(i, r));
    }
}

/// Apply `f` to every value of `dst` in place.
pub fn map_in_place<F>(dst: &mut [f64], policy: ExecPolicy, f: F)
where
    F: Fn(f64) -> f64 + Sync,
{
    if policy == ExecPolicy::Parallel && dst.len() >= PARALLEL_MIN_CELLS {
        dst.par_iter_mut().for_each(|v| *v = f(*v));
    } else {
        dst.iter_mut().for_each(|v| *v = f(*v));
    }
}
