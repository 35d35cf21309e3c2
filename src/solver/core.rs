use crate::parallel::{for_each_cell, update_cells, ExecPolicy};
use crate::state::{idx_inner, Dims};
use super::boundary::{neighbors, set_bnd, FieldType, Stencil};

/// Jacobi iterative linear solver.
/// Solves: x[i,j] = (rhs_scale * rhs[i,j] + a * (neighbors)) / c
/// where the neighbours are read through `stencil`.
///
/// Each sweep reads only the previous sweep's values (held in `x`) and writes
/// `partner`; the two are swapped afterwards, so the result always ends up in
/// `x`. The initial guess is whatever `x` holds on entry.
#[allow(clippy::too_many_arguments)]
pub fn relax(
    stencil: Stencil,
    x: &mut Vec<f64>,
    partner: &mut Vec<f64>,
    rhs: &[f64],
    rhs_scale: f64,
    a: f64,
    c: f64,
    iter: usize,
    dims: Dims,
    exec: ExecPolicy,
) {
    let c_inv = 1.0 / c;
    let Dims { nx, ny } = dims;
    for _ in 0..iter {
        let prev: &[f64] = &x[..];
        for_each_cell(partner, nx, exec, |i, j| {
            let [l, r, u, d] = stencil.gather(prev, i, j, nx, ny);
            (rhs_scale * rhs[idx_inner(i, j, nx)] + a * (l + r + u + d)) * c_inv
        });
        std::mem::swap(x, partner);
    }
}

/// Diffusion step: implicit update new = (old + a * neighbors(new)) / (1 + 4a)
/// with a = rate * dt, relaxed for `iter` Jacobi sweeps starting from `x0`.
/// A zero (or negative) rate copies `x0` unchanged.
#[allow(clippy::too_many_arguments)]
pub fn diffuse(
    field_type: FieldType,
    x: &mut Vec<f64>,
    partner: &mut Vec<f64>,
    x0: &[f64],
    rate: f64,
    dt: f64,
    iter: usize,
    dims: Dims,
    exec: ExecPolicy,
) {
    let a = rate.max(0.0) * dt;
    x.copy_from_slice(x0);
    if a <= 0.0 || !a.is_finite() || iter == 0 {
        return;
    }
    relax(Stencil::Compact(field_type), x, partner, x0, 1.0, a, 1.0 + 4.0 * a, iter, dims, exec);
}

/// Semi-Lagrangian advection: traces each cell center backwards through the
/// velocity field and samples `d0` there with bilinear interpolation.
/// The trace point is clamped to the grid extent, infinite traces included;
/// a NaN trace samples the cell itself.
pub fn advect(d: &mut [f64], d0: &[f64], vx: &[f64], vy: &[f64], dt: f64, dims: Dims, exec: ExecPolicy) {
    let Dims { nx, ny } = dims;
    let max_x = (nx - 1) as f64;
    let max_y = (ny - 1) as f64;

    for_each_cell(d, nx, exec, |i, j| {
        let ii = idx_inner(i, j, nx);
        // Trace backwards
        let x = i as f64 - dt * vx[ii];
        let y = j as f64 - dt * vy[ii];
        let x = if x.is_nan() { i as f64 } else { x.clamp(0.0, max_x) };
        let y = if y.is_nan() { j as f64 } else { y.clamp(0.0, max_y) };

        let i0 = x.floor() as usize;
        let j0 = y.floor() as usize;
        let i1 = (i0 + 1).min(nx - 1);
        let j1 = (j0 + 1).min(ny - 1);
        let s1 = x - i0 as f64;
        let s0 = 1.0 - s1;
        let t1 = y - j0 as f64;
        let t0 = 1.0 - t1;

        s0 * (t0 * d0[idx_inner(i0, j0, nx)] + t1 * d0[idx_inner(i0, j1, nx)])
            + s1 * (t0 * d0[idx_inner(i1, j0, nx)] + t1 * d0[idx_inner(i1, j1, nx)])
    });
}

/// Central-difference divergence:
/// div = 0.5 * ((vx[x+1] - vx[x-1]) + (vy[y+1] - vy[y-1])).
pub fn compute_divergence(div: &mut [f64], vx: &[f64], vy: &[f64], dims: Dims, exec: ExecPolicy) {
    let Dims { nx, ny } = dims;
    for_each_cell(div, nx, exec, |i, j| {
        let [xl, xr, _, _] = neighbors(vx, i, j, nx, ny, FieldType::Vx);
        let [_, _, yu, yd] = neighbors(vy, i, j, nx, ny, FieldType::Vy);
        0.5 * ((xr - xl) + (yd - yu))
    });
}

/// Pressure projection: enforces incompressibility (divergence-free velocity field).
///
/// The pressure solve uses the Laplacian composed from the same central
/// differences as the divergence and the gradient (neighbours two cells
/// apart), with the wall-normal velocity held at zero. Once the relaxation
/// has converged the discrete divergence vanishes on every cell.
///
/// `p` carries the previous projection's pressure in and the new pressure out,
/// so consecutive frames warm-start the solve.
#[allow(clippy::too_many_arguments)]
pub fn project(
    vx: &mut [f64],
    vy: &mut [f64],
    p: &mut Vec<f64>,
    p_partner: &mut Vec<f64>,
    div: &mut [f64],
    iter: usize,
    dims: Dims,
    exec: ExecPolicy,
) {
    let Dims { nx, ny } = dims;

    set_bnd(vx, vy, nx, ny);
    compute_divergence(div, vx, vy, dims, exec);

    // Solve laplacian(p) = div with the wide stencil: p = (neighbors - 4 div) / 4
    relax(Stencil::Wide, p, p_partner, div, -4.0, 1.0, 4.0, iter, dims, exec);

    // Subtract pressure gradient from velocity; wall cells are reset below
    let p: &[f64] = &p[..];
    update_cells(vx, nx, exec, |i, j, v| {
        let [l, r, _, _] = neighbors(p, i, j, nx, ny, FieldType::Scalar);
        v - 0.5 * (r - l)
    });
    update_cells(vy, nx, exec, |i, j, v| {
        let [_, _, u, d] = neighbors(p, i, j, nx, ny, FieldType::Scalar);
        v - 0.5 * (d - u)
    });
    set_bnd(vx, vy, nx, ny);
}
