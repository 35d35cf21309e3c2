use crate::state::idx_inner;

/// Field type for boundary condition dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// Pressure, dye channels: zero gradient across walls.
    Scalar,
    /// Horizontal velocity: normal to the left/right walls.
    Vx,
    /// Vertical velocity: normal to the top/bottom walls.
    Vy,
}

impl FieldType {
    /// Value seen beyond a wall given the edge cell's value `v`.
    /// The wall-normal component flips sign so the flux through the wall is zero;
    /// everything else mirrors the edge cell.
    #[inline(always)]
    fn ghost(self, across_x: bool, v: f64) -> f64 {
        match (self, across_x) {
            (FieldType::Vx, true) | (FieldType::Vy, false) => -v,
            _ => v,
        }
    }
}

/// The four axis neighbours `[left, right, up, down]` of cell `(x, y)`, where
/// `up` is `y - 1` and `down` is `y + 1`. Reads beyond the grid are replaced by
/// the edge substitution for `field_type`.
#[inline(always)]
pub fn neighbors(src: &[f64], x: usize, y: usize, nx: usize, ny: usize, field_type: FieldType) -> [f64; 4] {
    let center = src[idx_inner(x, y, nx)];
    let left = if x > 0 { src[idx_inner(x - 1, y, nx)] } else { field_type.ghost(true, center) };
    let right = if x + 1 < nx { src[idx_inner(x + 1, y, nx)] } else { field_type.ghost(true, center) };
    let up = if y > 0 { src[idx_inner(x, y - 1, nx)] } else { field_type.ghost(false, center) };
    let down = if y + 1 < ny { src[idx_inner(x, y + 1, nx)] } else { field_type.ghost(false, center) };
    [left, right, up, down]
}

/// Pressure reads two cells away `[left, right, up, down]`, for the Laplacian
/// that matches the central-difference divergence and gradient.
///
/// The gradient is only applied on cells off the wall (the wall-normal
/// component is pinned to zero), so a neighbour at distance 2 exists exactly
/// when it is on the grid. A missing neighbour reads the cell itself, which
/// drops that term from the operator.
#[inline(always)]
pub fn wide_neighbors(src: &[f64], x: usize, y: usize, nx: usize, ny: usize) -> [f64; 4] {
    let center = src[idx_inner(x, y, nx)];
    let left = if x >= 2 { src[idx_inner(x - 2, y, nx)] } else { center };
    let right = if x + 2 < nx { src[idx_inner(x + 2, y, nx)] } else { center };
    let up = if y >= 2 { src[idx_inner(x, y - 2, nx)] } else { center };
    let down = if y + 2 < ny { src[idx_inner(x, y + 2, nx)] } else { center };
    [left, right, up, down]
}

/// Neighbour access for the Jacobi relaxation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stencil {
    /// Adjacent cells with the edge substitution for the field type.
    Compact(FieldType),
    /// Cells two apart, for the pressure solve.
    Wide,
}

impl Stencil {
    #[inline(always)]
    pub fn gather(self, src: &[f64], x: usize, y: usize, nx: usize, ny: usize) -> [f64; 4] {
        match self {
            Stencil::Compact(field_type) => neighbors(src, x, y, nx, ny, field_type),
            Stencil::Wide => wide_neighbors(src, x, y, nx, ny),
        }
    }
}

/// Closed-wall condition: zero the wall-normal velocity on the edge cells.
/// vx vanishes on the left/right columns, vy on the top/bottom rows.
pub fn set_bnd(vx: &mut [f64], vy: &mut [f64], nx: usize, ny: usize) {
    for j in 0..ny {
        vx[idx_inner(0, j, nx)] = 0.0;
        vx[idx_inner(nx - 1, j, nx)] = 0.0;
    }
    for i in 0..nx {
        vy[idx_inner(i, 0, nx)] = 0.0;
        vy[idx_inner(i, ny - 1, nx)] = 0.0;
    }
}
