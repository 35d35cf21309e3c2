use crate::state::{idx_inner, Dims, GridState};

/// Largest |divergence| over cells at least `margin` cells away from every wall,
/// using the same central differences as the projection.
pub fn max_divergence(vx: &[f64], vy: &[f64], dims: Dims, margin: usize) -> f64 {
    let Dims { nx, ny } = dims;
    let m = margin.max(1);
    if nx <= 2 * m || ny <= 2 * m {
        return 0.0;
    }
    let mut max = 0.0_f64;
    for j in m..(ny - m) {
        for i in m..(nx - m) {
            let d = 0.5
                * ((vx[idx_inner(i + 1, j, nx)] - vx[idx_inner(i - 1, j, nx)])
                    + (vy[idx_inner(i, j + 1, nx)] - vy[idx_inner(i, j - 1, nx)]));
            max = max.max(d.abs());
        }
    }
    max
}

/// Compute volume-averaged kinetic energy: KE = 0.5 * <vx² + vy²>.
pub fn compute_kinetic_energy(vx: &[f64], vy: &[f64]) -> f64 {
    if vx.is_empty() {
        return 0.0;
    }
    let sum: f64 = vx.iter().zip(vy).map(|(u, v)| u * u + v * v).sum();
    0.5 * sum / vx.len() as f64
}

/// Sum of every dye channel over the grid.
pub fn total_dye(state: &GridState) -> f64 {
    (0..3).map(|ch| state.color(ch).iter().sum::<f64>()).sum()
}

/// Number of non-finite values in the velocity and color fields.
#[cfg(test)]
pub fn count_non_finite(state: &GridState) -> usize {
    let fields = [state.vx(), state.vy(), state.color(0), state.color(1), state.color(2)];
    fields.iter().map(|f| f.iter().filter(|v| !v.is_finite()).count()).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_divergence_zero_for_uniform_flow() {
        let dims = Dims::new(10, 10);
        let vx = vec![1.0; 100];
        let vy = vec![-2.0; 100];
        assert_eq!(max_divergence(&vx, &vy, dims, 1), 0.0);
    }

    #[test]
    fn test_divergence_of_expansion() {
        let dims = Dims::new(10, 10);
        let vx: Vec<f64> = (0..100).map(|k| (k % 10) as f64).collect();
        let vy: Vec<f64> = (0..100).map(|k| (k / 10) as f64).collect();
        let div = max_divergence(&vx, &vy, dims, 1);
        assert!((div - 2.0).abs() < 1e-12, "div={}", div);
    }

    #[test]
    fn test_divergence_tiny_grid_is_zero() {
        let dims = Dims::new(4, 4);
        let vx = vec![1.0; 16];
        let vy = vec![1.0; 16];
        assert_eq!(max_divergence(&vx, &vy, dims, 2), 0.0);
    }

    #[test]
    fn test_kinetic_energy_zero() {
        let vx = vec![0.0; 64];
        let vy = vec![0.0; 64];
        let ke = compute_kinetic_energy(&vx, &vy);
        assert!(ke.abs() < 1e-15, "KE should be 0 with no flow, got {}", ke);
    }

    #[test]
    fn test_kinetic_energy_uniform_flow() {
        let vx = vec![1.0; 64];
        let vy = vec![0.0; 64];
        let ke = compute_kinetic_energy(&vx, &vy);
        assert!((ke - 0.5).abs() < 1e-10, "KE should be 0.5, got {}", ke);
    }

    #[test]
    fn test_total_dye_and_non_finite() {
        let mut state = GridState::new(4, 4).unwrap();
        state.color[0][0] = 0.5;
        state.color[2][3] = 0.25;
        assert!((total_dye(&state) - 0.75).abs() < 1e-12);
        assert_eq!(count_non_finite(&state), 0);
        state.vx[1] = f64::NAN;
        assert_eq!(count_non_finite(&state), 1);
    }
}
