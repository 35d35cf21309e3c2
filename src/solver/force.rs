use crate::state::GridState;

/// A swept brush stroke in grid space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Impulse {
    pub from: (f64, f64),
    pub to: (f64, f64),
    /// Influence radius in cells.
    pub radius: f64,
    /// Dye color in [0, 1] per channel.
    pub color: [f64; 3],
}

/// Distance from `p` to the closest point of segment [a, b].
pub fn distance_to_segment(p: (f64, f64), a: (f64, f64), b: (f64, f64)) -> f64 {
    let (abx, aby) = (b.0 - a.0, b.1 - a.1);
    let (apx, apy) = (p.0 - a.0, p.1 - a.1);
    let len2 = abx * abx + aby * aby;
    let t = if len2 > 0.0 { ((apx * abx + apy * aby) / len2).clamp(0.0, 1.0) } else { 0.0 };
    let (dx, dy) = (apx - t * abx, apy - t * aby);
    (dx * dx + dy * dy).sqrt()
}

/// Linear falloff: 1 on the stroke, 0 at `radius` and beyond.
#[inline]
pub fn falloff(distance: f64, radius: f64) -> f64 {
    if distance > radius {
        0.0
    } else {
        1.0 - distance / radius
    }
}

/// Add a velocity and dye impulse along the stroke.
///
/// Velocity grows by `(to - from) * strength * w` and every dye channel by
/// `color * w`, clamped to [0, 1]. Endpoints outside the grid are clamped onto
/// it. A zero-length stroke still deposits dye around its point.
/// Returns the number of cells touched.
pub fn apply_impulse(state: &mut GridState, impulse: &Impulse, strength: f64) -> usize {
    let Impulse { from, to, radius, color } = *impulse;
    let finite = [from.0, from.1, to.0, to.1, radius].iter().all(|v| v.is_finite());
    if !finite || radius <= 0.0 {
        log::debug!("ignoring impulse {:?}", impulse);
        return 0;
    }

    let max_x = (state.width() - 1) as f64;
    let max_y = (state.height() - 1) as f64;
    let clamp = |p: (f64, f64)| (p.0.clamp(0.0, max_x), p.1.clamp(0.0, max_y));
    let (a, b) = (clamp(from), clamp(to));
    let push = ((b.0 - a.0) * strength, (b.1 - a.1) * strength);
    let color = color.map(|c| if c.is_finite() { c.clamp(0.0, 1.0) } else { 0.0 });

    // Bounding box of the stroke grown by the radius
    let x_lo = (a.0.min(b.0) - radius).floor().max(0.0) as usize;
    let x_hi = ((a.0.max(b.0) + radius).ceil().min(max_x)) as usize;
    let y_lo = (a.1.min(b.1) - radius).floor().max(0.0) as usize;
    let y_hi = ((a.1.max(b.1) + radius).ceil().min(max_y)) as usize;

    let mut touched = 0;
    for j in y_lo..=y_hi {
        for i in x_lo..=x_hi {
            let d = distance_to_segment((i as f64, j as f64), a, b);
            let w = falloff(d, radius);
            if w <= 0.0 {
                continue;
            }
            let k = state.idx(i, j);
            state.vx[k] += push.0 * w;
            state.vy[k] += push.1 * w;
            for (ch, &c) in color.iter().enumerate() {
                let dye = &mut state.color[ch][k];
                *dye = (*dye + c * w).clamp(0.0, 1.0);
            }
            touched += 1;
        }
    }
    touched
}
