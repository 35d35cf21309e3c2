use crate::error::CoreError;
use crate::parallel::{for_each_record, ExecPolicy};
use crate::state::{GridState, BYTES_PER_PIXEL};

/// Map a dye concentration to an 8-bit channel: round(255 * v) clamped to
/// [0, 255]. Non-finite values map to 0.
#[inline]
pub fn channel_to_u8(v: f64) -> u8 {
    if !v.is_finite() {
        return 0;
    }
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}

/// Write the dye field into `out` as row-major RGBA8 with opaque alpha.
///
/// `out` must hold exactly `width * height * 4` bytes; otherwise nothing is
/// written.
pub fn composite(state: &GridState, out: &mut [u8], exec: ExecPolicy) -> Result<(), CoreError> {
    let expected = state.pixel_bytes();
    if out.len() != expected {
        return Err(CoreError::BufferSize { expected, actual: out.len() });
    }
    let [r, g, b] = [state.color(0), state.color(1), state.color(2)];
    for_each_record(out, BYTES_PER_PIXEL, exec, |i, px| {
        px[0] = channel_to_u8(r[i]);
        px[1] = channel_to_u8(g[i]);
        px[2] = channel_to_u8(b[i]);
        px[3] = 255;
    });
    Ok(())
}

/// Convert RGBA &[u8] buffer to 0RGB &[u32] buffer for minifb.
pub fn rgba_to_argb(rgba: &[u8], out: &mut [u32]) {
    for (i, pixel) in rgba.chunks_exact(4).enumerate() {
        out[i] = (pixel[0] as u32) << 16 | (pixel[1] as u32) << 8 | pixel[2] as u32;
    }
}

/// Window layout: the simulation grid shown at an integer pixel scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub grid_width: usize,
    pub grid_height: usize,
    pub scale: usize,
}

impl Viewport {
    /// Compute the grid that fits a window of the given pixel size.
    /// The grid is never smaller than 1x1.
    pub fn fit(pixel_width: usize, pixel_height: usize, scale: usize) -> Self {
        let scale = scale.max(1);
        Self {
            grid_width: (pixel_width / scale).max(1),
            grid_height: (pixel_height / scale).max(1),
            scale,
        }
    }

    pub fn frame_width(&self) -> usize {
        self.grid_width * self.scale
    }

    pub fn frame_height(&self) -> usize {
        self.grid_height * self.scale
    }

    pub fn frame_len(&self) -> usize {
        self.frame_width() * self.frame_height()
    }

    /// Map a window pixel position to grid coordinates (cell centers at
    /// integer positions).
    pub fn to_grid(&self, px: f32, py: f32) -> (f64, f64) {
        let s = self.scale as f64;
        (px as f64 / s - 0.5, py as f64 / s - 0.5)
    }

    /// Nearest-neighbour upscale of a composited RGBA frame into the 0RGB
    /// window buffer.
    pub fn present(&self, rgba: &[u8], out: &mut [u32]) {
        debug_assert_eq!(rgba.len(), self.grid_width * self.grid_height * BYTES_PER_PIXEL);
        debug_assert_eq!(out.len(), self.frame_len());
        if self.scale == 1 {
            rgba_to_argb(rgba, out);
            return;
        }
        let fw = self.frame_width();
        for (gy, grid_row) in rgba.chunks_exact(self.grid_width * BYTES_PER_PIXEL).enumerate() {
            let first = gy * self.scale * fw;
            rgba_to_argb_scaled(grid_row, &mut out[first..first + fw], self.scale);
            let (done, rest) = out[first..].split_at_mut(fw);
            for k in 1..self.scale {
                rest[(k - 1) * fw..k * fw].copy_from_slice(done);
            }
        }
    }
}

/// One grid row to one window row, repeating every pixel `scale` times.
fn rgba_to_argb_scaled(rgba: &[u8], out: &mut [u32], scale: usize) {
    for (pixel, dst) in rgba.chunks_exact(4).zip(out.chunks_exact_mut(scale)) {
        let argb = (pixel[0] as u32) << 16 | (pixel[1] as u32) << 8 | pixel[2] as u32;
        dst.fill(argb);
    }
}
