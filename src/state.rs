use crate::error::CoreError;

/// Bytes per composited pixel (RGBA8).
pub const BYTES_PER_PIXEL: usize = 4;

/// Small xorshift generator. Deterministic for a given seed.
pub struct Xor128 {
    x: u32,
    y: u32,
    z: u32,
    w: u32,
}

impl Xor128 {
    pub fn new(seed: u32) -> Self {
        // An all-zero state would stay zero forever.
        let seed = if seed == 0 { 0x9E37_79B9 } else { seed };
        Self {
            x: seed,
            y: seed.wrapping_mul(1812433253).wrapping_add(1),
            z: seed.wrapping_mul(1812433253).wrapping_mul(2).wrapping_add(2),
            w: seed.wrapping_mul(1812433253).wrapping_mul(3).wrapping_add(3),
        }
    }

    pub fn next(&mut self) -> u32 {
        let t = self.x ^ (self.x << 11);
        self.x = self.y;
        self.y = self.z;
        self.z = self.w;
        self.w = self.w ^ (self.w >> 19) ^ (t ^ (t >> 8));
        self.w
    }

    /// Returns a float in [0.0, 1.0]
    pub fn next_unit(&mut self) -> f64 {
        self.next() as f64 / u32::MAX as f64
    }
}

/// Row-major index for in-bounds coordinates.
#[inline(always)]
pub const fn idx_inner(x: usize, y: usize, nx: usize) -> usize {
    y * nx + x
}

/// Grid extent passed to the per-cell kernels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dims {
    pub nx: usize,
    pub ny: usize,
}

impl Dims {
    pub fn new(nx: usize, ny: usize) -> Self {
        Self { nx, ny }
    }

    pub fn cells(&self) -> usize {
        self.nx * self.ny
    }
}

/// All field buffers of one simulation grid.
///
/// Every field is exactly `width * height` cells. Double-buffered fields keep
/// the current generation in the plain name (`vx`) and the next generation in
/// the `0`-suffixed one (`vx0`); stages write the `0` buffer and then swap.
pub struct GridState {
    width: usize,
    height: usize,
    pub(crate) vx: Vec<f64>,
    pub(crate) vy: Vec<f64>,
    pub(crate) vx0: Vec<f64>,
    pub(crate) vy0: Vec<f64>,
    /// Persisted between frames as the warm start of the pressure solve.
    pub(crate) pressure: Vec<f64>,
    pub(crate) pressure0: Vec<f64>,
    pub(crate) divergence: Vec<f64>,
    /// Dye channels R, G, B in [0, 1].
    pub(crate) color: [Vec<f64>; 3],
    pub(crate) color0: [Vec<f64>; 3],
    /// Jacobi ping-pong partner for diffusion.
    pub(crate) scratch: Vec<f64>,
}

impl GridState {
    /// Allocate and zero-fill every field.
    ///
    /// Dimensions are validated before anything is allocated.
    pub fn new(width: usize, height: usize) -> Result<Self, CoreError> {
        let size = Self::checked_cells(width, height)?;
        log::debug!("allocating {width}x{height} grid ({size} cells)");
        Ok(Self {
            width,
            height,
            vx: vec![0.0; size],
            vy: vec![0.0; size],
            vx0: vec![0.0; size],
            vy0: vec![0.0; size],
            pressure: vec![0.0; size],
            pressure0: vec![0.0; size],
            divergence: vec![0.0; size],
            color: [vec![0.0; size], vec![0.0; size], vec![0.0; size]],
            color0: [vec![0.0; size], vec![0.0; size], vec![0.0; size]],
            scratch: vec![0.0; size],
        })
    }

    /// Cell count for the given dimensions, or the configuration error that
    /// rules them out.
    pub fn checked_cells(width: usize, height: usize) -> Result<usize, CoreError> {
        if width == 0 || height == 0 {
            return Err(CoreError::InvalidDimensions { width, height });
        }
        let too_large = CoreError::GridTooLarge { width, height };
        let cells = width.checked_mul(height).ok_or(too_large.clone())?;
        // Each f64 field and the RGBA output must both fit in isize::MAX bytes.
        let bytes = cells.checked_mul(std::mem::size_of::<f64>()).ok_or(too_large.clone())?;
        if bytes > isize::MAX as usize || cells.checked_mul(BYTES_PER_PIXEL).is_none() {
            return Err(too_large);
        }
        Ok(cells)
    }

    /// Release every buffer. Consuming `self` rules out use after teardown.
    pub fn teardown(self) {
        log::debug!("releasing {}x{} grid", self.width, self.height);
        drop(self);
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn dims(&self) -> Dims {
        Dims::new(self.width, self.height)
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Exact byte length of the composited RGBA8 buffer.
    pub fn pixel_bytes(&self) -> usize {
        self.len() * BYTES_PER_PIXEL
    }

    #[inline(always)]
    pub fn idx(&self, x: usize, y: usize) -> usize {
        idx_inner(x, y, self.width)
    }

    pub fn vx(&self) -> &[f64] {
        &self.vx
    }

    pub fn vy(&self) -> &[f64] {
        &self.vy
    }

    pub fn pressure(&self) -> &[f64] {
        &self.pressure
    }

    pub fn divergence(&self) -> &[f64] {
        &self.divergence
    }

    pub fn color(&self, channel: usize) -> &[f64] {
        &self.color[channel]
    }

    pub fn velocity_at(&self, x: usize, y: usize) -> (f64, f64) {
        let i = self.idx(x, y);
        (self.vx[i], self.vy[i])
    }

    pub fn color_at(&self, x: usize, y: usize) -> [f64; 3] {
        let i = self.idx(x, y);
        [self.color[0][i], self.color[1][i], self.color[2][i]]
    }

    fn fields(&self) -> impl Iterator<Item = &Vec<f64>> {
        [
            &self.vx,
            &self.vy,
            &self.vx0,
            &self.vy0,
            &self.pressure,
            &self.pressure0,
            &self.divergence,
            &self.scratch,
        ]
        .into_iter()
        .chain(self.color.iter())
        .chain(self.color0.iter())
    }

    /// True when every buffer holds only zeros.
    pub fn is_zeroed(&self) -> bool {
        self.fields().all(|f| f.iter().all(|&v| v == 0.0))
    }

    /// Replace non-finite values in the persistent fields with zero.
    /// Returns the number of cells that were reset.
    pub fn sanitize(&mut self) -> usize {
        let mut reset = 0;
        let persistent = [&mut self.vx, &mut self.vy, &mut self.pressure]
            .into_iter()
            .chain(self.color.iter_mut());
        for field in persistent {
            for v in field.iter_mut() {
                if !v.is_finite() {
                    *v = 0.0;
                    reset += 1;
                }
            }
        }
        reset
    }
}
