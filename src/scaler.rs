use rayon::{
    iter::{IndexedParallelIterator, ParallelIterator},
    slice::ParallelSliceMut,
};

/// Sprite texels with this value are not drawn.
pub const COLOR_KEY: u32 = 0x00FF_00FF;

#[inline]
pub fn pack_rgb(r: u8, g: u8, b: u8) -> u32 {
    // BGRA8 in little-endian memory
    (b as u32) | ((g as u32) << 8) | ((r as u32) << 16)
    // Alpha at 0
}

#[inline]
pub fn unpack_rgb(c: u32) -> (u8, u8, u8) {
    ((c >> 16) as u8, (c >> 8) as u8, c as u8)
}

/// Multiplies every channel by `tint / 255`, like a grey multiply blend.
#[inline]
pub fn modulate(c: u32, tint: u8) -> u32 {
    let t = tint as u32 + 1; // 256 keeps full brightness exact
    let rb = ((c & 0x00FF00FF) * t >> 8) & 0x00FF00FF;
    let g = ((c & 0x0000FF00) * t >> 8) & 0x0000FF00;
    rb | g
}

/// Blend `a` towards `b`; `w256` in [0, 256].
#[inline]
pub fn lerp_color_u32(a: u32, b: u32, w256: u32) -> u32 {
    let inv = 256 - w256;
    // Interpolate R and B together (00RR00BB), with mask 0x00FF00FF,
    let rb = ((a & 0x00FF00FF) * inv + (b & 0x00FF00FF) * w256) >> 8 & 0x00FF00FF;
    // Interpolate G separately (0000GG00), with mask 0x0000FF00
    let g = ((a & 0x0000FF00) * inv + (b & 0x0000FF00) * w256) >> 8 & 0x0000FF00;
    rb | g // alpha stays 0
}

/// Fills the buffer with a vertical gradient mirrored around the middle row:
/// `centre` at the horizon, `edge` at the top and bottom rows.
pub fn fill_mirrored_gradient(buf: &mut [u32], w: usize, h: usize, centre: u32, edge: u32) {
    if w == 0 || h == 0 {
        return;
    }
    let half = (h as f32 / 2.0).max(1.0);
    buf[..w * h]
        .par_chunks_mut(w)
        .enumerate()
        .for_each(|(y, row)| {
            let t = ((y as f32 - half).abs() / half).min(1.0);
            let color = lerp_color_u32(centre, edge, (t * 256.0) as u32);
            row.fill(color);
        });
}

/// Nearest-neighbour mapping from destination pixels to source pixels.
pub struct ScaleLut {
    src_x: Vec<usize>,
    src_y: Vec<usize>,
}

impl ScaleLut {
    pub fn empty() -> Self {
        Self {
            src_x: Vec::new(),
            src_y: Vec::new(),
        }
    }

    pub fn dst_size(&self) -> (usize, usize) {
        (self.src_x.len(), self.src_y.len())
    }
}

pub fn build_scale_lut(dst_w: usize, dst_h: usize, src_w: usize, src_h: usize) -> ScaleLut {
    let map = |dst: usize, src: usize| -> Vec<usize> {
        let s = src as f32 / dst as f32;
        (0..dst)
            .map(|i| ((i as f32 * s) as usize).min(src.saturating_sub(1)))
            .collect()
    };
    ScaleLut {
        src_x: map(dst_w, src_w),
        src_y: map(dst_h, src_h),
    }
}

/// Parallel nearest-neighbour stretch.
/// Rows are processed in parallel for cache friendly writes
pub fn blit_nearest(dst: &mut [u32], dw: usize, src: &[u32], sw: usize, lut: &ScaleLut) {
    let (lut_w, lut_h) = lut.dst_size();
    if dw == 0 || lut_w != dw {
        return;
    }
    dst.par_chunks_mut(dw)
        .take(lut_h)
        .enumerate()
        .for_each(|(y, dst_row)| {
            let row = lut.src_y[y] * sw;
            for (x, px) in dst_row.iter_mut().enumerate() {
                *px = src[row + lut.src_x[x]];
            }
        });
}
