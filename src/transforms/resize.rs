//! Spatial resize

use super::Transform;
use crate::error::{Error, Result};
use ndarray::{Array3, Array4};

/// Resize images to a fixed `(height, width)`.
///
/// Images use bilinear interpolation with half-pixel centres; masks use
/// nearest-neighbour so they stay binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resize {
    height: usize,
    width: usize,
}

impl Resize {
    /// Create a resize to `height` x `width`.
    pub fn new(height: usize, width: usize) -> Self {
        Self { height, width }
    }

    /// Target size as `(height, width)`
    pub fn size(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    fn check(&self, in_h: usize, in_w: usize) -> Result<()> {
        if self.height == 0 || self.width == 0 {
            return Err(Error::config_value(
                "resize",
                format!("target size {}x{} has a zero side", self.height, self.width),
                "Use a positive height and width",
            ));
        }
        if in_h == 0 || in_w == 0 {
            return Err(Error::ShapeMismatch {
                expected: vec![1, 1],
                actual: vec![in_h, in_w],
            });
        }
        Ok(())
    }
}

/// Source coordinate and interpolation weight for one output index.
fn source_coord(dst: usize, in_len: usize, out_len: usize) -> (usize, usize, f32) {
    let scale = in_len as f32 / out_len as f32;
    let src = ((dst as f32 + 0.5) * scale - 0.5).max(0.0);
    let lo = (src.floor() as usize).min(in_len - 1);
    let hi = (lo + 1).min(in_len - 1);
    (lo, hi, src - lo as f32)
}

fn nearest(dst: usize, in_len: usize, out_len: usize) -> usize {
    ((dst * in_len) / out_len).min(in_len - 1)
}

impl Transform for Resize {
    fn apply(&self, images: Array4<f32>) -> Result<Array4<f32>> {
        let (n, c, in_h, in_w) = images.dim();
        self.check(in_h, in_w)?;
        if (in_h, in_w) == (self.height, self.width) {
            return Ok(images);
        }

        let rows: Vec<_> = (0..self.height)
            .map(|y| source_coord(y, in_h, self.height))
            .collect();
        let cols: Vec<_> = (0..self.width)
            .map(|x| source_coord(x, in_w, self.width))
            .collect();

        let mut out = Array4::zeros((n, c, self.height, self.width));
        for b in 0..n {
            for ch in 0..c {
                for (y, &(y0, y1, wy)) in rows.iter().enumerate() {
                    for (x, &(x0, x1, wx)) in cols.iter().enumerate() {
                        let top =
                            images[[b, ch, y0, x0]] * (1.0 - wx) + images[[b, ch, y0, x1]] * wx;
                        let bottom =
                            images[[b, ch, y1, x0]] * (1.0 - wx) + images[[b, ch, y1, x1]] * wx;
                        out[[b, ch, y, x]] = top * (1.0 - wy) + bottom * wy;
                    }
                }
            }
        }
        Ok(out)
    }

    fn apply_mask(&self, mask: Array3<bool>) -> Result<Array3<bool>> {
        let (n, in_h, in_w) = mask.dim();
        self.check(in_h, in_w)?;
        if (in_h, in_w) == (self.height, self.width) {
            return Ok(mask);
        }
        Ok(Array3::from_shape_fn((n, self.height, self.width), |(b, y, x)| {
            mask[[b, nearest(y, in_h, self.height), nearest(x, in_w, self.width)]]
        }))
    }

    fn name(&self) -> &'static str {
        "Resize"
    }
}
