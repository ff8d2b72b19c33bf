use super::core::{LabelVol, ProbVol, Vol};
use crate::error::{Result, StitchError};
use image::ImageResult;
use std::path::{Path, PathBuf};

// Helpers for u32 PNG packing/unpacking
// -----------------------------------------------------------------------------
fn dim_mismatch_err() -> image::ImageError {
    image::ImageError::Parameter(image::error::ParameterError::from_kind(
        image::error::ParameterErrorKind::DimensionMismatch,
    ))
}

fn pack_u32_as_rgba8(labels: &[u32]) -> Vec<u8> {
    let mut out: Vec<u8> = Vec::with_capacity(labels.len() * 4);
    for v in labels {
        out.extend_from_slice(&v.to_le_bytes());
    }
    out
}

fn unpack_rgba8_as_u32(raw_rgba: &[u8]) -> std::result::Result<Vec<u32>, image::ImageError> {
    if raw_rgba.len() % 4 != 0 {
        return Err(dim_mismatch_err());
    }

    let mut out: Vec<u32> = Vec::with_capacity(raw_rgba.len() / 4);
    for px in raw_rgba.chunks_exact(4) {
        out.push(u32::from_le_bytes([px[0], px[1], px[2], px[3]]));
    }
    Ok(out)
}

// Stack assembly
// -----------------------------------------------------------------------------

/// Stack equally sized 2-D slices into a volume, z in slice order.
fn stack_slices<T: Copy + Default>(slices: Vec<(usize, usize, Vec<T>)>) -> Result<Vol<T>> {
    let Some(&(w, h, _)) = slices.first() else {
        return Err(StitchError::InvalidConfiguration("image stack is empty".to_string()));
    };

    let d = slices.len();
    let mut arr: Vec<T> = Vec::with_capacity(w * h * d);
    for (sw, sh, px) in slices {
        if (sw, sh) != (w, h) {
            return Err(StitchError::shape_mismatch("image stack slice", (w, h, 1), (sw, sh, 1)));
        }
        arr.extend_from_slice(&px);
    }

    Vol::from_vec(w, h, d, arr).ok_or_else(|| StitchError::Image(dim_mismatch_err()))
}

/// Read a boundary-probability stack, one image per z plane.
///
/// Pixels are read as 16-bit luma and kept at their raw scale, so an 8-bit stack
/// yields values in 0..=255.
pub fn read_prob_stack<P: AsRef<Path>>(paths: &[P]) -> Result<ProbVol> {
    let mut slices = Vec::with_capacity(paths.len());
    for path in paths {
        let img = image::open(path.as_ref())?;
        let eight_bit = matches!(
            img.color(),
            image::ColorType::L8 | image::ColorType::La8 | image::ColorType::Rgb8 | image::ColorType::Rgba8
        );
        let w = img.width() as usize;
        let h = img.height() as usize;
        let px: Vec<f32> = if eight_bit {
            img.into_luma8().into_raw().into_iter().map(f32::from).collect()
        } else {
            img.into_luma16().into_raw().into_iter().map(f32::from).collect()
        };
        slices.push((w, h, px));
    }
    let vol = stack_slices(slices)?;
    tracing::debug!(shape = ?vol.shape(), "read probability stack");
    Ok(vol)
}

/// Read a label stack. RGBA8 slices carry one packed little-endian u32 per pixel;
/// gray slices are taken as label values directly.
pub fn read_label_stack<P: AsRef<Path>>(paths: &[P]) -> Result<LabelVol> {
    let mut slices = Vec::with_capacity(paths.len());
    for path in paths {
        let img = image::open(path.as_ref())?;
        let w = img.width() as usize;
        let h = img.height() as usize;
        let px: Vec<u32> = match img.color() {
            image::ColorType::Rgba8 => unpack_rgba8_as_u32(&img.into_rgba8().into_raw())?,
            image::ColorType::L8 => img.into_luma8().into_raw().into_iter().map(u32::from).collect(),
            _ => img.into_luma16().into_raw().into_iter().map(u32::from).collect(),
        };
        if px.len() != w * h {
            return Err(StitchError::Image(dim_mismatch_err()));
        }
        slices.push((w, h, px));
    }
    let vol = stack_slices(slices)?;
    tracing::debug!(shape = ?vol.shape(), "read label stack");
    Ok(vol)
}

// PNG output
// -----------------------------------------------------------------------------
impl LabelVol {
    // PNG doesn't support 32-bit single-channel integer pixels, so each label is
    // packed into RGBA8 (little-endian bytes), one file per z plane.
    pub fn save_png_stack<P: AsRef<Path>>(&self, dir: P) -> ImageResult<Vec<PathBuf>> {
        let dir = dir.as_ref();
        let mut paths = Vec::with_capacity(self.d);
        for z in 0..self.d {
            let plane = &self.arr[z * self.ps..(z + 1) * self.ps];
            let img = image::RgbaImage::from_raw(self.w as u32, self.h as u32, pack_u32_as_rgba8(plane))
                .ok_or_else(dim_mismatch_err)?;

            let path = dir.join(format!("labels_{z:05}.png"));
            img.save_with_format(&path, image::ImageFormat::Png)?;
            paths.push(path);
        }
        Ok(paths)
    }
}

// Tests
// -----------------------------------------------------------------------------
