use crate::error::{Result, StitchError};
use crate::vol::ProbVol;

/// `max - p` for every voxel, so ridges become valleys.
pub fn invert(probs: &ProbVol) -> ProbVol {
    let max = probs.max_val();
    probs.map(|p| max - p)
}

#[inline(always)]
fn clamp_off(v: usize, off: isize, len: usize) -> usize {
    (v as isize + off).clamp(0, len as isize - 1) as usize
}

/// 3x3x3 median, edges clamped.
pub fn median3(probs: &ProbVol) -> ProbVol {
    let (w, h, d) = probs.shape();
    let mut out = ProbVol::new(w, h, d);
    let mut win: [f32; 27] = [0.0; 27];

    for z in 0..d {
        for y in 0..h {
            for x in 0..w {
                let mut n = 0;
                for dz in -1..=1 {
                    for dy in -1..=1 {
                        for dx in -1..=1 {
                            let i = probs.idx(clamp_off(x, dx, w), clamp_off(y, dy, h), clamp_off(z, dz, d));
                            win[n] = probs.arr[i];
                            n += 1;
                        }
                    }
                }
                win.sort_unstable_by(f32::total_cmp);
                let i = out.idx(x, y, z);
                out.arr[i] = win[13];
            }
        }
    }
    out
}

fn gaussian_kernel(sigma: f32) -> Vec<f32> {
    let r = (4.0 * sigma).ceil() as isize;
    let mut k: Vec<f32> = (-r..=r)
        .map(|i| (-((i * i) as f32) / (2.0 * sigma * sigma)).exp())
        .collect();
    let sum: f32 = k.iter().sum();
    for v in &mut k {
        *v /= sum;
    }
    k
}

/// One separable pass along `axis` (0 = x, 1 = y, 2 = z).
fn convolve_axis(src: &ProbVol, kernel: &[f32], axis: usize) -> ProbVol {
    let (w, h, d) = src.shape();
    let r = (kernel.len() / 2) as isize;
    let mut out = ProbVol::new(w, h, d);

    for z in 0..d {
        for y in 0..h {
            for x in 0..w {
                let mut acc = 0.0;
                for (ki, &kv) in kernel.iter().enumerate() {
                    let off = ki as isize - r;
                    let i = match axis {
                        0 => src.idx(clamp_off(x, off, w), y, z),
                        1 => src.idx(x, clamp_off(y, off, h), z),
                        _ => src.idx(x, y, clamp_off(z, off, d)),
                    };
                    acc += kv * src.arr[i];
                }
                let i = out.idx(x, y, z);
                out.arr[i] = acc;
            }
        }
    }
    out
}

/// Separable Gaussian blur, kernel radius `ceil(4 * sigma)`, edges clamped.
pub fn gaussian(probs: &ProbVol, sigma: f32) -> Result<ProbVol> {
    if !(sigma > 0.0 && sigma.is_finite()) {
        return Err(StitchError::InvalidConfiguration(format!("gaussian sigma {sigma} must be positive")));
    }
    if probs.is_empty() {
        return Ok(probs.clone());
    }

    let kernel = gaussian_kernel(sigma);
    let mut out = convolve_axis(probs, &kernel, 0);
    out = convolve_axis(&out, &kernel, 1);
    out = convolve_axis(&out, &kernel, 2);
    Ok(out)
}
