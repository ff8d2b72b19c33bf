use crate::error::{Result, StitchError};
use serde::Deserialize;

/// A resolved half-open box inside a volume.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Roi3 {
    pub l: usize,
    /// Exclusive right bound.
    pub r: usize,
    pub t: usize,
    /// Exclusive bottom bound.
    pub b: usize,
    /// Near z plane.
    pub n: usize,
    /// Exclusive far z plane.
    pub f: usize,
}

impl Roi3 {
    pub fn w(&self) -> usize {
        self.r - self.l
    }

    pub fn h(&self) -> usize {
        self.b - self.t
    }

    pub fn d(&self) -> usize {
        self.f - self.n
    }

    /// Grow to include a single voxel.
    pub fn include(&mut self, x: usize, y: usize, z: usize) {
        self.l = self.l.min(x);
        self.t = self.t.min(y);
        self.n = self.n.min(z);
        self.r = self.r.max(x + 1);
        self.b = self.b.max(y + 1);
        self.f = self.f.max(z + 1);
    }
}

/// Crop bounds where any side may be left open, meaning "to the array edge".
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BBox {
    pub xmin: Option<usize>,
    pub xmax: Option<usize>,
    pub ymin: Option<usize>,
    pub ymax: Option<usize>,
    pub zmin: Option<usize>,
    pub zmax: Option<usize>,
}

impl BBox {
    /// The whole volume.
    pub fn full() -> Self {
        Self::default()
    }

    /// Open x/y bounds from a 4-element crop plus a fixed z range.
    pub fn from_xy_crop(xy: &XyCrop, zmin: usize, zmax: usize) -> Self {
        Self {
            xmin: xy.0[0],
            xmax: xy.0[1],
            ymin: xy.0[2],
            ymax: xy.0[3],
            zmin: Some(zmin),
            zmax: Some(zmax),
        }
    }

    /// Resolve against a volume shape. Bounds past the edge are clamped like array slicing.
    pub fn resolve(&self, shape: (usize, usize, usize)) -> Result<Roi3> {
        let (w, h, d) = shape;
        let (l, r) = resolve_axis("x", self.xmin, self.xmax, w)?;
        let (t, b) = resolve_axis("y", self.ymin, self.ymax, h)?;
        let (n, f) = resolve_axis("z", self.zmin, self.zmax, d)?;
        Ok(Roi3 { l, r, t, b, n, f })
    }
}

fn resolve_axis(
    axis: &str,
    lo: Option<usize>,
    hi: Option<usize>,
    len: usize,
) -> Result<(usize, usize)> {
    let lo = lo.unwrap_or(0).min(len);
    let hi = hi.unwrap_or(len).min(len);
    if lo > hi {
        return Err(StitchError::InvalidConfiguration(format!(
            "crop bounds on {axis} are inverted ({lo} > {hi})"
        )));
    }
    Ok((lo, hi))
}

/// `[xmin, xmax, ymin, ymax]`, each optional.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct XyCrop(pub [Option<usize>; 4]);

impl std::str::FromStr for XyCrop {
    type Err = String;

    /// Parse `XMIN,XMAX,YMIN,YMAX`; an empty entry leaves that side open.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(format!("expected 4 comma-separated bounds, got {}", parts.len()));
        }
        let mut out = [None; 4];
        for (slot, part) in out.iter_mut().zip(parts) {
            if part.is_empty() {
                continue;
            }
            *slot = Some(part.parse::<usize>().map_err(|e| format!("bad bound '{part}': {e}"))?);
        }
        Ok(XyCrop(out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_bounds_resolve_to_edges() {
        let roi = BBox::full().resolve((5, 6, 7)).unwrap();
        assert_eq!(roi, Roi3 { l: 0, r: 5, t: 0, b: 6, n: 0, f: 7 });
    }

    #[test]
    fn bounds_past_edge_are_clamped() {
        let bbox = BBox { zmin: Some(3), zmax: Some(100), ..BBox::default() };
        let roi = bbox.resolve((2, 2, 10)).unwrap();
        assert_eq!((roi.n, roi.f), (3, 10));
        assert_eq!(roi.d(), 7);
    }

    #[test]
    fn inverted_bounds_are_rejected() {
        let bbox = BBox { xmin: Some(4), xmax: Some(2), ..BBox::default() };
        let err = bbox.resolve((8, 8, 8)).unwrap_err();
        assert!(matches!(err, StitchError::InvalidConfiguration(_)));
    }

    #[test]
    fn xy_crop_parses_open_entries() {
        let crop: XyCrop = "10,,0,20".parse().unwrap();
        assert_eq!(crop.0, [Some(10), None, Some(0), Some(20)]);
        assert!("1,2,3".parse::<XyCrop>().is_err());
        assert!("a,,,".parse::<XyCrop>().is_err());
    }

    #[test]
    fn include_grows_box() {
        let mut roi = Roi3 { l: 2, r: 3, t: 2, b: 3, n: 2, f: 3 };
        roi.include(0, 4, 2);
        assert_eq!(roi, Roi3 { l: 0, r: 3, t: 2, b: 5, n: 2, f: 3 });
    }
}
