#[derive(Debug, Clone, PartialEq)]
pub struct Vol<T> {
    pub w: usize,
    pub h: usize,
    pub d: usize,
    pub s: usize,  // row stride in elements (w)
    pub ps: usize, // plane stride in elements (w * h)
    pub arr: Vec<T>,
}

// Constructor
// -----------------------------------------------------------------------------
impl<T: Copy + Default> Vol<T> {
    pub fn new(w: usize, h: usize, d: usize) -> Self {
        let s = w;
        let ps = w * h;
        let arr = vec![T::default(); ps * d];
        Self { w, h, d, s, ps, arr }
    }
}

impl<T> Vol<T> {
    /// Wrap an existing x-fastest buffer. Returns `None` if the length disagrees with the dims.
    pub fn from_vec(w: usize, h: usize, d: usize, arr: Vec<T>) -> Option<Self> {
        if arr.len() != w * h * d {
            return None;
        }
        Some(Self { w, h, d, s: w, ps: w * h, arr })
    }

    pub fn shape(&self) -> (usize, usize, usize) {
        (self.w, self.h, self.d)
    }

    pub fn len(&self) -> usize {
        self.arr.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arr.is_empty()
    }

    #[inline(always)]
    pub fn idx(&self, x: usize, y: usize, z: usize) -> usize {
        z * self.ps + y * self.s + x
    }

    #[inline(always)]
    pub unsafe fn get_unchecked_mut(&mut self, x: usize, y: usize, z: usize) -> &mut T {
        unsafe { self.arr.get_unchecked_mut(z * self.ps + y * self.s + x) }
    }
}

// Sub-volume extraction
// -----------------------------------------------------------------------------
impl<T: Copy + Default> Vol<T> {
    /// Copy out the half-open box `roi`. The caller guarantees the box is inside the volume.
    pub fn sub_vol(&self, roi: &super::Roi3) -> Self {
        assert!(roi.r <= self.w && roi.b <= self.h && roi.f <= self.d, "roi out of bounds");

        let mut out = Self::new(roi.w(), roi.h(), roi.d());
        for z in roi.n..roi.f {
            for y in roi.t..roi.b {
                let src_i = self.idx(roi.l, y, z);
                let dst_i = out.idx(0, y - roi.t, z - roi.n);
                out.arr[dst_i..dst_i + out.w].copy_from_slice(&self.arr[src_i..src_i + out.w]);
            }
        }
        out
    }

    /// A single z plane as a volume of depth 1.
    pub fn z_plane(&self, z: usize) -> Self {
        assert!(z < self.d, "z plane {z} out of bounds (d={})", self.d);
        let start = z * self.ps;
        Self {
            w: self.w,
            h: self.h,
            d: 1,
            s: self.s,
            ps: self.ps,
            arr: self.arr[start..start + self.ps].to_vec(),
        }
    }
}

impl<T: Copy> Vol<T> {
    pub fn map<U, F: Fn(T) -> U>(&self, f: F) -> Vol<U> {
        Vol {
            w: self.w,
            h: self.h,
            d: self.d,
            s: self.s,
            ps: self.ps,
            arr: self.arr.iter().map(|&v| f(v)).collect(),
        }
    }
}

impl Vol<f32> {
    /// Largest value, or 0.0 for an empty volume.
    pub fn max_val(&self) -> f32 {
        self.arr.iter().copied().fold(f32::NEG_INFINITY, f32::max).max(0.0)
    }
}

pub type ProbVol = Vol<f32>;
pub type LabelVol = Vol<u32>;
