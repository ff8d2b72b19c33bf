use super::core::Vol;
use super::roi::Roi3;

/// Flood-fill one face-connected component of equal-valued voxels.
fn flood_vol<SrcT, TarT>(
    src_vol: &Vol<SrcT>,
    dst_vol: &mut Vol<TarT>,
    visited: &mut [u8],
    start: (usize, usize, usize),
    fill_val: TarT,
) -> (usize, Roi3)
where
    SrcT: Copy + PartialEq,
    TarT: Copy,
{
    assert_eq!(src_vol.shape(), dst_vol.shape(), "src/dst shape mismatch");

    let (w, h, d) = src_vol.shape();
    let (start_x, start_y, start_z) = start;
    assert!(start_x < w && start_y < h && start_z < d, "start coords out of bounds");

    let group_val = src_vol.arr[src_vol.idx(start_x, start_y, start_z)];

    let mut stack: Vec<(usize, usize, usize)> = Vec::with_capacity(1024);
    stack.push(start);

    let mut filled = 0usize;
    let mut roi = Roi3 {
        l: start_x,
        r: start_x + 1,
        t: start_y,
        b: start_y + 1,
        n: start_z,
        f: start_z + 1,
    };
    while let Some((x, y, z)) = stack.pop() {
        let v_i = src_vol.idx(x, y, z);
        if visited[v_i] != 0 {
            continue;
        }

        if src_vol.arr[v_i] != group_val {
            continue;
        }
        visited[v_i] = 1;

        unsafe {
            *dst_vol.get_unchecked_mut(x, y, z) = fill_val;
        }
        filled += 1;
        roi.include(x, y, z);

        if x + 1 < w {
            stack.push((x + 1, y, z));
        }
        if x > 0 {
            stack.push((x - 1, y, z));
        }
        if y + 1 < h {
            stack.push((x, y + 1, z));
        }
        if y > 0 {
            stack.push((x, y - 1, z));
        }
        if z + 1 < d {
            stack.push((x, y, z + 1));
        }
        if z > 0 {
            stack.push((x, y, z - 1));
        }
    }

    (filled, roi)
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LabelInfo {
    pub size: usize,
    pub start: (usize, usize, usize),
    pub roi: Roi3,
}

/// Label the face-connected components of a volume.
///
/// Voxels equal to `SrcT::default()` are background and stay 0. Every other voxel
/// joins the component of its equal-valued 6-neighbours, so two touching regions
/// with different source values stay distinct. Ids are assigned 1..=n in scan
/// order (z, then y, then x). `infos[0]` is reserved for the background.
pub fn label_vol<SrcT>(src_vol: &Vol<SrcT>) -> (Vol<u32>, Vec<LabelInfo>)
where
    SrcT: Copy + Default + PartialEq,
{
    let (w, h, d) = src_vol.shape();
    let mut dst_vol = Vol::<u32>::new(w, h, d);
    let mut visited: Vec<u8> = vec![0; src_vol.len()];

    let src_bg = SrcT::default();

    let mut infos: Vec<LabelInfo> = vec![LabelInfo::default()];
    for z in 0..d {
        for y in 0..h {
            for x in 0..w {
                let i = src_vol.idx(x, y, z);
                if src_vol.arr[i] == src_bg || visited[i] != 0 {
                    continue;
                }

                let label_val = u32::try_from(infos.len())
                    .unwrap_or_else(|_| panic!("label value overflow at {}", infos.len()));

                let (size, roi) = flood_vol(src_vol, &mut dst_vol, &mut visited, (x, y, z), label_val);
                infos.push(LabelInfo { size, start: (x, y, z), roi });
            }
        }
    }

    (dst_vol, infos)
}

/// Just the relabeled volume.
pub fn relabel<SrcT>(src_vol: &Vol<SrcT>) -> Vol<u32>
where
    SrcT: Copy + Default + PartialEq,
{
    label_vol(src_vol).0
}

// Tests
// -----------------------------------------------------------------------------
