//! 沿 z 方向重建掩膜中缺失的切片.
//!
//! 当前景在某些切片上 "断开", 而其前后切片上都存在时, 断开处会被补回.
//! 只向一侧延伸的前景不会被延长.

use either::Either;
use log::debug;
use ndarray::{Array2, Array3, ArrayView3, Axis, Zip};

use crate::consts::gray::*;
use crate::data::Volume;

/// 由前向、后向两次累积 "或" 扫描的交集重建切片间的空洞.
///
/// 输入先被二值化: 任何非零体素都视为前景, 因此按位运算只作用于前景标记,
/// 而不是原始灰度值. 记二值化后第 `i` 张切片为 `m[i]`:
///
/// + 前向: `f[0] = m[0]`, `f[i] = m[i] | f[i - 1]`;
/// + 后向: `b[last] = m[last]`, `b[i] = m[i] | b[i + 1]`;
/// + 结果: `r[i] = f[i] & b[i]`.
///
/// 两次扫描都只读取原始输入, 互不依赖. 开启 `rayon` feature 时两者并行执行.
/// 输入不会被修改, 输出为二值掩膜.
pub fn reconstruct_gaps(volume: &Volume) -> Volume {
    debug!("reconstruct_gaps: shape = {:?}", volume.shape());
    let input = volume.data();

    #[cfg(feature = "rayon")]
    let (fwd, bwd) = rayon::join(|| sweep(input, true), || sweep(input, false));
    #[cfg(not(feature = "rayon"))]
    let (fwd, bwd) = (sweep(input, true), sweep(input, false));

    let mut out = volume.clone();
    Zip::from(out.data_mut())
        .and(&fwd)
        .and(&bwd)
        .for_each(|r, &f, &b| {
            *r = if is_foreground(f) && is_foreground(b) {
                FOREGROUND
            } else {
                BACKGROUND
            };
        });
    out
}

/// 沿 z 方向的累积 "或" 扫描. `forward` 为 `false` 时从最后一张切片开始.
fn sweep(input: ArrayView3<u8>, forward: bool) -> Array3<u8> {
    let len_z = input.len_of(Axis(0));
    let (_, h, w) = input.dim();
    let mut out = Array3::from_elem(input.raw_dim(), BACKGROUND);
    let mut acc = Array2::from_elem((h, w), BACKGROUND);

    let order = if forward {
        Either::Left(0..len_z)
    } else {
        Either::Right((0..len_z).rev())
    };
    for z in order {
        Zip::from(&mut acc)
            .and(input.index_axis(Axis(0), z))
            .for_each(|a, &m| {
                if is_foreground(m) {
                    *a = FOREGROUND;
                }
            });
        out.index_axis_mut(Axis(0), z).assign(&acc);
    }
    out
}
