//! 逐切片的二维形态学操作.
//!
//! 腐蚀为核支撑范围内的最小值滤波, 膨胀为最大值滤波. 落在切片以外的核单元被忽略,
//! 因此图像边缘不会因为越界而被额外腐蚀或膨胀. 所有操作都保持形状,
//! 并且在同一次调用中共享同一个只读的 [`Kernel`].

mod kernel;

use log::debug;
use ndarray::{ArrayView2, ArrayViewMut2, Axis};

use crate::data::Volume;

pub use kernel::Kernel;

/// 滤波取值方式.
#[derive(Copy, Clone, Debug)]
enum Extremum {
    /// 最小值 (腐蚀).
    Min,

    /// 最大值 (膨胀).
    Max,
}

impl Extremum {
    /// 空支撑时的取值. 即越界单元被视为对结果没有影响.
    #[inline]
    const fn identity(self) -> u8 {
        match self {
            Extremum::Min => u8::MAX,
            Extremum::Max => u8::MIN,
        }
    }

    #[inline]
    fn pick(self, a: u8, b: u8) -> u8 {
        match self {
            Extremum::Min => a.min(b),
            Extremum::Max => a.max(b),
        }
    }
}

/// 将 `src` 以 `kernel` 做极值滤波, 结果写入 `dst`. 二者形状必须相同.
fn filter_slice(src: ArrayView2<u8>, mut dst: ArrayViewMut2<u8>, kernel: &Kernel, how: Extremum) {
    debug_assert_eq!(src.dim(), dst.dim());
    let (h_len, w_len) = src.dim();
    for ((h, w), out) in dst.indexed_iter_mut() {
        *out = kernel
            .offsets()
            .iter()
            .filter_map(|&(dh, dw)| {
                let nh = h.checked_add_signed(dh)?;
                let nw = w.checked_add_signed(dw)?;
                (nh < h_len && nw < w_len).then(|| src[(nh, nw)])
            })
            .fold(how.identity(), |acc, v| how.pick(acc, v));
    }
}

/// 对体数据每张切片做极值滤波, 返回新的体数据.
fn filter_volume(volume: &Volume, kernel: &Kernel, how: Extremum) -> Volume {
    let src = volume.data();
    let mut out = volume.clone();
    out.for_each_indexed_slice_mut(|z, mut dst| {
        filter_slice(src.index_axis(Axis(0), z), dst.array_view_mut(), kernel, how);
    });
    out
}

/// 逐切片腐蚀.
pub fn erode(volume: &Volume, kernel: &Kernel) -> Volume {
    debug!("erode: shape = {:?}, kernel = {:?}", volume.shape(), kernel.shape());
    filter_volume(volume, kernel, Extremum::Min)
}

/// 逐切片膨胀.
pub fn dilate(volume: &Volume, kernel: &Kernel) -> Volume {
    debug!("dilate: shape = {:?}, kernel = {:?}", volume.shape(), kernel.shape());
    filter_volume(volume, kernel, Extremum::Max)
}

/// 开运算: 先腐蚀后膨胀. 用于去除比核小的前景毛刺.
pub fn opening(volume: &Volume, kernel: &Kernel) -> Volume {
    dilate(&erode(volume, kernel), kernel)
}

/// 闭运算: 先膨胀后腐蚀. 用于填补比核小的前景缝隙.
pub fn closing(volume: &Volume, kernel: &Kernel) -> Volume {
    erode(&dilate(volume, kernel), kernel)
}
