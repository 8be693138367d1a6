//! 位平面分解与重组.
//!
//! 8-bit 体素的第 `b` 位 (`1` 为最低位) 构成一个位平面. 仅选取部分位平面重组,
//! 可以得到只依赖于指定有效位的灰度图, 例如只保留粗粒度的强度结构.

use itertools::Itertools;
use log::debug;
use ndarray::{Array4, ArrayViewMut3, Axis, Zip};

use crate::consts::BIT_PLANES;
use crate::data::Volume;
use crate::error::{invalid, MaskResult};

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use rayon::iter::{IndexedParallelIterator, IntoParallelIterator, ParallelIterator};
    }
}

/// 将体数据分解为 8 个位平面, 返回形状为 `(8, z, h, w)` 的 0/1 数组.
///
/// 第 0 个平面为最高位, 第 7 个平面为最低位.
pub fn to_bits(volume: &Volume) -> Array4<u8> {
    let (z, h, w) = volume.shape();
    let mut planes = Array4::<u8>::zeros((BIT_PLANES, z, h, w));
    let src = volume.data();

    let fill = |p: usize, mut plane: ArrayViewMut3<u8>| {
        let shift = BIT_PLANES - 1 - p;
        Zip::from(&mut plane)
            .and(src)
            .for_each(|b, &v| *b = (v >> shift) & 1);
    };

    cfg_if::cfg_if! {
        if #[cfg(feature = "rayon")] {
            planes
                .axis_iter_mut(Axis(0))
                .into_par_iter()
                .enumerate()
                .for_each(|(p, plane)| fill(p, plane));
        } else {
            planes
                .axis_iter_mut(Axis(0))
                .enumerate()
                .for_each(|(p, plane)| fill(p, plane));
        }
    }
    planes
}

/// 只使用 `bits` 指定的位平面重组体数据.
///
/// `bits` 中的每个值 `b` 取 `1..=8`, `1` 为最低位. 对每个 `b`,
/// 取第 `8 - b` 个位平面 (见 [`to_bits`]), 乘以权重 `2^(b - 1)` 后逐体素累加.
///
/// # 错误
///
/// `bits` 为空, 存在 `1..=8` 以外的值, 或存在重复值时返回
/// [`InvalidParameter`](crate::MaskError::InvalidParameter).
///
/// ```
/// use lung_berry::{bit_plane_slices, Volume};
///
/// let v = Volume::from_shape_vec((1, 1, 3), vec![0b1010_0110, 0xff, 3]).unwrap();
/// let out = bit_plane_slices(&v, &[8, 2]).unwrap();
/// assert_eq!(out.into_raw().into_raw_vec(), vec![0b1000_0010, 0b1000_0010, 2]);
/// ```
pub fn bit_plane_slices(volume: &Volume, bits: &[u8]) -> MaskResult<Volume> {
    if bits.is_empty() {
        return Err(invalid("至少需要选择一个位平面"));
    }
    if let Some(b) = bits.iter().find(|&&b| !(1..=BIT_PLANES as u8).contains(&b)) {
        return Err(invalid(format!("位平面 {b} 不在 1..=8 内")));
    }
    if !bits.iter().all_unique() {
        return Err(invalid(format!("位平面 {bits:?} 存在重复")));
    }
    debug!("bit_plane_slices: shape = {:?}, bits = {bits:?}", volume.shape());

    let planes = to_bits(volume);
    let mut out = volume.clone();
    out.data_mut().fill(0);
    for &b in bits {
        let plane = planes.index_axis(Axis(0), BIT_PLANES - b as usize);
        let weight = 1u8 << (b - 1);
        Zip::from(out.data_mut())
            .and(&plane)
            .for_each(|o, &p| *o += p * weight);
    }
    Ok(out)
}
