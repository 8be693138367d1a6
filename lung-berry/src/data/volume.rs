use std::ops::{Index, IndexMut};

use ndarray::{Array2, Array3, ArrayView, ArrayView2, ArrayViewMut, Axis, Ix3};

use crate::consts::gray::*;
use crate::error::{invalid, MaskError, MaskResult};
use crate::Idx3d;

use super::slice::{MaskSlice, MaskSliceMut};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 8-bit 灰度 CT 切片堆栈, 或其二值掩膜. 数据以 `(z, h, w)` 格式保存,
/// 第 0 维的顺序即空间上相邻切片的顺序.
///
/// 所有切片共享同一形状, 且体数据非空. 这两点由构造函数保证,
/// 反序列化同样经过 [`Volume::from_array`] 校验.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "Array3<u8>", into = "Array3<u8>"))]
pub struct Volume {
    data: Array3<u8>,
}

impl Index<Idx3d> for Volume {
    type Output = u8;

    #[inline]
    fn index(&self, index: Idx3d) -> &Self::Output {
        &self.data[index]
    }
}

impl IndexMut<Idx3d> for Volume {
    #[inline]
    fn index_mut(&mut self, index: Idx3d) -> &mut Self::Output {
        &mut self.data[index]
    }
}

impl TryFrom<Array3<u8>> for Volume {
    type Error = MaskError;

    #[inline]
    fn try_from(value: Array3<u8>) -> Result<Self, Self::Error> {
        Self::from_array(value)
    }
}

impl From<Volume> for Array3<u8> {
    #[inline]
    fn from(value: Volume) -> Self {
        value.into_raw()
    }
}

impl Volume {
    /// 由 `(z, h, w)` 格式的裸数据构建体数据.
    ///
    /// 任一维度为 0 时返回 [`MaskError::EmptyVolume`].
    pub fn from_array(data: Array3<u8>) -> MaskResult<Self> {
        let (z, h, w) = data.dim();
        if z == 0 || h == 0 || w == 0 {
            return Err(MaskError::EmptyVolume);
        }
        let data = if data.is_standard_layout() {
            data
        } else {
            data.as_standard_layout().to_owned()
        };
        debug_assert!(data.is_standard_layout());
        Ok(Self { data })
    }

    /// 由行优先的裸数据构建体数据.
    pub fn from_shape_vec(shape: Idx3d, raw: Vec<u8>) -> MaskResult<Self> {
        let (z, h, w) = shape;
        if raw.len() != z * h * w {
            return Err(invalid(format!(
                "数据长度 {} 与形状 {shape:?} 不符",
                raw.len()
            )));
        }
        let data = Array3::from_shape_vec(shape, raw).map_err(|e| invalid(e.to_string()))?;
        Self::from_array(data)
    }

    /// 将按空间顺序排列的二维切片堆叠为体数据.
    ///
    /// 如果切片之间形状不一致, 返回 [`MaskError::SliceShapeMismatch`];
    /// 如果没有切片, 返回 [`MaskError::EmptyVolume`].
    pub fn from_slices<I: IntoIterator<Item = Array2<u8>>>(slices: I) -> MaskResult<Self> {
        let slices: Vec<Array2<u8>> = slices.into_iter().collect();
        let Some(first) = slices.first() else {
            return Err(MaskError::EmptyVolume);
        };
        let expected = first.dim();
        if let Some((i, s)) = slices.iter().enumerate().find(|(_, s)| s.dim() != expected) {
            return Err(MaskError::SliceShapeMismatch(expected, i, s.dim()));
        }
        let views: Vec<ArrayView2<u8>> = slices.iter().map(|s| s.view()).collect();
        let data = ndarray::stack(Axis(0), &views).map_err(|e| invalid(e.to_string()))?;
        Self::from_array(data)
    }

    /// 创建一个形状为 `shape` 的全背景体数据.
    #[inline]
    pub fn background(shape: Idx3d) -> MaskResult<Self> {
        Self::from_array(Array3::from_elem(shape, BACKGROUND))
    }

    /// 获取数据形状大小 `(z, h, w)`.
    #[inline]
    pub fn shape(&self) -> Idx3d {
        self.data.dim()
    }

    /// 获取 z 空间的第 `z_index` 层切片视图.
    ///
    /// 当 `z_index` 越界时 panic.
    #[inline]
    pub fn slice_at(&self, z_index: usize) -> MaskSlice<'_> {
        MaskSlice::new(self.data.index_axis(Axis(0), z_index))
    }

    /// 获取能按升序迭代水平不可变切片的迭代器.
    #[inline]
    pub fn slice_iter(&self) -> impl ExactSizeIterator<Item = MaskSlice> {
        self.data.axis_iter(Axis(0)).map(MaskSlice::new)
    }

    /// 获取能按升序迭代水平可变切片的迭代器.
    #[inline]
    pub fn slice_iter_mut(&mut self) -> impl ExactSizeIterator<Item = MaskSliceMut> {
        self.data.axis_iter_mut(Axis(0)).map(MaskSliceMut::new)
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView<'_, u8, Ix3> {
        self.data.view()
    }

    /// 获得数据的一份可变 shallow copy.
    #[inline]
    pub fn data_mut(&mut self) -> ArrayViewMut<'_, u8, Ix3> {
        self.data.view_mut()
    }

    /// 直接获得底层数据.
    #[inline]
    pub fn into_raw(self) -> Array3<u8> {
        self.data
    }

    /// 获取体数据中值为 `value` 的体素个数.
    #[inline]
    pub fn count(&self, value: u8) -> usize {
        self.data.iter().filter(|p| **p == value).count()
    }

    /// 获取体数据中前景 (非零) 体素个数.
    #[inline]
    pub fn foreground_count(&self) -> usize {
        self.data.iter().filter(|p| is_foreground(**p)).count()
    }

    /// 体数据是否只包含 [`BACKGROUND`] 和 [`FOREGROUND`] 两种值.
    #[inline]
    pub fn is_binary(&self) -> bool {
        self.data
            .iter()
            .all(|p| matches!(*p, BACKGROUND | FOREGROUND))
    }

    /// 将所有非零体素规范化为 [`FOREGROUND`], 返回新的体数据.
    #[inline]
    pub fn binarized(&self) -> Volume {
        Self {
            data: self.data.mapv(binarize),
        }
    }

    /// 对每个水平可变切片实施 `op` 操作, 同时携带 z 方向索引信息.
    ///
    /// 开启 `rayon` feature 时切片之间并行执行, 否则按升序依次执行.
    /// 两种方式结果一致.
    pub fn for_each_indexed_slice_mut<F>(&mut self, op: F)
    where
        F: Fn(usize, MaskSliceMut) + Sync + Send,
    {
        cfg_if::cfg_if! {
            if #[cfg(feature = "rayon")] {
                self.par_for_each_indexed_slice_mut(op);
            } else {
                self.slice_iter_mut()
                    .enumerate()
                    .for_each(|(i, s)| op(i, s));
            }
        }
    }

    /// 对每个水平切片求值 `op`, 按切片顺序收集结果.
    ///
    /// 开启 `rayon` feature 时切片之间并行执行.
    pub fn map_slices<T, F>(&self, op: F) -> Vec<T>
    where
        T: Send,
        F: Fn(MaskSlice) -> T + Sync + Send,
    {
        cfg_if::cfg_if! {
            if #[cfg(feature = "rayon")] {
                self.par_map_slices(op)
            } else {
                self.slice_iter().map(op).collect()
            }
        }
    }
}

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use rayon::iter::{IndexedParallelIterator, IntoParallelIterator, ParallelIterator};
    }
}

/// 并发操作部分
#[cfg(feature = "rayon")]
impl Volume {
    /// 借助 `rayon`, 并行地对每个水平可变切片实施 `op` 操作.
    /// 该操作会同时携带 z 方向索引信息.
    pub fn par_for_each_indexed_slice_mut<F>(&mut self, op: F)
    where
        F: Fn(usize, MaskSliceMut) + Sync + Send,
    {
        self.data
            .axis_iter_mut(Axis(0))
            .into_par_iter()
            .enumerate()
            .for_each(|(i, v)| op(i, MaskSliceMut::new(v)));
    }

    /// 借助 `rayon`, 并行地对每个水平切片求值 `op`, 按切片顺序收集结果.
    pub fn par_map_slices<T, F>(&self, op: F) -> Vec<T>
    where
        T: Send,
        F: Fn(MaskSlice) -> T + Sync + Send,
    {
        self.data
            .axis_iter(Axis(0))
            .into_par_iter()
            .map(|v| op(MaskSlice::new(v)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::Volume;
    use crate::consts::gray::*;
    use crate::MaskError;
    use ndarray::{array, Array2, Array3};

    #[test]
    fn test_empty_volume_rejected() {
        assert_eq!(
            Volume::from_array(Array3::zeros((0, 4, 4))),
            Err(MaskError::EmptyVolume)
        );
        assert_eq!(
            Volume::from_slices(Vec::<Array2<u8>>::new()),
            Err(MaskError::EmptyVolume)
        );
    }

    #[test]
    fn test_from_slices_shape_mismatch() {
        let err = Volume::from_slices([Array2::zeros((2, 2)), Array2::zeros((2, 3))]).unwrap_err();
        assert_eq!(err, MaskError::SliceShapeMismatch((2, 2), 1, (2, 3)));
    }

    #[test]
    fn test_from_slices_keeps_order() {
        let v = Volume::from_slices([array![[1, 0]], array![[0, 2]], array![[3, 3]]]).unwrap();
        assert_eq!(v.shape(), (3, 1, 2));
        assert_eq!(v[(1, 0, 1)], 2);
        assert_eq!(v.slice_at(2).count(3), 2);
    }

    #[test]
    fn test_from_shape_vec_len_mismatch() {
        assert!(matches!(
            Volume::from_shape_vec((1, 2, 2), vec![0; 3]),
            Err(MaskError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_binarized() {
        let v = Volume::from_shape_vec((1, 2, 2), vec![0, 1, 200, 255]).unwrap();
        assert!(!v.is_binary());
        let b = v.binarized();
        assert!(b.is_binary());
        assert_eq!(b.count(FOREGROUND), 3);
        assert_eq!(b.foreground_count(), v.foreground_count());
    }

    #[test]
    fn test_for_each_indexed_slice_mut() {
        let mut v = Volume::background((4, 2, 2)).unwrap();
        v.for_each_indexed_slice_mut(|i, mut s| s.fill(i as u8));
        let counts = v.map_slices(|s| s.count(s[(0, 0)]));
        assert_eq!(counts, vec![4; 4]);
        assert_eq!(v[(3, 1, 1)], 3);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_validates() {
        let v = Volume::from_shape_vec((1, 2, 2), vec![0, 255, 255, 0]).unwrap();
        let json = serde_json::to_string(&v).unwrap();
        let back: Volume = serde_json::from_str(&json).unwrap();
        assert_eq!(back, v);

        let empty = serde_json::to_string(&Array3::<u8>::zeros((0, 3, 3))).unwrap();
        assert!(serde_json::from_str::<Volume>(&empty).is_err());
    }
}
