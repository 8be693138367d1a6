//! 单张切片上的连通区域分析.
//!
//! 区域分析器 ([`ComponentAnalyzer`]) 每次调用都会重新生成标签图和统计表,
//! 二者只在一次过滤决策中使用, 之后即被丢弃. 区域 id 只在同一张切片内有意义.

mod labeler;
mod roi;

use std::collections::BTreeMap;

use either::Either;
use ndarray::Array2;

use crate::data::MaskSlice;
use crate::Idx2d;

pub use labeler::RegionLabeler;
pub use roi::{find_roi, slice_rois, Roi};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 区域 id. `0` 专属于背景.
pub type RegionId = u32;

/// 背景的区域 id.
pub const BACKGROUND_ID: RegionId = 0;

/// 区域 id 到区域统计信息的映射. 背景 (`0`) 永远不是它的键.
///
/// 以 `BTreeMap` 保存, 因此总是按区域 id 升序迭代.
pub type StatsTable = BTreeMap<RegionId, RegionStats>;

/// 单个连通区域的统计信息.
///
/// `left`, `top`, `width`, `height` 描述了轴对齐的外接矩形, `area` 为区域像素个数.
/// 坐标约定与图像一致: `left` 沿宽度 (列) 方向, `top` 沿高度 (行) 方向.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RegionStats {
    /// 外接矩形最左列.
    pub left: usize,
    /// 外接矩形最上行.
    pub top: usize,
    /// 外接矩形宽度.
    pub width: usize,
    /// 外接矩形高度.
    pub height: usize,
    /// 区域像素个数.
    pub area: usize,
}

impl RegionStats {
    /// 直接构造.
    #[inline]
    pub const fn new(left: usize, top: usize, width: usize, height: usize, area: usize) -> Self {
        Self {
            left,
            top,
            width,
            height,
            area,
        }
    }

    /// 以 `(h, w)` 为起点的空统计, 尚未包含任何像素.
    #[inline]
    pub(crate) const fn seed((h, w): Idx2d) -> Self {
        Self::new(w, h, 0, 0, 0)
    }

    /// 外接矩形右边界 (不包含).
    #[inline]
    pub const fn right(&self) -> usize {
        self.left + self.width
    }

    /// 外接矩形下边界 (不包含).
    #[inline]
    pub const fn bottom(&self) -> usize {
        self.top + self.height
    }

    /// 将像素 `(h, w)` 并入该区域.
    pub(crate) fn include(&mut self, (h, w): Idx2d) {
        let right = self.right().max(w + 1);
        let bottom = self.bottom().max(h + 1);
        self.left = self.left.min(w);
        self.top = self.top.min(h);
        self.width = right - self.left;
        self.height = bottom - self.top;
        self.area += 1;
    }
}

/// 一次连通区域分析的全部结果.
#[derive(Clone, Debug)]
pub struct Components {
    /// 前景区域个数 (不含背景).
    pub count: usize,

    /// 标签图, 形状与切片相同. `0` 为背景.
    pub labels: Array2<RegionId>,

    /// 区域统计表.
    pub stats: StatsTable,

    /// 区域质心, 以 `(x, y)` 即 `(宽, 高)` 方向的浮点坐标表示.
    pub centroids: BTreeMap<RegionId, (f64, f64)>,
}

impl Components {
    /// 切片上是否没有任何前景区域?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// 获得区域 `id` 的统计信息.
    #[inline]
    pub fn stats_of(&self, id: RegionId) -> Option<&RegionStats> {
        self.stats.get(&id)
    }
}

/// 连通区域分析器.
///
/// 实现者必须保证:
///
/// 1. 区域 id `0` 专属于背景, 前景区域的 id 互不相同;
/// 2. 统计表中每个区域的 `area` 精确等于标签图中该 id 的像素个数;
/// 3. `left/top/width/height` 是该区域的轴对齐外接矩形.
pub trait ComponentAnalyzer {
    /// 分析一张切片. 任何非零像素都视为前景.
    fn analyze(&self, slice: &MaskSlice<'_>) -> Components;
}

/// 像素连通规则.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Connectivity {
    /// 4-邻接 (上下左右).
    Four,

    /// 8-邻接 (含对角).
    #[default]
    Eight,
}

impl Connectivity {
    /// 获得 `pos` 在该连通规则下的邻居索引. 不检查越界;
    /// 越过上/左边界的索引会回绕成极大值, 由调用方的越界检查过滤.
    #[inline]
    pub fn neighbours(self, pos: Idx2d) -> impl Iterator<Item = Idx2d> {
        match self {
            Connectivity::Four => Either::Left(neighbour4(pos).into_iter()),
            Connectivity::Eight => Either::Right(neighbour8(pos).into_iter()),
        }
    }
}

/// 获得 `(h, w)` 的 4-邻居索引. 不检查越界.
#[inline]
pub(crate) fn neighbour4((h, w): Idx2d) -> [Idx2d; 4] {
    [
        (h.wrapping_sub(1), w),
        (h.saturating_add(1), w),
        (h, w.wrapping_sub(1)),
        (h, w.saturating_add(1)),
    ]
}

/// 获得 `(h, w)` 的 8-邻居索引. 不检查越界.
#[inline]
pub(crate) fn neighbour8((h, w): Idx2d) -> [Idx2d; 8] {
    [
        (h.wrapping_sub(1), w.wrapping_sub(1)),
        (h.wrapping_sub(1), w),
        (h.wrapping_sub(1), w.saturating_add(1)),
        (h, w.wrapping_sub(1)),
        (h, w.saturating_add(1)),
        (h.saturating_add(1), w.wrapping_sub(1)),
        (h.saturating_add(1), w),
        (h.saturating_add(1), w.saturating_add(1)),
    ]
}
