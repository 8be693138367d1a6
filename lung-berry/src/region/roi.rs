//! 由区域统计信息得到矩形 ROI.

use super::{ComponentAnalyzer, RegionStats, StatsTable, BACKGROUND_ID};
use crate::data::Volume;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 包围一张切片上所有前景区域的矩形 ROI, 以左上角和右下角 (不包含) 表示.
///
/// 坐标为有符号整数, 可以直接用于索引原切片: `x` 沿宽度方向, `y` 沿高度方向.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Roi {
    /// 左上角 x.
    pub x_top: i32,
    /// 左上角 y.
    pub y_top: i32,
    /// 右下角 x.
    pub x_bottom: i32,
    /// 右下角 y.
    pub y_bottom: i32,
}

impl Roi {
    /// 以 `[x_top, y_top, x_bottom, y_bottom]` 格式导出.
    #[inline]
    pub const fn as_array(&self) -> [i32; 4] {
        [self.x_top, self.y_top, self.x_bottom, self.y_bottom]
    }

    /// ROI 宽度.
    #[inline]
    pub const fn width(&self) -> i32 {
        self.x_bottom - self.x_top
    }

    /// ROI 高度.
    #[inline]
    pub const fn height(&self) -> i32 {
        self.y_bottom - self.y_top
    }

    /// 是否为空 ROI (面积为 0)?
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.width() <= 0 || self.height() <= 0
    }

    /// 扩张为同时包含 `stats` 外接矩形的最小 ROI.
    fn union(self, stats: &RegionStats) -> Self {
        let other = Self::from(stats);
        Self {
            x_top: self.x_top.min(other.x_top),
            y_top: self.y_top.min(other.y_top),
            x_bottom: self.x_bottom.max(other.x_bottom),
            y_bottom: self.y_bottom.max(other.y_bottom),
        }
    }
}

impl From<&RegionStats> for Roi {
    #[inline]
    fn from(s: &RegionStats) -> Self {
        Self {
            x_top: s.left as i32,
            y_top: s.top as i32,
            x_bottom: s.right() as i32,
            y_bottom: s.bottom() as i32,
        }
    }
}

impl From<Roi> for [i32; 4] {
    #[inline]
    fn from(r: Roi) -> Self {
        r.as_array()
    }
}

/// 由一张切片的区域统计表计算 ROI:
///
/// `x_top = min(left)`, `y_top = min(top)`,
/// `x_bottom = max(left + width)`, `y_bottom = max(top + height)`.
///
/// 背景行 (若调用方混入了 id 为 `0` 的行) 会被忽略.
/// 如果没有任何前景区域, 则返回全零 ROI 而不是报错.
pub fn find_roi(stats: &StatsTable) -> Roi {
    stats
        .iter()
        .filter(|(id, _)| **id != BACKGROUND_ID)
        .map(|(_, s)| s)
        .fold(None, |acc: Option<Roi>, s| {
            Some(match acc {
                None => Roi::from(s),
                Some(roi) => roi.union(s),
            })
        })
        .unwrap_or_default()
}

/// 对体数据的每张切片运行 `analyzer`, 逐切片计算 ROI.
pub fn slice_rois<A>(volume: &Volume, analyzer: &A) -> Vec<Roi>
where
    A: ComponentAnalyzer + Sync,
{
    volume.map_slices(|s| find_roi(&analyzer.analyze(&s).stats))
}

#[cfg(test)]
mod tests {
    use super::{find_roi, slice_rois, Roi};
    use crate::data::Volume;
    use crate::region::{RegionLabeler, RegionStats, StatsTable};

    #[test]
    fn test_single_region() {
        let table = StatsTable::from([(1, RegionStats::new(2, 3, 4, 5, 7))]);
        assert_eq!(find_roi(&table).as_array(), [2, 3, 6, 8]);
    }

    #[test]
    fn test_empty_table() {
        let roi = find_roi(&StatsTable::new());
        assert_eq!(roi.as_array(), [0, 0, 0, 0]);
        assert!(roi.is_empty());
    }

    #[test]
    fn test_background_row_ignored() {
        let table = StatsTable::from([
            (0, RegionStats::new(0, 0, 100, 100, 9000)),
            (4, RegionStats::new(10, 20, 5, 5, 25)),
            (7, RegionStats::new(30, 2, 1, 40, 40)),
        ]);
        let roi = find_roi(&table);
        assert_eq!(<[i32; 4]>::from(roi), [10, 2, 31, 42]);
        assert_eq!((roi.width(), roi.height()), (21, 40));
    }

    #[test]
    fn test_slice_rois() {
        #[rustfmt::skip]
        let v = Volume::from_shape_vec((2, 3, 4), vec![
            0, 0, 0, 0,
            0, 1, 1, 0,
            0, 0, 0, 1,

            0, 0, 0, 0,
            0, 0, 0, 0,
            0, 0, 0, 0,
        ])
        .unwrap();
        let rois = slice_rois(&v, &RegionLabeler::default());
        assert_eq!(rois, vec![
            Roi { x_top: 1, y_top: 1, x_bottom: 4, y_bottom: 3 },
            Roi::default(),
        ]);
    }
}
