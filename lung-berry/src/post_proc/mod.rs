//! 掩膜后处理流程集合.
//!
//! 原始 (或二值) 体数据 → 去除斑点 / 保留最大的 N 个区域 → 空洞切片重建 → 最终掩膜.

mod clean;
mod gap;
mod spots;
mod top_n;

use ndarray::{ArrayView2, Zip};

use crate::consts::gray::*;
use crate::data::MaskSliceMut;
use crate::region::{RegionId, BACKGROUND_ID};

pub use clean::{clean_lung_mask, CleanParams};
pub use gap::reconstruct_gaps;
pub use spots::{remove_spots, remove_spots_with};
pub use top_n::{select_greater_regions, select_greater_regions_with};

/// 切片级过滤实现块.
impl<'a> MaskSliceMut<'a> {
    /// 依据标签图 `labels` 重写切片: 满足 `keep` 的区域写为 [`FOREGROUND`],
    /// 其余像素 (包括背景) 写为 [`BACKGROUND`].
    ///
    /// 返回保留下来的像素个数.
    pub(crate) fn retain_regions<F>(&mut self, labels: ArrayView2<RegionId>, keep: F) -> usize
    where
        F: Fn(RegionId) -> bool,
    {
        debug_assert_eq!(self.shape(), labels.dim());
        let mut kept = 0usize;
        Zip::from(self.array_view_mut())
            .and(&labels)
            .for_each(|p, &id| {
                if id != BACKGROUND_ID && keep(id) {
                    *p = FOREGROUND;
                    kept += 1;
                } else {
                    *p = BACKGROUND;
                }
            });
        kept
    }
}
