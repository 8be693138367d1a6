//! 完整的肺部掩膜清理流程.

use log::{debug, info};

use crate::data::Volume;
use crate::error::{invalid, MaskResult};
use crate::morph::{opening, Kernel};
use crate::region::{Connectivity, RegionLabeler};

use super::{reconstruct_gaps, remove_spots_with, select_greater_regions_with};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 掩膜清理参数.
///
/// ```
/// use lung_berry::{CleanParams, Kernel};
///
/// let params = CleanParams::new()
///     .opening(Kernel::ellipse(3, 3).unwrap())
///     .spot_area(64)
///     .n_regions(2)
///     .unwrap();
/// assert_eq!(params.get_spot_area(), 64);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CleanParams {
    kernel: Option<Kernel>,
    spot_area: usize,
    n_regions: Option<usize>,
    connectivity: Connectivity,
}

impl CleanParams {
    /// 不做开运算、不去除斑点、不限制区域个数, 使用 8-邻接.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// 清理前先以 `kernel` 做开运算.
    #[inline]
    pub fn opening(mut self, kernel: Kernel) -> Self {
        self.kernel = Some(kernel);
        self
    }

    /// 去除面积严格小于 `area` 的区域.
    #[inline]
    pub fn spot_area(mut self, area: usize) -> Self {
        self.spot_area = area;
        self
    }

    /// 每张切片只保留面积最大的 `n` 个区域. `n` 必须至少为 1.
    pub fn n_regions(mut self, n: usize) -> MaskResult<Self> {
        if n == 0 {
            return Err(invalid("保留的区域个数至少为 1"));
        }
        self.n_regions = Some(n);
        Ok(self)
    }

    /// 区域分析使用的连通规则.
    #[inline]
    pub fn connectivity(mut self, connectivity: Connectivity) -> Self {
        self.connectivity = connectivity;
        self
    }

    /// 开运算使用的结构元素.
    #[inline]
    pub fn get_kernel(&self) -> Option<&Kernel> {
        self.kernel.as_ref()
    }

    /// 斑点面积阈值.
    #[inline]
    pub fn get_spot_area(&self) -> usize {
        self.spot_area
    }

    /// 每张切片保留的区域个数.
    #[inline]
    pub fn get_n_regions(&self) -> Option<usize> {
        self.n_regions
    }

    /// 连通规则.
    #[inline]
    pub fn get_connectivity(&self) -> Connectivity {
        self.connectivity
    }
}

/// 依次执行 (可选的) 开运算, 去除斑点, (可选的) 保留最大的 N 个区域, 以及空洞切片重建.
///
/// 输出为二值掩膜, 输入不会被修改.
pub fn clean_lung_mask(volume: &Volume, params: &CleanParams) -> MaskResult<Volume> {
    info!(
        "clean_lung_mask: shape = {:?}, params = {params:?}",
        volume.shape()
    );
    let analyzer = RegionLabeler::new(params.connectivity);

    let opened = match &params.kernel {
        Some(kernel) => opening(volume, kernel),
        None => volume.binarized(),
    };
    let mut mask = remove_spots_with(&opened, params.spot_area, &analyzer);
    if let Some(n) = params.n_regions {
        mask = select_greater_regions_with(&mask, n, &analyzer)?;
    }
    let mask = reconstruct_gaps(&mask);
    debug!("clean_lung_mask: {} foreground voxels", mask.foreground_count());
    Ok(mask)
}

#[cfg(test)]
mod tests {
    use super::{clean_lung_mask, CleanParams};
    use crate::consts::gray::*;
    use crate::data::Volume;
    use crate::morph::Kernel;
    use crate::region::Connectivity;
    use crate::MaskError;
    use ndarray::{s, Array3};

    fn init_log() {
        let _ = simple_logger::SimpleLogger::new().init();
    }

    /// 三张 8 * 8 切片: 两侧切片各有两块肺区和噪点, 中间切片缺失.
    fn lungs() -> Volume {
        let mut raw = Array3::<u8>::zeros((3, 8, 8));
        for z in [0, 2] {
            raw.slice_mut(s![z, 1..6, 0..3]).fill(200);
            raw.slice_mut(s![z, 1..5, 5..8]).fill(180);
            raw[(z, 7, 4)] = 90;
        }
        raw[(0, 7, 0)] = 1;
        Volume::from_array(raw).unwrap()
    }

    #[test]
    fn test_pipeline() {
        init_log();
        let v = lungs();
        let params = CleanParams::new().spot_area(4).n_regions(2).unwrap();
        let out = clean_lung_mask(&v, &params).unwrap();

        assert!(out.is_binary());
        assert_eq!(out[(0, 7, 4)], BACKGROUND);
        assert_eq!(out[(0, 7, 0)], BACKGROUND);
        // 中间切片被补回, 与两侧切片完全一致.
        assert_eq!(out.slice_at(1).count(FOREGROUND), 15 + 12);
        assert_eq!(
            out.slice_at(0).as_row_major_vec(),
            out.slice_at(1).as_row_major_vec()
        );
    }

    #[test]
    fn test_single_region_kept() {
        init_log();
        let v = lungs();
        let params = CleanParams::new()
            .connectivity(Connectivity::Four)
            .n_regions(1)
            .unwrap();
        let out = clean_lung_mask(&v, &params).unwrap();
        assert_eq!(out.slice_at(0).count(FOREGROUND), 15);
        assert_eq!(out[(2, 2, 6)], BACKGROUND);
    }

    #[test]
    fn test_opening_removes_thin_noise() {
        init_log();
        let v = lungs();
        let params = CleanParams::new().opening(Kernel::rect(3, 3).unwrap());
        let out = clean_lung_mask(&v, &params).unwrap();
        assert_eq!(out[(0, 7, 4)], BACKGROUND);
        assert_eq!(out[(0, 3, 1)], FOREGROUND);
        assert_eq!(out.slice_at(0).count(FOREGROUND), 15 + 12);
    }

    #[test]
    fn test_invalid_params() {
        assert!(matches!(
            CleanParams::new().n_regions(0),
            Err(MaskError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_default_is_binarize_and_fill() {
        let v = lungs();
        let out = clean_lung_mask(&v, &CleanParams::default()).unwrap();
        assert_eq!(out.slice_at(1).foreground_count(), 15 + 12 + 1);
        assert_eq!(out[(0, 7, 0)], FOREGROUND);
        assert_eq!(out[(2, 7, 0)], BACKGROUND);
    }
}
