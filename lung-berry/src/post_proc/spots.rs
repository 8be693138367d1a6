//! 去除小面积斑点.

use log::{debug, trace};

use crate::data::Volume;
use crate::region::{ComponentAnalyzer, RegionLabeler};

/// 以默认的 8-邻接分析器逐切片去除面积严格小于 `area` 的连通区域.
///
/// 详见 [`remove_spots_with`].
#[inline]
pub fn remove_spots(volume: &Volume, area: usize) -> Volume {
    remove_spots_with(volume, area, &RegionLabeler::default())
}

/// 逐切片去除面积严格小于 `area` 的连通区域.
///
/// 每张切片独立处理: 面积小于 `area` 的区域被置为背景, 保留下来的区域统一写为
/// [`FOREGROUND`](crate::consts::gray::FOREGROUND). 只依据面积判断, 不考虑形状.
/// 没有任何区域的切片原样返回为全背景. `area == 0` 时不去除任何区域,
/// 结果即输入的二值化. 面积阈值没有非法取值, 因此该操作不会失败.
///
/// 输入不会被修改.
pub fn remove_spots_with<A>(volume: &Volume, area: usize, analyzer: &A) -> Volume
where
    A: ComponentAnalyzer + Sync,
{
    debug!(
        "remove_spots: shape = {:?}, area threshold = {area}",
        volume.shape()
    );
    let mut out = volume.clone();
    out.for_each_indexed_slice_mut(|z, mut dst| {
        let comps = analyzer.analyze(&volume.slice_at(z));
        let kept = dst.retain_regions(comps.labels.view(), |id| {
            comps.stats_of(id).is_some_and(|s| s.area >= area)
        });
        trace!("slice {z}: {} regions, {kept} pixels kept", comps.count);
    });
    out
}
