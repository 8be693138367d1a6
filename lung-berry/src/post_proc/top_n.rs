//! 保留每张切片中面积最大的 N 个连通区域.

use std::collections::HashSet;

use binary_heap_plus::BinaryHeap;
use log::{debug, trace};

use crate::data::Volume;
use crate::error::{invalid, MaskResult};
use crate::region::{ComponentAnalyzer, RegionId, RegionLabeler, StatsTable};

/// 以默认的 8-邻接分析器逐切片保留面积最大的 `n_reg` 个区域.
///
/// 详见 [`select_greater_regions_with`].
#[inline]
pub fn select_greater_regions(volume: &Volume, n_reg: usize) -> MaskResult<Volume> {
    select_greater_regions_with(volume, n_reg, &RegionLabeler::default())
}

/// 逐切片保留面积最大的 `n_reg` 个区域.
///
/// 若切片的区域个数不少于 `n_reg`, 恰好保留面积最大的 `n_reg` 个区域并写为前景,
/// 其余像素写为背景; 否则整张切片清空为背景.
///
/// 面积相同时区域 id 较小者优先, 即按行优先顺序先出现的区域优先.
///
/// # 错误
///
/// `n_reg == 0` 时返回 [`InvalidParameter`](crate::MaskError::InvalidParameter).
pub fn select_greater_regions_with<A>(
    volume: &Volume,
    n_reg: usize,
    analyzer: &A,
) -> MaskResult<Volume>
where
    A: ComponentAnalyzer + Sync,
{
    if n_reg == 0 {
        return Err(invalid("保留的区域个数 `n_reg` 至少为 1"));
    }
    debug!(
        "select_greater_regions: shape = {:?}, n_reg = {n_reg}",
        volume.shape()
    );

    let mut out = volume.clone();
    out.for_each_indexed_slice_mut(|z, mut dst| {
        let comps = analyzer.analyze(&volume.slice_at(z));
        if comps.count < n_reg {
            trace!("slice {z}: only {} regions, cleared", comps.count);
            dst.clear();
            return;
        }
        let keep = greatest_ids(&comps.stats, n_reg);
        let kept = dst.retain_regions(comps.labels.view(), |id| keep.contains(&id));
        trace!("slice {z}: kept regions {keep:?}, {kept} pixels");
    });
    Ok(out)
}

/// 按面积降序 (面积相同时 id 升序) 选出前 `n` 个区域的 id.
fn greatest_ids(stats: &StatsTable, n: usize) -> HashSet<RegionId> {
    // 堆顶为当前候选中最差的区域: 面积最小, 面积相同时 id 最大.
    let mut heap: BinaryHeap<(RegionId, usize), _> = BinaryHeap::new_by(
        |a: &(RegionId, usize), b: &(RegionId, usize)| b.1.cmp(&a.1).then(a.0.cmp(&b.0)),
    );
    heap.reserve(n + 1);

    for (&id, s) in stats.iter() {
        heap.push((id, s.area));
        if heap.len() > n {
            heap.pop();
        }
    }
    heap.into_vec().into_iter().map(|(id, _)| id).collect()
}
