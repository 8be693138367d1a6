use std::collections::{BTreeMap, VecDeque};

use ndarray::Array2;

use super::{ComponentAnalyzer, Components, Connectivity, RegionId, RegionStats, StatsTable};
use crate::consts::gray::is_foreground;
use crate::data::MaskSlice;

/// 基于 BFS 的连通区域分析器.
///
/// 区域 id 从 `1` 开始, 按每个区域第一个像素的行优先顺序分配.
/// 因此对同一张切片多次运行的结果完全一致.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct RegionLabeler {
    connectivity: Connectivity,
}

impl RegionLabeler {
    /// 以给定连通规则创建分析器.
    #[inline]
    pub const fn new(connectivity: Connectivity) -> Self {
        Self { connectivity }
    }

    /// 连通规则.
    #[inline]
    pub const fn connectivity(&self) -> Connectivity {
        self.connectivity
    }
}

impl ComponentAnalyzer for RegionLabeler {
    fn analyze(&self, slice: &MaskSlice<'_>) -> Components {
        let mut labels = Array2::<RegionId>::zeros(slice.shape());
        let mut stats = StatsTable::new();
        let mut centroids = BTreeMap::new();
        let mut bfs_q = VecDeque::with_capacity(16);
        let mut next_id: RegionId = 1;

        for pos in slice.pos_iter() {
            if labels[pos] != 0 || !is_foreground(slice[pos]) {
                continue;
            }
            let id = next_id;
            next_id += 1;

            labels[pos] = id;
            bfs_q.push_back(pos);
            let mut this_stats = RegionStats::seed(pos);
            let (mut sum_h, mut sum_w) = (0.0f64, 0.0f64);

            // bfs. 入队时即打标签, 保证每个像素只入队一次.
            while let Some(cur) = bfs_q.pop_front() {
                this_stats.include(cur);
                sum_h += cur.0 as f64;
                sum_w += cur.1 as f64;

                for neigh in self.connectivity.neighbours(cur) {
                    if slice.get(neigh).is_some_and(|&p| is_foreground(p)) && labels[neigh] == 0 {
                        labels[neigh] = id;
                        bfs_q.push_back(neigh);
                    }
                }
            }

            let area = this_stats.area as f64;
            centroids.insert(id, (sum_w / area, sum_h / area));
            stats.insert(id, this_stats);
        }

        Components {
            count: stats.len(),
            labels,
            stats,
            centroids,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::RegionLabeler;
    use crate::data::OwnedMaskSlice;
    use crate::region::{ComponentAnalyzer, Connectivity, RegionStats};
    use ndarray::{array, Array2};

    fn diagonal() -> OwnedMaskSlice {
        OwnedMaskSlice::from_raw(array![
            [1, 0, 0, 0],
            [0, 1, 0, 0],
            [0, 0, 0, 9],
            [0, 0, 9, 9],
        ])
    }

    #[test]
    fn test_connectivity_matters() {
        let s = diagonal();
        let eight = RegionLabeler::new(Connectivity::Eight).analyze(&s.as_immut());
        let four = RegionLabeler::new(Connectivity::Four).analyze(&s.as_immut());
        assert_eq!(eight.count, 2);
        assert_eq!(four.count, 3);
        assert_eq!(RegionLabeler::default().connectivity(), Connectivity::Eight);
    }

    #[test]
    fn test_stats_and_ids() {
        let s = diagonal();
        let c = RegionLabeler::default().analyze(&s.as_immut());
        // id 按第一个像素的行优先顺序分配.
        assert_eq!(c.stats_of(1), Some(&RegionStats::new(0, 0, 2, 2, 2)));
        assert_eq!(c.stats_of(2), Some(&RegionStats::new(2, 2, 2, 2, 3)));
        assert_eq!(c.stats_of(0), None);
        assert_eq!(c.labels[(3, 2)], 2);
        assert_eq!(c.labels[(0, 1)], 0);

        let (x, y) = c.centroids[&1];
        assert!((x - 0.5).abs() < 1e-12 && (y - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_area_equals_label_count() {
        let s = OwnedMaskSlice::from_raw(array![
            [1, 1, 0, 1, 1],
            [0, 1, 0, 0, 1],
            [1, 0, 0, 1, 1],
            [1, 1, 0, 0, 0],
        ]);
        let c = RegionLabeler::new(Connectivity::Four).analyze(&s.as_immut());
        for (id, st) in c.stats.iter() {
            assert_eq!(c.labels.iter().filter(|l| **l == *id).count(), st.area);
        }
        assert_eq!(c.stats.values().map(|s| s.area).sum::<usize>(), 11);
    }

    #[test]
    fn test_empty_slice() {
        let s = OwnedMaskSlice::from_raw(Array2::zeros((3, 3)));
        let c = RegionLabeler::default().analyze(&s.as_immut());
        assert!(c.is_empty());
        assert!(c.stats.is_empty());
        assert!(c.labels.iter().all(|l| *l == 0));
    }
}
