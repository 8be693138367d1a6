//! 基于强度的体素聚类.
//!
//! 对体素灰度做一维 k-means: 由调用方给出初始中心 (种子), 随后进行有限次
//! Lloyd 迭代. 迭代次数为 0 时, 结果即为到给定种子的最近邻划分.
//!
//! 一维情况下相同取值的体素总是落入同一类, 因此迭代在灰度直方图上进行,
//! 代价与体素个数无关.

use std::collections::BTreeMap;

use itertools::Itertools;
use log::{debug, trace};
use ndarray::{Array, ArrayBase, Data, Dimension};
use num::ToPrimitive;
use ordered_float::NotNan;

use crate::consts::{DEFAULT_MAX_ITER, MAX_CLUSTERS};
use crate::error::{invalid, MaskResult};

/// 以给定种子初始化的一维 k-means.
///
/// ```
/// use lung_berry::KMeans1d;
///
/// let fitted = KMeans1d::new(&[0.0, 255.0])
///     .unwrap()
///     .max_iter(0)
///     .fit([10.0, 127.0, 128.0, 250.0])
///     .unwrap();
/// assert_eq!(fitted.predict(127.0), 0);
/// assert_eq!(fitted.predict(128.0), 1);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct KMeans1d {
    seeds: Vec<f64>,
    max_iter: usize,
}

impl KMeans1d {
    /// 以种子 `seeds` 创建聚类器. 类别个数 `K` 即种子个数.
    ///
    /// `K` 必须在 `1..=256` 内, 且每个种子都是有限值.
    pub fn new(seeds: &[f64]) -> MaskResult<Self> {
        if seeds.is_empty() || seeds.len() > MAX_CLUSTERS {
            return Err(invalid(format!(
                "类别个数 {} 不在 1..={MAX_CLUSTERS} 内",
                seeds.len()
            )));
        }
        if let Some(c) = seeds.iter().find(|c| !c.is_finite()) {
            return Err(invalid(format!("种子 {c} 不是有限值")));
        }
        Ok(Self {
            seeds: seeds.to_vec(),
            max_iter: DEFAULT_MAX_ITER,
        })
    }

    /// 设置最大 Lloyd 迭代次数. `0` 表示不迭代, 直接使用种子.
    #[inline]
    pub fn max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// 种子.
    #[inline]
    pub fn seeds(&self) -> &[f64] {
        &self.seeds
    }

    /// 在 `points` 上拟合.
    ///
    /// 每轮迭代把每个点划分到最近的中心 (距离相同时取编号较小者),
    /// 再把中心更新为所属点的均值. 没有任何点的类别保持原中心不变.
    /// 中心不再变化, 或达到最大迭代次数时停止.
    ///
    /// 任何点不是有限值时返回 [`InvalidParameter`](crate::MaskError::InvalidParameter).
    pub fn fit<I: IntoIterator<Item = f64>>(&self, points: I) -> MaskResult<Fitted> {
        let hist = histogram(points)?;
        let mut centroids = self.seeds.clone();
        let mut iterations = 0;

        while iterations < self.max_iter {
            let mut sums = vec![(0.0f64, 0usize); centroids.len()];
            for (&v, &cnt) in hist.iter() {
                let v = v.into_inner();
                let (sum, n) = &mut sums[nearest(&centroids, v)];
                *sum += v * cnt as f64;
                *n += cnt;
            }
            let updated = sums
                .iter()
                .zip(centroids.iter())
                .map(|(&(sum, n), &c)| if n == 0 { c } else { sum / n as f64 })
                .collect_vec();
            iterations += 1;
            trace!("k-means iteration {iterations}: {updated:?}");

            if updated == centroids {
                break;
            }
            centroids = updated;
        }

        debug!(
            "k-means: {} distinct values, {iterations} iterations, centroids = {centroids:?}",
            hist.len()
        );
        Ok(Fitted {
            centroids,
            iterations,
        })
    }
}

/// 拟合结果.
#[derive(Clone, Debug, PartialEq)]
pub struct Fitted {
    centroids: Vec<f64>,
    iterations: usize,
}

impl Fitted {
    /// 最终的聚类中心, 与种子一一对应.
    #[inline]
    pub fn centroids(&self) -> &[f64] {
        &self.centroids
    }

    /// 实际执行的迭代次数.
    #[inline]
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// 返回距 `x` 最近的中心编号. 距离相同时取编号较小者.
    #[inline]
    pub fn predict(&self, x: f64) -> u8 {
        // 构造时已保证 K <= 256.
        nearest(&self.centroids, x) as u8
    }
}

/// 最近中心的编号. 并列时返回第一个.
fn nearest(centroids: &[f64], x: f64) -> usize {
    centroids
        .iter()
        .position_min_by(|a, b| (*a - x).abs().total_cmp(&(*b - x).abs()))
        .unwrap_or(0)
}

/// 统计每个取值出现的次数.
fn histogram<I: IntoIterator<Item = f64>>(points: I) -> MaskResult<BTreeMap<NotNan<f64>, usize>> {
    let mut hist = BTreeMap::new();
    for p in points {
        if !p.is_finite() {
            return Err(invalid(format!("体素值 {p} 不是有限值")));
        }
        let key = NotNan::new(p).map_err(|e| invalid(e.to_string()))?;
        *hist.entry(key).or_insert(0) += 1;
    }
    Ok(hist)
}

/// 以 `centroids` 为种子对 `data` 中的所有体素聚类, 返回同形状的标签图.
///
/// 标签取 `0..K`, 与种子的顺序一致. `max_iter` 见 [`KMeans1d::max_iter`].
///
/// # 错误
///
/// 种子不合法 (见 [`KMeans1d::new`]), 或存在无法转换为有限 `f64` 的体素时返回
/// [`InvalidParameter`](crate::MaskError::InvalidParameter).
pub fn label_voxels<S, A, D>(
    data: &ArrayBase<S, D>,
    centroids: &[f64],
    max_iter: usize,
) -> MaskResult<Array<u8, D>>
where
    S: Data<Elem = A>,
    A: ToPrimitive,
    D: Dimension,
{
    let kmeans = KMeans1d::new(centroids)?.max_iter(max_iter);
    let values: Array<f64, D> = data.map(|v| v.to_f64().unwrap_or(f64::NAN));
    let fitted = kmeans.fit(values.iter().copied())?;
    Ok(values.mapv(|x| fitted.predict(x)))
}

#[cfg(test)]
mod tests {
    use super::{label_voxels, KMeans1d};
    use crate::data::Volume;
    use crate::MaskError;
    use ndarray::{array, Array1, Array3};

    #[test]
    fn test_zero_iter_split_at_midpoint() {
        let raw = Array3::from_shape_fn((2, 8, 16), |(z, h, w)| (z * 128 + h * 16 + w) as u8);
        let v = Volume::from_array(raw).unwrap();
        let labels = label_voxels(&v.data(), &[0.0, 255.0], 0).unwrap();
        assert_eq!(labels.dim(), v.shape());
        for (&l, &i) in labels.iter().zip(v.data().iter()) {
            assert_eq!(l, u8::from(f64::from(i) > 127.5));
        }
    }

    #[test]
    fn test_tie_goes_to_lower_label() {
        let fitted = KMeans1d::new(&[0.0, 2.0]).unwrap().max_iter(0).fit([1.0]).unwrap();
        assert_eq!(fitted.predict(1.0), 0);
        assert_eq!(fitted.iterations(), 0);
        assert_eq!(fitted.centroids(), &[0.0, 2.0]);
    }

    #[test]
    fn test_refinement_moves_centroids() {
        let points = [0.0, 1.0, 2.0, 10.0, 11.0, 12.0];
        let fitted = KMeans1d::new(&[0.0, 3.0]).unwrap().fit(points).unwrap();
        assert_eq!(fitted.centroids(), &[1.0, 11.0]);
        assert_eq!(fitted.iterations(), 3);

        let labels = label_voxels(&Array1::from_vec(points.to_vec()), &[0.0, 3.0], 300).unwrap();
        assert_eq!(labels, array![0, 0, 0, 1, 1, 1]);

        // 只迭代一次时中心停在中途.
        let fitted = KMeans1d::new(&[0.0, 3.0]).unwrap().max_iter(1).fit(points).unwrap();
        assert_eq!(fitted.centroids(), &[0.5, 8.75]);
    }

    #[test]
    fn test_empty_cluster_keeps_seed() {
        let fitted = KMeans1d::new(&[0.0, 1000.0]).unwrap().fit([1.0, 2.0, 3.0]).unwrap();
        assert_eq!(fitted.centroids(), &[2.0, 1000.0]);
    }

    #[test]
    fn test_invalid_input() {
        assert!(matches!(KMeans1d::new(&[]), Err(MaskError::InvalidParameter(_))));
        assert!(matches!(
            KMeans1d::new(&[0.0, f64::NAN]),
            Err(MaskError::InvalidParameter(_))
        ));
        assert!(KMeans1d::new(&vec![0.0; 257]).is_err());
        assert!(KMeans1d::new(&vec![0.0; 256]).is_ok());
        assert!(matches!(
            label_voxels(&array![1.0, f64::INFINITY], &[0.0], 0),
            Err(MaskError::InvalidParameter(_))
        ));
    }
}
