#![warn(missing_docs)]
// #![warn(clippy::missing_docs_in_private_items)]  // <= too strict.

//! 核心库. 将 8-bit 灰度 CT 切片堆栈后处理为干净的二值肺部掩膜.
//!
//! 处理流程以逐切片的连通区域分析和形态学操作为基础, 再沿 z 方向重建切片间的空洞.
//! 位平面重组和体素聚类作为独立工具提供.
//!
//! 该 crate 只提供 `safe` 接口, 不进行任何 I/O.
//!
//! # 注意
//!
//! 1. 掩膜约定: 背景为 `0`, 前景为 `255`. 输入中任何非零体素均视为前景.
//! 2. 参数校验失败会返回 [`MaskError`], 而不会 panic. 单张切片上的边界情况
//!   (没有区域, 区域个数不足) 按置零策略处理.
//! 3. 开启 `rayon` feature (默认开启) 时, 逐切片操作会并行执行, 结果与串行执行完全一致.
//!
//! # 开发计划
//!
//! ### 体数据与切片视图 ✅
//!
//! 实现位于 `lung-berry/src/data`.
//!
//! ### 连通区域分析 & 外接矩形 (ROI) 提取 ✅
//!
//! 4-邻接 / 8-邻接, 区域 id 按行优先顺序分配. 统计表为显式的 `id → 统计信息` 映射.
//!
//! 实现位于 `lung-berry/src/region`.
//!
//! ### 二维形态学操作 ✅
//!
//! 腐蚀、膨胀、开运算、闭运算. 矩形、十字形、椭圆形结构元素.
//!
//! 实现位于 `lung-berry/src/morph`.
//!
//! ### 掩膜后处理 ✅
//!
//! 1. 去除小面积斑点. ✅
//! 2. 保留面积最大的 N 个区域. 面积相同时按行优先顺序先出现者优先. ✅
//! 3. 前向 / 后向累积扫描重建切片间空洞. ✅
//! 4. 组合以上步骤的完整清理流程. ✅
//!
//! 实现位于 `lung-berry/src/post_proc`.
//!
//! ### 位平面分解与重组 ✅
//!
//! 实现位于 `lung-berry/src/bits.rs`.
//!
//! ### 基于强度的体素聚类 ✅
//!
//! 以给定种子初始化的一维 k-means. 迭代次数为 0 时即为最近种子划分.
//!
//! 实现位于 `lung-berry/src/cluster`.
//!
//! ### 完善代码文档 ✅
//!
//! 给每个 public API 提供文档, 并视情况给 private
//! API 提供文档.

/// 二维索引 `(h, w)`.
pub type Idx2d = (usize, usize);

/// 三维索引 `(z, h, w)`.
pub type Idx3d = (usize, usize, usize);

/// 体数据与切片视图.
mod data;

pub use data::{MaskSlice, MaskSliceMut, OwnedMaskSlice, Volume};

mod error;

pub use error::{MaskError, MaskResult};

pub mod consts;

pub mod region;

pub use region::{find_roi, slice_rois, ComponentAnalyzer, Connectivity, RegionLabeler, Roi};

pub mod morph;

pub use morph::Kernel;

pub mod post_proc;

pub use post_proc::{clean_lung_mask, CleanParams};

pub mod bits;

pub use bits::{bit_plane_slices, to_bits};

pub mod cluster;

pub use cluster::{label_voxels, KMeans1d};

pub mod prelude;
