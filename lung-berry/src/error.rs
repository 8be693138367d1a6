//! 运行时错误.

use crate::Idx2d;
use thiserror::Error;

/// 掩膜后处理的运行时错误.
///
/// 参数校验失败会在调用入口处立即报告并中止本次调用.
/// 单张切片上的边界情况 (没有区域, 区域数不足) 由置零策略处理, 不会产生错误.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MaskError {
    /// 切片形状不一致. 第一个参数是期望的形状, 第二个参数是出问题的切片索引及其形状.
    #[error("第 {1} 张切片形状为 {2:?}, 与期望的 {0:?} 不符")]
    SliceShapeMismatch(Idx2d, usize, Idx2d),

    /// 体数据为空 (没有切片, 或切片面积为 0).
    #[error("体数据为空")]
    EmptyVolume,

    /// 参数不合法.
    #[error("参数不合法: {0}")]
    InvalidParameter(String),
}

/// 掩膜后处理运行时结果.
pub type MaskResult<T> = Result<T, MaskError>;

/// 构造一个 [`MaskError::InvalidParameter`].
#[inline]
pub(crate) fn invalid<S: Into<String>>(reason: S) -> MaskError {
    MaskError::InvalidParameter(reason.into())
}
