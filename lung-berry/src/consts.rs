//! 通用常量.

/// 单通道颜色.
pub mod gray {
    /// 掩膜中背景的像素值.
    pub const BACKGROUND: u8 = 0;

    /// 掩膜中前景 (肺部) 的像素值. 所有输出掩膜均使用该值表示前景.
    pub const FOREGROUND: u8 = 255;

    /// 像素是否是前景? 任何非零值都视为前景.
    #[inline]
    pub const fn is_foreground(p: u8) -> bool {
        p != BACKGROUND
    }

    /// 像素是否是背景?
    #[inline]
    pub const fn is_background(p: u8) -> bool {
        matches!(p, BACKGROUND)
    }

    /// 将任意像素值规范化为 `{BACKGROUND, FOREGROUND}`.
    #[inline]
    pub const fn binarize(p: u8) -> u8 {
        if is_foreground(p) {
            FOREGROUND
        } else {
            BACKGROUND
        }
    }
}

/// 一个 8-bit 体素拥有的位平面个数.
pub const BIT_PLANES: usize = 8;

/// 体素聚类默认的最大 Lloyd 迭代次数.
pub const DEFAULT_MAX_ITER: usize = 300;

/// 单次体素聚类允许的最大类别数. 标签以 `u8` 保存.
pub const MAX_CLUSTERS: usize = u8::MAX as usize + 1;
