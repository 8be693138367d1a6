//! 形态学结构元素.

use ndarray::Array2;

use crate::error::{invalid, MaskResult};
use crate::Idx2d;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 二维二值结构元素 (核), 带有一个锚点.
///
/// 该结构是只读的, 在一次流水线调用中被所有形态学操作共享.
/// 若要修改参数, 你应该创建新的实例.
///
/// 序列化时只保存网格和锚点, 反序列化经过 [`Kernel::with_anchor`] 校验并重新计算偏移.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "KernelRepr", into = "KernelRepr"))]
pub struct Kernel {
    mask: Array2<bool>,
    anchor: Idx2d,
    /// 所有 `true` 单元相对锚点的偏移 `(dh, dw)`, 行优先.
    offsets: Vec<(isize, isize)>,
}

/// [`Kernel`] 的序列化格式.
#[cfg(feature = "serde")]
#[derive(Serialize, Deserialize)]
struct KernelRepr {
    mask: Array2<bool>,
    anchor: Idx2d,
}

#[cfg(feature = "serde")]
impl TryFrom<KernelRepr> for Kernel {
    type Error = crate::MaskError;

    #[inline]
    fn try_from(repr: KernelRepr) -> Result<Self, Self::Error> {
        Self::with_anchor(repr.mask, repr.anchor)
    }
}

#[cfg(feature = "serde")]
impl From<Kernel> for KernelRepr {
    #[inline]
    fn from(k: Kernel) -> Self {
        Self {
            mask: k.mask,
            anchor: k.anchor,
        }
    }
}

impl Kernel {
    /// 由二值网格构建核, 锚点位于中心 `(h / 2, w / 2)`.
    ///
    /// 网格为空或不含任何 `true` 单元时返回错误.
    pub fn from_array(mask: Array2<bool>) -> MaskResult<Self> {
        let (h, w) = mask.dim();
        Self::with_anchor(mask, (h / 2, w / 2))
    }

    /// 由二值网格和锚点构建核. 锚点必须位于网格内.
    pub fn with_anchor(mask: Array2<bool>, anchor: Idx2d) -> MaskResult<Self> {
        let (h, w) = mask.dim();
        if h == 0 || w == 0 {
            return Err(invalid("结构元素不能为空"));
        }
        if anchor.0 >= h || anchor.1 >= w {
            return Err(invalid(format!("锚点 {anchor:?} 超出结构元素范围 {:?}", (h, w))));
        }
        let offsets: Vec<(isize, isize)> = mask
            .indexed_iter()
            .filter_map(|((i, j), &on)| {
                on.then_some((i as isize - anchor.0 as isize, j as isize - anchor.1 as isize))
            })
            .collect();
        if offsets.is_empty() {
            return Err(invalid("结构元素至少需要一个有效单元"));
        }
        Ok(Self {
            mask,
            anchor,
            offsets,
        })
    }

    /// `h * w` 的全 1 矩形核.
    pub fn rect(h: usize, w: usize) -> MaskResult<Self> {
        Self::from_array(Array2::from_elem((h, w), true))
    }

    /// `h * w` 的十字形核: 只有锚点所在的行与列有效.
    pub fn cross(h: usize, w: usize) -> MaskResult<Self> {
        let (ch, cw) = (h / 2, w / 2);
        Self::from_array(Array2::from_shape_fn((h, w), |(i, j)| i == ch || j == cw))
    }

    /// 内切于 `h * w` 矩形的椭圆形核.
    ///
    /// 逐行计算: 第 `i` 行的有效区间以 `w / 2` 为中心,
    /// 半宽为 `round((w / 2) * sqrt(1 - (i - h / 2)^2 / (h / 2)^2))`.
    pub fn ellipse(h: usize, w: usize) -> MaskResult<Self> {
        let r = (h / 2) as f64;
        let c = (w / 2) as f64;
        let inv_r2 = if r > 0.0 { 1.0 / (r * r) } else { 0.0 };
        let mask = Array2::from_shape_fn((h, w), |(i, j)| {
            let dy = i as f64 - r;
            if dy.abs() > r {
                return false;
            }
            let dx = (c * ((r * r - dy * dy) * inv_r2).sqrt()).round();
            let lo = (c - dx).max(0.0);
            let hi = (c + dx + 1.0).min(w as f64);
            (lo..hi).contains(&(j as f64))
        });
        Self::from_array(mask)
    }

    /// 核的形状 (高, 宽).
    #[inline]
    pub fn shape(&self) -> Idx2d {
        self.mask.dim()
    }

    /// 锚点.
    #[inline]
    pub fn anchor(&self) -> Idx2d {
        self.anchor
    }

    /// 底层二值网格.
    #[inline]
    pub fn mask(&self) -> &Array2<bool> {
        &self.mask
    }

    /// 所有有效单元相对锚点的偏移 `(dh, dw)`.
    #[inline]
    pub fn offsets(&self) -> &[(isize, isize)] {
        &self.offsets
    }

    /// 有效单元个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// 核是否不含有效单元. 由构造函数保证该函数总是返回 `false`.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::Kernel;
    use ndarray::{array, Array2};

    #[test]
    fn test_invalid_kernels() {
        assert!(Kernel::rect(0, 3).is_err());
        assert!(Kernel::from_array(Array2::from_elem((2, 2), false)).is_err());
        assert!(Kernel::with_anchor(Array2::from_elem((2, 2), true), (2, 0)).is_err());
    }

    #[test]
    fn test_rect_offsets() {
        let k = Kernel::rect(3, 3).unwrap();
        assert_eq!(k.anchor(), (1, 1));
        assert_eq!(k.len(), 9);
        assert_eq!(k.offsets()[0], (-1, -1));
        assert_eq!(k.offsets()[8], (1, 1));
    }

    #[test]
    fn test_cross() {
        let k = Kernel::cross(3, 3).unwrap();
        assert_eq!(
            k.mask(),
            &array![[false, true, false], [true, true, true], [false, true, false]]
        );
    }

    #[test]
    fn test_ellipse() {
        let k = Kernel::ellipse(5, 5).unwrap();
        #[rustfmt::skip]
        let expected = array![
            [false, false, true, false, false],
            [true,  true,  true, true,  true ],
            [true,  true,  true, true,  true ],
            [true,  true,  true, true,  true ],
            [false, false, true, false, false],
        ];
        assert_eq!(k.mask(), &expected);
        assert!(!k.is_empty());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_rebuilds_offsets() {
        use super::KernelRepr;
        use crate::consts::gray::*;
        use crate::data::Volume;
        use crate::morph::erode;

        let k = Kernel::rect(3, 3).unwrap();
        let mut json = serde_json::to_value(&k).unwrap();
        assert!(json.get("offsets").is_none());
        assert_eq!(serde_json::from_value::<Kernel>(json.clone()).unwrap(), k);

        // 多余的偏移字段被忽略, 偏移总是由网格重新计算.
        json["offsets"] = serde_json::json!([]);
        let back: Kernel = serde_json::from_value(json).unwrap();
        assert_eq!(back.len(), 9);
        let v = Volume::background((1, 3, 3)).unwrap();
        assert_eq!(erode(&v, &back).count(BACKGROUND), 9);

        let empty = KernelRepr {
            mask: Array2::from_elem((2, 2), false),
            anchor: (0, 0),
        };
        let json = serde_json::to_string(&empty).unwrap();
        assert!(serde_json::from_str::<Kernel>(&json).is_err());

        let bad_anchor = KernelRepr {
            mask: Array2::from_elem((2, 2), true),
            anchor: (5, 0),
        };
        let json = serde_json::to_string(&bad_anchor).unwrap();
        assert!(serde_json::from_str::<Kernel>(&json).is_err());
    }
}
