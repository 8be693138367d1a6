//! 体数据与切片的基础数据结构.

pub mod slice;
mod volume;

pub use slice::{MaskSlice, MaskSliceMut, OwnedMaskSlice};
pub use volume::Volume;
