//! 掩膜切片对象的操作.

mod core;
mod iter;

pub use core::{MaskSlice, MaskSliceMut, OwnedMaskSlice};
