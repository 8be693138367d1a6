//! 🍇欢迎光临🍓
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::{Idx2d, Idx3d};

pub use crate::data::{MaskSlice, MaskSliceMut, OwnedMaskSlice, Volume};
pub use crate::error::{MaskError, MaskResult};

pub use crate::consts::gray::{BACKGROUND, FOREGROUND};

pub use crate::region::{
    find_roi, slice_rois, ComponentAnalyzer, Components, Connectivity, RegionId, RegionLabeler,
    RegionStats, Roi, StatsTable,
};

pub use crate::morph::{closing, dilate, erode, opening, Kernel};

pub use crate::post_proc::{
    clean_lung_mask, reconstruct_gaps, remove_spots, select_greater_regions, CleanParams,
};

pub use crate::bits::{bit_plane_slices, to_bits};
pub use crate::cluster::{label_voxels, Fitted, KMeans1d};
