//! 🫐欢迎光临🍒
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::{Idx2d, Idx3d, LabelId};

pub use crate::data::render::{render_label_slice, save_label_slice, save_scan_slice};
pub use crate::data::reorient::{
    axial_to_coronal, axial_to_coronal_4d, coronal_to_axial, coronal_to_sagittal,
    sagittal_to_coronal, sagittal_to_coronal_4d,
};
pub use crate::data::{MriData3d, MriLabel, MriScan, NiftiHeaderAttr};

pub use crate::consts::ids::{
    BACKGROUND, LEFT_CEREBRAL_CORTEX, LEFT_CEREBRAL_WM, RIGHT_CEREBRAL_CORTEX, RIGHT_CEREBRAL_WM,
};
pub use crate::consts::{SAG2FULL_21, SAG2FULL_51, SAG2FULL_96};

pub use crate::lut::{read_lut, ColorLut};
pub use crate::morph::Connectivity;
pub use crate::post_proc::{
    average_views, fuse_cortex_labels, hard_labels, split_cortex_labels,
};
pub use crate::remap::{map_ground_truth, map_prediction_sagittal2full, LabelSpace, Mode};
pub use crate::weights::{create_weight_mask, WeightMaskOptions};

pub use crate::dataset::home_dataset_dir_with;
pub use crate::dataset::{self, subjects};
