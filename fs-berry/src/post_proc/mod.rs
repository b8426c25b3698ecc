//! 分割体后处理流程集合.

mod ensemble;
mod fuse;
mod split;

pub use ensemble::{average_views, hard_labels};

pub use fuse::{clean_cortex_labels, fill_unknown_labels_per_hemi, fuse_cortex_labels};

pub use split::split_cortex_labels;
