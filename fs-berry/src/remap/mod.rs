//! 标签值空间与网络类下标空间之间的双向映射.
//!
//! 训练和推理都在稠密的类下标 (0..num_classes) 上进行,
//! 而 nii 标注和 LUT 使用稀疏的 FreeSurfer 标签值.
//! 本模块负责两个方向的转换, 以及矢状位模型输出通道到全标签空间的展开.

mod sagittal;
mod space;

pub use sagittal::{
    infer_mapping_from_lut, map_prediction_sagittal2full, sagittal_coronal_remap, SagittalMapError,
    UnresolvedLabelError,
};
pub use space::{map_ground_truth, LabelSpace, MapGroundTruthError, Mode, UnmappedLabelError};
