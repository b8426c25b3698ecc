#![warn(missing_docs)] // <= 合适时移除它.
// #![warn(clippy::missing_docs_in_private_items)]  // <= too strict.

//! 核心库. 提供 FreeSurfer 风格脑部 MRI 分割体的标签空间重映射
//! 与三维形态学后处理算法.
//!
//! 该 crate 目前仅提供 `safe` 接口. 将来可能为部分高性能场景关键路径提供 `unsafe` 接口.
//!
//! # 注意
//!
//! 1. 该 crate 按照 aparc.DKTatlas+aseg 的标签约定工作, 没有对其它图谱进行直接适配
//!   (但如果自定义 LUT 遵循 "Left-"/"Right-" 与 "ctx-lh"/"ctx-rh" 前缀惯例, 也可以工作).
//! 2. 体数据一律按照 conform 之后的 (H, W, D) 布局访问, 不处理方向归一化与重采样.
//! 3. 在非期望情况下, 程序会直接 panic, 而不会导致内存错误. As what Rust promises.
//!
//! # 开发计划
//!
//! ### LUT 解析与派生查询 ✅
//!
//! tsv/csv/txt 三种分隔格式, 左右半球配对表, 全/矢状位标签列表,
//! 以及内置的 DKT+aseg (79 类) 与 aseg (36 类) 两张表.
//!
//! 实现位于 `fs-berry/src/lut`.
//!
//! ### 稀疏标签与稠密训练下标的双向映射 ✅
//!
//! superset 检查失败即报错, 不做静默置 0.
//!
//! 实现位于 `fs-berry/src/remap/space.rs`.
//!
//! ### 皮层融合 (清理, unknown 填充, 去偏侧化) ✅
//!
//! unknown 填充通过 18-邻域膨胀环取候选, 按 sigma = 5
//! 高斯响应做滚动 argmax, 不物化整叠模糊体.
//!
//! 实现位于 `fs-berry/src/post_proc/fuse.rs`.
//!
//! ### 矢状位预测的通道调和 ✅
//!
//! 96/51/21 三种类数使用字面值收集表, 其余类数从 LUT 推导.
//!
//! 实现位于 `fs-berry/src/remap/sagittal.rs`.
//!
//! ### 半球重划分 ✅
//!
//! 以左右白质最大连通域质心为参照逐连通域翻转,
//! 对歧义 parcel 再做 sigma = 3 高斯投票.
//!
//! 实现位于 `fs-berry/src/post_proc/split.rs`.
//!
//! ### 三维形态学与滤波 ✅
//!
//! 连通域标记, 最大连通域, 二值膨胀/腐蚀/闭运算, 可分离高斯与均值滤波,
//! 包围盒. 语义与 scipy.ndimage 的缺省行为对齐.
//!
//! 实现位于 `fs-berry/src/morph.rs`.
//!
//! ### 训练权重掩码 ✅
//!
//! 中位频率类权重, 类边界梯度项, 高分辨率细结构项.
//!
//! 实现位于 `fs-berry/src/weights.rs`.
//!
//! ### 厚切片与空白切片过滤 ✅
//!
//! 实现位于 `fs-berry/src/dataset/prep.rs`.
//!
//! ### 数据集加载器与 npz 归档 ✅
//!
//! 实现位于 `fs-berry/src/dataset`.
//!
//! ### nifti 方向信息 (sform/qform) 的自动适配 ⌛️
//!
//! 目前假定输入已经 conform 完毕, 后续考虑从 header 推断并校验.
//!
//! ### 完善代码文档 ✅
//!
//! 给每个 public API 提供文档, 并视情况给 private
//! API 提供文档.

/// 二维索引, 同时也可一定程度上用作非负整数向量.
pub type Idx2d = (usize, usize);

/// 三维索引, 同时也可一定程度上用作非负整数向量.
pub type Idx3d = (usize, usize, usize);

/// FreeSurfer 标签值. aparc.DKTatlas+aseg 的取值范围 (0..=2035) 要求至少 16 bit.
pub type LabelId = u16;

type Predicate = fn(LabelId) -> bool;

/// 3D MRI nii 文件基础数据结构.
mod data;

pub use data::{MriData3d, MriLabel, MriScan, NiftiHeaderAttr, ShapeMismatchError};

pub use data::render;
pub use data::reorient;

pub mod consts;

pub mod lut;

pub mod morph;

pub mod post_proc;

pub mod remap;

pub mod weights;

pub mod dataset;
pub mod prelude;
