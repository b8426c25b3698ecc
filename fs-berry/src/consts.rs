//! FreeSurfer 标签空间通用常量.
//!
//! 所有查找表均以字面值形式给出, 与 aparc.DKTatlas+aseg
//! 的既有协议逐项一致, 不在运行期推导.

use crate::LabelId;

/// FreeSurfer aseg/aparc 标签 ID.
pub mod ids {
    use crate::LabelId;

    /// 背景 (Unknown).
    pub const BACKGROUND: LabelId = 0;

    /// 左侧大脑白质.
    pub const LEFT_CEREBRAL_WM: LabelId = 2;

    /// 左侧大脑皮层 (aseg 粗标签).
    pub const LEFT_CEREBRAL_CORTEX: LabelId = 3;

    /// CSF.
    pub const CSF: LabelId = 24;

    /// 右侧大脑白质.
    pub const RIGHT_CEREBRAL_WM: LabelId = 41;

    /// 右侧大脑皮层 (aseg 粗标签).
    pub const RIGHT_CEREBRAL_CORTEX: LabelId = 42;

    /// 白质低信号区 (WM-hypointensities).
    pub const WM_HYPOINTENSITIES: LabelId = 77;

    /// 胼胝体分段区间下界 (CC_Posterior).
    pub const CC_FIRST: LabelId = 251;

    /// 胼胝体分段区间上界 (CC_Anterior, 闭).
    pub const CC_LAST: LabelId = 255;

    /// 左半球皮层 parcel 起始值 (ctx-lh-unknown).
    pub const LH_CTX_BASE: LabelId = 1000;

    /// 右半球皮层 parcel 起始值 (ctx-rh-unknown).
    pub const RH_CTX_BASE: LabelId = 2000;

    /// 右半球皮层 parcel 上界 (开).
    pub const RH_CTX_STOP: LabelId = 3000;

    /// 左右半球同名皮层 parcel 之间的 ID 偏移.
    pub const CTX_LATERAL_OFFSET: LabelId = 1000;

    /// 标签是否是胼胝体分段?
    #[inline]
    pub const fn is_corpus_callosum(p: LabelId) -> bool {
        p >= CC_FIRST && p <= CC_LAST
    }

    /// 标签是否是左半球皮层 parcel?
    #[inline]
    pub const fn is_left_cortex(p: LabelId) -> bool {
        p >= LH_CTX_BASE && p < RH_CTX_BASE
    }

    /// 标签是否是右半球皮层 parcel?
    #[inline]
    pub const fn is_right_cortex(p: LabelId) -> bool {
        p >= RH_CTX_BASE && p < RH_CTX_STOP
    }

    /// 标签是否是皮层 parcel (任一半球)?
    #[inline]
    pub const fn is_cortex(p: LabelId) -> bool {
        is_left_cortex(p) || is_right_cortex(p)
    }
}

/// 皮层融合前的噪声标签清理置换表, 按表序依次应用 (旧值, 新值).
///
/// 依次为: 低信号区并类, 视交叉归背景, 左右 vessel 归同侧白质,
/// 第五脑室归 CSF, 左右 undetermined 归背景, 粗皮层标签归背景.
pub const CORTEX_CLEANUP: [(LabelId, LabelId); 9] = [
    (80, 77),
    (85, 0),
    (62, 41),
    (30, 2),
    (72, 24),
    (29, 0),
    (61, 0),
    (3, 0),
    (42, 0),
];

/// aseg 模式下的粗标签置换表, 按表序依次应用 (旧值, 新值).
///
/// 与 [`CORTEX_CLEANUP`] 的差别在于: unknown parcel 归入同侧粗皮层标签,
/// 且粗皮层标签本身保留.
pub const ASEG_CLEANUP: [(LabelId, LabelId); 7] = [
    (1000, 3),
    (2000, 42),
    (80, 77),
    (85, 0),
    (62, 41),
    (30, 2),
    (72, 24),
];

/// 皮层融合去偏侧化后, 需要从融合前快照恢复右半球原值的 parcel 清单.
///
/// 这些 parcel 在中线附近两侧紧贴, 合并会让网络难以区分, 故保持偏侧化.
/// 恢复按此顺序进行.
pub const KEEP_RIGHT_CORTEX: [LabelId; 14] = [
    2014, 2028, 2012, 2016, 2002, 2023, 2017, 2024, 2010, 2013, 2025, 2022, 2021, 2005,
];

/// 半球重划分时按 26-邻域连通域整体翻转的皮层 parcel 集合.
pub const SPLIT_CORTEX_LABELS: [LabelId; 19] = [
    1003, 1006, 1007, 1008, 1009, 1011, 1015, 1018, 1019, 1020, 1025, 1026, 1027, 1028, 1029,
    1030, 1031, 1034, 1035,
];

/// 半球重划分后需要以 sigma = 3 高斯投票逐体素复核的 "问题" parcel 集合.
pub const SPLIT_PROBLEM_LABELS: [LabelId; 4] = [1011, 1019, 1026, 1029];

/// 皮层下结构的左→右标签对应表.
pub const LEFT_RIGHT_SUBCORTICAL: [(LabelId, LabelId); 15] = [
    (2, 41),
    (3, 42),
    (4, 43),
    (5, 44),
    (7, 46),
    (8, 47),
    (10, 49),
    (11, 50),
    (12, 51),
    (13, 52),
    (17, 53),
    (18, 54),
    (26, 58),
    (28, 60),
    (31, 63),
];

/// 95 类 (96 含背景) 模型的矢状位预测 → 全标签空间通道收集表.
///
/// 下标为全空间类下标, 值为矢状位空间类下标.
pub const SAG2FULL_96: [usize; 96] = [
    0, 5, 6, 7, 8, 9, 10, 11, 12, 13, 1, 2, 3, 14, 15, 4, //
    16, 17, 18, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, //
    18, 19, 20, 21, 22, 23, 24, 25, 26, 27, 28, 29, 30, 31, 32, 33, //
    34, 35, 36, 37, 38, 39, 40, 41, 42, 43, 44, 45, 46, 47, 48, 49, //
    50, 20, 21, 22, 23, 24, 25, 26, 27, 28, 29, 30, 31, 32, 33, 34, //
    35, 36, 37, 38, 39, 40, 41, 42, 43, 44, 45, 46, 47, 48, 49, 50,
];

/// 51 类矢状位模型 (对应 79 类全空间, DKT+aseg) 的通道收集表.
///
/// 下标为全空间类下标, 值为矢状位空间类下标.
pub const SAG2FULL_51: [usize; 79] = [
    0, 5, 6, 7, 8, 9, 10, 11, 12, 13, 1, 2, 3, 14, 15, 4, //
    16, 17, 18, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, //
    18, 19, 20, 21, 22, 23, 24, 25, 26, 27, 28, 29, 30, 31, 32, 33, //
    34, 35, 36, 37, 38, 39, 40, 41, 42, 43, 44, 45, 46, 47, 48, 49, //
    50, 20, 22, 27, 29, 30, 31, 33, 34, 38, 39, 40, 41, 42, 45,
];

/// 21 类矢状位模型 (对应 36 类全空间, aseg) 的通道收集表.
///
/// 下标为全空间类下标, 值为矢状位空间类下标.
pub const SAG2FULL_21: [usize; 36] = [
    0, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 1, 2, 3, 15, 16, //
    4, 17, 18, 19, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, //
    17, 18, 19, 20,
];
