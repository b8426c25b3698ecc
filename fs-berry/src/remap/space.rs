//! 稠密标签空间与真值映射.

use std::collections::{BTreeMap, BTreeSet};

use log::info;
use ndarray::{Array3, ArrayView3, Zip};

use crate::consts::{ids, ASEG_CLEANUP};
use crate::data::ShapeMismatchError;
use crate::{post_proc, LabelId};

/// 分割体中存在标签空间之外的标签. 内含所有未覆盖的标签值, 按升序排列.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnmappedLabelError {
    /// 未被标签空间覆盖的标签值.
    pub labels: Vec<LabelId>,
}

/// 一个有序标签清单定义的稠密标签空间.
///
/// 第 i 个标签对应类下标 i. 清单顺序与 LUT 行序一致,
/// 也与网络输出的类通道顺序一致.
#[derive(Debug, Clone)]
pub struct LabelSpace {
    labels: Vec<LabelId>,
    lookup: Vec<u16>,
}

impl LabelSpace {
    /// 由有序标签清单构造标签空间.
    ///
    /// 清单为空时程序 panic; 出现重复标签时后出现者生效.
    pub fn new(labels: Vec<LabelId>) -> Self {
        assert!(!labels.is_empty(), "标签空间不能为空");
        // 上面已断言非空, 可直接 unwrap.
        let max = *labels.iter().max().unwrap() as usize;
        let mut lookup = vec![0u16; max + 1];
        for (i, &id) in labels.iter().enumerate() {
            lookup[id as usize] = i as u16;
        }
        Self { labels, lookup }
    }

    /// 按类下标序获取标签清单.
    #[inline]
    pub fn labels(&self) -> &[LabelId] {
        &self.labels
    }

    /// 获取类个数.
    #[inline]
    pub fn num_classes(&self) -> usize {
        self.labels.len()
    }

    /// 查询标签 `id` 的类下标. 标签不在空间内时返回 `None`.
    #[inline]
    pub fn index_of(&self, id: LabelId) -> Option<usize> {
        let i = *self.lookup.get(id as usize)? as usize;
        (self.labels[i] == id).then_some(i)
    }

    /// 检查 `seg` 中出现的标签是否全部被本空间覆盖.
    pub fn check_superset(&self, seg: &ArrayView3<'_, LabelId>) -> Result<(), UnmappedLabelError> {
        let present: BTreeSet<LabelId> = seg.iter().copied().collect();
        let missing: Vec<LabelId> = present
            .into_iter()
            .filter(|&id| self.index_of(id).is_none())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(UnmappedLabelError { labels: missing })
        }
    }

    /// 将标签体逐体素映射为类下标体.
    ///
    /// `seg` 中存在空间之外的标签时返回 `Err`, 不做部分映射.
    pub fn map_volume(&self, seg: &ArrayView3<'_, LabelId>) -> Result<Array3<u16>, UnmappedLabelError> {
        self.check_superset(seg)?;
        Ok(seg.mapv(|p| self.lookup[p as usize]))
    }

    /// 将类下标体逐体素还原为标签体. 是 [`Self::map_volume`] 的逆操作.
    ///
    /// `mapped` 中存在超出类个数的下标时程序 panic.
    pub fn restore_volume(&self, mapped: &ArrayView3<'_, u16>) -> Array3<LabelId> {
        assert!(
            mapped.iter().all(|&c| (c as usize) < self.labels.len()),
            "类下标超出标签空间大小"
        );
        mapped.mapv(|c| self.labels[c as usize])
    }
}

/// 真值映射所按照的标注协议.
#[derive(PartialEq, Copy, Clone, Debug)]
pub enum Mode {
    /// aparc.DKTatlas+aseg 标注: 先做皮层融合, 保留细分 parcel.
    Aparc,

    /// aseg 标注: 仅有粗皮层标签, 做噪声标签置换.
    Aseg,
}

/// 真值映射过程可能产生的错误.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapGroundTruthError {
    /// 预处理后的分割体中存在目标标签空间之外的标签.
    Unmapped(UnmappedLabelError),

    /// 无胼胝体版分割体与主分割体形状不一致.
    ShapeMismatch(ShapeMismatchError),
}

/// 将一个 FreeSurfer 风格标注体映射为 (全空间, 矢状位空间) 两份类下标体.
///
/// 步骤依次为:
///
/// 1. 若给出 `seg_nocc`, 则将胼胝体分段体素 (251..=255)
///   替换为 `seg_nocc` 同位置的值;
/// 2. 按 `mode` 做皮层融合 (aparc) 或粗标签置换 (aseg);
/// 3. 用 `full` 空间收集得到全空间类下标体;
/// 4. 在标签值空间上去偏侧化: aparc 协议先将右半球皮层 parcel 平移回左半球,
///   然后按 `lateral` 表将左侧皮层下标签替换为右侧;
/// 5. 用 `sagittal` 空间收集得到矢状位类下标体.
///
/// # 注意
///
/// aseg 协议要求置换后的体中不再有胼胝体分段, 且左右粗皮层标签都存在,
/// 否则程序 panic.
pub fn map_ground_truth(
    mut seg: Array3<LabelId>,
    full: &LabelSpace,
    sagittal: &LabelSpace,
    lateral: &BTreeMap<LabelId, LabelId>,
    seg_nocc: Option<&ArrayView3<'_, LabelId>>,
    mode: Mode,
) -> Result<(Array3<u16>, Array3<u16>), MapGroundTruthError> {
    if let Some(nocc) = seg_nocc {
        if nocc.dim() != seg.dim() {
            let (h, w, d) = seg.dim();
            let (nh, nw, nd) = nocc.dim();
            return Err(MapGroundTruthError::ShapeMismatch(ShapeMismatchError {
                expected: vec![h, w, d],
                got: vec![nh, nw, nd],
            }));
        }
        Zip::from(&mut seg).and(nocc).for_each(|p, &q| {
            if ids::is_corpus_callosum(*p) {
                *p = q;
            }
        });
    }

    match mode {
        Mode::Aparc => {
            info!("按 aparc.DKTatlas+aseg 协议映射真值标签");
            post_proc::fuse_cortex_labels(&mut seg);
        }
        Mode::Aseg => {
            info!("按 aseg 协议映射真值标签");
            for (old, new) in ASEG_CLEANUP {
                seg.mapv_inplace(|p| if p == old { new } else { p });
            }
            assert!(
                !seg.iter().any(|&p| ids::is_corpus_callosum(p)),
                "aseg 置换后仍残留胼胝体分段标签"
            );
            assert!(
                seg.iter().any(|&p| p == ids::LEFT_CEREBRAL_CORTEX)
                    && seg.iter().any(|&p| p == ids::RIGHT_CEREBRAL_CORTEX),
                "aseg 置换后缺少左右粗皮层标签"
            );
        }
    }

    let mapped = full
        .map_volume(&seg.view())
        .map_err(MapGroundTruthError::Unmapped)?;

    // 矢状位真值先在标签值空间上去偏侧化, 再做收集.
    if mode == Mode::Aparc {
        seg.mapv_inplace(|p| {
            if ids::is_right_cortex(p) {
                p - ids::CTX_LATERAL_OFFSET
            } else {
                p
            }
        });
    }
    for (&left, &right) in lateral {
        seg.mapv_inplace(|p| if p == left { right } else { p });
    }
    let mapped_sag = sagittal
        .map_volume(&seg.view())
        .map_err(MapGroundTruthError::Unmapped)?;

    Ok((mapped, mapped_sag))
}
