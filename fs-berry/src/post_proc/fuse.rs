//! DKT 皮层 parcel 的左右归并 (后处理).

use std::collections::BTreeSet;

use log::warn;
use ndarray::{Array3, Zip};

use crate::consts::{ids, CORTEX_CLEANUP, KEEP_RIGHT_CORTEX};
use crate::morph::{binary_dilation, gaussian_blur_3d, Connectivity};
use crate::LabelId;

/// unknown 填充时指示函数高斯模糊的标准差.
const FILL_BLUR_SIGMA: f64 = 5.0;

/// 清理分割体中的次要结构标签.
///
/// 血管并入同侧脑白质, 第五脑室并入 CSF, undetermined 与视交叉归零.
/// 粗粒度的左右皮层标签 (3, 42) 同样归零, 皮层由 parcel 标签表达.
pub fn clean_cortex_labels(seg: &mut Array3<LabelId>) {
    for &(from, to) in CORTEX_CLEANUP.iter() {
        seg.mapv_inplace(|p| if p == from { to } else { p });
    }
}

/// 将一个半球内的 unknown 标签填充为邻近的真实 parcel.
///
/// 算法流程依次为:
///
/// 1. 对 unknown 体素掩码做一步 18-相邻膨胀, 膨胀环上出现过的
///    `(unknown, stop)` 区间内标签作为候选;
/// 2. 对每个候选标签的指示函数做高斯模糊;
/// 3. 每个 unknown 体素改写为模糊响应最大的候选, 并列时取最小标签.
///
/// # 注意
///
/// 找不到任何候选时发出警告, 分割体保持原样.
pub fn fill_unknown_labels_per_hemi(seg: &mut Array3<LabelId>, unknown: LabelId, stop: LabelId) {
    let mask = seg.mapv(|p| p == unknown);
    let dilated = binary_dilation(&mask.view(), Connectivity::C18);

    // step 1: 候选只从膨胀环上收集, 升序.
    let mut candidates = BTreeSet::new();
    Zip::from(&dilated)
        .and(&mask)
        .and(&*seg)
        .for_each(|&d, &m, &p| {
            if d && !m && p > unknown && p < stop {
                candidates.insert(p);
            }
        });
    if candidates.is_empty() {
        warn!("unknown 标签 {unknown} 周围没有可用的填充候选, 保持原样");
        return;
    }

    // step 2 + 3: 逐候选模糊指示函数, 逐体素保留响应最大者.
    let mut best_val = Array3::from_elem(seg.dim(), f64::NEG_INFINITY);
    let mut best_id = Array3::<LabelId>::zeros(seg.dim());
    for &cand in &candidates {
        let indicator = seg.mapv(|p| if p == cand { 1000.0 } else { 0.0 });
        let blurred = gaussian_blur_3d(&indicator.view(), FILL_BLUR_SIGMA);
        Zip::from(&mut best_val)
            .and(&mut best_id)
            .and(&blurred)
            .for_each(|v, id, &b| {
                if b > *v {
                    *v = b;
                    *id = cand;
                }
            });
    }

    Zip::from(&mut *seg)
        .and(&mask)
        .and(&best_id)
        .for_each(|p, &m, &id| {
            if m {
                *p = id;
            }
        });
}

/// 把左右分侧的 DKT 皮层 parcel 归并到左侧标签区间.
///
/// 算法流程依次为:
///
/// 1. 清理次要结构标签 (见 [`clean_cortex_labels`]);
/// 2. 分别填充左右半球的 unknown parcel (1000 与 2000),
///    对应半球没有 unknown 体素时跳过;
/// 3. 右侧 parcel 整体平移到左侧区间 (减 1000);
/// 4. 少数不做归并的右侧 parcel 从原始输入恢复分侧取值.
pub fn fuse_cortex_labels(seg: &mut Array3<LabelId>) {
    let snapshot = seg.clone();

    clean_cortex_labels(seg);

    if seg.iter().any(|&p| p == ids::LH_CTX_BASE) {
        fill_unknown_labels_per_hemi(seg, ids::LH_CTX_BASE, ids::RH_CTX_BASE);
    }
    if seg.iter().any(|&p| p == ids::RH_CTX_BASE) {
        fill_unknown_labels_per_hemi(seg, ids::RH_CTX_BASE, ids::RH_CTX_STOP);
    }

    seg.mapv_inplace(|p| {
        if ids::is_right_cortex(p) {
            p - ids::CTX_LATERAL_OFFSET
        } else {
            p
        }
    });

    for &keep in KEEP_RIGHT_CORTEX.iter() {
        Zip::from(&mut *seg).and(&snapshot).for_each(|p, &orig| {
            if orig == keep {
                *p = keep;
            }
        });
    }
}
