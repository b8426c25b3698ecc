//! 矢状位模型输出通道到全标签空间的展开.
//!
//! 矢状位切片看不出左右, 因此矢状位模型在去偏侧化的小标签空间上训练.
//! 聚合三个平面的预测前, 需要把矢状位的类通道按收集表复制到全空间的
//! 对应通道上.

use ndarray::{Array4, ArrayView4, Axis};

use crate::consts::{ids, LEFT_RIGHT_SUBCORTICAL, SAG2FULL_21, SAG2FULL_51, SAG2FULL_96};
use crate::lut::{get_labels_from_lut, ColorLut, SAGITTAL_DROP_PREFIXES};
use crate::LabelId;

/// 某个全空间标签在矢状位空间中找不到归属通道.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnresolvedLabelError(pub LabelId);

/// 矢状位通道展开过程可能产生的错误.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SagittalMapError {
    /// 类数不属于任何内置空间, 又没有提供 LUT, 无法得到收集表.
    MissingLut(usize),

    /// 从 LUT 推断收集表时, 某个标签找不到归属通道.
    Unresolved(UnresolvedLabelError),

    /// 预测体的类通道数少于收集表的要求.
    ClassAxis {
        /// 收集表要求的最少通道数.
        required: usize,
        /// 预测体实际的通道数.
        got: usize,
    },
}

/// 查询皮层下结构左侧标签对应的右侧标签.
#[inline]
pub fn sagittal_coronal_remap(id: LabelId) -> Option<LabelId> {
    LEFT_RIGHT_SUBCORTICAL
        .iter()
        .find(|&&(left, _)| left == id)
        .map(|&(_, right)| right)
}

/// 从 LUT 推断矢状位 → 全空间的通道收集表.
///
/// 对全空间的每个标签依次尝试: 直接在矢状位清单中查位置;
/// 右半球皮层 parcel 平移 1000 后查; 皮层下左侧标签换成右侧后查.
/// 全部失败时返回 `Err`.
///
/// `num_classes_full` 必须等于 LUT 行数, 否则程序 panic.
pub fn infer_mapping_from_lut(
    num_classes_full: usize,
    lut: &ColorLut,
) -> Result<Vec<usize>, UnresolvedLabelError> {
    let (full, sagittal) = get_labels_from_lut(lut, SAGITTAL_DROP_PREFIXES);
    assert_eq!(num_classes_full, full.len(), "全空间类数与 LUT 行数不一致");

    let position = |id: LabelId| sagittal.iter().position(|&p| p == id);
    full.iter()
        .map(|&id| {
            position(id)
                .or_else(|| id.checked_sub(ids::CTX_LATERAL_OFFSET).and_then(&position))
                .or_else(|| sagittal_coronal_remap(id).and_then(&position))
                .ok_or(UnresolvedLabelError(id))
        })
        .collect()
}

/// 将矢状位模型的逐类概率体展开到全标签空间的类通道上.
///
/// 空间轴形状保持不变, 类通道按收集表复制: 同一矢状位通道会出现在
/// 它对应的左右两个全空间通道上.
///
/// # 参数
///
/// `num_classes` 沿用训练侧的习惯取值: 96 指完整空间 (含背景),
/// 51 指 DKT+aseg 的矢状位空间, 21 指 aseg 的矢状位空间,
/// 三者使用内置收集表; 其余取值一律视为全空间类数,
/// 此时必须给出 `lut`, 收集表从中推断.
pub fn map_prediction_sagittal2full(
    prediction_sag: &ArrayView4<'_, f32>,
    num_classes: usize,
    lut: Option<&ColorLut>,
) -> Result<Array4<f32>, SagittalMapError> {
    let table: Vec<usize> = match num_classes {
        96 => SAG2FULL_96.to_vec(),
        51 => SAG2FULL_51.to_vec(),
        21 => SAG2FULL_21.to_vec(),
        _ => {
            let lut = lut.ok_or(SagittalMapError::MissingLut(num_classes))?;
            infer_mapping_from_lut(num_classes, lut).map_err(SagittalMapError::Unresolved)?
        }
    };

    // 收集表下标的上界决定矢状位预测最少要有多少个类通道.
    // 以上途径都保证表非空, 可直接 unwrap.
    let required = table.iter().max().unwrap() + 1;
    let got = prediction_sag.len_of(Axis(3));
    if got < required {
        return Err(SagittalMapError::ClassAxis { required, got });
    }

    Ok(prediction_sag.select(Axis(3), &table))
}
