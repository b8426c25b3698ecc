//! 多平面预测的聚合.
//!
//! 三个平面的模型输出按同一类通道顺序对齐后 (矢状位需先经
//! `remap::map_prediction_sagittal2full` 展开), 等权平均再取 argmax.

use ndarray::{Array3, Array4, ArrayView4, Axis};

use crate::data::ShapeMismatchError;

/// 对多个视角的逐类概率体做等权平均.
///
/// # 注意
///
/// `views` 为空时程序 panic, 形状不一致时返回 `Err`.
pub fn average_views(
    views: &[ArrayView4<'_, f32>],
) -> Result<Array4<f32>, ShapeMismatchError> {
    assert!(!views.is_empty(), "至少需要一个视角的预测");

    let dim = views[0].dim();
    for view in views {
        if view.dim() != dim {
            return Err(ShapeMismatchError {
                expected: views[0].shape().to_vec(),
                got: view.shape().to_vec(),
            });
        }
    }

    let mut acc = Array4::<f32>::zeros(dim);
    for view in views {
        acc += view;
    }
    acc *= 1.0 / views.len() as f32;
    Ok(acc)
}

/// 沿类通道取 argmax, 得到稠密类下标体. 并列时取最小下标.
pub fn hard_labels(prediction: &ArrayView4<'_, f32>) -> Array3<u16> {
    prediction.map_axis(Axis(3), |probs| {
        let mut best = 0;
        for (i, &p) in probs.iter().enumerate() {
            if p > probs[best] {
                best = i;
            }
        }
        best as u16
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array4};

    #[test]
    fn test_average_two_views() {
        let a = Array4::from_shape_vec((1, 1, 1, 2), vec![0.25f32, 0.75]).unwrap();
        let b = Array4::from_shape_vec((1, 1, 1, 2), vec![0.5f32, 0.25]).unwrap();
        let mean = average_views(&[a.view(), b.view()]).unwrap();
        assert_eq!(mean[(0, 0, 0, 0)], 0.375);
        assert_eq!(mean[(0, 0, 0, 1)], 0.5);
    }

    #[test]
    fn test_average_shape_mismatch() {
        let a = Array4::<f32>::zeros((1, 1, 1, 2));
        let b = Array4::<f32>::zeros((1, 1, 1, 3));
        let err = average_views(&[a.view(), b.view()]).unwrap_err();
        assert_eq!(err.expected, vec![1, 1, 1, 2]);
        assert_eq!(err.got, vec![1, 1, 1, 3]);
    }

    #[test]
    #[should_panic(expected = "至少需要一个视角")]
    fn test_average_empty_panics() {
        let _ = average_views(&[]);
    }

    #[test]
    fn test_hard_labels_argmax() {
        let pred = Array4::from_shape_vec(
            (1, 1, 3, 3),
            vec![
                0.1f32, 0.7, 0.2, // 类 1
                0.5, 0.5, 0.1, // 并列取小
                0.1, 0.2, 0.9, // 类 2
            ],
        )
        .unwrap();
        let labels = hard_labels(&pred.view());
        assert_eq!(labels, array![[[1u16, 0, 2]]]);
    }
}
