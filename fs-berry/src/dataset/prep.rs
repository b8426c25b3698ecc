//! 训练样本的制备: 厚切片堆叠, 空白切片过滤, npz 落盘.

use std::fs::File;
use std::path::Path;

use ndarray::{Array3, Array4, ArrayView3, ArrayView4, Axis};
use ndarray_npy::{NpzWriter, WriteNpzError};

use crate::data::ShapeMismatchError;

/// 写出训练样本 npz 错误.
#[derive(Debug)]
pub enum WriteCaseError {
    /// 创建目标文件错误.
    IoError(std::io::Error),

    /// 写出 npz 内容错误.
    WriteNpzError(WriteNpzError),
}

/// 沿深度方向堆叠相邻切片, 得到 2.5D 网络输入.
///
/// 输出形状为 `(H, W, D, 2 * thickness + 1)`, 第 `k` 个切片的通道依次为
/// `k - thickness ..= k + thickness` 处的切片, 越界处取边缘切片.
pub fn thick_slices(data: &ArrayView3<'_, u8>, thickness: usize) -> Array4<u8> {
    let (h, w, d) = data.dim();
    Array4::from_shape_fn((h, w, d, 2 * thickness + 1), |(i, j, k, t)| {
        let k = (k + t).saturating_sub(thickness).min(d - 1);
        data[(i, j, k)]
    })
}

/// 过滤信息量不足的切片.
///
/// 沿深度方向保留标签值之和大于 `threshold` 的切片, 三个体同步筛选.
/// 求和对象是标签取值本身, 背景为 0, 因此和越大代表结构越多.
///
/// # 注意
///
/// `img` 的空间轴形状与 `label`, `weight` 不一致时返回 `Err`.
#[allow(clippy::type_complexity)]
pub fn filter_blank_slices_thick(
    img: &ArrayView4<'_, u8>,
    label: &ArrayView3<'_, u16>,
    weight: &ArrayView3<'_, f32>,
    threshold: u64,
) -> Result<(Array4<u8>, Array3<u16>, Array3<f32>), ShapeMismatchError> {
    let spatial = [img.len_of(Axis(0)), img.len_of(Axis(1)), img.len_of(Axis(2))];
    for other in [label.shape(), weight.shape()] {
        if other != spatial.as_slice() {
            return Err(ShapeMismatchError {
                expected: spatial.to_vec(),
                got: other.to_vec(),
            });
        }
    }

    let keep: Vec<usize> = (0..label.len_of(Axis(2)))
        .filter(|&k| {
            let total: u64 = label
                .index_axis(Axis(2), k)
                .iter()
                .map(|&p| u64::from(p))
                .sum();
            total > threshold
        })
        .collect();

    Ok((
        img.select(Axis(2), &keep),
        label.select(Axis(2), &keep),
        weight.select(Axis(2), &keep),
    ))
}

/// 将一个 subject 的训练样本写出为 npz 归档.
///
/// 归档内的条目名固定为 `img.npy`, `label.npy` 和 `weight.npy`.
pub fn write_training_npz<P: AsRef<Path>>(
    path: P,
    img: &ArrayView4<'_, u8>,
    label: &ArrayView3<'_, u16>,
    weight: &ArrayView3<'_, f32>,
) -> Result<(), WriteCaseError> {
    let file = File::create(path.as_ref()).map_err(WriteCaseError::IoError)?;
    let mut writer = NpzWriter::new(file);
    writer
        .add_array("img.npy", img)
        .map_err(WriteCaseError::WriteNpzError)?;
    writer
        .add_array("label.npy", label)
        .map_err(WriteCaseError::WriteNpzError)?;
    writer
        .add_array("weight.npy", weight)
        .map_err(WriteCaseError::WriteNpzError)?;
    writer.finish().map_err(WriteCaseError::WriteNpzError)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array3, Array4};
    use ndarray_npy::NpzReader;

    #[test]
    fn test_thick_slices_edge_padding() {
        let data = Array3::from_shape_vec((1, 1, 5), vec![0u8, 1, 2, 3, 4]).unwrap();
        let thick = thick_slices(&data.view(), 1);
        assert_eq!(thick.dim(), (1, 1, 5, 3));

        let windows: Vec<[u8; 3]> = (0..5)
            .map(|k| [thick[(0, 0, k, 0)], thick[(0, 0, k, 1)], thick[(0, 0, k, 2)]])
            .collect();
        let want = [[0, 0, 1], [0, 1, 2], [1, 2, 3], [2, 3, 4], [3, 4, 4]];
        assert_eq!(windows, want);
    }

    #[test]
    fn test_filter_blank_keeps_informative() {
        let img = Array4::from_elem((1, 1, 3, 1), 9u8);
        let label = Array3::from_shape_vec((1, 1, 3), vec![0u16, 60, 10]).unwrap();
        let weight = Array3::from_elem((1, 1, 3), 1.0f32);

        let (img2, label2, weight2) =
            filter_blank_slices_thick(&img.view(), &label.view(), &weight.view(), 50).unwrap();
        assert_eq!(img2.dim(), (1, 1, 1, 1));
        assert_eq!(label2.dim(), (1, 1, 1));
        assert_eq!(weight2.dim(), (1, 1, 1));
        assert_eq!(label2[(0, 0, 0)], 60);
    }

    #[test]
    fn test_filter_blank_shape_mismatch() {
        let img = Array4::from_elem((1, 1, 3, 1), 0u8);
        let label = Array3::from_elem((1, 1, 3), 0u16);
        let weight = Array3::from_elem((1, 1, 2), 0.0f32);

        let err =
            filter_blank_slices_thick(&img.view(), &label.view(), &weight.view(), 0).unwrap_err();
        assert_eq!(err.expected, vec![1, 1, 3]);
        assert_eq!(err.got, vec![1, 1, 2]);
    }

    #[test]
    fn test_write_training_npz_roundtrip() {
        let path = std::env::temp_dir().join(format!("fs-berry-case-{}.npz", std::process::id()));

        let img = Array4::from_elem((2, 2, 2, 3), 5u8);
        let label = Array3::from_elem((2, 2, 2), 42u16);
        let weight = Array3::from_elem((2, 2, 2), 1.5f32);
        write_training_npz(&path, &img.view(), &label.view(), &weight.view()).unwrap();

        let mut reader = NpzReader::new(File::open(&path).unwrap()).unwrap();
        assert_eq!(reader.len(), 3);
        let got: Array3<u16> = reader.by_name("label.npy").unwrap();
        assert_eq!(got, label);
        let got: Array4<u8> = reader.by_name("img.npy").unwrap();
        assert_eq!(got, img);

        std::fs::remove_file(&path).unwrap();
    }
}
