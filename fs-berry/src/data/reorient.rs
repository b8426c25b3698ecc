//! 体数据在 coronal / axial / sagittal 三种切片平面之间的轴序转换.
//!
//! 内部存储统一以 coronal 取向为基准. 按其他平面切片训练或推理时,
//! 先用本模块把体 (或逐类概率体) 转到对应取向, 结束后再转回来.
//!
//! 所有转换只交换 stride, 不拷贝数据, 输出不保证行优先布局.

use ndarray::{Array3, Array4};

/// 将 coronal 取向的体转为 axial 取向.
#[inline]
pub fn coronal_to_axial<A>(vol: Array3<A>) -> Array3<A> {
    vol.permuted_axes([2, 0, 1])
}

/// 将 axial 取向的体转回 coronal 取向. 是 [`coronal_to_axial`] 的逆操作.
#[inline]
pub fn axial_to_coronal<A>(vol: Array3<A>) -> Array3<A> {
    vol.permuted_axes([1, 2, 0])
}

/// 将 coronal 取向的体转为 sagittal 取向.
///
/// 该转换是对合的: 连续作用两次等于恒等变换.
#[inline]
pub fn coronal_to_sagittal<A>(vol: Array3<A>) -> Array3<A> {
    vol.permuted_axes([2, 1, 0])
}

/// 将 sagittal 取向的体转回 coronal 取向. 与 [`coronal_to_sagittal`] 是同一置换.
#[inline]
pub fn sagittal_to_coronal<A>(vol: Array3<A>) -> Array3<A> {
    vol.permuted_axes([2, 1, 0])
}

/// 将 axial 取向的逐类概率体 (前三轴空间, 第四轴类别) 转回 coronal 取向.
#[inline]
pub fn axial_to_coronal_4d<A>(pred: Array4<A>) -> Array4<A> {
    pred.permuted_axes([1, 2, 0, 3])
}

/// 将 sagittal 取向的逐类概率体 (前三轴空间, 第四轴类别) 转回 coronal 取向.
#[inline]
pub fn sagittal_to_coronal_4d<A>(pred: Array4<A>) -> Array4<A> {
    pred.permuted_axes([2, 1, 0, 3])
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array3, Array4};

    /// 以行优先序填充 0, 1, 2, ... 的体.
    fn numbered(dim: (usize, usize, usize)) -> Array3<u32> {
        let mut counter = 0;
        Array3::from_shape_simple_fn(dim, || {
            counter += 1;
            counter - 1
        })
    }

    #[test]
    fn test_axial_shapes_and_elements() {
        let vol = numbered((2, 3, 4));
        let axial = coronal_to_axial(vol.clone());
        assert_eq!(axial.dim(), (4, 2, 3));
        for ((h, w, d), &v) in vol.indexed_iter() {
            assert_eq!(axial[(d, h, w)], v);
        }
    }

    #[test]
    fn test_axial_roundtrip() {
        let vol = numbered((2, 3, 4));
        assert_eq!(axial_to_coronal(coronal_to_axial(vol.clone())), vol);
    }

    #[test]
    fn test_sagittal_is_involution() {
        let vol = numbered((2, 3, 4));
        let sagittal = coronal_to_sagittal(vol.clone());
        assert_eq!(sagittal.dim(), (4, 3, 2));
        assert_eq!(sagittal_to_coronal(sagittal.clone()), vol);
        assert_eq!(coronal_to_sagittal(sagittal), vol);
    }

    #[test]
    fn test_4d_keeps_class_axis() {
        let pred = Array4::<f32>::zeros((2, 3, 4, 5));
        assert_eq!(axial_to_coronal_4d(pred.clone()).dim(), (3, 4, 2, 5));
        assert_eq!(sagittal_to_coronal_4d(pred).dim(), (4, 3, 2, 5));
    }

    #[test]
    fn test_4d_element_mapping() {
        let mut pred = Array4::<f32>::zeros((2, 3, 4, 5));
        // axial 取向下的 (d, h, w) = (1, 2, 3), 类通道 4.
        pred[(1, 2, 3, 4)] = 1.0;
        let coronal = axial_to_coronal_4d(pred);
        assert_eq!(coronal[(2, 3, 1, 4)], 1.0);
    }
}
