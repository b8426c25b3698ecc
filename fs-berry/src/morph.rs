//! 三维二值形态学与可分离滤波原语.
//!
//! 所有操作约定: 体外 (越界) 的体素在二值操作中视为背景,
//! 在滤波操作中按 reflect 方式折回体内.

use crate::Idx3d;
use itertools::iproduct;
use ndarray::{Array3, ArrayView2, ArrayView3, ArrayViewMut2, Axis, Zip};
use std::collections::VecDeque;

/// 三维邻域连通性.
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub enum Connectivity {
    /// 6-邻域 (共面).
    C6,
    /// 18-邻域 (共面或共棱).
    C18,
    /// 26-邻域 (共面, 共棱或共点).
    C26,
}

impl Connectivity {
    /// 该连通性对应的邻域偏移集合, 不含原点.
    pub fn offsets(self) -> Vec<(isize, isize, isize)> {
        let max = match self {
            Self::C6 => 1,
            Self::C18 => 2,
            Self::C26 => 3,
        };
        iproduct!(-1..=1isize, -1..=1isize, -1..=1isize)
            .filter(|(i, j, k)| {
                let l1 = i.abs() + j.abs() + k.abs();
                0 < l1 && l1 <= max
            })
            .collect()
    }
}

/// 对三维坐标应用带符号偏移, 越界时返回 `None`.
#[inline]
fn offset_checked(pos: Idx3d, off: (isize, isize, isize), dim: Idx3d) -> Option<Idx3d> {
    let h = pos.0.checked_add_signed(off.0).filter(|&v| v < dim.0)?;
    let w = pos.1.checked_add_signed(off.1).filter(|&v| v < dim.1)?;
    let d = pos.2.checked_add_signed(off.2).filter(|&v| v < dim.2)?;
    Some((h, w, d))
}

/// 对布尔掩码做连通域标记, 返回 (编号体, 连通域个数).
///
/// 背景体素编号为 0, 连通域按扫描序从 1 开始编号.
pub fn label_components(mask: &ArrayView3<'_, bool>, conn: Connectivity) -> (Array3<u32>, u32) {
    let dim = mask.dim();
    let offsets = conn.offsets();
    let mut labels: Array3<u32> = Array3::zeros(dim);
    let mut current = 0u32;
    let mut queue = VecDeque::new();
    for pos in iproduct!(0..dim.0, 0..dim.1, 0..dim.2) {
        if !mask[pos] || labels[pos] != 0 {
            continue;
        }
        current += 1;
        labels[pos] = current;
        queue.push_back(pos);
        while let Some(cur) = queue.pop_front() {
            for &off in &offsets {
                if let Some(next) = offset_checked(cur, off, dim) {
                    if mask[next] && labels[next] == 0 {
                        labels[next] = current;
                        queue.push_back(next);
                    }
                }
            }
        }
    }
    (labels, current)
}

/// 提取布尔掩码的最大连通域.
///
/// 体积并列最大时取扫描序更靠前的连通域; 掩码全空时返回全 `false`.
pub fn largest_connected_component(
    mask: &ArrayView3<'_, bool>,
    conn: Connectivity,
) -> Array3<bool> {
    let (labels, count) = label_components(mask, conn);
    if count == 0 {
        return Array3::from_elem(mask.dim(), false);
    }
    let mut sizes = vec![0usize; count as usize + 1];
    for &p in &labels {
        sizes[p as usize] += 1;
    }
    let mut best = 1;
    for p in 2..=count as usize {
        if sizes[p] > sizes[best] {
            best = p;
        }
    }
    labels.mapv(|p| p as usize == best)
}

/// 二值膨胀.
pub fn binary_dilation(mask: &ArrayView3<'_, bool>, conn: Connectivity) -> Array3<bool> {
    let dim = mask.dim();
    let offsets = conn.offsets();
    let mut out = mask.to_owned();
    for pos in iproduct!(0..dim.0, 0..dim.1, 0..dim.2) {
        if mask[pos] {
            continue;
        }
        let hit = offsets
            .iter()
            .filter_map(|&off| offset_checked(pos, off, dim))
            .any(|next| mask[next]);
        if hit {
            out[pos] = true;
        }
    }
    out
}

/// 二值腐蚀. 体外视为背景, 因此贴边的前景总会被腐蚀掉.
pub fn binary_erosion(mask: &ArrayView3<'_, bool>, conn: Connectivity) -> Array3<bool> {
    let dim = mask.dim();
    let offsets = conn.offsets();
    let mut out = mask.to_owned();
    for pos in iproduct!(0..dim.0, 0..dim.1, 0..dim.2) {
        if !mask[pos] {
            continue;
        }
        let keep = offsets
            .iter()
            .all(|&off| offset_checked(pos, off, dim).is_some_and(|next| mask[next]));
        if !keep {
            out[pos] = false;
        }
    }
    out
}

/// 二值闭运算 (先膨胀后腐蚀), 结构元由 `conn` 给出.
pub fn binary_closing(mask: &ArrayView3<'_, bool>, conn: Connectivity) -> Array3<bool> {
    binary_erosion(&binary_dilation(mask, conn).view(), conn)
}

/// 一维归一化高斯核, 截断半径取 `4 * sigma + 0.5` 向下取整.
pub fn gaussian_kernel(sigma: f64) -> Vec<f64> {
    let radius = (4.0 * sigma + 0.5) as usize;
    let mut kernel: Vec<f64> = (-(radius as isize)..=radius as isize)
        .map(|x| {
            let x = x as f64;
            (-0.5 * x * x / (sigma * sigma)).exp()
        })
        .collect();
    let sum: f64 = kernel.iter().sum();
    for v in &mut kernel {
        *v /= sum;
    }
    kernel
}

/// 把带符号下标按 reflect 边界 (d c b a | a b c d | d c b a) 折回 `0..n`.
#[inline]
fn reflect_index(mut i: isize, n: usize) -> usize {
    let n = n as isize;
    loop {
        if i < 0 {
            i = -i - 1;
        } else if i >= n {
            i = 2 * n - i - 1;
        } else {
            return i as usize;
        }
    }
}

/// 在一块二维板条内沿 `axis` 做一维相关, reflect 边界.
fn correlate_slab(
    src: &ArrayView2<'_, f64>,
    kernel: &[f64],
    axis: Axis,
    out: &mut ArrayViewMut2<'_, f64>,
) {
    let n = src.len_of(axis);
    let radius = kernel.len() / 2;
    Zip::indexed(out).for_each(|(a, b), item| {
        let mut pos = [a, b];
        let center = pos[axis.0] as isize;
        let mut acc = 0.0;
        for (t, &coef) in kernel.iter().enumerate() {
            pos[axis.0] = reflect_index(center + t as isize - radius as isize, n);
            acc += coef * src[(pos[0], pos[1])];
        }
        *item = acc;
    });
}

/// 沿指定轴做一维相关, 其余两轴逐体素独立, reflect 边界.
///
/// 体积沿与 `axis` 垂直的一个轴切成二维板条逐板处理, rayon feature
/// 打开时板条间并行. 两条路径共用同一板条内核, 结果逐位一致.
fn correlate1d_axis(data: &ArrayView3<'_, f64>, kernel: &[f64], axis: Axis) -> Array3<f64> {
    let slab = if axis == Axis(0) { Axis(1) } else { Axis(0) };
    let axis_2d = if axis == Axis(2) { Axis(1) } else { Axis(0) };
    let mut out = Array3::zeros(data.dim());

    #[cfg(feature = "rayon")]
    {
        use rayon::prelude::*;
        out.axis_iter_mut(slab)
            .into_par_iter()
            .zip(data.axis_iter(slab).into_par_iter())
            .for_each(|(mut dst, src)| correlate_slab(&src, kernel, axis_2d, &mut dst));
    }
    #[cfg(not(feature = "rayon"))]
    for (mut dst, src) in out.axis_iter_mut(slab).zip(data.axis_iter(slab)) {
        correlate_slab(&src, kernel, axis_2d, &mut dst);
    }

    out
}

/// 三维高斯滤波, 按三个轴向的一维高斯核依次作用.
pub fn gaussian_blur_3d(data: &ArrayView3<'_, f64>, sigma: f64) -> Array3<f64> {
    let kernel = gaussian_kernel(sigma);
    let mut out = correlate1d_axis(data, &kernel, Axis(0));
    out = correlate1d_axis(&out.view(), &kernel, Axis(1));
    correlate1d_axis(&out.view(), &kernel, Axis(2))
}

/// 三维均值滤波, 边长为 `size` 的立方窗, reflect 边界.
pub fn uniform_filter_3d(data: &ArrayView3<'_, f64>, size: usize) -> Array3<f64> {
    let kernel = vec![1.0 / size as f64; size];
    let mut out = correlate1d_axis(data, &kernel, Axis(0));
    out = correlate1d_axis(&out.view(), &kernel, Axis(1));
    correlate1d_axis(&out.view(), &kernel, Axis(2))
}

/// 沿指定轴的数值梯度: 内部为中心差分, 两端为单侧差分, 步长为 1.
///
/// 轴长不足 2 时返回全 0.
pub fn gradient_axis(data: &ArrayView3<'_, f64>, axis: Axis) -> Array3<f64> {
    let n = data.len_of(axis);
    let mut out = Array3::zeros(data.dim());
    if n < 2 {
        return out;
    }
    Zip::indexed(&mut out).for_each(|(h, w, d), item| {
        let mut pos = [h, w, d];
        let c = pos[axis.0];
        let (prev, next, denom) = if c == 0 {
            (0, 1, 1.0)
        } else if c == n - 1 {
            (n - 2, n - 1, 1.0)
        } else {
            (c - 1, c + 1, 2.0)
        };
        pos[axis.0] = next;
        let hi = data[(pos[0], pos[1], pos[2])];
        pos[axis.0] = prev;
        let lo = data[(pos[0], pos[1], pos[2])];
        *item = (hi - lo) / denom;
    });
    out
}

/// 布尔掩码的最小包围盒, 闭区间端点 (最小角, 最大角). 全空返回 `None`.
pub fn bounding_box_3d(mask: &ArrayView3<'_, bool>) -> Option<(Idx3d, Idx3d)> {
    let mut lo = (usize::MAX, usize::MAX, usize::MAX);
    let mut hi = (0, 0, 0);
    let mut any = false;
    Zip::indexed(mask).for_each(|(h, w, d), &m| {
        if m {
            any = true;
            lo = (lo.0.min(h), lo.1.min(w), lo.2.min(d));
            hi = (hi.0.max(h), hi.1.max(w), hi.2.max(d));
        }
    });
    any.then_some((lo, hi))
}

/// 布尔掩码的体素重心, 按 (H, W, D) 轴序给出. 全空返回 `None`.
pub fn mask_centroid(mask: &ArrayView3<'_, bool>) -> Option<(f64, f64, f64)> {
    let mut acc = (0.0, 0.0, 0.0);
    let mut count = 0usize;
    Zip::indexed(mask).for_each(|(h, w, d), &m| {
        if m {
            acc = (acc.0 + h as f64, acc.1 + w as f64, acc.2 + d as f64);
            count += 1;
        }
    });
    (count > 0).then(|| {
        let n = count as f64;
        (acc.0 / n, acc.1 / n, acc.2 / n)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    fn float_eq(lhs: f64, rhs: f64) -> bool {
        (lhs - rhs).abs() < 1e-9
    }

    /// 在全空掩码上点亮给定坐标.
    fn mask_of(dim: Idx3d, points: &[Idx3d]) -> Array3<bool> {
        let mut mask = Array3::from_elem(dim, false);
        for &p in points {
            mask[p] = true;
        }
        mask
    }

    #[test]
    fn test_offsets_cardinality() {
        assert_eq!(Connectivity::C6.offsets().len(), 6);
        assert_eq!(Connectivity::C18.offsets().len(), 18);
        assert_eq!(Connectivity::C26.offsets().len(), 26);
    }

    #[test]
    fn test_label_components_two_blobs() {
        let mask = mask_of((4, 4, 4), &[(0, 0, 0), (0, 0, 1), (3, 3, 3)]);
        let (labels, count) = label_components(&mask.view(), Connectivity::C6);
        assert_eq!(count, 2);
        assert_eq!(labels[(0, 0, 0)], labels[(0, 0, 1)]);
        assert_ne!(labels[(0, 0, 0)], labels[(3, 3, 3)]);
        assert_eq!(labels[(1, 1, 1)], 0);
    }

    #[test]
    fn test_label_components_diagonal_connectivity() {
        let mask = mask_of((3, 3, 3), &[(0, 0, 0), (1, 1, 1)]);
        let (_, c6) = label_components(&mask.view(), Connectivity::C6);
        let (_, c26) = label_components(&mask.view(), Connectivity::C26);
        assert_eq!(c6, 2);
        assert_eq!(c26, 1);
    }

    #[test]
    fn test_largest_connected_component() {
        let mut mask = Array3::from_elem((10, 10, 10), false);
        // 10 体素与 50 体素两个盒状连通域.
        mask.slice_mut(ndarray::s![0..1, 0..2, 0..5]).fill(true);
        mask.slice_mut(ndarray::s![4..9, 4..9, 4..6]).fill(true);
        let keep = largest_connected_component(&mask.view(), Connectivity::C26);
        assert!(!keep[(0, 0, 0)]);
        assert!(keep[(6, 6, 5)]);
        assert_eq!(keep.iter().filter(|&&m| m).count(), 50);
    }

    #[test]
    fn test_largest_connected_component_empty() {
        let mask = Array3::from_elem((3, 3, 3), false);
        let keep = largest_connected_component(&mask.view(), Connectivity::C6);
        assert!(keep.iter().all(|&m| !m));
    }

    #[test]
    fn test_dilation_erosion_roundtrip() {
        let mask = mask_of((5, 5, 5), &[(2, 2, 2)]);
        let grown = binary_dilation(&mask.view(), Connectivity::C6);
        assert_eq!(grown.iter().filter(|&&m| m).count(), 7);
        let back = binary_erosion(&grown.view(), Connectivity::C6);
        assert_eq!(back, mask);
    }

    #[test]
    fn test_erosion_eats_border() {
        let mask = Array3::from_elem((3, 3, 3), true);
        let eroded = binary_erosion(&mask.view(), Connectivity::C26);
        assert_eq!(eroded.iter().filter(|&&m| m).count(), 1);
        assert!(eroded[(1, 1, 1)]);
    }

    #[test]
    fn test_closing_fills_cavity() {
        let mut mask = Array3::from_elem((7, 7, 7), false);
        mask.slice_mut(ndarray::s![1..6, 1..6, 1..6]).fill(true);
        mask[(3, 3, 3)] = false;
        let closed = binary_closing(&mask.view(), Connectivity::C26);
        assert!(closed[(3, 3, 3)]);
    }

    #[test]
    fn test_gaussian_kernel_shape() {
        let kernel = gaussian_kernel(1.0);
        assert_eq!(kernel.len(), 9);
        assert!(float_eq(kernel.iter().sum::<f64>(), 1.0));
        for i in 0..kernel.len() / 2 {
            assert!(float_eq(kernel[i], kernel[kernel.len() - 1 - i]));
        }
        assert_eq!(gaussian_kernel(5.0).len(), 41);
    }

    #[test]
    fn test_reflect_index() {
        assert_eq!(reflect_index(0, 4), 0);
        assert_eq!(reflect_index(3, 4), 3);
        assert_eq!(reflect_index(-1, 4), 0);
        assert_eq!(reflect_index(-2, 4), 1);
        assert_eq!(reflect_index(4, 4), 3);
        assert_eq!(reflect_index(7, 4), 0);
        assert_eq!(reflect_index(8, 4), 0);
    }

    #[test]
    fn test_gaussian_blur_constant_volume() {
        let data = Array3::from_elem((6, 6, 6), 2.5f64);
        let blurred = gaussian_blur_3d(&data.view(), 1.5);
        assert!(blurred.iter().all(|&v| float_eq(v, 2.5)));
    }

    #[test]
    fn test_gaussian_blur_mass_spreads() {
        let mut data = Array3::zeros((9, 9, 9));
        data[(4, 4, 4)] = 1000.0;
        let blurred = gaussian_blur_3d(&data.view(), 1.0);
        assert!(blurred[(4, 4, 4)] > blurred[(4, 4, 5)]);
        assert!(blurred[(4, 4, 5)] > blurred[(4, 4, 6)]);
        assert!(float_eq(blurred[(4, 4, 5)], blurred[(4, 4, 3)]));
    }

    #[test]
    fn test_uniform_filter() {
        let mut data = Array3::zeros((3, 3, 3));
        data[(1, 1, 1)] = 27.0;
        let smooth = uniform_filter_3d(&data.view(), 3);
        assert!(smooth.iter().all(|&v| float_eq(v, 1.0)));
    }

    #[test]
    fn test_gradient_axis_ramp() {
        let data = Array3::from_shape_fn((4, 3, 3), |(h, _, _)| 2.0 * h as f64);
        let grad = gradient_axis(&data.view(), Axis(0));
        assert!(grad.iter().all(|&v| float_eq(v, 2.0)));
        let flat = gradient_axis(&data.view(), Axis(1));
        assert!(flat.iter().all(|&v| float_eq(v, 0.0)));
    }

    #[test]
    fn test_bounding_box() {
        assert!(bounding_box_3d(&Array3::from_elem((2, 2, 2), false).view()).is_none());
        let mask = mask_of((6, 6, 6), &[(1, 2, 3), (4, 2, 5)]);
        let (lo, hi) = bounding_box_3d(&mask.view()).unwrap();
        assert_eq!(lo, (1, 2, 3));
        assert_eq!(hi, (4, 2, 5));
    }

    #[test]
    fn test_mask_centroid() {
        assert!(mask_centroid(&Array3::from_elem((2, 2, 2), false).view()).is_none());
        let mask = mask_of((5, 5, 5), &[(1, 1, 1), (3, 1, 1)]);
        let (h, w, d) = mask_centroid(&mask.view()).unwrap();
        assert!(float_eq(h, 2.0));
        assert!(float_eq(w, 1.0));
        assert!(float_eq(d, 1.0));
    }
}
