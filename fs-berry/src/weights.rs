//! 训练用逐体素权重掩码的生成.

use std::collections::BTreeMap;

use log::info;
use ndarray::{Array3, ArrayView3, Axis, Zip};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::morph::{
    binary_closing, binary_erosion, gradient_axis, uniform_filter_3d, Connectivity,
};

/// 权重掩码生成选项.
#[derive(PartialEq, Copy, Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WeightMaskOptions {
    /// median frequency balancing 权重的上限.
    pub max_weight: f32,

    /// 类下标梯度非零处的附加权重.
    pub max_edge_weight: f32,

    /// 深沟与细白质条带的附加权重, `None` 时关闭高分辨率补偿.
    pub max_hires_weight: Option<f32>,

    /// 皮层判定门限, 类下标大于该值的视为皮层 parcel.
    pub ctx_thresh: u16,

    /// 是否对最终掩码做边长 3 的均值滤波.
    pub mean_filter: bool,

    /// 高分辨率补偿开启时, 是否再附加皮层边缘掩码.
    pub cortex_mask: bool,

    /// 是否附加梯度掩码.
    pub gradient: bool,
}

impl Default for WeightMaskOptions {
    fn default() -> Self {
        Self {
            max_weight: 5.0,
            max_edge_weight: 5.0,
            max_hires_weight: None,
            ctx_thresh: 33,
            mean_filter: false,
            cortex_mask: true,
            gradient: true,
        }
    }
}

/// 由映射后的类下标体生成逐体素训练权重.
///
/// 基础权重为 median frequency balancing: 各类体素数的中位数除以
/// 该类体素数, 上限 `max_weight`. 在此之上按选项叠加:
///
/// 1. `gradient`: 类下标体数值梯度非零处加 `max_edge_weight`;
/// 2. `max_hires_weight`: 深沟与细白质条带掩码处加该权重;
///    `cortex_mask` 同时开启时, 皮层边缘掩码处再加其一半 (向下取整);
/// 3. `mean_filter`: 对结果做边长 3 的均值滤波.
pub fn create_weight_mask(mapped: &ArrayView3<'_, u16>, opts: WeightMaskOptions) -> Array3<f32> {
    let mut counts = BTreeMap::new();
    for &p in mapped.iter() {
        *counts.entry(p).or_insert(0usize) += 1;
    }

    let mut sorted: Vec<usize> = counts.values().copied().collect();
    sorted.sort_unstable();
    let n = sorted.len();
    let median = if n % 2 == 1 {
        sorted[n / 2] as f64
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) as f64 / 2.0
    };

    // 权重按类下标的取值建索引, 即使体积中缺了某些类也不会错位.
    let weight_of: BTreeMap<u16, f32> = counts
        .iter()
        .map(|(&p, &c)| (p, ((median / c as f64) as f32).min(opts.max_weight)))
        .collect();
    // 权重表与计数表同源, 查表总能命中, 可直接 unwrap.
    let mut weights = mapped.mapv(|p| *weight_of.get(&p).unwrap());

    if opts.gradient {
        let float = mapped.mapv(f64::from);
        let gx = gradient_axis(&float.view(), Axis(0));
        let gy = gradient_axis(&float.view(), Axis(1));
        let gz = gradient_axis(&float.view(), Axis(2));
        Zip::from(&mut weights)
            .and(&gx)
            .and(&gy)
            .and(&gz)
            .for_each(|w, &x, &y, &z| {
                if x != 0.0 || y != 0.0 || z != 0.0 {
                    *w += opts.max_edge_weight;
                }
            });
    }

    if let Some(hires) = opts.max_hires_weight {
        info!("附加深沟与细白质条带权重 {hires}");
        let sulci = deep_sulci_and_wm_strand_mask(mapped, opts.ctx_thresh);
        Zip::from(&mut weights).and(&sulci).for_each(|w, &m| {
            if m {
                *w += hires;
            }
        });

        if opts.cortex_mask {
            info!("附加皮层边缘权重");
            let border = cortex_border_mask(mapped, opts.ctx_thresh);
            let half = (hires / 2.0).floor();
            Zip::from(&mut weights).and(&border).for_each(|w, &m| {
                if m {
                    *w += half;
                }
            });
        }
    }

    if opts.mean_filter {
        let as_f64 = weights.mapv(f64::from);
        weights = uniform_filter_3d(&as_f64.view(), 3).mapv(|w| w as f32);
    }

    weights
}

/// 皮层附近一体素尺度的深沟与细白质条带掩码.
///
/// 皮层二值图与其 26-相邻闭运算结果的异或: 被闭运算填上的沟底体素
/// 与被抹掉的细条带体素都会被标出.
pub fn deep_sulci_and_wm_strand_mask(
    mapped: &ArrayView3<'_, u16>,
    ctx_thresh: u16,
) -> Array3<bool> {
    let cortex = mapped.mapv(|p| p > ctx_thresh);
    let closed = binary_closing(&cortex.view(), Connectivity::C26);
    Zip::from(&cortex).and(&closed).map_collect(|&a, &b| a != b)
}

/// 脑掩码边缘上属于皮层的体素掩码.
///
/// 非零类下标构成脑掩码, 与其 26-相邻腐蚀结果相减得到一层边缘壳,
/// 壳上类下标不超过 `ctx_thresh` 的体素再被剔除.
pub fn cortex_border_mask(mapped: &ArrayView3<'_, u16>, ctx_thresh: u16) -> Array3<bool> {
    let brain = mapped.mapv(|p| p > 0);
    let eroded = binary_erosion(&brain.view(), Connectivity::C26);
    Zip::from(&brain)
        .and(&eroded)
        .and(mapped)
        .map_collect(|&b, &e, &p| b && !e && p > ctx_thresh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    #[test]
    fn test_median_frequency_with_gradient() {
        let mapped = Array3::from_shape_vec((1, 1, 4), vec![0u16, 0, 1, 2]).unwrap();
        let weights = create_weight_mask(&mapped.view(), WeightMaskOptions::default());

        // 计数 {0: 2, 1: 1, 2: 1}, 中位数 1. 梯度在后三个体素处非零.
        assert_eq!(weights[(0, 0, 0)], 0.5);
        assert_eq!(weights[(0, 0, 1)], 5.5);
        assert_eq!(weights[(0, 0, 2)], 6.0);
        assert_eq!(weights[(0, 0, 3)], 6.0);
    }

    #[test]
    fn test_weight_upper_bound() {
        let mut mapped = Array3::from_elem((4, 4, 4), 0u16);
        mapped[(1, 1, 1)] = 7;
        let opts = WeightMaskOptions::default();
        let weights = create_weight_mask(&mapped.view(), opts);
        let limit = opts.max_weight + opts.max_edge_weight;
        assert!(weights.iter().all(|&w| w <= limit));
        // 孤立体素的基础权重被压到上限; 中心差分在该点两侧相抵, 梯度为 0.
        assert_eq!(weights[(1, 1, 1)], opts.max_weight);
    }

    #[test]
    fn test_uniform_volume_mean_filter() {
        let mapped = Array3::from_elem((3, 3, 3), 4u16);
        let opts = WeightMaskOptions {
            mean_filter: true,
            ..Default::default()
        };
        let weights = create_weight_mask(&mapped.view(), opts);
        // 单一类, 无梯度, 均值滤波后仍为常数 1.
        assert!(weights.iter().all(|&w| w == 1.0));
    }

    #[test]
    fn test_deep_sulci_marks_filled_hole() {
        let mut mapped = Array3::from_elem((5, 5, 5), 40u16);
        mapped[(2, 2, 2)] = 0;
        let mask = deep_sulci_and_wm_strand_mask(&mapped.view(), 33);
        // 中心孔被闭运算填上, 因而被标出; 其余内部体素不变.
        assert!(mask[(2, 2, 2)]);
        assert!(!mask[(2, 2, 1)]);
    }

    #[test]
    fn test_cortex_border_keeps_cortex_shell() {
        // 外壳为皮层 parcel, 内部为皮层下类.
        let mut mapped = Array3::from_elem((5, 5, 5), 40u16);
        for h in 1..4 {
            for w in 1..4 {
                for d in 1..4 {
                    mapped[(h, w, d)] = 2;
                }
            }
        }
        let mask = cortex_border_mask(&mapped.view(), 33);
        assert!(mask[(0, 0, 0)]);
        assert!(mask[(0, 2, 2)]);
        assert!(!mask[(2, 2, 2)]);
        assert!(!mask[(1, 1, 1)]);
    }
}
