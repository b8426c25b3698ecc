//! 归并皮层 parcel 的左右重分侧 (后处理).

use ndarray::{Array3, Zip};

use crate::consts::{ids, SPLIT_CORTEX_LABELS, SPLIT_PROBLEM_LABELS};
use crate::morph::{
    gaussian_blur_3d, label_components, largest_connected_component, mask_centroid, Connectivity,
};
use crate::LabelId;

/// 左右白质指示函数高斯模糊的标准差.
const HEMI_BLUR_SIGMA: f64 = 3.0;

#[inline]
fn squared_distance(a: (f64, f64, f64), b: (f64, f64, f64)) -> f64 {
    let (dx, dy, dz) = (a.0 - b.0, a.1 - b.1, a.2 - b.2);
    dx * dx + dy * dy + dz * dz
}

/// 将归并到左侧区间的皮层 parcel 重新分配到左右半球.
///
/// 算法流程依次为:
///
/// 1. 取左右脑白质 (2 与 41) 各自的最大 26-相邻连通域并计算质心;
/// 2. 对每个归并 parcel 的每个 26-相邻连通域, 质心严格离右侧白质
///    更近的整体平移到右侧区间 (加 1000);
/// 3. 对少数容易跨中线的 parcel, 以左右白质指示函数的高斯模糊
///    逐体素重新表决.
///
/// # 注意
///
/// 输入中找不到左侧或右侧脑白质时程序 panic.
pub fn split_cortex_labels(seg: &mut Array3<LabelId>) {
    use ordered_float::NotNan;

    // step 1: 半球锚点取各侧白质最大连通域的质心.
    let rh_mask = seg.mapv(|p| p == ids::RIGHT_CEREBRAL_WM);
    let rh_mask = largest_connected_component(&rh_mask.view(), Connectivity::C26);
    assert!(rh_mask.iter().any(|&m| m), "分割体中找不到右侧脑白质");
    let lh_mask = seg.mapv(|p| p == ids::LEFT_CEREBRAL_WM);
    let lh_mask = largest_connected_component(&lh_mask.view(), Connectivity::C26);
    assert!(lh_mask.iter().any(|&m| m), "分割体中找不到左侧脑白质");

    // 上面已断言掩码非空, 质心总是存在, 可直接 unwrap.
    let rh_centroid = mask_centroid(&rh_mask.view()).unwrap();
    let lh_centroid = mask_centroid(&lh_mask.view()).unwrap();

    // step 2: 逐 parcel, 逐连通域表决归属. 距离并列时取排在前面的左侧.
    let anchors = [(lh_centroid, 0u16), (rh_centroid, ids::CTX_LATERAL_OFFSET)];
    for &label in SPLIT_CORTEX_LABELS.iter() {
        let mask = seg.mapv(|p| p == label);
        let (comps, count) = label_components(&mask.view(), Connectivity::C26);
        for c in 1..=count {
            let comp = comps.mapv(|q| q == c);
            // 连通域标号保证非空, 可直接 unwrap.
            let centroid = mask_centroid(&comp.view()).unwrap();
            let &(_, shift) = anchors
                .iter()
                .min_by_key(|(anchor, _)| {
                    NotNan::<f64>::new(squared_distance(centroid, *anchor)).unwrap()
                })
                .unwrap();
            if shift == 0 {
                continue;
            }
            Zip::from(&mut *seg).and(&comp).for_each(|p, &m| {
                if m {
                    *p = label + shift;
                }
            });
        }
    }

    // step 3: 问题 parcel 逐体素重新表决.
    let lh_ind = seg.mapv(|p| {
        if p == ids::LEFT_CEREBRAL_WM {
            1000.0
        } else {
            0.0
        }
    });
    let rh_ind = seg.mapv(|p| {
        if p == ids::RIGHT_CEREBRAL_WM {
            1000.0
        } else {
            0.0
        }
    });
    let lh_blur = gaussian_blur_3d(&lh_ind.view(), HEMI_BLUR_SIGMA);
    let rh_blur = gaussian_blur_3d(&rh_ind.view(), HEMI_BLUR_SIGMA);

    for &problem in SPLIT_PROBLEM_LABELS.iter() {
        let rh_label = problem + ids::CTX_LATERAL_OFFSET;
        Zip::from(&mut *seg)
            .and(&lh_blur)
            .and(&rh_blur)
            .for_each(|p, &l, &r| {
                if *p == problem || *p == rh_label {
                    *p = if r > l { rh_label } else { problem };
                }
            });
    }
}
