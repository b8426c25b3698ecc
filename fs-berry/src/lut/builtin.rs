//! 内置的两张标准 LUT: aparc.DKTatlas+aseg (79 类) 与 aseg (36 类).
//!
//! 行序即类下标序, 与训练所用的 LUT 文件逐行一致.
//! 颜色沿用 FreeSurferColorLUT 的惯用配色, 仅用于可视化.

use once_cell::sync::Lazy;

use super::ColorLut;
use crate::LabelId;

const DKT_ASEG_ROWS: [(LabelId, &str, [u8; 4]); 79] = [
    (0, "Unknown", [0, 0, 0, 0]),
    (2, "Left-Cerebral-White-Matter", [245, 245, 245, 0]),
    (4, "Left-Lateral-Ventricle", [120, 18, 134, 0]),
    (5, "Left-Inf-Lat-Vent", [196, 58, 250, 0]),
    (7, "Left-Cerebellum-White-Matter", [220, 248, 164, 0]),
    (8, "Left-Cerebellum-Cortex", [230, 148, 34, 0]),
    (10, "Left-Thalamus-Proper", [0, 118, 14, 0]),
    (11, "Left-Caudate", [122, 186, 220, 0]),
    (12, "Left-Putamen", [236, 13, 176, 0]),
    (13, "Left-Pallidum", [12, 48, 255, 0]),
    (14, "3rd-Ventricle", [204, 182, 142, 0]),
    (15, "4th-Ventricle", [42, 204, 164, 0]),
    (16, "Brain-Stem", [119, 159, 176, 0]),
    (17, "Left-Hippocampus", [220, 216, 20, 0]),
    (18, "Left-Amygdala", [103, 255, 255, 0]),
    (24, "CSF", [60, 60, 60, 0]),
    (26, "Left-Accumbens-area", [255, 165, 0, 0]),
    (28, "Left-VentralDC", [165, 42, 42, 0]),
    (31, "Left-choroid-plexus", [0, 200, 200, 0]),
    (41, "Right-Cerebral-White-Matter", [245, 245, 245, 0]),
    (43, "Right-Lateral-Ventricle", [120, 18, 134, 0]),
    (44, "Right-Inf-Lat-Vent", [196, 58, 250, 0]),
    (46, "Right-Cerebellum-White-Matter", [220, 248, 164, 0]),
    (47, "Right-Cerebellum-Cortex", [230, 148, 34, 0]),
    (49, "Right-Thalamus-Proper", [0, 118, 14, 0]),
    (50, "Right-Caudate", [122, 186, 220, 0]),
    (51, "Right-Putamen", [236, 13, 176, 0]),
    (52, "Right-Pallidum", [13, 48, 255, 0]),
    (53, "Right-Hippocampus", [220, 216, 20, 0]),
    (54, "Right-Amygdala", [103, 255, 255, 0]),
    (58, "Right-Accumbens-area", [255, 165, 0, 0]),
    (60, "Right-VentralDC", [165, 42, 42, 0]),
    (63, "Right-choroid-plexus", [0, 200, 221, 0]),
    (77, "WM-hypointensities", [200, 70, 255, 0]),
    (1002, "ctx-lh-caudalanteriorcingulate", [125, 100, 160, 0]),
    (1003, "ctx-lh-caudalmiddlefrontal", [100, 25, 0, 0]),
    (1005, "ctx-lh-cuneus", [220, 20, 100, 0]),
    (1006, "ctx-lh-entorhinal", [220, 20, 10, 0]),
    (1007, "ctx-lh-fusiform", [180, 220, 140, 0]),
    (1008, "ctx-lh-inferiorparietal", [220, 60, 220, 0]),
    (1009, "ctx-lh-inferiortemporal", [180, 40, 120, 0]),
    (1010, "ctx-lh-isthmuscingulate", [140, 20, 140, 0]),
    (1011, "ctx-lh-lateraloccipital", [20, 30, 140, 0]),
    (1012, "ctx-lh-lateralorbitofrontal", [35, 75, 50, 0]),
    (1013, "ctx-lh-lingual", [225, 140, 140, 0]),
    (1014, "ctx-lh-medialorbitofrontal", [200, 35, 75, 0]),
    (1015, "ctx-lh-middletemporal", [160, 100, 50, 0]),
    (1016, "ctx-lh-parahippocampal", [20, 220, 60, 0]),
    (1017, "ctx-lh-paracentral", [60, 220, 60, 0]),
    (1018, "ctx-lh-parsopercularis", [220, 180, 140, 0]),
    (1019, "ctx-lh-parsorbitalis", [20, 100, 50, 0]),
    (1020, "ctx-lh-parstriangularis", [220, 60, 20, 0]),
    (1021, "ctx-lh-pericalcarine", [120, 100, 60, 0]),
    (1022, "ctx-lh-postcentral", [220, 20, 20, 0]),
    (1023, "ctx-lh-posteriorcingulate", [220, 180, 220, 0]),
    (1024, "ctx-lh-precentral", [60, 20, 220, 0]),
    (1025, "ctx-lh-precuneus", [160, 140, 180, 0]),
    (1026, "ctx-lh-rostralanteriorcingulate", [80, 20, 140, 0]),
    (1027, "ctx-lh-rostralmiddlefrontal", [75, 50, 125, 0]),
    (1028, "ctx-lh-superiorfrontal", [20, 220, 160, 0]),
    (1029, "ctx-lh-superiorparietal", [20, 180, 140, 0]),
    (1030, "ctx-lh-superiortemporal", [140, 220, 220, 0]),
    (1031, "ctx-lh-supramarginal", [80, 160, 20, 0]),
    (1034, "ctx-lh-transversetemporal", [150, 150, 200, 0]),
    (1035, "ctx-lh-insula", [255, 192, 32, 0]),
    (2002, "ctx-rh-caudalanteriorcingulate", [125, 100, 160, 0]),
    (2005, "ctx-rh-cuneus", [220, 20, 100, 0]),
    (2010, "ctx-rh-isthmuscingulate", [140, 20, 140, 0]),
    (2012, "ctx-rh-lateralorbitofrontal", [35, 75, 50, 0]),
    (2013, "ctx-rh-lingual", [225, 140, 140, 0]),
    (2014, "ctx-rh-medialorbitofrontal", [200, 35, 75, 0]),
    (2016, "ctx-rh-parahippocampal", [20, 220, 60, 0]),
    (2017, "ctx-rh-paracentral", [60, 220, 60, 0]),
    (2021, "ctx-rh-pericalcarine", [120, 100, 60, 0]),
    (2022, "ctx-rh-postcentral", [220, 20, 20, 0]),
    (2023, "ctx-rh-posteriorcingulate", [220, 180, 220, 0]),
    (2024, "ctx-rh-precentral", [60, 20, 220, 0]),
    (2025, "ctx-rh-precuneus", [160, 140, 180, 0]),
    (2028, "ctx-rh-superiorfrontal", [20, 220, 160, 0]),
];

const ASEG_ROWS: [(LabelId, &str, [u8; 4]); 36] = [
    (0, "Unknown", [0, 0, 0, 0]),
    (2, "Left-Cerebral-White-Matter", [245, 245, 245, 0]),
    (3, "Left-Cerebral-Cortex", [205, 62, 78, 0]),
    (4, "Left-Lateral-Ventricle", [120, 18, 134, 0]),
    (5, "Left-Inf-Lat-Vent", [196, 58, 250, 0]),
    (7, "Left-Cerebellum-White-Matter", [220, 248, 164, 0]),
    (8, "Left-Cerebellum-Cortex", [230, 148, 34, 0]),
    (10, "Left-Thalamus-Proper", [0, 118, 14, 0]),
    (11, "Left-Caudate", [122, 186, 220, 0]),
    (12, "Left-Putamen", [236, 13, 176, 0]),
    (13, "Left-Pallidum", [12, 48, 255, 0]),
    (14, "3rd-Ventricle", [204, 182, 142, 0]),
    (15, "4th-Ventricle", [42, 204, 164, 0]),
    (16, "Brain-Stem", [119, 159, 176, 0]),
    (17, "Left-Hippocampus", [220, 216, 20, 0]),
    (18, "Left-Amygdala", [103, 255, 255, 0]),
    (24, "CSF", [60, 60, 60, 0]),
    (26, "Left-Accumbens-area", [255, 165, 0, 0]),
    (28, "Left-VentralDC", [165, 42, 42, 0]),
    (31, "Left-choroid-plexus", [0, 200, 200, 0]),
    (41, "Right-Cerebral-White-Matter", [245, 245, 245, 0]),
    (42, "Right-Cerebral-Cortex", [205, 62, 78, 0]),
    (43, "Right-Lateral-Ventricle", [120, 18, 134, 0]),
    (44, "Right-Inf-Lat-Vent", [196, 58, 250, 0]),
    (46, "Right-Cerebellum-White-Matter", [220, 248, 164, 0]),
    (47, "Right-Cerebellum-Cortex", [230, 148, 34, 0]),
    (49, "Right-Thalamus-Proper", [0, 118, 14, 0]),
    (50, "Right-Caudate", [122, 186, 220, 0]),
    (51, "Right-Putamen", [236, 13, 176, 0]),
    (52, "Right-Pallidum", [13, 48, 255, 0]),
    (53, "Right-Hippocampus", [220, 216, 20, 0]),
    (54, "Right-Amygdala", [103, 255, 255, 0]),
    (58, "Right-Accumbens-area", [255, 165, 0, 0]),
    (60, "Right-VentralDC", [165, 42, 42, 0]),
    (63, "Right-choroid-plexus", [0, 200, 221, 0]),
    (77, "WM-hypointensities", [200, 70, 255, 0]),
];

pub(super) static DKT_ASEG: Lazy<ColorLut> = Lazy::new(|| {
    // 字面值表已保证 ID 互不相同, 不会失败.
    ColorLut::from_rows(DKT_ASEG_ROWS).unwrap()
});

pub(super) static ASEG: Lazy<ColorLut> = Lazy::new(|| {
    // 字面值表已保证 ID 互不相同, 不会失败.
    ColorLut::from_rows(ASEG_ROWS).unwrap()
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_tables_valid() {
        assert_eq!(ColorLut::dkt_aseg().len(), 79);
        assert_eq!(ColorLut::aseg().len(), 36);
    }

    #[test]
    fn test_aseg_extends_dkt_by_coarse_cortex() {
        let dkt = ColorLut::dkt_aseg();
        for (id, name, _) in ColorLut::aseg().iter() {
            if matches!(id, 3 | 42) {
                assert!(name.ends_with("Cerebral-Cortex"));
                assert_eq!(dkt.position(id), None);
            } else {
                assert_eq!(dkt.name_of(id), Some(name));
            }
        }
    }
}
