//! 程序运行函数.

use std::env;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::exit;

use fs_berry::prelude::*;
use log::info;
use ndarray::{Array4, Axis};
use ndarray_npy::{ReadNpyExt, WriteNpyExt};

const USAGE: &str = "usage: viewfuse <lut> <coronal.npy> <axial.npy> <sagittal.npy> <out-dir>";

/// 读入一个平面的逐类概率体. 轴序为该平面的原生顺序, 类通道在最后.
fn load_prediction(path: &str) -> Array4<f32> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("打开 {path} 失败: {e}");
            exit(1);
        }
    };
    match Array4::<f32>::read_npy(file) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("读取 {path} 失败: {e}");
            exit(1);
        }
    }
}

/// 实际运行.
pub fn run() {
    let args: Vec<String> = env::args().skip(1).collect();
    if args.len() != 5 {
        eprintln!("{USAGE}");
        exit(2);
    }

    let lut = match read_lut(Path::new(&args[0])) {
        Ok(l) => l,
        Err(e) => {
            eprintln!("读取 LUT 失败: {e:?}");
            exit(1);
        }
    };
    info!("LUT 共 {} 个标签", lut.len());

    let coronal = load_prediction(&args[1]);
    let axial = load_prediction(&args[2]);
    let sagittal = load_prediction(&args[3]);

    info!("还原 axial 与 sagittal 平面的体素顺序");
    let axial = axial_to_coronal_4d(axial);
    let sagittal = sagittal_to_coronal_4d(sagittal);

    let full_classes = coronal.len_of(Axis(3));
    let sag_classes = sagittal.len_of(Axis(3));
    info!("类通道: coronal/axial {full_classes}, sagittal {sag_classes}");

    let num_classes = match (full_classes, sag_classes) {
        (96, _) => 96,
        (_, 51) => 51,
        (_, 21) => 21,
        _ => full_classes,
    };
    let sagittal = match map_prediction_sagittal2full(&sagittal.view(), num_classes, Some(&lut)) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("矢状位通道展开失败: {e:?}");
            exit(1);
        }
    };

    info!("三平面等权平均");
    let mean = match average_views(&[coronal.view(), axial.view(), sagittal.view()]) {
        Ok(m) => m,
        Err(e) => {
            eprintln!(
                "三平面预测形状不一致: expected {:?}, got {:?}",
                e.expected, e.got
            );
            exit(1);
        }
    };
    let classes = hard_labels(&mean.view());

    info!("类下标还原为标签, 并做半球重划分");
    let space = LabelSpace::new(lut.ids().to_vec());
    let mut seg = space.restore_volume(&classes.view());
    split_cortex_labels(&mut seg);

    let out_dir = PathBuf::from(&args[4]);
    if !out_dir.is_dir() {
        if let Err(e) = std::fs::create_dir_all(&out_dir) {
            eprintln!("创建输出目录 {} 失败: {e}", out_dir.display());
            exit(1);
        }
    }

    let seg_path = out_dir.join("seg.npy");
    let file = match File::create(&seg_path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("创建 {} 失败: {e}", seg_path.display());
            exit(1);
        }
    };
    if let Err(e) = seg.write_npy(file) {
        eprintln!("写出 {} 失败: {e}", seg_path.display());
        exit(1);
    }

    let png_path = out_dir.join("seg_mid.png");
    let mid = seg.len_of(Axis(2)) / 2;
    if let Err(e) = save_label_slice(&seg.index_axis(Axis(2), mid), &lut, &png_path) {
        eprintln!("写出 {} 失败: {e}", png_path.display());
        exit(1);
    }

    info!("完成, 结果位于 {}", out_dir.display());
}
