//! 分割切片的可视化渲染.
//!
//! 标签值本身不适合直接看, 这里借助 LUT 把切片着色成 RGB 图,
//! 用于人工抽查后处理结果.

use std::path::Path;

use image::{ImageResult, Rgb, RgbImage};
use ndarray::ArrayView2;

use crate::lut::ColorLut;
use crate::LabelId;

/// LUT 中查不到的标签统一渲染为洋红色, 便于肉眼发现问题.
const MISSING_COLOR: [u8; 3] = [255, 0, 255];

/// 按 LUT 颜色将一张标签切片渲染为 RGB 图像.
pub fn render_label_slice(slice: &ArrayView2<'_, LabelId>, lut: &ColorLut) -> RgbImage {
    let (height, width) = slice.dim();
    let mut buf = RgbImage::new(width as u32, height as u32);
    for ((h, w), &pix) in slice.indexed_iter() {
        let [r, g, b] = match lut.color_of(pix) {
            Some([r, g, b, _]) => [r, g, b],
            None => MISSING_COLOR,
        };
        buf.put_pixel(w as u32, h as u32, Rgb([r, g, b]));
    }
    buf
}

/// 按 LUT 颜色将一张标签切片保存为图像文件. 格式由扩展名决定.
pub fn save_label_slice<P: AsRef<Path>>(
    slice: &ArrayView2<'_, LabelId>,
    lut: &ColorLut,
    path: P,
) -> ImageResult<()> {
    render_label_slice(slice, lut).save(path)
}

/// 将一张灰度扫描切片按原样保存为图像文件. 格式由扩展名决定.
pub fn save_scan_slice<P: AsRef<Path>>(slice: &ArrayView2<'_, u8>, path: P) -> ImageResult<()> {
    let (height, width) = slice.dim();
    let mut buf = image::GrayImage::new(width as u32, height as u32);
    for ((h, w), &pix) in slice.indexed_iter() {
        buf.put_pixel(w as u32, h as u32, image::Luma([pix]));
    }
    buf.save(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_render_lut_colors() {
        let slice = array![[0u16, 2], [41, 9999]];
        let img = render_label_slice(&slice.view(), ColorLut::aseg());
        assert_eq!(img.dimensions(), (2, 2));
        assert_eq!(img.get_pixel(0, 0).0, [0, 0, 0]);
        assert_eq!(img.get_pixel(1, 0).0, [245, 245, 245]);
        assert_eq!(img.get_pixel(0, 1).0, [245, 245, 245]);
        // 未知标签必须以洋红色显形.
        assert_eq!(img.get_pixel(1, 1).0, MISSING_COLOR);
    }
}
