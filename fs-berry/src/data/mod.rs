use std::collections::{BTreeMap, BTreeSet};
use std::ops::{Index, IndexMut};
use std::path::Path;

use ndarray::{Array3, ArrayView, ArrayView2, ArrayViewMut, ArrayViewMut2, Axis, Ix3};
use nifti::{IntoNdArray, NiftiHeader, NiftiObject, ReaderOptions};

use crate::{Idx2d, Idx3d, LabelId, Predicate};

pub mod render;
pub mod reorient;

/// `NiftiHeader` 是栈上大对象, 移动该对象的开销很可观.
/// 因此我们将其分配到堆上.
type BoxedHeader = Box<NiftiHeader>;

/// nii 格式 3D 脑部 MRI 扫描, 包括 header 和 conform 后的灰度体.
/// 灰度值以 `u8` 保存.
#[derive(Debug, Clone)]
pub struct MriScan {
    header: BoxedHeader,
    data: Array3<u8>,
}

/// 将 (W, H, D) 转换成 (H, W, D). 以后均按照该模式访问.
#[inline]
fn get_shape_from_header(h: &NiftiHeader) -> Idx3d {
    // [W, H, D]. 体素个数数组.
    let [_, w, h, d, ..] = h.dim;
    (h as usize, w as usize, d as usize)
}

/// 3D MRI nii 文件 header 的共用属性和部分通用操作.
pub trait NiftiHeaderAttr {
    /// 获取 header 部分.
    fn header(&self) -> &NiftiHeader;

    /// 获取数据形状大小.
    #[inline]
    fn shape(&self) -> Idx3d {
        get_shape_from_header(self.header())
    }

    /// 获取数据深度方向切片的形状大小.
    #[inline]
    fn slice_shape(&self) -> Idx2d {
        let (h, w, _) = self.shape();
        (h, w)
    }

    /// 获取深度方向切片个数.
    #[inline]
    fn len_d(&self) -> usize {
        self.shape().2
    }

    /// 获取数据体素个数.
    #[inline]
    fn size(&self) -> usize {
        let (h, w, d) = self.shape();
        h * w * d
    }

    /// 检查索引是否合法.
    #[inline]
    fn check(&self, (h0, w0, d0): &Idx3d) -> bool {
        let (h, w, d) = self.shape();
        *h0 < h && *w0 < w && *d0 < d
    }

    /// 获取单个体素分辨率. 该分辨率以毫米为单位, 分别代表高
    /// (体素行方向), 宽 (体素列方向), 深 (相邻切片方向).
    ///
    /// 该值也可以通过 `self.{height_mm, width_mm, depth_mm}` 分别获取.
    #[inline]
    fn pix_dim(&self) -> [f64; 3] {
        let [_, w, h, d, ..] = self.header().pixdim;
        [h as f64, w as f64, d as f64]
    }

    /// 获取 height 方向体素分辨率, 以毫米为单位.
    #[inline]
    fn height_mm(&self) -> f64 {
        self.header().pixdim[2] as f64
    }

    /// 获取 width 方向体素分辨率, 以毫米为单位.
    #[inline]
    fn width_mm(&self) -> f64 {
        self.header().pixdim[1] as f64
    }

    /// 获取深度方向 (相邻切片的方向) 体素分辨率, 以毫米为单位.
    #[inline]
    fn depth_mm(&self) -> f64 {
        self.header().pixdim[3] as f64
    }

    /// 体素分辨率在三个维度上是否是各向同的?
    ///
    /// conform 过的体应当满足该性质.
    #[inline]
    fn is_isotropic(&self) -> bool {
        let [h, w, d] = self.pix_dim();
        h == w && h == d
    }

    /// 获取体素的实际体积值, 以立方毫米为单位.
    #[inline]
    fn voxel(&self) -> f64 {
        self.pix_dim().iter().product()
    }

    /// 获取深度切片方向的像素实际面积值, 以平方毫米为单位.
    #[inline]
    fn slice_pixel(&self) -> f64 {
        self.pix_dim().iter().take(2).product()
    }
}

impl NiftiHeaderAttr for MriScan {
    #[inline]
    fn header(&self) -> &NiftiHeader {
        &self.header
    }
}

impl Index<Idx3d> for MriScan {
    type Output = u8;

    #[inline]
    fn index(&self, index: Idx3d) -> &Self::Output {
        &self.data[index]
    }
}

impl IndexMut<Idx3d> for MriScan {
    #[inline]
    fn index_mut(&mut self, index: Idx3d) -> &mut Self::Output {
        &mut self.data[index]
    }
}

impl MriScan {
    /// 打开 nii 文件格式的 3D MRI 扫描. `path` 为 nii 文件的本地路径.
    /// 如果打开成功, 则返回 `Ok(Self)`, 否则返回 `Err`.
    pub fn open<P: AsRef<Path>>(path: P) -> nifti::Result<Self> {
        let obj = ReaderOptions::new().read_file(path.as_ref())?;
        let header = Box::new(obj.header().clone());

        // [W, H, D] -> [H, W, D].
        // 交换前两轴后不再是行优先布局, 这里统一落一次拷贝.
        let data = obj
            .into_volume()
            .into_ndarray()?
            .permuted_axes([1, 0, 2].as_slice())
            .as_standard_layout()
            .into_owned();
        debug_assert!(data.is_standard_layout());

        // 该操作不会生成 `Err`, 可直接 unwrap.
        let data =
            Array3::<u8>::from_shape_vec(get_shape_from_header(&header), data.into_raw_vec())
                .unwrap();

        Ok(Self { header, data })
    }

    /// 获取 3D 扫描深度方向的第 `d_index` 层切片视图.
    ///
    /// 当 `d_index` 越界时 panic.
    #[inline]
    pub fn slice_at(&self, d_index: usize) -> ArrayView2<'_, u8> {
        self.data.index_axis(Axis(2), d_index)
    }

    /// 获取 3D 扫描深度方向的第 `d_index` 层可变切片视图.
    ///
    /// 当 `d_index` 越界时 panic.
    #[inline]
    pub fn slice_at_mut(&mut self, d_index: usize) -> ArrayViewMut2<'_, u8> {
        self.data.index_axis_mut(Axis(2), d_index)
    }

    /// 获取能按升序迭代 3D 扫描深度方向不可变切片的迭代器.
    #[inline]
    pub fn slice_iter(&self) -> impl ExactSizeIterator<Item = ArrayView2<'_, u8>> {
        self.data.axis_iter(Axis(2))
    }

    /// 获取能按升序迭代 3D 扫描深度方向可变切片的迭代器.
    #[inline]
    pub fn slice_iter_mut(&mut self) -> impl ExactSizeIterator<Item = ArrayViewMut2<'_, u8>> {
        self.data.axis_iter_mut(Axis(2))
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView<'_, u8, Ix3> {
        self.data.view()
    }

    /// 获得数据的一份可变 shallow copy.
    #[inline]
    pub fn data_mut(&mut self) -> ArrayViewMut<'_, u8, Ix3> {
        self.data.view_mut()
    }
}

/// nii 格式 3D 脑部分割标注, 包括 header 和标签体.
/// 标签值以 `u16` 保存.
#[derive(Debug, Clone)]
pub struct MriLabel {
    header: BoxedHeader,
    data: Array3<LabelId>,
}

impl NiftiHeaderAttr for MriLabel {
    #[inline]
    fn header(&self) -> &NiftiHeader {
        &self.header
    }
}

impl Index<Idx3d> for MriLabel {
    type Output = LabelId;

    #[inline]
    fn index(&self, index: Idx3d) -> &Self::Output {
        &self.data[index]
    }
}

impl IndexMut<Idx3d> for MriLabel {
    #[inline]
    fn index_mut(&mut self, index: Idx3d) -> &mut Self::Output {
        &mut self.data[index]
    }
}

impl MriLabel {
    /// 打开 nii 文件格式的 3D 分割标注. `path` 为 nii 文件的本地路径.
    /// 如果打开成功, 则返回 `Ok(Self)`, 否则返回 `Err`.
    pub fn open<P: AsRef<Path>>(path: P) -> nifti::Result<Self> {
        let obj = ReaderOptions::new().read_file(path.as_ref())?;
        let header = Box::new(obj.header().clone());

        // [W, H, D] -> [H, W, D].
        // 交换前两轴后不再是行优先布局, 这里统一落一次拷贝.
        let data = obj
            .into_volume()
            .into_ndarray::<LabelId>()?
            .permuted_axes([1, 0, 2].as_slice())
            .as_standard_layout()
            .into_owned();
        debug_assert!(data.is_standard_layout());

        // 该操作不会生成 `Err`, 可直接 unwrap.
        let data =
            Array3::<LabelId>::from_shape_vec(get_shape_from_header(&header), data.into_raw_vec())
                .unwrap();

        Ok(Self { header, data })
    }

    /// 根据裸标签数据和体素分辨率直接创建 `MriLabel` 实体.
    ///
    /// # 参数
    ///
    /// 1. `data` 按照 (H, W, D) 组织.
    /// 2. `pix_dim` 按照 \[height_mm, width_mm, depth_mm\] 给出.
    ///
    /// # 注意
    ///
    /// 该方法可能会创建不一致的实体, 因此你应仅将其用于实验目的.
    pub fn fake(data: Array3<LabelId>, pix_dim: [f32; 3]) -> Self {
        let (h, w, d) = data.dim();

        let mut header = Box::<NiftiHeader>::default();
        header.dim = [3, w as u16, h as u16, d as u16, 1, 1, 1, 1];
        let [_, pw, ph, pd, ..] = &mut header.pixdim;
        let [hh, ww, dd] = &pix_dim;
        (*ph, *pw, *pd) = (*hh, *ww, *dd);
        header.intent_name[..4].copy_from_slice(b"fake");

        Self { header, data }
    }

    /// 在已有 header 的基础上直接创建数据.
    ///
    /// `header` 的 dim 字段必须与 `data` 的形状一致, 否则程序 panic.
    ///
    /// # 注意
    ///
    /// 该方法可能会创建不一致的实体, 因此你应仅将其用于实验目的.
    pub fn fake_with_header(header: &NiftiHeader, data: Array3<LabelId>) -> Self {
        let mut header = Box::new(header.clone());
        assert_eq!(
            get_shape_from_header(&header),
            data.dim(),
            "header 与标签数据形状不一致"
        );
        header.intent_name[..4].copy_from_slice(b"fake");
        Self { header, data }
    }

    /// 判断该结构是否是由 `fake_*` 方法手动拼接的.
    pub fn is_faked(&self) -> bool {
        self.header.intent_name.starts_with(b"fake")
    }

    /// 获取 3D 标注深度方向的第 `d_index` 层不可变切片.
    ///
    /// 当 `d_index` 越界时 panic.
    #[inline]
    pub fn slice_at(&self, d_index: usize) -> ArrayView2<'_, LabelId> {
        self.data.index_axis(Axis(2), d_index)
    }

    /// 获取 3D 标注深度方向的第 `d_index` 层可变切片.
    ///
    /// 当 `d_index` 越界时 panic.
    #[inline]
    pub fn slice_at_mut(&mut self, d_index: usize) -> ArrayViewMut2<'_, LabelId> {
        self.data.index_axis_mut(Axis(2), d_index)
    }

    /// 获取能按升序迭代 3D 标注深度方向不可变切片的迭代器.
    #[inline]
    pub fn slice_iter(&self) -> impl ExactSizeIterator<Item = ArrayView2<'_, LabelId>> {
        self.data.axis_iter(Axis(2))
    }

    /// 获取能按升序迭代 3D 标注深度方向可变切片的迭代器.
    #[inline]
    pub fn slice_iter_mut(&mut self) -> impl ExactSizeIterator<Item = ArrayViewMut2<'_, LabelId>> {
        self.data.axis_iter_mut(Axis(2))
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView<'_, LabelId, Ix3> {
        self.data.view()
    }

    /// 获得数据的一份可变 shallow copy.
    #[inline]
    pub fn data_mut(&mut self) -> ArrayViewMut<'_, LabelId, Ix3> {
        self.data.view_mut()
    }

    /// 获取 3D 标注中值为 `label` 的体素个数.
    #[inline]
    pub fn count(&self, label: LabelId) -> usize {
        self.data.iter().filter(|p| **p == label).count()
    }

    /// 收集 3D 标注中出现过的所有标签值, 按升序排列.
    pub fn unique(&self) -> Vec<LabelId> {
        let set: BTreeSet<LabelId> = self.data.iter().copied().collect();
        set.into_iter().collect()
    }

    /// 统计 3D 标注中每个标签值对应的体素个数.
    pub fn histogram(&self) -> BTreeMap<LabelId, usize> {
        let mut hist = BTreeMap::new();
        for &p in self.data.iter() {
            *hist.entry(p).or_insert(0usize) += 1;
        }
        hist
    }

    /// 将 3D 标注中值为 `old` 的体素全部替换为 `new`.
    ///
    /// 返回总共成功替换的个数.
    pub fn replace(&mut self, old: LabelId, new: LabelId) -> usize {
        let mut cnt = 0usize;
        self.data_mut()
            .iter_mut()
            .filter(|pix| **pix == old)
            .for_each(|p| {
                cnt += 1;
                *p = new;
            });
        cnt
    }

    /// 收集满足谓词 `pred` 的所有体素对应的下标, 结果按行优先存储.
    pub fn filter_pos(&self, pred: Predicate) -> Vec<Idx3d> {
        self.data
            .indexed_iter()
            .filter_map(|(ref pos, pixel)| pred(*pixel).then_some(*pos))
            .collect()
    }

    /// 清理皮层噪声标签, 并将可安全合并的右半球皮层 parcel 并入左半球.
    ///
    /// 细节参见 [`crate::post_proc::fuse_cortex_labels`].
    #[inline]
    pub fn fuse_cortex(&mut self) {
        crate::post_proc::fuse_cortex_labels(&mut self.data);
    }

    /// 按半球质心与高斯投票重新划分中线附近皮层 parcel 的偏侧归属.
    ///
    /// 细节参见 [`crate::post_proc::split_cortex_labels`].
    #[inline]
    pub fn split_cortex(&mut self) {
        crate::post_proc::split_cortex_labels(&mut self.data);
    }
}

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use rayon::iter::{IndexedParallelIterator, IntoParallelIterator, ParallelIterator};
    }
}

/// 并发操作部分
#[cfg(feature = "rayon")]
impl MriLabel {
    /// 借助 `rayon`, 并行地对 3D 标注每个深度方向可变切片实施 `op` 操作.
    pub fn par_for_each_slice_mut<F>(&mut self, op: F)
    where
        F: Fn(ArrayViewMut2<'_, LabelId>) + Sync + Send,
    {
        self.data_mut()
            .axis_iter_mut(Axis(2))
            .into_par_iter()
            .for_each(|v| {
                op(v);
            });
    }

    /// 借助 `rayon`, 并行地对 3D 标注每个深度方向不可变切片实施 `op` 操作.
    pub fn par_for_each_slice<F>(&self, op: F)
    where
        F: Fn(ArrayView2<'_, LabelId>) + Sync + Send,
    {
        self.data()
            .axis_iter(Axis(2))
            .into_par_iter()
            .for_each(|v| {
                op(v);
            });
    }

    /// 借助 `rayon`, 并行地对 3D 标注每个深度方向可变切片实施 `op` 操作.
    /// 该操作会同时携带深度方向索引信息.
    pub fn par_for_each_indexed_slice_mut<F>(&mut self, op: F)
    where
        F: Fn(usize, ArrayViewMut2<'_, LabelId>) + Sync + Send,
    {
        self.data_mut()
            .axis_iter_mut(Axis(2))
            .into_par_iter()
            .enumerate()
            .for_each(|(i, v)| {
                op(i, v);
            });
    }

    /// 借助 `rayon`, 并行地对 3D 标注每个深度方向不可变切片实施 `op` 操作.
    /// 该操作会同时携带深度方向索引信息.
    pub fn par_for_each_indexed_slice<F>(&self, op: F)
    where
        F: Fn(usize, ArrayView2<'_, LabelId>) + Sync + Send,
    {
        self.data()
            .axis_iter(Axis(2))
            .into_par_iter()
            .enumerate()
            .for_each(|(i, v)| {
                op(i, v);
            });
    }

    /// 借助 `rayon`, 并行地将 3D 标注中值为 `old` 的体素全部替换为 `new`.
    ///
    /// 返回总共成功替换的个数.
    pub fn par_replace(&mut self, old: LabelId, new: LabelId) -> usize {
        let cnt = AtomicUsize::new(0);
        self.data_mut()
            .axis_iter_mut(Axis(2))
            .into_par_iter()
            .for_each(|mut v| {
                let mut local = 0usize;
                v.iter_mut().filter(|pix| **pix == old).for_each(|p| {
                    local += 1;
                    *p = new;
                });
                cnt.fetch_add(local, Ordering::Release);
            });

        cnt.load(Ordering::Acquire)
    }
}

/// nii 格式的 3D MRI 扫描与对应的分割标注.
///
/// 该结构完全透明, 仅包含两个公开的 `scan` 和 `label` 子结构,
/// 用户可以直接使用它们来实现相关上层功能.
///
/// # 注意
///
/// 两个子结构的数据一致性由用户保证, 否则程序行为未定义.
#[derive(Debug, Clone)]
pub struct MriData3d {
    /// 3D MRI 扫描.
    pub scan: MriScan,

    /// 3D 分割标注.
    pub label: MriLabel,
}

impl MriData3d {
    /// 分别打开 nii 文件格式的 3D MRI 扫描和对应标注. 如果任一文件打开失败,
    /// 则返回 `Err`. 若两个文件的数据形状不一致, 则程序 `panic`.
    pub fn open(scan_path: impl AsRef<Path>, label_path: impl AsRef<Path>) -> nifti::Result<Self> {
        let scan = MriScan::open(scan_path.as_ref())?;
        let label = MriLabel::open(label_path.as_ref())?;
        assert_eq!(scan.shape(), label.shape(), "MRI 扫描和标注形状不一致");
        Ok(Self { scan, label })
    }

    /// 获取深度方向切片个数.
    #[inline]
    pub fn len_d(&self) -> usize {
        self.label.len_d()
    }

    /// 依次获取 3D 扫描和 3D 标注深度方向的第 `d_index` 层不可变切片.
    ///
    /// 当 `d_index` 越界时 panic.
    #[inline]
    pub fn slice_at(&self, d_index: usize) -> (ArrayView2<'_, u8>, ArrayView2<'_, LabelId>) {
        (self.scan.slice_at(d_index), self.label.slice_at(d_index))
    }

    /// 获取能按升序迭代 3D (扫描, 标注) 深度方向不可变切片的迭代器.
    #[inline]
    pub fn slice_iter(
        &self,
    ) -> impl ExactSizeIterator<Item = (ArrayView2<'_, u8>, ArrayView2<'_, LabelId>)> {
        self.scan.slice_iter().zip(self.label.slice_iter())
    }

    /// 获取能按行优先序迭代 3D (扫描, 标注) 体素的迭代器.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&u8, &LabelId)> {
        self.scan.data.iter().zip(self.label.data.iter())
    }
}

/// 参与同一操作的两个体数据形状不一致.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeMismatchError {
    /// 期望的形状.
    pub expected: Vec<usize>,

    /// 实际给出的形状.
    pub got: Vec<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    fn small_label() -> MriLabel {
        let mut data = Array3::zeros((4, 5, 6));
        data[(0, 0, 0)] = 2;
        data[(1, 2, 3)] = 41;
        data[(2, 2, 2)] = 41;
        data[(3, 4, 5)] = 1003;
        MriLabel::fake(data, [1.0, 1.0, 1.0])
    }

    #[test]
    fn test_fake_dims() {
        let label = small_label();
        assert!(label.is_faked());
        assert_eq!(label.shape(), (4, 5, 6));
        assert_eq!(label.slice_shape(), (4, 5));
        assert_eq!(label.len_d(), 6);
        assert_eq!(label.size(), 120);
        assert!(label.is_isotropic());
        assert_eq!(label.voxel(), 1.0);
    }

    #[test]
    fn test_fake_anisotropic() {
        let label = MriLabel::fake(Array3::zeros((2, 2, 2)), [1.0, 1.0, 3.0]);
        assert!(!label.is_isotropic());
        assert_eq!(label.depth_mm(), 3.0);
        assert_eq!(label.voxel(), 3.0);
        assert_eq!(label.slice_pixel(), 1.0);
    }

    #[test]
    #[should_panic(expected = "形状不一致")]
    fn test_fake_with_header_shape_check() {
        let label = small_label();
        MriLabel::fake_with_header(label.header(), Array3::zeros((1, 1, 1)));
    }

    #[test]
    fn test_check() {
        let label = small_label();
        assert!(label.check(&(3, 4, 5)));
        assert!(!label.check(&(4, 0, 0)));
        assert!(!label.check(&(0, 0, 6)));
    }

    #[test]
    fn test_count_replace_unique() {
        let mut label = small_label();
        assert_eq!(label.count(41), 2);
        assert_eq!(label.replace(41, 2), 2);
        assert_eq!(label.count(41), 0);
        assert_eq!(label.count(2), 3);
        assert_eq!(label.unique(), vec![0, 2, 1003]);
        assert_eq!(label.histogram()[&2], 3);
    }

    #[test]
    fn test_filter_pos() {
        let label = small_label();
        let pos = label.filter_pos(crate::consts::ids::is_cortex);
        assert_eq!(pos, vec![(3, 4, 5)]);
    }

    #[test]
    fn test_index_roundtrip() {
        let mut label = small_label();
        label[(0, 1, 2)] = 77;
        assert_eq!(label[(0, 1, 2)], 77);
        assert_eq!(label.slice_at(2)[(0, 1)], 77);
    }

    #[cfg(feature = "rayon")]
    #[test]
    fn test_par_replace() {
        let mut serial = small_label();
        let mut parallel = serial.clone();
        let expected = serial.replace(41, 63);
        assert_eq!(parallel.par_replace(41, 63), expected);
        assert_eq!(serial.data(), parallel.data());
    }
}
