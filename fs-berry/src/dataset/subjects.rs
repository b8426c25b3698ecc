//! subject 目录树风格数据集的 MRI 加载器.
//!
//! 数据集根目录下每个 subject 一个子目录, 体数据统一放在
//! `{subject}/mri/` 下. 提供迭代器风格的数据集获取模式.

use std::io;
use std::path::{Path, PathBuf};

use crate::{MriData3d, MriLabel, MriScan};

/// subject 目录下存放 MRI 体数据的子目录名.
pub const MRI_DIR: &str = "mri";

/// 默认的灰度体文件名.
pub const DEFAULT_SCAN_NAME: &str = "orig.nii.gz";

/// 默认的真值标注文件名.
pub const DEFAULT_LABEL_NAME: &str = "aparc.DKTatlas+aseg.nii.gz";

/// 列出 `root` 下所有 subject 目录名, 按字典序排序.
///
/// 只统计子目录, 根目录下的普通文件被忽略.
pub fn list_subjects<P: AsRef<Path>>(root: P) -> io::Result<Vec<String>> {
    let mut subjects = Vec::new();
    for entry in std::fs::read_dir(root.as_ref())? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            subjects.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    subjects.sort_unstable();
    Ok(subjects)
}

/// 从指定 subject 清单和数据集根目录创建灰度体 ([`MriScan`]) 加载器.
///
/// # 注意
///
/// 1. `root` 必须是目录, 否则程序 panic.
/// 2. 每个 subject `s` 必须在 `root/s/mri/` 下有名为 `name` 的 nifti 文件,
///   否则加载器在迭代时会返回 `Result::Error`.
pub fn scan_loader<I, P>(subjects: I, root: P, name: &str) -> ScanLoader
where
    I: IntoIterator<Item = String>,
    P: AsRef<Path>,
{
    let root = root.as_ref().to_owned();
    assert!(root.is_dir());

    let mut subjects: Vec<String> = subjects.into_iter().collect();
    subjects.reverse();

    ScanLoader {
        root,
        subjects_rev: subjects,
        name: name.to_owned(),
    }
}

/// 从数据集根目录创建灰度体加载器, 按字典序迭代根目录下所有 subject.
/// 文件名取 [`DEFAULT_SCAN_NAME`].
///
/// # 注意
///
/// `root` 必须是目录, 否则程序 panic.
pub fn full_scan_loader<P: AsRef<Path>>(root: P) -> io::Result<ScanLoader> {
    let subjects = list_subjects(root.as_ref())?;
    Ok(scan_loader(subjects, root, DEFAULT_SCAN_NAME))
}

/// 3D 灰度体数据加载器.
#[derive(Debug)]
pub struct ScanLoader {
    root: PathBuf,
    subjects_rev: Vec<String>,
    name: String,
}

impl Iterator for ScanLoader {
    type Item = (String, nifti::Result<MriScan>);

    fn next(&mut self) -> Option<Self::Item> {
        let subject = self.subjects_rev.pop()?;

        self.root.push(&subject);
        self.root.push(MRI_DIR);
        self.root.push(&self.name);
        let data = MriScan::open(self.root.as_path());
        self.root.pop();
        self.root.pop();
        self.root.pop();

        Some((subject, data))
    }
}

impl ExactSizeIterator for ScanLoader {
    #[inline]
    fn len(&self) -> usize {
        self.subjects_rev.len()
    }
}

/// 从指定 subject 清单和数据集根目录创建标注体 ([`MriLabel`]) 加载器.
///
/// # 注意
///
/// 1. `root` 必须是目录, 否则程序 panic.
/// 2. 每个 subject `s` 必须在 `root/s/mri/` 下有名为 `name` 的 nifti 文件,
///   否则加载器在迭代时会返回 `Result::Error`.
pub fn label_loader<I, P>(subjects: I, root: P, name: &str) -> LabelLoader
where
    I: IntoIterator<Item = String>,
    P: AsRef<Path>,
{
    let root = root.as_ref().to_owned();
    assert!(root.is_dir());

    let mut subjects: Vec<String> = subjects.into_iter().collect();
    subjects.reverse();

    LabelLoader {
        root,
        subjects_rev: subjects,
        name: name.to_owned(),
    }
}

/// 从数据集根目录创建标注体加载器, 按字典序迭代根目录下所有 subject.
/// 文件名取 [`DEFAULT_LABEL_NAME`].
///
/// # 注意
///
/// `root` 必须是目录, 否则程序 panic.
pub fn full_label_loader<P: AsRef<Path>>(root: P) -> io::Result<LabelLoader> {
    let subjects = list_subjects(root.as_ref())?;
    Ok(label_loader(subjects, root, DEFAULT_LABEL_NAME))
}

/// 3D 标注体数据加载器.
#[derive(Debug)]
pub struct LabelLoader {
    root: PathBuf,
    subjects_rev: Vec<String>,
    name: String,
}

impl Iterator for LabelLoader {
    type Item = (String, nifti::Result<MriLabel>);

    fn next(&mut self) -> Option<Self::Item> {
        let subject = self.subjects_rev.pop()?;

        self.root.push(&subject);
        self.root.push(MRI_DIR);
        self.root.push(&self.name);
        let data = MriLabel::open(self.root.as_path());
        self.root.pop();
        self.root.pop();
        self.root.pop();

        Some((subject, data))
    }
}

impl ExactSizeIterator for LabelLoader {
    #[inline]
    fn len(&self) -> usize {
        self.subjects_rev.len()
    }
}

/// 从指定 subject 清单和数据集根目录创建成对数据 ([`MriData3d`]) 加载器.
///
/// # 注意
///
/// 1. `root` 必须是目录, 否则程序 panic.
/// 2. 每个 subject `s` 必须在 `root/s/mri/` 下同时有名为 `scan_name` 和
///   `label_name` 的 nifti 文件, 否则加载器在迭代时会返回 `Result::Error`.
/// 3. 同一 subject 的灰度体和标注体必须一一对应, 否则程序行为未定义.
pub fn data_loader<I, P>(subjects: I, root: P, scan_name: &str, label_name: &str) -> SubjectLoader
where
    I: IntoIterator<Item = String>,
    P: AsRef<Path>,
{
    let root = root.as_ref().to_owned();
    assert!(root.is_dir());

    let mut subjects: Vec<String> = subjects.into_iter().collect();
    subjects.reverse();

    SubjectLoader {
        root,
        subjects_rev: subjects,
        scan_name: scan_name.to_owned(),
        label_name: label_name.to_owned(),
    }
}

/// 从数据集根目录创建成对数据加载器, 按字典序迭代根目录下所有 subject.
/// 文件名取 [`DEFAULT_SCAN_NAME`] 与 [`DEFAULT_LABEL_NAME`].
///
/// # 注意
///
/// `root` 必须是目录, 否则程序 panic.
pub fn full_data_loader<P: AsRef<Path>>(root: P) -> io::Result<SubjectLoader> {
    let subjects = list_subjects(root.as_ref())?;
    Ok(data_loader(
        subjects,
        root,
        DEFAULT_SCAN_NAME,
        DEFAULT_LABEL_NAME,
    ))
}

/// 3D 成对数据 (scan + label) 加载器.
#[derive(Debug)]
pub struct SubjectLoader {
    root: PathBuf,
    subjects_rev: Vec<String>,
    scan_name: String,
    label_name: String,
}

impl Iterator for SubjectLoader {
    type Item = (String, nifti::Result<MriData3d>);

    fn next(&mut self) -> Option<Self::Item> {
        let subject = self.subjects_rev.pop()?;

        self.root.push(&subject);
        self.root.push(MRI_DIR);
        let scan_path = self.root.join(&self.scan_name);
        let label_path = self.root.join(&self.label_name);
        let data = MriData3d::open(&scan_path, &label_path);
        self.root.pop();
        self.root.pop();

        Some((subject, data))
    }
}

impl ExactSizeIterator for SubjectLoader {
    #[inline]
    fn len(&self) -> usize {
        self.subjects_rev.len()
    }
}
