use ndarray::{Array3, Ix3, OwnedRepr};
use ndarray_npy::{NpzReader, ReadNpzError};
use std::fs::{File, OpenOptions};
use std::num::NonZeroUsize;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// 打开 `LabelArchive` 错误.
#[derive(Debug)]
pub enum OpenArchiveError {
    /// workers 太大. 最多支持 64.
    TooManyWorkers(u32),

    /// 打开 npz 文件错误.
    ReadNpzError(ReadNpzError),

    /// 其他底层 I/O 错误.
    IoError(std::io::Error),
}

/// 映射标签体的 npz 归档.
///
/// 该结构可用于建模硬盘上已压缩存储的多个 subject 的 3D
/// 类下标体与训练权重体.
pub struct LabelArchive {
    entries: Vec<Mutex<NpzReader<File>>>,
    turn: AtomicUsize,
}

impl std::fmt::Debug for LabelArchive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LabelArchive")
            .field("workers", &self.entries.len())
            .field("turn", &self.turn)
            .finish()
    }
}

impl LabelArchive {
    /// 初始化.
    ///
    /// `workers` 指定底层工作通道的个数, 最大为 64. 系统会从路径 `p` 打开文件
    /// `workers` 次, 并为每个打开通道指定一个排他入口点 (以期获得更高的并行度).
    pub fn new<P: AsRef<Path>>(workers: NonZeroUsize, p: P) -> Result<Self, OpenArchiveError> {
        let workers = workers.get();
        if workers > 64 {
            return Err(OpenArchiveError::TooManyWorkers(64));
        }
        let mut v = Vec::with_capacity(workers);
        for _ in 0..workers {
            let file = OpenOptions::new()
                .read(true)
                .open(p.as_ref())
                .map_err(OpenArchiveError::IoError)?;
            v.push(Mutex::new(
                NpzReader::new(file).map_err(OpenArchiveError::ReadNpzError)?,
            ));
        }
        Ok(Self {
            entries: v,
            turn: AtomicUsize::new(0),
        })
    }

    /// 通过 npz 内部文件名获取 3D 类下标体.
    pub fn label_by_name(&self, name: &str) -> Result<Array3<u16>, ReadNpzError> {
        let slot = self.next_slot();
        let mut file = self.entries[slot].lock().unwrap();
        file.by_name::<OwnedRepr<u16>, Ix3>(name)
    }

    /// 通过文件名 `{subject}.npy` 获取 subject 对应的 3D 类下标体.
    pub fn label_by_subject(&self, subject: &str) -> Result<Array3<u16>, ReadNpzError> {
        let slot = self.next_slot();
        let filename = format!("{subject}.npy");
        let mut file = self.entries[slot].lock().unwrap();
        file.by_name::<OwnedRepr<u16>, Ix3>(filename.as_str())
    }

    /// 通过 npz 内部文件名获取 3D 训练权重体.
    pub fn weight_by_name(&self, name: &str) -> Result<Array3<f32>, ReadNpzError> {
        let slot = self.next_slot();
        let mut file = self.entries[slot].lock().unwrap();
        file.by_name::<OwnedRepr<f32>, Ix3>(name)
    }

    /// 获取底层 npz 文件包含的所有文件名.
    pub fn names(&self) -> Result<Vec<String>, ReadNpzError> {
        let slot = self.next_slot();
        self.entries[slot].lock().unwrap().names()
    }

    /// 通过 npz 数值索引获取 3D 类下标体.
    pub fn label_by_index(&self, index: usize) -> Result<Array3<u16>, ReadNpzError> {
        let slot = self.next_slot();
        let mut file = self.entries[slot].lock().unwrap();
        file.by_index::<OwnedRepr<u16>, Ix3>(index)
    }

    /// 工作通道个数.
    #[inline]
    pub fn worker_len(&self) -> usize {
        self.entries.len()
    }

    /// 底层 npz 文件的条目个数.
    pub fn entry_len(&self) -> usize {
        let slot = self.next_slot();
        self.entries[slot].lock().unwrap().len()
    }

    fn next_slot(&self) -> usize {
        self.turn.fetch_add(1, Ordering::Relaxed) % self.worker_len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;
    use ndarray_npy::NpzWriter;

    #[test]
    fn test_round_robin_read() {
        let path = std::env::temp_dir().join(format!("fs-berry-archive-{}.npz", std::process::id()));

        let mut writer = NpzWriter::new(File::create(&path).unwrap());
        let label = Array3::from_elem((2, 3, 4), 7u16);
        writer.add_array("bert.npy", &label).unwrap();
        let weight = Array3::from_elem((2, 3, 4), 0.5f32);
        writer.add_array("bert.weight.npy", &weight).unwrap();
        writer.finish().unwrap();

        let archive = LabelArchive::new(NonZeroUsize::new(2).unwrap(), &path).unwrap();
        assert_eq!(archive.worker_len(), 2);
        assert_eq!(archive.entry_len(), 2);
        assert_eq!(archive.label_by_subject("bert").unwrap(), label);
        assert_eq!(archive.label_by_name("bert.npy").unwrap(), label);
        assert_eq!(archive.weight_by_name("bert.weight.npy").unwrap(), weight);

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_too_many_workers() {
        let err = LabelArchive::new(NonZeroUsize::new(65).unwrap(), "missing.npz").unwrap_err();
        assert!(matches!(err, OpenArchiveError::TooManyWorkers(64)));
    }

    #[test]
    fn test_missing_file() {
        let missing = std::env::temp_dir().join("fs-berry-no-such-archive.npz");
        let err = LabelArchive::new(NonZeroUsize::new(1).unwrap(), missing).unwrap_err();
        assert!(matches!(err, OpenArchiveError::IoError(_)));
    }
}
