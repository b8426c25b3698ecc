//! FreeSurfer 风格 color LUT 的解析与查询.
//!
//! LUT 文本格式: 以 `#` 开头的行是注释; 首个非注释行必须是表头,
//! 且前两列为 `ID` 和 `LabelName`, 随后是 `R` `G` `B` `A` 四个颜色列.
//! 分隔符由文件扩展名决定: `.tsv` 用制表符, `.csv` 用逗号,
//! `.txt` 用单个空格.
//!
//! LUT 的行序即类下标序: 第 i 行的标签对应网络输出的第 i 个类通道.

use std::collections::{BTreeMap, BTreeSet};
use std::ffi::OsStr;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::str::FromStr;

use itertools::izip;

use crate::LabelId;

mod builtin;

/// 矢状位标签空间的默认裁剪前缀: 名字以此开头的行不进入矢状位空间.
pub const SAGITTAL_DROP_PREFIXES: (&str, &str) = ("Left-", "ctx-rh");

/// 皮层下结构去偏侧化的默认前缀对.
pub const LATERAL_PREFIXES: (&str, &str) = ("Left-", "Right-");

/// LUT 文件解析过程中可能产生的错误.
#[derive(Debug)]
pub enum FormatError {
    /// 文件扩展名不在 tsv/csv/txt 之列, 无法确定分隔符.
    UnknownExtension(String),

    /// 读文件失败.
    IoError(std::io::Error),

    /// 表格解析失败.
    CsvError(csv::Error),

    /// 表头缺失或前两列不是 `ID` 和 `LabelName`.
    BadHeader,

    /// 某一行缺列或含无法解析的字段, 附带行号.
    BadRow(u64),

    /// 同一标签 ID 出现了不止一次.
    DuplicateId(LabelId),
}

/// 一张按行序承载 (标签 ID, 名字, RGBA 颜色) 的 color LUT.
///
/// 行序有语义: 它定义了标签空间的类下标顺序.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorLut {
    ids: Vec<LabelId>,
    names: Vec<String>,
    colors: Vec<[u8; 4]>,
}

impl ColorLut {
    /// 按行序从 (ID, 名字, 颜色) 元组构造 LUT. ID 重复时返回 `Err`.
    pub fn from_rows<S, I>(rows: I) -> Result<Self, FormatError>
    where
        S: Into<String>,
        I: IntoIterator<Item = (LabelId, S, [u8; 4])>,
    {
        let mut seen = BTreeSet::new();
        let mut ids = Vec::new();
        let mut names = Vec::new();
        let mut colors = Vec::new();
        for (id, name, color) in rows {
            if !seen.insert(id) {
                return Err(FormatError::DuplicateId(id));
            }
            ids.push(id);
            names.push(name.into());
            colors.push(color);
        }
        Ok(Self { ids, names, colors })
    }

    /// 内置的 aparc.DKTatlas+aseg 79 类 LUT.
    pub fn dkt_aseg() -> &'static ColorLut {
        &builtin::DKT_ASEG
    }

    /// 内置的 aseg 36 类 LUT.
    pub fn aseg() -> &'static ColorLut {
        &builtin::ASEG
    }

    /// 获取行数 (类个数).
    #[inline]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// 判断 LUT 是否为空.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// 按行序获取全部标签 ID.
    #[inline]
    pub fn ids(&self) -> &[LabelId] {
        &self.ids
    }

    /// 获取能按行序迭代 (标签 ID, 名字, 颜色) 的迭代器.
    pub fn iter(&self) -> impl Iterator<Item = (LabelId, &str, [u8; 4])> {
        izip!(&self.ids, &self.names, &self.colors)
            .map(|(&id, name, &color)| (id, name.as_str(), color))
    }

    /// 查询标签 `id` 的行号 (即类下标). 查不到时返回 `None`.
    #[inline]
    pub fn position(&self, id: LabelId) -> Option<usize> {
        self.ids.iter().position(|&p| p == id)
    }

    /// 查询标签 `id` 的名字. 查不到时返回 `None`.
    pub fn name_of(&self, id: LabelId) -> Option<&str> {
        self.position(id).map(|i| self.names[i].as_str())
    }

    /// 查询标签 `id` 的 RGBA 颜色. 查不到时返回 `None`.
    pub fn color_of(&self, id: LabelId) -> Option<[u8; 4]> {
        self.position(id).map(|i| self.colors[i])
    }
}

/// 从本地路径打开并解析 LUT 文件. 分隔符由扩展名决定.
pub fn read_lut<P: AsRef<Path>>(path: P) -> Result<ColorLut, FormatError> {
    let path = path.as_ref();
    let delimiter = match path.extension().and_then(OsStr::to_str) {
        Some("tsv") => b'\t',
        Some("csv") => b',',
        Some("txt") => b' ',
        other => {
            return Err(FormatError::UnknownExtension(
                other.unwrap_or_default().to_string(),
            ))
        }
    };
    let file = File::open(path).map_err(FormatError::IoError)?;
    parse_lut(BufReader::new(file), delimiter)
}

/// 从任意 `Read` 对象解析 LUT 文本, 字段分隔符为 `delimiter`.
pub fn parse_lut<R: Read>(reader: R, delimiter: u8) -> Result<ColorLut, FormatError> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .comment(Some(b'#'))
        .trim(csv::Trim::All)
        .has_headers(true)
        .from_reader(reader);

    {
        let headers = rdr.headers().map_err(FormatError::CsvError)?;
        if headers.get(0) != Some("ID") || headers.get(1) != Some("LabelName") {
            return Err(FormatError::BadHeader);
        }
    }

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record.map_err(FormatError::CsvError)?;
        let line = record.position().map_or(0, |p| p.line());
        let id = parse_field(&record, 0, line)?;
        let name = record.get(1).ok_or(FormatError::BadRow(line))?.to_string();
        let color = [
            parse_field(&record, 2, line)?,
            parse_field(&record, 3, line)?,
            parse_field(&record, 4, line)?,
            parse_field(&record, 5, line)?,
        ];
        rows.push((id, name, color));
    }
    ColorLut::from_rows(rows)
}

/// 解析 `record` 的第 `index` 个字段, 缺列或解析失败时报 `BadRow`.
fn parse_field<T: FromStr>(
    record: &csv::StringRecord,
    index: usize,
    line: u64,
) -> Result<T, FormatError> {
    record
        .get(index)
        .and_then(|field| field.parse().ok())
        .ok_or(FormatError::BadRow(line))
}

/// 从 LUT 构造皮层下结构的左→右标签对应表.
///
/// 名字去掉 `prefixes.0` / `prefixes.1` 前缀后相同的两行配成一对,
/// 键为左侧 ID, 值为右侧 ID. 没有配对对象的行不会出现在结果中.
pub fn unify_lateralized_labels(
    lut: &ColorLut,
    prefixes: (&str, &str),
) -> BTreeMap<LabelId, LabelId> {
    let (left, right) = prefixes;
    let rights: BTreeMap<&str, LabelId> = lut
        .iter()
        .filter_map(|(id, name, _)| name.strip_prefix(right).map(|stem| (stem, id)))
        .collect();
    lut.iter()
        .filter_map(|(id, name, _)| {
            let stem = name.strip_prefix(left)?;
            rights.get(stem).map(|&rid| (id, rid))
        })
        .collect()
}

/// 从 LUT 按行序提取 (全标签空间, 矢状位标签空间) 两份标签清单.
///
/// 矢状位清单剔除名字以 `drop_prefixes` 任一前缀开头的行,
/// 其余行保持原有行序.
pub fn get_labels_from_lut(
    lut: &ColorLut,
    drop_prefixes: (&str, &str),
) -> (Vec<LabelId>, Vec<LabelId>) {
    let full = lut.ids().to_vec();
    let sagittal = lut
        .iter()
        .filter_map(|(id, name, _)| {
            (!name.starts_with(drop_prefixes.0) && !name.starts_with(drop_prefixes.1))
                .then_some(id)
        })
        .collect();
    (full, sagittal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::LEFT_RIGHT_SUBCORTICAL;

    const TINY_TSV: &str = "\
# 一个两行的小 LUT.
ID\tLabelName\tR\tG\tB\tA
0\tUnknown\t0\t0\t0\t0
2\tLeft-Cerebral-White-Matter\t245\t245\t245\t0
";

    #[test]
    fn test_parse_tiny() {
        let lut = parse_lut(TINY_TSV.as_bytes(), b'\t').unwrap();
        assert_eq!(lut.len(), 2);
        assert_eq!(lut.ids(), &[0, 2]);
        assert_eq!(lut.position(2), Some(1));
        assert_eq!(lut.name_of(2), Some("Left-Cerebral-White-Matter"));
        assert_eq!(lut.color_of(2), Some([245, 245, 245, 0]));
        assert_eq!(lut.color_of(7), None);
    }

    #[test]
    fn test_parse_space_separated() {
        let text = "ID LabelName R G B A\n0 Unknown 0 0 0 0\n24 CSF 60 60 60 0\n";
        let lut = parse_lut(text.as_bytes(), b' ').unwrap();
        assert_eq!(lut.ids(), &[0, 24]);
    }

    #[test]
    fn test_bad_header() {
        let text = "Index\tName\tR\tG\tB\tA\n0\tUnknown\t0\t0\t0\t0\n";
        assert!(matches!(
            parse_lut(text.as_bytes(), b'\t'),
            Err(FormatError::BadHeader)
        ));
    }

    #[test]
    fn test_bad_row() {
        let text = "ID\tLabelName\tR\tG\tB\tA\n0\tUnknown\t0\t0\t0\t0\nx\tBroken\t0\t0\t0\t0\n";
        assert!(matches!(
            parse_lut(text.as_bytes(), b'\t'),
            Err(FormatError::BadRow(_))
        ));
    }

    #[test]
    fn test_duplicate_id() {
        let text = "ID\tLabelName\tR\tG\tB\tA\n7\tA\t0\t0\t0\t0\n7\tB\t0\t0\t0\t0\n";
        assert!(matches!(
            parse_lut(text.as_bytes(), b'\t'),
            Err(FormatError::DuplicateId(7))
        ));
    }

    #[test]
    fn test_unknown_extension() {
        assert!(matches!(
            read_lut("lut.json"),
            Err(FormatError::UnknownExtension(_))
        ));
    }

    #[test]
    fn test_unify_aseg_matches_builtin_pairs() {
        let expected: BTreeMap<_, _> = LEFT_RIGHT_SUBCORTICAL.into_iter().collect();
        let unified = unify_lateralized_labels(ColorLut::aseg(), LATERAL_PREFIXES);
        assert_eq!(unified, expected);
    }

    #[test]
    fn test_unify_dkt_has_no_cortex_pair() {
        // DKT 空间没有粗皮层标签, 因此少了 (3, 42) 这一对.
        let mut expected: BTreeMap<_, _> = LEFT_RIGHT_SUBCORTICAL.into_iter().collect();
        expected.remove(&3);
        let unified = unify_lateralized_labels(ColorLut::dkt_aseg(), LATERAL_PREFIXES);
        assert_eq!(unified, expected);
    }

    #[test]
    fn test_label_list_sizes() {
        let (full, sag) = get_labels_from_lut(ColorLut::dkt_aseg(), SAGITTAL_DROP_PREFIXES);
        assert_eq!((full.len(), sag.len()), (79, 51));
        let (full, sag) = get_labels_from_lut(ColorLut::aseg(), SAGITTAL_DROP_PREFIXES);
        assert_eq!((full.len(), sag.len()), (36, 21));
    }

    #[test]
    fn test_builtin_row_order() {
        let dkt = ColorLut::dkt_aseg();
        assert_eq!(dkt.position(0), Some(0));
        assert_eq!(dkt.position(77), Some(33));
        assert_eq!(dkt.position(1002), Some(34));
        assert_eq!(dkt.position(1035), Some(64));
        assert_eq!(dkt.position(2002), Some(65));
        assert_eq!(dkt.position(2028), Some(78));
        assert_eq!(dkt.position(3), None);
        assert_eq!(ColorLut::aseg().position(42), Some(21));
    }
}
