//! 指纹、分类与单文件记录
use serde::Serialize;

/// 单个选中的指纹：源码行号 + gram 哈希
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Snippet {
    pub line: u32,
    pub hash: u32,
}

/// 单文件的指纹序列
///
/// 不变式：行号单调不减；相邻两项不会是相同的 `(line, hash)`。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Fingerprint {
    snippets: Vec<Snippet>,
}

impl Fingerprint {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一项；与上一项完全相同时折叠，返回是否真正追加
    pub(crate) fn push(&mut self, snippet: Snippet) -> bool {
        if let Some(last) = self.snippets.last() {
            debug_assert!(last.line <= snippet.line, "fingerprint lines must not decrease");
            if *last == snippet {
                return false;
            }
        }
        self.snippets.push(snippet);
        true
    }

    pub(crate) fn last_line(&self) -> Option<u32> {
        self.snippets.last().map(|s| s.line)
    }

    pub fn snippets(&self) -> &[Snippet] {
        &self.snippets
    }

    pub fn len(&self) -> usize {
        self.snippets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snippets.is_empty()
    }

    pub fn hashes(&self) -> impl Iterator<Item = u32> + '_ {
        self.snippets.iter().map(|s| s.hash)
    }

    /// 按行号分组（线格式中同一行的哈希写在一起）
    pub fn by_line(&self) -> impl Iterator<Item = (u32, &[Snippet])> + '_ {
        self.snippets
            .chunk_by(|a, b| a.line == b.line)
            .map(|group| (group[0].line, group))
    }
}

/// 文件分类结果：是否生成了 snippet，没有的话原因是什么
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileClass {
    /// 正常生成 snippet（可能为空：归一化后不足一个 gram）
    Snippets,
    /// 小于最小文件大小
    TooSmall,
    /// 判定为二进制
    Binary,
    /// 超过最大文件大小
    TooLarge,
    /// 按选项或内容特征（结构化数据、超长行、扩展名）跳过 snippet
    SnippetsSkipped,
    /// 从已有 WFP 文本读回，线格式不携带分类
    Imported,
}

impl FileClass {
    /// 是否被策略排除在 snippet 计算之外
    pub fn is_excluded(&self) -> bool {
        matches!(self, Self::TooSmall | Self::Binary | Self::TooLarge | Self::SnippetsSkipped)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Snippets => "snippets",
            Self::TooSmall => "too_small",
            Self::Binary => "binary",
            Self::TooLarge => "too_large",
            Self::SnippetsSkipped => "snippets_skipped",
            Self::Imported => "imported",
        }
    }
}

/// 单文件记录：路径、整文件 MD5、原始大小与指纹。创建后不可变。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRecord {
    path: String,
    md5: String,
    size: u64,
    class: FileClass,
    fingerprint: Fingerprint,
}

impl FileRecord {
    pub(crate) fn new(path: String, md5: String, size: u64, class: FileClass, fingerprint: Fingerprint) -> Self {
        Self { path, md5, size, class, fingerprint }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// 原始字节的 MD5（小写十六进制）
    pub fn md5(&self) -> &str {
        &self.md5
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn class(&self) -> FileClass {
        self.class
    }

    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }
}
