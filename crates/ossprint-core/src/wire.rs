//! WFP 线格式：记录序列化与回读
//!
//! ```text
//! file=<md5>,<size>,<path>
//! <line>=<hash>,<hash>,...
//! ```
//! 哈希固定 8 位小写十六进制；同一行号的哈希合并在一行。
//! 字段顺序与宽度由远端解析器决定，属于稳定契约。
use std::fmt::Write as _;

use crate::error::{Result, WfpError};
use crate::types::{FileClass, FileRecord, Fingerprint, Snippet};

/// 每条记录的起始标记
pub const WFP_FILE_START: &str = "file=";

/// 把一条记录追加到 `out`
pub fn write_record(out: &mut String, record: &FileRecord) {
    // 写入 String 不会失败
    let _ = writeln!(out, "{}{},{},{}", WFP_FILE_START, record.md5(), record.size(), record.path());
    for (line, group) in record.fingerprint().by_line() {
        let _ = write!(out, "{}=", line);
        for (i, snippet) in group.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            let _ = write!(out, "{:08x}", snippet.hash);
        }
        out.push('\n');
    }
}

/// 单条记录的线格式文本
pub fn record_to_wfp(record: &FileRecord) -> String {
    let mut out = String::new();
    write_record(&mut out, record);
    out
}

/// 统计文本中的记录数（按起始标记计数）
pub fn count_records(text: &str) -> usize {
    text.lines().filter(|l| l.starts_with(WFP_FILE_START)).count()
}

/// 解析 WFP 文本为记录列表；回读的记录分类为 [`FileClass::Imported`]
pub fn parse_wfp(text: &str) -> Result<Vec<FileRecord>> {
    let mut records = Vec::with_capacity(count_records(text));
    let mut current: Option<(String, String, u64, Fingerprint)> = None;

    for (idx, raw) in text.lines().enumerate() {
        let lineno = idx + 1;
        let err = |reason: String| WfpError::Parse { line: lineno, reason };
        if raw.is_empty() {
            continue;
        }

        if let Some(rest) = raw.strip_prefix(WFP_FILE_START) {
            if let Some((path, md5, size, fp)) = current.take() {
                records.push(FileRecord::new(path, md5, size, FileClass::Imported, fp));
            }
            // 路径里可能有逗号，只切前两段
            let mut parts = rest.splitn(3, ',');
            let md5 = parts.next().unwrap_or_default();
            let size = parts.next().ok_or_else(|| err("missing file size".into()))?;
            let path = parts.next().ok_or_else(|| err("missing file path".into()))?;
            if md5.len() != 32 || !md5.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(err(format!("bad content hash {md5:?}")));
            }
            let size = size.parse::<u64>().map_err(|e| err(format!("bad file size {size:?}: {e}")))?;
            current = Some((path.to_string(), md5.to_ascii_lowercase(), size, Fingerprint::new()));
            continue;
        }

        let Some((_, _, _, fp)) = current.as_mut() else {
            return Err(err("snippet line before any file= record".into()));
        };
        let (line, hashes) = raw.split_once('=').ok_or_else(|| err(format!("expected <line>=<hashes>, got {raw:?}")))?;
        let line = line.parse::<u32>().map_err(|e| err(format!("bad line number {line:?}: {e}")))?;
        if fp.last_line().is_some_and(|last| last > line) {
            return Err(err(format!("line number {line} goes backwards")));
        }
        for hash in hashes.split(',') {
            if hash.len() != 8 {
                return Err(err(format!("hash {hash:?} is not 8 hex digits")));
            }
            let hash = u32::from_str_radix(hash, 16).map_err(|e| err(format!("bad hash {hash:?}: {e}")))?;
            fp.push(Snippet { line, hash });
        }
    }

    if let Some((path, md5, size, fp)) = current {
        records.push(FileRecord::new(path, md5, size, FileClass::Imported, fp));
    }
    Ok(records)
}
