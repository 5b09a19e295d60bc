//! 单文件指纹：分类 → 整文件 MD5 → 归一化/gram 哈希/winnowing
//!
//! 本模块不做任何 I/O，字节缓冲由调用方（目录扫描或 CLI）读取后传入。
use md5::{Digest, Md5};

use crate::gram::{is_stripped, GramHasher};
use crate::options::WinnowConfig;
use crate::types::{FileClass, FileRecord, Fingerprint};
use crate::winnow::winnow;

/// 二进制判定只看前 8 KiB
pub(crate) const BINARY_SAMPLE: usize = 8 * 1024;
/// 首行达到该长度视为压缩/生成代码，不生成 snippet
pub(crate) const MAX_LONG_LINE: usize = 1000;

/// 不生成 snippet 的扩展名（只输出整文件哈希）
const SKIP_SNIPPET_EXT: &[&str] = &[
    ".exe", ".zip", ".tar", ".tgz", ".gz", ".7z", ".rar", ".jar", ".war", ".ear", ".class", ".pyc",
    ".o", ".a", ".so", ".obj", ".dll", ".lib", ".out", ".app", ".bin",
    ".lst", ".dat", ".json", ".htm", ".html", ".xml", ".md", ".txt",
    ".doc", ".docx", ".xls", ".xlsx", ".ppt", ".pptx", ".odt", ".ods", ".odp", ".pages", ".key", ".numbers",
    ".pdf", ".min.js", ".mf", ".sum",
];

/// 结构化数据的开头（已去除前导空白并转小写）
const STRUCTURED_PREFIXES: &[&[u8]] = &[b"{", b"[", b"<?xml", b"<html", b"<ac3d", b"<!doc"];

/// 原始字节的 MD5（小写十六进制）
pub fn md5_hex(content: &[u8]) -> String {
    Md5::digest(content).iter().map(|b| format!("{:02x}", b)).collect()
}

/// 只跑 gram 哈希 + winnowing，不做分类
pub fn fingerprint_content(content: &[u8], cfg: &WinnowConfig) -> Fingerprint {
    let hasher = GramHasher::new(cfg.gram);
    winnow(hasher.grams(content), cfg.window)
}

/// 文件分类，按顺序命中即止：过小 → 二进制 → 过大 → 跳过 snippet → 正常
pub fn classify(path: &str, content: &[u8], cfg: &WinnowConfig) -> FileClass {
    let size = content.len() as u64;
    if size < cfg.min_file_size {
        return FileClass::TooSmall;
    }
    if is_probably_binary(content) {
        return FileClass::Binary;
    }
    if size > cfg.max_file_size {
        return FileClass::TooLarge;
    }
    if cfg.skip_snippets || skip_snippets_for(path, content) {
        return FileClass::SnippetsSkipped;
    }
    FileClass::Snippets
}

/// 为单个文件生成记录；被排除的文件指纹为空，但整文件哈希总是存在
pub fn fingerprint_file(path: &str, content: &[u8], cfg: &WinnowConfig) -> FileRecord {
    let class = classify(path, content, cfg);
    let fingerprint = match class {
        FileClass::Snippets => fingerprint_content(content, cfg),
        _ => Fingerprint::new(),
    };
    FileRecord::new(path.to_string(), md5_hex(content), content.len() as u64, class, fingerprint)
}

/// 判定缓冲区是否“明显是二进制”（只抽样前 8 KiB）：
/// - 含 NUL 字节；
/// - 抽样不是合法 UTF-8（末尾被截断的半个字符不算）；
/// - 可打印字符（非控制字符，含 tab/CR/LF）的字节占比低于 25%。
///
/// 占比按解码后的字符计，中日韩等多字节文本与 ASCII 同等对待。
pub(crate) fn is_probably_binary(buf: &[u8]) -> bool {
    let sample = &buf[..buf.len().min(BINARY_SAMPLE)];
    if sample.is_empty() {
        return false;
    }
    if sample.contains(&0) {
        return true;
    }
    let text = match std::str::from_utf8(sample) {
        Ok(text) => text,
        Err(e) if e.error_len().is_none() => {
            std::str::from_utf8(&sample[..e.valid_up_to()]).unwrap_or_default()
        }
        Err(_) => return true,
    };
    if text.is_empty() {
        return false;
    }
    let printable: usize = text
        .chars()
        .filter(|&c| matches!(c, '\t' | '\n' | '\r') || !c.is_control())
        .map(char::len_utf8)
        .sum();
    (printable as f32) / (text.len() as f32) < 0.25
}

/// 扩展名或内容特征决定是否跳过 snippet
fn skip_snippets_for(path: &str, content: &[u8]) -> bool {
    let lower = path.to_ascii_lowercase();
    if SKIP_SNIPPET_EXT.iter().any(|ext| lower.ends_with(ext)) {
        return true;
    }

    let head = &content[..content.len().min(MAX_LONG_LINE)];
    let start = head.iter().position(|&b| !is_stripped(b)).unwrap_or(head.len());
    let prefix = head[start..].to_ascii_lowercase();
    if STRUCTURED_PREFIXES.iter().any(|p| prefix.starts_with(p)) {
        return true;
    }

    // 首行过长（或大文件根本没有换行）
    match content.iter().position(|&b| b == b'\n') {
        Some(idx) => idx >= MAX_LONG_LINE,
        None => content.len() >= MAX_LONG_LINE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(lines: usize) -> Vec<u8> {
        (0..lines)
            .map(|i| format!("let value_{i} = compute(input_{i}, {i} * factor) + offset;\n"))
            .collect::<String>()
            .into_bytes()
    }

    #[test]
    fn md5_of_raw_bytes() {
        assert_eq!(md5_hex(b""), "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(md5_hex(b"0123456789"), "781e5e245d69b566979b86e28d23f2c7");
    }

    #[test]
    fn tiny_file_has_hash_but_no_snippets() {
        let rec = fingerprint_file("a.c", b"0123456789", &WinnowConfig::default());
        assert_eq!(rec.class(), FileClass::TooSmall);
        assert!(rec.fingerprint().is_empty());
        assert_eq!(rec.md5(), "781e5e245d69b566979b86e28d23f2c7");
        assert_eq!(rec.size(), 10);
    }

    #[test]
    fn nul_byte_means_binary() {
        let mut content = source(20);
        content[100] = 0;
        let rec = fingerprint_file("lib.c", &content, &WinnowConfig::default());
        assert_eq!(rec.class(), FileClass::Binary);
        assert!(rec.fingerprint().is_empty());
        assert_eq!(rec.md5(), md5_hex(&content));
    }

    #[test]
    fn invalid_utf8_means_binary() {
        let mut content = source(20);
        content[50] = 0xFF;
        assert!(is_probably_binary(&content));
    }

    #[test]
    fn truncated_code_point_at_sample_edge_is_text() {
        let mut content = vec![b'a'; BINARY_SAMPLE - 1];
        content.extend_from_slice("é".as_bytes());
        assert!(!is_probably_binary(&content));
    }

    #[test]
    fn cjk_text_is_not_binary() {
        let content: Vec<u8> = (0..40)
            .map(|i| format!("// 第{i}行：计算输入缓冲区的加权结果，并减去偏置量。\n"))
            .collect::<String>()
            .into_bytes();
        assert!(content.len() >= 256);
        assert!(!is_probably_binary(&content));
        let rec = fingerprint_file("notes.rs", &content, &WinnowConfig::default());
        assert_eq!(rec.class(), FileClass::Snippets);
        assert!(!rec.fingerprint().is_empty());
    }

    #[test]
    fn mostly_control_characters_is_binary() {
        let content: Vec<u8> = (0..400).map(|i| if i % 10 == 0 { b'a' } else { 0x01 + (i % 8) as u8 }).collect();
        assert!(is_probably_binary(&content));
    }

    #[test]
    fn vertical_tab_before_structured_prefix_is_skipped() {
        let mut content = b"\x0B\x0C {\"name\": \"pkg\",\n".to_vec();
        content.extend(source(10));
        assert_eq!(classify("data.c", &content, &WinnowConfig::default()), FileClass::SnippetsSkipped);
    }

    #[test]
    fn binary_is_checked_before_size_limit() {
        let cfg = WinnowConfig { max_file_size: 300, ..WinnowConfig::default() };
        let mut content = source(20);
        assert_eq!(classify("x.c", &content, &cfg), FileClass::TooLarge);
        content[0] = 0;
        assert_eq!(classify("x.c", &content, &cfg), FileClass::Binary);
    }

    #[test]
    fn structured_and_minified_content_skips_snippets() {
        let cfg = WinnowConfig::default();
        let mut json = b"  {\"name\": \"pkg\",".to_vec();
        json.extend(source(10));
        assert_eq!(classify("data.c", &json, &cfg), FileClass::SnippetsSkipped);

        let minified = vec![b'x'; 4096];
        assert_eq!(classify("bundle.c", &minified, &cfg), FileClass::SnippetsSkipped);

        assert_eq!(classify("README.MD", &source(20), &cfg), FileClass::SnippetsSkipped);
        assert_eq!(classify("app.min.js", &source(20), &cfg), FileClass::SnippetsSkipped);
        assert_eq!(classify("app.js", &source(20), &cfg), FileClass::Snippets);
    }

    #[test]
    fn skip_snippets_option_wins() {
        let rec = fingerprint_file("main.c", &source(20), &WinnowConfig::skipping_snippets());
        assert_eq!(rec.class(), FileClass::SnippetsSkipped);
        assert!(rec.fingerprint().is_empty());
    }

    #[test]
    fn source_file_gets_snippets() {
        let content = source(40);
        let rec = fingerprint_file("src/main.rs", &content, &WinnowConfig::default());
        assert_eq!(rec.class(), FileClass::Snippets);
        assert!(!rec.fingerprint().is_empty());
        assert_eq!(rec.fingerprint(), &fingerprint_content(&content, &WinnowConfig::default()));
        let last_line = rec.fingerprint().snippets().last().map(|s| s.line).unwrap_or(0);
        assert!(last_line <= 40);
    }
}
