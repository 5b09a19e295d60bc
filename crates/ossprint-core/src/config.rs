//! 配置文件加载（TOML）
//!
//! 所有字段可选，缺省值与远端引擎保持一致：
//! ```toml
//! [winnowing]
//! gram = 30
//! window = 64
//! min_file_size = 256
//! max_file_size = 67108864
//! max_batch_size = 65536
//! skip_snippets = false
//!
//! [scan]
//! threads = 8
//! all_extensions = false
//! all_folders = false
//! all_hidden = false
//! ```
use std::path::Path;

use serde::Deserialize;

use crate::error::Result;
use crate::options::{ScanOptions, WinnowConfig};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct WinnowSection {
    #[serde(default)]
    gram: Option<usize>,
    #[serde(default)]
    window: Option<usize>,
    #[serde(default)]
    min_file_size: Option<u64>,
    #[serde(default)]
    max_file_size: Option<u64>,
    #[serde(default)]
    max_batch_size: Option<usize>,
    #[serde(default)]
    skip_snippets: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ScanSection {
    #[serde(default)]
    threads: Option<usize>,
    #[serde(default)]
    all_extensions: Option<bool>,
    #[serde(default)]
    all_folders: Option<bool>,
    #[serde(default)]
    all_hidden: Option<bool>,
}

/// 顶层配置文件结构
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    winnowing: WinnowSection,
    #[serde(default)]
    scan: ScanSection,
}

/// 从 TOML 文本解析，覆盖到默认值之上并校验
pub fn parse_config(text: &str) -> Result<(WinnowConfig, ScanOptions)> {
    let parsed: ConfigFile = toml::from_str(text)?;
    let w = parsed.winnowing;
    let skip_snippets = w.skip_snippets.unwrap_or(false);
    let base = if skip_snippets { WinnowConfig::skipping_snippets() } else { WinnowConfig::default() };

    let cfg = WinnowConfig {
        gram: w.gram.unwrap_or(base.gram),
        window: w.window.unwrap_or(base.window),
        min_file_size: w.min_file_size.unwrap_or(base.min_file_size),
        max_file_size: w.max_file_size.unwrap_or(base.max_file_size),
        max_batch_size: w.max_batch_size.unwrap_or(base.max_batch_size),
        skip_snippets,
    };
    cfg.validate()?;

    let s = parsed.scan;
    let opts = ScanOptions {
        threads: s.threads,
        all_extensions: s.all_extensions.unwrap_or(false),
        all_folders: s.all_folders.unwrap_or(false),
        all_hidden: s.all_hidden.unwrap_or(false),
        cancel: None,
    };
    Ok((cfg, opts))
}

/// 从配置文件加载
pub fn load_config(path: &Path) -> Result<(WinnowConfig, ScanOptions)> {
    let txt = std::fs::read_to_string(path)?;
    parse_config(&txt)
}
