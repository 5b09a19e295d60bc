//! 指纹参数、扫描选项与统计信息（模块）
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use serde::Serialize;

use crate::error::{Result, WfpError};

/// gram 长度（归一化后的字节数）。与远端引擎保持一致，勿随意修改。
pub const DEFAULT_GRAM: usize = 30;
/// winnowing 窗口（gram 哈希个数）
pub const DEFAULT_WINDOW: usize = 64;
/// 小于该大小的文件不生成 snippet
pub const DEFAULT_MIN_FILE_SIZE: u64 = 256;
/// 大于该大小的文件不生成 snippet
pub const DEFAULT_MAX_FILE_SIZE: u64 = 64 * 1024 * 1024; // 64 MiB
/// 单个请求批次的最大序列化字节数
pub const DEFAULT_MAX_BATCH_SIZE: usize = 64 * 1024; // 64 KiB
/// 跳过 snippet 时记录很小，批次上限相应缩小
pub const SKIP_SNIPPETS_MAX_BATCH_SIZE: usize = 8 * 1024; // 8 KiB

/// 指纹与组包参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WinnowConfig {
    /// gram 长度 G
    pub gram: usize,
    /// 窗口大小 W
    pub window: usize,
    /// 最小文件大小（字节）；低于则只输出整文件哈希
    pub min_file_size: u64,
    /// 最大文件大小（字节）；超过则只输出整文件哈希
    pub max_file_size: u64,
    /// 单批次序列化上限（字节）
    pub max_batch_size: usize,
    /// 只输出整文件哈希，不计算 snippet
    pub skip_snippets: bool,
}

impl Default for WinnowConfig {
    fn default() -> Self {
        Self {
            gram: DEFAULT_GRAM,
            window: DEFAULT_WINDOW,
            min_file_size: DEFAULT_MIN_FILE_SIZE,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            skip_snippets: false,
        }
    }
}

impl WinnowConfig {
    /// 跳过 snippet 的配置：批次上限默认降到 8 KiB
    pub fn skipping_snippets() -> Self {
        Self { skip_snippets: true, max_batch_size: SKIP_SNIPPETS_MAX_BATCH_SIZE, ..Self::default() }
    }

    /// 参数合法性检查
    pub fn validate(&self) -> Result<()> {
        if self.gram == 0 {
            return Err(WfpError::InvalidConfig("gram size must be at least 1".into()));
        }
        if self.window == 0 {
            return Err(WfpError::InvalidConfig("window size must be at least 1".into()));
        }
        if self.min_file_size > self.max_file_size {
            return Err(WfpError::InvalidConfig(format!(
                "min_file_size ({}) exceeds max_file_size ({})",
                self.min_file_size, self.max_file_size
            )));
        }
        if self.max_batch_size == 0 {
            return Err(WfpError::InvalidConfig("max_batch_size must be positive".into()));
        }
        Ok(())
    }
}

/// 目录扫描选项
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// 工作线程数；缺省按 CPU 核数，Some(1) 时不建线程池
    pub threads: Option<usize>,
    /// 不按扩展名/文件名过滤
    pub all_extensions: bool,
    /// 不按目录名过滤
    pub all_folders: bool,
    /// 包含以 `.` 开头的隐藏文件与目录
    pub all_hidden: bool,
    /// 提前终止信号；置位后不再处理新文件，已组好的部分批次照常冲刷
    pub cancel: Option<Arc<AtomicBool>>,
}

/// 一次扫描的计数（CLI 可输出为 JSON）
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    pub files_found: usize,
    pub files_fingerprinted: usize,
    pub files_excluded: usize,
    pub files_failed: usize,
    pub snippets: usize,
    pub bytes_read: u64,
    pub batches: usize,
    pub oversized_batches: usize,
    pub cancelled: bool,
}
