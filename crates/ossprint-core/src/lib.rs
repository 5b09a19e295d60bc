//! Winnowing 指纹核心库
//!
//! 设计要点：
//! - 逐文件纯函数：原始字节 → 空白归一化 → gram 滚动哈希 → winnowing 选择，
//!   不做 I/O、无共享可变状态，可在任意线程并行调用。
//! - 输出字节稳定：远端引擎独立重算同样的哈希，任何漂移都会导致无法匹配。
//! - 组包器是唯一的跨文件状态，按序列化大小切分批次，不截断、不重排。
//! - 目录扫描（读文件、过滤、并行调度）是附带的协作者，核心算法不依赖它。

mod batch;
mod config;
mod error;
mod filter;
mod fingerprint;
mod gram;
mod options;
mod scan;
mod types;
mod winnow;
mod wire;

pub use batch::{AssemblerStats, BatchSink, RequestAssembler, ScanRequestBatch, SharedAssembler};
pub use config::{load_config, parse_config};
pub use error::{Result, WfpError};
pub use filter::PathFilter;
pub use fingerprint::{classify, fingerprint_content, fingerprint_file, md5_hex};
pub use gram::{is_stripped, normalize, GramHash, GramHasher, Grams, GRAM_BASE};
pub use options::{
    ScanOptions, ScanStats, WinnowConfig, DEFAULT_GRAM, DEFAULT_MAX_BATCH_SIZE, DEFAULT_MAX_FILE_SIZE,
    DEFAULT_MIN_FILE_SIZE, DEFAULT_WINDOW, SKIP_SNIPPETS_MAX_BATCH_SIZE,
};
pub use scan::{collect_files, scan_entries, scan_path, ScanEntry};
pub use types::{FileClass, FileRecord, Fingerprint, Snippet};
pub use winnow::{winnow, Winnower};
pub use wire::{count_records, parse_wfp, record_to_wfp, write_record, WFP_FILE_START};
