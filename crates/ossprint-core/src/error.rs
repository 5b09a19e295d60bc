//! 错误类型（对外暴露）
use std::io;

use thiserror::Error;

/// 核心库错误
///
/// 单文件读取失败不会走到这里：扫描流程会记录并跳过该文件，
/// 只有配置、解析、线程池与下游 sink 的失败才会中断调用方。
#[derive(Debug, Error)]
pub enum WfpError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("failed to parse config file: {0}")]
    Config(#[from] toml::de::Error),
    #[error("malformed WFP at line {line}: {reason}")]
    Parse { line: usize, reason: String },
    #[error("directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("failed to build worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
    #[error("batch sink rejected batch #{seq}: {reason}")]
    Sink { seq: usize, reason: String },
}

pub type Result<T> = std::result::Result<T, WfpError>;
