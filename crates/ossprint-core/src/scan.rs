//! 目录扫描主流程与并行调度
//!
//! 稳定性保证：
//! - 文件级：遍历按文件名排序，记录按遍历顺序进入组包器，与线程数无关；
//! - 单文件读取失败只记录并跳过，不影响其他文件；
//! - 取消信号置位后不再处理新文件，已组好的部分批次照常冲刷。
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::batch::{BatchSink, RequestAssembler};
use crate::error::Result;
use crate::filter::PathFilter;
use crate::fingerprint::fingerprint_file;
use crate::options::{ScanOptions, ScanStats, WinnowConfig};
use crate::types::FileRecord;

/// 待处理文件：磁盘路径 + 写入记录的相对路径
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanEntry {
    pub abs: PathBuf,
    pub rel: String,
}

/// 单文件处理结果
enum FileOutcome {
    Record(FileRecord),
    Failed,
    Cancelled,
}

/// 收集 `root` 下需要指纹的文件；`root` 本身是文件时直接返回它
pub fn collect_files(root: &Path, filter: &PathFilter) -> Result<Vec<ScanEntry>> {
    let meta = std::fs::metadata(root)?;
    if meta.is_file() {
        return Ok(vec![ScanEntry { abs: root.to_path_buf(), rel: root.to_string_lossy().into_owned() }]);
    }

    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            if !e.file_type().is_dir() {
                return true;
            }
            e.file_name().to_str().map(|n| filter.accept_dir(n)).unwrap_or(false)
        });
    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(err) => {
                warn!(%err, "skipping unreadable directory entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str() else { continue };
        if !filter.accept_file(name) {
            continue;
        }
        // 空文件与失效链接直接忽略
        if !entry.metadata().map(|m| m.len() > 0).unwrap_or(false) {
            debug!(path = %entry.path().display(), "ignoring empty file");
            continue;
        }
        let rel = entry
            .path()
            .strip_prefix(root)
            .unwrap_or(entry.path())
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        files.push(ScanEntry { abs: entry.into_path(), rel });
    }
    Ok(files)
}

/// 扫描文件或目录，把批次交给 `sink`，返回统计
pub fn scan_path(
    root: &Path,
    cfg: &WinnowConfig,
    opts: &ScanOptions,
    sink: &mut dyn BatchSink,
) -> Result<ScanStats> {
    cfg.validate()?;
    let filter = PathFilter::from_options(opts);
    info!(root = %root.display(), "collecting files");
    let files = collect_files(root, &filter)?;
    scan_entries(&files, cfg, opts, sink)
}

/// 对给定文件列表指纹并组包
pub fn scan_entries(
    files: &[ScanEntry],
    cfg: &WinnowConfig,
    opts: &ScanOptions,
    sink: &mut dyn BatchSink,
) -> Result<ScanStats> {
    cfg.validate()?;
    let mut stats = ScanStats { files_found: files.len(), ..ScanStats::default() };
    let mut assembler = RequestAssembler::new(cfg.max_batch_size);
    let threads = opts.threads.unwrap_or_else(num_cpus::get).max(1);
    let cancel = opts.cancel.as_deref();

    if threads > 1 && files.len() > 1 {
        scan_parallel(files, cfg, cancel, threads, &mut assembler, sink, &mut stats)?;
    } else {
        // 单线程：逐个读取、指纹、组包
        for entry in files {
            let outcome = process_file(entry, cfg, cancel);
            if matches!(outcome, FileOutcome::Cancelled) {
                stats.cancelled = true;
                break;
            }
            absorb(outcome, &mut assembler, sink, &mut stats)?;
        }
    }

    let asm = assembler.finish(sink)?;
    stats.batches = asm.batches;
    stats.oversized_batches = asm.oversized;
    info!(
        files = stats.files_found,
        fingerprinted = stats.files_fingerprinted,
        excluded = stats.files_excluded,
        failed = stats.files_failed,
        batches = stats.batches,
        cancelled = stats.cancelled,
        "fingerprinting finished"
    );
    Ok(stats)
}

/// 并行调度：
/// - Rayon 线程池并行读取与指纹
/// - 当前线程作为唯一的累加器，按 idx 重排后依次组包
fn scan_parallel(
    files: &[ScanEntry],
    cfg: &WinnowConfig,
    cancel: Option<&AtomicBool>,
    threads: usize,
    assembler: &mut RequestAssembler,
    sink: &mut dyn BatchSink,
    stats: &mut ScanStats,
) -> Result<()> {
    use crossbeam_channel as channel;
    use rayon::prelude::*;

    let pool = rayon::ThreadPoolBuilder::new().num_threads(threads).build()?;
    let (tx, rx) = channel::bounded::<(usize, FileOutcome)>(256);

    std::thread::scope(|scope| {
        scope.spawn(move || {
            pool.install(|| {
                files.par_iter().enumerate().for_each_with(tx, |tx, (idx, entry)| {
                    // 累加器已退出时发送失败，忽略即可
                    let _ = tx.send((idx, process_file(entry, cfg, cancel)));
                });
            });
            // for_each_with 的发送端随任务结束释放，累加器的 recv 随之返回 Err
        });

        let result = drain_in_order(&rx, assembler, sink, stats);
        // 提前退出时丢弃 Receiver，避免工作线程阻塞在满通道上
        drop(rx);
        result
    })
}

/// 累加器：乱序到达的结果先暂存，凑齐下一个序号再交给组包器；按序遇到取消即停止
fn drain_in_order(
    rx: &crossbeam_channel::Receiver<(usize, FileOutcome)>,
    assembler: &mut RequestAssembler,
    sink: &mut dyn BatchSink,
    stats: &mut ScanStats,
) -> Result<()> {
    let mut next_idx = 0usize;
    let mut pending: BTreeMap<usize, FileOutcome> = BTreeMap::new();
    while let Ok((idx, outcome)) = rx.recv() {
        pending.insert(idx, outcome);
        while let Some(outcome) = pending.remove(&next_idx) {
            if matches!(outcome, FileOutcome::Cancelled) {
                stats.cancelled = true;
                return Ok(());
            }
            absorb(outcome, assembler, sink, stats)?;
            next_idx += 1;
        }
    }
    Ok(())
}

/// 读取并指纹单个文件
fn process_file(entry: &ScanEntry, cfg: &WinnowConfig, cancel: Option<&AtomicBool>) -> FileOutcome {
    if cancel.is_some_and(|c| c.load(Ordering::Relaxed)) {
        return FileOutcome::Cancelled;
    }
    match std::fs::read(&entry.abs) {
        Ok(bytes) => {
            let record = fingerprint_file(&entry.rel, &bytes, cfg);
            debug!(
                path = %entry.rel,
                class = record.class().as_str(),
                snippets = record.fingerprint().len(),
                "fingerprinted"
            );
            FileOutcome::Record(record)
        }
        Err(err) => {
            warn!(path = %entry.abs.display(), %err, "failed to read file, skipping");
            FileOutcome::Failed
        }
    }
}

/// 累加器：更新统计并把记录交给组包器
fn absorb(
    outcome: FileOutcome,
    assembler: &mut RequestAssembler,
    sink: &mut dyn BatchSink,
    stats: &mut ScanStats,
) -> Result<()> {
    match outcome {
        FileOutcome::Record(record) => {
            stats.bytes_read += record.size();
            if record.class().is_excluded() {
                stats.files_excluded += 1;
            } else {
                stats.files_fingerprinted += 1;
            }
            stats.snippets += record.fingerprint().len();
            assembler.push(record, sink)
        }
        FileOutcome::Failed => {
            stats.files_failed += 1;
            Ok(())
        }
        FileOutcome::Cancelled => Ok(()),
    }
}
