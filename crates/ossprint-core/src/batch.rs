//! 请求组包：把逐文件记录按序列化大小切成批次
//!
//! - 加入前先算记录的线格式大小，超出上限则先冲刷当前批次；
//! - 单条记录本身超限时独占一个批次（标记 oversized 并告警），绝不截断或丢弃；
//! - 批次边界不改变记录顺序。
use std::sync::Mutex;

use tracing::{debug, warn};

use crate::error::Result;
use crate::types::FileRecord;
use crate::wire::write_record;

/// 一个扫描请求批次（已序列化）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRequestBatch {
    seq: usize,
    payload: String,
    records: usize,
    oversized: bool,
}

impl ScanRequestBatch {
    /// 批次序号（从 0 开始，按产生顺序递增）
    pub fn seq(&self) -> usize {
        self.seq
    }

    /// 线格式文本
    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// 记录条数
    pub fn records(&self) -> usize {
        self.records
    }

    /// 序列化字节数
    pub fn size(&self) -> usize {
        self.payload.len()
    }

    /// 单条记录超过上限而独占的批次
    pub fn is_oversized(&self) -> bool {
        self.oversized
    }
}

/// 批次下游（传输层、落盘等）
pub trait BatchSink {
    fn send(&mut self, batch: ScanRequestBatch) -> Result<()>;
}

impl BatchSink for Vec<ScanRequestBatch> {
    fn send(&mut self, batch: ScanRequestBatch) -> Result<()> {
        self.push(batch);
        Ok(())
    }
}

/// 单线程组包器
#[derive(Debug)]
pub struct RequestAssembler {
    max_size: usize,
    current: String,
    current_records: usize,
    next_seq: usize,
    oversized: usize,
}

impl RequestAssembler {
    pub fn new(max_size: usize) -> Self {
        Self { max_size, current: String::new(), current_records: 0, next_seq: 0, oversized: 0 }
    }

    /// 加入一条记录，必要时向 `sink` 输出已满的批次
    pub fn push<S: BatchSink + ?Sized>(&mut self, record: FileRecord, sink: &mut S) -> Result<()> {
        let mut text = String::new();
        write_record(&mut text, &record);

        if text.len() > self.max_size {
            self.flush(sink)?;
            warn!(
                path = record.path(),
                size = text.len(),
                limit = self.max_size,
                "record exceeds batch limit, sending it alone"
            );
            self.oversized += 1;
            return self.emit(text, 1, true, sink);
        }

        if self.current_records > 0 && self.current.len() + text.len() > self.max_size {
            self.flush(sink)?;
        }
        self.current.push_str(&text);
        self.current_records += 1;
        Ok(())
    }

    /// 冲刷当前（可能未满的）批次
    pub fn flush<S: BatchSink + ?Sized>(&mut self, sink: &mut S) -> Result<()> {
        if self.current_records == 0 {
            return Ok(());
        }
        let payload = std::mem::take(&mut self.current);
        let records = std::mem::take(&mut self.current_records);
        self.emit(payload, records, false, sink)
    }

    /// 结束输入，输出最后的部分批次
    pub fn finish<S: BatchSink + ?Sized>(mut self, sink: &mut S) -> Result<AssemblerStats> {
        self.flush(sink)?;
        Ok(self.stats())
    }

    pub fn stats(&self) -> AssemblerStats {
        AssemblerStats { batches: self.next_seq, oversized: self.oversized }
    }

    fn emit<S: BatchSink + ?Sized>(
        &mut self,
        payload: String,
        records: usize,
        oversized: bool,
        sink: &mut S,
    ) -> Result<()> {
        let seq = self.next_seq;
        self.next_seq += 1;
        debug!(seq, records, size = payload.len(), "batch ready");
        sink.send(ScanRequestBatch { seq, payload, records, oversized })
    }
}

/// 组包计数
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AssemblerStats {
    pub batches: usize,
    pub oversized: usize,
}

/// 多生产者共享的组包器：互斥锁保护进行中的批次与下游
pub struct SharedAssembler<S: BatchSink> {
    inner: Mutex<(RequestAssembler, S)>,
}

impl<S: BatchSink> SharedAssembler<S> {
    pub fn new(max_size: usize, sink: S) -> Self {
        Self { inner: Mutex::new((RequestAssembler::new(max_size), sink)) }
    }

    pub fn push(&self, record: FileRecord) -> Result<()> {
        let mut guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let (assembler, sink) = &mut *guard;
        assembler.push(record, sink)
    }

    /// 冲刷剩余批次并交回下游
    pub fn finish(self) -> Result<(S, AssemblerStats)> {
        let (assembler, mut sink) = self.inner.into_inner().unwrap_or_else(|e| e.into_inner());
        let stats = assembler.finish(&mut sink)?;
        Ok((sink, stats))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::fingerprint_file;
    use crate::options::WinnowConfig;
    use crate::wire::record_to_wfp;

    fn small(i: usize) -> FileRecord {
        fingerprint_file(&format!("src/f{i:03}.c"), b"int x;", &WinnowConfig::default())
    }

    #[test]
    fn splits_when_next_record_would_overflow() {
        let one = record_to_wfp(&small(0)).len();
        let mut asm = RequestAssembler::new(one * 3);
        let mut out: Vec<ScanRequestBatch> = Vec::new();
        for i in 0..7 {
            asm.push(small(i), &mut out).unwrap();
        }
        let stats = asm.finish(&mut out).unwrap();
        let counts: Vec<usize> = out.iter().map(|b| b.records()).collect();
        assert_eq!(counts, vec![3, 3, 1]);
        assert_eq!(stats, AssemblerStats { batches: 3, oversized: 0 });
        assert!(out.iter().all(|b| b.size() <= one * 3));
        let seqs: Vec<usize> = out.iter().map(|b| b.seq()).collect();
        assert_eq!(seqs, vec![0, 1, 2]);
    }

    #[test]
    fn oversized_record_is_isolated_not_truncated() {
        let one = record_to_wfp(&small(0)).len();
        let big = fingerprint_file(&format!("src/{}.c", "x".repeat(one * 2)), b"int y;", &WinnowConfig::default());
        let big_text = record_to_wfp(&big);

        let mut asm = RequestAssembler::new(one * 2);
        let mut out: Vec<ScanRequestBatch> = Vec::new();
        asm.push(small(0), &mut out).unwrap();
        asm.push(big, &mut out).unwrap();
        asm.push(small(1), &mut out).unwrap();
        let stats = asm.finish(&mut out).unwrap();

        assert_eq!(out.len(), 3);
        assert!(!out[0].is_oversized());
        assert!(out[1].is_oversized());
        assert_eq!(out[1].payload(), big_text);
        assert_eq!(out[1].records(), 1);
        assert_eq!(stats.oversized, 1);
        assert!(out[2].payload().contains("src/f001.c"));
    }

    #[test]
    fn finish_without_records_emits_nothing() {
        let mut out: Vec<ScanRequestBatch> = Vec::new();
        let stats = RequestAssembler::new(1024).finish(&mut out).unwrap();
        assert!(out.is_empty());
        assert_eq!(stats.batches, 0);
    }

    #[test]
    fn shared_assembler_across_threads() {
        let one = record_to_wfp(&small(0)).len();
        let shared = SharedAssembler::new(one * 10, Vec::<ScanRequestBatch>::new());
        std::thread::scope(|s| {
            for t in 0..4 {
                let shared = &shared;
                s.spawn(move || {
                    for i in 0..25 {
                        shared.push(small(t * 25 + i)).unwrap();
                    }
                });
            }
        });
        let (batches, stats) = shared.finish().unwrap();
        assert_eq!(batches.iter().map(|b| b.records()).sum::<usize>(), 100);
        assert_eq!(stats.batches, 10);
    }
}
