//! 批次落盘：汇总 WFP 文件 + 按批次拆分的请求文件
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use ossprint_core::{BatchSink, ScanRequestBatch, WfpError};
use tracing::debug;

/// 批次输出：`wfp` 收到全部记录（顺序即扫描顺序），`batch_dir` 下每批一个文件
pub struct FileSink {
    wfp: Option<Box<dyn Write>>,
    batch_dir: Option<PathBuf>,
    written: Vec<PathBuf>,
}

impl FileSink {
    pub fn new(wfp: Option<Box<dyn Write>>, batch_dir: Option<&Path>) -> std::io::Result<Self> {
        if let Some(dir) = batch_dir {
            fs::create_dir_all(dir)?;
        }
        Ok(Self { wfp, batch_dir: batch_dir.map(Path::to_path_buf), written: Vec::new() })
    }

    /// 汇总输出到文件
    pub fn wfp_file(path: &Path) -> std::io::Result<Box<dyn Write>> {
        Ok(Box::new(BufWriter::new(File::create(path)?)))
    }

    /// 已写出的批次文件
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        if let Some(w) = self.wfp.as_mut() {
            w.flush()?;
        }
        Ok(())
    }
}

impl BatchSink for FileSink {
    fn send(&mut self, batch: ScanRequestBatch) -> Result<(), WfpError> {
        if let Some(w) = self.wfp.as_mut() {
            w.write_all(batch.payload().as_bytes())?;
        }
        if let Some(dir) = &self.batch_dir {
            let path = dir.join(format!("batch-{:05}.wfp", batch.seq()));
            fs::write(&path, batch.payload()).map_err(|e| WfpError::Sink {
                seq: batch.seq(),
                reason: format!("{}: {e}", path.display()),
            })?;
            debug!(path = %path.display(), records = batch.records(), "batch written");
            self.written.push(path);
        }
        Ok(())
    }
}
