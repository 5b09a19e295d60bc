use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use ossprint_core::{
    load_config, parse_wfp, scan_path, RequestAssembler, ScanOptions, ScanStats, WinnowConfig,
    SKIP_SNIPPETS_MAX_BATCH_SIZE,
};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

mod sink;

use sink::FileSink;

/// ossprint 命令行
#[derive(Parser, Debug)]
#[command(name = "ossprint", version, about = "Winnowing 源码指纹生成与请求组包")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 为文件或目录生成 WFP 指纹
    #[command(visible_aliases = ["fp", "wfp"])]
    Fingerprint {
        /// 待指纹的文件或目录
        path: PathBuf,

        /// 汇总 WFP 输出文件（缺省且未指定 --batch-dir 时写到 stdout）
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// 按请求批次拆分输出的目录
        #[arg(long)]
        batch_dir: Option<PathBuf>,

        /// 线程数（"auto"=CPU 核心数）
        #[arg(short = 'T', long, default_value = "auto")]
        threads: String,

        /// 单批次上限（KiB）；缺省 64，跳过 snippet 时为 8
        #[arg(short = 'P', long)]
        post_size: Option<usize>,

        /// 只输出整文件哈希
        #[arg(short = 'S', long)]
        skip_snippets: bool,

        /// 不按扩展名过滤
        #[arg(long)]
        all_extensions: bool,

        /// 不按目录名过滤
        #[arg(long)]
        all_folders: bool,

        /// 包含隐藏文件与目录
        #[arg(long)]
        all_hidden: bool,

        /// 配置文件（TOML），命令行参数优先
        #[arg(long)]
        config: Option<PathBuf>,

        /// 统计信息 JSON 输出文件
        #[arg(long)]
        stats: Option<PathBuf>,
    },
    /// 把已有的 WFP 文件重新按请求批次拆分
    Batch {
        /// WFP 文件
        wfp: PathBuf,

        /// 批次输出目录
        #[arg(long)]
        batch_dir: PathBuf,

        /// 单批次上限（KiB）
        #[arg(short = 'P', long, default_value_t = 64)]
        post_size: usize,
    },
}

fn main() -> Result<()> {
    // RUST_LOG 可覆盖默认的 info 等级
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Fingerprint {
            path,
            output,
            batch_dir,
            threads,
            post_size,
            skip_snippets,
            all_extensions,
            all_folders,
            all_hidden,
            config,
            stats,
        } => {
            let (mut cfg, mut opts) = match &config {
                Some(p) => load_config(p).with_context(|| format!("load config {}", p.display()))?,
                None => (WinnowConfig::default(), ScanOptions::default()),
            };
            // 命令行开关只做加法，不会关掉配置文件里打开的选项
            if skip_snippets && !cfg.skip_snippets {
                cfg.skip_snippets = true;
                if post_size.is_none() {
                    cfg.max_batch_size = SKIP_SNIPPETS_MAX_BATCH_SIZE;
                }
            }
            if let Some(kib) = post_size {
                if kib == 0 {
                    bail!("--post-size must be positive");
                }
                cfg.max_batch_size = kib * 1024;
            }
            if let Some(n) = parse_threads(&threads) {
                opts.threads = Some(n);
            }
            opts.all_extensions |= all_extensions;
            opts.all_folders |= all_folders;
            opts.all_hidden |= all_hidden;

            info!(?path, ?output, ?batch_dir, "starting fingerprinting");
            let wfp: Option<Box<dyn Write>> = match (&output, &batch_dir) {
                (Some(out), _) => Some(FileSink::wfp_file(out).context("create output file")?),
                (None, None) => Some(Box::new(std::io::stdout().lock())),
                (None, Some(_)) => None,
            };
            let mut sink = FileSink::new(wfp, batch_dir.as_deref()).context("create batch directory")?;
            let summary = scan_path(&path, &cfg, &opts, &mut sink).context("fingerprinting failed")?;
            sink.flush().context("flush output")?;

            if summary.files_found == 0 {
                warn!(?path, "no files found to fingerprint");
            }
            info!(
                files_fingerprinted = summary.files_fingerprinted,
                files_excluded = summary.files_excluded,
                batches = summary.batches,
                "fingerprinting finished"
            );
            if let Some(p) = stats {
                write_stats(&p, &summary)?;
            }
        }
        Commands::Batch { wfp, batch_dir, post_size } => {
            if post_size == 0 {
                bail!("--post-size must be positive");
            }
            let text = fs::read_to_string(&wfp).with_context(|| format!("read {}", wfp.display()))?;
            let records = parse_wfp(&text).with_context(|| format!("parse {}", wfp.display()))?;
            info!(records = records.len(), "re-batching WFP file");

            let mut sink = FileSink::new(None, Some(&batch_dir)).context("create batch directory")?;
            let mut asm = RequestAssembler::new(post_size * 1024);
            for record in records {
                asm.push(record, &mut sink)?;
            }
            let stats = asm.finish(&mut sink)?;
            info!(batches = stats.batches, oversized = stats.oversized, "batches written");
        }
    }

    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, FmtSubscriber};
    // 日志写到 stderr，stdout 留给 WFP 输出
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// "auto" 或非法值交给库按 CPU 核数决定
fn parse_threads(s: &str) -> Option<usize> {
    if s.eq_ignore_ascii_case("auto") {
        return None;
    }
    match s.parse::<usize>() {
        Ok(n) if n >= 1 => Some(n),
        _ => None,
    }
}

/// 统计信息写成 JSON
fn write_stats(path: &Path, stats: &ScanStats) -> Result<()> {
    let json = serde_json::to_string_pretty(stats)?;
    fs::write(path, json).with_context(|| format!("write stats {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threads_argument() {
        assert_eq!(parse_threads("auto"), None);
        assert_eq!(parse_threads("AUTO"), None);
        assert_eq!(parse_threads("4"), Some(4));
        assert_eq!(parse_threads("0"), None);
        assert_eq!(parse_threads("many"), None);
    }

    #[test]
    fn cli_parses_fingerprint_flags() {
        let cli = Cli::try_parse_from(["ossprint", "wfp", "src", "-o", "out.wfp", "-T", "2", "-S"]).unwrap();
        match cli.command {
            Commands::Fingerprint { path, output, threads, skip_snippets, .. } => {
                assert_eq!(path, PathBuf::from("src"));
                assert_eq!(output, Some(PathBuf::from("out.wfp")));
                assert_eq!(threads, "2");
                assert!(skip_snippets);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
