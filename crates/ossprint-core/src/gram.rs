//! Gram 哈希：空白归一化 + 多项式滚动哈希
//!
//! - 归一化：ASCII 空白字节直接丢弃（不替换），其余字节原样保留；
//!   行号只由 `\n` 推进，CRLF 与 LF 文件的行号一致。
//! - 哈希：`h = Σ b[k+j] · B^(G-1-j) mod 2^32`，逐字节 O(1) 滚动更新。
//! - 流式：直接在原始字节上迭代，只保留最近 G 个有效字节。

use std::collections::VecDeque;

/// 多项式乘数（FNV 32 位素数）。改动会让所有指纹失配。
pub const GRAM_BASE: u32 = 0x0100_0193;

/// 归一化时丢弃的字节
#[inline]
pub fn is_stripped(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | 0x0B | 0x0C | b'\r')
}

/// 一个 gram 的哈希及其位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GramHash {
    /// gram 在归一化字节流中的起始下标
    pub pos: usize,
    pub hash: u32,
    /// gram 最后一个字节所在的原始行号（从 1 开始）
    pub line: u32,
}

/// 滚动哈希参数：gram 长度与预计算的 `B^(G-1)`
#[derive(Debug, Clone, Copy)]
pub struct GramHasher {
    gram: usize,
    drop_factor: u32,
}

impl GramHasher {
    pub fn new(gram: usize) -> Self {
        debug_assert!(gram > 0, "gram size must be positive");
        let drop_factor = (1..gram).fold(1u32, |acc, _| acc.wrapping_mul(GRAM_BASE));
        Self { gram, drop_factor }
    }

    /// 整窗计算（首个 gram 以及测试对照用）
    pub fn hash_window(&self, window: &[u8]) -> u32 {
        window.iter().fold(0u32, |h, &b| push_byte(h, b))
    }

    /// 滚动一步：移出 `dropped`，移入 `added`
    #[inline]
    pub fn roll(&self, prev: u32, dropped: u8, added: u8) -> u32 {
        push_byte(prev.wrapping_sub(u32::from(dropped).wrapping_mul(self.drop_factor)), added)
    }

    /// 在原始字节上惰性产生 gram 哈希序列
    pub fn grams<'a>(&self, content: &'a [u8]) -> Grams<'a> {
        Grams {
            hasher: *self,
            content,
            cursor: 0,
            line: 1,
            ring: VecDeque::with_capacity(self.gram),
            hash: 0,
            emitted: 0,
        }
    }
}

#[inline]
fn push_byte(h: u32, b: u8) -> u32 {
    h.wrapping_mul(GRAM_BASE).wrapping_add(u32::from(b))
}

/// gram 哈希迭代器（见 [`GramHasher::grams`]）
pub struct Grams<'a> {
    hasher: GramHasher,
    content: &'a [u8],
    cursor: usize,
    line: u32,
    /// 最近 G 个有效字节
    ring: VecDeque<u8>,
    hash: u32,
    emitted: usize,
}

impl Iterator for Grams<'_> {
    type Item = GramHash;

    fn next(&mut self) -> Option<GramHash> {
        while let Some(&b) = self.content.get(self.cursor) {
            self.cursor += 1;
            if b == b'\n' {
                self.line += 1;
            }
            if is_stripped(b) {
                continue;
            }

            if self.ring.len() < self.hasher.gram {
                self.ring.push_back(b);
                self.hash = push_byte(self.hash, b);
                if self.ring.len() < self.hasher.gram {
                    continue;
                }
            } else if let Some(dropped) = self.ring.pop_front() {
                self.ring.push_back(b);
                self.hash = self.hasher.roll(self.hash, dropped, b);
            }

            let item = GramHash { pos: self.emitted, hash: self.hash, line: self.line };
            self.emitted += 1;
            return Some(item);
        }
        None
    }
}

/// 归一化后的字节（不含行号），供测试与调试对照
pub fn normalize(content: &[u8]) -> Vec<u8> {
    content.iter().copied().filter(|&b| !is_stripped(b)).collect()
}
