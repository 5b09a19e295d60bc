//! Winnowing 选择器
//!
//! 每个长度为 W 的窗口取最小哈希，并列时取最右（最新）位置；
//! 只有当选中位置与上一个窗口不同才输出。状态机只有两种状态：
//! 尚未选择 / 上次选中位置 P。单调队列保证整体 O(n)。

use std::collections::VecDeque;

use crate::gram::GramHash;
use crate::types::{Fingerprint, Snippet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SelectorState {
    Idle,
    Selected { pos: usize },
}

/// 增量式选择器：逐个喂入 gram 哈希，最后 [`Winnower::finish`] 取结果
pub struct Winnower {
    window: usize,
    /// 候选队列：位置递增、哈希严格递增；队首即当前窗口的最右最小值
    candidates: VecDeque<GramHash>,
    seen: usize,
    state: SelectorState,
    fingerprint: Fingerprint,
}

impl Winnower {
    pub fn new(window: usize) -> Self {
        debug_assert!(window > 0, "window size must be positive");
        Self {
            window,
            candidates: VecDeque::with_capacity(window),
            seen: 0,
            state: SelectorState::Idle,
            fingerprint: Fingerprint::new(),
        }
    }

    pub fn push(&mut self, gram: GramHash) {
        // 相等也弹出：后来者在并列时胜出
        while self.candidates.back().is_some_and(|c| c.hash >= gram.hash) {
            self.candidates.pop_back();
        }
        self.candidates.push_back(gram);
        while self.candidates.front().is_some_and(|c| c.pos + self.window <= gram.pos) {
            self.candidates.pop_front();
        }

        self.seen += 1;
        if self.seen >= self.window {
            self.evaluate();
        }
    }

    /// 结束输入；不足一个完整窗口时把全部序列当作一个窗口
    pub fn finish(mut self) -> Fingerprint {
        if self.seen > 0 && self.seen < self.window {
            self.evaluate();
        }
        self.fingerprint
    }

    fn evaluate(&mut self) {
        let Some(&min) = self.candidates.front() else { return };
        match self.state {
            SelectorState::Selected { pos } if pos == min.pos => {}
            _ => {
                self.state = SelectorState::Selected { pos: min.pos };
                self.fingerprint.push(Snippet { line: min.line, hash: min.hash });
            }
        }
    }
}

/// 对完整的 gram 哈希序列做 winnowing
pub fn winnow<I>(grams: I, window: usize) -> Fingerprint
where
    I: IntoIterator<Item = GramHash>,
{
    let mut winnower = Winnower::new(window);
    for gram in grams {
        winnower.push(gram);
    }
    winnower.finish()
}
