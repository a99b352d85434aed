//! 指纹去重 - 业务能力层
//!
//! 不同分片独立出题，难免出现同一道题的不同写法。这里按输入顺序流式扫描：
//! 每道题与之前已接受的题比较指纹，命中任一规则即丢弃。
//! 结果依赖输入顺序，不是对整个集合求传递闭包。

use crate::config::DedupConfig;
use crate::models::Question;

/// 判重命中的规则
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchRule {
    /// 指纹完全相同
    Exact,
    /// 一个指纹包含另一个
    Inclusion,
    /// 前缀窗口内完全相同
    Prefix,
}

/// 单道题的判定结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accepted,
    /// 与第 `of` 道已接受的题重复
    Duplicate { of: usize, rule: MatchRule },
    /// 指纹为空（题干没有任何汉字、字母或数字）
    Empty,
}

fn is_cjk_ideograph(c: char) -> bool {
    matches!(c, '\u{4E00}'..='\u{9FFF}' | '\u{3400}'..='\u{4DBF}')
}

/// 计算题干指纹：只保留汉字、ASCII 字母和数字
pub fn fingerprint(text: &str) -> String {
    text.chars()
        .filter(|&c| is_cjk_ideograph(c) || c.is_ascii_alphanumeric())
        .collect()
}

/// 指纹宽度：汉字计 2，字母数字计 1
///
/// 模糊规则的长度门槛按宽度比较，一个汉字携带的信息量大致相当于两个拉丁字符。
pub fn fingerprint_width(fp: &str) -> usize {
    fp.chars()
        .map(|c| if is_cjk_ideograph(c) { 2 } else { 1 })
        .sum()
}

/// 流式去重器
#[derive(Debug, Clone)]
pub struct Deduplicator {
    config: DedupConfig,
    accepted: Vec<String>,
}

impl Deduplicator {
    pub fn new(config: DedupConfig) -> Self {
        Self {
            config,
            accepted: Vec::new(),
        }
    }

    /// 判定一段题干，接受时记录其指纹
    pub fn offer(&mut self, text: &str) -> Verdict {
        let fp = fingerprint(text);
        if fp.is_empty() {
            return Verdict::Empty;
        }

        for (index, existing) in self.accepted.iter().enumerate() {
            if let Some(rule) = self.compare(&fp, existing) {
                return Verdict::Duplicate { of: index, rule };
            }
        }

        self.accepted.push(fp);
        Verdict::Accepted
    }

    fn compare(&self, a: &str, b: &str) -> Option<MatchRule> {
        if a == b {
            return Some(MatchRule::Exact);
        }

        let min = self.config.fuzzy_min_len;
        if fingerprint_width(a) <= min || fingerprint_width(b) <= min {
            return None;
        }

        if a.contains(b) || b.contains(a) {
            return Some(MatchRule::Inclusion);
        }

        let window = self.config.prefix_window;
        if a.chars().take(window).eq(b.chars().take(window)) {
            return Some(MatchRule::Prefix);
        }

        None
    }

    /// 已接受的题目数量
    pub fn accepted_len(&self) -> usize {
        self.accepted.len()
    }
}

/// 去重统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DedupStats {
    pub kept: usize,
    pub duplicates: usize,
    pub empty: usize,
}

/// 对一组已清洗的题目去重，保持原有顺序
pub fn deduplicate(questions: Vec<Question>, config: &DedupConfig) -> (Vec<Question>, DedupStats) {
    let mut dedup = Deduplicator::new(config.clone());
    let mut stats = DedupStats::default();
    let mut kept = Vec::with_capacity(questions.len());

    for question in questions {
        match dedup.offer(&question.question_text) {
            Verdict::Accepted => kept.push(question),
            Verdict::Duplicate { of, rule } => {
                tracing::debug!(
                    "丢弃重复题目 ({:?}，与第 {} 题重复): {}",
                    rule,
                    of + 1,
                    question.question_text
                );
                stats.duplicates += 1;
            }
            Verdict::Empty => stats.empty += 1,
        }
    }

    stats.kept = kept.len();
    (kept, stats)
}
