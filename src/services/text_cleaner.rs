//! 题干清洗 - 业务能力层
//!
//! 去掉题干开头的编号和标签，例如 "1."、"Q3:"、"（1）"、"①"、"题目："。
//! 只处理字符串开头，不改动正文。

use std::sync::LazyLock;

use regex::Regex;

/// 带标签的编号："Q3:"、"Question 3 "、"题目3、"、"案例3："、"第3题."
static LABELED_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:question|q|题目|问题|案例|例题|第)\s*\d+\s*题?\s*[:：.．、,，)）\]】\s-]\s*")
        .expect("valid regex")
});

/// 括号编号："(1)"、"（1）"、"【1】"
static BRACKETED_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*[\(（\[【]\s*\d+\s*[\)）\]】]\s*").expect("valid regex")
});

/// 正文中出现的括号编号，例如 "(1)和(2)哪个说法正确" 里的 "(2)"
static INLINE_BRACKETED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\(（\[【]\s*\d+\s*[\)）\]】]").expect("valid regex"));

/// 标点编号："1."、"1)"、"1、"
///
/// "1." 后面紧跟数字时视为小数，不做处理。
static PUNCTUATED_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:\d+\s*[、)）]|\d+\s*[.．](?P<next>\D|$))\s*").expect("valid regex")
});

/// 圈号：①-⑳
static CIRCLED_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[①-⑳]\s*").expect("valid regex"));

/// 不带编号的标签："题目："、"问题:"、"Question:"
static BARE_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:题目|问题|题干|question)\s*[:：]\s*").expect("valid regex")
});

/// 反复清洗的上限，正常题干一两轮就会稳定
///
/// 每一轮都可能露出新的前缀，例如 "1. (2) 题目：X"。开头的括号编号如果在正文里
/// 还有同类编号跟着（"(1)和(2)"），说明它是正文的一部分，任何一轮都不去掉。
const MAX_PASSES: usize = 8;

/// 清洗题干
///
/// 按固定顺序去前缀：带标签编号 → 括号编号 → 标点编号 → 圈号 → 裸标签。
/// 编号必须先于裸标签处理，因为去掉编号后可能露出一个标签。
/// 整个过程重复到结果不再变化为止，所以 `clean(clean(x)) == clean(x)`。
pub fn clean(text: &str) -> String {
    let mut current = text.trim().to_string();
    for _ in 0..MAX_PASSES {
        let next = clean_once(&current);
        if next == current {
            break;
        }
        current = next;
    }
    current
}

fn clean_once(text: &str) -> String {
    let text = LABELED_NUMBER.replace(text, "");
    let text = strip_bracketed(&text);
    let text = PUNCTUATED_NUMBER.replace(text, "${next}");
    let text = CIRCLED_NUMBER.replace(&text, "");
    let text = BARE_LABEL.replace(&text, "");
    text.trim().to_string()
}

/// 去掉开头的括号编号，除非正文里还引用了同类编号
fn strip_bracketed(text: &str) -> &str {
    let Some(m) = BRACKETED_NUMBER.find(text) else {
        return text;
    };
    let rest = &text[m.end()..];
    let referenced_in_body = !BRACKETED_NUMBER.is_match(rest) && INLINE_BRACKETED.is_match(rest);
    if referenced_in_body {
        text
    } else {
        rest
    }
}
