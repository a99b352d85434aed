//! 答案归一化 - 业务能力层
//!
//! 模型返回的 `correctAnswer` 一律当作不可信输入。这里是唯一把原始记录转换成
//! 类型正确的 [`Question`] 的地方：多选/排序/连线/填空得到列表，其余题型得到字符串。
//!
//! 归一化永不失败：JSON 解析失败退化为按分隔符拆分，无法识别的题型退化为简答题。
//!
//! 列表答案除了英文逗号，也按中文逗号 `，` 和顿号 `、` 拆分，所以 `"A、B"` 得到
//! `["A", "B"]` 而不是 `["A、B"]`。

use serde_json::Value as JsonValue;
use tracing::warn;

use crate::models::{Answer, Question, QuestionType, RawQuestion};

/// 列表答案的分隔符
const SEPARATORS: [char; 3] = [',', '，', '、'];

/// 把原始记录转换为题目
///
/// 原始记录的每个字段都可能是任意 JSON 值：题型无法识别（包括 `null`）时按简答题处理，
/// 题干和解析中的数组按行拼接，`null` 变成空字符串。
pub fn normalize_question(raw: RawQuestion, id: String) -> Question {
    let type_tag = value_to_string(&raw.question_type);
    let question_type = QuestionType::parse(&type_tag).unwrap_or_else(|| {
        warn!("无法识别的题型 '{}'，按简答题处理", type_tag);
        QuestionType::ShortAnswer
    });

    let options = match &raw.options {
        JsonValue::Array(items) => collect_items(items),
        JsonValue::Null => Vec::new(),
        other => collect_items(std::slice::from_ref(other)),
    };
    let options = Some(options).filter(|opts| !opts.is_empty());

    Question {
        id,
        question_type,
        question_text: text_of(&raw.question_text),
        options,
        correct_answer: normalize_answer(question_type, &raw.correct_answer),
        explanation: text_of(&raw.explanation),
    }
}

/// 按题型把答案转换成规定的形状
pub fn normalize_answer(question_type: QuestionType, value: &JsonValue) -> Answer {
    if question_type.expects_list() {
        let items = match value {
            JsonValue::Array(items) => collect_items(items),
            JsonValue::String(s) => split_answer(s),
            JsonValue::Null => Vec::new(),
            other => vec![value_to_string(other)],
        };
        Answer::Multiple(items)
    } else {
        let text = match value {
            JsonValue::Array(items) => collect_items(items).join(", "),
            other => value_to_string(other),
        };
        Answer::Single(text)
    }
}

/// 拆分字符串形式的列表答案
///
/// 1. 看起来像 JSON 数组（以 `[` 开头）或含英文逗号时，先尝试按 JSON 解析
/// 2. 解析失败或含中文分隔符时，按 `,` `，` `、` 拆分
/// 3. 都不满足时，包装成只有一个元素的列表
fn split_answer(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    let looks_like_array = trimmed.starts_with('[');
    if looks_like_array || trimmed.contains(',') {
        match serde_json::from_str::<JsonValue>(trimmed) {
            Ok(JsonValue::Array(items)) => return collect_items(&items),
            Ok(_) => {}
            Err(e) => warn!("答案 '{}' 不是合法的 JSON 数组，按分隔符拆分: {}", trimmed, e),
        }
    }

    if looks_like_array || trimmed.contains(SEPARATORS) {
        return trimmed
            .trim_start_matches('[')
            .trim_end_matches(']')
            .split(SEPARATORS)
            .map(|piece| piece.trim().trim_matches(|c: char| c == '"' || c == '\'').trim())
            .filter(|piece| !piece.is_empty())
            .map(str::to_string)
            .collect();
    }

    vec![trimmed.to_string()]
}

fn collect_items(items: &[JsonValue]) -> Vec<String> {
    items
        .iter()
        .map(value_to_string)
        .filter(|item| !item.is_empty())
        .collect()
}

/// 题干、解析等自由文本字段
fn text_of(value: &JsonValue) -> String {
    match value {
        JsonValue::Array(items) => collect_items(items).join("\n"),
        other => value_to_string(other),
    }
}

fn value_to_string(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.trim().to_string(),
        JsonValue::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn list(items: &[&str]) -> Answer {
        Answer::Multiple(items.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_multi_choice_json_array_string() {
        assert_eq!(
            normalize_answer(QuestionType::MultipleChoice, &json!(r#"["A","B"]"#)),
            list(&["A", "B"])
        );
    }

    #[test]
    fn test_multi_choice_comma_fallback() {
        assert_eq!(
            normalize_answer(QuestionType::MultipleChoice, &json!("A,B")),
            list(&["A", "B"])
        );
        assert_eq!(
            normalize_answer(QuestionType::MultipleChoice, &json!("A， C、 D")),
            list(&["A", "C", "D"])
        );
        assert_eq!(
            normalize_answer(QuestionType::MultipleChoice, &json!("A、B")),
            list(&["A", "B"])
        );
    }

    #[test]
    fn test_multi_choice_single_value_is_wrapped() {
        assert_eq!(
            normalize_answer(QuestionType::MultipleChoice, &json!("A")),
            list(&["A"])
        );
    }

    #[test]
    fn test_broken_json_array_degrades_to_split() {
        assert_eq!(
            normalize_answer(QuestionType::Ordering, &json!("[秦, 汉, 唐]")),
            list(&["秦", "汉", "唐"])
        );
        assert_eq!(
            normalize_answer(QuestionType::FillInBlank, &json!(r#"["叶绿体", "线粒体"#)),
            list(&["叶绿体", "线粒体"])
        );
    }

    #[test]
    fn test_real_arrays_and_scalars() {
        assert_eq!(
            normalize_answer(QuestionType::Matching, &json!(["1-B", "2-A"])),
            list(&["1-B", "2-A"])
        );
        assert_eq!(
            normalize_answer(QuestionType::FillInBlank, &json!(42)),
            list(&["42"])
        );
        assert_eq!(normalize_answer(QuestionType::Ordering, &json!(null)), list(&[]));
    }

    #[test]
    fn test_scalar_types_stay_strings() {
        assert_eq!(
            normalize_answer(QuestionType::SingleChoice, &json!("A,B")),
            Answer::Single("A,B".to_string())
        );
        assert_eq!(
            normalize_answer(QuestionType::TrueFalse, &json!(true)),
            Answer::Single("true".to_string())
        );
        assert_eq!(
            normalize_answer(QuestionType::ShortAnswer, &json!(["要点一", "要点二"])),
            Answer::Single("要点一, 要点二".to_string())
        );
    }

    #[test]
    fn test_normalize_question_is_well_formed_for_every_type() {
        for ty in QuestionType::ALL {
            let raw = RawQuestion {
                question_type: json!(ty.tag()),
                question_text: json!(" 题干 "),
                options: json!(["A. 甲", "", 3]),
                correct_answer: json!("A,B"),
                explanation: JsonValue::Null,
            };
            let question = normalize_question(raw, "id".to_string());
            assert!(question.is_well_formed(), "{:?}", ty);
            assert_eq!(question.question_text, "题干");
            assert_eq!(
                question.options,
                Some(vec!["A. 甲".to_string(), "3".to_string()])
            );
        }
    }

    #[test]
    fn test_unknown_type_becomes_short_answer() {
        let raw = RawQuestion {
            question_type: json!("essay"),
            question_text: json!("论述"),
            correct_answer: json!("略"),
            ..RawQuestion::default()
        };
        let question = normalize_question(raw, "id".to_string());
        assert_eq!(question.question_type, QuestionType::ShortAnswer);
        assert_eq!(question.correct_answer, Answer::Single("略".to_string()));
        assert_eq!(question.options, None);
    }

    #[test]
    fn test_off_type_fields_degrade_instead_of_failing() {
        let raw = RawQuestion {
            question_type: JsonValue::Null,
            question_text: json!(["第一行", "第二行"]),
            options: json!("A. 唯一选项"),
            correct_answer: json!("略"),
            explanation: json!(["要点一", "要点二"]),
        };
        let question = normalize_question(raw, "id".to_string());
        assert_eq!(question.question_type, QuestionType::ShortAnswer);
        assert_eq!(question.question_text, "第一行\n第二行");
        assert_eq!(question.options, Some(vec!["A. 唯一选项".to_string()]));
        assert_eq!(question.explanation, "要点一\n要点二");

        let raw = RawQuestion {
            question_type: json!("single_choice"),
            explanation: json!(1),
            ..RawQuestion::default()
        };
        let question = normalize_question(raw, "id".to_string());
        assert_eq!(question.explanation, "1");
        assert_eq!(question.question_text, "");
    }
}
