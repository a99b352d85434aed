//! 提示词构建 - 业务能力层
//!
//! 所有发给模型的指令文本都集中在这里，便于对照调整。

use serde_json::{json, Value as JsonValue};

use crate::models::QuestionType;

/// 关键词提取阶段约定的"无事可做"标记
pub const NONE_SENTINEL: &str = "NONE";

/// 出题阶段的系统消息
pub const GENERATION_SYSTEM: &str =
    "你是一名严谨的命题专家，负责从学习资料中整理和编写考试题目。";

fn type_list(allowed: &[QuestionType]) -> String {
    allowed
        .iter()
        .map(|t| format!("{}({})", t.label(), t.tag()))
        .collect::<Vec<_>>()
        .join("、")
}

/// 关键词提取提示词
///
/// 只关心用户选中的题型，其余题型缺答案一律忽略。
pub fn keyword_extraction_prompt(allowed: &[QuestionType]) -> String {
    format!(
        "请检查以上资料中的题目，找出答案缺失（例如标注为\"略\"、\"未提供\"、\"见教材\"或完全没有答案）的题目。\n\
         只关注以下题型：{types}。其他题型的缺失答案一律忽略。\n\
         \n\
         如果存在需要查找答案的题目，输出用于网络搜索的关键词，多个关键词用空格分隔，不超过 5 个，不要输出任何解释。\n\
         如果没有需要补充的答案，只输出 {none}。",
        types = type_list(allowed),
        none = NONE_SENTINEL,
    )
}

/// 模型自带联网搜索的提示词
pub fn native_search_prompt(keywords: &str) -> String {
    format!(
        "请联网搜索以下关键词，整理出可以用来补全考试题答案的事实性资料，\
         保留关键定义、数据和结论，不要编造：\n{}",
        keywords
    )
}

/// 每种题型的答案编码规则
fn answer_rule(question_type: QuestionType) -> &'static str {
    match question_type {
        QuestionType::SingleChoice => "单选题：options 给出全部选项，correctAnswer 为唯一正确选项的字母，如 \"A\"",
        QuestionType::MultipleChoice => "多选题：options 给出全部选项，correctAnswer 为 JSON 数组字符串，如 \"[\\\"A\\\",\\\"C\\\"]\"",
        QuestionType::TrueFalse => "判断题：options 为 [\"正确\",\"错误\"]，correctAnswer 为 \"正确\" 或 \"错误\"",
        QuestionType::Matching => "连线题：options 列出左右两栏，correctAnswer 为配对的 JSON 数组字符串，如 \"[\\\"1-B\\\",\\\"2-A\\\"]\"",
        QuestionType::Ordering => "排序题：options 列出待排序项，correctAnswer 为正确顺序的 JSON 数组字符串",
        QuestionType::FillInBlank => "填空题：题干中用 ____ 表示空位，correctAnswer 为按空位顺序排列的 JSON 数组字符串",
        QuestionType::ShortAnswer => "简答题：correctAnswer 为参考答案文本",
        QuestionType::NounExplanation => "名词解释：correctAnswer 为该名词的解释文本",
        QuestionType::Analysis => "分析题：correctAnswer 为分析要点文本",
        QuestionType::Flashcard => "记忆卡片：questionText 为正面提示，correctAnswer 为背面内容文本",
    }
}

/// 单个分片的出题提示词
pub fn shard_prompt(
    count: usize,
    allowed: &[QuestionType],
    difficulty: &str,
    enrichment: &str,
) -> String {
    let rules = allowed
        .iter()
        .map(|t| format!("- {}", answer_rule(*t)))
        .collect::<Vec<_>>()
        .join("\n");

    let mut prompt = format!(
        "请根据以上资料生成 {count} 道考试题目。\n\
         \n\
         【题型】只能使用：{types}。type 字段填写括号中的英文标识。\n\
         【难度】{difficulty}\n\
         \n\
         【核心原则：提取优先于编写】\n\
         1. 如果资料本身包含题库（已有题目），必须逐字提取原题，不得改写题干和选项。\n\
         2. 如果资料中符合题型要求的题目少于 {count} 道，就只返回实际存在的题目，不要编造或重复凑数。\n\
         3. 只有在资料中完全没有题库、只有叙述性内容时，才允许根据内容自行出题。\n\
         4. 原题答案为\"略\"、\"无答案\"等占位内容时，优先依据补充资料给出真实答案。\n\
         \n\
         【答案格式】correctAnswer 字段一律是字符串：\n\
         {rules}\n\
         \n\
         每道题都要给出 explanation（解析）。题干不要带题号。",
        count = count,
        types = type_list(allowed),
        difficulty = difficulty,
        rules = rules,
    );

    if !enrichment.is_empty() {
        prompt.push_str("\n\n");
        prompt.push_str(enrichment);
    }

    prompt
}

/// 出题阶段要求的输出结构：`{questions: RawQuestion[]}`
pub fn question_schema(allowed: &[QuestionType]) -> JsonValue {
    let tags: Vec<&str> = allowed.iter().map(|t| t.tag()).collect();
    json!({
        "type": "object",
        "properties": {
            "questions": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "type": { "type": "string", "enum": tags },
                        "questionText": { "type": "string" },
                        "options": { "type": "array", "items": { "type": "string" } },
                        "correctAnswer": { "type": "string" },
                        "explanation": { "type": "string" }
                    },
                    "required": ["type", "questionText", "correctAnswer", "explanation"]
                }
            }
        },
        "required": ["questions"]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_prompt_lists_only_allowed_types() {
        let prompt = keyword_extraction_prompt(&[QuestionType::SingleChoice]);
        assert!(prompt.contains("single_choice"));
        assert!(!prompt.contains("flashcard"));
        assert!(prompt.contains(NONE_SENTINEL));
    }

    #[test]
    fn test_shard_prompt_embeds_count_rules_and_context() {
        let prompt = shard_prompt(
            7,
            &[QuestionType::MultipleChoice, QuestionType::Ordering],
            "困难",
            "=== 补充资料 ===\n光合作用",
        );
        assert!(prompt.contains("生成 7 道"));
        assert!(prompt.contains("困难"));
        assert!(prompt.contains("多选题："));
        assert!(prompt.contains("排序题："));
        assert!(!prompt.contains("判断题："));
        assert!(prompt.contains("逐字提取"));
        assert!(prompt.ends_with("=== 补充资料 ===\n光合作用"));
    }

    #[test]
    fn test_shard_prompt_without_context() {
        let prompt = shard_prompt(1, &[QuestionType::TrueFalse], "简单", "");
        assert!(prompt.ends_with("题干不要带题号。"));
    }

    #[test]
    fn test_schema_restricts_type_tags() {
        let schema = question_schema(&[QuestionType::TrueFalse, QuestionType::Flashcard]);
        let tags = &schema["properties"]["questions"]["items"]["properties"]["type"]["enum"];
        assert_eq!(tags, &json!(["true_false", "flashcard"]));
    }
}
