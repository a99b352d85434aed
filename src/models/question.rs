use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// 题型
///
/// 题型决定 `correct_answer` 的形状，见 [`QuestionType::expects_list`]。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    /// 单选题
    #[serde(alias = "single-choice", alias = "单选题", alias = "单选")]
    SingleChoice,
    /// 多选题
    #[serde(alias = "multiple-choice", alias = "multi_choice", alias = "多选题", alias = "多选")]
    MultipleChoice,
    /// 判断题
    #[serde(alias = "true-false", alias = "判断题", alias = "判断")]
    TrueFalse,
    /// 连线题
    #[serde(alias = "连线题", alias = "匹配题")]
    Matching,
    /// 排序题
    #[serde(alias = "排序题")]
    Ordering,
    /// 填空题
    #[serde(alias = "fill-in-blank", alias = "fill_blank", alias = "填空题", alias = "填空")]
    FillInBlank,
    /// 简答题
    #[serde(alias = "short-answer", alias = "简答题", alias = "简答")]
    ShortAnswer,
    /// 名词解释
    #[serde(alias = "noun-explanation", alias = "名词解释")]
    NounExplanation,
    /// 分析题（论述/案例分析）
    #[serde(alias = "分析题", alias = "论述题", alias = "案例分析")]
    Analysis,
    /// 记忆卡片
    #[serde(alias = "记忆卡片", alias = "闪卡")]
    Flashcard,
}

impl QuestionType {
    pub const ALL: [QuestionType; 10] = [
        QuestionType::SingleChoice,
        QuestionType::MultipleChoice,
        QuestionType::TrueFalse,
        QuestionType::Matching,
        QuestionType::Ordering,
        QuestionType::FillInBlank,
        QuestionType::ShortAnswer,
        QuestionType::NounExplanation,
        QuestionType::Analysis,
        QuestionType::Flashcard,
    ];

    /// 该题型的答案是否必须是列表
    pub fn expects_list(self) -> bool {
        matches!(
            self,
            QuestionType::MultipleChoice
                | QuestionType::Ordering
                | QuestionType::Matching
                | QuestionType::FillInBlank
        )
    }

    /// 序列化时使用的标签
    pub fn tag(self) -> &'static str {
        match self {
            QuestionType::SingleChoice => "single_choice",
            QuestionType::MultipleChoice => "multiple_choice",
            QuestionType::TrueFalse => "true_false",
            QuestionType::Matching => "matching",
            QuestionType::Ordering => "ordering",
            QuestionType::FillInBlank => "fill_in_blank",
            QuestionType::ShortAnswer => "short_answer",
            QuestionType::NounExplanation => "noun_explanation",
            QuestionType::Analysis => "analysis",
            QuestionType::Flashcard => "flashcard",
        }
    }

    /// 中文名称
    pub fn label(self) -> &'static str {
        match self {
            QuestionType::SingleChoice => "单选题",
            QuestionType::MultipleChoice => "多选题",
            QuestionType::TrueFalse => "判断题",
            QuestionType::Matching => "连线题",
            QuestionType::Ordering => "排序题",
            QuestionType::FillInBlank => "填空题",
            QuestionType::ShortAnswer => "简答题",
            QuestionType::NounExplanation => "名词解释",
            QuestionType::Analysis => "分析题",
            QuestionType::Flashcard => "记忆卡片",
        }
    }

    /// 解析题型标签（支持英文标签与中文名称）
    pub fn parse(s: &str) -> Option<Self> {
        serde_json::from_value(JsonValue::String(s.trim().to_string())).ok()
    }

    /// 解析逗号分隔的题型列表，任何一项无法识别时返回 `None`
    pub fn parse_list(s: &str) -> Option<Vec<Self>> {
        s.split([',', '，', '、'])
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(Self::parse)
            .collect()
    }
}

impl std::fmt::Display for QuestionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// 标准答案
///
/// 序列化为 `string | string[]`，只能由答案归一化器从模型输出构造。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    Single(String),
    Multiple(Vec<String>),
}

impl Answer {
    pub fn is_list(&self) -> bool {
        matches!(self, Answer::Multiple(_))
    }
}

/// 题目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub question_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    pub correct_answer: Answer,
    #[serde(default)]
    pub explanation: String,
}

impl Question {
    /// 答案形状是否与题型一致
    pub fn is_well_formed(&self) -> bool {
        self.question_type.expects_list() == self.correct_answer.is_list()
    }
}

/// 模型返回的原始题目记录
///
/// 每个字段都接受任意 JSON 值，类型和形状校正交给答案归一化器。
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawQuestion {
    #[serde(rename = "type", default)]
    pub question_type: JsonValue,
    #[serde(default)]
    pub question_text: JsonValue,
    #[serde(default)]
    pub options: JsonValue,
    #[serde(default)]
    pub correct_answer: JsonValue,
    #[serde(default)]
    pub explanation: JsonValue,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_question_type_aliases() {
        assert_eq!(QuestionType::parse("multiple_choice"), Some(QuestionType::MultipleChoice));
        assert_eq!(QuestionType::parse("多选题"), Some(QuestionType::MultipleChoice));
        assert_eq!(QuestionType::parse(" fill-in-blank "), Some(QuestionType::FillInBlank));
        assert_eq!(QuestionType::parse("essay"), None);
    }

    #[test]
    fn test_parse_list() {
        assert_eq!(
            QuestionType::parse_list("single_choice, 判断题"),
            Some(vec![QuestionType::SingleChoice, QuestionType::TrueFalse])
        );
        assert_eq!(QuestionType::parse_list("single_choice,essay"), None);
    }

    #[test]
    fn test_tag_round_trips_through_serde() {
        for ty in QuestionType::ALL {
            let json = serde_json::to_value(ty).unwrap();
            assert_eq!(json, JsonValue::String(ty.tag().to_string()));
        }
    }

    #[test]
    fn test_question_serializes_camel_case() {
        let question = Question {
            id: "1-0-0".to_string(),
            question_type: QuestionType::Ordering,
            question_text: "排列下列朝代".to_string(),
            options: None,
            correct_answer: Answer::Multiple(vec!["秦".to_string(), "汉".to_string()]),
            explanation: String::new(),
        };

        let json = serde_json::to_value(&question).unwrap();
        assert_eq!(json["type"], "ordering");
        assert_eq!(json["questionText"], "排列下列朝代");
        assert_eq!(json["correctAnswer"], serde_json::json!(["秦", "汉"]));
        assert!(json.get("options").is_none());
        assert!(question.is_well_formed());
    }
}
