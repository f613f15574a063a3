use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// 题型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    SingleChoice,
    MultipleChoice,
    FillBlank,
    ShortAnswer,
    Essay,
    Calculation,
    #[default]
    Other,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::SingleChoice => "single_choice",
            QuestionType::MultipleChoice => "multiple_choice",
            QuestionType::FillBlank => "fill_blank",
            QuestionType::ShortAnswer => "short_answer",
            QuestionType::Essay => "essay",
            QuestionType::Calculation => "calculation",
            QuestionType::Other => "other",
        }
    }

    /// 客观题必须带答案
    pub fn is_objective(&self) -> bool {
        matches!(
            self,
            QuestionType::SingleChoice | QuestionType::MultipleChoice | QuestionType::FillBlank
        )
    }
}

/// 难度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

/// 审核步骤中的一道题
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewQuestion {
    #[serde(default)]
    pub id: String,
    pub number: u32,
    pub stem: String,
    #[serde(default)]
    pub question_type: QuestionType,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub marks: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(default)]
    pub attachments: Vec<String>,
    #[serde(default)]
    pub reviewed: bool,
}

impl ReviewQuestion {
    pub fn new(number: u32, stem: impl Into<String>) -> Self {
        Self {
            id: format!("q{}", number),
            number,
            stem: stem.into(),
            question_type: QuestionType::default(),
            difficulty: Difficulty::default(),
            marks: 0.0,
            answer: None,
            attachments: Vec::new(),
            reviewed: false,
        }
    }

    /// 题干 HTML 中的图片地址
    pub fn stem_image_urls(&self) -> Vec<String> {
        static IMG_RE: OnceLock<Option<Regex>> = OnceLock::new();
        let Some(re) = IMG_RE
            .get_or_init(|| Regex::new(r#"<img\s+[^>]*src="([^"]+)""#).ok())
            .as_ref()
        else {
            return Vec::new();
        };

        re.captures_iter(&self.stem)
            .filter_map(|cap| cap.get(1).map(|m| m.as_str().to_string()))
            .collect()
    }

    /// 附件数量（显式附件 + 题干图片）
    pub fn attachment_count(&self) -> usize {
        self.attachments.len() + self.stem_image_urls().len()
    }

    pub fn has_answer(&self) -> bool {
        self.answer
            .as_deref()
            .map(|a| !a.trim().is_empty())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stem_images_count_as_attachments() {
        let mut q = ReviewQuestion::new(3, r#"如图 <img class="fig" src="https://cdn/a.png"> 求面积"#);
        q.attachments.push("https://cdn/b.png".to_string());
        assert_eq!(q.stem_image_urls(), vec!["https://cdn/a.png".to_string()]);
        assert_eq!(q.attachment_count(), 2);
    }

    #[test]
    fn question_type_uses_snake_case() {
        let json = serde_json::to_string(&QuestionType::FillBlank).unwrap();
        assert_eq!(json, "\"fill_blank\"");
        assert_eq!(QuestionType::FillBlank.as_str(), "fill_blank");
    }
}
