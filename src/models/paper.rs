use crate::error::{AppError, AppResult};
use crate::models::question::ReviewQuestion;
use serde::{Deserialize, Serialize};

/// 上传解析后的试卷数据
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedPaperData {
    pub metadata: PaperMetadata,
    #[serde(default)]
    pub structure: Vec<PaperSection>,
    #[serde(default)]
    pub questions: Vec<ReviewQuestion>,
}

/// 试卷元信息
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaperMetadata {
    pub title: String,
    pub subject: String,
    #[serde(default)]
    pub grade: String,
    #[serde(default, deserialize_with = "deserialize_year")]
    pub year: String,
    #[serde(default)]
    pub province: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exam_board: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_marks: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
}

/// 试卷结构中的一个大题/分区
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperSection {
    pub title: String,
    pub start_number: u32,
    pub end_number: u32,
}

impl PaperSection {
    pub fn contains(&self, number: u32) -> bool {
        (self.start_number..=self.end_number).contains(&number)
    }
}

impl PaperMetadata {
    /// 元信息步骤的字段校验
    pub fn validate(&self) -> AppResult<()> {
        if self.title.trim().is_empty() {
            return Err(AppError::required("title"));
        }
        if self.subject.trim().is_empty() {
            return Err(AppError::required("subject"));
        }
        if !self.year.is_empty()
            && (self.year.len() != 4 || !self.year.chars().all(|c| c.is_ascii_digit()))
        {
            return Err(AppError::invalid("year", format!("'{}' 不是四位年份", self.year)));
        }
        if let Some(total) = self.total_marks {
            if !total.is_finite() || total <= 0.0 {
                return Err(AppError::invalid("total_marks", "总分必须大于 0"));
            }
        }
        Ok(())
    }
}

impl ParsedPaperData {
    /// 结构步骤的校验：分区首尾有序且互不重叠
    pub fn validate_structure(&self) -> AppResult<()> {
        let mut sections: Vec<&PaperSection> = self.structure.iter().collect();
        sections.sort_by_key(|s| s.start_number);

        for section in &sections {
            if section.start_number > section.end_number {
                return Err(AppError::invalid(
                    "structure",
                    format!(
                        "分区 '{}' 起止题号颠倒 ({} > {})",
                        section.title, section.start_number, section.end_number
                    ),
                ));
            }
        }
        for pair in sections.windows(2) {
            if pair[1].start_number <= pair[0].end_number {
                return Err(AppError::invalid(
                    "structure",
                    format!("分区 '{}' 与 '{}' 题号重叠", pair[0].title, pair[1].title),
                ));
            }
        }
        Ok(())
    }

    /// 未识别出结构时，用整卷生成一个分区
    pub fn ensure_structure(&mut self) {
        if !self.structure.is_empty() || self.questions.is_empty() {
            return;
        }
        let start = self.questions.iter().map(|q| q.number).min().unwrap_or(1);
        let end = self.questions.iter().map(|q| q.number).max().unwrap_or(start);
        self.structure.push(PaperSection {
            title: "全卷".to_string(),
            start_number: start,
            end_number: end,
        });
    }

    /// 题号所在的分区标题
    pub fn section_of(&self, number: u32) -> Option<&str> {
        self.structure
            .iter()
            .find(|s| s.contains(number))
            .map(|s| s.title.as_str())
    }
}

// Helper function to deserialize year as either string or integer
fn deserialize_year<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Visitor;
    use std::fmt;

    struct YearVisitor;

    impl<'de> Visitor<'de> for YearVisitor {
        type Value = String;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or integer representing a year")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.trim().to_string())
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }
    }

    deserializer.deserialize_any(YearVisitor)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata() -> PaperMetadata {
        PaperMetadata {
            title: "2024年期末考试".to_string(),
            subject: "数学".to_string(),
            year: "2024".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn metadata_requires_title_and_subject() {
        assert!(metadata().validate().is_ok());

        let mut m = metadata();
        m.title = "  ".to_string();
        assert!(m.validate().is_err());

        let mut m = metadata();
        m.year = "24".to_string();
        assert!(m.validate().is_err());
    }

    #[test]
    fn year_accepts_integer_in_json() {
        let m: PaperMetadata =
            serde_json::from_str(r#"{"title":"t","subject":"s","year":2023}"#).unwrap();
        assert_eq!(m.year, "2023");
    }

    #[test]
    fn overlapping_sections_are_rejected() {
        let paper = ParsedPaperData {
            metadata: metadata(),
            structure: vec![
                PaperSection { title: "一".into(), start_number: 1, end_number: 5 },
                PaperSection { title: "二".into(), start_number: 5, end_number: 8 },
            ],
            questions: Vec::new(),
        };
        assert!(paper.validate_structure().is_err());
    }
}
