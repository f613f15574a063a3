use crate::clients::BackendClient;
use crate::error::AppResult;
use crate::models::{Difficulty, ParsedPaperData, QuestionType, ReviewQuestion};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// questions 表的一行
#[derive(Debug, Clone, Serialize)]
pub struct QuestionRow {
    pub paper_id: String,
    pub number: u32,
    pub stem: String,
    pub question_type: QuestionType,
    pub difficulty: Difficulty,
    pub marks: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    pub attachments: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
}

impl QuestionRow {
    pub fn from_question(paper_id: &str, question: &ReviewQuestion, paper: &ParsedPaperData) -> Self {
        let mut attachments = question.attachments.clone();
        for url in question.stem_image_urls() {
            if !attachments.contains(&url) {
                attachments.push(url);
            }
        }

        Self {
            paper_id: paper_id.to_string(),
            number: question.number,
            stem: question.stem.clone(),
            question_type: question.question_type,
            difficulty: question.difficulty,
            marks: question.marks,
            answer: question.answer.clone(),
            attachments,
            section: paper.section_of(question.number).map(|s| s.to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct PaperRow {
    id: String,
}

/// 试卷与题目写入
#[allow(async_fn_in_trait)]
pub trait QuestionRepository {
    /// 创建试卷记录，返回试卷ID
    async fn create_paper(&self, paper: &ParsedPaperData, session_id: &str) -> AppResult<String>;

    /// 批量写入题目，返回写入数量
    async fn insert_questions(&self, rows: &[QuestionRow]) -> AppResult<usize>;
}

impl QuestionRepository for BackendClient {
    async fn create_paper(&self, paper: &ParsedPaperData, session_id: &str) -> AppResult<String> {
        let body = json!({
            "title": paper.metadata.title,
            "subject": paper.metadata.subject,
            "grade": paper.metadata.grade,
            "year": paper.metadata.year,
            "province": paper.metadata.province,
            "exam_board": paper.metadata.exam_board,
            "total_marks": paper.metadata.total_marks,
            "duration_minutes": paper.metadata.duration_minutes,
            "structure": paper.structure,
            "import_session_id": session_id,
        });
        let row: PaperRow = self.insert("papers", &body).await?;
        Ok(row.id)
    }

    async fn insert_questions(&self, rows: &[QuestionRow]) -> AppResult<usize> {
        if rows.is_empty() {
            return Ok(0);
        }
        self.insert_many("questions", rows).await?;
        Ok(rows.len())
    }
}
