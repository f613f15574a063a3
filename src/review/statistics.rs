use crate::models::{Difficulty, QuestionType, ReviewQuestion};
use crate::review::validation::{classify, validate_questions, Severity};
use serde::Serialize;
use std::collections::BTreeMap;

/// 统计面板数据
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionStatistics {
    pub total: usize,
    pub by_type: BTreeMap<QuestionType, usize>,
    pub by_difficulty: BTreeMap<Difficulty, usize>,
    pub total_marks: f64,
    /// 平均分，保留一位小数
    pub avg_marks: String,
    /// 至少有一个附件的题目数
    pub with_attachments: usize,
    /// 附件覆盖率（百分比）
    pub attachment_coverage: f64,
    pub reviewed: usize,
    /// 已审核比例（0.0 - 1.0）
    pub review_ratio: f64,
    /// 已审核且没有严重问题的题目数
    pub ready_to_import: usize,
}

/// 根据题目列表计算统计
pub fn compute_statistics(questions: &[ReviewQuestion]) -> QuestionStatistics {
    let total = questions.len();

    let mut by_type = BTreeMap::new();
    let mut by_difficulty = BTreeMap::new();
    for q in questions {
        *by_type.entry(q.question_type).or_insert(0) += 1;
        *by_difficulty.entry(q.difficulty).or_insert(0) += 1;
    }

    let total_marks: f64 = questions.iter().map(|q| q.marks).sum();
    let avg = if total > 0 { total_marks / total as f64 } else { 0.0 };

    let with_attachments = questions.iter().filter(|q| q.attachment_count() > 0).count();
    let reviewed = questions.iter().filter(|q| q.reviewed).count();

    let errors = validate_questions(questions);
    let ready_to_import = questions
        .iter()
        .filter(|q| q.reviewed)
        .filter(|q| {
            errors
                .get(&q.id)
                .map(|e| classify(e) != Some(Severity::Critical))
                .unwrap_or(true)
        })
        .count();

    QuestionStatistics {
        total,
        by_type,
        by_difficulty,
        total_marks,
        avg_marks: format_one_decimal(avg),
        with_attachments,
        attachment_coverage: ratio(with_attachments, total) * 100.0,
        reviewed,
        review_ratio: ratio(reviewed, total),
        ready_to_import,
    }
}

/// 保留一位小数，恰好一半时远离零取整（1.25 → "1.3"）
fn format_one_decimal(value: f64) -> String {
    format!("{:.1}", (value * 10.0).round() / 10.0)
}

fn ratio(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64
    }
}
