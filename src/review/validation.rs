use crate::models::ReviewQuestion;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// 题目ID → 校验错误列表
pub type ValidationErrors = BTreeMap<String, Vec<String>>;

const CRITICAL_KEYWORDS: [&str; 3] = ["required", "missing", "invalid"];

/// 问题严重程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Warning,
}

/// 校验汇总
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationSummary {
    /// 有严重问题的题目ID
    pub critical: Vec<String>,
    /// 只有警告的题目ID
    pub warnings: Vec<String>,
    /// 错误类型 → 出现次数
    pub error_types: BTreeMap<String, usize>,
    pub total_errors: usize,
}

impl ValidationSummary {
    /// 存在严重问题时不能导入
    pub fn has_blocking_issues(&self) -> bool {
        !self.critical.is_empty()
    }

    pub fn is_critical(&self, question_id: &str) -> bool {
        self.critical.iter().any(|id| id == question_id)
    }
}

/// 错误消息是否属于严重问题（不区分大小写）
pub fn is_critical_error(message: &str) -> bool {
    let lower = message.to_lowercase();
    CRITICAL_KEYWORDS.iter().any(|k| lower.contains(k))
}

/// 错误类型：第一个冒号之前的部分
pub fn error_type(message: &str) -> &str {
    match message.split_once(':') {
        Some((head, _)) => head.trim(),
        None => message,
    }
}

/// 单题分级，没有错误返回 None
pub fn classify(errors: &[String]) -> Option<Severity> {
    if errors.is_empty() {
        None
    } else if errors.iter().any(|e| is_critical_error(e)) {
        Some(Severity::Critical)
    } else {
        Some(Severity::Warning)
    }
}

/// 汇总所有题目的校验结果
pub fn summarize(errors: &ValidationErrors) -> ValidationSummary {
    let mut summary = ValidationSummary::default();

    for (question_id, messages) in errors {
        match classify(messages) {
            Some(Severity::Critical) => summary.critical.push(question_id.clone()),
            Some(Severity::Warning) => summary.warnings.push(question_id.clone()),
            None => continue,
        }

        for message in messages {
            *summary
                .error_types
                .entry(error_type(message).to_string())
                .or_insert(0) += 1;
            summary.total_errors += 1;
        }
    }

    summary
}

/// 生成每道题的校验错误（无错误的题目不出现在结果中）
pub fn validate_questions(questions: &[ReviewQuestion]) -> ValidationErrors {
    let mut number_counts: HashMap<u32, usize> = HashMap::new();
    for q in questions {
        *number_counts.entry(q.number).or_insert(0) += 1;
    }

    let mut result = ValidationErrors::new();
    for q in questions {
        let mut errors = Vec::new();

        if q.stem.trim().is_empty() {
            errors.push("Required: stem".to_string());
        }
        if !q.marks.is_finite() || q.marks <= 0.0 {
            errors.push(format!("Invalid: marks ({})", q.marks));
        }
        if q.question_type.is_objective() && !q.has_answer() {
            errors.push("Missing: answer".to_string());
        }
        if number_counts.get(&q.number).copied().unwrap_or(0) > 1 {
            errors.push(format!("Invalid: duplicate number {}", q.number));
        }
        if q.stem.matches('<').count() != q.stem.matches('>').count() {
            errors.push("Formatting: stem has unbalanced tags".to_string());
        }

        if !errors.is_empty() {
            result.insert(q.id.clone(), errors);
        }
    }
    result
}
