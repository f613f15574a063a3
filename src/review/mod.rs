//! 题目审核步骤的纯计算
//!
//! 输入相同则输出相同，不做任何 I/O

pub mod statistics;
pub mod validation;

pub use statistics::{compute_statistics, QuestionStatistics};
pub use validation::{
    classify, error_type, is_critical_error, summarize, validate_questions, Severity,
    ValidationErrors, ValidationSummary,
};
