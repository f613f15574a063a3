//! 教学目录：学科 → 课程 → 单元

use serde::{Deserialize, Serialize};

/// 学科（subjects 表）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// 课程（courses 表）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: String,
    pub subject_id: String,
    pub name: String,
}

/// 单元（edu_units 表）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EduUnit {
    pub id: String,
    pub course_id: String,
    pub title: String,
    #[serde(default)]
    pub position: i32,
}
