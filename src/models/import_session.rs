//! 试卷导入会话
//!
//! 服务端记录一次进行中的导入，本地只保存其 ID

use crate::models::paper::ParsedPaperData;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 导入会话状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
}

/// 导入会话（question_import_sessions 表的一行）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportSession {
    pub id: String,
    /// 上传的原始文件名
    pub file_name: String,
    /// 原始文件在存储中的路径
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    /// 解析出的试卷数据
    #[serde(default)]
    pub parsed_data: ParsedPaperData,
    #[serde(default)]
    pub status: ImportStatus,
    /// 导入完成后生成的试卷ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paper_id: Option<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

/// 新建会话的插入数据
#[derive(Debug, Clone, Serialize)]
pub struct NewImportSession {
    pub file_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    pub parsed_data: ParsedPaperData,
    pub status: ImportStatus,
}

impl ImportSession {
    pub fn is_terminal(&self) -> bool {
        matches!(self.status, ImportStatus::Completed | ImportStatus::Failed)
    }
}
