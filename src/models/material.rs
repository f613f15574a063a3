use crate::models::blob::FileBlob;
use serde::{Deserialize, Serialize};

/// 学习资料（materials 表）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub unit_id: String,
    pub file_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_path: Option<String>,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub size_bytes: u64,
}

/// 插入 materials 表的数据
#[derive(Debug, Clone, Serialize)]
pub struct NewMaterial {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub unit_id: String,
    pub file_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_path: Option<String>,
    pub mime_type: String,
    pub size_bytes: u64,
}

/// 上传资料请求
#[derive(Debug, Clone)]
pub struct MaterialUpload {
    pub title: String,
    pub description: Option<String>,
    pub unit_id: String,
    pub file: FileBlob,
    pub thumbnail: Option<FileBlob>,
}
