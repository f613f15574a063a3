//! 试卷文件加载
//!
//! 支持 TOML 与 JSON 两种格式，解析为 ParsedPaperData

use crate::error::{AppError, AppResult, FileError};
use crate::models::paper::ParsedPaperData;
use std::path::{Path, PathBuf};
use tokio::fs;

/// 从文件加载试卷数据
pub async fn load_paper_file(path: &Path) -> AppResult<ParsedPaperData> {
    let display = path.display().to_string();

    if !path.exists() {
        return Err(FileError::NotFound { path: display }.into());
    }

    let content = fs::read_to_string(path)
        .await
        .map_err(|e| AppError::file_read_failed(&display, e))?;

    let extension = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_lowercase());

    parse_paper(&content, extension.as_deref(), &display)
}

/// 按扩展名解析试卷内容
pub fn parse_paper(content: &str, extension: Option<&str>, path: &str) -> AppResult<ParsedPaperData> {
    let mut paper: ParsedPaperData = match extension {
        Some("toml") => toml::from_str(content).map_err(|e| AppError::file_parse_failed(path, e))?,
        Some("json") => serde_json::from_str(content).map_err(|e| AppError::file_parse_failed(path, e))?,
        _ => {
            return Err(FileError::UnsupportedFormat {
                path: path.to_string(),
            }
            .into())
        }
    };

    // 未提供 ID 的题目按题号补齐
    for question in paper.questions.iter_mut() {
        if question.id.trim().is_empty() {
            question.id = format!("q{}", question.number);
        }
    }

    Ok(paper)
}

/// 列出目录中所有待导入的试卷文件（按文件名排序）
pub async fn list_paper_files(folder_path: &str) -> AppResult<Vec<PathBuf>> {
    let folder = PathBuf::from(folder_path);

    if !folder.exists() {
        return Err(FileError::NotFound {
            path: folder_path.to_string(),
        }
        .into());
    }

    let mut files = Vec::new();
    let mut entries = fs::read_dir(&folder)
        .await
        .map_err(|e| AppError::file_read_failed(folder_path, e))?;

    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| AppError::file_read_failed(folder_path, e))?
    {
        let path = entry.path();
        let is_paper = matches!(
            path.extension()
                .and_then(|s| s.to_str())
                .map(|s| s.to_ascii_lowercase())
                .as_deref(),
            Some("toml") | Some("json")
        );
        if is_paper {
            files.push(path);
        }
    }

    files.sort();
    tracing::debug!("在 {} 中找到 {} 个试卷文件", folder_path, files.len());

    Ok(files)
}
