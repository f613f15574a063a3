//! 警告写入服务
//!
//! 只负责把有严重问题的题目写入 warn.txt，不关心流程

use anyhow::Result;
use std::fs::OpenOptions;
use std::io::Write;
use tracing::debug;

/// 警告写入服务
///
/// 职责：
/// - 将审核中发现严重问题的题目写入 warn.txt
/// - 每次只写一道题
pub struct WarnWriter {
    warn_file_path: String,
}

impl WarnWriter {
    /// 创建新的警告写入服务
    pub fn new() -> Self {
        Self {
            warn_file_path: "warn.txt".to_string(),
        }
    }

    /// 使用自定义文件路径创建
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            warn_file_path: path.into(),
        }
    }

    /// 写入警告信息
    ///
    /// # 参数
    /// - `paper_title`: 试卷名称
    /// - `question_number`: 题号
    /// - `issues`: 问题列表
    pub fn write(&self, paper_title: &str, question_number: u32, issues: &[String]) -> Result<()> {
        debug!(
            "写入警告: 试卷 {} | 题目 {} | 问题数: {}",
            paper_title,
            question_number,
            issues.len()
        );

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.warn_file_path)?;

        let warn_msg = format!(
            "试卷 {} | 题目 {} | 问题: {}\n",
            paper_title,
            question_number,
            issues.join("; ")
        );

        file.write_all(warn_msg.as_bytes())?;

        Ok(())
    }
}

impl Default for WarnWriter {
    fn default() -> Self {
        Self::new()
    }
}
