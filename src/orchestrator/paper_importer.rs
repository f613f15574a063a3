//! 单个试卷导入 - 编排层
//!
//! 按向导顺序推进一个试卷文件：
//!
//! 1. **上传**：解析文件、上传原始文件、创建服务端会话
//! 2. **元信息**：校验标题/学科/年份
//! 3. **结构**：补齐或校验分区
//! 4. **题目审核**：上传本地附件、校验、统计、写入题库
//!
//! 任何一步失败都会记录到向导的步骤状态，断点保留以便下次继续。

use crate::error::{AppError, BusinessError};
use crate::models::{load_paper_file, FileBlob, ParsedPaperData, ReviewQuestion};
use crate::repositories::questions::QuestionRow;
use crate::repositories::{ImportSessionRepository, ObjectStore, QuestionRepository, MATERIALS_BUCKET};
use crate::review::{classify, compute_statistics, summarize, validate_questions, QuestionStatistics, Severity};
use crate::services::WarnWriter;
use crate::utils::logging::truncate_text;
use crate::wizard::{SessionCheckpoint, WizardController, WizardStep};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// 单个试卷的导入结果
#[derive(Debug, Clone)]
pub struct ImportOutcome {
    pub session_id: String,
    pub paper_id: String,
    /// 写入题库的题目数
    pub imported: usize,
    /// 因严重问题跳过的题目数
    pub skipped: usize,
    pub attachments_uploaded: usize,
    pub statistics: QuestionStatistics,
}

/// 试卷导入器
pub struct PaperImporter<'a, G> {
    gateway: &'a G,
    warn_writer: &'a WarnWriter,
}

fn no_session() -> AppError {
    BusinessError::NoActiveSession.into()
}

/// 校验或业务规则错误（重试同样的数据不会成功）
fn is_data_error(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<AppError>(),
        Some(AppError::Validation(_)) | Some(AppError::Business(_))
    )
}

/// 附件是否已经是远程地址
fn is_remote(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// 根据扩展名推断文件类型
pub fn content_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("webp") => "image/webp",
        Some("pdf") => "application/pdf",
        Some("toml") => "application/toml",
        Some("json") => "application/json",
        _ => "application/octet-stream",
    }
}

impl<'a, G: QuestionRepository + ObjectStore> PaperImporter<'a, G> {
    pub fn new(gateway: &'a G, warn_writer: &'a WarnWriter) -> Self {
        Self {
            gateway,
            warn_writer,
        }
    }

    /// 从上传开始导入一个试卷文件
    pub async fn import_file<R, C>(
        &self,
        wizard: &mut WizardController<R, C>,
        path: &Path,
    ) -> Result<ImportOutcome>
    where
        R: ImportSessionRepository,
        C: SessionCheckpoint,
    {
        if let Err(e) = self.upload_step(wizard, path).await {
            wizard.fail(WizardStep::Upload, e.to_string());
            return Err(e);
        }
        self.continue_session(wizard).await
    }

    /// 继续断点中的会话
    ///
    /// 会话数据本身校验不通过时，放弃该会话并从磁盘重新导入原文件。
    /// 试卷记录已创建的会话不会重新导入。
    pub async fn resume<R, C>(&self, wizard: &mut WizardController<R, C>) -> Result<ImportOutcome>
    where
        R: ImportSessionRepository,
        C: SessionCheckpoint,
    {
        let file = wizard.session().map(|s| PathBuf::from(&s.file_name));
        let err = match self.continue_session(wizard).await {
            Ok(outcome) => return Ok(outcome),
            Err(e) => e,
        };

        let paper_created = wizard.session().is_some_and(|s| s.paper_id.is_some());
        let Some(file) = file.filter(|f| f.is_file()) else {
            return Err(err);
        };
        if paper_created || !is_data_error(&err) {
            return Err(err);
        }

        warn!(
            "[试卷 {}] ♻️ 会话数据无法继续 ({:#})，改为重新读取文件",
            file.display(),
            err
        );
        wizard.abandon().await;
        self.import_file(wizard, &file).await
    }

    /// 从当前步骤继续，直到导入完成
    pub async fn continue_session<R, C>(&self, wizard: &mut WizardController<R, C>) -> Result<ImportOutcome>
    where
        R: ImportSessionRepository,
        C: SessionCheckpoint,
    {
        loop {
            let step = wizard.current_step();
            let result = match step {
                WizardStep::Upload => Err(no_session().into()),
                WizardStep::Metadata => self.metadata_step(wizard).await,
                WizardStep::Structure => self.structure_step(wizard).await,
                WizardStep::Questions => match self.questions_step(wizard).await {
                    Ok(outcome) => return Ok(outcome),
                    Err(e) => Err(e),
                },
            };

            if let Err(e) = result {
                wizard.fail(step, e.to_string());
                return Err(e).with_context(|| format!("步骤 {} ({}) 失败", step.title(), step));
            }
        }
    }

    /// 上传步骤
    async fn upload_step<R, C>(&self, wizard: &mut WizardController<R, C>, path: &Path) -> Result<()>
    where
        R: ImportSessionRepository,
        C: SessionCheckpoint,
    {
        let file_name = path.display().to_string();
        info!("[试卷 {}] 📤 上传并解析...", file_name);

        let mut data = load_paper_file(path).await?;
        data.ensure_structure();

        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("无法读取试卷文件: {}", file_name))?;
        let blob = FileBlob::new(
            path.file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| file_name.clone()),
            content_type_for(path),
            bytes,
        );
        let object_path = match blob.extension() {
            Some(ext) => format!("paper-imports/originals/{}.{}", uuid::Uuid::new_v4(), ext),
            None => format!("paper-imports/originals/{}", uuid::Uuid::new_v4()),
        };
        self.gateway
            .put_object(MATERIALS_BUCKET, &object_path, &blob)
            .await?;

        info!(
            "[试卷 {}] ✓ 解析完成: {} 道题目, {} 个分区",
            file_name,
            data.questions.len(),
            data.structure.len()
        );

        wizard
            .start_session(&file_name, Some(object_path), data)
            .await?;
        Ok(())
    }

    /// 元信息步骤
    async fn metadata_step<R, C>(&self, wizard: &mut WizardController<R, C>) -> Result<()>
    where
        R: ImportSessionRepository,
        C: SessionCheckpoint,
    {
        let data = wizard.data().ok_or_else(no_session)?;
        data.metadata.validate()?;
        info!(
            "[试卷 {}] ✓ 试卷信息: {} / {} / {}",
            data.metadata.title, data.metadata.subject, data.metadata.grade, data.metadata.year
        );

        wizard.save_progress().await?;
        wizard.advance(WizardStep::Metadata)?;
        Ok(())
    }

    /// 结构步骤
    async fn structure_step<R, C>(&self, wizard: &mut WizardController<R, C>) -> Result<()>
    where
        R: ImportSessionRepository,
        C: SessionCheckpoint,
    {
        let data = wizard.data_mut().ok_or_else(no_session)?;
        data.ensure_structure();
        data.validate_structure()?;
        for section in &data.structure {
            info!(
                "[试卷 {}]   {} ({}-{})",
                data.metadata.title, section.title, section.start_number, section.end_number
            );
        }

        wizard.save_progress().await?;
        wizard.advance(WizardStep::Structure)?;
        Ok(())
    }

    /// 题目审核步骤，成功后完成整个向导
    async fn questions_step<R, C>(&self, wizard: &mut WizardController<R, C>) -> Result<ImportOutcome>
    where
        R: ImportSessionRepository,
        C: SessionCheckpoint,
    {
        let session = wizard.session().ok_or_else(no_session)?;
        let session_id = session.id.clone();
        let base_dir = Path::new(&session.file_name)
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        // 本地附件先暂存，再统一上传
        self.stage_local_attachments(wizard, &base_dir).await?;
        let attachments_uploaded = wizard.commit_attachments(self.gateway).await?;

        let data = wizard.data_mut().ok_or_else(no_session)?;
        let title = data.metadata.title.clone();

        let errors = validate_questions(&data.questions);
        let summary = summarize(&errors);
        info!(
            "[试卷 {}] 🔎 校验: 严重 {} 题, 警告 {} 题, 共 {} 个问题",
            title,
            summary.critical.len(),
            summary.warnings.len(),
            summary.total_errors
        );

        for question in data.questions.iter_mut() {
            match errors.get(&question.id).and_then(|e| classify(e)) {
                Some(Severity::Critical) => {
                    let issues = &errors[&question.id];
                    warn!(
                        "[试卷 {}] ⚠️ 第 {} 题有严重问题，跳过: {}",
                        title,
                        question.number,
                        truncate_text(&issues.join("; "), 80)
                    );
                    if let Err(e) = self.warn_writer.write(&title, question.number, issues) {
                        warn!("[试卷 {}] 写入 warn.txt 失败: {}", title, e);
                    }
                    question.reviewed = false;
                }
                _ => question.reviewed = true,
            }
        }

        let statistics = compute_statistics(&data.questions);
        log_statistics(&title, &statistics);

        if statistics.ready_to_import == 0 {
            return Err(AppError::from(BusinessError::EmptyPaper { paper: title }).into());
        }

        let data_snapshot: ParsedPaperData = data.clone();
        wizard.save_progress().await?;

        let existing_paper = wizard.session().and_then(|s| s.paper_id.clone());
        let paper_id = match existing_paper {
            Some(paper_id) => {
                info!("[试卷 {}] ♻️ 试卷 {} 已创建，跳过创建", title, paper_id);
                paper_id
            }
            None => {
                let paper_id = self
                    .gateway
                    .create_paper(&data_snapshot, &session_id)
                    .await?;
                wizard.record_paper(&paper_id).await?;
                paper_id
            }
        };
        let rows: Vec<QuestionRow> = data_snapshot
            .questions
            .iter()
            .filter(|q| q.reviewed)
            .map(|q| QuestionRow::from_question(&paper_id, q, &data_snapshot))
            .collect();
        let imported = self.gateway.insert_questions(&rows).await?;
        info!("[试卷 {}] ✓ 已写入 {} 道题目 (试卷 {})", title, imported, paper_id);

        wizard.advance(WizardStep::Questions)?;
        let completed = wizard.complete(&paper_id).await?;

        Ok(ImportOutcome {
            session_id: completed.session_id,
            paper_id: completed.paper_id,
            imported,
            skipped: summary.critical.len(),
            attachments_uploaded,
            statistics,
        })
    }

    /// 把题目中的本地文件路径转为暂存附件
    async fn stage_local_attachments<R, C>(
        &self,
        wizard: &mut WizardController<R, C>,
        base_dir: &Path,
    ) -> Result<()>
    where
        R: ImportSessionRepository,
        C: SessionCheckpoint,
    {
        let questions: Vec<ReviewQuestion> = wizard
            .data()
            .map(|d| d.questions.clone())
            .unwrap_or_default();

        for question in &questions {
            for local in question.attachments.iter().filter(|a| !is_remote(a)) {
                let path: PathBuf = base_dir.join(local);
                match tokio::fs::read(&path).await {
                    Ok(bytes) => {
                        let name = path
                            .file_name()
                            .map(|n| n.to_string_lossy().to_string())
                            .unwrap_or_else(|| local.clone());
                        wizard
                            .attachments_mut()
                            .stage(question.id.clone(), FileBlob::new(name, content_type_for(&path), bytes));
                    }
                    Err(e) => warn!("⚠️ 第 {} 题附件无法读取，已忽略 ({}): {}", question.number, path.display(), e),
                }
            }
        }

        if let Some(data) = wizard.data_mut() {
            for question in data.questions.iter_mut() {
                question.attachments.retain(|a| is_remote(a));
            }
        }
        Ok(())
    }
}

fn log_statistics(title: &str, stats: &QuestionStatistics) {
    info!(
        "[试卷 {}] 📊 题目 {} 道, 总分 {}, 平均分 {}",
        title, stats.total, stats.total_marks, stats.avg_marks
    );
    for (question_type, count) in &stats.by_type {
        info!("[试卷 {}]   题型 {}: {}", title, question_type.as_str(), count);
    }
    for (difficulty, count) in &stats.by_difficulty {
        info!("[试卷 {}]   难度 {}: {}", title, difficulty.as_str(), count);
    }
    info!(
        "[试卷 {}]   附件覆盖 {}/{} ({:.1}%), 已审核 {:.0}%, 可导入 {}",
        title,
        stats.with_attachments,
        stats.total,
        stats.attachment_coverage,
        stats.review_ratio * 100.0,
        stats.ready_to_import
    );
}
