//! 向导控制器
//!
//! 状态由两部分组成：已完成步骤集合 + 当前步骤。
//! 跳转规则在这里显式检查，而不是依赖界面禁用按钮。

use crate::error::{AppResult, BusinessError};
use crate::models::{ImportSession, ImportStatus, NewImportSession, ParsedPaperData};
use crate::repositories::{ImportSessionRepository, ObjectStore};
use crate::wizard::attachments::StagedAttachments;
use crate::wizard::checkpoint::SessionCheckpoint;
use crate::wizard::step::{StepStatus, WizardStep, STEP_ORDER};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};

/// 步骤状态机
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WizardState {
    current: WizardStep,
    completed: BTreeSet<WizardStep>,
    errors: BTreeMap<WizardStep, String>,
}

impl Default for WizardState {
    fn default() -> Self {
        Self::new()
    }
}

impl WizardState {
    pub fn new() -> Self {
        Self {
            current: WizardStep::Upload,
            completed: BTreeSet::new(),
            errors: BTreeMap::new(),
        }
    }

    pub fn current(&self) -> WizardStep {
        self.current
    }

    pub fn completed(&self) -> &BTreeSet<WizardStep> {
        &self.completed
    }

    pub fn is_completed(&self, step: WizardStep) -> bool {
        self.completed.contains(&step)
    }

    /// 该步骤之前的步骤是否全部完成
    pub fn is_unlocked(&self, step: WizardStep) -> bool {
        step.predecessors().iter().all(|s| self.completed.contains(s))
    }

    /// 完成 `step` 并进入下一步；最后一步只标记完成
    pub fn advance(&mut self, step: WizardStep) -> AppResult<()> {
        if step != self.current && !self.is_completed(step) {
            return Err(BusinessError::StepLocked {
                step: step.id().to_string(),
            }
            .into());
        }

        self.completed.insert(step);
        self.errors.remove(&step);

        if let Some(next) = step.next() {
            self.current = next;
        }
        Ok(())
    }

    /// 回到已完成的步骤或停留在当前步骤，其他目标一律拒绝
    pub fn go_to(&mut self, step: WizardStep) -> AppResult<()> {
        if step == self.current || self.is_completed(step) {
            self.current = step;
            return Ok(());
        }
        Err(BusinessError::StepLocked {
            step: step.id().to_string(),
        }
        .into())
    }

    /// 与 go_to 相同的检查
    pub fn rewind(&mut self, step: WizardStep) -> AppResult<()> {
        self.go_to(step)
    }

    /// 记录步骤错误（不改变当前步骤）
    pub fn fail(&mut self, step: WizardStep, message: impl Into<String>) {
        self.errors.insert(step, message.into());
    }

    pub fn error(&self, step: WizardStep) -> Option<&str> {
        self.errors.get(&step).map(|s| s.as_str())
    }

    pub fn status(&self, step: WizardStep) -> StepStatus {
        if self.errors.contains_key(&step) {
            StepStatus::Error
        } else if step == self.current && !(step.is_last() && self.completed.contains(&step)) {
            StepStatus::InProgress
        } else if self.completed.contains(&step) {
            StepStatus::Completed
        } else {
            StepStatus::Pending
        }
    }

    /// 所有步骤的状态（按固定顺序）
    pub fn statuses(&self) -> Vec<(WizardStep, StepStatus)> {
        STEP_ORDER.iter().map(|s| (*s, self.status(*s))).collect()
    }

    /// 恢复会话时的状态：上传已完成，从元信息开始
    fn restored() -> Self {
        let mut state = Self::new();
        state.completed.insert(WizardStep::Upload);
        state.current = WizardStep::Metadata;
        state
    }
}

/// 导入完成的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedImport {
    pub session_id: String,
    pub paper_id: String,
}

/// 向导控制器
///
/// - 管理步骤跳转
/// - 持有当前导入会话，会话ID变化时写入断点
/// - 完成时清除断点（服务端记录保留）
pub struct WizardController<R, C> {
    repo: R,
    checkpoint: C,
    state: WizardState,
    session: Option<ImportSession>,
    attachments: StagedAttachments,
}

impl<R: ImportSessionRepository, C: SessionCheckpoint> WizardController<R, C> {
    pub fn new(repo: R, checkpoint: C) -> Self {
        Self {
            repo,
            checkpoint,
            state: WizardState::new(),
            session: None,
            attachments: StagedAttachments::new(),
        }
    }

    /// 从断点恢复会话
    ///
    /// 恢复失败只记录日志并从头开始，返回是否恢复成功
    pub async fn initialize(&mut self) -> bool {
        let saved = match self.checkpoint.load() {
            Ok(saved) => saved,
            Err(e) => {
                warn!("⚠️ 读取导入断点失败，将重新开始: {}", e);
                None
            }
        };

        let Some(session_id) = saved else {
            debug!("没有未完成的导入会话");
            self.reset();
            return false;
        };

        match self.repo.fetch(&session_id).await {
            Ok(Some(session)) if !session.is_terminal() => {
                info!("♻️ 恢复导入会话: {} ({})", session.id, session.file_name);
                self.state = WizardState::restored();
                self.session = Some(session);
                self.attachments.clear();
                true
            }
            Ok(Some(session)) => {
                warn!("⚠️ 断点中的会话 {} 已结束 ({:?})，将重新开始", session.id, session.status);
                self.discard_checkpoint();
                self.reset();
                false
            }
            Ok(None) => {
                warn!("⚠️ 断点中的会话 {} 已不存在，将重新开始", session_id);
                self.discard_checkpoint();
                self.reset();
                false
            }
            Err(e) => {
                warn!("⚠️ 恢复会话 {} 失败，将重新开始: {}", session_id, e);
                self.discard_checkpoint();
                self.reset();
                false
            }
        }
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub fn current_step(&self) -> WizardStep {
        self.state.current()
    }

    pub fn session(&self) -> Option<&ImportSession> {
        self.session.as_ref()
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.id.as_str())
    }

    pub fn data(&self) -> Option<&ParsedPaperData> {
        self.session.as_ref().map(|s| &s.parsed_data)
    }

    pub fn data_mut(&mut self) -> Option<&mut ParsedPaperData> {
        self.session.as_mut().map(|s| &mut s.parsed_data)
    }

    pub fn attachments(&self) -> &StagedAttachments {
        &self.attachments
    }

    pub fn attachments_mut(&mut self) -> &mut StagedAttachments {
        &mut self.attachments
    }

    /// 上传暂存附件并写回当前会话的题目
    pub async fn commit_attachments<S: ObjectStore>(&mut self, store: &S) -> AppResult<usize> {
        if self.state.current() != WizardStep::Questions {
            return Err(BusinessError::StepLocked {
                step: WizardStep::Questions.id().to_string(),
            }
            .into());
        }
        let session = self.session.as_mut().ok_or(BusinessError::NoActiveSession)?;
        self.attachments
            .commit(store, &session.id, &mut session.parsed_data.questions)
            .await
    }

    /// 设置当前会话，ID 变化时写入断点
    pub fn set_session(&mut self, session: ImportSession) {
        let changed = self.session_id() != Some(session.id.as_str());
        if changed {
            if let Err(e) = self.checkpoint.save(&session.id) {
                warn!("⚠️ 写入导入断点失败: {}", e);
            }
        }
        self.session = Some(session);
    }

    /// 上传步骤：创建服务端会话并进入下一步
    pub async fn start_session(
        &mut self,
        file_name: &str,
        file_path: Option<String>,
        data: ParsedPaperData,
    ) -> AppResult<&ImportSession> {
        if self.state.current() != WizardStep::Upload {
            self.state.go_to(WizardStep::Upload)?;
        }

        let new_session = NewImportSession {
            file_name: file_name.to_string(),
            file_path,
            parsed_data: data,
            status: ImportStatus::Processing,
        };

        let session = match self.repo.create(&new_session).await {
            Ok(session) => session,
            Err(e) => {
                self.state.fail(WizardStep::Upload, e.to_string());
                return Err(e);
            }
        };

        info!("✓ 已创建导入会话: {}", session.id);
        self.set_session(session);
        self.state.advance(WizardStep::Upload)?;

        self.session
            .as_ref()
            .ok_or_else(|| BusinessError::NoActiveSession.into())
    }

    /// 把内存中的试卷数据保存到服务端
    pub async fn save_progress(&mut self) -> AppResult<()> {
        let session = self.session.as_ref().ok_or(BusinessError::NoActiveSession)?;
        let updated = self
            .repo
            .update_data(&session.id, &session.parsed_data, ImportStatus::Processing)
            .await?;
        self.set_session(updated);
        Ok(())
    }

    /// 试卷记录创建后立即写回会话，恢复时据此跳过重复创建
    pub async fn record_paper(&mut self, paper_id: &str) -> AppResult<()> {
        let session_id = self.session_id().ok_or(BusinessError::NoActiveSession)?.to_string();
        let updated = self.repo.attach_paper(&session_id, paper_id).await?;
        self.set_session(updated);
        Ok(())
    }

    /// 放弃当前会话：服务端标记失败，清除断点
    pub async fn abandon(&mut self) {
        if let Some(session) = &self.session {
            if let Err(e) = self
                .repo
                .update_data(&session.id, &session.parsed_data, ImportStatus::Failed)
                .await
            {
                warn!("⚠️ 会话 {} 标记失败时出错: {}", session.id, e);
            }
            info!("🗑️ 已放弃导入会话: {}", session.id);
        }
        self.discard_checkpoint();
        self.reset();
    }

    /// 完成当前步骤并前进
    pub fn advance(&mut self, step: WizardStep) -> AppResult<()> {
        self.state.advance(step)?;
        debug!("步骤 {} 完成，当前步骤: {}", step, self.state.current());
        Ok(())
    }

    /// 回退到已完成的步骤
    pub fn rewind(&mut self, step: WizardStep) -> AppResult<()> {
        self.go_to(step)
    }

    /// 步骤条点击
    pub fn go_to(&mut self, step: WizardStep) -> AppResult<()> {
        let leaving_questions =
            self.state.current() == WizardStep::Questions && step != WizardStep::Questions;

        if let Err(e) = self.state.go_to(step) {
            warn!("⚠️ {}", e);
            return Err(e);
        }

        if leaving_questions && !self.attachments.is_empty() {
            debug!("离开题目审核步骤，丢弃 {} 个暂存附件", self.attachments.total());
            self.attachments.clear();
        }
        Ok(())
    }

    /// 记录步骤失败
    pub fn fail(&mut self, step: WizardStep, message: impl Into<String>) {
        let message = message.into();
        warn!("⚠️ 步骤 {} 失败: {}", step, message);
        self.state.fail(step, message);
    }

    /// 最后一步完成：标记服务端会话完成并清除本地断点
    pub async fn complete(&mut self, paper_id: &str) -> AppResult<CompletedImport> {
        if !self.state.is_completed(WizardStep::Questions) {
            return Err(BusinessError::StepLocked {
                step: WizardStep::Questions.id().to_string(),
            }
            .into());
        }
        let session_id = self
            .session_id()
            .ok_or(BusinessError::NoActiveSession)?
            .to_string();

        // 试卷已写入，远端状态更新失败也不再保留断点
        if let Err(e) = self.repo.mark_completed(&session_id, paper_id).await {
            warn!("⚠️ 会话 {} 标记完成失败: {}", session_id, e);
        }
        self.discard_checkpoint();
        self.reset();

        info!("🎉 导入完成: 会话 {} → 试卷 {}", session_id, paper_id);
        Ok(CompletedImport {
            session_id,
            paper_id: paper_id.to_string(),
        })
    }

    /// 放弃当前会话，回到初始状态（不动断点）
    pub fn reset(&mut self) {
        self.state = WizardState::new();
        self.session = None;
        self.attachments.clear();
    }

    fn discard_checkpoint(&self) {
        if let Err(e) = self.checkpoint.clear() {
            warn!("⚠️ 清除导入断点失败: {}", e);
        }
    }
}
