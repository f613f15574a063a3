//! 题目审核步骤中暂存的附件
//!
//! 文件先挂在题目ID下，提交时统一上传并回写到题目的附件列表

use crate::error::AppResult;
use crate::models::{FileBlob, ReviewQuestion};
use crate::repositories::{ObjectStore, MATERIALS_BUCKET};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// 暂存附件：题目ID → 待上传文件
#[derive(Debug, Default, Clone)]
pub struct StagedAttachments {
    pending: BTreeMap<String, Vec<FileBlob>>,
}

impl StagedAttachments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(&mut self, question_id: impl Into<String>, blob: FileBlob) {
        let question_id = question_id.into();
        debug!("暂存附件 {} → 题目 {}", blob.file_name, question_id);
        self.pending.entry(question_id).or_default().push(blob);
    }

    /// 撤销某题的一个暂存文件
    pub fn unstage(&mut self, question_id: &str, file_name: &str) -> bool {
        let Some(files) = self.pending.get_mut(question_id) else {
            return false;
        };
        let before = files.len();
        files.retain(|f| f.file_name != file_name);
        let removed = files.len() != before;
        if files.is_empty() {
            self.pending.remove(question_id);
        }
        removed
    }

    pub fn for_question(&self, question_id: &str) -> &[FileBlob] {
        self.pending
            .get(question_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn total(&self) -> usize {
        self.pending.values().map(|v| v.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// 上传所有暂存文件并写入对应题目的附件列表
    ///
    /// 上传失败时返回错误，已成功的文件不会重复上传
    pub async fn commit<S: ObjectStore>(
        &mut self,
        store: &S,
        session_id: &str,
        questions: &mut [ReviewQuestion],
    ) -> AppResult<usize> {
        let mut uploaded = 0;
        let question_ids: Vec<String> = self.pending.keys().cloned().collect();

        for question_id in question_ids {
            let Some(question) = questions.iter_mut().find(|q| q.id == question_id) else {
                warn!("⚠️ 暂存附件对应的题目不存在，已丢弃: {}", question_id);
                self.pending.remove(&question_id);
                continue;
            };

            while let Some(blob) = self
                .pending
                .get(&question_id)
                .and_then(|files| files.first())
                .cloned()
            {
                let path = attachment_path(session_id, &question_id, &blob);
                let url = store.put_object(MATERIALS_BUCKET, &path, &blob).await?;
                question.attachments.push(url);
                uploaded += 1;

                if let Some(files) = self.pending.get_mut(&question_id) {
                    files.remove(0);
                }
            }
            self.pending.remove(&question_id);
        }

        if uploaded > 0 {
            info!("✓ 已上传 {} 个题目附件", uploaded);
        }
        Ok(uploaded)
    }
}

fn attachment_path(session_id: &str, question_id: &str, blob: &FileBlob) -> String {
    let id = uuid::Uuid::new_v4();
    match blob.extension() {
        Some(ext) => format!("paper-imports/{}/{}/{}.{}", session_id, question_id, id, ext),
        None => format!("paper-imports/{}/{}/{}", session_id, question_id, id),
    }
}
