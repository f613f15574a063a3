//! 试卷导入向导
//!
//! 四个固定步骤：上传 → 元信息 → 结构 → 题目审核。
//! 只能向前推进到相邻步骤，可以回退到任何已完成的步骤；
//! 进行中的会话ID写入本地断点，重启后尝试恢复。

pub mod attachments;
pub mod checkpoint;
pub mod controller;
pub mod step;

pub use attachments::StagedAttachments;
pub use checkpoint::{FileCheckpoint, MemoryCheckpoint, SessionCheckpoint, SESSION_KEY};
pub use controller::{CompletedImport, WizardController, WizardState};
pub use step::{StepStatus, WizardStep, STEP_ORDER};
