use serde::{Deserialize, Serialize};
use std::fmt;

/// 向导步骤
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WizardStep {
    Upload,
    Metadata,
    Structure,
    Questions,
}

/// 固定的步骤顺序
pub const STEP_ORDER: [WizardStep; 4] = [
    WizardStep::Upload,
    WizardStep::Metadata,
    WizardStep::Structure,
    WizardStep::Questions,
];

impl WizardStep {
    pub fn id(self) -> &'static str {
        match self {
            WizardStep::Upload => "upload",
            WizardStep::Metadata => "metadata",
            WizardStep::Structure => "structure",
            WizardStep::Questions => "questions",
        }
    }

    /// 步骤标题
    pub fn title(self) -> &'static str {
        match self {
            WizardStep::Upload => "上传试卷",
            WizardStep::Metadata => "试卷信息",
            WizardStep::Structure => "试卷结构",
            WizardStep::Questions => "题目审核",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        STEP_ORDER.iter().copied().find(|s| s.id() == id)
    }

    pub fn index(self) -> usize {
        STEP_ORDER.iter().position(|s| *s == self).unwrap_or(0)
    }

    /// 下一个步骤，最后一步返回 None
    pub fn next(self) -> Option<Self> {
        STEP_ORDER.get(self.index() + 1).copied()
    }

    pub fn is_last(self) -> bool {
        self.next().is_none()
    }

    /// 之前的所有步骤
    pub fn predecessors(self) -> &'static [WizardStep] {
        &STEP_ORDER[..self.index()]
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// 步骤状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    InProgress,
    Completed,
    Error,
}
