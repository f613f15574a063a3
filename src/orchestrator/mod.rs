//! 编排层
//!
//! ## 模块划分
//!
//! ### `app` - 应用入口
//! - 初始化日志、后端客户端、本地断点
//! - 优先恢复上次中断的导入会话
//! - 扫描导入目录，逐个试卷走完向导
//! - 输出全局统计信息
//!
//! ### `paper_importer` - 单个试卷导入
//! - 按向导步骤推进：上传 → 元信息 → 结构 → 题目审核
//! - 步骤失败时记录到向导并中止本试卷
//! - 严重问题题目写入 warn.txt，其余题目写入题库
//!
//! ## 层次关系
//!
//! ```text
//! app (处理目录中的所有试卷)
//!     ↓
//! paper_importer (处理单个试卷)
//!     ↓
//! wizard::WizardController + review (步骤状态 / 校验 / 统计)
//!     ↓
//! repositories (后端仓储接口)
//!     ↓
//! clients::BackendClient (HTTP)
//! ```

pub mod app;
pub mod paper_importer;

pub use app::App;
pub use paper_importer::{ImportOutcome, PaperImporter};
