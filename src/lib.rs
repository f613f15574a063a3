//! # Edu Admin
//!
//! 教育管理后台的试卷导入工具：按向导步骤把本地试卷文件导入题库
//!
//! ## 架构设计
//!
//! ### ① 客户端层（Clients）
//! - `clients/` - 后端 HTTP 客户端（REST 表、对象存储、云函数）和登录会话
//!
//! ### ② 仓储层（Repositories）
//! - `repositories/` - 按数据集合划分的仓储 trait，后端客户端实现全部 trait
//! - 测试中用内存实现替换
//!
//! ### ③ 业务层（Wizard / Review / Services）
//! - `wizard/` - 导入向导：步骤状态机、本地断点、暂存附件
//! - `review/` - 题目校验汇总与统计
//! - `services/` - 用户管理、操作提示、warn.txt 写入
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/app` - 扫描导入目录，逐个试卷处理
//! - `orchestrator/paper_importer` - 单个试卷走完向导
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod logger;

pub mod models;
pub mod orchestrator;
pub mod repositories;
pub mod review;
pub mod services;
pub mod utils;
pub mod wizard;

// 重新导出常用类型
pub use clients::{AuthSession, BackendClient};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{ImportSession, ParsedPaperData, ReviewQuestion};
pub use orchestrator::{App, ImportOutcome, PaperImporter};
pub use review::{compute_statistics, summarize, QuestionStatistics, ValidationSummary};
pub use wizard::{WizardController, WizardStep};
