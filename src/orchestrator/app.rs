use crate::clients::BackendClient;
use crate::config::Config;
use crate::error::AppError;
use crate::models::list_paper_files;
use crate::orchestrator::paper_importer::{ImportOutcome, PaperImporter};
use crate::services::{Notice, WarnWriter};
use crate::utils::logging::{init_log_file, log_papers_loaded, log_startup, print_final_stats};
use crate::wizard::{FileCheckpoint, WizardController};
use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// 已导入文件移动到的子目录
const IMPORTED_DIR: &str = "imported";

/// 应用主结构
pub struct App {
    config: Config,
    client: BackendClient,
    controller: WizardController<BackendClient, FileCheckpoint>,
    warn_writer: WarnWriter,
}

/// 处理统计
#[derive(Debug, Default)]
struct ImportStats {
    success: usize,
    failed: usize,
    total: usize,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        init_log_file(&config.output_log_file)?;
        log_startup(&config.backend_url, &config.import_folder);

        let client = BackendClient::new(&config)?;
        if client.session().is_none() {
            warn!("⚠️ 未配置 EDU_ACCESS_TOKEN，写入操作将被拒绝");
        }

        let controller = WizardController::new(client.clone(), FileCheckpoint::new(&config.checkpoint_file));
        let warn_writer = WarnWriter::with_path(config.warn_file.clone());

        Ok(Self {
            config,
            client,
            controller,
            warn_writer,
        })
    }

    /// 运行应用主逻辑
    pub async fn run(mut self) -> Result<()> {
        let mut stats = ImportStats::default();
        let importer = PaperImporter::new(&self.client, &self.warn_writer);

        // 先把上次中断的会话走完（数据有误时从文件重新导入）
        let mut resumed_file: Option<PathBuf> = None;
        if self.controller.initialize().await {
            let file = self
                .controller
                .session()
                .map(|s| PathBuf::from(&s.file_name));
            stats.total += 1;

            match importer.resume(&mut self.controller).await {
                Ok(outcome) => {
                    stats.success += 1;
                    report(&outcome);
                    if let Some(file) = &file {
                        archive(file).await;
                    }
                }
                Err(e) => {
                    stats.failed += 1;
                    if !handle_failure("继续导入会话", &e) {
                        print_final_stats(stats.success, stats.failed, stats.total, &self.config.output_log_file);
                        return Ok(());
                    }
                }
            }
            resumed_file = file;
        }

        info!("\n📁 正在扫描待导入的试卷...");
        let files: Vec<PathBuf> = list_paper_files(&self.config.import_folder)
            .await?
            .into_iter()
            .filter(|f| resumed_file.as_deref() != Some(f.as_path()))
            .collect();

        if files.is_empty() && stats.total == 0 {
            warn!("⚠️ 没有找到待导入的试卷文件，程序结束");
            return Ok(());
        }
        log_papers_loaded(files.len());
        stats.total += files.len();

        for (index, file) in files.iter().enumerate() {
            info!("\n{}", "─".repeat(60));
            info!("📄 [{}/{}] {}", index + 1, files.len(), file.display());

            // 上一个试卷失败时会话仍在，换文件前丢弃
            self.controller.reset();

            match importer.import_file(&mut self.controller, file).await {
                Ok(outcome) => {
                    stats.success += 1;
                    report(&outcome);
                    archive(file).await;
                }
                Err(e) => {
                    stats.failed += 1;
                    if !handle_failure("导入试卷", &e) {
                        break;
                    }
                }
            }
        }

        print_final_stats(stats.success, stats.failed, stats.total, &self.config.output_log_file);
        Ok(())
    }
}

fn report(outcome: &ImportOutcome) {
    Notice::success(format!(
        "试卷 {} 导入完成: 写入 {} 题, 跳过 {} 题, 上传附件 {} 个",
        outcome.paper_id, outcome.imported, outcome.skipped, outcome.attachments_uploaded
    ))
    .emit();
}

/// 把错误转成提示输出，返回是否可以继续处理后面的试卷
fn handle_failure(action: &str, err: &anyhow::Error) -> bool {
    match err.downcast_ref::<AppError>() {
        Some(app_err) => {
            Notice::from_error(action, app_err).emit();
            if Notice::requires_sign_in(app_err) {
                error!("🔒 登录已失效，请更新 EDU_ACCESS_TOKEN 后重新运行");
                return false;
            }
        }
        None => error!("❌ {}失败: {:#}", action, err),
    }
    true
}

/// 导入成功的文件移动到 imported/ 子目录
async fn archive(file: &Path) {
    let Some(parent) = file.parent() else {
        return;
    };
    let Some(name) = file.file_name() else {
        return;
    };
    if !file.exists() {
        return;
    }

    let target_dir = parent.join(IMPORTED_DIR);
    if let Err(e) = tokio::fs::create_dir_all(&target_dir).await {
        warn!("⚠️ 无法创建目录 {}: {}", target_dir.display(), e);
        return;
    }
    let target = target_dir.join(name);
    match tokio::fs::rename(file, &target).await {
        Ok(()) => info!("📦 已移动到 {}", target.display()),
        Err(e) => warn!("⚠️ 移动文件失败 {}: {}", file.display(), e),
    }
}
