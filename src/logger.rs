//! 日志初始化
//!
//! 默认 info 级别，可通过 RUST_LOG 覆盖

use tracing_subscriber::EnvFilter;

/// 初始化全局日志
pub fn init() {
    init_with_verbose(false);
}

/// 初始化全局日志，verbose 时默认使用 debug 级别
pub fn init_with_verbose(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // 重复初始化（例如测试中）时忽略错误
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
