use std::process::ExitCode;

use dotenvy::dotenv;
use tracing::{error, info};

fn main() -> ExitCode {
    // 提前加载 .env，使得 RUST_LOG 等环境变量生效
    dotenv().ok();

    let rt = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("failed to build tokio runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    let pid = std::process::id();
    let version = env!("CARGO_PKG_VERSION");

    match rt.block_on(server::run()) {
        Ok(()) => {
            info!(event = "stop", pid, version, "api service stopped normally");
            ExitCode::SUCCESS
        }
        Err(e) => {
            // 日志可能尚未初始化（例如配置加载失败），stderr 兜底
            error!(event = "run_failed", error = %e, "server::run returned error");
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
