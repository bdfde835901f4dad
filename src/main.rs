mod http_client;
mod mesh;
mod model;
mod points_log;
mod pool;
mod worker;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mesh::provider::MeshProvider;
use model::arg::Args;
use model::config::Config;
use worker::{AccountWorker, WorkerExit};

type AppResult<T> = anyhow::Result<T>;

fn init_tracing(log_dir: &str) -> WorkerGuard {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::INFO.into());

    // 控制台 layer
    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_ansi(true)
        .with_target(false);

    // 文件 layer：按天滚动 + 异步写入
    let file_appender = tracing_appender::rolling::daily(log_dir, "blockmesh-rs.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
    let file_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_target(true)
        .with_writer(file_writer);

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    guard
}

#[tokio::main]
async fn main() -> ExitCode {
    // 解析命令行参数
    let args = Args::parse();

    // 加载配置（日志目录来自配置，因此先于日志初始化）
    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| Config::default_config_path().to_string());
    let mut ignored_env = Vec::new();
    let loaded = Config::load(&config_path)
        .with_context(|| format!("加载配置失败: {}", config_path))
        .map(|mut config| {
            ignored_env = config.override_from_env();
            config
        });

    let log_dir = loaded
        .as_ref()
        .map(|c| c.log_dir.clone())
        .unwrap_or_else(|_| "logs".to_string());
    // guard 在 main 返回时 drop，文件日志随之落盘
    let _log_guard = init_tracing(&log_dir);

    for message in &ignored_env {
        tracing::warn!("{}", message);
    }

    match run(args, loaded).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("启动/运行失败: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args, loaded: AppResult<Config>) -> AppResult<()> {
    let mut config = loaded?;

    // 命令行参数优先
    if let Some(policy) = args.policy {
        config.policy = policy;
    }
    if let Some(path) = args.points_log {
        config.points_log = Some(path);
    }
    config.validate().context("配置校验失败")?;

    let proxies = config.proxy_configs();
    let assignments = pool::assign(&config.data.auth, &proxies, config.policy);
    tracing::info!(
        "已加载 {} 个账号、{} 个代理，分配策略 {}，共 {} 个 worker",
        config.data.auth.len(),
        proxies.len(),
        config.policy,
        assignments.len()
    );

    let cancel = CancellationToken::new();

    // 积分日志写入任务
    let (sink, writer) = match &config.points_log {
        Some(path) => {
            tracing::info!("积分日志: {}", path);
            let (sink, handle) = points_log::spawn_writer(path);
            (Some(sink), Some(handle))
        }
        None => (None, None),
    };

    let api_settings = Arc::new(config.api_settings());
    let client_options = config.client_options();
    let worker_settings = config.worker_settings();

    let mut workers = JoinSet::new();
    for assignment in assignments {
        let email = assignment.credential.email.clone();
        let routes = assignment
            .routes()
            .into_iter()
            .map(|proxy| MeshProvider::new(api_settings.clone(), proxy, &client_options))
            .collect::<AppResult<Vec<_>>>()
            .with_context(|| format!("创建 HTTP 客户端失败: {}", email))?;

        let worker = AccountWorker::new(
            assignment.credential,
            routes,
            worker_settings.clone(),
            sink.clone(),
            cancel.clone(),
        )?;
        workers.spawn(worker.run());
    }
    drop(sink);

    // Ctrl-C 触发关闭
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("收到关闭信号，等待 worker 退出");
                shutdown.cancel();
            }
            Err(e) => tracing::warn!("无法监听关闭信号: {}", e),
        }
    });

    while let Some(result) = workers.join_next().await {
        match result {
            Ok(WorkerExit::GaveUp) => tracing::warn!("有账号因登录失败已停止"),
            Ok(WorkerExit::Cancelled) => {}
            Err(e) => tracing::error!("worker 异常退出: {}", e),
        }
    }

    if let Some(handle) = writer {
        if let Err(e) = handle.await {
            tracing::error!("积分日志写入任务异常退出: {}", e);
        }
    }

    tracing::info!("已退出");
    Ok(())
}
