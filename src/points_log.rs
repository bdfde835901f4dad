//! 积分日志
//!
//! 所有 worker 通过 channel 把积分记录交给唯一的写入任务，
//! 每条记录以一次 `write_all` 整行追加，避免多任务并发写时行被截断或交错。

use std::path::{Path, PathBuf};

use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::mesh::model::responses::PointsRecord;

/// channel 容量
const CHANNEL_CAPACITY: usize = 256;

/// 默认积分日志文件
pub const DEFAULT_POINTS_LOG: &str = "account_points.txt";

/// worker 持有的发送端
#[derive(Debug, Clone)]
pub struct PointsSink {
    tx: mpsc::Sender<PointsRecord>,
}

impl PointsSink {
    /// 提交一条记录，写入任务已退出时只记日志
    pub async fn submit(&self, record: PointsRecord) {
        if self.tx.send(record).await.is_err() {
            tracing::warn!("积分日志写入任务已关闭，丢弃记录");
        }
    }
}

/// 创建发送端与接收端
pub fn channel(capacity: usize) -> (PointsSink, mpsc::Receiver<PointsRecord>) {
    let (tx, rx) = mpsc::channel(capacity);
    (PointsSink { tx }, rx)
}

/// 启动写入任务
///
/// 所有 [`PointsSink`] 被 drop 后，任务写完剩余记录并退出
pub fn spawn_writer(path: impl Into<PathBuf>) -> (PointsSink, JoinHandle<()>) {
    let (sink, rx) = channel(CHANNEL_CAPACITY);
    let path = path.into();
    let handle = tokio::spawn(run_writer(path, rx));
    (sink, handle)
}

async fn run_writer(path: PathBuf, mut rx: mpsc::Receiver<PointsRecord>) {
    while let Some(record) = rx.recv().await {
        if let Err(e) = append_line(&path, &record.to_log_line()).await {
            tracing::error!("写入积分日志失败 {}: {}", path.display(), e);
        }
    }
    tracing::debug!("积分日志写入任务退出");
}

// 每次重新打开，外部轮转或删除文件后可以继续写
async fn append_line(path: &Path, line: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    file.write_all(line.as_bytes()).await?;
    file.flush().await
}
