//! 后台搜索线程
//!
//! 搜索在 tokio 阻塞线程池中执行，同一时间只运行一个搜索。
//! 取消请求不需要回复，只是设置共享的取消标记。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use shogi_core::GameState;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::search::{AiEngine, SearchResult, SearchSettings};

/// 搜索请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    pub id: u64,
    pub state: GameState,
    pub settings: SearchSettings,
}

/// 搜索回复
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub id: u64,
    pub result: SearchResult,
}

/// 发给搜索线程的命令
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkerCommand {
    Search(SearchRequest),
    Cancel,
}

/// 搜索线程错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkerError {
    #[error("Search worker has stopped")]
    Closed,
}

struct Job {
    request: SearchRequest,
    reply: oneshot::Sender<SearchResponse>,
}

/// 后台搜索线程
pub struct SearchWorker {
    jobs: mpsc::UnboundedSender<Job>,
    cancel: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl SearchWorker {
    /// 启动搜索线程（需要在 tokio 运行时中调用）
    pub fn spawn() -> Self {
        let (jobs, mut rx) = mpsc::unbounded_channel::<Job>();
        let cancel = Arc::new(AtomicBool::new(false));
        let flag = cancel.clone();

        let handle = tokio::spawn(async move {
            while let Some(Job { request, reply }) = rx.recv().await {
                let id = request.id;
                let flag = flag.clone();
                debug!(id, "Search request received");

                let outcome = tokio::task::spawn_blocking(move || {
                    AiEngine::new(request.settings).search_with_cancel(&request.state, flag)
                })
                .await;

                match outcome {
                    Ok(result) => {
                        if reply.send(SearchResponse { id, result }).is_err() {
                            debug!(id, "Requester gone, search response dropped");
                        }
                    }
                    Err(e) => warn!(id, error = %e, "Search task failed"),
                }
            }
            debug!("Search worker stopped");
        });

        Self {
            jobs,
            cancel,
            handle,
        }
    }

    /// 提交搜索请求
    pub fn submit(
        &self,
        request: SearchRequest,
    ) -> Result<oneshot::Receiver<SearchResponse>, WorkerError> {
        let (reply, receiver) = oneshot::channel();
        self.jobs
            .send(Job { request, reply })
            .map_err(|_| WorkerError::Closed)?;
        Ok(receiver)
    }

    /// 中止正在进行的搜索（搜索会返回目前为止的最佳走法）
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    /// 处理一条命令，搜索命令返回回复通道
    pub fn send(
        &self,
        command: WorkerCommand,
    ) -> Result<Option<oneshot::Receiver<SearchResponse>>, WorkerError> {
        match command {
            WorkerCommand::Search(request) => self.submit(request).map(Some),
            WorkerCommand::Cancel => {
                self.cancel();
                Ok(None)
            }
        }
    }

    /// 停止接收新请求，等待已排队的搜索完成
    pub async fn shutdown(self) {
        drop(self.jobs);
        if let Err(e) = self.handle.await {
            warn!(error = %e, "Search worker exited abnormally");
        }
    }
}
