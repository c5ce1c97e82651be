//! AI 自我对弈
//!
//! 用法: `cargo run -p shogi-ai --example self_play [配置文件] [最大手数]`

use anyhow::{Context, Result};
use shogi_ai::{EngineConfig, SearchRequest, SearchWorker};
use shogi_core::{GameState, Sfen};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("shogi_ai=info".parse()?),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => EngineConfig::load(path),
        None => EngineConfig::default(),
    };
    let max_plies: usize = match args.next() {
        Some(n) => n.parse().context("最大手数必须是整数")?,
        None => 40,
    };
    let settings = config.search_settings();
    info!("自我对弈开始: {:?}", settings);

    let worker = SearchWorker::spawn();
    let mut state = GameState::new();

    for ply in 0..max_plies as u64 {
        let status = state.status();
        if status.is_over {
            info!("对局结束: {:?}", status);
            break;
        }

        let response = worker
            .submit(SearchRequest {
                id: ply,
                state: state.clone(),
                settings: settings.clone(),
            })?
            .await
            .context("搜索线程没有回复")?;

        let Some(mv) = response.result.best_move else {
            break;
        };
        println!(
            "{:>3}. {}  (score {}, depth {}, nodes {})",
            ply + 1,
            mv,
            response.result.score,
            response.result.depth,
            response.result.nodes_evaluated
        );
        state = state.apply_move(&mv)?;
    }

    println!("{}", Sfen::to_string(&state));
    worker.shutdown().await;
    Ok(())
}
