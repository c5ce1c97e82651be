//! 将棋 AI 引擎
//!
//! 包含:
//! - 棋局评估函数
//! - Minimax + Alpha-Beta 搜索
//! - 迭代加深与时间/取消控制
//! - 局面分析与走法评级
//! - 引擎配置
//! - 后台搜索线程

mod analysis;
mod config;
mod evaluate;
mod search;
mod worker;

pub use analysis::{
    classify_move, Analyzer, CandidateMove, MoveQuality, PositionAnalysis, QualityThresholds,
};
pub use config::EngineConfig;
pub use evaluate::Evaluator;
pub use search::{
    search, AiEngine, Difficulty, SearchContext, SearchResult, SearchSettings, MATE_SCORE,
};
pub use worker::{SearchRequest, SearchResponse, SearchWorker, WorkerCommand, WorkerError};
