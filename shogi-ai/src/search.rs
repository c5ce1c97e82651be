//! 搜索引擎
//!
//! 实现 Minimax + Alpha-Beta 剪枝 + 迭代加深

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use shogi_core::{GameState, Move, Side};
use tracing::{debug, info, warn};

use crate::evaluate::Evaluator;

/// 将死分值（按层数递减，越快的将死分值越高）
pub const MATE_SCORE: i32 = 100_000;

const INFINITY: i32 = 1_000_000;

/// 随机选择时允许的分差（乘以 randomness）
const RANDOM_WINDOW: f64 = 300.0;

/// AI 难度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Easy,
    Medium,
    Hard,
}

/// 搜索参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSettings {
    pub difficulty: Difficulty,
    pub max_depth: u8,
    pub time_limit_ms: u64,
    /// 0.0 ~ 1.0，越大越随机
    pub randomness: f64,
    /// 分析时返回的候选走法数量（含最佳走法）
    pub multi_pv: usize,
    /// 随机数种子，设置后结果可复现
    pub seed: Option<u64>,
}

impl SearchSettings {
    pub fn from_difficulty(difficulty: Difficulty) -> Self {
        let (max_depth, time_limit_ms, randomness) = match difficulty {
            Difficulty::Beginner => (1, 300, 0.5),
            Difficulty::Easy => (2, 1000, 0.3),
            Difficulty::Medium => (3, 3000, 0.1),
            Difficulty::Hard => (4, 5000, 0.0),
        };
        Self {
            difficulty,
            max_depth,
            time_limit_ms,
            randomness,
            multi_pv: 1,
            seed: None,
        }
    }
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self::from_difficulty(Difficulty::Medium)
    }
}

/// 单次搜索的上下文（取消标记、计时、节点数）
pub struct SearchContext {
    cancel: Arc<AtomicBool>,
    started: Instant,
    budget: Duration,
    nodes: u64,
}

impl SearchContext {
    pub fn new(budget: Duration, cancel: Arc<AtomicBool>) -> Self {
        Self {
            cancel,
            started: Instant::now(),
            budget,
            nodes: 0,
        }
    }

    /// 是否已取消或超时
    pub fn should_stop(&self) -> bool {
        self.cancel.load(Ordering::Relaxed) || self.started.elapsed() >= self.budget
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn nodes(&self) -> u64 {
        self.nodes
    }
}

/// 搜索结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// 分值（先手视角）
    pub score: i32,
    /// 最佳走法（无合法走法时为空）
    pub best_move: Option<Move>,
    /// 完成的搜索深度
    pub depth: u8,
    /// 搜索的节点数
    pub nodes_evaluated: u64,
}

/// AI 引擎
pub struct AiEngine {
    settings: SearchSettings,
    cancel: Arc<AtomicBool>,
}

impl AiEngine {
    /// 创建新的 AI 引擎
    pub fn new(settings: SearchSettings) -> Self {
        Self {
            settings,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// 从难度创建
    pub fn from_difficulty(difficulty: Difficulty) -> Self {
        Self::new(SearchSettings::from_difficulty(difficulty))
    }

    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    /// 取消标记，可以在其他线程设置以中止搜索
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        self.cancel.clone()
    }

    /// 搜索最佳走法
    pub fn search(&self, state: &GameState) -> SearchResult {
        self.search_with_cancel(state, self.cancel.clone())
    }

    /// 使用外部取消标记搜索，标记在开始时被重置
    pub fn search_with_cancel(&self, state: &GameState, cancel: Arc<AtomicBool>) -> SearchResult {
        cancel.store(false, Ordering::Relaxed);
        let settings = &self.settings;
        info!(
            difficulty = ?settings.difficulty,
            max_depth = settings.max_depth,
            time_limit_ms = settings.time_limit_ms,
            "Search started"
        );

        let mut rng = match settings.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        let mut ctx = SearchContext::new(Duration::from_millis(settings.time_limit_ms), cancel);

        // 搜索时不需要历史记录
        let root = GameState::from_parts(state.board.clone(), state.hands, state.current_player);
        let static_score = Evaluator::evaluate(&root);

        let mut moves = root.legal_moves();
        if moves.is_empty() {
            warn!(side = ?root.current_player, "No legal moves, nothing to search");
            return SearchResult {
                score: static_score,
                best_move: None,
                depth: 0,
                nodes_evaluated: 0,
            };
        }

        // 随机走法
        if settings.randomness > 0.0 && rng.gen::<f64>() < settings.randomness {
            if let Some(mv) = moves.choose(&mut rng) {
                debug!(%mv, "Random move selected before search");
                return SearchResult {
                    score: static_score,
                    best_move: Some(*mv),
                    depth: 0,
                    nodes_evaluated: 0,
                };
            }
        }

        order_moves(&mut moves);
        let maximizing = root.current_player == Side::Sente;

        let mut best_move = moves[0];
        let mut best_score = static_score;
        let mut completed_depth = 0;
        let mut root_scores: Vec<(Move, i32)> = Vec::new();

        // 迭代加深搜索
        for depth in 1..=settings.max_depth {
            if ctx.should_stop() {
                break;
            }

            let mut alpha = -INFINITY;
            let mut beta = INFINITY;
            let mut iteration_best: Option<(Move, i32)> = None;
            let mut scores = Vec::with_capacity(moves.len());
            let mut aborted = false;

            for mv in &moves {
                let child = root.apply_legal_move(mv);
                let score = alpha_beta(&child, depth - 1, 1, alpha, beta, &mut ctx);
                if ctx.should_stop() {
                    aborted = true;
                    break;
                }
                scores.push((*mv, score));

                let improved = match iteration_best {
                    None => true,
                    Some((_, best)) if maximizing => score > best,
                    Some((_, best)) => score < best,
                };
                if improved {
                    iteration_best = Some((*mv, score));
                }

                // 有随机性时需要每个根节点走法的准确分值，不收窄窗口
                if settings.randomness <= 0.0 {
                    if maximizing {
                        alpha = alpha.max(score);
                    } else {
                        beta = beta.min(score);
                    }
                }
            }

            if aborted {
                // 第一层都没搜完时，用已经搜过的走法
                if completed_depth == 0 {
                    if let Some((mv, score)) = iteration_best {
                        best_move = mv;
                        best_score = score;
                    }
                }
                debug!(depth, "Search iteration aborted");
                break;
            }

            if let Some((mv, score)) = iteration_best {
                best_move = mv;
                best_score = score;
            }
            completed_depth = depth;
            root_scores = scores;
            debug!(depth, score = best_score, best = %best_move, nodes = ctx.nodes, "Search iteration finished");

            // 下一轮先搜索当前最佳走法
            if let Some(index) = moves.iter().position(|mv| *mv == best_move) {
                let mv = moves.remove(index);
                moves.insert(0, mv);
            }

            if best_score.abs() >= MATE_SCORE - depth as i32 {
                break;
            }
        }

        if settings.randomness > 0.0 && !root_scores.is_empty() {
            let window = (settings.randomness * RANDOM_WINDOW) as i32;
            let candidates: Vec<(Move, i32)> = root_scores
                .into_iter()
                .filter(|(_, score)| {
                    if maximizing {
                        *score >= best_score - window
                    } else {
                        *score <= best_score + window
                    }
                })
                .collect();
            if let Some(&(mv, score)) = candidates.choose(&mut rng) {
                best_move = mv;
                best_score = score;
            }
        }

        info!(
            depth = completed_depth,
            score = best_score,
            nodes = ctx.nodes,
            elapsed_ms = ctx.elapsed().as_millis() as u64,
            best = %best_move,
            "Search finished"
        );

        SearchResult {
            score: best_score,
            best_move: Some(best_move),
            depth: completed_depth,
            nodes_evaluated: ctx.nodes,
        }
    }
}

/// 使用给定参数搜索
pub fn search(state: &GameState, settings: &SearchSettings) -> SearchResult {
    AiEngine::new(settings.clone()).search(state)
}

/// 吃子和升变优先，吃到的棋子越大越靠前
fn order_moves(moves: &mut [Move]) {
    moves.sort_by_key(|mv| {
        let capture = mv.captured.map(|piece| piece.value()).unwrap_or(0);
        let promotion = if mv.promote { 500 } else { 0 };
        -(capture + promotion)
    });
}

/// Alpha-Beta 搜索（先手取最大，后手取最小）
fn alpha_beta(
    state: &GameState,
    depth: u8,
    ply: i32,
    mut alpha: i32,
    mut beta: i32,
    ctx: &mut SearchContext,
) -> i32 {
    ctx.nodes += 1;

    if ctx.should_stop() {
        return Evaluator::evaluate(state);
    }

    let side = state.current_player;
    let mated_score = match side {
        Side::Sente => -(MATE_SCORE - ply),
        Side::Gote => MATE_SCORE - ply,
    };

    if depth == 0 {
        // 叶子节点只在被将军时确认是否将死
        if state.in_check() && state.legal_moves().is_empty() {
            return mated_score;
        }
        return Evaluator::evaluate(state);
    }

    let mut moves = state.legal_moves();
    if moves.is_empty() {
        return if state.in_check() { mated_score } else { 0 };
    }
    order_moves(&mut moves);

    if side == Side::Sente {
        let mut value = -INFINITY;
        for mv in &moves {
            let child = state.apply_legal_move(mv);
            value = value.max(alpha_beta(&child, depth - 1, ply + 1, alpha, beta, ctx));
            alpha = alpha.max(value);
            if alpha >= beta || ctx.should_stop() {
                break;
            }
        }
        value
    } else {
        let mut value = INFINITY;
        for mv in &moves {
            let child = state.apply_legal_move(mv);
            value = value.min(alpha_beta(&child, depth - 1, ply + 1, alpha, beta, ctx));
            beta = beta.min(value);
            if alpha >= beta || ctx.should_stop() {
                break;
            }
        }
        value
    }
}
