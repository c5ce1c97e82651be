//! 局面分析
//!
//! 在搜索之上提供候选走法列表、结果缓存和走法质量评级。

use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use shogi_core::{GameState, Move, Side};
use tracing::debug;

use crate::evaluate::Evaluator;
use crate::search::{search, SearchSettings, MATE_SCORE};

/// 候选走法应手检查占用的时间比例（相对搜索时间）
const REPLY_BUDGET_DIVISOR: u64 = 4;

/// 候选走法
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateMove {
    #[serde(rename = "move")]
    pub mv: Move,
    /// 分值（先手视角）
    pub score: i32,
}

/// 局面分析结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionAnalysis {
    /// 分值（先手视角）
    pub score: i32,
    /// 最佳走法
    pub best_move: Option<Move>,
    /// 其他候选走法，按对走子方由好到差排列
    pub alternative_moves: Vec<CandidateMove>,
    /// 完成的搜索深度
    pub depth: u8,
    /// 搜索的节点数（含候选走法）
    pub nodes_evaluated: u64,
}

/// 走法质量
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveQuality {
    /// 妙手
    Brilliant,
    /// 好棋
    Good,
    /// 普通
    Normal,
    /// 失误
    Mistake,
    /// 败着
    Blunder,
}

impl MoveQuality {
    /// 获取显示图标
    pub fn icon(&self) -> &'static str {
        match self {
            MoveQuality::Brilliant => "★",
            MoveQuality::Good => "○",
            MoveQuality::Normal => "·",
            MoveQuality::Mistake => "?",
            MoveQuality::Blunder => "✗",
        }
    }

    /// 获取中文名称
    pub fn display_name(&self) -> &'static str {
        match self {
            MoveQuality::Brilliant => "妙手",
            MoveQuality::Good => "好棋",
            MoveQuality::Normal => "普通",
            MoveQuality::Mistake => "失误",
            MoveQuality::Blunder => "败着",
        }
    }
}

/// 走法质量分界（实际分值减最佳分值，对走子方而言的下限）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityThresholds {
    pub brilliant: i32,
    pub good: i32,
    pub normal: i32,
    pub mistake: i32,
}

impl Default for QualityThresholds {
    fn default() -> Self {
        Self {
            brilliant: 100,
            good: -30,
            normal: -100,
            mistake: -300,
        }
    }
}

/// 根据实际走法与最佳走法的分差评级
pub fn classify_move(
    actual_score: i32,
    best_score: i32,
    mover: Side,
    thresholds: &QualityThresholds,
) -> MoveQuality {
    let delta = match mover {
        Side::Sente => actual_score - best_score,
        Side::Gote => best_score - actual_score,
    };

    if delta >= thresholds.brilliant {
        MoveQuality::Brilliant
    } else if delta >= thresholds.good {
        MoveQuality::Good
    } else if delta >= thresholds.normal {
        MoveQuality::Normal
    } else if delta >= thresholds.mistake {
        MoveQuality::Mistake
    } else {
        MoveQuality::Blunder
    }
}

fn reply_budget(time_limit_ms: u64) -> Duration {
    Duration::from_millis(time_limit_ms / REPLY_BUDGET_DIVISOR)
}

/// 按走子方的偏好排序（先手分高在前，后手分低在前）
fn sort_for(mover: Side, candidates: &mut [CandidateMove]) {
    candidates.sort_by_key(|candidate| match mover {
        Side::Sente => -candidate.score,
        Side::Gote => candidate.score,
    });
}

/// 对方走一步后的最佳静态分值，超时则直接返回当前局面的评估
fn reply_score(child: &GameState, deadline: Instant) -> (i32, u64) {
    let replies = child.legal_moves();
    if replies.is_empty() {
        let score = if child.in_check() {
            match child.current_player {
                Side::Gote => MATE_SCORE - 1,
                Side::Sente => -(MATE_SCORE - 1),
            }
        } else {
            0
        };
        return (score, 1);
    }

    let mut best: Option<i32> = None;
    let mut nodes = 0;
    for reply in &replies {
        if Instant::now() >= deadline {
            break;
        }
        let score = Evaluator::evaluate(&child.apply_legal_move(reply));
        nodes += 1;
        best = Some(match (best, child.current_player) {
            (None, _) => score,
            (Some(b), Side::Sente) => b.max(score),
            (Some(b), Side::Gote) => b.min(score),
        });
    }

    match best {
        Some(score) => (score, nodes),
        None => (Evaluator::evaluate(child), nodes + 1),
    }
}

/// 局面分析器（带缓存，不做淘汰）
#[derive(Debug, Default)]
pub struct Analyzer {
    cache: HashMap<String, PositionAnalysis>,
}

impl Analyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// 分析局面
    pub fn analyze(&mut self, state: &GameState, settings: &SearchSettings) -> PositionAnalysis {
        let settings = SearchSettings {
            randomness: 0.0,
            ..settings.clone()
        };
        let key = format!(
            "{}|{}",
            state.position_key(),
            serde_json::to_string(&settings).unwrap_or_default()
        );

        if let Some(cached) = self.cache.get(&key) {
            debug!("Analysis cache hit");
            return cached.clone();
        }

        let result = search(state, &settings);
        let mut nodes_evaluated = result.nodes_evaluated;
        let mut alternative_moves = Vec::new();

        if let (true, Some(best)) = (settings.multi_pv > 1, result.best_move) {
            let mover = state.current_player;
            let wanted = settings.multi_pv - 1;
            let deadline = Instant::now() + reply_budget(settings.time_limit_ms);

            // 先用静态评估粗排，只对前几名做一层应手检查
            let mut shortlist: Vec<CandidateMove> = state
                .legal_moves()
                .into_iter()
                .filter(|mv| *mv != best)
                .map(|mv| CandidateMove {
                    mv,
                    score: Evaluator::evaluate(&state.apply_legal_move(&mv)),
                })
                .collect();
            nodes_evaluated += shortlist.len() as u64;
            sort_for(mover, &mut shortlist);
            shortlist.truncate(wanted * 2);

            for candidate in &mut shortlist {
                if Instant::now() >= deadline {
                    break;
                }
                let child = state.apply_legal_move(&candidate.mv);
                let (score, nodes) = reply_score(&child, deadline);
                candidate.score = score;
                nodes_evaluated += nodes;
            }

            sort_for(mover, &mut shortlist);
            shortlist.truncate(wanted);
            alternative_moves = shortlist;
        }

        let analysis = PositionAnalysis {
            score: result.score,
            best_move: result.best_move,
            alternative_moves,
            depth: result.depth,
            nodes_evaluated,
        };
        self.cache.insert(key, analysis.clone());
        analysis
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }
}
