//! 千日手检测

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::board::{Board, HandPieces};
use crate::constants::{REPETITION_LIMIT, SQUARE_COUNT};
use crate::game::GameState;
use crate::piece::{PieceType, Position, Side};

/// 生成局面键
///
/// 依次写入 81 格、走子方和双方持驹（固定种类顺序），相同局面得到相同的键，
/// 不同局面的键一定不同。
pub fn position_key(board: &Board, hands: &HandPieces, side: Side) -> String {
    let mut key = String::with_capacity(128);

    for index in 0..SQUARE_COUNT {
        match Position::from_index(index).and_then(|pos| board.get(pos)) {
            Some(piece) => key.push_str(&piece.to_sfen()),
            None => key.push('.'),
        }
    }

    key.push(' ');
    key.push(side.to_sfen_char());

    for owner in [Side::Sente, Side::Gote] {
        key.push(' ');
        for piece_type in PieceType::HAND_TYPES {
            let count = hands.get(owner, piece_type);
            if count > 0 {
                key.push_str(&count.to_string());
                key.push_str(&piece_type.to_sfen(owner));
            }
        }
    }

    key
}

/// 单个局面的出现记录
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PositionRecord {
    /// 出现次数
    pub count: u32,
    /// 其中走子方处于被将军状态的次数
    pub check_count: u32,
}

/// 千日手判定结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RepetitionStatus {
    /// 是否已达到千日手
    pub is_repetition: bool,
    /// 该局面出现的次数
    pub count: u32,
    /// 是否为连续将军的千日手（将军方判负）
    pub is_perpetual_check: bool,
    /// 连续将军的一方
    pub perpetual_checker: Option<Side>,
}

/// 按出现顺序保存的一手记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct PlyEntry {
    key: String,
    side: Side,
    in_check: bool,
}

/// 局面历史
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PositionHistory {
    records: HashMap<String, PositionRecord>,
    sequence: Vec<PlyEntry>,
}

impl PositionHistory {
    /// 创建空历史
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一次局面出现，`side` 为该局面的走子方
    pub fn record(&mut self, key: String, side: Side, in_check: bool) {
        let record = self.records.entry(key.clone()).or_default();
        record.count += 1;
        if in_check {
            record.check_count += 1;
        }
        self.sequence.push(PlyEntry {
            key,
            side,
            in_check,
        });
    }

    /// 撤销一次局面记录（悔棋时使用）
    pub fn unrecord(&mut self, key: &str, in_check: bool) {
        if let Some(pos) = self.sequence.iter().rposition(|entry| entry.key == key) {
            self.sequence.remove(pos);
        }
        if let Some(record) = self.records.get_mut(key) {
            record.count = record.count.saturating_sub(1);
            if in_check {
                record.check_count = record.check_count.saturating_sub(1);
            }
            if record.count == 0 {
                self.records.remove(key);
            }
        }
    }

    /// 清空历史
    pub fn clear(&mut self) {
        self.records.clear();
        self.sequence.clear();
    }

    /// 获取局面的出现记录
    pub fn get(&self, key: &str) -> PositionRecord {
        self.records.get(key).copied().unwrap_or_default()
    }

    /// 不同局面的数量
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// 只读查询千日手状态
    pub fn status(&self, key: &str) -> RepetitionStatus {
        let record = self.get(key);
        let is_repetition = record.count >= REPETITION_LIMIT;
        let perpetual_checker = if is_repetition {
            self.perpetual_checker(key)
        } else {
            None
        };
        RepetitionStatus {
            is_repetition,
            count: record.count,
            is_perpetual_check: perpetual_checker.is_some(),
            perpetual_checker,
        }
    }

    /// 从该局面第一次出现起，若某一方每次轮到走子时都被将军，返回将军方
    fn perpetual_checker(&self, key: &str) -> Option<Side> {
        let first = self.sequence.iter().position(|entry| entry.key == key)?;
        let span = &self.sequence[first..];

        let always_checked = |side: Side| {
            let mut turns = span.iter().filter(|entry| entry.side == side).peekable();
            turns.peek().is_some() && turns.all(|entry| entry.in_check)
        };

        match (always_checked(Side::Sente), always_checked(Side::Gote)) {
            (true, false) => Some(Side::Gote),
            (false, true) => Some(Side::Sente),
            _ => None,
        }
    }
}

/// 记录当前局面并判定千日手
pub fn detect(state: &GameState, history: &mut PositionHistory, in_check: bool) -> RepetitionStatus {
    let key = position_key(&state.board, &state.hands, state.current_player);
    history.record(key.clone(), state.current_player, in_check);
    history.status(&key)
}
