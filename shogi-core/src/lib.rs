//! 将棋规则库
//!
//! 包含:
//! - 棋子、棋盘、持驹等核心数据结构
//! - 棋子走法表与合法走法生成
//! - 规则验证（二步、打步诘、强制升变、打入限制）
//! - 千日手与连续将军检测
//! - 对局状态机（将死、无子可动、千日手、持将棋、认输）
//! - SFEN 局面格式

mod board;
mod constants;
mod error;
mod game;
pub mod movement;
mod moves;
mod piece;
pub mod repetition;
mod sfen;
mod validator;

pub use board::{Board, Hand, HandPieces};
pub use constants::*;
pub use error::{Result, ShogiError};
pub use game::{EndReason, GameState, GameStatus, ImpasseRule};
pub use movement::MovePattern;
pub use moves::Move;
pub use piece::{Piece, PieceType, Position, Side};
pub use repetition::{position_key, PositionHistory, PositionRecord, RepetitionStatus};
pub use sfen::{Sfen, INITIAL_SFEN};
pub use validator::MoveValidator;
