//! 错误类型定义

use thiserror::Error;

/// 将棋规则错误
///
/// 每个变体对应一种可向用户展示的违规原因。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShogiError {
    /// 坐标越界
    #[error("Invalid position: ({row}, {col})")]
    OutOfBounds { row: u8, col: u8 },

    /// 起点没有棋子
    #[error("No piece at position ({row}, {col})")]
    NoPiece { row: u8, col: u8 },

    /// 不是你的回合 / 不是你的棋子
    #[error("Opponent's turn")]
    OpponentTurn,

    /// 目标格不在该棋子的走法范围内（路径被挡或走法不符）
    #[error("Piece cannot reach ({row}, {col})")]
    Unreachable { row: u8, col: u8 },

    /// 走法会让己方玉将被将
    #[error("Move would leave king in check")]
    KingInCheck,

    /// 手中没有该棋子
    #[error("No such piece in hand")]
    NotInHand,

    /// 打入目标格已有棋子
    #[error("Square ({row}, {col}) is occupied")]
    SquareOccupied { row: u8, col: u8 },

    /// 打入后无法再移动（步/香打在最底行，桂打在最底两行）
    #[error("Dropped piece would have no legal moves")]
    DeadDrop,

    /// 二步
    #[error("Double pawn")]
    DoublePawn,

    /// 打步诘
    #[error("Drop checkmate")]
    DropCheckmate,

    /// 不满足升变条件
    #[error("Promotion is not allowed")]
    PromotionNotAllowed,

    /// 必须升变
    #[error("Promotion is required")]
    PromotionRequired,

    /// 走法记录的棋子与棋盘不一致
    #[error("Move does not match the piece on the board")]
    PieceMismatch,

    /// 游戏已结束
    #[error("Game is already over")]
    GameOver,

    /// 无效的 SFEN 字符串
    #[error("Invalid SFEN string: {reason}")]
    InvalidSfen { reason: String },
}

/// 规则操作结果类型
pub type Result<T> = std::result::Result<T, ShogiError>;
