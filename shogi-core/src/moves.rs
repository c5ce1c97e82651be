//! 走法定义

use serde::{Deserialize, Serialize};

use crate::piece::{Piece, PieceType, Position, Side};

/// 走法
///
/// `from` 为 `None` 表示打入，此时 `piece` 一定是未升变的棋子。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    /// 起始位置（打入时为空）
    pub from: Option<Position>,
    /// 目标位置
    pub to: Position,
    /// 走动（或打入）的棋子，记录走子前的形态
    pub piece: Piece,
    /// 是否升变
    pub promote: bool,
    /// 被吃的棋子（如果有）
    pub captured: Option<Piece>,
}

impl Move {
    /// 创建盘上走法
    pub fn new(from: Position, to: Position, piece: Piece) -> Self {
        Self {
            from: Some(from),
            to,
            piece,
            promote: false,
            captured: None,
        }
    }

    /// 创建打入走法
    pub fn drop(to: Position, piece_type: PieceType, side: Side) -> Self {
        Self {
            from: None,
            to,
            piece: Piece::new(piece_type, side),
            promote: false,
            captured: None,
        }
    }

    /// 设置升变标记
    pub fn with_promotion(mut self, promote: bool) -> Self {
        self.promote = promote;
        self
    }

    /// 设置被吃的棋子
    pub fn with_capture(mut self, captured: Option<Piece>) -> Self {
        self.captured = captured;
        self
    }

    /// 是否为打入
    pub fn is_drop(&self) -> bool {
        self.from.is_none()
    }

    /// 走子后落在目标格上的棋子
    pub fn placed_piece(&self) -> Piece {
        if self.promote {
            self.piece.promoted().unwrap_or(self.piece)
        } else {
            self.piece
        }
    }

    /// 走法方
    pub fn side(&self) -> Side {
        self.piece.side
    }
}

impl std::fmt::Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.from {
            Some(from) => {
                write!(f, "{} {} -> {}", self.piece.display_char(), from, self.to)?;
                if self.promote {
                    write!(f, " 成")?;
                }
                Ok(())
            }
            None => write!(f, "{} 打 {}", self.piece.display_char(), self.to),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drop_move() {
        let mv = Move::drop(Position::new_unchecked(4, 4), PieceType::Pawn, Side::Sente);
        assert!(mv.is_drop());
        assert!(!mv.promote);
        assert_eq!(mv.placed_piece(), Piece::new(PieceType::Pawn, Side::Sente));
    }

    #[test]
    fn test_promoted_placement() {
        let piece = Piece::new(PieceType::Silver, Side::Gote);
        let mv = Move::new(
            Position::new_unchecked(5, 3),
            Position::new_unchecked(6, 3),
            piece,
        )
        .with_promotion(true);
        assert_eq!(mv.placed_piece().piece_type, PieceType::PromotedSilver);
        assert_eq!(mv.side(), Side::Gote);
    }

    #[test]
    fn test_display() {
        let mv = Move::drop(Position::new_unchecked(4, 4), PieceType::Gold, Side::Sente);
        assert_eq!(mv.to_string(), "金 打 (4, 4)");
    }
}
