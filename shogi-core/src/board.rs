//! 棋盘与持驹

use serde::{Deserialize, Serialize};

use crate::constants::{BOARD_SIZE, HAND_KINDS, SQUARE_COUNT};
use crate::piece::{Piece, PieceType, Position, Side};

/// 棋盘
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Board {
    /// 9x9 棋盘，索引为 row * 9 + col，使用 Vec 以支持 serde
    squares: Vec<Option<Piece>>,
}

impl Board {
    /// 创建空棋盘
    pub fn empty() -> Self {
        Self {
            squares: vec![None; SQUARE_COUNT],
        }
    }

    /// 创建平手初始棋盘
    pub fn initial() -> Self {
        let mut board = Self::empty();
        let back_rank = [
            PieceType::Lance,
            PieceType::Knight,
            PieceType::Silver,
            PieceType::Gold,
            PieceType::King,
            PieceType::Gold,
            PieceType::Silver,
            PieceType::Knight,
            PieceType::Lance,
        ];

        for (col, piece_type) in back_rank.iter().enumerate() {
            let col = col as u8;
            // 后手（上方，第 0 行）
            board.set(Position::new_unchecked(0, col), Some(Piece::new(*piece_type, Side::Gote)));
            // 先手（下方，第 8 行）
            board.set(Position::new_unchecked(8, col), Some(Piece::new(*piece_type, Side::Sente)));
            // 步兵
            board.set(Position::new_unchecked(2, col), Some(Piece::new(PieceType::Pawn, Side::Gote)));
            board.set(Position::new_unchecked(6, col), Some(Piece::new(PieceType::Pawn, Side::Sente)));
        }

        // 后手：飞车在 8 筋，角行在 2 筋
        board.set(Position::new_unchecked(1, 1), Some(Piece::new(PieceType::Rook, Side::Gote)));
        board.set(Position::new_unchecked(1, 7), Some(Piece::new(PieceType::Bishop, Side::Gote)));
        // 先手：角行在 8 筋，飞车在 2 筋
        board.set(Position::new_unchecked(7, 1), Some(Piece::new(PieceType::Bishop, Side::Sente)));
        board.set(Position::new_unchecked(7, 7), Some(Piece::new(PieceType::Rook, Side::Sente)));

        board
    }

    /// 获取指定位置的棋子
    pub fn get(&self, pos: Position) -> Option<Piece> {
        if pos.is_valid() {
            self.squares[pos.to_index()]
        } else {
            None
        }
    }

    /// 设置指定位置的棋子
    pub fn set(&mut self, pos: Position, piece: Option<Piece>) {
        if pos.is_valid() {
            self.squares[pos.to_index()] = piece;
        }
    }

    /// 移动棋子（不检查规则），返回被吃的棋子
    pub fn move_piece(&mut self, from: Position, to: Position) -> Option<Piece> {
        let piece = self.get(from);
        let captured = self.get(to);
        self.set(from, None);
        self.set(to, piece);
        captured
    }

    /// 查找指定方的玉将位置
    pub fn find_king(&self, side: Side) -> Option<Position> {
        self.squares.iter().enumerate().find_map(|(index, square)| match square {
            Some(piece) if piece.piece_type == PieceType::King && piece.side == side => {
                Position::from_index(index)
            }
            _ => None,
        })
    }

    /// 获取指定方的所有棋子位置
    pub fn pieces(&self, side: Side) -> Vec<(Position, Piece)> {
        self.all_pieces()
            .into_iter()
            .filter(|(_, piece)| piece.side == side)
            .collect()
    }

    /// 获取所有棋子
    pub fn all_pieces(&self) -> Vec<(Position, Piece)> {
        let mut result = Vec::new();
        for (index, square) in self.squares.iter().enumerate() {
            if let (Some(piece), Some(pos)) = (square, Position::from_index(index)) {
                result.push((pos, *piece));
            }
        }
        result
    }

    /// 检查某一列是否已有该方未升变的步兵（二步判定）
    pub fn has_unpromoted_pawn_on_file(&self, side: Side, col: u8) -> bool {
        (0..BOARD_SIZE as u8).any(|row| {
            self.get(Position::new_unchecked(row, col))
                == Some(Piece::new(PieceType::Pawn, side))
        })
    }

    /// 上下翻转并交换双方棋子
    pub fn flipped(&self) -> Board {
        let mut board = Board::empty();
        for (pos, piece) in self.all_pieces() {
            board.set(pos.flipped(), Some(Piece::new(piece.piece_type, piece.side.opponent())));
        }
        board
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::initial()
    }
}

/// 单方持驹
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Hand {
    /// 与 `PieceType::HAND_TYPES` 顺序一致的数量
    counts: [u8; HAND_KINDS],
}

impl Hand {
    /// 获取某种棋子的数量
    pub fn count(&self, piece_type: PieceType) -> u8 {
        piece_type
            .hand_index()
            .map(|i| self.counts[i])
            .unwrap_or(0)
    }

    /// 是否没有任何持驹
    pub fn is_empty(&self) -> bool {
        self.counts.iter().all(|&c| c == 0)
    }

    /// 数量非零的持驹
    pub fn iter(&self) -> impl Iterator<Item = (PieceType, u8)> + '_ {
        PieceType::HAND_TYPES
            .iter()
            .zip(self.counts.iter())
            .filter(|(_, count)| **count > 0)
            .map(|(pt, &count)| (*pt, count))
    }

    fn add(&mut self, piece_type: PieceType) {
        if let Some(i) = piece_type.unpromote().hand_index() {
            self.counts[i] = self.counts[i].saturating_add(1);
        }
    }

    fn remove(&mut self, piece_type: PieceType) -> bool {
        match piece_type.hand_index() {
            Some(i) if self.counts[i] > 0 => {
                self.counts[i] -= 1;
                true
            }
            _ => false,
        }
    }
}

/// 双方持驹
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct HandPieces {
    sente: Hand,
    gote: Hand,
}

impl HandPieces {
    /// 空持驹
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取某方的持驹
    pub fn hand(&self, side: Side) -> &Hand {
        match side {
            Side::Sente => &self.sente,
            Side::Gote => &self.gote,
        }
    }

    fn hand_mut(&mut self, side: Side) -> &mut Hand {
        match side {
            Side::Sente => &mut self.sente,
            Side::Gote => &mut self.gote,
        }
    }

    /// 获取某方某种持驹的数量
    pub fn get(&self, side: Side, piece_type: PieceType) -> u8 {
        self.hand(side).count(piece_type)
    }

    /// 加入一枚持驹（成驹先还原，玉将忽略）
    pub fn add(&mut self, side: Side, piece_type: PieceType) {
        self.hand_mut(side).add(piece_type);
    }

    /// 取出一枚持驹，数量为 0 时返回 false 且不做修改
    pub fn remove(&mut self, side: Side, piece_type: PieceType) -> bool {
        self.hand_mut(side).remove(piece_type)
    }

    /// 某方数量非零的持驹
    pub fn iter(&self, side: Side) -> impl Iterator<Item = (PieceType, u8)> + '_ {
        self.hand(side).iter()
    }

    /// 交换双方持驹
    pub fn flipped(&self) -> HandPieces {
        HandPieces {
            sente: self.gote,
            gote: self.sente,
        }
    }
}
