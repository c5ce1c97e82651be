//! 棋子走法表
//!
//! 每种棋子对应一个固定的走法模式：单步偏移集合，或者滑行方向加上额外单步。
//! 偏移量按先手方向书写，后手使用时行增量取反。

use crate::board::Board;
use crate::piece::{Piece, PieceType, Position, Side};

const KING_STEPS: &[(i8, i8)] = &[
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

const GOLD_STEPS: &[(i8, i8)] = &[(-1, -1), (-1, 0), (-1, 1), (0, -1), (0, 1), (1, 0)];

const SILVER_STEPS: &[(i8, i8)] = &[(-1, -1), (-1, 0), (-1, 1), (1, -1), (1, 1)];

const KNIGHT_STEPS: &[(i8, i8)] = &[(-2, -1), (-2, 1)];

const PAWN_STEPS: &[(i8, i8)] = &[(-1, 0)];

const ORTHOGONAL: &[(i8, i8)] = &[(-1, 0), (1, 0), (0, -1), (0, 1)];

const DIAGONAL: &[(i8, i8)] = &[(-1, -1), (-1, 1), (1, -1), (1, 1)];

const LANCE_RAYS: &[(i8, i8)] = &[(-1, 0)];

const NONE: &[(i8, i8)] = &[];

/// 走法模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovePattern {
    /// 单步偏移，每个只尝试一次
    pub steps: &'static [(i8, i8)],
    /// 滑行方向，一直走到边界或遇到棋子
    pub rays: &'static [(i8, i8)],
}

impl MovePattern {
    /// 获取棋子类型对应的走法模式
    pub fn of(piece_type: PieceType) -> MovePattern {
        let (steps, rays) = match piece_type {
            PieceType::King => (KING_STEPS, NONE),
            PieceType::Gold
            | PieceType::PromotedSilver
            | PieceType::PromotedKnight
            | PieceType::PromotedLance
            | PieceType::Tokin => (GOLD_STEPS, NONE),
            PieceType::Silver => (SILVER_STEPS, NONE),
            PieceType::Knight => (KNIGHT_STEPS, NONE),
            PieceType::Pawn => (PAWN_STEPS, NONE),
            PieceType::Lance => (NONE, LANCE_RAYS),
            PieceType::Rook => (NONE, ORTHOGONAL),
            PieceType::Bishop => (NONE, DIAGONAL),
            PieceType::Dragon => (DIAGONAL, ORTHOGONAL),
            PieceType::Horse => (ORTHOGONAL, DIAGONAL),
        };
        MovePattern { steps, rays }
    }
}

/// 按走棋方调整偏移方向
fn orient((drow, dcol): (i8, i8), side: Side) -> (i8, i8) {
    match side {
        Side::Sente => (drow, dcol),
        Side::Gote => (-drow, dcol),
    }
}

/// 获取棋子的伪合法目标格（不考虑王的安全）
pub fn destinations(board: &Board, from: Position, piece: Piece) -> Vec<Position> {
    let pattern = MovePattern::of(piece.piece_type);
    let mut result = Vec::with_capacity(16);

    for &offset in pattern.steps {
        let (drow, dcol) = orient(offset, piece.side);
        if let Some(to) = from.offset(drow, dcol) {
            match board.get(to) {
                Some(target) if target.side == piece.side => {}
                _ => result.push(to),
            }
        }
    }

    for &ray in pattern.rays {
        let (drow, dcol) = orient(ray, piece.side);
        let mut current = from;
        while let Some(to) = current.offset(drow, dcol) {
            match board.get(to) {
                None => result.push(to),
                Some(target) => {
                    if target.side != piece.side {
                        result.push(to);
                    }
                    break;
                }
            }
            current = to;
        }
    }

    result
}

/// 检查 `from` 处的棋子能否攻击到 `target`
pub fn attacks(board: &Board, from: Position, piece: Piece, target: Position) -> bool {
    let pattern = MovePattern::of(piece.piece_type);

    let step_hit = pattern.steps.iter().any(|&offset| {
        let (drow, dcol) = orient(offset, piece.side);
        from.offset(drow, dcol) == Some(target)
    });
    if step_hit {
        return true;
    }

    pattern.rays.iter().any(|&ray| {
        let (drow, dcol) = orient(ray, piece.side);
        let mut current = from;
        while let Some(next) = current.offset(drow, dcol) {
            if next == target {
                return true;
            }
            if board.get(next).is_some() {
                return false;
            }
            current = next;
        }
        false
    })
}

/// 检查 `target` 是否被 `by_side` 的任意棋子攻击
pub fn is_attacked(board: &Board, target: Position, by_side: Side) -> bool {
    board
        .pieces(by_side)
        .into_iter()
        .any(|(pos, piece)| attacks(board, pos, piece, target))
}

/// 棋子在空棋盘上从 `pos` 出发是否还有走法
///
/// 步、香在最底行，桂在最底两行时无路可走。
pub fn has_moves_from(piece: Piece, pos: Position) -> bool {
    let rank = pos.relative_row(piece.side);
    match piece.piece_type {
        PieceType::Pawn | PieceType::Lance => rank >= 1,
        PieceType::Knight => rank >= 2,
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn place(board: &mut Board, row: u8, col: u8, piece_type: PieceType, side: Side) -> Position {
        let pos = Position::new_unchecked(row, col);
        board.set(pos, Some(Piece::new(piece_type, side)));
        pos
    }

    #[test]
    fn test_king_center() {
        let mut board = Board::empty();
        let pos = place(&mut board, 4, 4, PieceType::King, Side::Sente);
        let piece = Piece::new(PieceType::King, Side::Sente);
        assert_eq!(destinations(&board, pos, piece).len(), 8);
    }

    #[test]
    fn test_gold_mirrored_for_gote() {
        let mut board = Board::empty();
        let pos = place(&mut board, 4, 4, PieceType::Gold, Side::Gote);
        let piece = Piece::new(PieceType::Gold, Side::Gote);
        let moves = destinations(&board, pos, piece);

        assert_eq!(moves.len(), 6);
        // 后手金前进方向是第 8 行
        assert!(moves.contains(&Position::new_unchecked(5, 3)));
        assert!(moves.contains(&Position::new_unchecked(3, 4)));
        assert!(!moves.contains(&Position::new_unchecked(3, 3)));
    }

    #[test]
    fn test_knight_jumps_over_pieces() {
        let mut board = Board::initial();
        let from = Position::new_unchecked(8, 1);
        let piece = Piece::new(PieceType::Knight, Side::Sente);
        // 两个落点都是己方步兵
        assert!(destinations(&board, from, piece).is_empty());

        board.set(Position::new_unchecked(6, 0), None);
        assert_eq!(
            destinations(&board, from, piece),
            vec![Position::new_unchecked(6, 0)]
        );
    }

    #[test]
    fn test_rook_blocked_and_capture() {
        let mut board = Board::empty();
        let from = place(&mut board, 4, 4, PieceType::Rook, Side::Sente);
        place(&mut board, 2, 4, PieceType::Pawn, Side::Gote);
        place(&mut board, 4, 6, PieceType::Pawn, Side::Sente);
        let moves = destinations(&board, from, Piece::new(PieceType::Rook, Side::Sente));

        assert!(moves.contains(&Position::new_unchecked(3, 4)));
        assert!(moves.contains(&Position::new_unchecked(2, 4)));
        assert!(!moves.contains(&Position::new_unchecked(1, 4)));
        assert!(moves.contains(&Position::new_unchecked(4, 5)));
        assert!(!moves.contains(&Position::new_unchecked(4, 6)));
        // 上 2 + 下 4 + 左 4 + 右 1
        assert_eq!(moves.len(), 11);
    }

    #[test]
    fn test_dragon_has_diagonal_steps() {
        let mut board = Board::empty();
        let from = place(&mut board, 4, 4, PieceType::Dragon, Side::Gote);
        let moves = destinations(&board, from, Piece::new(PieceType::Dragon, Side::Gote));
        assert_eq!(moves.len(), 16 + 4);
        assert!(moves.contains(&Position::new_unchecked(5, 5)));
        assert!(!moves.contains(&Position::new_unchecked(6, 6)));
    }

    #[test]
    fn test_lance_only_forward() {
        let mut board = Board::empty();
        let from = place(&mut board, 8, 0, PieceType::Lance, Side::Sente);
        let moves = destinations(&board, from, Piece::new(PieceType::Lance, Side::Sente));
        assert_eq!(moves.len(), 8);
        assert!(moves.iter().all(|pos| pos.col == 0 && pos.row < 8));
    }

    #[test]
    fn test_attacks_and_is_attacked() {
        let mut board = Board::empty();
        let king = place(&mut board, 0, 4, PieceType::King, Side::Gote);
        let bishop = place(&mut board, 4, 0, PieceType::Bishop, Side::Sente);
        let piece = Piece::new(PieceType::Bishop, Side::Sente);

        assert!(attacks(&board, bishop, piece, king));
        assert!(is_attacked(&board, king, Side::Sente));

        place(&mut board, 2, 2, PieceType::Pawn, Side::Gote);
        assert!(!attacks(&board, bishop, piece, king));
        assert!(!is_attacked(&board, king, Side::Sente));
    }

    #[test]
    fn test_has_moves_from() {
        let pawn = Piece::new(PieceType::Pawn, Side::Sente);
        assert!(!has_moves_from(pawn, Position::new_unchecked(0, 3)));
        assert!(has_moves_from(pawn, Position::new_unchecked(1, 3)));

        let knight = Piece::new(PieceType::Knight, Side::Gote);
        assert!(!has_moves_from(knight, Position::new_unchecked(7, 3)));
        assert!(has_moves_from(knight, Position::new_unchecked(6, 3)));

        let gold = Piece::new(PieceType::Gold, Side::Sente);
        assert!(has_moves_from(gold, Position::new_unchecked(0, 0)));
    }
}
