//! 走法验证与合法走法生成

use tracing::warn;

use crate::board::{Board, HandPieces};
use crate::constants::SQUARE_COUNT;
use crate::error::{Result, ShogiError};
use crate::game::GameState;
use crate::movement;
use crate::moves::Move;
use crate::piece::{Piece, PieceType, Position, Side};

/// 走法验证器
///
/// 人类走子的验证和 AI 的走法生成共用这里的规则。
pub struct MoveValidator;

impl MoveValidator {
    /// 检查指定方的玉将是否被将军
    ///
    /// 找不到玉将时记录警告并视为未被将军。
    pub fn is_in_check(board: &Board, side: Side) -> bool {
        match board.find_king(side) {
            Some(king) => movement::is_attacked(board, king, side.opponent()),
            None => {
                warn!(?side, "King not found, treating as not in check");
                false
            }
        }
    }

    /// 盘上走子是否合法
    pub fn validate_board_move(board: &Board, from: Position, to: Position, player: Side) -> bool {
        Self::check_board_move(board, from, to, player).is_ok()
    }

    /// 盘上走子验证，返回违规原因
    pub fn check_board_move(board: &Board, from: Position, to: Position, player: Side) -> Result<()> {
        for pos in [from, to] {
            if !pos.is_valid() {
                return Err(ShogiError::OutOfBounds {
                    row: pos.row,
                    col: pos.col,
                });
            }
        }

        let piece = board.get(from).ok_or(ShogiError::NoPiece {
            row: from.row,
            col: from.col,
        })?;
        if piece.side != player {
            return Err(ShogiError::OpponentTurn);
        }

        if !movement::destinations(board, from, piece).contains(&to) {
            return Err(ShogiError::Unreachable {
                row: to.row,
                col: to.col,
            });
        }

        let mut test_board = board.clone();
        test_board.move_piece(from, to);
        if Self::is_in_check(&test_board, player) {
            return Err(ShogiError::KingInCheck);
        }

        Ok(())
    }

    /// 打入是否合法
    pub fn validate_drop(
        board: &Board,
        hands: &HandPieces,
        to: Position,
        piece_type: PieceType,
        player: Side,
    ) -> bool {
        Self::check_drop(board, hands, to, piece_type, player).is_ok()
    }

    /// 打入验证，返回违规原因
    pub fn check_drop(
        board: &Board,
        hands: &HandPieces,
        to: Position,
        piece_type: PieceType,
        player: Side,
    ) -> Result<()> {
        if !to.is_valid() {
            return Err(ShogiError::OutOfBounds {
                row: to.row,
                col: to.col,
            });
        }
        if piece_type.hand_index().is_none() || hands.get(player, piece_type) == 0 {
            return Err(ShogiError::NotInHand);
        }
        if board.get(to).is_some() {
            return Err(ShogiError::SquareOccupied {
                row: to.row,
                col: to.col,
            });
        }

        let piece = Piece::new(piece_type, player);
        if !movement::has_moves_from(piece, to) {
            return Err(ShogiError::DeadDrop);
        }
        if piece_type == PieceType::Pawn && board.has_unpromoted_pawn_on_file(player, to.col) {
            return Err(ShogiError::DoublePawn);
        }

        let mut test_board = board.clone();
        test_board.set(to, Some(piece));
        if Self::is_in_check(&test_board, player) {
            return Err(ShogiError::KingInCheck);
        }

        // 打步诘：步兵打入将军且对方无任何应手
        if piece_type == PieceType::Pawn && Self::is_in_check(&test_board, player.opponent()) {
            let mut test_hands = *hands;
            test_hands.remove(player, piece_type);
            if !Self::has_legal_move(&test_board, &test_hands, player.opponent()) {
                return Err(ShogiError::DropCheckmate);
            }
        }

        Ok(())
    }

    /// 完整验证一步走法（含升变规则与棋子一致性）
    pub fn check_move(board: &Board, hands: &HandPieces, player: Side, mv: &Move) -> Result<()> {
        match mv.from {
            Some(from) => {
                Self::check_board_move(board, from, mv.to, player)?;
                let piece = board.get(from).ok_or(ShogiError::NoPiece {
                    row: from.row,
                    col: from.col,
                })?;
                if piece != mv.piece {
                    return Err(ShogiError::PieceMismatch);
                }
                if mv.promote && !Self::can_promote(board, from, mv.to, player) {
                    return Err(ShogiError::PromotionNotAllowed);
                }
                if !mv.promote && Self::must_promote(piece, mv.to) {
                    return Err(ShogiError::PromotionRequired);
                }
                Ok(())
            }
            None => {
                if mv.piece.side != player {
                    return Err(ShogiError::OpponentTurn);
                }
                if mv.promote {
                    return Err(ShogiError::PromotionNotAllowed);
                }
                Self::check_drop(board, hands, mv.to, mv.piece.piece_type, player)
            }
        }
    }

    /// 是否可以升变：未升变的可升变棋子，起点或终点在敌阵内
    pub fn can_promote(board: &Board, from: Position, to: Position, player: Side) -> bool {
        match board.get(from) {
            Some(piece) if piece.side == player && piece.piece_type.can_promote() => {
                from.in_promotion_zone(player) || to.in_promotion_zone(player)
            }
            _ => false,
        }
    }

    /// 是否必须升变（不升变则之后无路可走）
    pub fn must_promote(piece: Piece, to: Position) -> bool {
        piece.piece_type.can_promote() && !movement::has_moves_from(piece, to)
    }

    /// 生成当前局面的所有合法走法
    pub fn legal_moves(state: &GameState) -> Vec<Move> {
        Self::generate_legal(&state.board, &state.hands, state.current_player)
    }

    /// 生成指定方的所有合法走法（盘上走子 + 打入）
    pub fn generate_legal(board: &Board, hands: &HandPieces, side: Side) -> Vec<Move> {
        let mut moves = Vec::with_capacity(128);

        for (from, piece) in board.pieces(side) {
            for to in movement::destinations(board, from, piece) {
                let mut test_board = board.clone();
                let captured = test_board.move_piece(from, to);
                if Self::is_in_check(&test_board, side) {
                    continue;
                }

                let base = Move::new(from, to, piece).with_capture(captured);
                let promotable = piece.piece_type.can_promote()
                    && (from.in_promotion_zone(side) || to.in_promotion_zone(side));

                if !Self::must_promote(piece, to) {
                    moves.push(base);
                }
                if promotable {
                    moves.push(base.with_promotion(true));
                }
            }
        }

        for (piece_type, _) in hands.iter(side) {
            for to in Self::empty_squares(board) {
                if Self::check_drop(board, hands, to, piece_type, side).is_ok() {
                    moves.push(Move::drop(to, piece_type, side));
                }
            }
        }

        moves
    }

    /// 指定方是否至少有一步合法走法（找到即返回）
    ///
    /// 打入时不再递归判断打步诘。
    pub fn has_legal_move(board: &Board, hands: &HandPieces, side: Side) -> bool {
        for (from, piece) in board.pieces(side) {
            for to in movement::destinations(board, from, piece) {
                let mut test_board = board.clone();
                test_board.move_piece(from, to);
                if !Self::is_in_check(&test_board, side) {
                    return true;
                }
            }
        }

        for (piece_type, _) in hands.iter(side) {
            let piece = Piece::new(piece_type, side);
            for to in Self::empty_squares(board) {
                if !movement::has_moves_from(piece, to) {
                    continue;
                }
                if piece_type == PieceType::Pawn && board.has_unpromoted_pawn_on_file(side, to.col) {
                    continue;
                }
                let mut test_board = board.clone();
                test_board.set(to, Some(piece));
                if !Self::is_in_check(&test_board, side) {
                    return true;
                }
            }
        }

        false
    }

    fn empty_squares(board: &Board) -> impl Iterator<Item = Position> + '_ {
        (0..SQUARE_COUNT)
            .filter_map(Position::from_index)
            .filter(move |pos| board.get(*pos).is_none())
    }
}
