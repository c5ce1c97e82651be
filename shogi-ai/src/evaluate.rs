//! 棋局评估函数

use shogi_core::{GameState, MovePattern, Piece, PieceType, Position, Side};

/// 评估器
pub struct Evaluator;

/// 持驹按 90% 计算
const HAND_VALUE_PERCENT: i32 = 90;

/// 玉将周围每个己方金/银的加分
const GUARD_BONUS_STRONG: i32 = 30;

/// 玉将周围其他己方棋子的加分
const GUARD_BONUS_WEAK: i32 = 10;

/// 大驹每个可到达空格的加分
const MOBILITY_BONUS: i32 = 2;

/// 大驹射线终点是对方棋子时的加分
const ATTACK_BONUS: i32 = 10;

/// 棋子位置分值表（先手视角，后手需要镜像）
/// 索引为 row * 9 + col，第 0 行是敌方底线
mod position_tables {
    /// 步兵的位置分值
    pub const PAWN: [i32; 81] = [
        0,  0,  0,  0,  0,  0,  0,  0,  0,  // 不可能到达
       30, 30, 35, 40, 40, 40, 35, 30, 30,
       25, 25, 30, 35, 35, 35, 30, 25, 25,
       12, 14, 16, 20, 22, 20, 16, 14, 12,
        6,  8, 10, 12, 14, 12, 10,  8,  6,
        2,  4,  6,  8, 10,  8,  6,  4,  2,
        0,  0,  0,  0,  0,  0,  0,  0,  0,
        0,  0,  0,  0,  0,  0,  0,  0,  0,
        0,  0,  0,  0,  0,  0,  0,  0,  0,
    ];

    /// 桂马的位置分值
    pub const KNIGHT: [i32; 81] = [
        0,  0,  0,  0,  0,  0,  0,  0,  0,
        0,  0,  0,  0,  0,  0,  0,  0,  0,
       20, 25, 30, 30, 30, 30, 30, 25, 20,
       15, 20, 25, 30, 30, 30, 25, 20, 15,
       10, 15, 20, 25, 25, 25, 20, 15, 10,
        5, 10, 15, 20, 20, 20, 15, 10,  5,
        0,  5, 10, 10, 10, 10, 10,  5,  0,
        0,  0,  0,  0,  0,  0,  0,  0,  0,
        0,  0,  0,  0,  0,  0,  0,  0,  0,
    ];

    /// 银将的位置分值
    pub const SILVER: [i32; 81] = [
       10, 10, 15, 15, 15, 15, 15, 10, 10,
       15, 20, 20, 25, 25, 25, 20, 20, 15,
       15, 20, 25, 30, 30, 30, 25, 20, 15,
       10, 15, 20, 25, 30, 25, 20, 15, 10,
        5, 10, 15, 20, 25, 20, 15, 10,  5,
        5, 10, 15, 20, 20, 20, 15, 10,  5,
        0,  5, 10, 15, 15, 15, 10,  5,  0,
        0,  5,  5, 10, 10, 10,  5,  5,  0,
        0,  0,  0,  0,  0,  0,  0,  0,  0,
    ];

    /// 金将及成驹（成银、成桂、成香、と金）的位置分值
    pub const GOLD: [i32; 81] = [
       15, 15, 20, 20, 20, 20, 20, 15, 15,
       20, 25, 25, 30, 30, 30, 25, 25, 20,
       20, 25, 30, 35, 35, 35, 30, 25, 20,
       10, 15, 20, 25, 25, 25, 20, 15, 10,
        5, 10, 10, 15, 15, 15, 10, 10,  5,
        0,  5, 10, 10, 10, 10, 10,  5,  0,
        0,  5, 10, 10, 10, 10, 10,  5,  0,
        0,  5, 10, 15, 15, 15, 10,  5,  0,
        0,  0,  5, 10, 10, 10,  5,  0,  0,
    ];

    /// 玉将的位置分值（中盘前躲在己方阵内）
    pub const KING: [i32; 81] = [
      -40,-40,-40,-40,-40,-40,-40,-40,-40,
      -40,-40,-40,-40,-40,-40,-40,-40,-40,
      -30,-30,-30,-30,-30,-30,-30,-30,-30,
      -20,-20,-20,-20,-20,-20,-20,-20,-20,
      -10,-10,-10,-10,-10,-10,-10,-10,-10,
       -5, -5, -5, -5, -5, -5, -5, -5, -5,
        0,  0,  0,  0, -5,  0,  0,  0,  0,
       10, 15, 10,  5,  0,  5, 10, 15, 10,
       15, 20, 15,  5,  0,  5, 15, 20, 15,
    ];
}

impl Evaluator {
    /// 评估棋局（先手视角，正值对先手有利）
    pub fn evaluate(state: &GameState) -> i32 {
        let mut score = Self::evaluate_material(state);

        for (pos, piece) in state.board.all_pieces() {
            let bonus = Self::position_bonus(pos, piece) + Self::slider_activity(state, pos, piece);
            score += Self::signed(piece.side, bonus);
        }

        score += Self::king_safety(state, Side::Sente) - Self::king_safety(state, Side::Gote);
        score
    }

    /// 快速评估（仅计算子力差，持驹按 90%）
    pub fn evaluate_material(state: &GameState) -> i32 {
        let mut score = 0;
        for (_, piece) in state.board.all_pieces() {
            score += Self::signed(piece.side, piece.value());
        }
        for side in [Side::Sente, Side::Gote] {
            for (piece_type, count) in state.hands.iter(side) {
                let value = piece_type.value() * HAND_VALUE_PERCENT / 100 * count as i32;
                score += Self::signed(side, value);
            }
        }
        score
    }

    fn signed(side: Side, value: i32) -> i32 {
        match side {
            Side::Sente => value,
            Side::Gote => -value,
        }
    }

    /// 获取位置加成分
    fn position_bonus(pos: Position, piece: Piece) -> i32 {
        let index = match piece.side {
            Side::Sente => pos.row as usize * 9 + pos.col as usize,
            // 后手需要镜像（行翻转）
            Side::Gote => (8 - pos.row as usize) * 9 + pos.col as usize,
        };

        match piece.piece_type {
            PieceType::Pawn => position_tables::PAWN[index],
            PieceType::Knight => position_tables::KNIGHT[index],
            PieceType::Silver => position_tables::SILVER[index],
            PieceType::Gold
            | PieceType::PromotedSilver
            | PieceType::PromotedKnight
            | PieceType::PromotedLance
            | PieceType::Tokin => position_tables::GOLD[index],
            PieceType::King => position_tables::KING[index],
            // 大驹与香车用活动力评估
            _ => 0,
        }
    }

    /// 大驹活动力：射线上每个空格加分，射线终点是对方棋子时额外加分
    fn slider_activity(state: &GameState, pos: Position, piece: Piece) -> i32 {
        if !piece.piece_type.is_major() {
            return 0;
        }

        let mut bonus = 0;
        for &(drow, dcol) in MovePattern::of(piece.piece_type).rays {
            let mut current = pos;
            while let Some(next) = current.offset(drow, dcol) {
                match state.board.get(next) {
                    None => bonus += MOBILITY_BONUS,
                    Some(target) => {
                        if target.side != piece.side {
                            bonus += ATTACK_BONUS;
                        }
                        break;
                    }
                }
                current = next;
            }
        }
        bonus
    }

    /// 玉将安全：统计周围的己方守备棋子
    fn king_safety(state: &GameState, side: Side) -> i32 {
        let Some(king) = state.board.find_king(side) else {
            return 0;
        };

        let mut bonus = 0;
        for drow in -1..=1 {
            for dcol in -1..=1 {
                if drow == 0 && dcol == 0 {
                    continue;
                }
                let guard = king
                    .offset(drow, dcol)
                    .and_then(|pos| state.board.get(pos))
                    .filter(|piece| piece.side == side);
                if let Some(piece) = guard {
                    bonus += match piece.piece_type {
                        PieceType::Gold | PieceType::Silver => GUARD_BONUS_STRONG,
                        _ => GUARD_BONUS_WEAK,
                    };
                }
            }
        }
        bonus
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shogi_core::{Move, Sfen};

    #[test]
    fn test_initial_evaluation() {
        let state = GameState::new();
        assert_eq!(Evaluator::evaluate(&state), 0);
        assert_eq!(Evaluator::evaluate_material(&state), 0);
    }

    #[test]
    fn test_hand_pieces_count_ninety_percent() {
        let state = Sfen::parse("4k4/9/9/9/9/9/9/9/4K4 b R 1").unwrap();
        assert_eq!(Evaluator::evaluate_material(&state), 900);
    }

    #[test]
    fn test_material_advantage() {
        // 后手少一个飞车
        let state = Sfen::parse("lnsgkgsnl/7b1/ppppppppp/9/9/9/PPPPPPPPP/1B5R1/LNSGKGSNL b - 1").unwrap();
        let score = Evaluator::evaluate(&state);
        assert!(score >= 900, "Sente should be ahead by about a rook: {}", score);
    }

    #[test]
    fn test_flipped_position_negates_score() {
        let moves = [
            Move::new(
                Position::new_unchecked(6, 2),
                Position::new_unchecked(5, 2),
                Piece::new(PieceType::Pawn, Side::Sente),
            ),
            Move::new(
                Position::new_unchecked(2, 6),
                Position::new_unchecked(3, 6),
                Piece::new(PieceType::Pawn, Side::Gote),
            ),
            Move::new(
                Position::new_unchecked(7, 1),
                Position::new_unchecked(1, 7),
                Piece::new(PieceType::Bishop, Side::Sente),
            )
            .with_promotion(true),
        ];
        let state = GameState::replay(&moves).unwrap();
        let score = Evaluator::evaluate(&state);
        assert!(score > 0);
        assert_eq!(Evaluator::evaluate(&state.flipped()), -score);
    }

    #[test]
    fn test_advanced_pawn_is_better() {
        let advanced = Sfen::parse("4k4/9/9/4P4/9/9/9/9/4K4 b - 1").unwrap();
        let home = Sfen::parse("4k4/9/9/9/9/9/4P4/9/4K4 b - 1").unwrap();
        assert!(Evaluator::evaluate(&advanced) > Evaluator::evaluate(&home));
    }

    #[test]
    fn test_king_guards() {
        let guarded = Sfen::parse("4k4/9/9/9/9/9/9/3G5/4K4 b - 1").unwrap();
        let loose = Sfen::parse("4k4/9/9/9/9/9/9/G8/4K4 b - 1").unwrap();
        let diff = Evaluator::evaluate(&guarded) - Evaluator::evaluate(&loose);
        assert_eq!(diff, GUARD_BONUS_STRONG + position_tables::GOLD[7 * 9 + 3] - position_tables::GOLD[7 * 9]);
    }

    #[test]
    fn test_rook_attacking_piece() {
        let open = Sfen::parse("4k4/9/9/9/4R4/9/9/9/K8 b - 1").unwrap();
        let score = Evaluator::evaluate(&open);
        // 飞车一路冲到对方玉将
        assert!(score > PieceType::Rook.value());
    }
}
