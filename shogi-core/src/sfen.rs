//! SFEN 格式解析和生成
//!
//! 将棋 SFEN 格式：
//! `<棋盘> <走子方> <持驹> <手数>`
//!
//! 棋盘从第 0 行（后手底线）写到第 8 行，每行从 9 筋写到 1 筋。
//!
//! 示例：
//! `lnsgkgsnl/1r5b1/ppppppppp/9/9/9/PPPPPPPPP/1B5R1/LNSGKGSNL b - 1`

use crate::board::{Board, HandPieces};
use crate::constants::BOARD_SIZE;
use crate::error::ShogiError;
use crate::game::GameState;
use crate::piece::{Piece, PieceType, Position, Side};

/// 平手初始局面 SFEN
pub const INITIAL_SFEN: &str = "lnsgkgsnl/1r5b1/ppppppppp/9/9/9/PPPPPPPPP/1B5R1/LNSGKGSNL b - 1";

fn invalid(reason: impl Into<String>) -> ShogiError {
    ShogiError::InvalidSfen {
        reason: reason.into(),
    }
}

/// SFEN 格式处理
pub struct Sfen;

impl Sfen {
    /// 解析 SFEN 字符串为对局状态
    pub fn parse(sfen: &str) -> Result<GameState, ShogiError> {
        let parts: Vec<&str> = sfen.split_whitespace().collect();
        if parts.is_empty() {
            return Err(invalid("Empty SFEN string"));
        }

        let board = Self::parse_board(parts[0])?;

        // 走子方（默认先手）
        let side = match parts.get(1) {
            Some(s) => {
                let mut chars = s.chars();
                match (chars.next().and_then(Side::from_sfen_char), chars.next()) {
                    (Some(side), None) => side,
                    _ => return Err(invalid(format!("Invalid side to move: {}", s))),
                }
            }
            None => Side::Sente,
        };

        let hands = match parts.get(2) {
            Some(s) => Self::parse_hands(s)?,
            None => HandPieces::new(),
        };

        if let Some(s) = parts.get(3) {
            s.parse::<u32>()
                .map_err(|_| invalid(format!("Invalid move number: {}", s)))?;
        }

        Ok(GameState::from_parts(board, hands, side))
    }

    /// 解析棋盘部分
    fn parse_board(board_str: &str) -> Result<Board, ShogiError> {
        let mut board = Board::empty();
        let rows: Vec<&str> = board_str.split('/').collect();

        if rows.len() != BOARD_SIZE {
            return Err(invalid(format!("Expected 9 rows, got {}", rows.len())));
        }

        for (row_idx, row) in rows.iter().enumerate() {
            let mut col = 0usize;
            let mut promoted = false;

            for c in row.chars() {
                if col >= BOARD_SIZE {
                    return Err(invalid(format!("Row {} has too many columns", row_idx)));
                }

                if let Some(empty_count) = c.to_digit(10) {
                    if promoted || empty_count == 0 {
                        return Err(invalid(format!("Unexpected digit in row {}", row_idx)));
                    }
                    col += empty_count as usize;
                } else if c == '+' {
                    if promoted {
                        return Err(invalid("Repeated '+'"));
                    }
                    promoted = true;
                } else if let Some((piece_type, side)) = PieceType::from_sfen_char(c) {
                    let piece_type = if promoted {
                        piece_type
                            .promote()
                            .ok_or_else(|| invalid(format!("Piece cannot be promoted: {}", c)))?
                    } else {
                        piece_type
                    };
                    board.set(
                        Position::new_unchecked(row_idx as u8, col as u8),
                        Some(Piece::new(piece_type, side)),
                    );
                    promoted = false;
                    col += 1;
                } else {
                    return Err(invalid(format!("Invalid piece character: {}", c)));
                }
            }

            if col != BOARD_SIZE || promoted {
                return Err(invalid(format!(
                    "Row {} has {} columns, expected 9",
                    row_idx, col
                )));
            }
        }

        Ok(board)
    }

    /// 解析持驹部分
    fn parse_hands(hands_str: &str) -> Result<HandPieces, ShogiError> {
        let mut hands = HandPieces::new();
        if hands_str == "-" {
            return Ok(hands);
        }

        let mut count: Option<u32> = None;
        for c in hands_str.chars() {
            if let Some(digit) = c.to_digit(10) {
                let next = count
                    .unwrap_or(0)
                    .checked_mul(10)
                    .and_then(|n| n.checked_add(digit))
                    .ok_or_else(|| invalid("Hand count too large"))?;
                count = Some(next);
                continue;
            }

            let (piece_type, side) = PieceType::from_sfen_char(c)
                .filter(|(piece_type, _)| piece_type.hand_index().is_some())
                .ok_or_else(|| invalid(format!("Invalid hand piece: {}", c)))?;
            let n = count.take().unwrap_or(1);
            let total = u32::from(hands.get(side, piece_type)) + n;
            if n == 0 || total > u32::from(piece_type.max_in_hand()) {
                return Err(invalid(format!("Invalid hand count {} for {}", n, c)));
            }
            for _ in 0..n {
                hands.add(side, piece_type);
            }
        }

        if count.is_some() {
            return Err(invalid("Hand count without piece"));
        }

        Ok(hands)
    }

    /// 将对局状态转换为 SFEN 字符串
    pub fn to_string(state: &GameState) -> String {
        format!(
            "{} {} {} {}",
            Self::board_to_string(&state.board),
            state.current_player.to_sfen_char(),
            Self::hands_to_string(&state.hands),
            state.move_history.len() + 1
        )
    }

    /// 将棋盘转换为 SFEN 棋盘部分
    pub fn board_to_string(board: &Board) -> String {
        let mut rows = Vec::with_capacity(BOARD_SIZE);

        for row_idx in 0..BOARD_SIZE as u8 {
            let mut row = String::new();
            let mut empty_count = 0;

            for col in 0..BOARD_SIZE as u8 {
                if let Some(piece) = board.get(Position::new_unchecked(row_idx, col)) {
                    if empty_count > 0 {
                        row.push_str(&empty_count.to_string());
                        empty_count = 0;
                    }
                    row.push_str(&piece.to_sfen());
                } else {
                    empty_count += 1;
                }
            }

            if empty_count > 0 {
                row.push_str(&empty_count.to_string());
            }

            rows.push(row);
        }

        rows.join("/")
    }

    /// 将持驹转换为 SFEN 持驹部分
    pub fn hands_to_string(hands: &HandPieces) -> String {
        let mut result = String::new();
        for side in [Side::Sente, Side::Gote] {
            for (piece_type, count) in hands.iter(side) {
                if count > 1 {
                    result.push_str(&count.to_string());
                }
                result.push_str(&piece_type.to_sfen(side));
            }
        }

        if result.is_empty() {
            "-".to_string()
        } else {
            result
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_initial() {
        let state = Sfen::parse(INITIAL_SFEN).unwrap();
        assert_eq!(state.board, Board::initial());
        assert_eq!(state.current_player, Side::Sente);
        assert!(state.hands.hand(Side::Sente).is_empty());
        assert_eq!(state, GameState::new());
    }

    #[test]
    fn test_initial_to_string() {
        assert_eq!(Sfen::to_string(&GameState::new()), INITIAL_SFEN);
    }

    #[test]
    fn test_promoted_pieces_and_hands() {
        let sfen = "8k/9/9/9/4+P4/9/9/9/K8 w 2PRb 1";
        let state = Sfen::parse(sfen).unwrap();

        assert_eq!(
            state.board.get(Position::new_unchecked(4, 4)),
            Some(Piece::new(PieceType::Tokin, Side::Sente))
        );
        assert_eq!(
            state.board.get(Position::new_unchecked(0, 8)),
            Some(Piece::new(PieceType::King, Side::Gote))
        );
        assert_eq!(state.current_player, Side::Gote);
        assert_eq!(state.hands.get(Side::Sente, PieceType::Pawn), 2);
        assert_eq!(state.hands.get(Side::Sente, PieceType::Rook), 1);
        assert_eq!(state.hands.get(Side::Gote, PieceType::Bishop), 1);

        // 输出使用固定的持驹顺序
        assert_eq!(
            Sfen::to_string(&state),
            "8k/9/9/9/4+P4/9/9/9/K8 w R2Pb 1"
        );
    }

    #[test]
    fn test_two_digit_hand_count() {
        let state = Sfen::parse("8k/9/9/9/9/9/9/9/K8 b 18p 1").unwrap();
        assert_eq!(state.hands.get(Side::Gote, PieceType::Pawn), 18);
    }

    #[test]
    fn test_hand_count_out_of_range() {
        for sfen in [
            "8k/9/9/9/9/9/9/9/K8 b 99999999999p 1",
            "8k/9/9/9/9/9/9/9/K8 b 19p 1",
            "8k/9/9/9/9/9/9/9/K8 b 3R 1",
            "8k/9/9/9/9/9/9/9/K8 b 2G3G 1",
            "8k/9/9/9/9/9/9/9/K8 b 0S 1",
        ] {
            assert!(
                matches!(Sfen::parse(sfen), Err(ShogiError::InvalidSfen { .. })),
                "{}",
                sfen
            );
        }

        let state = Sfen::parse("8k/9/9/9/9/9/9/9/K8 b 2R4G18P2b 1").unwrap();
        assert_eq!(state.hands.get(Side::Sente, PieceType::Pawn), 18);
        assert_eq!(state.hands.get(Side::Gote, PieceType::Bishop), 2);
    }

    #[test]
    fn test_invalid_sfen() {
        assert!(matches!(
            Sfen::parse(""),
            Err(ShogiError::InvalidSfen { .. })
        ));
        // 行数错误
        assert!(Sfen::parse("9/9/9 b - 1").is_err());
        // 列数错误
        assert!(Sfen::parse("8k/9/9/9/9/9/9/9/K7 b - 1").is_err());
        // 金不能升变
        assert!(Sfen::parse("8k/9/9/9/4+G4/9/9/9/K8 b - 1").is_err());
        // 玉不能持在手中
        assert!(Sfen::parse("8k/9/9/9/9/9/9/9/K8 b K 1").is_err());
        assert!(Sfen::parse("8k/9/9/9/9/9/9/9/K8 x - 1").is_err());
        assert!(Sfen::parse("8k/9/9/9/9/9/9/9/K8 b - one").is_err());
    }
}
