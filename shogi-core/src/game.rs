//! 对局状态机

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::board::{Board, HandPieces};
use crate::constants::IMPASSE_THRESHOLD;
use crate::error::{Result, ShogiError};
use crate::moves::Move;
use crate::piece::{PieceType, Side};
use crate::repetition::{position_key, PositionHistory};
use crate::validator::MoveValidator;

/// 对局结束原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EndReason {
    /// 认输
    Resignation,
    /// 将死
    Checkmate,
    /// 无子可动（未被将军）
    Stalemate,
    /// 千日手
    Repetition,
    /// 连续将军的千日手
    PerpetualCheck,
    /// 持将棋（入玉）
    Impasse,
}

/// 对局状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStatus {
    /// 是否已结束
    pub is_over: bool,
    /// 胜方（和棋为 None）
    pub winner: Option<Side>,
    /// 结束原因
    pub reason: Option<EndReason>,
}

impl GameStatus {
    /// 对局进行中
    pub fn ongoing() -> Self {
        Self {
            is_over: false,
            winner: None,
            reason: None,
        }
    }

    /// 对局结束
    pub fn finished(winner: Option<Side>, reason: EndReason) -> Self {
        Self {
            is_over: true,
            winner,
            reason: Some(reason),
        }
    }
}

/// 持将棋判胜点数
///
/// 默认双方都是 24 点。传统规则中后手需要 27 点，可用 [`ImpasseRule::traditional`] 开启。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpasseRule {
    pub sente_threshold: u32,
    pub gote_threshold: u32,
}

impl ImpasseRule {
    /// 后手需要 27 点
    pub fn traditional() -> Self {
        Self {
            sente_threshold: IMPASSE_THRESHOLD,
            gote_threshold: 27,
        }
    }

    fn threshold(&self, side: Side) -> u32 {
        match side {
            Side::Sente => self.sente_threshold,
            Side::Gote => self.gote_threshold,
        }
    }
}

impl Default for ImpasseRule {
    fn default() -> Self {
        Self {
            sente_threshold: IMPASSE_THRESHOLD,
            gote_threshold: IMPASSE_THRESHOLD,
        }
    }
}

/// 对局状态（每次走子都返回新的状态，旧状态保持不变）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    /// 棋盘
    pub board: Board,
    /// 双方持驹
    pub hands: HandPieces,
    /// 当前走子方
    pub current_player: Side,
    /// 已走的步（含被吃棋子）
    pub move_history: Vec<Move>,
    /// 局面出现记录
    pub position_history: PositionHistory,
    /// 认输方
    pub resigned: Option<Side>,
}

impl GameState {
    /// 平手初始局面，先手先走
    pub fn new() -> Self {
        Self::from_parts(Board::initial(), HandPieces::new(), Side::Sente)
    }

    /// 从任意局面开始，并记录该局面
    pub fn from_parts(board: Board, hands: HandPieces, current_player: Side) -> Self {
        let in_check = MoveValidator::is_in_check(&board, current_player);
        let mut position_history = PositionHistory::new();
        position_history.record(
            position_key(&board, &hands, current_player),
            current_player,
            in_check,
        );
        Self {
            board,
            hands,
            current_player,
            move_history: Vec::new(),
            position_history,
            resigned: None,
        }
    }

    /// 当前局面的键
    pub fn position_key(&self) -> String {
        position_key(&self.board, &self.hands, self.current_player)
    }

    /// 当前走子方是否被将军
    pub fn in_check(&self) -> bool {
        MoveValidator::is_in_check(&self.board, self.current_player)
    }

    /// 当前走子方的所有合法走法
    pub fn legal_moves(&self) -> Vec<Move> {
        MoveValidator::legal_moves(self)
    }

    /// 验证并执行走法
    pub fn apply_move(&self, mv: &Move) -> Result<GameState> {
        if self.resigned.is_some() {
            return Err(ShogiError::GameOver);
        }

        if let Err(err) = MoveValidator::check_move(&self.board, &self.hands, self.current_player, mv) {
            debug!(%mv, %err, "Rejected move");
            return Err(err);
        }

        Ok(self.apply_legal_move(mv))
    }

    /// 执行已知合法的走法（不再验证）
    pub fn apply_legal_move(&self, mv: &Move) -> GameState {
        let mut next = self.clone();
        let player = self.current_player;

        let captured = match mv.from {
            Some(from) => {
                let captured = next.board.move_piece(from, mv.to);
                if let Some(piece) = captured {
                    next.hands.add(player, piece.piece_type);
                }
                if mv.promote {
                    next.board.set(mv.to, Some(mv.placed_piece()));
                }
                captured
            }
            None => {
                next.hands.remove(player, mv.piece.piece_type);
                next.board.set(mv.to, Some(mv.piece));
                None
            }
        };

        next.move_history.push(mv.with_capture(captured));
        next.current_player = player.opponent();

        let in_check = next.in_check();
        let key = next.position_key();
        next.position_history.record(key, next.current_player, in_check);

        next
    }

    /// 悔棋：撤销最后一步，没有历史时返回 None
    pub fn undo(&self) -> Option<GameState> {
        let last = *self.move_history.last()?;
        let mover = last.side();
        let mut prev = self.clone();

        prev.position_history
            .unrecord(&self.position_key(), self.in_check());
        prev.move_history.pop();

        match last.from {
            Some(from) => {
                prev.board.set(from, Some(last.piece));
                prev.board.set(last.to, last.captured);
                if let Some(piece) = last.captured {
                    prev.hands.remove(mover, piece.piece_type.unpromote());
                }
            }
            None => {
                prev.board.set(last.to, None);
                prev.hands.add(mover, last.piece.piece_type);
            }
        }

        prev.current_player = mover;
        prev.resigned = None;
        Some(prev)
    }

    /// 认输
    pub fn resign(&self, side: Side) -> GameState {
        info!(?side, "Resigned");
        let mut next = self.clone();
        next.resigned = Some(side);
        next
    }

    /// 刚刚结束回合的一方（用于外部计时）
    pub fn turn_ended(&self) -> Option<Side> {
        self.move_history.last().map(Move::side)
    }

    /// 从初始局面重放走法
    pub fn replay(moves: &[Move]) -> Result<GameState> {
        moves
            .iter()
            .try_fold(GameState::new(), |state, mv| state.apply_move(mv))
    }

    /// 对局状态（默认持将棋规则）
    pub fn status(&self) -> GameStatus {
        self.status_with(&ImpasseRule::default())
    }

    /// 对局状态
    ///
    /// 判定顺序：认输 → 将死 → 无子可动 → 千日手 → 持将棋。
    pub fn status_with(&self, rule: &ImpasseRule) -> GameStatus {
        if let Some(loser) = self.resigned {
            return GameStatus::finished(Some(loser.opponent()), EndReason::Resignation);
        }

        if self.legal_moves().is_empty() {
            return if self.in_check() {
                GameStatus::finished(Some(self.current_player.opponent()), EndReason::Checkmate)
            } else {
                GameStatus::finished(None, EndReason::Stalemate)
            };
        }

        let repetition = self.position_history.status(&self.position_key());
        if let Some(checker) = repetition.perpetual_checker {
            return GameStatus::finished(Some(checker.opponent()), EndReason::PerpetualCheck);
        }
        if repetition.is_repetition {
            return GameStatus::finished(None, EndReason::Repetition);
        }

        if self.kings_entered() {
            let sente_wins = self.impasse_points(Side::Sente) >= rule.threshold(Side::Sente);
            let gote_wins = self.impasse_points(Side::Gote) >= rule.threshold(Side::Gote);
            let winner = match (sente_wins, gote_wins) {
                (true, false) => Some(Side::Sente),
                (false, true) => Some(Side::Gote),
                _ => None,
            };
            return GameStatus::finished(winner, EndReason::Impasse);
        }

        GameStatus::ongoing()
    }

    /// 双方玉将是否都已进入敌阵
    pub fn kings_entered(&self) -> bool {
        [Side::Sente, Side::Gote].iter().all(|&side| {
            self.board
                .find_king(side)
                .map(|king| king.in_promotion_zone(side))
                .unwrap_or(false)
        })
    }

    /// 持将棋计点（盘上 + 手中，不含玉将）
    pub fn impasse_points(&self, side: Side) -> u32 {
        let on_board: u32 = self
            .board
            .pieces(side)
            .iter()
            .map(|(_, piece)| piece.piece_type.impasse_points())
            .sum();
        let in_hand: u32 = self
            .hands
            .iter(side)
            .map(|(piece_type, count)| piece_type.impasse_points() * count as u32)
            .sum();
        on_board + in_hand
    }

    /// 上下翻转并交换双方（历史清空）
    pub fn flipped(&self) -> GameState {
        GameState::from_parts(
            self.board.flipped(),
            self.hands.flipped(),
            self.current_player.opponent(),
        )
    }

    /// 手中某种棋子的数量
    pub fn hand_count(&self, side: Side, piece_type: PieceType) -> u8 {
        self.hands.get(side, piece_type)
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::piece::{Piece, Position};

    fn pos(row: u8, col: u8) -> Position {
        Position::new_unchecked(row, col)
    }

    fn piece(piece_type: PieceType, side: Side) -> Piece {
        Piece::new(piece_type, side)
    }

    fn board_with(pieces: &[(u8, u8, PieceType, Side)]) -> Board {
        let mut board = Board::empty();
        for &(row, col, piece_type, side) in pieces {
            board.set(pos(row, col), Some(piece(piece_type, side)));
        }
        board
    }

    /// 角换后打角的短局
    fn opening_moves() -> Vec<Move> {
        vec![
            Move::new(pos(6, 2), pos(5, 2), piece(PieceType::Pawn, Side::Sente)),
            Move::new(pos(2, 6), pos(3, 6), piece(PieceType::Pawn, Side::Gote)),
            Move::new(pos(7, 1), pos(1, 7), piece(PieceType::Bishop, Side::Sente)).with_promotion(true),
            Move::new(pos(0, 6), pos(1, 7), piece(PieceType::Silver, Side::Gote)),
            Move::drop(pos(4, 4), PieceType::Bishop, Side::Sente),
        ]
    }

    #[test]
    fn test_new_game() {
        let state = GameState::new();
        assert_eq!(state.current_player, Side::Sente);
        assert!(state.move_history.is_empty());
        assert_eq!(state.position_history.len(), 1);
        assert_eq!(state.status(), GameStatus::ongoing());
        assert_eq!(state.turn_ended(), None);
    }

    #[test]
    fn test_apply_move_returns_new_state() {
        let state = GameState::new();
        let mv = Move::new(pos(6, 4), pos(5, 4), piece(PieceType::Pawn, Side::Sente));
        let next = state.apply_move(&mv).unwrap();

        assert_eq!(next.current_player, Side::Gote);
        assert_eq!(next.turn_ended(), Some(Side::Sente));
        assert!(state.board.get(pos(6, 4)).is_some());
        assert!(next.board.get(pos(6, 4)).is_none());
    }

    #[test]
    fn test_illegal_move_rejected() {
        let state = GameState::new();
        let mv = Move::new(pos(6, 4), pos(4, 4), piece(PieceType::Pawn, Side::Sente));
        assert_eq!(
            state.apply_move(&mv),
            Err(ShogiError::Unreachable { row: 4, col: 4 })
        );

        let wrong_side = Move::new(pos(2, 4), pos(3, 4), piece(PieceType::Pawn, Side::Gote));
        assert_eq!(state.apply_move(&wrong_side), Err(ShogiError::OpponentTurn));
    }

    #[test]
    fn test_capture_promotion_and_drop() {
        let state = GameState::replay(&opening_moves()).unwrap();

        // 角行被吃后以未升变形态进入后手持驹，先手打出了吃到的角
        assert_eq!(state.hand_count(Side::Gote, PieceType::Bishop), 1);
        assert_eq!(state.hand_count(Side::Sente, PieceType::Bishop), 0);
        assert_eq!(state.board.get(pos(4, 4)), Some(piece(PieceType::Bishop, Side::Sente)));
        assert_eq!(state.board.get(pos(1, 7)), Some(piece(PieceType::Silver, Side::Gote)));

        let capture = state.move_history[2];
        assert_eq!(capture.captured, Some(piece(PieceType::Bishop, Side::Gote)));
        let recapture = state.move_history[3];
        assert_eq!(recapture.captured, Some(piece(PieceType::Horse, Side::Sente)));
    }

    #[test]
    fn test_replay_round_trip() {
        let moves = opening_moves();
        let mut state = GameState::new();
        for mv in &moves {
            state = state.apply_move(mv).unwrap();
            let replayed = GameState::replay(&state.move_history).unwrap();
            assert_eq!(replayed.board, state.board);
            assert_eq!(replayed.hands, state.hands);
            assert_eq!(replayed.current_player, state.current_player);
        }
    }

    #[test]
    fn test_undo_is_inverse() {
        let mut states = vec![GameState::new()];
        for mv in opening_moves() {
            let next = states.last().unwrap().apply_move(&mv).unwrap();
            states.push(next);
        }

        let mut current = states.pop().unwrap();
        while let Some(expected) = states.pop() {
            current = current.undo().unwrap();
            assert_eq!(current, expected);
        }
        assert!(current.undo().is_none());
    }

    #[test]
    fn test_legal_moves_are_accepted() {
        let state = GameState::replay(&opening_moves()).unwrap();
        let moves = state.legal_moves();
        assert!(!moves.is_empty());
        for mv in moves {
            let next = state.apply_move(&mv).unwrap();
            assert!(!MoveValidator::is_in_check(&next.board, state.current_player));
        }
    }

    #[test]
    fn test_resignation() {
        let state = GameState::new().resign(Side::Sente);
        let status = state.status();
        assert!(status.is_over);
        assert_eq!(status.winner, Some(Side::Gote));
        assert_eq!(status.reason, Some(EndReason::Resignation));

        let mv = Move::new(pos(6, 4), pos(5, 4), piece(PieceType::Pawn, Side::Sente));
        assert_eq!(state.apply_move(&mv), Err(ShogiError::GameOver));
    }

    #[test]
    fn test_checkmate() {
        let board = board_with(&[
            (0, 0, PieceType::King, Side::Gote),
            (1, 1, PieceType::Gold, Side::Sente),
            (2, 2, PieceType::Silver, Side::Sente),
            (8, 8, PieceType::King, Side::Sente),
        ]);
        let state = GameState::from_parts(board, HandPieces::new(), Side::Gote);
        assert_eq!(
            state.status(),
            GameStatus::finished(Some(Side::Sente), EndReason::Checkmate)
        );
    }

    #[test]
    fn test_stalemate() {
        let board = board_with(&[
            (0, 0, PieceType::King, Side::Gote),
            (2, 1, PieceType::Gold, Side::Sente),
            (2, 2, PieceType::Knight, Side::Sente),
            (8, 8, PieceType::King, Side::Sente),
        ]);
        let state = GameState::from_parts(board, HandPieces::new(), Side::Gote);
        assert!(!state.in_check());
        assert_eq!(state.status(), GameStatus::finished(None, EndReason::Stalemate));
    }

    #[test]
    fn test_repetition_on_fourth_occurrence() {
        let shuffle = [
            Move::new(pos(7, 7), pos(7, 8), piece(PieceType::Rook, Side::Sente)),
            Move::new(pos(1, 1), pos(1, 0), piece(PieceType::Rook, Side::Gote)),
            Move::new(pos(7, 8), pos(7, 7), piece(PieceType::Rook, Side::Sente)),
            Move::new(pos(1, 0), pos(1, 1), piece(PieceType::Rook, Side::Gote)),
        ];

        let mut state = GameState::new();
        for _ in 0..2 {
            for mv in &shuffle {
                state = state.apply_move(mv).unwrap();
            }
        }
        // 初始局面出现 3 次
        assert!(!state.status().is_over);

        for mv in &shuffle {
            state = state.apply_move(mv).unwrap();
        }
        assert_eq!(state.status(), GameStatus::finished(None, EndReason::Repetition));
    }

    #[test]
    fn test_perpetual_check_loses() {
        let board = board_with(&[
            (0, 0, PieceType::King, Side::Gote),
            (5, 0, PieceType::Rook, Side::Sente),
            (8, 8, PieceType::King, Side::Sente),
        ]);
        let mut state = GameState::from_parts(board, HandPieces::new(), Side::Gote);
        assert!(state.in_check());

        let cycle = [
            Move::new(pos(0, 0), pos(0, 1), piece(PieceType::King, Side::Gote)),
            Move::new(pos(5, 0), pos(5, 1), piece(PieceType::Rook, Side::Sente)),
            Move::new(pos(0, 1), pos(0, 0), piece(PieceType::King, Side::Gote)),
            Move::new(pos(5, 1), pos(5, 0), piece(PieceType::Rook, Side::Sente)),
        ];
        for _ in 0..3 {
            for mv in &cycle {
                state = state.apply_move(mv).unwrap();
            }
        }

        assert_eq!(
            state.status(),
            GameStatus::finished(Some(Side::Gote), EndReason::PerpetualCheck)
        );
    }

    #[test]
    fn test_perpetual_check_from_checker_to_move() {
        let board = board_with(&[
            (0, 4, PieceType::King, Side::Gote),
            (4, 5, PieceType::Rook, Side::Sente),
            (8, 0, PieceType::King, Side::Sente),
        ]);
        let mut state = GameState::from_parts(board, HandPieces::new(), Side::Sente);
        assert!(!state.in_check());

        let cycle = [
            Move::new(pos(4, 5), pos(4, 4), piece(PieceType::Rook, Side::Sente)),
            Move::new(pos(0, 4), pos(0, 5), piece(PieceType::King, Side::Gote)),
            Move::new(pos(4, 4), pos(4, 5), piece(PieceType::Rook, Side::Sente)),
            Move::new(pos(0, 5), pos(0, 4), piece(PieceType::King, Side::Gote)),
        ];
        for _ in 0..3 {
            for mv in &cycle {
                state = state.apply_move(mv).unwrap();
                if mv.side() == Side::Sente {
                    assert!(state.in_check());
                }
            }
        }

        assert_eq!(state.current_player, Side::Sente);
        assert!(!state.in_check());
        assert_eq!(
            state.status(),
            GameStatus::finished(Some(Side::Gote), EndReason::PerpetualCheck)
        );

        let earlier = state.undo().unwrap();
        assert!(!earlier.status().is_over);
    }

    #[test]
    fn test_impasse() {
        let board = board_with(&[
            (1, 4, PieceType::King, Side::Sente),
            (7, 4, PieceType::King, Side::Gote),
            (2, 0, PieceType::Gold, Side::Sente),
            (2, 1, PieceType::Gold, Side::Sente),
            (2, 2, PieceType::Gold, Side::Sente),
            (2, 3, PieceType::Gold, Side::Sente),
        ]);
        let mut hands = HandPieces::new();
        for piece_type in [PieceType::Rook, PieceType::Rook, PieceType::Bishop, PieceType::Bishop] {
            hands.add(Side::Sente, piece_type);
        }
        let state = GameState::from_parts(board, hands, Side::Sente);

        assert!(state.kings_entered());
        assert_eq!(state.impasse_points(Side::Sente), 24);
        assert_eq!(state.impasse_points(Side::Gote), 0);
        assert_eq!(
            state.status(),
            GameStatus::finished(Some(Side::Sente), EndReason::Impasse)
        );

        let mut short = state.clone();
        short.hands.remove(Side::Sente, PieceType::Rook);
        assert_eq!(short.status(), GameStatus::finished(None, EndReason::Impasse));
    }

    #[test]
    fn test_traditional_impasse_rule() {
        let board = board_with(&[
            (1, 4, PieceType::King, Side::Sente),
            (7, 4, PieceType::King, Side::Gote),
        ]);
        let mut hands = HandPieces::new();
        for piece_type in [PieceType::Rook, PieceType::Rook, PieceType::Bishop, PieceType::Bishop] {
            hands.add(Side::Gote, piece_type);
        }
        for _ in 0..5 {
            hands.add(Side::Gote, PieceType::Pawn);
        }
        let state = GameState::from_parts(board, hands, Side::Sente);

        assert_eq!(state.impasse_points(Side::Gote), 25);
        assert_eq!(
            state.status().winner,
            Some(Side::Gote)
        );
        assert_eq!(
            state.status_with(&ImpasseRule::traditional()),
            GameStatus::finished(None, EndReason::Impasse)
        );
    }

    #[test]
    fn test_state_survives_json_transport() {
        let state = GameState::replay(&opening_moves()).unwrap();
        let json = serde_json::to_string(&state).unwrap();
        let restored: GameState = serde_json::from_str(&json).unwrap();

        assert_eq!(restored, state);
        assert_eq!(restored.undo().unwrap(), state.undo().unwrap());
    }

    #[test]
    fn test_flipped_swaps_sides() {
        let state = GameState::replay(&opening_moves()).unwrap();
        let flipped = state.flipped();
        assert_eq!(flipped.current_player, state.current_player.opponent());
        assert_eq!(flipped.hand_count(Side::Sente, PieceType::Bishop), 1);
        assert_eq!(flipped.board.flipped(), state.board);
    }
}
