//! 棋子定义

use serde::{Deserialize, Serialize};

use crate::constants::{
    BOARD_SIZE, HAND_KINDS, IMPASSE_MAJOR_POINTS, IMPASSE_MINOR_POINTS, PROMOTION_ZONE_DEPTH,
};

/// 棋子类型（8 种基本棋子 + 6 种成驹）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PieceType {
    /// 玉将/王将
    King,
    /// 飞车
    Rook,
    /// 角行
    Bishop,
    /// 金将
    Gold,
    /// 银将
    Silver,
    /// 桂马
    Knight,
    /// 香车
    Lance,
    /// 步兵
    Pawn,
    /// 龙王（成飞）
    Dragon,
    /// 龙马（成角）
    Horse,
    /// 成银
    PromotedSilver,
    /// 成桂
    PromotedKnight,
    /// 成香
    PromotedLance,
    /// と金（成步）
    Tokin,
}

impl PieceType {
    /// 全部 14 种棋子
    pub const ALL: [PieceType; 14] = [
        PieceType::King,
        PieceType::Rook,
        PieceType::Bishop,
        PieceType::Gold,
        PieceType::Silver,
        PieceType::Knight,
        PieceType::Lance,
        PieceType::Pawn,
        PieceType::Dragon,
        PieceType::Horse,
        PieceType::PromotedSilver,
        PieceType::PromotedKnight,
        PieceType::PromotedLance,
        PieceType::Tokin,
    ];

    /// 可以持在手中（打入）的棋子，顺序固定，用于哈希与 SFEN
    pub const HAND_TYPES: [PieceType; HAND_KINDS] = [
        PieceType::Rook,
        PieceType::Bishop,
        PieceType::Gold,
        PieceType::Silver,
        PieceType::Knight,
        PieceType::Lance,
        PieceType::Pawn,
    ];

    /// 一方手中最多能持有的数量（即该种棋子的总数）
    pub fn max_in_hand(&self) -> u8 {
        match self.unpromote() {
            PieceType::Rook | PieceType::Bishop => 2,
            PieceType::Pawn => 18,
            PieceType::King => 0,
            _ => 4,
        }
    }

    /// 获取棋子的基础分值（用于 AI 评估与走法排序）
    pub fn value(&self) -> i32 {
        match self {
            PieceType::King => 10000,
            PieceType::Rook => 1000,
            PieceType::Bishop => 850,
            PieceType::Gold => 550,
            PieceType::Silver => 500,
            PieceType::Knight => 350,
            PieceType::Lance => 300,
            PieceType::Pawn => 100,
            PieceType::Dragon => 1250,
            PieceType::Horse => 1100,
            PieceType::PromotedSilver => 540,
            PieceType::PromotedKnight => 540,
            PieceType::PromotedLance => 540,
            PieceType::Tokin => 560,
        }
    }

    /// 是否为成驹
    pub fn is_promoted(&self) -> bool {
        matches!(
            self,
            PieceType::Dragon
                | PieceType::Horse
                | PieceType::PromotedSilver
                | PieceType::PromotedKnight
                | PieceType::PromotedLance
                | PieceType::Tokin
        )
    }

    /// 升变后的类型（玉、金和成驹不能升变）
    pub fn promote(&self) -> Option<PieceType> {
        match self {
            PieceType::Rook => Some(PieceType::Dragon),
            PieceType::Bishop => Some(PieceType::Horse),
            PieceType::Silver => Some(PieceType::PromotedSilver),
            PieceType::Knight => Some(PieceType::PromotedKnight),
            PieceType::Lance => Some(PieceType::PromotedLance),
            PieceType::Pawn => Some(PieceType::Tokin),
            _ => None,
        }
    }

    /// 还原为未升变的类型（被吃入手时使用）
    pub fn unpromote(&self) -> PieceType {
        match self {
            PieceType::Dragon => PieceType::Rook,
            PieceType::Horse => PieceType::Bishop,
            PieceType::PromotedSilver => PieceType::Silver,
            PieceType::PromotedKnight => PieceType::Knight,
            PieceType::PromotedLance => PieceType::Lance,
            PieceType::Tokin => PieceType::Pawn,
            other => *other,
        }
    }

    /// 是否可以升变
    pub fn can_promote(&self) -> bool {
        self.promote().is_some()
    }

    /// 在手牌数组中的下标（不可打入的棋子返回 None）
    pub fn hand_index(&self) -> Option<usize> {
        Self::HAND_TYPES.iter().position(|pt| pt == self)
    }

    /// 是否为大驹（飞、角及其成驹）
    pub fn is_major(&self) -> bool {
        matches!(
            self,
            PieceType::Rook | PieceType::Bishop | PieceType::Dragon | PieceType::Horse
        )
    }

    /// 持将棋计点
    pub fn impasse_points(&self) -> u32 {
        match self {
            PieceType::King => 0,
            pt if pt.is_major() => IMPASSE_MAJOR_POINTS,
            _ => IMPASSE_MINOR_POINTS,
        }
    }

    /// 获取 SFEN 字母（先手大写，后手小写，成驹带 '+' 前缀）
    pub fn to_sfen(&self, side: Side) -> String {
        let c = match self.unpromote() {
            PieceType::King => 'k',
            PieceType::Rook => 'r',
            PieceType::Bishop => 'b',
            PieceType::Gold => 'g',
            PieceType::Silver => 's',
            PieceType::Knight => 'n',
            PieceType::Lance => 'l',
            _ => 'p',
        };
        let c = match side {
            Side::Sente => c.to_ascii_uppercase(),
            Side::Gote => c,
        };
        if self.is_promoted() {
            format!("+{}", c)
        } else {
            c.to_string()
        }
    }

    /// 从 SFEN 字母解析未升变的棋子
    pub fn from_sfen_char(c: char) -> Option<(PieceType, Side)> {
        let side = if c.is_ascii_uppercase() {
            Side::Sente
        } else {
            Side::Gote
        };
        let piece_type = match c.to_ascii_lowercase() {
            'k' => PieceType::King,
            'r' => PieceType::Rook,
            'b' => PieceType::Bishop,
            'g' => PieceType::Gold,
            's' => PieceType::Silver,
            'n' => PieceType::Knight,
            'l' => PieceType::Lance,
            'p' => PieceType::Pawn,
            _ => return None,
        };
        Some((piece_type, side))
    }
}

/// 对局方
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// 先手（在下方，向第 0 行前进）
    Sente,
    /// 后手（在上方，向第 8 行前进）
    Gote,
}

impl Side {
    /// 获取对方
    pub fn opponent(&self) -> Side {
        match self {
            Side::Sente => Side::Gote,
            Side::Gote => Side::Sente,
        }
    }

    /// 前进方向的行增量
    pub fn forward(&self) -> i8 {
        match self {
            Side::Sente => -1,
            Side::Gote => 1,
        }
    }

    /// 数组下标
    pub fn index(&self) -> usize {
        match self {
            Side::Sente => 0,
            Side::Gote => 1,
        }
    }

    /// 获取 SFEN 手番字符
    pub fn to_sfen_char(&self) -> char {
        match self {
            Side::Sente => 'b',
            Side::Gote => 'w',
        }
    }

    /// 从 SFEN 手番字符解析
    pub fn from_sfen_char(c: char) -> Option<Side> {
        match c {
            'b' => Some(Side::Sente),
            'w' => Some(Side::Gote),
            _ => None,
        }
    }
}

/// 棋子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Piece {
    pub piece_type: PieceType,
    pub side: Side,
}

impl Piece {
    /// 创建新棋子
    pub fn new(piece_type: PieceType, side: Side) -> Self {
        Self { piece_type, side }
    }

    /// 是否为成驹
    pub fn is_promoted(&self) -> bool {
        self.piece_type.is_promoted()
    }

    /// 升变后的棋子
    pub fn promoted(&self) -> Option<Piece> {
        self.piece_type
            .promote()
            .map(|piece_type| Piece::new(piece_type, self.side))
    }

    /// 获取棋子显示的汉字
    pub fn display_char(&self) -> char {
        match self.piece_type {
            PieceType::King => match self.side {
                Side::Sente => '玉',
                Side::Gote => '王',
            },
            PieceType::Rook => '飛',
            PieceType::Bishop => '角',
            PieceType::Gold => '金',
            PieceType::Silver => '銀',
            PieceType::Knight => '桂',
            PieceType::Lance => '香',
            PieceType::Pawn => '歩',
            PieceType::Dragon => '龍',
            PieceType::Horse => '馬',
            PieceType::PromotedSilver => '全',
            PieceType::PromotedKnight => '圭',
            PieceType::PromotedLance => '杏',
            PieceType::Tokin => 'と',
        }
    }

    /// 获取 SFEN 表示
    pub fn to_sfen(&self) -> String {
        self.piece_type.to_sfen(self.side)
    }

    /// 获取棋子分值
    pub fn value(&self) -> i32 {
        self.piece_type.value()
    }
}

/// 棋盘位置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    /// 行 (0-8)，第 0 行是后手的底线
    pub row: u8,
    /// 列 (0-8)，第 0 列是先手视角的 9 筋
    pub col: u8,
}

impl Position {
    /// 创建新位置
    pub fn new(row: u8, col: u8) -> Option<Self> {
        if (row as usize) < BOARD_SIZE && (col as usize) < BOARD_SIZE {
            Some(Self { row, col })
        } else {
            None
        }
    }

    /// 创建新位置（不检查边界，内部使用）
    pub const fn new_unchecked(row: u8, col: u8) -> Self {
        Self { row, col }
    }

    /// 检查位置是否在棋盘内
    pub fn is_valid(&self) -> bool {
        (self.row as usize) < BOARD_SIZE && (self.col as usize) < BOARD_SIZE
    }

    /// 获取偏移后的位置
    pub fn offset(&self, drow: i8, dcol: i8) -> Option<Position> {
        let row = self.row as i8 + drow;
        let col = self.col as i8 + dcol;
        if row >= 0 && (row as usize) < BOARD_SIZE && col >= 0 && (col as usize) < BOARD_SIZE {
            Some(Position {
                row: row as u8,
                col: col as u8,
            })
        } else {
            None
        }
    }

    /// 从该方视角到对方底线的距离（0 表示最远的一行）
    pub fn relative_row(&self, side: Side) -> u8 {
        match side {
            Side::Sente => self.row,
            Side::Gote => (BOARD_SIZE as u8 - 1) - self.row,
        }
    }

    /// 是否在该方的升变区（敌阵三行）内
    pub fn in_promotion_zone(&self, side: Side) -> bool {
        self.relative_row(side) < PROMOTION_ZONE_DEPTH
    }

    /// 上下翻转后的位置
    pub fn flipped(&self) -> Position {
        Position {
            row: (BOARD_SIZE as u8 - 1) - self.row,
            col: self.col,
        }
    }

    /// 转换为数组索引
    pub fn to_index(&self) -> usize {
        self.row as usize * BOARD_SIZE + self.col as usize
    }

    /// 从数组索引转换
    pub fn from_index(index: usize) -> Option<Self> {
        if index < BOARD_SIZE * BOARD_SIZE {
            Some(Position {
                row: (index / BOARD_SIZE) as u8,
                col: (index % BOARD_SIZE) as u8,
            })
        } else {
            None
        }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}
