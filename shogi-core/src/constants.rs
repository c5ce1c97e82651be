//! 规则常量定义

/// 棋盘边长（9x9）
pub const BOARD_SIZE: usize = 9;

/// 棋盘格子总数
pub const SQUARE_COUNT: usize = BOARD_SIZE * BOARD_SIZE;

/// 敌阵（升变区）深度：靠近对方的三行
pub const PROMOTION_ZONE_DEPTH: u8 = 3;

/// 千日手判定所需的同一局面出现次数
pub const REPETITION_LIMIT: u32 = 4;

/// 持将棋（入玉）默认判胜点数
pub const IMPASSE_THRESHOLD: u32 = 24;

/// 持将棋计点：飞车/角行（含龙王/龙马）
pub const IMPASSE_MAJOR_POINTS: u32 = 5;

/// 持将棋计点：其余棋子
pub const IMPASSE_MINOR_POINTS: u32 = 1;

/// 可以持在手中的棋子种类数
pub const HAND_KINDS: usize = 7;
