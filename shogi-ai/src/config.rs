//! 引擎配置
//!
//! 以 JSON 文件保存难度和可选的覆盖参数。

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::analysis::QualityThresholds;
use crate::search::{Difficulty, SearchSettings};

/// 引擎配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// 难度
    pub difficulty: Difficulty,
    /// 覆盖难度对应的搜索深度
    pub max_depth: Option<u8>,
    /// 覆盖难度对应的时间限制
    pub time_limit_ms: Option<u64>,
    /// 覆盖难度对应的随机性
    pub randomness: Option<f64>,
    /// 候选走法数量
    pub multi_pv: usize,
    /// 随机数种子
    pub seed: Option<u64>,
    /// 走法质量分界
    pub thresholds: QualityThresholds,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::Medium,
            max_depth: None,
            time_limit_ms: None,
            randomness: None,
            multi_pv: 1,
            seed: None,
            thresholds: QualityThresholds::default(),
        }
    }
}

impl EngineConfig {
    /// 从文件加载配置，失败时使用默认配置
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            tracing::info!("配置文件不存在，使用默认配置: {:?}", path);
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match Self::from_json(&content) {
                Ok(config) => {
                    tracing::info!("已加载配置: {:?}", path);
                    config
                }
                Err(e) => {
                    tracing::warn!("配置文件格式无效: {:#}，使用默认配置", e);
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!("无法读取配置文件: {}，使用默认配置", e);
                Self::default()
            }
        }
    }

    /// 从 JSON 字符串解析
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("解析引擎配置失败")
    }

    /// 保存配置到文件
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("无法创建配置目录: {:?}", parent))?;
        }

        let content = serde_json::to_string_pretty(self).context("序列化引擎配置失败")?;
        std::fs::write(path, content).with_context(|| format!("写入配置文件失败: {:?}", path))?;

        tracing::info!("配置已保存: {:?}", path);
        Ok(())
    }

    /// 生成搜索参数
    pub fn search_settings(&self) -> SearchSettings {
        let base = SearchSettings::from_difficulty(self.difficulty);
        SearchSettings {
            max_depth: self.max_depth.unwrap_or(base.max_depth),
            time_limit_ms: self.time_limit_ms.unwrap_or(base.time_limit_ms),
            randomness: self.randomness.unwrap_or(base.randomness).clamp(0.0, 1.0),
            multi_pv: self.multi_pv.max(1),
            seed: self.seed,
            ..base
        }
    }
}
