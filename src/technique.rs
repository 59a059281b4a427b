use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::UnknownTechnique;

/// 技カタログのバージョン。ラベルの追加・削除・並べ替えをしたら上げる
pub const TECHNIQUE_CATALOG_VERSION: u32 = 1;

/// 分類対象の技ラベル
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Technique {
    OrthodoxStance,
    SouthpawStance,
    LeftJab,
    RightCross,
    LeftHook,
    RightHook,
    LeftUppercut,
    RightUppercut,
    LeftElbow,
    RightElbow,
    LeftKnee,
    RightKnee,
    LeftTeep,
    RightTeep,
    LeftRoundhouse,
    RightRoundhouse,
}

impl Technique {
    pub const COUNT: usize = 16;

    /// 標準カタログ順
    pub const ALL: [Technique; Self::COUNT] = [
        Technique::OrthodoxStance,
        Technique::SouthpawStance,
        Technique::LeftJab,
        Technique::RightCross,
        Technique::LeftHook,
        Technique::RightHook,
        Technique::LeftUppercut,
        Technique::RightUppercut,
        Technique::LeftElbow,
        Technique::RightElbow,
        Technique::LeftKnee,
        Technique::RightKnee,
        Technique::LeftTeep,
        Technique::RightTeep,
        Technique::LeftRoundhouse,
        Technique::RightRoundhouse,
    ];

    /// 学習データのディレクトリ名にもなるラベル
    pub fn as_str(&self) -> &'static str {
        match self {
            Technique::OrthodoxStance => "orthodox-stance",
            Technique::SouthpawStance => "southpaw-stance",
            Technique::LeftJab => "left-jab",
            Technique::RightCross => "right-cross",
            Technique::LeftHook => "left-hook",
            Technique::RightHook => "right-hook",
            Technique::LeftUppercut => "left-uppercut",
            Technique::RightUppercut => "right-uppercut",
            Technique::LeftElbow => "left-elbow",
            Technique::RightElbow => "right-elbow",
            Technique::LeftKnee => "left-knee",
            Technique::RightKnee => "right-knee",
            Technique::LeftTeep => "left-teep",
            Technique::RightTeep => "right-teep",
            Technique::LeftRoundhouse => "left-roundhouse",
            Technique::RightRoundhouse => "right-roundhouse",
        }
    }
}

impl fmt::Display for Technique {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Technique {
    type Err = UnknownTechnique;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Technique::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownTechnique(s.to_string()))
    }
}

/// 学習・分類で使う技の一覧（不変）。並び順が同点時の優先順位になる
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TechniqueCatalog {
    version: u32,
    techniques: Vec<Technique>,
}

impl TechniqueCatalog {
    /// 重複したラベルは最初の1つだけ残す
    pub fn new(version: u32, techniques: impl IntoIterator<Item = Technique>) -> Self {
        let mut unique: Vec<Technique> = Vec::new();
        for technique in techniques {
            if !unique.contains(&technique) {
                unique.push(technique);
            }
        }
        Self {
            version,
            techniques: unique,
        }
    }

    pub fn standard() -> Self {
        Self::new(TECHNIQUE_CATALOG_VERSION, Technique::ALL)
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn techniques(&self) -> &[Technique] {
        &self.techniques
    }

    pub fn len(&self) -> usize {
        self.techniques.len()
    }

    pub fn is_empty(&self) -> bool {
        self.techniques.is_empty()
    }

    pub fn contains(&self, technique: Technique) -> bool {
        self.techniques.contains(&technique)
    }

    pub fn position(&self, technique: Technique) -> Option<usize> {
        self.techniques.iter().position(|t| *t == technique)
    }
}

impl Default for TechniqueCatalog {
    fn default() -> Self {
        Self::standard()
    }
}
