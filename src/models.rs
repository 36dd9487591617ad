use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub const INDICATORS_PER_MODE: usize = 10;
pub const DESCRIPTION_MAX_CHARS: usize = 60;
pub const NOTE_MAX_CHARS: usize = 160;
pub const DEFAULT_SCORE: i32 = 70;
pub const DEFAULT_DESCRIPTION: &str = "數值越高代表狀態越佳";
pub const DEFAULT_NOTE: &str = "綜合評估結果僅供參考";

const HEALTH_INDICATORS: [&str; INDICATORS_PER_MODE] = [
    "心肺功能",
    "代謝效率",
    "體脂控制",
    "肌肉品質",
    "姿勢穩定",
    "疲勞指數",
    "恢復能力",
    "壓力負荷",
    "循環效率",
    "老化速度",
];

const SKIN_INDICATORS: [&str; INDICATORS_PER_MODE] = [
    "皮膚水合",
    "油脂平衡",
    "毛孔狀態",
    "膚色均勻",
    "色素沉積",
    "彈性緊實",
    "細紋風險",
    "屏障強度",
    "光澤度",
    "老化表徵",
];

const FORTUNE_INDICATORS: [&str; INDICATORS_PER_MODE] = [
    "財運能量",
    "事業強度",
    "決策能力",
    "機會敏感",
    "貴人運",
    "穩定性",
    "抗壓性",
    "行動力",
    "領導能量",
    "人生曲線",
];

const PSY_INDICATORS: [&str; INDICATORS_PER_MODE] = [
    "專注力",
    "情緒穩定",
    "壓力承受",
    "溝通能力",
    "社交能量",
    "信任傾向",
    "理性程度",
    "決策穩定",
    "心理韌性",
    "關係品質",
];

#[derive(Debug, Error)]
#[error("unknown analysis mode: {0} (expected health, skin, fortune or psy)")]
pub struct UnknownMode(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Health,
    Skin,
    Fortune,
    Psy,
}

impl Mode {
    pub const ALL: [Mode; 4] = [Mode::Health, Mode::Skin, Mode::Fortune, Mode::Psy];

    pub fn key(&self) -> &'static str {
        match self {
            Mode::Health => "health",
            Mode::Skin => "skin",
            Mode::Fortune => "fortune",
            Mode::Psy => "psy",
        }
    }

    /// The ten indicator names for this mode, in report order.
    pub fn indicators(&self) -> &'static [&'static str; INDICATORS_PER_MODE] {
        match self {
            Mode::Health => &HEALTH_INDICATORS,
            Mode::Skin => &SKIN_INDICATORS,
            Mode::Fortune => &FORTUNE_INDICATORS,
            Mode::Psy => &PSY_INDICATORS,
        }
    }
}

impl FromStr for Mode {
    type Err = UnknownMode;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "health" => Ok(Mode::Health),
            "skin" => Ok(Mode::Skin),
            // older intake forms sent "face" for the fortune mode
            "fortune" | "face" => Ok(Mode::Fortune),
            "psy" => Ok(Mode::Psy),
            other => Err(UnknownMode(other.to_string())),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
}

impl Grade {
    pub fn from_score(score: i32) -> Grade {
        if score >= 85 {
            Grade::A
        } else if score >= 70 {
            Grade::B
        } else if score >= 55 {
            Grade::C
        } else {
            Grade::D
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
        };
        f.write_str(letter)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorScore {
    pub name: String,
    pub score: i32,
    pub grade: Grade,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub overall: i32,
    pub items: Vec<IndicatorScore>,
    pub note: String,
}

#[derive(Debug, Clone)]
pub struct AnalysisRecord {
    pub id: Uuid,
    pub user_id: String,
    pub mode: Mode,
    pub created_at: DateTime<Utc>,
    pub overall: i32,
    pub items: Vec<IndicatorScore>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorDelta {
    pub name: String,
    pub score: i32,
    pub previous: Option<i32>,
    pub delta: Option<i32>,
}

pub fn rounded_mean(items: &[IndicatorScore]) -> i32 {
    if items.is_empty() {
        return 0;
    }
    let sum: i32 = items.iter().map(|item| item.score).sum();
    (f64::from(sum) / items.len() as f64).round() as i32
}
