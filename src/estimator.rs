use anyhow::bail;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::features::{compute_features, quality_heuristic, FeatureSet};
use crate::pose::PoseLandmarks;

/// 自己申告された性別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Female,
    Male,
    #[default]
    Unknown,
}

impl FromStr for Sex {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "female" => Ok(Sex::Female),
            "male" => Ok(Sex::Male),
            "unknown" => Ok(Sex::Unknown),
            other => bail!("sex must be female|male|unknown, got: {}", other),
        }
    }
}

/// 自己申告メタデータ（すべて任意）
///
/// 欠けていてもエラーにはならない。不確実性が広がり注記が付くだけ。
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SubjectMetadata {
    #[serde(default)]
    pub sex: Sex,
    pub age_years: Option<f32>,
    pub height_cm: Option<f32>,
    pub weight_kg: Option<f32>,
}

/// 推定結果
///
/// 不変条件: low_percent <= body_fat_percent <= high_percent
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EstimateResult {
    /// 推定体脂肪率 (3.0〜60.0にクランプ)
    pub body_fat_percent: f32,
    pub low_percent: f32,
    pub high_percent: f32,
    /// 信頼度 (0.05〜0.85)
    pub confidence: f32,
    pub notes: Vec<String>,
    pub features: FeatureSet,
}

// 手調整の経験的係数。フィットされたモデル由来ではなく、検証もされていない。
// 将来は学習モデルに置き換える前提で、制御フローから分離してここに置く。

/// ベースライン（成人でありそうな中央値付近）
const BASE_BF: f32 = 22.0;
const HIP_HEIGHT_COEFF: f32 = 18.0;
const HIP_HEIGHT_CENTER: f32 = 0.18;
const TRUNK_LEG_COEFF: f32 = 10.0;
const TRUNK_LEG_CENTER: f32 = 0.60;
const SHOULDER_HIP_COEFF: f32 = 6.0;
const SHOULDER_HIP_CENTER: f32 = 1.10;

/// メタデータによる弱い補正
const FEMALE_NUDGE: f32 = 4.0;
const MALE_NUDGE: f32 = -2.0;
const AGE_COEFF: f32 = 0.05;
const AGE_CENTER: f32 = 30.0;

/// BMI系の弱い補正（Deurenberg風の線形式を軽くブレンドする）
const BMI_COEFF: f32 = 1.2;
const BMI_AGE_COEFF: f32 = 0.23;
const BMI_MALE_OFFSET: f32 = 10.8;
const BMI_BASE_OFFSET: f32 = 5.4;
const BMI_BLEND_WEIGHT: f32 = 0.25;

/// 推定値のクランプ範囲
const BF_MIN: f32 = 3.0;
const BF_MAX: f32 = 60.0;

/// 不確実性バンド
const BASE_WIDTH: f32 = 10.0;
const WIDTH_SEX_UNKNOWN: f32 = 3.0;
const WIDTH_AGE_MISSING: f32 = 2.0;
const WIDTH_BMI_SKIPPED: f32 = 2.5;
const WIDTH_POSE_QUALITY: f32 = 10.0;
// low/highの上限は60/65で非対称。仕様上の値で、揃えてはいけない。
const RANGE_FLOOR: f32 = 2.0;
const LOW_CEIL: f32 = 60.0;
const HIGH_CEIL: f32 = 65.0;

/// 信頼度
const CONF_BASE: f32 = 0.25;
const CONF_QUALITY_COEFF: f32 = 0.55;
const CONF_WIDTH_COEFF: f32 = 0.03;
const CONF_MIN: f32 = 0.05;
const CONF_MAX: f32 = 0.85;

const DISCLAIMER: &str = "Prototype estimate based on pose ratios; not validated for clinical use. Use as a rough screening/education aid only.";

/// 体脂肪率のヒューリスティック推定
///
/// 幾何比率 + 任意メタデータの手調整線形モデル。目標は臨床精度ではなく
/// 「もっともらしい推定値 + 正直に広い不確実性」。
///
/// 入力が有限であれば全域で定義され、決定的で副作用を持たない。
/// `quality_notes` は姿勢品質ヒューリスティックが集めた注記で、
/// 免責の注記を先頭に足した上で結果に含める。
pub fn estimate(
    features: &FeatureSet,
    pose_quality: f32,
    quality_notes: Vec<String>,
    meta: &SubjectMetadata,
) -> EstimateResult {
    let mut notes = quality_notes;

    let mut bf = BASE_BF;
    bf += HIP_HEIGHT_COEFF * (features.hip_to_height_ratio - HIP_HEIGHT_CENTER);
    bf += TRUNK_LEG_COEFF * (features.trunk_to_leg_ratio - TRUNK_LEG_CENTER);
    bf -= SHOULDER_HIP_COEFF * (features.shoulder_to_hip_ratio - SHOULDER_HIP_CENTER);

    match meta.sex {
        Sex::Female => bf += FEMALE_NUDGE,
        Sex::Male => bf += MALE_NUDGE,
        Sex::Unknown => notes.push("Sex not provided; uncertainty increased.".to_string()),
    }

    if let Some(age) = meta.age_years {
        bf += AGE_COEFF * (age - AGE_CENTER);
    } else {
        notes.push("Age not provided; uncertainty increased.".to_string());
    }

    // 身長+体重が揃っていればBMI経由の推定値を弱くブレンド
    let mut bmi = None;
    if let (Some(height_cm), Some(weight_kg)) = (meta.height_cm, meta.weight_kg) {
        let h_m = height_cm / 100.0;
        let b = weight_kg / (h_m * h_m);
        bmi = Some(b);

        let sex01 = if meta.sex == Sex::Male { 1.0 } else { 0.0 };
        let bf_bmi = BMI_COEFF * b + BMI_AGE_COEFF * meta.age_years.unwrap_or(AGE_CENTER)
            - BMI_MALE_OFFSET * sex01
            - BMI_BASE_OFFSET;
        bf = (1.0 - BMI_BLEND_WEIGHT) * bf + BMI_BLEND_WEIGHT * bf_bmi;
    } else {
        notes.push("Height/weight not provided; BMI blend skipped.".to_string());
    }

    let bf = bf.clamp(BF_MIN, BF_MAX);

    // 不確実性: 意図的に広い。欠けた情報と低い姿勢品質で広げる。
    let mut width = BASE_WIDTH;
    if meta.sex == Sex::Unknown {
        width += WIDTH_SEX_UNKNOWN;
    }
    if meta.age_years.is_none() {
        width += WIDTH_AGE_MISSING;
    }
    if bmi.is_none() {
        width += WIDTH_BMI_SKIPPED;
    }
    width += (1.0 - pose_quality) * WIDTH_POSE_QUALITY;

    let low = (bf - width / 2.0).clamp(RANGE_FLOOR, LOW_CEIL);
    let high = (bf + width / 2.0).clamp(RANGE_FLOOR, HIGH_CEIL);

    let confidence = (CONF_BASE + CONF_QUALITY_COEFF * pose_quality
        - CONF_WIDTH_COEFF * (width - BASE_WIDTH))
        .clamp(CONF_MIN, CONF_MAX);

    notes.insert(0, DISCLAIMER.to_string());

    EstimateResult {
        body_fat_percent: bf,
        low_percent: low,
        high_percent: high,
        confidence,
        notes,
        features: *features,
    }
}

/// ランドマークから特徴量・姿勢品質を計算してそのまま推定する便宜関数
pub fn estimate_from_pose(pose: &PoseLandmarks, meta: &SubjectMetadata) -> EstimateResult {
    let features = compute_features(pose);
    let (pose_quality, notes) = quality_heuristic(pose);
    estimate(&features, pose_quality, notes, meta)
}
