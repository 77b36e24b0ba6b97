use anyhow::Result;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub quality: QualityGateConfig,
    #[serde(default)]
    pub pose: PoseConfig,
}

/// 品質ゲートの閾値
///
/// デフォルト値は意図的に保守的。却下する場合は必ず対処可能な
/// メッセージを返す（正しさの保証ではない）。
#[derive(Debug, Deserialize, Clone)]
pub struct QualityGateConfig {
    /// 明るさ下限（グレースケール平均）
    #[serde(default = "default_min_brightness")]
    pub min_brightness: f32,
    /// 明るさ上限
    #[serde(default = "default_max_brightness")]
    pub max_brightness: f32,
    /// ラプラシアン分散の下限（これ未満はブラー扱い）
    #[serde(default = "default_min_laplacian_var")]
    pub min_laplacian_var: f32,
    /// 被写体bboxの正規化面積の下限（画像の8%以上を占めること）
    #[serde(default = "default_min_bbox_area_ratio")]
    pub min_bbox_area_ratio: f32,
    /// 被写体bbox短辺の、画像短辺に対する比の下限
    #[serde(default = "default_min_bbox_min_side_ratio")]
    pub min_bbox_min_side_ratio: f32,
}

fn default_min_brightness() -> f32 { 55.0 }
fn default_max_brightness() -> f32 { 225.0 }
fn default_min_laplacian_var() -> f32 { 60.0 }
fn default_min_bbox_area_ratio() -> f32 { 0.08 }
fn default_min_bbox_min_side_ratio() -> f32 { 0.35 }

impl Default for QualityGateConfig {
    fn default() -> Self {
        Self {
            min_brightness: default_min_brightness(),
            max_brightness: default_max_brightness(),
            min_laplacian_var: default_min_laplacian_var(),
            min_bbox_area_ratio: default_min_bbox_area_ratio(),
            min_bbox_min_side_ratio: default_min_bbox_min_side_ratio(),
        }
    }
}

/// 姿勢推定モデルの設定
#[derive(Debug, Deserialize, Clone)]
pub struct PoseConfig {
    /// ONNXモデルのパス
    #[serde(default = "default_model_path")]
    pub model_path: String,
    /// 人物検出スコアの下限（これ未満は「検出なし」扱い）
    #[serde(default = "default_min_presence")]
    pub min_presence: f32,
}

fn default_model_path() -> String { "models/pose_landmark.onnx".to_string() }
fn default_min_presence() -> f32 { 0.5 }

impl Default for PoseConfig {
    fn default() -> Self {
        Self {
            model_path: default_model_path(),
            min_presence: default_min_presence(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// 設定ファイルが無い・壊れている場合はデフォルトで起動
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        Self::load(path).unwrap_or_default()
    }
}
