use anyhow::{Context, Result};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Tensor;
use std::path::Path;

use super::landmark::{LandmarkIndex, Point2, PoseLandmarks};
use super::preprocess::{preprocess_for_pose, POSE_INPUT_SIZE};
use crate::config::PoseConfig;
use crate::photo::Photo;

/// 姿勢ランドマークの供給者
///
/// 人物・姿勢が確信を持って検出できない場合は Ok(None) を返す
/// （エラーにしない）。テストではスタブ実装に差し替えられる。
pub trait PoseProvider {
    fn extract(&mut self, photo: &Photo) -> Result<Option<PoseLandmarks>>;
}

const INPUT_NAME: &str = "input";
const OUTPUT_LANDMARKS: &str = "Identity";
const OUTPUT_PRESENCE: &str = "Identity_1";

/// ONNX姿勢ランドマークモデルを使う供給者
///
/// セッションは構築時に一度だけ読み込み、呼び出し間で使い回す。
/// 内部状態を持つため、1インスタンスを並行呼び出ししてはいけない。
pub struct OnnxPoseProvider {
    session: Session,
    min_presence: f32,
}

impl OnnxPoseProvider {
    /// ONNXモデルを読み込んで初期化
    pub fn new<P: AsRef<Path>>(model_path: P, min_presence: f32) -> Result<Self> {
        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .commit_from_file(model_path.as_ref())
            .context("Failed to load ONNX pose model")?;

        Ok(Self {
            session,
            min_presence,
        })
    }

    pub fn from_config(config: &PoseConfig) -> Result<Self> {
        Self::new(&config.model_path, config.min_presence)
    }
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

impl PoseProvider for OnnxPoseProvider {
    /// 写真から姿勢を検出
    ///
    /// 入力: [1, 256, 256, 3] の f32 テンソル
    /// 出力: 33ランドマーク（正規化座標 + 可視度）、検出スコアが低ければ None
    fn extract(&mut self, photo: &Photo) -> Result<Option<PoseLandmarks>> {
        let input = preprocess_for_pose(photo);
        let input_tensor = Tensor::from_array(input)?;
        let outputs = self
            .session
            .run(ort::inputs![INPUT_NAME => input_tensor])
            .context("Pose inference failed")?;

        // 人物検出スコア (ロジット)
        let presence: ndarray::ArrayViewD<f32> = outputs[OUTPUT_PRESENCE]
            .try_extract_array()
            .context("Failed to extract presence output")?;
        let logit = presence
            .iter()
            .copied()
            .next()
            .context("Empty presence output")?;
        if sigmoid(logit) < self.min_presence {
            return Ok(None);
        }

        // ランドマーク出力は [1, 195] (33点 × x, y, z, visibility, presence)
        // x, y は入力テンソルのピクセル座標なので正規化する
        let output: ndarray::ArrayViewD<f32> = outputs[OUTPUT_LANDMARKS]
            .try_extract_array()
            .context("Failed to extract landmark output")?;
        let flat: Vec<f32> = output.iter().copied().collect();
        if flat.len() < LandmarkIndex::COUNT * 5 {
            anyhow::bail!(
                "Unexpected landmark output size: {} (want at least {})",
                flat.len(),
                LandmarkIndex::COUNT * 5
            );
        }

        let scale = POSE_INPUT_SIZE as f32;
        let mut points = [Point2::default(); LandmarkIndex::COUNT];
        let mut visibility = [0.0f32; LandmarkIndex::COUNT];
        for i in 0..LandmarkIndex::COUNT {
            let base = i * 5;
            points[i] = Point2::new(flat[base] / scale, flat[base + 1] / scale);
            visibility[i] = sigmoid(flat[base + 3]);
        }

        Ok(Some(PoseLandmarks::with_visibility(points, visibility)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sigmoid_bounds() {
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-6);
        assert!(sigmoid(10.0) > 0.99);
        assert!(sigmoid(-10.0) < 0.01);
    }
}
