use anyhow::Result;

use crate::config::Config;
use crate::estimator::{estimate, EstimateResult, SubjectMetadata};
use crate::features::{compute_features, quality_heuristic};
use crate::photo::Photo;
use crate::pose::PoseProvider;
use crate::quality::{check_framing, check_pixels, GateResult, RejectReason};

/// 人物が検出できなかった場合のユーザー向けメッセージ
pub const NO_POSE_MESSAGE: &str = "No pose detected. Use a clear, well-lit full-body photo (head-to-feet), standing upright, minimal occlusion.";

/// 1リクエスト分の処理結果
///
/// すべて回復可能。サービス層がクライアント向けレスポンスに変換する。
#[derive(Debug, Clone)]
pub enum EstimateOutcome {
    /// 品質ゲートで却下（推定は行っていない）
    Rejected(RejectReason),
    /// 人物が検出できなかった
    NoPoseDetected,
    /// 推定成功
    Estimated(EstimateResult),
}

/// 写真1枚の推定フロー
///
/// ピクセルゲート → 姿勢推定 → フレーミングゲート → 特徴量・品質 → 推定。
/// 姿勢推定は高コストなので、ピクセルゲートで弾ける画像には実行しない。
pub fn run(
    photo: &Photo,
    provider: &mut dyn PoseProvider,
    meta: &SubjectMetadata,
    config: &Config,
) -> Result<EstimateOutcome> {
    if let GateResult::Reject(reason) = check_pixels(photo, &config.quality) {
        return Ok(EstimateOutcome::Rejected(reason));
    }

    let Some(landmarks) = provider.extract(photo)? else {
        return Ok(EstimateOutcome::NoPoseDetected);
    };

    if let GateResult::Reject(reason) =
        check_framing(photo.width(), photo.height(), &landmarks, &config.quality)
    {
        return Ok(EstimateOutcome::Rejected(reason));
    }

    let features = compute_features(&landmarks);
    let (pose_quality, notes) = quality_heuristic(&landmarks);
    Ok(EstimateOutcome::Estimated(estimate(
        &features,
        pose_quality,
        notes,
        meta,
    )))
}
