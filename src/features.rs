use serde::Serialize;

use crate::pose::{LandmarkIndex, PoseLandmarks};

/// ランドマーク一致時のゼロ除算回避用
const EPS: f32 = 1e-6;

/// approx_height_norm がこれ未満なら被写体が切れている可能性が高い
const CROPPED_HEIGHT_NORM: f32 = 0.45;
/// 切れている場合の品質ペナルティ係数
const CROPPED_QUALITY_PENALTY: f32 = 0.6;
/// 可視度データが無い場合の固定品質スコア
const NO_VISIBILITY_QUALITY: f32 = 0.6;
/// 主要ランドマーク平均可視度の警告閾値
const LOW_VISIBILITY_THRESHOLD: f32 = 0.5;

/// 姿勢から計算したスケール不変な幾何比率
///
/// カメラ距離・解像度に依存しない。approx_height_norm だけは比率ではなく
/// 正規化された見かけの身長で、フレーミング（切れ）の検出にのみ使う。
///
/// 注意: これらは周囲長の直接計測ではない。服装・カメラ角度・姿勢で
/// 大きな誤差が入りうる。
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureSet {
    pub shoulder_to_hip_ratio: f32,
    pub trunk_to_leg_ratio: f32,
    pub hip_to_height_ratio: f32,
    pub shoulder_to_height_ratio: f32,
    pub trunk_to_height_ratio: f32,
    pub approx_height_norm: f32,
}

/// ランドマーク幾何から6つの特徴量を計算
pub fn compute_features(pose: &PoseLandmarks) -> FeatureSet {
    let ls = pose.get(LandmarkIndex::LeftShoulder);
    let rs = pose.get(LandmarkIndex::RightShoulder);
    let lh = pose.get(LandmarkIndex::LeftHip);
    let rh = pose.get(LandmarkIndex::RightHip);
    let la = pose.get(LandmarkIndex::LeftAnkle);
    let ra = pose.get(LandmarkIndex::RightAnkle);
    let nose = pose.get(LandmarkIndex::Nose);

    let shoulder_w = ls.dist(&rs);
    let hip_w = lh.dist(&rh);
    let trunk_len = ls.mid(&rs).dist(&lh.mid(&rh));
    let leg_len = lh.mid(&rh).dist(&la.mid(&ra));
    let approx_height = nose.dist(&la.mid(&ra));

    FeatureSet {
        shoulder_to_hip_ratio: shoulder_w / (hip_w + EPS),
        trunk_to_leg_ratio: trunk_len / (leg_len + EPS),
        hip_to_height_ratio: hip_w / (approx_height + EPS),
        shoulder_to_height_ratio: shoulder_w / (approx_height + EPS),
        trunk_to_height_ratio: trunk_len / (approx_height + EPS),
        approx_height_norm: approx_height,
    }
}

/// 姿勢品質ヒューリスティック
///
/// 戻り値: (品質スコア 0.0〜1.0, 注記)
///
/// - 可視度データが無い → 固定の中間スコア + 注記
/// - 主要6ランドマーク（両肩・両腰・両足首）の平均可視度をスコアとする
/// - 見かけの身長が低すぎる（切れている疑い）→ 注記 + スコアに強いペナルティ
pub fn quality_heuristic(pose: &PoseLandmarks) -> (f32, Vec<String>) {
    let mut notes: Vec<String> = Vec::new();

    if !pose.has_visibility() {
        return (
            NO_VISIBILITY_QUALITY,
            vec!["No landmark visibility provided; quality degraded.".to_string()],
        );
    }

    let mut sum = 0.0f32;
    for idx in LandmarkIndex::KEY_LANDMARKS {
        // has_visibility確認済みなので必ずSome
        sum += pose.visibility_of(idx).unwrap_or(0.0);
    }
    let key_vis = sum / LandmarkIndex::KEY_LANDMARKS.len() as f32;

    let mut q = key_vis.clamp(0.0, 1.0);
    if q < LOW_VISIBILITY_THRESHOLD {
        notes.push(
            "Low landmark visibility; ensure full-body photo with good lighting.".to_string(),
        );
    }

    let feats = compute_features(pose);
    if feats.approx_height_norm < CROPPED_HEIGHT_NORM {
        notes.push("Subject appears cropped; include full body head-to-feet.".to_string());
        q *= CROPPED_QUALITY_PENALTY;
    }

    (q, notes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::Point2;

    /// 直立した典型的な全身ポーズ
    fn upright_landmarks() -> [Point2; LandmarkIndex::COUNT] {
        let mut points = [Point2::new(0.5, 0.5); LandmarkIndex::COUNT];
        points[LandmarkIndex::Nose as usize] = Point2::new(0.5, 0.1);
        points[LandmarkIndex::LeftShoulder as usize] = Point2::new(0.4, 0.3);
        points[LandmarkIndex::RightShoulder as usize] = Point2::new(0.6, 0.3);
        points[LandmarkIndex::LeftHip as usize] = Point2::new(0.45, 0.55);
        points[LandmarkIndex::RightHip as usize] = Point2::new(0.55, 0.55);
        points[LandmarkIndex::LeftAnkle as usize] = Point2::new(0.47, 0.95);
        points[LandmarkIndex::RightAnkle as usize] = Point2::new(0.53, 0.95);
        points
    }

    #[test]
    fn test_compute_features_upright() {
        let pose = PoseLandmarks::new(upright_landmarks());
        let f = compute_features(&pose);

        // shoulder_w=0.2, hip_w=0.1, trunk=0.25, leg=0.4, height=0.85
        assert!((f.shoulder_to_hip_ratio - 2.0).abs() < 1e-3);
        assert!((f.trunk_to_leg_ratio - 0.625).abs() < 1e-3);
        assert!((f.hip_to_height_ratio - 0.1176).abs() < 1e-3);
        assert!((f.approx_height_norm - 0.85).abs() < 1e-3);
    }

    #[test]
    fn test_features_finite_when_landmarks_coincide() {
        // 全ランドマークが同一点でもNaN/Infは出ない
        let points = [Point2::new(0.5, 0.5); LandmarkIndex::COUNT];
        let pose = PoseLandmarks::new(points);
        let f = compute_features(&pose);

        for v in [
            f.shoulder_to_hip_ratio,
            f.trunk_to_leg_ratio,
            f.hip_to_height_ratio,
            f.shoulder_to_height_ratio,
            f.trunk_to_height_ratio,
            f.approx_height_norm,
        ] {
            assert!(v.is_finite(), "expected finite, got {}", v);
            assert!(v >= 0.0, "expected non-negative, got {}", v);
        }
    }

    #[test]
    fn test_quality_no_visibility() {
        let pose = PoseLandmarks::new(upright_landmarks());
        let (q, notes) = quality_heuristic(&pose);
        assert!((q - 0.6).abs() < 1e-6);
        assert_eq!(notes.len(), 1);
        assert!(notes[0].contains("visibility"));
    }

    #[test]
    fn test_quality_full_visibility() {
        let vis = [1.0f32; LandmarkIndex::COUNT];
        let pose = PoseLandmarks::with_visibility(upright_landmarks(), vis);
        let (q, notes) = quality_heuristic(&pose);
        assert!((q - 1.0).abs() < 1e-6);
        assert!(notes.is_empty());
    }

    #[test]
    fn test_quality_low_visibility_note() {
        let vis = [0.1f32; LandmarkIndex::COUNT];
        let pose = PoseLandmarks::with_visibility(upright_landmarks(), vis);
        let (q, notes) = quality_heuristic(&pose);
        assert!((q - 0.1).abs() < 1e-6);
        assert!(notes.iter().any(|n| n.contains("Low landmark visibility")));
    }

    #[test]
    fn test_quality_cropped_penalty() {
        // 鼻と足首が近い = 見かけの身長が低い = 切れている疑い
        let mut points = upright_landmarks();
        points[LandmarkIndex::Nose as usize] = Point2::new(0.5, 0.6);
        points[LandmarkIndex::LeftAnkle as usize] = Point2::new(0.47, 0.9);
        points[LandmarkIndex::RightAnkle as usize] = Point2::new(0.53, 0.9);
        let vis = [1.0f32; LandmarkIndex::COUNT];
        let pose = PoseLandmarks::with_visibility(points, vis);

        let (q, notes) = quality_heuristic(&pose);
        assert!((q - 0.6).abs() < 1e-6, "expected 1.0 * 0.6 penalty, got {}", q);
        assert!(notes.iter().any(|n| n.contains("cropped")));
    }
}
