use ndarray::Array2;

use crate::config::QualityGateConfig;
use crate::photo::Photo;
use crate::pose::PoseLandmarks;

/// 品質ゲートの却下理由
///
/// ユーザーが対処できる具体的な理由のみ。汎用の失敗コードは返さない。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    TooDark,
    TooBright,
    TooBlurry,
    SubjectTooSmall,
}

impl RejectReason {
    /// サービス層へ返す安定した理由コード
    pub fn code(&self) -> &'static str {
        match self {
            Self::TooDark => "too_dark",
            Self::TooBright => "too_bright",
            Self::TooBlurry => "too_blurry",
            Self::SubjectTooSmall => "subject_too_small",
        }
    }

    /// ユーザー向けメッセージ
    pub fn message(&self) -> &'static str {
        match self {
            Self::TooDark => "Image too dark. Face the light or increase lighting and try again.",
            Self::TooBright => {
                "Image overexposed (too much light). Move away from direct light and try again."
            }
            Self::TooBlurry => {
                "Image blurry. Steady the phone, use a timer, and try again."
            }
            Self::SubjectTooSmall => {
                "Subject too small in the frame. Move closer and keep the full body visible (head to feet)."
            }
        }
    }
}

/// 品質ゲートの判定結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateResult {
    Pass,
    Reject(RejectReason),
}

impl GateResult {
    pub fn is_pass(&self) -> bool {
        matches!(self, GateResult::Pass)
    }
}

/// 明るさスコア（グレースケール平均）
pub fn brightness_score(photo: &Photo) -> f32 {
    gray_mean(&photo.to_gray())
}

/// ブラースコア（4近傍ラプラシアンの分散）
///
/// 分散が大きいほどエッジが鮮明。0付近はブラーまたは平坦な画像。
pub fn blur_score(photo: &Photo) -> f32 {
    laplacian_variance(&photo.to_gray())
}

fn gray_mean(gray: &Array2<f32>) -> f32 {
    let n = gray.len();
    if n == 0 {
        return 0.0;
    }
    let sum: f64 = gray.iter().map(|&v| v as f64).sum();
    (sum / n as f64) as f32
}

/// 4近傍ラプラシアン（中心-4、上下左右+1、境界はラップアラウンド）の分散
fn laplacian_variance(gray: &Array2<f32>) -> f32 {
    let (h, w) = gray.dim();
    if h == 0 || w == 0 {
        return 0.0;
    }

    let mut sum = 0.0f64;
    let mut sum_sq = 0.0f64;
    for y in 0..h {
        let up = if y == 0 { h - 1 } else { y - 1 };
        let down = if y + 1 == h { 0 } else { y + 1 };
        for x in 0..w {
            let left = if x == 0 { w - 1 } else { x - 1 };
            let right = if x + 1 == w { 0 } else { x + 1 };
            let lap = (-4.0 * gray[[y, x]]
                + gray[[up, x]]
                + gray[[down, x]]
                + gray[[y, left]]
                + gray[[y, right]]) as f64;
            sum += lap;
            sum_sq += lap * lap;
        }
    }

    let n = (h * w) as f64;
    let mean = sum / n;
    ((sum_sq / n) - mean * mean).max(0.0) as f32
}

/// 全ランドマークの正規化バウンディングボックス (xmin, ymin, xmax, ymax)
///
/// 座標は[0,1]にクランプする。
pub fn landmark_bbox(landmarks: &PoseLandmarks) -> (f32, f32, f32, f32) {
    let mut xmin = f32::MAX;
    let mut ymin = f32::MAX;
    let mut xmax = f32::MIN;
    let mut ymax = f32::MIN;

    for p in landmarks.points() {
        xmin = xmin.min(p.x);
        ymin = ymin.min(p.y);
        xmax = xmax.max(p.x);
        ymax = ymax.max(p.y);
    }

    (
        xmin.clamp(0.0, 1.0),
        ymin.clamp(0.0, 1.0),
        xmax.clamp(0.0, 1.0),
        ymax.clamp(0.0, 1.0),
    )
}

/// ピクセルのみのゲート（姿勢推定の前に評価する）
///
/// 順序: 暗すぎ → 明るすぎ → ブラー。最初に違反したゲートで打ち切る。
pub fn check_pixels(photo: &Photo, gates: &QualityGateConfig) -> GateResult {
    let gray = photo.to_gray();

    let brightness = gray_mean(&gray);
    if brightness < gates.min_brightness {
        return GateResult::Reject(RejectReason::TooDark);
    }
    if brightness > gates.max_brightness {
        return GateResult::Reject(RejectReason::TooBright);
    }

    if laplacian_variance(&gray) < gates.min_laplacian_var {
        return GateResult::Reject(RejectReason::TooBlurry);
    }

    GateResult::Pass
}

/// フレーミングゲート（姿勢推定の後に評価する）
///
/// ランドマークのバウンディングボックスが小さすぎる場合に却下する。
/// 正規化面積と、短辺のピクセル比（画像の短辺に対する）の両方を見る。
pub fn check_framing(
    width: u32,
    height: u32,
    landmarks: &PoseLandmarks,
    gates: &QualityGateConfig,
) -> GateResult {
    let (xmin, ymin, xmax, ymax) = landmark_bbox(landmarks);
    let bw = (xmax - xmin).max(0.0);
    let bh = (ymax - ymin).max(0.0);

    let area_ratio = bw * bh;
    let w = width as f32;
    let h = height as f32;
    let min_side_ratio = (bw * w).min(bh * h) / w.min(h).max(1.0);

    if area_ratio < gates.min_bbox_area_ratio || min_side_ratio < gates.min_bbox_min_side_ratio {
        return GateResult::Reject(RejectReason::SubjectTooSmall);
    }

    GateResult::Pass
}

/// 全ゲートを順に適用
///
/// ランドマークが無い段階ではピクセルゲートのみ。
pub fn check(
    photo: &Photo,
    landmarks: Option<&PoseLandmarks>,
    gates: &QualityGateConfig,
) -> GateResult {
    let result = check_pixels(photo, gates);
    if !result.is_pass() {
        return result;
    }

    if let Some(lm) = landmarks {
        return check_framing(photo.width(), photo.height(), lm, gates);
    }

    GateResult::Pass
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::{LandmarkIndex, Point2};
    use image::RgbImage;

    fn uniform_photo(v: u8) -> Photo {
        Photo::from_rgb(RgbImage::from_pixel(32, 32, image::Rgb([v, v, v])))
    }

    /// 市松模様（鮮明でコントラストのある画像）
    fn checkerboard_photo() -> Photo {
        let rgb = RgbImage::from_fn(32, 32, |x, y| {
            if (x + y) % 2 == 0 {
                image::Rgb([30, 30, 30])
            } else {
                image::Rgb([230, 230, 230])
            }
        });
        Photo::from_rgb(rgb)
    }

    /// 全ランドマークをフレーム全体に広げる
    fn full_frame_landmarks() -> PoseLandmarks {
        let mut points = [Point2::new(0.5, 0.5); LandmarkIndex::COUNT];
        points[LandmarkIndex::Nose as usize] = Point2::new(0.5, 0.05);
        points[LandmarkIndex::LeftAnkle as usize] = Point2::new(0.3, 0.95);
        points[LandmarkIndex::RightAnkle as usize] = Point2::new(0.7, 0.95);
        PoseLandmarks::new(points)
    }

    #[test]
    fn test_black_image_too_dark() {
        let photo = uniform_photo(0);
        let result = check_pixels(&photo, &QualityGateConfig::default());
        assert_eq!(result, GateResult::Reject(RejectReason::TooDark));
    }

    #[test]
    fn test_white_image_too_bright() {
        let photo = uniform_photo(255);
        let result = check_pixels(&photo, &QualityGateConfig::default());
        assert_eq!(result, GateResult::Reject(RejectReason::TooBright));
    }

    #[test]
    fn test_flat_image_too_blurry() {
        // 中間輝度の平坦画像: 明るさは通るがラプラシアン分散が0
        let photo = uniform_photo(128);
        let result = check_pixels(&photo, &QualityGateConfig::default());
        assert_eq!(result, GateResult::Reject(RejectReason::TooBlurry));
    }

    #[test]
    fn test_dark_and_blurry_reports_dark_first() {
        // 暗くてブラーな画像 → 明るさゲートが先に効く
        let photo = uniform_photo(10);
        assert!(blur_score(&photo) < 60.0);
        let result = check_pixels(&photo, &QualityGateConfig::default());
        assert_eq!(result, GateResult::Reject(RejectReason::TooDark));
    }

    #[test]
    fn test_sharp_image_passes_pixel_gates() {
        let photo = checkerboard_photo();
        let result = check_pixels(&photo, &QualityGateConfig::default());
        assert_eq!(result, GateResult::Pass);
    }

    #[test]
    fn test_brightness_score_uniform() {
        let photo = uniform_photo(100);
        assert!((brightness_score(&photo) - 100.0).abs() < 0.5);
    }

    #[test]
    fn test_blur_score_flat_is_zero() {
        let photo = uniform_photo(128);
        assert!(blur_score(&photo) < 1e-3);
    }

    #[test]
    fn test_landmark_bbox_clamped() {
        let mut points = [Point2::new(0.5, 0.5); LandmarkIndex::COUNT];
        // フレーム外のランドマークは[0,1]にクランプされる
        points[0] = Point2::new(-0.2, 1.4);
        let pose = PoseLandmarks::new(points);
        let (xmin, _ymin, _xmax, ymax) = landmark_bbox(&pose);
        assert_eq!(xmin, 0.0);
        assert_eq!(ymax, 1.0);
    }

    #[test]
    fn test_framing_subject_too_small() {
        // 全ランドマークがフレーム中央の一点付近に集中
        let points = [Point2::new(0.5, 0.5); LandmarkIndex::COUNT];
        let pose = PoseLandmarks::new(points);
        let result = check_framing(640, 480, &pose, &QualityGateConfig::default());
        assert_eq!(result, GateResult::Reject(RejectReason::SubjectTooSmall));
    }

    #[test]
    fn test_framing_full_body_passes() {
        let pose = full_frame_landmarks();
        let result = check_framing(640, 480, &pose, &QualityGateConfig::default());
        assert_eq!(result, GateResult::Pass);
    }

    #[test]
    fn test_check_with_landmarks_runs_framing() {
        let photo = checkerboard_photo();
        let points = [Point2::new(0.5, 0.5); LandmarkIndex::COUNT];
        let pose = PoseLandmarks::new(points);
        let result = check(&photo, Some(&pose), &QualityGateConfig::default());
        assert_eq!(result, GateResult::Reject(RejectReason::SubjectTooSmall));
    }

    #[test]
    fn test_check_pixel_gate_precedes_framing() {
        // 暗い画像はランドマーク付きでも暗さが先に報告される
        let photo = uniform_photo(0);
        let points = [Point2::new(0.5, 0.5); LandmarkIndex::COUNT];
        let pose = PoseLandmarks::new(points);
        let result = check(&photo, Some(&pose), &QualityGateConfig::default());
        assert_eq!(result, GateResult::Reject(RejectReason::TooDark));
    }
}
