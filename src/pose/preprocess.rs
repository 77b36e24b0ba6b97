use image::imageops::{self, FilterType};
use ndarray::Array4;

use crate::photo::Photo;

/// 姿勢ランドマークモデルの入力サイズ
pub const POSE_INPUT_SIZE: u32 = 256;

/// Photo を姿勢モデル用の入力テンソルに変換
///
/// - 256x256 にリサイズ
/// - [1, 256, 256, 3] の f32 テンソルに変換 (0.0〜1.0)
pub fn preprocess_for_pose(photo: &Photo) -> Array4<f32> {
    let resized = imageops::resize(
        photo.rgb(),
        POSE_INPUT_SIZE,
        POSE_INPUT_SIZE,
        FilterType::Triangle,
    );

    let size = POSE_INPUT_SIZE as usize;
    let mut tensor = Array4::<f32>::zeros((1, size, size, 3));

    for (x, y, pixel) in resized.enumerate_pixels() {
        let [r, g, b] = pixel.0;
        tensor[[0, y as usize, x as usize, 0]] = r as f32 / 255.0;
        tensor[[0, y as usize, x as usize, 1]] = g as f32 / 255.0;
        tensor[[0, y as usize, x as usize, 2]] = b as f32 / 255.0;
    }

    tensor
}
