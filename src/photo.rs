use anyhow::{Context, Result};
use image::RgbImage;
use ndarray::Array2;
use std::path::Path;

/// デコード済みのRGB写真
///
/// アップロードされたバイト列をデコードして保持する。
/// 品質ゲート・姿勢推定の入力はすべてこの型を経由する。
pub struct Photo {
    rgb: RgbImage,
}

impl Photo {
    /// エンコード済みバイト列（JPEG/PNGなど）からデコード
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.is_empty() {
            anyhow::bail!("Empty image upload");
        }
        let decoded = image::load_from_memory(bytes).context("Failed to decode image")?;
        Ok(Self {
            rgb: decoded.to_rgb8(),
        })
    }

    /// ファイルから読み込み
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())
            .with_context(|| format!("Failed to read image file: {}", path.as_ref().display()))?;
        Self::from_bytes(&bytes)
    }

    pub fn from_rgb(rgb: RgbImage) -> Self {
        Self { rgb }
    }

    pub fn width(&self) -> u32 {
        self.rgb.width()
    }

    pub fn height(&self) -> u32 {
        self.rgb.height()
    }

    pub fn rgb(&self) -> &RgbImage {
        &self.rgb
    }

    /// グレースケール変換 (輝度重み 0.299/0.587/0.114)
    ///
    /// 品質ゲートの明るさ・ブラー判定で共用する。
    pub fn to_gray(&self) -> Array2<f32> {
        let (w, h) = (self.rgb.width() as usize, self.rgb.height() as usize);
        let mut gray = Array2::<f32>::zeros((h, w));
        for (x, y, pixel) in self.rgb.enumerate_pixels() {
            let [r, g, b] = pixel.0;
            gray[[y as usize, x as usize]] =
                0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
        }
        gray
    }
}
