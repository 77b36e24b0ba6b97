/// MediaPipe Pose の 33 ランドマークインデックス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum LandmarkIndex {
    Nose = 0,
    LeftEyeInner = 1,
    LeftEye = 2,
    LeftEyeOuter = 3,
    RightEyeInner = 4,
    RightEye = 5,
    RightEyeOuter = 6,
    LeftEar = 7,
    RightEar = 8,
    MouthLeft = 9,
    MouthRight = 10,
    LeftShoulder = 11,
    RightShoulder = 12,
    LeftElbow = 13,
    RightElbow = 14,
    LeftWrist = 15,
    RightWrist = 16,
    LeftPinky = 17,
    RightPinky = 18,
    LeftIndex = 19,
    RightIndex = 20,
    LeftThumb = 21,
    RightThumb = 22,
    LeftHip = 23,
    RightHip = 24,
    LeftKnee = 25,
    RightKnee = 26,
    LeftAnkle = 27,
    RightAnkle = 28,
    LeftHeel = 29,
    RightHeel = 30,
    LeftFootIndex = 31,
    RightFootIndex = 32,
}

impl LandmarkIndex {
    pub const COUNT: usize = 33;

    /// 特徴量・品質計算で使う主要ランドマーク（両肩・両腰・両足首）
    pub const KEY_LANDMARKS: [LandmarkIndex; 6] = [
        LandmarkIndex::LeftShoulder,
        LandmarkIndex::RightShoulder,
        LandmarkIndex::LeftHip,
        LandmarkIndex::RightHip,
        LandmarkIndex::LeftAnkle,
        LandmarkIndex::RightAnkle,
    ];
}

/// 正規化画像座標上の2D点 (0.0〜1.0)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point2 {
    pub x: f32,
    pub y: f32,
}

impl Point2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// ユークリッド距離
    pub fn dist(&self, other: &Point2) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// 2点の中点
    pub fn mid(&self, other: &Point2) -> Point2 {
        Point2::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

impl Default for Point2 {
    fn default() -> Self {
        Self { x: 0.0, y: 0.0 }
    }
}

/// 33ランドマークからなる姿勢（可視度はモデルによっては無い）
#[derive(Debug, Clone)]
pub struct PoseLandmarks {
    points: [Point2; LandmarkIndex::COUNT],
    visibility: Option<[f32; LandmarkIndex::COUNT]>,
}

impl PoseLandmarks {
    pub fn new(points: [Point2; LandmarkIndex::COUNT]) -> Self {
        Self {
            points,
            visibility: None,
        }
    }

    pub fn with_visibility(
        points: [Point2; LandmarkIndex::COUNT],
        visibility: [f32; LandmarkIndex::COUNT],
    ) -> Self {
        Self {
            points,
            visibility: Some(visibility),
        }
    }

    /// 可変長スライスから構築（長さ不一致はプログラマエラーとして即panic）
    pub fn from_slices(points: &[Point2], visibility: Option<&[f32]>) -> Self {
        assert_eq!(
            points.len(),
            LandmarkIndex::COUNT,
            "PoseLandmarks requires exactly {} points, got {}",
            LandmarkIndex::COUNT,
            points.len()
        );
        let mut pts = [Point2::default(); LandmarkIndex::COUNT];
        pts.copy_from_slice(points);

        let vis = visibility.map(|v| {
            assert_eq!(
                v.len(),
                LandmarkIndex::COUNT,
                "visibility requires exactly {} values, got {}",
                LandmarkIndex::COUNT,
                v.len()
            );
            let mut arr = [0.0f32; LandmarkIndex::COUNT];
            arr.copy_from_slice(v);
            arr
        });

        Self {
            points: pts,
            visibility: vis,
        }
    }

    /// インデックスでランドマーク座標を取得
    pub fn get(&self, index: LandmarkIndex) -> Point2 {
        self.points[index as usize]
    }

    pub fn points(&self) -> &[Point2; LandmarkIndex::COUNT] {
        &self.points
    }

    pub fn has_visibility(&self) -> bool {
        self.visibility.is_some()
    }

    /// 指定ランドマークの可視度（可視度データが無ければNone）
    pub fn visibility_of(&self, index: LandmarkIndex) -> Option<f32> {
        self.visibility.map(|v| v[index as usize])
    }
}
