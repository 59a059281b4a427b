use serde::{Deserialize, Serialize};

use crate::error::PoseError;
use crate::vector::Vec3;

/// BlazePose の 33 ランドマークインデックス
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

    const ALL: [LandmarkIndex; Self::COUNT] = [
        Self::Nose,
        Self::LeftEyeInner,
        Self::LeftEye,
        Self::LeftEyeOuter,
        Self::RightEyeInner,
        Self::RightEye,
        Self::RightEyeOuter,
        Self::LeftEar,
        Self::RightEar,
        Self::MouthLeft,
        Self::MouthRight,
        Self::LeftShoulder,
        Self::RightShoulder,
        Self::LeftElbow,
        Self::RightElbow,
        Self::LeftWrist,
        Self::RightWrist,
        Self::LeftPinky,
        Self::RightPinky,
        Self::LeftIndex,
        Self::RightIndex,
        Self::LeftThumb,
        Self::RightThumb,
        Self::LeftHip,
        Self::RightHip,
        Self::LeftKnee,
        Self::RightKnee,
        Self::LeftAnkle,
        Self::RightAnkle,
        Self::LeftHeel,
        Self::RightHeel,
        Self::LeftFootIndex,
        Self::RightFootIndex,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

/// 単一ランドマーク
///
/// visibility / presence は検出器から渡されるが、角度計算では使わない
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presence: Option<f32>,
}

impl Landmark {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            x,
            y,
            z,
            visibility: None,
            presence: None,
        }
    }

    pub fn to_vector(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }
}

#[derive(Deserialize)]
struct RawPose {
    world: Vec<Landmark>,
    #[serde(default)]
    image: Vec<Landmark>,
}

/// 1人分の姿勢
///
/// `world` はワールド座標（角度計算用）、`image` は画像座標（描画用）。
/// 両方ある場合は同じ関節順・同じ長さでなければならない。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPose")]
pub struct Pose {
    world: Vec<Landmark>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    image: Vec<Landmark>,
}

impl Pose {
    pub fn new(world: Vec<Landmark>) -> Self {
        Self {
            world,
            image: Vec::new(),
        }
    }

    pub fn with_image(world: Vec<Landmark>, image: Vec<Landmark>) -> Result<Self, PoseError> {
        if !image.is_empty() && image.len() != world.len() {
            return Err(PoseError::MismatchedLengths {
                world: world.len(),
                image: image.len(),
            });
        }
        Ok(Self { world, image })
    }

    pub fn world(&self) -> &[Landmark] {
        &self.world
    }

    pub fn image(&self) -> &[Landmark] {
        &self.image
    }

    pub fn get(&self, index: LandmarkIndex) -> Option<&Landmark> {
        self.world.get(index.index())
    }
}

impl TryFrom<RawPose> for Pose {
    type Error = PoseError;

    fn try_from(raw: RawPose) -> Result<Self, Self::Error> {
        Pose::with_image(raw.world, raw.image)
    }
}

/// 1フレームの検出結果。姿勢が無いことを明示的に表す
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoseFrame {
    Detected(Pose),
    NoPoseDetected,
}

impl PoseFrame {
    pub fn pose(&self) -> Option<&Pose> {
        match self {
            PoseFrame::Detected(pose) => Some(pose),
            PoseFrame::NoPoseDetected => None,
        }
    }
}

impl From<Option<Pose>> for PoseFrame {
    fn from(pose: Option<Pose>) -> Self {
        match pose {
            Some(pose) => PoseFrame::Detected(pose),
            None => PoseFrame::NoPoseDetected,
        }
    }
}
