use crate::error::ExtractionError;
use crate::fingerprint::PoseFingerprint;
use crate::vector::{angle_between, vector_between};

use super::landmark::{Landmark, LandmarkIndex, Pose, PoseFrame};
use LandmarkIndex::*;

/// 角度カタログのバージョン。角度名・定義を変えたら上げる
pub const ANGLE_CATALOG_VERSION: u32 = 2;

/// 1つの関節角度の定義 (端点, 頂点, 端点)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AngleDefinition {
    pub name: &'static str,
    pub endpoint_a: LandmarkIndex,
    pub vertex: LandmarkIndex,
    pub endpoint_b: LandmarkIndex,
}

impl AngleDefinition {
    pub const fn new(
        name: &'static str,
        endpoint_a: LandmarkIndex,
        vertex: LandmarkIndex,
        endpoint_b: LandmarkIndex,
    ) -> Self {
        Self {
            name,
            endpoint_a,
            vertex,
            endpoint_b,
        }
    }

    fn indices(&self) -> [usize; 3] {
        [self.endpoint_a.index(), self.vertex.index(), self.endpoint_b.index()]
    }

    /// 頂点から両端点へのベクトルのなす角（度）
    pub fn measure(&self, landmarks: &[Landmark]) -> Result<f64, ExtractionError> {
        for required in self.indices() {
            if required >= landmarks.len() {
                return Err(ExtractionError::MissingLandmark {
                    angle: self.name.to_string(),
                    required,
                    available: landmarks.len(),
                });
            }
        }
        let a = landmarks[self.endpoint_a.index()].to_vector();
        let vertex = landmarks[self.vertex.index()].to_vector();
        let b = landmarks[self.endpoint_b.index()].to_vector();

        let v1 = vector_between(&vertex, &a);
        let v2 = vector_between(&vertex, &b);
        angle_between(&v2, &v1).map_err(|source| ExtractionError::DegenerateAngle {
            angle: self.name.to_string(),
            source,
        })
    }
}

const STANDARD_ANGLES: [AngleDefinition; 14] = [
    AngleDefinition::new("left_ankle_extension", LeftFootIndex, LeftAnkle, LeftKnee),
    AngleDefinition::new("left_knee_extension", LeftAnkle, LeftKnee, LeftHip),
    AngleDefinition::new("left_hip_extension", LeftKnee, LeftHip, LeftShoulder),
    AngleDefinition::new("left_hip_abduction", LeftKnee, LeftHip, RightHip),
    AngleDefinition::new("left_shoulder_elevation", LeftHip, LeftShoulder, LeftElbow),
    AngleDefinition::new("left_shoulder_abduction", LeftElbow, LeftShoulder, RightShoulder),
    AngleDefinition::new("left_elbow_extension", LeftWrist, LeftElbow, LeftShoulder),
    AngleDefinition::new("right_ankle_extension", RightFootIndex, RightAnkle, RightKnee),
    AngleDefinition::new("right_knee_extension", RightAnkle, RightKnee, RightHip),
    AngleDefinition::new("right_hip_extension", RightKnee, RightHip, RightShoulder),
    AngleDefinition::new("right_hip_abduction", RightKnee, RightHip, LeftHip),
    AngleDefinition::new("right_shoulder_elevation", RightHip, RightShoulder, RightElbow),
    AngleDefinition::new("right_shoulder_abduction", RightElbow, RightShoulder, LeftShoulder),
    AngleDefinition::new("right_elbow_extension", RightWrist, RightElbow, RightShoulder),
];

/// 計測する関節角度の一覧（不変）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AngleCatalog {
    version: u32,
    definitions: Vec<AngleDefinition>,
}

impl AngleCatalog {
    pub fn new(version: u32, definitions: Vec<AngleDefinition>) -> Self {
        Self { version, definitions }
    }

    /// 左右7角度ずつ、計14角度の標準カタログ
    pub fn standard() -> Self {
        Self::new(ANGLE_CATALOG_VERSION, STANDARD_ANGLES.to_vec())
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn definitions(&self) -> &[AngleDefinition] {
        &self.definitions
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.definitions.iter().map(|d| d.name)
    }

    /// 全角度を計算するのに必要なランドマーク数
    pub fn required_landmarks(&self) -> usize {
        self.definitions
            .iter()
            .flat_map(|d| d.indices())
            .max()
            .map_or(0, |max| max + 1)
    }
}

impl Default for AngleCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

/// ワールド座標ランドマークから関節角度フィンガープリントを作る
#[derive(Debug, Clone)]
pub struct JointAngleExtractor {
    catalog: AngleCatalog,
}

impl JointAngleExtractor {
    pub fn new(catalog: AngleCatalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &AngleCatalog {
        &self.catalog
    }

    /// カタログ順に1角度ずつ計算する。1つでも失敗したらその姿勢は破棄
    pub fn extract(&self, landmarks: &[Landmark]) -> Result<PoseFingerprint, ExtractionError> {
        let mut fingerprint = PoseFingerprint::new();
        for definition in self.catalog.definitions() {
            fingerprint.insert(definition.name, definition.measure(landmarks)?);
        }
        Ok(fingerprint)
    }

    pub fn extract_pose(&self, pose: &Pose) -> Result<PoseFingerprint, ExtractionError> {
        self.extract(pose.world())
    }

    /// 姿勢未検出のフレームは `Ok(None)`
    pub fn extract_frame(&self, frame: &PoseFrame) -> Result<Option<PoseFingerprint>, ExtractionError> {
        match frame {
            PoseFrame::Detected(pose) => self.extract_pose(pose).map(Some),
            PoseFrame::NoPoseDetected => Ok(None),
        }
    }
}
