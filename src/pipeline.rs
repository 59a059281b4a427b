//! ストリーム単位のフレーム処理: 姿勢 → フィンガープリント → 分類 → 安定ラベル

use std::sync::Arc;

use crate::classifier::{ArchetypeSet, ClassificationMatch, ClassificationResult, Classifier};
use crate::config::Config;
use crate::error::{ConfigError, ExtractionError};
use crate::fingerprint::PoseFingerprint;
use crate::pose::{AngleCatalog, JointAngleExtractor, PoseFrame};
use crate::technique::TechniqueCatalog;
use crate::tracker::TemporalSmoother;

/// 1フレームの処理結果
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    pub frame_index: usize,
    /// 姿勢未検出なら None
    pub fingerprint: Option<PoseFingerprint>,
    pub result: ClassificationResult,
    /// 連続フレーム条件を満たした技
    pub stable: Option<ClassificationMatch>,
}

/// 1本の動画ストリーム専用の分類器。ストリーム間で共有しない
pub struct StreamClassifier {
    extractor: JointAngleExtractor,
    classifier: Classifier,
    smoother: TemporalSmoother,
    frame_index: usize,
}

impl StreamClassifier {
    pub fn new(extractor: JointAngleExtractor, classifier: Classifier, smoother: TemporalSmoother) -> Self {
        Self {
            extractor,
            classifier,
            smoother,
            frame_index: 0,
        }
    }

    /// 標準カタログと設定ファイルの値で組み立てる
    pub fn from_config(archetypes: Arc<ArchetypeSet>, config: &Config) -> Result<Self, ConfigError> {
        let classifier = Classifier::new(archetypes, TechniqueCatalog::standard(), &config.classifier)?;
        let smoother = TemporalSmoother::from_config(&config.smoothing)?;
        Ok(Self::new(
            JointAngleExtractor::new(AngleCatalog::standard()),
            classifier,
            smoother,
        ))
    }

    /// 抽出エラーは呼び出し側に返す（フレーム番号は進むが平滑化の状態は変えない）
    pub fn process(&mut self, frame: &PoseFrame) -> Result<FrameReport, ExtractionError> {
        let frame_index = self.frame_index;
        self.frame_index += 1;

        let fingerprint = self.extractor.extract_frame(frame)?;
        let result = match &fingerprint {
            Some(fp) => self.classifier.classify(fp),
            None => ClassificationResult::default(),
        };
        let stable = self.smoother.apply(result.top());

        Ok(FrameReport {
            frame_index,
            fingerprint,
            result,
            stable,
        })
    }

    pub fn frames_processed(&self) -> usize {
        self.frame_index
    }

    pub fn smoother(&self) -> &TemporalSmoother {
        &self.smoother
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }
}
