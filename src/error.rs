//! フィンガープリント・分類処理のエラー型
//!
//! ライブラリはこれらの型付きエラーを返し、バイナリ側で
//! `anyhow::Result` にコンテキスト付きで包む。

use std::path::PathBuf;

use thiserror::Error;

/// ゼロ長ベクトル（方向が定義できない）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("zero-magnitude vector has no direction")]
pub struct DegenerateVectorError;

/// 1フレーム分の関節角度抽出エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    #[error("angle `{angle}` needs landmark #{required} but the pose only has {available}")]
    MissingLandmark {
        angle: String,
        required: usize,
        available: usize,
    },
    #[error("angle `{angle}` is undefined: {source}")]
    DegenerateAngle {
        angle: String,
        #[source]
        source: DegenerateVectorError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoseError {
    #[error("image landmarks ({image}) do not match world landmarks ({world})")]
    MismatchedLengths { world: usize, image: usize },
}

/// 保存済みフィンガープリント（学習サンプル）の読み書きエラー
#[derive(Debug, Error)]
pub enum SampleError {
    #[error("failed to access sample {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed sample {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl SampleError {
    pub fn path(&self) -> &std::path::Path {
        match self {
            SampleError::Io { path, .. } | SampleError::Malformed { path, .. } => path,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown technique `{0}`")]
pub struct UnknownTechnique(pub String);

/// 設定値の検証エラー（フレーム処理前に弾く）
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("threshold must be within [-1, 1], got {0}")]
    ThresholdOutOfRange(f64),
    #[error("threshold must be a finite number")]
    NonFiniteThreshold,
    #[error("max_results must be at least 1")]
    ZeroMaxResults,
    #[error("required_streak_length must be at least 1")]
    ZeroStreakLength,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extraction_error_message_names_angle() {
        let err = ExtractionError::MissingLandmark {
            angle: "left_knee_extension".to_string(),
            required: 25,
            available: 17,
        };
        let msg = err.to_string();
        assert!(msg.contains("left_knee_extension"));
        assert!(msg.contains("25"));
        assert!(msg.contains("17"));
    }

    #[test]
    fn test_degenerate_angle_has_source() {
        use std::error::Error as _;
        let err = ExtractionError::DegenerateAngle {
            angle: "right_elbow_extension".to_string(),
            source: DegenerateVectorError,
        };
        assert!(err.source().is_some());
    }

    #[test]
    fn test_sample_error_path() {
        let err = SampleError::Io {
            path: PathBuf::from("a/b.json"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        assert_eq!(err.path(), std::path::Path::new("a/b.json"));
    }
}
