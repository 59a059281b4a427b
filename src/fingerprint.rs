//! 1姿勢分の関節角度フィンガープリント
//!
//! 角度は挿入順（抽出器が作る場合は角度カタログ順）で保持し、
//! フラットな JSON オブジェクト `{ 名前: 度 }` として保存する。

use std::fmt;
use std::fs;
use std::path::Path;

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::SampleError;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PoseFingerprint {
    angles: Vec<(String, f64)>,
}

impl PoseFingerprint {
    pub fn new() -> Self {
        Self::default()
    }

    /// 同名の角度があれば上書き、無ければ末尾に追加
    pub fn insert(&mut self, name: impl Into<String>, degrees: f64) {
        let name = name.into();
        match self.angles.iter_mut().find(|(k, _)| *k == name) {
            Some(entry) => entry.1 = degrees,
            None => self.angles.push((name, degrees)),
        }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.angles.iter().find(|(k, _)| k == name).map(|(_, v)| *v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.angles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.angles.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.angles.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.angles.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// 全角度をベクトルとみなしたときのノルム
    pub fn magnitude(&self) -> f64 {
        self.angles.iter().map(|(_, v)| v * v).sum::<f64>().sqrt()
    }

    /// キーごとの和。片方にしか無いキーはそのままコピーされる
    pub fn add(&self, other: &PoseFingerprint) -> PoseFingerprint {
        let mut sum = self.clone();
        for (name, value) in &other.angles {
            match sum.angles.iter_mut().find(|(k, _)| k == name) {
                Some(entry) => entry.1 += value,
                None => sum.angles.push((name.clone(), *value)),
            }
        }
        sum
    }

    pub fn scale(&self, factor: f64) -> PoseFingerprint {
        PoseFingerprint {
            angles: self
                .angles
                .iter()
                .map(|(k, v)| (k.clone(), v * factor))
                .collect(),
        }
    }

    /// キーごとの差 (self - other)。other に無いキーは self の値のまま
    pub fn difference(&self, other: &PoseFingerprint) -> PoseFingerprint {
        PoseFingerprint {
            angles: self
                .angles
                .iter()
                .map(|(k, v)| (k.clone(), v - other.get(k).unwrap_or(0.0)))
                .collect(),
        }
    }

    /// 表示用に整数度へ丸めたコピー
    pub fn rounded(&self) -> PoseFingerprint {
        PoseFingerprint {
            angles: self
                .angles
                .iter()
                .map(|(k, v)| (k.clone(), v.round()))
                .collect(),
        }
    }

    /// 共通キー上のコサイン類似度
    ///
    /// 共通キーが無い、またはどちらかのノルムが 0 の場合は `None`（情報なし）。
    /// キー名順に加算するので `a.cosine_similarity(b) == b.cosine_similarity(a)`
    /// がビット単位で成り立つ。
    pub fn cosine_similarity(&self, other: &PoseFingerprint) -> Option<f64> {
        let mut shared: Vec<(&str, f64, f64)> = self
            .angles
            .iter()
            .filter_map(|(k, a)| other.get(k).map(|b| (k.as_str(), *a, b)))
            .collect();
        if shared.is_empty() {
            return None;
        }
        shared.sort_by(|x, y| x.0.cmp(y.0));

        // 各側の最大絶対値で割ってから2乗する（極小・極大値でのアンダーフロー/オーバーフロー対策）
        let scale_a = shared.iter().fold(0.0_f64, |m, (_, a, _)| m.max(a.abs()));
        let scale_b = shared.iter().fold(0.0_f64, |m, (_, _, b)| m.max(b.abs()));
        if scale_a == 0.0 || scale_b == 0.0 || !scale_a.is_finite() || !scale_b.is_finite() {
            return None;
        }

        let mut dot = 0.0;
        let mut norm_a = 0.0;
        let mut norm_b = 0.0;
        for (_, a, b) in &shared {
            let (a, b) = (a / scale_a, b / scale_b);
            dot += a * b;
            norm_a += a * a;
            norm_b += b * b;
        }

        let denominator = (norm_a * norm_b).sqrt();
        if denominator == 0.0 || !denominator.is_finite() {
            return None;
        }
        Some((dot / denominator).clamp(-1.0, 1.0))
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), SampleError> {
        let path = path.as_ref();
        let json = self.to_json().map_err(|source| SampleError::Malformed {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, json).map_err(|source| SampleError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SampleError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| SampleError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content).map_err(|source| SampleError::Malformed {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for PoseFingerprint {
    fn from_iter<T: IntoIterator<Item = (K, f64)>>(iter: T) -> Self {
        let mut fingerprint = PoseFingerprint::new();
        for (name, value) in iter {
            fingerprint.insert(name, value);
        }
        fingerprint
    }
}

impl Serialize for PoseFingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.angles.len()))?;
        for (name, value) in &self.angles {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

struct FingerprintVisitor;

impl<'de> Visitor<'de> for FingerprintVisitor {
    type Value = PoseFingerprint;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a flat map of angle name to degrees")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut fingerprint = PoseFingerprint::new();
        while let Some((name, value)) = access.next_entry::<String, f64>()? {
            if fingerprint.contains(&name) {
                return Err(de::Error::custom(format!("duplicate angle `{}`", name)));
            }
            fingerprint.angles.push((name, value));
        }
        Ok(fingerprint)
    }
}

impl<'de> Deserialize<'de> for PoseFingerprint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(FingerprintVisitor)
    }
}
