use std::cmp::Ordering;
use std::sync::Arc;

use serde::Serialize;

use crate::config::{validate_threshold, ClassifierConfig};
use crate::error::ConfigError;
use crate::fingerprint::PoseFingerprint;
use crate::technique::{Technique, TechniqueCatalog};

use super::archetype::ArchetypeSet;

/// 技とその類似度 (-1.0〜1.0)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClassificationMatch {
    pub technique: Technique,
    pub similarity: f64,
}

/// 類似度の降順に並んだ候補。空でも正常な結果
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ClassificationResult {
    matches: Vec<ClassificationMatch>,
}

impl ClassificationResult {
    pub fn matches(&self) -> &[ClassificationMatch] {
        &self.matches
    }

    pub fn top(&self) -> Option<ClassificationMatch> {
        self.matches.first().copied()
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}

/// アーキタイプとのコサイン類似度による姿勢分類器
///
/// アーキタイプは読み取り専用で共有される。分類器自体は状態を持たない。
#[derive(Debug, Clone)]
pub struct Classifier {
    archetypes: Arc<ArchetypeSet>,
    catalog: TechniqueCatalog,
    config: ClassifierConfig,
}

impl Classifier {
    pub fn new(
        archetypes: Arc<ArchetypeSet>,
        catalog: TechniqueCatalog,
        config: &ClassifierConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            archetypes,
            catalog,
            config: *config,
        })
    }

    pub fn archetypes(&self) -> &Arc<ArchetypeSet> {
        &self.archetypes
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// 全アーキタイプとの類似度（カタログに無い技は末尾、未定義は None）
    pub fn similarities(&self, fingerprint: &PoseFingerprint) -> Vec<(Technique, Option<f64>)> {
        let mut similarities: Vec<(Technique, Option<f64>)> = self
            .archetypes
            .iter()
            .map(|(technique, archetype)| (technique, fingerprint.cosine_similarity(archetype)))
            .collect();
        similarities.sort_by_key(|(technique, _)| self.catalog_rank(*technique));
        similarities
    }

    pub fn classify(&self, fingerprint: &PoseFingerprint) -> ClassificationResult {
        self.rank(fingerprint, self.config.threshold, self.config.max_results)
    }

    /// 設定とは別の閾値・件数で分類する
    pub fn classify_with(
        &self,
        fingerprint: &PoseFingerprint,
        threshold: f64,
        max_results: usize,
    ) -> Result<ClassificationResult, ConfigError> {
        validate_threshold(threshold)?;
        if max_results == 0 {
            return Err(ConfigError::ZeroMaxResults);
        }
        Ok(self.rank(fingerprint, threshold, max_results))
    }

    fn catalog_rank(&self, technique: Technique) -> usize {
        self.catalog.position(technique).unwrap_or(usize::MAX)
    }

    fn rank(&self, fingerprint: &PoseFingerprint, threshold: f64, max_results: usize) -> ClassificationResult {
        let mut matches: Vec<ClassificationMatch> = self
            .archetypes
            .iter()
            .filter_map(|(technique, archetype)| {
                let similarity = fingerprint.cosine_similarity(archetype)?;
                (similarity >= threshold).then_some(ClassificationMatch { technique, similarity })
            })
            .collect();

        // 同点はカタログ順
        matches.sort_by(|a, b| match b.similarity.total_cmp(&a.similarity) {
            Ordering::Equal => self.catalog_rank(a.technique).cmp(&self.catalog_rank(b.technique)),
            other => other,
        });
        matches.truncate(max_results);

        ClassificationResult { matches }
    }
}
