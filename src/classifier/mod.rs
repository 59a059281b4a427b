//! 学習済みアーキタイプによる技の分類
//!
//! アーキタイプは [`ArchetypeTrainer`] でオフライン作成し、
//! すべての [`Classifier`] から読み取り専用で共有する。

mod archetype;
mod model;

pub use archetype::{
    files_in, ArchetypeSet, ArchetypeTrainer, SharedArchetypes, TechniqueReport, TrainingReport,
};
pub use model::{ClassificationMatch, ClassificationResult, Classifier};
