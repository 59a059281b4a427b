//! アーキタイプ学習: 技ごとに平均フィンガープリントを1つ作る
//!
//! 学習サンプルは `<root>/<technique>/...` に1ファイル1フィンガープリント (JSON)。
//! 読めない・壊れたサンプルは警告を出して読み飛ばす。

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use anyhow::{Context, Result};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::SampleError;
use crate::fingerprint::PoseFingerprint;
use crate::technique::{Technique, TechniqueCatalog};

/// 技 → アーキタイプの対応（学習後は読み取り専用）
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ArchetypeSet {
    entries: Vec<(Technique, PoseFingerprint)>,
}

impl ArchetypeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 同じ技が既にあれば置き換える
    pub fn insert(&mut self, technique: Technique, archetype: PoseFingerprint) {
        match self.entries.iter_mut().find(|(t, _)| *t == technique) {
            Some(entry) => entry.1 = archetype,
            None => self.entries.push((technique, archetype)),
        }
    }

    pub fn get(&self, technique: Technique) -> Option<&PoseFingerprint> {
        self.entries
            .iter()
            .find(|(t, _)| *t == technique)
            .map(|(_, fp)| fp)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Technique, &PoseFingerprint)> {
        self.entries.iter().map(|(t, fp)| (*t, fp))
    }

    pub fn techniques(&self) -> impl Iterator<Item = Technique> + '_ {
        self.entries.iter().map(|(t, _)| *t)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(path, json)
            .with_context(|| format!("Failed to write archetypes to {}", path.display()))?;
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read archetypes from {}", path.display()))?;
        let set: ArchetypeSet = serde_json::from_str(&content)
            .with_context(|| format!("Invalid archetype file {}", path.display()))?;
        Ok(set)
    }
}

impl FromIterator<(Technique, PoseFingerprint)> for ArchetypeSet {
    fn from_iter<T: IntoIterator<Item = (Technique, PoseFingerprint)>>(iter: T) -> Self {
        let mut set = ArchetypeSet::new();
        for (technique, archetype) in iter {
            set.insert(technique, archetype);
        }
        set
    }
}

impl Serialize for ArchetypeSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (technique, archetype) in &self.entries {
            map.serialize_entry(technique, archetype)?;
        }
        map.end()
    }
}

struct ArchetypeSetVisitor;

impl<'de> Visitor<'de> for ArchetypeSetVisitor {
    type Value = ArchetypeSet;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map of technique label to fingerprint")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut set = ArchetypeSet::new();
        while let Some((technique, archetype)) =
            access.next_entry::<Technique, PoseFingerprint>()?
        {
            set.insert(technique, archetype);
        }
        Ok(set)
    }
}

impl<'de> Deserialize<'de> for ArchetypeSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(ArchetypeSetVisitor)
    }
}

/// 1技分の学習結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TechniqueReport {
    pub technique: Technique,
    pub loaded: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TrainingReport {
    pub techniques: Vec<TechniqueReport>,
}

impl TrainingReport {
    pub fn get(&self, technique: Technique) -> Option<&TechniqueReport> {
        self.techniques.iter().find(|r| r.technique == technique)
    }

    pub fn total_loaded(&self) -> usize {
        self.techniques.iter().map(|r| r.loaded).sum()
    }

    pub fn total_skipped(&self) -> usize {
        self.techniques.iter().map(|r| r.skipped).sum()
    }
}

/// 平均化の途中経過（和とサンプル数）
#[derive(Debug, Default)]
struct Accumulator {
    sum: PoseFingerprint,
    count: usize,
}

impl Accumulator {
    fn push(&mut self, sample: &PoseFingerprint) {
        self.sum = self.sum.add(sample);
        self.count += 1;
    }

    /// N=0: 空, N=1: そのまま, N>1: 和を 1/N 倍
    fn finish(self) -> PoseFingerprint {
        if self.count > 1 {
            self.sum.scale(1.0 / self.count as f64)
        } else {
            self.sum
        }
    }
}

pub struct ArchetypeTrainer {
    catalog: TechniqueCatalog,
}

impl ArchetypeTrainer {
    pub fn new(catalog: TechniqueCatalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &TechniqueCatalog {
        &self.catalog
    }

    /// サンプル群の平均フィンガープリント
    pub fn average<'a, I>(samples: I) -> PoseFingerprint
    where
        I: IntoIterator<Item = &'a PoseFingerprint>,
    {
        let mut acc = Accumulator::default();
        for sample in samples {
            acc.push(sample);
        }
        acc.finish()
    }

    /// カタログの各技について `load_samples` が返すサンプルを平均化する
    ///
    /// 読み込みに失敗したサンプルは数えずに読み飛ばす
    pub fn train<F>(&self, mut load_samples: F) -> (ArchetypeSet, TrainingReport)
    where
        F: FnMut(Technique) -> Vec<Result<PoseFingerprint, SampleError>>,
    {
        let mut set = ArchetypeSet::new();
        let mut report = TrainingReport::default();

        for &technique in self.catalog.techniques() {
            let mut acc = Accumulator::default();
            let mut skipped = 0;
            for sample in load_samples(technique) {
                match sample {
                    Ok(fingerprint) => acc.push(&fingerprint),
                    Err(e) => {
                        log::warn!("Skipping {} sample: {}", technique, e);
                        skipped += 1;
                    }
                }
            }
            let loaded = acc.count;
            if loaded == 0 {
                log::warn!("No usable samples for {}", technique);
            } else {
                log::info!("{}: {} samples ({} skipped)", technique, loaded, skipped);
            }
            set.insert(technique, acc.finish());
            report.techniques.push(TechniqueReport {
                technique,
                loaded,
                skipped,
            });
        }

        (set, report)
    }

    /// `<root>/<technique>/` 以下の全ファイルから学習する
    pub fn train_from_dir<P: AsRef<Path>>(&self, root: P) -> Result<(ArchetypeSet, TrainingReport)> {
        let root = root.as_ref();
        let mut listings = Vec::with_capacity(self.catalog.len());
        for &technique in self.catalog.techniques() {
            let dir = root.join(technique.as_str());
            let files = files_in(&dir)
                .with_context(|| format!("Failed to list training samples in {}", dir.display()))?;
            listings.push((technique, files));
        }

        Ok(self.train(|technique| {
            listings
                .iter()
                .find(|(t, _)| *t == technique)
                .map(|(_, files)| files.iter().map(PoseFingerprint::load).collect())
                .unwrap_or_default()
        }))
    }
}

/// ディレクトリ以下の全ファイル（再帰、パス順）
///
/// ディレクトリが存在しない、またはディレクトリでない場合は空
pub fn files_in(dir: &Path) -> io::Result<Vec<PathBuf>> {
    match fs::metadata(dir) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
        Ok(meta) if !meta.is_dir() => {
            log::warn!("{} is not a directory, ignoring", dir.display());
            return Ok(Vec::new());
        }
        Ok(_) => {}
    }

    let mut files = Vec::new();
    collect_files(dir, &mut files)?;
    files.sort();
    Ok(files)
}

fn collect_files(dir: &Path, files: &mut Vec<PathBuf>) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_files(&path, files)?;
        } else {
            files.push(path);
        }
    }
    Ok(())
}

/// 複数ストリームで共有するアーキタイプ
///
/// 読み手は `snapshot()` で得た `Arc` をストリームの間保持し、
/// 再学習は新しいセットを `replace()` で差し替える。既存のセットは変更しない。
#[derive(Debug)]
pub struct SharedArchetypes {
    current: RwLock<Arc<ArchetypeSet>>,
}

impl SharedArchetypes {
    pub fn new(set: ArchetypeSet) -> Self {
        Self {
            current: RwLock::new(Arc::new(set)),
        }
    }

    pub fn snapshot(&self) -> Arc<ArchetypeSet> {
        // Arc の差し替えだけなので poison されても中身は一貫している
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// 新しいセットに差し替え、古いセットを返す
    pub fn replace(&self, set: ArchetypeSet) -> Arc<ArchetypeSet> {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *current, Arc::new(set))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() < eps
    }

    fn fp(values: &[(&str, f64)]) -> PoseFingerprint {
        values.iter().map(|(k, v)| (*k, *v)).collect()
    }

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("mt_trainer_{}_{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_average_three_identical() {
        let f = fp(&[("a", 172.3), ("b", 95.7), ("c", 33.1)]);
        let avg = ArchetypeTrainer::average([&f, &f, &f]);
        for (name, value) in f.iter() {
            assert!(approx_eq(avg.get(name).unwrap(), value, 1e-9));
        }
    }

    #[test]
    fn test_average_counts() {
        assert!(ArchetypeTrainer::average(std::iter::empty()).is_empty());

        let single = fp(&[("a", 10.0)]);
        assert_eq!(ArchetypeTrainer::average([&single]), single);

        let a = fp(&[("a", 10.0), ("b", 0.0)]);
        let b = fp(&[("a", 20.0), ("b", 6.0)]);
        let avg = ArchetypeTrainer::average([&a, &b]);
        assert!(approx_eq(avg.get("a").unwrap(), 15.0, 1e-12));
        assert!(approx_eq(avg.get("b").unwrap(), 3.0, 1e-12));
    }

    #[test]
    fn test_train_skips_bad_samples() {
        let catalog = TechniqueCatalog::new(1, [Technique::LeftJab, Technique::RightCross]);
        let trainer = ArchetypeTrainer::new(catalog);
        let good = fp(&[("a", 30.0)]);
        let (set, report) = trainer.train(|technique| match technique {
            Technique::LeftJab => vec![
                Ok(good.clone()),
                Err(SampleError::Malformed {
                    path: PathBuf::from("bad.json"),
                    source: serde_json::from_str::<PoseFingerprint>("{").unwrap_err(),
                }),
                Ok(fp(&[("a", 60.0)])),
            ],
            _ => Vec::new(),
        });

        assert_eq!(set.len(), 2);
        let jab = set.get(Technique::LeftJab).unwrap();
        assert!(approx_eq(jab.get("a").unwrap(), 45.0, 1e-12));
        assert!(set.get(Technique::RightCross).unwrap().is_empty());

        let jab_report = report.get(Technique::LeftJab).unwrap();
        assert_eq!((jab_report.loaded, jab_report.skipped), (2, 1));
        assert_eq!(report.total_loaded(), 2);
        assert_eq!(report.total_skipped(), 1);
    }

    #[test]
    fn test_train_follows_catalog_order() {
        let catalog = TechniqueCatalog::new(1, [Technique::RightHook, Technique::LeftJab]);
        let trainer = ArchetypeTrainer::new(catalog);
        let (set, _) = trainer.train(|_| Vec::new());
        assert_eq!(
            set.techniques().collect::<Vec<_>>(),
            vec![Technique::RightHook, Technique::LeftJab]
        );
    }

    #[test]
    fn test_train_from_dir() {
        let root = temp_dir("train_from_dir");
        let jab_dir = root.join("left-jab");
        fs::create_dir_all(jab_dir.join("session2")).unwrap();

        let f = fp(&[("left_elbow_extension", 170.0), ("right_elbow_extension", 80.0)]);
        f.save(jab_dir.join("a.json")).unwrap();
        f.save(jab_dir.join("b.json")).unwrap();
        f.save(jab_dir.join("session2").join("c.json")).unwrap();
        fs::write(jab_dir.join("notes.txt"), "stray file").unwrap();
        fs::write(jab_dir.join("broken.json"), "{\"left_elbow_extension\":").unwrap();

        let catalog = TechniqueCatalog::new(1, [Technique::LeftJab, Technique::LeftHook]);
        let trainer = ArchetypeTrainer::new(catalog);
        let (set, report) = trainer.train_from_dir(&root).unwrap();

        let jab = set.get(Technique::LeftJab).unwrap();
        for (name, value) in f.iter() {
            assert!(approx_eq(jab.get(name).unwrap(), value, 1e-9));
        }
        let jab_report = report.get(Technique::LeftJab).unwrap();
        assert_eq!((jab_report.loaded, jab_report.skipped), (3, 2));

        // 空のアーキタイプとの類似度は未定義
        let hook = set.get(Technique::LeftHook).unwrap();
        assert!(hook.is_empty());
        assert_eq!(f.cosine_similarity(hook), None);

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn test_train_from_dir_ignores_stray_file() {
        let root = temp_dir("stray_technique_file");
        fs::create_dir_all(root.join("left-hook")).unwrap();
        fs::write(root.join("left-jab"), "not a directory").unwrap();

        let f = fp(&[("left_elbow_extension", 90.0)]);
        f.save(root.join("left-hook").join("a.json")).unwrap();

        let catalog = TechniqueCatalog::new(1, [Technique::LeftJab, Technique::LeftHook]);
        let (set, report) = ArchetypeTrainer::new(catalog).train_from_dir(&root).unwrap();

        let jab_report = report.get(Technique::LeftJab).unwrap();
        assert_eq!((jab_report.loaded, jab_report.skipped), (0, 0));
        assert!(set.get(Technique::LeftJab).unwrap().is_empty());
        assert_eq!(report.get(Technique::LeftHook).unwrap().loaded, 1);
        assert!(files_in(&root.join("left-jab")).unwrap().is_empty());

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn test_files_in_missing_dir() {
        let files = files_in(Path::new("/nonexistent/mt_trainer/left-jab")).unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_files_in_sorted_recursive() {
        let root = temp_dir("files_in");
        fs::create_dir_all(root.join("sub")).unwrap();
        fs::write(root.join("b.json"), "{}").unwrap();
        fs::write(root.join("a.json"), "{}").unwrap();
        fs::write(root.join("sub").join("c.json"), "{}").unwrap();

        let files = files_in(&root).unwrap();
        assert_eq!(
            files,
            vec![root.join("a.json"), root.join("b.json"), root.join("sub").join("c.json")]
        );
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn test_archetype_set_save_load() {
        let root = temp_dir("archetype_io");
        let path = root.join("nested").join("archetypes.json");
        let set: ArchetypeSet = [
            (Technique::RightCross, fp(&[("a", 1.5), ("b", 2.25)])),
            (Technique::LeftJab, fp(&[("a", 3.0), ("b", 4.0)])),
            (Technique::LeftHook, PoseFingerprint::new()),
        ]
        .into_iter()
        .collect();

        set.save(&path).unwrap();
        let loaded = ArchetypeSet::load(&path).unwrap();
        assert_eq!(loaded, set);
        assert_eq!(
            loaded.techniques().collect::<Vec<_>>(),
            vec![Technique::RightCross, Technique::LeftJab, Technique::LeftHook]
        );

        let json = fs::read_to_string(&path).unwrap();
        assert!(json.contains("\"right-cross\""));
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn test_archetype_set_rejects_unknown_technique() {
        assert!(serde_json::from_str::<ArchetypeSet>(r#"{"spinning-backfist": {"a": 1.0}}"#).is_err());
    }

    #[test]
    fn test_shared_archetypes_swap() {
        let first: ArchetypeSet = [(Technique::LeftJab, fp(&[("a", 1.0)]))].into_iter().collect();
        let second: ArchetypeSet = [(Technique::RightCross, fp(&[("a", 2.0)]))].into_iter().collect();

        let shared = SharedArchetypes::new(first.clone());
        let held = shared.snapshot();
        let old = shared.replace(second.clone());

        assert_eq!(*old, first);
        // 差し替え前に取得したスナップショットは変わらない
        assert_eq!(*held, first);
        assert_eq!(*shared.snapshot(), second);
    }
}
