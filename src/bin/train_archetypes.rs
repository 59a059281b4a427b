use anyhow::Result;
use std::path::PathBuf;

use mt_trainer::classifier::ArchetypeTrainer;
use mt_trainer::config::Config;
use mt_trainer::logger::init_logger;
use mt_trainer::technique::TechniqueCatalog;

const CONFIG_PATH: &str = "config.toml";

fn main() -> Result<()> {
    init_logger();
    let config = Config::load_or_default(CONFIG_PATH);

    // 使い方: train_archetypes [training_dir] [output]
    let args: Vec<String> = std::env::args().collect();
    let data_dir = args
        .get(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| config.training.data_dir.clone());
    let output = args
        .get(2)
        .map(PathBuf::from)
        .unwrap_or_else(|| config.training.archetype_path.clone());

    let catalog = TechniqueCatalog::standard();

    println!("=== Archetype Trainer ({}) ===", env!("GIT_VERSION"));
    println!("学習データ: {}", data_dir.display());
    println!("出力先: {}", output.display());
    println!("技カタログ: v{} ({}件)", catalog.version(), catalog.len());
    println!();

    let trainer = ArchetypeTrainer::new(catalog);
    let (archetypes, report) = trainer.train_from_dir(&data_dir)?;

    for entry in &report.techniques {
        println!(
            "  {:<18} loaded={:>4} skipped={:>4}",
            entry.technique.as_str(),
            entry.loaded,
            entry.skipped
        );
    }
    println!();
    println!(
        "合計: {} samples ({} skipped)",
        report.total_loaded(),
        report.total_skipped()
    );

    archetypes.save(&output)?;
    println!("保存しました: {}", output.display());
    Ok(())
}
