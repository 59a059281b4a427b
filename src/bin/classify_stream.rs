use anyhow::{bail, Result};
use std::path::PathBuf;
use std::sync::Arc;

use mt_trainer::classifier::ArchetypeSet;
use mt_trainer::config::Config;
use mt_trainer::logger::init_logger;
use mt_trainer::pipeline::StreamClassifier;
use mt_trainer::pose::open_frames;

const CONFIG_PATH: &str = "config.toml";

fn main() -> Result<()> {
    init_logger();
    let config = Config::load_or_default(CONFIG_PATH);

    // 使い方: classify_stream <frames.jsonl> [archetypes.json]
    let args: Vec<String> = std::env::args().collect();
    let Some(input) = args.get(1).map(PathBuf::from) else {
        bail!("usage: classify_stream <frames.jsonl> [archetypes.json]");
    };
    let archetype_path = args
        .get(2)
        .map(PathBuf::from)
        .unwrap_or_else(|| config.training.archetype_path.clone());

    println!("=== Stream Classifier ({}) ===", env!("GIT_VERSION"));
    println!("入力: {}", input.display());
    println!("アーキタイプ: {}", archetype_path.display());
    println!(
        "閾値: {}, 連続フレーム数: {}",
        config.classifier.threshold, config.smoothing.required_streak_length
    );
    println!();

    let archetypes = Arc::new(ArchetypeSet::load(&archetype_path)?);
    let mut stream = StreamClassifier::from_config(archetypes, &config)?;

    let mut stable_frames = 0usize;
    let mut skipped_frames = 0usize;
    for frame in open_frames(&input)? {
        let frame = frame?;
        let frame_number = stream.frames_processed();
        let report = match stream.process(&frame) {
            Ok(report) => report,
            Err(e) => {
                log::warn!("Frame #{}: {}", frame_number, e);
                skipped_frames += 1;
                continue;
            }
        };

        if report.fingerprint.is_none() {
            println!("Frame #{}: no pose detected", report.frame_index);
            continue;
        }
        match report.stable {
            Some(stable) => {
                stable_frames += 1;
                println!(
                    "Frame #{}: Pose: {} ({:.2}%)",
                    report.frame_index,
                    stable.technique,
                    stable.similarity * 100.0
                );
            }
            None => match report.result.top() {
                Some(candidate) => log::debug!(
                    "Frame #{}: candidate {} ({:.4}), streak {}",
                    report.frame_index,
                    candidate.technique,
                    candidate.similarity,
                    stream.smoother().streak()
                ),
                None => log::debug!(
                    "Frame #{}: doesn't match any known pose by at least {}",
                    report.frame_index,
                    config.classifier.threshold
                ),
            },
        }
    }

    println!();
    println!(
        "{} frames, {} stable, {} skipped",
        stream.frames_processed(),
        stable_frames,
        skipped_frames
    );
    Ok(())
}
