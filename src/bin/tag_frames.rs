use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use mt_trainer::config::Config;
use mt_trainer::logger::init_logger;
use mt_trainer::pose::{open_frames, AngleCatalog, JointAngleExtractor, PoseFrame};
use mt_trainer::technique::Technique;

const CONFIG_PATH: &str = "config.toml";
const USAGE: &str = "usage: tag_frames <frames.jsonl> <technique> <frame,frame,...> [output_dir]";

fn parse_frame_list(list: &str) -> Result<Vec<usize>> {
    let mut frames = list
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<usize>().with_context(|| format!("Invalid frame number: {}", s)))
        .collect::<Result<Vec<_>>>()?;
    frames.sort_unstable();
    frames.dedup();
    Ok(frames)
}

/// 指定番号のフレームを取り出す。入力は最後まで読み、壊れた行があればエラー
///
/// `targets` は昇順・重複なし。戻り値の2つ目は入力の範囲外だった番号
fn select_frames<I>(frames: I, targets: &[usize]) -> Result<(Vec<(usize, PoseFrame)>, Vec<usize>)>
where
    I: Iterator<Item = Result<PoseFrame>>,
{
    let mut remaining = targets.iter().copied().peekable();
    let mut selected = Vec::with_capacity(targets.len());
    for (index, frame) in frames.enumerate() {
        let frame = frame?;
        if remaining.peek() == Some(&index) {
            remaining.next();
            selected.push((index, frame));
        }
    }
    Ok((selected, remaining.collect()))
}

fn output_file_name(input: &Path, technique_dir: &Path, frame: usize) -> PathBuf {
    let stem = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "frames".to_string());
    technique_dir.join(format!("{}-frame-{}.json", stem, frame))
}

fn main() -> Result<()> {
    init_logger();
    let config = Config::load_or_default(CONFIG_PATH);

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 4 {
        bail!(USAGE);
    }
    let input = PathBuf::from(&args[1]);
    let technique: Technique = args[2].parse()?;
    let targets = parse_frame_list(&args[3])?;
    if targets.is_empty() {
        bail!(USAGE);
    }
    let output_dir = args
        .get(4)
        .map(PathBuf::from)
        .unwrap_or_else(|| config.training.data_dir.clone());
    let technique_dir = output_dir.join(technique.as_str());
    fs::create_dir_all(&technique_dir)
        .with_context(|| format!("Failed to create {}", technique_dir.display()))?;

    println!("=== Frame Tagger ({}) ===", env!("GIT_VERSION"));
    println!("tagging frames {:?} of {} as {}", targets, input.display(), technique);

    let extractor = JointAngleExtractor::new(AngleCatalog::standard());
    let (selected, missing) = select_frames(open_frames(&input)?, &targets)?;
    let mut written = 0usize;

    for (index, frame) in selected {
        let fingerprint = match extractor.extract_frame(&frame) {
            Ok(Some(fp)) => fp,
            Ok(None) => {
                println!("no pose found in frame {}, skipping", index);
                continue;
            }
            Err(e) => {
                log::warn!("frame {}: {}, skipping", index, e);
                continue;
            }
        };

        let path = output_file_name(&input, &technique_dir, index);
        fingerprint.save(&path)?;
        written += 1;
        println!("  {}", path.display());
    }

    if !missing.is_empty() {
        log::warn!("frames {:?} are beyond the end of {}", missing, input.display());
    }
    println!("{} samples written", written);
    Ok(())
}
