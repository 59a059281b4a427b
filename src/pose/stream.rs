//! JSON Lines 入力: 1行に1つの [`PoseFrame`]

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};

use super::landmark::PoseFrame;

/// 1行1フレームで読み込む（空行は読み飛ばす）
pub fn read_frames<R: BufRead>(reader: R) -> impl Iterator<Item = Result<PoseFrame>> {
    reader
        .lines()
        .enumerate()
        .filter_map(|(i, line)| match line {
            Ok(line) if line.trim().is_empty() => None,
            Ok(line) => Some(
                serde_json::from_str::<PoseFrame>(&line)
                    .with_context(|| format!("Invalid pose frame on line {}", i + 1)),
            ),
            Err(e) => Some(
                Err::<PoseFrame, _>(e).with_context(|| format!("Failed to read line {}", i + 1)),
            ),
        })
}

pub fn open_frames<P: AsRef<Path>>(path: P) -> Result<impl Iterator<Item = Result<PoseFrame>>> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    Ok(read_frames(BufReader::new(file)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_read_frames() {
        let input = concat!(
            "{\"detected\":{\"world\":[{\"x\":0.0,\"y\":1.0,\"z\":2.0}]}}\n",
            "\n",
            "\"no_pose_detected\"\n",
        );
        let frames: Vec<PoseFrame> = read_frames(Cursor::new(input))
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].pose().unwrap().world()[0].z, 2.0);
        assert_eq!(frames[1], PoseFrame::NoPoseDetected);
    }

    #[test]
    fn test_read_frames_reports_line() {
        let input = "\"no_pose_detected\"\n{broken\n";
        let results: Vec<Result<PoseFrame>> = read_frames(Cursor::new(input)).collect();
        assert!(results[0].is_ok());
        let err = results[1].as_ref().unwrap_err();
        assert!(format!("{}", err).contains("line 2"));
    }

    #[test]
    fn test_open_frames_missing_file() {
        assert!(open_frames("/nonexistent/mt_trainer/frames.jsonl").is_err());
    }
}
