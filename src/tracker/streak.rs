use crate::classifier::ClassificationMatch;
use crate::config::SmoothingConfig;
use crate::error::ConfigError;
use crate::technique::Technique;

/// 連続フレーム数によるラベルのデバウンスフィルタ
///
/// 同じ技が `required_streak_length` フレーム連続したときだけ出力する。
/// 分類なしのフレームでは状態を変えず（リセットも延長もしない）、何も出力しない。
/// 1ストリームにつき1インスタンス。
#[derive(Debug, Clone)]
pub struct TemporalSmoother {
    required_streak_length: u32,
    last_label: Option<Technique>,
    streak: u32,
}

impl TemporalSmoother {
    pub fn new(required_streak_length: u32) -> Result<Self, ConfigError> {
        if required_streak_length == 0 {
            return Err(ConfigError::ZeroStreakLength);
        }
        Ok(Self {
            required_streak_length,
            last_label: None,
            streak: 0,
        })
    }

    pub fn from_config(config: &SmoothingConfig) -> Result<Self, ConfigError> {
        Self::new(config.required_streak_length)
    }

    /// 1フレーム分の top-1 分類結果を入力し、安定したラベルがあれば返す
    pub fn apply(&mut self, observation: Option<ClassificationMatch>) -> Option<ClassificationMatch> {
        let current = observation?;

        if self.last_label == Some(current.technique) {
            self.streak = self.streak.saturating_add(1);
        } else {
            log::debug!(
                "label changed {:?} -> {} (after {} frames)",
                self.last_label,
                current.technique,
                self.streak
            );
            self.last_label = Some(current.technique);
            self.streak = 1;
        }

        (self.streak >= self.required_streak_length).then_some(current)
    }

    pub fn reset(&mut self) {
        self.last_label = None;
        self.streak = 0;
    }

    pub fn streak(&self) -> u32 {
        self.streak
    }

    pub fn last_label(&self) -> Option<Technique> {
        self.last_label
    }

    pub fn required_streak_length(&self) -> u32 {
        self.required_streak_length
    }

    /// フレーム列を遅延評価で安定ラベル列に変換する
    pub fn stabilize<I>(self, frames: I) -> StableLabels<I::IntoIter>
    where
        I: IntoIterator<Item = Option<ClassificationMatch>>,
    {
        StableLabels {
            frames: frames.into_iter(),
            smoother: self,
            frame_index: 0,
        }
    }
}

/// 1フレーム分の出力
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StableFrame {
    pub frame_index: usize,
    pub label: Option<ClassificationMatch>,
}

/// [`TemporalSmoother::stabilize`] が返すイテレータ。入力1フレームにつき1出力
pub struct StableLabels<I> {
    frames: I,
    smoother: TemporalSmoother,
    frame_index: usize,
}

impl<I> StableLabels<I> {
    pub fn smoother(&self) -> &TemporalSmoother {
        &self.smoother
    }
}

impl<I> Iterator for StableLabels<I>
where
    I: Iterator<Item = Option<ClassificationMatch>>,
{
    type Item = StableFrame;

    fn next(&mut self) -> Option<StableFrame> {
        let observation = self.frames.next()?;
        let frame = StableFrame {
            frame_index: self.frame_index,
            label: self.smoother.apply(observation),
        };
        self.frame_index += 1;
        Some(frame)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.frames.size_hint()
    }
}
