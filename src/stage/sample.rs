use serde::Serialize;

use crate::engine::{AudioEngine, NodeHandle};

/// Sampled-audio source.
///
/// Holds one sequence of amplitudes per channel plus an optional frame
/// range. Absent offsets mean the full extent: `begin_at` defaults to 0
/// and `end_at` to the longest channel's length. The range is half-open:
/// frame `end_at` itself is not played.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleStage {
    pub data: Vec<Vec<f32>>,
    #[serde(rename = "beginAt", skip_serializing_if = "Option::is_none")]
    pub begin_at: Option<usize>,
    #[serde(rename = "endAt", skip_serializing_if = "Option::is_none")]
    pub end_at: Option<usize>,
}

impl SampleStage {
    /// Play the full extent of `data`.
    pub fn new(data: Vec<Vec<f32>>) -> Self {
        Self {
            data,
            begin_at: None,
            end_at: None,
        }
    }

    pub fn with_range(data: Vec<Vec<f32>>, begin_at: Option<usize>, end_at: Option<usize>) -> Self {
        Self {
            data,
            begin_at,
            end_at,
        }
    }

    /// The resolved first frame to play.
    pub fn begin_frame(&self) -> usize {
        self.begin_at.unwrap_or(0)
    }

    /// The resolved one-past-last frame to play.
    pub fn end_frame(&self) -> usize {
        self.end_at
            .unwrap_or_else(|| self.data.iter().map(Vec::len).max().unwrap_or(0))
    }

    /// Copy the selected frame range into a fresh one-shot buffer and
    /// schedule playback at `at`. The stored data is left untouched, so
    /// the stage stays reusable.
    pub fn press(&self, engine: &mut dyn AudioEngine, at: f64) -> NodeHandle {
        let begin = self.begin_frame();
        let end = self.end_frame();

        let channels: Vec<Vec<f32>> = self
            .data
            .iter()
            .map(|channel| {
                // Clamp the range to what this channel actually holds.
                let begin = begin.min(channel.len());
                let end = end.min(channel.len()).max(begin);
                channel[begin..end].to_vec()
            })
            .collect();

        let node = engine.create_buffer(channels, false);
        engine.start(&node, at);
        node
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_defaults_to_full_extent() {
        let stage = SampleStage::new(vec![vec![0.0; 7], vec![0.0; 11]]);
        assert_eq!(stage.begin_frame(), 0);
        assert_eq!(stage.end_frame(), 11);
    }

    #[test]
    fn explicit_range_wins_over_defaults() {
        let stage = SampleStage::with_range(vec![vec![0.0; 10]], Some(2), Some(6));
        assert_eq!(stage.begin_frame(), 2);
        assert_eq!(stage.end_frame(), 6);
    }

    #[test]
    fn empty_data_resolves_to_empty_range() {
        let stage = SampleStage::new(Vec::new());
        assert_eq!(stage.begin_frame(), 0);
        assert_eq!(stage.end_frame(), 0);
    }
}
