//! Per-class prediction display used by the plain pose-prediction view.

use serde::Serialize;

use crate::classification::{top_prediction, Prediction};

/// Top prediction must exceed this probability to be highlighted
pub const ACTIVE_MIN_PROBABILITY: f32 = 0.1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoardRow {
    pub label: String,
    /// Rounded to a whole percent, 0..=100
    pub percentage: u8,
    pub active: bool,
}

/// One row per model class, updated in place every frame
#[derive(Debug, Clone, Default, Serialize)]
pub struct PredictionBoard {
    rows: Vec<BoardRow>,
}

impl PredictionBoard {
    /// Build empty rows from the model's class labels
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let rows = labels
            .into_iter()
            .map(|label| BoardRow {
                label: label.into(),
                percentage: 0,
                active: false,
            })
            .collect();
        Self { rows }
    }

    /// Apply one frame of predictions by class index
    ///
    /// Predictions past the last row are ignored; rows without a matching
    /// prediction keep their previous percentage.
    pub fn update(&mut self, predictions: &[Prediction]) {
        let visible = &predictions[..predictions.len().min(self.rows.len())];

        for (row, prediction) in self.rows.iter_mut().zip(visible) {
            row.percentage = to_percentage(prediction.probability);
        }

        let active = top_prediction(visible)
            .filter(|(_, top)| top.probability > ACTIVE_MIN_PROBABILITY)
            .map(|(index, _)| index);
        for (index, row) in self.rows.iter_mut().enumerate() {
            row.active = Some(index) == active;
        }
    }

    /// Zero every row, as when the camera stops
    pub fn reset(&mut self) {
        for row in &mut self.rows {
            row.percentage = 0;
            row.active = false;
        }
    }

    #[must_use]
    pub fn rows(&self) -> &[BoardRow] {
        &self.rows
    }

    #[must_use]
    pub fn active_row(&self) -> Option<&BoardRow> {
        self.rows.iter().find(|row| row.active)
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_percentage(probability: f32) -> u8 {
    if probability.is_nan() {
        return 0;
    }
    (probability * 100.0).round().clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board() -> PredictionBoard {
        PredictionBoard::new(["Sitting", "Standing", "Waving"])
    }

    #[test]
    fn test_update_rounds_and_highlights_top() {
        let mut board = board();
        board.update(&[
            Prediction::new("Sitting", 0.125),
            Prediction::new("Standing", 0.666),
            Prediction::new("Waving", 0.209),
        ]);

        let percentages: Vec<u8> = board.rows().iter().map(|r| r.percentage).collect();
        assert_eq!(percentages, vec![13, 67, 21]);
        assert_eq!(board.active_row().unwrap().label, "Standing");
        assert_eq!(board.rows().iter().filter(|r| r.active).count(), 1);
    }

    #[test]
    fn test_weak_top_prediction_not_highlighted() {
        let mut board = board();
        board.update(&[
            Prediction::new("Sitting", 0.05),
            Prediction::new("Standing", 0.08),
            Prediction::new("Waving", 0.1),
        ]);
        assert!(board.active_row().is_none());
    }

    #[test]
    fn test_short_and_long_frames() {
        let mut board = board();
        board.update(&[
            Prediction::new("Sitting", 0.2),
            Prediction::new("Standing", 0.3),
            Prediction::new("Waving", 0.5),
        ]);
        board.update(&[Prediction::new("Sitting", 0.9)]);
        assert_eq!(board.rows()[0].percentage, 90);
        assert_eq!(board.rows()[2].percentage, 50);
        assert_eq!(board.active_row().unwrap().label, "Sitting");

        board.update(&[
            Prediction::new("Sitting", 0.1),
            Prediction::new("Standing", 0.1),
            Prediction::new("Waving", 0.1),
            Prediction::new("Extra", 0.7),
        ]);
        assert_eq!(board.rows().len(), 3);
        assert!(board.active_row().is_none());
    }

    #[test]
    fn test_reset_clears_rows() {
        let mut board = board();
        board.update(&[Prediction::new("Sitting", 1.0)]);
        board.reset();
        assert!(board.rows().iter().all(|r| r.percentage == 0 && !r.active));
    }
}
