//! Plain per-class prediction view, without any study tracking

use anyhow::Result;
use focuscam_core::{
    board::BoardRow, JsonLinesSource, ModelMetadata, PredictionBoard, PredictionSource,
};
use std::path::{Path, PathBuf};
use tokio::signal::unix::{signal, SignalKind};

fn format_row(row: &BoardRow) -> String {
    let marker = if row.active { '>' } else { ' ' };
    format!("{marker} {}: {}%", row.label, row.percentage)
}

fn print_board(board: &PredictionBoard) {
    for row in board.rows() {
        println!("{}", format_row(row));
    }
    println!();
}

/// Show rolling class percentages for a prediction stream
pub async fn show_board(metadata: &Path, input: Option<PathBuf>) -> Result<()> {
    let metadata = ModelMetadata::load(metadata)?;
    log::info!(
        "Loaded {} with {} classes",
        metadata.model_name.as_deref().unwrap_or("model"),
        metadata.total_classes()
    );

    let mut board = PredictionBoard::new(metadata.class_labels().iter().cloned());
    let mut source: Box<dyn PredictionSource> = match input {
        Some(path) => Box::new(JsonLinesSource::open(&path).await?),
        None => Box::new(JsonLinesSource::stdin()),
    };

    let mut sigint = signal(SignalKind::interrupt())?;
    loop {
        tokio::select! {
            frame = source.next_predictions() => match frame {
                Ok(Some(predictions)) => {
                    board.update(&predictions);
                    print_board(&board);
                }
                Ok(None) => break,
                Err(e) => {
                    log::error!("Prediction stream failed: {e}");
                    break;
                }
            },
            _ = sigint.recv() => break,
        }
    }

    source.stop().await;
    board.reset();
    print_board(&board);
    println!("Stopped");
    Ok(())
}
