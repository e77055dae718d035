//! Building and querying the approximate search index.
//!
//! ```text
//!   NoIndex ──train-index──► Indexed ──train-index──► (no-op, exit 0)
//!      │                        │
//!      └─approx-predict─► error └─approx-predict─► labels
//! ```

use std::io::{BufRead, Write};

use ftext_embeddings::lossy_lines;
use ftext_index::{IndexError, IndexQuantizer};
use tracing::info;

use crate::command::usage;
use crate::error::{CliError, Outcome, Result};
use crate::lifecycle::ModelLifecycle;
use crate::model::EmbeddingModel;
use crate::router::write_predictions;

/// Message printed when `train-index` finds an index already in place.
pub const ALREADY_INDEXED: &str = "Model is already trained. Exiting.";

/// Whether a model carries an approximate search index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexState {
    NoIndex,
    Indexed,
}

impl IndexState {
    /// Current state of `model`.
    pub fn of<M: EmbeddingModel>(model: &M) -> Self {
        if model.has_index() {
            Self::Indexed
        } else {
            Self::NoIndex
        }
    }
}

/// Build the index and save the model back to where it was loaded from.
///
/// A model that already has an index is left untouched, whatever `quantizer`
/// names.
pub fn train_index<M: EmbeddingModel>(
    lifecycle: &mut ModelLifecycle<M>,
    size: usize,
    quantizer: &str,
    stderr: &mut dyn Write,
) -> Result<Outcome> {
    match IndexState::of(lifecycle.model()) {
        IndexState::Indexed => {
            writeln!(stderr, "{ALREADY_INDEXED}")?;
            Ok(Outcome::AlreadyIndexed)
        }
        IndexState::NoIndex => {
            let quantizer: IndexQuantizer =
                quantizer.parse().map_err(|e: IndexError| CliError::Usage {
                    message: e.to_string(),
                    usage: usage("train-index"),
                })?;
            info!("Training {quantizer} index with {size} partitions");
            lifecycle.model_mut().train_index(size, quantizer)?;
            let path = lifecycle.save(None)?;
            info!("Saved indexed model to {}", path.display());
            Ok(Outcome::Success)
        }
    }
}

/// Predict the top `k` labels of every line through the index.
pub fn approx_predict<M: EmbeddingModel>(
    model: &M,
    input: &mut dyn BufRead,
    k: usize,
    nprobe: usize,
    out: &mut dyn Write,
) -> Result<()> {
    if IndexState::of(model) == IndexState::NoIndex {
        return Err(CliError::Precondition {
            message: "Model has no approximate search index, run train-index first".to_string(),
            usage: usage("approx-predict"),
        });
    }
    for line in lossy_lines(input) {
        let predictions = model.approx_predict(&line?, k, nprobe)?;
        write_predictions(out, &predictions, true)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeModel, read_fake_model, write_fake_model};
    use pretty_assertions::assert_eq;
    use std::io::Cursor;
    use tempfile::TempDir;

    #[test]
    fn test_train_index_once() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("m.bin");
        write_fake_model(&path, &FakeModel::default());

        let mut lifecycle = ModelLifecycle::<FakeModel>::load(&path).unwrap();
        let mut stderr = Vec::new();
        let outcome = train_index(&mut lifecycle, 16, "sq8", &mut stderr).unwrap();
        assert_eq!(outcome, Outcome::Success);
        assert!(stderr.is_empty());

        let saved = read_fake_model(&path);
        assert_eq!(saved.index, Some((16, "SQ8".to_string())));
        assert_eq!(saved.index_builds, 1);
    }

    #[test]
    fn test_train_index_refuses_rebuild() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("m.bin");
        let indexed = FakeModel {
            index: Some((4096, "Flat".to_string())),
            index_builds: 1,
            ..FakeModel::default()
        };
        write_fake_model(&path, &indexed);
        let before = std::fs::read(&path).unwrap();

        let mut lifecycle = ModelLifecycle::<FakeModel>::load(&path).unwrap();
        let mut stderr = Vec::new();
        let outcome = train_index(&mut lifecycle, 8, "IVF4096,PQ16", &mut stderr).unwrap();
        assert_eq!(outcome, Outcome::AlreadyIndexed);
        assert_eq!(String::from_utf8(stderr).unwrap(), format!("{ALREADY_INDEXED}\n"));
        assert_eq!(lifecycle.model().index_builds, 1);
        assert_eq!(std::fs::read(&path).unwrap(), before);
    }

    #[test]
    fn test_unknown_quantizer_builds_nothing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("m.bin");
        write_fake_model(&path, &FakeModel::default());
        let before = std::fs::read(&path).unwrap();

        let mut lifecycle = ModelLifecycle::<FakeModel>::load(&path).unwrap();
        let err = train_index(&mut lifecycle, 16, "IVF4096,PQ16", &mut Vec::new()).unwrap_err();
        assert!(matches!(err, CliError::Usage { .. }));
        assert!(err.usage().unwrap().contains("train-index"));
        assert_eq!(lifecycle.model().index_builds, 0);
        assert_eq!(std::fs::read(&path).unwrap(), before);
    }

    #[test]
    fn test_approx_predict_requires_index() {
        let model = FakeModel::default();
        assert_eq!(IndexState::of(&model), IndexState::NoIndex);
        let mut out = Vec::new();
        let err = approx_predict(&model, &mut Cursor::new("a line\n"), 1, 256, &mut out)
            .unwrap_err();
        assert!(matches!(err, CliError::Precondition { .. }));
        assert!(err.usage().unwrap().contains("approx-predict"));
        assert!(out.is_empty());
    }

    #[test]
    fn test_approx_predict_prints_scores() {
        let model = FakeModel {
            index: Some((4, "Flat".to_string())),
            ..FakeModel::default()
        };
        let mut out = Vec::new();
        approx_predict(&model, &mut Cursor::new("first\n\nthird\n"), 2, 8, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "__label__a 2.00000 __label__b 1.00000\n\n__label__a 2.00000 __label__b 1.00000\n"
        );
    }
}
