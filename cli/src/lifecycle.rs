//! Loading, mutating and persisting the model of one invocation.

use std::path::{Path, PathBuf};

use ftext_embeddings::{Args, EmbeddingError};
use tracing::info;

use crate::error::Result;
use crate::model::EmbeddingModel;
use crate::streams::with_suffix;

/// Extension of a full-precision model.
pub const MODEL_EXTENSION: &str = ".bin";

/// Extension of a quantized model.
pub const QUANTIZED_EXTENSION: &str = ".ftz";

/// Extension of the word vector text file.
pub const VECTORS_EXTENSION: &str = ".vec";

/// Extension of the output vector text file.
pub const OUTPUT_EXTENSION: &str = ".output";

/// Where `save` writes when no explicit path is given.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Destination {
    /// Back to the file the model was loaded from.
    Source(PathBuf),

    /// `<prefix>.bin`, or `<prefix>.ftz` once quantized.
    Prefix(PathBuf),
}

/// The model handle of one command.
///
/// Nothing is written to disk unless [`ModelLifecycle::save`] or
/// [`ModelLifecycle::save_artifacts`] is called.
pub struct ModelLifecycle<M> {
    model: M,
    destination: Destination,
    save_output: bool,
}

fn output_prefix(args: &Args) -> Result<PathBuf> {
    Ok(args
        .output_prefix()
        .map_err(EmbeddingError::from)?
        .to_path_buf())
}

impl<M: EmbeddingModel> ModelLifecycle<M> {
    /// Load the model stored at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let model = M::load_model(path)?;
        Ok(Self {
            model,
            destination: Destination::Source(path.to_path_buf()),
            save_output: false,
        })
    }

    /// Train a new model as configured by `args`.
    pub fn train(args: &Args) -> Result<Self> {
        let destination = Destination::Prefix(output_prefix(args)?);
        info!("Training {} model", args.model.as_str());
        let model = M::train(args)?;
        Ok(Self {
            model,
            destination,
            save_output: args.save_output,
        })
    }

    /// Load `<output>.bin` as the starting point of `quantize`.
    pub fn load_for_quantize(args: &Args) -> Result<Self> {
        let prefix = output_prefix(args)?;
        let model = M::load_model(&with_suffix(&prefix, MODEL_EXTENSION))?;
        Ok(Self {
            model,
            destination: Destination::Prefix(prefix),
            save_output: false,
        })
    }

    /// Compress the loaded model in place.
    pub fn quantize(&mut self, args: &Args) -> Result<()> {
        self.model.quantize(args)?;
        Ok(())
    }

    /// The model.
    pub fn model(&self) -> &M {
        &self.model
    }

    /// The model, for in-place mutation.
    pub fn model_mut(&mut self) -> &mut M {
        &mut self.model
    }

    /// Path `save(None)` writes to.
    pub fn default_path(&self) -> PathBuf {
        match &self.destination {
            Destination::Source(path) => path.clone(),
            Destination::Prefix(prefix) => {
                let extension = if self.model.is_quantized() {
                    QUANTIZED_EXTENSION
                } else {
                    MODEL_EXTENSION
                };
                with_suffix(prefix, extension)
            }
        }
    }

    /// Persist the model to `path`, or to [`ModelLifecycle::default_path`].
    pub fn save(&self, path: Option<&Path>) -> Result<PathBuf> {
        let path = path.map_or_else(|| self.default_path(), Path::to_path_buf);
        self.model.save_model(&path)?;
        Ok(path)
    }

    /// Write the text exports that follow training: `<prefix>.vec` and,
    /// when configured, `<prefix>.output`.
    pub fn save_artifacts(&self) -> Result<()> {
        let Destination::Prefix(prefix) = &self.destination else {
            return Ok(());
        };
        let vectors = with_suffix(prefix, VECTORS_EXTENSION);
        self.model.save_vectors(&vectors)?;
        if self.save_output {
            let output = with_suffix(prefix, OUTPUT_EXTENSION);
            self.model.save_output(&output)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeModel, write_fake_model};
    use ftext_embeddings::ModelName;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn flags(line: &str) -> Vec<String> {
        line.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn test_train_saves_to_prefix() {
        let dir = TempDir::new().unwrap();
        let data = dir.path().join("train.txt");
        std::fs::write(&data, "__label__a hello world\n").unwrap();
        let prefix = dir.path().join("model");
        let args = Args::for_training(
            ModelName::Supervised,
            &flags(&format!(
                "-input {} -output {} -dim 4 -saveOutput",
                data.display(),
                prefix.display()
            )),
        )
        .unwrap();

        let lifecycle = ModelLifecycle::<FakeModel>::train(&args).unwrap();
        assert_eq!(lifecycle.model().dimension, 4);
        assert!(!with_suffix(&prefix, ".bin").exists(), "train must not save");

        let saved = lifecycle.save(None).unwrap();
        assert_eq!(saved, with_suffix(&prefix, ".bin"));
        lifecycle.save_artifacts().unwrap();
        assert!(with_suffix(&prefix, ".vec").exists());
        assert!(with_suffix(&prefix, ".output").exists());
    }

    #[test]
    fn test_quantize_writes_ftz_next_to_bin() {
        let dir = TempDir::new().unwrap();
        let prefix = dir.path().join("model");
        write_fake_model(&with_suffix(&prefix, ".bin"), &FakeModel::default());

        let args = Args::for_quantize(&flags(&format!("-output {}", prefix.display()))).unwrap();
        let mut lifecycle = ModelLifecycle::<FakeModel>::load_for_quantize(&args).unwrap();
        assert_eq!(lifecycle.default_path(), with_suffix(&prefix, ".bin"));
        lifecycle.quantize(&args).unwrap();
        assert_eq!(lifecycle.save(None).unwrap(), with_suffix(&prefix, ".ftz"));

        let reloaded = ModelLifecycle::<FakeModel>::load(&with_suffix(&prefix, ".ftz")).unwrap();
        assert!(reloaded.model().quantized);
    }

    #[test]
    fn test_loaded_model_saves_back_to_source() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("m.bin");
        write_fake_model(&path, &FakeModel::default());

        let lifecycle = ModelLifecycle::<FakeModel>::load(&path).unwrap();
        assert_eq!(lifecycle.default_path(), path);
        let other = dir.path().join("copy.bin");
        assert_eq!(lifecycle.save(Some(&other)).unwrap(), other);
        assert!(other.exists());
        lifecycle.save_artifacts().unwrap();
        assert!(!dir.path().join("m.bin.vec").exists());
    }

    #[test]
    fn test_load_failure_is_model_error() {
        let dir = TempDir::new().unwrap();
        let err = ModelLifecycle::<FakeModel>::load(&dir.path().join("missing.bin"))
            .err()
            .unwrap();
        assert!(matches!(err, crate::error::CliError::Model(_)));
    }
}
