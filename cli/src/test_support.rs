//! A scripted model for exercising commands without training.

use std::io::BufRead;
use std::path::Path;

use ftext_embeddings::{
    Args, Embedding, EmbeddingError, FvecsRecord, IndexQuantizer, Meter, Prediction, Result,
    lossy_lines,
};
use serde::{Deserialize, Serialize};

use crate::model::EmbeddingModel;

const LABEL_PREFIX: &str = "__label__";

/// Model whose answers are fully determined by its JSON fixture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct FakeModel {
    pub dimension: usize,
    pub words: Vec<String>,
    pub labels: Vec<String>,
    pub quantized: bool,
    pub index: Option<(usize, String)>,
    pub index_builds: u32,
}

impl Default for FakeModel {
    fn default() -> Self {
        Self {
            dimension: 3,
            words: vec!["king".into(), "queen".into(), "man".into(), "woman".into()],
            labels: vec!["__label__a".into(), "__label__b".into()],
            quantized: false,
            index: None,
            index_builds: 0,
        }
    }
}

/// Write `model` as a fixture file.
pub(crate) fn write_fake_model(path: &Path, model: &FakeModel) {
    model.save_model(path).unwrap();
}

/// Read a fixture file back.
pub(crate) fn read_fake_model(path: &Path) -> FakeModel {
    FakeModel::load_model(path).unwrap()
}

fn scored(names: impl IntoIterator<Item = String>, k: usize, base: f32) -> Vec<Prediction> {
    names
        .into_iter()
        .take(k)
        .enumerate()
        .map(|(i, name)| Prediction::new(name, base / (i + 1) as f32))
        .collect()
}

impl FakeModel {
    fn label_ids(&self, line: &str) -> Vec<usize> {
        line.split_whitespace()
            .filter_map(|t| self.labels.iter().position(|l| l == t))
            .collect()
    }
}

impl EmbeddingModel for FakeModel {
    fn load_model(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|source| EmbeddingError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_slice(&bytes).map_err(|e| EmbeddingError::InvalidModel {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    fn train(args: &Args) -> Result<Self> {
        let text = std::fs::read_to_string(args.input_path()?)?;
        let mut model = Self {
            dimension: args.dim,
            words: Vec::new(),
            labels: Vec::new(),
            ..Self::default()
        };
        for token in text.split_whitespace() {
            let list = if token.starts_with(LABEL_PREFIX) {
                &mut model.labels
            } else {
                &mut model.words
            };
            if !list.iter().any(|t| t == token) {
                list.push(token.to_string());
            }
        }
        Ok(model)
    }

    fn save_model(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_vec_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    fn save_vectors(&self, path: &Path) -> Result<()> {
        std::fs::write(path, format!("{} {}\n", self.words.len(), self.dimension))?;
        Ok(())
    }

    fn save_output(&self, path: &Path) -> Result<()> {
        std::fs::write(path, format!("{} {}\n", self.labels.len(), self.dimension))?;
        Ok(())
    }

    fn quantize(&mut self, _args: &Args) -> Result<()> {
        if self.quantized {
            return Err(EmbeddingError::Unsupported("already quantized".into()));
        }
        self.quantized = true;
        Ok(())
    }

    fn is_quantized(&self) -> bool {
        self.quantized
    }

    fn word_vector(&self, word: &str) -> Embedding {
        vec![word.len() as f32; self.dimension]
    }

    fn sentence_vector(&self, line: &str) -> Embedding {
        vec![line.split_whitespace().count() as f32; self.dimension]
    }

    fn ngram_vectors(&self, word: &str) -> Vec<(String, Embedding)> {
        std::iter::once(word.to_string())
            .chain(word.chars().map(String::from))
            .map(|g| {
                let v = self.word_vector(&g);
                (g, v)
            })
            .collect()
    }

    fn nn(&self, word: &str, k: usize) -> Vec<Prediction> {
        let others = self.words.iter().filter(|w| *w != word).cloned();
        scored(others, k, 1.0)
    }

    fn analogies(&self, a: &str, b: &str, c: &str, k: usize) -> Vec<Prediction> {
        let others = self
            .words
            .iter()
            .filter(|w| ![a, b, c].contains(&w.as_str()))
            .cloned();
        scored(others, k, 0.5)
    }

    fn predict(&self, line: &str, k: usize) -> Result<Vec<Prediction>> {
        if line.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(scored(self.labels.iter().cloned(), k, 1.0))
    }

    fn test(&self, reader: &mut dyn BufRead, k: usize) -> Result<Meter> {
        let mut meter = Meter::default();
        let predicted: Vec<usize> = (0..self.labels.len().min(k)).collect();
        for line in lossy_lines(reader) {
            let gold = self.label_ids(&line?);
            if !gold.is_empty() {
                meter.log(&gold, &predicted);
            }
        }
        Ok(meter)
    }

    fn has_index(&self) -> bool {
        self.index.is_some()
    }

    fn train_index(&mut self, size: usize, quantizer: IndexQuantizer) -> Result<()> {
        self.index = Some((size, quantizer.to_string()));
        self.index_builds += 1;
        Ok(())
    }

    fn approx_predict(&self, line: &str, k: usize, _nprobe: usize) -> Result<Vec<Prediction>> {
        if self.index.is_none() {
            return Err(EmbeddingError::MissingIndex);
        }
        if line.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(scored(self.labels.iter().cloned(), k, 2.0))
    }

    fn fvecs_record(&self, line: &str) -> Result<Option<FvecsRecord>> {
        if line.trim().is_empty() {
            return Ok(None);
        }
        let label = self
            .label_ids(line)
            .first()
            .map_or_else(|| self.labels[0].clone(), |&id| self.labels[id].clone());
        Ok(Some(FvecsRecord {
            hidden: self.sentence_vector(line),
            output: vec![0.5; self.dimension],
            label,
        }))
    }
}
