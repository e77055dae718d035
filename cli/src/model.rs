//! The capabilities the command layer needs from a model.

use std::io::BufRead;
use std::path::Path;

use ftext_embeddings::{
    Args, Embedding, FastText, FvecsRecord, IndexQuantizer, Meter, Prediction, Result,
};

/// A trained embedding model as seen by the commands.
///
/// Commands never look inside the model; a test double can stand in for
/// [`FastText`].
pub trait EmbeddingModel: Sized {
    /// Read a model from disk.
    fn load_model(path: &Path) -> Result<Self>;

    /// Train a model from scratch.
    fn train(args: &Args) -> Result<Self>;

    /// Write the model to disk.
    fn save_model(&self, path: &Path) -> Result<()>;

    /// Write word vectors in text format.
    fn save_vectors(&self, path: &Path) -> Result<()>;

    /// Write output-layer vectors in text format.
    fn save_output(&self, path: &Path) -> Result<()>;

    /// Compress the model in place.
    fn quantize(&mut self, args: &Args) -> Result<()>;

    /// Whether the model has been compressed.
    fn is_quantized(&self) -> bool;

    fn word_vector(&self, word: &str) -> Embedding;

    fn sentence_vector(&self, line: &str) -> Embedding;

    /// Sub-words of `word` with their vectors.
    fn ngram_vectors(&self, word: &str) -> Vec<(String, Embedding)>;

    /// Nearest words to `word`.
    fn nn(&self, word: &str, k: usize) -> Vec<Prediction>;

    /// Nearest words to `a - b + c`.
    fn analogies(&self, a: &str, b: &str, c: &str, k: usize) -> Vec<Prediction>;

    /// Top `k` labels of one line.
    fn predict(&self, line: &str, k: usize) -> Result<Vec<Prediction>>;

    /// Evaluate on labeled lines.
    fn test(&self, reader: &mut dyn BufRead, k: usize) -> Result<Meter>;

    /// Whether an approximate search index is attached.
    fn has_index(&self) -> bool;

    /// Build the approximate search index. Rebuilds unconditionally.
    fn train_index(&mut self, size: usize, quantizer: IndexQuantizer) -> Result<()>;

    /// Top `k` labels of one line through the index.
    fn approx_predict(&self, line: &str, k: usize, nprobe: usize) -> Result<Vec<Prediction>>;

    /// Hidden and output vectors of one line, `None` when it has no known feature.
    fn fvecs_record(&self, line: &str) -> Result<Option<FvecsRecord>>;
}

impl EmbeddingModel for FastText {
    fn load_model(path: &Path) -> Result<Self> {
        FastText::load_model(path)
    }

    fn train(args: &Args) -> Result<Self> {
        FastText::train(args)
    }

    fn save_model(&self, path: &Path) -> Result<()> {
        FastText::save_model(self, path)
    }

    fn save_vectors(&self, path: &Path) -> Result<()> {
        FastText::save_vectors(self, path)
    }

    fn save_output(&self, path: &Path) -> Result<()> {
        FastText::save_output(self, path)
    }

    fn quantize(&mut self, args: &Args) -> Result<()> {
        FastText::quantize(self, args)
    }

    fn is_quantized(&self) -> bool {
        FastText::is_quantized(self)
    }

    fn word_vector(&self, word: &str) -> Embedding {
        FastText::word_vector(self, word)
    }

    fn sentence_vector(&self, line: &str) -> Embedding {
        FastText::sentence_vector(self, line)
    }

    fn ngram_vectors(&self, word: &str) -> Vec<(String, Embedding)> {
        FastText::ngram_vectors(self, word)
    }

    fn nn(&self, word: &str, k: usize) -> Vec<Prediction> {
        FastText::nn(self, word, k)
    }

    fn analogies(&self, a: &str, b: &str, c: &str, k: usize) -> Vec<Prediction> {
        FastText::analogies(self, a, b, c, k)
    }

    fn predict(&self, line: &str, k: usize) -> Result<Vec<Prediction>> {
        FastText::predict(self, line, k)
    }

    fn test(&self, reader: &mut dyn BufRead, k: usize) -> Result<Meter> {
        FastText::test(self, reader, k)
    }

    fn has_index(&self) -> bool {
        FastText::has_index(self)
    }

    fn train_index(&mut self, size: usize, quantizer: IndexQuantizer) -> Result<()> {
        FastText::train_index(self, size, quantizer)
    }

    fn approx_predict(&self, line: &str, k: usize, nprobe: usize) -> Result<Vec<Prediction>> {
        FastText::approx_predict(self, line, k, nprobe)
    }

    fn fvecs_record(&self, line: &str) -> Result<Option<FvecsRecord>> {
        FastText::fvecs_record(self, line)
    }
}
