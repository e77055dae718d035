//! The trained model: training, persistence and inference.

use std::cell::OnceCell;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

use ftext_index::{IndexQuantizer, IvfIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::Embedding;
use crate::args::{Args, LossName, ModelName};
use crate::dictionary::{Dictionary, EOS};
use crate::error::{EmbeddingError, Result};
use crate::matrix::{DenseMatrix, Matrix};
use crate::meter::Meter;
use crate::model::{Trainer, compute_hidden, pick};
use crate::quantize::{QuantMatrix, select_by_norm};
use crate::similarity::{
    Prediction, add_scaled, dot_product, norm, normalize, sigmoid, softmax, top_k,
};
use crate::text::lossy_lines;

/// File signature, "FTXT" in little-endian byte order.
const MODEL_MAGIC: u32 = 0x5458_5446;
const MODEL_VERSION: u32 = 1;

/// One `to-fvecs` record.
#[derive(Debug, Clone, PartialEq)]
pub struct FvecsRecord {
    /// Hidden representation of the line.
    pub hidden: Embedding,

    /// Output-matrix row of `label`.
    pub output: Embedding,

    /// Gold label of the line, or the top prediction when it has none.
    pub label: String,
}

#[derive(Serialize)]
struct ModelBodyRef<'a> {
    args: &'a Args,
    dictionary: &'a Dictionary,
    input: &'a Matrix,
    output: &'a Matrix,
    index: &'a Option<IvfIndex>,
}

#[derive(Deserialize)]
struct ModelBody {
    args: Args,
    dictionary: Dictionary,
    input: Matrix,
    output: Matrix,
    index: Option<IvfIndex>,
}

/// A word-embedding and text-classification model.
pub struct FastText {
    args: Args,
    dictionary: Dictionary,
    input: Matrix,
    output: Matrix,
    index: Option<IvfIndex>,

    /// Normalized word vectors, built on first `nn`/`analogies` query.
    word_vectors: OnceCell<Vec<Embedding>>,
}

fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|source| EmbeddingError::Open {
        path: path.to_path_buf(),
        source,
    })
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|source| EmbeddingError::Open {
            path: path.to_path_buf(),
            source,
        })
}

/// Write `v` as space-separated components with five decimals.
pub fn write_vector(out: &mut dyn Write, v: &[f32]) -> std::io::Result<()> {
    let mut first = true;
    for x in v {
        if !first {
            out.write_all(b" ")?;
        }
        write!(out, "{x:.5}")?;
        first = false;
    }
    Ok(())
}

impl FastText {
    fn from_parts(
        args: Args,
        dictionary: Dictionary,
        input: Matrix,
        output: Matrix,
        index: Option<IvfIndex>,
    ) -> Self {
        Self {
            args,
            dictionary,
            input,
            output,
            index,
            word_vectors: OnceCell::new(),
        }
    }

    /// Load a model written by [`FastText::save_model`].
    pub fn load_model(path: &Path) -> Result<Self> {
        let invalid = |reason: String| EmbeddingError::InvalidModel {
            path: path.to_path_buf(),
            reason,
        };

        let mut reader = BufReader::new(open(path)?);
        let mut header = [0u8; 8];
        reader
            .read_exact(&mut header)
            .map_err(|_| invalid("file is too short".to_string()))?;
        let magic = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
        let version = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
        if magic != MODEL_MAGIC {
            return Err(invalid("bad file signature".to_string()));
        }
        if version != MODEL_VERSION {
            return Err(invalid(format!("unsupported version {version}")));
        }

        let body: ModelBody =
            bincode::deserialize_from(reader).map_err(|e| invalid(e.to_string()))?;
        let mut dictionary = body.dictionary;
        dictionary.rebuild();

        info!(
            "Loaded {} model from {}: {} words, {} labels, dim {}{}{}",
            body.args.model.as_str(),
            path.display(),
            dictionary.nwords(),
            dictionary.nlabels(),
            body.args.dim,
            if body.input.is_quantized() { ", quantized" } else { "" },
            if body.index.is_some() { ", indexed" } else { "" },
        );
        Ok(Self::from_parts(
            body.args,
            dictionary,
            body.input,
            body.output,
            body.index,
        ))
    }

    /// Persist the model, including any index, to `path`.
    pub fn save_model(&self, path: &Path) -> Result<()> {
        let mut writer = create(path)?;
        writer.write_all(&MODEL_MAGIC.to_le_bytes())?;
        writer.write_all(&MODEL_VERSION.to_le_bytes())?;
        let body = ModelBodyRef {
            args: &self.args,
            dictionary: &self.dictionary,
            input: &self.input,
            output: &self.output,
            index: &self.index,
        };
        bincode::serialize_into(&mut writer, &body)?;
        writer.flush()?;
        info!("Saved model to {}", path.display());
        Ok(())
    }

    /// Train a model from the file named by `args.input`.
    pub fn train(args: &Args) -> Result<Self> {
        let input_path = args.input_path()?;
        if args.thread > 1 {
            debug!("Ignoring -thread {}: training is single-threaded", args.thread);
        }

        let mut dictionary = Dictionary::new(args);
        dictionary.read_from(BufReader::new(open(input_path)?), args)?;
        let supervised = args.model == ModelName::Supervised;
        if supervised && dictionary.nlabels() == 0 {
            return Err(EmbeddingError::NoLabels {
                prefix: args.label.clone(),
            });
        }

        let mut rng = StdRng::seed_from_u64(args.seed);
        let mut input = DenseMatrix::uniform(
            dictionary.nwords() + args.bucket,
            args.dim,
            1.0 / args.dim as f32,
            &mut rng,
        );
        let (rows, counts) = if supervised {
            (dictionary.nlabels(), dictionary.label_counts())
        } else {
            (dictionary.nwords(), dictionary.word_counts())
        };
        let mut output = DenseMatrix::zeros(rows, args.dim);
        let mut trainer = Trainer::new(args, &counts, &mut rng);

        let total = (args.epoch as u64 * dictionary.ntokens()).max(1);
        let mut processed = 0u64;
        let mut since_update = 0u64;
        let mut lr = args.lr as f32;

        for epoch in 0..args.epoch {
            let reader = BufReader::new(open(input_path)?);
            for line in lossy_lines(reader) {
                let line = line?;
                match args.model {
                    ModelName::Supervised => {
                        let example = dictionary.supervised_line(&line);
                        if !example.labels.is_empty() && !example.features.is_empty() {
                            let target = example.labels[pick(&mut rng, example.labels.len())];
                            trainer.update(&mut input, &mut output, &example.features, target, lr);
                        }
                    }
                    ModelName::Skipgram | ModelName::Cbow => {
                        let words: Vec<usize> = dictionary
                            .word_ids(&line)
                            .into_iter()
                            .filter(|&id| !dictionary.discard(id, rng.random::<f32>()))
                            .collect();
                        for w in 0..words.len() {
                            let boundary = 1 + pick(&mut rng, args.ws);
                            let end = (w + boundary + 1).min(words.len());
                            let context =
                                (w.saturating_sub(boundary)..end).filter(|&c| c != w);
                            if args.model == ModelName::Skipgram {
                                let rows = dictionary.subwords(words[w]);
                                for c in context {
                                    trainer.update(&mut input, &mut output, rows, words[c], lr);
                                }
                            } else {
                                let bag: Vec<usize> = context
                                    .flat_map(|c| dictionary.subwords(words[c]).iter().copied())
                                    .collect();
                                trainer.update(&mut input, &mut output, &bag, words[w], lr);
                            }
                        }
                    }
                }

                let tokens = line.split_whitespace().count() as u64 + 1;
                processed += tokens;
                since_update += tokens;
                if since_update > args.lr_update_rate {
                    since_update = 0;
                    let progress = (processed as f64 / total as f64).min(1.0);
                    lr = (args.lr * (1.0 - progress)) as f32;
                }
            }

            let loss = trainer.take_average_loss();
            if args.verbose >= 2 {
                info!("Epoch {}/{}: avg loss {loss:.6}, lr {lr:.6}", epoch + 1, args.epoch);
            } else {
                debug!("Epoch {}/{}: avg loss {loss:.6}, lr {lr:.6}", epoch + 1, args.epoch);
            }
        }

        Ok(Self::from_parts(
            args.clone(),
            dictionary,
            Matrix::Dense(input),
            Matrix::Dense(output),
            None,
        ))
    }

    /// Vector dimension.
    pub fn dimension(&self) -> usize {
        self.input.cols()
    }

    /// Whether the model is a classifier.
    pub fn is_supervised(&self) -> bool {
        self.args.model == ModelName::Supervised
    }

    /// Whether the input matrix is quantized.
    pub fn is_quantized(&self) -> bool {
        self.input.is_quantized()
    }

    /// Whether an approximate search index is attached.
    pub fn has_index(&self) -> bool {
        self.index.is_some()
    }

    fn require_supervised(&self, operation: &str) -> Result<()> {
        if self.is_supervised() {
            Ok(())
        } else {
            Err(EmbeddingError::Unsupported(format!(
                "{operation} needs a supervised model"
            )))
        }
    }

    /// Compress the model in place.
    pub fn quantize(&mut self, qargs: &Args) -> Result<()> {
        self.require_supervised("quantization")?;
        let (Matrix::Dense(input), Matrix::Dense(output)) = (&self.input, &self.output) else {
            return Err(EmbeddingError::Unsupported(
                "model is already quantized".to_string(),
            ));
        };

        let nwords = self.dictionary.nwords();
        let input = if qargs.cutoff > 0 && qargs.cutoff < nwords {
            let keep = select_by_norm(input, nwords, qargs.cutoff, self.dictionary.id(EOS));
            let rows = keep
                .iter()
                .copied()
                .chain(nwords..input.rows())
                .map(|i| input.row(i).to_vec());
            let pruned = DenseMatrix::from_rows(input.cols(), rows);
            self.dictionary.retain_words(&keep);
            info!("Pruned vocabulary from {nwords} to {} words", keep.len());
            QuantMatrix::from_dense(&pruned, qargs.qnorm)
        } else {
            QuantMatrix::from_dense(input, qargs.qnorm)
        };
        let output = qargs
            .qout
            .then(|| QuantMatrix::from_dense(output, qargs.qnorm));

        self.input = Matrix::Quantized(input);
        if let Some(output) = output {
            self.output = Matrix::Quantized(output);
        }
        self.args.cutoff = qargs.cutoff;
        self.args.qnorm = qargs.qnorm;
        self.args.qout = qargs.qout;
        self.word_vectors = OnceCell::new();
        Ok(())
    }

    /// Vector of any word, averaged over its sub-words.
    pub fn word_vector(&self, word: &str) -> Embedding {
        compute_hidden(&self.input, &self.dictionary.subwords_of(word))
    }

    /// Vector of a line of text.
    ///
    /// Classifiers use their hidden layer; unsupervised models average the
    /// normalized vectors of the words.
    pub fn sentence_vector(&self, line: &str) -> Embedding {
        if self.is_supervised() {
            let example = self.dictionary.supervised_line(line);
            return compute_hidden(&self.input, &example.features);
        }

        let mut sum = vec![0.0; self.dimension()];
        let mut count = 0usize;
        for word in line.split_whitespace() {
            let mut v = self.word_vector(word);
            if norm(&v) > 0.0 {
                normalize(&mut v);
                add_scaled(&mut sum, &v, 1.0);
                count += 1;
            }
        }
        if count > 0 {
            let n = count as f32;
            sum.iter_mut().for_each(|x| *x /= n);
        }
        sum
    }

    /// The word and each of its character n-grams with their vectors.
    pub fn ngram_vectors(&self, word: &str) -> Vec<(String, Embedding)> {
        self.dictionary
            .subword_strings(word)
            .into_iter()
            .map(|(ngram, row)| (ngram, self.input.row_vec(row)))
            .collect()
    }

    fn normalized_word_vectors(&self) -> &[Embedding] {
        self.word_vectors.get_or_init(|| {
            debug!("Precomputing {} word vectors", self.dictionary.nwords());
            (0..self.dictionary.nwords())
                .map(|id| {
                    let mut v = compute_hidden(&self.input, self.dictionary.subwords(id));
                    normalize(&mut v);
                    v
                })
                .collect()
        })
    }

    fn nearest(&self, mut query: Embedding, banned: &[&str], k: usize) -> Vec<Prediction> {
        normalize(&mut query);
        let vectors = self.normalized_word_vectors();
        let scores = vectors
            .iter()
            .enumerate()
            .filter(|(id, _)| !banned.contains(&self.dictionary.word(*id)))
            .map(|(id, v)| (dot_product(v, &query), id));
        top_k(scores, k)
            .into_iter()
            .map(|(score, id)| Prediction::new(self.dictionary.word(id), score))
            .collect()
    }

    /// The `k` words closest to `word` by cosine similarity.
    pub fn nn(&self, word: &str, k: usize) -> Vec<Prediction> {
        self.nearest(self.word_vector(word), &[word], k)
    }

    /// The `k` words closest to `a - b + c`.
    pub fn analogies(&self, a: &str, b: &str, c: &str, k: usize) -> Vec<Prediction> {
        let mut query = vec![0.0; self.dimension()];
        for (word, sign) in [(a, 1.0), (b, -1.0), (c, 1.0)] {
            let mut v = self.word_vector(word);
            normalize(&mut v);
            add_scaled(&mut query, &v, sign);
        }
        self.nearest(query, &[a, b, c], k)
    }

    fn label_scores(&self, hidden: &[f32]) -> Vec<f32> {
        let mut scores: Vec<f32> = (0..self.output.rows())
            .map(|i| self.output.dot_row(hidden, i))
            .collect();
        match self.args.loss {
            LossName::Softmax => softmax(&mut scores),
            LossName::NegativeSampling => scores.iter_mut().for_each(|s| *s = sigmoid(*s)),
        }
        scores
    }

    fn predict_ids(&self, features: &[usize], k: usize) -> Vec<(f32, usize)> {
        if features.is_empty() {
            return Vec::new();
        }
        let hidden = compute_hidden(&self.input, features);
        top_k(self.label_scores(&hidden).into_iter().zip(0..), k)
    }

    /// Top `k` labels of one line with their probabilities.
    pub fn predict(&self, line: &str, k: usize) -> Result<Vec<Prediction>> {
        self.require_supervised("prediction")?;
        let example = self.dictionary.supervised_line(line);
        Ok(self
            .predict_ids(&example.features, k)
            .into_iter()
            .map(|(p, id)| Prediction::new(self.dictionary.label(id), p))
            .collect())
    }

    /// Precision and recall at `k` over labeled lines of `reader`.
    pub fn test(&self, reader: &mut dyn BufRead, k: usize) -> Result<Meter> {
        self.require_supervised("evaluation")?;
        let mut meter = Meter::default();
        for line in lossy_lines(reader) {
            let example = self.dictionary.supervised_line(&line?);
            if example.labels.is_empty() || example.features.is_empty() {
                continue;
            }
            let predicted: Vec<usize> = self
                .predict_ids(&example.features, k)
                .into_iter()
                .map(|(_, id)| id)
                .collect();
            meter.log(&example.labels, &predicted);
        }
        Ok(meter)
    }

    /// Build an inverted-file index over the output matrix.
    ///
    /// Replaces any existing index; callers decide whether rebuilding is allowed.
    pub fn train_index(&mut self, size: usize, quantizer: IndexQuantizer) -> Result<()> {
        self.require_supervised("approximate search")?;
        let rows: Vec<Embedding> = (0..self.output.rows())
            .map(|i| self.output.row_vec(i))
            .collect();
        let vectors: Vec<&[f32]> = rows.iter().map(Vec::as_slice).collect();
        self.index = Some(IvfIndex::train(&vectors, size, quantizer, self.args.seed)?);
        Ok(())
    }

    /// Top `k` labels of one line by inner product, probing `nprobe` partitions.
    pub fn approx_predict(&self, line: &str, k: usize, nprobe: usize) -> Result<Vec<Prediction>> {
        let index = self.index.as_ref().ok_or(EmbeddingError::MissingIndex)?;
        let example = self.dictionary.supervised_line(line);
        if example.features.is_empty() {
            return Ok(Vec::new());
        }
        let hidden = compute_hidden(&self.input, &example.features);
        Ok(index
            .search(&hidden, k, nprobe)?
            .into_iter()
            .map(|n| Prediction::new(self.dictionary.label(n.id as usize), n.score))
            .collect())
    }

    /// Hidden vector, label output row and label of one line.
    ///
    /// Returns `None` for lines without any known feature.
    pub fn fvecs_record(&self, line: &str) -> Result<Option<FvecsRecord>> {
        self.require_supervised("fvecs export")?;
        let example = self.dictionary.supervised_line(line);
        if example.features.is_empty() {
            return Ok(None);
        }
        let label = match example.labels.first() {
            Some(&label) => label,
            None => match self.predict_ids(&example.features, 1).first() {
                Some(&(_, label)) => label,
                None => return Ok(None),
            },
        };
        Ok(Some(FvecsRecord {
            hidden: compute_hidden(&self.input, &example.features),
            output: self.output.row_vec(label),
            label: self.dictionary.label(label).to_string(),
        }))
    }

    /// Write word vectors in text format (`<nwords> <dim>` header).
    pub fn save_vectors(&self, path: &Path) -> Result<()> {
        let mut out = create(path)?;
        writeln!(out, "{} {}", self.dictionary.nwords(), self.dimension())?;
        for id in 0..self.dictionary.nwords() {
            write!(out, "{} ", self.dictionary.word(id))?;
            write_vector(&mut out, &compute_hidden(&self.input, self.dictionary.subwords(id)))?;
            writeln!(out)?;
        }
        out.flush()?;
        info!("Saved word vectors to {}", path.display());
        Ok(())
    }

    /// Write output-matrix rows in text format, named by label or word.
    pub fn save_output(&self, path: &Path) -> Result<()> {
        let mut out = create(path)?;
        writeln!(out, "{} {}", self.output.rows(), self.output.cols())?;
        for i in 0..self.output.rows() {
            let name = if self.is_supervised() {
                self.dictionary.label(i)
            } else {
                self.dictionary.word(i)
            };
            write!(out, "{name} ")?;
            write_vector(&mut out, &self.output.row_vec(i))?;
            writeln!(out)?;
        }
        out.flush()?;
        info!("Saved output vectors to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;
    use tempfile::TempDir;

    const TRAIN: &str = "\
__label__sports the team won the match
__label__sports a great goal in the final match
__label__food the soup was hot and tasty
__label__food fresh bread and tasty cheese
__label__sports the team lost the final
__label__food hot soup with fresh bread
";

    fn flags(line: &str) -> Vec<String> {
        line.split_whitespace().map(str::to_string).collect()
    }

    fn train_supervised(dir: &TempDir, extra: &str) -> FastText {
        let data = dir.path().join("train.txt");
        std::fs::write(&data, TRAIN).unwrap();
        let line = format!(
            "-input {} -output {} -dim 8 -epoch 30 -lr 0.5 {extra}",
            data.display(),
            dir.path().join("model").display()
        );
        let args = Args::for_training(ModelName::Supervised, &flags(&line)).unwrap();
        FastText::train(&args).unwrap()
    }

    #[test]
    fn test_supervised_model_learns_labels() {
        let dir = TempDir::new().unwrap();
        let model = train_supervised(&dir, "");

        let sports = model.predict("the team won the final match", 1).unwrap();
        assert_eq!(sports[0].label, "__label__sports");
        let food = model.predict("hot soup and fresh bread", 2).unwrap();
        assert_eq!(food[0].label, "__label__food");
        assert_eq!(food.len(), 2);
        assert!(food[0].score >= food[1].score);

        let meter = model.test(&mut Cursor::new(TRAIN), 1).unwrap();
        assert_eq!(meter.examples, 6);
        assert!(meter.precision() > 0.8);
    }

    #[test]
    fn test_training_tolerates_invalid_utf8() {
        let dir = TempDir::new().unwrap();
        let data = dir.path().join("train.txt");
        let mut bytes = TRAIN.as_bytes().to_vec();
        bytes.extend_from_slice(b"__label__food caf\xe9 au lait\n");
        std::fs::write(&data, bytes).unwrap();
        let line = format!(
            "-input {} -output {} -dim 8 -epoch 5",
            data.display(),
            dir.path().join("model").display()
        );
        let args = Args::for_training(ModelName::Supervised, &flags(&line)).unwrap();

        let model = FastText::train(&args).unwrap();
        assert!(model.dictionary.id("caf\u{fffd}").is_some());
        let mut queries = Cursor::new(b"__label__food caf\xe9 soup\n".to_vec());
        assert_eq!(model.test(&mut queries, 1).unwrap().examples, 1);
    }

    #[test]
    fn test_save_and_load_preserves_predictions() {
        let dir = TempDir::new().unwrap();
        let model = train_supervised(&dir, "");
        let path = dir.path().join("model.bin");
        model.save_model(&path).unwrap();

        let loaded = FastText::load_model(&path).unwrap();
        assert_eq!(loaded.dimension(), 8);
        assert!(!loaded.has_index());
        assert_eq!(
            loaded.predict("tasty cheese", 2).unwrap(),
            model.predict("tasty cheese", 2).unwrap()
        );
    }

    #[test]
    fn test_load_rejects_foreign_files() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bogus.bin");
        std::fs::write(&path, b"not a model at all").unwrap();
        assert!(matches!(
            FastText::load_model(&path),
            Err(EmbeddingError::InvalidModel { .. })
        ));
        assert!(matches!(
            FastText::load_model(&dir.path().join("missing.bin")),
            Err(EmbeddingError::Open { .. })
        ));
    }

    #[test]
    fn test_index_round_trip_and_approx_predict() {
        let dir = TempDir::new().unwrap();
        let mut model = train_supervised(&dir, "");
        assert!(matches!(
            model.approx_predict("the team", 1, 1),
            Err(EmbeddingError::MissingIndex)
        ));

        model.train_index(4096, IndexQuantizer::Flat).unwrap();
        let path = dir.path().join("model.bin");
        model.save_model(&path).unwrap();
        let loaded = FastText::load_model(&path).unwrap();
        assert!(loaded.has_index());

        let exact = loaded.predict("the team won the match", 1).unwrap();
        let approx = loaded.approx_predict("the team won the match", 1, 256).unwrap();
        assert_eq!(approx[0].label, exact[0].label);
    }

    #[test]
    fn test_quantize_keeps_predictions_usable() {
        let dir = TempDir::new().unwrap();
        let mut model = train_supervised(&dir, "");
        let qargs = Args::for_quantize(&flags("-output m -qnorm -qout")).unwrap();
        model.quantize(&qargs).unwrap();
        assert!(model.is_quantized());
        assert_eq!(
            model.predict("the team won the match", 1).unwrap()[0].label,
            "__label__sports"
        );
        assert!(model.quantize(&qargs).is_err());
    }

    #[test]
    fn test_quantize_cutoff_prunes_vocabulary() {
        let dir = TempDir::new().unwrap();
        let mut model = train_supervised(&dir, "");
        let qargs = Args::for_quantize(&flags("-output m -cutoff 5")).unwrap();
        model.quantize(&qargs).unwrap();
        assert_eq!(model.dictionary.nwords(), 5);
        assert!(model.dictionary.id(EOS).is_some());
    }

    #[test]
    fn test_vectors_have_model_dimension() {
        let dir = TempDir::new().unwrap();
        let model = train_supervised(&dir, "-minn 2 -maxn 3 -bucket 1000");
        assert_eq!(model.word_vector("team").len(), 8);
        assert_eq!(model.word_vector("unseenword").len(), 8);
        assert_eq!(model.sentence_vector("the soup").len(), 8);

        let ngrams = model.ngram_vectors("team");
        assert_eq!(ngrams[0].0, "team");
        assert!(ngrams.iter().all(|(_, v)| v.len() == 8));

        let neighbors = model.nn("soup", 3);
        assert_eq!(neighbors.len(), 3);
        assert!(neighbors.iter().all(|p| p.label != "soup"));
        let analogies = model.analogies("soup", "hot", "team", 2);
        assert!(analogies.iter().all(|p| !["soup", "hot", "team"].contains(&p.label.as_str())));
    }

    #[test]
    fn test_fvecs_record_uses_gold_label() {
        let dir = TempDir::new().unwrap();
        let model = train_supervised(&dir, "");
        let record = model
            .fvecs_record("__label__food the team won")
            .unwrap()
            .unwrap();
        assert_eq!(record.label, "__label__food");
        assert_eq!(record.hidden.len(), 8);
        assert_eq!(record.output.len(), 8);

        let unlabeled = model.fvecs_record("hot soup").unwrap().unwrap();
        assert_eq!(unlabeled.label, "__label__food");
        assert!(model.fvecs_record("").unwrap().is_some());
    }

    #[test]
    fn test_unsupervised_training_and_exports() {
        let dir = TempDir::new().unwrap();
        let data = dir.path().join("text.txt");
        std::fs::write(&data, TRAIN.replace("__label__", "")).unwrap();
        let line = format!(
            "-input {} -output m -dim 6 -epoch 2 -minCount 1 -bucket 500",
            data.display()
        );

        for model_name in [ModelName::Skipgram, ModelName::Cbow] {
            let args = Args::for_training(model_name, &flags(&line)).unwrap();
            let model = FastText::train(&args).unwrap();
            assert!(!model.is_supervised());
            assert!(model.predict("the team", 1).is_err());
            assert_eq!(model.sentence_vector("the team won").len(), 6);

            let vec_path = dir.path().join("m.vec");
            model.save_vectors(&vec_path).unwrap();
            let text = std::fs::read_to_string(&vec_path).unwrap();
            let header = text.lines().next().unwrap();
            assert_eq!(header, format!("{} 6", model.dictionary.nwords()));
            let first = text.lines().nth(1).unwrap();
            assert_eq!(first.split_whitespace().count(), 7);
        }
    }

    #[test]
    fn test_supervised_training_requires_labels() {
        let dir = TempDir::new().unwrap();
        let data = dir.path().join("plain.txt");
        std::fs::write(&data, "no labels here\n").unwrap();
        let line = format!("-input {} -output m", data.display());
        let args = Args::for_training(ModelName::Supervised, &flags(&line)).unwrap();
        assert!(matches!(
            FastText::train(&args),
            Err(EmbeddingError::NoLabels { .. })
        ));
    }
}
