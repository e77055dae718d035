//! Training and quantization configuration.
//!
//! Flags use the fastText single-dash convention
//! (`-input data.txt -dim 50`); a double dash is accepted too.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ArgsError;

const HELP_HEADER: &str =
    "The following arguments are available (supervised/unsupervised defaults):\n\n";

/// Which objective a model is trained with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelName {
    /// Text classification against labels.
    Supervised,
    /// Predict context words from the center word.
    Skipgram,
    /// Predict the center word from its context.
    Cbow,
}

impl ModelName {
    /// Command token for this model kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Supervised => "supervised",
            Self::Skipgram => "skipgram",
            Self::Cbow => "cbow",
        }
    }
}

/// Loss used for the output layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossName {
    /// Full softmax over the output rows.
    Softmax,
    /// Binary logistic loss against sampled negatives.
    NegativeSampling,
}

impl FromStr for LossName {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "softmax" => Ok(Self::Softmax),
            "ns" => Ok(Self::NegativeSampling),
            _ => Err(()),
        }
    }
}

/// Configuration for training and quantizing a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Args {
    /// Objective.
    pub model: ModelName,

    /// Training data file.
    pub input: Option<PathBuf>,

    /// Output prefix; artifacts are written to `<output>.bin`, `<output>.vec`, ...
    pub output: Option<PathBuf>,

    /// Initial learning rate.
    pub lr: f64,

    /// Number of tokens between learning rate updates.
    pub lr_update_rate: u64,

    /// Vector dimension.
    pub dim: usize,

    /// Context window size.
    pub ws: usize,

    /// Passes over the training data.
    pub epoch: usize,

    /// Minimal number of word occurrences.
    pub min_count: u64,

    /// Minimal number of label occurrences.
    pub min_count_label: u64,

    /// Negatives sampled per positive.
    pub neg: usize,

    /// Max length of word n-grams.
    pub word_ngrams: usize,

    /// Output loss.
    pub loss: LossName,

    /// Number of hash buckets for n-grams.
    pub bucket: usize,

    /// Min length of character n-grams.
    pub minn: usize,

    /// Max length of character n-grams.
    pub maxn: usize,

    /// Requested threads; training runs on one.
    pub thread: usize,

    /// Sampling threshold.
    pub t: f64,

    /// Label prefix.
    pub label: String,

    /// Verbosity of training progress.
    pub verbose: u8,

    /// Random seed.
    pub seed: u64,

    /// Also write the output vectors after training.
    pub save_output: bool,

    /// Quantize: number of words kept, 0 keeps all.
    pub cutoff: usize,

    /// Quantize: store row norms separately.
    pub qnorm: bool,

    /// Quantize: also quantize the output matrix.
    pub qout: bool,
}

impl Args {
    /// Create a configuration with the defaults of `model`.
    pub fn new(model: ModelName) -> Self {
        let supervised = model == ModelName::Supervised;
        Self {
            model,
            input: None,
            output: None,
            lr: if supervised { 0.1 } else { 0.05 },
            lr_update_rate: 100,
            dim: 100,
            ws: 5,
            epoch: 5,
            min_count: if supervised { 1 } else { 5 },
            min_count_label: 0,
            neg: 5,
            word_ngrams: 1,
            loss: if supervised {
                LossName::Softmax
            } else {
                LossName::NegativeSampling
            },
            bucket: 2_000_000,
            minn: if supervised { 0 } else { 3 },
            maxn: if supervised { 0 } else { 6 },
            thread: 1,
            t: 1e-4,
            label: "__label__".to_string(),
            verbose: 2,
            seed: 0,
            save_output: false,
            cutoff: 0,
            qnorm: false,
            qout: false,
        }
    }

    /// Parse flags for a training command (`supervised`, `skipgram`, `cbow`).
    ///
    /// Both `-input` and `-output` are required.
    pub fn for_training(model: ModelName, flags: &[String]) -> Result<Self, ArgsError> {
        let args = Self::parse_args(model, flags)?;
        if args.input.is_none() {
            return Err(ArgsError::MissingRequired("-input"));
        }
        if args.output.is_none() {
            return Err(ArgsError::MissingRequired("-output"));
        }
        Ok(args)
    }

    /// Parse flags for `quantize`; `-output` names the model prefix.
    pub fn for_quantize(flags: &[String]) -> Result<Self, ArgsError> {
        let args = Self::parse_args(ModelName::Supervised, flags)?;
        if args.output.is_none() {
            return Err(ArgsError::MissingRequired("-output"));
        }
        Ok(args)
    }

    /// Parse `flags` on top of the defaults of `model`.
    pub fn parse_args(model: ModelName, flags: &[String]) -> Result<Self, ArgsError> {
        let mut args = Self::new(model);
        let mut tokens = flags.iter();

        while let Some(token) = tokens.next() {
            let name = token.trim_start_matches('-');
            if name.len() == token.len() || name.is_empty() {
                return Err(ArgsError::NotAFlag(token.clone()));
            }

            match name {
                "qnorm" => args.qnorm = true,
                "qout" => args.qout = true,
                "saveOutput" => args.save_output = true,
                _ => {
                    let value = tokens
                        .next()
                        .ok_or_else(|| ArgsError::MissingValue(token.clone()))?;
                    args.set(token, name, value)?;
                }
            }
        }

        if args.model == ModelName::Supervised && args.word_ngrams <= 1 && args.maxn == 0 {
            args.bucket = 0;
        }
        Ok(args)
    }

    fn set(&mut self, flag: &str, name: &str, value: &str) -> Result<(), ArgsError> {
        match name {
            "input" => self.input = Some(PathBuf::from(value)),
            "output" => self.output = Some(PathBuf::from(value)),
            "lr" => self.lr = parse(flag, value)?,
            "lrUpdateRate" => self.lr_update_rate = parse(flag, value)?,
            "dim" => self.dim = parse_positive(flag, value)?,
            "ws" => self.ws = parse_positive(flag, value)?,
            "epoch" => self.epoch = parse_positive(flag, value)?,
            "minCount" => self.min_count = parse(flag, value)?,
            "minCountLabel" => self.min_count_label = parse(flag, value)?,
            "neg" => self.neg = parse(flag, value)?,
            "wordNgrams" => self.word_ngrams = parse(flag, value)?,
            "loss" => {
                self.loss = value.parse().map_err(|()| invalid(flag, value))?;
            }
            "bucket" => self.bucket = parse(flag, value)?,
            "minn" => self.minn = parse(flag, value)?,
            "maxn" => self.maxn = parse(flag, value)?,
            "thread" => self.thread = parse_positive(flag, value)?,
            "t" => self.t = parse(flag, value)?,
            "label" => self.label = value.to_string(),
            "verbose" => self.verbose = parse(flag, value)?,
            "seed" => self.seed = parse(flag, value)?,
            "cutoff" => self.cutoff = parse(flag, value)?,
            _ => return Err(ArgsError::UnknownFlag(flag.to_string())),
        }
        Ok(())
    }

    /// Training data path.
    pub fn input_path(&self) -> Result<&Path, ArgsError> {
        self.input
            .as_deref()
            .ok_or(ArgsError::MissingRequired("-input"))
    }

    /// Output prefix.
    pub fn output_prefix(&self) -> Result<&Path, ArgsError> {
        self.output
            .as_deref()
            .ok_or(ArgsError::MissingRequired("-output"))
    }

    /// Help text listing every flag and its default.
    pub fn help() -> String {
        let sup = Self::new(ModelName::Supervised);
        let uns = Self::new(ModelName::Skipgram);
        let mut out = String::from(HELP_HEADER);
        let mut row = |flag: &str, text: &str| {
            let _ = writeln!(out, "  {flag:<16} {text}");
        };

        row("-input", "training file path");
        row("-output", "output file path");
        row("", "");
        row(
            "-minCount",
            &format!(
                "minimal number of word occurences [{}/{}]",
                sup.min_count, uns.min_count
            ),
        );
        row(
            "-minCountLabel",
            &format!("minimal number of label occurences [{}]", sup.min_count_label),
        );
        row("-wordNgrams", &format!("max length of word ngram [{}]", sup.word_ngrams));
        row("-bucket", &format!("number of buckets [{}]", uns.bucket));
        row("-minn", &format!("min length of char ngram [{}/{}]", sup.minn, uns.minn));
        row("-maxn", &format!("max length of char ngram [{}/{}]", sup.maxn, uns.maxn));
        row("-t", &format!("sampling threshold [{}]", sup.t));
        row("-label", &format!("labels prefix [{}]", sup.label));
        row("", "");
        row("-lr", &format!("learning rate [{}/{}]", sup.lr, uns.lr));
        row(
            "-lrUpdateRate",
            &format!(
                "change the rate of updates for the learning rate [{}]",
                sup.lr_update_rate
            ),
        );
        row("-dim", &format!("size of word vectors [{}]", sup.dim));
        row("-ws", &format!("size of the context window [{}]", sup.ws));
        row("-epoch", &format!("number of epochs [{}]", sup.epoch));
        row("-neg", &format!("number of negatives sampled [{}]", sup.neg));
        row("-loss", "loss function {ns, softmax} [softmax/ns]");
        row(
            "-thread",
            &format!("number of threads, training uses one [{}]", sup.thread),
        );
        row("-seed", &format!("random seed [{}]", sup.seed));
        row("-verbose", &format!("verbosity level [{}]", sup.verbose));
        row("-saveOutput", "whether output params should be saved [false]");
        row("", "");
        row("-cutoff", "number of words to consider, 0 keeps all [0]");
        row("-qnorm", "quantizing the norm separately [false]");
        row("-qout", "quantizing the classifier [false]");
        out
    }
}

fn invalid(flag: &str, value: &str) -> ArgsError {
    ArgsError::InvalidValue {
        flag: flag.to_string(),
        value: value.to_string(),
    }
}

fn parse<T: FromStr>(flag: &str, value: &str) -> Result<T, ArgsError> {
    value.parse().map_err(|_| invalid(flag, value))
}

fn parse_positive(flag: &str, value: &str) -> Result<usize, ArgsError> {
    match parse::<usize>(flag, value)? {
        0 => Err(invalid(flag, value)),
        n => Ok(n),
    }
}
