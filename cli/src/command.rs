//! Command-line grammar and per-command defaults.

use std::path::PathBuf;

use clap::{ArgAction, CommandFactory, Parser, Subcommand};
use ftext_index::IndexQuantizer;

/// Default `k` for `test`, `predict` and `predict-prob`.
pub const DEFAULT_PREDICT_K: u32 = 1;

/// Default `k` for `approx-predict`.
pub const DEFAULT_APPROX_K: u32 = 1;

/// Default number of partitions probed by `approx-predict`.
pub const DEFAULT_NPROBE: u32 = 256;

/// Default number of partitions built by `train-index`.
pub const DEFAULT_INDEX_SIZE: u32 = 4096;

/// Default stored-vector codec built by `train-index`.
pub const DEFAULT_INDEX_QUANTIZER: IndexQuantizer = IndexQuantizer::Flat;

/// Default `k` for `nn` and `analogies`.
pub const DEFAULT_NEIGHBORS_K: u32 = 10;

/// Train and query fastText-style word vectors and text classifiers.
#[derive(Debug, Parser)]
#[command(name = "ftext", version, arg_required_else_help = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// The supported commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Train a supervised classifier
    Supervised(TrainArgs),

    /// Train a skipgram model
    Skipgram(TrainArgs),

    /// Train a cbow model
    Cbow(TrainArgs),

    /// Evaluate a supervised classifier
    Test(PredictArgs),

    /// Predict most likely labels
    Predict(PredictArgs),

    /// Predict most likely labels with probabilities
    PredictProb(PredictArgs),

    /// Quantize a model to reduce the memory usage
    Quantize {
        /// Quantization flags; `-output <prefix>` names the model to compress
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Build an approximate search index so approx-predict can be used
    TrainIndex {
        /// Model filename; the index is saved back into it
        model: PathBuf,

        /// Number of index partitions
        #[arg(
            default_value_t = DEFAULT_INDEX_SIZE,
            value_parser = clap::value_parser!(u32).range(1..)
        )]
        index_size: u32,

        /// Stored-vector codec: Flat or SQ8, checked only when an index is built
        #[arg(default_value_t = DEFAULT_INDEX_QUANTIZER.to_string())]
        index_quantizer: String,
    },

    /// Predict most likely labels through the approximate search index
    ApproxPredict {
        /// Model filename
        model: PathBuf,

        /// Input data filename (if -, read from stdin)
        input: PathBuf,

        /// Number of labels to output
        #[arg(
            default_value_t = DEFAULT_APPROX_K,
            value_parser = clap::value_parser!(u32).range(1..)
        )]
        k: u32,

        /// Number of index partitions probed per query
        #[arg(default_value_t = DEFAULT_NPROBE, value_parser = clap::value_parser!(u32).range(1..))]
        nprobe: u32,
    },

    /// Store hidden representations and output vectors for fvecs benchmarking
    ToFvecs {
        /// Model filename
        model: PathBuf,

        /// Input data filename (if -, read from stdin)
        input: PathBuf,

        /// Base path of the .hid.fvecs, .wo.fvecs and .labels.txt files
        output: PathBuf,
    },

    /// Print word vectors for words read from stdin
    PrintWordVectors {
        /// Model filename
        model: PathBuf,
    },

    /// Print sentence vectors for lines read from stdin
    PrintSentenceVectors {
        /// Model filename
        model: PathBuf,
    },

    /// Print the sub-word vectors of a word
    PrintNgrams {
        /// Model filename
        model: PathBuf,

        /// Word to decompose
        word: String,
    },

    /// Query for nearest neighbors
    Nn(NeighborArgs),

    /// Query for analogies
    Analogies(NeighborArgs),
}

/// Flags of the training commands.
#[derive(Debug, clap::Args)]
pub struct TrainArgs {
    /// Training flags, e.g. `-input train.txt -output model -dim 50`
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

/// Arguments of `test`, `predict` and `predict-prob`.
#[derive(Debug, clap::Args)]
pub struct PredictArgs {
    /// Model filename
    pub model: PathBuf,

    /// Input data filename (if -, read from stdin)
    pub input: PathBuf,

    /// Number of labels to predict
    #[arg(default_value_t = DEFAULT_PREDICT_K, value_parser = clap::value_parser!(u32).range(1..))]
    pub k: u32,
}

/// Arguments of `nn` and `analogies`.
#[derive(Debug, clap::Args)]
pub struct NeighborArgs {
    /// Model filename
    pub model: PathBuf,

    /// Number of results per query
    #[arg(
        default_value_t = DEFAULT_NEIGHBORS_K,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub k: u32,
}

/// Rendered usage line of subcommand `name`.
pub fn usage(name: &str) -> String {
    let mut cli = Cli::command();
    cli.build();
    match cli.find_subcommand_mut(name) {
        Some(sub) => sub.render_usage().to_string(),
        None => cli.render_usage().to_string(),
    }
}
