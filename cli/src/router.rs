//! Dispatch of parsed commands to their handlers.

use std::io::Write;
use std::path::Path;

use ftext_embeddings::{Args, ArgsError, FastText, ModelName, Prediction, lossy_lines};
use tracing::debug;

use crate::command::{Command, NeighborArgs, PredictArgs, usage};
use crate::error::{CliError, Outcome, Result};
use crate::export;
use crate::lifecycle::ModelLifecycle;
use crate::model::EmbeddingModel;
use crate::search;
use crate::streams::{ExportBundle, Input, Streams};

const WORD_PROMPT: &str = "Query word? ";
const TRIPLET_PROMPT: &str = "Query triplet (A - B + C)? ";

/// Run `command` against the on-disk [`FastText`] engine.
pub fn run(command: Command, streams: &mut Streams<'_>) -> Result<Outcome> {
    run_with::<FastText>(command, streams)
}

/// Run `command` against model type `M`.
pub fn run_with<M: EmbeddingModel>(command: Command, streams: &mut Streams<'_>) -> Result<Outcome> {
    match command {
        Command::Supervised(train) => train_model::<M>(ModelName::Supervised, &train.args),
        Command::Skipgram(train) => train_model::<M>(ModelName::Skipgram, &train.args),
        Command::Cbow(train) => train_model::<M>(ModelName::Cbow, &train.args),
        Command::Test(args) => evaluate::<M>(&args, streams),
        Command::Predict(args) => predict::<M>(&args, false, streams),
        Command::PredictProb(args) => predict::<M>(&args, true, streams),
        Command::Quantize { args } => quantize::<M>(&args),
        Command::TrainIndex {
            model,
            index_size,
            index_quantizer,
        } => {
            let mut lifecycle = ModelLifecycle::<M>::load(&model)?;
            search::train_index(
                &mut lifecycle,
                index_size as usize,
                &index_quantizer,
                streams.stderr,
            )
        }
        Command::ApproxPredict {
            model,
            input,
            k,
            nprobe,
        } => {
            let mut input = Input::open(&input, streams.stdin, "Input file")?;
            let lifecycle = ModelLifecycle::<M>::load(&model)?;
            search::approx_predict(
                lifecycle.model(),
                input.reader(),
                k as usize,
                nprobe as usize,
                streams.stdout,
            )?;
            Ok(Outcome::Success)
        }
        Command::ToFvecs {
            model,
            input,
            output,
        } => to_fvecs::<M>(&model, &input, &output, streams),
        Command::PrintWordVectors { model } => {
            let lifecycle = ModelLifecycle::<M>::load(&model)?;
            export::print_word_vectors(lifecycle.model(), streams.stdin, streams.stdout)?;
            Ok(Outcome::Success)
        }
        Command::PrintSentenceVectors { model } => {
            let lifecycle = ModelLifecycle::<M>::load(&model)?;
            export::print_sentence_vectors(lifecycle.model(), streams.stdin, streams.stdout)?;
            Ok(Outcome::Success)
        }
        Command::PrintNgrams { model, word } => {
            let lifecycle = ModelLifecycle::<M>::load(&model)?;
            export::print_ngrams(lifecycle.model(), &word, streams.stdout)?;
            Ok(Outcome::Success)
        }
        Command::Nn(args) => nn::<M>(&args, streams),
        Command::Analogies(args) => analogies::<M>(&args, streams),
    }
}

/// Turn a configuration error into a usage error that lists every flag.
fn config_error(err: ArgsError, command: &str) -> CliError {
    CliError::Usage {
        message: err.to_string(),
        usage: format!("{}\n{}", usage(command), Args::help()),
    }
}

fn train_model<M: EmbeddingModel>(model: ModelName, flags: &[String]) -> Result<Outcome> {
    let args = Args::for_training(model, flags).map_err(|e| config_error(e, model.as_str()))?;
    let lifecycle = ModelLifecycle::<M>::train(&args)?;
    let path = lifecycle.save(None)?;
    debug!("Saved model to {}", path.display());
    lifecycle.save_artifacts()?;
    Ok(Outcome::Success)
}

fn quantize<M: EmbeddingModel>(flags: &[String]) -> Result<Outcome> {
    let args = Args::for_quantize(flags).map_err(|e| config_error(e, "quantize"))?;
    let mut lifecycle = ModelLifecycle::<M>::load_for_quantize(&args)?;
    lifecycle.quantize(&args)?;
    let path = lifecycle.save(None)?;
    debug!("Saved quantized model to {}", path.display());
    Ok(Outcome::Success)
}

fn evaluate<M: EmbeddingModel>(args: &PredictArgs, streams: &mut Streams<'_>) -> Result<Outcome> {
    let mut input = Input::open(&args.input, streams.stdin, "Test file")?;
    let lifecycle = ModelLifecycle::<M>::load(&args.model)?;
    let k = args.k as usize;
    let meter = lifecycle.model().test(input.reader(), k)?;
    writeln!(streams.stdout, "N\t{}", meter.examples)?;
    writeln!(streams.stdout, "P@{k}\t{:.3}", meter.precision())?;
    writeln!(streams.stdout, "R@{k}\t{:.3}", meter.recall())?;
    Ok(Outcome::Success)
}

/// Print one line of predictions, optionally with each label's score.
pub(crate) fn write_predictions(
    out: &mut dyn Write,
    predictions: &[Prediction],
    with_scores: bool,
) -> std::io::Result<()> {
    for (i, prediction) in predictions.iter().enumerate() {
        if i > 0 {
            out.write_all(b" ")?;
        }
        out.write_all(prediction.label.as_bytes())?;
        if with_scores {
            write!(out, " {:.5}", prediction.score)?;
        }
    }
    writeln!(out)
}

fn predict<M: EmbeddingModel>(
    args: &PredictArgs,
    with_scores: bool,
    streams: &mut Streams<'_>,
) -> Result<Outcome> {
    let mut input = Input::open(&args.input, streams.stdin, "Input file")?;
    let lifecycle = ModelLifecycle::<M>::load(&args.model)?;
    for line in lossy_lines(input.reader()) {
        let predictions = lifecycle.model().predict(&line?, args.k as usize)?;
        write_predictions(streams.stdout, &predictions, with_scores)?;
    }
    Ok(Outcome::Success)
}

fn to_fvecs<M: EmbeddingModel>(
    model: &Path,
    input: &Path,
    output: &Path,
    streams: &mut Streams<'_>,
) -> Result<Outcome> {
    let mut input = Input::open(input, streams.stdin, "Input file")?;
    let mut bundle = ExportBundle::create(output)?;
    let lifecycle = ModelLifecycle::<M>::load(model)?;
    export::to_fvecs(lifecycle.model(), input.reader(), &mut bundle)?;
    bundle.finish()?;
    Ok(Outcome::Success)
}

/// Prompt, then read the next line of `stdin`. `None` at end of input.
fn prompt(streams: &mut Streams<'_>, text: &str) -> Result<Option<String>> {
    streams.stdout.write_all(text.as_bytes())?;
    streams.stdout.flush()?;
    Ok(lossy_lines(&mut *streams.stdin).next().transpose()?)
}

fn write_neighbors(out: &mut dyn Write, neighbors: &[Prediction]) -> std::io::Result<()> {
    for neighbor in neighbors {
        writeln!(out, "{} {}", neighbor.label, neighbor.score)?;
    }
    Ok(())
}

fn nn<M: EmbeddingModel>(args: &NeighborArgs, streams: &mut Streams<'_>) -> Result<Outcome> {
    let lifecycle = ModelLifecycle::<M>::load(&args.model)?;
    while let Some(line) = prompt(streams, WORD_PROMPT)? {
        let Some(word) = line.split_whitespace().next() else {
            continue;
        };
        let neighbors = lifecycle.model().nn(word, args.k as usize);
        write_neighbors(streams.stdout, &neighbors)?;
    }
    Ok(Outcome::Success)
}

fn analogies<M: EmbeddingModel>(args: &NeighborArgs, streams: &mut Streams<'_>) -> Result<Outcome> {
    let lifecycle = ModelLifecycle::<M>::load(&args.model)?;
    while let Some(line) = prompt(streams, TRIPLET_PROMPT)? {
        let words: Vec<&str> = line.split_whitespace().collect();
        let [a, b, c] = words[..] else {
            writeln!(
                streams.stderr,
                "Expected three words (A B C), got {}",
                words.len()
            )?;
            continue;
        };
        let neighbors = lifecycle.model().analogies(a, b, c, args.k as usize);
        write_neighbors(streams.stdout, &neighbors)?;
    }
    Ok(Outcome::Success)
}
