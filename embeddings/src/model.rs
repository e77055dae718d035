//! Gradient steps for the shallow embedding network.

use rand::Rng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::args::{Args, LossName, ModelName};
use crate::matrix::{DenseMatrix, Matrix};
use crate::similarity::{add_scaled, dot_product, sigmoid, softmax};

const NEGATIVE_TABLE_SIZE: usize = 1_000_000;
const MIN_PROBABILITY: f32 = 1e-5;

/// Average of the `ids` rows of `input`.
pub(crate) fn compute_hidden(input: &Matrix, ids: &[usize]) -> Vec<f32> {
    let mut hidden = vec![0.0; input.cols()];
    for &id in ids {
        input.add_row_to(&mut hidden, id, 1.0);
    }
    if !ids.is_empty() {
        let n = ids.len() as f32;
        hidden.iter_mut().for_each(|x| *x /= n);
    }
    hidden
}

/// Scratch state for one training run.
pub(crate) struct Trainer {
    loss: LossName,
    supervised: bool,
    neg: usize,
    negatives: Vec<usize>,
    neg_pos: usize,
    hidden: Vec<f32>,
    grad: Vec<f32>,
    scores: Vec<f32>,
    loss_sum: f64,
    examples: u64,
}

impl Trainer {
    /// `counts` are the occurrence counts of the output rows.
    pub(crate) fn new(args: &Args, counts: &[u64], rng: &mut StdRng) -> Self {
        let negatives = if args.loss == LossName::NegativeSampling && counts.len() > 1 {
            negative_table(counts, rng)
        } else {
            Vec::new()
        };
        Self {
            loss: args.loss,
            supervised: args.model == ModelName::Supervised,
            neg: args.neg,
            negatives,
            neg_pos: 0,
            hidden: vec![0.0; args.dim],
            grad: vec![0.0; args.dim],
            scores: Vec::new(),
            loss_sum: 0.0,
            examples: 0,
        }
    }

    /// Mean loss since the last call, then reset.
    pub(crate) fn take_average_loss(&mut self) -> f64 {
        let avg = if self.examples == 0 {
            0.0
        } else {
            self.loss_sum / self.examples as f64
        };
        self.loss_sum = 0.0;
        self.examples = 0;
        avg
    }

    /// One SGD step predicting output row `target` from the `ids` input rows.
    pub(crate) fn update(
        &mut self,
        input: &mut DenseMatrix,
        output: &mut DenseMatrix,
        ids: &[usize],
        target: usize,
        lr: f32,
    ) {
        if ids.is_empty() {
            return;
        }

        self.hidden.fill(0.0);
        for &id in ids {
            add_scaled(&mut self.hidden, input.row(id), 1.0);
        }
        let n = ids.len() as f32;
        self.hidden.iter_mut().for_each(|x| *x /= n);
        self.grad.fill(0.0);

        let loss = match self.loss {
            LossName::Softmax => self.softmax_step(output, target, lr),
            LossName::NegativeSampling => self.negative_sampling_step(output, target, lr),
        };
        self.loss_sum += f64::from(loss);
        self.examples += 1;

        if self.supervised {
            self.grad.iter_mut().for_each(|g| *g /= n);
        }
        for &id in ids {
            input.add_to_row(id, &self.grad, 1.0);
        }
    }

    fn softmax_step(&mut self, output: &mut DenseMatrix, target: usize, lr: f32) -> f32 {
        let rows = output.rows();
        self.scores.clear();
        self.scores
            .extend((0..rows).map(|i| dot_product(output.row(i), &self.hidden)));
        softmax(&mut self.scores);

        for i in 0..rows {
            let label = if i == target { 1.0 } else { 0.0 };
            let alpha = lr * (label - self.scores[i]);
            add_scaled(&mut self.grad, output.row(i), alpha);
            output.add_to_row(i, &self.hidden, alpha);
        }
        -self.scores[target].max(MIN_PROBABILITY).ln()
    }

    fn negative_sampling_step(&mut self, output: &mut DenseMatrix, target: usize, lr: f32) -> f32 {
        let mut loss = self.binary_logistic(output, target, true, lr);
        if self.negatives.is_empty() {
            return loss;
        }
        for _ in 0..self.neg {
            let negative = self.next_negative(target);
            loss += self.binary_logistic(output, negative, false, lr);
        }
        loss
    }

    fn binary_logistic(
        &mut self,
        output: &mut DenseMatrix,
        target: usize,
        positive: bool,
        lr: f32,
    ) -> f32 {
        let score = sigmoid(dot_product(output.row(target), &self.hidden));
        let label = if positive { 1.0 } else { 0.0 };
        let alpha = lr * (label - score);
        add_scaled(&mut self.grad, output.row(target), alpha);
        output.add_to_row(target, &self.hidden, alpha);
        if positive {
            -score.max(MIN_PROBABILITY).ln()
        } else {
            -(1.0 - score).max(MIN_PROBABILITY).ln()
        }
    }

    fn next_negative(&mut self, target: usize) -> usize {
        loop {
            let candidate = self.negatives[self.neg_pos];
            self.neg_pos = (self.neg_pos + 1) % self.negatives.len();
            if candidate != target {
                return candidate;
            }
        }
    }
}

/// Shuffled table where row `i` appears proportionally to `counts[i]^0.5`.
fn negative_table(counts: &[u64], rng: &mut StdRng) -> Vec<usize> {
    let weights: Vec<f64> = counts.iter().map(|&c| (c as f64).sqrt()).collect();
    let z: f64 = weights.iter().sum();
    let mut table = Vec::with_capacity(NEGATIVE_TABLE_SIZE);
    for (i, w) in weights.iter().enumerate() {
        let slots = (w * NEGATIVE_TABLE_SIZE as f64 / z).ceil() as usize;
        table.extend(std::iter::repeat_n(i, slots));
    }
    table.shuffle(rng);
    table
}

/// Draw a uniform index in `0..len`.
pub(crate) fn pick(rng: &mut StdRng, len: usize) -> usize {
    rng.random_range(0..len)
}
