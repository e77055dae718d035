//! Vocabulary of words and labels with hashed sub-word features.

use std::collections::HashMap;
use std::io::BufRead;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::args::{Args, ModelName};
use crate::error::{EmbeddingError, Result};
use crate::text::lossy_lines;

/// End-of-sentence token appended to every line.
pub const EOS: &str = "</s>";

const BOW: char = '<';
const EOW: char = '>';

/// Whether a vocabulary entry is a word or a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryKind {
    Word,
    Label,
}

/// A vocabulary entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    /// The token text.
    pub word: String,

    /// Occurrences in the training data.
    pub count: u64,

    /// Word or label.
    pub kind: EntryKind,

    /// Input rows: the word's own row followed by its character n-grams.
    #[serde(skip)]
    subwords: Vec<usize>,
}

/// Features extracted from one line of supervised data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SupervisedLine {
    /// Input rows (words, character n-grams, word n-grams).
    pub features: Vec<usize>,

    /// Label ids, in `0..nlabels`.
    pub labels: Vec<usize>,
}

/// Words and labels seen in the training data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dictionary {
    model: ModelName,
    label_prefix: String,
    minn: usize,
    maxn: usize,
    bucket: usize,
    word_ngrams: usize,
    sampling: f64,

    /// Words first (by decreasing count), then labels.
    entries: Vec<Entry>,
    nwords: usize,
    nlabels: usize,
    ntokens: u64,

    #[serde(skip)]
    word2int: HashMap<String, usize>,

    #[serde(skip)]
    pdiscard: Vec<f32>,
}

/// 32-bit FNV-1a over the UTF-8 bytes, sign-extending each byte.
pub fn hash(token: &str) -> u32 {
    let mut h: u32 = 2_166_136_261;
    for b in token.bytes() {
        h ^= (b as i8) as u32;
        h = h.wrapping_mul(16_777_619);
    }
    h
}

impl Dictionary {
    /// Create an empty dictionary configured by `args`.
    pub fn new(args: &Args) -> Self {
        Self {
            model: args.model,
            label_prefix: args.label.clone(),
            minn: args.minn,
            maxn: args.maxn,
            bucket: args.bucket,
            word_ngrams: args.word_ngrams,
            sampling: args.t,
            entries: Vec::new(),
            nwords: 0,
            nlabels: 0,
            ntokens: 0,
            word2int: HashMap::new(),
            pdiscard: Vec::new(),
        }
    }

    /// Count every token of `reader`, then drop rare entries.
    pub fn read_from(&mut self, reader: impl BufRead, args: &Args) -> Result<()> {
        for line in lossy_lines(reader) {
            let line = line?;
            for token in line.split_whitespace() {
                self.add(token);
            }
            self.add(EOS);
            if self.ntokens % 1_000_000 == 0 && self.ntokens > 0 {
                debug!("Read {}M words", self.ntokens / 1_000_000);
            }
        }

        self.threshold(args.min_count, args.min_count_label);
        self.rebuild();

        info!(
            "Read {} tokens: {} words, {} labels",
            self.ntokens, self.nwords, self.nlabels
        );
        if self.nwords == 0 {
            return Err(EmbeddingError::EmptyVocabulary);
        }
        Ok(())
    }

    fn kind_of(&self, token: &str) -> EntryKind {
        if token.starts_with(&self.label_prefix) {
            EntryKind::Label
        } else {
            EntryKind::Word
        }
    }

    fn add(&mut self, token: &str) {
        self.ntokens += 1;
        if let Some(&id) = self.word2int.get(token) {
            self.entries[id].count += 1;
            return;
        }
        let kind = self.kind_of(token);
        self.word2int.insert(token.to_string(), self.entries.len());
        self.entries.push(Entry {
            word: token.to_string(),
            count: 1,
            kind,
            subwords: Vec::new(),
        });
    }

    fn threshold(&mut self, min_count: u64, min_count_label: u64) {
        self.entries.retain(|e| match e.kind {
            EntryKind::Word => e.count >= min_count,
            EntryKind::Label => e.count >= min_count_label,
        });
        // Words before labels, each by decreasing count
        self.entries.sort_by(|a, b| {
            let rank = |k: EntryKind| matches!(k, EntryKind::Label);
            rank(a.kind)
                .cmp(&rank(b.kind))
                .then(b.count.cmp(&a.count))
                .then_with(|| a.word.cmp(&b.word))
        });
    }

    /// Recompute the lookup table, sub-words and discard table.
    ///
    /// Must be called after deserialization or after entries change.
    pub fn rebuild(&mut self) {
        self.nwords = self
            .entries
            .iter()
            .filter(|e| e.kind == EntryKind::Word)
            .count();
        self.nlabels = self.entries.len() - self.nwords;
        self.word2int = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.word.clone(), i))
            .collect();

        for i in 0..self.entries.len() {
            let mut subwords = vec![i];
            if self.entries[i].word != EOS && self.entries[i].kind == EntryKind::Word {
                let word = self.entries[i].word.clone();
                self.char_ngrams(&word, |row, _| subwords.push(row));
            }
            self.entries[i].subwords = subwords;
        }

        let total = self.ntokens.max(1) as f64;
        self.pdiscard = self
            .entries
            .iter()
            .map(|e| {
                let f = e.count as f64 / total;
                ((self.sampling / f).sqrt() + self.sampling / f) as f32
            })
            .collect();
    }

    /// Keep only the words in `keep` (sorted ids); labels are untouched.
    pub fn retain_words(&mut self, keep: &[usize]) {
        let mut id = 0;
        self.entries.retain(|e| {
            let kept = e.kind == EntryKind::Label || keep.binary_search(&id).is_ok();
            id += 1;
            kept
        });
        self.rebuild();
    }

    /// Visit the hashed character n-grams of `word` as `(input row, n-gram)`.
    fn char_ngrams(&self, word: &str, mut visit: impl FnMut(usize, &str)) {
        if self.maxn == 0 || self.bucket == 0 {
            return;
        }
        let chars: Vec<char> = std::iter::once(BOW)
            .chain(word.chars())
            .chain(std::iter::once(EOW))
            .collect();
        for i in 0..chars.len() {
            for n in self.minn.max(1)..=self.maxn {
                let end = i + n;
                if end > chars.len() {
                    break;
                }
                if n == 1 && (i == 0 || end == chars.len()) {
                    continue;
                }
                let ngram: String = chars[i..end].iter().collect();
                let row = self.nwords + hash(&ngram) as usize % self.bucket;
                visit(row, &ngram);
            }
        }
    }

    /// Number of words.
    pub fn nwords(&self) -> usize {
        self.nwords
    }

    /// Number of labels.
    pub fn nlabels(&self) -> usize {
        self.nlabels
    }

    /// Number of tokens read during training.
    pub fn ntokens(&self) -> u64 {
        self.ntokens
    }

    /// Entry id of a word or label.
    pub fn id(&self, token: &str) -> Option<usize> {
        self.word2int.get(token).copied()
    }

    /// Text of word `id`.
    pub fn word(&self, id: usize) -> &str {
        &self.entries[id].word
    }

    /// Text of label `label_id` (in `0..nlabels`).
    pub fn label(&self, label_id: usize) -> &str {
        &self.entries[self.nwords + label_id].word
    }

    /// Occurrence counts of all words, by id.
    pub fn word_counts(&self) -> Vec<u64> {
        self.entries[..self.nwords].iter().map(|e| e.count).collect()
    }

    /// Occurrence counts of all labels, by label id.
    pub fn label_counts(&self) -> Vec<u64> {
        self.entries[self.nwords..].iter().map(|e| e.count).collect()
    }

    /// Input rows of word `id`.
    pub fn subwords(&self, id: usize) -> &[usize] {
        &self.entries[id].subwords
    }

    /// Input rows for any word, in or out of vocabulary.
    pub fn subwords_of(&self, word: &str) -> Vec<usize> {
        match self.id(word) {
            Some(id) if id < self.nwords => self.entries[id].subwords.clone(),
            _ => {
                let mut rows = Vec::new();
                self.char_ngrams(word, |row, _| rows.push(row));
                rows
            }
        }
    }

    /// Sub-word strings of `word` with their input rows.
    pub fn subword_strings(&self, word: &str) -> Vec<(String, usize)> {
        let mut out = Vec::new();
        if let Some(id) = self.id(word).filter(|&id| id < self.nwords) {
            out.push((word.to_string(), id));
        }
        self.char_ngrams(word, |row, ngram| out.push((ngram.to_string(), row)));
        out
    }

    /// Whether word `id` is dropped by subsampling given a uniform draw `r`.
    pub fn discard(&self, id: usize, r: f32) -> bool {
        self.model != ModelName::Supervised && r > self.pdiscard[id]
    }

    /// In-vocabulary word ids of `line`, followed by the end-of-sentence id.
    pub fn word_ids(&self, line: &str) -> Vec<usize> {
        line.split_whitespace()
            .chain(std::iter::once(EOS))
            .filter_map(|token| self.id(token).filter(|&id| id < self.nwords))
            .collect()
    }

    /// Features and labels of one line of supervised data.
    pub fn supervised_line(&self, line: &str) -> SupervisedLine {
        let mut out = SupervisedLine::default();
        let mut word_hashes = Vec::new();

        for token in line.split_whitespace().chain(std::iter::once(EOS)) {
            match self.id(token) {
                Some(id) if id >= self.nwords => out.labels.push(id - self.nwords),
                Some(id) => {
                    out.features.extend_from_slice(&self.entries[id].subwords);
                    word_hashes.push(hash(token));
                }
                None if self.kind_of(token) == EntryKind::Label => {}
                None => {
                    self.char_ngrams(token, |row, _| out.features.push(row));
                    word_hashes.push(hash(token));
                }
            }
        }

        self.add_word_ngrams(&mut out.features, &word_hashes);
        out
    }

    fn add_word_ngrams(&self, features: &mut Vec<usize>, hashes: &[u32]) {
        if self.word_ngrams <= 1 || self.bucket == 0 {
            return;
        }
        for i in 0..hashes.len() {
            let mut h = u64::from(hashes[i]);
            for &next in hashes.iter().take(i + self.word_ngrams).skip(i + 1) {
                h = h.wrapping_mul(116_049_371).wrapping_add(u64::from(next));
                features.push(self.nwords + (h % self.bucket as u64) as usize);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn supervised_dict(data: &str, flags: &str) -> Dictionary {
        let flags: Vec<String> = flags.split_whitespace().map(str::to_string).collect();
        let args = Args::parse_args(ModelName::Supervised, &flags).unwrap();
        let mut dict = Dictionary::new(&args);
        dict.read_from(data.as_bytes(), &args).unwrap();
        dict
    }

    #[test]
    fn test_hash_is_fnv1a() {
        assert_eq!(hash(""), 2_166_136_261);
        assert_eq!(hash("a"), 0xe40c_292c);
    }

    #[test]
    fn test_words_sorted_before_labels() {
        let dict = supervised_dict("__label__x b a a\n__label__y a\n", "");
        assert_eq!(dict.nwords(), 3);
        assert_eq!(dict.nlabels(), 2);
        assert_eq!(dict.word(0), "a");
        assert_eq!(dict.word(1), EOS);
        assert_eq!(dict.label(0), "__label__x");
        assert_eq!(dict.ntokens(), 8);
    }

    #[test]
    fn test_min_count_prunes_rare_words() {
        let dict = supervised_dict("__label__x b a a\n__label__y a\n", "-minCount 2");
        assert_eq!(dict.nwords(), 2);
        assert!(dict.id("b").is_none());
    }

    #[test]
    fn test_supervised_line_features() {
        let dict = supervised_dict("__label__x hello world\n", "");
        let line = dict.supervised_line("__label__x hello unknown");
        assert_eq!(line.labels, vec![0]);
        let hello = dict.id("hello").unwrap();
        let eos = dict.id(EOS).unwrap();
        assert_eq!(line.features, vec![hello, eos]);
    }

    #[test]
    fn test_char_ngrams_and_word_ngrams() {
        let dict = supervised_dict("__label__x ab\n", "-minn 2 -maxn 3 -bucket 100 -wordNgrams 2");
        let strings: Vec<String> = dict
            .subword_strings("ab")
            .into_iter()
            .map(|(s, _)| s)
            .collect();
        assert_eq!(strings, vec!["ab", "<a", "<ab", "ab", "ab>", "b>"]);
        assert!(dict.subwords_of("zz").iter().all(|&r| r >= dict.nwords()));

        let line = dict.supervised_line("ab ab");
        // (word + 5 n-grams) twice, the end-of-sentence row, two bigrams
        assert_eq!(line.features.len(), 6 + 6 + 1 + 2);
        assert!(line.features.iter().all(|&r| r < dict.nwords() + 100));
    }

    #[test]
    fn test_retain_words_keeps_labels() {
        let mut dict = supervised_dict("__label__x b a a\n__label__y a\n", "");
        dict.retain_words(&[0, 1]);
        assert_eq!(dict.nwords(), 2);
        assert_eq!(dict.nlabels(), 2);
        assert!(dict.id("b").is_none());
        assert_eq!(dict.label(1), "__label__y");
    }
}
