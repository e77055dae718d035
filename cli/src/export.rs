//! Vector export formats.
//!
//! `fvecs` is the benchmark format used by ANN tooling: each record is a
//! little-endian `i32` dimension followed by that many little-endian `f32`
//! components. Text exports print one `<token> <components>` line per vector.

use std::io::{self, BufRead, Read, Write};

use ftext_embeddings::{lossy_lines, write_vector};
use tracing::info;

use crate::error::Result;
use crate::model::EmbeddingModel;
use crate::streams::ExportBundle;

/// Append one fvecs record.
pub fn write_fvecs(out: &mut dyn Write, v: &[f32]) -> io::Result<()> {
    let dim = i32::try_from(v.len())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "vector too long for fvecs"))?;
    out.write_all(&dim.to_le_bytes())?;
    for x in v {
        out.write_all(&x.to_le_bytes())?;
    }
    Ok(())
}

/// Read every record of an fvecs stream.
pub fn read_fvecs(reader: &mut dyn Read) -> io::Result<Vec<Vec<f32>>> {
    let mut records = Vec::new();
    let mut word = [0u8; 4];
    loop {
        match reader.read_exact(&mut word) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(records),
            Err(e) => return Err(e),
        }
        let dim = usize::try_from(i32::from_le_bytes(word))
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "negative fvecs dimension"))?;
        let mut record = Vec::with_capacity(dim);
        for _ in 0..dim {
            reader.read_exact(&mut word)?;
            record.push(f32::from_le_bytes(word));
        }
        records.push(record);
    }
}

fn write_named(out: &mut dyn Write, name: &str, v: &[f32]) -> io::Result<()> {
    write!(out, "{name} ")?;
    write_vector(out, v)?;
    writeln!(out)
}

/// Export hidden vectors, label output vectors and labels of every line.
///
/// Returns the number of records written.
pub fn to_fvecs<M: EmbeddingModel>(
    model: &M,
    input: &mut dyn BufRead,
    bundle: &mut ExportBundle,
) -> Result<usize> {
    let mut records = 0;
    for line in lossy_lines(input) {
        let Some(record) = model.fvecs_record(&line?)? else {
            continue;
        };
        write_fvecs(&mut bundle.hidden, &record.hidden)?;
        write_fvecs(&mut bundle.output, &record.output)?;
        writeln!(bundle.labels, "{}", record.label)?;
        records += 1;
    }
    info!("Exported {records} fvecs records");
    Ok(records)
}

/// Print the vector of every whitespace-separated token of `input`.
pub fn print_word_vectors<M: EmbeddingModel>(
    model: &M,
    input: &mut dyn BufRead,
    out: &mut dyn Write,
) -> Result<()> {
    for line in lossy_lines(input) {
        for word in line?.split_whitespace() {
            write_named(out, word, &model.word_vector(word))?;
        }
    }
    Ok(())
}

/// Print one sentence vector per line of `input`, without the sentence.
pub fn print_sentence_vectors<M: EmbeddingModel>(
    model: &M,
    input: &mut dyn BufRead,
    out: &mut dyn Write,
) -> Result<()> {
    for line in lossy_lines(input) {
        write_vector(out, &model.sentence_vector(&line?))?;
        writeln!(out)?;
    }
    Ok(())
}

/// Print every sub-word of `word` with its vector.
pub fn print_ngrams<M: EmbeddingModel>(model: &M, word: &str, out: &mut dyn Write) -> Result<()> {
    for (ngram, vector) in model.ngram_vectors(word) {
        write_named(out, &ngram, &vector)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    #[test]
    fn test_fvecs_layout() {
        let mut out = Vec::new();
        write_fvecs(&mut out, &[1.0, -2.5]).unwrap();
        let mut expected = 2i32.to_le_bytes().to_vec();
        expected.extend(1.0f32.to_le_bytes());
        expected.extend((-2.5f32).to_le_bytes());
        assert_eq!(out, expected);
    }

    #[test]
    fn test_read_fvecs_multiple_records() {
        let mut out = Vec::new();
        write_fvecs(&mut out, &[0.5, 0.25, 0.125]).unwrap();
        write_fvecs(&mut out, &[]).unwrap();
        let records = read_fvecs(&mut Cursor::new(out)).unwrap();
        assert_eq!(records, vec![vec![0.5, 0.25, 0.125], vec![]]);
    }

    #[test]
    fn test_truncated_fvecs_is_an_error() {
        let mut out = Vec::new();
        write_fvecs(&mut out, &[1.0, 2.0]).unwrap();
        out.truncate(out.len() - 2);
        assert!(read_fvecs(&mut Cursor::new(out)).is_err());
    }
}
