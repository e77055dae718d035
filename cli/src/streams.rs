//! Opening command inputs and outputs.
//!
//! Everything a command reads or writes is opened before the model is
//! loaded, so a missing file fails the command without touching the model.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{CliError, Result};

/// Path token that stands for standard input.
pub const STDIN_TOKEN: &str = "-";

/// Suffix of the hidden-vector file written by `to-fvecs`.
pub const HIDDEN_SUFFIX: &str = ".hid.fvecs";

/// Suffix of the output-vector file written by `to-fvecs`.
pub const OUTPUT_SUFFIX: &str = ".wo.fvecs";

/// Suffix of the label file written by `to-fvecs`.
pub const LABELS_SUFFIX: &str = ".labels.txt";

/// Standard streams of one invocation.
pub struct Streams<'a> {
    pub stdin: &'a mut dyn BufRead,
    pub stdout: &'a mut dyn Write,
    pub stderr: &'a mut dyn Write,
}

impl<'a> Streams<'a> {
    /// Create a new set of streams.
    pub fn new(
        stdin: &'a mut dyn BufRead,
        stdout: &'a mut dyn Write,
        stderr: &'a mut dyn Write,
    ) -> Self {
        Self {
            stdin,
            stdout,
            stderr,
        }
    }
}

/// A data source: a named file or standard input.
pub enum Input<'a> {
    Stdin(&'a mut dyn BufRead),
    File(BufReader<File>),
}

impl<'a> Input<'a> {
    /// Open `path`, or borrow `stdin` when the path is `-`.
    pub fn open(path: &Path, stdin: &'a mut dyn BufRead, what: &'static str) -> Result<Self> {
        if path.as_os_str() == STDIN_TOKEN {
            return Ok(Self::Stdin(stdin));
        }
        let file = File::open(path).map_err(|source| CliError::Resource {
            what,
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Opened {what} {}", path.display());
        Ok(Self::File(BufReader::new(file)))
    }

    /// The underlying reader.
    pub fn reader(&mut self) -> &mut dyn BufRead {
        match self {
            Self::Stdin(stdin) => &mut **stdin,
            Self::File(file) => file,
        }
    }
}

/// `base` with `suffix` appended to its last component.
pub fn with_suffix(base: &Path, suffix: &str) -> PathBuf {
    let mut path = OsString::from(base.as_os_str());
    path.push(suffix);
    PathBuf::from(path)
}

/// The three files of a `to-fvecs` export.
pub fn bundle_paths(base: &Path) -> [PathBuf; 3] {
    [
        with_suffix(base, HIDDEN_SUFFIX),
        with_suffix(base, OUTPUT_SUFFIX),
        with_suffix(base, LABELS_SUFFIX),
    ]
}

/// Removes the files it created unless disarmed.
#[derive(Default)]
struct CreatedFiles {
    paths: Vec<PathBuf>,
}

impl CreatedFiles {
    fn create(&mut self, path: &Path) -> Result<BufWriter<File>> {
        let file = File::create(path).map_err(|source| CliError::Resource {
            what: "Export file",
            path: path.to_path_buf(),
            source,
        })?;
        self.paths.push(path.to_path_buf());
        Ok(BufWriter::new(file))
    }

    fn disarm(&mut self) {
        self.paths.clear();
    }
}

impl Drop for CreatedFiles {
    fn drop(&mut self) {
        for path in &self.paths {
            debug!("Removing partial export {}", path.display());
            let _ = fs::remove_file(path);
        }
    }
}

/// Output files of `to-fvecs`, opened together or not at all.
///
/// The files are removed again when the bundle is dropped without
/// [`ExportBundle::finish`], so a failed export leaves nothing behind.
pub struct ExportBundle {
    /// Hidden representation records.
    pub hidden: BufWriter<File>,

    /// Output-matrix row records.
    pub output: BufWriter<File>,

    /// One label per line.
    pub labels: BufWriter<File>,

    created: CreatedFiles,
}

impl ExportBundle {
    /// Create the three files derived from `base`.
    ///
    /// If any of them cannot be created, the ones already created are removed.
    pub fn create(base: &Path) -> Result<Self> {
        let [hidden, output, labels] = bundle_paths(base);
        let mut created = CreatedFiles::default();
        let hidden = created.create(&hidden)?;
        let output = created.create(&output)?;
        let labels = created.create(&labels)?;
        Ok(Self {
            hidden,
            output,
            labels,
            created,
        })
    }

    /// Flush every file and keep them.
    pub fn finish(mut self) -> io::Result<()> {
        self.hidden.flush()?;
        self.output.flush()?;
        self.labels.flush()?;
        self.created.disarm();
        Ok(())
    }
}
