//! Line-oriented command loops behind the `probe-set` and `ranked-avl` binaries.
//!
//! Both loops read tokens separated by ASCII whitespace, so commands may be split
//! across lines or share one. Tokens are raw bytes; input need not be UTF-8. Results go to `output`, one per line; diagnostics go through
//! [`log`], never to `output`.

use std::boxed::Box;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::num::ParseIntError;
use std::path::Path;
use std::str::FromStr;
use std::string::{String, ToString};
use std::vec::Vec;

use thiserror::Error;

use crate::{OSAvlTree, ProbeHashSet};

/// Why a command session stopped early.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("failed to read commands or write results")]
    Io(#[from] io::Error),
    #[error("line {line}: expected {expected}, found end of input")]
    MissingToken { line: usize, expected: &'static str },
    #[error("line {line}: invalid {expected} `{token}`")]
    InvalidNumber {
        line: usize,
        expected: &'static str,
        token: String,
        #[source]
        source: ParseIntError,
    },
    #[error("line {line}: unknown command `{command}`")]
    UnknownCommand { line: usize, command: String },
}

/// Initializes `env_logger` from `RUST_LOG`, defaulting to `warn`.
///
/// Records go to stderr so that stdout carries nothing but results.
pub fn init_logger() {
    let env = env_logger::Env::default().default_filter_or("warn");
    // A second initialization (e.g. from tests) keeps the first logger.
    let _ = env_logger::Builder::from_env(env).format_timestamp(None).try_init();
}

/// Opens `path` for buffered reading, or standard input when there is none.
///
/// # Errors
///
/// Any error opening the file.
pub fn open_input(path: Option<&Path>) -> io::Result<Box<dyn BufRead>> {
    Ok(match path {
        Some(path) => Box::new(BufReader::new(File::open(path)?)),
        None => Box::new(io::stdin().lock()),
    })
}

/// Runs the hash set protocol: pairs of `<op> <value>` with `op` one of `+`
/// (insert), `-` (remove) and `?` (query). Prints `OK` when the insertion or
/// removal took effect or the query found the value, `FAIL` otherwise.
///
/// Values are stored as the raw bytes of their token. An unknown `op` answers
/// `FAIL`. A trailing `op` without a value ends the session. Returns the number
/// of commands answered.
///
/// # Errors
///
/// [`DriverError::Io`] if reading or writing fails.
///
/// # Examples
///
/// ```
/// use ostat::ProbeHashSet;
/// use ostat::driver::run_probe_set;
///
/// let mut output = Vec::new();
/// let mut set = ProbeHashSet::new();
/// run_probe_set("+ abc\n? abc\n? xyz\n".as_bytes(), &mut output, &mut set).unwrap();
/// assert_eq!(output, b"OK\nOK\nFAIL\n");
/// ```
pub fn run_probe_set<R, W>(input: R, mut output: W, set: &mut ProbeHashSet<Vec<u8>>) -> Result<usize, DriverError>
where
    R: BufRead,
    W: Write,
{
    let mut tokens = Tokens::new(input);
    let mut answered = 0;
    while let Some(op) = tokens.next_token()? {
        let Some(value) = tokens.next_token()? else {
            log::warn!("line {}: `{}` has no value, stopping", tokens.line(), op.escape_ascii());
            break;
        };

        let succeeded = match op.as_slice() {
            b"+" => set.insert(value).is_ok(),
            b"-" => set.remove(value.as_slice()).is_ok(),
            b"?" => set.contains(value.as_slice()),
            other => {
                log::warn!("line {}: unknown operation `{}`", tokens.line(), other.escape_ascii());
                false
            }
        };
        writeln!(output, "{}", if succeeded { "OK" } else { "FAIL" })?;
        answered += 1;
    }

    output.flush()?;
    log::debug!("answered {answered} commands, {} values left", set.len());
    Ok(answered)
}

/// Runs the positional AVL protocol: a command count `N`, then `N` pairs
/// `<command> <value>`. Command `1` inserts `value` and prints its position;
/// command `2` removes the element at position `value` and prints nothing.
///
/// Positions count from the largest key. Removing past the end does nothing.
/// Returns `N`.
///
/// # Errors
///
/// A missing or non-numeric token, an unknown command, or an I/O failure.
///
/// # Examples
///
/// ```
/// use ostat::OSAvlTree;
/// use ostat::driver::run_ranked_avl;
///
/// let mut output = Vec::new();
/// let mut tree = OSAvlTree::new();
/// run_ranked_avl("3\n1 10\n1 5\n1 20\n".as_bytes(), &mut output, &mut tree).unwrap();
/// assert_eq!(output, b"0\n1\n0\n");
/// ```
pub fn run_ranked_avl<R, W>(input: R, mut output: W, tree: &mut OSAvlTree<i64>) -> Result<usize, DriverError>
where
    R: BufRead,
    W: Write,
{
    let mut tokens = Tokens::new(input);
    let count: usize = tokens.parse("command count")?;
    for _ in 0..count {
        let command: u8 = tokens.parse("command")?;
        match command {
            1 => {
                let key: i64 = tokens.parse("key")?;
                writeln!(output, "{}", tree.insert(key))?;
            }
            2 => {
                let position: usize = tokens.parse("position")?;
                tree.remove_at(position);
            }
            other => {
                return Err(DriverError::UnknownCommand {
                    line: tokens.line(),
                    command: other.to_string(),
                });
            }
        }
    }

    output.flush()?;
    log::debug!("ran {count} commands, {} keys left", tree.len());
    Ok(count)
}

/// Byte tokens of a reader separated by ASCII whitespace, tracking the current
/// line number.
struct Tokens<R> {
    input: R,
    // Tokens of the current line not yet handed out, last token first.
    pending: Vec<Vec<u8>>,
    line: usize,
}

impl<R: BufRead> Tokens<R> {
    fn new(input: R) -> Self {
        Self {
            input,
            pending: Vec::new(),
            line: 0,
        }
    }

    fn line(&self) -> usize {
        self.line
    }

    fn next_token(&mut self) -> io::Result<Option<Vec<u8>>> {
        loop {
            if let Some(token) = self.pending.pop() {
                return Ok(Some(token));
            }

            let mut buffer = Vec::new();
            if self.input.read_until(b'\n', &mut buffer)? == 0 {
                return Ok(None);
            }
            self.line += 1;
            self.pending.extend(
                buffer
                    .split(u8::is_ascii_whitespace)
                    .filter(|token| !token.is_empty())
                    .rev()
                    .map(<[u8]>::to_vec),
            );
        }
    }

    fn parse<T>(&mut self, expected: &'static str) -> Result<T, DriverError>
    where
        T: FromStr<Err = ParseIntError>,
    {
        let token = self.next_token()?.ok_or(DriverError::MissingToken {
            line: self.line,
            expected,
        })?;
        // Non-UTF-8 bytes turn into U+FFFD, which no number parses.
        let token = String::from_utf8_lossy(&token);
        token.parse().map_err(|source| DriverError::InvalidNumber {
            line: self.line,
            expected,
            token: token.into_owned(),
            source,
        })
    }
}
