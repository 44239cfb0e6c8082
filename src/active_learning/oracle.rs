//! Oracles answer whether two records match
//!
//! The default oracle asks an operator on the console. Tests and batch runs
//! plug in a [`ScriptedOracle`]; [`TimeoutOracle`] bounds how long any oracle
//! may take to answer.

use std::collections::HashMap;
use std::io::{self, BufRead, BufReader, Stdin, Stdout, Write};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::OracleError;
use crate::ground_truth::link::{Decision, RecordPair};

/// One question put to an oracle
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Question {
    /// The pair being asked about
    pub pair: RecordPair,
    /// Side-by-side rendering of both records
    pub prompt: String,
}

/// A source of match decisions
pub trait Oracle {
    /// Decide whether the question's records match
    ///
    /// `Ok(None)` is a non-answer: the pair is skipped for this generation.
    fn decision(&mut self, question: &Question) -> Result<Option<Decision>, OracleError>;
}

impl<O: Oracle + ?Sized> Oracle for Box<O> {
    fn decision(&mut self, question: &Question) -> Result<Option<Decision>, OracleError> {
        (**self).decision(question)
    }
}

/// Console oracle over standard input and output
pub type StdioOracle = ConsoleOracle<BufReader<Stdin>, Stdout>;

/// Asks an operator to type a decision
///
/// Accepts `y`/`yes`/`+` (match), `n`/`no`/`-` (non-match) and
/// `u`/`unknown`/`?` (uncertain); `s`/`skip` or end of input is a
/// non-answer. Anything else is asked again.
#[derive(Debug)]
pub struct ConsoleOracle<R, W> {
    input: R,
    output: W,
}

impl ConsoleOracle<BufReader<Stdin>, Stdout> {
    /// Oracle on the process's console
    pub fn stdio() -> Self {
        Self::new(BufReader::new(io::stdin()), io::stdout())
    }
}

impl Default for ConsoleOracle<BufReader<Stdin>, Stdout> {
    fn default() -> Self {
        Self::stdio()
    }
}

impl<R: BufRead, W: Write> ConsoleOracle<R, W> {
    /// Oracle reading answers from `input` and writing prompts to `output`
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Give back the reader and writer
    pub fn into_inner(self) -> (R, W) {
        (self.input, self.output)
    }

    fn parse(answer: &str) -> Option<Option<Decision>> {
        match answer.trim().to_ascii_lowercase().as_str() {
            "y" | "yes" | "+" => Some(Some(Decision::Match)),
            "n" | "no" | "-" => Some(Some(Decision::NonMatch)),
            "u" | "unknown" | "?" => Some(Some(Decision::Uncertain)),
            "s" | "skip" => Some(None),
            _ => None,
        }
    }
}

impl<R: BufRead, W: Write> Oracle for ConsoleOracle<R, W> {
    fn decision(&mut self, question: &Question) -> Result<Option<Decision>, OracleError> {
        writeln!(self.output)?;
        write!(self.output, "{}", question.prompt)?;
        loop {
            write!(self.output, "Same entity? [y]es/[n]o/[u]nknown/[s]kip: ")?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            match Self::parse(&line) {
                Some(answer) => return Ok(answer),
                None => writeln!(self.output, "Please answer y, n, u or s.")?,
            }
        }
    }
}

/// Answers from a fixed table, recording every question asked
///
/// Pairs not in the table get the fallback answer.
#[derive(Clone, Debug, Default)]
pub struct ScriptedOracle {
    answers: HashMap<RecordPair, Decision>,
    fallback: Option<Decision>,
    asked: Vec<RecordPair>,
}

impl ScriptedOracle {
    /// An oracle with no answers and no fallback
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an answer (builder style)
    pub fn with_answer(mut self, id1: &str, id2: &str, decision: Decision) -> Self {
        self.answers.insert(RecordPair::new(id1, id2), decision);
        self
    }

    /// Answer for pairs not in the table (builder style)
    pub fn with_fallback(mut self, decision: Option<Decision>) -> Self {
        self.fallback = decision;
        self
    }

    /// Pairs asked so far, in order
    pub fn asked(&self) -> &[RecordPair] {
        &self.asked
    }
}

impl Oracle for ScriptedOracle {
    fn decision(&mut self, question: &Question) -> Result<Option<Decision>, OracleError> {
        self.asked.push(question.pair.clone());
        Ok(self.answers.get(&question.pair).copied().or(self.fallback))
    }
}

type Answer = (u64, Result<Option<Decision>, OracleError>);

/// Bounds the time an oracle may take to answer
///
/// The wrapped oracle runs on its own thread. A question not answered within
/// the timeout is a non-answer; a late answer to it is discarded.
pub struct TimeoutOracle {
    requests: Sender<(u64, Question)>,
    answers: Receiver<Answer>,
    timeout: Duration,
    next_id: u64,
}

impl TimeoutOracle {
    /// Wrap `oracle`, waiting at most `timeout` for each answer
    pub fn new<O>(mut oracle: O, timeout: Duration) -> Self
    where
        O: Oracle + Send + 'static,
    {
        let (request_tx, request_rx) = mpsc::channel::<(u64, Question)>();
        let (answer_tx, answer_rx) = mpsc::channel::<Answer>();

        thread::spawn(move || {
            for (id, question) in request_rx {
                let answer = oracle.decision(&question);
                if answer_tx.send((id, answer)).is_err() {
                    break;
                }
            }
        });

        Self {
            requests: request_tx,
            answers: answer_rx,
            timeout,
            next_id: 0,
        }
    }

    /// Maximum wait per question
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Oracle for TimeoutOracle {
    fn decision(&mut self, question: &Question) -> Result<Option<Decision>, OracleError> {
        let id = self.next_id;
        self.next_id += 1;
        self.requests
            .send((id, question.clone()))
            .map_err(|_| OracleError::Disconnected)?;

        let deadline = Instant::now() + self.timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.answers.recv_timeout(remaining) {
                Ok((answer_id, answer)) if answer_id == id => return answer,
                // stale answer to a question that already timed out
                Ok(_) => continue,
                Err(RecvTimeoutError::Timeout) => {
                    tracing::warn!(
                        pair = %question.pair,
                        timeout_ms = self.timeout.as_millis() as u64,
                        "oracle did not answer in time, skipping pair"
                    );
                    return Ok(None);
                }
                Err(RecvTimeoutError::Disconnected) => return Err(OracleError::Disconnected),
            }
        }
    }
}

impl std::fmt::Debug for TimeoutOracle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimeoutOracle")
            .field("timeout", &self.timeout)
            .field("next_id", &self.next_id)
            .finish()
    }
}
