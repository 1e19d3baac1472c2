//! Recorded-delivery source.
//!
//! Implements [`ReadingSource`] over newline-delimited JSON: one raw payload
//! per line, exactly as the sensor node would have sent it.  Blank lines are
//! skipped; a line that is not JSON is reported as a source failure and the
//! replay carries on with the next one.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use log::warn;
use serde_json::Value;

use crate::app::ports::{ReadingSource, SourcePoll};

pub struct ReplaySource<R> {
    lines: io::Lines<R>,
    line_no: usize,
}

impl ReplaySource<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        Ok(Self::new(BufReader::new(File::open(path)?)))
    }
}

impl<R: BufRead> ReplaySource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_no: 0,
        }
    }

    /// Lines consumed so far, blank ones included.
    pub fn line_no(&self) -> usize {
        self.line_no
    }
}

impl<R: BufRead> ReadingSource for ReplaySource<R> {
    fn poll(&mut self) -> SourcePoll {
        loop {
            let Some(line) = self.lines.next() else {
                return SourcePoll::Exhausted;
            };
            self.line_no += 1;
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    warn!("replay: line {}: {}", self.line_no, e);
                    return SourcePoll::Failed("recording unreadable");
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            return match serde_json::from_str::<Value>(&line) {
                Ok(raw) => SourcePoll::Payload(raw),
                Err(e) => {
                    warn!("replay: line {}: {}", self.line_no, e);
                    SourcePoll::Failed("payload is not valid JSON")
                }
            };
        }
    }
}
