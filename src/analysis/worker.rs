//! Request/response channel to a long-lived line-oriented worker process.
//!
//! One request is one input line; the response is every output line up to a
//! sentinel line. Requests never overlap. The worker is shut down (stdin
//! closed, remaining output drained, process reaped) when the channel is
//! closed or dropped.
//!
//! Lines travel in the worker's own character encoding, which must be
//! ASCII-compatible so the sentinel and delimiters read the same in every
//! encoding.

use std::io::{self, BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use encoding_rs::Encoding;
use log::{debug, warn};

use crate::error::{GlossaError, Result};

/// Line terminating every response.
pub const SENTINEL: &str = "EOS";

/// A spawned worker process.
#[derive(Debug)]
pub struct LineWorker {
    program: String,
    encoding: &'static Encoding,
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: BufReader<ChildStdout>,
    closed: bool,
}

impl LineWorker {
    /// Spawn `program` with `args`, exchanging lines in `encoding`.
    pub fn spawn(program: &str, args: &[String], encoding: &'static Encoding) -> Result<Self> {
        if !encoding.is_ascii_compatible() {
            return Err(GlossaError::config(format!(
                "{program}: encoding {} is not ASCII-compatible",
                encoding.name()
            )));
        }

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| spawn_error(program, e))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| GlossaError::analysis(format!("{program} has no stdin")))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| GlossaError::analysis(format!("{program} has no stdout")))?;

        debug!("spawned worker {program} (pid {})", child.id());
        Ok(LineWorker {
            program: program.to_string(),
            encoding,
            child,
            stdin: Some(stdin),
            stdout: BufReader::new(stdout),
            closed: false,
        })
    }

    /// Send one line and collect the response lines (sentinel excluded).
    ///
    /// Output lines that do not decode cleanly in the worker's encoding are
    /// skipped.
    pub fn request(&mut self, line: &str) -> Result<Vec<String>> {
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| GlossaError::analysis(format!("{} is closed", self.program)))?;
        let (encoded, _, unmappable) = self.encoding.encode(line);
        if unmappable {
            warn!(
                "{} cannot represent every character of the request, sending references",
                self.encoding.name()
            );
        }
        stdin.write_all(&encoded)?;
        stdin.write_all(b"\n")?;
        stdin.flush()?;

        let mut lines = Vec::new();
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if self.stdout.read_until(b'\n', &mut buf)? == 0 {
                return Err(GlossaError::analysis(format!(
                    "{} exited before the {SENTINEL} line",
                    self.program
                )));
            }
            let Some(decoded) = self
                .encoding
                .decode_without_bom_handling_and_without_replacement(&buf)
            else {
                warn!(
                    "skipping line from {} that is not valid {}",
                    self.program,
                    self.encoding.name()
                );
                continue;
            };
            let text = decoded.trim_end_matches(['\n', '\r']);
            if text.trim() == SENTINEL {
                return Ok(lines);
            }
            lines.push(text.to_string());
        }
    }

    /// Close stdin, drain the remaining output and wait for the process.
    ///
    /// Calling this more than once is a no-op.
    pub fn shutdown(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        drop(self.stdin.take());
        io::copy(&mut self.stdout, &mut io::sink())?;
        let status = self.child.wait()?;
        debug!("worker {} exited with {status}", self.program);
        Ok(())
    }
}

impl Drop for LineWorker {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            warn!("failed to shut down {}: {e}", self.program);
        }
    }
}

/// Run `program` once, feed it `input` and return everything it printed.
pub fn run_once(program: &str, args: &[String], input: &[u8]) -> Result<Vec<u8>> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| spawn_error(program, e))?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(input)?;
    }
    let output = child.wait_with_output()?;
    Ok(output.stdout)
}

fn spawn_error(program: &str, e: io::Error) -> GlossaError {
    if e.kind() == io::ErrorKind::NotFound {
        GlossaError::config(format!("analyzer program `{program}` is not installed"))
    } else {
        GlossaError::Io(e)
    }
}
