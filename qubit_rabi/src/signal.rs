//! External drive amplitude sources
//!
//! The drive is controlled by a scalar in [0, 1] reported by a cooperating
//! analysis process. The process prints a `READY` line once, then one
//! `BRIGHTNESS:<float>` line per frame (possibly interleaved with other
//! chatter). Everything the engine sees goes through [`AmplitudeSource`].

use crate::error::SignalError;
use std::io::{self, BufRead, BufReader};
use std::process::{Child, ChildStdout, Command, Stdio};

/// Last-known value before the first reading arrives
pub const DEFAULT_AMPLITUDE: f64 = 0.5;

const BRIGHTNESS_PREFIX: &str = "BRIGHTNESS:";
const READY_MARKER: &str = "READY";

/// Anything that can produce the next drive amplitude.
///
/// An `Err` is fatal for the session.
pub trait AmplitudeSource {
    fn next_amplitude(&mut self) -> Result<f64, SignalError>;
}

/// Parse a `BRIGHTNESS:<float>` line
pub fn parse_brightness_line(line: &str) -> Option<f64> {
    let value = line.trim().strip_prefix(BRIGHTNESS_PREFIX)?;
    value.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Line protocol reader over any buffered stream
pub struct LineSignal<R> {
    reader: R,
    ready: bool,
    last: f64,
    /// Bytes of the line being assembled; cleared once a full line is handled
    line: String,
}

impl<R: BufRead> LineSignal<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            ready: false,
            last: DEFAULT_AMPLITUDE,
            line: String::new(),
        }
    }

    /// Most recent accepted value
    pub fn last_value(&self) -> f64 {
        self.last
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Skip lines until the READY marker
    pub fn wait_ready(&mut self) -> Result<(), SignalError> {
        if self.ready {
            return Ok(());
        }
        log::info!("Waiting for signal source to become ready...");
        loop {
            match self.reader.read_line(&mut self.line) {
                Ok(0) => return Err(SignalError::NotReady),
                Ok(_) => {
                    let ready = self.line.contains(READY_MARKER);
                    if !ready {
                        log::debug!("pre-ready output: {}", self.line.trim_end());
                    }
                    self.line.clear();
                    if ready {
                        log::info!("Signal source ready");
                        self.ready = true;
                        return Ok(());
                    }
                }
                Err(e) if is_transient(&e) => continue,
                Err(e) => return Err(SignalError::Read(e)),
            }
        }
    }
}

impl<R: BufRead> AmplitudeSource for LineSignal<R> {
    fn next_amplitude(&mut self) -> Result<f64, SignalError> {
        self.wait_ready()?;

        match self.reader.read_line(&mut self.line) {
            Ok(0) => Err(SignalError::StreamClosed),
            Ok(_) => {
                match parse_brightness_line(&self.line) {
                    Some(value) => self.last = value,
                    None => log::trace!("ignoring signal line: {}", self.line.trim_end()),
                }
                self.line.clear();
                Ok(self.last)
            }
            // A partial line stays buffered until the rest arrives
            Err(e) if is_transient(&e) => {
                log::warn!("Transient signal read failure ({}), reusing {:.3}", e, self.last);
                Ok(self.last)
            }
            Err(e) => Err(SignalError::Read(e)),
        }
    }
}

fn is_transient(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::Interrupted
            | io::ErrorKind::WouldBlock
            | io::ErrorKind::TimedOut
            | io::ErrorKind::InvalidData
    )
}

/// A child process speaking the line protocol on stdout
pub struct ProcessSignal {
    child: Child,
    lines: LineSignal<BufReader<ChildStdout>>,
}

impl ProcessSignal {
    /// Start `command` through the platform shell
    pub fn spawn(command: &str) -> Result<Self, SignalError> {
        log::info!("Starting signal process: {}", command);
        let mut child = shell(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .spawn()
            .map_err(SignalError::Spawn)?;

        let Some(stdout) = child.stdout.take() else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(SignalError::NoStdout);
        };

        Ok(Self {
            child,
            lines: LineSignal::new(BufReader::new(stdout)),
        })
    }

    /// Block until the process reports READY
    pub fn wait_ready(&mut self) -> Result<(), SignalError> {
        self.lines.wait_ready()
    }
}

impl AmplitudeSource for ProcessSignal {
    fn next_amplitude(&mut self) -> Result<f64, SignalError> {
        self.lines.next_amplitude()
    }
}

impl Drop for ProcessSignal {
    fn drop(&mut self) {
        if let Ok(None) = self.child.try_wait() {
            let _ = self.child.kill();
        }
        let _ = self.child.wait();
        log::info!("Signal process {} closed", self.child.id());
    }
}

/// `exec` replaces the shell, so killing the child reaches the program itself
#[cfg(unix)]
fn shell(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(format!("exec {}", command));
    cmd
}

#[cfg(windows)]
fn shell(command: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(command);
    cmd
}

/// Fixed amplitude, for running without an analysis process
#[derive(Debug, Clone, Copy)]
pub struct ConstantSignal(pub f64);

impl AmplitudeSource for ConstantSignal {
    fn next_amplitude(&mut self) -> Result<f64, SignalError> {
        Ok(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::io::{Cursor, Read};

    #[test]
    fn parses_brightness_lines() {
        assert_eq!(parse_brightness_line("BRIGHTNESS:0.734\n"), Some(0.734));
        assert_eq!(parse_brightness_line("  BRIGHTNESS: 0.1 \r\n"), Some(0.1));
        assert_eq!(parse_brightness_line("DEBUG: final=73.4%, brightness=0.734"), None);
        assert_eq!(parse_brightness_line("BRIGHTNESS:abc"), None);
        assert_eq!(parse_brightness_line("BRIGHTNESS:NaN"), None);
        assert_eq!(parse_brightness_line(""), None);
    }

    #[test]
    fn waits_for_ready_then_reads_values() {
        let input = "loading model\nREADY\nBRIGHTNESS:0.300\nBRIGHTNESS:0.900\n";
        let mut signal = LineSignal::new(Cursor::new(input));
        assert!(!signal.is_ready());
        assert_eq!(signal.next_amplitude().unwrap(), 0.3);
        assert!(signal.is_ready());
        assert_eq!(signal.next_amplitude().unwrap(), 0.9);
    }

    #[test]
    fn unparsable_lines_reuse_last_value() {
        let input = "READY\nDEBUG: final=42.0%\nBRIGHTNESS:0.420\nDEBUG: again\n";
        let mut signal = LineSignal::new(Cursor::new(input));
        assert_eq!(signal.next_amplitude().unwrap(), DEFAULT_AMPLITUDE);
        assert_eq!(signal.next_amplitude().unwrap(), 0.42);
        assert_eq!(signal.next_amplitude().unwrap(), 0.42);
        assert_eq!(signal.last_value(), 0.42);
    }

    #[test]
    fn closed_stream_is_fatal() {
        let mut signal = LineSignal::new(Cursor::new("READY\nBRIGHTNESS:0.5\n"));
        assert!(signal.next_amplitude().is_ok());
        assert!(matches!(signal.next_amplitude(), Err(SignalError::StreamClosed)));
    }

    #[test]
    fn stream_without_ready_is_fatal() {
        let mut signal = LineSignal::new(Cursor::new("Error opening camera\n"));
        assert!(matches!(signal.next_amplitude(), Err(SignalError::NotReady)));
    }

    /// Reader that replays scripted chunks and errors
    struct Flaky(VecDeque<io::Result<&'static [u8]>>);

    impl Read for Flaky {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.0.pop_front() {
                None => Ok(0),
                Some(Err(e)) => Err(e),
                Some(Ok(chunk)) => {
                    let n = chunk.len().min(buf.len());
                    buf[..n].copy_from_slice(&chunk[..n]);
                    Ok(n)
                }
            }
        }
    }

    #[test]
    fn transient_read_failure_reuses_last_value() {
        let reader = Flaky(VecDeque::from(vec![
            Ok(&b"READY\n"[..]),
            Ok(&b"BRIGHTNESS:0.250\n"[..]),
            Err(io::Error::new(io::ErrorKind::WouldBlock, "not yet")),
            Ok(&b"BRIGHTNESS:0.750\n"[..]),
        ]));
        let mut signal = LineSignal::new(BufReader::new(reader));
        assert_eq!(signal.next_amplitude().unwrap(), 0.25);
        assert_eq!(signal.next_amplitude().unwrap(), 0.25);
        assert_eq!(signal.next_amplitude().unwrap(), 0.75);
    }

    #[test]
    fn broken_pipe_is_fatal() {
        let reader = Flaky(VecDeque::from(vec![
            Ok(&b"READY\n"[..]),
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "gone")),
        ]));
        let mut signal = LineSignal::new(BufReader::new(reader));
        assert!(matches!(signal.next_amplitude(), Err(SignalError::Read(_))));
    }

    #[test]
    fn line_split_by_transient_failure_is_kept() {
        let reader = Flaky(VecDeque::from(vec![
            Ok(&b"READY\n"[..]),
            Ok(&b"BRIGH"[..]),
            Err(io::Error::new(io::ErrorKind::WouldBlock, "not yet")),
            Ok(&b"TNESS:0.750\n"[..]),
        ]));
        let mut signal = LineSignal::new(BufReader::new(reader));
        assert_eq!(signal.next_amplitude().unwrap(), DEFAULT_AMPLITUDE);
        assert_eq!(signal.next_amplitude().unwrap(), 0.75);
        assert!(matches!(signal.next_amplitude(), Err(SignalError::StreamClosed)));
    }

    #[test]
    fn ready_split_by_transient_failure_is_recognised() {
        let reader = Flaky(VecDeque::from(vec![
            Ok(&b"REA"[..]),
            Err(io::Error::new(io::ErrorKind::TimedOut, "slow")),
            Ok(&b"DY\nBRIGHTNESS:0.100\n"[..]),
        ]));
        let mut signal = LineSignal::new(BufReader::new(reader));
        assert_eq!(signal.next_amplitude().unwrap(), 0.1);
    }

    #[test]
    fn constant_signal_repeats() {
        let mut signal = ConstantSignal(0.6);
        assert_eq!(signal.next_amplitude().unwrap(), 0.6);
        assert_eq!(signal.next_amplitude().unwrap(), 0.6);
    }

    #[cfg(unix)]
    #[test]
    fn process_signal_reads_child_stdout() {
        let mut signal =
            ProcessSignal::spawn("printf 'READY\\nBRIGHTNESS:0.250\\n'").unwrap();
        assert_eq!(signal.next_amplitude().unwrap(), 0.25);
        assert!(matches!(signal.next_amplitude(), Err(SignalError::StreamClosed)));
    }

    #[cfg(unix)]
    #[test]
    fn shell_is_replaced_by_the_command() {
        let mut signal =
            ProcessSignal::spawn("sh -c 'echo READY; echo BRIGHTNESS:$$; sleep 1'").unwrap();
        let reported = signal.next_amplitude().unwrap();
        assert_eq!(reported, signal.child.id() as f64);
    }
}
