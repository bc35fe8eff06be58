//! Logging for the aperture server.
//!
//! One macro, [`alog!`], prints lines in the format:
//!
//! ```text
//! 09:14:02.117 src/ops/albums.rs:57 album created: a-9f41c2b0 (u-usr_2aB4)
//! ```
//!
//! Output goes to stderr by default; [`set_writer`] redirects it (tests use
//! an in-memory buffer).  When stderr is a terminal the timestamp and
//! source location are dimmed and entity tags are coloured: albums cyan,
//! principals magenta.

use std::io::{self, IsTerminal, Write};
use std::sync::{Mutex, OnceLock};
use std::time::{SystemTime, UNIX_EPOCH};

struct Sink {
    writer: Box<dyn Write + Send>,
    colour: bool,
}

static SINK: OnceLock<Mutex<Sink>> = OnceLock::new();

fn sink() -> &'static Mutex<Sink> {
    SINK.get_or_init(|| {
        Mutex::new(Sink {
            writer: Box::new(io::stderr()),
            colour: false,
        })
    })
}

/// Call once at startup.  Enables colour when stderr is a terminal.
pub fn init() {
    sink().lock().unwrap().colour = io::stderr().is_terminal();
}

/// Redirect all subsequent log output to `w`.  Colour is switched off,
/// since a custom writer is unlikely to be a colour terminal.
pub fn set_writer(w: Box<dyn Write + Send>) {
    let mut s = sink().lock().unwrap();
    s.writer = w;
    s.colour = false;
}

const RESET: &str = "\x1b[0m";
const DIM: &str = "\x1b[2m";
const ALBUM_COLOUR: &str = "\x1b[96m"; // bright cyan
const PRINCIPAL_COLOUR: &str = "\x1b[95m"; // bright magenta

const TAG_LEN: usize = 8;

fn short(id: &str) -> &str {
    match id.char_indices().nth(TAG_LEN) {
        Some((i, _)) => &id[..i],
        None => id,
    }
}

fn tag(prefix: char, colour: &str, id: &str) -> String {
    if sink().lock().unwrap().colour {
        format!("{colour}{prefix}-{}{RESET}", short(id))
    } else {
        format!("{prefix}-{}", short(id))
    }
}

/// Shortened, tagged album id for log lines, e.g. `a-9f41c2b0`.
pub fn album_id(id: &str) -> String {
    tag('a', ALBUM_COLOUR, id)
}

/// Shortened, tagged principal id for log lines, e.g. `u-usr_2aB4`.
pub fn principal_id(id: &str) -> String {
    tag('u', PRINCIPAL_COLOUR, id)
}

/// Wall-clock time of day as `HH:MM:SS.mmm` (UTC).  The date is left to
/// whatever collects stderr; log lines only need ordering within a run.
fn time_of_day() -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    let secs = now.as_secs() % 86_400;
    format!(
        "{:02}:{:02}:{:02}.{:03}",
        secs / 3600,
        (secs % 3600) / 60,
        secs % 60,
        now.subsec_millis()
    )
}

/// Write a single log line to the current writer.
///
/// Called by the [`alog!`] macro; not intended for direct use.
pub fn emit(file: &str, line: u32, msg: &str) {
    let ts = time_of_day();
    let mut s = sink().lock().unwrap();
    let formatted = if s.colour {
        format!("{DIM}{ts} {file}:{line}{RESET} {msg}")
    } else {
        format!("{ts} {file}:{line} {msg}")
    };
    let _ = writeln!(s.writer, "{formatted}");
}

/// Emit a log line with timestamp and source location.
///
/// # Usage
///
/// ```ignore
/// alog!("album deleted: {}", logging::album_id(&id));
/// ```
#[macro_export]
macro_rules! alog {
    ($($arg:tt)*) => {{
        $crate::logging::emit(file!(), line!(), &format!($($arg)*));
    }};
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[derive(Clone)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn ids_are_tagged_and_truncated() {
        assert_eq!(album_id("9f41c2b0-77aa-4d55"), "a-9f41c2b0");
        assert_eq!(principal_id("u1"), "u-u1");
    }

    #[test]
    fn emit_goes_to_the_installed_writer() {
        let buf = SharedBuf(Arc::new(Mutex::new(Vec::new())));
        set_writer(Box::new(buf.clone()));

        crate::alog!("album {} ready", album_id("abcdef123456"));

        let text = String::from_utf8(buf.0.lock().unwrap().clone()).unwrap();
        assert!(text.contains("album a-abcdef12 ready"));
        assert!(text.contains("logging.rs"));
    }
}
