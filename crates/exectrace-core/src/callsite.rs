//! Best-effort call-site inference.
//!
//! Every recording operation stamps its entry with the source location of
//! the code that invoked it. The inference works on textual stack frames:
//!
//! 1. A [`CallSiteResolver`] captures the current stack as one line per
//!    frame, innermost first.
//! 2. The first frame (the capture machinery's own) is skipped.
//! 3. The remaining frames are scanned in order for the first line that
//!    looks like a frame (contains the `at ` marker) and does not mention
//!    any of the configured filter markers (this crate's own modules, the
//!    panel crate, runtime internals), so the reported location belongs to
//!    the caller rather than to tracker machinery.
//! 4. No qualifying frame: the [`UNKNOWN_LOCATION`] sentinel is returned.
//! 5. Otherwise the frame is parsed into file/line/column and formatted as
//!    `File: <name> Line: <line>:<column>`; frames that do not parse are
//!    returned as their raw trimmed text.
//!
//! All of this is inherently host-dependent: frame text, symbol names and
//! the availability of capture vary by platform and build settings, which
//! is why the resolver is a trait and the filter markers are tunable.

use std::backtrace::Backtrace;
use std::sync::OnceLock;

use regex::Regex;

/// Sentinel location used when no qualifying stack frame is found.
pub const UNKNOWN_LOCATION: &str = "unknown location";

/// Frame filter applied by default: the tracker's own crates plus the
/// capture and async-runtime machinery that sits between the caller and
/// the recording call. Extend per environment with
/// [`TrackerBuilder::skip_marker`](crate::TrackerBuilder::skip_marker).
pub const DEFAULT_SKIP_MARKERS: &[&str] =
    &["exectrace", "std::backtrace", "backtrace::", "tokio::"];

/// Substring that marks a line as a stack frame.
const FRAME_MARKER: &str = "at ";

/// Extracts the last path segment plus the trailing `:line:column` pair
/// from a frame line. Query/fragment noise between the file name and the
/// numbers is tolerated.
const FRAME_PATTERN: &str = r"(?:.*/)?([^/?#:]+)(?:[^:]*)?:(\d+):(\d+)";

static FRAME_REGEX: OnceLock<Regex> = OnceLock::new();

fn frame_regex() -> &'static Regex {
    FRAME_REGEX.get_or_init(|| Regex::new(FRAME_PATTERN).expect("frame pattern is a valid regex"))
}

/// A parsed source location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSite {
    /// Final path segment of the source file
    pub file_name: String,
    /// 1-based line number
    pub line: u32,
    /// Column number, when the frame carried one
    pub column: Option<u32>,
}

impl CallSite {
    /// Build a call-site from a full path and line number, without a
    /// column. Used for locations taken from `tracing` event metadata.
    pub fn from_file_line(path: &str, line: u32) -> Self {
        Self {
            file_name: file_basename(path).to_string(),
            line,
            column: None,
        }
    }
}

impl std::fmt::Display for CallSite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "File: {} Line: {}", self.file_name, self.line)?;
        if let Some(column) = self.column {
            write!(f, ":{}", column)?;
        }
        Ok(())
    }
}

/// Pluggable stack-capture capability.
///
/// The default is [`BacktraceResolver`]; tests inject resolvers returning
/// canned frames so inference stays deterministic.
pub trait CallSiteResolver: Send + Sync {
    /// Capture the current call stack as one line per frame, innermost
    /// first. The first returned frame is treated as the capture
    /// machinery's own frame and is always skipped by the inference.
    fn capture_frames(&self) -> Vec<String>;
}

/// Default resolver backed by `std::backtrace`.
///
/// Capture is forced regardless of `RUST_BACKTRACE`. The multi-line std
/// format (numbered symbol line, indented `at file:line:column` line) is
/// normalized into single `at <symbol> (<file>:<line>:<column>)` frame
/// lines so the shared scanning and parsing steps apply unchanged. In
/// builds without debug info frames may lack file information and the
/// inference degrades accordingly.
#[derive(Debug, Clone, Copy, Default)]
pub struct BacktraceResolver;

impl CallSiteResolver for BacktraceResolver {
    fn capture_frames(&self) -> Vec<String> {
        let captured = Backtrace::force_capture().to_string();
        normalize_backtrace(&captured)
    }
}

/// Infer the call-site of the resolver's caller's caller.
///
/// Returns the formatted location, the raw trimmed frame text when the
/// qualifying frame does not parse, or [`UNKNOWN_LOCATION`].
pub fn resolve_call_site(resolver: &dyn CallSiteResolver, skip_markers: &[String]) -> String {
    let frames = resolver.capture_frames();

    let candidate = frames.iter().skip(1).find(|line| {
        line.contains(FRAME_MARKER)
            && !skip_markers.iter().any(|marker| line.contains(marker.as_str()))
    });

    let Some(line) = candidate else {
        return UNKNOWN_LOCATION.to_string();
    };

    let trimmed = line.trim();
    match parse_frame_line(trimmed) {
        Some(site) => site.to_string(),
        None => trimmed.to_string(),
    }
}

/// Parse a single frame line into a [`CallSite`].
///
/// `"foo/bar.ext:42:7"` parses to file `bar.ext`, line 42, column 7.
/// Lines without a trailing `:line:column` pair return `None`.
pub fn parse_frame_line(line: &str) -> Option<CallSite> {
    let caps = frame_regex().captures(line)?;
    // The pattern cannot cut at backslashes, so basename the capture for
    // frames carrying Windows paths.
    let file_name = file_basename(caps.get(1)?.as_str()).to_string();
    let line_no = caps.get(2)?.as_str().parse().ok()?;
    let column = caps.get(3)?.as_str().parse().ok()?;

    Some(CallSite {
        file_name,
        line: line_no,
        column: Some(column),
    })
}

/// Last path segment of a file path, tolerating both separators.
pub(crate) fn file_basename(path: &str) -> &str {
    path.rsplit(&['/', '\\'][..]).next().unwrap_or(path)
}

/// Collapse the two-line std backtrace format into one line per frame.
///
/// Symbol lines look like `   4: module::function`; when the next line is
/// an indented `at ./src/file.rs:10:9` location it is folded into the
/// frame. Non-frame lines are dropped.
fn normalize_backtrace(text: &str) -> Vec<String> {
    let mut frames = Vec::new();
    let mut lines = text.lines().peekable();

    while let Some(line) = lines.next() {
        let trimmed = line.trim_start();
        let Some((index, symbol)) = trimmed.split_once(": ") else {
            continue;
        };
        if index.is_empty() || !index.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }

        let mut frame = format!("at {}", symbol.trim());
        if let Some(next) = lines.peek() {
            if let Some(location) = next.trim_start().strip_prefix("at ") {
                frame.push_str(&format!(" ({})", location.trim()));
                lines.next();
            }
        }
        frames.push(frame);
    }

    frames
}
