//! Terminal output shared by both processes.
//!
//! - `log!("module"; ...)` prints `[MODULE] message` with a colored prefix
//! - `debug!` prints the same way, only with `MD_PREVIEWER_VERBOSE=1`
//! - `status_*` report watch-mode builds as one block that each new build
//!   result overwrites, so a long editing session leaves one line on screen
//!
//! `--quiet` silences all of it. Errors that end the process are printed by
//! the binaries with `eprintln!`, never through here.
//!
//! ```ignore
//! log!("serve"; "http://{}/", addr);
//! debug!("ws"; "{} clients", n);
//! logger::status_success("rebuilt: doc.md (3ms)");
//! ```

use std::io::{Write, stdout};
use std::sync::LazyLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use crossterm::cursor::MoveUp;
use crossterm::execute;
use crossterm::terminal::{Clear, ClearType};
use owo_colors::{OwoColorize, Stream, Style};
use parking_lot::Mutex;

/// Environment variable that turns on `debug!` output.
pub const VERBOSE_ENV: &str = "MD_PREVIEWER_VERBOSE";

static VERBOSE: AtomicBool = AtomicBool::new(false);
static QUIET: AtomicBool = AtomicBool::new(false);

/// Lines printed by the last status block; 0 once anything else is printed.
static STATUS_LINES: LazyLock<Mutex<usize>> = LazyLock::new(|| Mutex::new(0));

/// Set the quiet flag from `--quiet` and the verbose flag from the environment.
pub fn init(quiet: bool) {
    QUIET.store(quiet, Ordering::Relaxed);
    let verbose = std::env::var(VERBOSE_ENV).is_ok_and(|v| v == "1" || v == "true");
    VERBOSE.store(verbose, Ordering::Relaxed);
}

pub fn is_quiet() -> bool {
    QUIET.load(Ordering::Relaxed)
}

pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::Relaxed) && !is_quiet()
}

#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        if !$crate::logger::is_quiet() {
            $crate::logger::log($module, &format!($($arg)*))
        }
    }};
}

#[macro_export]
macro_rules! debug {
    ($module:expr; $($arg:tt)*) => {{
        if $crate::logger::is_verbose() {
            $crate::logger::log($module, &format!($($arg)*))
        }
    }};
}

/// Print one prefixed line. Starts a fresh status block below it.
pub fn log(module: &str, message: &str) {
    let mut lines = STATUS_LINES.lock();
    let mut out = stdout().lock();
    execute!(out, Clear(ClearType::UntilNewLine)).ok();
    writeln!(out, "{} {message}", prefix(module)).ok();
    out.flush().ok();
    *lines = 0;
}

fn prefix(module: &str) -> String {
    let style = match module {
        "previewer" | "watch" => Style::new().bright_blue(),
        "serve" | "browser" => Style::new().bright_white(),
        "ws" => Style::new().bright_green(),
        "error" => Style::new().bright_red(),
        _ => Style::new().bright_yellow(),
    };
    paint(&format!("[{}]", module.to_ascii_uppercase()), style.bold())
}

/// Apply `style` unless colors are off for stdout (`--color`, no TTY).
fn paint(text: &str, style: Style) -> String {
    text.if_supports_color(Stream::Stdout, |t| t.style(style))
        .to_string()
}

// ============================================================================
// Build status
// ============================================================================

/// Result of one watch-mode build, as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome<'a> {
    Rebuilt(&'a str),
    Unchanged(&'a str),
    Failed { summary: &'a str, detail: &'a str },
}

impl BuildOutcome<'_> {
    /// The uncolored text of the block, without timestamp.
    fn text(&self) -> String {
        match self {
            Self::Rebuilt(msg) | Self::Unchanged(msg) => (*msg).to_string(),
            Self::Failed { summary, detail } if detail.is_empty() => (*summary).to_string(),
            Self::Failed { summary, detail } => format!("{summary}\n{detail}"),
        }
    }

    fn render(&self, timestamp: &str) -> String {
        let stamp = paint(&format!("[{timestamp}]"), Style::new().dimmed());
        match self {
            Self::Rebuilt(_) => {
                format!("{stamp} {} {}", paint("✓", Style::new().green()), self.text())
            }
            Self::Unchanged(_) => format!("{stamp} {}", paint(&self.text(), Style::new().dimmed())),
            Self::Failed { .. } => {
                format!("{stamp} {} {}", paint("✗", Style::new().red()), self.text())
            }
        }
    }

    fn line_count(&self) -> usize {
        self.text().lines().count().max(1)
    }
}

/// Replace the previous status block with `outcome`.
pub fn status(outcome: BuildOutcome<'_>) {
    if is_quiet() {
        return;
    }

    let mut lines = STATUS_LINES.lock();
    let mut out = stdout().lock();
    if *lines > 0 {
        let up = u16::try_from(*lines).unwrap_or(u16::MAX);
        execute!(out, MoveUp(up), Clear(ClearType::FromCursorDown)).ok();
    }
    writeln!(out, "{}", outcome.render(&clock())).ok();
    out.flush().ok();
    *lines = outcome.line_count();
}

pub fn status_success(message: &str) {
    status(BuildOutcome::Rebuilt(message));
}

pub fn status_unchanged(message: &str) {
    status(BuildOutcome::Unchanged(message));
}

pub fn status_error(summary: &str, detail: &str) {
    status(BuildOutcome::Failed { summary, detail });
}

/// `HH:MM:SS` (UTC).
fn clock() -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    format!("{:02}:{:02}:{:02}", (secs / 3600) % 24, (secs / 60) % 60, secs % 60)
}
