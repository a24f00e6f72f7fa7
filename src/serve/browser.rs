//! Open the preview in the default browser. Best effort: failures are logged.

use std::process::{Command, Stdio};
use std::time::Duration;

/// Open `url` after `delay` on a background thread.
pub fn open_after(url: String, delay: Duration) {
    std::thread::spawn(move || {
        std::thread::sleep(delay);
        if crate::core::is_shutdown() {
            return;
        }
        match open(&url) {
            Ok(()) => crate::debug!("browser"; "opened {}", url),
            Err(e) => crate::log!("browser"; "could not open {}: {}", url, e),
        }
    });
}

fn open(url: &str) -> anyhow::Result<()> {
    let (program, args) = launcher(url);
    let program = which::which(program)?;
    Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;
    Ok(())
}

/// Platform command that hands a URL to the desktop.
fn launcher(url: &str) -> (&'static str, Vec<String>) {
    if cfg!(target_os = "macos") {
        ("open", vec![url.to_string()])
    } else if cfg!(windows) {
        // `start` treats the first quoted argument as a window title.
        (
            "cmd",
            vec!["/C".into(), "start".into(), String::new(), url.to_string()],
        )
    } else {
        ("xdg-open", vec![url.to_string()])
    }
}
