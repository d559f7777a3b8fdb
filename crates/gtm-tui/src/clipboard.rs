use std::io::Write;
use std::process::{Command, Stdio};

/// Clipboard commands tried in order: macOS, Wayland, X11
const COPY_COMMANDS: [(&str, &[&str]); 3] = [
    ("pbcopy", &[]),
    ("wl-copy", &[]),
    ("xclip", &["-selection", "clipboard"]),
];

/// Pipe `text` into the first available clipboard tool.
pub fn copy(text: &str) -> bool {
    for (program, args) in COPY_COMMANDS {
        let Ok(mut child) = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
        else {
            continue;
        };

        let written = child
            .stdin
            .take()
            .map(|mut stdin| stdin.write_all(text.as_bytes()).is_ok())
            .unwrap_or(false);

        if written && child.wait().map(|status| status.success()).unwrap_or(false) {
            return true;
        }
        tracing::debug!("{} failed to take clipboard contents", program);
    }
    false
}
