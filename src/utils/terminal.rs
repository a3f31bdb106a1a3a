//! Terminal title handling

use std::io::{IsTerminal, Write};

/// Sets the terminal title when stdout is a terminal
pub fn set_terminal_title(title: &str) {
    if std::io::stdout().is_terminal() {
        // OSC 0: set icon name and window title
        print!("\x1b]0;{title}\x07");
    }
}

/// Sets the terminal title and flushes stdout so it shows up immediately
pub fn set_terminal_title_and_flush(title: &str) {
    set_terminal_title(title);
    let _ = std::io::stdout().flush();
}
