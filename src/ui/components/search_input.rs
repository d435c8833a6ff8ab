use std::time::{Duration, Instant};

use crossterm::event::KeyCode;

/// Quiet period before a search term is committed.
pub const DEBOUNCE: Duration = Duration::from_millis(300);

/// Debounced free-text search input.
///
/// Each keystroke edits the buffer and restarts the quiet-period timer;
/// `poll` commits the pending term once the timer has run out, at most
/// once per burst of edits. A new keystroke before then supersedes the
/// pending commit. The current instant is passed in by the caller, so the
/// timing is deterministic under test.
pub struct SearchInputState {
    value: String,
    pub focused: bool,
    pending_since: Option<Instant>,
}

impl SearchInputState {
    pub fn new(initial: &str) -> Self {
        Self {
            value: initial.to_string(),
            focused: false,
            pending_since: None,
        }
    }

    /// Edit the buffer. Returns true if the key was consumed.
    pub fn handle_input(&mut self, key: KeyCode, now: Instant) -> bool {
        if !self.focused {
            return false;
        }

        match key {
            KeyCode::Char(c) => {
                self.value.push(c);
                self.pending_since = Some(now);
                true
            }
            KeyCode::Backspace => {
                self.value.pop();
                self.pending_since = Some(now);
                true
            }
            _ => false,
        }
    }

    /// Commit the pending term once the quiet period has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<String> {
        match self.pending_since {
            Some(since) if now.duration_since(since) >= DEBOUNCE => {
                self.pending_since = None;
                Some(self.value.clone())
            }
            _ => None,
        }
    }

    pub fn display_string(&self) -> String {
        if self.focused {
            format!("{}|", self.value)
        } else {
            self.value.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    fn typing(input: &mut SearchInputState, text: &str, at: Instant) {
        for c in text.chars() {
            input.handle_input(KeyCode::Char(c), at);
        }
    }

    #[test]
    fn rapid_keystrokes_commit_once_with_the_final_value() {
        let t0 = Instant::now();
        let mut input = SearchInputState::new("");
        input.focused = true;

        typing(&mut input, "a", t0);
        typing(&mut input, "c", t0 + ms(100));
        typing(&mut input, "e", t0 + ms(200));

        // Quiet period counts from the last keystroke.
        assert_eq!(input.poll(t0 + ms(400)), None);
        assert_eq!(input.poll(t0 + ms(500)), Some("ace".to_string()));
        // Committed exactly once.
        assert_eq!(input.poll(t0 + ms(600)), None);
    }

    #[test]
    fn new_input_supersedes_a_pending_commit() {
        let t0 = Instant::now();
        let mut input = SearchInputState::new("");
        input.focused = true;

        typing(&mut input, "ac", t0);
        typing(&mut input, "e", t0 + ms(250));

        // The "ac" timer would have fired at t0+300; it was restarted.
        assert_eq!(input.poll(t0 + ms(300)), None);
        assert_eq!(input.poll(t0 + ms(550)), Some("ace".to_string()));
    }

    #[test]
    fn clearing_the_input_commits_the_empty_term() {
        let t0 = Instant::now();
        let mut input = SearchInputState::new("ace");
        input.focused = true;

        for _ in 0..3 {
            input.handle_input(KeyCode::Backspace, t0);
        }

        assert_eq!(input.poll(t0 + ms(300)), Some(String::new()));
    }

    #[test]
    fn unfocused_input_ignores_keys() {
        let t0 = Instant::now();
        let mut input = SearchInputState::new("");

        assert!(!input.handle_input(KeyCode::Char('a'), t0));
        assert_eq!(input.display_string(), "");
        assert_eq!(input.poll(t0 + ms(300)), None);
    }
}
