//! Command-line input history.
//!
//! A bounded list browsed with Up/Down. `cursor` is `None` while the user
//! is typing fresh input; browsing stashes whatever was being typed and
//! hands it back once the cursor walks past the newest entry.

/// Entries kept before the oldest is evicted.
pub const HISTORY_CAP: usize = 50;

#[derive(Debug, Clone, Default)]
pub struct CommandHistory {
    /// Oldest first.
    entries: Vec<String>,
    cursor: Option<usize>,
    draft: String,
}

impl CommandHistory {
    /// Record a dispatched line. Consecutive duplicates collapse, and any
    /// browsing state is forgotten.
    pub fn push(&mut self, entry: &str) {
        if !entry.is_empty() && self.entries.last().is_none_or(|last| last != entry) {
            self.entries.push(entry.to_string());
            if self.entries.len() > HISTORY_CAP {
                self.entries.remove(0);
            }
        }
        self.reset();
    }

    /// Up. From fresh input, stash the draft and land on the newest entry;
    /// while browsing, step toward the oldest and stop there. Returns the
    /// text the input line should now show.
    pub fn previous(&mut self, current: &str) -> Option<String> {
        if self.entries.is_empty() {
            return None;
        }
        match self.cursor {
            None => {
                self.draft = current.to_string();
                self.cursor = Some(self.entries.len() - 1);
            }
            Some(0) => {}
            Some(index) => self.cursor = Some(index - 1),
        }
        self.cursor.map(|index| self.entries[index].clone())
    }

    /// Down. Steps toward the newest entry; one step past it restores the
    /// stashed draft and returns to fresh input. `None` when not browsing.
    pub fn next(&mut self) -> Option<String> {
        match self.cursor {
            None => None,
            Some(index) if index + 1 < self.entries.len() => {
                self.cursor = Some(index + 1);
                Some(self.entries[index + 1].clone())
            }
            Some(_) => {
                self.cursor = None;
                Some(std::mem::take(&mut self.draft))
            }
        }
    }

    /// Forget any browsing state. Used when the command line is dismissed.
    pub fn reset(&mut self) {
        self.cursor = None;
        self.draft.clear();
    }

    #[must_use]
    pub fn is_browsing(&self) -> bool {
        self.cursor.is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn seeded(entries: &[&str]) -> CommandHistory {
        let mut history = CommandHistory::default();
        for entry in entries {
            history.push(entry);
        }
        history
    }

    #[test]
    fn three_up_three_down_restores_the_draft() {
        let mut history = seeded(&["a", "b", "c"]);

        assert_eq!(history.previous("half-typed"), Some("c".to_string()));
        assert_eq!(history.previous("c"), Some("b".to_string()));
        assert_eq!(history.previous("b"), Some("a".to_string()));

        assert_eq!(history.next(), Some("b".to_string()));
        assert_eq!(history.next(), Some("c".to_string()));
        assert_eq!(history.next(), Some("half-typed".to_string()));
        assert!(!history.is_browsing());
    }

    #[test]
    fn up_stops_at_the_oldest_entry() {
        let mut history = seeded(&["a", "b"]);
        history.previous("");
        history.previous("");
        assert_eq!(history.previous(""), Some("a".to_string()));
        assert_eq!(history.previous(""), Some("a".to_string()));
    }

    #[test]
    fn down_without_browsing_changes_nothing() {
        let mut history = seeded(&["a"]);
        assert_eq!(history.next(), None);
    }

    #[test]
    fn up_on_empty_history_stashes_no_draft() {
        let mut history = CommandHistory::default();
        assert_eq!(history.previous("typing"), None);
        assert!(!history.is_browsing());
    }

    #[test]
    fn consecutive_duplicates_collapse() {
        let mut history = seeded(&["deploy", "deploy", "status", "deploy"]);
        assert_eq!(history.len(), 3);
        assert_eq!(history.previous(""), Some("deploy".to_string()));
        assert_eq!(history.previous(""), Some("status".to_string()));
        assert_eq!(history.previous(""), Some("deploy".to_string()));
    }

    #[test]
    fn cap_evicts_the_oldest() {
        let mut history = CommandHistory::default();
        for index in 0..=HISTORY_CAP {
            history.push(&format!("cmd-{index}"));
        }
        assert_eq!(history.len(), HISTORY_CAP);
        // cmd-0 is gone; walking all the way back lands on cmd-1.
        let mut last = None;
        for _ in 0..HISTORY_CAP + 5 {
            last = history.previous("");
        }
        assert_eq!(last, Some("cmd-1".to_string()));
    }

    #[test]
    fn dispatch_mid_browse_forgets_the_stash() {
        let mut history = seeded(&["a", "b"]);
        history.previous("draft");
        history.push("c");
        assert!(!history.is_browsing());
        assert_eq!(history.previous(""), Some("c".to_string()));
    }
}
