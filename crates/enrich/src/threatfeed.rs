use std::collections::HashSet;
use std::path::Path;

/// Load a line-oriented plain-text threat-feed file into a set of values.
///
/// Lines are trimmed; blank lines and `#`-prefixed comments are ignored.
/// `lowercase` should be `true` for domain feeds (where case must not affect
/// matching) and `false` for IP feeds.
///
/// A missing or unparseable file yields an empty set rather than an error --
/// enrichers never propagate failures to the orchestrator, so the scorer
/// simply proceeds with no threat-feed signal.
#[must_use]
pub fn load_feed(path: impl AsRef<Path>, lowercase: bool) -> HashSet<String> {
    let Ok(contents) = std::fs::read_to_string(path) else {
        return HashSet::new();
    };

    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| if lowercase { line.to_lowercase() } else { line.to_string() })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_lines_skipping_blanks_and_comments() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# bad domains").unwrap();
        writeln!(file, "Evil.Example.com").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "other.test").unwrap();
        file.flush().unwrap();

        let set = load_feed(file.path(), true);
        assert_eq!(set.len(), 2);
        assert!(set.contains("evil.example.com"));
        assert!(set.contains("other.test"));
    }

    #[test]
    fn missing_file_yields_empty_set() {
        let set = load_feed("/nonexistent/path/to/feed.txt", true);
        assert!(set.is_empty());
    }

    #[test]
    fn ip_feed_is_not_lowercased() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "203.0.113.9").unwrap();
        file.flush().unwrap();

        let set = load_feed(file.path(), false);
        assert!(set.contains("203.0.113.9"));
    }
}
