/// Reduce a raw document to its content lines: trimmed, in source order,
/// with blank lines and full-line `#` comments removed.
///
/// A `#` after other content is part of the line.
pub fn normalize(text: &str) -> Vec<&str> {
    text.split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_blank_and_comment_lines() {
        let text = "# header\n\n  User-agent: *  \n\t# indented comment\nDisallow: /tmp\n   \n";
        assert_eq!(normalize(text), vec!["User-agent: *", "Disallow: /tmp"]);
    }

    #[test]
    fn keeps_trailing_hash() {
        let lines = normalize("Disallow: /a # not a comment");
        assert_eq!(lines, vec!["Disallow: /a # not a comment"]);
    }

    #[test]
    fn empty_and_comment_only_input() {
        assert!(normalize("").is_empty());
        assert!(normalize("# one\n#two\n\n   \n").is_empty());
    }

    #[test]
    fn crlf_line_endings() {
        assert_eq!(
            normalize("User-agent: a\r\nAllow: /\r\n"),
            vec!["User-agent: a", "Allow: /"]
        );
    }
}
