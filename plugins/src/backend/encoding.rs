//! Decides whether task text can travel as a single command-line argument
//! or has to be streamed to the backend on stdin.
//!
//! Every trigger is reported on its own so the planner can log all of them;
//! the decision is simply "any reason at all".

use std::fmt;

/// Longest task text, in characters, still passed inline.
pub const MAX_INLINE_CHARS: usize = 800;

/// One reason the task text must go through stdin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StdinReason {
    /// The text itself arrived on our stdin.
    Piped,
    /// The user passed `-` as the task.
    ExplicitSentinel,
    Newline,
    Backslash,
    DoubleQuote,
    SingleQuote,
    Backtick,
    Dollar,
    /// Character count above [`MAX_INLINE_CHARS`].
    TooLong(usize),
}

impl fmt::Display for StdinReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Piped => f.write_str("task text was piped"),
            Self::ExplicitSentinel => f.write_str("task given as '-'"),
            Self::Newline => f.write_str("contains a newline"),
            Self::Backslash => f.write_str("contains a backslash"),
            Self::DoubleQuote => f.write_str("contains a double quote"),
            Self::SingleQuote => f.write_str("contains a single quote"),
            Self::Backtick => f.write_str("contains a backtick"),
            Self::Dollar => f.write_str("contains a dollar sign"),
            Self::TooLong(n) => write!(f, "length {} exceeds {} characters", n, MAX_INLINE_CHARS),
        }
    }
}

/// Returns every reason `text` cannot be passed inline, in a fixed order.
pub fn stdin_reasons(text: &str, piped: bool, explicit: bool) -> Vec<StdinReason> {
    let mut reasons = Vec::new();
    if piped {
        reasons.push(StdinReason::Piped);
    }
    if explicit {
        reasons.push(StdinReason::ExplicitSentinel);
    }

    let checks: [(char, StdinReason); 6] = [
        ('\n', StdinReason::Newline),
        ('\\', StdinReason::Backslash),
        ('"', StdinReason::DoubleQuote),
        ('\'', StdinReason::SingleQuote),
        ('`', StdinReason::Backtick),
        ('$', StdinReason::Dollar),
    ];
    for (ch, reason) in checks {
        if text.contains(ch) {
            reasons.push(reason);
        }
    }

    let len = text.chars().count();
    if len > MAX_INLINE_CHARS {
        reasons.push(StdinReason::TooLong(len));
    }
    reasons
}

pub fn should_use_stdin(text: &str, piped: bool, explicit: bool) -> bool {
    !stdin_reasons(text, piped, explicit).is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn plain_text_stays_inline() {
        assert!(stdin_reasons("fix the failing test in parser.rs", false, false).is_empty());
        assert!(!should_use_stdin("add logging", false, false));
    }

    #[test]
    fn length_threshold_is_800_characters() {
        let at_limit = "a".repeat(800);
        let over = "a".repeat(801);
        assert!(!should_use_stdin(&at_limit, false, false));
        assert_eq!(
            stdin_reasons(&over, false, false),
            vec![StdinReason::TooLong(801)]
        );
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        // 400 two-byte characters are 800 bytes but only 400 characters.
        let text = "é".repeat(400);
        assert!(!should_use_stdin(&text, false, false));
    }

    #[test]
    fn each_special_character_triggers_its_own_reason() {
        let cases = [
            ("line one\nline two", StdinReason::Newline),
            ("C:\\path", StdinReason::Backslash),
            ("say \"hi\"", StdinReason::DoubleQuote),
            ("it's", StdinReason::SingleQuote),
            ("run `ls`", StdinReason::Backtick),
            ("echo $HOME", StdinReason::Dollar),
        ];
        for (text, expected) in cases {
            assert_eq!(stdin_reasons(text, false, false), vec![expected], "{text:?}");
        }
    }

    #[test]
    fn reasons_accumulate_independently() {
        let reasons = stdin_reasons("a\n$b", true, true);
        assert_eq!(
            reasons,
            vec![
                StdinReason::Piped,
                StdinReason::ExplicitSentinel,
                StdinReason::Newline,
                StdinReason::Dollar,
            ]
        );
    }

    #[test]
    fn piped_or_explicit_forces_stdin_for_plain_text() {
        assert!(should_use_stdin("hello", true, false));
        assert!(should_use_stdin("hello", false, true));
    }

    #[test]
    fn reason_display_names_the_limit() {
        assert_eq!(
            StdinReason::TooLong(900).to_string(),
            "length 900 exceeds 800 characters"
        );
    }
}
