//! SMTP reply types.

use std::fmt;

/// One aggregated server reply.
///
/// `lines` holds the raw text lines as received (code prefix and separator
/// included), in order. A reply only exists once its final line was read,
/// and it cannot be changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    code: ReplyCode,
    lines: Vec<String>,
}

impl Reply {
    /// Creates a new reply.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // Vec is not const-compatible
    pub fn new(code: ReplyCode, lines: Vec<String>) -> Self {
        Self { code, lines }
    }

    /// Returns the reply code.
    #[must_use]
    pub const fn code(&self) -> ReplyCode {
        self.code
    }

    /// Returns the first digit of the reply code (2 to 5).
    #[must_use]
    pub const fn code_class(&self) -> u8 {
        self.code.class()
    }

    /// Returns the raw reply lines.
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Returns the reply lines with the code and separator stripped.
    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(|line| line.get(4..).unwrap_or(""))
    }

    /// Returns true if this is a success reply (2xx).
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.code.is_success()
    }

    /// Returns true if this is a permanent error (5xx).
    #[must_use]
    pub const fn is_permanent_error(&self) -> bool {
        self.code.is_permanent()
    }

    /// Returns the raw lines joined with newlines.
    #[must_use]
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

/// SMTP reply code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReplyCode(u16);

impl ReplyCode {
    /// Creates a new reply code.
    #[must_use]
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// Returns the numeric code.
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self.0
    }

    /// Returns the code class (`code / 100`).
    #[must_use]
    #[allow(clippy::cast_possible_truncation)] // codes are three digits
    pub const fn class(self) -> u8 {
        (self.0 / 100) as u8
    }

    /// Returns true if this is a success code (2xx).
    #[must_use]
    pub const fn is_success(self) -> bool {
        self.class() == 2
    }

    /// Returns true if this is a permanent error (5xx).
    #[must_use]
    pub const fn is_permanent(self) -> bool {
        self.class() == 5
    }
}

impl fmt::Display for ReplyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Codes the drivers wait for
impl ReplyCode {
    /// 220 Service ready
    pub const SERVICE_READY: Self = Self(220);
    /// 221 Service closing transmission channel
    pub const CLOSING: Self = Self(221);
    /// 250 Requested mail action okay, completed
    pub const OK: Self = Self(250);
    /// 334 Continue with authentication
    pub const AUTH_CONTINUE: Self = Self(334);
    /// 354 Start mail input
    pub const START_DATA: Self = Self(354);
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;

    mod reply_code_tests {
        use super::*;

        #[test]
        fn classes() {
            assert_eq!(ReplyCode::SERVICE_READY.class(), 2);
            assert_eq!(ReplyCode::START_DATA.class(), 3);
            assert_eq!(ReplyCode::new(450).class(), 4);
            assert_eq!(ReplyCode::new(535).class(), 5);
        }

        #[test]
        fn predicates() {
            assert!(ReplyCode::OK.is_success());
            assert!(ReplyCode::CLOSING.is_success());
            assert!(!ReplyCode::AUTH_CONTINUE.is_success());
            assert!(ReplyCode::new(554).is_permanent());
            assert!(!ReplyCode::OK.is_permanent());
        }

        #[test]
        fn display() {
            assert_eq!(format!("{}", ReplyCode::OK), "250");
            assert_eq!(format!("{}", ReplyCode::new(500)), "500");
        }
    }

    mod reply_tests {
        use super::*;

        #[test]
        fn accessors() {
            let reply = Reply::new(
                ReplyCode::OK,
                vec!["250-smtp.example.com".to_string(), "250 OK".to_string()],
            );
            assert_eq!(reply.code(), ReplyCode::OK);
            assert_eq!(reply.code_class(), 2);
            assert_eq!(reply.lines().len(), 2);
            assert!(reply.is_success());
        }

        #[test]
        fn messages_strip_prefix() {
            let reply = Reply::new(
                ReplyCode::OK,
                vec![
                    "250-smtp.example.com".to_string(),
                    "250-AUTH PLAIN".to_string(),
                    "250".to_string(),
                ],
            );
            let messages: Vec<&str> = reply.messages().collect();
            assert_eq!(messages, vec!["smtp.example.com", "AUTH PLAIN", ""]);
        }

        #[test]
        fn text_joins_raw_lines() {
            let reply = Reply::new(
                ReplyCode::SERVICE_READY,
                vec![
                    "220-smtp.example.com ESMTP".to_string(),
                    "220 Ready".to_string(),
                ],
            );
            assert_eq!(reply.text(), "220-smtp.example.com ESMTP\n220 Ready");
            assert_eq!(reply.to_string(), reply.text());
        }
    }
}
