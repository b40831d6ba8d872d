//! Message body sources.

use std::io;
use std::path::PathBuf;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};
use tracing::debug;

use crate::exit::Failure;

/// Name standing for standard input in the file list.
pub const STDIN_NAME: &str = "-";

/// Checks a file list before anything is read: stdin at most once, and
/// every other entry must exist.
///
/// # Errors
///
/// Returns [`Failure::Usage`] if stdin is named twice and
/// [`Failure::FileNotFound`] for the first missing file.
pub fn check_files(names: &[String]) -> Result<(), Failure> {
    if names.iter().filter(|n| n.as_str() == STDIN_NAME).count() > 1 {
        return Err(Failure::Usage("standard input can only be used once".into()));
    }

    if let Some(missing) = names
        .iter()
        .filter(|n| n.as_str() != STDIN_NAME)
        .map(PathBuf::from)
        .find(|p| !p.is_file())
    {
        return Err(Failure::FileNotFound(missing));
    }

    Ok(())
}

/// Reads every file in order and returns their lines, concatenated.
///
/// # Errors
///
/// Returns the check failures of [`check_files`] and read errors.
pub async fn read_files(names: &[String]) -> Result<Vec<String>, Failure> {
    check_files(names)?;

    let mut lines = Vec::new();
    for name in names {
        let contents = if name == STDIN_NAME {
            let mut buf = String::new();
            tokio::io::stdin().read_to_string(&mut buf).await?;
            buf
        } else {
            tokio::fs::read_to_string(name).await?
        };
        debug!("Read {} line(s) from {name}", contents.lines().count());
        lines.extend(contents.lines().map(str::to_string));
    }
    Ok(lines)
}

/// Reads body lines until a line that is exactly `.` or end of input.
///
/// # Errors
///
/// Returns read errors.
pub async fn read_until_dot<R>(reader: R) -> io::Result<Vec<String>>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut body = Vec::new();
    while let Some(line) = lines.next_line().await? {
        if line == "." {
            break;
        }
        body.push(line);
    }
    Ok(body)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;

    fn temp_file(name: &str, contents: &str) -> String {
        let path = std::env::temp_dir().join(format!(
            "mailshot-source-{}-{name}.txt",
            std::process::id()
        ));
        std::fs::write(&path, contents).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn stdin_only_once() {
        let names = vec!["-".to_string(), "-".to_string()];
        assert!(matches!(check_files(&names), Err(Failure::Usage(_))));
    }

    #[test]
    fn missing_file_is_reported() {
        let names = vec![
            "-".to_string(),
            "/nonexistent/mailshot/body.txt".to_string(),
        ];
        match check_files(&names) {
            Err(Failure::FileNotFound(path)) => {
                assert_eq!(path, PathBuf::from("/nonexistent/mailshot/body.txt"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn files_are_concatenated_in_order() {
        let first = temp_file("first", "one\r\ntwo\n");
        let second = temp_file("second", ".three\n");

        let lines = read_files(&[first.clone(), second.clone()]).await.unwrap();
        std::fs::remove_file(first).unwrap();
        std::fs::remove_file(second).unwrap();

        assert_eq!(lines, vec!["one", "two", ".three"]);
    }

    #[tokio::test]
    async fn body_stops_at_dot() {
        let input = &b"first\n..kept\n.\nignored\n"[..];
        let body = read_until_dot(input).await.unwrap();
        assert_eq!(body, vec!["first", "..kept"]);
    }

    #[tokio::test]
    async fn body_stops_at_eof() {
        let body = read_until_dot(&b"only line"[..]).await.unwrap();
        assert_eq!(body, vec!["only line"]);
    }
}
