//! Resize-directive parsing for the control channel
//!
//! The control channel carries UTF-8 text, one directive per line, each of
//! the exact shape `<rows>x<columns>` (e.g. `24x80` for 24 rows, 80 columns).
//! Parsing is strictly per chunk: a directive split across two reads is lost,
//! because neither half matches the expected shape on its own. Partial data
//! at a chunk boundary is deliberately not buffered.

use crate::size::WindowSize;

/// Parse one chunk of control-channel input into resize directives.
///
/// Anything that does not match the directive shape is silently dropped:
/// invalid UTF-8 skips the whole chunk, and lines with a missing separator,
/// non-numeric fields, or values outside `u16` are ignored individually.
/// Malformed input must never stop the relay.
pub fn parse_chunk(chunk: &[u8]) -> Vec<WindowSize> {
    let Ok(text) = std::str::from_utf8(chunk) else {
        tracing::debug!("discarding non-UTF-8 control chunk ({} bytes)", chunk.len());
        return Vec::new();
    };

    text.trim()
        .split('\n')
        .filter_map(parse_line)
        .collect()
}

/// Parse a single `<rows>x<columns>` line
fn parse_line(line: &str) -> Option<WindowSize> {
    let (rows, cols) = line.trim().split_once('x')?;
    let rows: u16 = rows.parse().ok()?;
    let cols: u16 = cols.parse().ok()?;
    Some(WindowSize::new(cols, rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_single_directive() {
        let sizes = parse_chunk(b"24x80\n");
        assert_eq!(sizes, vec![WindowSize::new(80, 24)]);
    }

    #[test]
    fn test_parse_rows_before_columns() {
        let sizes = parse_chunk(b"40x120\n");
        assert_eq!(sizes.len(), 1);
        assert_eq!(sizes[0].rows, 40);
        assert_eq!(sizes[0].cols, 120);
    }

    #[test]
    fn test_parse_multiple_directives_in_one_chunk() {
        let sizes = parse_chunk(b"24x80\n40x120\n");
        assert_eq!(
            sizes,
            vec![WindowSize::new(80, 24), WindowSize::new(120, 40)]
        );
    }

    #[test]
    fn test_malformed_lines_ignored() {
        assert!(parse_chunk(b"abc\n").is_empty());
        assert!(parse_chunk(b"x\n").is_empty());
        assert!(parse_chunk(b"12x\n").is_empty());
        assert!(parse_chunk(b"x80\n").is_empty());
        assert!(parse_chunk(b"-1x80\n").is_empty());
        assert!(parse_chunk(b"99999x80\n").is_empty());
    }

    #[test]
    fn test_malformed_line_does_not_disturb_later_directives() {
        let sizes = parse_chunk(b"abc\n24x80\n12x\n40x120\n");
        assert_eq!(
            sizes,
            vec![WindowSize::new(80, 24), WindowSize::new(120, 40)]
        );
    }

    #[test]
    fn test_split_directive_halves_are_lost() {
        // A directive that straddles two reads is not reassembled; each half
        // fails the shape check on its own.
        assert!(parse_chunk(b"24x").is_empty());
        assert!(parse_chunk(b"80\n").is_empty());
    }

    #[test]
    fn test_empty_and_whitespace_chunks() {
        assert!(parse_chunk(b"").is_empty());
        assert!(parse_chunk(b"\n").is_empty());
        assert!(parse_chunk(b"\n\n\n").is_empty());
    }

    #[test]
    fn test_invalid_utf8_skipped() {
        assert!(parse_chunk(&[0xff, 0xfe, b'\n']).is_empty());
    }

    proptest! {
        #[test]
        fn parse_never_panics(chunk in proptest::collection::vec(any::<u8>(), 0..256)) {
            let _ = parse_chunk(&chunk);
        }

        #[test]
        fn canonical_directives_always_parse(rows in 0u16..=u16::MAX, cols in 0u16..=u16::MAX) {
            let line = format!("{rows}x{cols}\n");
            let sizes = parse_chunk(line.as_bytes());
            prop_assert_eq!(sizes.len(), 1);
            prop_assert_eq!(sizes[0].rows, rows);
            prop_assert_eq!(sizes[0].cols, cols);
        }
    }
}
