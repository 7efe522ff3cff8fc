//! Minimal quote-aware CSV row codec for the series files. std-only.
//!
//! Series files are comma-separated with RFC-style double-quote escaping.
//! Fields are quoted only when they contain a comma, quote or line break,
//! so keyword and title text survives round-trips intact.

use std::io::{self, Write};

fn needs_quotes(field: &str) -> bool {
    field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r')
}

/// Write one row to any writer, terminated with a newline.
pub fn write_row<W: Write>(mut w: W, fields: &[&str]) -> io::Result<()> {
    let mut first = true;
    for field in fields {
        if !first {
            write!(w, ",")?;
        } else {
            first = false;
        }
        if needs_quotes(field) {
            let escaped = field.replace('"', "\"\"");
            write!(w, "\"{}\"", escaped)?;
        } else {
            write!(w, "{}", field)?;
        }
    }
    writeln!(w)
}

/// Split one line into fields, honoring quotes and doubled-quote escapes.
/// Returns `None` for a line with an unterminated quote (malformed row).
pub fn split_line(line: &str) -> Option<Vec<String>> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.trim_end_matches(['\r', '\n']).chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                if in_quotes {
                    if matches!(chars.peek(), Some('"')) {
                        chars.next(); // doubled-quote escape
                        field.push('"');
                    } else {
                        in_quotes = false;
                    }
                } else {
                    in_quotes = true;
                }
            }
            ',' if !in_quotes => {
                fields.push(std::mem::take(&mut field));
            }
            _ => field.push(ch),
        }
    }

    if in_quotes {
        return None;
    }
    fields.push(field);
    Some(fields)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row_to_string(fields: &[&str]) -> String {
        let mut buf = Vec::new();
        write_row(&mut buf, fields).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_plain_row() {
        assert_eq!(
            row_to_string(&["2025-01-02 03:04:05", "laravel", "3"]),
            "2025-01-02 03:04:05,laravel,3\n"
        );
    }

    #[test]
    fn test_quoting_round_trip() {
        let title = "Laravel, PHP \"framework\"";
        let line = row_to_string(&["ts", title, "https://web.com/a?b=1"]);
        let fields = split_line(&line).unwrap();
        assert_eq!(fields, vec!["ts", title, "https://web.com/a?b=1"]);
    }

    #[test]
    fn test_empty_fields_survive() {
        let line = row_to_string(&["a", "", "c"]);
        assert_eq!(split_line(&line).unwrap(), vec!["a", "", "c"]);
    }

    #[test]
    fn test_unterminated_quote_is_malformed() {
        assert!(split_line("a,\"broken,c").is_none());
    }

    #[test]
    fn test_crlf_tolerated() {
        assert_eq!(split_line("a,b,c\r\n").unwrap(), vec!["a", "b", "c"]);
    }
}
