//! Comment and literal stripping.
//!
//! # Rules
//! - `'` and `"` open a literal; it closes on the same unescaped character
//! - Literal contents are dropped, the delimiters are kept
//! - `/* */` block comments become a single space
//! - `//` and `#` comment out the rest of the line
//! - `--` comments out the rest of the line only when followed by
//!   whitespace or end of input, otherwise both dashes pass through
//! - Comment delimiters inside a literal are inert

use std::iter::Peekable;
use std::str::Chars;

/// Return `src` with comments and quoted-literal contents removed.
pub fn strip_comments(src: &str) -> String {
    let mut out = String::with_capacity(src.len());
    let mut chars = src.chars().peekable();
    let mut open_quote: Option<char> = None;
    let mut escaped = false;

    while let Some(c) = chars.next() {
        if let Some(quote) = open_quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == quote {
                open_quote = None;
                out.push(c);
            }
            continue;
        }

        match c {
            '\'' | '"' => {
                open_quote = Some(c);
                out.push(c);
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                skip_block_comment(&mut chars);
                out.push(' ');
            }
            '/' if chars.peek() == Some(&'/') => {
                skip_line(&mut chars, &mut out);
            }
            '#' => skip_line(&mut chars, &mut out),
            '-' if chars.peek() == Some(&'-') => {
                chars.next();
                match chars.peek() {
                    Some(next) if !next.is_whitespace() => out.push_str("--"),
                    _ => skip_line(&mut chars, &mut out),
                }
            }
            _ => out.push(c),
        }
    }

    out
}

fn skip_block_comment(chars: &mut Peekable<Chars<'_>>) {
    let mut prev = '\0';
    for c in chars.by_ref() {
        if prev == '*' && c == '/' {
            return;
        }
        prev = c;
    }
}

// The line terminator itself is kept.
fn skip_line(chars: &mut Peekable<Chars<'_>>, out: &mut String) {
    for c in chars.by_ref() {
        if c == '\n' || c == '\r' {
            out.push(c);
            return;
        }
    }
}
