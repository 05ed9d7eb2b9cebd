//! Comment and string-literal scrubbing.
//!
//! Runs before any declaration matching so nothing inside a comment or a
//! string can be read as a declaration. Line breaks are kept, so line numbers
//! in the scrubbed text match the original.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Code,
    LineComment,
    BlockComment,
    DocComment,
    StringLit,
}

/// Remove `;` line comments, `;/ ... /;` block comments and `{ ... }` doc
/// comments, and empty every string literal to `""`.
pub fn scrub(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut mode = Mode::Code;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match mode {
            Mode::Code => match c {
                ';' => {
                    if chars.peek() == Some(&'/') {
                        chars.next();
                        mode = Mode::BlockComment;
                    } else {
                        mode = Mode::LineComment;
                    }
                    out.push(' ');
                }
                '{' => {
                    mode = Mode::DocComment;
                    out.push(' ');
                }
                '"' => {
                    out.push('"');
                    mode = Mode::StringLit;
                }
                _ => out.push(c),
            },
            Mode::LineComment => {
                if c == '\n' {
                    out.push('\n');
                    mode = Mode::Code;
                }
            }
            Mode::BlockComment => match c {
                '/' if chars.peek() == Some(&';') => {
                    chars.next();
                    mode = Mode::Code;
                }
                '\n' => out.push('\n'),
                _ => {}
            },
            Mode::DocComment => match c {
                '}' => mode = Mode::Code,
                '\n' => out.push('\n'),
                _ => {}
            },
            Mode::StringLit => match c {
                '\\' => {
                    // An escaped quote must not end the literal.
                    if chars.peek().is_some_and(|next| *next != '\n') {
                        chars.next();
                    }
                }
                '"' => {
                    out.push('"');
                    mode = Mode::Code;
                }
                '\n' => {
                    // Unterminated literal: Papyrus strings never span lines.
                    out.push('"');
                    out.push('\n');
                    mode = Mode::Code;
                }
                _ => {}
            },
        }
    }

    if mode == Mode::StringLit {
        out.push('"');
    }

    out
}
