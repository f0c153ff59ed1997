//! Source text → token stream with positions.
//!
//! The alphabet partitions into operator/digit-dot/alphanumeric/bracket/
//! whitespace/comment/string-literal classes; a word boundary is emitted
//! whenever the class changes, and always around brackets and punctuation.

use std::rc::Rc;

use crate::position::Position;

/// `! $ % & * + - / : ; < = > ? @ ^ ~ |`.
///
/// `|` is included alongside the rest: the operator priority table treats
/// `& |` as a pair at the same priority, and `|->` is only recognizable as
/// one merged word if `|` lexes as an operator character. See DESIGN.md.
pub(crate) const OPERATOR_CHARS: &str = "!$%&*+-/:;<=>?@^~|";

/// Each of these forms a standalone one-character word.
const BRACKET_CHARS: &str = "()[]{},\\";

/// True when `text` is made up entirely of operator-class characters, i.e.
/// the word is eligible to act as a binary operator or an "operator used
/// as a callable" primary.
pub(crate) fn is_operator_text(text: &str) -> bool {
    !text.is_empty() && text.chars().all(|c| OPERATOR_CHARS.contains(c))
}

pub(crate) fn is_open_bracket(text: &str) -> bool {
    matches!(text, "(" | "[" | "{")
}

pub(crate) fn is_close_bracket(text: &str) -> bool {
    matches!(text, ")" | "]" | "}")
}

const ESCAPE_CHARS: &str = "befnrtv\\'\"?";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CharClass {
    Operator,
    DigitDot,
    Alnum,
    Bracket,
    Whitespace,
    Comment,
    StringLiteral,
}

fn classify(c: char) -> CharClass {
    if c == '"' {
        CharClass::StringLiteral
    } else if c == '#' {
        CharClass::Comment
    } else if c.is_whitespace() {
        CharClass::Whitespace
    } else if BRACKET_CHARS.contains(c) {
        CharClass::Bracket
    } else if c.is_ascii_digit() || c == '.' {
        CharClass::DigitDot
    } else if c.is_alphanumeric() || c == '_' || c == '`' {
        CharClass::Alnum
    } else {
        // Unknown punctuation is folded into the operator class so it still
        // participates in word-boundary merging instead of aborting the scan.
        CharClass::Operator
    }
}

/// A single lexed word: its raw text (including delimiters for string
/// literals) and the position of its first character.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Word {
    pub text: String,
    pub position: Position,
}

#[derive(Debug, Clone)]
pub struct LexError {
    pub message: String,
    pub position: Position,
}

struct Scanner<'s> {
    path: Rc<str>,
    chars: std::iter::Peekable<std::str::Chars<'s>>,
    line: usize,
    column: usize,
    words: Vec<Word>,
    errors: Vec<LexError>,
}

impl<'s> Scanner<'s> {
    fn pos(&self) -> Position {
        Position::new(self.path.clone(), self.line, self.column)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn scan_string_literal(&mut self) {
        let start = self.pos();
        let mut text = String::new();
        text.push(self.bump().expect("caller verified opening quote"));
        loop {
            match self.bump() {
                None => {
                    self.errors.push(LexError {
                        message: "unterminated string literal".to_owned(),
                        position: start.clone(),
                    });
                    break;
                }
                Some('"') => {
                    text.push('"');
                    break;
                }
                Some('\\') => {
                    text.push('\\');
                    match self.bump() {
                        Some(escaped) => {
                            if !ESCAPE_CHARS.contains(escaped) {
                                self.errors.push(LexError {
                                    message: format!("unknown escape sequence '\\{escaped}'"),
                                    position: start.clone(),
                                });
                            }
                            text.push(escaped);
                        }
                        None => {
                            self.errors.push(LexError {
                                message: "unterminated string literal".to_owned(),
                                position: start.clone(),
                            });
                            break;
                        }
                    }
                }
                Some(c) => text.push(c),
            }
        }
        self.words.push(Word { text, position: start });
    }

    fn scan_comment(&mut self) {
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.bump();
        }
    }

    fn scan_run(&mut self, class: CharClass) {
        let start = self.pos();
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if classify(c) != class {
                break;
            }
            text.push(c);
            self.bump();
        }
        self.words.push(Word { text, position: start });
    }

    fn run(mut self) -> (Vec<Word>, Vec<LexError>) {
        while let Some(c) = self.peek() {
            match classify(c) {
                CharClass::Whitespace => {
                    self.bump();
                }
                CharClass::Comment => self.scan_comment(),
                CharClass::StringLiteral => self.scan_string_literal(),
                CharClass::Bracket => {
                    let start = self.pos();
                    let c = self.bump().expect("peeked");
                    self.words.push(Word { text: c.to_string(), position: start });
                }
                class @ (CharClass::Operator | CharClass::DigitDot | CharClass::Alnum) => {
                    self.scan_run(class);
                }
            }
        }
        (self.words, self.errors)
    }
}

/// Tokenizes `source` (already-read file contents) attributed to `path`.
pub fn tokenize(path: &str, source: &str) -> (Vec<Word>, Vec<LexError>) {
    let scanner = Scanner {
        path: Rc::from(path),
        chars: source.chars().peekable(),
        line: 1,
        column: 1,
        words: Vec::new(),
        errors: Vec::new(),
    };
    scanner.run()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(source: &str) -> Vec<String> {
        tokenize("t.fl", source).0.into_iter().map(|w| w.text).collect()
    }

    #[test]
    fn splits_on_class_change() {
        assert_eq!(words("abc123"), vec!["abc123"]);
        assert_eq!(words("a+b"), vec!["a", "+", "b"]);
    }

    #[test]
    fn brackets_are_always_standalone() {
        assert_eq!(words("f(a,b)"), vec!["f", "(", "a", ",", "b", ")"]);
    }

    #[test]
    fn merges_reserved_multichar_operators() {
        assert_eq!(words("x |-> y"), vec!["x", "|->", "y"]);
        assert_eq!(words("a -> b"), vec!["a", "->", "b"]);
    }

    #[test]
    fn comments_are_dropped() {
        assert_eq!(words("a # comment\nb"), vec!["a", "b"]);
    }

    #[test]
    fn string_literals_keep_escapes_and_delimiters() {
        assert_eq!(words(r#""a\"b""#), vec![r#""a\"b""#]);
    }

    #[test]
    fn unterminated_string_reports_error() {
        let (w, errs) = tokenize("t.fl", "\"abc");
        assert_eq!(w.len(), 1);
        assert_eq!(errs.len(), 1);
    }

    #[test]
    fn number_literal_is_one_word() {
        assert_eq!(words("3.14"), vec!["3.14"]);
    }
}
