//! Best-effort repair of a JSON document cut off mid-stream.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Container {
    Object,
    Array,
}

impl Container {
    fn closer(self) -> char {
        match self {
            Self::Object => '}',
            Self::Array => ']',
        }
    }
}

/// Tracks the last byte offset at which the document could be closed
/// cleanly, and the containers open at that point.
struct Repairer<'a> {
    text: &'a str,
    stack: Vec<Container>,
    in_string: bool,
    escape: bool,
    string_is_key: bool,
    expect_key: bool,
    scalar_start: Option<usize>,
    cut: usize,
    cut_stack: Vec<Container>,
}

impl<'a> Repairer<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            stack: Vec::new(),
            in_string: false,
            escape: false,
            string_is_key: false,
            expect_key: false,
            scalar_start: None,
            cut: 0,
            cut_stack: Vec::new(),
        }
    }

    fn mark_safe(&mut self, at: usize) {
        self.cut = at;
        self.cut_stack.clone_from(&self.stack);
    }

    fn top(&self) -> Option<Container> {
        self.stack.last().copied()
    }

    fn run(mut self) -> String {
        let text = self.text;
        for (i, c) in text.char_indices() {
            let end = i + c.len_utf8();

            if self.in_string {
                if self.escape {
                    self.escape = false;
                } else if c == '\\' {
                    self.escape = true;
                } else if c == '"' {
                    self.in_string = false;
                    if !self.string_is_key {
                        self.mark_safe(end);
                    }
                }
                continue;
            }

            if let Some(start) = self.scalar_start {
                if !is_delimiter(c) {
                    continue;
                }
                self.scalar_start = None;
                if is_complete_scalar(&text[start..i]) {
                    self.mark_safe(i);
                }
            }

            match c {
                '{' => {
                    self.stack.push(Container::Object);
                    self.expect_key = true;
                    self.mark_safe(end);
                }
                '[' => {
                    self.stack.push(Container::Array);
                    self.mark_safe(end);
                }
                '}' | ']' => {
                    self.stack.pop();
                    self.expect_key = false;
                    self.mark_safe(end);
                    if self.stack.is_empty() {
                        return text[..end].to_string();
                    }
                }
                '"' => {
                    self.in_string = true;
                    self.string_is_key = self.top() == Some(Container::Object) && self.expect_key;
                    self.expect_key = false;
                }
                ',' => {
                    if self.top() == Some(Container::Object) {
                        self.expect_key = true;
                    }
                }
                ':' => {}
                c if c.is_whitespace() => {}
                _ if !self.stack.is_empty() => self.scalar_start = Some(i),
                _ => {}
            }
        }

        if let Some(start) = self.scalar_start {
            if is_complete_scalar(&text[start..]) {
                self.mark_safe(text.len());
            }
        }

        let mut repaired = text[..self.cut].trim_end().to_string();
        for container in self.cut_stack.iter().rev() {
            repaired.push(container.closer());
        }
        repaired
    }
}

fn is_delimiter(c: char) -> bool {
    matches!(c, ',' | '}' | ']' | ':') || c.is_whitespace()
}

fn is_complete_scalar(token: &str) -> bool {
    serde_json::from_str::<serde_json::Value>(token)
        .is_ok_and(|v| v.is_number() || v.is_boolean() || v.is_null())
}

/// Cut `text` back to its last structurally complete value and close every
/// container still open there, innermost first.
///
/// Dangling keys, partial strings, partial literals and trailing commas are
/// dropped. The result is balanced in `{}`/`[]` outside string literals; it
/// is not guaranteed to parse if the input was malformed before the cut.
pub fn repair_truncated_json(text: &str) -> String {
    Repairer::new(text).run()
}
