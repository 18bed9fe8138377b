//! Incremental scanner for one top-level string field of a JSON object.
//!
//! Text arrives in arbitrary chunks. The scanner follows object structure,
//! string literals and escapes across chunk boundaries and reports the value
//! of the watched key as soon as its closing quote arrives. Nested objects
//! and arrays are skipped, so `"type"` keys inside `changes` or `elements`
//! never match.
//!
//! Only the first top-level object is scanned, matching the assembler's
//! candidate document, which starts at the first `{`. A brace pair in
//! preamble text such as `Sure {name}:` is that first object, so a document
//! after it is not classified early.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Key,
    Colon,
    Value,
    AfterValue,
}

#[derive(Debug, Clone)]
pub struct KeyScanner {
    key: String,
    depth: usize,
    phase: Phase,
    in_string: bool,
    escape: bool,
    capturing: bool,
    buf: String,
    key_matched: bool,
    finished: bool,
    found: Option<String>,
}

impl KeyScanner {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            depth: 0,
            phase: Phase::Key,
            in_string: false,
            escape: false,
            capturing: false,
            buf: String::new(),
            key_matched: false,
            finished: false,
            found: None,
        }
    }

    /// Feed the next chunk. Returns the value the first time it completes.
    pub fn push(&mut self, chunk: &str) -> Option<&str> {
        if self.finished || self.found.is_some() {
            return None;
        }
        for c in chunk.chars() {
            if self.step(c) {
                return self.found.as_deref();
            }
            if self.finished {
                break;
            }
        }
        None
    }

    /// The value, once seen.
    pub fn value(&self) -> Option<&str> {
        self.found.as_deref()
    }

    fn step(&mut self, c: char) -> bool {
        if self.depth == 0 {
            if c == '{' {
                self.depth = 1;
                self.phase = Phase::Key;
            }
            return false;
        }

        if self.in_string {
            if self.escape {
                self.escape = false;
                if self.capturing {
                    self.buf.push(c);
                }
            } else if c == '\\' {
                self.escape = true;
            } else if c == '"' {
                self.in_string = false;
                if self.capturing {
                    self.capturing = false;
                    return self.close_string();
                }
            } else if self.capturing {
                self.buf.push(c);
            }
            return false;
        }

        match c {
            '"' => {
                self.in_string = true;
                self.capturing = self.depth == 1
                    && match self.phase {
                        Phase::Key => true,
                        Phase::Value => self.key_matched,
                        Phase::Colon | Phase::AfterValue => false,
                    };
                self.buf.clear();
                if self.depth == 1 && self.phase == Phase::Value && !self.capturing {
                    self.phase = Phase::AfterValue;
                }
            }
            '{' | '[' => {
                if self.depth == 1 {
                    self.phase = Phase::AfterValue;
                }
                self.depth += 1;
            }
            '}' | ']' => {
                self.depth -= 1;
                if self.depth == 0 {
                    self.finished = true;
                }
            }
            ':' if self.depth == 1 && self.phase == Phase::Colon => self.phase = Phase::Value,
            ',' if self.depth == 1 => self.phase = Phase::Key,
            c if self.depth == 1 && self.phase == Phase::Value && !c.is_whitespace() => {
                self.phase = Phase::AfterValue;
            }
            _ => {}
        }
        false
    }

    fn close_string(&mut self) -> bool {
        match self.phase {
            Phase::Key => {
                self.key_matched = self.buf == self.key;
                self.phase = Phase::Colon;
                false
            }
            Phase::Value => {
                self.phase = Phase::AfterValue;
                if self.key_matched && self.found.is_none() {
                    self.found = Some(std::mem::take(&mut self.buf));
                    return true;
                }
                false
            }
            Phase::Colon | Phase::AfterValue => false,
        }
    }
}
