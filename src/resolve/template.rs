//! Template Resolver: `{name}` substitution in display strings.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde_json::{Map, Value};

use crate::variables::display_value;

static TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([^{}]+)\}").expect("token pattern is valid"));

/// Replace every `{token}` with the string form of the matching variable.
///
/// Tokens are flat keys: `{user.name}` looks up the variable literally named
/// `user.name`. Nested path traversal is not implemented. Unknown tokens are
/// left as written.
pub fn resolve_template<'a>(text: &'a str, variables: &Map<String, Value>) -> Cow<'a, str> {
    if !text.contains('{') {
        return Cow::Borrowed(text);
    }
    TOKEN.replace_all(text, |caps: &Captures<'_>| match variables.get(&caps[1]) {
        Some(value) => display_value(value),
        None => caps[0].to_string(),
    })
}

/// Token names referenced by a display string.
pub fn template_tokens(text: &str) -> impl Iterator<Item = &str> {
    TOKEN
        .captures_iter(text)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
}
