use std::sync::LazyLock;

use regex::Regex;

static WORDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Z]+[a-z0-9]*|[a-z0-9]+").expect("static word pattern"));

/// Convert a column name such as `created_at` or `FOO_BAR` into camelCase.
#[must_use]
pub fn camelize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for (i, word) in WORDS.find_iter(name).enumerate() {
        let lower = word.as_str().to_ascii_lowercase();
        if i == 0 {
            out.push_str(&lower);
            continue;
        }
        let mut chars = lower.chars();
        if let Some(first) = chars.next() {
            out.push(first.to_ascii_uppercase());
            out.push_str(chars.as_str());
        }
    }
    out
}

#[must_use]
pub fn camelize_all(names: &[String]) -> Vec<String> {
    names.iter().map(|name| camelize(name)).collect()
}
