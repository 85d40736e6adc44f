use std::collections::HashMap;

/// Values bound to placeholder names for one render pass
#[derive(Debug, Default)]
pub struct PlaceholderValues {
    values: HashMap<&'static str, String>,
}

impl PlaceholderValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: &'static str, value: impl Into<String>) -> &mut Self {
        self.values.insert(name, value.into());
        self
    }

    fn get(&self, name: &str) -> &str {
        self.values.get(name).map(String::as_str).unwrap_or("")
    }
}

/// Replaces every `{identifier}` token in a single left-to-right pass
///
/// Unknown identifiers become the empty string. Braces that do not enclose
/// an identifier are copied as-is and substituted text is never rescanned.
pub fn substitute(content: &str, values: &PlaceholderValues) -> String {
    let mut out = String::with_capacity(content.len());
    let mut rest = content;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match identifier_len(after) {
            Some(len) if after[len..].starts_with('}') => {
                out.push_str(values.get(&after[..len]));
                rest = &after[len + 1..];
            }
            _ => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Length of the identifier at the start of `s`, if any
fn identifier_len(s: &str) -> Option<usize> {
    let mut chars = s.char_indices();
    match chars.next() {
        Some((_, c)) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return None,
    }
    let end = chars
        .find(|(_, c)| !(c.is_ascii_alphanumeric() || *c == '_'))
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    Some(end)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values() -> PlaceholderValues {
        let mut values = PlaceholderValues::new();
        values.set("title", "Sales").set("summary", "{title}");
        values
    }

    #[test]
    fn replaces_known_and_blanks_unknown() {
        let out = substitute("<{title}> [{unknown_key}]", &values());
        assert_eq!(out, "<Sales> []");
    }

    #[test]
    fn code_braces_survive() {
        let body = "fun main() { println(\"{title}\") }\nmap = {\"a\": 1}; {} {1x} {";
        let out = substitute(body, &values());
        assert_eq!(
            out,
            "fun main() { println(\"Sales\") }\nmap = {\"a\": 1}; {} {1x} {"
        );
    }

    #[test]
    fn substituted_text_is_not_rescanned() {
        assert_eq!(substitute("{summary}", &values()), "{title}");
    }

    #[test]
    fn adjacent_and_nested_tokens() {
        assert_eq!(substitute("{title}{title}", &values()), "SalesSales");
        assert_eq!(substitute("{{title}}", &values()), "{Sales}");
    }
}
