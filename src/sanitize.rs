use askama_escape::{escape, Html};

/// HTML-escapes `&`, `<`, `>`, `"` and `'`.
pub fn escape_html(text: &str) -> String {
    escape(text, Html).to_string()
}

/// Removes `<...>` runs, then escapes what is left.
///
/// A tag ends at the first `>` after its `<`. A `<` with no `>` before the
/// next newline is kept as text.
pub fn sanitize(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }
    escape_html(&strip_tags(raw))
}

fn strip_tags(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(open) = rest.find('<') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let line = after.find('\n').unwrap_or(after.len());
        match after[..line].find('>') {
            Some(close) => rest = &after[close + 1..],
            None => {
                out.push('<');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}
