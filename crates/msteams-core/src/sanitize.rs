//! Markup stripping for markdown-mode card text.
//!
//! Every tag outside [`ALLOWED_TAGS`] is removed while its inner text is
//! kept. Allowed tags pass through byte for byte, attributes included.
//! A `<` that cannot start a tag is written as `&lt;` so that removing a tag
//! never glues two fragments into a new one; this keeps [`sanitize`]
//! idempotent.

/// Formatting tags that survive sanitizing.
pub const ALLOWED_TAGS: &[&str] = &[
    "strong",
    "em",
    "h1",
    "h2",
    "h3",
    "strike",
    "ul",
    "ol",
    "li",
    "pre",
    "blockquote",
    "a",
    "img",
    "p",
];

/// Strips disallowed markup from an alert body.
#[must_use]
pub fn sanitize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(pos) = rest.find('<') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];

        if rest.starts_with("<!--") {
            rest = match rest[4..].find("-->") {
                Some(end) => &rest[4 + end + 3..],
                None => "",
            };
            continue;
        }

        if !opens_tag(rest) {
            out.push_str("&lt;");
            rest = &rest[1..];
            continue;
        }

        match tag_end(rest) {
            Some(end) => {
                let tag = &rest[..end];
                if is_allowed(tag) {
                    out.push_str(tag);
                }
                rest = &rest[end..];
            }
            // unterminated tag swallows the remainder
            None => rest = "",
        }
    }

    out.push_str(rest);
    out
}

fn opens_tag(s: &str) -> bool {
    matches!(
        s.as_bytes().get(1),
        Some(&b) if b.is_ascii_alphabetic() || matches!(b, b'/' | b'!' | b'?')
    )
}

/// Byte offset just past the `>` closing the tag at the start of `s`.
/// Quoted attribute values may contain `>`.
fn tag_end(s: &str) -> Option<usize> {
    let mut quote: Option<u8> = None;
    for (idx, &b) in s.as_bytes().iter().enumerate().skip(1) {
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None if b == b'"' || b == b'\'' => quote = Some(b),
            None if b == b'>' => return Some(idx + 1),
            None => {}
        }
    }
    None
}

fn is_allowed(tag: &str) -> bool {
    if tag[1..].contains('<') {
        return false;
    }
    let name: String = tag[1..]
        .trim_start_matches('/')
        .chars()
        .take_while(|&c| c.is_ascii_alphanumeric() || matches!(c, '-' | ':'))
        .collect();
    !name.is_empty()
        && ALLOWED_TAGS
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(&name))
}
