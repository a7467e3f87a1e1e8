// src/ingest/mod.rs
pub mod providers;
pub mod types;

use once_cell::sync::OnceCell;
use regex::Regex;

/// Collapse every whitespace run into one space and trim.
pub fn collapse_ws(s: &str) -> String {
    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").expect("ws regex"));
    re_ws.replace_all(s, " ").trim().to_string()
}

/// Turn an HTML-ish feed description into plain text.
pub fn clean_hint(s: &str) -> String {
    // 1) Strip tags first so encoded `&lt;b&gt;` survives as literal text
    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?is)<[^>]*>").expect("tag regex"));
    let stripped = re_tags.replace_all(s, " ");

    // 2) HTML entity decode
    let decoded = html_escape::decode_html_entities(&stripped);

    // 3) Collapse whitespace (&nbsp; decodes to U+00A0, which \s covers)
    collapse_ws(&decoded)
}

/// First `<img src="...">` in an HTML fragment, if any.
pub fn first_img_src(html: &str) -> Option<String> {
    static RE_IMG: OnceCell<Regex> = OnceCell::new();
    let re = RE_IMG.get_or_init(|| {
        Regex::new(r#"(?is)<img\b[^>]*?\bsrc\s*=\s*["']([^"']+)["']"#).expect("img regex")
    });
    re.captures(html)
        .and_then(|c| c.get(1))
        .map(|m| html_escape::decode_html_entities(m.as_str()).trim().to_string())
}

/// First candidate that is an absolute http(s) URL.
pub fn pick_image<'a, I>(candidates: I) -> Option<String>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    candidates
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|u| u.starts_with("https://") || u.starts_with("http://"))
        .map(str::to_string)
}

/// Keep at most `max` chars (Unicode scalar values, never splits a char).
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}
