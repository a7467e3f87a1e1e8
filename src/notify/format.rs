// src/notify/format.rs
//! Telegram "Markdown" (legacy) message rendering.

use chrono::{DateTime, TimeZone};

use crate::ingest::truncate_chars;

/// Telegram caps text messages at 4096; keep headroom.
pub const MAX_MESSAGE_CHARS: usize = 4_000;
/// Photo captions are limited far below text messages.
pub const MAX_CAPTION_CHARS: usize = 1_024;

const MARKUP_CHARS: &[char] = &['*', '_', '`', '[', ']'];
const ESCAPABLE_CHARS: &[char] = &['*', '_', '`', '['];

/// Drop emphasis/code/link delimiters that would unbalance the markup.
/// Used for text placed inside an entity, where escaping is not allowed.
pub fn strip_markup(s: &str) -> String {
    s.chars().filter(|c| !MARKUP_CHARS.contains(c)).collect()
}

/// Backslash-escape markup characters in text outside any entity.
pub fn escape_markup(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if ESCAPABLE_CHARS.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Render one article in at most `limit` chars. `at` is the run time, not
/// the publish time.
///
/// The summary gives way first, then the title; the link line is kept
/// whole. Only when the frame alone exceeds `limit` is the rendered text
/// clamped.
pub fn format_message_within<Tz>(
    source: &str,
    title: &str,
    link: &str,
    summary: &str,
    at: &DateTime<Tz>,
    limit: usize,
) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let safe_source = strip_markup(source);
    let safe_title = strip_markup(title);
    let safe_summary = strip_markup(summary);
    let safe_link = escape_markup(link);
    let stamp = at.format("%Y-%m-%d %H:%M").to_string();

    let render = |t: &str, s: &str| {
        format!("📰 *{t}*\n_{safe_source}_ • 🕒 {stamp}\n\n{s}\n\n👉 {safe_link}")
    };

    let frame = render("", "").chars().count();
    let room = limit.saturating_sub(frame);
    let title_room = safe_title.chars().count().min(room);
    let summary_room = room - title_room;

    let t = truncate_chars(&safe_title, title_room);
    let s = truncate_chars(&safe_summary, summary_room);
    truncate_chars(&render(t.trim_end(), s.trim_end()), limit)
}
