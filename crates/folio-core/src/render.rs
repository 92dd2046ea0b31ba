// HTML markup for the blog listing
use chrono::{Local, NaiveDate};

use crate::listing::parse_published_date;
use crate::models::BlogEntry;

pub const EMPTY_PLACEHOLDER: &str = "No blogs found";

/// Markup for the visible entries, or the placeholder when there are none
///
/// Every field coming from the endpoint is escaped before it lands in the
/// markup.
pub fn render_entries(entries: &[BlogEntry]) -> String {
    if entries.is_empty() {
        return format!("<p class=\"blog-empty\">{}</p>", EMPTY_PLACEHOLDER);
    }

    entries.iter().map(render_card).collect::<Vec<_>>().join("\n")
}

fn render_card(entry: &BlogEntry) -> String {
    let title = escape_html(entry.title.as_deref().unwrap_or(""));
    let author = escape_html(entry.author.as_deref().unwrap_or(""));
    let image = escape_html(entry.image.as_deref().unwrap_or(""));
    let raw_date = escape_html(entry.published_date.as_deref().unwrap_or(""));
    let date = escape_html(&format_date(entry.published_date.as_deref()));
    let reading_time = escape_html(
        &entry
            .reading_time
            .as_ref()
            .map(|rt| rt.to_string())
            .unwrap_or_default(),
    );
    let excerpt = escape_html(entry.content.as_deref().unwrap_or(""));
    let tags = entry
        .tags
        .iter()
        .map(|tag| format!("<li class=\"blog-card__tag\">{}</li>", escape_html(tag)))
        .collect::<String>();

    format!(
        "<article class=\"blog-card\">\
<img class=\"blog-card__image\" src=\"{image}\" alt=\"{title}\" loading=\"lazy\">\
<div class=\"blog-card__body\">\
<h3 class=\"blog-card__title\">{title}</h3>\
<p class=\"blog-card__meta\">\
<span class=\"blog-card__author\">{author}</span>\
<time class=\"blog-card__date\" datetime=\"{raw_date}\">{date}</time>\
<span class=\"blog-card__reading-time\">{reading_time}</span>\
</p>\
<p class=\"blog-card__excerpt\">{excerpt}</p>\
<ul class=\"blog-card__tags\">{tags}</ul>\
</div>\
</article>"
    )
}

/// Human-readable date
///
/// Bare dates are shown as written; timestamps are shown in local time.
/// Unparsable values are passed through untouched.
pub fn format_date(raw: Option<&str>) -> String {
    let Some(raw) = raw else {
        return String::new();
    };

    if let Ok(date) = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d") {
        return date.format("%b %-d, %Y").to_string();
    }

    match parse_published_date(raw) {
        Some(dt) => dt.with_timezone(&Local).format("%b %-d, %Y").to_string(),
        None => raw.to_string(),
    }
}

pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
