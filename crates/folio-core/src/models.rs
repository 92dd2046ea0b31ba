use folio_api::BlogPost;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A blog entry as the listing works with it
///
/// Nothing is guaranteed to be present. The serialized shape matches the
/// endpoint's, so cached envelopes look like what the network returned.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlogEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reading_time: Option<ReadingTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub tags: Vec<String>,
}

/// Reading time is either a plain number of minutes or free text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReadingTime {
    Minutes(f64),
    Label(String),
}

impl std::fmt::Display for ReadingTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReadingTime::Minutes(m) if m.fract() == 0.0 => write!(f, "{} min read", *m as i64),
            ReadingTime::Minutes(m) => write!(f, "{} min read", m),
            ReadingTime::Label(label) => write!(f, "{}", label),
        }
    }
}

impl From<BlogPost> for BlogEntry {
    fn from(post: BlogPost) -> Self {
        let reading_time = match post.reading_time {
            Some(Value::Number(n)) => n.as_f64().map(ReadingTime::Minutes),
            Some(Value::String(s)) => Some(ReadingTime::Label(s)),
            _ => None,
        };

        BlogEntry {
            title: post.title,
            author: post.author,
            content: post.content,
            image: post.image,
            published_date: post.published_date,
            reading_time,
            category: post.category,
            tags: post.tags.unwrap_or_default(),
        }
    }
}

/// How the listing is ordered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortBy {
    /// Newest first
    Date,
    /// Shortest first
    ReadingTime,
    /// Alphabetical, case-insensitive
    Category,
    /// Leave the current order alone
    #[default]
    None,
}

impl SortBy {
    /// Map a sort selector value; anything unrecognized means no reordering
    pub fn from_value(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "date" => SortBy::Date,
            "reading_time" | "reading-time" => SortBy::ReadingTime,
            "category" => SortBy::Category,
            _ => SortBy::None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortBy::Date => "date",
            SortBy::ReadingTime => "reading_time",
            SortBy::Category => "category",
            SortBy::None => "none",
        }
    }
}
