use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

/// Body of `POST /api/post`. Every field is optional on the wire so that an
/// incomplete post is reported as missing fields instead of a malformed body.
/// Tags and location are not written anywhere, so a value of the wrong type there is dropped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostSubmission {
    pub title: Option<String>,
    pub date: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub tags: Option<Vec<String>>,
    pub categories: Option<Vec<String>>,
    #[serde(deserialize_with = "lenient")]
    pub latitude: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    pub longitude: Option<f64>,
    pub content: Option<String>,
}

/// Any JSON value; `None` unless it has the expected type.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// A submission that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidPost<'a> {
    pub title: &'a str,
    pub date: &'a str,
    pub category: &'a str,
    pub content: &'a str,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

impl PostSubmission {
    pub fn from_json(buf: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(buf)
    }

    pub fn primary_category(&self) -> Option<&str> {
        self.categories.as_ref()
            .and_then(|categories| categories.first())
            .map(|c| c.as_str())
    }

    pub fn tags(&self) -> &[String] {
        self.tags.as_deref().unwrap_or(&[])
    }

    pub fn location(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }

    /// Names of the required fields that are absent or blank, in declaration order.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = vec![];
        if non_blank(&self.title).is_none() {
            missing.push("title");
        }
        if non_blank(&self.date).is_none() {
            missing.push("date");
        }
        if non_blank(&self.content).is_none() {
            missing.push("content");
        }
        if self.primary_category().is_none() {
            missing.push("categories");
        }
        missing
    }

    pub fn validate(&self) -> Result<ValidPost<'_>, Vec<&'static str>> {
        match (non_blank(&self.title), non_blank(&self.date), non_blank(&self.content), self.primary_category()) {
            (Some(title), Some(date), Some(content), Some(category)) => Ok(ValidPost {
                title,
                date,
                category,
                content,
            }),
            _ => Err(self.missing_fields()),
        }
    }
}
