use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;

/// Content of one resource as a section sees it.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentState<T> {
    Loading,
    Ready(Vec<T>),
    Failed(String),
}

impl<T> Default for ContentState<T> {
    fn default() -> Self {
        ContentState::Loading
    }
}

impl<T: serde::de::DeserializeOwned> ContentState<T> {
    /// Builds the state from a loader result. Items that do not match the
    /// expected shape turn the whole resource into an error.
    pub fn from_result(result: Result<Vec<Value>, String>) -> Self {
        match result {
            Ok(items) => match serde_json::from_value(Value::Array(items)) {
                Ok(items) => ContentState::Ready(items),
                Err(e) => ContentState::Failed(e.to_string()),
            },
            Err(message) => ContentState::Failed(message),
        }
    }
}

impl<T> ContentState<T> {
    pub fn items(&self) -> &[T] {
        match self {
            ContentState::Ready(items) => items,
            _ => &[],
        }
    }
}

/// Side effects a section asks the shell to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    DialogOpened,
    DialogClosed,
    FetchRepoStats { project_id: String, url: String },
    Copy(String),
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Skill {
    pub name: String,
    pub category: String,
    pub summary: String,
    pub description: String,
    pub highlights: Vec<String>,
}

impl Default for Skill {
    fn default() -> Self {
        Self {
            name: String::new(),
            category: "General".into(),
            summary: String::new(),
            description: String::new(),
            highlights: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Unit {
    pub code: String,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Education {
    pub institution: String,
    pub qualification: String,
    pub period: String,
    pub description: String,
    pub achievements: Vec<String>,
    pub units: Vec<Unit>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Course {
    pub title: String,
    pub organization: String,
    /// Qualification level, higher is more advanced (e.g. Certificate IV = 4).
    pub level: u8,
    pub start_date: Option<String>,
    /// `YYYY-MM-DD` or `YYYY-MM`; absent while the course is in progress.
    pub end_date: Option<String>,
    pub period: String,
    pub description: String,
    pub units: Vec<Unit>,
}

impl Course {
    pub fn end(&self) -> Option<NaiveDate> {
        self.end_date.as_deref().and_then(parse_loose_date)
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Job {
    pub company: String,
    pub role: String,
    pub location: String,
    pub period: String,
    pub summary: String,
    pub description: String,
    pub responsibilities: Vec<String>,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Technology {
    pub name: String,
    pub category: String,
    pub proficiency: String,
    pub years: Option<f32>,
    pub description: String,
    pub uses: Vec<String>,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectLink {
    pub title: String,
    pub url: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct GalleryItem {
    pub image: String,
    pub caption: String,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Project {
    pub id: Value,
    pub name: String,
    pub short_description: String,
    pub date: String,
    pub key_words: Vec<String>,
    pub github: Option<String>,
    pub links: Vec<ProjectLink>,
    pub details: String,
    pub footnotes: String,
    pub gallery: Vec<GalleryItem>,
}

impl Project {
    /// Stable identity for the per-session stats map; ids may be numbers or strings.
    pub fn key(&self) -> String {
        match &self.id {
            Value::String(s) => s.clone(),
            Value::Null => self.name.clone(),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Travel {
    pub destination: String,
    pub country: String,
    pub date: String,
    pub summary: String,
    pub description: String,
    pub highlights: Vec<String>,
}

/// Accepts `2024-03-15`, `2024-03` and `2024`.
pub fn parse_loose_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d"))
        .or_else(|_| NaiveDate::parse_from_str(&format!("{s}-01-01"), "%Y-%m-%d"))
        .ok()
}
