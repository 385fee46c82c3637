use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Success body shared by every route.
#[derive(Debug, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub message: T,
}

impl<T> Envelope<T> {
    pub fn new(message: T) -> Self {
        Self { message }
    }
}

/// Body returned by the kana `/vn` endpoint.
#[derive(Debug, Deserialize)]
pub struct KanaResponse<T> {
    pub results: Vec<T>,
    pub count: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct VnImage {
    pub url: String,
    #[serde(default)]
    pub sexual: f64,
    #[serde(default)]
    pub violence: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Screenshot {
    pub url: String,
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub sexual: f64,
    #[serde(default)]
    pub violence: f64,
    pub dims: Option<[u32; 2]>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// VN as returned by the upstream. Fields this service does not touch are
/// kept in `rest` and passed through.
#[derive(Debug, Deserialize, Clone)]
pub struct VnRecord {
    pub id: String,
    pub image: Option<VnImage>,
    pub rating: Option<f64>,
    #[serde(default)]
    pub screenshots: Vec<Screenshot>,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

#[derive(Debug, Serialize, Clone)]
pub struct Screen {
    #[serde(flatten)]
    pub screenshot: Screenshot,
    pub nsfw: bool,
    pub image: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

#[derive(Debug, Serialize, Clone)]
pub struct NormalizedVn {
    pub id: u64,
    pub image: String,
    pub image_nsfw: bool,
    pub rating: String,
    pub screenshots: Vec<Screenshot>,
    pub screens: Vec<Screen>,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

/// List response when the client asked for the last page number.
#[derive(Debug, Serialize)]
pub struct VnPage {
    pub data: Vec<NormalizedVn>,
    #[serde(rename = "maxPage")]
    pub max_page: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Tag {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TagSummary {
    pub id: u64,
    pub name: String,
}

impl From<&Tag> for TagSummary {
    fn from(tag: &Tag) -> Self {
        Self {
            id: tag.id,
            name: tag.name.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct TagPage {
    pub data: Vec<TagSummary>,
    pub last_visible_page: usize,
}
