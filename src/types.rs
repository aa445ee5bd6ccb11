use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Discriminant of an [`UpdateFrame`].
///
/// Unknown values are kept verbatim in `Other` so the classifier can report
/// them instead of failing the whole frame at decode time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum UpdateType {
    /// Placeholder status before any frame has arrived (`"none"`).
    Idle,
    Init,
    Preview,
    Results,
    Finished,
    Other(String),
}

impl UpdateType {
    pub fn as_str(&self) -> &str {
        match self {
            UpdateType::Idle => "none",
            UpdateType::Init => "init",
            UpdateType::Preview => "preview",
            UpdateType::Results => "results",
            UpdateType::Finished => "finished",
            UpdateType::Other(s) => s,
        }
    }
}

impl From<String> for UpdateType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "none" => UpdateType::Idle,
            "init" => UpdateType::Init,
            "preview" => UpdateType::Preview,
            "results" => UpdateType::Results,
            "finished" => UpdateType::Finished,
            _ => UpdateType::Other(s),
        }
    }
}

impl From<UpdateType> for String {
    fn from(t: UpdateType) -> Self {
        t.as_str().to_string()
    }
}

/// One decoded message from the job stream.
///
/// Image payloads stay as raw JSON here; their shape is resolved by the
/// materializer (see [`crate::materializer::PixelPayload`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFrame {
    pub update_type: UpdateType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images_data: Option<Value>,
}

impl UpdateFrame {
    /// A bare frame of the given kind with no progress text or images.
    pub fn new(update_type: UpdateType) -> Self {
        Self {
            update_type,
            title: None,
            percentage: None,
            image_data: None,
            images_data: None,
        }
    }

    /// Status shown before a job has produced any update.
    pub fn awaiting_input() -> Self {
        Self {
            title: Some("Awaiting input".to_string()),
            percentage: Some("0".to_string()),
            ..Self::new(UpdateType::Idle)
        }
    }

    /// Copy of this frame without its image payloads, for use as status.
    pub fn status_only(&self) -> Self {
        Self {
            update_type: self.update_type.clone(),
            title: self.title.clone(),
            percentage: self.percentage.clone(),
            image_data: None,
            images_data: None,
        }
    }
}

/// A materialized, renderable image.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayImage {
    pub image_url: String,
    pub height: u32,
    pub width: u32,
    /// View state owned by the presentation layer; never set here.
    #[serde(default)]
    pub is_expanded: bool,
}

impl DisplayImage {
    /// The empty placeholder shown when there is no preview.
    pub fn placeholder() -> Self {
        Self::default()
    }

    pub fn is_placeholder(&self) -> bool {
        self.image_url.is_empty() && self.height == 0 && self.width == 0
    }
}

/// An aspect ratio offered by the server, e.g. `1152×896` / `9:7`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AspectRatio {
    pub dimensions: String,
    pub ratio: String,
}
