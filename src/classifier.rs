use serde_json::Value;

use crate::error::{MaterializationError, UnexpectedUpdateKind};
use crate::materializer::ImageMaterializer;
use crate::state::StateChange;
use crate::types::{UpdateFrame, UpdateType};

/// What a frame asks the progress state to do, before any image work.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// `init`: replace the status.
    SetStatus(UpdateFrame),
    /// `preview`: replace the status, and the preview if an image came along.
    Preview {
        status: UpdateFrame,
        image: Option<Value>,
    },
    /// `results`: add a finished image to the gallery.
    AddResult { image: Option<Value> },
    /// `finished`: add every image to the gallery, then replace the status.
    Finish {
        status: UpdateFrame,
        images: Vec<Value>,
    },
    /// Unknown kind; the state is left alone.
    Unexpected(UnexpectedUpdateKind),
}

/// Map a decoded frame to the action it implies.
pub fn classify(frame: UpdateFrame) -> Action {
    match frame.update_type {
        UpdateType::Init => Action::SetStatus(frame.status_only()),
        UpdateType::Preview => Action::Preview {
            status: frame.status_only(),
            image: frame.image_data,
        },
        UpdateType::Results => Action::AddResult {
            image: frame.image_data,
        },
        UpdateType::Finished => {
            let status = frame.status_only();
            let images = match frame.images_data {
                Some(Value::Array(images)) => images,
                Some(other) => {
                    tracing::warn!(
                        "finished frame carried non-array imagesData ({}), ignoring images",
                        json_kind(&other)
                    );
                    Vec::new()
                }
                None => Vec::new(),
            };
            Action::Finish { status, images }
        }
        UpdateType::Idle | UpdateType::Other(_) => {
            Action::Unexpected(UnexpectedUpdateKind(frame.update_type.as_str().to_string()))
        }
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl Action {
    /// Materialize any image payloads, producing the change to apply.
    ///
    /// Payloads that fail to materialize are dropped from the change and
    /// returned alongside it; the rest of the action still goes through.
    pub fn resolve(self, materializer: &ImageMaterializer) -> (StateChange, Vec<MaterializationError>) {
        let mut errors = Vec::new();
        let mut materialize = |value: &Value| match materializer.materialize_value(value) {
            Ok(img) => Some(img),
            Err(e) => {
                errors.push(e);
                None
            }
        };

        let change = match self {
            Action::SetStatus(status) => StateChange::Status(status),
            Action::Preview { status, image } => StateChange::Preview {
                status,
                image: image.as_ref().and_then(&mut materialize),
            },
            Action::AddResult { image } => match image.as_ref().and_then(&mut materialize) {
                Some(img) => StateChange::AddResult(img),
                None => StateChange::Nothing,
            },
            Action::Finish { status, images } => StateChange::Finish {
                status,
                images: images.iter().filter_map(&mut materialize).collect(),
            },
            Action::Unexpected(_) => StateChange::Nothing,
        };

        (change, errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn frame(json: &str) -> UpdateFrame {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_init_sets_status() {
        let action = classify(frame(r#"{"updateType":"init","title":"Loading"}"#));
        let Action::SetStatus(status) = action else {
            panic!("expected SetStatus");
        };
        assert_eq!(status.title.as_deref(), Some("Loading"));
    }

    #[test]
    fn test_preview_keeps_image_separate_from_status() {
        let action = classify(frame(
            r#"{"updateType":"preview","percentage":"30","imageData":{"imageUrl":"p","height":4,"width":4}}"#,
        ));
        let Action::Preview { status, image } = action else {
            panic!("expected Preview");
        };
        assert!(status.image_data.is_none());
        assert_eq!(image.unwrap()["imageUrl"], "p");
    }

    #[test]
    fn test_finished_with_non_array_images() {
        let action = classify(frame(r#"{"updateType":"finished","imagesData":"oops"}"#));
        let Action::Finish { images, .. } = action else {
            panic!("expected Finish");
        };
        assert!(images.is_empty());
    }

    #[test]
    fn test_unknown_kind_is_unexpected() {
        assert_eq!(
            classify(frame(r#"{"updateType":"progress"}"#)),
            Action::Unexpected(UnexpectedUpdateKind("progress".into()))
        );
        assert_eq!(
            classify(frame(r#"{"updateType":"none"}"#)),
            Action::Unexpected(UnexpectedUpdateKind("none".into()))
        );
    }

    #[test]
    fn test_resolve_preview_with_bad_image_keeps_status() {
        let action = Action::Preview {
            status: UpdateFrame::new(UpdateType::Preview),
            image: Some(json!([])),
        };
        let (change, errors) = action.resolve(&ImageMaterializer::new());
        assert_eq!(errors, vec![MaterializationError::EmptyPayload]);
        assert_eq!(
            change,
            StateChange::Preview {
                status: UpdateFrame::new(UpdateType::Preview),
                image: None
            }
        );
    }

    #[test]
    fn test_resolve_results_without_image_is_nothing() {
        let (change, errors) = Action::AddResult { image: None }.resolve(&ImageMaterializer::new());
        assert_eq!(change, StateChange::Nothing);
        assert!(errors.is_empty());
    }

    #[test]
    fn test_resolve_finish_skips_failed_images() {
        let action = Action::Finish {
            status: UpdateFrame::new(UpdateType::Finished),
            images: vec![
                json!({"imageUrl": "a", "height": 1, "width": 1}),
                json!([]),
                json!({"imageUrl": "b", "height": 1, "width": 1}),
            ],
        };
        let (change, errors) = action.resolve(&ImageMaterializer::new());
        assert_eq!(errors.len(), 1);
        let StateChange::Finish { images, .. } = change else {
            panic!("expected Finish");
        };
        let urls: Vec<_> = images.iter().map(|i| i.image_url.as_str()).collect();
        assert_eq!(urls, vec!["a", "b"]);
    }
}
