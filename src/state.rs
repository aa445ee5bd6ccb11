use serde::{Deserialize, Serialize};

use crate::types::{DisplayImage, UpdateFrame};

/// Where new gallery images go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GalleryOrder {
    /// Oldest first; each new image is pushed to the end.
    #[default]
    Append,
    /// Newest first; each new image is inserted at the front.
    Prepend,
}

/// A fully materialized change to [`JobProgressState`].
#[derive(Debug, Clone, PartialEq)]
pub enum StateChange {
    Status(UpdateFrame),
    Preview {
        status: UpdateFrame,
        image: Option<DisplayImage>,
    },
    AddResult(DisplayImage),
    Finish {
        status: UpdateFrame,
        images: Vec<DisplayImage>,
    },
    Nothing,
}

/// Client-side mirror of the running job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobProgressState {
    pub status: UpdateFrame,
    pub preview: DisplayImage,
    pub gallery: Vec<DisplayImage>,
}

impl Default for JobProgressState {
    fn default() -> Self {
        Self {
            status: UpdateFrame::awaiting_input(),
            preview: DisplayImage::placeholder(),
            gallery: Vec::new(),
        }
    }
}

impl JobProgressState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Discard everything from the previous submission.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Apply a change. Returns false when nothing was modified.
    pub fn apply(&mut self, change: StateChange, order: GalleryOrder) -> bool {
        match change {
            StateChange::Status(status) => {
                self.status = status;
            }
            StateChange::Preview { status, image } => {
                self.status = status;
                if let Some(img) = image {
                    self.preview = img;
                }
            }
            StateChange::AddResult(img) => {
                self.insert(img, order);
            }
            StateChange::Finish { status, images } => {
                for img in images {
                    self.insert(img, order);
                }
                self.status = status;
            }
            StateChange::Nothing => return false,
        }
        true
    }

    // A finished tile always supersedes the current preview.
    fn insert(&mut self, img: DisplayImage, order: GalleryOrder) {
        match order {
            GalleryOrder::Append => self.gallery.push(img),
            GalleryOrder::Prepend => self.gallery.insert(0, img),
        }
        self.preview = DisplayImage::placeholder();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::UpdateType;

    fn img(url: &str) -> DisplayImage {
        DisplayImage {
            image_url: url.into(),
            height: 8,
            width: 8,
            is_expanded: false,
        }
    }

    #[test]
    fn test_initial_state() {
        let state = JobProgressState::new();
        assert_eq!(state.status.update_type, UpdateType::Idle);
        assert_eq!(state.status.title.as_deref(), Some("Awaiting input"));
        assert!(state.preview.is_placeholder());
        assert!(state.gallery.is_empty());
    }

    #[test]
    fn test_preview_without_image_keeps_old_preview() {
        let mut state = JobProgressState::new();
        state.apply(
            StateChange::Preview {
                status: UpdateFrame::new(UpdateType::Preview),
                image: Some(img("p1")),
            },
            GalleryOrder::Append,
        );
        state.apply(
            StateChange::Preview {
                status: UpdateFrame::new(UpdateType::Preview),
                image: None,
            },
            GalleryOrder::Append,
        );
        assert_eq!(state.preview.image_url, "p1");
    }

    #[test]
    fn test_result_clears_preview() {
        let mut state = JobProgressState::new();
        state.preview = img("p");
        state.apply(StateChange::AddResult(img("r")), GalleryOrder::Append);
        assert!(state.preview.is_placeholder());
        assert_eq!(state.gallery, vec![img("r")]);
        // results frames do not touch status
        assert_eq!(state.status.update_type, UpdateType::Idle);
    }

    #[test]
    fn test_finish_appends_in_order() {
        let mut state = JobProgressState::new();
        state.gallery.push(img("earlier"));
        state.preview = img("p");
        let changed = state.apply(
            StateChange::Finish {
                status: UpdateFrame::new(UpdateType::Finished),
                images: vec![img("A"), img("B")],
            },
            GalleryOrder::Append,
        );
        assert!(changed);
        let urls: Vec<_> = state.gallery.iter().map(|i| i.image_url.as_str()).collect();
        assert_eq!(urls, vec!["earlier", "A", "B"]);
        assert!(state.preview.is_placeholder());
        assert_eq!(state.status.update_type, UpdateType::Finished);
    }

    #[test]
    fn test_prepend_order() {
        let mut state = JobProgressState::new();
        state.apply(StateChange::AddResult(img("A")), GalleryOrder::Prepend);
        state.apply(StateChange::AddResult(img("B")), GalleryOrder::Prepend);
        let urls: Vec<_> = state.gallery.iter().map(|i| i.image_url.as_str()).collect();
        assert_eq!(urls, vec!["B", "A"]);
    }

    #[test]
    fn test_nothing_is_a_no_op() {
        let mut state = JobProgressState::new();
        let before = state.clone();
        assert!(!state.apply(StateChange::Nothing, GalleryOrder::Append));
        assert_eq!(state, before);
    }

    #[test]
    fn test_reset() {
        let mut state = JobProgressState::new();
        state.preview = img("p");
        state.gallery.push(img("g"));
        state.status = UpdateFrame::new(UpdateType::Finished);
        state.reset();
        assert_eq!(state, JobProgressState::new());
        assert!(state.preview.is_placeholder());
        assert!(state.gallery.is_empty());
    }
}
