use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{GenError, Result};

/// Largest seed the server accepts (2^63 - 1).
pub const MAX_SEED: u64 = i64::MAX as u64;

/// Number of lora slots the request carries.
pub const LORA_SLOTS: usize = 5;

/// Speed/quality trade-off for a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PerformanceMode {
    Quality,
    #[default]
    Speed,
    #[serde(rename = "Extreme Speed")]
    ExtremeSpeed,
}

/// One lora selection. `model: "None"` marks an unused slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoraParameter {
    pub model: String,
    pub weight: f64,
}

impl LoraParameter {
    pub fn new(model: impl Into<String>, weight: f64) -> Self {
        Self {
            model: model.into(),
            weight,
        }
    }

    /// An unused slot.
    pub fn none() -> Self {
        Self::new("None", 0.0)
    }
}

/// Body of the job submission POST.
///
/// # Example
/// ```
/// use imagegen_stream::{JobRequest, PerformanceMode};
///
/// let request = JobRequest::new("a lighthouse at dusk")
///     .image_number(4)
///     .performance(PerformanceMode::Quality)
///     .seed("12345");
///
/// assert!(request.validate().is_ok());
/// let body = serde_json::to_value(&request).unwrap();
/// assert_eq!(body["imageSeed"], "12345");
/// assert_eq!(body["performanceSelection"], "Quality");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRequest {
    pub prompt: String,
    pub negative_prompt: String,
    pub base_model_name: String,
    pub refiner_model_name: String,
    pub refiner_switch: f64,
    /// Decimal seed; kept as a string since it exceeds JSON's safe integer range.
    pub image_seed: String,
    pub image_number: u32,
    pub performance_selection: PerformanceMode,
    pub style_selections: Vec<String>,
    pub aspect_ratios_selection: String,
    pub enable_preview_images: bool,
    pub lora_parameters: Vec<LoraParameter>,
}

impl Default for JobRequest {
    fn default() -> Self {
        Self {
            prompt: String::new(),
            negative_prompt: "(embedding:unaestheticXLv31:0.8), low quality, watermark".to_string(),
            base_model_name: "capabilityXL_v20.safetensors".to_string(),
            refiner_model_name: "None".to_string(),
            refiner_switch: 0.667,
            image_seed: random_seed(),
            image_number: 2,
            performance_selection: PerformanceMode::Speed,
            style_selections: Vec::new(),
            aspect_ratios_selection: "1152×896".to_string(),
            enable_preview_images: true,
            lora_parameters: vec![LoraParameter::none(); LORA_SLOTS],
        }
    }
}

impl JobRequest {
    /// Create a request with a prompt and defaults for everything else,
    /// including a freshly drawn random seed.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Self::default()
        }
    }

    pub fn negative(mut self, prompt: impl Into<String>) -> Self {
        self.negative_prompt = prompt.into();
        self
    }

    pub fn base_model(mut self, model: impl Into<String>) -> Self {
        self.base_model_name = model.into();
        self
    }

    /// Set the refiner model and the fraction of steps after which it takes over.
    pub fn refiner(mut self, model: impl Into<String>, switch_at: f64) -> Self {
        self.refiner_model_name = model.into();
        self.refiner_switch = switch_at;
        self
    }

    pub fn seed(mut self, seed: impl Into<String>) -> Self {
        self.image_seed = seed.into();
        self
    }

    /// Replace the seed with a new random one.
    pub fn with_random_seed(mut self) -> Self {
        self.image_seed = random_seed();
        self
    }

    pub fn image_number(mut self, n: u32) -> Self {
        self.image_number = n;
        self
    }

    pub fn performance(mut self, mode: PerformanceMode) -> Self {
        self.performance_selection = mode;
        self
    }

    pub fn styles<I, S>(mut self, styles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.style_selections = styles.into_iter().map(Into::into).collect();
        self
    }

    /// Set the output size by its dimensions label, e.g. `"1024×1024"`.
    pub fn aspect_ratio(mut self, dimensions: impl Into<String>) -> Self {
        self.aspect_ratios_selection = dimensions.into();
        self
    }

    pub fn preview_images(mut self, enabled: bool) -> Self {
        self.enable_preview_images = enabled;
        self
    }

    /// Put a lora into `slot` (0-based). Out-of-range slots are ignored.
    pub fn lora(mut self, slot: usize, lora: LoraParameter) -> Self {
        if let Some(entry) = self.lora_parameters.get_mut(slot) {
            *entry = lora;
        }
        self
    }

    /// Check the request before sending it.
    pub fn validate(&self) -> Result<()> {
        match self.image_seed.trim().parse::<u64>() {
            Ok(seed) if seed <= MAX_SEED => {}
            _ => {
                return Err(GenError::InvalidRequest(format!(
                    "seed must be an integer between 0 and {}, got '{}'",
                    MAX_SEED, self.image_seed
                )))
            }
        }
        if self.image_number == 0 {
            return Err(GenError::InvalidRequest(
                "image number must be at least 1".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.refiner_switch) {
            return Err(GenError::InvalidRequest(format!(
                "refiner switch must be between 0 and 1, got {}",
                self.refiner_switch
            )));
        }
        Ok(())
    }
}

/// Draw a seed uniformly from `0..=2^63-1`, as a decimal string.
pub fn random_seed() -> String {
    rand::rng().random_range(0..=MAX_SEED).to_string()
}
