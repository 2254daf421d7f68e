//! Runware task handlers
//!
//! Each route maps to one [`RunwareOperation`]: required fields are checked
//! in order, whitelisted fields are forwarded as a Runware task, and the
//! task result is wrapped in the success envelope.

use axum::extract::State;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::warn;

use crate::api::extract::{is_present, ApiJson, Fields};
use crate::api::response::ApiResponse;
use crate::error::{AppError, Result};
use crate::provider::TaskProvider;
use crate::AppState;

/// How a task's result entries are returned to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Output {
    /// All entries, with their count in `results`
    Counted,
    /// All entries
    List,
    /// The first entry
    Single,
    /// The first entry, with its `totalResults` in `results`
    Search,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunwareOperation {
    TextToImage,
    ImageToText,
    RemoveBackground,
    Upscale,
    EnhancePrompt,
    PreprocessControlNet,
    UploadModel,
    PhotoMaker,
    SearchModels,
    ImageMask,
}

const UPLOAD_BASE_FIELDS: &[&str] = &[
    "air",
    "name",
    "downloadURL",
    "uniqueIdentifier",
    "version",
    "format",
    "architecture",
    "heroImageURL",
    "tags",
    "shortDescription",
    "comment",
    "private",
    "customTaskUUID",
    "category",
];

impl RunwareOperation {
    pub const ALL: [RunwareOperation; 10] = [
        Self::TextToImage,
        Self::ImageToText,
        Self::RemoveBackground,
        Self::Upscale,
        Self::EnhancePrompt,
        Self::PreprocessControlNet,
        Self::UploadModel,
        Self::PhotoMaker,
        Self::SearchModels,
        Self::ImageMask,
    ];

    /// Path segment under `/api/v1/runware`
    pub fn route(&self) -> &'static str {
        match self {
            Self::TextToImage => "image",
            Self::ImageToText => "imageToText",
            Self::RemoveBackground => "removeBackground",
            Self::Upscale => "upscale",
            Self::EnhancePrompt => "enhancePrompt",
            Self::PreprocessControlNet => "preprocessControlNet",
            Self::UploadModel => "uploadModel",
            Self::PhotoMaker => "photoMaker",
            Self::SearchModels => "searchModels",
            Self::ImageMask => "imageMask",
        }
    }

    pub fn task_type(&self) -> &'static str {
        match self {
            Self::TextToImage => "imageInference",
            Self::ImageToText => "imageCaption",
            Self::RemoveBackground => "imageBackgroundRemoval",
            Self::Upscale => "imageUpscale",
            Self::EnhancePrompt => "promptEnhance",
            Self::PreprocessControlNet => "imageControlNetPreProcess",
            Self::UploadModel => "modelUpload",
            Self::PhotoMaker => "photoMaker",
            Self::SearchModels => "modelSearch",
            Self::ImageMask => "imageMasking",
        }
    }

    /// Required fields and the message for each, checked in order
    fn required(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::TextToImage => &[
                ("positivePrompt", "Positive prompt is required"),
                ("width", "Width is required"),
                ("height", "Height is required"),
                ("model", "Model is required"),
            ],
            Self::ImageToText | Self::RemoveBackground => {
                &[("inputImage", "Input image is required")]
            }
            Self::Upscale => &[
                ("inputImage", "Input image is required"),
                ("upscaleFactor", "Upscale factor is required"),
            ],
            Self::EnhancePrompt => &[("prompt", "Prompt is required")],
            Self::PreprocessControlNet => &[
                ("inputImage", "Input image is required"),
                ("preProcessorType", "Preprocessor type is required"),
            ],
            Self::UploadModel => &[
                ("category", "Category is required"),
                ("air", "AIR is required"),
                ("name", "Name is required"),
                ("downloadURL", "Download URL is required"),
                ("uniqueIdentifier", "Unique identifier is required"),
                ("version", "Version is required"),
                ("format", "Format is required"),
                ("architecture", "Architecture is required"),
            ],
            Self::PhotoMaker => &[
                ("positivePrompt", "Positive prompt is required"),
                ("height", "Height is required"),
                ("width", "Width is required"),
                ("numberResults", "Number of results is required"),
                ("inputImages", "Input images are required"),
                ("style", "Style is required"),
            ],
            Self::SearchModels => &[("search", "Search query is required")],
            Self::ImageMask => &[
                ("model", "Model is required"),
                ("inputImage", "Input image is required"),
            ],
        }
    }

    /// Fields forwarded to Runware
    fn fields(&self) -> &'static [&'static str] {
        match self {
            Self::TextToImage => &[
                "positivePrompt",
                "negativePrompt",
                "width",
                "height",
                "model",
                "numberResults",
                "outputType",
                "outputFormat",
                "checkNSFW",
                "seedImage",
                "maskImage",
                "strength",
                "steps",
                "scheduler",
                "seed",
                "CFGScale",
                "clipSkip",
                "usePromptWeighting",
                "controlNet",
                "lora",
            ],
            Self::ImageToText => &["inputImage", "includeCost"],
            Self::RemoveBackground => &[
                "inputImage",
                "outputType",
                "outputFormat",
                "rgba",
                "postProcessMask",
                "returnOnlyMask",
                "alphaMatting",
                "alphaMattingForegroundThreshold",
                "alphaMattingBackgroundThreshold",
                "alphaMattingErodeSize",
                "includeCost",
            ],
            Self::Upscale => &[
                "inputImage",
                "upscaleFactor",
                "outputType",
                "outputFormat",
                "includeCost",
            ],
            Self::EnhancePrompt => &["prompt", "promptMaxLength", "promptVersions", "includeCost"],
            Self::PreprocessControlNet => &[
                "inputImage",
                "preProcessorType",
                "height",
                "width",
                "outputType",
                "outputFormat",
                "highThresholdCanny",
                "lowThresholdCanny",
                "includeHandsAndFaceOpenPose",
                "includeCost",
            ],
            Self::UploadModel => UPLOAD_BASE_FIELDS,
            Self::PhotoMaker => &[
                "positivePrompt",
                "height",
                "width",
                "numberResults",
                "steps",
                "inputImages",
                "style",
                "strength",
                "outputFormat",
                "includeCost",
                "customTaskUUID",
            ],
            Self::SearchModels => &[
                "search",
                "tags",
                "category",
                "architecture",
                "limit",
                "offset",
                "owned",
                "featured",
                "type",
                "conditioning",
                "private",
                "customTaskUUID",
            ],
            Self::ImageMask => &[
                "model",
                "inputImage",
                "confidence",
                "maskPadding",
                "maskBlur",
                "outputFormat",
                "outputType",
                "includeCost",
                "uploadEndpoint",
                "customTaskUUID",
            ],
        }
    }

    /// Used as `Failed to <action>: <reason>` when Runware rejects the task
    fn action(&self) -> &'static str {
        match self {
            Self::TextToImage => "generate images",
            Self::ImageToText => "process image to text",
            Self::RemoveBackground => "remove background",
            Self::Upscale => "upscale image",
            Self::EnhancePrompt => "enhance prompt",
            Self::PreprocessControlNet => "preprocess image for ControlNet",
            Self::UploadModel => "upload model",
            Self::PhotoMaker => "generate PhotoMaker images",
            Self::SearchModels => "search models",
            Self::ImageMask => "process image mask",
        }
    }

    /// Prefix for failures before the task was sent
    fn failure(&self) -> &'static str {
        match self {
            Self::TextToImage => "Image generation failed",
            Self::ImageToText => "Image to text processing failed",
            Self::RemoveBackground => "Background removal failed",
            Self::Upscale => "Image upscaling failed",
            Self::EnhancePrompt => "Prompt enhancement failed",
            Self::PreprocessControlNet => "ControlNet preprocessing failed",
            Self::UploadModel => "Model upload failed",
            Self::PhotoMaker => "PhotoMaker generation failed",
            Self::SearchModels => "Model search failed",
            Self::ImageMask => "Image mask processing failed",
        }
    }

    pub fn success_message(&self) -> &'static str {
        match self {
            Self::TextToImage => "Images generated successfully",
            Self::ImageToText => "Image to text processed successfully",
            Self::RemoveBackground => "Background removed successfully",
            Self::Upscale => "Image upscaled successfully",
            Self::EnhancePrompt => "Prompt enhanced successfully",
            Self::PreprocessControlNet => "Image preprocessed for ControlNet successfully",
            Self::UploadModel => "Model uploaded successfully",
            Self::PhotoMaker => "PhotoMaker images generated successfully",
            Self::SearchModels => "Models searched successfully",
            Self::ImageMask => "Image mask processed successfully",
        }
    }

    fn output(&self) -> Output {
        match self {
            Self::TextToImage | Self::PhotoMaker => Output::Counted,
            Self::EnhancePrompt => Output::List,
            Self::SearchModels => Output::Search,
            _ => Output::Single,
        }
    }

    /// Check the body and build the task parameters
    pub fn build_params(&self, body: &Fields) -> Result<Map<String, Value>> {
        for (field, message) in self.required() {
            body.require(field, message)?;
        }

        if *self == Self::PhotoMaker {
            let has_images = body
                .get("inputImages")
                .and_then(Value::as_array)
                .map_or(true, |images| !images.is_empty());
            if !has_images {
                return Err(AppError::InvalidRequest(
                    "Input images are required".to_string(),
                ));
            }
        }

        let mut params = Map::new();
        body.pick(self.fields(), &mut params);

        match self {
            Self::TextToImage => {
                for (field, default) in [
                    ("numberResults", Value::from(1)),
                    ("outputType", Value::from("URL")),
                    ("outputFormat", Value::from("PNG")),
                ] {
                    if !is_present(body.get(field)) {
                        params.insert(field.to_string(), default);
                    }
                }
                let include_cost = body.get("includeCost") != Some(&Value::Bool(false));
                params.insert("includeCost".to_string(), Value::Bool(include_cost));
            }
            Self::UploadModel => {
                let category = body.text("category").unwrap_or_default();
                let extra: &[&str] = match category.as_str() {
                    "controlnet" => {
                        body.require("conditioning", "Conditioning is required for ControlNet models")?;
                        &["conditioning"]
                    }
                    "checkpoint" => {
                        body.require(
                            "defaultStrength",
                            "Default strength is required for checkpoint models",
                        )?;
                        &[
                            "positiveTriggerWords",
                            "defaultCFGScale",
                            "defaultStrength",
                            "defaultSteps",
                            "defaultScheduler",
                            "type",
                        ]
                    }
                    "lora" => {
                        body.require("defaultWeight", "Default weight is required for LoRA models")?;
                        &["defaultWeight", "positiveTriggerWords"]
                    }
                    _ => &[],
                };
                body.pick(extra, &mut params);
            }
            _ => {}
        }

        // A caller-chosen task id replaces the generated one
        if let Some(task_uuid) = params.remove("customTaskUUID") {
            params.insert("taskUUID".to_string(), task_uuid);
        }

        Ok(params)
    }

    fn respond(&self, mut data: Vec<Value>) -> ApiResponse {
        let response = ApiResponse::success(self.success_message());
        match self.output() {
            Output::Counted => response
                .with_results(data.len() as u64)
                .with_data(data),
            Output::List => response.with_data(data),
            Output::Single => {
                let first = if data.is_empty() {
                    Value::Null
                } else {
                    data.swap_remove(0)
                };
                response.with_data(first)
            }
            Output::Search => {
                let first = if data.is_empty() {
                    Value::Null
                } else {
                    data.swap_remove(0)
                };
                let total = first
                    .get("totalResults")
                    .and_then(Value::as_u64)
                    .unwrap_or(0);
                response.with_results(total).with_data(first)
            }
        }
    }
}

/// Run one Runware operation on behalf of a request
pub async fn run_operation(
    operation: RunwareOperation,
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<Value>,
) -> Result<ApiResponse> {
    let params = operation.build_params(&Fields::from(body))?;

    let runware = state
        .providers
        .runware()
        .await
        .map_err(|e| AppError::ProviderUnavailable(format!("{}: {}", operation.failure(), e)))?;

    let data = runware
        .run_task(operation.task_type(), params)
        .await
        .map_err(|e| {
            warn!(
                operation = operation.route(),
                error = %e,
                "Runware task failed"
            );
            AppError::Provider(format!("Failed to {}: {}", operation.action(), e))
        })?;

    Ok(operation.respond(data))
}

pub async fn disconnect(State(state): State<Arc<AppState>>) -> ApiResponse {
    if state.providers.disconnect_runware() {
        ApiResponse::success("Runware client disconnected successfully")
    } else {
        ApiResponse::success("No Runware client was connected")
    }
}
