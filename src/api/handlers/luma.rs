//! Luma AI generation handlers

use axum::extract::State;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

use crate::api::extract::{ApiJson, Fields};
use crate::api::response::ApiResponse;
use crate::error::Result;
use crate::provider::luma::{DEFAULT_ASPECT_RATIO, DEFAULT_IMAGE_MODEL, DEFAULT_VIDEO_MODEL};
use crate::provider::{ImageGeneration, JobProvider, LumaAssets, LumaRequest, VideoGeneration};
use crate::AppState;

pub async fn generate_image(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<Value>,
) -> Result<ApiResponse> {
    let body = Fields::from(body);
    let prompt = body.require_text("prompt", "Prompt is required")?;

    let request = LumaRequest::Image(ImageGeneration {
        prompt,
        model: body
            .text("model")
            .unwrap_or_else(|| DEFAULT_IMAGE_MODEL.to_string()),
        aspect_ratio: body
            .text("aspect_ratio")
            .unwrap_or_else(|| DEFAULT_ASPECT_RATIO.to_string()),
        style_ref: body.present("style_ref").cloned(),
        image_ref: body.present("image_ref").cloned(),
    });

    let assets = track_generation(&state, request).await?;
    Ok(ApiResponse::success("Image generated successfully").with_data(assets.image))
}

pub async fn generate_video(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<Value>,
) -> Result<ApiResponse> {
    let body = Fields::from(body);
    let prompt = body.require_text("prompt", "Prompt is required")?;

    let request = LumaRequest::Video(VideoGeneration {
        prompt,
        model: body
            .text("model")
            .unwrap_or_else(|| DEFAULT_VIDEO_MODEL.to_string()),
        aspect_ratio: body.text("aspect_ratio"),
        looped: body.flag("loop"),
        resolution: body.text("resolution"),
        duration: body.text("duration"),
    });

    let assets = track_generation(&state, request).await?;
    Ok(ApiResponse::success("Video generated successfully").with_data(assets.video))
}

/// Submit to Luma and poll until the generation settles
async fn track_generation(state: &AppState, request: LumaRequest) -> Result<LumaAssets> {
    let luma = state.providers.luma().await?;
    let mut cancel = state.guardian.cancellation();

    let fetcher = luma.clone();
    let outcome = state
        .poller
        .track(
            luma.submit(request),
            move |id| {
                let luma = fetcher.clone();
                async move { luma.fetch_status(&id).await }
            },
            &mut cancel,
        )
        .await;

    match outcome {
        Ok(assets) => {
            info!("Luma generation completed");
            Ok(assets)
        }
        Err(e) => {
            warn!(error = %e, "Luma generation did not complete");
            Err(e.into_app_error(luma.name()))
        }
    }
}
