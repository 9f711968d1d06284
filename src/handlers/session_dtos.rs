use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::components::carousel::CarouselSnapshot;
use crate::session::StepPane;

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct OpenSessionRequest {
    /// Whether the visitor's browser can observe element intersections.
    #[serde(default = "default_true")]
    pub intersection_observer: bool,
}

impl Default for OpenSessionRequest {
    fn default() -> Self {
        Self {
            intersection_observer: true,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OpenSessionResponse {
    pub session_id: Uuid,
    pub steps: StepPane,
    pub carousel: CarouselSnapshot,
    pub tracking_enabled: bool,
    pub lead_ready: bool,
}

#[derive(Debug, Deserialize)]
pub struct VisibilityReport {
    pub ratio: f64,
}

#[derive(Debug, Serialize)]
pub struct VisibilityResponse {
    pub region: String,
    pub fired: bool,
}

#[derive(Debug, Serialize)]
pub struct SiteResponse {
    pub title: &'static str,
    pub site_url: String,
    pub og_image: String,
    pub pixel_id: Option<String>,
    pub analytics_enabled: bool,
    pub lead_ready: bool,
}
