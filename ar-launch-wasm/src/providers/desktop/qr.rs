//! Scannable-code handoff to a phone.
//!
//! The code encodes the current page with the model URL and a launch flag in
//! its query. Opening it on a phone lands on the same page, which calls
//! [`parse_handoff`] and resumes the AR flow there.

use crate::config::DesktopConfig;
use crate::error::LaunchError;
use crate::host::DomHost;
use crate::providers::validate_model_url;
use constants::handoff::{HANDOFF_LAUNCH_KEY, HANDOFF_MODEL_KEY};
use url::Url;

const QR_ALT_TEXT: &str = "Scan with your phone to view in AR";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handoff {
    pub model_url: String,
    /// Launch AR immediately instead of waiting for a tap.
    pub launch: bool,
}

/// Page URL carrying the handoff parameters. Existing handoff parameters are
/// replaced, everything else on the page URL is kept.
pub fn handoff_url(page_url: &str, model_url: &str) -> Result<Url, LaunchError> {
    let mut url = validate_model_url(page_url)?;
    let model = validate_model_url(model_url)?;

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != HANDOFF_MODEL_KEY && key != HANDOFF_LAUNCH_KEY)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    url.set_fragment(None);
    url.query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair(HANDOFF_MODEL_KEY, model.as_str())
        .append_pair(HANDOFF_LAUNCH_KEY, "1");
    Ok(url)
}

/// Handoff parameters on a page URL, if it was opened from a scanned code.
pub fn parse_handoff(page_url: &str) -> Option<Handoff> {
    let url = Url::parse(page_url).ok()?;
    let mut model_url = None;
    let mut launch = false;

    for (key, value) in url.query_pairs() {
        if key == HANDOFF_MODEL_KEY {
            model_url = Some(value.into_owned());
        } else if key == HANDOFF_LAUNCH_KEY {
            launch = matches!(value.as_ref(), "1" | "true");
        }
    }

    let model_url = model_url.filter(|m| validate_model_url(m).is_ok())?;
    Some(Handoff { model_url, launch })
}

/// Image URL from the code rendering service.
pub fn qr_image_url(config: &DesktopConfig, data: &str) -> Result<Url, LaunchError> {
    let mut url = Url::parse(&config.qr_service).map_err(|e| LaunchError::InvalidUrl {
        url: config.qr_service.clone(),
        reason: e.to_string(),
    })?;
    url.query_pairs_mut()
        .append_pair("size", &format!("{0}x{0}", config.qr_size))
        .append_pair("data", data);
    Ok(url)
}

/// Insert the code image into `container_id`. Returns the image URL.
pub fn render_qr_code(
    dom: &dyn DomHost,
    container_id: &str,
    data: &Url,
    config: &DesktopConfig,
) -> Result<Url, LaunchError> {
    if !dom.has_container(container_id) {
        return Err(LaunchError::MissingContainer(container_id.to_string()));
    }
    let image = qr_image_url(config, data.as_str())?;
    dom.insert_image(container_id, image.as_str(), QR_ALT_TEXT)
        .map_err(LaunchError::Renderer)?;
    Ok(image)
}
