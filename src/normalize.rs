use regex::Regex;
use std::sync::OnceLock;

use crate::error::ProxyError;
use crate::models::{NormalizedVn, Screen, Screenshot, VnRecord};

/// `sexual` score at or above which an image is flagged.
pub const NSFW_THRESHOLD: f64 = 1.0;

fn digits() -> &'static Regex {
    static DIGITS: OnceLock<Regex> = OnceLock::new();
    DIGITS.get_or_init(|| Regex::new(r"[0-9]+").expect("static pattern"))
}

/// First run of digits in an upstream identifier (`"v123"` -> `123`).
pub fn numeric_id(raw: &str) -> Result<u64, ProxyError> {
    digits()
        .find(raw)
        .and_then(|m| m.as_str().parse::<u64>().ok())
        .ok_or_else(|| ProxyError::MalformedIdentifier(raw.to_string()))
}

/// Upstream ratings run 10..100; clients expect 0..10 with two decimals.
/// A VN without votes has no rating and reads as `0.00`.
pub fn rescale_rating(rating: f64) -> String {
    format!("{:.2}", rating / 10.0)
}

pub fn is_nsfw(sexual: f64) -> bool {
    sexual >= NSFW_THRESHOLD
}

fn to_screen(screenshot: Screenshot) -> Screen {
    let (width, height) = match screenshot.dims {
        Some([w, h]) => (Some(w), Some(h)),
        None => (None, None),
    };
    Screen {
        nsfw: is_nsfw(screenshot.sexual),
        image: screenshot.url.clone(),
        width,
        height,
        screenshot,
    }
}

pub fn normalize_vn(record: VnRecord, placeholder_image: &str) -> Result<NormalizedVn, ProxyError> {
    let id = numeric_id(&record.id)?;
    let (image, image_nsfw) = match &record.image {
        Some(img) => (img.url.clone(), is_nsfw(img.sexual)),
        None => (placeholder_image.to_string(), false),
    };
    let screens = record.screenshots.iter().cloned().map(to_screen).collect();

    Ok(NormalizedVn {
        id,
        image,
        image_nsfw,
        rating: rescale_rating(record.rating.unwrap_or(0.0)),
        screenshots: record.screenshots,
        screens,
        rest: record.rest,
    })
}

pub fn normalize_all(
    records: Vec<VnRecord>,
    placeholder_image: &str,
) -> Result<Vec<NormalizedVn>, ProxyError> {
    records
        .into_iter()
        .map(|r| normalize_vn(r, placeholder_image))
        .collect()
}
