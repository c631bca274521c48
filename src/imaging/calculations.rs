//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// How to turn a source image into an exact target box: scale uniformly,
/// then crop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoverPlan {
    /// Uniform scale factor applied to both axes.
    pub scale: f64,
    /// Dimensions after scaling (at least one matches the target).
    pub scaled: (u32, u32),
    /// Top-left corner of the centered crop within the scaled image.
    pub crop_origin: (u32, u32),
    /// Final dimensions, equal to the target.
    pub target: (u32, u32),
}

/// Calculate the scale-to-cover and center-crop needed to fill `target`.
///
/// The scale is `max(target_w / source_w, target_h / source_h)` so the scaled
/// image covers the whole target box; the overflow on the longer axis is
/// split evenly between both sides.
///
/// # Examples
/// ```
/// # use paveviz::imaging::calculate_cover;
/// // 800x600 into a 400x400 box: scale 2/3, 533x400, crop 66px off each side
/// let plan = calculate_cover((800, 600), (400, 400));
/// assert_eq!(plan.scaled, (533, 400));
/// assert_eq!(plan.crop_origin, (66, 0));
/// ```
pub fn calculate_cover(source: (u32, u32), target: (u32, u32)) -> CoverPlan {
    let (src_w, src_h) = source;
    let (tgt_w, tgt_h) = target;

    let scale = (tgt_w as f64 / src_w as f64).max(tgt_h as f64 / src_h as f64);

    // Rounding can land one pixel short of the target on the matching axis
    let scaled_w = ((src_w as f64 * scale).round() as u32).max(tgt_w);
    let scaled_h = ((src_h as f64 * scale).round() as u32).max(tgt_h);

    CoverPlan {
        scale,
        scaled: (scaled_w, scaled_h),
        crop_origin: ((scaled_w - tgt_w) / 2, (scaled_h - tgt_h) / 2),
        target,
    }
}

/// Height of an image block when drawn at `width`, keeping the image's aspect ratio.
pub fn scaled_height(image: (u32, u32), width: f32) -> f32 {
    let (w, h) = image;
    h as f32 / w as f32 * width
}
