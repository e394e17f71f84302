//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Crop-then-resize plan for a cover-crop.
///
/// The window is expressed in source pixels, so the source is never scaled
/// up before cropping and the work done is bounded by the source size plus
/// the target size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoverCrop {
    /// Top-left corner of the crop window inside the source.
    pub x: u32,
    pub y: u32,
    /// Size of the crop window inside the source.
    pub crop_width: u32,
    pub crop_height: u32,
    /// Final output size (always equal to the target).
    pub width: u32,
    pub height: u32,
}

/// Plan a cover-crop: the largest window with the target's aspect ratio,
/// centered in the source, which is then scaled to exactly `target`.
///
/// The result matches scaling the source to cover the target and cropping
/// the center. Odd overflow puts the extra pixel on the right/bottom.
///
/// # Arguments
/// * `source` - Original image dimensions (width, height)
/// * `target` - Output dimensions (width, height), both non-zero
pub fn calculate_cover_crop(source: (u32, u32), target: (u32, u32)) -> CoverCrop {
    let (src_w, src_h) = (u64::from(source.0), u64::from(source.1));
    let (tgt_w, tgt_h) = (u64::from(target.0), u64::from(target.1));

    let (crop_w, crop_h) = if src_w * tgt_h > src_h * tgt_w {
        // Source is wider: keep full height, trim the sides
        let w = (src_h * tgt_w + tgt_h / 2) / tgt_h;
        (w.clamp(1, src_w.max(1)), src_h)
    } else {
        // Source is taller (or same aspect): keep full width, trim top/bottom
        let h = (src_w * tgt_h + tgt_w / 2) / tgt_w;
        (src_w, h.clamp(1, src_h.max(1)))
    };

    // Both values are bounded by the source dimensions, which fit in u32
    let crop_width = crop_w as u32;
    let crop_height = crop_h as u32;

    CoverCrop {
        x: source.0.saturating_sub(crop_width) / 2,
        y: source.1.saturating_sub(crop_height) / 2,
        crop_width,
        crop_height,
        width: target.0,
        height: target.1,
    }
}
