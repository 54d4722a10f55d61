// SPDX-License-Identifier: MPL-2.0
//! Output dimension computation for frame display.

/// Computes the output pixel dimensions for a frame of `intrinsic` size shown
/// in a `target` box.
///
/// With `keep_aspect` off, the target is returned unchanged. With it on and
/// the aspect ratios differing, exactly one target dimension is shrunk to
/// match the intrinsic ratio: when the source is relatively wider than the
/// target box the width is preserved and the height recomputed, otherwise the
/// height is preserved and the width recomputed. Equal ratios return the
/// target unchanged.
pub fn fit_display_size(intrinsic: (u32, u32), target: (u32, u32), keep_aspect: bool) -> (u32, u32) {
    let (src_width, src_height) = intrinsic;
    let (dst_width, dst_height) = target;
    if !keep_aspect || src_width == 0 || src_height == 0 || dst_width == 0 || dst_height == 0 {
        return target;
    }

    let source_ratio = f64::from(src_width) / f64::from(src_height);
    let target_ratio = f64::from(dst_width) / f64::from(dst_height);
    if source_ratio == target_ratio {
        target
    } else if source_ratio > target_ratio {
        let height = (f64::from(src_height) / f64::from(src_width) * f64::from(dst_width)).round();
        (dst_width, height as u32)
    } else {
        let width = (f64::from(src_width) / f64::from(src_height) * f64::from(dst_height)).round();
        (width as u32, dst_height)
    }
}
