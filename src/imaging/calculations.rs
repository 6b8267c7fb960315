//! Dimension math for resampling. No I/O.

/// Output size when fitting `(width, height)` to `target_height`, width capped at `max_width`,
/// aspect ratio kept, no cropping. Never upscales: an image already inside the box is unchanged.
pub fn fit_to_height(width: u32, height: u32, target_height: u32, max_width: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (width, height);
    }
    if height <= target_height && width <= max_width {
        return (width, height);
    }
    let scale = (target_height as f64 / height as f64).min(max_width as f64 / width as f64);
    let w = ((width as f64 * scale).round() as u32).clamp(1, max_width.max(1));
    let h = ((height as f64 * scale).round() as u32).clamp(1, target_height.max(1));
    (w, h)
}

/// Number of deep-zoom levels above level 0 for an image whose larger side is `max_dim`
/// (level `n` is full size, level 0 is 1×1).
pub fn deep_zoom_max_level(width: u32, height: u32) -> u32 {
    let max_dim = width.max(height).max(1);
    // ceil(log2(max_dim))
    u32::BITS - (max_dim - 1).leading_zeros()
}

/// Size of `level` in a pyramid whose top level is `max_level`.
pub fn deep_zoom_level_size(width: u32, height: u32, level: u32, max_level: u32) -> (u32, u32) {
    let shift = max_level.saturating_sub(level);
    let div = 1u64 << shift;
    let w = (width as u64).div_ceil(div).max(1) as u32;
    let h = (height as u64).div_ceil(div).max(1) as u32;
    (w, h)
}

/// Pixel rectangle `(x, y, w, h)` of tile `(col, row)` on a level of size `(level_w, level_h)`,
/// including `overlap` pixels shared with each neighbour.
pub fn deep_zoom_tile_rect(
    col: u32,
    row: u32,
    level_w: u32,
    level_h: u32,
    tile_size: u32,
    overlap: u32,
) -> (u32, u32, u32, u32) {
    let x = (col * tile_size).saturating_sub(if col > 0 { overlap } else { 0 });
    let y = (row * tile_size).saturating_sub(if row > 0 { overlap } else { 0 });
    let x_end = ((col + 1) * tile_size + overlap).min(level_w);
    let y_end = ((row + 1) * tile_size + overlap).min(level_h);
    (x, y, x_end - x, y_end - y)
}
