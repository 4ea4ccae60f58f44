//! Evenly spaced frame selection for video sampling.

/// Frame indices to extract from a video with `total` frames when `requested`
/// frames are wanted.
///
/// When the video is shorter than the request every frame is returned once.
/// Otherwise frames are taken at `floor(total / requested)` intervals and the
/// last index is pinned to `total - 1` so the final frame is always included
/// when more than one frame is taken.
pub fn sample_frame_indices(total: u64, requested: u64) -> Vec<u64> {
    if total == 0 || requested == 0 {
        return Vec::new();
    }
    let count = total.min(requested);
    if count == 1 {
        return vec![0];
    }

    let interval = total / count;
    let last = total - 1;
    let mut indices: Vec<u64> = (0..count).map(|i| (i * interval).min(last)).collect();
    if let Some(tail) = indices.last_mut() {
        if *tail < last {
            *tail = last;
        }
    }
    indices
}

/// Output file name for the `ordinal`-th (1-based) frame taken from a video.
pub fn frame_file_name(video_stem: &str, ordinal: usize) -> String {
    format!("{video_stem}_frame_{ordinal:03}.jpg")
}
