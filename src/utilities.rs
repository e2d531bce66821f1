//! Internal utility functions.
//!
//! Pixel-data copying and frame-number/timestamp conversions shared by the
//! FFmpeg cursor.

use ffmpeg_next::{Rational, frame::Video as VideoFrame};

/// Copy pixel data from an FFmpeg video frame into a tightly-packed buffer.
///
/// `bytes_per_pixel` is 3 for RGB24, 4 for RGBA and 1 for GRAY8.
pub(crate) fn frame_to_buffer(
    video_frame: &VideoFrame,
    width: u32,
    height: u32,
    bytes_per_pixel: usize,
) -> Vec<u8> {
    let stride = video_frame.stride(0);
    let expected_stride = (width as usize) * bytes_per_pixel;
    let data = video_frame.data(0);

    if stride == expected_stride {
        data[..expected_stride * (height as usize)].to_vec()
    } else {
        let mut buffer = Vec::with_capacity(expected_stride * (height as usize));
        for row in 0..(height as usize) {
            let row_start = row * stride;
            buffer.extend_from_slice(&data[row_start..row_start + expected_stride]);
        }
        buffer
    }
}

/// Frames per second from a stream rate, or `None` if the rate is unset.
pub(crate) fn rational_to_frames_per_second(rate: Rational) -> Option<f64> {
    if rate.numerator() <= 0 || rate.denominator() <= 0 {
        return None;
    }
    Some(rate.numerator() as f64 / rate.denominator() as f64)
}

/// Rescale a PTS value to the nearest frame number.
pub(crate) fn pts_to_frame_number(pts: i64, time_base: Rational, frames_per_second: f64) -> u64 {
    let seconds = pts as f64 * time_base.numerator() as f64 / time_base.denominator() as f64;
    (seconds * frames_per_second).round().max(0.0) as u64
}

/// Convert a frame number to a container seek timestamp in AV_TIME_BASE
/// (microseconds).
pub(crate) fn frame_number_to_seek_timestamp(frame_number: u64, frames_per_second: f64) -> i64 {
    let seconds = frame_number as f64 / frames_per_second;
    (seconds * 1_000_000.0) as i64
}

/// A stream start time, with FFmpeg's "no timestamp" marker read as 0.
pub(crate) fn known_start_time(start_time: i64) -> i64 {
    if start_time == NO_TIMESTAMP { 0 } else { start_time }
}

/// Rescale a timestamp in `time_base` units to microseconds.
pub(crate) fn to_microseconds(timestamp: i64, time_base: Rational) -> i64 {
    if time_base.denominator() == 0 {
        return 0;
    }
    let seconds = timestamp as f64 * time_base.numerator() as f64 / time_base.denominator() as f64;
    (seconds * 1_000_000.0).round() as i64
}

/// FFmpeg's `AV_NOPTS_VALUE`.
const NO_TIMESTAMP: i64 = i64::MIN;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_per_second_from_rate() {
        assert_eq!(rational_to_frames_per_second(Rational::new(30, 1)), Some(30.0));
        let ntsc = rational_to_frames_per_second(Rational::new(30000, 1001)).unwrap();
        assert!((ntsc - 29.97).abs() < 0.01);
        assert_eq!(rational_to_frames_per_second(Rational::new(0, 0)), None);
    }

    #[test]
    fn pts_rounds_to_nearest_frame() {
        // 1/90000 time base at 30 fps: one frame is 3000 ticks.
        let time_base = Rational::new(1, 90_000);
        assert_eq!(pts_to_frame_number(0, time_base, 30.0), 0);
        assert_eq!(pts_to_frame_number(2999, time_base, 30.0), 1);
        assert_eq!(pts_to_frame_number(90_000, time_base, 30.0), 30);
    }

    #[test]
    fn seek_timestamp_in_microseconds() {
        assert_eq!(frame_number_to_seek_timestamp(0, 25.0), 0);
        assert_eq!(frame_number_to_seek_timestamp(25, 25.0), 1_000_000);
        assert_eq!(frame_number_to_seek_timestamp(30, 60.0), 500_000);
    }

    #[test]
    fn missing_start_time_reads_as_zero() {
        assert_eq!(known_start_time(i64::MIN), 0);
        assert_eq!(known_start_time(1_001), 1_001);
    }

    #[test]
    fn start_offset_shifts_frame_numbers_and_seeks() {
        // MPEG-TS style stream whose first packet sits at 1.4 s.
        let time_base = Rational::new(1, 90_000);
        let start_time = 126_000;
        let first_pts = start_time;
        assert_eq!(pts_to_frame_number(first_pts - start_time, time_base, 30.0), 0);
        assert_eq!(
            pts_to_frame_number(first_pts + 90_000 - start_time, time_base, 30.0),
            30
        );
        assert_eq!(to_microseconds(start_time, time_base), 1_400_000);
        assert_eq!(to_microseconds(5, Rational::new(1, 0)), 0);
    }
}
