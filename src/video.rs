//! FFmpeg-backed video source.
//!
//! [`FfmpegSource`] probes a file and opens one [`FfmpegCursor`] per worker.
//! Each cursor owns its own demuxer, decoder and scaler, so cursors on the
//! same file share nothing.

use std::path::{Path, PathBuf};

use ffmpeg_next::{
    Packet, Rational,
    codec::context::Context as CodecContext,
    decoder::Video as VideoDecoder,
    format::context::Input,
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};
use image::{DynamicImage, GrayImage, RgbImage, RgbaImage};

use crate::{
    configuration::PixelFormat,
    error::SplitError,
    source::{DecodeCursor, FrameSource, SourceInfo},
    utilities,
};

/// A video file decoded through FFmpeg.
///
/// # Example
///
/// ```no_run
/// use framesplit::{FfmpegSource, FrameSource};
///
/// let source = FfmpegSource::new("input.mp4");
/// let info = source.probe()?;
/// println!("{} frames, {}x{}", info.frame_count, info.width, info.height);
/// # Ok::<(), framesplit::SplitError>(())
/// ```
#[derive(Debug, Clone)]
pub struct FfmpegSource {
    path: PathBuf,
    pixel_format: PixelFormat,
}

impl FfmpegSource {
    /// Describe the video at `path`. Nothing is opened until
    /// [`probe`](FrameSource::probe) or
    /// [`open_cursor`](FrameSource::open_cursor).
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            pixel_format: PixelFormat::default(),
        }
    }

    /// Pixel format of the images produced by this source's cursors.
    #[must_use]
    pub fn with_pixel_format(mut self, pixel_format: PixelFormat) -> Self {
        self.pixel_format = pixel_format;
        self
    }

    fn unavailable(&self, reason: impl Into<String>) -> SplitError {
        SplitError::SourceUnavailable {
            path: self.path.clone(),
            reason: reason.into(),
        }
    }

    /// Open the container and locate the best video stream.
    fn open_input(&self) -> Result<(Input, usize), SplitError> {
        ffmpeg_next::init()
            .map_err(|error| self.unavailable(format!("FFmpeg initialisation failed: {error}")))?;

        let input = ffmpeg_next::format::input(&self.path)
            .map_err(|error| self.unavailable(error.to_string()))?;

        let stream_index = input
            .streams()
            .best(Type::Video)
            .map(|stream| stream.index())
            .ok_or_else(|| self.unavailable("no video stream found"))?;

        Ok((input, stream_index))
    }

    fn open_decoder(&self, input: &Input, stream_index: usize) -> Result<VideoDecoder, SplitError> {
        let stream = input
            .stream(stream_index)
            .ok_or_else(|| self.unavailable("video stream disappeared"))?;
        CodecContext::from_parameters(stream.parameters())
            .and_then(|context| context.decoder().video())
            .map_err(|error| self.unavailable(format!("failed to create video decoder: {error}")))
    }

    /// Time base, frame rate and first timestamp of the video stream.
    fn stream_timing(
        &self,
        input: &Input,
        stream_index: usize,
    ) -> Result<(Rational, f64, i64), SplitError> {
        let stream = input
            .stream(stream_index)
            .ok_or_else(|| self.unavailable("video stream disappeared"))?;
        let frames_per_second = utilities::rational_to_frames_per_second(stream.avg_frame_rate())
            .or_else(|| utilities::rational_to_frames_per_second(stream.rate()))
            .ok_or_else(|| self.unavailable("video stream has no frame rate"))?;
        let start_time = utilities::known_start_time(stream.start_time());
        Ok((stream.time_base(), frames_per_second, start_time))
    }
}

impl FrameSource for FfmpegSource {
    type Cursor = FfmpegCursor;

    fn path(&self) -> &Path {
        &self.path
    }

    fn probe(&self) -> Result<SourceInfo, SplitError> {
        log::debug!("Probing {}", self.path.display());

        let (input, stream_index) = self.open_input()?;
        let decoder = self.open_decoder(&input, stream_index)?;
        let (_, frames_per_second, _) = self.stream_timing(&input, stream_index)?;

        let stream_frames = input
            .stream(stream_index)
            .map(|stream| stream.frames())
            .unwrap_or(0);

        // Containers that do not record a frame count fall back to
        // duration * frame rate.
        let frame_count = if stream_frames > 0 {
            stream_frames as u64
        } else {
            let duration_microseconds = input.duration();
            if duration_microseconds > 0 {
                (duration_microseconds as f64 / 1_000_000.0 * frames_per_second) as u64
            } else {
                0
            }
        };

        if frame_count == 0 {
            return Err(self.unavailable("frame count is zero or unreadable"));
        }

        Ok(SourceInfo {
            frame_count,
            width: decoder.width(),
            height: decoder.height(),
            frames_per_second,
        })
    }

    fn open_cursor(&self) -> Result<FfmpegCursor, SplitError> {
        let (input, stream_index) = self.open_input()?;
        let decoder = self.open_decoder(&input, stream_index)?;
        let (time_base, frames_per_second, start_time) =
            self.stream_timing(&input, stream_index)?;

        log::debug!(
            "Opened cursor on {} (stream {stream_index}, {frames_per_second:.3} fps)",
            self.path.display(),
        );

        Ok(FfmpegCursor {
            input,
            stream_index,
            decoder,
            scaler: None,
            pixel_format: self.pixel_format,
            output_size: None,
            time_base,
            frames_per_second,
            start_time,
            target: 0,
            draining: false,
        })
    }
}

/// One worker's private decode position in an FFmpeg-opened file.
///
/// Seeks jump to the nearest keyframe before the target, then
/// [`read_frame`](DecodeCursor::read_frame) decodes forward until the first
/// frame at or past the target. Frame numbers count from the stream's first
/// timestamp, so containers that start at a non-zero PTS still number their
/// first frame 0.
pub struct FfmpegCursor {
    input: Input,
    stream_index: usize,
    decoder: VideoDecoder,
    scaler: Option<ScalingContext>,
    pixel_format: PixelFormat,
    output_size: Option<(u32, u32)>,
    time_base: Rational,
    frames_per_second: f64,
    /// First PTS of the stream in `time_base` units.
    start_time: i64,
    target: u64,
    draining: bool,
}

impl FfmpegCursor {
    fn next_video_packet(&mut self) -> Option<Packet> {
        let stream_index = self.stream_index;
        self.input
            .packets()
            .find_map(|(stream, packet)| (stream.index() == stream_index).then_some(packet))
    }

    fn frame_number(&self, frame: &VideoFrame) -> u64 {
        let pts = frame
            .timestamp()
            .or_else(|| frame.pts())
            .unwrap_or(self.start_time);
        utilities::pts_to_frame_number(
            pts.saturating_sub(self.start_time),
            self.time_base,
            self.frames_per_second,
        )
    }

    /// Scale and convert a decoded frame, rebuilding the scaler whenever the
    /// decoded geometry changes.
    fn convert(&mut self, decoded: &VideoFrame) -> Result<DynamicImage, SplitError> {
        let (width, height) = self
            .output_size
            .unwrap_or((decoded.width(), decoded.height()));

        let stale = self.scaler.as_ref().is_none_or(|scaler| {
            let input = scaler.input();
            input.format != decoded.format()
                || input.width != decoded.width()
                || input.height != decoded.height()
        });
        if stale {
            self.scaler = Some(ScalingContext::get(
                decoded.format(),
                decoded.width(),
                decoded.height(),
                self.pixel_format.to_ffmpeg_pixel(),
                width,
                height,
                ScalingFlags::BICUBIC,
            )?);
        }

        let mut converted = VideoFrame::empty();
        if let Some(scaler) = self.scaler.as_mut() {
            scaler.run(decoded, &mut converted)?;
        }

        let buffer = utilities::frame_to_buffer(
            &converted,
            width,
            height,
            self.pixel_format.bytes_per_pixel(),
        );
        let image = match self.pixel_format {
            PixelFormat::Rgb8 => RgbImage::from_raw(width, height, buffer).map(DynamicImage::ImageRgb8),
            PixelFormat::Rgba8 => {
                RgbaImage::from_raw(width, height, buffer).map(DynamicImage::ImageRgba8)
            }
            PixelFormat::Gray8 => {
                GrayImage::from_raw(width, height, buffer).map(DynamicImage::ImageLuma8)
            }
        };
        image.ok_or_else(|| {
            SplitError::FfmpegError("converted frame buffer has the wrong size".to_string())
        })
    }
}

impl DecodeCursor for FfmpegCursor {
    fn set_output_size(&mut self, width: u32, height: u32) -> Result<(), SplitError> {
        self.output_size = Some((width, height));
        self.scaler = None;
        Ok(())
    }

    fn seek(&mut self, frame_number: u64) -> Result<(), SplitError> {
        let timestamp =
            utilities::frame_number_to_seek_timestamp(frame_number, self.frames_per_second)
                .saturating_add(utilities::to_microseconds(self.start_time, self.time_base));
        self.input
            .seek(timestamp, ..timestamp)
            .map_err(|error| SplitError::SeekFailure {
                frame_number,
                reason: error.to_string(),
            })?;
        self.decoder.flush();
        self.target = frame_number;
        self.draining = false;
        Ok(())
    }

    fn read_frame(&mut self) -> Result<Option<DynamicImage>, SplitError> {
        let mut decoded = VideoFrame::empty();
        loop {
            while self.decoder.receive_frame(&mut decoded).is_ok() {
                let frame_number = self.frame_number(&decoded);
                if frame_number >= self.target {
                    self.target = frame_number + 1;
                    return self.convert(&decoded).map(Some);
                }
            }

            if self.draining {
                return Ok(None);
            }

            match self.next_video_packet() {
                Some(packet) => self.decoder.send_packet(&packet)?,
                None => {
                    self.decoder.send_eof()?;
                    self.draining = true;
                }
            }
        }
    }
}
