//! In-process frame I/O through libav (`ffmpeg` cargo feature).

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use ffmpeg_next as ffmpeg;
use ffmpeg::codec::context::Context as CodecContext;
use ffmpeg::codec::Id;
use ffmpeg::format::{Flags as FormatFlags, Pixel};
use ffmpeg::frame::Video as VideoFrame;
use ffmpeg::media::Type;
use ffmpeg::software::scaling::{Context as ScalingContext, Flags as ScalingFlags};
use ffmpeg::{Packet, Rational};
use tracing::{debug, info};

use crate::error::{OutputError, Result, SourceError};
use crate::video::traits::{FrameSink, FrameSource, OutputFormat, SinkOpener};
use crate::video::types::{Frame, Resolution};
use crate::video::fps_to_rational;

/// Copy an RGB24 libav frame into a tightly packed buffer, dropping row padding
fn packed_rgb(frame: &VideoFrame, width: u32, height: u32) -> Vec<u8> {
    let stride = frame.stride(0);
    let row_len = width as usize * 3;
    let data = frame.data(0);
    let mut buffer = Vec::with_capacity(row_len * height as usize);
    for y in 0..height as usize {
        let start = y * stride;
        buffer.extend_from_slice(&data[start..start + row_len]);
    }
    buffer
}

fn rational_to_f64(rate: Rational) -> Option<f64> {
    (rate.denominator() != 0 && rate.numerator() > 0)
        .then(|| rate.numerator() as f64 / rate.denominator() as f64)
}

/// Video stream decoded in process
pub struct NativeSource {
    input: ffmpeg::format::context::Input,
    decoder: ffmpeg::decoder::Video,
    scaler: ScalingContext,
    stream_index: usize,
    resolution: Resolution,
    fps: f64,
    frame_count_hint: u64,
    pending: VecDeque<Frame>,
    eof_sent: bool,
    frames_read: u64,
}

impl NativeSource {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let open_failed = |reason: String| SourceError::OpenFailed {
            path: path.display().to_string(),
            reason,
        };

        ffmpeg::init().map_err(|e| open_failed(format!("FFmpeg initialisation failed: {}", e)))?;

        let input = ffmpeg::format::input(&path).map_err(|e| open_failed(e.to_string()))?;

        let (stream_index, parameters, fps, frame_count_hint) = {
            let stream = input
                .streams()
                .best(Type::Video)
                .ok_or_else(|| open_failed("no video stream".to_string()))?;
            let fps = rational_to_f64(stream.avg_frame_rate())
                .or_else(|| rational_to_f64(stream.rate()))
                .unwrap_or(0.0);
            (stream.index(), stream.parameters(), fps, stream.frames().max(0) as u64)
        };

        let decoder = CodecContext::from_parameters(parameters)
            .and_then(|ctx| ctx.decoder().video())
            .map_err(|e| open_failed(format!("cannot create video decoder: {}", e)))?;

        let resolution = Resolution::new(decoder.width(), decoder.height());
        let scaler = ScalingContext::get(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            Pixel::RGB24,
            decoder.width(),
            decoder.height(),
            ScalingFlags::BILINEAR,
        )
        .map_err(|e| open_failed(format!("cannot create scaler: {}", e)))?;

        info!(
            "Video properties: {}, {} frames, {:.2} FPS",
            resolution, frame_count_hint, fps
        );

        Ok(Self {
            input,
            decoder,
            scaler,
            stream_index,
            resolution,
            fps,
            frame_count_hint,
            pending: VecDeque::new(),
            eof_sent: false,
            frames_read: 0,
        })
    }

    fn read_failed(&self, reason: String) -> SourceError {
        SourceError::ReadFailed { index: self.frames_read, reason }
    }

    fn drain_decoder(&mut self) -> Result<()> {
        let mut decoded = VideoFrame::empty();
        while self.decoder.receive_frame(&mut decoded).is_ok() {
            let mut rgb = VideoFrame::empty();
            self.scaler
                .run(&decoded, &mut rgb)
                .map_err(|e| self.read_failed(format!("scaling failed: {}", e)))?;
            let (width, height) = (self.resolution.width, self.resolution.height);
            let frame = Frame::from_rgb_bytes(width, height, packed_rgb(&rgb, width, height))
                .ok_or_else(|| self.read_failed("frame buffer size mismatch".to_string()))?;
            self.pending.push_back(frame);
        }
        Ok(())
    }
}

impl FrameSource for NativeSource {
    fn frame_rate(&self) -> f64 {
        self.fps
    }

    fn frame_count_hint(&self) -> u64 {
        self.frame_count_hint
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        loop {
            if let Some(frame) = self.pending.pop_front() {
                self.frames_read += 1;
                return Ok(Some(frame));
            }
            if self.eof_sent {
                return Ok(None);
            }

            let next = self
                .input
                .packets()
                .next()
                .map(|(stream, packet)| (stream.index(), packet));

            match next {
                Some((index, packet)) if index == self.stream_index => {
                    self.decoder
                        .send_packet(&packet)
                        .map_err(|e| self.read_failed(format!("send_packet failed: {}", e)))?;
                }
                Some(_) => continue,
                None => {
                    self.decoder
                        .send_eof()
                        .map_err(|e| self.read_failed(format!("send_eof failed: {}", e)))?;
                    self.eof_sent = true;
                }
            }
            self.drain_decoder()?;
        }
    }
}

/// Output stream encoded in process
pub struct NativeSink {
    output: ffmpeg::format::context::Output,
    encoder: ffmpeg::encoder::video::Encoder,
    scaler: ScalingContext,
    stream_index: usize,
    encoder_time_base: Rational,
    stream_time_base: Rational,
    resolution: Resolution,
    path: PathBuf,
    frame_index: i64,
}

impl NativeSink {
    pub fn open(path: &Path, resolution: Resolution, fps: f64, format: OutputFormat) -> Result<Self> {
        let open_failed = |reason: String| OutputError::OpenFailed {
            path: path.display().to_string(),
            reason,
        };

        ffmpeg::init().map_err(|e| open_failed(format!("FFmpeg initialisation failed: {}", e)))?;

        let codec_id = match format {
            OutputFormat::Webm => Id::VP9,
            _ => Id::MPEG4,
        };
        let (width, height) = (resolution.width, resolution.height);
        let (num, den) = fps_to_rational(fps);
        let encoder_time_base = Rational::new(den, num);

        let mut output = ffmpeg::format::output(&path).map_err(|e| open_failed(e.to_string()))?;
        let needs_global_header = output.format().flags().contains(FormatFlags::GLOBAL_HEADER);

        let codec = ffmpeg::encoder::find(codec_id)
            .ok_or_else(|| open_failed(format!("codec {:?} not available", codec_id)))?;

        let (stream_index, encoder) = {
            let mut stream = output
                .add_stream(codec)
                .map_err(|e| open_failed(format!("cannot add stream: {}", e)))?;

            let mut encoder = CodecContext::from_parameters(stream.parameters())
                .and_then(|ctx| ctx.encoder().video())
                .map_err(|e| open_failed(format!("cannot create encoder: {}", e)))?;

            encoder.set_width(width);
            encoder.set_height(height);
            encoder.set_format(Pixel::YUV420P);
            encoder.set_time_base(encoder_time_base);
            encoder.set_frame_rate(Some(Rational::new(num, den)));
            encoder.set_bit_rate((width as f64 * height as f64 * fps.max(1.0) * 0.25) as usize);
            if needs_global_header {
                encoder.set_flags(ffmpeg::codec::Flags::GLOBAL_HEADER);
            }

            let opened = encoder
                .open_as(codec)
                .map_err(|e| open_failed(format!("cannot open encoder: {}", e)))?;
            stream.set_parameters(&opened);
            (stream.index(), opened)
        };

        output
            .write_header()
            .map_err(|e| open_failed(format!("cannot write header: {}", e)))?;

        let stream_time_base = output
            .stream(stream_index)
            .map(|stream| stream.time_base())
            .ok_or_else(|| open_failed("output stream vanished".to_string()))?;

        let scaler = ScalingContext::get(
            Pixel::RGB24,
            width,
            height,
            Pixel::YUV420P,
            width,
            height,
            ScalingFlags::BILINEAR,
        )
        .map_err(|e| open_failed(format!("cannot create scaler: {}", e)))?;

        Ok(Self {
            output,
            encoder,
            scaler,
            stream_index,
            encoder_time_base,
            stream_time_base,
            resolution,
            path: path.to_path_buf(),
            frame_index: 0,
        })
    }

    fn write_pending_packets(&mut self) -> Result<()> {
        let mut packet = Packet::empty();
        while self.encoder.receive_packet(&mut packet).is_ok() {
            packet.set_stream(self.stream_index);
            packet.rescale_ts(self.encoder_time_base, self.stream_time_base);
            packet
                .write_interleaved(&mut self.output)
                .map_err(|e| OutputError::EncodingFailed {
                    reason: format!("write packet failed: {}", e),
                })?;
        }
        Ok(())
    }
}

impl FrameSink for NativeSink {
    fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        if frame.resolution() != self.resolution {
            return Err(OutputError::EncodingFailed {
                reason: format!("frame is {} but stream is {}", frame.resolution(), self.resolution),
            }
            .into());
        }

        let (width, height) = (self.resolution.width, self.resolution.height);
        let mut src = VideoFrame::new(Pixel::RGB24, width, height);
        let stride = src.stride(0);
        let row_len = width as usize * 3;
        let rgb = frame.as_rgb_bytes();
        let dst = src.data_mut(0);
        for y in 0..height as usize {
            dst[y * stride..y * stride + row_len]
                .copy_from_slice(&rgb[y * row_len..(y + 1) * row_len]);
        }

        let mut yuv = VideoFrame::empty();
        self.scaler.run(&src, &mut yuv).map_err(|e| OutputError::EncodingFailed {
            reason: format!("scaling failed: {}", e),
        })?;
        yuv.set_pts(Some(self.frame_index));
        self.frame_index += 1;

        self.encoder.send_frame(&yuv).map_err(|e| OutputError::EncodingFailed {
            reason: format!("send_frame failed: {}", e),
        })?;
        self.write_pending_packets()
    }

    fn finish(mut self: Box<Self>) -> Result<()> {
        self.encoder.send_eof().map_err(|e| OutputError::EncodingFailed {
            reason: format!("send_eof failed: {}", e),
        })?;
        self.write_pending_packets()?;
        self.output.write_trailer().map_err(|e| OutputError::EncodingFailed {
            reason: format!("cannot write trailer: {}", e),
        })?;
        debug!("Closed {} after {} frames", self.path.display(), self.frame_index);
        Ok(())
    }
}

/// [`SinkOpener`] producing [`NativeSink`]s
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeSinkOpener;

impl SinkOpener for NativeSinkOpener {
    fn open(
        &self,
        path: &Path,
        resolution: Resolution,
        fps: f64,
        format: OutputFormat,
    ) -> Result<Box<dyn FrameSink>> {
        Ok(Box::new(NativeSink::open(path, resolution, fps, format)?))
    }
}
