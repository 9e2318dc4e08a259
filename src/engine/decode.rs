//! Audio decoding
//!
//! Turns an opaque encoded blob into mono PCM at the blob's native rate.
//! WAV goes through hound; every other container is probed by symphonia
//! (MP3, FLAC, Vorbis, AAC/MP4). Decoding runs entirely in memory, so no
//! temporary files exist on any exit path.
//!
//! The rate is reported, never forced: resampling to the analysis rate is
//! the classification engine's job.

use std::io::Cursor;
use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

use crate::engine::buffer::{AudioSample, SUPPORTED_SAMPLE_RATES};
use crate::error::{DecodeErrorKind, DetectorError, Result};

/// Stateless decoder front-end
pub struct AudioDecoder;

impl AudioDecoder {
    /// Decode an encoded payload to mono PCM.
    ///
    /// # Errors
    /// `Decode` with a kind describing whether the payload was empty,
    /// malformed, truncated, or in a format we cannot read.
    pub fn decode(bytes: &[u8]) -> Result<AudioSample> {
        Self::decode_with_hint(bytes, None)
    }

    /// Decode with a file extension hint for the container probe
    pub fn decode_with_hint(bytes: &[u8], extension: Option<&str>) -> Result<AudioSample> {
        if bytes.is_empty() {
            return Err(DetectorError::decode(
                DecodeErrorKind::Empty,
                "payload is zero bytes long",
            ));
        }

        let audio = if is_riff_wave(bytes) {
            debug!("Decoding {} byte payload as WAV", bytes.len());
            decode_wav(bytes)?
        } else {
            debug!("Probing {} byte payload with symphonia", bytes.len());
            decode_container(bytes, extension)?
        };

        if audio.is_empty() {
            return Err(DetectorError::decode(
                DecodeErrorKind::Truncated,
                "stream contained no audio frames",
            ));
        }

        debug!(
            "Decoded {} mono samples at {}Hz ({:.2}s)",
            audio.len(),
            audio.sample_rate(),
            audio.duration_secs()
        );
        Ok(audio)
    }

    /// Read and decode a file from disk
    pub fn decode_file(path: &Path) -> Result<AudioSample> {
        let bytes = std::fs::read(path)?;
        let extension = path.extension().and_then(|e| e.to_str());
        Self::decode_with_hint(&bytes, extension)
    }
}

/// Encode a clip as 16-bit mono WAV.
///
/// Used to build fixtures and to hand clips to tools that expect a file.
pub fn encode_wav(audio: &AudioSample) -> Result<Vec<u8>> {
    let spec = WavSpec {
        channels: 1,
        sample_rate: audio.sample_rate(),
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, spec).map_err(wav_write_error)?;
        for &sample in audio.samples() {
            let scaled = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
            writer.write_sample(scaled).map_err(wav_write_error)?;
        }
        writer.finalize().map_err(wav_write_error)?;
    }
    Ok(cursor.into_inner())
}

// ============================================================================
// Internal helper functions
// ============================================================================

fn is_riff_wave(bytes: &[u8]) -> bool {
    bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WAVE"
}

fn wav_write_error(e: hound::Error) -> DetectorError {
    DetectorError::Io(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))
}

fn classify_hound_error(e: &hound::Error) -> DecodeErrorKind {
    match e {
        hound::Error::FormatError(_) => DecodeErrorKind::Malformed,
        hound::Error::TooWide | hound::Error::Unsupported | hound::Error::InvalidSampleFormat => {
            DecodeErrorKind::Unsupported
        }
        hound::Error::UnfinishedSample => DecodeErrorKind::Truncated,
        hound::Error::IoError(io) if io.kind() == std::io::ErrorKind::UnexpectedEof => {
            DecodeErrorKind::Truncated
        }
        hound::Error::IoError(_) => DecodeErrorKind::Internal,
    }
}

fn hound_error(context: &str, e: hound::Error) -> DetectorError {
    let kind = classify_hound_error(&e);
    DetectorError::decode_with(kind, format!("{}: {}", context, e), e)
}

fn decode_wav(bytes: &[u8]) -> Result<AudioSample> {
    let reader = WavReader::new(Cursor::new(bytes)).map_err(|e| hound_error("WAV header", e))?;

    let spec = reader.spec();
    if spec.sample_rate == 0 || spec.channels == 0 {
        return Err(DetectorError::decode(
            DecodeErrorKind::Malformed,
            format!(
                "WAV header declares {} channels at {}Hz",
                spec.channels, spec.sample_rate
            ),
        ));
    }
    check_sample_rate(spec.sample_rate)?;

    let interleaved = read_samples_as_f32(reader, spec.bits_per_sample, spec.sample_format)?;
    let mono = downmix(&interleaved, spec.channels as usize);
    Ok(AudioSample::new(mono, spec.sample_rate))
}

/// Reject declared rates no real recording uses
fn check_sample_rate(rate: u32) -> Result<()> {
    if SUPPORTED_SAMPLE_RATES.contains(&rate) {
        return Ok(());
    }
    Err(DetectorError::decode(
        DecodeErrorKind::Unsupported,
        format!(
            "sample rate {}Hz outside {}..={}Hz",
            rate,
            SUPPORTED_SAMPLE_RATES.start(),
            SUPPORTED_SAMPLE_RATES.end()
        ),
    ))
}

/// Read samples from a WAV reader and convert to f32
fn read_samples_as_f32<R: std::io::Read>(
    mut reader: WavReader<R>,
    bits_per_sample: u16,
    sample_format: SampleFormat,
) -> Result<Vec<f32>> {
    match sample_format {
        SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<Vec<f32>, _>>()
            .map_err(|e| hound_error("float samples", e)),
        SampleFormat::Int => {
            let scale = match bits_per_sample {
                8 => 128.0,
                16 => 32_768.0,
                24 => 8_388_608.0,
                32 => 2_147_483_648.0,
                other => {
                    return Err(DetectorError::decode(
                        DecodeErrorKind::Unsupported,
                        format!("{}-bit integer WAV", other),
                    ))
                }
            };
            // hound widens every integer depth up to i32
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| (v as f64 / scale) as f32))
                .collect::<std::result::Result<Vec<f32>, _>>()
                .map_err(|e| hound_error("integer samples", e))
        }
    }
}

fn classify_symphonia_error(e: &SymphoniaError) -> DecodeErrorKind {
    match e {
        SymphoniaError::Unsupported(_) => DecodeErrorKind::Unsupported,
        SymphoniaError::DecodeError(_) | SymphoniaError::SeekError(_) => DecodeErrorKind::Malformed,
        SymphoniaError::IoError(io) if io.kind() == std::io::ErrorKind::UnexpectedEof => {
            DecodeErrorKind::Truncated
        }
        SymphoniaError::IoError(_) | SymphoniaError::LimitError(_) => DecodeErrorKind::Internal,
        SymphoniaError::ResetRequired => DecodeErrorKind::Internal,
    }
}

fn symphonia_error(context: &str, e: SymphoniaError) -> DetectorError {
    let kind = classify_symphonia_error(&e);
    DetectorError::decode_with(kind, format!("{}: {}", context, e), e)
}

fn decode_container(bytes: &[u8], extension: Option<&str>) -> Result<AudioSample> {
    let source = Cursor::new(bytes.to_vec());
    let mss = MediaSourceStream::new(Box::new(source), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = extension {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| match e {
            // an unrecognised container is reported as unsupported, not malformed
            SymphoniaError::IoError(_) | SymphoniaError::Unsupported(_) => {
                DetectorError::decode_with(
                    DecodeErrorKind::Unsupported,
                    format!("no container format recognised: {}", e),
                    e,
                )
            }
            other => symphonia_error("container probe", other),
        })?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| {
            DetectorError::decode(DecodeErrorKind::Unsupported, "no decodable audio track")
        })?;

    let track_id = track.id;
    let declared_rate = track.codec_params.sample_rate;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| symphonia_error("codec", e))?;

    let mut mono = Vec::new();
    let mut sample_rate = declared_rate.unwrap_or(0);

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                debug!("Reached end of stream");
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => {
                if mono.is_empty() {
                    return Err(symphonia_error("reading packet", e));
                }
                warn!("Stopping at unreadable packet: {}", e);
                break;
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                if decoded.frames() == 0 {
                    continue;
                }
                let spec = *decoded.spec();
                if sample_rate == 0 {
                    sample_rate = spec.rate;
                }
                let mut buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
                buffer.copy_interleaved_ref(decoded);
                mono.extend(downmix(buffer.samples(), spec.channels.count()));
            }
            Err(SymphoniaError::DecodeError(e)) => {
                // a corrupt frame inside an otherwise valid stream is skipped
                warn!("Skipping undecodable packet: {}", e);
                continue;
            }
            Err(SymphoniaError::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => return Err(symphonia_error("decoding packet", e)),
        }
    }

    if sample_rate == 0 {
        return Err(DetectorError::decode(
            DecodeErrorKind::Malformed,
            "stream does not declare a sample rate",
        ));
    }
    check_sample_rate(sample_rate)?;

    Ok(AudioSample::new(mono, sample_rate))
}

/// Average interleaved channels down to mono, clamped to [-1, 1]
fn downmix(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.iter().map(|s| s.clamp(-1.0, 1.0)).collect();
    }
    interleaved
        .chunks_exact(channels)
        .map(|frame| (frame.iter().sum::<f32>() / channels as f32).clamp(-1.0, 1.0))
        .collect()
}
