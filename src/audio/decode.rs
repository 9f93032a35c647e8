//! Decoding of inbound audio chunks to normalized PCM.
//!
//! Every chunk, whatever container the browser recorded it in, comes out as
//! mono 16kHz 16-bit samples ready for the translation engine. WAV goes
//! through hound directly; compressed containers (WebM, Ogg, MP4, MP3) go
//! through symphonia.

use std::io::Cursor;

use symphonia::core::audio::AudioBufferRef;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::conv::FromSample;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::sample::Sample;

use crate::defaults::SAMPLE_RATE;
use crate::error::{LivesubError, Result};

/// Decode one audio chunk to mono 16kHz i16 PCM.
pub fn decode_chunk(bytes: &[u8], mime_type: &str) -> Result<Vec<i16>> {
    match container_format(mime_type) {
        "wav" => decode_wav(bytes),
        format => decode_compressed(bytes, format),
    }
}

/// Map a MIME type to the container format to probe for.
///
/// Codec parameters after `;` carry nothing the probe needs. Unrecognized
/// types fall back to WebM, the container MediaRecorder produces by default.
pub(crate) fn container_format(mime_type: &str) -> &'static str {
    let base = mime_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    match base.as_str() {
        "audio/wav" | "audio/x-wav" | "audio/wave" => "wav",
        "audio/ogg" | "application/ogg" => "ogg",
        "audio/mp4" | "video/mp4" => "mp4",
        "audio/mpeg" | "audio/mp3" => "mp3",
        _ => "webm",
    }
}

fn decode_wav(bytes: &[u8]) -> Result<Vec<i16>> {
    let mut reader =
        hound::WavReader::new(Cursor::new(bytes)).map_err(|e| LivesubError::AudioDecode {
            message: format!("Failed to parse WAV: {}", e),
        })?;

    let spec = reader.spec();
    let source_rate = spec.sample_rate;
    let source_channels = spec.channels;

    let raw_samples: Vec<i16> = match spec.sample_format {
        hound::SampleFormat::Int if spec.bits_per_sample <= 16 => reader
            .samples::<i16>()
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| LivesubError::AudioDecode {
                message: format!("Failed to read WAV samples: {}", e),
            })?,
        hound::SampleFormat::Int => {
            let shift = spec.bits_per_sample - 16;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| (v >> shift) as i16))
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| LivesubError::AudioDecode {
                    message: format!("Failed to read WAV samples: {}", e),
                })?
        }
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .map(|s| s.map(|v| (v.clamp(-1.0, 1.0) * 32767.0) as i16))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| LivesubError::AudioDecode {
                message: format!("Failed to read WAV samples: {}", e),
            })?,
    };

    let mono = downmix(raw_samples, source_channels as usize);
    Ok(resample(&mono, source_rate, SAMPLE_RATE))
}

fn decode_compressed(bytes: &[u8], format: &str) -> Result<Vec<i16>> {
    let stream = MediaSourceStream::new(Box::new(Cursor::new(bytes.to_vec())), Default::default());

    let mut hint = Hint::new();
    hint.with_extension(format);

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            stream,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| LivesubError::AudioDecode {
            message: format!("Unrecognized {} container: {}", format, e),
        })?;

    let mut reader = probed.format;
    let track = reader
        .default_track()
        .ok_or_else(|| LivesubError::AudioDecode {
            message: format!("No audio track in {} container", format),
        })?;
    let track_id = track.id;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| LivesubError::AudioDecode {
            message: format!("Unsupported codec in {} container: {}", format, e),
        })?;

    let mut pcm = Vec::new();
    let mut source_rate = None;

    loop {
        let packet = match reader.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => {
                return Err(LivesubError::AudioDecode {
                    message: format!("Failed to read packet: {}", e),
                });
            }
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = decoder.decode(&packet).map_err(|e| LivesubError::AudioDecode {
            message: format!("Failed to decode packet: {}", e),
        })?;
        source_rate.get_or_insert(decoded.spec().rate);
        accumulate_mono(&decoded, &mut pcm);
    }

    let source_rate = source_rate.ok_or_else(|| LivesubError::AudioDecode {
        message: format!("No decodable audio in {} container", format),
    })?;

    let samples: Vec<i16> = pcm
        .iter()
        .map(|&v| (v.clamp(-1.0, 1.0) * 32767.0) as i16)
        .collect();
    Ok(resample(&samples, source_rate, SAMPLE_RATE))
}

/// Fold one decoded buffer into the running mono f32 stream.
fn accumulate_mono(decoded: &AudioBufferRef<'_>, out: &mut Vec<f32>) {
    match decoded {
        AudioBufferRef::U8(buf) => mix_planes(buf.planes().planes(), out),
        AudioBufferRef::U16(buf) => mix_planes(buf.planes().planes(), out),
        AudioBufferRef::U24(buf) => mix_planes(buf.planes().planes(), out),
        AudioBufferRef::U32(buf) => mix_planes(buf.planes().planes(), out),
        AudioBufferRef::S8(buf) => mix_planes(buf.planes().planes(), out),
        AudioBufferRef::S16(buf) => mix_planes(buf.planes().planes(), out),
        AudioBufferRef::S24(buf) => mix_planes(buf.planes().planes(), out),
        AudioBufferRef::S32(buf) => mix_planes(buf.planes().planes(), out),
        AudioBufferRef::F32(buf) => mix_planes(buf.planes().planes(), out),
        AudioBufferRef::F64(buf) => mix_planes(buf.planes().planes(), out),
    }
}

fn mix_planes<S>(planes: &[&[S]], out: &mut Vec<f32>)
where
    S: Sample,
    f32: FromSample<S>,
{
    if planes.is_empty() {
        return;
    }
    let channels = planes.len() as f32;
    for i in 0..planes[0].len() {
        let mut acc = 0.0f32;
        for plane in planes {
            acc += f32::from_sample(plane[i]);
        }
        out.push(acc / channels);
    }
}

/// Average interleaved frames down to one channel.
fn downmix(samples: Vec<i16>, channels: usize) -> Vec<i16> {
    if channels <= 1 {
        return samples;
    }
    samples
        .chunks_exact(channels)
        .map(|frame| {
            let sum: i32 = frame.iter().map(|&s| s as i32).sum();
            (sum / channels as i32) as i16
        })
        .collect()
}

/// Simple linear interpolation resampling.
fn resample(samples: &[i16], from_rate: u32, to_rate: u32) -> Vec<i16> {
    if from_rate == to_rate {
        return samples.to_vec();
    }

    let ratio = from_rate as f64 / to_rate as f64;
    let output_len = (samples.len() as f64 / ratio).ceil() as usize;

    (0..output_len)
        .map(|i| {
            let source_pos = i as f64 * ratio;
            let source_idx = source_pos.floor() as usize;
            let fraction = source_pos - source_idx as f64;

            if source_idx + 1 >= samples.len() {
                samples[source_idx]
            } else {
                let left = samples[source_idx] as f64;
                let right = samples[source_idx + 1] as f64;
                (left + (right - left) * fraction) as i16
            }
        })
        .collect()
}
