//! Local speaker output for the interactive loop
//!
//! Synthesized answers arrive as MP3; they are decoded to mono PCM and
//! drained through the default output device, blocking the loop until the
//! utterance finishes (the loop speaks one message at a time).

use std::io::Cursor;
use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::SampleRate;

use crate::{Error, Result};

/// Decoded utterance: mono samples at the stream's native rate
struct DecodedAudio {
    samples: Vec<f32>,
    sample_rate: u32,
}

/// Plays synthesized answers through the default output device
pub struct Speaker;

impl Speaker {
    /// Create a speaker, verifying an output device exists
    ///
    /// # Errors
    ///
    /// Returns error if no audio output device is available
    pub fn new() -> Result<Self> {
        cpal::default_host()
            .default_output_device()
            .ok_or_else(|| Error::Audio("no output device available".to_string()))?;
        Ok(Self)
    }

    /// Decode MP3 bytes and play them, blocking until drained
    ///
    /// # Errors
    ///
    /// Returns error if decoding fails or the device rejects the stream
    pub fn say(&self, mp3: &[u8]) -> Result<()> {
        let decoded = decode_mp3(mp3)?;
        if decoded.samples.is_empty() {
            return Ok(());
        }

        let device = cpal::default_host()
            .default_output_device()
            .ok_or_else(|| Error::Audio("no output device available".to_string()))?;

        let rate = SampleRate(decoded.sample_rate);
        let supported = device
            .supported_output_configs()
            .map_err(|e| Error::Audio(e.to_string()))?
            .find(|c| c.min_sample_rate() <= rate && c.max_sample_rate() >= rate)
            .ok_or_else(|| {
                Error::Audio(format!("no output config for {} Hz", decoded.sample_rate))
            })?;
        let config = supported.with_sample_rate(rate).config();
        let channels = config.channels as usize;

        tracing::debug!(
            device = device.name().unwrap_or_default(),
            sample_rate = decoded.sample_rate,
            channels,
            samples = decoded.samples.len(),
            "speaking answer"
        );

        let total = decoded.samples.len();
        let cursor = Arc::new(Mutex::new(0usize));
        let samples = Arc::new(decoded.samples);

        let cursor_cb = Arc::clone(&cursor);
        let samples_cb = Arc::clone(&samples);

        let stream = device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let mut pos = cursor_cb.lock().unwrap();
                    for frame in data.chunks_mut(channels) {
                        let sample = samples_cb.get(*pos).copied().unwrap_or(0.0);
                        frame.fill(sample);
                        if *pos < samples_cb.len() {
                            *pos += 1;
                        }
                    }
                },
                |err| {
                    tracing::error!(error = %err, "audio playback error");
                },
                None,
            )
            .map_err(|e| Error::Audio(e.to_string()))?;

        stream.play().map_err(|e| Error::Audio(e.to_string()))?;

        // Wait until the cursor drains, bounded by the utterance duration
        let duration_ms = (total as u64 * 1000) / u64::from(decoded.sample_rate);
        let deadline =
            std::time::Instant::now() + std::time::Duration::from_millis(duration_ms + 500);

        while *cursor.lock().unwrap() < total {
            if std::time::Instant::now() > deadline {
                tracing::warn!("playback deadline reached before drain");
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(50));
        }

        drop(stream);
        tracing::debug!(samples = total, "utterance complete");

        Ok(())
    }
}

/// Decode MP3 bytes to mono f32 samples
fn decode_mp3(data: &[u8]) -> Result<DecodedAudio> {
    let mut decoder = minimp3::Decoder::new(Cursor::new(data));
    let mut samples = Vec::new();
    let mut sample_rate = 0u32;

    loop {
        match decoder.next_frame() {
            Ok(frame) => {
                sample_rate = frame.sample_rate.unsigned_abs();

                if frame.channels == 2 {
                    // Stereo: average the channel pair
                    samples.extend(frame.data.chunks(2).map(|pair| {
                        let left = f32::from(pair[0]) / 32768.0;
                        let right = f32::from(pair.get(1).copied().unwrap_or(pair[0])) / 32768.0;
                        f32::midpoint(left, right)
                    }));
                } else {
                    samples.extend(frame.data.iter().map(|&s| f32::from(s) / 32768.0));
                }
            }
            Err(minimp3::Error::Eof) => break,
            Err(e) => return Err(Error::Audio(format!("MP3 decode error: {e}"))),
        }
    }

    Ok(DecodedAudio {
        samples,
        sample_rate,
    })
}
