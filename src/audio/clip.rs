//! In-memory audio clips
//!
//! A clip is the product of one capture: encoded WAV bytes plus
//! metadata. Duration is read from the container when possible and
//! falls back to the wall-clock capture length when the bytes cannot
//! be parsed.

use std::io::Cursor;
use std::time::Duration;

use chrono::{DateTime, Utc};
use symphonia::core::codecs::CODEC_TYPE_NULL;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use uuid::Uuid;

/// One recorded audio clip, held in memory until saved or discarded.
#[derive(Debug, Clone)]
pub struct AudioClip {
    pub id: Uuid,
    /// Encoded audio (WAV for fresh captures; saved notes may hold
    /// whatever format they were stored with)
    pub data: Vec<u8>,
    pub duration: Duration,
    pub created_at: DateTime<Utc>,
}

impl AudioClip {
    /// Wrap encoded bytes, probing the container for the duration and
    /// falling back to `measured` (the wall-clock capture length) if
    /// the probe fails.
    pub fn from_encoded(data: Vec<u8>, measured: Duration) -> Self {
        let duration = probe_duration(&data).unwrap_or_else(|| {
            tracing::debug!("Container duration probe failed, using wall-clock length");
            measured
        });

        Self {
            id: Uuid::new_v4(),
            data,
            duration,
            created_at: Utc::now(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Probe encoded audio for its duration by decoding packet timestamps.
///
/// Works on any container symphonia can read (WAV, MP3). Returns
/// `None` when the format is unrecognised or the track carries no
/// timing information.
pub fn probe_duration(data: &[u8]) -> Option<Duration> {
    if data.is_empty() {
        return None;
    }

    let cursor = Cursor::new(data.to_vec());
    let mss = MediaSourceStream::new(Box::new(cursor), Default::default());

    let probed = symphonia::default::get_probe()
        .format(
            &Hint::new(),
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .ok()?;

    let mut format = probed.format;
    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)?;

    let track_id = track.id;
    let sample_rate = track.codec_params.sample_rate?;
    let time_base = track.codec_params.time_base;

    // Prefer the declared frame count; fall back to summing packet
    // durations for headerless streams.
    if let Some(n_frames) = track.codec_params.n_frames {
        return Some(Duration::from_secs_f64(n_frames as f64 / sample_rate as f64));
    }

    let time_base = time_base?;
    let mut total_ts = 0u64;
    while let Ok(packet) = format.next_packet() {
        if packet.track_id() == track_id {
            total_ts = total_ts.saturating_add(packet.dur());
        }
    }

    let time = time_base.calc_time(total_ts);
    Some(Duration::from_secs_f64(time.seconds as f64 + time.frac))
}
