//! Peak meter handoff from the audio thread to the control thread.
//!
//! The audio thread overwrites one published snapshot after every block;
//! nothing is queued. Peaks are stored as f32 bits in atomics with a
//! sequence counter around each write, so a reader either sees a complete
//! snapshot or retries, never a mix of two blocks. The writer is
//! wait-free; the reader gives up after a few attempts and returns its
//! last consistent snapshot, which bounds it too.

use std::sync::atomic::{fence, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

/// Maximum channels the engine meters.
pub const MAX_METER_CHANNELS: usize = 8;

/// How many times the reader retries a torn read before falling back to
/// its previous snapshot.
const MAX_READ_ATTEMPTS: usize = 4;

/// One complete meter observation.
///
/// Peaks are instantaneous per-block maxima of the absolute sample value,
/// linear amplitude, `>= 0`. The version counts published blocks.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeterSnapshot {
    /// Peak per channel; entries beyond `channels` are 0.0.
    pub peaks: [f32; MAX_METER_CHANNELS],
    /// Number of live channels in this snapshot.
    pub channels: usize,
    /// Publish counter; increments once per published block.
    pub version: u64,
}

impl MeterSnapshot {
    /// An all-zero snapshot for `channels` channels.
    pub fn silent(channels: usize) -> Self {
        Self {
            peaks: [0.0; MAX_METER_CHANNELS],
            channels: channels.min(MAX_METER_CHANNELS),
            version: 0,
        }
    }

    /// Peak for one channel; 0.0 beyond the live channel count.
    pub fn peak(&self, ch: usize) -> f32 {
        if ch < self.channels {
            self.peaks[ch]
        } else {
            0.0
        }
    }
}

/// Shared storage behind the publisher/reader pair.
struct MeterCell {
    /// Sequence counter: odd while a write is in progress.
    seq: AtomicU64,
    /// Peak values as f32 bits.
    peaks: [AtomicU32; MAX_METER_CHANNELS],
    /// Live channel count, fixed for the session.
    channels: usize,
}

/// Creates a connected publisher/reader pair for a session with the given
/// channel count.
pub fn meter_channel(channels: usize) -> (MeterPublisher, MeterReader) {
    let channels = channels.min(MAX_METER_CHANNELS);
    let cell = Arc::new(MeterCell {
        seq: AtomicU64::new(0),
        peaks: std::array::from_fn(|_| AtomicU32::new(0.0f32.to_bits())),
        channels,
    });

    (
        MeterPublisher {
            cell: Arc::clone(&cell),
        },
        MeterReader {
            last: MeterSnapshot::silent(channels),
            cell,
        },
    )
}

/// Audio-thread side: overwrites the published snapshot after each block.
pub struct MeterPublisher {
    cell: Arc<MeterCell>,
}

impl MeterPublisher {
    /// Publishes the peaks for one block.
    ///
    /// Wait-free, allocation-free. Missing channels read as 0.0;
    /// non-finite inputs are published as 0.0 so a reader never sees NaN.
    pub fn publish(&self, peaks: &[f32]) {
        let cell = &*self.cell;
        let seq = cell.seq.load(Ordering::Relaxed);

        cell.seq.store(seq.wrapping_add(1), Ordering::Relaxed);
        fence(Ordering::Release);

        for ch in 0..cell.channels {
            let peak = peaks.get(ch).copied().unwrap_or(0.0);
            let peak = if peak.is_finite() { peak.abs() } else { 0.0 };
            cell.peaks[ch].store(peak.to_bits(), Ordering::Relaxed);
        }

        cell.seq.store(seq.wrapping_add(2), Ordering::Release);
    }
}

/// Control-thread side: reads the latest complete snapshot.
pub struct MeterReader {
    cell: Arc<MeterCell>,
    /// Last consistent snapshot, returned if reads keep tearing.
    last: MeterSnapshot,
}

impl MeterReader {
    /// Reads the latest complete snapshot.
    ///
    /// Retries at most a few times against a concurrent writer, then
    /// returns the previous consistent snapshot.
    pub fn read(&mut self) -> MeterSnapshot {
        let cell = &*self.cell;

        for _ in 0..MAX_READ_ATTEMPTS {
            let before = cell.seq.load(Ordering::Acquire);
            if (before & 1) == 1 {
                continue;
            }

            let mut peaks = [0.0f32; MAX_METER_CHANNELS];
            for ch in 0..cell.channels {
                peaks[ch] = f32::from_bits(cell.peaks[ch].load(Ordering::Relaxed));
            }

            fence(Ordering::Acquire);
            let after = cell.seq.load(Ordering::Relaxed);
            if before == after {
                self.last = MeterSnapshot {
                    peaks,
                    channels: cell.channels,
                    version: before >> 1,
                };
                break;
            }
        }

        self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_read_is_silent() {
        let (_publisher, mut reader) = meter_channel(2);
        let snap = reader.read();
        assert_eq!(snap, MeterSnapshot::silent(2));
        assert_eq!(snap.version, 0);
    }

    #[test]
    fn test_publish_then_read() {
        let (publisher, mut reader) = meter_channel(2);
        publisher.publish(&[0.5, 0.25]);

        let snap = reader.read();
        assert_eq!(snap.peak(0), 0.5);
        assert_eq!(snap.peak(1), 0.25);
        assert_eq!(snap.channels, 2);
        assert_eq!(snap.version, 1);
    }

    #[test]
    fn test_overwrite_keeps_only_latest() {
        let (publisher, mut reader) = meter_channel(1);
        publisher.publish(&[0.1]);
        publisher.publish(&[0.2]);
        publisher.publish(&[0.3]);

        let snap = reader.read();
        assert_eq!(snap.peak(0), 0.3);
        assert_eq!(snap.version, 3);
    }

    #[test]
    fn test_peak_beyond_channels_is_zero() {
        let (publisher, mut reader) = meter_channel(2);
        publisher.publish(&[0.9, 0.8]);

        let snap = reader.read();
        assert_eq!(snap.peak(2), 0.0);
        assert_eq!(snap.peak(7), 0.0);
    }

    #[test]
    fn test_short_publish_slice_zero_fills() {
        let (publisher, mut reader) = meter_channel(4);
        publisher.publish(&[0.5]);

        let snap = reader.read();
        assert_eq!(snap.peak(0), 0.5);
        assert_eq!(snap.peak(1), 0.0);
        assert_eq!(snap.peak(3), 0.0);
    }

    #[test]
    fn test_non_finite_peaks_sanitized() {
        let (publisher, mut reader) = meter_channel(2);
        publisher.publish(&[f32::NAN, f32::INFINITY]);

        let snap = reader.read();
        assert_eq!(snap.peak(0), 0.0);
        assert_eq!(snap.peak(1), 0.0);
    }

    #[test]
    fn test_channel_count_capped() {
        let (_publisher, mut reader) = meter_channel(32);
        assert_eq!(reader.read().channels, MAX_METER_CHANNELS);
    }

    #[test]
    fn test_sides_are_send() {
        fn assert_send<T: Send>() {}
        assert_send::<MeterPublisher>();
        assert_send::<MeterReader>();
    }
}
