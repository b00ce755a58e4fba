//! Sample ring between the emulation thread and the audio callback.
//!
//! The producer half lives inside the APU. The consumer half is handed to
//! whoever plays or records the audio. The consumer measures how full the
//! ring is on every drain and publishes a smoothed resample divisor that
//! the producer picks up on its next sample boundary.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use ringbuf::{
    HeapCons, HeapProd, HeapRb,
    traits::{Consumer, Observer, Producer, Split},
};
use tracing::{debug, trace};

use crate::AudioConfig;

/// Furthest the published divisor may move from its base value, as a
/// factor in either direction.
const DIVISOR_RANGE: f64 = 2.0;

#[derive(Debug)]
struct Shared {
    /// `f64` bits of the current CPU-cycles-per-sample divisor.
    divisor_bits: AtomicU64,
    overruns: AtomicU64,
    underruns: AtomicU64,
}

impl Shared {
    fn divisor(&self) -> f64 {
        f64::from_bits(self.divisor_bits.load(Ordering::Relaxed))
    }
}

/// Snapshot of ring health.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioStats {
    /// Samples dropped because the ring was full.
    pub overruns: u64,
    /// Samples the consumer had to invent because the ring was empty.
    pub underruns: u64,
    /// Current resample divisor in CPU cycles per sample.
    pub divisor: f64,
    /// Samples waiting in the ring.
    pub buffered: usize,
}

/// Emulation-side half of the ring.
pub struct AudioProducer {
    inner: HeapProd<i16>,
    shared: Arc<Shared>,
}

impl AudioProducer {
    /// Queue one sample. When the ring is full the sample is dropped and
    /// counted as an overrun; returns whether it was queued.
    pub fn push(&mut self, sample: i16) -> bool {
        if self.inner.try_push(sample).is_ok() {
            true
        } else {
            let total = self.shared.overruns.fetch_add(1, Ordering::Relaxed) + 1;
            trace!(total, "audio ring overrun");
            false
        }
    }

    /// Divisor most recently published by the consumer.
    #[must_use]
    pub fn divisor(&self) -> f64 {
        self.shared.divisor()
    }

    #[must_use]
    pub fn stats(&self) -> AudioStats {
        AudioStats {
            overruns: self.shared.overruns.load(Ordering::Relaxed),
            underruns: self.shared.underruns.load(Ordering::Relaxed),
            divisor: self.shared.divisor(),
            buffered: self.inner.occupied_len(),
        }
    }
}

/// Playback-side half of the ring.
pub struct AudioConsumer {
    inner: HeapCons<i16>,
    shared: Arc<Shared>,
    base_divisor: f64,
    ideal_occupancy: f64,
    smoothing: f64,
    rolling: f64,
    last: i16,
}

impl AudioConsumer {
    /// Fill `out` from the ring and update the shared divisor.
    ///
    /// Returns how many samples came from the ring. Any shortfall is padded
    /// with the last sample played and counted as underruns.
    pub fn drain(&mut self, out: &mut [i16]) -> usize {
        let occupied = self.inner.occupied_len() as f64;
        let next = self.smoothing * self.base_divisor * (occupied / self.ideal_occupancy)
            + (1.0 - self.smoothing) * self.rolling;
        self.rolling = if next.is_nan() {
            self.base_divisor
        } else {
            next.clamp(
                self.base_divisor / DIVISOR_RANGE,
                self.base_divisor * DIVISOR_RANGE,
            )
        };
        self.shared
            .divisor_bits
            .store(self.rolling.to_bits(), Ordering::Relaxed);

        let popped = self.inner.pop_slice(out);
        if popped > 0 {
            self.last = out[popped - 1];
        }
        let missing = out.len() - popped;
        if missing > 0 {
            out[popped..].fill(self.last);
            self.shared
                .underruns
                .fetch_add(missing as u64, Ordering::Relaxed);
            trace!(missing, "audio ring underrun");
        }
        popped
    }

    /// Samples waiting in the ring.
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.inner.occupied_len()
    }

    #[must_use]
    pub fn stats(&self) -> AudioStats {
        AudioStats {
            overruns: self.shared.overruns.load(Ordering::Relaxed),
            underruns: self.shared.underruns.load(Ordering::Relaxed),
            divisor: self.rolling,
            buffered: self.inner.occupied_len(),
        }
    }
}

/// Build a ring per `config`, pre-filled with silence up to the ideal
/// occupancy so playback starts at the steering target.
#[must_use]
pub fn audio_ring(config: &AudioConfig) -> (AudioProducer, AudioConsumer) {
    let capacity = config.capacity.max(1);
    let (mut producer, consumer) = HeapRb::<i16>::new(capacity).split();

    let prefill = (config.ideal_occupancy() as usize).min(capacity);
    for _ in 0..prefill {
        let _ = producer.try_push(0);
    }

    let base = config.base_divisor();
    let shared = Arc::new(Shared {
        divisor_bits: AtomicU64::new(base.to_bits()),
        overruns: AtomicU64::new(0),
        underruns: AtomicU64::new(0),
    });
    debug!(capacity, prefill, divisor = base, "audio ring created");

    (
        AudioProducer {
            inner: producer,
            shared: Arc::clone(&shared),
        },
        AudioConsumer {
            inner: consumer,
            shared,
            base_divisor: base,
            ideal_occupancy: config.ideal_occupancy().max(1.0),
            smoothing: config.smoothing,
            rolling: base,
            last: 0,
        },
    )
}
