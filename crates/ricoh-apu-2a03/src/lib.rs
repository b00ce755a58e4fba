//! Ricoh 2A03 APU.
//!
//! Two pulse channels, a triangle, a noise generator and a delta
//! modulation channel, clocked once per CPU cycle. Pulse and noise timers
//! only advance on even cycles. A frame sequencer divides the CPU clock
//! into quarter-frame (envelope, linear counter) and half-frame (length,
//! sweep) events and raises the frame IRQ in 4-step mode.
//!
//! The mixed output is averaged down to the host sample rate and pushed
//! into a lock-free single-producer/single-consumer ring. The consumer
//! side feeds its fill level back as a smoothed resample divisor, so the
//! producer speeds up or slows down to match whoever drains it.

#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]

mod apu;
mod channel;
mod config;
mod dmc;
mod frame;
mod mixer;
mod noise;
mod pulse;
mod ring;
mod triangle;

pub use apu::Apu;
pub use channel::{ChannelCore, Envelope, LENGTH_TABLE, Voice};
pub use config::{AudioConfig, AudioConfigError};
pub use dmc::Dmc;
pub use frame::{FrameClocks, FrameSequencer, SequencerMode};
pub use mixer::mix;
pub use noise::Noise;
pub use pulse::{Pulse, Sweep};
pub use ring::{AudioConsumer, AudioProducer, AudioStats, audio_ring};
pub use triangle::Triangle;
