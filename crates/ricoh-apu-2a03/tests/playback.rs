//! APU and ring driven together the way a frontend would: the emulation
//! side ticks a slice of CPU time, then the playback side pulls a matching
//! block of samples.

use emu_core::SimpleBus;
use ricoh_apu_2a03::{Apu, AudioConfig};

const CPU_HZ: u32 = 1_789_773;

fn tone(apu: &mut Apu) {
    apu.write(0x4017, 0x40);
    apu.write(0x4015, 0x0F);
    apu.write(0x4000, 0xBF);
    apu.write(0x4002, 0xFD);
    apu.write(0x4003, 0x08);
    apu.write(0x4008, 0xFF);
    apu.write(0x400A, 0x80);
    apu.write(0x400B, 0x08);
}

#[test]
fn steady_playback_keeps_ring_near_target() {
    let config = AudioConfig::default();
    let mut apu = Apu::new(&config);
    let mut consumer = apu.take_consumer().expect("consumer available");
    let mut memory = SimpleBus::new();
    tone(&mut apu);

    let mut block = [0i16; 441];
    for _ in 0..200 {
        for _ in 0..CPU_HZ / 100 {
            apu.tick(&mut memory);
        }
        assert_eq!(consumer.drain(&mut block), block.len());
    }

    let stats = apu.audio_stats();
    assert_eq!(stats.overruns, 0);
    assert_eq!(stats.underruns, 0);
    let drift = (stats.buffered as f64 - config.ideal_occupancy()).abs();
    assert!(drift < 50.0, "buffered {}", stats.buffered);
    let ratio = stats.divisor / config.base_divisor();
    assert!((ratio - 1.0).abs() < 0.01, "divisor ratio {ratio}");
}

#[test]
fn stalled_consumer_overruns() {
    let config = AudioConfig {
        capacity: 9000,
        ..AudioConfig::default()
    };
    let mut apu = Apu::new(&config);
    let mut memory = SimpleBus::new();
    for _ in 0..CPU_HZ / 10 {
        apu.tick(&mut memory);
    }
    let stats = apu.audio_stats();
    assert_eq!(stats.buffered, 9000);
    assert!(stats.overruns > 4000);
}

#[test]
fn starved_consumer_holds_last_sample() {
    let mut apu = Apu::default();
    let mut consumer = apu.take_consumer().expect("consumer available");
    let mut memory = SimpleBus::new();
    tone(&mut apu);

    let mut prefill = vec![0i16; 8820];
    consumer.drain(&mut prefill);
    for _ in 0..400 {
        apu.tick(&mut memory);
    }

    let mut block = [0i16; 64];
    let got = consumer.drain(&mut block);
    assert!(got < block.len());
    assert!(block[got..].iter().all(|&s| s == block[got - 1]));
    assert_eq!(consumer.stats().underruns, (block.len() - got) as u64);
}

#[test]
fn emptied_ring_speeds_production_up_instead_of_stopping() {
    let config = AudioConfig {
        smoothing: 1.0,
        ..AudioConfig::default()
    };
    let mut apu = Apu::new(&config);
    let mut consumer = apu.take_consumer().expect("consumer available");
    let mut memory = SimpleBus::new();
    tone(&mut apu);

    let mut prefill = vec![0i16; 8820];
    consumer.drain(&mut prefill);
    let mut one = [0i16; 1];
    consumer.drain(&mut one);
    let floor = config.base_divisor() / 2.0;
    assert!((apu.audio_stats().divisor - floor).abs() < 1e-9);

    for _ in 0..CPU_HZ / 10 {
        apu.tick(&mut memory);
    }
    // Twice the nominal 4410 samples for 0.1 s at half the base divisor.
    let produced = consumer.buffered();
    assert!(produced > 8000, "only {produced} samples produced");
}
