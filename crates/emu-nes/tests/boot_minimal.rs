//! Console boot and scenario tests against ROM images built in memory.

use emu_core::{Cpu, Observable, Value};
use emu_nes::{Nes, NesConfig, NesError};
use mos_6502::CpuError;
use nes_cartridge::LoadError;
use ricoh_apu_2a03::AudioConfigError;

/// NROM-256 image: `code` at $8000, reset/NMI/IRQ vectors as given.
fn build_rom(code: &[u8], nmi: u16, irq: u16) -> Vec<u8> {
    let prg_size = 0x8000;
    let mut rom = vec![0u8; 16 + prg_size + 0x2000];
    rom[0..4].copy_from_slice(b"NES\x1a");
    rom[4] = 2;
    rom[5] = 1;
    rom[16..16 + code.len()].copy_from_slice(code);

    let vectors = 16 + 0x7FFA;
    rom[vectors..vectors + 2].copy_from_slice(&nmi.to_le_bytes());
    rom[vectors + 2..vectors + 4].copy_from_slice(&0x8000u16.to_le_bytes());
    rom[vectors + 4..vectors + 6].copy_from_slice(&irq.to_le_bytes());
    rom
}

fn boot(code: &[u8]) -> Nes {
    Nes::new(&NesConfig::new(build_rom(code, 0x8000, 0x8000))).expect("valid ROM")
}

#[test]
fn lda_sta_brk_scenario() {
    // LDA #$05; STA $2000; BRK
    let mut nes = boot(&[0xA9, 0x05, 0x8D, 0x00, 0x20, 0x00]);
    for _ in 0..3 {
        nes.step().expect("step");
    }
    assert_eq!(nes.cpu().regs.a, 5);
    assert_eq!(nes.bus().ppu.register(0), 5, "$2000 routed to PPUCTRL");
    assert!(!nes.is_running());
    assert_eq!(nes.step(), Ok(0), "halted CPU does nothing");
}

#[test]
fn apu_status_scenario_through_cpu() {
    // LDA #$01; STA $4015; LDA #$08; STA $4003; LDA $4015; BRK
    let mut nes = boot(&[
        0xA9, 0x01, 0x8D, 0x15, 0x40, 0xA9, 0x08, 0x8D, 0x03, 0x40, 0xAD, 0x15, 0x40, 0x00,
    ]);
    nes.run_frame().expect("frame");
    assert_eq!(nes.cpu().regs.a, 0x01);
    assert_eq!(nes.query("apu.pulse1.length"), Some(Value::U8(254)));
}

#[test]
fn vblank_poll_loop_exits_when_status_set() {
    let code: &[u8] = &[
        0x78, // SEI
        0xD8, // CLD
        0xA2, 0xFF, // LDX #$FF
        0x9A, // TXS
        0xAD, 0x02, 0x20, // vblank1: LDA $2002
        0x10, 0xFB, //          BPL vblank1
        0xAD, 0x02, 0x20, // vblank2: LDA $2002
        0x10, 0xFB, //          BPL vblank2
        0x4C, 0x0F, 0x80, // idle: JMP $800F
    ];
    let mut nes = boot(code);
    for _ in 0..20 {
        nes.step().expect("step");
    }
    assert!((0x8005..0x800A).contains(&nes.cpu().pc()), "spinning on vblank1");
    assert_eq!(nes.cpu().regs.s, 0xFF);

    for _ in 0..2 {
        nes.bus_mut().ppu.set_status(0x80);
        for _ in 0..10 {
            nes.step().expect("step");
        }
    }
    assert_eq!(nes.cpu().pc(), 0x800F, "reached idle loop");
}

#[test]
fn queued_nmi_vectors_and_returns() {
    // $8000: JMP $8000   $8010: INX; RTI
    let mut code = vec![0xEA; 0x20];
    code[0..3].copy_from_slice(&[0x4C, 0x00, 0x80]);
    code[0x10..0x12].copy_from_slice(&[0xE8, 0x40]);
    let mut nes = Nes::new(&NesConfig::new(build_rom(&code, 0x8010, 0x8000))).expect("ROM");

    nes.step().expect("jmp");
    nes.queue_nmi();
    assert_eq!(nes.step(), Ok(7));
    assert_eq!(nes.cpu().pc(), 0x8010);
    nes.step().expect("inx");
    nes.step().expect("rti");
    assert_eq!(nes.cpu().pc(), 0x8000);
    assert_eq!(nes.cpu().regs.x, 1);

    nes.queue_nmi();
    nes.clear_nmi();
    nes.step().expect("jmp");
    assert_eq!(nes.cpu().pc(), 0x8000, "cleared NMI is not serviced");
}

#[test]
fn opcode_storm_jams_until_reset() {
    let code = vec![0x02; 0x100];
    let mut nes = boot(&code);
    for _ in 1..mos_6502::DEFAULT_OPCODE_BUDGET {
        assert_eq!(nes.step(), Ok(2));
    }
    assert_eq!(
        nes.step(),
        Err(NesError::Cpu(CpuError::OpcodeStorm {
            opcode: 0x02,
            pc: 0x8031,
            streak: 50,
        }))
    );
    assert!(matches!(nes.step(), Err(NesError::Cpu(CpuError::Jammed { .. }))));

    nes.reset();
    assert_eq!(nes.cpu().pc(), 0x8000);
    assert_eq!(nes.step(), Ok(2));
}

#[test]
fn custom_opcode_budget() {
    let mut config = NesConfig::new(build_rom(&[0x02; 8], 0x8000, 0x8000));
    config.opcode_budget = 3;
    let mut nes = Nes::new(&config).expect("ROM");
    nes.step().expect("1");
    nes.step().expect("2");
    assert!(nes.step().is_err());
}

#[test]
fn pulse_program_produces_audio() {
    // Pulse 1 at ~440 Hz, 50% duty, constant volume 15, then spin.
    let code: &[u8] = &[
        0xA9, 0x01, 0x8D, 0x15, 0x40, // enable pulse 1
        0xA9, 0xBF, 0x8D, 0x00, 0x40, // duty/volume
        0xA9, 0xFD, 0x8D, 0x02, 0x40, // period low
        0xA9, 0x08, 0x8D, 0x03, 0x40, // length + period high
        0x4C, 0x14, 0x80, // JMP $8014
    ];
    let mut nes = boot(code);
    for _ in 0..10 {
        nes.run_frame().expect("frame");
    }
    let buffered = nes.audio_stats().buffered;
    assert!(buffered > 8820 + 7000, "buffered {buffered}");

    let mut samples = vec![0i16; buffered];
    assert_eq!(nes.drain_audio(&mut samples), buffered);
    let fresh = &samples[8820..];
    assert!(fresh.iter().any(|&s| s > 1000));
    assert!(fresh.iter().any(|&s| s == 0));
}

#[test]
fn dmc_reads_sample_from_prg() {
    // One sample byte of all ones at $C000, fastest DMC rate.
    let mut code = vec![0xEA; 0x4001];
    code[0..16].copy_from_slice(&[
        0xA9, 0x0F, 0x8D, 0x10, 0x40, // $4010 = rate 15
        0xA9, 0x10, 0x8D, 0x15, 0x40, // enable DMC
        0x4C, 0x0A, 0x80, // JMP $800A
        0xEA, 0xEA, 0xEA,
    ]);
    code[0x4000] = 0xFF;
    let mut nes = boot(&code);
    nes.run_frame().expect("frame");
    assert_eq!(nes.query("apu.dmc.level"), Some(Value::U8(16)));
}

#[test]
fn bad_magic_is_a_load_error() {
    let mut rom = build_rom(&[0xEA], 0x8000, 0x8000);
    rom[3] = 0x00;
    assert!(matches!(
        Nes::new(&NesConfig::new(rom)),
        Err(NesError::Load(LoadError::BadMagic(_)))
    ));
}

#[test]
fn unsupported_mapper_is_a_load_error() {
    let mut rom = build_rom(&[0xEA], 0x8000, 0x8000);
    rom[6] = 0x40; // mapper 4
    assert!(matches!(
        Nes::new(&NesConfig::new(rom)),
        Err(NesError::Load(LoadError::UnsupportedMapper(4)))
    ));
}

#[test]
fn truncated_image_is_a_load_error() {
    let rom = build_rom(&[0xEA], 0x8000, 0x8000);
    let short = &rom[..rom.len() - 1];
    assert!(matches!(
        Nes::new(&NesConfig::new(short.to_vec())),
        Err(NesError::Load(LoadError::Truncated { .. }))
    ));
}

#[test]
fn out_of_range_smoothing_is_rejected() {
    let rom = build_rom(&[0xEA], 0x8000, 0x8000);
    let mut config = NesConfig::new(rom);
    config.audio.smoothing = 1.0;
    assert!(matches!(
        Nes::new(&config),
        Err(NesError::Audio(AudioConfigError::Smoothing(_)))
    ));
}
