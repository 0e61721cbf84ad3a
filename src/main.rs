use std::env;
use std::fs;

use anyhow::{Context, Result, bail};
use nescore::cpu::trace;
use nescore::{Bus, Cartridge, Cpu, StepOutcome};

/// Stop runaway programs (cartridges rarely execute BRK).
const MAX_INSTRUCTIONS: usize = 100_000;

/// NROM-128 image that sums two numbers, stores the result at $0200 and
/// spins X through a full countdown before BRK.
fn demo_rom() -> Vec<u8> {
    const PROGRAM: &[u8] = &[
        0xA9, 0x10, // LDA #$10
        0x18, // CLC
        0x69, 0x05, // ADC #$05
        0x8D, 0x00, 0x02, // STA $0200
        0xA2, 0x08, // LDX #$08
        0xCA, // DEX
        0xD0, 0xFD, // BNE -3
        0x00, // BRK
    ];

    let mut rom = vec![0x4E, 0x45, 0x53, 0x1A, 1, 1, 0, 0];
    rom.resize(16, 0);

    let mut prg = vec![0xEA; 16 * 1024];
    prg[..PROGRAM.len()].copy_from_slice(PROGRAM);
    prg[0x3FFC..0x3FFE].copy_from_slice(&0x8000u16.to_le_bytes());
    rom.extend_from_slice(&prg);
    rom.resize(rom.len() + 8 * 1024, 0);
    rom
}

fn main() -> Result<()> {
    let rom = match env::args().nth(1) {
        Some(path) => fs::read(&path).with_context(|| format!("reading {}", path))?,
        None => demo_rom(),
    };
    let cart = Cartridge::from_ines_bytes(&rom).context("failed to parse iNES")?;

    let mut bus = Bus::with_cartridge(cart);
    let mut cpu = Cpu::new();
    cpu.reset(&mut bus).context("reset failed")?;

    let mut executed = 0;
    loop {
        if executed == MAX_INSTRUCTIONS {
            bail!("no BRK after {} instructions", MAX_INSTRUCTIONS);
        }
        println!("{}", trace(cpu.state(), &bus)?);
        let outcome = cpu
            .step(&mut bus)
            .with_context(|| format!("cpu fault after {} instructions", executed))?;
        executed += 1;
        if outcome == StepOutcome::Halted {
            break;
        }
    }

    println!();
    println!("halted after {} instructions at ${:04X}", executed, cpu.pc());
    println!(
        "A=${:02X} X=${:02X} Y=${:02X} SP=${:02X} P={:08b}",
        cpu.a(),
        cpu.x(),
        cpu.y(),
        cpu.sp(),
        cpu.status().bits()
    );
    println!("mem[$0200] = ${:02X}", bus.read(0x0200)?);
    Ok(())
}
