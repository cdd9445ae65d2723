use core::mem::size_of;
use core::ops::Range;
use std::error::Error;
use std::time::Instant;

use probe_rs::config::{MemoryRegion, RamRegion};
use probe_rs::MemoryInterface;
use probe_rs::Session;

use shared_types::{find_log, EventKind, TraceEntry};

const DEFAULT_CHIP: &str = "stm32f103c8";

fn get_ram(sesh: &Session) -> Option<Range<u32>> {
    for mem in sesh.memory_map() {
        match mem {
            MemoryRegion::Ram(RamRegion { range, .. }) => return Some(range.clone()),
            _ => (),
        }
    }
    None
}

fn describe(entry: &TraceEntry) -> String {
    let event = match entry.event() {
        Ok(event) => event,
        Err(e) => return format!("{:>10} undecodable entry: {:?}", entry.tick, e),
    };
    let arg: u8 = event.arg.into();
    let what = match event.kind {
        EventKind::Press => format!("press   key {} (0x{:02x})", arg, event.code),
        EventKind::Release => format!("release key {} (0x{:02x})", arg, event.code),
        EventKind::BreakPrefix => "break prefix".to_string(),
        EventKind::Ignored => format!("ignored 0x{:02x}", event.code),
        EventKind::IgnoredBreak => format!("ignored break of 0x{:02x}", event.code),
        EventKind::BadFrame => {
            let why = match arg {
                0 => "start bit",
                1 => "stop bit",
                _ => "parity",
            };
            format!("bad frame, {} (data 0x{:02x})", why, event.code)
        }
        EventKind::Resync => format!("resync, dropped {} bits", arg),
    };
    format!("{:>10} {}", entry.tick, what)
}

// The whole of RAM is 20KiB on the blue pill, which the debugger reads in
// a little under a second. The trace log is a fraction of that, but we
// don't know where the linker put it, so read everything and look for the
// magic word.
fn main() -> Result<(), Box<dyn Error>> {
    let chip = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CHIP.to_string());
    let mut sesh = Session::auto_attach(chip.as_str())?;
    let ram = get_ram(&sesh).ok_or("target has no RAM region")?;
    let mut core = sesh.core(0)?;
    let mut buf = vec![0; ram.len() / size_of::<u32>()];
    let before = Instant::now();
    core.read_32(ram.start, &mut buf)?;
    let duration = before.elapsed();
    eprintln!("Slurped {} bytes in {:?}", ram.len(), duration);

    let log = find_log(&buf).ok_or("no trace log in RAM")?;
    eprintln!(
        "Trace log at {:#010x}, {} events recorded, {} dropped",
        ram.start as usize + log.offset * size_of::<u32>(),
        log.recorded(),
        log.dropped()
    );
    for entry in log.entries() {
        println!("{}", describe(&entry));
    }
    Ok(())
}
