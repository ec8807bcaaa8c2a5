//! woodshed CLI — headless practice tools.
//!
//! Usage:
//!   woodshed metronome <bpm> [--seconds N] [--tick click.wav]
//!   woodshed metronome ramp <start> <finish> <minutes> [--no-stop]
//!   woodshed stopwatch <seconds> [--chime secs]
//!   woodshed notes

use std::io::Write;
use std::time::Duration;

use ws_audio::CpalClick;
use ws_core::{format_elapsed, MonotonicClock, SystemClock};
use ws_master::{FileStore, Toolkit, ToolkitEvent};

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(String::as_str).unwrap_or_else(|| {
        eprintln!("Usage: woodshed <metronome|stopwatch|notes> ...");
        std::process::exit(1);
    });

    let mut toolkit = open_toolkit();
    match CpalClick::new() {
        Ok(output) => toolkit.attach_audio(output),
        Err(e) => eprintln!("Audio unavailable ({}), continuing silently", e),
    }

    match command {
        "metronome" => run_metronome(&mut toolkit, &args[2..]),
        "stopwatch" => run_stopwatch(&mut toolkit, &args[2..]),
        "notes" => run_notes(&mut toolkit),
        other => {
            eprintln!("Unknown command: {}", other);
            std::process::exit(1);
        }
    }

    toolkit.save();
}

fn open_toolkit() -> Toolkit<FileStore, CpalClick> {
    let path = std::env::var("WOODSHED_SETTINGS")
        .unwrap_or_else(|_| String::from("woodshed.conf"));
    let seed = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0);
    Toolkit::new(FileStore::open(path), seed)
}

fn flag_value(args: &[String], flag: &str) -> Option<String> {
    args.iter().position(|a| a == flag).and_then(|i| args.get(i + 1)).cloned()
}

fn run_metronome(toolkit: &mut Toolkit<FileStore, CpalClick>, args: &[String]) {
    let seconds: f64 = flag_value(args, "--seconds")
        .and_then(|s| s.parse().ok())
        .unwrap_or(30.0);

    if let Some(path) = flag_value(args, "--tick") {
        match std::fs::read(&path) {
            Ok(bytes) => match ws_formats::load_wav(&bytes, &path) {
                Ok(sound) => toolkit.set_tick_sound(sound),
                Err(e) => eprintln!("Ignoring {}: {}", path, e),
            },
            Err(e) => eprintln!("Failed to read {}: {}", path, e),
        }
    }

    match args.first().map(String::as_str) {
        Some("ramp") => {
            let start: i32 = args.get(1).and_then(|s| s.parse().ok()).unwrap_or(60);
            let finish: i32 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(120);
            let minutes: f64 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(5.0);
            toolkit.configure_ramp(start, finish, minutes);
            toolkit.set_stop_at_finish(!args.iter().any(|a| a == "--no-stop"));
            toolkit.set_advanced_active(true);
            println!(
                "Ramp: {} -> {} BPM over {} min",
                toolkit.metronome.ramp().start_bpm,
                toolkit.metronome.ramp().finish_bpm,
                minutes
            );
        }
        Some(value) if !value.starts_with("--") => {
            let bpm: i32 = value.parse().unwrap_or_else(|_| {
                eprintln!("Not a tempo: {}", value);
                std::process::exit(1);
            });
            toolkit.set_advanced_active(false);
            toolkit.set_metronome_bpm(bpm);
        }
        _ => {}
    }

    println!("Metronome at {} BPM. Playing...", toolkit.metronome.bpm());

    let wall = SystemClock::new();
    let mut beats = 0u32;
    handle_events(toolkit.start_metronome(&wall), &mut beats, toolkit);

    let end = wall.now_ms() + seconds * 1000.0;
    while wall.now_ms() < end && toolkit.metronome.is_running() {
        std::thread::sleep(Duration::from_millis(10));
        let events = toolkit.pump(&wall);
        handle_events(events, &mut beats, toolkit);
    }
    toolkit.stop_metronome();
    println!("\rDone after {} beats.      ", beats);
}

fn handle_events(
    events: Vec<ToolkitEvent>,
    beats: &mut u32,
    toolkit: &Toolkit<FileStore, CpalClick>,
) {
    for event in events {
        if let ToolkitEvent::Flash { .. } = event {
            *beats += 1;
            print!("\rBeat {:4} | {} BPM", beats, toolkit.metronome.bpm());
            let _ = std::io::stdout().flush();
        }
    }
}

fn run_stopwatch(toolkit: &mut Toolkit<FileStore, CpalClick>, args: &[String]) {
    let seconds: f64 = args
        .first()
        .and_then(|s| s.parse().ok())
        .unwrap_or(10.0);
    let wall = SystemClock::new();

    if let Some(chime) = flag_value(args, "--chime").and_then(|s| s.parse().ok()) {
        toolkit.set_chime_interval(Some(chime), &wall);
    }

    toolkit.toggle_stopwatch(&wall);
    println!("Stopwatch running for {} s...", seconds);

    let end = wall.now_ms() + seconds * 1000.0;
    while wall.now_ms() < end {
        std::thread::sleep(Duration::from_millis(50));
        for event in toolkit.pump(&wall) {
            if event == ToolkitEvent::Chime {
                println!("\rchime!                    ");
            }
        }
        print!("\r{}", format_elapsed(toolkit.stopwatch.elapsed_ms(wall.now_ms())));
        let _ = std::io::stdout().flush();
    }

    toolkit.toggle_stopwatch(&wall);
    println!("\r{}", format_elapsed(toolkit.stopwatch.elapsed_ms(wall.now_ms())));
}

fn run_notes(toolkit: &mut Toolkit<FileStore, CpalClick>) {
    for note in toolkit.notes.generate() {
        print!("{:6} ", note);
    }
    println!();
}
