//! The foreground enforcement loop.
//!
//! One tokio interval drives the scheduler tick once per second while
//! stdin lines are multiplexed in for verification input. While ringing,
//! the only lines that do anything are task input and (when enabled)
//! `snooze <minutes>`; quitting is refused until the task is solved.

use chrono::{Local, Utc};
use tokio::io::{AsyncBufReadExt, BufReader};

use wakeguard_core::clock::tick_interval;
use wakeguard_core::controller::Controller;
use wakeguard_core::events::Event;
use wakeguard_core::storage::{Config, Store};
use wakeguard_core::task::{FlipOutcome, MemoryTask, VerificationTask};
use wakeguard_core::trigger::TriggerState;

use crate::sink::TerminalSink;

const CAUTION_TEXT: &str = "\
CAUTION: Wakeguard enforces wake-ups. Once an alarm rings, the volume
escalates to maximum and stays there until you complete the verification
task. Snoozing is only available when emergency dismiss is enabled.
Type 'accept' to continue or 'quit' to exit.";

enum Flow {
    Continue,
    Quit,
}

pub fn run(ring: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let store = Store::open()?;
    let config = Config::load_or_default();
    let snooze_choices = config.snooze.minute_choices.clone();
    let controller = Controller::new(store, config, Box::new(TerminalSink::new()));

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run_loop(controller, snooze_choices, ring))
}

async fn run_loop(
    mut controller: Controller,
    snooze_choices: Vec<u32>,
    ring: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    // First-run disclaimer gate.
    if !controller.settings().caution_accepted {
        println!("{CAUTION_TEXT}");
        loop {
            let Some(line) = lines.next_line().await? else {
                return Ok(());
            };
            match line.trim() {
                "accept" => {
                    controller.accept_caution();
                    println!("Accepted.");
                    break;
                }
                "quit" | "exit" => return Ok(()),
                _ => println!("Type 'accept' to continue or 'quit' to exit."),
            }
        }
    }

    // A terminal session has no autoplay restriction to wait out.
    controller.user_gesture();

    if let Some(id) = ring {
        match controller.ring_now(&id, Local::now()) {
            Some(event) => print_event(&controller, &event),
            None => eprintln!("no alarm with id {id}"),
        }
    }

    println!(
        "Watching {} alarm(s). Type 'help' for commands.",
        controller.alarms().len()
    );

    let mut interval = tick_interval();

    loop {
        tokio::select! {
            _ = interval.tick() => {
                if let Some(event) = controller.tick(Local::now()) {
                    print_event(&controller, &event);
                }
            }
            line = lines.next_line() => {
                match line? {
                    Some(text) => {
                        controller.user_gesture();
                        if matches!(
                            handle_line(&mut controller, text.trim(), &snooze_choices),
                            Flow::Quit
                        ) {
                            return Ok(());
                        }
                    }
                    None => return Ok(()),
                }
            }
        }
    }
}

fn handle_line(controller: &mut Controller, line: &str, snooze_choices: &[u32]) -> Flow {
    match controller.trigger_state() {
        TriggerState::Idle => match line {
            "quit" | "exit" => return Flow::Quit,
            "help" => print_idle_help(snooze_choices),
            "status" => print_status(controller),
            "" => {}
            other => println!("unknown command '{other}'; type 'help'"),
        },
        TriggerState::Ringing => ringing_input(controller, line, snooze_choices),
    }
    Flow::Continue
}

fn ringing_input(controller: &mut Controller, line: &str, snooze_choices: &[u32]) {
    if line == "quit" || line == "exit" {
        println!("No escape: finish the task to silence the alarm.");
        return;
    }
    if let Some(rest) = line.strip_prefix("snooze") {
        match rest.trim().parse::<u32>() {
            Ok(minutes) if snooze_choices.contains(&minutes) => {
                match controller.snooze(minutes, Utc::now()) {
                    Ok(event) => print_event(controller, &event),
                    Err(err) => println!("{err}"),
                }
            }
            _ => println!("usage: snooze <minutes>, one of {snooze_choices:?}"),
        }
        return;
    }

    if let Some(task) = controller.task_mut() {
        match task {
            VerificationTask::Math(math) => {
                if line.is_empty() {
                    println!("{} = ?", math.prompt());
                } else if math.answer(line) {
                    println!("Correct.");
                } else {
                    println!("Wrong. {} = ?", math.prompt());
                }
            }
            VerificationTask::Shake(shake) => {
                // Every line, even empty, counts as one shake gesture.
                shake.shake();
                println!("Shakes: {}/{}", shake.count(), shake.target());
            }
            VerificationTask::Memory(memory) => {
                match line.strip_prefix("flip").and_then(|r| r.trim().parse::<usize>().ok()) {
                    Some(index) => {
                        match memory.flip(index) {
                            FlipOutcome::Matched => println!("Pair!"),
                            FlipOutcome::Mismatched => println!("No match."),
                            FlipOutcome::Revealed => {}
                            FlipOutcome::Ignored => println!("Can't flip that card."),
                        }
                        println!("{}", render_memory(memory));
                    }
                    None => println!("usage: flip <card index>\n{}", render_memory(memory)),
                }
            }
            VerificationTask::Sequence(sequence) => {
                let tapped = line.strip_prefix("tap").map(str::trim).unwrap_or(line);
                match tapped.parse::<u32>() {
                    Ok(number) => {
                        if sequence.tap(number) {
                            if !sequence.satisfied() {
                                println!("{number} down, next {}", sequence.reached() + 1);
                            }
                        } else {
                            println!("Out of order; progress reset. Start from 1.");
                        }
                    }
                    Err(_) => println!("usage: tap <number>  board: {:?}", sequence.order()),
                }
            }
            VerificationTask::Qr(qr) => {
                if line == "scan" {
                    qr.confirm();
                } else {
                    println!("Type 'scan' once the registered code has been scanned.");
                }
            }
        }
    }

    if let Some(event) = controller.complete_task(Utc::now()) {
        print_event(controller, &event);
    }
}

fn print_event(controller: &Controller, event: &Event) {
    match event {
        Event::AlarmTriggered { label, .. } => {
            println!("\n=== ALARM: {label} ===");
            println!("{}", task_instructions(controller));
        }
        Event::RingingEscalated { elapsed_secs, volume, max_intensity, .. } => {
            // A status line every ten seconds is enough for a terminal.
            if elapsed_secs % 10 == 0 {
                if *max_intensity {
                    println!("MAX INTENSITY: ringing for {elapsed_secs}s");
                } else {
                    println!(
                        "Ringing for {elapsed_secs}s (volume {:.0}%)",
                        volume * 100.0
                    );
                }
            }
        }
        Event::AlarmSnoozed { minutes, due, .. } => {
            println!(
                "Snoozed {minutes}m; ringing again at {}",
                due.with_timezone(&Local).format("%H:%M:%S")
            );
        }
        Event::WakeVerified {
            elapsed_secs,
            current_streak,
            best_streak,
            total_wakes,
            ..
        } => {
            println!("\n=== WAKE VERIFIED after {elapsed_secs}s ===");
            println!(
                "Streak: {current_streak} day(s), best {best_streak}, total wakes {total_wakes}"
            );
        }
    }
}

fn task_instructions(controller: &Controller) -> String {
    let Some(session) = controller.session() else {
        return String::new();
    };
    match &session.task {
        VerificationTask::Math(math) => {
            format!("Solve to silence: {} = ?  (type the answer)", math.prompt())
        }
        VerificationTask::Shake(shake) => format!(
            "Shake the phone: press Enter {} times ({} done)",
            shake.target(),
            shake.count()
        ),
        VerificationTask::Memory(memory) => {
            format!("Match all pairs with 'flip <n>':\n{}", render_memory(memory))
        }
        VerificationTask::Sequence(sequence) => format!(
            "Tap 1..{} in order with 'tap <n>'  board: {:?}",
            sequence.order().len(),
            sequence.order()
        ),
        VerificationTask::Qr(_) => {
            "Scan the registered code, then type 'scan'.".to_string()
        }
    }
}

fn render_memory(memory: &MemoryTask) -> String {
    memory
        .cards()
        .iter()
        .enumerate()
        .map(|(i, card)| {
            if card.face_up || card.matched {
                format!("[{i}:{}]", card.symbol)
            } else {
                format!("[{i}:?]")
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn print_idle_help(snooze_choices: &[u32]) {
    println!("idle commands: status, help, quit");
    println!("while ringing: type task input; 'snooze <m>' with m in {snooze_choices:?} (if enabled)");
    println!("task input: math answer, Enter to shake, 'flip <n>', 'tap <n>', 'scan'");
}

fn print_status(controller: &Controller) {
    let stats = controller.stats();
    let active = controller.alarms().iter().filter(|a| a.active).count();
    println!(
        "{active}/{} alarms active; streak {} (best {}), {} total wakes",
        controller.alarms().len(),
        stats.current_streak,
        stats.best_streak,
        stats.total_wakes
    );
}
