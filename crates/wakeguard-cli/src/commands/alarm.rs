use chrono::NaiveDate;
use clap::Subcommand;
use wakeguard_core::alarm::{Alarm, Difficulty, TaskKind};
use wakeguard_core::audio::NullSink;
use wakeguard_core::clock::Period;
use wakeguard_core::controller::Controller;
use wakeguard_core::storage::{Config, Store};

#[derive(Subcommand)]
pub enum AlarmAction {
    /// Add a new alarm
    Add {
        /// 12-hour time, HH:mm (hour 1-12)
        time: String,
        /// AM or PM
        #[arg(value_parser = parse_period)]
        period: Period,
        /// Alarm label
        #[arg(long, default_value = "Alarm")]
        label: String,
        /// Weekday indices 0=Mon..6=Sun, comma separated; omit for every day
        #[arg(long, value_delimiter = ',')]
        days: Vec<u8>,
        /// Exact date (YYYY-MM-DD) for a one-shot alarm
        #[arg(long, conflicts_with = "days")]
        date: Option<NaiveDate>,
        /// Verification task: Math, Shake, QR, Memory, Sequence
        #[arg(long, default_value = "Math", value_parser = parse_task)]
        task: TaskKind,
        /// Difficulty: Easy, Medium, Hard
        #[arg(long, default_value = "Medium", value_parser = parse_difficulty)]
        difficulty: Difficulty,
        /// Sound name or custom-sound id; defaults to the stored default
        #[arg(long)]
        sound: Option<String>,
    },
    /// List alarms as JSON
    List,
    /// Edit fields of an existing alarm
    Edit {
        id: String,
        /// 12-hour time, HH:mm (hour 1-12)
        #[arg(long)]
        time: Option<String>,
        /// AM or PM
        #[arg(long, value_parser = parse_period)]
        period: Option<Period>,
        #[arg(long)]
        label: Option<String>,
        /// Weekday indices 0=Mon..6=Sun, comma separated; clears any date
        #[arg(long, value_delimiter = ',')]
        days: Option<Vec<u8>>,
        /// Exact date (YYYY-MM-DD); clears the weekday set
        #[arg(long, conflicts_with = "days")]
        date: Option<NaiveDate>,
        #[arg(long, value_parser = parse_task)]
        task: Option<TaskKind>,
        #[arg(long, value_parser = parse_difficulty)]
        difficulty: Option<Difficulty>,
        #[arg(long)]
        sound: Option<String>,
    },
    /// Flip one alarm's active flag
    Toggle {
        id: String,
    },
    /// Activate or deactivate every alarm
    ToggleAll {
        #[arg(long)]
        active: bool,
    },
    /// Delete an alarm
    Remove {
        id: String,
    },
}

fn parse_period(value: &str) -> Result<Period, String> {
    match value.to_ascii_uppercase().as_str() {
        "AM" => Ok(Period::Am),
        "PM" => Ok(Period::Pm),
        other => Err(format!("expected AM or PM, got '{other}'")),
    }
}

fn parse_task(value: &str) -> Result<TaskKind, String> {
    match value.to_ascii_lowercase().as_str() {
        "math" => Ok(TaskKind::Math),
        "shake" => Ok(TaskKind::Shake),
        "qr" => Ok(TaskKind::Qr),
        "memory" => Ok(TaskKind::Memory),
        "sequence" => Ok(TaskKind::Sequence),
        other => Err(format!(
            "expected Math, Shake, QR, Memory or Sequence, got '{other}'"
        )),
    }
}

fn parse_difficulty(value: &str) -> Result<Difficulty, String> {
    match value.to_ascii_lowercase().as_str() {
        "easy" => Ok(Difficulty::Easy),
        "medium" => Ok(Difficulty::Medium),
        "hard" => Ok(Difficulty::Hard),
        other => Err(format!("expected Easy, Medium or Hard, got '{other}'")),
    }
}

pub fn run(action: AlarmAction) -> Result<(), Box<dyn std::error::Error>> {
    let store = Store::open()?;
    let config = Config::load_or_default();
    let mut controller = Controller::new(store, config, Box::new(NullSink));

    match action {
        AlarmAction::Add {
            time,
            period,
            label,
            days,
            date,
            task,
            difficulty,
            sound,
        } => {
            let sound =
                sound.unwrap_or_else(|| controller.settings().default_sound.clone());
            let mut alarm = Alarm::new(time, period, label, task, difficulty, sound);
            if alarm.parse_time().is_none() {
                return Err(format!("invalid time '{}', expected HH:mm with hour 1-12", alarm.time).into());
            }
            if days.iter().any(|&d| d > 6) {
                return Err("weekday indices run from 0 (Mon) to 6 (Sun)".into());
            }
            alarm.days = days;
            alarm.date = date;
            println!("{}", serde_json::to_string_pretty(&alarm)?);
            controller.add_alarm(alarm);
        }
        AlarmAction::List => {
            println!("{}", serde_json::to_string_pretty(controller.alarms())?);
        }
        AlarmAction::Edit {
            id,
            time,
            period,
            label,
            days,
            date,
            task,
            difficulty,
            sound,
        } => {
            let mut alarm = controller
                .alarms()
                .iter()
                .find(|a| a.id == id)
                .cloned()
                .ok_or_else(|| format!("no alarm with id {id}"))?;
            if let Some(time) = time {
                alarm.time = time;
            }
            if let Some(period) = period {
                alarm.period = period;
            }
            if let Some(label) = label {
                alarm.label = label;
            }
            if let Some(days) = days {
                if days.iter().any(|&d| d > 6) {
                    return Err("weekday indices run from 0 (Mon) to 6 (Sun)".into());
                }
                alarm.days = days;
                alarm.date = None;
            }
            if let Some(date) = date {
                alarm.date = Some(date);
                alarm.days.clear();
            }
            if let Some(task) = task {
                alarm.task = task;
            }
            if let Some(difficulty) = difficulty {
                alarm.difficulty = difficulty;
            }
            if let Some(sound) = sound {
                alarm.sound = sound;
            }
            if alarm.parse_time().is_none() {
                return Err(format!(
                    "invalid time '{}', expected HH:mm with hour 1-12",
                    alarm.time
                )
                .into());
            }
            println!("{}", serde_json::to_string_pretty(&alarm)?);
            controller.update_alarm(alarm);
        }
        AlarmAction::Toggle { id } => match controller.toggle_alarm(&id) {
            Some(active) => println!("{{\"id\": \"{id}\", \"active\": {active}}}"),
            None => return Err(format!("no alarm with id {id}").into()),
        },
        AlarmAction::ToggleAll { active } => {
            controller.set_all_alarms(active);
            println!("{}", serde_json::to_string_pretty(controller.alarms())?);
        }
        AlarmAction::Remove { id } => {
            if !controller.delete_alarm(&id) {
                return Err(format!("no alarm with id {id}").into());
            }
            println!("{{\"deleted\": \"{id}\"}}");
        }
    }
    Ok(())
}
