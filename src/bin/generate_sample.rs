//! Writes a synthetic data file where the viewer expects the download, so the
//! chart can be tried without server access.

use anyhow::{Context, Result};
use chrono::{Duration, Local, NaiveDateTime, Timelike};
use serde::Serialize;

use ac_activity_viewer::config::Settings;
use ac_activity_viewer::data::loader::FIELD_DELIMITER;
use ac_activity_viewer::data::model::TIMESTAMP_FORMAT;

const DAYS: i64 = 60;
const INTERVAL_MINUTES: i64 = 15;
/// Every n-th row gets a broken timestamp or value.
const BROKEN_EVERY: usize = 997;

#[derive(Serialize)]
struct Row {
    id: usize,
    time_from: String,
    time_to: String,
    ac_measurements_active_percent: String,
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }
}

/// Activity follows a working-day curve: low at night, peaking mid-afternoon.
fn activity(at: NaiveDateTime, rng: &mut SimpleRng) -> f64 {
    let hour = at.hour() as f64 + at.minute() as f64 / 60.0;
    let phase = (hour - 9.0) / 24.0 * std::f64::consts::TAU;
    let base = 45.0 + 35.0 * phase.sin();
    let noise = (rng.next_f64() - 0.5) * 10.0;
    (base + noise).clamp(0.0, 100.0)
}

fn main() -> Result<()> {
    let settings = Settings::default();
    let mut rng = SimpleRng::new(42);

    let end = Local::now()
        .naive_local()
        .with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .context("truncating current time")?;
    let step = Duration::minutes(INTERVAL_MINUTES);
    let mut at = end - Duration::days(DAYS);

    std::fs::create_dir_all(&settings.data_dir)
        .with_context(|| format!("creating {}", settings.data_dir.display()))?;
    let path = settings.data_file();
    let mut writer = csv::WriterBuilder::new()
        .delimiter(FIELD_DELIMITER)
        .from_path(&path)
        .with_context(|| format!("creating {}", path.display()))?;

    let mut id = 0usize;
    while at <= end {
        id += 1;
        let value = format!("{:.2}", activity(at, &mut rng)).replace('.', ",");
        let mut row = Row {
            id,
            time_from: at.format(TIMESTAMP_FORMAT).to_string(),
            time_to: (at + step).format(TIMESTAMP_FORMAT).to_string(),
            ac_measurements_active_percent: value,
        };
        if id % BROKEN_EVERY == 0 {
            row.time_from = "n/a".to_string();
        } else if id % BROKEN_EVERY == 1 && id > 1 {
            row.ac_measurements_active_percent = "--".to_string();
        }
        writer.serialize(&row).context("writing row")?;
        at += step;
    }
    writer.flush().context("flushing output")?;

    println!("Wrote {id} rows to {}", path.display());
    Ok(())
}
