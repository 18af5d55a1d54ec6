//! Plain-text rendering of tracker results for chat or terminal output.

use statwatch_core::Deltas;
use statwatch_core::DiffReport;
use statwatch_core::PlayerStatus;
use statwatch_core::RankedEntry;
use statwatch_core::TrackOutcome;

/// Group digits in threes: `1234567` → `1,234,567`.
pub fn thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    if value < 0 {
        out.insert(0, '-');
    }
    out
}

fn signed(value: i64) -> String {
    if value >= 0 {
        format!("+{}", thousands(value))
    } else {
        thousands(value)
    }
}

fn deltas_line(d: &Deltas) -> String {
    format!(
        "stats {}, net worth {}, money earned {}, drugs {}, refills {}, revives {}",
        signed(d.total_stats),
        signed(d.net_worth),
        signed(d.money_earned),
        signed(d.drugs_used),
        signed(d.refills),
        signed(d.revives),
    )
}

/// One line per tracking outcome.
pub fn outcome(o: &TrackOutcome) -> String {
    match &o.result {
        Ok(p) => match &p.report {
            DiffReport::FirstObservation => format!(
                "{}: first observation stored ({} total stats)",
                p.key,
                thousands(p.snapshot.total_stats)
            ),
            DiffReport::Compared { deltas, age } => {
                format!("{}: {} since {age}", p.key, deltas_line(deltas))
            }
        },
        Err(e) => format!("{}: {e}", o.input),
    }
}

pub fn ranking(entries: &[RankedEntry], metric: &str) -> String {
    let mut out = String::new();
    for (i, e) in entries.iter().enumerate() {
        out.push_str(&format!(
            "{:>3}. {} {metric} {}\n",
            i + 1,
            e.entity_key,
            thousands(e.value)
        ));
    }
    out
}

pub fn status(name: &str, s: &PlayerStatus) -> String {
    if s.details.is_empty() {
        format!("{name}: {}", s.description)
    } else {
        format!("{name}: {} ({})", s.description, s.details)
    }
}
