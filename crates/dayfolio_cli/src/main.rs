//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `dayfolio_core` linkage with a deterministic probe.
//! - Optionally summarize a storage file: `dayfolio_cli [DB_PATH]`.

use dayfolio_core::{CalendarKind, JsonLogRepository, LogRepository, SqliteKeyValueStore};
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("dayfolio_core ping={}", dayfolio_core::ping());
    println!("dayfolio_core version={}", dayfolio_core::core_version());

    let Some(db_path) = std::env::args().nth(1) else {
        return ExitCode::SUCCESS;
    };

    match summarize(&db_path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("dayfolio_cli error={err}");
            ExitCode::FAILURE
        }
    }
}

fn summarize(db_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let repo = JsonLogRepository::new(SqliteKeyValueStore::open(db_path)?);
    let logs = repo.load_logs()?;

    println!("logs total={}", logs.len());
    for kind in CalendarKind::ALL {
        let count = logs.iter().filter(|log| log.calendar_kind() == kind).count();
        println!("logs calendar={kind} count={count}");
    }
    Ok(())
}
