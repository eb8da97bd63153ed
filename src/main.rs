use classconnectd::{ipc, logging, DeriveConfig};
use std::io::{self, BufRead, Write};

fn main() -> anyhow::Result<()> {
    logging::init_logging();

    let config = DeriveConfig::from_env();
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        overdue_status = ?config.overdue_status,
        count_missing_as_zero = config.count_missing_as_zero,
        "classconnectd ready"
    );
    let mut state = ipc::AppState::new(config);

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(e) => {
                tracing::error!("stdin read failed: {e}");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // Can't reply without id.
                tracing::warn!("dropping malformed request: {e}");
                let resp = serde_json::json!({
                    "ok": false,
                    "error": { "code": "bad_json", "message": e.to_string() }
                });
                writeln!(stdout, "{}", resp)?;
                stdout.flush()?;
                continue;
            }
        };

        let resp = ipc::handle_request(&mut state, req);
        writeln!(stdout, "{}", resp)?;
        stdout.flush()?;
    }
    Ok(())
}
