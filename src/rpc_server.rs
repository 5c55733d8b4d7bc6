//! Tagmark RPC Server — JSON-RPC over stdin/stdout.
//!
//! Protocol: one JSON object per line (newline-delimited JSON).
//! Request:  {"id":1, "method":"bookmark.save", "params":{"url":"...","tags":"go,rust"}}
//! Response: {"id":1, "result":{...}} or {"id":1, "error":"..."}

use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use std::sync::Mutex;

use serde_json::{json, Value};
use tracing::{error, info};

use tagmark::app::App;
use tagmark::rpc_handler::handle_method;
use tagmark::services::settings_engine::SettingsEngineTrait;

/// Optional settings file path, else the platform default.
const CONFIG_ENV: &str = "TAGMARK_CONFIG";

fn respond(out: &mut impl Write, value: &Value) -> io::Result<()> {
    writeln!(out, "{}", value)?;
    out.flush()
}

fn main() -> ExitCode {
    let app = match App::new(std::env::var(CONFIG_ENV).ok()) {
        Ok(app) => app,
        Err(e) => {
            tagmark::logging::init("info");
            error!(error = %e, "failed to initialize tagmark");
            return ExitCode::FAILURE;
        }
    };
    tagmark::logging::init(&app.settings_engine.get_settings().log_level);
    info!(
        database = %app.settings_engine.get_settings().storage.database_path,
        "tagmark rpc server starting"
    );
    let app = Mutex::new(app);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let ready = json!({"event":"ready","version":env!("CARGO_PKG_VERSION")});
    if respond(&mut out, &ready).is_err() {
        return ExitCode::FAILURE;
    }

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<Value>(&line) {
            Ok(req) => {
                let id = req.get("id").cloned().unwrap_or(Value::Null);
                let method = req.get("method").and_then(|v| v.as_str()).unwrap_or("");
                let params = req.get("params").cloned().unwrap_or(json!({}));

                match handle_method(&app, method, &params) {
                    Ok(val) => json!({"id": id, "result": val}),
                    Err(err) => json!({"id": id, "error": err}),
                }
            }
            Err(e) => json!({"id": null, "error": format!("parse error: {}", e)}),
        };

        if respond(&mut out, &response).is_err() {
            break;
        }
    }

    info!("stdin closed, shutting down");
    ExitCode::SUCCESS
}
