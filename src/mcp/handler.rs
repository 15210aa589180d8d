use serde::Serialize;
use serde_json::Value;

use crate::assembler::StatsAssembler;
use crate::commands::render::{Overrides, run_render};
use crate::error::StatsError;
use crate::format::{format_bytes, format_duration};
use crate::mcp::protocol::ToolResult;
use crate::mcp::server::Session;
use crate::palette::ColorResolver;

/// Route a tools/call request to the appropriate tool.
/// Returns Err for unknown tools (protocol-level error), Ok for valid tools.
pub fn handle_tool_call(
    name: &str,
    arguments: &Value,
    session: &mut Session,
) -> Result<ToolResult, String> {
    match name {
        "render_stats" => Ok(handle_render_stats(arguments, session)),
        "build_series" => Ok(handle_build_series(arguments, session)),
        "format_bytes" => Ok(handle_format_bytes(arguments)),
        "format_duration" => Ok(handle_format_duration(arguments)),
        _ => Err(format!("Unknown tool: {name}")),
    }
}

fn to_json<T: Serialize>(value: &T) -> ToolResult {
    match serde_json::to_string_pretty(value) {
        Ok(json) => ToolResult::text(json),
        Err(e) => ToolResult::error(format!("Serialization error: {e}")),
    }
}

fn handle_render_stats(args: &Value, session: &mut Session) -> ToolResult {
    let Some(directory) = args.get("directory").and_then(Value::as_str) else {
        return ToolResult::error("Missing required parameter: directory".to_string());
    };
    let seed = args.get("seed").and_then(Value::as_u64);

    let mut config = session.config.clone();
    Overrides {
        percentage_labels: args
            .get("percentage_labels")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        codec_top_n: args
            .get("codec_top_n")
            .and_then(Value::as_u64)
            .map(|n| n as usize),
        keep_duplicates: false,
    }
    .apply(&mut config);

    match run_render(&mut session.dashboard, directory, &config, seed) {
        Ok(_) => to_json(&session.dashboard),
        Err(e) => ToolResult::error(e.to_string()),
    }
}

fn handle_build_series(args: &Value, session: &Session) -> ToolResult {
    let Some(category) = args.get("category").and_then(Value::as_str) else {
        return ToolResult::error("Missing required parameter: category".to_string());
    };
    let Some(payload) = args.get("payload") else {
        return ToolResult::error("Missing required parameter: payload".to_string());
    };
    let seed = args.get("seed").and_then(Value::as_u64);

    let colors = match seed {
        Some(seed) => ColorResolver::seeded(seed),
        None => ColorResolver::from_os_rng(),
    };
    let mut assembler = StatsAssembler::new(&session.config, colors);
    let fetched = Ok(payload.clone());
    let panel: Result<Value, StatsError> = match category {
        "resolution" => assembler.resolution(&fetched).map(|p| panel_json(&p)),
        "codec" => assembler.codec(&fetched).map(|p| panel_json(&p)),
        "hdr" => assembler.hdr(&fetched).map(|p| panel_json(&p)),
        "container" => assembler.container(&fetched).map(|p| panel_json(&p)),
        "storage" => assembler.storage(&fetched).map(|p| panel_json(&p)),
        other => {
            return ToolResult::error(format!(
                "Unknown category: {other} (expected resolution, codec, hdr, container or storage)"
            ));
        }
    };

    match panel {
        Ok(value) => to_json(&value),
        Err(e) => ToolResult::error(e.to_string()),
    }
}

fn panel_json<T: Serialize>(panel: &T) -> Value {
    serde_json::to_value(panel).unwrap_or(Value::Null)
}

fn handle_format_bytes(args: &Value) -> ToolResult {
    let Some(bytes) = args.get("bytes").and_then(Value::as_f64) else {
        return ToolResult::error("Missing required parameter: bytes".to_string());
    };
    let decimals = args
        .get("decimals")
        .and_then(Value::as_u64)
        .map_or(2, |d| usize::try_from(d).unwrap_or(usize::MAX));

    match format_bytes(bytes, decimals) {
        Ok(text) => ToolResult::text(text),
        Err(e) => ToolResult::error(e.to_string()),
    }
}

fn handle_format_duration(args: &Value) -> ToolResult {
    match args.get("ms").and_then(Value::as_u64) {
        Some(ms) => ToolResult::text(format_duration(ms)),
        None => ToolResult::error("Missing required parameter: ms".to_string()),
    }
}
