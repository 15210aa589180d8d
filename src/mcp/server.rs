use std::io::{self, BufRead, Write};

use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::config::Config;
use crate::mcp::handler::handle_tool_call;
use crate::mcp::protocol::{
    INVALID_PARAMS, INVALID_REQUEST, JsonRpcRequest, JsonRpcResponse, METHOD_NOT_FOUND,
    PARSE_ERROR, ToolCallParams,
};
use crate::mcp::tools::tool_definitions;
use crate::refresh::Dashboard;

/// State kept across requests of one session.
pub struct Session {
    pub config: Config,
    pub dashboard: Dashboard,
}

impl Session {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            dashboard: Dashboard::new(),
        }
    }
}

/// Run the MCP JSON-RPC 2.0 server over stdin/stdout (newline-delimited).
pub fn run_mcp_server() {
    let config = Config::load(None).unwrap_or_else(|err| {
        warn!(%err, "falling back to default config");
        Config::default()
    });
    let mut session = Session::new(config);

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut stdout = stdout.lock();

    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let request: JsonRpcRequest = match serde_json::from_str(line) {
            Ok(r) => r,
            Err(e) => {
                let resp = JsonRpcResponse::error(None, PARSE_ERROR, format!("Parse error: {e}"));
                let _ = write_response(&mut stdout, &resp);
                continue;
            }
        };

        // notifications never get a response
        if request.id.is_none() {
            debug!(method = %request.method, "notification");
            continue;
        }

        let response = handle_request(&request, &mut session);
        let _ = write_response(&mut stdout, &response);
    }
}

fn write_response(stdout: &mut io::StdoutLock, response: &JsonRpcResponse) -> io::Result<()> {
    let json = serde_json::to_string(response)?;
    writeln!(stdout, "{json}")?;
    stdout.flush()
}

pub fn handle_request(request: &JsonRpcRequest, session: &mut Session) -> JsonRpcResponse {
    let id = request.id.clone();
    if request.jsonrpc != "2.0" {
        return JsonRpcResponse::error(
            id,
            INVALID_REQUEST,
            format!("Invalid request: unsupported jsonrpc version {:?}", request.jsonrpc),
        );
    }

    match request.method.as_str() {
        "initialize" => {
            let result = json!({
                "protocolVersion": "2024-11-05",
                "capabilities": {
                    "tools": {
                        "listChanged": false
                    }
                },
                "serverInfo": {
                    "name": "mediastats",
                    "version": env!("CARGO_PKG_VERSION")
                }
            });
            JsonRpcResponse::success(id, result)
        }

        "ping" => JsonRpcResponse::success(id, json!({})),

        "tools/list" => JsonRpcResponse::success(id, tool_definitions()),

        "tools/call" => {
            let Some(params) = &request.params else {
                return JsonRpcResponse::error(id, INVALID_PARAMS, "Missing params".to_string());
            };
            let params: ToolCallParams = match serde_json::from_value(params.clone()) {
                Ok(tc) => tc,
                Err(e) => {
                    return JsonRpcResponse::error(
                        id,
                        INVALID_PARAMS,
                        format!("Invalid params: {e}"),
                    );
                }
            };

            match handle_tool_call(&params.name, &params.arguments, session) {
                Ok(result) => {
                    let value: Value = serde_json::to_value(&result).unwrap_or(Value::Null);
                    JsonRpcResponse::success(id, value)
                }
                Err(msg) => JsonRpcResponse::error(id, INVALID_PARAMS, msg),
            }
        }

        _ => JsonRpcResponse::error(
            id,
            METHOD_NOT_FOUND,
            format!("Method not found: {}", request.method),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(text: &str) -> JsonRpcRequest {
        serde_json::from_str(text).unwrap()
    }

    #[test]
    fn test_unknown_method() {
        let mut session = Session::new(Config::default());
        let resp = handle_request(
            &request(r#"{"jsonrpc":"2.0","id":1,"method":"resources/list"}"#),
            &mut session,
        );
        assert_eq!(resp.error.unwrap().code, METHOD_NOT_FOUND);
    }

    #[test]
    fn test_wrong_version_rejected() {
        let mut session = Session::new(Config::default());
        let resp = handle_request(
            &request(r#"{"jsonrpc":"1.0","id":1,"method":"ping"}"#),
            &mut session,
        );
        assert_eq!(resp.error.unwrap().code, INVALID_REQUEST);
    }

    #[test]
    fn test_tools_call_without_params() {
        let mut session = Session::new(Config::default());
        let resp = handle_request(
            &request(r#"{"jsonrpc":"2.0","id":"a","method":"tools/call"}"#),
            &mut session,
        );
        assert_eq!(resp.id, Some(json!("a")));
        assert_eq!(resp.error.unwrap().code, INVALID_PARAMS);
    }
}
