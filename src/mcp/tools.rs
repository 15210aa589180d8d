use serde_json::{Value, json};

/// Return the list of tools with their JSON Schema definitions.
pub fn tool_definitions() -> Value {
    json!({
        "tools": [
            {
                "name": "render_stats",
                "description": "Refresh the dashboard from a directory of saved library summaries (stats.json, resolution.json, codec.json, hdr.json, container.json, top_animes_*.json) and return every panel: chart series with colours, totals, shares and rankings. Panels without usable data come back as empty with a reason.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "directory": {
                            "type": "string",
                            "description": "Directory holding the summary files"
                        },
                        "seed": {
                            "type": "integer",
                            "description": "Seed for generated colours of unknown labels"
                        },
                        "percentage_labels": {
                            "type": "boolean",
                            "description": "Append the share of the total to distribution labels",
                            "default": false
                        },
                        "codec_top_n": {
                            "type": "integer",
                            "description": "Number of codecs to chart",
                            "default": 5
                        }
                    },
                    "required": ["directory"]
                }
            },
            {
                "name": "build_series",
                "description": "Build one chart from a raw backend payload. The payload holds the distribution either as a list of records or as a label-to-count mapping.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "category": {
                            "type": "string",
                            "description": "Which chart the payload feeds",
                            "enum": ["resolution", "codec", "hdr", "container", "storage"]
                        },
                        "payload": {
                            "type": "object",
                            "description": "Backend response body, e.g. {\"distribution\": {\"1080p\": 120}}"
                        },
                        "seed": {
                            "type": "integer",
                            "description": "Seed for generated colours of unknown labels"
                        }
                    },
                    "required": ["category", "payload"]
                }
            },
            {
                "name": "format_bytes",
                "description": "Format a byte count with 1024-based units (Bytes, KB, MB, GB, ...).",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "bytes": {
                            "type": "number",
                            "description": "Non-negative byte count"
                        },
                        "decimals": {
                            "type": "integer",
                            "description": "Digits after the decimal point (at most 20)",
                            "default": 2,
                            "maximum": 20
                        }
                    },
                    "required": ["bytes"]
                }
            },
            {
                "name": "format_duration",
                "description": "Format milliseconds as hours, minutes and seconds (e.g. \"2 Std. 0 Min. 0 Sek.\").",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "ms": {
                            "type": "integer",
                            "description": "Duration in milliseconds"
                        }
                    },
                    "required": ["ms"]
                }
            }
        ]
    })
}
