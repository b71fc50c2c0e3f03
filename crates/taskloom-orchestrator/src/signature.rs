use serde_json::Value;

/// Computes the repeat-detection signature for one tool call (spec §4.C).
///
/// For `write_file`/`edit_file` the signature is `tool:path` — content may
/// legitimately differ across retries of the same edit. For every other
/// tool it is `tool:canonicalized-args`, relying on `serde_json`'s
/// alphabetically-sorted object keys (no `preserve_order` feature) to make
/// the canonicalization deterministic.
pub fn action_signature(tool_name: &str, args: &Value) -> String {
    match tool_name {
        "write_file" | "edit_file" => {
            let path = args.get("path").and_then(|v| v.as_str()).unwrap_or("");
            format!("{tool_name}:{path}")
        }
        _ => format!("{tool_name}:{args}"),
    }
}
