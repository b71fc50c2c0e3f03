use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

/// The single tool call parsed out of one FM turn.
#[derive(Debug, Clone)]
pub struct ParsedCall {
    pub tool_name: String,
    pub tool_args: Value,
    pub raw: String,
}

fn tool_call_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<tool_call>(.*?)</tool_call>").unwrap())
}

/// Extract the first `<tool_call>{...}</tool_call>` block from the FM's raw
/// output. Yields an empty `tool_name` if none is found or the JSON inside
/// is malformed — the orchestrator treats that as a parse failure, never an
/// exception (spec §4.B, §7).
pub fn parse_tool_call(raw: &str) -> ParsedCall {
    let Some(captures) = tool_call_regex().captures(raw) else {
        return ParsedCall {
            tool_name: String::new(),
            tool_args: Value::Null,
            raw: raw.to_string(),
        };
    };

    let body = captures.get(1).map(|m| m.as_str()).unwrap_or("");
    let parsed: Option<Value> = serde_json::from_str(body.trim()).ok();

    let (tool_name, tool_args) = match parsed {
        Some(Value::Object(map)) => {
            let name = map
                .get("tool")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_default();
            let args = map.get("args").cloned().unwrap_or(Value::Null);
            (name, args)
        }
        _ => (String::new(), Value::Null),
    };

    ParsedCall {
        tool_name,
        tool_args,
        raw: raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_tool_call() {
        let raw = r#"I'll write the file now.
<tool_call>{"tool": "write_file", "args": {"path": "hello.txt", "content": "hi"}}</tool_call>"#;
        let parsed = parse_tool_call(raw);
        assert_eq!(parsed.tool_name, "write_file");
        assert_eq!(parsed.tool_args["path"], "hello.txt");
    }

    #[test]
    fn missing_tool_call_yields_empty_name() {
        let parsed = parse_tool_call("I am thinking about this task.");
        assert_eq!(parsed.tool_name, "");
    }

    #[test]
    fn malformed_json_inside_block_yields_empty_name() {
        let parsed = parse_tool_call("<tool_call>{not json}</tool_call>");
        assert_eq!(parsed.tool_name, "");
    }

    #[test]
    fn takes_first_block_when_multiple_present() {
        let raw = "<tool_call>{\"tool\": \"a\", \"args\": {}}</tool_call> and then \
                    <tool_call>{\"tool\": \"b\", \"args\": {}}</tool_call>";
        let parsed = parse_tool_call(raw);
        assert_eq!(parsed.tool_name, "a");
    }
}
