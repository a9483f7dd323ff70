//! 模型回复中的 ACTIONS 块解析
//!
//! 回复格式：任意文字 + `ACTIONS: [ {...}, ... ]` + 任意文字。解析是宽松的：
//! - 没有标记（或标记后不是 `[`）：无动作，正文原样返回
//! - 数组有匹配的 `]` 且是合法 JSON：取其中的对象元素；非法 JSON：无动作，但块仍从正文中移除
//! - 找不到匹配的 `]`：无动作，正文原样返回
//!
//! 只处理第一个标记；永不返回错误。

use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Value};

/// 模型输出的一个动作：未做形状校验的 JSON 对象
pub type RawAction = Map<String, Value>;

pub const ACTIONS_MARKER: &str = "ACTIONS:";

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedReply {
    /// 去掉动作块后展示给用户的正文
    pub narrative: String,
    pub actions: Vec<RawAction>,
}

impl ParsedReply {
    fn unchanged(text: &str) -> Self {
        Self {
            narrative: text.to_string(),
            actions: Vec::new(),
        }
    }
}

fn marker_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(&format!(r"{}\s*\[", regex::escape(ACTIONS_MARKER))).ok())
        .as_ref()
}

/// 从 `open`（必须是 `[`）开始做字符串感知的括号匹配，返回对应 `]` 的字节下标
fn matching_bracket(text: &str, open: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(open) {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'[' => depth += 1,
            b']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// 拼接动作块前后的文字：被移除的空白里有换行则用换行，否则用一个空格
fn join_around(before: &str, after: &str) -> String {
    let head = before.trim_end();
    let tail = after.trim_start();
    let removed_newline = before[head.len()..].contains('\n')
        || after[..after.len() - tail.len()].contains('\n');

    let joined = if head.is_empty() || tail.is_empty() {
        format!("{head}{tail}")
    } else if removed_newline {
        format!("{head}\n{tail}")
    } else {
        format!("{head} {tail}")
    };
    joined.trim().to_string()
}

/// 解析模型回复，拆出正文与动作列表
pub fn parse_reply(text: &str) -> ParsedReply {
    let Some(marker) = marker_regex().and_then(|re| re.find(text)) else {
        return ParsedReply::unchanged(text);
    };

    // 正则以 `[` 结尾
    let open = marker.end() - 1;
    let Some(close) = matching_bracket(text, open) else {
        tracing::debug!("ACTIONS block has no closing bracket; leaving reply untouched");
        return ParsedReply::unchanged(text);
    };

    let actions = match serde_json::from_str::<Vec<Value>>(&text[open..=close]) {
        Ok(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect(),
        Err(e) => {
            tracing::debug!(error = %e, "Failed to parse ACTIONS JSON");
            Vec::new()
        }
    };

    ParsedReply {
        narrative: join_around(&text[..marker.start()], &text[close + 1..]),
        actions,
    }
}
