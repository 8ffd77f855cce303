//! Escaping shared by the emitter and the readers of its output.

/// Escape text for a double-quoted HTML/JSX attribute.
pub fn html_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '{' => out.push_str("&#123;"),
            '}' => out.push_str("&#125;"),
            _ => out.push(c),
        }
    }
    out
}

/// Reverse of [`html_attr`].
pub fn html_attr_unescape(value: &str) -> String {
    value
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#123;", "{")
        .replace("&#125;", "}")
        .replace("&amp;", "&")
}

/// Make text safe inside a `/* ... */` comment.
pub fn comment(value: &str) -> String {
    value
        .replace("*/", "*\\/")
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect()
}

/// Reverse of [`comment`] for text without control characters.
pub fn comment_unescape(value: &str) -> String {
    value.replace("*\\/", "*/")
}

/// Quote text as a JSON string that is safe inside a `/* ... */` comment.
///
/// `*/` becomes `*\/`, which is still valid JSON, so the result reads back
/// exactly with [`read_comment_json`].
pub fn comment_json(value: &str) -> String {
    serde_json::Value::String(value.to_owned()).to_string().replace("*/", "*\\/")
}

/// Read one [`comment_json`] string from the start of `text`, returning it
/// with the rest of the text.
pub fn read_comment_json(text: &str) -> Option<(String, &str)> {
    let mut stream = serde_json::Deserializer::from_str(text).into_iter::<String>();
    let value = stream.next()?.ok()?;
    Some((value, &text[stream.byte_offset()..]))
}

/// Quote text as a CSS string.
pub fn css_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            c if c.is_control() => out.push(' '),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
