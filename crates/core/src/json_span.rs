//! A small two-rule parser for locating a JSON object inside model output.
//!
//! Models asked for JSON-only output frequently wrap it in a fenced code
//! block or surround it with prose. Rule 1: take the body of the first
//! fenced block. Rule 2: take the longest balanced-brace span, tracking
//! string literals and escapes so braces inside strings don't count.
//!
//! Failure is `None`, never a panic — the caller decides what an absent
//! span means.

/// Locate the most plausible JSON object span in `text`.
pub fn extract(text: &str) -> Option<&str> {
    fenced_block(text).or_else(|| balanced_braces(text))
}

/// Rule 1: the body of the first ``` fence (with or without a language tag).
fn fenced_block(text: &str) -> Option<&str> {
    let start = text.find("```")?;
    let after = &text[start + 3..];
    // Skip the opening-fence line (language tag like "json", or nothing).
    let body_start = after.find('\n')? + 1;
    let body = &after[body_start..];
    let end = body.find("```")?;
    let span = body[..end].trim();
    if span.is_empty() { None } else { Some(span) }
}

/// Rule 2: the longest top-level `{...}` span.
fn balanced_braces(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    let mut best: Option<(usize, usize)> = None;
    let mut depth_stack: Vec<usize> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth_stack.push(i),
            b'}' => {
                if let Some(open) = depth_stack.pop()
                    && depth_stack.is_empty()
                {
                    let longer = best.is_none_or(|(o, e)| e - o < i + 1 - open);
                    if longer {
                        best = Some((open, i + 1));
                    }
                }
            }
            _ => {}
        }
    }

    best.map(|(open, end)| &text[open..end])
}
