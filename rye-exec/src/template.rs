//! Context-variable (`{tool_path}`) and shell-style (`${VAR:-default}`)
//! template substitution (spec §4.E steps 2-3).

use std::collections::HashMap;

/// Substitute `{name}` and `${name:-default}` placeholders in `template`
/// against `vars`. Unresolved `{name}` placeholders with no default are
/// left untouched rather than erroring — templates may legitimately
/// reference variables only some callers populate.
pub fn substitute(template: &str, vars: &HashMap<String, String>) -> String {
    let chars: Vec<char> = template.chars().collect();
    let mut out = String::new();
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '$' && chars.get(i + 1) == Some(&'{') {
            if let Some(end) = find_close(&chars, i + 2) {
                let inner: String = chars[i + 2..end].iter().collect();
                let (name, default) = match inner.split_once(":-") {
                    Some((n, d)) => (n, Some(d)),
                    None => (inner.as_str(), None),
                };
                let resolved = vars
                    .get(name)
                    .cloned()
                    .or_else(|| default.map(str::to_string))
                    .unwrap_or_default();
                out.push_str(&resolved);
                i = end + 1;
                continue;
            }
        }
        if chars[i] == '{' {
            if let Some(end) = find_close(&chars, i + 1) {
                let name: String = chars[i + 1..end].iter().collect();
                if let Some(value) = vars.get(&name) {
                    out.push_str(value);
                    i = end + 1;
                    continue;
                }
            }
        }
        out.push(chars[i]);
        i += 1;
    }
    out
}

fn find_close(chars: &[char], start: usize) -> Option<usize> {
    chars[start..].iter().position(|&c| c == '}').map(|p| start + p)
}
