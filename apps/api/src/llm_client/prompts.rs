// Cross-cutting prompt fragments shared by the analysis prompts.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Joins a role-specific system prompt with the JSON-only fragment.
pub fn json_system(role: &str) -> String {
    format!("{role} {JSON_ONLY_SYSTEM}")
}

/// Fills `{name}` placeholders in a single pass.
///
/// Substituted values are never rescanned, so user text containing
/// `{placeholder}` markers is sent verbatim. Unknown markers and literal JSON
/// braces are left untouched.
pub fn render_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];

        let replacement = tail[1..].find('}').and_then(|end| {
            let name = &tail[1..1 + end];
            vars.iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value, end + 2))
        });

        match replacement {
            Some((value, consumed)) => {
                out.push_str(value);
                rest = &tail[consumed..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_template_replaces_every_occurrence() {
        let out = render_template("{a} and {a} then {b}", &[("a", "x"), ("b", "y")]);
        assert_eq!(out, "x and x then y");
    }

    #[test]
    fn test_render_template_leaves_json_braces() {
        let template = "Schema:\n{\n  \"score\": {score}\n}";
        let out = render_template(template, &[("score", "80")]);
        assert_eq!(out, "Schema:\n{\n  \"score\": 80\n}");
    }

    #[test]
    fn test_render_template_does_not_rescan_values() {
        let out = render_template("{jd}|{resume}", &[("jd", "{resume}"), ("resume", "R")]);
        assert_eq!(out, "{resume}|R");
    }

    #[test]
    fn test_json_system_appends_fragment() {
        let system = json_system("You are an analyst.");
        assert!(system.starts_with("You are an analyst."));
        assert!(system.ends_with(JSON_ONLY_SYSTEM));
    }
}
