//! The grounding prompt.
//!
//! Every question is asked with the same fixed instructions.

/// Sentinel rendered into the prompt when retrieval produced nothing.
pub const NO_CONTEXT: &str = "NO_CONTEXT";

/// Canned answer for questions the transcript does not cover.
pub const NOT_DISCUSSED: &str = "This topic is not discussed in the video.";

/// Prompt template with exactly two placeholders: `{{context}}` and `{{question}}`.
pub const GROUNDING_TEMPLATE: &str = r#"
You are a helpful assistant.
Answer ONLY from the provided transcript context.
If the context is insufficient, just say: "This topic is not discussed in the video."

### CONTEXT FROM VIDEO TRANSCRIPT:
{{context}}

### IMPORTANT INSTRUCTIONS:
- If CONTEXT is "NO_CONTEXT", respond exactly with: "This topic is not discussed in the video."
- Do NOT guess or use outside knowledge.
- Be concise.

### Question: {{question}}

### Answer:
"#;

/// Render the grounding prompt.
pub fn render_grounding_prompt(context: &str, question: &str) -> String {
    render(GROUNDING_TEMPLATE, &[("context", context), ("question", question)])
}

/// Substitute `{{name}}` placeholders in a single left-to-right pass.
///
/// Substituted values are never rescanned, so a transcript containing
/// `{{question}}` stays literal. Unknown placeholders are kept as-is.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find("{{") {
        out.push_str(&rest[..open]);
        let after_open = &rest[open + 2..];
        match after_open.find("}}") {
            Some(close) => {
                let name = &after_open[..close];
                match vars.iter().find(|(key, _)| *key == name) {
                    Some((_, value)) => out.push_str(value),
                    None => {
                        out.push_str("{{");
                        out.push_str(name);
                        out.push_str("}}");
                    }
                }
                rest = &after_open[close + 2..];
            }
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}
