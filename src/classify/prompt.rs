use crate::vectordb::RetrievedPassage;

pub const CLASSIFY_SYSTEM: &str = r#"You are a geo-compliance triage assistant.
Return STRICT JSON only that matches this schema:

{
  "needs_geo_logic": "yes|no|unclear",
  "reasoning": "comprehensive reasoning grounded in the provided context",
  "laws": [
    {"name":"...", "region":"...", "article_or_section":"...", "source":"..."}
  ],
  "confidence": 0.0,
  "provenance": {"rules_hit":[], "retrieved_law_ids":[]}
}

Rules:
- Consider ONLY legal obligations (not business experiments or A/B/geofencing without legal basis).
- If unsure, set "needs_geo_logic" to "unclear".
- Do not invent laws. Use only what is inferable from the feature text and the provided law context.
- Output MUST be valid JSON (no extra text, no code fences)."#;

const RESPONSE_SCHEMA: &str = r#"Respond with STRICT JSON only following this schema:
{
  "needs_geo_logic": "yes|no|unclear",
  "reasoning": "comprehensive reasoning grounded in the provided context",
  "laws": [
    {"name":"...", "region":"...", "article_or_section":"...", "source":"..."}
  ],
  "confidence": 0-1,
  "provenance": {"rules_hit":[], "retrieved_law_ids":[]}
}"#;

/// Renders passages as numbered citations.
///
/// ```text
/// [1] Section 3 — Utah Social Media Regulation Act | US-UT | 13-63-103
/// <excerpt>
/// ```
pub fn format_context(passages: &[RetrievedPassage]) -> String {
    let mut blocks = Vec::with_capacity(passages.len());

    for (i, passage) in passages.iter().enumerate() {
        let meta = &passage.metadata;
        let title = meta.title().unwrap_or("Untitled");
        let cite = [&meta.law_name, &meta.region, &meta.article_or_section]
            .into_iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" | ");

        let heading = format!("[{}] {} — {}", i + 1, title, cite);
        let heading = heading.trim_matches([' ', '—']);
        blocks.push(format!("{heading}\n{}\n", passage.content.trim()));
    }

    blocks.join("\n").trim().to_string()
}

/// Builds the user message. `examples` is a rendered few-shot block, possibly empty.
pub fn build_user_prompt(
    feature_text: &str,
    rule_hits: &[String],
    context: &str,
    examples: &str,
) -> String {
    let rules = serde_json::to_string(rule_hits).unwrap_or_else(|_| "[]".to_string());
    let context = if context.is_empty() {
        "(no relevant law passages found)"
    } else {
        context
    };

    let mut prompt = format!(
        "Feature Artifact:\n{feature_text}\n\nSignals (rules):\n{rules}\n\nRelevant Law Context (top-k):\n{context}\n\n"
    );
    if !examples.trim().is_empty() {
        prompt.push_str(examples.trim_end());
        prompt.push_str("\n\n");
    }
    prompt.push_str(RESPONSE_SCHEMA);
    prompt
}
