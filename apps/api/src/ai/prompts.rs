// Prompt templates for every AI feature. Placeholders use `{name}` and are
// filled in a single pass by `fill_template`, so caller text is never rescanned.

pub const RESUME_ANALYSIS_PROMPT_TEMPLATE: &str = r#"Analyze the following resume text and provide feedback. Structure your response as a JSON object adhering STRICTLY to the following format:
{
  "overallScore": <integer score 0-100>,
  "categoryScores": {
    "formatting": <integer score 0-100 for layout, readability, consistency>,
    "content": <integer score 0-100 for clarity, conciseness, grammar, spelling>,
    "keywords": <integer score 0-100 for relevance of skills and terms to common job descriptions>,
    "impact": <integer score 0-100 for showcasing achievements and quantifiable results>
  },
  "suggestions": [<array of specific, actionable suggestion strings>],
  "strengths": [<array of specific strength strings>]
}

Resume Text:
--- START RESUME ---
{resume_text}
--- END RESUME ---

Ensure your entire response is ONLY the JSON object requested, without any introductory text, code block markers, or explanations.

JSON Response:"#;

pub const KEYWORD_EXTRACTION_PROMPT_TEMPLATE: &str = r#"Given the following job role and job description, list the most important skills, programming languages, libraries, frameworks, and project types required.
Respond with a JSON object of the form {"keywords": ["keyword", ...]} and nothing else.

Job Role: {role_title}
Job Description: {role_description}"#;

pub const FIX_FIELD_PROMPT_TEMPLATE: &str =
    "Correct the grammar and syntax of the following {field}. Only return the improved text.\n\nInput: {value}";

pub const FIX_SUMMARY_PROMPT_TEMPLATE: &str = "Improve the following professional summary for grammar, clarity, and impact. \
    Return only the improved summary.\n\nInput: {summary}";

pub const FIX_SECTION_PROMPT_TEMPLATE: &str = "Correct the grammar and syntax for the following {section} section fields. \
    Return a JSON object with exactly the same keys and nothing else.\n\nInput: {fields}";

pub const FIX_SKILLS_PROMPT_TEMPLATE: &str = r#"Correct the grammar and syntax for the following list of skills.
Respond with a JSON object of the form {"skills": ["skill", ...]} and nothing else.

Input: {skills}"#;

/// Replaces each `{name}` in `template` that has an entry in `values`. Braces
/// that do not form a known placeholder (the JSON examples) are kept as is.
pub fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let placeholder = after.find('}').and_then(|close| {
            let name = &after[..close];
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (close, *value))
        });
        match placeholder {
            Some((close, value)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

pub fn resume_analysis_prompt(resume_text: &str) -> String {
    fill_template(RESUME_ANALYSIS_PROMPT_TEMPLATE, &[("resume_text", resume_text)])
}

pub fn keyword_extraction_prompt(role_title: &str, role_description: &str) -> String {
    fill_template(
        KEYWORD_EXTRACTION_PROMPT_TEMPLATE,
        &[("role_title", role_title), ("role_description", role_description)],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analysis_prompt_embeds_resume() {
        let prompt = resume_analysis_prompt("Rust engineer, 5 years");
        assert!(prompt.contains("--- START RESUME ---\nRust engineer, 5 years\n--- END RESUME ---"));
        assert!(!prompt.contains("{resume_text}"));
    }

    #[test]
    fn test_keyword_prompt_fills_both_placeholders() {
        let prompt = keyword_extraction_prompt("Data Engineer", "Spark and Airflow");
        assert!(prompt.contains("Job Role: Data Engineer"));
        assert!(prompt.contains("Job Description: Spark and Airflow"));
    }

    #[test]
    fn test_caller_text_is_not_substituted_again() {
        let prompt = keyword_extraction_prompt("{role_description}", "Spark");
        assert!(prompt.contains("Job Role: {role_description}"));
        assert!(prompt.contains("Job Description: Spark"));
    }

    #[test]
    fn test_fill_template_keeps_json_braces() {
        let prompt = fill_template(FIX_SKILLS_PROMPT_TEMPLATE, &[("skills", "rust, {skills}")]);
        assert!(prompt.contains(r#"{"skills": ["skill", ...]}"#));
        assert!(prompt.ends_with("Input: rust, {skills}"));
    }

    #[test]
    fn test_analysis_prompt_keeps_schema_braces() {
        let prompt = resume_analysis_prompt("text");
        assert!(prompt.contains(r#""categoryScores": {"#));
        assert_eq!(prompt.matches('{').count(), RESUME_ANALYSIS_PROMPT_TEMPLATE.matches('{').count() - 1);
    }
}
