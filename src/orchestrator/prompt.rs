//! Instruction prompt sent to the model

/// Prompt used when the client sends none
pub const DEFAULT_USER_PROMPT: &str = "random useful hack for anyone";

const DIRECTIVE: &str = "\
You generate a single clever, unique hack.
Detect the user's input language; if Marathi then respond fully in Marathi; if English then in English. Mirror the dominant language. Do NOT translate unless asked.

Return ONLY strict JSON (no markdown, no commentary) with exactly these keys:
{
  \"title\": \"\",
  \"description\": \"\",
  \"category\": \"\",
  \"difficulty\": \"Easy | Medium | Advanced\",
  \"usefulness\": 0,
  \"bonus\": \"\"
}";

/// Compose the directive, the user's raw prompt and the language hint.
pub fn build_prompt(user_prompt: &str, lang_hint: &str) -> String {
    format!(
        "{}\n\nUser prompt: {}\nLanguage hint: {}",
        DIRECTIVE,
        user_prompt.trim(),
        lang_hint
    )
}
