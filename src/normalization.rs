use serde::{Deserialize, Deserializer};

/// Normalizes submitted text by stripping surrounding whitespace and
/// composing it into Unicode Normalization Form C, so that names typed with
/// combining marks compare equal to their precomposed forms.
///
/// ```
/// use otr_catalog::normalization::normalize_text;
/// assert_eq!(normalize_text(" Sue\u{0301}de "), "Suéde");
/// ```
pub fn normalize_text(text: impl AsRef<str>) -> String {
    use unicode_normalization::UnicodeNormalization;

    text.as_ref().trim().nfc().collect()
}

/// Deserializes a form field after running it through `normalize_text`.
pub fn deserialize<'de, D>(deserializer: D) -> Result<String, D::Error>
where D: Deserializer<'de> {
    let s: String = Deserialize::deserialize(deserializer)?;
    Ok(normalize_text(s))
}
