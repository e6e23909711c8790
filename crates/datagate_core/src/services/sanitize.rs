//! Identifier sanitization.
//!
//! Placeholders only bind values, so table and column names selected by the
//! client must be written into the SQL text. This is the only function whose
//! output may be interpolated into a statement.

/// Reduce `raw` to `[A-Za-z0-9_]` and wrap it in double quotes.
///
/// Total and deterministic. Input with no allowed characters becomes `""`,
/// which PostgreSQL rejects as a zero-length identifier.
pub fn sanitize_identifier(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 2);
    out.push('"');
    out.extend(raw.chars().filter(|c| c.is_ascii_alphanumeric() || *c == '_'));
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_safe(input: &str) {
        let out = sanitize_identifier(input);
        assert!(out.len() >= 2, "{input:?} -> {out:?}");
        assert!(out.starts_with('"') && out.ends_with('"'), "{input:?} -> {out:?}");
        let inner = &out[1..out.len() - 1];
        assert!(
            inner.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'),
            "{input:?} -> {out:?}"
        );
    }

    #[test]
    fn test_plain_identifier_is_quoted() {
        assert_eq!(sanitize_identifier("populacao_2022"), "\"populacao_2022\"");
        assert_eq!(sanitize_identifier("Bairro"), "\"Bairro\"");
    }

    #[test]
    fn test_injection_payload_is_stripped() {
        assert_eq!(
            sanitize_identifier("users; DROP TABLE users;--"),
            "\"usersDROPTABLEusers\""
        );
        assert_eq!(sanitize_identifier("id\" FROM secrets --"), "\"idFROMsecrets\"");
        assert_eq!(sanitize_identifier("x' OR '1'='1"), "\"xOR11\"");
    }

    #[test]
    fn test_only_disallowed_characters_yield_empty_identifier() {
        assert_eq!(sanitize_identifier(""), "\"\"");
        assert_eq!(sanitize_identifier(";--'\" \t\n"), "\"\"");
        assert_eq!(sanitize_identifier("çãõ€"), "\"\"");
    }

    #[test]
    fn test_unicode_letters_are_removed() {
        assert_eq!(sanitize_identifier("saúde_pública"), "\"sade_pblica\"");
        assert_eq!(sanitize_identifier("ｔａｂｌｅ"), "\"\"");
    }

    #[test]
    fn test_output_never_escapes_its_quotes() {
        let inputs = [
            "",
            "a",
            "\"",
            "\"\"",
            "a\"b",
            ";",
            "--",
            "/* */",
            "' OR 1=1",
            "tab\tle",
            "new\nline",
            "nul\0byte",
            "émoji😀",
            "x\u{200b}y",
            "DROP TABLE t; --",
        ];
        for input in inputs {
            assert_safe(input);
        }
    }

    #[test]
    fn test_sanitize_over_every_ascii_byte() {
        for b in 0u8..=127 {
            let input = format!("a{}b", b as char);
            assert_safe(&input);
            let out = sanitize_identifier(&input);
            let keep = (b as char).is_ascii_alphanumeric() || b == b'_';
            assert_eq!(out.len(), if keep { 5 } else { 4 }, "byte {b}");
        }
    }

    #[test]
    fn test_deterministic() {
        let input = "Escolas Municipais; --";
        assert_eq!(sanitize_identifier(input), sanitize_identifier(input));
    }
}
