/// Split one line of a PMTM file into its comma separated fields.
///
/// A field that starts with `"` runs to the closing quote and may contain
/// commas; `""` inside it is a literal quote. Fields are returned untrimmed.
pub fn split_row(line: &str) -> Vec<String> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    if line.is_empty() {
        return Vec::new();
    }

    let mut fields = Vec::new();
    let mut field = String::new();
    let mut chars = line.chars().peekable();
    let mut in_quotes = false;
    let mut at_field_start = true;

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(c);
            }
            continue;
        }

        match c {
            ',' => {
                fields.push(std::mem::take(&mut field));
                at_field_start = true;
                continue;
            }
            '"' if at_field_start => in_quotes = true,
            _ => field.push(c),
        }
        at_field_start = false;
    }
    fields.push(field);
    fields
}

/// True when a row holds nothing but whitespace.
pub fn is_blank(fields: &[String]) -> bool {
    fields.iter().all(|f| f.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_fields() {
        assert_eq!(split_row("Tag, ,baseline"), vec!["Tag", " ", "baseline"]);
        assert_eq!(split_row("a,,b,"), vec!["a", "", "b", ""]);
    }

    #[test]
    fn test_quoted_fields() {
        assert_eq!(
            split_row(r#"Environ,,"PATH=/bin,/usr/bin""#),
            vec!["Environ", "", "PATH=/bin,/usr/bin"]
        );
        assert_eq!(split_row(r#""say ""hi""",x"#), vec![r#"say "hi""#, "x"]);
    }

    #[test]
    fn test_quote_inside_field_is_literal() {
        assert_eq!(split_row(r#"a 5" disk,b"#), vec![r#"a 5" disk"#, "b"]);
    }

    #[test]
    fn test_empty_and_blank_rows() {
        assert!(split_row("").is_empty());
        assert!(split_row("\r").is_empty());
        assert!(is_blank(&split_row("  ,  ")));
        assert!(!is_blank(&split_row("End of File")));
    }
}
