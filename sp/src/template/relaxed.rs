//! Relaxed JSON
//!
//! Template files may contain `//` and `/* */` comments and trailing commas.
//! Both are removed outside string literals before strict parsing. Newlines
//! inside comments are kept so parser errors still point at the right line.

/// Strip comments and trailing commas from relaxed JSON text
pub fn normalize(input: &str) -> String {
    strip_trailing_commas(&strip_comments(input))
}

fn strip_comments(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len());
    let mut in_string = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();

        if in_string {
            out.push(c);
            if c == '\\' {
                if let Some(n) = next {
                    out.push(n);
                    i += 1;
                }
            } else if c == '"' {
                in_string = false;
            }
            i += 1;
            continue;
        }

        match (c, next) {
            ('"', _) => {
                in_string = true;
                out.push(c);
                i += 1;
            }
            ('/', Some('/')) => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
            }
            ('/', Some('*')) => {
                i += 2;
                while i < chars.len() && !(chars[i] == '*' && chars.get(i + 1) == Some(&'/')) {
                    if chars[i] == '\n' {
                        out.push('\n');
                    }
                    i += 1;
                }
                // skip the closing "*/" (or run off the end when unterminated)
                i += 2;
            }
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }

    out
}

fn strip_trailing_commas(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len());
    let mut in_string = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if in_string {
            out.push(c);
            if c == '\\' {
                if let Some(&n) = chars.get(i + 1) {
                    out.push(n);
                    i += 1;
                }
            } else if c == '"' {
                in_string = false;
            }
            i += 1;
            continue;
        }

        if c == '"' {
            in_string = true;
        } else if c == ',' {
            let closes = chars[i + 1..]
                .iter()
                .find(|ch| !ch.is_whitespace())
                .is_some_and(|ch| *ch == '}' || *ch == ']');
            if closes {
                i += 1;
                continue;
            }
        }

        out.push(c);
        i += 1;
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> serde_json::Value {
        serde_json::from_str(&normalize(input)).unwrap()
    }

    #[test]
    fn test_line_and_block_comments() {
        let value = parse(
            r#"{
                // the name
                "name": "x", /* inline */ "n": 1
                /* multi
                   line */
            }"#,
        );
        assert_eq!(value["name"], "x");
        assert_eq!(value["n"], 1);
    }

    #[test]
    fn test_trailing_commas() {
        let value = parse(r#"{ "a": [1, 2, 3,], "b": { "c": true, }, }"#);
        assert_eq!(value["a"].as_array().unwrap().len(), 3);
        assert_eq!(value["b"]["c"], true);
    }

    #[test]
    fn test_trailing_comma_before_comment() {
        let value = parse("{ \"a\": 1, // last\n }");
        assert_eq!(value["a"], 1);
    }

    #[test]
    fn test_strings_untouched() {
        let value = parse(r#"{ "url": "https://example.com/a,]", "q": "say \"//hi\", /* no */" }"#);
        assert_eq!(value["url"], "https://example.com/a,]");
        assert_eq!(value["q"], "say \"//hi\", /* no */");
    }

    #[test]
    fn test_block_comment_keeps_line_numbers() {
        let stripped = normalize("/* a\nb\nc */{}");
        assert_eq!(stripped, "\n\n{}");
    }
}
