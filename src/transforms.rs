use regex::{Captures, Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransformKind {
    /// Swap every line holding all `contains` needles (and none of `excludes`) for `line`.
    ReplaceLine {
        #[serde(default)]
        contains: Vec<String>,
        #[serde(default)]
        excludes: Vec<String>,
        line: String,
        #[serde(default)]
        skip_identical: bool,
        #[serde(default)]
        keep_indent: bool,
    },
    /// Multi-line regex substitution. The replacement is inserted verbatim.
    RegexReplace { pattern: String, replacement: String },
    /// Append `statement` to the `body` group of every match unless `present` already matches it.
    EnsureStatement {
        pattern: String,
        present: String,
        statement: String,
        #[serde(default = "default_indent")]
        indent: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EditKind {
    Replaced,
    Inserted,
}

/// One changed line. `line` is 1-based and refers to the transformed text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Edit {
    pub line: usize,
    pub kind: EditKind,
    pub old: Option<String>,
    pub new: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applied {
    pub output: String,
    pub edits: Vec<Edit>,
}

#[derive(thiserror::Error, Debug)]
pub enum TransformError {
    #[error("invalid regex: {0}")]
    Regex(#[from] regex::Error),
    #[error("pattern is missing the `{0}` capture group")]
    MissingGroup(&'static str),
    #[error("replace_line needs at least one `contains` needle")]
    EmptyMatcher,
}

const ENSURE_GROUPS: [&str; 3] = ["head", "body", "tail"];

fn default_indent() -> String {
    "    ".to_string()
}

impl TransformKind {
    pub fn apply(&self, input: &str) -> Result<Applied, TransformError> {
        match self {
            TransformKind::ReplaceLine {
                contains,
                excludes,
                line,
                skip_identical,
                keep_indent,
            } => {
                if contains.is_empty() {
                    return Err(TransformError::EmptyMatcher);
                }
                Ok(replace_lines(
                    input,
                    contains,
                    excludes,
                    line,
                    *skip_identical,
                    *keep_indent,
                ))
            }
            TransformKind::RegexReplace {
                pattern,
                replacement,
            } => {
                let re = multi_line_regex(pattern)?;
                Ok(regex_replace(&re, input, replacement))
            }
            TransformKind::EnsureStatement {
                pattern,
                present,
                statement,
                indent,
            } => {
                let re = ensure_regex(pattern)?;
                let present = Regex::new(present)?;
                Ok(ensure_statement(&re, &present, input, statement, indent))
            }
        }
    }

    /// Checks the transform without touching any text.
    pub fn validate(&self) -> Result<(), TransformError> {
        match self {
            TransformKind::ReplaceLine { contains, .. } => {
                if contains.is_empty() {
                    return Err(TransformError::EmptyMatcher);
                }
            }
            TransformKind::RegexReplace { pattern, .. } => {
                multi_line_regex(pattern)?;
            }
            TransformKind::EnsureStatement {
                pattern, present, ..
            } => {
                ensure_regex(pattern)?;
                Regex::new(present)?;
            }
        }
        Ok(())
    }

    pub fn label(&self) -> &'static str {
        match self {
            TransformKind::ReplaceLine { .. } => "replace_line",
            TransformKind::RegexReplace { .. } => "regex_replace",
            TransformKind::EnsureStatement { .. } => "ensure_statement",
        }
    }
}

/// `^`/`$` match at `\n` and `\r\n` line boundaries alike.
fn multi_line_regex(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern).multi_line(true).crlf(true).build()
}

fn ensure_regex(pattern: &str) -> Result<Regex, TransformError> {
    let re = Regex::new(pattern)?;
    for required in ENSURE_GROUPS {
        if !re.capture_names().flatten().any(|name| name == required) {
            return Err(TransformError::MissingGroup(required));
        }
    }
    Ok(re)
}

fn replace_lines(
    input: &str,
    contains: &[String],
    excludes: &[String],
    line: &str,
    skip_identical: bool,
    keep_indent: bool,
) -> Applied {
    let mut output = String::with_capacity(input.len());
    let mut edits = Vec::new();

    for (idx, raw) in input.split_inclusive('\n').enumerate() {
        let (content, ending) = split_line_ending(raw);
        let hit = contains.iter().all(|needle| content.contains(needle.as_str()))
            && !excludes.iter().any(|needle| content.contains(needle.as_str()));
        if !hit {
            output.push_str(raw);
            continue;
        }

        let new_line = if keep_indent {
            format!("{}{}", leading_whitespace(content), line.trim_start())
        } else {
            line.to_string()
        };
        if content == new_line || (skip_identical && content.trim() == new_line.trim()) {
            output.push_str(raw);
            continue;
        }

        output.push_str(&new_line);
        output.push_str(ending);
        edits.push(Edit {
            line: idx + 1,
            kind: EditKind::Replaced,
            old: Some(content.to_string()),
            new: new_line,
        });
    }

    Applied { output, edits }
}

fn regex_replace(re: &Regex, input: &str, replacement: &str) -> Applied {
    let mut output = String::with_capacity(input.len());
    let mut edits = Vec::new();
    let mut last = 0;

    // the replacement is pushed as-is, `$` is never expanded
    for m in re.find_iter(input) {
        output.push_str(&input[last..m.start()]);
        last = m.end();
        if m.as_str() != replacement {
            edits.push(Edit {
                line: output.matches('\n').count() + 1,
                kind: EditKind::Replaced,
                old: Some(m.as_str().to_string()),
                new: replacement.to_string(),
            });
        }
        output.push_str(replacement);
    }
    output.push_str(&input[last..]);

    Applied { output, edits }
}

fn ensure_statement(
    re: &Regex,
    present: &Regex,
    input: &str,
    statement: &str,
    indent: &str,
) -> Applied {
    let mut output = String::with_capacity(input.len() + statement.len() + indent.len() + 2);
    let mut edits = Vec::new();
    let mut last = 0;

    for caps in re.captures_iter(input) {
        let Some(whole) = caps.get(0) else { continue };
        output.push_str(&input[last..whole.start()]);
        last = whole.end();

        let body = group(&caps, "body");
        if present.is_match(body) {
            output.push_str(whole.as_str());
            continue;
        }

        let eol = if whole.as_str().contains("\r\n") {
            "\r\n"
        } else {
            "\n"
        };
        output.push_str(group(&caps, "head"));
        output.push_str(body.trim_end());
        output.push_str(eol);
        let line = output.matches('\n').count() + 1;
        let inserted = format!("{indent}{statement}");
        output.push_str(&inserted);
        output.push_str(eol);
        output.push_str(group(&caps, "tail"));
        edits.push(Edit {
            line,
            kind: EditKind::Inserted,
            old: None,
            new: inserted,
        });
    }
    output.push_str(&input[last..]);

    Applied { output, edits }
}

fn group<'t>(caps: &Captures<'t>, name: &str) -> &'t str {
    caps.name(name).map(|m| m.as_str()).unwrap_or("")
}

fn split_line_ending(raw: &str) -> (&str, &str) {
    if let Some(content) = raw.strip_suffix("\r\n") {
        (content, "\r\n")
    } else if let Some(content) = raw.strip_suffix('\n') {
        (content, "\n")
    } else {
        (raw, "")
    }
}

fn leading_whitespace(line: &str) -> &str {
    let end = line.len() - line.trim_start().len();
    &line[..end]
}

#[cfg(test)]
mod tests {
    use super::{EditKind, TransformError, TransformKind};

    const FILTER: &str = r"(?P<head>const\s+filteredAll\s*=\s*useMemo\s*\(\s*\(\)\s*=>\s*baseMonitors\.filter\s*\(\s*m\s*=>\s*\{)(?P<body>[\s\S]*?)(?P<tail>\}\s*\)\s*,\s*\[baseMonitors,\s*effectiveStatus\]\s*\)\s*;)";

    fn replace_hay(line: &str, excludes: &[&str], skip_identical: bool) -> TransformKind {
        TransformKind::ReplaceLine {
            contains: vec!["const hay".to_string(), ".toLowerCase()".to_string()],
            excludes: excludes.iter().map(|s| s.to_string()).collect(),
            line: line.to_string(),
            skip_identical,
            keep_indent: false,
        }
    }

    fn ensure_return() -> TransformKind {
        TransformKind::EnsureStatement {
            pattern: FILTER.to_string(),
            present: r"return\s+true\s*;".to_string(),
            statement: "return true;".to_string(),
            indent: "    ".to_string(),
        }
    }

    #[test]
    fn replace_line_rewrites_matching_line_only() {
        let input = "a\n  const hay = (x + y).toLowerCase();\nconst other = 1;\n";
        let out = replace_hay("  const hay = z.toLowerCase();", &[], false)
            .apply(input)
            .unwrap();
        assert_eq!(out.output, "a\n  const hay = z.toLowerCase();\nconst other = 1;\n");
        assert_eq!(out.edits.len(), 1);
        assert_eq!(out.edits[0].line, 2);
        assert_eq!(out.edits[0].kind, EditKind::Replaced);
        assert_eq!(
            out.edits[0].old.as_deref(),
            Some("  const hay = (x + y).toLowerCase();")
        );
    }

    #[test]
    fn replace_line_skips_identical_after_trim() {
        let input = "const hay = z.toLowerCase();\n";
        let out = replace_hay("      const hay = z.toLowerCase();", &[], true)
            .apply(input)
            .unwrap();
        assert_eq!(out.output, input);
        assert!(out.edits.is_empty());
    }

    #[test]
    fn replace_line_honours_excludes() {
        let input = "const hay = `${a}`.toLowerCase();\n";
        let out = replace_hay("const hay = b.toLowerCase();", &["`"], false)
            .apply(input)
            .unwrap();
        assert_eq!(out.output, input);
        assert!(out.edits.is_empty());
    }

    #[test]
    fn replace_line_preserves_crlf_and_missing_final_newline() {
        let input = "x\r\nconst hay = a.toLowerCase();\r\nconst hay = b.toLowerCase();";
        let out = replace_hay("const hay = c.toLowerCase();", &[], false)
            .apply(input)
            .unwrap();
        assert_eq!(
            out.output,
            "x\r\nconst hay = c.toLowerCase();\r\nconst hay = c.toLowerCase();"
        );
        assert_eq!(out.edits.len(), 2);
    }

    #[test]
    fn replace_line_can_keep_indent() {
        let kind = TransformKind::ReplaceLine {
            contains: vec!["const hay".to_string()],
            excludes: Vec::new(),
            line: "      const hay = c;".to_string(),
            skip_identical: false,
            keep_indent: true,
        };
        let out = kind.apply("\tconst hay = a;\n").unwrap();
        assert_eq!(out.output, "\tconst hay = c;\n");
    }

    #[test]
    fn replace_line_without_needles_is_rejected() {
        let kind = TransformKind::ReplaceLine {
            contains: Vec::new(),
            excludes: Vec::new(),
            line: "x".to_string(),
            skip_identical: false,
            keep_indent: false,
        };
        assert!(matches!(kind.validate(), Err(TransformError::EmptyMatcher)));
        assert!(matches!(kind.apply("x"), Err(TransformError::EmptyMatcher)));
    }

    #[test]
    fn regex_replace_inserts_replacement_literally() {
        let kind = TransformKind::RegexReplace {
            pattern: r"^[ \t]*const\s+hay\s*=\s*.*?\.toLowerCase\(\);[ \t]*$".to_string(),
            replacement: "  const hay = `${m.name}`.toLowerCase();".to_string(),
        };
        let input = "start\n\n  const hay = (a + b).toLowerCase();\nend\n";
        let out = kind.apply(input).unwrap();
        assert_eq!(
            out.output,
            "start\n\n  const hay = `${m.name}`.toLowerCase();\nend\n"
        );
        assert_eq!(out.edits.len(), 1);
        assert_eq!(out.edits[0].line, 3);
    }

    #[test]
    fn regex_replace_matches_crlf_line_ends() {
        let kind = TransformKind::RegexReplace {
            pattern: r"^[ \t]*const\s+hay\s*=\s*.*?\.toLowerCase\(\);[ \t]*$".to_string(),
            replacement: "  const hay = x.toLowerCase();".to_string(),
        };
        let input = "a\r\n  const hay = (a + b).toLowerCase();\r\nb\r\n";
        let out = kind.apply(input).unwrap();
        assert_eq!(out.output, "a\r\n  const hay = x.toLowerCase();\r\nb\r\n");
        assert_eq!(out.edits.len(), 1);
        assert_eq!(out.edits[0].line, 2);
    }

    #[test]
    fn regex_replace_reports_lines_of_the_output() {
        let kind = TransformKind::RegexReplace {
            pattern: r"^const\s+hay\s*=\s*\S+;$".to_string(),
            replacement: "const hay = x;".to_string(),
        };
        let input = "const hay =\n  a;\nconst hay = b;\n";
        let out = kind.apply(input).unwrap();
        assert_eq!(out.output, "const hay = x;\nconst hay = x;\n");
        let lines: Vec<usize> = out.edits.iter().map(|e| e.line).collect();
        assert_eq!(lines, vec![1, 2]);
    }

    #[test]
    fn ensure_statement_appends_once() {
        let input = "const filteredAll = useMemo(() => baseMonitors.filter(m => {\n    if (x) return false;\n  }), [baseMonitors, effectiveStatus]);\n";
        let out = ensure_return().apply(input).unwrap();
        assert_eq!(
            out.output,
            "const filteredAll = useMemo(() => baseMonitors.filter(m => {\n    if (x) return false;\n    return true;\n}), [baseMonitors, effectiveStatus]);\n"
        );
        assert_eq!(out.edits.len(), 1);
        assert_eq!(out.edits[0].line, 3);
        assert_eq!(out.edits[0].kind, EditKind::Inserted);

        let again = ensure_return().apply(&out.output).unwrap();
        assert_eq!(again.output, out.output);
        assert!(again.edits.is_empty());
    }

    #[test]
    fn ensure_statement_keeps_crlf_endings() {
        let input = "const filteredAll = useMemo(() => baseMonitors.filter(m => {\r\n    if (x) return false;\r\n  }), [baseMonitors, effectiveStatus]);\r\n";
        let out = ensure_return().apply(input).unwrap();
        assert_eq!(
            out.output,
            "const filteredAll = useMemo(() => baseMonitors.filter(m => {\r\n    if (x) return false;\r\n    return true;\r\n}), [baseMonitors, effectiveStatus]);\r\n"
        );
        assert_eq!(out.output.matches('\n').count(), out.output.matches("\r\n").count());
        assert_eq!(out.edits[0].line, 3);
    }

    #[test]
    fn ensure_statement_without_match_is_a_no_op() {
        let input = "const other = [];\n";
        let out = ensure_return().apply(input).unwrap();
        assert_eq!(out.output, input);
        assert!(out.edits.is_empty());
    }

    #[test]
    fn ensure_statement_requires_named_groups() {
        let kind = TransformKind::EnsureStatement {
            pattern: r"(?P<head>a)(?P<body>b)".to_string(),
            present: "x".to_string(),
            statement: "y".to_string(),
            indent: String::new(),
        };
        assert!(matches!(
            kind.validate(),
            Err(TransformError::MissingGroup("tail"))
        ));
    }

    #[test]
    fn bad_regex_is_reported() {
        let kind = TransformKind::RegexReplace {
            pattern: "(".to_string(),
            replacement: String::new(),
        };
        assert!(matches!(kind.validate(), Err(TransformError::Regex(_))));
    }
}
