//! Pattern tables for spotting a reference in generated text.
//!
//! A reference counts as present in a file when any of these match:
//! - the literal `${domain.resource.outputs.field}` string;
//! - a format shape ([`FORMAT_SHAPES`]) instantiated with a case variant of
//!   the field name;
//! - an [`EXTRA_PATTERNS`] entry whose domain tag and field globs match.
//!
//! Matching is deliberately permissive: a coincidental substring counts.

use std::sync::OnceLock;

use globset::{Glob, GlobMatcher};
use regex::Regex;
use tracing::warn;

use super::domain_tag;
use crate::reference::CrossDomainRef;

/// Regex shapes a field variant may appear in. `{v}` is the escaped variant.
pub static FORMAT_SHAPES: &[(&str, &str)] = &[
    ("yaml", r#"(?m)(?:^|[\s{,\-])["']?{v}["']?\s*:\s*\S"#),
    ("json", r#""{v}"\s*:\s*\S"#),
    ("shell_assign", r#"(?m)(?:^|[^\w-])(?:export\s+)?{v}=\S"#),
    ("shell_ref", r#"\$\{?{v}\b"#),
    (
        "template_output",
        r#"(?:OutputKey|output_key|ExportName|Export|Name)\s*[:=]\s*["']?[\w:.${}\-]*{v}"#,
    ),
];

/// Domain/field specific idioms.
///
/// `domain` and `field` are globs over the domain tag and the field name.
/// Placeholders in patterns: `{field}` (escaped field), `{last}` (escaped
/// last dotted segment), `{path}` (dotted path with camelCased segments).
pub struct ExtraPattern {
    pub domain: &'static str,
    pub field: &'static str,
    pub patterns: &'static [&'static str],
}

pub static EXTRA_PATTERNS: &[ExtraPattern] = &[
    ExtraPattern {
        domain: "aws",
        field: "vpc_id",
        patterns: &[r"vpc-[0-9a-f]{8,17}", r"!Ref\s+\w*VPC\b", r"!GetAtt\s+\w*VPC\w*"],
    },
    ExtraPattern {
        domain: "aws",
        field: "subnet_id*",
        patterns: &[r"subnet-[0-9a-f]{8,17}", r"SubnetIds?\s*:"],
    },
    ExtraPattern {
        domain: "aws",
        field: "bucket*",
        patterns: &[r"s3://[\w.\-]+", r"!Ref\s+\w*Bucket\b"],
    },
    ExtraPattern {
        domain: "aws",
        field: "*_arn",
        patterns: &[r"arn:aws:[\w\-]+:"],
    },
    ExtraPattern {
        domain: "aws",
        field: "cluster_name",
        patterns: &[r"aws\s+eks\s+update-kubeconfig"],
    },
    ExtraPattern {
        domain: "kubernetes",
        field: "namespace",
        patterns: &[r"(?m)^\s*namespace\s*:\s*\S+", r"kubectl\b[^\n]*(?:-n|--namespace)\s+\S+"],
    },
    ExtraPattern {
        domain: "kubernetes",
        field: "*endpoint*",
        patterns: &[r"https://[\w.\-]+\.(?:eks\.amazonaws\.com|azmk8s\.io)", r"server\s*:\s*https://"],
    },
    ExtraPattern {
        domain: "*",
        field: "*.*",
        patterns: &[r"{path}", r"{field}", r#"(?m)(?:^|\s)["']?{last}["']?\s*:"#],
    },
];

/// Split a field name into lowercase words on `_`, `-`, `.`, spaces and
/// camelCase boundaries.
fn split_words(field: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;
    for ch in field.chars() {
        if matches!(ch, '_' | '-' | '.' | ' ') {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if ch.is_uppercase() && prev_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        prev_lower = ch.is_lowercase() || ch.is_ascii_digit();
        current.extend(ch.to_lowercase());
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn camel(words: &[String]) -> String {
    words
        .iter()
        .enumerate()
        .map(|(i, w)| if i == 0 { w.clone() } else { capitalize(w) })
        .collect()
}

/// Case-convention variants of a field name, first occurrence order, no duplicates.
///
/// `vpc_id` → `vpc_id`, `vpcId`, `VpcId`, `vpc-id`, `VPC_ID`, `vpc`, `id`.
/// For dotted fields the last segment contributes its own variants too.
pub fn case_variants(field: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut push = |v: String| {
        if !v.is_empty() && !out.contains(&v) {
            out.push(v);
        }
    };

    push(field.to_string());
    let mut word_sets = vec![split_words(field)];
    if let Some((_, last)) = field.rsplit_once('.') {
        word_sets.push(split_words(last));
    }

    for words in &word_sets {
        if words.is_empty() {
            continue;
        }
        let snake = words.join("_");
        push(snake.clone());
        push(camel(words));
        push(words.iter().map(|w| capitalize(w)).collect());
        push(words.join("-"));
        push(snake.to_uppercase());
    }
    if let Some(words) = word_sets.first() {
        if words.len() > 1 {
            for w in words {
                push(w.clone());
            }
        }
    }
    out
}

fn dotted_path(field: &str) -> String {
    field
        .split('.')
        .map(|segment| regex::escape(&camel(&split_words(segment))))
        .collect::<Vec<_>>()
        .join(r"\.")
}

fn glob_matcher(pattern: &str) -> Option<GlobMatcher> {
    match Glob::new(pattern) {
        Ok(glob) => Some(glob.compile_matcher()),
        Err(e) => {
            warn!(pattern = %pattern, error = %e, "skipping invalid extra-pattern glob");
            None
        }
    }
}

struct CompiledExtra {
    domain: GlobMatcher,
    field: GlobMatcher,
    patterns: &'static [&'static str],
}

fn compiled_extras() -> &'static [CompiledExtra] {
    static EXTRAS: OnceLock<Vec<CompiledExtra>> = OnceLock::new();
    EXTRAS.get_or_init(|| {
        EXTRA_PATTERNS
            .iter()
            .filter_map(|e| {
                Some(CompiledExtra {
                    domain: glob_matcher(e.domain)?,
                    field: glob_matcher(e.field)?,
                    patterns: e.patterns,
                })
            })
            .collect()
    })
}

/// Extra pattern sources for `(domain tag, field)` with placeholders filled in.
pub fn extra_patterns(tag: &str, field: &str) -> Vec<String> {
    let last = field.rsplit('.').next().unwrap_or(field);
    compiled_extras()
        .iter()
        .filter(|e| e.domain.is_match(tag) && e.field.is_match(field))
        .flat_map(|e| e.patterns.iter())
        .map(|p| {
            p.replace("{path}", &dotted_path(field))
                .replace("{field}", &regex::escape(field))
                .replace("{last}", &regex::escape(last))
        })
        .collect()
}

/// A compiled pattern with a label for diagnostics.
#[derive(Debug, Clone)]
pub struct LabeledPattern {
    pub label: String,
    pub regex: Regex,
}

/// Every pattern that confirms one reference.
#[derive(Debug, Clone)]
pub struct PatternSet {
    literal: String,
    patterns: Vec<LabeledPattern>,
}

impl PatternSet {
    /// Build the pattern set for a parsed reference.
    pub fn for_reference(reference: &CrossDomainRef) -> Self {
        let mut patterns = Vec::new();
        let mut sources: Vec<String> = Vec::new();

        for variant in case_variants(reference.field()) {
            let escaped = regex::escape(&variant);
            for (shape, template) in FORMAT_SHAPES {
                let source = template.replace("{v}", &escaped);
                if !sources.contains(&source) {
                    sources.push(source.clone());
                    push_compiled(&mut patterns, format!("{}:{}", shape, variant), &source);
                }
            }
        }

        let tag = domain_tag(reference.domain());
        for source in extra_patterns(&tag, reference.field()) {
            if !sources.contains(&source) {
                sources.push(source.clone());
                push_compiled(&mut patterns, format!("extra:{}", tag), &source);
            }
        }

        Self {
            literal: reference.raw().to_string(),
            patterns,
        }
    }

    pub fn len(&self) -> usize {
        self.patterns.len() + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Label of the first pattern matching `text`, if any.
    pub fn find_match(&self, text: &str) -> Option<&str> {
        if text.contains(&self.literal) {
            return Some("literal");
        }
        self.patterns
            .iter()
            .find(|p| p.regex.is_match(text))
            .map(|p| p.label.as_str())
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.find_match(text).is_some()
    }
}

fn push_compiled(patterns: &mut Vec<LabeledPattern>, label: String, source: &str) {
    match Regex::new(source) {
        Ok(regex) => patterns.push(LabeledPattern { label, regex }),
        Err(e) => warn!(pattern = %source, error = %e, "skipping uncompilable pattern"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::parse_ref;

    fn set(raw: &str) -> PatternSet {
        PatternSet::for_reference(&parse_ref(raw).unwrap())
    }

    #[test]
    fn test_case_variants_snake_field() {
        assert_eq!(
            case_variants("vpc_id"),
            vec!["vpc_id", "vpcId", "VpcId", "vpc-id", "VPC_ID", "vpc", "id"]
        );
    }

    #[test]
    fn test_case_variants_camel_field() {
        let variants = case_variants("bucketName");
        assert!(variants.contains(&"bucket_name".to_string()));
        assert!(variants.contains(&"BUCKET_NAME".to_string()));
        assert!(variants.contains(&"BucketName".to_string()));
    }

    #[test]
    fn test_case_variants_single_word() {
        assert_eq!(case_variants("endpoint"), vec!["endpoint", "Endpoint", "ENDPOINT"]);
    }

    #[test]
    fn test_case_variants_dotted_field_adds_last_segment() {
        let variants = case_variants("status.load_balancer");
        assert!(variants.contains(&"status_load_balancer".to_string()));
        assert!(variants.contains(&"loadBalancer".to_string()));
        assert!(variants.contains(&"LOAD_BALANCER".to_string()));
    }

    #[test]
    fn test_literal_reference_matches() {
        let s = set("${aws.vpc.outputs.vpc_id}");
        assert_eq!(
            s.find_match("VPC_ID: \"${aws.vpc.outputs.vpc_id}\""),
            Some("literal")
        );
    }

    #[test]
    fn test_format_shapes_match() {
        let s = set("${aws.vpc.outputs.vpc_id}");
        assert!(s.is_match("network:\n  vpcId: vpc-0abc"));
        assert!(s.is_match(r#"{"VpcId": "x"}"#));
        assert!(s.is_match("export VPC_ID=vpc-123"));
        assert!(s.is_match("aws ec2 describe-vpcs --vpc-ids ${VPC_ID}"));
        assert!(s.is_match("- OutputKey: VpcId"));
    }

    #[test]
    fn test_unrelated_text_does_not_match() {
        let s = set("${aws.s3.outputs.bucket_name}");
        assert!(!s.is_match("steps:\n  - run: echo hello\n"));
    }

    #[test]
    fn test_extra_patterns_for_aws_vpc() {
        let extras = extra_patterns("aws", "vpc_id");
        assert!(extras.iter().any(|p| p.contains("vpc-")));
        assert!(extra_patterns("kubernetes", "vpc_id").is_empty());
    }

    #[test]
    fn test_extra_pattern_matches_physical_id() {
        let s = set("${aws.vpc.outputs.vpc_id}");
        assert!(s.is_match("echo vpc-0123456789abcdef0"));
    }

    #[test]
    fn test_dotted_path_extra_pattern() {
        let extras = extra_patterns("kubernetes", "status.load_balancer");
        assert!(extras.iter().any(|p| p == r"status\.loadBalancer"));
        let s = set("${k8s.svc.outputs.status.load_balancer}");
        assert!(s.is_match("jsonpath='{.status.loadBalancer.ingress[0].hostname}'"));
    }

    #[test]
    fn test_pattern_set_len_counts_literal() {
        let s = set("${aws.vpc.outputs.vpc_id}");
        assert!(s.len() > FORMAT_SHAPES.len());
        assert!(!s.is_empty());
    }
}
