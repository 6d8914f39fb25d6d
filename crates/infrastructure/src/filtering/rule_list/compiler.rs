use dnsieve_domain::{DomainError, Filter, FilterAction, FilterId, RecordType};
use smallvec::SmallVec;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Line parsing
// ---------------------------------------------------------------------------

/// What a rule matches on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleKind {
    Exact(String),
    /// `*.domain`, stored without the `*.` prefix.
    Wildcard(String),
    /// `||domain^`
    Anchored(String),
    /// `/text/`, lower-cased.
    Pattern(String),
}

/// Record types a rule is restricted to by `$dnstype=`.
pub type DnsTypes = SmallVec<[RecordType; 2]>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRule {
    pub action: FilterAction,
    pub kind: RuleKind,
    pub dnstypes: Option<DnsTypes>,
}

/// Outcome of parsing one line.
#[derive(Debug, PartialEq, Eq)]
pub enum ParsedLine {
    /// Blank, comment or a hosts entry that is deliberately ignored.
    Skip,
    Rule(ParsedRule),
    Invalid,
}

/// Parse one line of rule list text.
///
/// Supported formats:
/// - `# comment`, `! comment` or blank → Skip
/// - `0.0.0.0 domain`, `127.0.0.1 domain`, `:: domain`, `::1 domain` → Exact
/// - `ads.com`           → Exact (plain token containing a dot)
/// - `*.ads.com`         → Wildcard
/// - `||ads.com^`        → Anchored
/// - `/tracker/`         → Pattern (Aho-Corasick)
/// - `@@` prefix         → allow instead of block
/// - `$dnstype=A|AAAA`   → restrict to those question types
pub fn parse_list_line(line: &str) -> ParsedLine {
    let line = line.trim();

    if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
        return ParsedLine::Skip;
    }

    let (action, body) = match line.strip_prefix("@@") {
        Some(rest) => (FilterAction::Allow, rest),
        None => (FilterAction::Block, line),
    };

    let (body, dnstypes) = match split_modifiers(body) {
        Some(split) => split,
        None => return ParsedLine::Invalid,
    };

    let kind = match parse_rule_body(body) {
        Some(Some(kind)) => kind,
        Some(None) => return ParsedLine::Skip,
        None => return ParsedLine::Invalid,
    };

    ParsedLine::Rule(ParsedRule {
        action,
        kind,
        dnstypes,
    })
}

/// Split a trailing `$modifiers` block off `body`. `None` on an unknown or
/// malformed modifier.
fn split_modifiers(body: &str) -> Option<(&str, Option<DnsTypes>)> {
    // `/text/` may legitimately contain '$' only inside the slashes.
    let Some((rule, modifiers)) = body.rsplit_once('$') else {
        return Some((body, None));
    };
    if rule.starts_with('/') && !rule.ends_with('/') {
        return Some((body, None));
    }

    let mut dnstypes: Option<DnsTypes> = None;
    for modifier in modifiers.split(',') {
        let values = modifier.trim().strip_prefix("dnstype=")?;
        let types = dnstypes.get_or_insert_with(SmallVec::new);
        for value in values.split('|') {
            types.push(value.trim().parse::<RecordType>().ok()?);
        }
    }

    Some((rule.trim(), dnstypes))
}

/// `Some(None)` means "recognised but ignored", `None` means invalid.
fn parse_rule_body(body: &str) -> Option<Option<RuleKind>> {
    // /pattern/ → Aho-Corasick substring
    if body.len() > 2 && body.starts_with('/') && body.ends_with('/') {
        return Some(Some(RuleKind::Pattern(
            body[1..body.len() - 1].to_ascii_lowercase(),
        )));
    }

    // ||domain^ → Anchored
    if let Some(rest) = body.strip_prefix("||") {
        let domain = rest.strip_suffix('^').unwrap_or(rest).to_ascii_lowercase();
        return is_valid_domain(&domain).then_some(Some(RuleKind::Anchored(domain)));
    }

    // *.domain → Wildcard
    if let Some(rest) = body.strip_prefix("*.") {
        let domain = rest.to_ascii_lowercase();
        return is_valid_domain(&domain).then_some(Some(RuleKind::Wildcard(domain)));
    }

    let parts: Vec<&str> = body.split_whitespace().collect();

    // hosts file format: "addr domain [comment…]"
    if parts.len() >= 2 {
        let addr = parts[0];
        let domain = parts[1];

        if !matches!(addr, "0.0.0.0" | "127.0.0.1" | "::" | "::1") {
            return None;
        }
        // Skip self-referential entries
        if matches!(
            domain,
            "localhost"
                | "localhost.localdomain"
                | "0.0.0.0"
                | "broadcasthost"
                | "local"
                | "ip6-localhost"
                | "ip6-loopback"
        ) {
            return Some(None);
        }
        let domain = domain.to_ascii_lowercase();
        return is_valid_domain(&domain).then_some(Some(RuleKind::Exact(domain)));
    }

    // Single token with a dot → plain domain
    if parts.len() == 1 && parts[0].contains('.') {
        let domain = parts[0].to_ascii_lowercase();
        return is_valid_domain(&domain).then_some(Some(RuleKind::Exact(domain)));
    }

    None
}

fn is_valid_domain(domain: &str) -> bool {
    !domain.is_empty()
        && domain.len() <= 253
        && domain.split('.').all(|label| {
            !label.is_empty()
                && label.len() <= 63
                && label
                    .bytes()
                    .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
        })
}

// ---------------------------------------------------------------------------
// Source compilation
// ---------------------------------------------------------------------------

/// One rule together with the line it was parsed from.
#[derive(Debug, Clone)]
pub struct SourceRule {
    pub parsed: ParsedRule,
    pub text: Arc<str>,
}

/// Rules parsed out of one filter's content.
#[derive(Debug)]
pub struct SourceRules {
    pub filter_id: FilterId,
    pub rules: Vec<SourceRule>,
    pub invalid_lines: usize,
}

/// Parse a filter's raw content. Content that is not UTF-8 fails the whole
/// source; lines that are not rules are counted and skipped.
pub fn compile_source(filter: &Filter, content: &[u8]) -> Result<SourceRules, DomainError> {
    let text = std::str::from_utf8(content).map_err(|e| DomainError::FilterCompile {
        filter: filter.name.to_string(),
        reason: format!("content is not valid UTF-8: {}", e),
    })?;

    let mut rules = Vec::new();
    let mut invalid_lines = 0usize;

    for line in text.lines() {
        match parse_list_line(line) {
            ParsedLine::Skip => {}
            ParsedLine::Rule(parsed) => rules.push(SourceRule {
                parsed,
                text: Arc::from(line.trim()),
            }),
            ParsedLine::Invalid => invalid_lines += 1,
        }
    }

    Ok(SourceRules {
        filter_id: filter.id,
        rules,
        invalid_lines,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use dnsieve_domain::FilterSource;

    fn rule(line: &str) -> ParsedRule {
        match parse_list_line(line) {
            ParsedLine::Rule(rule) => rule,
            other => panic!("expected a rule for {:?}, got {:?}", line, other),
        }
    }

    // ---- parse_list_line --------------------------------------------------

    #[test]
    fn test_parse_plain_domain() {
        let r = rule("ads.example.com");
        assert_eq!(r.kind, RuleKind::Exact("ads.example.com".into()));
        assert_eq!(r.action, FilterAction::Block);
        assert!(r.dnstypes.is_none());
    }

    #[test]
    fn test_parse_plain_domain_lowercased() {
        let r = rule("ADS.Example.COM");
        assert_eq!(r.kind, RuleKind::Exact("ads.example.com".into()));
    }

    #[test]
    fn test_parse_hosts_file_formats() {
        for line in [
            "0.0.0.0 tracker.evil.com",
            "127.0.0.1 tracker.evil.com",
            ":: tracker.evil.com",
            "::1 tracker.evil.com",
            "0.0.0.0 tracker.evil.com # inline comment",
        ] {
            assert_eq!(rule(line).kind, RuleKind::Exact("tracker.evil.com".into()));
        }
    }

    #[test]
    fn test_parse_wildcard() {
        assert_eq!(rule("*.ads.com").kind, RuleKind::Wildcard("ads.com".into()));
    }

    #[test]
    fn test_parse_anchored() {
        assert_eq!(rule("||ads.com^").kind, RuleKind::Anchored("ads.com".into()));
        assert_eq!(rule("||Ads.Com").kind, RuleKind::Anchored("ads.com".into()));
    }

    #[test]
    fn test_parse_pattern_slash() {
        assert_eq!(rule("/Tracker/").kind, RuleKind::Pattern("tracker".into()));
    }

    #[test]
    fn test_parse_allow_prefix() {
        let r = rule("@@||safe.example^");
        assert_eq!(r.action, FilterAction::Allow);
        assert_eq!(r.kind, RuleKind::Anchored("safe.example".into()));
    }

    #[test]
    fn test_parse_dnstype_modifier() {
        let r = rule("||ads.com^$dnstype=AAAA|a");
        let types = r.dnstypes.unwrap();
        assert_eq!(types.as_slice(), &[RecordType::AAAA, RecordType::A]);
    }

    #[test]
    fn test_unknown_modifier_is_invalid() {
        assert_eq!(parse_list_line("||ads.com^$important"), ParsedLine::Invalid);
        assert_eq!(parse_list_line("||ads.com^$dnstype=BOGUS"), ParsedLine::Invalid);
    }

    #[test]
    fn test_skip_comments_and_blank() {
        assert_eq!(parse_list_line("# this is a comment"), ParsedLine::Skip);
        assert_eq!(parse_list_line("! adblock comment"), ParsedLine::Skip);
        assert_eq!(parse_list_line("   "), ParsedLine::Skip);
        assert_eq!(parse_list_line(""), ParsedLine::Skip);
    }

    #[test]
    fn test_skip_localhost() {
        assert_eq!(parse_list_line("127.0.0.1 localhost"), ParsedLine::Skip);
        assert_eq!(parse_list_line("0.0.0.0 0.0.0.0"), ParsedLine::Skip);
        assert_eq!(parse_list_line("0.0.0.0 broadcasthost"), ParsedLine::Skip);
    }

    #[test]
    fn test_invalid_lines() {
        // A single token with no dot is not a valid domain
        assert_eq!(parse_list_line("localhost"), ParsedLine::Invalid);
        assert_eq!(parse_list_line("10.0.0.1 printer.lan"), ParsedLine::Invalid);
        assert_eq!(parse_list_line("bad..domain.com"), ParsedLine::Invalid);
        assert_eq!(parse_list_line("*."), ParsedLine::Invalid);
    }

    // ---- compile_source ---------------------------------------------------

    fn filter() -> Filter {
        Filter::new(FilterId(3), "test", FilterSource::File("/dev/null".into()))
    }

    #[test]
    fn test_compile_source_counts_rules_and_invalid() {
        let text = b"# header\nads.com\nnot a rule\n||tracker.io^\n";
        let compiled = compile_source(&filter(), text).unwrap();
        assert_eq!(compiled.filter_id, FilterId(3));
        assert_eq!(compiled.rules.len(), 2);
        assert_eq!(compiled.invalid_lines, 1);
        assert_eq!(compiled.rules[1].text.as_ref(), "||tracker.io^");
    }

    #[test]
    fn test_compile_source_rejects_non_utf8() {
        let err = compile_source(&filter(), &[0x61, 0xff, 0xfe, 0x0a]).unwrap_err();
        assert!(matches!(err, DomainError::FilterCompile { .. }));
    }
}
