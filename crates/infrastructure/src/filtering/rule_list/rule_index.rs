use super::compiler::{DnsTypes, RuleKind, SourceRules};
use super::suffix_trie::{RuleId, SuffixTrie};
use aho_corasick::AhoCorasick;
use compact_str::CompactString;
use dnsieve_domain::{
    DomainError, FilterAction, FilterId, FilterRequest, MatchResult, SourceStats,
};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::sync::Arc;

/// One compiled rule: its source line, owning filter and type restriction.
struct RuleMeta {
    text: Arc<str>,
    filter_id: FilterId,
    dnstypes: Option<DnsTypes>,
}

impl RuleMeta {
    /// `$dnstype` rules only ever apply to the client's question.
    #[inline]
    fn applies(&self, request: &FilterRequest) -> bool {
        match &self.dnstypes {
            None => true,
            Some(types) => !request.answer && types.contains(&request.record_type),
        }
    }
}

/// Exact, suffix and pattern rules of one action.
#[derive(Default)]
struct RuleSet {
    exact: FxHashMap<CompactString, SmallVec<[RuleId; 1]>>,
    suffix: SuffixTrie,
    patterns: Option<AhoCorasick>,
    /// Aho-Corasick pattern index → rule.
    pattern_rules: Vec<RuleId>,
}

impl RuleSet {
    /// Lookup order: exact → suffix trie (anchored and wildcard) → patterns.
    #[inline]
    fn find(&self, rules: &[RuleMeta], host: &str, request: &FilterRequest) -> Option<RuleId> {
        let accept = |id: RuleId| rules[id as usize].applies(request);

        if let Some(ids) = self.exact.get(host) {
            if let Some(id) = ids.iter().copied().find(|id| accept(*id)) {
                return Some(id);
            }
        }

        if let Some(id) = self.suffix.lookup(host, accept) {
            return Some(id);
        }

        let ac = self.patterns.as_ref()?;
        ac.find_overlapping_iter(host)
            .map(|m| self.pattern_rules[m.pattern().as_usize()])
            .find(|id| accept(*id))
    }

    fn len(&self) -> usize {
        self.exact.values().map(|ids| ids.len()).sum::<usize>()
            + self.suffix.len()
            + self.pattern_rules.len()
    }
}

/// The compiled matcher for all sources of one engine. Immutable once built.
///
/// Replaced atomically via `ArcSwap<CompiledRules>` on refresh.
#[derive(Default)]
pub struct CompiledRules {
    rules: Vec<RuleMeta>,
    allow: RuleSet,
    block: RuleSet,
    stats: Vec<SourceStats>,
}

impl CompiledRules {
    /// A matcher that matches nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build one matcher out of every source's rules. `stats` are carried
    /// as-is for observability.
    pub fn build(
        sources: Vec<SourceRules>,
        stats: Vec<SourceStats>,
    ) -> Result<Self, DomainError> {
        let mut compiled = Self {
            stats,
            ..Self::default()
        };
        let mut allow_patterns: Vec<String> = Vec::new();
        let mut block_patterns: Vec<String> = Vec::new();

        for source in sources {
            for rule in source.rules {
                let id = compiled.rules.len() as RuleId;
                compiled.rules.push(RuleMeta {
                    text: rule.text,
                    filter_id: source.filter_id,
                    dnstypes: rule.parsed.dnstypes,
                });

                let (set, patterns) = match rule.parsed.action {
                    FilterAction::Allow => (&mut compiled.allow, &mut allow_patterns),
                    FilterAction::Block => (&mut compiled.block, &mut block_patterns),
                };

                match rule.parsed.kind {
                    RuleKind::Exact(domain) => {
                        set.exact
                            .entry(CompactString::new(domain))
                            .or_default()
                            .push(id);
                    }
                    RuleKind::Wildcard(domain) => set.suffix.insert_wildcard(&domain, id),
                    RuleKind::Anchored(domain) => set.suffix.insert_anchored(&domain, id),
                    RuleKind::Pattern(text) => {
                        patterns.push(text);
                        set.pattern_rules.push(id);
                    }
                }
            }
        }

        compiled.allow.patterns = build_automaton(&allow_patterns)?;
        compiled.block.patterns = build_automaton(&block_patterns)?;

        Ok(compiled)
    }

    /// Match a normalized hostname. Allow rules take precedence.
    #[inline]
    pub fn lookup(&self, host: &str, request: &FilterRequest) -> Option<MatchResult> {
        if let Some(id) = self.allow.find(&self.rules, host, request) {
            return Some(self.result(id, FilterAction::Allow));
        }
        self.block
            .find(&self.rules, host, request)
            .map(|id| self.result(id, FilterAction::Block))
    }

    fn result(&self, id: RuleId, action: FilterAction) -> MatchResult {
        let meta = &self.rules[id as usize];
        MatchResult {
            action,
            rule: Arc::clone(&meta.text),
            filter_id: meta.filter_id,
        }
    }

    pub fn rules_count(&self) -> usize {
        self.allow.len() + self.block.len()
    }

    pub fn stats(&self) -> &[SourceStats] {
        &self.stats
    }
}

fn build_automaton(patterns: &[String]) -> Result<Option<AhoCorasick>, DomainError> {
    if patterns.is_empty() {
        return Ok(None);
    }
    AhoCorasick::builder()
        .ascii_case_insensitive(true)
        .build(patterns)
        .map(Some)
        .map_err(|e| DomainError::FilterCompile {
            filter: "patterns".to_string(),
            reason: e.to_string(),
        })
}
