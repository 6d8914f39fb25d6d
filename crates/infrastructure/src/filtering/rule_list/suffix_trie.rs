use compact_str::CompactString;
use rustc_hash::FxBuildHasher;
use smallvec::SmallVec;
use std::collections::HashMap;

/// Index into the compiled rule table.
pub type RuleId = u32;

/// A node in the reversed-label suffix trie.
#[derive(Default)]
struct TrieNode {
    children: HashMap<CompactString, TrieNode, FxBuildHasher>,
    /// `*.ads.com` rules terminating here. Only strict subdomains match.
    wildcard: SmallVec<[RuleId; 1]>,
    /// `||ads.com^` rules terminating here. The domain itself matches too.
    anchored: SmallVec<[RuleId; 1]>,
}

/// Suffix trie for subdomain matching.
///
/// Domains are stored as reversed label paths: `ads.com` → ["com", "ads"].
///
/// Lookup for `sub.ads.com`:
///   Reversed labels: ["com", "ads", "sub"]
///   Walk: root → "com" → "ads" (rules here apply to "sub.ads.com") → "sub"
///
/// Built once per refresh and replaced with the rest of the compiled rules.
#[derive(Default)]
pub struct SuffixTrie {
    root: TrieNode,
    len: usize,
}

impl SuffixTrie {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Insert a `*.domain` rule. `domain` is given without the leading `*.`.
    pub fn insert_wildcard(&mut self, domain: &str, rule: RuleId) {
        self.node_mut(domain).wildcard.push(rule);
        self.len += 1;
    }

    /// Insert a `||domain^` rule.
    pub fn insert_anchored(&mut self, domain: &str, rule: RuleId) {
        self.node_mut(domain).anchored.push(rule);
        self.len += 1;
    }

    fn node_mut(&mut self, domain: &str) -> &mut TrieNode {
        let mut node = &mut self.root;
        for label in domain.split('.').rev() {
            node = node.children.entry(CompactString::new(label)).or_default();
        }
        node
    }

    /// Find the most specific rule covering `domain` for which `accept`
    /// returns true.
    ///
    /// A wildcard rule at node N needs at least one more label below N:
    /// `*.ads.com` matches `sub.ads.com` but NOT `ads.com`.
    #[inline]
    pub fn lookup<F>(&self, domain: &str, mut accept: F) -> Option<RuleId>
    where
        F: FnMut(RuleId) -> bool,
    {
        let labels: SmallVec<[&str; 8]> = domain.split('.').rev().collect();
        let n = labels.len();
        let mut node = &self.root;
        let mut found = None;

        for (i, label) in labels.iter().enumerate() {
            let Some(child) = node.children.get(*label) else {
                break;
            };
            let has_subdomain = i + 1 < n;

            if let Some(rule) = child.anchored.iter().copied().find(|r| accept(*r)) {
                found = Some(rule);
            }
            if has_subdomain {
                if let Some(rule) = child.wildcard.iter().copied().find(|r| accept(*r)) {
                    found = Some(rule);
                }
            }
            node = child;
        }

        found
    }
}
