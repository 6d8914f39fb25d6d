use super::errors::DomainError;
use super::normalize_hostname;
use std::sync::Arc;

/// One `DOMAIN[,DOMAIN...]/IPSET_NAME[,IPSET_NAME...]` configuration line.
///
/// A line with a lone empty domain (`/SET`) maps the root zone and therefore
/// matches every host. Empty items inside a domain list are rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpsetMapping {
    pub domains: Vec<Arc<str>>,
    pub sets: Vec<Arc<str>>,
}

impl IpsetMapping {
    /// Parse a single configuration line. `line_no` is 1-based and only used
    /// for error reporting.
    pub fn parse(line: &str, line_no: usize) -> Result<Self, DomainError> {
        let invalid = |reason: &str| DomainError::InvalidIpsetConfig {
            line: line_no,
            reason: reason.to_string(),
        };

        let line = line.trim();
        if line.is_empty() {
            return Err(invalid("blank lines are not allowed"));
        }
        if line.starts_with('#') {
            return Err(invalid("comments are not allowed"));
        }

        let mut parts = line.split('/');
        let (hosts, names) = match (parts.next(), parts.next(), parts.next()) {
            (Some(hosts), Some(names), None) => (hosts, names),
            _ => return Err(invalid("expected exactly one slash")),
        };

        let mut sets = Vec::new();
        for name in names.split(',') {
            let name = name.trim();
            if name.is_empty() {
                return Err(invalid("empty ipset name"));
            }
            sets.push(Arc::from(name));
        }

        let hosts: Vec<String> = hosts
            .split(',')
            .map(|host| normalize_hostname(host.trim()))
            .collect();
        // Only a lone empty domain, as in `/SET`, stands for the root zone.
        if hosts.len() > 1 && hosts.iter().any(String::is_empty) {
            return Err(invalid("empty domain"));
        }
        let domains = hosts.into_iter().map(Arc::from).collect();

        Ok(Self { domains, sets })
    }

    /// Parse the whole configured list. Any bad line fails the whole list.
    pub fn parse_list<S: AsRef<str>>(lines: &[S]) -> Result<Vec<Self>, DomainError> {
        lines
            .iter()
            .enumerate()
            .map(|(idx, line)| Self::parse(line.as_ref(), idx + 1))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_pair() {
        let m = IpsetMapping::parse("example.com/ipset1", 1).unwrap();
        assert_eq!(m.domains, vec![Arc::from("example.com")]);
        assert_eq!(m.sets, vec![Arc::from("ipset1")]);
    }

    #[test]
    fn test_parse_multiple_domains_and_sets() {
        let m = IpsetMapping::parse(" A.example. , b.example /set4, set6 ", 1).unwrap();
        assert_eq!(
            m.domains,
            vec![Arc::from("a.example"), Arc::from("b.example")]
        );
        assert_eq!(m.sets, vec![Arc::from("set4"), Arc::from("set6")]);
    }

    #[test]
    fn test_parse_root_zone_domain() {
        let m = IpsetMapping::parse("/everything", 1).unwrap();
        assert_eq!(m.domains, vec![Arc::from("")]);
    }

    #[test]
    fn test_reject_bad_lines() {
        assert!(IpsetMapping::parse("", 1).is_err());
        assert!(IpsetMapping::parse("# comment", 1).is_err());
        assert!(IpsetMapping::parse("example.com", 1).is_err());
        assert!(IpsetMapping::parse("example.com/a/b", 1).is_err());
        assert!(IpsetMapping::parse("example.com/a,,b", 1).is_err());
    }

    #[test]
    fn test_reject_empty_domain_in_list() {
        let err = IpsetMapping::parse("a.example,/s", 3).unwrap_err();
        assert!(matches!(err, DomainError::InvalidIpsetConfig { line: 3, .. }));
        assert!(IpsetMapping::parse(",a.example/s", 1).is_err());
        assert!(IpsetMapping::parse("a.example,,b.example/s", 1).is_err());
        assert!(IpsetMapping::parse("a.example, ./s", 1).is_err());
    }

    #[test]
    fn test_parse_list_reports_line_number() {
        let err = IpsetMapping::parse_list(&["a.example/s1", "broken"]).unwrap_err();
        assert!(matches!(err, DomainError::InvalidIpsetConfig { line: 2, .. }));
    }
}
