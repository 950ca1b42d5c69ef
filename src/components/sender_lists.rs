use crate::domain_utils::DomainUtils;

/// Exact addresses plus `@domain` suffixes, matched case-insensitively.
///
/// Domain matching is a literal suffix test on the whole address, not a
/// parse of the domain part. A crafted local part such as
/// `"x@evil.com@vip.org"` therefore matches `vip.org`; upstream header
/// validation is expected to reject such addresses.
#[derive(Debug, Clone, Default)]
pub struct SenderList {
    senders: Vec<String>,
    domains: Vec<String>,
}

impl SenderList {
    pub fn new(senders: &[String], domains: &[String]) -> Self {
        Self {
            senders: normalize_entries(senders, false),
            domains: normalize_entries(domains, true),
        }
    }

    pub fn contains(&self, sender: &str) -> bool {
        let sender = sender.trim().to_lowercase();
        if sender.is_empty() {
            return false;
        }
        self.senders.iter().any(|s| *s == sender)
            || self
                .domains
                .iter()
                .any(|d| DomainUtils::address_has_domain(&sender, d))
    }

    pub fn is_empty(&self) -> bool {
        self.senders.is_empty() && self.domains.is_empty()
    }
}

fn normalize_entries(entries: &[String], strip_at: bool) -> Vec<String> {
    entries
        .iter()
        .map(|e| {
            let e = e.trim().to_lowercase();
            if strip_at {
                e.trim_start_matches('@').to_string()
            } else {
                e
            }
        })
        .filter(|e| !e.is_empty())
        .collect()
}
