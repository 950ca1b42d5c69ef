/// Minimal address and domain helpers shared by the matchers and the policy
pub struct DomainUtils;

impl DomainUtils {
    /// Extract the lowercase domain from an email address
    pub fn extract_domain(email: &str) -> Option<String> {
        email
            .rsplit_once('@')
            .map(|(_, domain)| domain.trim_end_matches('>').to_lowercase())
            .filter(|domain| !domain.is_empty())
    }

    /// Check if domain matches any in list (exact or subdomain)
    pub fn matches_domain_list(domain: &str, domain_list: &[String]) -> bool {
        let domain_lower = domain.to_lowercase();

        domain_list.iter().any(|pattern| {
            let pattern_lower = pattern.to_lowercase();
            domain_lower == pattern_lower || domain_lower.ends_with(&format!(".{}", pattern_lower))
        })
    }

    /// Literal `@domain` suffix test on a full address.
    ///
    /// This is not an RFC domain parse: `"evil@x.com@vip.org"` ends with
    /// `@vip.org` and matches.
    pub fn address_has_domain(address: &str, domain: &str) -> bool {
        let domain = domain.trim().trim_start_matches('@').to_lowercase();
        if domain.is_empty() {
            return false;
        }
        address.to_lowercase().ends_with(&format!("@{}", domain))
    }

    /// Check whether the sender's domain falls under any listed domain
    pub fn sender_in_domains(sender: &str, domain_list: &[String]) -> bool {
        Self::extract_domain(sender)
            .map(|domain| Self::matches_domain_list(&domain, domain_list))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_domain() {
        assert_eq!(
            DomainUtils::extract_domain("user@Example.com"),
            Some("example.com".to_string())
        );
        assert_eq!(DomainUtils::extract_domain("invalid"), None);
        assert_eq!(DomainUtils::extract_domain("trailing@"), None);
    }

    #[test]
    fn test_matches_domain_list() {
        let domains = vec!["alaska.edu".to_string(), "edu".to_string()];

        assert!(DomainUtils::matches_domain_list("alaska.edu", &domains));
        assert!(DomainUtils::matches_domain_list("cs.alaska.edu", &domains));
        assert!(DomainUtils::matches_domain_list("mit.edu", &domains));
        assert!(!DomainUtils::matches_domain_list("education.com", &domains));
    }

    #[test]
    fn test_address_has_domain() {
        assert!(DomainUtils::address_has_domain("boss@vip.org", "vip.org"));
        assert!(DomainUtils::address_has_domain("boss@vip.org", "@VIP.org"));
        assert!(!DomainUtils::address_has_domain("boss@sub.vip.org", "vip.org"));
        assert!(!DomainUtils::address_has_domain("boss@notvip.org", "vip.org"));
        assert!(!DomainUtils::address_has_domain("boss@vip.org", ""));
    }

    #[test]
    fn test_sender_in_domains() {
        let domains = vec!["alaska.edu".to_string()];
        assert!(DomainUtils::sender_in_domains("x@alaska.edu", &domains));
        assert!(!DomainUtils::sender_in_domains("no-at-sign", &domains));
    }
}
