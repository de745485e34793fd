//! Tenant resolution from request hosts.

/// Extract the organization subdomain from a request `host`.
///
/// `host` may carry a port. Only hosts of the form `<label>.<base_domain>`
/// resolve; the apex domain and nested subdomains do not. The result is
/// lowercased.
pub fn subdomain_from_host(host: &str, base_domain: &str) -> Option<String> {
    let host = host.split(':').next()?.trim_end_matches('.').to_ascii_lowercase();
    let base = base_domain.trim_matches('.').to_ascii_lowercase();

    let label = host.strip_suffix(&base)?.strip_suffix('.')?;
    if label.is_empty() || label.contains('.') {
        return None;
    }
    if !label
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-')
    {
        return None;
    }
    Some(label.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_single_label() {
        assert_eq!(
            subdomain_from_host("acme.threadline.app", "threadline.app").as_deref(),
            Some("acme")
        );
    }

    #[test]
    fn strips_port_and_case() {
        assert_eq!(
            subdomain_from_host("ACME.Threadline.app:8080", "threadline.app").as_deref(),
            Some("acme")
        );
    }

    #[test]
    fn apex_and_nested_hosts_do_not_resolve() {
        assert_eq!(subdomain_from_host("threadline.app", "threadline.app"), None);
        assert_eq!(
            subdomain_from_host("a.b.threadline.app", "threadline.app"),
            None
        );
    }

    #[test]
    fn foreign_domain_does_not_resolve() {
        assert_eq!(subdomain_from_host("acme.example.com", "threadline.app"), None);
        // Suffix match must fall on a label boundary.
        assert_eq!(subdomain_from_host("evilthreadline.app", "threadline.app"), None);
    }
}
