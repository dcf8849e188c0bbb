//! Classification of transient failures worth retrying.

use regex::Regex;

/// An output pattern that marks a failed invocation as retryable.
#[derive(Debug, Clone)]
pub struct RetryableError {
    pub pattern: Regex,
    pub description: &'static str,
}

/// Standard classification table for transient failures: network drops
/// while talking to backends, provider registries, and provider plugins.
/// Anything not matched here fails the run on the first attempt.
pub fn default_retryable_errors() -> Vec<RetryableError> {
    [
        (
            r"(?s).*net/http: TLS handshake timeout.*",
            "TLS handshake timeout",
        ),
        (
            r"(?s).*timeout while waiting for plugin to start.*",
            "provider plugin took too long to start",
        ),
        (r"(?s).*unexpected EOF.*", "connection dropped mid-response"),
        (
            r"(?s).*connection reset by peer.*",
            "connection reset by peer",
        ),
        (
            r"(?s).*Client\.Timeout exceeded while awaiting headers.*",
            "client timeout awaiting response headers",
        ),
        (
            r"(?s).*could not query provider registry.*",
            "provider registry unreachable",
        ),
        (
            r"(?s).*Error installing provider.*",
            "provider installation interrupted",
        ),
        (
            r"(?s).*Failed to load state.*tcp.*timeout.*",
            "backend timed out while loading state",
        ),
        (r"(?s).*dial tcp.*i/o timeout.*", "network dial timeout"),
        (
            r"(?s).*temporary failure in name resolution.*",
            "DNS resolution hiccup",
        ),
    ]
    .into_iter()
    .map(|(pattern, description)| RetryableError {
        pattern: Regex::new(pattern).expect("static pattern compiles"),
        description,
    })
    .collect()
}

/// First table entry matching `output`, if any.
pub fn classify<'a>(
    errors: &'a [RetryableError],
    output: &str,
) -> Option<&'a RetryableError> {
    errors.iter().find(|err| err.pattern.is_match(output))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_reset_is_retryable() {
        let table = default_retryable_errors();
        let output = "Error: error loading state: RequestError: send request failed\n\
                      caused by: read tcp 10.0.0.5:44321: connection reset by peer";
        let matched = classify(&table, output).unwrap();
        assert_eq!(matched.description, "connection reset by peer");
    }

    #[test]
    fn tls_handshake_timeout_is_retryable() {
        let table = default_retryable_errors();
        let output = "Error: Get \"https://registry.terraform.io/...\": net/http: TLS handshake timeout";
        assert!(classify(&table, output).is_some());
    }

    #[test]
    fn configuration_errors_are_not_retryable() {
        let table = default_retryable_errors();
        let output = "Error: Invalid count argument\n\n  on main.tf line 12, in resource \"azurerm_resource_group\" \"rg\"";
        assert!(classify(&table, output).is_none());
    }

    #[test]
    fn patterns_match_across_lines() {
        let table = default_retryable_errors();
        let output = "Failed to load state:\nsome context\nread tcp 1.2.3.4:443 timeout";
        assert!(classify(&table, output).is_some());
    }
}
