//! Endpoint parsing helpers for the text-scraping backends.

pub struct Utils;

impl Utils {
    /// Port of an endpoint: the last colon-delimited numeric segment.
    ///
    /// Handles "127.0.0.1:3000", "*:8080" and "[::1]:3000". Wildcard peers
    /// such as "*:*" yield `None`.
    pub fn port_of(endpoint: &str) -> Option<u16> {
        let (_, port) = endpoint.trim().rsplit_once(':')?;
        port.parse().ok()
    }

    /// Split an endpoint into (host, port).
    ///
    /// Handles multiple address formats:
    /// - IPv4: "127.0.0.1:3000" or "*:8080"
    /// - IPv6: "\[::1]:3000" or "\[fe80::1]:8080"
    /// - Bare IPv6 as printed by docker: ":::8080"
    pub fn split_endpoint(endpoint: &str) -> Option<(String, u16)> {
        let endpoint = endpoint.trim();
        let (host, port) = endpoint.rsplit_once(':')?;
        let port: u16 = port.parse().ok()?;
        Some((host.to_string(), port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_of() {
        assert_eq!(Utils::port_of("127.0.0.1:3000"), Some(3000));
        assert_eq!(Utils::port_of("*:8080"), Some(8080));
        assert_eq!(Utils::port_of("[::1]:3000"), Some(3000));
        assert_eq!(Utils::port_of("[fe80::1%lo0]:8080"), Some(8080));
        assert_eq!(Utils::port_of("*:*"), None);
        assert_eq!(Utils::port_of("nocolon"), None);
        assert_eq!(Utils::port_of("0.0.0.0:99999"), None);
    }

    #[test]
    fn test_split_endpoint() {
        assert_eq!(
            Utils::split_endpoint("0.0.0.0:8080"),
            Some(("0.0.0.0".to_string(), 8080))
        );
        assert_eq!(Utils::split_endpoint(":::8080"), Some(("::".to_string(), 8080)));
        assert_eq!(
            Utils::split_endpoint("[::]:443"),
            Some(("[::]".to_string(), 443))
        );
        assert_eq!(Utils::split_endpoint("8080"), None);
    }
}
