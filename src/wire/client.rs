//! Client-kind detection for the endpoints that answer JSON to mobile apps
//! and XML to everything else.

/// Substrings that mark a mobile user agent, checked case-insensitively.
const MOBILE_MARKERS: &[&str] = &["mobile", "android", "ios"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientKind {
    Mobile,
    Other,
}

impl ClientKind {
    pub fn is_mobile(self) -> bool {
        matches!(self, Self::Mobile)
    }
}

/// Classifies a client from its `User-Agent` header. A missing header is an
/// empty string and classifies as [`ClientKind::Other`].
pub fn classify(user_agent: &str) -> ClientKind {
    let lowered = user_agent.to_lowercase();
    if MOBILE_MARKERS.iter().any(|marker| lowered.contains(marker)) {
        ClientKind::Mobile
    } else {
        ClientKind::Other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mobile_markers_classify_as_mobile() {
        assert_eq!(classify("MobileApp/1.0"), ClientKind::Mobile);
        assert_eq!(classify("Dalvik/2.1 (Linux; Android 14)"), ClientKind::Mobile);
        assert_eq!(classify("MyApp iOS/3.2"), ClientKind::Mobile);
        assert_eq!(classify("ANDROID-client"), ClientKind::Mobile);
    }

    #[test]
    fn desktop_agents_classify_as_other() {
        assert_eq!(
            classify("Mozilla/5.0 (X11; Linux x86_64) Firefox/128.0"),
            ClientKind::Other
        );
        assert_eq!(classify("curl/8.5.0"), ClientKind::Other);
    }

    #[test]
    fn missing_agent_classifies_as_other() {
        assert_eq!(classify(""), ClientKind::Other);
    }

    #[test]
    fn substring_match_is_loose() {
        // "bios" contains "ios"; existing clients rely on the loose match.
        assert_eq!(classify("SmartBios/1.0"), ClientKind::Mobile);
    }
}
