//! ID utilities.

use ulid::Ulid;

/// Generate a short session ID using ULID, truncated for readability.
/// The leading characters encode the millisecond timestamp, so the short
/// form keeps the trailing 10 of the random half instead; 50 random bits
/// is plenty for in-memory sessions.
pub fn new_session_id() -> String {
    let ulid = Ulid::new().to_string();
    ulid[ulid.len() - 10..].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_short_and_distinct() {
        let a = new_session_id();
        assert_eq!(a.len(), 10);

        // A burst of ids lands within the same millisecond; every one must
        // still be unique.
        let burst: std::collections::HashSet<String> =
            (0..1000).map(|_| new_session_id()).collect();
        assert_eq!(burst.len(), 1000);
    }
}
