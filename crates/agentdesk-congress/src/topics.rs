/// Search query for a topic: known topics expand to their keywords, anything
/// else is searched as given; terms are joined with `" OR "`
pub fn topic_query(topic: &str) -> String {
    let keywords: &[&str] = match topic.trim().to_lowercase().as_str() {
        "gun laws" => &["firearm", "weapon", "second amendment", "gun control", "gun rights"],
        "healthcare" => &["health", "medical", "insurance", "medicare", "medicaid"],
        _ => return topic.to_string(),
    };
    keywords.join(" OR ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_topics_expand() {
        assert_eq!(
            topic_query("Gun Laws"),
            "firearm OR weapon OR second amendment OR gun control OR gun rights"
        );
        assert_eq!(
            topic_query("healthcare"),
            "health OR medical OR insurance OR medicare OR medicaid"
        );
    }

    #[test]
    fn test_unknown_topic_is_used_verbatim() {
        assert_eq!(topic_query("privacy"), "privacy");
    }
}
