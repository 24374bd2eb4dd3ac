//! Snapshot tests for core types

#[cfg(test)]
mod snapshot_tests {
    use crate::{ConversationTurn, SearchConfig};
    use insta::assert_yaml_snapshot;

    #[test]
    fn test_conversation_turns_snapshot() {
        let turns = vec![
            ConversationTurn::user("what is entropy"),
            ConversationTurn::assistant("a measure of disorder"),
        ];

        assert_yaml_snapshot!(turns, @r###"
        - role: user
          text: what is entropy
        - role: assistant
          text: a measure of disorder
        "###);
    }

    #[test]
    fn test_search_config_default_snapshot() {
        assert_yaml_snapshot!(SearchConfig::default(), @r###"
        top_k: 4
        score_threshold: ~
        "###);
    }
}
