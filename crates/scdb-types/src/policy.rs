use serde::{Deserialize, Serialize};

/// How the node votes on a WT^ when neither the block nor the operator says otherwise.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DefaultVotePolicy {
    /// Upvote the most recently announced WT^ of each sidechain, abstain on the rest.
    #[default]
    UpvoteNewest,

    /// Abstain on everything. Other nodes are expected to upvote the newest WT^.
    Abstain,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_names() {
        assert_eq!(
            serde_json::to_string(&DefaultVotePolicy::UpvoteNewest).unwrap(),
            "\"upvote-newest\""
        );
        let p: DefaultVotePolicy = serde_json::from_str("\"abstain\"").unwrap();
        assert_eq!(p, DefaultVotePolicy::Abstain);
    }
}
