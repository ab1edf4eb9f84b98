use serde::{Deserialize, Serialize};

/// A named capability a user account may hold.
///
/// Codenames follow the `<app>.<action>_<model>` convention, e.g.
/// `proposals.add_proposal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Permission {
    #[serde(rename = "proposals.add_proposal")]
    AddProposal,
    #[serde(rename = "proposals.edit_proposal")]
    EditProposal,
    #[serde(rename = "proposals.delete_proposal")]
    DeleteProposal,
    #[serde(rename = "news.add_post")]
    AddPost,
    #[serde(rename = "news.edit_post")]
    EditPost,
    #[serde(rename = "news.delete_post")]
    DeletePost,
}

impl Permission {
    pub const ALL: [Permission; 6] = [
        Self::AddProposal,
        Self::EditProposal,
        Self::DeleteProposal,
        Self::AddPost,
        Self::EditPost,
        Self::DeletePost,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AddProposal => "proposals.add_proposal",
            Self::EditProposal => "proposals.edit_proposal",
            Self::DeleteProposal => "proposals.delete_proposal",
            Self::AddPost => "news.add_post",
            Self::EditPost => "news.edit_post",
            Self::DeletePost => "news.delete_post",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == s)
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codenames_round_trip() {
        for permission in Permission::ALL {
            assert_eq!(Permission::from_str(permission.as_str()), Some(permission));
        }
    }

    #[test]
    fn unknown_codename_is_rejected() {
        assert_eq!(Permission::from_str("proposals.vote_proposal"), None);
        assert_eq!(Permission::from_str(""), None);
    }

    #[test]
    fn serializes_as_codename() {
        let json = serde_json::to_string(&Permission::EditPost).unwrap();
        assert_eq!(json, "\"news.edit_post\"");
    }
}
