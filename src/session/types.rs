use serde::{Deserialize, Serialize};

/// Speaker of a conversation turn.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}

/// One conversation turn. Serializes with the `role`/`content` keys the
/// interaction endpoints exchange with clients.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Renders turns as the `role: content` transcript lines the prompt
/// builders embed.
pub fn render_context(turns: &[Turn]) -> String {
    turns
        .iter()
        .map(|turn| format!("{}: {}", turn.role, turn.content))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turns_serialize_with_wire_keys() {
        let json = serde_json::to_value(Turn::user("hola")).unwrap();
        assert_eq!(json, serde_json::json!({"role": "user", "content": "hola"}));
        let back: Turn = serde_json::from_value(json).unwrap();
        assert_eq!(back, Turn::user("hola"));
    }

    #[test]
    fn context_renders_one_line_per_turn() {
        let turns = vec![Turn::user("me duele la cabeza"), Turn::assistant("desde cuando?")];
        assert_eq!(
            render_context(&turns),
            "user: me duele la cabeza\nassistant: desde cuando?"
        );
    }

    #[test]
    fn empty_history_renders_empty_context() {
        assert_eq!(render_context(&[]), "");
    }
}
