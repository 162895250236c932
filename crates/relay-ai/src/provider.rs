use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
/// Enumerates supported `Provider` families.
pub enum Provider {
    Anthropic,
    Ollama,
}

impl Provider {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Anthropic => "anthropic",
            Self::Ollama => "ollama",
        }
    }

    /// Parses a provider family name, case-insensitively.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "anthropic" => Some(Self::Anthropic),
            "ollama" => Some(Self::Ollama),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Provider;

    #[test]
    fn unit_provider_parse_accepts_case_insensitive_names() {
        assert_eq!(Provider::parse("Anthropic"), Some(Provider::Anthropic));
        assert_eq!(Provider::parse(" ollama "), Some(Provider::Ollama));
        assert_eq!(Provider::parse("openai"), None);
    }

    #[test]
    fn unit_provider_as_str_round_trips_through_parse() {
        for provider in [Provider::Anthropic, Provider::Ollama] {
            assert_eq!(Provider::parse(provider.as_str()), Some(provider));
        }
    }
}
