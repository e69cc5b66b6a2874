//! Style profiles: the fixed set of target audiences a deck can be restyled for.
//!
//! The pipeline only checks that a profile is valid. The instruction block is
//! consumed by whichever transform talks to the language model.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const GEN_Z_INSTRUCTIONS: &str = "\
Audience: teens and young adults (roughly 13-25), digital natives raised on \
short-form video, streaming and group chats.
Voice: ultra-casual, punchy, self-aware humor, current internet slang used \
naturally (\"no cap\", \"it's giving\", \"lowkey\"), emoji welcome.
Priorities: authenticity, social values, side hustles, mental health openness.
Write as a young creator talking straight to their peers.";

const MILLENNIALS_INSTRUCTIONS: &str = "\
Audience: adults roughly 26-60 balancing careers, family and finances, who \
moved from a pre-digital to a digital world.
Voice: a mix of casual and professional, direct, light humor and nostalgic \
references, established expressions (\"adulting\", \"bottom line\", \"fair enough\").
Priorities: work-life balance, practical value, proven results, no hype.
Acknowledge their life stage and keep it real.";

const BOOMERS_INSTRUCTIONS: &str = "\
Audience: adults 60 and over who value reliability, courtesy and detail.
Voice: respectful and clear, complete sentences, no trendy slang or \
abbreviations, traditional business wording.
Priorities: quality, trustworthiness, customer service, long-term value.
Explain how the offer genuinely improves their lives.";

/// A named target communication style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StyleProfile {
    /// Teens and young adults.
    #[serde(rename = "gen-z")]
    GenZ,
    /// Working-age adults.
    #[serde(rename = "millennials")]
    Millennials,
    /// Older adults.
    #[serde(rename = "boomers")]
    Boomers,
}

impl StyleProfile {
    /// Every known profile, in display order.
    pub const ALL: [StyleProfile; 3] = [Self::GenZ, Self::Millennials, Self::Boomers];

    /// Identifier used on the command line and in requests.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GenZ => "gen-z",
            Self::Millennials => "millennials",
            Self::Boomers => "boomers",
        }
    }

    /// Static instruction block for the transform's prompt.
    pub fn instructions(&self) -> &'static str {
        match self {
            Self::GenZ => GEN_Z_INSTRUCTIONS,
            Self::Millennials => MILLENNIALS_INSTRUCTIONS,
            Self::Boomers => BOOMERS_INSTRUCTIONS,
        }
    }
}

impl FromStr for StyleProfile {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s.trim())
            .ok_or_else(|| Error::UnsupportedStyleProfile(s.to_string()))
    }
}

impl fmt::Display for StyleProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_profiles() {
        assert_eq!("gen-z".parse::<StyleProfile>().unwrap(), StyleProfile::GenZ);
        assert_eq!(
            " millennials ".parse::<StyleProfile>().unwrap(),
            StyleProfile::Millennials
        );
        assert_eq!("boomers".parse::<StyleProfile>().unwrap(), StyleProfile::Boomers);
    }

    #[test]
    fn test_parse_unknown_profile() {
        let err = "gen-alpha".parse::<StyleProfile>().unwrap_err();
        assert!(matches!(err, Error::UnsupportedStyleProfile(ref s) if s == "gen-alpha"));
    }

    #[test]
    fn test_display_round_trips() {
        for profile in StyleProfile::ALL {
            assert_eq!(profile.to_string().parse::<StyleProfile>().unwrap(), profile);
            assert!(!profile.instructions().is_empty());
        }
    }
}
