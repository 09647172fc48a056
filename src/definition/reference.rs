use serde::Serialize;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use thiserror::Error;

/// A package reference in `name/version@user/channel` form.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize)]
pub struct Reference {
    pub name: String,
    pub version: String,
    pub user: String,
    pub channel: String,
}

#[derive(Debug, Error, Eq, PartialEq)]
#[error("invalid package reference `{0}`, expected name/version@user/channel")]
pub struct ReferenceError(pub String);

impl Reference {
    /// The source channel a resolver fetches this package from.
    pub fn source_channel(&self) -> String {
        format!("{}/{}", self.user, self.channel)
    }
}

fn valid_part(part: &str) -> bool {
    !part.is_empty()
        && part
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '+'))
}

impl FromStr for Reference {
    type Err = ReferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ReferenceError(s.to_string());

        let (name_version, user_channel) = s.split_once('@').ok_or_else(err)?;
        let (name, version) = name_version.split_once('/').ok_or_else(err)?;
        let (user, channel) = user_channel.split_once('/').ok_or_else(err)?;

        if ![name, version, user, channel].into_iter().all(valid_part) {
            return Err(err());
        }

        Ok(Reference {
            name: name.to_string(),
            version: version.to_string(),
            user: user.to_string(),
            channel: channel.to_string(),
        })
    }
}

impl Display for Reference {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}@{}/{}",
            self.name, self.version, self.user, self.channel
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_reference() {
        let reference: Reference = "libzmq/4.1.5@memsharded/stable".parse().unwrap();

        assert_eq!(reference.name, "libzmq");
        assert_eq!(reference.version, "4.1.5");
        assert_eq!(reference.source_channel(), "memsharded/stable");
        assert_eq!(reference.to_string(), "libzmq/4.1.5@memsharded/stable");
    }

    #[test]
    fn rejects_incomplete_references() {
        for input in [
            "zlib",
            "zlib/1.2.8",
            "zlib/1.2.8@lasote",
            "zlib@lasote/stable",
            "zlib/@lasote/stable",
            "zlib/1.2.8@lasote/stable/extra",
            "zlib/1.2.8@@lasote/stable",
        ] {
            assert_eq!(
                input.parse::<Reference>(),
                Err(ReferenceError(input.to_string())),
                "{} should be rejected",
                input
            );
        }
    }
}
