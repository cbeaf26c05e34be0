use std::fmt;

use lazy_static::lazy_static;
use log::warn;
use regex::Regex;

lazy_static! {
    // Shape of a BCP 47 tag, the supported list is checked afterwards
    static ref LANGUAGE_TAG: Regex = Regex::new(r"^[A-Za-z]{2,8}(-[A-Za-z0-9]{1,8})*$").unwrap();
}

/// The languages messages can be shown in
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Locale {
    #[default]
    English,
    Sinhala,
}

impl Locale {
    pub fn tag(self) -> &'static str {
        match self {
            Locale::English => "en",
            Locale::Sinhala => "si",
        }
    }

    /// Reads a stored language tag.
    ///
    /// Malformed tags and tags of unsupported languages give `None`. Region or
    /// script subtags are not matched to their language: `en-US` is not `en`.
    pub fn from_tag(tag: &str) -> Option<Locale> {
        let tag = tag.trim();
        if !LANGUAGE_TAG.is_match(tag) {
            warn!("ignoring malformed locale tag `{}`", tag);
            return None;
        }

        if tag.eq_ignore_ascii_case("en") {
            Some(Locale::English)
        } else if tag.eq_ignore_ascii_case("si") {
            Some(Locale::Sinhala)
        } else {
            warn!("ignoring unsupported locale `{}`", tag);
            None
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}
