//! Character encodings accepted for model and input files.
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

/// Text encoding of an ARPA file or a batch of input sequences.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    /// Strict UTF-8. Invalid byte sequences are rejected.
    #[default]
    Utf8,
    /// ISO-8859-1: each byte is the code point of the same value.
    Latin1,
}

impl Encoding {
    /// Decode one line of raw bytes. Returns `None` if the bytes are not valid
    /// in this encoding.
    pub fn decode<'a>(&self, bytes: &'a [u8]) -> Option<Cow<'a, str>> {
        match self {
            Encoding::Utf8 => std::str::from_utf8(bytes).ok().map(Cow::Borrowed),
            Encoding::Latin1 => {
                if bytes.is_ascii() {
                    // ASCII is identical in both encodings
                    std::str::from_utf8(bytes).ok().map(Cow::Borrowed)
                } else {
                    Some(Cow::Owned(bytes.iter().map(|&b| b as char).collect()))
                }
            }
        }
    }
}

impl FromStr for Encoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "utf8" | "utf-8" => Ok(Encoding::Utf8),
            "latin1" | "latin-1" | "iso-8859-1" | "iso8859-1" => Ok(Encoding::Latin1),
            other => Err(format!("unknown encoding {other:?} (expected utf8 or latin1)")),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Encoding::Utf8 => f.write_str("utf8"),
            Encoding::Latin1 => f.write_str("latin1"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utf8_is_strict() {
        assert_eq!(Encoding::Utf8.decode("kissa".as_bytes()).as_deref(), Some("kissa"));
        assert_eq!(Encoding::Utf8.decode("äiti".as_bytes()).as_deref(), Some("äiti"));
        assert!(Encoding::Utf8.decode(&[b'a', 0xe4, b'b']).is_none());
    }

    #[test]
    fn latin1_maps_every_byte() {
        let decoded = Encoding::Latin1.decode(&[b'a', 0xe4, b'b']).unwrap();
        assert_eq!(decoded, "aäb");
        assert!(matches!(Encoding::Latin1.decode(b"plain"), Some(Cow::Borrowed("plain"))));
    }

    #[test]
    fn parses_common_names() {
        assert_eq!("UTF-8".parse::<Encoding>(), Ok(Encoding::Utf8));
        assert_eq!("iso-8859-1".parse::<Encoding>(), Ok(Encoding::Latin1));
        assert!("ebcdic".parse::<Encoding>().is_err());
        assert_eq!(Encoding::Latin1.to_string(), "latin1");
    }
}
