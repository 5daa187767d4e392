const HEX: &[u8] = b"0123456789ABCDEF";
const NUMERIC: &[u8] = b"0123456789";
const ALPHA: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";
const ALPHANUMERIC: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Alphabets for the random-token placeholders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Charset {
    Hex,
    Alpha,
    Numeric,
    Alphanumeric,
}

impl Charset {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "hex" => Some(Self::Hex),
            "alpha" => Some(Self::Alpha),
            "numeric" => Some(Self::Numeric),
            "alphanumeric" => Some(Self::Alphanumeric),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Hex => "hex",
            Self::Alpha => "alpha",
            Self::Numeric => "numeric",
            Self::Alphanumeric => "alphanumeric",
        }
    }

    fn alphabet(self) -> &'static [u8] {
        match self {
            Self::Hex => HEX,
            Self::Alpha => ALPHA,
            Self::Numeric => NUMERIC,
            Self::Alphanumeric => ALPHANUMERIC,
        }
    }

    pub fn generate(self, len: usize) -> String {
        let alphabet = self.alphabet();
        (0..len)
            .map(|_| char::from(alphabet[fastrand::usize(..alphabet.len())]))
            .collect()
    }
}
