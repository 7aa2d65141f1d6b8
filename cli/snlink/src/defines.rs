//! `-D name[=value]` parsing. Values accept decimal, `0x`/`$`-prefixed
//! hex, or `%`-prefixed binary, matching the cross-assembler's own
//! literal syntax that these values are meant to interoperate with.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BadDefine(pub String);

impl std::fmt::Display for BadDefine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid -D argument '{}'", self.0)
    }
}

impl std::error::Error for BadDefine {}

pub fn parse_define(arg: &str) -> Result<(String, u32), BadDefine> {
    match arg.split_once('=') {
        None => Ok((arg.to_string(), 1)),
        Some((name, value)) => {
            if name.is_empty() {
                return Err(BadDefine(arg.to_string()));
            }
            let value = parse_literal(value).ok_or_else(|| BadDefine(arg.to_string()))?;
            Ok((name.to_string(), value))
        }
    }
}

fn parse_literal(s: &str) -> Option<u32> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).or_else(|| s.strip_prefix('$')) {
        return u32::from_str_radix(hex, 16).ok();
    }
    if let Some(bin) = s.strip_prefix('%') {
        return u32::from_str_radix(bin, 2).ok();
    }
    s.parse::<u32>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_name_defaults_to_one() {
        assert_eq!(parse_define("DEBUG").unwrap(), ("DEBUG".to_string(), 1));
    }

    #[test]
    fn decimal_value() {
        assert_eq!(parse_define("VERSION=42").unwrap(), ("VERSION".to_string(), 42));
    }

    #[test]
    fn hex_with_0x_prefix() {
        assert_eq!(parse_define("BASE=0xff00").unwrap(), ("BASE".to_string(), 0xff00));
    }

    #[test]
    fn hex_with_dollar_prefix() {
        assert_eq!(parse_define("BASE=$ff00").unwrap(), ("BASE".to_string(), 0xff00));
    }

    #[test]
    fn binary_with_percent_prefix() {
        assert_eq!(parse_define("MASK=%1010").unwrap(), ("MASK".to_string(), 0b1010));
    }

    #[test]
    fn malformed_value_is_rejected() {
        assert!(parse_define("X=nope").is_err());
    }

    #[test]
    fn empty_name_is_rejected() {
        assert!(parse_define("=5").is_err());
    }
}
