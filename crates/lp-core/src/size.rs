//! Parser for typed sizes like `1024x1024`, `800,600`, or `640 480`.

use winnow::ascii::{digit1, space0, space1};
use winnow::combinator::alt;
use winnow::prelude::*;

const SIZE_HINT: &str = "enter size like 1024x1024 or 800,600";

/// Parse a `W×H` size. Accepts `x`, `×`, `,` or whitespace between the two
/// numbers, ignores case and surrounding whitespace. Both sides are at least 1.
///
/// # Errors
/// Returns a hint string when the input is not two separated integers.
pub fn parse_size(text: &str) -> Result<(u32, u32), String> {
    let normalized = text.trim().to_lowercase().replace('×', "x");
    let (w, _, h) = (parse_side, parse_separator, parse_side)
        .parse(normalized.as_str())
        .map_err(|_| SIZE_HINT.to_string())?;
    Ok((w.max(1), h.max(1)))
}

fn parse_side(input: &mut &str) -> ModalResult<u32> {
    digit1.try_map(|s: &str| s.parse::<u32>()).parse_next(input)
}

fn parse_separator(input: &mut &str) -> ModalResult<()> {
    alt(((space0, alt(('x', ',')), space0).void(), space1.void())).parse_next(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_common_separators() {
        assert_eq!(parse_size("1024x768"), Ok((1024, 768)));
        assert_eq!(parse_size(" 800 , 600 "), Ok((800, 600)));
        assert_eq!(parse_size("640 480"), Ok((640, 480)));
        assert_eq!(parse_size("1920×1080"), Ok((1920, 1080)));
        assert_eq!(parse_size("12X34"), Ok((12, 34)));
    }

    #[test]
    fn zero_sides_become_one() {
        assert_eq!(parse_size("0x5"), Ok((1, 5)));
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_size("").is_err());
        assert!(parse_size("800").is_err());
        assert!(parse_size("800x").is_err());
        assert!(parse_size("-5x5").is_err());
        assert!(parse_size("8x8x8").is_err());
    }
}
