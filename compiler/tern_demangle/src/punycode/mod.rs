//! Restricted punycode used for non-ASCII identifiers.
//!
//! Follows RFC 3492 with three changes so the encoded form is itself a valid
//! symbol fragment:
//!
//! - digits are `a-z` (0-25) followed by `A-J` (26-35)
//! - the delimiter between basic and encoded code points is `_`
//! - ASCII characters that may not appear in a symbol are shifted into
//!   `0xD800..0xD880` before encoding and shifted back after decoding
//!
//! Every arithmetic step is overflow-checked; a decode that would overflow
//! fails instead of wrapping.

const BASE: u32 = 36;
const TMIN: u32 = 1;
const TMAX: u32 = 26;
const SKEW: u32 = 38;
const DAMP: u32 = 700;
const INITIAL_BIAS: u32 = 72;
const INITIAL_N: u32 = 128;
const DELIMITER: u8 = b'_';

/// Start of the block that carries shifted ASCII characters.
const MAPPED_ASCII_START: u32 = 0xD800;
const MAPPED_ASCII_END: u32 = 0xD880;

/// Why a punycode fragment was rejected.
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PunycodeError {
    #[error("non-basic code point before the delimiter")]
    NonBasicPrefix,
    #[error("truncated digit sequence")]
    Truncated,
    #[error("invalid digit {0:?}")]
    InvalidDigit(char),
    #[error("arithmetic overflow")]
    Overflow,
    #[error("decoded a basic code point")]
    BasicCodePoint,
    #[error("code point {0:#x} is not a valid scalar")]
    InvalidScalar(u32),
}

fn digit_index(byte: u8) -> Option<u32> {
    match byte {
        b'a'..=b'z' => Some(u32::from(byte - b'a')),
        b'A'..=b'J' => Some(u32::from(byte - b'A') + 26),
        _ => None,
    }
}

fn digit_value(digit: u32) -> char {
    debug_assert!(digit < BASE);
    let byte = if digit < 26 {
        b'a' + digit as u8
    } else {
        b'A' + (digit - 26) as u8
    };
    char::from(byte)
}

fn threshold(k: u32, bias: u32) -> u32 {
    if k <= bias {
        TMIN
    } else if k >= bias + TMAX {
        TMAX
    } else {
        k - bias
    }
}

fn adapt(mut delta: u32, num_points: u32, first_time: bool) -> u32 {
    delta = if first_time { delta / DAMP } else { delta / 2 };
    delta += delta / num_points;
    let mut k = 0;
    while delta > ((BASE - TMIN) * TMAX) / 2 {
        delta /= BASE - TMIN;
        k += BASE;
    }
    k + (((BASE - TMIN + 1) * delta) / (delta + SKEW))
}

/// Decode into raw code points (mapped ASCII not yet shifted back).
pub fn decode_code_points(input: &[u8]) -> Result<Vec<u32>, PunycodeError> {
    let mut output: Vec<u32> = Vec::with_capacity(input.len());
    let mut n = INITIAL_N;
    let mut i: u32 = 0;
    let mut bias = INITIAL_BIAS;

    let mut rest = input;
    if let Some(delimiter) = input.iter().rposition(|&b| b == DELIMITER) {
        for &byte in &input[..delimiter] {
            if !byte.is_ascii() {
                return Err(PunycodeError::NonBasicPrefix);
            }
            output.push(u32::from(byte));
        }
        rest = &input[delimiter + 1..];
    }

    let mut digits = rest.iter();
    while !digits.as_slice().is_empty() {
        let old_i = i;
        let mut w: u32 = 1;
        let mut k = BASE;
        loop {
            let &byte = digits.next().ok_or(PunycodeError::Truncated)?;
            let digit = digit_index(byte).ok_or(PunycodeError::InvalidDigit(char::from(byte)))?;
            i = digit
                .checked_mul(w)
                .and_then(|dw| i.checked_add(dw))
                .ok_or(PunycodeError::Overflow)?;
            let t = threshold(k, bias);
            if digit < t {
                break;
            }
            w = w.checked_mul(BASE - t).ok_or(PunycodeError::Overflow)?;
            k = k.checked_add(BASE).ok_or(PunycodeError::Overflow)?;
        }
        let len = u32::try_from(output.len() + 1).map_err(|_| PunycodeError::Overflow)?;
        bias = adapt(i - old_i, len, old_i == 0);
        n = n.checked_add(i / len).ok_or(PunycodeError::Overflow)?;
        i %= len;
        if n < 0x80 {
            return Err(PunycodeError::BasicCodePoint);
        }
        output.insert(i as usize, n);
        i += 1;
    }
    Ok(output)
}

fn is_valid_scalar(scalar: u32) -> bool {
    scalar < MAPPED_ASCII_END || (0xE000..=0x1F_FFFF).contains(&scalar)
}

/// Decode a punycode fragment into UTF-8 text.
///
/// Scalars beyond `char::MAX` are accepted by the encoding but have no UTF-8
/// form, so they are rejected here.
pub fn decode(input: &[u8]) -> Result<String, PunycodeError> {
    let scalars = decode_code_points(input)?;
    let mut text = String::with_capacity(scalars.len());
    for mut scalar in scalars {
        if !is_valid_scalar(scalar) {
            return Err(PunycodeError::InvalidScalar(scalar));
        }
        if (MAPPED_ASCII_START..MAPPED_ASCII_END).contains(&scalar) {
            scalar -= MAPPED_ASCII_START;
        }
        let ch = char::from_u32(scalar).ok_or(PunycodeError::InvalidScalar(scalar))?;
        text.push(ch);
    }
    Ok(text)
}

/// Returns `true` for ASCII characters allowed verbatim in a symbol.
fn is_symbol_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_' || ch == '$'
}

/// Encode `text` into the restricted punycode form.
pub fn encode(text: &str) -> Result<String, PunycodeError> {
    let scalars: Vec<u32> = text
        .chars()
        .map(|ch| {
            let scalar = u32::from(ch);
            if ch.is_ascii() && !is_symbol_char(ch) {
                scalar + MAPPED_ASCII_START
            } else {
                scalar
            }
        })
        .collect();

    let mut output = String::with_capacity(text.len() + 4);
    let mut h: u32 = 0;
    for &scalar in &scalars {
        if scalar < 0x80 {
            h += 1;
            output.push(char::from_u32(scalar).ok_or(PunycodeError::InvalidScalar(scalar))?);
        }
    }
    let basic = h;
    if basic > 0 {
        output.push(char::from(DELIMITER));
    }

    let total = u32::try_from(scalars.len()).map_err(|_| PunycodeError::Overflow)?;
    let mut n = INITIAL_N;
    let mut delta: u32 = 0;
    let mut bias = INITIAL_BIAS;
    while h < total {
        let m = scalars
            .iter()
            .copied()
            .filter(|&scalar| scalar >= n)
            .min()
            .ok_or(PunycodeError::Overflow)?;
        delta = (m - n)
            .checked_mul(h + 1)
            .and_then(|step| delta.checked_add(step))
            .ok_or(PunycodeError::Overflow)?;
        n = m;
        for &scalar in &scalars {
            if scalar < n {
                delta = delta.checked_add(1).ok_or(PunycodeError::Overflow)?;
            }
            if scalar == n {
                let mut q = delta;
                let mut k = BASE;
                loop {
                    let t = threshold(k, bias);
                    if q < t {
                        break;
                    }
                    output.push(digit_value(t + (q - t) % (BASE - t)));
                    q = (q - t) / (BASE - t);
                    k += BASE;
                }
                output.push(digit_value(q));
                bias = adapt(delta, h + 1, h == basic);
                delta = 0;
                h += 1;
            }
        }
        delta = delta.checked_add(1).ok_or(PunycodeError::Overflow)?;
        n = n.checked_add(1).ok_or(PunycodeError::Overflow)?;
    }
    Ok(output)
}

#[cfg(test)]
mod tests;
