//! WinAnsiEncoding conversion for the standard fonts

/// Characters at byte positions 0x80..=0x9F (None where the code is undefined)
const WIN_ANSI_HIGH: [Option<char>; 32] = [
    Some('\u{20AC}'), None, Some('\u{201A}'), Some('\u{0192}'),
    Some('\u{201E}'), Some('\u{2026}'), Some('\u{2020}'), Some('\u{2021}'),
    Some('\u{02C6}'), Some('\u{2030}'), Some('\u{0160}'), Some('\u{2039}'),
    Some('\u{0152}'), None, Some('\u{017D}'), None,
    None, Some('\u{2018}'), Some('\u{2019}'), Some('\u{201C}'),
    Some('\u{201D}'), Some('\u{2022}'), Some('\u{2013}'), Some('\u{2014}'),
    Some('\u{02DC}'), Some('\u{2122}'), Some('\u{0161}'), Some('\u{203A}'),
    Some('\u{0153}'), None, Some('\u{017E}'), Some('\u{0178}'),
];

/// Byte used for characters WinAnsiEncoding cannot represent
pub const REPLACEMENT_BYTE: u8 = b'?';

/// Encode text as WinAnsi bytes, replacing unsupported characters with `?`
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars().map(|c| char_to_win_ansi(c).unwrap_or(REPLACEMENT_BYTE)).collect()
}

fn char_to_win_ansi(c: char) -> Option<u8> {
    let code = c as u32;
    match code {
        0x20..=0x7E | 0xA0..=0xFF => Some(code as u8),
        _ => WIN_ANSI_HIGH
            .iter()
            .position(|&mapped| mapped == Some(c))
            .map(|i| 0x80 + i as u8),
    }
}

/// Decode a single WinAnsi byte. Control and undefined codes map to themselves.
pub fn win_ansi_to_char(byte: u8) -> char {
    match byte {
        0x80..=0x9F => WIN_ANSI_HIGH[(byte - 0x80) as usize].unwrap_or(byte as char),
        _ => byte as char,
    }
}

/// Decode WinAnsi bytes into a string
pub fn decode_win_ansi(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| win_ansi_to_char(b)).collect()
}
