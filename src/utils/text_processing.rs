// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 文本解码工具
//!
//! 商品名称和图片地址常以 JSON 字符串字面量的形式嵌在页面中，
//! 需要同时处理反斜杠转义和 HTML 实体。

/// 解析反斜杠转义并解码 HTML 实体
pub fn decode_text(raw: &str) -> String {
    let unescaped = unescape_backslashes(raw);
    html_escape::decode_html_entities(&unescaped).trim().to_string()
}

/// 解析 JSON 风格的反斜杠转义序列
///
/// 支持 `\uXXXX`（含代理对）、`\n`、`\t`、`\r`、`\b`、`\f`、`\"`、`\'`、`\/`、`\\`。
/// 无法识别的序列原样保留。
pub fn unescape_backslashes(raw: &str) -> String {
    if !raw.contains('\\') {
        return raw.to_string();
    }

    let chars: Vec<char> = raw.chars().collect();
    let mut out = String::with_capacity(raw.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c != '\\' || i + 1 >= chars.len() {
            out.push(c);
            i += 1;
            continue;
        }

        let next = chars[i + 1];
        match next {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'b' => out.push('\u{0008}'),
            'f' => out.push('\u{000C}'),
            '"' | '\'' | '/' | '\\' => out.push(next),
            'u' => {
                if let Some((decoded, consumed)) = decode_unicode_escape(&chars[i..]) {
                    out.push(decoded);
                    i += consumed;
                    continue;
                }
                out.push('\\');
                out.push('u');
            }
            other => {
                out.push('\\');
                out.push(other);
            }
        }
        i += 2;
    }

    out
}

/// 解析 `\uXXXX`，返回字符和消耗的字符数
fn decode_unicode_escape(chars: &[char]) -> Option<(char, usize)> {
    let high = parse_hex4(chars.get(2..6)?)?;

    if (0xD800..0xDC00).contains(&high) {
        // Surrogate pair: expect a trailing \uDC00-\uDFFF
        if chars.get(6) == Some(&'\\') && chars.get(7) == Some(&'u') {
            let low = parse_hex4(chars.get(8..12)?)?;
            if (0xDC00..0xE000).contains(&low) {
                let code = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
                return char::from_u32(code).map(|c| (c, 12));
            }
        }
        return None;
    }

    char::from_u32(high).map(|c| (c, 6))
}

fn parse_hex4(digits: &[char]) -> Option<u32> {
    if digits.len() != 4 {
        return None;
    }
    let s: String = digits.iter().collect();
    u32::from_str_radix(&s, 16).ok()
}
