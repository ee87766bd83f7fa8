//! Chat text helpers: colour code cleanup and word wrapping to a client's line width.

/// Characters per chat line on legacy clients.
pub const LINE_LENGTH: usize = 64;

/// Prefix of wrapped continuation lines.
pub const CONTINUATION: &str = "> ";

fn is_color_code(c: char) -> bool {
    c.is_ascii_hexdigit()
}

/// Remove colour codes that have no visible effect: codes followed by another code,
/// trailing codes, codes repeating the current colour and dangling `&`.
/// Unknown codes are left as literal text.
pub fn cleanup_colors(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut current = 'f';
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c != '&' {
            out.push(c);
            i += 1;
            continue;
        }
        let Some(&code) = chars.get(i + 1) else {
            break;
        };
        if !is_color_code(code) {
            out.push(c);
            i += 1;
            continue;
        }
        let code = code.to_ascii_lowercase();
        let followed_by_code = chars.get(i + 2) == Some(&'&')
            && chars.get(i + 3).copied().is_some_and(is_color_code);
        let at_end = i + 2 >= chars.len();
        if !followed_by_code && !at_end && code != current {
            out.push('&');
            out.push(code);
            current = code;
        }
        i += 2;
    }
    out
}

/// Last colour code (`&x`) in `line`, if any.
fn last_color(line: &str) -> Option<char> {
    let chars: Vec<char> = line.chars().collect();
    (0..chars.len().saturating_sub(1))
        .rev()
        .find(|&i| chars[i] == '&' && is_color_code(chars[i + 1]))
        .map(|i| chars[i + 1])
}

/// Split `message` into lines of at most `width` characters, breaking after the last
/// space where possible. Continuation lines start with [`CONTINUATION`] and repeat the
/// colour in effect. Concatenating the lines without those prefixes gives back `message`.
pub fn wordwrap(message: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut rest: Vec<char> = message.chars().collect();
    let mut prefix = String::new();

    loop {
        let room = width.saturating_sub(prefix.chars().count()).max(1);
        if rest.len() <= room {
            lines.push(format!("{}{}", prefix, rest.iter().collect::<String>()));
            break;
        }

        let mut split = room;
        if let Some(space) = rest[..room].iter().rposition(|&c| c == ' ') {
            if space > 0 {
                split = space + 1;
            }
        }
        // Never leave a colour code cut in half
        if split >= 1 && rest[split - 1] == '&' && split > 1 {
            split -= 1;
        }

        let head: String = rest[..split].iter().collect();
        rest.drain(..split);
        let line = format!("{}{}", prefix, head);
        prefix = match last_color(&line) {
            Some(color) => format!("{}&{}", CONTINUATION, color),
            None => CONTINUATION.to_string(),
        };
        lines.push(line);
    }
    lines
}
