/// Elements whose content is never visible text.
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template", "svg"];

/// Extract visible text from an HTML document.
///
/// Drops tags, comments and the content of hidden elements, decodes common
/// named and numeric entities, and collapses whitespace. Every tag boundary
/// becomes a space so words in adjacent cells or paragraphs never fuse.
pub fn extract_text(html: &str) -> String {
    let mut text = String::with_capacity(html.len() / 2);
    let mut rest = html;

    while let Some(lt) = rest.find('<') {
        push_decoded(&mut text, &rest[..lt]);
        text.push(' ');
        rest = &rest[lt..];

        if let Some(after) = rest.strip_prefix("<!--") {
            rest = after.find("-->").map_or("", |end| &after[end + 3..]);
            continue;
        }

        let Some(gt) = rest.find('>') else {
            rest = "";
            break;
        };
        let tag = &rest[1..gt];
        rest = &rest[gt + 1..];

        if let Some(name) = hidden_element(tag) {
            rest = skip_past_close(rest, name);
        }
    }
    push_decoded(&mut text, rest);

    collapse_whitespace(&text)
}

/// Name of the hidden element `tag` opens, if any.
fn hidden_element(tag: &str) -> Option<&'static str> {
    if tag.starts_with('/') || tag.ends_with('/') {
        return None;
    }
    let name = tag
        .split(|c: char| c.is_whitespace())
        .next()
        .unwrap_or_default();
    HIDDEN_ELEMENTS
        .iter()
        .copied()
        .find(|hidden| name.eq_ignore_ascii_case(hidden))
}

/// Remainder of `html` after the closing tag of `name`, or empty when unclosed.
fn skip_past_close<'a>(html: &'a str, name: &str) -> &'a str {
    let lower = html.to_ascii_lowercase();
    let close = format!("</{name}");
    match lower.find(&close) {
        // Lowercasing ASCII keeps byte offsets identical.
        Some(pos) => html[pos..].find('>').map_or("", |gt| &html[pos + gt + 1..]),
        None => "",
    }
}

fn push_decoded(out: &mut String, mut text: &str) {
    while let Some(amp) = text.find('&') {
        out.push_str(&text[..amp]);
        text = &text[amp..];
        match decode_entity(text) {
            Some((ch, len)) => {
                out.push(ch);
                text = &text[len..];
            }
            None => {
                out.push('&');
                text = &text[1..];
            }
        }
    }
    out.push_str(text);
}

/// Decode the entity at the start of `text`, returning the character and the
/// entity's byte length.
fn decode_entity(text: &str) -> Option<(char, usize)> {
    let semi = text
        .char_indices()
        .take(12)
        .find(|&(_, c)| c == ';')
        .map(|(i, _)| i)?;
    let body = &text[1..semi];
    let ch = match body {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => ' ',
        "mdash" => '\u{2014}',
        "ndash" => '\u{2013}',
        "hellip" => '\u{2026}',
        "rsquo" | "lsquo" => '\'',
        "rdquo" | "ldquo" => '"',
        _ => {
            let code = if let Some(hex) = body
                .strip_prefix("#x")
                .or_else(|| body.strip_prefix("#X"))
            {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                body.strip_prefix('#')?.parse::<u32>().ok()?
            };
            char::from_u32(code)?
        }
    };
    Some((ch, semi + 1))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
