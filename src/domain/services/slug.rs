//! URL-safe slugs for `link_rewrite` fields.

/// Lower-case ASCII slug: diacritics folded, every other run of
/// non-alphanumeric characters collapsed into a single `-`.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;

    for ch in text.chars().flat_map(char::to_lowercase) {
        let mut buf = [0u8; 4];
        let folded = if ch.is_ascii_alphanumeric() {
            Some(&*ch.encode_utf8(&mut buf))
        } else {
            fold_diacritic(ch)
        };

        match folded {
            Some(part) => {
                if pending_dash {
                    slug.push('-');
                    pending_dash = false;
                }
                slug.push_str(part);
            }
            None => pending_dash = !slug.is_empty(),
        }
    }
    slug
}

fn fold_diacritic(ch: char) -> Option<&'static str> {
    let folded = match ch {
        'ą' | 'á' | 'à' | 'â' | 'ä' | 'ã' | 'å' => "a",
        'ć' | 'č' | 'ç' => "c",
        'ď' => "d",
        'ę' | 'é' | 'è' | 'ê' | 'ë' | 'ě' => "e",
        'í' | 'ì' | 'î' | 'ï' => "i",
        'ł' | 'ľ' | 'ĺ' => "l",
        'ń' | 'ň' | 'ñ' => "n",
        'ó' | 'ò' | 'ô' | 'ö' | 'õ' | 'ø' => "o",
        'ř' => "r",
        'ś' | 'š' => "s",
        'ť' => "t",
        'ú' | 'ù' | 'û' | 'ü' | 'ů' => "u",
        'ý' | 'ÿ' => "y",
        'ź' | 'ż' | 'ž' => "z",
        'ß' => "ss",
        'æ' => "ae",
        'œ' => "oe",
        _ => return None,
    };
    Some(folded)
}
