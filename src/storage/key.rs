//! Entry-name codec: a storage key is `{uuid}-{original filename}`.
//!
//! The identifier is the canonical 36-character hyphenated form, anchored at
//! the start of the entry name. The separator is the first hyphen after it;
//! everything beyond, trimmed of incidental whitespace, is the original
//! filename (which may itself contain hyphens).

use uuid::Uuid;

/// Identifier segment length in the canonical 8-4-4-4-12 form.
const ID_LEN: usize = 36;

pub fn encode(id: Uuid, filename: &str) -> String {
    format!("{id}-{filename}")
}

/// Parses an entry name back into its identifier and original filename.
/// Returns `None` for anything not shaped like `<uuid>-<rest>`; never panics,
/// even when byte 36 falls inside a multi-byte character.
pub fn decode(entry: &str) -> Option<(Uuid, &str)> {
    let (token, rest) = entry.split_at_checked(ID_LEN)?;
    let id = Uuid::try_parse(token).ok()?;
    let rest = rest.strip_prefix('-')?;
    if rest.is_empty() {
        return None;
    }
    Some((id, rest.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "8f3c2a17-5b4e-4d2a-9c61-0e7b8a4d5f12";

    #[test]
    fn round_trips_encode_then_decode() {
        let id = Uuid::parse_str(ID).unwrap();
        let key = encode(id, "report.pdf");
        assert_eq!(key, format!("{ID}-report.pdf"));
        assert_eq!(decode(&key), Some((id, "report.pdf")));
    }

    #[test]
    fn trims_incidental_whitespace_from_filename() {
        let id = Uuid::parse_str(ID).unwrap();
        assert_eq!(decode(&encode(id, " notes.txt ")), Some((id, "notes.txt")));
    }

    #[test]
    fn keeps_hyphens_inside_the_filename() {
        let id = Uuid::parse_str(ID).unwrap();
        let key = encode(id, "my-report-final-v2.pdf");
        assert_eq!(decode(&key), Some((id, "my-report-final-v2.pdf")));
    }

    #[test]
    fn filename_that_looks_like_an_identifier_stays_whole() {
        let id = Uuid::parse_str(ID).unwrap();
        let inner = "113f19e2-66e1-47a8-a1c6-0d6f54dd9afe-backup.tar";
        assert_eq!(decode(&encode(id, inner)), Some((id, inner)));
    }

    #[test]
    fn accepts_uppercase_identifier_segments() {
        let id = Uuid::parse_str(ID).unwrap();
        let key = format!("{}-photo.png", ID.to_uppercase());
        assert_eq!(decode(&key), Some((id, "photo.png")));
    }

    #[test]
    fn rejects_foreign_entries() {
        assert_eq!(decode("notes.txt"), None);
        assert_eq!(decode(""), None);
        assert_eq!(decode("short-name"), None);
        // right length, wrong hex
        assert_eq!(decode("zzzzzzzz-zzzz-zzzz-zzzz-zzzzzzzzzzzz-a.txt"), None);
    }

    #[test]
    fn rejects_identifier_without_a_remainder() {
        assert_eq!(decode(ID), None);
        assert_eq!(decode(&format!("{ID}-")), None);
    }

    #[test]
    fn tolerates_multibyte_characters_at_the_split_point() {
        // byte 36 lands inside the two-byte 'é'
        let entry = format!("{}é.txt", "a".repeat(35));
        assert_eq!(decode(&entry), None);
    }
}
