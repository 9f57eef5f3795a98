//! Embedding id construction.
//!
//! Every chunk of a file gets the id `asciiSafe(name)#key#seq`. All ids of a
//! file therefore share the prefix `asciiSafe(name)#key#`, which is what the
//! managed backend lists by when deleting a file.

/// Separator between the id segments.
pub const ID_SEPARATOR: char = '#';

/// Drops every non-ASCII character.
///
/// Managed vector stores reject non-ASCII vector ids.
pub fn ascii_safe(s: &str) -> String {
    s.chars().filter(char::is_ascii).collect()
}

/// Prefix shared by all embedding ids of one file.
pub fn file_id_prefix(file_name: &str, file_key: &str) -> String {
    format!(
        "{}{sep}{}{sep}",
        ascii_safe(file_name),
        file_key,
        sep = ID_SEPARATOR
    )
}

/// Id of the `seq`-th chunk (1-based) of a file.
pub fn embedding_id(file_name: &str, file_key: &str, seq: usize) -> String {
    format!("{}{}", file_id_prefix(file_name, file_key), seq)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_sequenced_ids() {
        assert_eq!(embedding_id("report.pdf", "k1", 1), "report.pdf#k1#1");
        assert_eq!(embedding_id("report.pdf", "k1", 12), "report.pdf#k1#12");
    }

    #[test]
    fn strips_non_ascii() {
        assert_eq!(ascii_safe("résumé – v2.pdf"), "rsum  v2.pdf");
        assert_eq!(file_id_prefix("Ünï.txt", "key"), "n.txt#key#");
    }

    #[test]
    fn every_id_starts_with_the_file_prefix() {
        let prefix = file_id_prefix("a.csv", "xyz");
        for seq in 1..=250 {
            assert!(embedding_id("a.csv", "xyz", seq).starts_with(&prefix));
        }
    }
}
