//! Dialect inference from a single CSV line.
//!
//! `csv_nose` proposes a quote character and a delimiter; the delimiter is
//! then overridden by whichever of [`HEURISTIC_DELIMITERS`] (or the sniffed
//! one) splits the line into the most fields.

use csv_nose::{Quote, Sniffer};
use engine_logging::engine_debug;

/// Fixed delimiter candidates, in tie-break priority order.
pub const HEURISTIC_DELIMITERS: [char; 3] = [',', ';', '|'];

const DEFAULT_DELIMITER: char = ',';
const DEFAULT_QUOTE: char = '"';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dialect {
    pub delimiter: char,
    pub quotechar: char,
    pub skip_initial_space: bool,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum HeaderError {
    #[error("{role} {ch:?} is not a single-byte character")]
    NonAsciiDialect { role: &'static str, ch: char },
    #[error("line holds no record")]
    Empty,
    #[error("csv reader error: {0}")]
    Csv(String),
}

/// Sniff quote character and delimiter, then apply the field-count override.
pub fn infer_dialect(line: &str) -> Dialect {
    let sniffed = sniff_dialect(line);
    let delimiter = resolve_delimiter(line, sniffed.delimiter);
    let skip_initial_space = if delimiter == sniffed.delimiter {
        sniffed.skip_initial_space
    } else {
        every_delimiter_followed_by_space(line, delimiter)
    };
    Dialect {
        delimiter,
        quotechar: sniffed.quotechar,
        skip_initial_space,
    }
}

/// Plain dialect sniffing, before the delimiter override.
///
/// A single line is a thin sample; when the sniffer cannot settle on a
/// dialect the defaults `,` and `"` are used.
pub fn sniff_dialect(line: &str) -> Dialect {
    let mut sample = String::with_capacity(line.len() + 1);
    sample.push_str(line);
    sample.push('\n');

    let (delimiter, quotechar) = match Sniffer::new().sniff_bytes(sample.as_bytes()) {
        Ok(metadata) => {
            let quotechar = match metadata.dialect.quote {
                Quote::Some(quote) => char::from(quote),
                Quote::None => DEFAULT_QUOTE,
            };
            (char::from(metadata.dialect.delimiter), quotechar)
        }
        Err(err) => {
            engine_debug!("dialect sniffing fell back to defaults: {}", err);
            (DEFAULT_DELIMITER, DEFAULT_QUOTE)
        }
    };
    Dialect {
        delimiter,
        quotechar,
        skip_initial_space: every_delimiter_followed_by_space(line, delimiter),
    }
}

/// Pick the candidate yielding the most fields; ties keep the earlier candidate.
pub fn resolve_delimiter(line: &str, sniffed: char) -> char {
    let mut candidates = HEURISTIC_DELIMITERS.to_vec();
    if !candidates.contains(&sniffed) {
        candidates.push(sniffed);
    }

    let mut best = candidates[0];
    let mut best_fields = line.split(best).count();
    for &candidate in &candidates[1..] {
        let fields = line.split(candidate).count();
        if fields > best_fields {
            best = candidate;
            best_fields = fields;
        }
    }
    best
}

/// Decode `line` as one delimited record and clean leftover quote characters.
pub fn parse_headers(line: &str, dialect: &Dialect) -> Result<Vec<String>, HeaderError> {
    let delimiter = ascii_byte("delimiter", dialect.delimiter)?;
    let quote = ascii_byte("quotechar", dialect.quotechar)?;

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .quote(quote)
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes());

    let record = match reader.records().next() {
        Some(Ok(record)) => record,
        Some(Err(err)) => return Err(HeaderError::Csv(err.to_string())),
        None => return Err(HeaderError::Empty),
    };

    Ok(record
        .iter()
        .map(|field| {
            let field = if dialect.skip_initial_space {
                field.trim_start_matches(' ')
            } else {
                field
            };
            field.replace(dialect.quotechar, "")
        })
        .collect())
}

fn ascii_byte(role: &'static str, ch: char) -> Result<u8, HeaderError> {
    u8::try_from(ch)
        .ok()
        .filter(u8::is_ascii)
        .ok_or(HeaderError::NonAsciiDialect { role, ch })
}

fn every_delimiter_followed_by_space(line: &str, delimiter: char) -> bool {
    if delimiter == ' ' {
        return false;
    }
    let mut seen = 0usize;
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        if c == delimiter {
            seen += 1;
            if chars.peek() != Some(&' ') {
                return false;
            }
        }
    }
    seen > 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn override_picks_most_fields() {
        assert_eq!(infer_dialect("a,b;c;d").delimiter, ';');
        assert_eq!(infer_dialect("x|y|z,w").delimiter, '|');
    }

    #[test]
    fn tie_keeps_earliest_candidate() {
        assert_eq!(resolve_delimiter("a,b;c", ';'), ',');
        assert_eq!(resolve_delimiter("abc", '\t'), ',');
    }

    #[test]
    fn sniffed_delimiter_joins_the_candidates() {
        assert_eq!(resolve_delimiter("code\tlibelle\tpopulation", '\t'), '\t');
        assert_eq!(resolve_delimiter("code\tlibelle\tpopulation", ','), ',');
    }

    #[test]
    fn spaced_delimiters_set_skip_initial_space() {
        let dialect = infer_dialect("id; name; value");
        assert_eq!(dialect.delimiter, ';');
        assert!(dialect.skip_initial_space);
        assert!(!infer_dialect("id;name; value").skip_initial_space);
    }

    #[test]
    fn sniffed_quote_is_an_ascii_character() {
        let dialect = sniff_dialect("\"id\",\"nom\",\"valeur\"");
        assert!(dialect.quotechar.is_ascii());
        assert!(dialect.delimiter.is_ascii());
    }

    #[test]
    fn headers_strip_quotes_and_initial_spaces() {
        let line = r#""id", "name", "libellé ""court""""#;
        let dialect = infer_dialect(line);
        assert_eq!(dialect.delimiter, ',');
        assert!(dialect.skip_initial_space);
        let headers = parse_headers(line, &dialect).unwrap();
        assert_eq!(headers, vec!["id", "name", "libellé court"]);
    }

    #[test]
    fn non_ascii_delimiter_is_rejected() {
        let dialect = Dialect {
            delimiter: '§',
            quotechar: '"',
            skip_initial_space: false,
        };
        assert!(matches!(
            parse_headers("a§b", &dialect),
            Err(HeaderError::NonAsciiDialect { .. })
        ));
    }
}
