use rand::Rng as _;

use super::error::{Error, Result};

/// Expands `"<first>-<last>"` into the inclusive list of decimal identities.
pub fn parse_identity_range(range: &str) -> Result<Vec<String>> {
    let mut parts = range.split('-');
    let (Some(first), Some(last), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(Error::InvalidIdentityRange(range.to_string()));
    };

    let first: i64 = first
        .parse()
        .map_err(|_| Error::InvalidIdentityBound(range.to_string()))?;
    let last: i64 = last
        .parse()
        .map_err(|_| Error::InvalidIdentityBound(range.to_string()))?;

    if last < first {
        return Err(Error::EmptyIdentityRange(range.to_string()));
    }

    tracing::debug!(range, total = last - first + 1, "generating identities");
    Ok((first..=last).map(|i| i.to_string()).collect())
}

/// Random lowercase token, used for room names and anonymous identity prefixes.
pub fn random_token(len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .map(|_| char::from(rng.random_range(b'a'..=b'z')))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_inclusive_range() {
        let ids = parse_identity_range("5-9").unwrap_or_else(|e| panic!("valid range: {e}"));
        assert_eq!(ids, vec!["5", "6", "7", "8", "9"]);
    }

    #[test]
    fn single_element_range() {
        let ids = parse_identity_range("3-3").unwrap_or_else(|e| panic!("valid range: {e}"));
        assert_eq!(ids, vec!["3"]);
    }

    #[test]
    fn rejects_non_integer_bounds() {
        assert!(matches!(
            parse_identity_range("abc-9"),
            Err(Error::InvalidIdentityBound(_))
        ));
        assert!(matches!(
            parse_identity_range("1-x"),
            Err(Error::InvalidIdentityBound(_))
        ));
    }

    #[test]
    fn rejects_wrong_token_count() {
        assert!(matches!(
            parse_identity_range("5"),
            Err(Error::InvalidIdentityRange(_))
        ));
        assert!(matches!(
            parse_identity_range("1-2-3"),
            Err(Error::InvalidIdentityRange(_))
        ));
    }

    #[test]
    fn rejects_reversed_range() {
        assert!(matches!(
            parse_identity_range("9-5"),
            Err(Error::EmptyIdentityRange(_))
        ));
    }

    #[test]
    fn errors_are_configuration_errors() {
        for bad in ["5", "abc-9", "9-5"] {
            match parse_identity_range(bad) {
                Err(e) => assert!(e.is_config(), "{bad}: {e}"),
                Ok(v) => panic!("{bad} should fail, got {v:?}"),
            }
        }
    }

    #[test]
    fn random_token_is_lowercase() {
        let t = random_token(5);
        assert_eq!(t.len(), 5);
        assert!(t.chars().all(|c| c.is_ascii_lowercase()));
    }
}
