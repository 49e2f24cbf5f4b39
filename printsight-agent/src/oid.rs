use snmp2::Oid;

use crate::error::ProbeError;

/// Parse an OID string (e.g., "1.3.6.1.2.1.1.3.0") into an snmp2::Oid.
pub fn parse_oid(oid_str: &str) -> Result<Oid<'static>, ProbeError> {
    oid_str
        .parse::<Oid>()
        .map_err(|_| ProbeError::InvalidOid(oid_str.to_string()))
        .map(|oid| oid.to_owned())
}

/// Convert an snmp2::Oid back to a dotted string representation.
pub fn oid_to_string(oid: &Oid) -> String {
    oid.to_id_string()
}

/// Check if an OID is a child of (or equal to) a parent OID.
pub fn oid_starts_with(oid: &Oid, parent: &Oid) -> bool {
    oid.starts_with(parent)
}

/// Return the part of `oid` below `prefix`, without the leading dot.
///
/// `row_suffix("1.3.6.1.2.1.43.11.1.1.9.1.1", "1.3.6.1.2.1.43.11.1.1")` is `Some("9.1.1")`.
/// Returns `None` when `oid` is not strictly below `prefix`.
pub fn row_suffix<'a>(oid: &'a str, prefix: &str) -> Option<&'a str> {
    let rest = oid.strip_prefix(prefix)?.strip_prefix('.')?;
    (!rest.is_empty()).then_some(rest)
}

/// Split a table suffix into its column number and composite row index.
///
/// `"9.1.1"` becomes `(9, "1.1")`.
pub fn split_column(suffix: &str) -> Option<(u32, &str)> {
    let (column, index) = suffix.split_once('.')?;
    let column = column.parse().ok()?;
    (!index.is_empty()).then_some((column, index))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_oid() {
        let oid = parse_oid("1.3.6.1.2.1.1.3.0").unwrap();
        assert_eq!(oid_to_string(&oid), "1.3.6.1.2.1.1.3.0");
    }

    #[test]
    fn test_parse_invalid_oid() {
        assert!(matches!(
            parse_oid("not.an.oid"),
            Err(ProbeError::InvalidOid(s)) if s == "not.an.oid"
        ));
    }

    #[test]
    fn test_oid_starts_with() {
        let parent = parse_oid("1.3.6.1.2.1.43.11.1.1").unwrap();
        let child = parse_oid("1.3.6.1.2.1.43.11.1.1.9.1.1").unwrap();
        let other = parse_oid("1.3.6.1.2.1.1.3.0").unwrap();

        assert!(oid_starts_with(&child, &parent));
        assert!(oid_starts_with(&parent, &parent)); // equal
        assert!(!oid_starts_with(&other, &parent));
        assert!(!oid_starts_with(&parent, &child)); // parent is shorter
    }

    #[test]
    fn test_row_suffix() {
        let prefix = "1.3.6.1.2.1.43.11.1.1";
        assert_eq!(row_suffix("1.3.6.1.2.1.43.11.1.1.9.1.1", prefix), Some("9.1.1"));
        assert_eq!(row_suffix(prefix, prefix), None);
        // Sibling arc that merely shares a textual prefix
        assert_eq!(row_suffix("1.3.6.1.2.1.43.11.1.12.1", prefix), None);
    }

    #[test]
    fn test_split_column() {
        assert_eq!(split_column("9.1.1"), Some((9, "1.1")));
        assert_eq!(split_column("13.1.2"), Some((13, "1.2")));
        assert_eq!(split_column("9"), None);
        assert_eq!(split_column("x.1"), None);
    }
}
