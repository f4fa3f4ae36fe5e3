use std::collections::BTreeSet;

use serde_json::{Map, Value};

/// Columns every export leads with, in this order, whether or not any entry
/// carries them.
pub const PREFERRED_FIELDS: [&str; 4] = ["fullName", "email", "company", "timestamp"];

/// Serializes entry rows to CSV.
///
/// Header is the preferred columns followed by every other field seen across
/// the rows, sorted and deduplicated. Every value is quoted with internal
/// quotes doubled; absent or null values become empty strings. Zero rows
/// produce exactly the header line, with no trailing newline.
pub fn to_csv(rows: &[Map<String, Value>]) -> String {
    let mut extras: BTreeSet<&str> = BTreeSet::new();
    for row in rows {
        for key in row.keys() {
            if !PREFERRED_FIELDS.contains(&key.as_str()) {
                extras.insert(key);
            }
        }
    }

    let header: Vec<&str> = PREFERRED_FIELDS
        .iter()
        .copied()
        .chain(extras)
        .collect();

    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(header.join(","));

    for row in rows {
        let line = header
            .iter()
            .map(|field| quote(row.get(*field)))
            .collect::<Vec<_>>()
            .join(",");
        lines.push(line);
    }

    lines.join("\n")
}

fn quote(value: Option<&Value>) -> String {
    let text = match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    };
    format!("\"{}\"", text.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> Map<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
            .collect()
    }

    #[test]
    fn empty_set_is_header_only() {
        assert_eq!(to_csv(&[]), "fullName,email,company,timestamp");
    }

    #[test]
    fn quotes_every_field_and_doubles_internal_quotes() {
        let rows = vec![row(&[
            ("fullName", "Smith, \"Bob\""),
            ("email", "bob@example.com"),
            ("company", ""),
            ("timestamp", "2026-01-01T00:00:00Z"),
        ])];

        let csv = to_csv(&rows);
        let mut lines = csv.lines();
        assert_eq!(lines.next().unwrap(), "fullName,email,company,timestamp");
        assert_eq!(
            lines.next().unwrap(),
            "\"Smith, \"\"Bob\"\"\",\"bob@example.com\",\"\",\"2026-01-01T00:00:00Z\""
        );
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn extra_fields_follow_preferred_and_sort_alphabetically() {
        let rows = vec![
            row(&[("fullName", "A"), ("email", "a@x.co"), ("zeta", "1")]),
            row(&[("fullName", "B"), ("email", "b@x.co"), ("alpha", "2")]),
        ];

        let csv = to_csv(&rows);
        let header = csv.lines().next().unwrap();
        assert_eq!(header, "fullName,email,company,timestamp,alpha,zeta");
    }

    #[test]
    fn absent_values_serialize_as_empty_string() {
        let rows = vec![row(&[("fullName", "A"), ("email", "a@x.co")])];

        let csv = to_csv(&rows);
        let data = csv.lines().nth(1).unwrap();
        assert_eq!(data, "\"A\",\"a@x.co\",\"\",\"\"");
    }

    #[test]
    fn null_values_serialize_as_empty_string() {
        let mut r = row(&[("fullName", "A"), ("email", "a@x.co")]);
        r.insert("company".to_string(), Value::Null);

        let csv = to_csv(&[r]);
        let data = csv.lines().nth(1).unwrap();
        assert_eq!(data, "\"A\",\"a@x.co\",\"\",\"\"");
    }
}
