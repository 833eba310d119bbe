use std::collections::BTreeSet;

use serde_json::{Map, Value, json};

use crate::engine::SessionResults;

/// Flattens a session's choices into wide-format records suitable for
/// logit/probit estimation: one row per round, `chose_a` as the outcome,
/// and `a_<attribute>` / `b_<attribute>` level columns for the regressors.
pub fn analysis_rows(results: &SessionResults) -> Vec<Value> {
    results
        .choices
        .iter()
        .map(|record| {
            let mut row = Map::new();
            row.insert("session_id".to_string(), json!(results.session_id));
            row.insert("round_number".to_string(), json!(record.round_number));
            row.insert("choice".to_string(), json!(record.choice.as_str()));
            row.insert(
                "chose_a".to_string(),
                json!(if record.choice.as_str() == "A" { 1 } else { 0 }),
            );
            row.insert(
                "response_time_ms".to_string(),
                json!(record.response_time_ms),
            );
            row.insert(
                "recorded_at_unix_ms".to_string(),
                json!(record.recorded_at_unix_ms),
            );
            for (key, level_id) in &record.profile_a {
                row.insert(format!("a_{key}"), json!(level_id));
            }
            for (key, level_id) in &record.profile_b {
                row.insert(format!("b_{key}"), json!(level_id));
            }
            Value::Object(row)
        })
        .collect()
}

/// Renders analysis rows as CSV. The header is the sorted union of every
/// column seen, so sessions on different catalogs still line up.
pub fn rows_to_csv(rows: &[Value]) -> String {
    let mut columns: BTreeSet<String> = BTreeSet::new();
    for row in rows {
        if let Value::Object(fields) = row {
            columns.extend(fields.keys().cloned());
        }
    }

    let mut out = String::new();
    out.push_str(
        &columns
            .iter()
            .map(|column| escape_csv(column))
            .collect::<Vec<_>>()
            .join(","),
    );
    out.push('\n');

    for row in rows {
        let Value::Object(fields) = row else {
            continue;
        };
        let line = columns
            .iter()
            .map(|column| match fields.get(column) {
                Some(Value::String(text)) => escape_csv(text),
                Some(Value::Null) | None => String::new(),
                Some(other) => escape_csv(&other.to_string()),
            })
            .collect::<Vec<_>>()
            .join(",");
        out.push_str(&line);
        out.push('\n');
    }

    out
}

fn escape_csv(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{escape_csv, rows_to_csv};

    #[test]
    fn csv_header_is_sorted_column_union() {
        let rows = vec![
            json!({"b": 1, "a": "x"}),
            json!({"c": true, "a": "y"}),
        ];
        let csv = rows_to_csv(&rows);
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("a,b,c"));
        assert_eq!(lines.next(), Some("x,1,"));
        assert_eq!(lines.next(), Some("y,,true"));
    }

    #[test]
    fn csv_fields_with_separators_are_quoted() {
        assert_eq!(escape_csv("plain"), "plain");
        assert_eq!(escape_csv("a,b"), "\"a,b\"");
        assert_eq!(escape_csv("say \"hi\""), "\"say \"\"hi\"\"\"");
    }
}
