pub const RESULTS_HEADER: [&str; 6] = [
    "sequence",
    "request",
    "timestamp",
    "status",
    "duration_ms",
    "attempts",
];

fn field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// One CSV record terminated by `\r\n`, quoting only where needed.
pub fn csv_row<S: AsRef<str>>(fields: &[S]) -> String {
    let mut row = fields
        .iter()
        .map(|f| field(f.as_ref()))
        .collect::<Vec<_>>()
        .join(",");
    row.push_str("\r\n");
    row
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_fields_are_not_quoted() {
        assert_eq!(csv_row(&RESULTS_HEADER), "sequence,request,timestamp,status,duration_ms,attempts\r\n");
    }

    #[test]
    fn special_characters_are_quoted() {
        assert_eq!(csv_row(&["a,b", "say \"hi\"", "x"]), "\"a,b\",\"say \"\"hi\"\"\",x\r\n");
    }
}
