/// The value of `key` with surrounding whitespace removed, if any is left.
pub fn non_empty<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Only a case-insensitive `true` enables the flag.
pub fn flag_or<F>(lookup: &F, key: &str, default: bool) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    match non_empty(lookup, key) {
        Some(v) => v.eq_ignore_ascii_case("true"),
        None => default,
    }
}

pub fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn flags_accept_only_true() {
        let vars: HashMap<&str, &str> =
            HashMap::from([("A", "TRUE"), ("B", "yes"), ("C", ""), ("D", "false")]);
        let lookup = |k: &str| vars.get(k).map(|v| v.to_string());

        assert!(flag_or(&lookup, "A", false));
        assert!(!flag_or(&lookup, "B", true));
        assert!(flag_or(&lookup, "C", true));
        assert!(!flag_or(&lookup, "D", true));
        assert!(flag_or(&lookup, "MISSING", true));
    }

    #[test]
    fn values_come_back_trimmed() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("REGION", " us-east-1 \n"),
            ("BLANK", " \t"),
            ("USE_AGGREGATOR", "  True "),
        ]);
        let lookup = |k: &str| vars.get(k).map(|v| v.to_string());

        assert_eq!(non_empty(&lookup, "REGION").as_deref(), Some("us-east-1"));
        assert_eq!(non_empty(&lookup, "BLANK"), None);
        assert!(flag_or(&lookup, "USE_AGGREGATOR", false));
    }
}
