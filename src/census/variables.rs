/// Census variable names for a numbered range within one table, formatted as
/// `<prefix>_<NNN><suffix>`, `stop` inclusive. For example
/// `variables("B01001", 7, 9, "E")` gives `B01001_007E`, `B01001_008E`, `B01001_009E`.
pub fn variables(prefix: &str, start: u32, stop: u32, suffix: &str) -> Vec<String> {
    (start..=stop)
        .map(|n| format!("{prefix}_{n:03}{suffix}"))
        .collect()
}
