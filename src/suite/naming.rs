/// Deterministic asset name for index `idx`: `A`..`Z` below 26, otherwise the
/// name of the quotient followed by the name of the remainder.
pub fn gen_asset_id(idx: usize) -> String {
    if idx < 26 {
        char::from(b'A' + idx as u8).to_string()
    } else {
        gen_asset_id(idx / 26) + &gen_asset_id(idx % 26)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names() {
        assert_eq!(gen_asset_id(0), "A");
        assert_eq!(gen_asset_id(25), "Z");
        assert_eq!(gen_asset_id(26), "BA");
        assert_eq!(gen_asset_id(27), "BB");
        assert_eq!(gen_asset_id(52), "CA");
        assert_eq!(gen_asset_id(676), "BAA");
    }

    #[test]
    fn test_names_are_distinct_for_scenario_sizes() {
        let names: std::collections::HashSet<_> = (0..500).map(gen_asset_id).collect();
        assert_eq!(names.len(), 500);
    }
}
