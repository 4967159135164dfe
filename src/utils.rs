/// Convert a URL to a string usable as part of a filename
pub fn sanitize_filename(url: &str) -> String {
    // Remove protocol and replace invalid filename characters
    let name = url
        .trim()
        .trim_start_matches("http://")
        .trim_start_matches("https://")
        .replace(['/', ':', '?', '&', '=', '#', '%'], "_");

    // Limit filename length
    name.chars().take(100).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(
            sanitize_filename("https://example.com/a/b?x=1&y=2#top"),
            "example.com_a_b_x_1_y_2_top"
        );
        assert_eq!(sanitize_filename("http://example.com:8080/"), "example.com_8080_");
    }

    #[test]
    fn test_sanitize_filename_is_capped_on_char_boundaries() {
        let long = format!("https://example.com/{}", "é".repeat(200));
        let name = sanitize_filename(&long);
        assert_eq!(name.chars().count(), 100);
    }
}
