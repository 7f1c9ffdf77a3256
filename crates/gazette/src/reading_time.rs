//! Estimated reading time for post bodies.

/// Average reading speed assumed for estimates.
pub const WORDS_PER_MINUTE: usize = 200;

/// Minutes needed to read `content`, which may contain HTML markup.
///
/// Tags are stripped before counting words. Never less than one minute.
pub fn reading_time_minutes(content: &str) -> u32 {
    let words = strip_tags(content).split_whitespace().count();
    words.div_ceil(WORDS_PER_MINUTE).max(1) as u32
}

fn strip_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            // A tag boundary separates words: "a<br>b" is two words
            '>' if in_tag => {
                in_tag = false;
                out.push(' ');
            }
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}
