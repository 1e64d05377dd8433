/// Compile a regex literal once and hand out a `&'static Regex`.
///
/// Only used for the fixed expressions of the normalizer; per-category
/// matchers are built at runtime by `engine::matcher`.
#[macro_export]
macro_rules! lazy_regex {
    ($pat:literal) => {{
        static RE: once_cell::sync::Lazy<regex::Regex> = once_cell::sync::Lazy::new(|| {
            regex::Regex::new($pat).expect(concat!("invalid built-in regex: ", $pat))
        });
        &*RE
    }};
}
