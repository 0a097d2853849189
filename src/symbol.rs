use std::fmt::Debug;
use std::hash::Hash;

/// Alphabet element accepted by the completion engines.
///
/// Equality decides string identity, `Ord` is only used as a tie-breaker when
/// strings are compared, and `Hash` keys the matcher's child index.
pub trait Symbol: Clone + Ord + Hash + Debug + 'static {}

impl<T: Clone + Ord + Hash + Debug + 'static> Symbol for T {}

/// Renders a string for log output, e.g. `[a, b]` becomes `ab` for chars.
pub(crate) fn render<T: Debug>(s: &[T]) -> String {
    let mut out = String::new();
    for symbol in s {
        let text = format!("{symbol:?}");
        // Strip the quotes Debug puts around chars and strings.
        let trimmed = text.trim_matches(|c| c == '\'' || c == '"');
        out.push_str(trimmed);
    }
    if out.is_empty() {
        out.push('ε');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_chars() {
        assert_eq!(render(&['a', 'b', '1']), "ab1");
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(render::<char>(&[]), "ε");
    }

    #[test]
    fn test_render_numbers() {
        assert_eq!(render(&[1u8, 2, 3]), "123");
    }
}
