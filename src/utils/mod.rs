pub fn join<'a, T, S>(i: T, sep: S) -> String
where
    T: IntoIterator,
    T::Item: ToString,
    S: Into<&'a str>,
{
    i.into_iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(sep.into())
}

pub fn map_join<'a, T, S, F>(i: T, sep: S, f: F) -> String
where
    T: IntoIterator,
    S: Into<&'a str>,
    F: Fn(T::Item) -> String,
{
    i.into_iter().map(f).collect::<Vec<_>>().join(sep.into())
}

pub fn indent_lines<S: std::fmt::Display>(s: S, n: usize) -> String {
    s.to_string()
        .lines()
        .map(|l| {
            if l.is_empty() {
                String::new()
            } else {
                format!("{}{}", " ".repeat(n), l)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod utils_tests {
    use super::{indent_lines, join, map_join};

    #[test]
    fn test_join() {
        assert_eq!(join(&[1, 2, 3], ", "), "1, 2, 3");
        assert_eq!(map_join(vec!["a", "b"], "|", |s| s.to_uppercase()), "A|B");
    }

    #[test]
    fn test_indent_lines() {
        assert_eq!(indent_lines("a\n\nb", 2), "  a\n\n  b");
    }
}
