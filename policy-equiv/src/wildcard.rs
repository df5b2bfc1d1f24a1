//! Compiles values with `*` wildcards into regexes.
//!
//! A value denotes the strings obtained by replacing every maximal
//! run of `*` with an arbitrary, possibly empty, sequence of charset
//! characters; everything else must appear literally.  A lone `*`
//! therefore denotes `C*`, and a value without `*` denotes itself.
use crate::backend::Backend;
use crate::re::{CharSet, WILDCARD};

/// A piece of a wildcard value.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Segment<'a> {
    Literal(&'a str),
    /// One maximal run of wildcards.
    AnyRun,
}

/// Splits `value` into literal segments and wildcard runs.  Adjacent
/// wildcards collapse into one run, and no literal segment is empty.
#[must_use]
pub fn segments(value: &str) -> Vec<Segment<'_>> {
    let mut result = Vec::new();
    for (index, part) in value.split(WILDCARD).enumerate() {
        // Every part after the first was preceded by a `*`.
        if index > 0 && result.last() != Some(&Segment::AnyRun) {
            result.push(Segment::AnyRun);
        }

        if !part.is_empty() {
            result.push(Segment::Literal(part));
        }
    }

    result
}

/// Returns `C*` for `charset`.
pub fn any_of<B: Backend>(backend: &mut B, charset: &CharSet) -> B::Re {
    let alternatives = charset
        .iter()
        .map(|ch| backend.re_literal(ch.encode_utf8(&mut [0; 4])))
        .collect();
    let class = backend.re_union(alternatives);
    backend.re_star(class)
}

/// Compiles `value` over `charset`.  The caller is responsible for
/// checking that `value` only uses charset characters and `*`.
pub fn compile<B: Backend>(backend: &mut B, value: &str, charset: &CharSet) -> B::Re {
    let segments = segments(value);
    if segments.is_empty() {
        return backend.re_literal("");
    }

    let mut any = None;
    let mut parts = Vec::with_capacity(segments.len());
    for segment in segments {
        let part = match segment {
            Segment::Literal(text) => backend.re_literal(text),
            Segment::AnyRun => any
                .get_or_insert_with(|| any_of(backend, charset))
                .clone(),
        };
        parts.push(part);
    }

    if parts.len() == 1 {
        if let Some(single) = parts.pop() {
            return single;
        }
    }

    backend.re_concat(parts)
}

#[test]
fn test_segments() {
    use Segment::{AnyRun, Literal};

    assert!(segments("").is_empty());
    assert_eq!(segments("abc"), vec![Literal("abc")]);
    assert_eq!(segments("*"), vec![AnyRun]);
    assert_eq!(segments("***"), vec![AnyRun]);
    assert_eq!(segments("a*"), vec![Literal("a"), AnyRun]);
    assert_eq!(segments("*a"), vec![AnyRun, Literal("a")]);
    assert_eq!(
        segments("a**b*c"),
        vec![Literal("a"), AnyRun, Literal("b"), AnyRun, Literal("c")]
    );
    assert_eq!(segments("*a*"), vec![AnyRun, Literal("a"), AnyRun]);
}

#[test]
fn test_compile_interior() {
    let mut ctx = regsat::Context::new();
    let charset = CharSet::from_chars("abc/").expect("valid");

    let re = compile(&mut ctx, "/a*/c", &charset);
    assert!(ctx.matches(re, "/a/c"));
    assert!(ctx.matches(re, "/abba/c"));
    assert!(ctx.matches(re, "/a/b/c"));
    assert!(!ctx.matches(re, "/a/cb"));
    assert!(!ctx.matches(re, "/b/c"));
    // Only charset characters fill the run.
    assert!(!ctx.matches(re, "/ax/c"));
}

#[test]
fn test_compile_literal_and_empty() {
    let mut ctx = regsat::Context::new();
    let charset = CharSet::from_chars("ab").expect("valid");

    let re = compile(&mut ctx, "ab", &charset);
    assert!(ctx.matches(re, "ab"));
    assert!(!ctx.matches(re, "abb"));

    let re = compile(&mut ctx, "", &charset);
    assert!(ctx.matches(re, ""));
    assert!(!ctx.matches(re, "a"));

    let re = compile(&mut ctx, "*", &charset);
    assert!(ctx.matches(re, ""));
    assert!(ctx.matches(re, "abba"));
    assert!(!ctx.matches(re, "abc"));
}
