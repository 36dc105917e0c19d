//! Template expansion for dynamic paths and failure messages.
//!
//! # Design
//! Substitutes `$token` placeholders where a token is one or more of
//! `[A-Za-z0-9_]`. A token that parses as a non-negative integer indexes
//! into the argument list; any other token is looked up by key when the
//! sole argument is a map. Unresolvable tokens render as explicit markers
//! (`[bad_index:$N]`, `[no_key:$name]`) instead of failing, so a broken
//! message template never hides the failure it was describing. Expansion
//! is a single pass; replacement text is never re-scanned.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use regex::{Captures, Regex};

static TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$([A-Za-z0-9_]+)").expect("token pattern is valid"));

/// A single expansion argument.
pub enum Arg<'a> {
    /// Rendered through its `Display` implementation.
    Value(&'a dyn fmt::Display),
    /// Key/value source for named tokens when supplied as the only argument.
    Map(&'a BTreeMap<&'a str, &'a dyn fmt::Display>),
}

/// Expand every `$token` in `template` against `args`.
///
/// A template without tokens is returned unchanged.
pub fn expand(template: &str, args: &[Arg<'_>]) -> String {
    TOKEN
        .replace_all(template, |caps: &Captures<'_>| {
            let name = &caps[1];
            if let Ok(index) = name.parse::<usize>() {
                return match args.get(index) {
                    Some(arg) => render(arg),
                    None => format!("[bad_index:${index}]"),
                };
            }
            if let [Arg::Map(map)] = args {
                if let Some(value) = map.get(name) {
                    return value.to_string();
                }
            }
            format!("[no_key:${name}]")
        })
        .into_owned()
}

fn render(arg: &Arg<'_>) -> String {
    match arg {
        Arg::Value(value) => value.to_string(),
        Arg::Map(map) => {
            let entries: Vec<String> = map.iter().map(|(k, v)| format!("{k}: {v}")).collect();
            format!("{{{}}}", entries.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SomeType;

    impl fmt::Display for SomeType {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("has-stringer")
        }
    }

    #[test]
    fn no_tokens_is_the_identity_function() {
        assert_eq!(expand("no change", &[]), "no change");
        assert_eq!(expand("", &[]), "");
    }

    #[test]
    fn indexed_arguments_render_their_display_form() {
        let custom = SomeType;
        let actual = expand(
            "$0, $1$2 @@$3@@ $99",
            &[
                Arg::Value(&10),
                Arg::Value(&"any"),
                Arg::Value(&true),
                Arg::Value(&custom),
            ],
        );

        assert_eq!(actual, "10, anytrue @@has-stringer@@ [bad_index:$99]");
    }

    #[test]
    fn single_map_argument_resolves_named_tokens() {
        let negative = -1;
        let mut keys: BTreeMap<&str, &dyn fmt::Display> = BTreeMap::new();
        keys.insert("lower", &1);
        keys.insert("UPPER", &"two");
        keys.insert("Mixed", &true);
        keys.insert("aZ_09", &negative);

        let actual = expand(
            "before $lower$UPPER ($Mixed) $aZ_09 after $UNKNOWN",
            &[Arg::Map(&keys)],
        );

        assert_eq!(actual, "before 1two (true) -1 after [no_key:$UNKNOWN]");
    }

    #[test]
    fn named_token_without_a_map_renders_the_no_key_marker() {
        assert_eq!(expand("$name", &[]), "[no_key:$name]");
        assert_eq!(
            expand("$name", &[Arg::Value(&1), Arg::Value(&2)]),
            "[no_key:$name]"
        );
    }

    #[test]
    fn indexed_token_can_render_a_map_argument() {
        let mut keys: BTreeMap<&str, &dyn fmt::Display> = BTreeMap::new();
        keys.insert("b", &2);
        keys.insert("a", &1);

        assert_eq!(expand("$0", &[Arg::Map(&keys)]), "{a: 1, b: 2}");
    }

    #[test]
    fn literal_text_around_tokens_is_preserved_in_order() {
        let actual = expand("a $0 b $1 c", &[Arg::Value(&"x"), Arg::Value(&"y")]);
        assert_eq!(actual, "a x b y c");
    }
}
