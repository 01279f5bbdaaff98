// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    diacritics = { "Örtü #1", "ortu-1" },
    blank = { "   ", "project" },
    simple = { "My Project", "my-project" },
    already_slug = { "already-a-slug", "already-a-slug" },
    leading_trailing_punct = { "--Hello World!!--", "hello-world" },
    empty = { "", "project" },
)]
fn slug_matches_expected(input: &str, expected: &str) {
    assert_eq!(slug(input), expected);
}

#[test]
fn slug_is_idempotent() {
    let once = slug("Örtü #1");
    let twice = slug(&once);
    assert_eq!(once, twice);
}

#[cfg(feature = "test-support")]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn slug_never_empty(s in ".*") {
            prop_assert!(!slug(&s).is_empty());
        }

        #[test]
        fn slug_is_lowercase_ascii_and_dashes(s in ".*") {
            let out = slug(&s);
            prop_assert!(out.chars().all(|c| c.is_ascii_alphanumeric() && c.is_lowercase() || c == '-' || c.is_ascii_digit()));
        }
    }
}
