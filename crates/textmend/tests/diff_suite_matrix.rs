//! Diff layer battery: primitives, line packing, cleanups, serde forms,
//! bisect, and the main entry point.

use std::time::{Duration, Instant};

use textmend::cleanup::{cleanup_merge, cleanup_semantic, cleanup_semantic_lossless};
use textmend::delta::{
    from_delta, levenshtein, pretty_html, source_text, target_text, to_delta, x_index,
};
use textmend::diff::{
    common_overlap, common_prefix, common_suffix, lines_to_units, units_to_lines, Diff,
};
use textmend::{DeltaError, Engine};

#[test]
fn common_prefix_matrix() {
    assert_eq!(common_prefix("abc", "xyz"), 0);
    assert_eq!(common_prefix("1234abcdef", "1234xyz"), 4);
    assert_eq!(common_prefix("1234", "1234xyz"), 4);
}

#[test]
fn common_suffix_matrix() {
    assert_eq!(common_suffix("abc", "xyz"), 0);
    assert_eq!(common_suffix("abcdef1234", "xyz1234"), 4);
    assert_eq!(common_suffix("1234", "xyz1234"), 4);
}

#[test]
fn common_overlap_matrix() {
    assert_eq!(common_overlap("", "abcd"), 0);
    assert_eq!(common_overlap("abc", "abcd"), 3);
    assert_eq!(common_overlap("123456", "abcd"), 0);
    assert_eq!(common_overlap("123456xxx", "xxxabcd"), 3);
    // Ligatures stay opaque code units, no canonical equivalence.
    assert_eq!(common_overlap("fi", "\u{FB01}i"), 0);
}

fn strings5(parts: [&str; 5]) -> Option<[String; 5]> {
    Some(parts.map(String::from))
}

#[test]
fn half_match_matrix() {
    let mut engine = Engine::new();
    engine.diff_timeout = 1.0;

    assert_eq!(engine.half_match("1234567890", "abcdef"), None);
    assert_eq!(engine.half_match("12345", "23"), None);

    assert_eq!(
        engine.half_match("1234567890", "a345678z"),
        strings5(["12", "90", "a", "z", "345678"])
    );
    assert_eq!(
        engine.half_match("a345678z", "1234567890"),
        strings5(["a", "z", "12", "90", "345678"])
    );
    assert_eq!(
        engine.half_match("abc56789z", "1234567890"),
        strings5(["abc", "z", "1234", "0", "56789"])
    );
    assert_eq!(
        engine.half_match("a23456xyz", "1234567890"),
        strings5(["a", "xyz", "1", "7890", "23456"])
    );

    assert_eq!(
        engine.half_match("121231234123451234123121", "a1234123451234z"),
        strings5(["12123", "123121", "a", "z", "1234123451234"])
    );
    assert_eq!(
        engine.half_match("x-=-=-=-=-=-=-=-=-=-=-=-=", "xx-=-=-=-=-=-=-="),
        strings5(["", "-=-=-=-=-=", "x", "", "x-=-=-=-=-=-=-="])
    );
    assert_eq!(
        engine.half_match("-=-=-=-=-=-=-=-=-=-=-=-=y", "-=-=-=-=-=-=-=yy"),
        strings5(["-=-=-=-=-=", "", "", "y", "-=-=-=-=-=-=-=y"])
    );

    // A half match is not always the optimal split.
    assert_eq!(
        engine.half_match("qHilloHelloHew", "xHelloHeHulloy"),
        strings5(["qHillo", "w", "x", "Hulloy", "HelloHe"])
    );

    // Without a timeout the heuristic is off to keep diffs optimal.
    engine.diff_timeout = 0.0;
    assert_eq!(engine.half_match("qHilloHelloHew", "xHelloHeHulloy"), None);
}

#[test]
fn lines_to_units_matrix() {
    let (packed1, packed2, table) = lines_to_units("alpha\nbeta\nalpha\n", "beta\nalpha\nbeta\n");
    assert_eq!(packed1, vec![1, 2, 1]);
    assert_eq!(packed2, vec![2, 1, 2]);
    assert_eq!(table, vec!["", "alpha\n", "beta\n"]);

    let (packed1, packed2, table) = lines_to_units("", "alpha\r\nbeta\r\n\r\n\r\n");
    assert_eq!(packed1, Vec::<u16>::new());
    assert_eq!(packed2, vec![1, 2, 3, 3]);
    assert_eq!(table, vec!["", "alpha\r\n", "beta\r\n", "\r\n"]);

    let (packed1, packed2, table) = lines_to_units("a", "b");
    assert_eq!(packed1, vec![1]);
    assert_eq!(packed2, vec![2]);
    assert_eq!(table, vec!["", "a", "b"]);

    // More than 256 distinct lines to reveal any 8-bit limitation.
    let n = 300;
    let mut lines = String::new();
    let mut packed_expected: Vec<u16> = Vec::new();
    let mut table_expected = vec![String::new()];
    for x in 1..=n {
        lines.push_str(&format!("{x}\n"));
        packed_expected.push(x as u16);
        table_expected.push(format!("{x}\n"));
    }
    let (packed1, packed2, table) = lines_to_units(&lines, "");
    assert_eq!(packed1, packed_expected);
    assert_eq!(packed2, Vec::<u16>::new());
    assert_eq!(table, table_expected);
}

#[test]
fn units_to_lines_matrix() {
    let mut diffs = vec![
        Diff::equal("\u{1}\u{2}\u{1}"),
        Diff::insert("\u{2}\u{1}\u{2}"),
    ];
    let table = vec!["".to_string(), "alpha\n".to_string(), "beta\n".to_string()];
    units_to_lines(&mut diffs, &table);
    assert_eq!(
        diffs,
        vec![
            Diff::equal("alpha\nbeta\nalpha\n"),
            Diff::insert("beta\nalpha\nbeta\n"),
        ]
    );

    let n = 300;
    let mut lines = String::new();
    let mut packed = String::new();
    let mut table = vec![String::new()];
    for x in 1u32..=n {
        lines.push_str(&format!("{x}\n"));
        packed.push(char::from_u32(x).expect("small code point"));
        table.push(format!("{x}\n"));
    }
    let mut diffs = vec![Diff::delete(&packed)];
    units_to_lines(&mut diffs, &table);
    assert_eq!(diffs, vec![Diff::delete(&lines)]);
}

#[test]
fn cleanup_merge_matrix() {
    let mut diffs: Vec<Diff> = Vec::new();
    cleanup_merge(&mut diffs);
    assert_eq!(diffs, Vec::<Diff>::new());

    let mut diffs = vec![Diff::equal("a"), Diff::delete("b"), Diff::insert("c")];
    cleanup_merge(&mut diffs);
    assert_eq!(
        diffs,
        vec![Diff::equal("a"), Diff::delete("b"), Diff::insert("c")]
    );

    let mut diffs = vec![Diff::equal("a"), Diff::equal("b"), Diff::equal("c")];
    cleanup_merge(&mut diffs);
    assert_eq!(diffs, vec![Diff::equal("abc")]);

    let mut diffs = vec![Diff::delete("a"), Diff::delete("b"), Diff::delete("c")];
    cleanup_merge(&mut diffs);
    assert_eq!(diffs, vec![Diff::delete("abc")]);

    let mut diffs = vec![Diff::insert("a"), Diff::insert("b"), Diff::insert("c")];
    cleanup_merge(&mut diffs);
    assert_eq!(diffs, vec![Diff::insert("abc")]);

    let mut diffs = vec![
        Diff::delete("a"),
        Diff::insert("b"),
        Diff::delete("c"),
        Diff::insert("d"),
        Diff::equal("e"),
        Diff::equal("f"),
    ];
    cleanup_merge(&mut diffs);
    assert_eq!(
        diffs,
        vec![Diff::delete("ac"), Diff::insert("bd"), Diff::equal("ef")]
    );

    let mut diffs = vec![Diff::delete("a"), Diff::insert("abc"), Diff::delete("dc")];
    cleanup_merge(&mut diffs);
    assert_eq!(
        diffs,
        vec![
            Diff::equal("a"),
            Diff::delete("d"),
            Diff::insert("b"),
            Diff::equal("c"),
        ]
    );

    let mut diffs = vec![
        Diff::equal("x"),
        Diff::delete("a"),
        Diff::insert("abc"),
        Diff::delete("dc"),
        Diff::equal("y"),
    ];
    cleanup_merge(&mut diffs);
    assert_eq!(
        diffs,
        vec![
            Diff::equal("xa"),
            Diff::delete("d"),
            Diff::insert("b"),
            Diff::equal("cy"),
        ]
    );

    let mut diffs = vec![Diff::equal("a"), Diff::insert("ba"), Diff::equal("c")];
    cleanup_merge(&mut diffs);
    assert_eq!(diffs, vec![Diff::insert("ab"), Diff::equal("ac")]);

    let mut diffs = vec![Diff::equal("c"), Diff::insert("ab"), Diff::equal("a")];
    cleanup_merge(&mut diffs);
    assert_eq!(diffs, vec![Diff::equal("ca"), Diff::insert("ba")]);

    let mut diffs = vec![
        Diff::equal("a"),
        Diff::delete("b"),
        Diff::equal("c"),
        Diff::delete("ac"),
        Diff::equal("x"),
    ];
    cleanup_merge(&mut diffs);
    assert_eq!(diffs, vec![Diff::delete("abc"), Diff::equal("acx")]);

    let mut diffs = vec![
        Diff::equal("x"),
        Diff::delete("ca"),
        Diff::equal("c"),
        Diff::delete("b"),
        Diff::equal("a"),
    ];
    cleanup_merge(&mut diffs);
    assert_eq!(diffs, vec![Diff::equal("xca"), Diff::delete("cba")]);
}

#[test]
fn cleanup_semantic_lossless_matrix() {
    let mut diffs: Vec<Diff> = Vec::new();
    cleanup_semantic_lossless(&mut diffs);
    assert_eq!(diffs, Vec::<Diff>::new());

    let mut diffs = vec![
        Diff::equal("AAA\r\n\r\nBBB"),
        Diff::insert("\r\nDDD\r\n\r\nBBB"),
        Diff::equal("\r\nEEE"),
    ];
    cleanup_semantic_lossless(&mut diffs);
    assert_eq!(
        diffs,
        vec![
            Diff::equal("AAA\r\n\r\n"),
            Diff::insert("BBB\r\nDDD\r\n\r\n"),
            Diff::equal("BBB\r\nEEE"),
        ]
    );

    let mut diffs = vec![
        Diff::equal("AAA\r\nBBB"),
        Diff::insert(" DDD\r\nBBB"),
        Diff::equal(" EEE"),
    ];
    cleanup_semantic_lossless(&mut diffs);
    assert_eq!(
        diffs,
        vec![
            Diff::equal("AAA\r\n"),
            Diff::insert("BBB DDD\r\n"),
            Diff::equal("BBB EEE"),
        ]
    );

    let mut diffs = vec![
        Diff::equal("The c"),
        Diff::insert("ow and the c"),
        Diff::equal("at."),
    ];
    cleanup_semantic_lossless(&mut diffs);
    assert_eq!(
        diffs,
        vec![
            Diff::equal("The "),
            Diff::insert("cow and the "),
            Diff::equal("cat."),
        ]
    );

    let mut diffs = vec![
        Diff::equal("The-c"),
        Diff::insert("ow-and-the-c"),
        Diff::equal("at."),
    ];
    cleanup_semantic_lossless(&mut diffs);
    assert_eq!(
        diffs,
        vec![
            Diff::equal("The-"),
            Diff::insert("cow-and-the-"),
            Diff::equal("cat."),
        ]
    );

    let mut diffs = vec![Diff::equal("a"), Diff::delete("a"), Diff::equal("ax")];
    cleanup_semantic_lossless(&mut diffs);
    assert_eq!(diffs, vec![Diff::delete("a"), Diff::equal("aax")]);

    let mut diffs = vec![Diff::equal("xa"), Diff::delete("a"), Diff::equal("a")];
    cleanup_semantic_lossless(&mut diffs);
    assert_eq!(diffs, vec![Diff::equal("xaa"), Diff::delete("a")]);

    let mut diffs = vec![
        Diff::equal("The xxx. The "),
        Diff::insert("zzz. The "),
        Diff::equal("yyy."),
    ];
    cleanup_semantic_lossless(&mut diffs);
    assert_eq!(
        diffs,
        vec![
            Diff::equal("The xxx."),
            Diff::insert(" The zzz."),
            Diff::equal(" The yyy."),
        ]
    );
}

#[test]
fn cleanup_semantic_matrix() {
    let mut diffs: Vec<Diff> = Vec::new();
    cleanup_semantic(&mut diffs);
    assert_eq!(diffs, Vec::<Diff>::new());

    let mut diffs = vec![
        Diff::delete("ab"),
        Diff::insert("cd"),
        Diff::equal("12"),
        Diff::delete("e"),
    ];
    cleanup_semantic(&mut diffs);
    assert_eq!(
        diffs,
        vec![
            Diff::delete("ab"),
            Diff::insert("cd"),
            Diff::equal("12"),
            Diff::delete("e"),
        ]
    );

    let mut diffs = vec![
        Diff::delete("abc"),
        Diff::insert("ABC"),
        Diff::equal("1234"),
        Diff::delete("wxyz"),
    ];
    cleanup_semantic(&mut diffs);
    assert_eq!(
        diffs,
        vec![
            Diff::delete("abc"),
            Diff::insert("ABC"),
            Diff::equal("1234"),
            Diff::delete("wxyz"),
        ]
    );

    let mut diffs = vec![Diff::delete("a"), Diff::equal("b"), Diff::delete("c")];
    cleanup_semantic(&mut diffs);
    assert_eq!(diffs, vec![Diff::delete("abc"), Diff::insert("b")]);

    let mut diffs = vec![
        Diff::delete("ab"),
        Diff::equal("cd"),
        Diff::delete("e"),
        Diff::equal("f"),
        Diff::insert("g"),
    ];
    cleanup_semantic(&mut diffs);
    assert_eq!(diffs, vec![Diff::delete("abcdef"), Diff::insert("cdfg")]);

    let mut diffs = vec![
        Diff::insert("1"),
        Diff::equal("A"),
        Diff::delete("B"),
        Diff::insert("2"),
        Diff::equal("_"),
        Diff::insert("1"),
        Diff::equal("A"),
        Diff::delete("B"),
        Diff::insert("2"),
    ];
    cleanup_semantic(&mut diffs);
    assert_eq!(diffs, vec![Diff::delete("AB_AB"), Diff::insert("1A2_1A2")]);

    let mut diffs = vec![
        Diff::equal("The c"),
        Diff::delete("ow and the c"),
        Diff::equal("at."),
    ];
    cleanup_semantic(&mut diffs);
    assert_eq!(
        diffs,
        vec![
            Diff::equal("The "),
            Diff::delete("cow and the "),
            Diff::equal("cat."),
        ]
    );

    let mut diffs = vec![Diff::delete("abcxx"), Diff::insert("xxdef")];
    cleanup_semantic(&mut diffs);
    assert_eq!(diffs, vec![Diff::delete("abcxx"), Diff::insert("xxdef")]);

    let mut diffs = vec![Diff::delete("abcxxx"), Diff::insert("xxxdef")];
    cleanup_semantic(&mut diffs);
    assert_eq!(
        diffs,
        vec![Diff::delete("abc"), Diff::equal("xxx"), Diff::insert("def")]
    );

    let mut diffs = vec![Diff::delete("xxxabc"), Diff::insert("defxxx")];
    cleanup_semantic(&mut diffs);
    assert_eq!(
        diffs,
        vec![Diff::insert("def"), Diff::equal("xxx"), Diff::delete("abc")]
    );

    let mut diffs = vec![
        Diff::delete("abcd1212"),
        Diff::insert("1212efghi"),
        Diff::equal("----"),
        Diff::delete("A3"),
        Diff::insert("3BC"),
    ];
    cleanup_semantic(&mut diffs);
    assert_eq!(
        diffs,
        vec![
            Diff::delete("abcd"),
            Diff::equal("1212"),
            Diff::insert("efghi"),
            Diff::equal("----"),
            Diff::delete("A"),
            Diff::equal("3"),
            Diff::insert("BC"),
        ]
    );
}

#[test]
fn cleanup_efficiency_matrix() {
    let mut engine = Engine::new();
    engine.diff_edit_cost = 4;

    let mut diffs: Vec<Diff> = Vec::new();
    engine.cleanup_efficiency(&mut diffs);
    assert_eq!(diffs, Vec::<Diff>::new());

    let mut diffs = vec![
        Diff::delete("ab"),
        Diff::insert("12"),
        Diff::equal("wxyz"),
        Diff::delete("cd"),
        Diff::insert("34"),
    ];
    engine.cleanup_efficiency(&mut diffs);
    assert_eq!(
        diffs,
        vec![
            Diff::delete("ab"),
            Diff::insert("12"),
            Diff::equal("wxyz"),
            Diff::delete("cd"),
            Diff::insert("34"),
        ]
    );

    let mut diffs = vec![
        Diff::delete("ab"),
        Diff::insert("12"),
        Diff::equal("xyz"),
        Diff::delete("cd"),
        Diff::insert("34"),
    ];
    engine.cleanup_efficiency(&mut diffs);
    assert_eq!(diffs, vec![Diff::delete("abxyzcd"), Diff::insert("12xyz34")]);

    let mut diffs = vec![
        Diff::insert("12"),
        Diff::equal("x"),
        Diff::delete("cd"),
        Diff::insert("34"),
    ];
    engine.cleanup_efficiency(&mut diffs);
    assert_eq!(diffs, vec![Diff::delete("xcd"), Diff::insert("12x34")]);

    let mut diffs = vec![
        Diff::delete("ab"),
        Diff::insert("12"),
        Diff::equal("xy"),
        Diff::insert("34"),
        Diff::equal("z"),
        Diff::delete("cd"),
        Diff::insert("56"),
    ];
    engine.cleanup_efficiency(&mut diffs);
    assert_eq!(
        diffs,
        vec![Diff::delete("abxyzcd"), Diff::insert("12xy34z56")]
    );

    engine.diff_edit_cost = 5;
    let mut diffs = vec![
        Diff::delete("ab"),
        Diff::insert("12"),
        Diff::equal("wxyz"),
        Diff::delete("cd"),
        Diff::insert("34"),
    ];
    engine.cleanup_efficiency(&mut diffs);
    assert_eq!(
        diffs,
        vec![Diff::delete("abwxyzcd"), Diff::insert("12wxyz34")]
    );
}

#[test]
fn pretty_html_rendering() {
    let diffs = vec![
        Diff::equal("a\n"),
        Diff::delete("<B>b</B>"),
        Diff::insert("c&d"),
    ];
    assert_eq!(
        pretty_html(&diffs),
        "<span>a&para;<br></span><del style=\"background:#ffe6e6;\">&lt;B&gt;b&lt;/B&gt;</del>\
         <ins style=\"background:#e6ffe6;\">c&amp;d</ins>"
    );
}

#[test]
fn source_and_target_text() {
    let diffs = vec![
        Diff::equal("jump"),
        Diff::delete("s"),
        Diff::insert("ed"),
        Diff::equal(" over "),
        Diff::delete("the"),
        Diff::insert("a"),
        Diff::equal(" lazy"),
    ];
    assert_eq!(source_text(&diffs), "jumps over the lazy");
    assert_eq!(target_text(&diffs), "jumped over a lazy");
}

#[test]
fn delta_round_trip_and_errors() {
    let diffs = vec![
        Diff::equal("jump"),
        Diff::delete("s"),
        Diff::insert("ed"),
        Diff::equal(" over "),
        Diff::delete("the"),
        Diff::insert("a"),
        Diff::equal(" lazy"),
        Diff::insert("old dog"),
    ];
    let text1 = source_text(&diffs);
    assert_eq!(text1, "jumps over the lazy");

    let delta = to_delta(&diffs);
    assert_eq!(delta, "=4\t-1\t+ed\t=6\t-3\t+a\t=5\t+old dog");
    assert_eq!(from_delta(&text1, &delta).unwrap(), diffs);

    // One unit too long.
    let too_long = format!("{text1}x");
    assert!(matches!(
        from_delta(&too_long, &delta),
        Err(DeltaError::LengthMismatch { .. })
    ));

    // One unit too short.
    assert!(matches!(
        from_delta(&text1[1..], &delta),
        Err(DeltaError::LengthMismatch { .. })
    ));

    // Invalid escape in an insertion.
    assert!(matches!(from_delta("", "+%c3%xy"), Err(DeltaError::Codec(_))));

    // Unknown operation and bad count.
    assert!(matches!(from_delta("", "x"), Err(DeltaError::InvalidToken(_))));
    assert!(matches!(from_delta("a", "=a"), Err(DeltaError::InvalidCount(_))));
    assert!(matches!(from_delta("a", "=-1"), Err(DeltaError::InvalidCount(_))));
}

#[test]
fn delta_special_characters() {
    let diffs = vec![
        Diff::equal("\u{680} \u{0} \t %"),
        Diff::delete("\u{681} \u{1} \n ^"),
        Diff::insert("\u{682} \u{2} \\ |"),
    ];
    let text1 = source_text(&diffs);
    assert_eq!(text1, "\u{680} \u{0} \t %\u{681} \u{1} \n ^");

    let delta = to_delta(&diffs);
    assert_eq!(delta, "=7\t-7\t+%DA%82 %02 %5C %7C");
    assert_eq!(from_delta(&text1, &delta).unwrap(), diffs);
}

#[test]
fn delta_unchanged_character_pool() {
    let diffs = vec![Diff::insert(
        "A-Z a-z 0-9 - _ . ! ~ * ' ( ) ; / ? : @ & = + $ , # ",
    )];
    assert_eq!(
        target_text(&diffs),
        "A-Z a-z 0-9 - _ . ! ~ * ' ( ) ; / ? : @ & = + $ , # "
    );
    let delta = to_delta(&diffs);
    assert_eq!(delta, "+A-Z a-z 0-9 - _ . ! ~ * ' ( ) ; / ? : @ & = + $ , # ");
    assert_eq!(from_delta("", &delta).unwrap(), diffs);
}

#[test]
fn x_index_translation() {
    let diffs = vec![Diff::delete("a"), Diff::insert("1234"), Diff::equal("xyz")];
    assert_eq!(x_index(&diffs, 2), 5);

    let diffs = vec![Diff::equal("a"), Diff::delete("1234"), Diff::equal("xyz")];
    assert_eq!(x_index(&diffs, 3), 1);
}

#[test]
fn levenshtein_run_maxima() {
    let diffs = vec![Diff::delete("abc"), Diff::insert("1234"), Diff::equal("xyz")];
    assert_eq!(levenshtein(&diffs), 4);

    let diffs = vec![Diff::equal("xyz"), Diff::delete("abc"), Diff::insert("1234")];
    assert_eq!(levenshtein(&diffs), 4);

    let diffs = vec![Diff::delete("abc"), Diff::equal("xyz"), Diff::insert("1234")];
    assert_eq!(levenshtein(&diffs), 7);
}

#[test]
fn bisect_normal_and_expired_deadline() {
    let engine = Engine::new();
    assert_eq!(
        engine.diff_bisect("cat", "map", None),
        vec![
            Diff::delete("c"),
            Diff::insert("m"),
            Diff::equal("a"),
            Diff::delete("t"),
            Diff::insert("p"),
        ]
    );

    let expired = Instant::now()
        .checked_sub(Duration::from_secs(1))
        .unwrap_or_else(Instant::now);
    assert_eq!(
        engine.diff_bisect("cat", "map", Some(expired)),
        vec![Diff::delete("cat"), Diff::insert("map")]
    );
}

#[test]
fn diff_main_trivial_cases() {
    let engine = Engine::new();
    assert_eq!(engine.diff_main_checklines("", "", false), Vec::<Diff>::new());

    assert_eq!(
        engine.diff_main_checklines("abc", "abc", false),
        vec![Diff::equal("abc")]
    );
    assert_eq!(
        engine.diff_main_checklines("abc", "ab123c", false),
        vec![Diff::equal("ab"), Diff::insert("123"), Diff::equal("c")]
    );
    assert_eq!(
        engine.diff_main_checklines("a123bc", "abc", false),
        vec![Diff::equal("a"), Diff::delete("123"), Diff::equal("bc")]
    );
    assert_eq!(
        engine.diff_main_checklines("abc", "a123b456c", false),
        vec![
            Diff::equal("a"),
            Diff::insert("123"),
            Diff::equal("b"),
            Diff::insert("456"),
            Diff::equal("c"),
        ]
    );
    assert_eq!(
        engine.diff_main_checklines("a123b456c", "abc", false),
        vec![
            Diff::equal("a"),
            Diff::delete("123"),
            Diff::equal("b"),
            Diff::delete("456"),
            Diff::equal("c"),
        ]
    );
}

#[test]
fn diff_main_real_diffs() {
    let mut engine = Engine::new();
    // Optimal diffs, no heuristic shortcuts.
    engine.diff_timeout = 0.0;

    assert_eq!(
        engine.diff_main_checklines("a", "b", false),
        vec![Diff::delete("a"), Diff::insert("b")]
    );
    assert_eq!(
        engine.diff_main_checklines("Apples are a fruit.", "Bananas are also fruit.", false),
        vec![
            Diff::delete("Apple"),
            Diff::insert("Banana"),
            Diff::equal("s are a"),
            Diff::insert("lso"),
            Diff::equal(" fruit."),
        ]
    );
    assert_eq!(
        engine.diff_main_checklines("ax\t", "\u{680}x\u{0}", false),
        vec![
            Diff::delete("a"),
            Diff::insert("\u{680}"),
            Diff::equal("x"),
            Diff::delete("\t"),
            Diff::insert("\u{0}"),
        ]
    );
    assert_eq!(
        engine.diff_main_checklines("1ayb2", "abxab", false),
        vec![
            Diff::delete("1"),
            Diff::equal("a"),
            Diff::delete("y"),
            Diff::equal("b"),
            Diff::delete("2"),
            Diff::insert("xab"),
        ]
    );
    assert_eq!(
        engine.diff_main_checklines("abcy", "xaxcxabc", false),
        vec![Diff::insert("xaxcx"), Diff::equal("abc"), Diff::delete("y")]
    );
    assert_eq!(
        engine.diff_main_checklines(
            "ABCDa=bcd=efghijklmnopqrsEFGHIJKLMNOefg",
            "a-bcd-efghijklmnopqrs",
            false
        ),
        vec![
            Diff::delete("ABCD"),
            Diff::equal("a"),
            Diff::delete("="),
            Diff::insert("-"),
            Diff::equal("bcd"),
            Diff::delete("="),
            Diff::insert("-"),
            Diff::equal("efghijklmnopqrs"),
            Diff::delete("EFGHIJKLMNOefg"),
        ]
    );
    assert_eq!(
        engine.diff_main_checklines("a [[Pennsylvania]] and [[New", " and [[Pennsylvania]]", false),
        vec![
            Diff::insert(" "),
            Diff::equal("a"),
            Diff::insert("nd"),
            Diff::equal(" [[Pennsylvania]]"),
            Diff::delete(" and [[New"),
        ]
    );
}

#[test]
fn diff_main_timeout_bounds() {
    let mut engine = Engine::new();
    engine.diff_timeout = 0.1;

    let mut a = "`Twas brillig, and the slithy toves\nDid gyre and gimble in the wabe:\nAll mimsy were the borogoves,\nAnd the mome raths outgrabe.\n".to_string();
    let mut b = "I am the very model of a modern major general,\nI've information vegetable, animal, and mineral,\nI know the kings of England, and I quote the fights historical,\nFrom Marathon to Waterloo, in order categorical.\n".to_string();
    // Double the texts until a timeout is certain.
    for _ in 0..10 {
        a = format!("{a}{a}");
        b = format!("{b}{b}");
    }

    let started = Instant::now();
    engine.diff_main(&a, &b);
    let elapsed = started.elapsed();
    // At least the whole timeout was spent, and not outrageously more
    // (the deadline is only checked between bisect iterations).
    assert!(elapsed >= Duration::from_millis(100), "returned too early: {elapsed:?}");
    assert!(elapsed < Duration::from_secs(2), "overran the deadline: {elapsed:?}");
}

#[test]
fn diff_main_line_mode_equivalence() {
    let mut engine = Engine::new();
    engine.diff_timeout = 0.0;

    // Single-character granularity and line granularity must agree once
    // the refinement pass has run.
    let a = "1234567890\n".repeat(13);
    let b = "abcdefghij\n".repeat(13);
    assert_eq!(
        engine.diff_main_checklines(&a, &b, true),
        engine.diff_main_checklines(&a, &b, false)
    );

    let a = "1234567890".repeat(13);
    let b = "abcdefghij".repeat(13);
    assert_eq!(
        engine.diff_main_checklines(&a, &b, true),
        engine.diff_main_checklines(&a, &b, false)
    );

    let a = "1234567890\n".repeat(13);
    let b = "abcdefghij\n1234567890\n1234567890\n1234567890\n".repeat(3) + "abcdefghij\n";
    let rebuild = |diffs: &[Diff]| (source_text(diffs), target_text(diffs));
    let lines = engine.diff_main_checklines(&a, &b, true);
    let chars = engine.diff_main_checklines(&a, &b, false);
    assert_eq!(rebuild(&lines), rebuild(&chars));
}
