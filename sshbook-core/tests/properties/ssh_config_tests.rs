//! Property-based tests for the SSH config document model
//!
//! Tests that parsing and rendering is lossless and that mutations only
//! touch the lines they target.

use proptest::prelude::*;
use sshbook_core::ssh_config::{BlockKind, ConfigDocument};

// Strategy for generating host identities
fn arb_identity() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9.-]{0,15}".prop_map(|s| s)
}

// Strategy for generating line terminators
fn arb_eol() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just("\n"), Just("\r\n")]
}

// Strategy for generating whitespace between key and value
fn arb_separator() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just(" "), Just("  "), Just("\t"), Just("="), Just(" = ")]
}

// Strategy for generating blank and comment lines
fn arb_trivia() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        Just("   ".to_string()),
        "#[ a-zA-Z0-9#=\"]{0,30}".prop_map(|s| s),
        "  # [a-zA-Z0-9 ]{0,20}".prop_map(|s| s),
    ]
}

// Strategy for generating directive lines with arbitrary layout
fn arb_directive() -> impl Strategy<Value = String> {
    (
        prop_oneof![Just(""), Just("  "), Just("    "), Just("\t")],
        prop_oneof![
            Just("HostName"),
            Just("hostname"),
            Just("User"),
            Just("PORT"),
            Just("IdentityFile"),
            Just("ProxyJump"),
            Just("LocalForward"),
            Just("ServerAliveInterval"),
        ],
        arb_separator(),
        prop_oneof![
            "[a-zA-Z0-9~/._:-]{1,20}".prop_map(|s| s),
            "\"[a-zA-Z0-9 ]{1,12}\"".prop_map(|s| s),
            "[a-z0-9]{1,8} [a-z0-9]{1,8}".prop_map(|s| s),
        ],
        prop_oneof![
            Just(String::new()),
            Just("   ".to_string()),
            " # [a-z ]{0,10}".prop_map(|s| s),
        ],
    )
        .prop_map(|(indent, key, sep, value, trailing)| {
            format!("{indent}{key}{sep}{value}{trailing}")
        })
}

// Strategy for generating block header lines
fn arb_header() -> impl Strategy<Value = String> {
    prop_oneof![
        prop::collection::vec(arb_identity(), 1..4)
            .prop_map(|patterns| format!("Host {}", patterns.join(" "))),
        Just("Host *".to_string()),
        Just("host  web-*   !web-old".to_string()),
        Just("Match host *.example.com".to_string()),
    ]
}

// Strategy for generating a whole config text
fn arb_config_text() -> impl Strategy<Value = String> {
    let line = prop_oneof![
        3 => arb_directive(),
        2 => arb_trivia(),
        1 => arb_header(),
    ];
    (
        prop::collection::vec((line, arb_eol()), 0..40),
        any::<bool>(),
        any::<bool>(),
    )
        .prop_map(|(lines, bom, final_newline)| {
            let mut text = String::new();
            if bom {
                text.push('\u{feff}');
            }
            for (line, eol) in lines {
                text.push_str(&line);
                text.push_str(eol);
            }
            if !final_newline {
                while text.ends_with('\n') || text.ends_with('\r') {
                    text.pop();
                }
            }
            text
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Unmodified documents render byte for byte
    #[test]
    fn prop_round_trip_is_lossless(text in arb_config_text()) {
        let doc = ConfigDocument::parse(text.as_bytes()).expect("generated text should parse");
        prop_assert_eq!(doc.render(), text);
    }

    // Renaming a host and renaming it back restores the original text
    #[test]
    fn prop_rename_and_back_restores_text(
        prefix in arb_config_text(),
        identity in arb_identity(),
        other in arb_identity(),
    ) {
        prop_assume!(identity != other);
        let text = format!("{prefix}\nHost {identity}\n  User someone\n");
        let mut doc = ConfigDocument::parse_str(&text).expect("generated text should parse");
        prop_assume!(!doc.contains(&other));

        let block = doc.find_block_mut(&identity).expect("host block");
        prop_assert!(block.rename_pattern(&identity, &other));
        prop_assert!(doc.contains(&other));

        let block = doc.find_block_mut(&other).expect("renamed block");
        prop_assert!(block.rename_pattern(&other, &identity));
        prop_assert_eq!(doc.render(), text);
    }

    // Appending a block keeps the existing text as a prefix and makes the
    // new block findable
    #[test]
    fn prop_append_keeps_prefix(text in arb_config_text(), identity in arb_identity()) {
        let mut doc = ConfigDocument::parse_str(&text).expect("generated text should parse");
        prop_assume!(!doc.contains(&identity));

        let mut block = sshbook_core::ssh_config::Block::host(&identity);
        block.upsert_directive("hostname", "10.0.0.1");
        doc.append_block(block);

        let rendered = doc.render();
        let original = text.trim_end_matches(['\r', '\n']);
        prop_assert!(rendered.starts_with(original));
        prop_assert!(doc.contains(&identity));

        let reparsed = ConfigDocument::parse_str(&rendered).expect("rendered text should parse");
        prop_assert_eq!(
            reparsed.find_block(&identity).and_then(|b| b.value("HostName")),
            Some("10.0.0.1")
        );
    }

    // Upserting into one block leaves every other block unchanged
    #[test]
    fn prop_upsert_is_local(
        identities in prop::collection::btree_set(arb_identity(), 2..5),
        body in prop::collection::vec(arb_directive(), 0..4),
        value in "[a-z0-9.]{1,12}",
    ) {
        let identities: Vec<String> = identities.into_iter().collect();
        let mut text = String::new();
        for identity in &identities {
            text.push_str(&format!("Host {identity}\n"));
            for line in &body {
                text.push_str(line);
                text.push('\n');
            }
        }
        let original = ConfigDocument::parse_str(&text).expect("generated text should parse");
        let mut doc = original.clone();
        doc.find_block_mut(&identities[0])
            .expect("first block")
            .upsert_directive("user", &value);

        for (before, after) in original.blocks().iter().zip(doc.blocks()).skip(2) {
            prop_assert_eq!(before, after);
        }
        prop_assert_eq!(
            doc.find_block(&identities[0]).and_then(|b| b.value("User")),
            Some(value.as_str())
        );
    }

    // Only Host blocks take part in identity lookups
    #[test]
    fn prop_match_blocks_are_never_found(identity in arb_identity()) {
        let text = format!("Match host {identity}\n  User x\n");
        let doc = ConfigDocument::parse_str(&text).expect("generated text should parse");
        prop_assert!(!doc.contains(&identity));
        prop_assert_eq!(doc.blocks()[1].kind(), BlockKind::Match);
    }
}
