use crate::tokenizer::{parse_command_line, ParsedCommand, Tok, Tokenizer, TokenizerError};

fn argv(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

#[test]
fn test_tokenizer() {
    let toks: Vec<Tok> = Tokenizer::new("  alpha\tbeta  ")
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(
        toks,
        vec![
            Tok {
                text: "alpha".into(),
                quoted: false
            },
            Tok {
                text: "beta".into(),
                quoted: false
            },
        ]
    );

    let toks: Vec<Tok> = Tokenizer::new(r#"echo 'a b' "c'd" x"y z"w"#)
        .collect::<Result<_, _>>()
        .unwrap();
    let texts: Vec<&str> = toks.iter().map(|tok| tok.text.as_str()).collect();
    assert_eq!(texts, vec!["echo", "a b", "c'd", "xy zw"]);
    assert!(!toks[0].quoted);
    assert!(toks[1].quoted && toks[2].quoted && toks[3].quoted);

    assert!(Tokenizer::new("   ").next().is_none());
}

#[test]
fn test_unterminated_quote() {
    let mut t = Tokenizer::new("echo 'oops");
    assert!(matches!(t.next(), Some(Ok(_))));
    assert_eq!(t.next(), Some(Err(TokenizerError::UnterminatedQuote)));
    assert_eq!(t.next(), None);

    assert_eq!(
        parse_command_line("echo \"oops"),
        Err(TokenizerError::UnterminatedQuote)
    );
    assert_eq!(
        TokenizerError::UnterminatedQuote.to_string(),
        "Unexpected end of string, quotes are not balanced"
    );
}

#[test]
fn test_background_marker() {
    assert_eq!(
        parse_command_line("sleep 10 &").unwrap(),
        ParsedCommand {
            argv: argv(&["sleep", "10"]),
            background: true
        }
    );
    assert_eq!(
        parse_command_line("sleep 10").unwrap(),
        ParsedCommand {
            argv: argv(&["sleep", "10"]),
            background: false
        }
    );
    // Only a final, unquoted, standalone '&' counts.
    let quoted = parse_command_line("echo '&'").unwrap();
    assert_eq!(quoted.argv, argv(&["echo", "&"]));
    assert!(!quoted.background);
    let attached = parse_command_line("echo a&").unwrap();
    assert_eq!(attached.argv, argv(&["echo", "a&"]));
    assert!(!attached.background);
    let middle = parse_command_line("echo & b").unwrap();
    assert_eq!(middle.argv, argv(&["echo", "&", "b"]));
    assert!(!middle.background);
}

#[test]
fn test_empty_lines() {
    assert_eq!(parse_command_line("").unwrap(), ParsedCommand::default());
    assert_eq!(parse_command_line(" \t ").unwrap(), ParsedCommand::default());
    let only_amp = parse_command_line("&").unwrap();
    assert!(only_amp.argv.is_empty());
    assert!(only_amp.background);
}
