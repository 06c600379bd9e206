use ministache::syntax::{tokenize, tokenize_with_syntax, Syntax, TokenKind};
use ministache::ErrorKind;

use similar_asserts::assert_eq;

#[test]
fn test_tokens() {
    let tokens = tokenize("Hello {{ name }}, {{{raw}}} {{& amp }}!").unwrap();
    insta::assert_debug_snapshot!(tokens, @r###"
    [
        Text("Hello ") @ 0..6,
        Name("name") @ 6..16,
        Text(", ") @ 16..18,
        Unescaped("raw") @ 18..27,
        Text(" ") @ 27..28,
        Unescaped("amp") @ 28..38,
        Text("!") @ 38..39,
    ]
    "###);
}

#[test]
fn test_sigils() {
    let tokens = tokenize("{{#a}}{{^b}}{{/b}}{{/a}}{{>p}}{{!c}}").unwrap();
    let kinds: Vec<_> = tokens.iter().map(|x| x.kind).collect();
    assert_eq!(
        kinds,
        vec![
            TokenKind::Section,
            TokenKind::Inverted,
            TokenKind::Close,
            TokenKind::Close,
            TokenKind::Partial,
            TokenKind::Comment,
        ]
    );
}

#[test]
fn test_whitespace_after_opener() {
    let tokens = tokenize("{{ #a }}x{{ /a }}").unwrap();
    assert_eq!(tokens[0].kind, TokenKind::Section);
    assert_eq!(tokens[0].value, "a");
    assert_eq!(tokens[2].kind, TokenKind::Close);
}

#[test]
fn test_standalone_lines() {
    let tokens = tokenize("<ul>\n  {{#items}}\n  <li>{{.}}</li>\n  {{/items}}\n</ul>").unwrap();
    insta::assert_debug_snapshot!(tokens, @r###"
    [
        Text("<ul>\n") @ 0..5,
        Section("items") @ 7..17,
        Text("  <li>") @ 18..24,
        Name(".") @ 24..29,
        Text("</li>\n") @ 29..35,
        Close("items") @ 37..47,
        Text("</ul>") @ 48..53,
    ]
    "###);
}

#[test]
fn test_standalone_comment_and_partial() {
    let tokens = tokenize("a\n  {{! comment }}\n\t{{> part }}\nb").unwrap();
    let kinds: Vec<_> = tokens
        .iter()
        .map(|x| (x.kind, x.value.to_string()))
        .collect();
    assert_eq!(
        kinds,
        vec![
            (TokenKind::Text, "a\n".to_string()),
            (TokenKind::Comment, "comment".to_string()),
            (TokenKind::Partial, "part".to_string()),
            (TokenKind::Text, "b".to_string()),
        ]
    );
}

#[test]
fn test_interpolation_lines_are_kept() {
    let tokens = tokenize("  {{name}}\n").unwrap();
    let values: Vec<_> = tokens.iter().map(|x| x.value.to_string()).collect();
    assert_eq!(values, vec!["  ", "name", "\n"]);
}

#[test]
fn test_last_line_is_not_standalone() {
    let tokens = tokenize("{{#a}}\n{{/a}}  ").unwrap();
    let values: Vec<_> = tokens.iter().map(|x| x.value.to_string()).collect();
    assert_eq!(values, vec!["a", "a", "  "]);
}

#[test]
fn test_stripped_line_offsets() {
    let tokens = tokenize("a\n{{!x}}\nb").unwrap();
    assert_eq!(tokens.len(), 3);
    assert_eq!(tokens[0].value, "a\n");
    assert_eq!(tokens[2].value, "b");
    assert_eq!(tokens[2].span.start_offset, 9);
}

#[test]
fn test_delimiter_switch() {
    let source = "{{=<% %>=}}<% a %>{{b}}<%={{ }}=%>{{c}}";
    let tokens = tokenize(source).unwrap();
    insta::assert_debug_snapshot!(tokens, @r###"
    [
        SetDelimiters("<% %>") @ 0..11,
        Name("a") @ 11..18,
        Text("{{b}}") @ 18..23,
        SetDelimiters("{{ }}") @ 23..34,
        Name("c") @ 34..39,
    ]
    "###);
}

#[test]
fn test_custom_initial_syntax() {
    let tokens = tokenize_with_syntax("[[#a]]{{a}}[[/a]]", &Syntax::new("[[", "]]")).unwrap();
    let values: Vec<_> = tokens.iter().map(|x| x.value.to_string()).collect();
    assert_eq!(values, vec!["a", "{{a}}", "a"]);
}

#[test]
fn test_errors() {
    let err = tokenize("a\n{{name").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnclosedTag);
    assert_eq!(err.offset(), Some(8));
    assert_eq!(err.line(), Some(2));

    let err = tokenize("{{=<%=}}").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidDelimiter);

    let err = tokenize("{{=<% % %>=}}").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidDelimiter);

    let err = tokenize("x{{/a}}").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnopenedSection);
    assert_eq!(err.offset(), Some(1));
}
