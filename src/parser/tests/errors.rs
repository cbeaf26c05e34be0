use crate::errors::ErrorKind;
use crate::parser::parse;

fn assert_err_msg(input: &str, needles: &[&str]) {
    let res = parse(input);
    assert!(res.is_err());
    let err = res.unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Parse(_)));
    let err_msg = err.to_string();
    println!("{}", err_msg);
    println!("Looking for:");
    for needle in needles {
        println!("{}", needle);
        assert!(err_msg.contains(needle));
    }
}

#[test]
fn unterminated_if() {
    assert_err_msg("#if($a)yes", &["Syntax error", "line 1"]);
}

#[test]
fn stray_end() {
    assert_err_msg("hello #end", &["Syntax error", "line 1"]);
}

#[test]
fn missing_set_value() {
    assert_err_msg("#set($a = )", &["Syntax error", "line 1"]);
}

#[test]
fn unclosed_directive_on_later_line() {
    assert_err_msg("first\n#foreach($i in", &["Syntax error", "line 2"]);
}

#[test]
fn else_outside_of_block() {
    assert_err_msg("a #else b", &["Syntax error"]);
}

#[test]
fn error_message_is_single_line() {
    let err = parse("#if(").unwrap_err();
    assert!(!err.to_string().contains('\n'));
}

#[test]
fn expected_rules_are_named_once() {
    let err = parse("<script>if(a){b()}#set</script>").unwrap_err();
    let err_msg = err.to_string();
    assert!(!err_msg.contains("escape_marks"), "{}", err_msg);
    assert!(!err_msg.contains('_'), "{}", err_msg);

    let expected = match err_msg.rsplit_once("expected ") {
        Some((_, list)) => list.replace(", or ", ", ").replace(" or ", ", "),
        None => panic!("no expected rules in `{}`", err_msg),
    };
    let names: Vec<&str> = expected.split(", ").collect();
    for (i, name) in names.iter().enumerate() {
        assert!(!names[i + 1..].contains(name), "`{}` is repeated in `{}`", name, err_msg);
    }
}
