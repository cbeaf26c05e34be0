use pretty_assertions::assert_eq;

use crate::context::Context;

use super::{render_template, sample_context, Product};

fn assert_renders(inputs: &[(&str, &str)]) {
    let context = sample_context();
    for &(input, expected) in inputs {
        println!("{:?} -> {:?}", input, expected);
        assert_eq!(render_template(input, &context).unwrap(), expected);
    }
}

#[test]
fn render_simple_string() {
    let result = render_template("<h1>Hello world</h1>", &Context::new());
    assert_eq!(result.unwrap(), "<h1>Hello world</h1>".to_owned());
}

#[test]
fn render_references() {
    assert_renders(&[
        ("Hello $name", "Hello Ada"),
        ("${name}s", "Adas"),
        ("$!name", "Ada"),
        ("$user.name", "Bob"),
        ("$user.tags", "[a, b]"),
        ("$user", "{name=Bob, tags=[a, b]}"),
        ("$user.tags[1]", "b"),
        ("$user['name']", "Bob"),
        ("$age is $price", "36 is 2.5"),
    ]);
}

#[test]
fn render_undefined_references_as_written() {
    assert_renders(&[
        ("$missing", "$missing"),
        ("${missing}", "${missing}"),
        ("[$!missing]", "[]"),
        ("$user.missing", "$user.missing"),
        ("$missing.name", "$missing.name"),
        ("$nothing", "$nothing"),
        ("$user.tags[5]", "$user.tags[5]"),
        ("<p>$missing</p>", "<p>$missing</p>"),
    ]);
}

#[test]
fn render_text_that_looks_like_syntax() {
    assert_renders(&[
        ("Costs $5 or #1", "Costs $5 or #1"),
        ("email@example.com #tag", "email@example.com #tag"),
        ("$ and # and \\", "$ and # and \\"),
        ("  $name  \n", "  Ada  \n"),
    ]);
}

#[test]
fn render_escaped_references() {
    assert_renders(&[
        ("\\$name", "$name"),
        ("\\\\$name", "\\Ada"),
        ("\\\\\\$name", "\\$name"),
        ("\\$missing", "\\$missing"),
        ("\\\\$missing", "\\\\$missing"),
    ]);
}

#[test]
fn render_math() {
    assert_renders(&[
        ("#set($x = 1 + 1)$x", "2"),
        ("#set($x = 1 + 1.5)$x", "2.5"),
        ("#set($x = 2 - 3)$x", "-1"),
        ("#set($x = 7 / 2)$x", "3"),
        ("#set($x = 7 % 2)$x", "1"),
        ("#set($x = 7.0 / 2)$x", "3.5"),
        ("#set($x = 2 + 1 * 2)$x", "4"),
        ("#set($x = (2 + 1) * 2)$x", "6"),
        ("#set($x = $age + 4)$x", "40"),
    ]);
}

#[test]
fn render_string_concatenation() {
    assert_renders(&[
        ("#set($x = 'a' + 1)$x", "a1"),
        ("#set($x = $name + ' L.')$x", "Ada L."),
        ("#set($x = \"$name is $age\")$x", "Ada is 36"),
        ("#set($x = \"$missing!\")$x", "$missing!"),
        ("#set($x = '$name')$x", "$name"),
    ]);
}

#[test]
fn render_collections_literals() {
    assert_renders(&[
        ("#set($l = [1, 'two', $name])$l", "[1, two, Ada]"),
        ("#set($r = [1..3])$r", "[1, 2, 3]"),
        ("#set($m = {\"a\": 1, 'b': $name})$m.b", "Ada"),
        ("#set($l = [])$l.isEmpty()", "true"),
    ]);
}

#[test]
fn render_if() {
    assert_renders(&[
        ("#if($name)yes#end", "yes"),
        ("#if($empty)yes#else no#end", " no"),
        ("#if($none)yes#else no#end", " no"),
        ("#if($missing)a#elseif($age > 30)b#end", "b"),
        ("#if($age == 36 && $name == 'Ada')ok#end", "ok"),
        ("#if($age lt 10 or $name eq 'Ada')ok#end", "ok"),
        ("#if(!$missing)ok#end", "ok"),
        ("#if($age == '36')eq#end", "eq"),
        ("#if($missing == $nothing)eq#end", "eq"),
        ("#if($price >= 2.5)ok#end", "ok"),
        ("#if($missing > 1)yes#else no#end", " no"),
        ("#{if}($name)yes#{else}no#{end}", "yes"),
    ]);
}

#[test]
fn render_set() {
    assert_renders(&[
        ("#set($name = 'Eve')$name", "Eve"),
        ("#set($user.name = 'Eve')$user.name $user.tags[0]", "Eve a"),
        ("#set($x = 'a')#set($x = $missing)$x", "a"),
        ("#set( $x = true )#if($x)on#end", "on"),
    ]);
}

#[test]
fn set_never_modifies_the_context() {
    let context = sample_context();
    render_template("#set($name = 'Eve')#set($user.name = 'Eve')", &context).unwrap();
    assert_eq!(context.get("name").unwrap(), "Ada");
    assert_eq!(context.get("user").unwrap()["name"], "Bob");
}

#[test]
fn render_methods() {
    assert_renders(&[
        ("$name.toUpperCase()", "ADA"),
        ("$name.length()", "3"),
        ("$user.tags.size()", "2"),
        ("$user.tags.get(0)", "a"),
        ("$user.name.toLowerCase().length()", "3"),
        ("$scores.get('b')", "2"),
        ("$scores.keySet()", "[a, b]"),
        ("$name.substring(1)", "da"),
        ("$name.nope()", "$name.nope()"),
        ("$!name.nope()", ""),
    ]);
}

#[test]
fn render_comments_and_unparsed() {
    assert_renders(&[
        ("a## c\nb", "ab"),
        ("a#* $name *#b", "ab"),
        ("#[[$name #if]]#", "$name #if"),
    ]);
}

#[test]
fn render_stop() {
    assert_renders(&[("a#stop b", "a"), ("#if(true)a#stop#end b", "a")]);
}

#[test]
fn render_serialized_struct() {
    let mut context = Context::new();
    context.insert("product", &Product::new());
    let result = render_template("$product.name: $product.price ($product.tags.get(1))", &context);
    assert_eq!(result.unwrap(), "Lamp: 19.5 (light)");
}
