use pretty_assertions::assert_eq;

use crate::config::EngineConfig;
use crate::context::Context;

use super::{render_template, render_with_config, sample_context};

#[test]
fn render_foreach_over_list() {
    let result = render_template("#foreach($t in $user.tags)$t,#end", &sample_context());
    assert_eq!(result.unwrap(), "a,b,");
}

#[test]
fn render_foreach_over_map_values() {
    let result = render_template("#foreach($v in $scores)$v#end", &sample_context());
    assert_eq!(result.unwrap(), "12");
}

#[test]
fn render_foreach_helper() {
    let result = render_template(
        "#foreach($t in $user.tags)$foreach.count:$t#if($foreach.hasNext), #end#end",
        &sample_context(),
    );
    assert_eq!(result.unwrap(), "1:a, 2:b");
}

#[test]
fn render_foreach_first_last_index() {
    let result = render_template(
        "#foreach($i in [1..3])#if($foreach.first)[#end$foreach.index#if($foreach.last)]#end#end",
        &Context::new(),
    );
    assert_eq!(result.unwrap(), "[012]");
}

#[test]
fn render_foreach_descending_range() {
    let result = render_template("#foreach($i in [3..1])$i#end", &Context::new());
    assert_eq!(result.unwrap(), "321");
}

#[test]
fn render_foreach_else_when_undefined_or_empty() {
    let context = sample_context();
    assert_eq!(
        render_template("#foreach($x in $missing)x#else none#end", &context).unwrap(),
        " none"
    );
    assert_eq!(render_template("#foreach($x in $none)x#else none#end", &context).unwrap(), " none");
    assert_eq!(render_template("#foreach($x in $none)x#end", &context).unwrap(), "");
}

#[test]
fn render_foreach_break() {
    let result =
        render_template("#foreach($i in [1..5])$i#if($i == 3)#break#end#end", &Context::new());
    assert_eq!(result.unwrap(), "123");
}

#[test]
fn break_only_leaves_the_innermost_loop() {
    let result = render_template(
        "#foreach($i in [1..2])#foreach($j in [1..3])$j#break#end$i#end",
        &Context::new(),
    );
    assert_eq!(result.unwrap(), "1121");
}

#[test]
fn loop_variable_does_not_outlive_the_loop() {
    let mut context = Context::new();
    context.insert("item", "outer");
    let result = render_template("#foreach($item in [1])$item#end $item", &context);
    assert_eq!(result.unwrap(), "1 outer");
}

#[test]
fn foreach_iterations_can_be_capped() {
    let config = EngineConfig::default().max_foreach_iterations(2);
    let result = render_with_config("#foreach($i in [1..5])$i#end!", &Context::new(), config);
    assert_eq!(result.unwrap(), "12!");
}

#[test]
fn set_inside_loop_is_visible_after_it() {
    let result = render_template(
        "#set($total = 0)#foreach($i in [1..4])#set($total = $total + $i)#end$total",
        &Context::new(),
    );
    assert_eq!(result.unwrap(), "10");
}

#[test]
fn nested_loops_see_outer_variables() {
    let result = render_template(
        "#foreach($a in ['x', 'y'])#foreach($b in [1..2])$a$b #end#end",
        &Context::new(),
    );
    assert_eq!(result.unwrap(), "x1 x2 y1 y2 ");
}
