//! Built-in type library behavior.

mod common;

use common::{eval_err, eval_ok, render};

#[test]
fn instance_attributes_shadow_class_attributes() {
    assert_eq!(eval_ok("C = Class(); C.x = \"class\"; o = C(); o.x"), "class");
    assert_eq!(
        eval_ok("C = Class(); C.x = \"class\"; o = C(); o.x = \"instance\"; o.x"),
        "instance"
    );
    // A second instance still sees the class attribute.
    assert_eq!(
        eval_ok("C = Class(); C.x = \"class\"; o = C(); o.x = \"instance\"; p = C(); p.x"),
        "class"
    );
}

#[test]
fn missing_attribute_raises() {
    assert_eq!(eval_err("C = Class(); o = C(); o.nope").class_name, "AttributeError");
}

#[test]
fn scripted_methods_bind_their_receiver() {
    assert_eq!(
        eval_ok(
            "C = Class(); \
             C.greet = function(self, who) => \"hi \" + who; \
             o = C(); o.greet(\"there\")"
        ),
        "hi there"
    );
}

#[test]
fn native_method_arity_errors_name_both_counts() {
    let error = eval_err("\"foo\".length(1)");
    assert_eq!(error.class_name, "TypeError");
    assert!(error.message.contains("expected 0 arguments"), "{}", error.message);
    assert!(error.message.contains("got 1"), "{}", error.message);

    let error = eval_err("[1].take()");
    assert!(error.message.contains("expected 1 arguments"), "{}", error.message);
    assert!(error.message.contains("got 0"), "{}", error.message);
}

#[test]
fn iterable_first_last_single() {
    assert_eq!(eval_ok("[1, 2, 3].first()"), "1");
    assert_eq!(eval_ok("[1, 2, 3].last()"), "3");
    assert_eq!(eval_ok("[].first(99)"), "99");
    assert_eq!(eval_err("[].first()").class_name, "StateError");
    assert_eq!(eval_err("[].first()").message, "Iteration is empty");
    assert_eq!(eval_ok("[7].single()"), "7");
    assert_eq!(eval_err("[1, 2].single()").class_name, "StateError");
}

#[test]
fn iterable_folds() {
    assert_eq!(eval_ok("[3, 9, 6].max()"), "9");
    assert_eq!(eval_ok("[6, 3, 9].min()"), "3");
    assert_eq!(eval_ok("[3, 6, 9].sum()"), "18");
    assert_eq!(eval_ok("[3, 6, 9].sum(function(a, b) => a * b)"), "162");
    assert_eq!(eval_ok("[1, 4, 9, 2].avg()"), "4");
    assert_eq!(eval_err("[].max()").class_name, "StateError");
}

#[test]
fn iterable_quantifiers() {
    assert_eq!(eval_ok("[\"ant\", \"bear\", \"cat\"].all(function(w) => w.length() >= 3)"), "true");
    assert_eq!(eval_ok("[\"ant\", \"bear\", \"cat\"].all(function(w) => w.length() >= 4)"), "false");
    assert_eq!(eval_ok("[\"ant\", \"bear\", \"cat\"].any(function(w) => w.length() >= 4)"), "true");
    // Vacuous truth on empty iterations.
    assert_eq!(eval_ok("[].all(function(x) => false)"), "true");
    assert_eq!(eval_ok("[].any(function(x) => true)"), "false");
}

#[test]
fn iterable_transformations() {
    assert_eq!(eval_ok("(1..4).filter(function(i) => i % 2 == 0)"), "2, 4");
    assert_eq!(eval_ok("[1, 2, 3].map(function(i) => i * i)"), "1, 4, 9");
    assert_eq!(eval_ok("(1..100).grep(38..41)"), "38, 39, 40, 41");
    assert_eq!(eval_ok("(1..6).split(function(i) => i % 2 == 0).first()"), "2, 4, 6");
    assert_eq!(eval_ok("(1..6).split(function(i) => i % 2 == 0).last()"), "1, 3, 5");
    assert_eq!(eval_ok("[3, 1, 2].sort()"), "1, 2, 3");
    assert_eq!(eval_ok("[1, 2, 3].sort(function(a, b) => b <=> a)"), "3, 2, 1");
    assert_eq!(eval_ok("[\"b\", \"a\", \"c\"].sort()"), "a, b, c");
}

#[test]
fn iterable_take_is_lazy_and_bounded() {
    assert_eq!(eval_ok("(1..100).take(3).join()"), "1, 2, 3");
    assert_eq!(eval_ok("(1..2).take(5).join()"), "1, 2");
    assert_eq!(eval_err("[1].take(0-1)").class_name, "ValueError");
}

#[test]
fn iterable_membership_and_chaining() {
    assert_eq!(eval_ok("[1, 2, 3, 4].has(3)"), "true");
    assert_eq!(eval_ok("[1, 2, 3, 4].has(5)"), "false");
    assert_eq!(eval_ok("total = 0; [1, 2].each(function(i) : total = total + i; end function).size()"), "2");
    assert_eq!(eval_ok("[\"a\", \"b\", \"c\"].join(\"-\")"), "a-b-c");
}

#[test]
fn iterators_are_one_shot() {
    assert_eq!(
        eval_ok("it = [1, 2].__iter__(); [it.next(), it.next(), it.next(0), it.next(0)]"),
        "1, 2, 0, 0"
    );
    assert_eq!(eval_err("it = [].__iter__(); it.next()").class_name, "StateError");
}

#[test]
fn string_methods() {
    assert_eq!(eval_ok("\"foo bar\".length()"), "7");
    assert_eq!(eval_ok("\"foo\".capitalize()"), "Foo");
    assert_eq!(eval_ok("\"foo\\r\\n\".chomp()"), "foo");
    assert_eq!(eval_ok("\"foo\".chop()"), "fo");
    assert_eq!(eval_ok("\"FOO\".lower()"), "foo");
    assert_eq!(eval_ok("\"foo\".upper()"), "FOO");
    assert_eq!(eval_ok("\"foobar\".reverse()"), "raboof");
    assert_eq!(eval_ok("\"fooBAR\".swapcase()"), "FOObar");
    assert_eq!(eval_ok("\"foo bar\".titleize()"), "Foo Bar");
    assert_eq!(eval_ok("\"  foo  \".trim()"), "foo");
    assert_eq!(eval_ok("\"foo\".runes()"), "102, 111, 111");
    assert_eq!(eval_ok("\"foo bar baz\".words()"), "foo, bar, baz");
    assert_eq!(eval_ok("\"a\\nb\\r\\nc\".lines()"), "a, b, c");
    assert_eq!(eval_ok("\"foobar\".index_of(\"bar\")"), "3");
    assert_eq!(eval_ok("\"foobar\".starts_with(\"foo\")"), "true");
}

#[test]
fn string_operators() {
    assert_eq!(eval_ok("\"foo\" + \"bar\""), "foobar");
    assert_eq!(eval_ok("\"ho! \" * 3"), "ho! ho! ho! ");
    assert_eq!(eval_err("\"x\" * (0-1)").class_name, "ValueError");
    assert_eq!(eval_ok("\"a\" < \"b\""), "true");
    assert_eq!(eval_ok("\"a\" == \"a\""), "true");
    assert_eq!(eval_ok("\"a\" != \"b\""), "true");
    assert_eq!(eval_err("\"a\" + 1").class_name, "ValueError");
    assert_eq!(eval_ok("String(1, 2, 3)"), "123");
    assert_eq!(eval_ok("\"abc\".__iter__().next()"), "a");
}

#[test]
fn map_behavior() {
    assert_eq!(eval_ok("m = {\"a\": 1}; m.size()"), "1");
    assert_eq!(eval_ok("m = {\"a\": 1}; m[\"a\"]"), "1");
    assert_eq!(eval_ok("m = {}; m.get(\"missing\", 42)"), "42");
    assert_eq!(eval_ok("m = {}; m.get(\"missing\")"), "");
    assert_eq!(eval_err("m = {}; m[\"missing\"]").class_name, "KeyError");
    assert_eq!(eval_ok("m = {\"a\": 1}; m.has(\"a\")"), "true");
    assert_eq!(eval_ok("m = {\"a\": 1, \"b\": 2}; m.keys().join()"), "a, b");
    assert_eq!(eval_ok("m = {\"a\": 1, \"b\": 2}; m.values().join()"), "1, 2");
    assert_eq!(eval_ok("m = {\"a\": 1}; n = {\"b\": 2}; (m + n).size()"), "2");
    assert_eq!(eval_ok("m = {\"a\": 1}; m.update({\"b\": 2}); m.size()"), "2");
    assert_eq!(eval_ok("{\"a\": 1, \"b\": 2}.join(\" => \")"), "a => 1, b => 2");
    assert_eq!(eval_ok("{}.size()"), "0");
    assert_eq!(eval_ok("m = {\"a\": 1}; m.clear(); m.size()"), "0");
}

#[test]
fn map_iteration_preserves_insertion_order() {
    assert_eq!(
        render("{% m = {}; m[\"a\"] = 1; m[\"b\"] = 2; m[\"a\"] = 3; for e : m : %}[{{ e[0] }}={{ e[1] }}]{% end for %}"),
        "[a=3][b=2]"
    );
}

#[test]
fn set_behavior() {
    assert_eq!(eval_ok("s = Set(1, 2, 2, 3); s.size()"), "3");
    assert_eq!(eval_ok("Set(1, 2).has(2)"), "true");
    assert_eq!(eval_ok("Set(1, 2).has(9)"), "false");
    assert_eq!(eval_ok("(Set(1, 2) + [2, 3]).size()"), "3");
    assert_eq!(eval_ok("s = Set(); s << 4 << 5; s.size()"), "2");
    assert_eq!(eval_ok("Set(1, 2).__hash__() == Set(2, 1).__hash__()"), "true");
    assert_eq!(eval_ok("s = Set(1); s.clear(); s.size()"), "0");
    assert_eq!(eval_ok("Set(3, 1, 2).join()"), "3, 1, 2");
}

#[test]
fn list_behavior() {
    assert_eq!(eval_ok("l = [1]; l.append(2, 3); l"), "1, 2, 3");
    assert_eq!(eval_ok("l = [3]; l.prepend(1, 2); l"), "1, 2, 3");
    assert_eq!(eval_ok("l = [1, 2]; l.concat([3, 4]); l.size()"), "4");
    assert_eq!(eval_ok("l = [1, 2]; l[1] = 9; l[1]"), "9");
    assert_eq!(eval_err("[1][5]").class_name, "IndexError");
    assert_eq!(eval_ok("[1, 2] == [1, 2]"), "true");
    assert_eq!(eval_ok("[1, 2] == [2, 1]"), "false");
    assert_eq!(eval_ok("([1] + [2, 3]).size()"), "3");
    assert_eq!(eval_ok("List(1, 2, 3).size()"), "3");
}

#[test]
fn range_behavior() {
    assert_eq!(eval_ok("(1..5).join()"), "1, 2, 3, 4, 5");
    assert_eq!(eval_ok("(1...5).join()"), "1, 2, 3, 4");
    assert_eq!(eval_ok("(1..3).begin()"), "1");
    assert_eq!(eval_ok("(1..3).end()"), "3");
    assert_eq!(eval_ok("(1...3).is_exclusive()"), "true");
    assert_eq!(eval_ok("(5..1).join()"), "");
    assert_eq!(eval_ok("(1..3).sum()"), "6");
}

#[test]
fn numeric_semantics() {
    assert_eq!(eval_ok("7 / 2"), "3");
    assert_eq!(eval_ok("7.0 / 2"), "3.5");
    assert_eq!(eval_ok("7 / 2.0"), "3.5");
    assert_eq!(eval_ok("7 % 3"), "1");
    assert_eq!(eval_ok("2 + 0.5"), "2.5");
    assert_eq!(eval_ok("6 & 3"), "2");
    assert_eq!(eval_ok("6 | 3"), "7");
    assert_eq!(eval_ok("6 ^ 3"), "5");
    assert_eq!(eval_ok("1 << 4"), "16");
    assert_eq!(eval_ok("16 >> 2"), "4");
    assert_eq!(eval_ok("-3"), "-3");
    assert_eq!(eval_ok("~0"), "-1");
    assert_eq!(eval_ok("2.5.floor()"), "2.0");
    assert_eq!(eval_err("9223372036854775807 + 1").class_name, "OverflowError");
    assert_eq!(eval_err("9223372036854775807 * 2").class_name, "OverflowError");
    assert_eq!(eval_err("5 % 0").class_name, "ZeroDivisionError");
}

#[test]
fn anonymous_classes_and_alloc() {
    assert_eq!(eval_ok("C = Class(); o = C(); o.__hash__() == o.__hash__()"), "true");
    // Abstract classes cannot be instantiated.
    let error = eval_err("Iterable()");
    assert_eq!(error.class_name, "TypeError");
    assert!(error.message.contains("Cannot allocate instance of"));
    // The String constructor is the concatenating static call.
    assert_eq!(eval_ok("String(\"a\", 1)"), "a1");
}

#[test]
fn exception_objects_carry_messages() {
    assert_eq!(eval_ok("e = ValueError(\"nope\"); e.message"), "nope");
    assert_eq!(eval_ok("String(ValueError(\"nope\"))"), "nope");
}

#[test]
fn filters_are_registered_as_globals() {
    assert_eq!(eval_ok("escape(\"<a>\")"), "&lt;a&gt;");
    assert_eq!(eval_ok("json([1, \"x\"])"), "[1,\"x\"]");
}

#[test]
fn print_writes_to_the_response() {
    assert_eq!(render("{% print(\"a\", 1); println(\"!\"); %}"), "a1!\n");
}

#[test]
fn request_and_response_globals_exist() {
    assert_eq!(eval_ok("request.method()"), "GET");
    assert_eq!(eval_ok("request.path()"), "/");
    assert_eq!(eval_ok("request.is_get()"), "true");
    assert_eq!(eval_ok("request.is_post()"), "false");
    assert_eq!(eval_ok("request.int(\"missing\", 7)"), "7");
    assert_eq!(eval_ok("request.list(\"missing\").size()"), "0");
    assert_eq!(render("{% response.write(\"direct\"); %}"), "direct");
}
