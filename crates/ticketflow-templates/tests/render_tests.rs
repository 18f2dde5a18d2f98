//! End-to-end rendering through `TemplateEngine`, with inline sources and
//! throwaway template roots.

use pretty_assertions::assert_eq;
use serde_json::json;
use std::fs;
use tempfile::TempDir;
use ticketflow_templates::{TemplateEngine, TemplateError};

fn engine_with(files: &[(&str, &str)]) -> (TempDir, TemplateEngine) {
    let dir = TempDir::new().unwrap();
    for (name, content) in files {
        let path = dir.path().join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }
    let engine = TemplateEngine::new(dir.path());
    (dir, engine)
}

fn render_source(source: &str, data: serde_json::Value) -> String {
    let (_dir, engine) = engine_with(&[]);
    engine.render_source(source, data)
}

// ============================================================================
// Interpolation and escaping
// ============================================================================

#[test]
fn escapes_by_default() {
    assert_eq!(render_source("{{ name }}", json!({"name": "A&B"})), "A&amp;B");
    assert_eq!(
        render_source("{{ q }}", json!({"q": "<a href=\"x\">it's</a>"})),
        "&lt;a href=&quot;x&quot;&gt;it&#39;s&lt;/a&gt;"
    );
}

#[test]
fn raw_skips_escaping() {
    assert_eq!(render_source("{{ name|raw }}", json!({"name": "A&B"})), "A&B");
    assert_eq!(render_source("{{ name | raw }}", json!({"name": "<b>"})), "<b>");
}

#[test]
fn raw_wins_over_other_filters() {
    assert_eq!(
        render_source("{{ name|upper|raw }}", json!({"name": "<b>x</b>"})),
        "<b>x</b>"
    );
}

#[test]
fn scalars_render_their_string_form() {
    let data = json!({"count": 3, "ratio": 1.5, "on": true, "off": false});
    assert_eq!(
        render_source("{{ count }}/{{ ratio }}/{{ on }}/{{ off }}", data),
        "3/1.5/1/"
    );
}

#[test]
fn booleans_compare_by_string_form() {
    let tmpl = "{% if on == '1' %}Y{% else %}N{% endif %}{% if off == '' %}Y{% else %}N{% endif %}";
    assert_eq!(render_source(tmpl, json!({"on": true, "off": false})), "YY");
    assert_eq!(
        render_source("[{{ on }}|{{ off }}]", json!({"on": true, "off": false})),
        "[1|]"
    );
}

#[test]
fn text_without_directives_is_unchanged() {
    let source = "<style>body { margin: 0; }</style>\n<p>Plain { text } here.</p>\n";
    let once = render_source(source, json!({}));
    assert_eq!(once, source);
    assert_eq!(render_source(&once, json!({})), once);
}

#[test]
fn dotted_paths() {
    let data = json!({"stats": {"total": 4}, "user": {"name": "Al", "prefs": {}}});
    assert_eq!(render_source("{{ stats.total }}", data.clone()), "4");
    assert_eq!(render_source("{{ user.missing }}", data.clone()), "{{ user.missing }}");
    assert_eq!(render_source("{{ user.prefs }}", data), "{{ user.prefs }}");
}

#[test]
fn container_names_are_left_unchanged() {
    let data = json!({"tickets": [{"title": "T1"}]});
    assert_eq!(render_source("{{ tickets }}", data), "{{ tickets }}");
}

#[test]
fn json_encode() {
    let data = json!({"stats": {"total": 2, "open": 1}, "tags": ["a", "b"]});
    assert_eq!(
        render_source("{{ stats | json_encode | raw }}", data.clone()),
        r#"{"total":2,"open":1}"#
    );
    assert_eq!(render_source("{{ tags|json_encode|raw }}", data), r#"["a","b"]"#);
    assert_eq!(render_source("{{ nothing|json_encode|raw }}", json!({})), "[]");
}

#[test]
fn interpolated_values_are_not_evaluated() {
    let data = json!({"title": "{% if x %}boom{% endif %}", "x": true});
    assert_eq!(
        render_source("{{ title|raw }}", data),
        "{% if x %}boom{% endif %}"
    );
}

// ============================================================================
// Filters
// ============================================================================

#[test]
fn case_filters() {
    assert_eq!(render_source("{{ name|upper }}", json!({"name": "abc"})), "ABC");
    assert_eq!(render_source("{{ name|lower }}", json!({"name": "AbC"})), "abc");
}

#[test]
fn slice_filter() {
    let data = json!({"name": "abcdef"});
    assert_eq!(render_source("{{ name|slice(1,2) }}", data.clone()), "bc");
    assert_eq!(render_source("{{ name|slice(3) }}", data.clone()), "def");
    assert_eq!(render_source("{{ name|slice(-2) }}", data), "ef");
    assert_eq!(
        render_source("{{ name|slice(0, 3) }}", json!({"name": "çàé€x"})),
        "çàé"
    );
}

#[test]
fn slice_with_huge_arguments_does_not_panic() {
    let data = json!({"name": "abcdef"});
    assert_eq!(
        render_source("{{ name|slice(1, 9223372036854775807) }}", data.clone()),
        "bcdef"
    );
    assert_eq!(
        render_source("{{ name|slice(-9223372036854775808, 2) }}", data),
        "ab"
    );
}

#[test]
fn length_filter() {
    assert_eq!(render_source("{{ items|length }}", json!({"items": [1, 2, 3]})), "3");
    assert_eq!(render_source("{{ name|length }}", json!({"name": "héllo"})), "5");
    assert_eq!(render_source("{{ items|length }}", json!({"items": []})), "0");
}

#[test]
fn filters_apply_in_fixed_order() {
    // upper runs before slice regardless of how they are written.
    assert_eq!(
        render_source("{{ name|slice(0,2)|upper }}", json!({"name": "abcdef"})),
        "AB"
    );
}

#[test]
fn unknown_filters_are_ignored() {
    assert_eq!(render_source("{{ name|shout }}", json!({"name": "a&b"})), "a&amp;b");
}

// ============================================================================
// Loops
// ============================================================================

#[test]
fn for_loop() {
    let tmpl = "{% for ticket in tickets %}{{ ticket.title }}{% endfor %}";
    assert_eq!(
        render_source(tmpl, json!({"tickets": [{"title": "T1"}, {"title": "T2"}]})),
        "T1T2"
    );
    assert_eq!(render_source(tmpl, json!({"tickets": []})), "");
    assert_eq!(render_source(tmpl, json!({})), "");
}

#[test]
fn for_loop_over_dotted_collection() {
    let data = json!({"board": {"columns": [{"name": "Todo"}, {"name": "Done"}]}});
    assert_eq!(
        render_source(
            "{% for col in board.columns %}<th>{{ col.name }}</th>{% endfor %}",
            data
        ),
        "<th>Todo</th><th>Done</th>"
    );
}

#[test]
fn loop_fields_escape_and_default_to_empty() {
    let data = json!({"tickets": [
        {"title": "Fix <b>", "meta": {"x": 1}},
        {"title": "Second"}
    ]});
    assert_eq!(
        render_source(
            "{% for t in tickets %}[{{ t.title }}|{{ t.title|raw }}|{{ t.owner }}|{{ t.meta }}]{% endfor %}",
            data
        ),
        "[Fix &lt;b&gt;|Fix <b>||][Second|Second||]"
    );
}

#[test]
fn bare_loop_variable_reads_top_level() {
    let tmpl = "{% for t in tickets %}<{{ t }}>{% endfor %}";
    assert_eq!(render_source(tmpl, json!({"tickets": [{"title": "A"}]})), "<>");
    assert_eq!(
        render_source(tmpl, json!({"tickets": [{"title": "A"}], "t": "top"})),
        "<top>"
    );
}

#[test]
fn loop_variable_does_not_leak() {
    let data = json!({"t": "outer", "items": [{"n": 1}]});
    assert_eq!(
        render_source("{% for t in items %}{{ t.n }}{% endfor %}{{ t }}", data),
        "1outer"
    );
}

// ============================================================================
// Conditionals
// ============================================================================

#[test]
fn if_elseif_else() {
    let tmpl = "{% if status == 'open' %}A{% elseif status == 'closed' %}B{% else %}C{% endif %}";
    assert_eq!(render_source(tmpl, json!({"status": "open"})), "A");
    assert_eq!(render_source(tmpl, json!({"status": "closed"})), "B");
    assert_eq!(render_source(tmpl, json!({"status": "other"})), "C");
    assert_eq!(render_source(tmpl, json!({})), "C");
}

#[test]
fn condition_against_nested_path() {
    let tmpl = "{% if user.role == \"admin\" %}admin{% else %}member{% endif %}";
    assert_eq!(render_source(tmpl, json!({"user": {"role": "admin"}})), "admin");
    assert_eq!(render_source(tmpl, json!({"user": {}})), "member");
}

#[test]
fn nested_conditionals() {
    let tmpl = "{% if a %}{% if b %}ab{% else %}a{% endif %}{% else %}none{% endif %}";
    assert_eq!(render_source(tmpl, json!({"a": true, "b": true})), "ab");
    assert_eq!(render_source(tmpl, json!({"a": true})), "a");
    assert_eq!(render_source(tmpl, json!({"b": true})), "none");
}

#[test]
fn falsy_values() {
    let tmpl = "{% if v %}T{% else %}F{% endif %}";
    for falsy in [json!(""), json!("0"), json!("FALSE"), json!(false), json!([]), json!(null)] {
        assert_eq!(render_source(tmpl, json!({ "v": falsy })), "F");
    }
    for truthy in [json!("no"), json!(true), json!(1), json!(["x"]), json!({"k": 1})] {
        assert_eq!(render_source(tmpl, json!({ "v": truthy })), "T");
    }
}

// ============================================================================
// Fail-open handling
// ============================================================================

#[test]
fn unsupported_directives_are_removed() {
    assert_eq!(
        render_source("<form>{% csrf_token %}</form>{% include 'x' %}", json!({})),
        "<form></form>"
    );
}

#[test]
fn stray_closers_are_removed() {
    assert_eq!(render_source("a{% endfor %}b{% endif %}c", json!({})), "abc");
}

#[test]
fn unclosed_blocks_keep_their_content() {
    assert_eq!(
        render_source("{% for t in tickets %}<li>{{ count }}</li>", json!({"count": 2})),
        "<li>2</li>"
    );
    assert_eq!(render_source("{% if flag %}shown", json!({})), "shown");
}

#[test]
fn unterminated_tags_stay_text() {
    assert_eq!(render_source("a {{ name", json!({"name": "x"})), "a {{ name");
}

// ============================================================================
// Inheritance
// ============================================================================

const LAYOUT: &str = "<title>{% block title %}Default{% endblock %}</title>\
<main>{% block content %}{% endblock %}</main>\
<footer>{% block footer %}&copy; {{ app_name }}{% endblock %}</footer>";

#[test]
fn extends_substitutes_blocks() {
    let (_dir, mut engine) = engine_with(&[
        ("layouts/base.twig", LAYOUT),
        (
            "pages/about.twig",
            "{% extends \"layouts/base\" %}\
{% block title %}About{% endblock %}\
{% block content %}<p>{{ message }}</p>{% endblock %}",
        ),
    ]);
    engine.add_global("app_name", "TicketFlow");

    let html = engine
        .render("pages/about", json!({"message": "Hi & welcome"}))
        .unwrap();
    assert_eq!(
        html,
        "<title>About</title><main><p>Hi &amp; welcome</p></main><footer>&copy; TicketFlow</footer>"
    );
}

#[test]
fn child_content_outside_blocks_and_unknown_blocks_are_dropped() {
    let (_dir, engine) = engine_with(&[
        ("layouts/base.twig", LAYOUT),
        (
            "pages/x.twig",
            "{% extends 'layouts/base' %}ignored text{% block sidebar %}S{% endblock %}",
        ),
    ]);
    assert_eq!(
        engine.render("pages/x", json!({})).unwrap(),
        "<title>Default</title><main></main><footer>&copy; </footer>"
    );
}

#[test]
fn missing_parent_renders_child() {
    let (_dir, engine) = engine_with(&[(
        "pages/orphan.twig",
        "{% extends \"layouts/gone\" %}<h1>{% block title %}Orphan{% endblock %}</h1>",
    )]);
    assert_eq!(engine.render("pages/orphan", json!({})).unwrap(), "<h1>Orphan</h1>");
}

#[test]
fn render_source_can_extend_from_root() {
    let (_dir, engine) = engine_with(&[("layouts/base.twig", LAYOUT)]);
    let html = engine.render_source(
        "{% extends \"layouts/base.twig\" %}{% block content %}inline{% endblock %}",
        json!({}),
    );
    assert_eq!(
        html,
        "<title>Default</title><main>inline</main><footer>&copy; </footer>"
    );
}

// ============================================================================
// Globals and errors
// ============================================================================

#[test]
fn globals_are_shadowed_by_call_data() {
    let (_dir, mut engine) = engine_with(&[("page.twig", "{{ app_name }}")]);
    engine.add_global("app_name", "TicketFlow");
    assert_eq!(engine.render("page", json!({})).unwrap(), "TicketFlow");
    assert_eq!(
        engine.render("page", json!({"app_name": "Other"})).unwrap(),
        "Other"
    );
}

#[test]
fn missing_template_is_an_error() {
    let (_dir, engine) = engine_with(&[]);
    let err = engine.render("pages/missing", json!({})).unwrap_err();
    assert!(matches!(err, TemplateError::TemplateNotFound { ref name, .. } if name == "pages/missing"));
    assert!(err.to_string().contains("pages/missing"));
}

#[test]
fn template_with_invalid_utf8_still_renders() {
    let (dir, engine) = engine_with(&[]);
    fs::write(dir.path().join("legacy.twig"), b"caf\xe9 {{ name }}").unwrap();
    assert_eq!(
        engine.render("legacy", json!({"name": "Al"})).unwrap(),
        "caf\u{fffd} Al"
    );
}

#[test]
fn traversal_is_treated_as_missing() {
    let (dir, engine) = engine_with(&[("secret.twig", "s")]);
    let nested = TemplateEngine::new(dir.path().join("templates"));
    assert!(nested.render("../secret", json!({})).is_err());
    assert_eq!(engine.render("secret", json!({})).unwrap(), "s");
}
