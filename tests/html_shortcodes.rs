//! HTML shortcodes: rendering with a marker class and reversal through paths

#![cfg(feature = "html")]

use rstest::rstest;
use serde_json::json;
use shortcoder::html::MARKER_PREFIX;
use shortcoder::{
    Binding, Context, HtmlShortcode, Input, KeywordPolicy, Rejoin, Shortcode, ShortcodeError,
    Shortcoder, Signature, Template,
};

const YOUTUBE: &str = r#"<iframe width="560" height="315" data-id="{id}" src="https://www.youtube.com/embed/{id}" title="YouTube video player" frameborder="0" allowfullscreen></iframe>"#;

fn link() -> HtmlShortcode {
    HtmlShortcode::positional(
        "link",
        vec![
            Input::new("url").with_path("@href"),
            Input::new("text").with_path("text()"),
        ],
        r#"<a href="{url}">{text}</a>"#,
    )
    .unwrap()
}

fn youtube() -> HtmlShortcode {
    HtmlShortcode::positional("yt", vec![Input::new("id").with_path("@data-id")], YOUTUBE)
        .unwrap()
}

fn image(rejoin: Rejoin) -> HtmlShortcode {
    HtmlShortcode::new(
        Signature::new(
            "img",
            vec![
                Input::new("src").with_path("@src").required(),
                Input::new("alt").with_path("@alt"),
                Input::new("width").with_path("@width").with_default("100%"),
            ],
            Binding::Keyword(KeywordPolicy {
                reject_unknown: true,
                rejoin,
            }),
        )
        .unwrap(),
        r#"<img src="{src}" alt="{alt}" width="{width}">"#,
    )
    .unwrap()
}

fn registry() -> Shortcoder {
    Shortcoder::with_shortcodes([
        Box::new(link()) as Box<dyn Shortcode>,
        Box::new(youtube()),
        Box::new(image(Rejoin::OmitDefaults)),
    ])
    .unwrap()
}

#[test]
fn link_round_trip() {
    let shortcoder = registry();
    let html = shortcoder
        .parse("[%link http://example.com/ text %]")
        .unwrap();
    assert_eq!(
        html,
        r#"<a href="http://example.com/" class="shortcode-link">text</a>"#
    );
    assert_eq!(
        shortcoder.reverse(&html).unwrap(),
        "[%link http://example.com/ text %]"
    );
}

#[test]
fn youtube_embed() {
    let shortcoder = registry();
    let html = shortcoder
        .parse("Check out my youtube video\n[%yt 2fmCcfAb4k4 %]")
        .unwrap();
    insta::assert_snapshot!(html, @r#"
    Check out my youtube video
    <iframe width="560" height="315" data-id="2fmCcfAb4k4" src="https://www.youtube.com/embed/2fmCcfAb4k4" title="YouTube video player" frameborder="0" allowfullscreen="" class="shortcode-yt"></iframe>
    "#);
    assert_eq!(
        shortcoder.reverse(&html).unwrap(),
        "Check out my youtube video\n[%yt 2fmCcfAb4k4 %]"
    );
}

#[test]
fn escaped_values_round_trip() {
    let shortcoder = registry();
    let source = r#"[%link "http://x/?a=1&b=2" "Tom's <page>" %]"#;
    let html = shortcoder.parse(source).unwrap();
    insta::assert_snapshot!(html, @r#"<a href="http://x/?a=1&amp;b=2" class="shortcode-link">Tom's &lt;page&gt;</a>"#);
    assert_eq!(shortcoder.reverse(&html).unwrap(), source);
}

#[rstest]
#[case(Rejoin::OmitDefaults, "[%img src=a.png %]")]
#[case(Rejoin::OmitEmpty, "[%img src=a.png width=100% %]")]
fn keyword_rejoin_policy(#[case] rejoin: Rejoin, #[case] expected: &str) {
    let shortcode = image(rejoin);
    let shortcoder =
        Shortcoder::with_shortcodes([Box::new(shortcode) as Box<dyn Shortcode>]).unwrap();
    let html = shortcoder.parse("[%img src=a.png %]").unwrap();
    assert_eq!(
        html,
        r#"<img src="a.png" alt="" width="100%" class="shortcode-img">"#
    );
    assert_eq!(shortcoder.reverse(&html).unwrap(), expected);
}

#[test]
fn keyword_round_trip_restores_values() {
    let shortcoder = registry();
    let source = "[%img width=50 alt='a \"quoted\" cat' src=cat.png %]";
    let html = shortcoder.parse(source).unwrap();
    let tag = shortcoder.reverse(&html).unwrap();
    // canonical order and quoting, same values
    assert_eq!(tag, r#"[%img src=cat.png alt='a "quoted" cat' width=50 %]"#);
    assert_eq!(shortcoder.parse(&tag).unwrap(), html);
}

#[rstest]
#[case(r#"<a href="http://example.com/">text</a>"#)]
#[case(r#"<a href="http://example.com/" class="link">text</a>"#)]
#[case(r#"<a href="x" data-note="shortcode-link">text</a>"#)]
#[case(r#"<iframe data-id="abc" class="shortcode-ytx"></iframe>"#)]
#[case("<?xml version=\"1.0\"?><p>hello</p>")]
#[case("<td>orphan cell</td>")]
fn unmarked_markup_is_left_alone(#[case] text: &str) {
    assert_eq!(registry().reverse(text).unwrap(), text);
}

#[test]
fn reverse_finds_nested_fragments() {
    let shortcoder = registry();
    let text = concat!(
        "<div>\n",
        "  <p>See <A HREF=\"x\" CLASS=\"blue shortcode-link\">here</A>.</p>\n",
        "  <a href=\"y\">plain</a>\n",
        "</div>",
    );
    assert_eq!(
        shortcoder.reverse(text).unwrap(),
        "<div>\n  <p>See [%link x here %].</p>\n  <a href=\"y\">plain</a>\n</div>"
    );
}

#[test]
fn document_round_trip() {
    let shortcoder = registry();
    let source = "# Links\n\n\
        Follow [%link https://mastodon.technology/@Wraptile mastodon! %] or watch:\n\
        [%yt dQw4w9WgXcQ %]\n\
        ![cover]([%img src=cover.png alt=\"The cover\" %])\n";
    let html = shortcoder.parse(source).unwrap();
    assert!(!html.contains("[%"));
    assert_eq!(shortcoder.reverse(&html).unwrap(), source);
}

#[test]
fn closing_marker_in_values_round_trips() {
    let shortcoder = registry();
    let html = shortcoder.parse(r"[%link x 50%\] %]").unwrap();
    assert_eq!(html, r#"<a href="x" class="shortcode-link">50%]</a>"#);
    let tag = shortcoder.reverse(&html).unwrap();
    assert_eq!(tag, r#"[%link x "50%"\] %]"#);
    assert_eq!(shortcoder.parse(&tag).unwrap(), html);
}

#[test]
fn missing_required_html_input_is_a_rendering_error() {
    match registry().parse("[%img alt=x %]") {
        Err(ShortcodeError::Rendering { name, message, .. }) => {
            assert_eq!(name, "img");
            assert!(message.contains("src"), "{message}");
        }
        other => panic!("expected Rendering, got {other:?}"),
    }
}

#[test]
fn marked_but_unclosed_is_fatal() {
    let err = registry()
        .reverse(r#"<p><a href="x" class="shortcode-link">unclosed</p>"#)
        .unwrap_err();
    match err {
        ShortcodeError::MalformedMarkup { name, fragment } => {
            assert_eq!(name, "link");
            assert!(fragment.starts_with("<a href=\"x\""));
        }
        other => panic!("expected MalformedMarkup, got {other:?}"),
    }
}

#[test]
fn rendering_errors_name_the_shortcode() {
    let broken = HtmlShortcode::positional("broken", vec![Input::new("x")], "<b>{y}</b>").unwrap();
    let shortcoder = Shortcoder::with_shortcodes([Box::new(broken) as Box<dyn Shortcode>]).unwrap();
    match shortcoder.parse("[%broken 1 %]") {
        Err(ShortcodeError::Rendering { name, message, .. }) => {
            assert_eq!(name, "broken");
            assert!(message.contains("{y}"), "{message}");
        }
        other => panic!("expected Rendering, got {other:?}"),
    }

    let loose = HtmlShortcode::positional("loose", vec![], "no markup here").unwrap();
    let shortcoder = Shortcoder::with_shortcodes([Box::new(loose) as Box<dyn Shortcode>]).unwrap();
    assert!(matches!(
        shortcoder.parse("[%loose %]"),
        Err(ShortcodeError::Rendering { .. })
    ));
}

#[test]
fn context_and_function_templates() {
    let site = HtmlShortcode::positional(
        "home",
        vec![Input::new("label").with_path("text()")],
        r#"<a href="https://{site}/">{label}</a>"#,
    )
    .unwrap();
    let badge = HtmlShortcode::positional(
        "badge",
        vec![Input::new("level").with_path("@data-level")],
        Template::function(|args, _| {
            let level = args.get("level").unwrap_or("info");
            Ok(format!(r#"<span data-level="{level}">{}</span>"#, level.to_uppercase()))
        }),
    )
    .unwrap();

    let mut context = Context::new();
    context.insert("site".to_string(), json!("example.com"));
    let shortcoder = Shortcoder::with_shortcodes([
        Box::new(site) as Box<dyn Shortcode>,
        Box::new(badge),
    ])
    .unwrap()
    .with_context(context);

    let html = shortcoder.parse("[%home Home %] [%badge warn %]").unwrap();
    insta::assert_snapshot!(html, @r#"<a href="https://example.com/" class="shortcode-home">Home</a> <span data-level="warn" class="shortcode-badge">WARN</span>"#);
    assert_eq!(
        shortcoder.reverse(&html).unwrap(),
        "[%home Home %] [%badge warn %]"
    );
}

#[test]
fn custom_marker() {
    let shortcode = link().with_marker("ext").unwrap();
    assert_eq!(shortcode.marker(), "ext");
    assert_eq!(link().marker(), format!("{MARKER_PREFIX}link"));

    let shortcoder = Shortcoder::with_shortcodes([Box::new(shortcode) as Box<dyn Shortcode>]).unwrap();
    let html = shortcoder.parse("[%link a b %]").unwrap();
    assert_eq!(html, r#"<a href="a" class="ext">b</a>"#);
    // default marker no longer claims anything
    assert_eq!(registry().reverse(&html).unwrap(), html);
    assert_eq!(shortcoder.reverse(&html).unwrap(), "[%link a b %]");
}

#[test]
fn existing_classes_are_kept() {
    let shortcode = HtmlShortcode::positional(
        "button",
        vec![Input::new("label").with_path(".")],
        r#"<button class="btn primary"><b>{label}</b></button>"#,
    )
    .unwrap();
    let shortcoder = Shortcoder::with_shortcodes([Box::new(shortcode) as Box<dyn Shortcode>]).unwrap();
    let html = shortcoder.parse("[%button 'Click me' %]").unwrap();
    assert_eq!(
        html,
        r#"<button class="btn primary shortcode-button"><b>Click me</b></button>"#
    );
    assert_eq!(shortcoder.reverse(&html).unwrap(), r#"[%button "Click me" %]"#);
}

#[test]
fn pathless_positional_input_blocks_reverse() {
    let shortcode = HtmlShortcode::positional(
        "note",
        vec![Input::new("text")],
        "<aside>{text}</aside>",
    )
    .unwrap();
    assert!(!shortcode.supports_reverse());
    let shortcoder = Shortcoder::with_shortcodes([Box::new(shortcode) as Box<dyn Shortcode>]).unwrap();
    assert_eq!(
        shortcoder.parse("[%note hi %]").unwrap(),
        r#"<aside class="shortcode-note">hi</aside>"#
    );
    assert!(matches!(
        shortcoder.reverse("<aside class=\"shortcode-note\">hi</aside>"),
        Err(ShortcodeError::NotReversible(name)) if name == "note"
    ));
}
