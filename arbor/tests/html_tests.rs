//! End-to-end building and rendering.

use arbor::{
    Args, BuildError, Context, Flow, HelperTable, Kind, Markup, RenderOptions, Value, render,
};
use facet_testhelpers::test;

/// Strip a shared leading indent from a raw string literal.
fn html(expected: &str) -> String {
    let lines: Vec<&str> = expected
        .lines()
        .skip_while(|line| line.trim().is_empty())
        .collect();
    let indent = lines
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start().len())
        .min()
        .unwrap_or(0);
    lines
        .iter()
        .map(|line| line.get(indent..).unwrap_or(""))
        .collect::<Vec<_>>()
        .join("\n")
        .trim_end()
        .to_string()
}

#[test]
fn test_single_element() {
    let out = render(|ctx| ctx.tag("span", "Hello World").map(drop)).unwrap();
    assert_eq!(out, "<span>Hello World</span>");
}

#[test]
fn test_attribute_kinds() {
    let out = render(|ctx| {
        ctx.tag(
            "div",
            Args::text("test")
                .attr("class", ["one", "two"])
                .attr("one", "two")
                .attr("style", Value::from_iter([("one", "two")])),
        )
        .map(drop)
    })
    .unwrap();
    assert_eq!(
        out,
        r#"<div class="one two" one="two" style="one: two;">test</div>"#
    );
}

#[test]
fn test_unordered_list() {
    let out = render(|ctx| {
        ctx.tag_with("ul", (), |ctx| {
            for item in ["First", "Second", "Third"] {
                ctx.tag("li", item)?;
            }
            Ok(())
        })
        .map(drop)
    })
    .unwrap();

    assert_eq!(
        out.as_str(),
        html(
            "
            <ul>
              <li>First</li>
              <li>Second</li>
              <li>Third</li>
            </ul>
            "
        )
    );
}

#[test]
fn test_list_inside_a_div() {
    let out = render(|ctx| {
        ctx.tag_with("div", (), |ctx| {
            ctx.tag_with("ul", (), |ctx| {
                for item in ["First", "Second", "Third"] {
                    ctx.tag("li", item)?;
                }
                Ok(())
            })
            .map(drop)
        })
        .map(drop)
    })
    .unwrap();

    assert_eq!(
        out.as_str(),
        html(
            "
            <div>
              <ul>
                <li>First</li>
                <li>Second</li>
                <li>Third</li>
              </ul>
            </div>
            "
        )
    );
}

#[test]
fn test_nested_children() {
    let out = render(|ctx| {
        ctx.tag_with("div", (), |ctx| {
            ctx.tag("ul", ())?;
            ctx.tag_with("li", (), |ctx| ctx.tag("li", ()).map(drop))?;
            Ok(())
        })
        .map(drop)
    })
    .unwrap();

    assert_eq!(
        out.as_str(),
        html(
            "
            <div>
              <ul></ul>
              <li>
                <li></li>
              </li>
            </div>
            "
        )
    );
}

#[test]
fn test_relative_queries() {
    let out = render(|ctx| {
        ctx.tag("div", Args::new().class("div1"))?;
        ctx.within(".div1", |ctx| {
            ctx.tag("span", ("Span 1.1", [("id", "my-span")]))
        })?;
        ctx.after(".div1 > #my-span", |ctx| ctx.tag("span", "Span 1.2"))?;
        ctx.after(".div1", |ctx| ctx.tag("span", "Span 1.3"))?;
        Ok(())
    })
    .unwrap();

    assert_eq!(
        out.as_str(),
        html(
            r#"
            <div class="div1">
              <span id="my-span">Span 1.1</span>
              <span>Span 1.2</span>
            </div>
            <span>Span 1.3</span>
            "#
        )
    );
}

#[test]
fn test_content_moves_between_parents() {
    let mut ctx = Context::new();
    let div = ctx
        .tag_with("div", (), |ctx| {
            let li = ctx.tag("li", ())?;
            let ul = ctx.tag("ul", li)?;
            ctx.tag("span", ul)?;
            Ok(())
        })
        .unwrap();

    assert_eq!(ctx.tree().children(div).len(), 1);
    assert_eq!(
        ctx.render().as_str(),
        html(
            "
            <div>
              <span>
                <ul>
                  <li></li>
                </ul>
              </span>
            </div>
            "
        )
    );
}

#[test]
fn test_parent_links() {
    let mut ctx = Context::new();
    let mut item = None;
    let list = ctx
        .tag_with("ul", (), |ctx| {
            ctx.tag("li", "Hello")?;
            item = Some(ctx.tag("li", "World")?);
            Ok(())
        })
        .unwrap();

    let item = item.unwrap();
    let tree = ctx.tree();
    assert_eq!(tree.parent(item), Some(list));
    assert!(tree.children(list).contains(item));
    assert_eq!(tree.parent(list), Some(tree.root()));
}

#[test]
fn test_text_is_escaped() {
    let out = render(|ctx| ctx.tag("span", "<br />").map(drop)).unwrap();
    assert_eq!(out, "<span>&lt;br /&gt;</span>");

    let out = render(|ctx| ctx.tag("span", Args::new().class("<br />")).map(drop)).unwrap();
    assert_eq!(out, r#"<span class="&lt;br /&gt;"></span>"#);

    let out = render(|ctx| ctx.tag("p", Markup::raw("<b>bold</b>")).map(drop)).unwrap();
    assert_eq!(out, "<p><b>bold</b></p>");
}

#[test]
fn test_attribute_names_are_escaped() {
    let out = render(|ctx| {
        ctx.tag(
            "div",
            Args::new().attr("x\"><script>alert(1)</script><b y", "v"),
        )
        .map(drop)
    })
    .unwrap();

    assert!(!out.as_str().contains("<script>"));
    assert_eq!(
        out,
        r#"<div x&quot;&gt;&lt;script&gt;alert(1)&lt;/script&gt;&lt;b y="v"></div>"#
    );
}

#[test]
fn test_nested_elements_are_not_escaped() {
    let mut ctx = Context::new();
    let inner = ctx.tag("span", "<br />").unwrap();
    ctx.tag("span", inner).unwrap();

    assert_eq!(
        ctx.render().as_str(),
        html(
            "
            <span>
              <span>&lt;br /&gt;</span>
            </span>
            "
        )
    );
}

#[test]
fn test_void_elements_self_close() {
    let out = render(|ctx| {
        ctx.tag_with("head", (), |ctx| {
            ctx.tag("meta", [("charset", "utf-8")])?;
            ctx.tag("script", [("src", "/app.js")])?;
            ctx.tag("link", [("rel", "stylesheet")])?;
            Ok(())
        })
        .map(drop)
    })
    .unwrap();

    assert_eq!(
        out.as_str(),
        html(
            r#"
            <head>
              <meta charset="utf-8"/>
              <script src="/app.js"></script>
              <link rel="stylesheet"/>
            </head>
            "#
        )
    );
}

#[test]
fn test_table_defaults() {
    let out = render(|ctx| ctx.tag("table", [("cellpadding", "4")]).map(drop)).unwrap();
    assert_eq!(
        out,
        r#"<table border="0" cellspacing="0" cellpadding="4"></table>"#
    );
}

#[test]
fn test_containers_are_not_indented() {
    let out = render(|ctx| {
        ctx.tag_with("div", (), |ctx| {
            ctx.append_node(Kind::Container, (), |ctx| {
                ctx.tag("span", "One")?;
                ctx.tag("span", "Two")?;
                Ok(())
            })
            .map(drop)
        })
        .map(drop)
    })
    .unwrap();

    assert_eq!(
        out.as_str(),
        html(
            "
            <div>
              <span>One</span>
              <span>Two</span>
            </div>
            "
        )
    );
}

#[test]
fn test_multiline_text_breaks_the_line() {
    let out = render(|ctx| ctx.tag("pre", "a\nb").map(drop)).unwrap();
    assert_eq!(out, "<pre>\na\nb\n</pre>");
}

#[test]
fn test_comments() {
    let out = render(|ctx| {
        ctx.tag_with("div", (), |ctx| {
            ctx.comment("")?;
            ctx.comment("short")?;
            ctx.comment("one\ntwo")?;
            Ok(())
        })
        .map(drop)
    })
    .unwrap();

    assert_eq!(
        out.as_str(),
        "<div>\n<!-- -->\n<!-- short -->\n  <!--\n    one\n    two\n  -->\n</div>"
    );
}

#[test]
fn test_moving_an_existing_node() {
    let mut ctx = Context::new();
    let root = ctx.root();
    let [a, b, c] = ["a", "b", "c"].map(|name| ctx.tag("p", name).unwrap());

    ctx.tree_mut().children_mut(root).insert_at(3, a).unwrap();
    let order: Vec<_> = ctx.tree().children(root).iter().collect();
    assert_eq!(order, [b, c, a]);

    ctx.tree_mut().children_mut(root).insert_before(c, a).unwrap();
    let order: Vec<_> = ctx.tree().children(root).iter().collect();
    assert_eq!(order, [b, a, c]);

    ctx.tree_mut().children_mut(root).add(b).unwrap();
    assert_eq!(ctx.tree().children(root).len(), 3);
}

#[test]
fn test_insert_before_targets_the_reference_index() {
    let mut ctx = Context::new();
    let root = ctx.root();
    let [first, second] = ["1", "2"].map(|text| ctx.tag("p", text).unwrap());
    let new = ctx.build("p", "new", |_| Ok(())).unwrap();

    ctx.tree_mut()
        .children_mut(root)
        .insert_before(second, new)
        .unwrap();
    let order: Vec<_> = ctx.tree().children(root).iter().collect();
    assert_eq!(order, [first, new, second]);
}

#[test]
fn test_invalid_moves() {
    let mut ctx = Context::new();
    let root = ctx.root();
    let outer = ctx
        .tag_with("div", (), |ctx| ctx.tag("span", ()).map(drop))
        .unwrap();
    let inner = ctx.tree().children(outer).first().unwrap();
    let text = ctx.text_node("plain").unwrap();

    let tree = ctx.tree_mut();
    assert!(matches!(
        tree.children_mut(inner).add(outer),
        Err(BuildError::InvalidOperation { .. })
    ));
    assert!(matches!(
        tree.children_mut(text).add(inner),
        Err(BuildError::InvalidOperation { .. })
    ));
    assert!(matches!(
        tree.children_mut(outer).add(root),
        Err(BuildError::InvalidOperation { .. })
    ));
    assert!(matches!(
        tree.children_mut(root).insert_before(inner, text),
        Err(BuildError::NotFound { .. })
    ));
}

#[test]
fn test_failed_block_restores_the_frame() {
    let mut ctx = Context::new();
    let root = ctx.root();
    let err = ctx
        .tag_with("div", (), |ctx| {
            ctx.tag("span", "kept")?;
            ctx.tag("marquee", ())?;
            ctx.tag("span", "never")?;
            Ok(())
        })
        .unwrap_err();

    assert!(matches!(err, BuildError::UnknownTag { .. }));
    assert_eq!(ctx.current_element(), root);
    assert_eq!(ctx.current_flow(), Flow::Append);
    assert_eq!(ctx.depth(), 1);
    assert_eq!(ctx.render().as_str(), "<div>\n  <span>kept</span>\n</div>");
}

#[test]
fn test_assigns_and_helpers_in_blocks() {
    let helpers = HelperTable::new().with("greeting", |ctx, _| {
        let name = ctx.assign("name").cloned().unwrap_or_default();
        Ok(Value::from(format!("Hello {name}")))
    });
    let mut ctx = Context::new()
        .with_assigns([("name", "World")])
        .with_helpers(helpers);

    ctx.tag_with("p", (), |ctx| {
        let text = ctx.helper("greeting", &[])?;
        ctx.text_node(&text.to_string()).map(drop)
    })
    .unwrap();
    assert_eq!(ctx.render(), "<p>Hello World</p>");

    let err = ctx.helper("missing", &[]).unwrap_err();
    assert_eq!(err.to_string(), "undefined helper `missing`");
}

#[test]
fn test_render_options() {
    let options = RenderOptions::new().with_indent_width(4).sort_attributes();
    let mut ctx = Context::new().with_options(options);
    ctx.tag_with("div", [("title", "t"), ("class", "c")], |ctx| {
        ctx.tag("b", "x").map(drop)
    })
    .unwrap();

    assert_eq!(
        ctx.render().as_str(),
        "<div class=\"c\" title=\"t\">\n    <b>x</b>\n</div>"
    );
}

#[test]
fn test_document() {
    let out = render(|ctx| {
        ctx.document(|ctx| {
            ctx.set_title("My Title")?;
            ctx.tag("div", "Content Area").map(drop)
        })
        .map(drop)
    })
    .unwrap();

    assert_eq!(
        out.as_str(),
        html(
            r#"
            <!DOCTYPE html>

            <html>
              <head>
                <title>My Title</title>
                <meta http-equiv="Content-Type" content="text/html; charset=utf-8"/>
              </head>
              <body>
                <div>Content Area</div>
              </body>
            </html>
            "#
        )
    );
}
